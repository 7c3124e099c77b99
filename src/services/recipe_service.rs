use std::collections::HashSet;

use crate::database::{RecipeQuery, Repository};
use crate::models::{
    AttrKind, NamedAttr, NewRecipe, PriceInput, Recipe, RecipeDetailResponse, RecipeListParams,
    RecipeRequest, RecipeResponse,
};
use crate::utils::{check_char_field, AppError, FieldErrors, MAX_CHAR_LENGTH, REQUIRED};

/// DECIMAL(5, 2)
const PRICE_MAX_DIGITS: u32 = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// "1,2, 3" -> [1, 2, 3]
pub fn params_to_ints(raw: &str, param: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(|item| {
            item.trim().parse::<i64>().map_err(|_| {
                AppError::InvalidRequest(format!(
                    "'{}' must be a comma separated list of integer ids, got '{}'",
                    param, raw
                ))
            })
        })
        .collect()
}

/// An absent or blank parameter means "no filter"
fn id_filter(raw: Option<&str>, param: &str) -> Result<Option<Vec<i64>>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => params_to_ints(raw, param).map(Some),
    }
}

pub fn build_query(user_id: i64, params: &RecipeListParams) -> Result<RecipeQuery, AppError> {
    Ok(RecipeQuery {
        user_id,
        tag_ids: id_filter(params.tags.as_deref(), "tags")?,
        ingredient_ids: id_filter(params.ingredients.as_deref(), "ingredients")?,
    })
}

pub fn parse_price(input: &PriceInput) -> Result<f64, String> {
    let price = match input {
        PriceInput::Number(value) => *value,
        PriceInput::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| "A valid number is required.".to_string())?,
    };

    if !price.is_finite() {
        return Err("A valid number is required.".to_string());
    }

    let scale = 10_f64.powi(PRICE_DECIMAL_PLACES as i32);
    let scaled = price * scale;
    if (scaled - scaled.round()).abs() > 1e-6 {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        ));
    }
    if price.abs() >= 10_f64.powi((PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES) as i32) {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            PRICE_MAX_DIGITS
        ));
    }

    Ok(scaled.round() / scale)
}

/// Validated scalar fields; `None` means "not supplied"
#[derive(Debug, Default)]
struct RecipeFields {
    title: Option<String>,
    time_minutes: Option<i32>,
    price: Option<f64>,
    link: Option<String>,
    description: Option<String>,
    tag_names: Option<Vec<String>>,
    ingredient_names: Option<Vec<String>>,
}

fn check_names(errors: &mut FieldErrors, field: &str, items: Option<&[NamedAttr]>) -> Option<Vec<String>> {
    let items = items?;
    let mut names: Vec<String> = Vec::with_capacity(items.len());

    for item in items {
        let name = item.name.trim();
        if name.is_empty() {
            errors.add(field, "name: This field may not be blank.");
        } else if name.chars().count() > MAX_CHAR_LENGTH {
            errors.add(
                field,
                format!("name: Ensure this field has no more than {} characters.", MAX_CHAR_LENGTH),
            );
        } else if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    Some(names)
}

fn validate(request: &RecipeRequest, partial: bool) -> Result<RecipeFields, AppError> {
    let required = !partial;
    let mut errors = FieldErrors::new();

    let title = check_char_field(&mut errors, "title", request.title.as_deref(), required, false);

    let time_minutes = match request.time_minutes {
        Some(minutes) => match i32::try_from(minutes) {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                errors.add("time_minutes", "Ensure this value fits in a 32-bit integer.");
                None
            }
        },
        None => {
            if required {
                errors.add("time_minutes", REQUIRED);
            }
            None
        }
    };

    let price = match &request.price {
        Some(input) => match parse_price(input) {
            Ok(price) => Some(price),
            Err(msg) => {
                errors.add("price", msg);
                None
            }
        },
        None => {
            if required {
                errors.add("price", REQUIRED);
            }
            None
        }
    };

    let link = check_char_field(&mut errors, "link", request.link.as_deref(), false, true);
    let description = request.description.as_ref().map(|d| d.trim().to_string());

    let tag_names = check_names(&mut errors, "tags", request.tags.as_deref());
    let ingredient_names = check_names(&mut errors, "ingredients", request.ingredients.as_deref());

    errors.into_result()?;

    Ok(RecipeFields {
        title,
        time_minutes,
        price,
        link,
        description,
        tag_names,
        ingredient_names,
    })
}

/// get-or-create each name among the owner's attrs of `kind`
async fn resolve_attrs(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    names: &[String],
) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let attr = repo.get_or_create_attr(kind, user_id, name).await?;
        if !ids.contains(&attr.id) {
            ids.push(attr.id);
        }
    }
    Ok(ids)
}

pub async fn render_detail(
    repo: &dyn Repository,
    recipe: &Recipe,
) -> Result<RecipeDetailResponse, AppError> {
    let tags = repo
        .find_attrs_by_ids(AttrKind::Tag, recipe.user_id, &recipe.tag_ids)
        .await?;
    let ingredients = repo
        .find_attrs_by_ids(AttrKind::Ingredient, recipe.user_id, &recipe.ingredient_ids)
        .await?;

    Ok(RecipeDetailResponse::build(recipe, &tags, &ingredients))
}

fn unique_ids<'a>(lists: impl Iterator<Item = &'a Vec<i64>>) -> Vec<i64> {
    let unique: HashSet<i64> = lists.flat_map(|ids| ids.iter().copied()).collect();
    unique.into_iter().collect()
}

/// Summary shapes, with one attr lookup per kind for the whole page
pub async fn render_list(
    repo: &dyn Repository,
    user_id: i64,
    recipes: &[Recipe],
) -> Result<Vec<RecipeResponse>, AppError> {
    let tag_ids = unique_ids(recipes.iter().map(|r| &r.tag_ids));
    let ingredient_ids = unique_ids(recipes.iter().map(|r| &r.ingredient_ids));

    let tags = repo.find_attrs_by_ids(AttrKind::Tag, user_id, &tag_ids).await?;
    let ingredients = repo
        .find_attrs_by_ids(AttrKind::Ingredient, user_id, &ingredient_ids)
        .await?;

    Ok(recipes
        .iter()
        .map(|recipe| RecipeResponse::build(recipe, &tags, &ingredients))
        .collect())
}

pub async fn list_recipes(
    repo: &dyn Repository,
    user_id: i64,
    params: &RecipeListParams,
) -> Result<Vec<RecipeResponse>, AppError> {
    let query = build_query(user_id, params)?;
    let recipes = repo.list_recipes(&query).await?;
    render_list(repo, user_id, &recipes).await
}

pub async fn get_recipe(
    repo: &dyn Repository,
    user_id: i64,
    id: i64,
) -> Result<RecipeDetailResponse, AppError> {
    let recipe = repo
        .find_recipe(user_id, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    render_detail(repo, &recipe).await
}

/// New recipe owned by `user_id`
pub async fn create_recipe(
    repo: &dyn Repository,
    user_id: i64,
    request: &RecipeRequest,
) -> Result<RecipeDetailResponse, AppError> {
    let fields = validate(request, false)?;

    let tag_ids = match &fields.tag_names {
        Some(names) => resolve_attrs(repo, AttrKind::Tag, user_id, names).await?,
        None => Vec::new(),
    };
    let ingredient_ids = match &fields.ingredient_names {
        Some(names) => resolve_attrs(repo, AttrKind::Ingredient, user_id, names).await?,
        None => Vec::new(),
    };

    let (Some(title), Some(time_minutes), Some(price)) =
        (fields.title, fields.time_minutes, fields.price)
    else {
        return Err(AppError::Internal("Validated recipe fields missing".to_string()));
    };

    let recipe = repo
        .insert_recipe(NewRecipe {
            user_id,
            title,
            time_minutes,
            price,
            link: fields.link.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            tag_ids,
            ingredient_ids,
        })
        .await?;

    log::info!("🍳 Recipe {} created for user {}", recipe.id, user_id);
    render_detail(repo, &recipe).await
}

/// PUT (`partial = false`) or PATCH of an owned recipe
pub async fn update_recipe(
    repo: &dyn Repository,
    user_id: i64,
    id: i64,
    request: &RecipeRequest,
    partial: bool,
) -> Result<RecipeDetailResponse, AppError> {
    let mut recipe = repo
        .find_recipe(user_id, id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let fields = validate(request, partial)?;

    if let Some(title) = fields.title {
        recipe.title = title;
    }
    if let Some(time_minutes) = fields.time_minutes {
        recipe.time_minutes = time_minutes;
    }
    if let Some(price) = fields.price {
        recipe.price = price;
    }
    if let Some(link) = fields.link {
        recipe.link = link;
    }
    if let Some(description) = fields.description {
        recipe.description = description;
    }
    if let Some(names) = &fields.tag_names {
        recipe.tag_ids = resolve_attrs(repo, AttrKind::Tag, user_id, names).await?;
    }
    if let Some(names) = &fields.ingredient_names {
        recipe.ingredient_ids = resolve_attrs(repo, AttrKind::Ingredient, user_id, names).await?;
    }

    if !repo.replace_recipe(&recipe).await? {
        return Err(AppError::not_found());
    }

    render_detail(repo, &recipe).await
}

pub async fn delete_recipe(repo: &dyn Repository, user_id: i64, id: i64) -> Result<(), AppError> {
    if repo.delete_recipe(user_id, id).await? {
        log::info!("🗑️  Recipe {} deleted by user {}", id, user_id);
        Ok(())
    } else {
        Err(AppError::not_found())
    }
}
