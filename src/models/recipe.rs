use serde::{Deserialize, Serialize};

use super::{AttrResponse, RecipeAttr};

/// Recipe document (collection "recipes")
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: i64,

    /// Owner of the recipe
    pub user_id: i64,

    pub title: String,

    pub time_minutes: i32,

    /// Stored as a float, validated against DECIMAL(5, 2)
    pub price: f64,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tag_ids: Vec<i64>,

    #[serde(default)]
    pub ingredient_ids: Vec<i64>,

    pub created_at: i64,
}

/// Validated fields of a recipe about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub description: String,
    pub tag_ids: Vec<i64>,
    pub ingredient_ids: Vec<i64>,
}

/// Price as sent by clients: `5.5` or `"5.50"`
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

/// Nested `{ "name": ... }` reference to a tag or ingredient
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct NamedAttr {
    pub name: String,
}

/// Body of POST/PUT/PATCH on recipes; requiredness depends on the action
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<PriceInput>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<NamedAttr>>,
    pub ingredients: Option<Vec<NamedAttr>>,
}

/// Query string of GET /recipes/
#[derive(Debug, Deserialize, Default)]
pub struct RecipeListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Summary shape used by the list action
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub tags: Vec<AttrResponse>,
    pub ingredients: Vec<AttrResponse>,
}

/// Detail shape used by every other action
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub summary: RecipeResponse,
    pub description: String,
}

pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

impl RecipeResponse {
    /// `tags`/`ingredients` are looked up among the given attrs, keeping the recipe's order
    pub fn build(recipe: &Recipe, tags: &[RecipeAttr], ingredients: &[RecipeAttr]) -> Self {
        let pick = |ids: &[i64], pool: &[RecipeAttr]| -> Vec<AttrResponse> {
            ids.iter()
                .filter_map(|id| pool.iter().find(|attr| attr.id == *id))
                .map(AttrResponse::from)
                .collect()
        };

        RecipeResponse {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.clone(),
            tags: pick(&recipe.tag_ids, tags),
            ingredients: pick(&recipe.ingredient_ids, ingredients),
        }
    }
}

impl RecipeDetailResponse {
    pub fn build(recipe: &Recipe, tags: &[RecipeAttr], ingredients: &[RecipeAttr]) -> Self {
        RecipeDetailResponse {
            summary: RecipeResponse::build(recipe, tags, ingredients),
            description: recipe.description.clone(),
        }
    }
}
