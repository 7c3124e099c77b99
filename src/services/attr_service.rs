// Tags and ingredients share one set of owner-scoped operations,
// parameterised by AttrKind.

use serde::Deserialize;

use crate::database::{AttrQuery, Repository, SortOrder};
use crate::models::{AttrKind, AttrRequest, AttrResponse};
use crate::utils::{check_char_field, AppError, FieldErrors};

/// Query string of GET /tags/ and /ingredients/
#[derive(Debug, Deserialize, Default)]
pub struct AttrListParams {
    pub assigned_only: Option<String>,
}

/// `0` / blank / absent -> false, any other integer -> true
pub fn parse_assigned_only(raw: Option<&str>) -> Result<bool, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => value.parse::<i64>().map(|flag| flag != 0).map_err(|_| {
            AppError::InvalidRequest(format!("'assigned_only' must be an integer, got '{}'", value))
        }),
    }
}

pub async fn list_attrs(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    params: &AttrListParams,
    order: SortOrder,
) -> Result<Vec<AttrResponse>, AppError> {
    let query = AttrQuery {
        kind,
        user_id,
        assigned_only: parse_assigned_only(params.assigned_only.as_deref())?,
        order,
    };

    let attrs = repo.list_attrs(&query).await?;
    Ok(attrs.into_iter().map(AttrResponse::from).collect())
}

pub async fn get_attr(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    id: i64,
) -> Result<AttrResponse, AppError> {
    repo.find_attr(kind, user_id, id)
        .await?
        .map(AttrResponse::from)
        .ok_or_else(AppError::not_found)
}

fn validate_name(request: &AttrRequest, required: bool) -> Result<Option<String>, AppError> {
    let mut errors = FieldErrors::new();
    let name = check_char_field(&mut errors, "name", request.name.as_deref(), required, false);
    errors.into_result()?;
    Ok(name)
}

pub async fn create_attr(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    request: &AttrRequest,
) -> Result<AttrResponse, AppError> {
    let name = validate_name(request, true)?
        .ok_or_else(|| AppError::Internal("Validated name missing".to_string()))?;

    let attr = repo.insert_attr(kind, user_id, &name).await?;
    log::info!("🏷️  Created {} {} for user {}", kind, attr.id, user_id);
    Ok(AttrResponse::from(attr))
}

/// PUT and PATCH only differ in whether `name` may be omitted
pub async fn update_attr(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    id: i64,
    request: &AttrRequest,
    partial: bool,
) -> Result<AttrResponse, AppError> {
    let existing = repo
        .find_attr(kind, user_id, id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let Some(name) = validate_name(request, !partial)? else {
        return Ok(AttrResponse::from(existing));
    };

    if !repo.rename_attr(kind, user_id, id, &name).await? {
        return Err(AppError::not_found());
    }

    Ok(AttrResponse { id, name })
}

pub async fn delete_attr(
    repo: &dyn Repository,
    kind: AttrKind,
    user_id: i64,
    id: i64,
) -> Result<(), AppError> {
    if repo.delete_attr(kind, user_id, id).await? {
        log::info!("🗑️  Deleted {} {} of user {}", kind, id, user_id);
        Ok(())
    } else {
        Err(AppError::not_found())
    }
}
