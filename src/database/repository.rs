use async_trait::async_trait;

use super::query::{AttrQuery, RecipeQuery};
use crate::models::{AttrKind, AuthToken, NewRecipe, NewUser, Recipe, RecipeAttr, User, UserChanges};
use crate::utils::AppError;

/// Every persistence operation the handlers need.
///
/// Shared with actix as `web::Data<dyn Repository>`. Methods taking a
/// `user_id` only ever see rows owned by that user.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Round-trip to the backing store, used by the health check
    async fn ping(&self) -> Result<(), AppError>;

    // ---- users ----

    /// Fails with a validation error on `email` when the address is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn update_user_profile(&self, id: i64, changes: &UserChanges) -> Result<(), AppError>;

    async fn set_user_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    // ---- tokens ----

    async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, AppError>;

    async fn find_token(&self, key: &str) -> Result<Option<AuthToken>, AppError>;

    // ---- recipes ----

    /// Deduplicated, newest first
    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, AppError>;

    async fn find_recipe(&self, user_id: i64, id: i64) -> Result<Option<Recipe>, AppError>;

    async fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe, AppError>;

    /// Overwrites the stored recipe with the same id and owner; false if none matched
    async fn replace_recipe(&self, recipe: &Recipe) -> Result<bool, AppError>;

    async fn delete_recipe(&self, user_id: i64, id: i64) -> Result<bool, AppError>;

    // ---- tags / ingredients ----

    async fn list_attrs(&self, query: &AttrQuery) -> Result<Vec<RecipeAttr>, AppError>;

    async fn find_attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> Result<Vec<RecipeAttr>, AppError>;

    async fn find_attr(&self, kind: AttrKind, user_id: i64, id: i64)
        -> Result<Option<RecipeAttr>, AppError>;

    /// Returns the user's first attr with this exact name, creating it if missing
    async fn get_or_create_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> Result<RecipeAttr, AppError>;

    async fn insert_attr(&self, kind: AttrKind, user_id: i64, name: &str)
        -> Result<RecipeAttr, AppError>;

    async fn rename_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        id: i64,
        name: &str,
    ) -> Result<bool, AppError>;

    /// Also detaches the attr from the owner's recipes
    async fn delete_attr(&self, kind: AttrKind, user_id: i64, id: i64) -> Result<bool, AppError>;
}
