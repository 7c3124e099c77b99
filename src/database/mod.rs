pub mod query;
pub mod repository;

#[cfg(test)]
pub mod memory;

pub use query::{AttrQuery, RecipeQuery, SortOrder};
pub use repository::Repository;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

use crate::models::{
    AttrKind, AuthToken, NewRecipe, NewUser, Recipe, RecipeAttr, User, UserChanges,
};
use crate::utils::{AppError, FieldErrors};

const USERS: &str = "users";
const TOKENS: &str = "auth_tokens";
const RECIPES: &str = "recipes";
const COUNTERS: &str = "counters";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes backing uniqueness and owner-scoped lookups
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = mongodb::options::IndexOptions::builder().unique(true).build();

        let users = self.collection::<Document>(USERS);
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique.clone())
            .build();
        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let tokens = self.collection::<Document>(TOKENS);
        let token_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(unique)
            .build();
        match tokens.create_index(token_user_index).await {
            Ok(_) => log::info!("   ✅ Index created: auth_tokens(user_id) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let recipes = self.collection::<Document>(RECIPES);
        for keys in [
            doc! { "user_id": 1, "_id": -1 },
            doc! { "user_id": 1, "tag_ids": 1 },
            doc! { "user_id": 1, "ingredient_ids": 1 },
        ] {
            let label = keys.keys().cloned().collect::<Vec<_>>().join(", ");
            match recipes.create_index(IndexModel::builder().keys(keys).build()).await {
                Ok(_) => log::info!("   ✅ Index created: recipes({})", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        for kind in [AttrKind::Tag, AttrKind::Ingredient] {
            let attrs = self.collection::<Document>(kind.collection());
            let index = IndexModel::builder()
                .keys(doc! { "user_id": 1, "name": 1 })
                .build();
            match attrs.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}(user_id, name)", kind.collection()),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Atomically allocates the next integer id of a sequence
    async fn next_id(&self, sequence: &str) -> Result<i64, AppError> {
        let counter = self
            .collection::<Document>(COUNTERS)
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::DatabaseError(format!("Counter '{}' missing", sequence)))?;

        match counter.get("seq") {
            Some(Bson::Int64(seq)) => Ok(*seq),
            Some(Bson::Int32(seq)) => Ok(i64::from(*seq)),
            _ => Err(AppError::DatabaseError(format!(
                "Counter '{}' is not numeric",
                sequence
            ))),
        }
    }

    fn attrs(&self, kind: AttrKind) -> Collection<RecipeAttr> {
        self.collection::<RecipeAttr>(kind.collection())
    }

    /// Ids of `kind` referenced by the owner's recipes
    async fn assigned_attr_ids(&self, query: &AttrQuery) -> Result<Vec<i64>, AppError> {
        let values = self
            .collection::<Document>(RECIPES)
            .distinct(query.kind.recipe_field(), query.assigned_source_filter())
            .await?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Bson::Int64(id) => Some(id),
                Bson::Int32(id) => Some(i64::from(id)),
                _ => None,
            })
            .collect())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn email_taken() -> AppError {
    AppError::Validation(FieldErrors::single(
        "email",
        "user with this email already exists.",
    ))
}

#[async_trait]
impl Repository for MongoDB {
    async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let user = User {
            id: self.next_id(USERS).await?,
            email: user.email,
            password: user.password_hash,
            name: user.name,
            is_active: true,
            is_staff: false,
            created_at: chrono::Utc::now().timestamp(),
        };

        match self.collection::<User>(USERS).insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "email": email })
            .await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "_id": id })
            .await?)
    }

    async fn update_user_profile(&self, id: i64, changes: &UserChanges) -> Result<(), AppError> {
        let mut set = Document::new();
        if let Some(email) = &changes.email {
            set.insert("email", email);
        }
        if let Some(name) = &changes.name {
            set.insert("name", name);
        }
        if set.is_empty() {
            return Ok(());
        }

        match self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await
        {
            Ok(result) if result.matched_count == 0 => Err(AppError::not_found()),
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_user_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": id }, doc! { "$set": { "password": password_hash } })
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, AppError> {
        let tokens = self.collection::<AuthToken>(TOKENS);

        if let Some(token) = tokens.find_one(doc! { "user_id": user_id }).await? {
            return Ok(token);
        }

        let token = AuthToken::generate(user_id);
        match tokens.insert_one(&token).await {
            Ok(_) => Ok(token),
            // Lost the race against a concurrent exchange for the same user
            Err(e) if is_duplicate_key(&e) => tokens
                .find_one(doc! { "user_id": user_id })
                .await?
                .ok_or_else(|| AppError::DatabaseError("Token vanished after conflict".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_token(&self, key: &str) -> Result<Option<AuthToken>, AppError> {
        Ok(self
            .collection::<AuthToken>(TOKENS)
            .find_one(doc! { "_id": key })
            .await?)
    }

    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, AppError> {
        let cursor = self
            .collection::<Recipe>(RECIPES)
            .find(query.filter_document())
            .sort(query.sort_document())
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_recipe(&self, user_id: i64, id: i64) -> Result<Option<Recipe>, AppError> {
        Ok(self
            .collection::<Recipe>(RECIPES)
            .find_one(doc! { "_id": id, "user_id": user_id })
            .await?)
    }

    async fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe, AppError> {
        let recipe = Recipe {
            id: self.next_id(RECIPES).await?,
            user_id: recipe.user_id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            description: recipe.description,
            tag_ids: recipe.tag_ids,
            ingredient_ids: recipe.ingredient_ids,
            created_at: chrono::Utc::now().timestamp(),
        };

        self.collection::<Recipe>(RECIPES).insert_one(&recipe).await?;
        Ok(recipe)
    }

    async fn replace_recipe(&self, recipe: &Recipe) -> Result<bool, AppError> {
        let result = self
            .collection::<Recipe>(RECIPES)
            .replace_one(doc! { "_id": recipe.id, "user_id": recipe.user_id }, recipe)
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn delete_recipe(&self, user_id: i64, id: i64) -> Result<bool, AppError> {
        let result = self
            .collection::<Recipe>(RECIPES)
            .delete_one(doc! { "_id": id, "user_id": user_id })
            .await?;

        Ok(result.deleted_count > 0)
    }

    async fn list_attrs(&self, query: &AttrQuery) -> Result<Vec<RecipeAttr>, AppError> {
        let assigned = if query.assigned_only {
            self.assigned_attr_ids(query).await?
        } else {
            Vec::new()
        };

        let cursor = self
            .attrs(query.kind)
            .find(query.filter_document(&assigned))
            .sort(query.sort_document())
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> Result<Vec<RecipeAttr>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .attrs(kind)
            .find(doc! { "user_id": user_id, "_id": { "$in": ids.to_vec() } })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        id: i64,
    ) -> Result<Option<RecipeAttr>, AppError> {
        Ok(self
            .attrs(kind)
            .find_one(doc! { "_id": id, "user_id": user_id })
            .await?)
    }

    async fn get_or_create_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> Result<RecipeAttr, AppError> {
        let existing = self
            .attrs(kind)
            .find_one(doc! { "user_id": user_id, "name": name })
            .sort(doc! { "_id": 1 })
            .await?;

        match existing {
            Some(attr) => Ok(attr),
            None => self.insert_attr(kind, user_id, name).await,
        }
    }

    async fn insert_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> Result<RecipeAttr, AppError> {
        let attr = RecipeAttr {
            id: self.next_id(kind.collection()).await?,
            user_id,
            name: name.to_string(),
        };

        self.attrs(kind).insert_one(&attr).await?;
        Ok(attr)
    }

    async fn rename_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        id: i64,
        name: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .attrs(kind)
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "name": name } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn delete_attr(&self, kind: AttrKind, user_id: i64, id: i64) -> Result<bool, AppError> {
        let result = self
            .attrs(kind)
            .delete_one(doc! { "_id": id, "user_id": user_id })
            .await?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        let mut pull = Document::new();
        pull.insert(kind.recipe_field(), id);
        self.collection::<Document>(RECIPES)
            .update_many(doc! { "user_id": user_id }, doc! { "$pull": pull })
            .await?;

        Ok(true)
    }
}
