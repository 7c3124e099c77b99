// In-process Repository used by the handler and service tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::query::{AttrQuery, RecipeQuery};
use super::Repository;
use crate::models::{
    AttrKind, AuthToken, NewRecipe, NewUser, Recipe, RecipeAttr, User, UserChanges,
};
use crate::utils::{AppError, FieldErrors};

#[derive(Default)]
struct State {
    last_id: i64,
    users: BTreeMap<i64, User>,
    tokens: HashMap<String, AuthToken>,
    recipes: BTreeMap<i64, Recipe>,
    attrs: HashMap<AttrKind, BTreeMap<i64, RecipeAttr>>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn attrs(&mut self, kind: AttrKind) -> &mut BTreeMap<i64, RecipeAttr> {
        self.attrs.entry(kind).or_default()
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory repository poisoned")
    }

    /// Test helper: number of stored users
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Test helper: all recipes regardless of owner
    pub fn all_recipes(&self) -> Vec<Recipe> {
        self.lock().recipes.values().cloned().collect()
    }
}

fn email_taken() -> AppError {
    AppError::Validation(FieldErrors::single(
        "email",
        "user with this email already exists.",
    ))
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.email_taken(&user.email, None) {
            return Err(email_taken());
        }

        let user = User {
            id: state.next_id(),
            email: user.email,
            password: user.password_hash,
            name: user.name,
            is_active: true,
            is_staff: false,
            created_at: chrono::Utc::now().timestamp(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_user_profile(&self, id: i64, changes: &UserChanges) -> Result<(), AppError> {
        let mut state = self.lock();
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(email_taken());
            }
        }

        let user = state.users.get_mut(&id).ok_or_else(AppError::not_found)?;
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        Ok(())
    }

    async fn set_user_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let user = state.users.get_mut(&id).ok_or_else(AppError::not_found)?;
        user.password = password_hash.to_string();
        Ok(())
    }

    async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, AppError> {
        let mut state = self.lock();
        if let Some(token) = state.tokens.values().find(|t| t.user_id == user_id) {
            return Ok(token.clone());
        }

        let token = AuthToken::generate(user_id);
        state.tokens.insert(token.key.clone(), token.clone());
        Ok(token)
    }

    async fn find_token(&self, key: &str) -> Result<Option<AuthToken>, AppError> {
        Ok(self.lock().tokens.get(key).cloned())
    }

    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, AppError> {
        Ok(self
            .lock()
            .recipes
            .values()
            .rev()
            .filter(|recipe| query.matches(recipe))
            .cloned()
            .collect())
    }

    async fn find_recipe(&self, user_id: i64, id: i64) -> Result<Option<Recipe>, AppError> {
        Ok(self
            .lock()
            .recipes
            .get(&id)
            .filter(|recipe| recipe.user_id == user_id)
            .cloned())
    }

    async fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe, AppError> {
        let mut state = self.lock();
        let recipe = Recipe {
            id: state.next_id(),
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
        state.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn replace_recipe(&self, recipe: &Recipe) -> Result<bool, AppError> {
        let mut state = self.lock();
        match state.recipes.get_mut(&recipe.id) {
            Some(stored) if stored.user_id == recipe.user_id => {
                *stored = recipe.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_recipe(&self, user_id: i64, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state
            .recipes
            .get(&id)
            .map_or(false, |recipe| recipe.user_id == user_id);
        if owned {
            state.recipes.remove(&id);
        }
        Ok(owned)
    }

    async fn list_attrs(&self, query: &AttrQuery) -> Result<Vec<RecipeAttr>, AppError> {
        let mut state = self.lock();
        let assigned: Vec<i64> = state
            .recipes
            .values()
            .filter(|recipe| recipe.user_id == query.user_id)
            .flat_map(|recipe| match query.kind {
                AttrKind::Tag => recipe.tag_ids.clone(),
                AttrKind::Ingredient => recipe.ingredient_ids.clone(),
            })
            .collect();

        let mut attrs: Vec<RecipeAttr> = state
            .attrs(query.kind)
            .values()
            .filter(|attr| query.matches(attr, &assigned))
            .cloned()
            .collect();
        query.sort(&mut attrs);
        Ok(attrs)
    }

    async fn find_attrs_by_ids(
        &self,
        kind: AttrKind,
        user_id: i64,
        ids: &[i64],
    ) -> Result<Vec<RecipeAttr>, AppError> {
        Ok(self
            .lock()
            .attrs(kind)
            .values()
            .filter(|attr| attr.user_id == user_id && ids.contains(&attr.id))
            .cloned()
            .collect())
    }

    async fn find_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        id: i64,
    ) -> Result<Option<RecipeAttr>, AppError> {
        Ok(self
            .lock()
            .attrs(kind)
            .get(&id)
            .filter(|attr| attr.user_id == user_id)
            .cloned())
    }

    async fn get_or_create_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        name: &str,
    ) -> Result<RecipeAttr, AppError> {
        let existing = {
            let mut state = self.lock();
            state
                .attrs(kind)
                .values()
                .find(|attr| attr.user_id == user_id && attr.name == name)
                .cloned()
        };

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
        let mut state = self.lock();
        let attr = RecipeAttr {
            id: state.next_id(),
            user_id,
            name: name.to_string(),
        };
        state.attrs(kind).insert(attr.id, attr.clone());
        Ok(attr)
    }

    async fn rename_attr(
        &self,
        kind: AttrKind,
        user_id: i64,
        id: i64,
        name: &str,
    ) -> Result<bool, AppError> {
        let mut state = self.lock();
        match state.attrs(kind).get_mut(&id) {
            Some(attr) if attr.user_id == user_id => {
                attr.name = name.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_attr(&self, kind: AttrKind, user_id: i64, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state
            .attrs(kind)
            .get(&id)
            .map_or(false, |attr| attr.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        state.attrs(kind).remove(&id);
        for recipe in state.recipes.values_mut().filter(|r| r.user_id == user_id) {
            match kind {
                AttrKind::Tag => recipe.tag_ids.retain(|tag_id| *tag_id != id),
                AttrKind::Ingredient => recipe.ingredient_ids.retain(|ing_id| *ing_id != id),
            }
        }
        Ok(true)
    }
}
