use actix_web::{web, HttpResponse};

use crate::database::Repository;
use crate::models::{RecipeListParams, RecipeRequest, User};
use crate::services::recipe_service;
use crate::utils::AppError;

/// GET /api/recipe/recipes/?tags=1,2&ingredients=3
pub async fn list_recipes(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    params: web::Query<RecipeListParams>,
) -> Result<HttpResponse, AppError> {
    let recipes = recipe_service::list_recipes(repo.get_ref(), user.id, &params).await?;
    Ok(HttpResponse::Ok().json(recipes))
}

pub async fn get_recipe(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let recipe = recipe_service::get_recipe(repo.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(recipe))
}

pub async fn create_recipe(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    request: web::Json<RecipeRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🍳 POST /api/recipe/recipes/ - user: {}", user.id);

    let recipe = recipe_service::create_recipe(repo.get_ref(), user.id, &request).await?;
    Ok(HttpResponse::Created().json(recipe))
}

pub async fn update_recipe(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
    request: web::Json<RecipeRequest>,
) -> Result<HttpResponse, AppError> {
    let recipe =
        recipe_service::update_recipe(repo.get_ref(), user.id, path.into_inner(), &request, false)
            .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

pub async fn partial_update_recipe(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
    request: web::Json<RecipeRequest>,
) -> Result<HttpResponse, AppError> {
    let recipe =
        recipe_service::update_recipe(repo.get_ref(), user.id, path.into_inner(), &request, true)
            .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

pub async fn delete_recipe(
    repo: web::Data<dyn Repository>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    recipe_service::delete_recipe(repo.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
