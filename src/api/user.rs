use actix_web::{web, HttpResponse};

use crate::api::Payload;
use crate::config::AppConfig;
use crate::database::Repository;
use crate::models::{AuthTokenRequest, CreateUserRequest, UpdateUserRequest, User, UserResponse};
use crate::services::{auth_service, user_service};
use crate::utils::AppError;

pub async fn create_user(
    repo: web::Data<dyn Repository>,
    config: web::Data<AppConfig>,
    request: Payload<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    log::info!(
        "📝 POST /api/user/create/ - email: {}",
        request.email.as_deref().unwrap_or("N/A")
    );

    let user = user_service::create_user(repo.get_ref(), &request, config.bcrypt_cost).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn create_token(
    repo: web::Data<dyn Repository>,
    request: Payload<AuthTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /api/user/token/ - email: {}", email);

    match auth_service::issue_token(repo.get_ref(), &request).await {
        Ok(token) => Ok(HttpResponse::Ok().json(token)),
        Err(e) => {
            log::warn!("❌ Token request failed: {} - {}", email, e);
            Err(e)
        }
    }
}

pub async fn get_me(user: web::ReqData<User>) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(&*user))
}

pub async fn update_me(
    repo: web::Data<dyn Repository>,
    config: web::Data<AppConfig>,
    user: web::ReqData<User>,
    request: Payload<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let updated =
        user_service::update_user(repo.get_ref(), &user, &request, false, config.bcrypt_cost).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn partial_update_me(
    repo: web::Data<dyn Repository>,
    config: web::Data<AppConfig>,
    user: web::ReqData<User>,
    request: Payload<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let updated =
        user_service::update_user(repo.get_ref(), &user, &request, true, config.bcrypt_cost).await?;
    Ok(HttpResponse::Ok().json(updated))
}
