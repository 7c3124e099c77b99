use actix_web::{error, web, HttpRequest};

use crate::middleware::TokenAuth;
use crate::models::AttrKind;
use crate::utils::AppError;

#[cfg(test)]
macro_rules! test_app {
    ($repo:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(
                    $repo as std::sync::Arc<dyn crate::database::Repository>,
                ))
                .app_data(actix_web::web::Data::new(crate::config::AppConfig::for_tests()))
                .configure(crate::api::configure),
        )
        .await
    };
}

pub mod attrs;
pub mod health;
pub mod recipes;
pub mod user;

#[cfg(test)]
pub mod test_support;

/// Flat request bodies arrive either as JSON or as a urlencoded form
pub type Payload<T> = web::Either<web::Json<T>, web::Form<T>>;

/// Registers every route; the repository and `AppConfig` are expected as app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(form_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/user")
                .route("/create/", web::post().to(user::create_user))
                .route("/token/", web::post().to(user::create_token))
                .service(
                    web::resource("/me/")
                        .wrap(TokenAuth)
                        .route(web::get().to(user::get_me))
                        .route(web::put().to(user::update_me))
                        .route(web::patch().to(user::partial_update_me)),
                ),
        )
        .service(
            web::scope("/api/recipe")
                .wrap(TokenAuth)
                .service(
                    web::resource("/recipes/")
                        .route(web::get().to(recipes::list_recipes))
                        .route(web::post().to(recipes::create_recipe)),
                )
                .service(
                    web::resource("/recipes/{id}/")
                        .route(web::get().to(recipes::get_recipe))
                        .route(web::put().to(recipes::update_recipe))
                        .route(web::patch().to(recipes::partial_update_recipe))
                        .route(web::delete().to(recipes::delete_recipe)),
                )
                .service(attrs::scope("/tags", AttrKind::Tag))
                .service(attrs::scope("/ingredients", AttrKind::Ingredient)),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        log::warn!("⚠️  Rejected JSON body: {}", err);
        AppError::InvalidRequest(err.to_string()).into()
    })
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err: error::UrlencodedError, _req: &HttpRequest| {
        log::warn!("⚠️  Rejected form body: {}", err);
        AppError::InvalidRequest(err.to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        AppError::InvalidRequest(err.to_string()).into()
    })
}
