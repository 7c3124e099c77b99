// Tags and ingredients are served by the same handlers; the scope's
// `AttrKind` app data selects the collection.

use actix_web::{web, HttpResponse, Scope};

use crate::api::Payload;
use crate::config::AppConfig;
use crate::database::Repository;
use crate::models::{AttrKind, AttrRequest, User};
use crate::services::attr_service::{self, AttrListParams};
use crate::utils::AppError;

pub fn scope(path: &str, kind: AttrKind) -> Scope {
    web::scope(path)
        .app_data(web::Data::new(kind))
        .service(
            web::resource("/")
                .route(web::get().to(list_attrs))
                .route(web::post().to(create_attr)),
        )
        .service(
            web::resource("/{id}/")
                .route(web::get().to(get_attr))
                .route(web::put().to(update_attr))
                .route(web::patch().to(partial_update_attr))
                .route(web::delete().to(delete_attr)),
        )
}

/// GET ?assigned_only=1 limits the listing to attrs used by a recipe
pub async fn list_attrs(
    repo: web::Data<dyn Repository>,
    config: web::Data<AppConfig>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    params: web::Query<AttrListParams>,
) -> Result<HttpResponse, AppError> {
    let attrs =
        attr_service::list_attrs(repo.get_ref(), **kind, user.id, &params, config.attr_order)
            .await?;
    Ok(HttpResponse::Ok().json(attrs))
}

pub async fn get_attr(
    repo: web::Data<dyn Repository>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let attr = attr_service::get_attr(repo.get_ref(), **kind, user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(attr))
}

pub async fn create_attr(
    repo: web::Data<dyn Repository>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    request: Payload<AttrRequest>,
) -> Result<HttpResponse, AppError> {
    let attr = attr_service::create_attr(repo.get_ref(), **kind, user.id, &request.into_inner()).await?;
    Ok(HttpResponse::Created().json(attr))
}

pub async fn update_attr(
    repo: web::Data<dyn Repository>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
    request: Payload<AttrRequest>,
) -> Result<HttpResponse, AppError> {
    let attr = attr_service::update_attr(
        repo.get_ref(),
        **kind,
        user.id,
        path.into_inner(),
        &request.into_inner(),
        false,
    )
    .await?;
    Ok(HttpResponse::Ok().json(attr))
}

pub async fn partial_update_attr(
    repo: web::Data<dyn Repository>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
    request: Payload<AttrRequest>,
) -> Result<HttpResponse, AppError> {
    let attr = attr_service::update_attr(
        repo.get_ref(),
        **kind,
        user.id,
        path.into_inner(),
        &request.into_inner(),
        true,
    )
    .await?;
    Ok(HttpResponse::Ok().json(attr))
}

pub async fn delete_attr(
    repo: web::Data<dyn Repository>,
    kind: web::Data<AttrKind>,
    user: web::ReqData<User>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    attr_service::delete_attr(repo.get_ref(), **kind, user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::authorized_user;
    use crate::database::memory::MemoryRepository;
    use crate::database::Repository;
    use crate::models::{AttrKind, NewRecipe};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const TAGS_URL: &str = "/api/recipe/tags/";
    const INGREDIENTS_URL: &str = "/api/recipe/ingredients/";

    fn names(body: &Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[actix_rt::test]
    async fn test_auth_required() {
        let app = test_app!(Arc::new(MemoryRepository::new()));

        for url in [TAGS_URL, INGREDIENTS_URL] {
            let req = test::TestRequest::get().uri(url).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_rt::test]
    async fn test_tags_limited_to_user_and_ordered() {
        let repo = Arc::new(MemoryRepository::new());
        let (user, auth) = authorized_user(&repo, "user@example.com").await;
        let (other, _) = authorized_user(&repo, "other@example.com").await;
        repo.insert_attr(AttrKind::Tag, user.id, "Dessert").await.unwrap();
        repo.insert_attr(AttrKind::Tag, user.id, "Vegan").await.unwrap();
        repo.insert_attr(AttrKind::Tag, other.id, "Fruity").await.unwrap();
        repo.insert_attr(AttrKind::Ingredient, user.id, "Kale").await.unwrap();
        let app = test_app!(repo.clone());

        let req = test::TestRequest::get()
            .uri(TAGS_URL)
            .insert_header(("Authorization", auth))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(names(&body), vec!["Vegan", "Dessert"]);
    }

    #[actix_rt::test]
    async fn test_ingredient_crud() {
        let repo = Arc::new(MemoryRepository::new());
        let (_, auth) = authorized_user(&repo, "user@example.com").await;
        let app = test_app!(repo.clone());

        let req = test::TestRequest::post()
            .uri(INGREDIENTS_URL)
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({"name": "Cabbage"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_i64().unwrap();
        let detail = format!("{}{}/", INGREDIENTS_URL, id);

        let req = test::TestRequest::patch()
            .uri(&detail)
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({"name": "Red cabbage"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"id": id, "name": "Red cabbage"}));

        let req = test::TestRequest::delete()
            .uri(&detail)
            .insert_header(("Authorization", auth.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&detail)
            .insert_header(("Authorization", auth))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_foreign_tag_not_found() {
        let repo = Arc::new(MemoryRepository::new());
        let (_, auth) = authorized_user(&repo, "user@example.com").await;
        let (other, _) = authorized_user(&repo, "other@example.com").await;
        let theirs = repo.insert_attr(AttrKind::Tag, other.id, "Secret").await.unwrap();
        let app = test_app!(repo.clone());

        let req = test::TestRequest::put()
            .uri(&format!("{}{}/", TAGS_URL, theirs.id))
            .insert_header(("Authorization", auth))
            .set_json(json!({"name": "Mine now"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let stored = repo.find_attr(AttrKind::Tag, other.id, theirs.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Secret");
    }

    #[actix_rt::test]
    async fn test_filter_ingredients_assigned_to_recipes() {
        let repo = Arc::new(MemoryRepository::new());
        let (user, auth) = authorized_user(&repo, "user@example.com").await;
        let eggs = repo.insert_attr(AttrKind::Ingredient, user.id, "Eggs").await.unwrap();
        repo.insert_attr(AttrKind::Ingredient, user.id, "Lentils").await.unwrap();
        for title in ["Omelette", "Eggs benedict"] {
            repo.insert_recipe(NewRecipe {
                user_id: user.id,
                title: title.to_string(),
                time_minutes: 10,
                price: 3.0,
                link: String::new(),
                description: String::new(),
                tag_ids: vec![],
                ingredient_ids: vec![eggs.id],
            })
            .await
            .unwrap();
        }
        let app = test_app!(repo.clone());

        let req = test::TestRequest::get()
            .uri(&format!("{}?assigned_only=1", INGREDIENTS_URL))
            .insert_header(("Authorization", auth.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(names(&body), vec!["Eggs"]);

        let req = test::TestRequest::get()
            .uri(&format!("{}?assigned_only=maybe", INGREDIENTS_URL))
            .insert_header(("Authorization", auth))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
