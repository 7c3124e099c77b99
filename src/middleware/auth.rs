use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::database::Repository;
use crate::models::User;
use crate::services::auth_service::{authenticate_token, extract_token, NO_CREDENTIALS};
use crate::utils::AppError;

/// Resolves the `Authorization: Bearer <key>` header to a `User` and stores it
/// in the request extensions, where handlers read it through `web::ReqData<User>`.
pub struct TokenAuth;

impl<S, B> Transform<S, ServiceRequest> for TokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct TokenAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TokenAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let repo = req.app_data::<web::Data<dyn Repository>>().cloned();

        Box::pin(async move {
            // Rejections become responses here instead of propagating as errors
            match resolve_user(header, repo).await {
                Ok(user) => {
                    log::debug!("🔐 Authenticated user {}", user.id);
                    req.extensions_mut().insert(user);
                    service.call(req).await.map(|res| res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn resolve_user(
    header: Option<String>,
    repo: Option<web::Data<dyn Repository>>,
) -> Result<User, AppError> {
    let key = extract_token(header.as_deref())?
        .ok_or_else(|| AppError::Unauthorized(NO_CREDENTIALS.to_string()))?;

    let repo = repo.ok_or_else(|| {
        AppError::Internal("Repository not registered as app data".to_string())
    })?;

    authenticate_token(repo.get_ref(), &key).await
}
