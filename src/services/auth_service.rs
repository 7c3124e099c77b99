use actix_web::web;

use crate::database::Repository;
use crate::models::{AuthTokenRequest, TokenResponse, User};
use crate::utils::{check_char_field, is_valid_email, AppError, FieldErrors, INVALID_EMAIL, REQUIRED};

pub const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";
pub const NO_CREDENTIALS: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const INACTIVE_USER: &str = "User inactive or deleted.";

/// Accepted `Authorization` keywords, compared case-insensitively
const AUTH_KEYWORDS: [&str; 2] = ["bearer", "token"];

/// bcrypt on the blocking pool
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let result = web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;

    match result {
        Ok(valid) => Ok(valid),
        Err(e) => {
            log::warn!("⚠️  Stored password hash unreadable: {}", e);
            Ok(false)
        }
    }
}

/// Pulls the token key out of an `Authorization` header value.
///
/// `Ok(None)` means the request carries no token credentials at all.
pub fn extract_token(header: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let mut parts = header.split_whitespace();
    let keyword = match parts.next() {
        Some(keyword) => keyword.to_ascii_lowercase(),
        None => return Ok(None),
    };
    if !AUTH_KEYWORDS.contains(&keyword.as_str()) {
        return Ok(None);
    }

    let Some(key) = parts.next() else {
        return Err(AppError::Unauthorized(
            "Invalid token header. No credentials provided.".to_string(),
        ));
    };
    if parts.next().is_some() {
        return Err(AppError::Unauthorized(
            "Invalid token header. Token string should not contain spaces.".to_string(),
        ));
    }

    Ok(Some(key.to_string()))
}

/// Resolves a token key to its active owner
pub async fn authenticate_token(repo: &dyn Repository, key: &str) -> Result<User, AppError> {
    let token = repo
        .find_token(key)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    match repo.find_user_by_id(token.user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::Unauthorized(INACTIVE_USER.to_string())),
    }
}

/// Email/password check. Every failure past field validation looks the same to the caller.
pub async fn authenticate(
    repo: &dyn Repository,
    request: &AuthTokenRequest,
) -> Result<User, AppError> {
    let mut errors = FieldErrors::new();

    let email = check_char_field(&mut errors, "email", request.email.as_deref(), true, false);
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", INVALID_EMAIL);
        }
    }
    if request.password.is_none() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    let (Some(email), Some(password)) = (email, request.password.clone()) else {
        return Err(AppError::Authorization(BAD_CREDENTIALS.to_string()));
    };

    if password.is_empty() {
        return Err(AppError::Authorization(BAD_CREDENTIALS.to_string()));
    }

    let Some(user) = repo.find_user_by_email(&email).await? else {
        return Err(AppError::Authorization(BAD_CREDENTIALS.to_string()));
    };

    if !verify_password(password, user.password.clone()).await? || !user.is_active {
        return Err(AppError::Authorization(BAD_CREDENTIALS.to_string()));
    }

    Ok(user)
}

/// Exchanges credentials for the user's token, creating it on first use
pub async fn issue_token(
    repo: &dyn Repository,
    request: &AuthTokenRequest,
) -> Result<TokenResponse, AppError> {
    let user = authenticate(repo, request).await?;
    let token = repo.get_or_create_token(user.id).await?;

    Ok(TokenResponse { token: token.key })
}
