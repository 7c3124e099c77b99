use crate::database::Repository;
use crate::models::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges, UserResponse};
use crate::services::auth_service::hash_password;
use crate::utils::{check_char_field, check_email, check_password, normalize_email, AppError, FieldErrors};

const EMAIL_TAKEN: &str = "user with this email already exists.";

/// Flags `email` when another account already owns it
async fn check_email_available(
    repo: &dyn Repository,
    errors: &mut FieldErrors,
    email: &str,
    current_user: Option<i64>,
) -> Result<(), AppError> {
    if let Some(existing) = repo.find_user_by_email(email).await? {
        if Some(existing.id) != current_user {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    Ok(())
}

/// Registers a new account; the password is stored as a bcrypt hash
pub async fn create_user(
    repo: &dyn Repository,
    request: &CreateUserRequest,
    bcrypt_cost: u32,
) -> Result<UserResponse, AppError> {
    let mut errors = FieldErrors::new();

    let email = check_email(&mut errors, request.email.as_deref(), true).map(|e| normalize_email(&e));
    let password = check_password(&mut errors, request.password.as_deref(), true);
    let name = check_char_field(&mut errors, "name", request.name.as_deref(), true, false);

    if let Some(email) = &email {
        check_email_available(repo, &mut errors, email, None).await?;
    }
    errors.into_result()?;

    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        return Err(AppError::Internal("Validated user fields missing".to_string()));
    };

    let password_hash = hash_password(password, bcrypt_cost).await?;
    let user = repo
        .insert_user(NewUser {
            email,
            password_hash,
            name,
        })
        .await?;

    log::info!("👤 User created: {} (id {})", user.email, user.id);
    Ok(UserResponse::from(user))
}

/// Applies a profile update. `partial` is PATCH semantics; otherwise every field is required.
///
/// A new password is hashed and written on its own after the other fields.
pub async fn update_user(
    repo: &dyn Repository,
    user: &User,
    request: &UpdateUserRequest,
    partial: bool,
    bcrypt_cost: u32,
) -> Result<UserResponse, AppError> {
    let required = !partial;
    let mut errors = FieldErrors::new();

    let email = check_email(&mut errors, request.email.as_deref(), required).map(|e| normalize_email(&e));
    let password = check_password(&mut errors, request.password.as_deref(), required);
    let name = check_char_field(&mut errors, "name", request.name.as_deref(), required, false);

    if let Some(email) = &email {
        if *email != user.email {
            check_email_available(repo, &mut errors, email, Some(user.id)).await?;
        }
    }
    errors.into_result()?;

    let changes = UserChanges { email, name };
    if !changes.is_empty() {
        repo.update_user_profile(user.id, &changes).await?;
    }

    if let Some(password) = password {
        let password_hash = hash_password(password, bcrypt_cost).await?;
        repo.set_user_password(user.id, &password_hash).await?;
        log::info!("🔑 Password changed for user {}", user.id);
    }

    let updated = repo
        .find_user_by_id(user.id)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(UserResponse::from(updated))
}
