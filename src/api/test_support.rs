use crate::database::memory::MemoryRepository;
use crate::database::Repository;
use crate::models::{NewUser, User};
use crate::services::auth_service::hash_password;

pub const PASSWORD: &str = "testpass123";

pub async fn create_user(repo: &MemoryRepository, email: &str) -> User {
    let password_hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
    repo.insert_user(NewUser {
        email: email.to_string(),
        password_hash,
        name: "Test Name".to_string(),
    })
    .await
    .unwrap()
}

/// A stored user plus the `Authorization` header value for it
pub async fn authorized_user(repo: &MemoryRepository, email: &str) -> (User, String) {
    let user = create_user(repo, email).await;
    let token = repo.get_or_create_token(user.id).await.unwrap();
    (user, format!("Token {}", token.key))
}
