pub mod attr_service;
pub mod auth_service;
pub mod recipe_service;
pub mod user_service;
