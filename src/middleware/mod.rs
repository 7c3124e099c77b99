pub mod auth;
pub mod security_headers;

pub use auth::TokenAuth;
pub use security_headers::SecurityHeaders;
