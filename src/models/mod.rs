pub mod attr;
pub mod recipe;
pub mod token;
pub mod user;

pub use attr::*;
pub use recipe::*;
pub use token::*;
pub use user::*;
