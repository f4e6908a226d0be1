mod error;
mod password;
mod service;

pub use error::AppError;
pub use password::{PasswordError, hash_password, verify_password};
pub use service::*;
