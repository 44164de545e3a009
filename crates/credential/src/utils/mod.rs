//! Utility modules

pub mod secret_string;
pub mod validation;

pub use secret_string::SecretString;
pub use validation::{MAX_DATABASE_NAME_LEN, validate_database_name};
