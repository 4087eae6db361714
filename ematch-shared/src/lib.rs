pub mod clients;
pub mod errors;
pub mod middleware;
pub mod sanitize;
pub mod types;
pub mod upload;

pub use errors::{AppError, AppResult, ErrorCode, Severity};
pub use types::*;
