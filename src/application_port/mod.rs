mod auth_error;
mod auth_service;

pub use auth_error::*;
pub use auth_service::*;
