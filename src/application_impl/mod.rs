mod auth_session_manager_impl;
mod password_hasher_argon2;
mod refresh_token_store;
mod token_codec_jwt;

pub use auth_session_manager_impl::*;
pub use password_hasher_argon2::*;
pub use refresh_token_store::*;
pub use token_codec_jwt::*;
