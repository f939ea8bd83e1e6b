mod credential_repo;
mod refresh_token_repo;

pub use credential_repo::*;
pub use refresh_token_repo::*;
