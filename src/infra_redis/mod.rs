mod refresh_token_repo_redis;

pub use refresh_token_repo_redis::*;
