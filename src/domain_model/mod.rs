mod credential;
mod refresh_token;
mod session;
mod user;

pub use credential::*;
pub use refresh_token::*;
pub use session::*;
pub use user::*;
