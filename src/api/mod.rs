mod error;
mod filter;
mod header;

pub use error::*;
pub use filter::*;
pub use header::*;
