//! API request handlers.

mod health;
mod page;
mod split;

pub use health::*;
pub use page::*;
pub use split::*;
