//! API request handlers.

mod files;

pub use files::*;
