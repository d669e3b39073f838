//! Catalog parsing and caching.

pub mod cache;
pub mod parser;

pub use cache::{CatalogCache, DEFAULT_CACHE_TTL};
pub use parser::{SyntaxFamily, parse_catalog};
