//! Shared helpers for pulling structured content out of model replies

pub mod text;
pub mod yaml;

pub use text::{extract_fenced, truncate_chars};
pub use yaml::{clean_yaml, extract_yaml, parse_yaml};
