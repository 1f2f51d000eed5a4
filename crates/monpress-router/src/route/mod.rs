//! Route module for file-based routing
//!
//! Contains the pure pieces of route discovery: bracket token parsing,
//! file path to URL translation, and exported verb extraction.

pub mod extract;
pub mod parser;
pub mod pattern;

// Re-export commonly used types
pub use extract::{exported_verbs, ROUTE_METHODS};
pub use parser::to_url_path;
pub use pattern::{bracket_params, Param};
