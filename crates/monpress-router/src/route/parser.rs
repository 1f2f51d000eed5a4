//! File path to URL path translation
//!
//! Pure functions: a relative route file path (always `/`-separated, relative
//! to the route root) maps to exactly one URL path.

use super::pattern::translate_segment;

/// File name prefix whose segment is dropped from the URL: `index.rs`,
/// `index.test.rs`.
pub const INDEX_PREFIX: &str = "index.";

/// Removes the final extension from a file name: `about.rs` → `about`.
///
/// A name without an extension, or ending in a bare dot, is returned as is.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => file_name,
    }
}

/// Translates a relative route file path into its URL path.
///
/// - any file named `index.*` contributes no segment
/// - any other file contributes its name minus the extension
/// - `[name]` becomes `:name`, `[name_]` becomes `:name?`
/// - everything else passes through literally
///
/// # Examples
///
/// ```
/// use monpress_router::route::parser::to_url_path;
///
/// assert_eq!(to_url_path("index.rs"), "/");
/// assert_eq!(to_url_path("about.rs"), "/about");
/// assert_eq!(to_url_path("users/[id]/index.rs"), "/users/:id");
/// assert_eq!(to_url_path("posts/[slug_].rs"), "/posts/:slug?");
/// ```
pub fn to_url_path(relative_path: &str) -> String {
    let mut parts: Vec<&str> = relative_path.split('/').filter(|p| !p.is_empty()).collect();

    let file_name = parts.pop();

    let mut segments: Vec<String> = parts.into_iter().map(translate_segment).collect();
    if let Some(name) = file_name.filter(|name| !name.starts_with(INDEX_PREFIX)) {
        segments.push(translate_segment(strip_extension(name)));
    }

    format!("/{}", segments.join("/"))
}
