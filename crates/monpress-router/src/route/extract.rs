//! Exported handler discovery
//!
//! Finds the top-level public bindings in a route file whose names are HTTP
//! verbs.  This is a textual scan, not a Rust parse: it looks for unindented
//! `pub` items so that methods inside `impl` blocks are never picked up.

use once_cell::sync::Lazy;
use regex::Regex;

/// HTTP verbs that a route file may export, lower-cased.
pub const ROUTE_METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

static EXPORTED_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^pub(?:\([^)]*\))?\s+(?:(?:async|const|unsafe)\s+)*(?:fn|const|static)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("exported binding pattern is valid")
});

/// Drops every line whose first non-blank characters are `//`.
pub fn strip_line_comments(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns `true` if `name` is one of [`ROUTE_METHODS`], ignoring case.
pub fn is_route_method(name: &str) -> bool {
    ROUTE_METHODS
        .iter()
        .any(|method| method.eq_ignore_ascii_case(name))
}

/// Lists exported bindings named after an HTTP verb, in source order.
///
/// Names keep their original spelling so the generated module can refer to
/// them directly.
///
/// ```
/// use monpress_router::route::exported_verbs;
///
/// let source = r#"
/// pub fn GET() {}
/// // pub fn POST() {}
/// pub async fn delete() {}
/// pub fn helper() {}
/// "#;
/// assert_eq!(exported_verbs(source), vec!["GET", "delete"]);
/// ```
pub fn exported_verbs(source: &str) -> Vec<String> {
    let uncommented = strip_line_comments(source);

    EXPORTED_BINDING
        .captures_iter(&uncommented)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .filter(|name| is_route_method(name))
        .map(str::to_string)
        .collect()
}
