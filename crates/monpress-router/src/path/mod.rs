//! Path grammar validation
//!
//! **Pure functions**: given same input, always produce same output with no side effects.

/// Validates a generated URL path against the route grammar.
///
/// # Rules
///
/// - Must start with `/`
/// - Every `/`-separated segment is one of:
///   - empty
///   - a literal made of `A-Z a-z 0-9 . _ ~ -`
///   - a parameter `:name` or `:name?`, where `name` is `A-Z a-z 0-9 _`
///
/// Routes failing this check are still emitted, but disabled.
///
/// # Examples
///
/// ```
/// use monpress_router::path::is_valid_route_path;
///
/// assert!(is_valid_route_path("/"));
/// assert!(is_valid_route_path("/users/:id"));
/// assert!(is_valid_route_path("/docs/:page?"));
/// assert!(is_valid_route_path("/v1.0/health-check"));
///
/// assert!(!is_valid_route_path("about"));
/// assert!(!is_valid_route_path("/Bad Name"));
/// assert!(!is_valid_route_path("/post-:slug"));
/// ```
pub fn is_valid_route_path(path: &str) -> bool {
    path.strip_prefix('/')
        .map(|rest| rest.split('/').all(is_valid_segment))
        .unwrap_or(false)
}

fn is_valid_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return true;
    }

    match segment.strip_prefix(':') {
        Some(param) => {
            let name = param.strip_suffix('?').unwrap_or(param);
            !name.is_empty() && name.chars().all(is_param_char)
        }
        None => segment.chars().all(is_literal_char),
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert!(is_valid_route_path("/"));
        assert!(is_valid_route_path("/about"));
        assert!(is_valid_route_path("/users/:id"));
        assert!(is_valid_route_path("/users/:user_id/posts/:post?"));
        assert!(is_valid_route_path("/users/"));
        assert!(is_valid_route_path("/a//b"));
    }

    #[test]
    fn test_invalid_paths() {
        assert!(!is_valid_route_path(""));
        assert!(!is_valid_route_path("users"));
        assert!(!is_valid_route_path("/users/:"));
        assert!(!is_valid_route_path("/users/:?"));
        assert!(!is_valid_route_path("/users/:id-x"));
        assert!(!is_valid_route_path("/hello world"));
        assert!(!is_valid_route_path("/caf\u{e9}"));
        assert!(!is_valid_route_path("/a\\b"));
    }

    #[test]
    fn test_param_inside_literal_is_invalid() {
        assert!(!is_valid_route_path("/post-:slug"));
    }
}
