//! Bracket parameter tokens in route file paths
//!
//! A directory or file named `[id]` introduces a required parameter, and one
//! named `[id_]` introduces an optional one.  All functions here are pure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::GenerateError;

/// Trailing character that marks a bracket parameter as optional: `[id_]`.
pub const OPTIONAL_MARKER: char = '_';

static BRACKET_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket token pattern is valid"));

/// A path parameter introduced by a `[token]` in a route file's path.
///
/// # Examples
///
/// ```
/// use monpress_router::Param;
///
/// let id = Param::from_token("id");
/// assert!(!id.optional);
/// assert_eq!(id.placeholder(), ":id");
///
/// let slug = Param::from_token("slug_");
/// assert!(slug.optional);
/// assert_eq!(slug.placeholder(), ":slug?");
/// assert_eq!(slug.token(), "[slug_]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Parameter name as it appears in the URL placeholder
    pub name: String,
    /// Whether the parameter was marked optional with a trailing `_`
    pub optional: bool,
}

impl Param {
    /// Classifies the inner text of a bracket token.
    pub fn from_token(token: &str) -> Self {
        match token.strip_suffix(OPTIONAL_MARKER) {
            Some(name) => Param {
                name: name.to_string(),
                optional: true,
            },
            None => Param {
                name: token.to_string(),
                optional: false,
            },
        }
    }

    /// URL placeholder form: `:name` or `:name?`.
    pub fn placeholder(&self) -> String {
        if self.optional {
            format!(":{}?", self.name)
        } else {
            format!(":{}", self.name)
        }
    }

    /// Bracket form this parameter was parsed from: `[name]` or `[name_]`.
    pub fn token(&self) -> String {
        if self.optional {
            format!("[{}{}]", self.name, OPTIONAL_MARKER)
        } else {
            format!("[{}]", self.name)
        }
    }
}

/// Collects every bracket token in a relative route path.
///
/// Tokens are trimmed and their parameter names must be pairwise unique, so
/// `[id]` and `[id_]` clash.  A repeated name is a
/// [`GenerateError::DuplicateParameter`], which aborts the whole generation
/// pass rather than only this file.
///
/// ```
/// use monpress_router::route::pattern::bracket_params;
///
/// let params = bracket_params("users/[id]/posts/[post_].rs").unwrap();
/// assert_eq!(params.len(), 2);
/// assert_eq!(params[1].name, "post");
/// assert!(params[1].optional);
///
/// assert!(bracket_params("a/[id]/b/[id].rs").is_err());
/// assert!(bracket_params("a/[id]/b/[id_].rs").is_err());
/// ```
pub fn bracket_params(relative_path: &str) -> Result<Vec<Param>, GenerateError> {
    let mut params: Vec<Param> = Vec::new();

    for capture in BRACKET_TOKEN.captures_iter(relative_path) {
        let Some(token) = capture.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        let param = Param::from_token(token);
        if params.iter().any(|seen| seen.name == param.name) {
            return Err(GenerateError::DuplicateParameter {
                path: relative_path.to_string(),
                param: param.name,
            });
        }
        params.push(param);
    }

    Ok(params)
}

/// Rewrites every bracket token inside a single path segment into its URL
/// placeholder, leaving surrounding text untouched.
pub fn translate_segment(segment: &str) -> String {
    BRACKET_TOKEN
        .replace_all(segment, |caps: &regex::Captures<'_>| {
            Param::from_token(&caps[1]).placeholder()
        })
        .into_owned()
}
