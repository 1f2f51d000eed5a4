//! Generated module emission
//!
//! Renders discovered routes as a Rust module and writes it to disk.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{GenerateError, RouteDescriptor};

/// Header placed at the top of every generated module.
pub const GENERATED_HEADER: &str = "// @generated by monpress. Do not edit by hand.\n\
// Run `monpress generate` (or `monpress dev`) to refresh this file.\n";

/// Controls how the generated module refers to route files and the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Prefix joined with each route's `import_ref` in `#[path]` attributes.
    /// Relative paths resolve against the directory of the generated file.
    pub import_root: String,
    /// Crate name providing `Routes`
    pub runtime_crate: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            import_root: "../routes".to_string(),
            runtime_crate: "monpress".to_string(),
        }
    }
}

impl EmitOptions {
    fn import_path(&self, route: &RouteDescriptor) -> String {
        format!("{}/{}", self.import_root.trim_end_matches('/'), route.import_ref)
    }
}

fn module_name(index: usize) -> String {
    format!("routes{}", index)
}

/// Renders the generated routes module.
///
/// Each descriptor becomes a `#[path]` module declaration plus one
/// registration per verb inside `router()`.  Descriptors with an invalid
/// path keep their place in the output, with every line commented out.
/// The output depends only on `routes` and `options`.
pub fn render(routes: &[RouteDescriptor], options: &EmitOptions) -> String {
    let mut out = String::from(GENERATED_HEADER);
    out.push('\n');
    let _ = writeln!(out, "use {}::Routes;", options.runtime_crate);

    for (index, route) in routes.iter().enumerate() {
        let disabled = disabled_prefix(route);
        let status = if route.valid {
            "\u{2705}"
        } else {
            "\u{274c} invalid route path, not registered"
        };

        out.push('\n');
        let _ = writeln!(out, "// Route group {} {}", comment_text(&route.path), status);
        let _ = writeln!(out, "{}#[path = {:?}]", disabled, options.import_path(route));
        let _ = writeln!(out, "{}mod {};", disabled, module_name(index));
    }

    out.push_str("\n/// Every route discovered under the route directory.\n");
    out.push_str("#[allow(unused_mut)]\n");
    out.push_str("pub fn router() -> Routes {\n");
    out.push_str("    let mut router = Routes::new();\n");

    for (index, route) in routes.iter().enumerate() {
        let disabled = disabled_prefix(route);

        out.push('\n');
        let _ = writeln!(out, "    // {}", comment_text(&route.path));
        for verb in &route.verbs {
            let _ = writeln!(
                out,
                "    {}router.{}({:?}, {}::{});",
                disabled,
                verb.to_lowercase(),
                route.path,
                module_name(index),
                verb
            );
        }
    }

    out.push_str("\n    router\n}\n");
    out
}

/// Escapes control characters so a path cannot break out of a `//` line.
fn comment_text(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn disabled_prefix(route: &RouteDescriptor) -> &'static str {
    if route.valid {
        ""
    } else {
        "// "
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so readers never observe a partially written module.
///
/// Returns `Ok(false)` without touching the file when it already holds
/// exactly `contents`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<bool, GenerateError> {
    if fs::read_to_string(path).map_or(false, |existing| existing == contents) {
        return Ok(false);
    }

    let write_error = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(true)
}
