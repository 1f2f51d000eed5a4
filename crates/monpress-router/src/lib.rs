//! # Monpress Router
//!
//! File-system based route discovery and code generation for monpress
//! applications.
//!
//! - Static routes (`routes/about.rs` → `/about`)
//! - Index files (`routes/users/index.rs` → `/users`)
//! - Dynamic parameters (`routes/users/[id]/index.rs` → `/users/:id`)
//! - Optional parameters (`routes/docs/[page_].rs` → `/docs/:page?`)
//! - Ignored entries (`routes/_draft/...` contributes nothing)
//!
//! A route file exports one binding per HTTP verb it serves.  The
//! [`Generator`] turns the route tree into a single Rust module whose
//! `router()` function registers every discovered handler.
//!
//! ## Example
//!
//! ```no_run
//! use monpress_router::Generator;
//!
//! let report = Generator::new("src/routes", "src/generated/routes.rs").run()?;
//! println!("{} routes, {} disabled", report.routes, report.disabled);
//! # Ok::<(), monpress_router::GenerateError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

// ============================================================================
// Module Declarations
// ============================================================================

pub mod emit;
mod error;
pub mod path;
pub mod route;
pub mod scan;

pub use emit::{render, write_atomic, EmitOptions};
pub use error::GenerateError;
pub use path::is_valid_route_path;
pub use route::{bracket_params, exported_verbs, to_url_path, Param, ROUTE_METHODS};
pub use scan::{scan, RouteFile, ScanOptions};

// ============================================================================
// Core Types
// ============================================================================

/// One route file that exports at least one verb handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Path of the file relative to the route root, `/`-separated
    pub import_ref: String,
    /// Exported verb bindings, in source order and original spelling
    pub verbs: Vec<String>,
    /// Parameters introduced by bracket tokens in the file's path
    pub params: Vec<Param>,
    /// URL path, e.g. `/users/:id`
    pub path: String,
    /// Whether `path` satisfies the route grammar
    pub valid: bool,
}

impl RouteDescriptor {
    /// Builds the descriptor for one scanned file.
    ///
    /// Returns `Ok(None)` when the file exports no verb handlers.  A file
    /// that cannot be read is logged and treated the same way, but a
    /// duplicated bracket token is always an error.
    pub fn from_file(file: &RouteFile) -> Result<Option<Self>, GenerateError> {
        let params = bracket_params(&file.relative)?;

        let verbs = match fs::read_to_string(&file.path) {
            Ok(source) => exported_verbs(&source),
            Err(e) => {
                warn!(file = %file.relative, error = %e, "could not read route file");
                Vec::new()
            }
        };

        if verbs.is_empty() {
            debug!(file = %file.relative, "no verb exports, skipping");
            return Ok(None);
        }

        let path = to_url_path(&file.relative);
        let valid = is_valid_route_path(&path);

        Ok(Some(Self {
            import_ref: file.relative.clone(),
            verbs,
            params,
            path,
            valid,
        }))
    }
}

/// Scans `root` and builds a descriptor for every file with verb exports.
///
/// Descriptor order follows the scan order.
pub fn discover(root: &Path, options: &ScanOptions) -> Result<Vec<RouteDescriptor>, GenerateError> {
    let mut routes = Vec::new();
    for file in scan(root, options)? {
        if let Some(route) = RouteDescriptor::from_file(&file)? {
            routes.push(route);
        }
    }
    Ok(routes)
}

// ============================================================================
// Generation Pass
// ============================================================================

/// Summary of one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Route files that exported at least one handler
    pub routes: usize,
    /// Of those, how many were emitted disabled
    pub disabled: usize,
    /// Handler registrations emitted enabled
    pub registrations: usize,
    /// Whether the output file was rewritten
    pub written: bool,
}

/// Runs discover → render → write for one route tree.
#[derive(Debug, Clone)]
pub struct Generator {
    routes_dir: PathBuf,
    output: PathBuf,
    scan: ScanOptions,
    emit: EmitOptions,
}

impl Generator {
    pub fn new(routes_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            output: output.into(),
            scan: ScanOptions::default(),
            emit: EmitOptions::default(),
        }
    }

    /// Sets the prefix used in the generated `#[path]` attributes.
    pub fn with_import_root(mut self, import_root: impl Into<String>) -> Self {
        self.emit.import_root = import_root.into();
        self
    }

    /// Sets which file extensions are scanned for handlers.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scan.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Performs one full generation pass.
    ///
    /// Nothing is written if discovery fails, so a bad route tree never
    /// replaces a previously good module.
    pub fn run(&self) -> Result<Report, GenerateError> {
        let routes = discover(&self.routes_dir, &self.scan)?;
        let source = render(&routes, &self.emit);
        let written = write_atomic(&self.output, &source)?;

        let mut report = Report {
            written,
            ..Report::default()
        };
        for route in &routes {
            report.routes += 1;
            if route.valid {
                report.registrations += route.verbs.len();
                info!(path = %route.path, verbs = ?route.verbs, "registered route");
            } else {
                report.disabled += 1;
                warn!(path = %route.path, file = %route.import_ref, "invalid route path, emitted disabled");
            }
        }

        info!(
            routes = report.routes,
            disabled = report.disabled,
            written = report.written,
            output = ?self.output,
            "generation pass complete"
        );
        Ok(report)
    }
}
