use std::path::PathBuf;

/// Errors that abort a generation pass.
///
/// Per-file read failures are not represented here: they are logged and the
/// file simply contributes no routes.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum GenerateError {
    /// The configured route root is missing or is not a directory.
    #[error("route directory {0:?} does not exist")]
    MissingRoot(PathBuf),

    /// Walking the route tree failed part way through.
    #[error("could not scan route directory {path:?}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The same bracket token appears twice in one route file's path.
    #[error("duplicate route params found in file {path:?}: [{param}]")]
    DuplicateParameter { path: String, param: String },

    /// The generated module could not be written to its destination.
    #[error("could not write generated routes to {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
