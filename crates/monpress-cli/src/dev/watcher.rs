use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

/// Directories never worth a regeneration pass.
const IGNORED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// Kind of file system change that reached the dev loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// A file was created or modified
    Changed,
    /// A file was removed
    Removed,
}

/// Represents a file change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub change_type: ChangeType,
}

/// Watches the route directory and forwards relevant changes to the dev loop
pub struct RouteWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl RouteWatcher {
    /// Start watching `routes_dir` recursively.
    ///
    /// Changes to the generated module itself are dropped so that writing it
    /// never triggers another pass.
    pub fn new(routes_dir: &Path, output: &Path, tx: mpsc::Sender<FileChange>) -> Result<Self> {
        let root = routes_dir
            .canonicalize()
            .with_context(|| format!("Route directory not found: {}", routes_dir.display()))?;
        let output = resolve_output(output);

        let event_root = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for change in classify(&event, &event_root, Some(output.as_path())) {
                        trace!(?change, "route change");
                        match tx.try_send(change) {
                            Ok(()) => {}
                            // A pass is already queued and will pick this change up.
                            Err(mpsc::error::TrySendError::Full(_)) => {}
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                debug!("dev loop stopped, dropping change")
                            }
                        }
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        Ok(Self {
            root,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Absolute form of the output path, matching the paths notify reports.
///
/// The module may not exist yet, so its parent is resolved instead.
fn resolve_output(output: &Path) -> PathBuf {
    if let Ok(path) = output.canonicalize() {
        return path;
    }
    match (output.parent(), output.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| output.to_path_buf()),
        _ => output.to_path_buf(),
    }
}

/// Turns a raw notify event into the changes the dev loop cares about.
///
/// Writes to `output` are skipped; its removal still counts.
pub fn classify(event: &Event, root: &Path, output: Option<&Path>) -> Vec<FileChange> {
    let change_type = match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) => ChangeType::Changed,
        EventKind::Remove(_) => ChangeType::Removed,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !is_ignored(root, path))
        .filter(|path| change_type == ChangeType::Removed || output != Some(path.as_path()))
        .map(|path| FileChange {
            path: path.clone(),
            change_type,
        })
        .collect()
}

/// Ignore VCS and build directories, and anything under a `_`-prefixed entry.
fn is_ignored(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);

    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            IGNORED_DIRS.contains(&name.as_ref()) || name.starts_with('_')
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    const ROOT: &str = "/app/src/routes";

    #[test]
    fn test_modify_and_create_are_changes() {
        let modify = event(EventKind::Modify(ModifyKind::Any), "/app/src/routes/index.rs");
        let create = event(EventKind::Create(CreateKind::File), "/app/src/routes/about.rs");

        for e in [modify, create] {
            let changes = classify(&e, Path::new(ROOT), None);
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].change_type, ChangeType::Changed);
        }
    }

    #[test]
    fn test_remove_is_removal() {
        let e = event(EventKind::Remove(RemoveKind::File), "/app/src/routes/index.rs");
        let changes = classify(&e, Path::new(ROOT), None);
        assert_eq!(changes[0].change_type, ChangeType::Removed);
    }

    #[test]
    fn test_access_events_are_dropped() {
        let e = event(EventKind::Access(AccessKind::Any), "/app/src/routes/index.rs");
        assert!(classify(&e, Path::new(ROOT), None).is_empty());
    }

    #[test]
    fn test_ignored_paths() {
        for path in [
            "/app/src/routes/_draft/post.rs",
            "/app/src/routes/blog/_helpers.rs",
            "/app/src/routes/.git/HEAD",
            "/app/src/routes/target/debug/x",
            "/app/src/routes/node_modules/pkg/index.js",
        ] {
            let e = event(EventKind::Modify(ModifyKind::Any), path);
            assert!(classify(&e, Path::new(ROOT), None).is_empty(), "{}", path);
        }
    }

    #[test]
    fn test_ignore_rules_apply_below_root_only() {
        let e = event(EventKind::Modify(ModifyKind::Any), "/_work/app/index.rs");
        assert_eq!(classify(&e, Path::new("/_work/app"), None).len(), 1);
    }

    #[test]
    fn test_output_file_changes_are_dropped() {
        let output = Some(Path::new("/app/src/routes/routes.rs"));
        let change = event(EventKind::Modify(ModifyKind::Any), "/app/src/routes/routes.rs");
        assert!(classify(&change, Path::new(ROOT), output).is_empty());

        let removal = event(EventKind::Remove(RemoveKind::File), "/app/src/routes/routes.rs");
        assert_eq!(classify(&removal, Path::new(ROOT), output).len(), 1);
    }

    #[test]
    fn test_route_sharing_output_file_name_is_a_change() {
        let output = Some(Path::new("/app/src/generated/routes.rs"));
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Any),
        ] {
            let e = event(kind, "/app/src/routes/api/routes.rs");
            let changes = classify(&e, Path::new(ROOT), output);
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].path, PathBuf::from("/app/src/routes/api/routes.rs"));
        }
    }

    #[test]
    fn test_resolve_output_before_first_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolved = resolve_output(&dir.path().join("routes.rs"));
        assert_eq!(resolved, root.join("routes.rs"));
    }
}
