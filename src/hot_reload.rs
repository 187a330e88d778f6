//! # Hot Reload
//!
//! Watches the configuration file of a running service and rebuilds the
//! operation registry when it changes.
//!
//! ## Reload Process
//!
//! 1. **Detection** - `notify` reports a modify or create event for the file
//! 2. **Parse** - the document is loaded and its IR built
//! 3. **Bind** - a fresh registry is built from the IR and the handler module
//!    (fail-fast, exactly as at startup)
//! 4. **Match** - the new registry must bind exactly the queries and mutations
//!    of the running one; the served schema and resolver bindings are compiled
//!    in, so adding, removing or renaming an operation needs a rebuild
//! 5. **Swap** - the new registry replaces the old one atomically
//!
//! Requests already in flight finish against the registry snapshot they
//! started with. If any step fails the error is logged and the previous
//! registry stays active.
//!
//! ```rust,ignore
//! let _watcher = watch_config("grip.yaml", Arc::new(handlers::handler_module()), service.shared_registry())?;
//! ```

use crate::config::load_config;
use crate::error::GripError;
use crate::ir::{build_ir, OperationKind};
use crate::registry::{HandlerModule, OperationRegistry, SharedRegistry};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Rebuild the registry from the configuration at `path` and install it
///
/// # Errors
///
/// Any configuration, IR or handler-binding error, and
/// [`GripError::ConfigStructure`] when the edited configuration declares a
/// different set of operations than the running registry serves; `shared` is
/// left untouched.
pub fn reload_registry(
    path: &Path,
    handlers: &HandlerModule,
    shared: &SharedRegistry,
) -> Result<(), GripError> {
    let config = load_config(path)?;
    let ir = build_ir(&config)?;
    let registry = OperationRegistry::from_ir(&ir, handlers)?;
    check_same_operations(&shared.load(), &registry)?;
    shared.replace(registry);
    info!(path = %path.display(), "hot-reload: operation registry rebuilt");
    Ok(())
}

fn check_same_operations(
    current: &OperationRegistry,
    reloaded: &OperationRegistry,
) -> Result<(), GripError> {
    for kind in [OperationKind::Query, OperationKind::Mutation] {
        let served = current.names(kind);
        let declared = reloaded.names(kind);
        if served != declared {
            return Err(GripError::structure(
                kind.section(),
                format!(
                    "declares {kind} operations [{}] but the running service serves [{}]; rebuild the project to change operations",
                    declared.join(", "),
                    served.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

/// Watch a configuration file and rebuild the registry when it changes
///
/// The returned watcher must be kept alive for watching to continue.
pub fn watch_config<P>(
    config_path: P,
    handlers: Arc<HandlerModule>,
    shared: SharedRegistry,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = config_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    if let Err(e) = reload_registry(&watch_path, &handlers, &shared) {
                        error!(
                            path = %watch_path.display(),
                            error = %e,
                            "hot-reload failed; keeping previous registry"
                        );
                    }
                }
            }
            Err(e) => warn!(error = ?e, "watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "watching configuration for changes");
    Ok(watcher)
}
