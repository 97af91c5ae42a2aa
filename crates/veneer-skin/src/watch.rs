//! Hot-reload signaling.
//!
//! Change detection itself belongs to an external collaborator (a watcher
//! thread, an editor plugin); the engine only consumes a flag. [`ReloadFlag`]
//! is that flag: cheap to clone, safe to set from any thread, consumed on
//! the host's main update callback via
//! [`SkinEngine::reload_if_changed`](crate::SkinEngine::reload_if_changed).
//! [`StampWatcher`] is a minimal polling collaborator for hosts without a
//! native watcher: it compares modification stamps and marks the flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use veneer_types::resources::Resources;

/// Shared "skin files changed" flag.
#[derive(Debug, Clone, Default)]
pub struct ReloadFlag(Arc<AtomicBool>);

impl ReloadFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Called by whatever watches the skin files.
    pub fn mark_changed(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consume the flag: returns whether it was raised, and lowers it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Polling change detector over a fixed path set.
pub struct StampWatcher {
    paths: Vec<String>,
    stamps: Vec<Option<u64>>,
    flag: ReloadFlag,
}

impl StampWatcher {
    /// Snapshot the current stamps of `paths`; later [`poll`](Self::poll)
    /// calls compare against the snapshot.
    pub fn new(res: &dyn Resources, paths: Vec<String>, flag: ReloadFlag) -> Self {
        let stamps = paths.iter().map(|p| res.modified_stamp(p)).collect();
        Self { paths, stamps, flag }
    }

    /// Re-read all stamps; on any change, update the snapshot and raise the
    /// flag. Returns whether anything changed.
    pub fn poll(&mut self, res: &dyn Resources) -> bool {
        let mut changed = false;
        for (path, stamp) in self.paths.iter().zip(self.stamps.iter_mut()) {
            let current = res.modified_stamp(path);
            if current != *stamp {
                *stamp = current;
                changed = true;
            }
        }
        if changed {
            self.flag.mark_changed();
        }
        changed
    }
}
