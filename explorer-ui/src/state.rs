//! Shared application state for the UI server.

use std::path::Path;
use std::sync::Arc;

use explorer::explorer::Explorer;
use explorer::io::fs_tree::FsTree;
use tokio::sync::broadcast;

/// Events broadcast to SSE clients when the results tree changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeEvent {
    /// The results root itself appeared, disappeared, or gained a subject.
    RootChanged,
    /// Directories changed somewhere under a subject.
    TreeChanged { subject: String },
    /// A file was written inside a run group directory.
    ArtifactWritten {
        subject: String,
        method: String,
        contrast: String,
        run_group: String,
        file: String,
    },
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Option discovery and resolution over the results tree.
    pub explorer: Arc<Explorer<FsTree>>,
    /// Broadcast sender for tree change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(explorer: Explorer<FsTree>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            explorer: Arc::new(explorer),
            event_tx: Arc::new(event_tx),
        }
    }

    /// Root of the results tree.
    pub fn results_dir(&self) -> &Path {
        self.explorer.tree().root()
    }
}
