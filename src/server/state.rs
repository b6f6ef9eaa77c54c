//! Shared application state for the API server

use crate::snapshot::Snapshot;
use crate::source::DataSource;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Data source handle shared with blocking refresh tasks
pub type SharedSource = Arc<Mutex<Box<dyn DataSource + Send>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Where refreshes read from.
    /// Wrapped in Mutex because SQLite connections are not thread-safe
    pub source: SharedSource,
    /// Current snapshot. Renders clone the inner `Arc`, refreshes swap it.
    pub snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

impl AppState {
    /// Creates the application state and loads the first snapshot from `source`.
    pub fn new(source: impl DataSource + Send + 'static) -> Self {
        let snapshot = Snapshot::refresh(&source);
        AppState::with_snapshot(Box::new(source), snapshot)
    }

    /// Creates the application state around an already loaded snapshot.
    pub fn with_snapshot(source: Box<dyn DataSource + Send>, snapshot: Snapshot) -> Self {
        AppState {
            source: Arc::new(Mutex::new(source)),
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// The snapshot renders should use right now.
    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Makes `snapshot` the current one.
    pub async fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().await = Arc::clone(&snapshot);
        snapshot
    }
}
