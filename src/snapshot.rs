//! Immutable joined record set the dashboard renders from.

use crate::aggregation::{DashboardView, Panel, PanelKind};
use crate::join::join;
use crate::records::UnifiedRecord;
use crate::source::{fetch_or_empty, DataSource, SourceTables};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A joined record set plus when and from how many fact rows it was built.
///
/// Snapshots are never mutated. Refreshing builds a new one, so a renderer
/// holding the previous snapshot keeps a consistent view.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: Uuid,
    loaded_at: DateTime<Utc>,
    fact_rows: usize,
    records: Vec<UnifiedRecord>,
}

/// Serializable summary of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub fact_rows: usize,
    pub record_count: usize,
}

impl Snapshot {
    /// A snapshot with no records.
    pub fn empty() -> Self {
        Snapshot::from_tables(SourceTables::empty())
    }

    /// Joins `tables` into a new snapshot.
    pub fn from_tables(tables: SourceTables) -> Self {
        let records = join(&tables.facts, &tables.dims);
        Snapshot {
            id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            fact_rows: tables.facts.len(),
            records,
        }
    }

    /// Reads `source` and builds a fresh snapshot.
    ///
    /// Source faults are logged and produce an empty snapshot, which renders
    /// as "no data" like an empty store does.
    pub fn refresh(source: &dyn DataSource) -> Self {
        let snapshot = Snapshot::from_tables(fetch_or_empty(source));
        log::info!(
            "Snapshot {} ready with {} unified records",
            snapshot.id,
            snapshot.records.len()
        );
        snapshot
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn records(&self) -> &[UnifiedRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            id: self.id,
            loaded_at: self.loaded_at,
            fact_rows: self.fact_rows,
            record_count: self.records.len(),
        }
    }

    /// Derives a single chart's series from this snapshot.
    pub fn panel(&self, kind: PanelKind) -> Panel {
        kind.compute(&self.records)
    }

    /// Derives all three charts' series from this snapshot.
    pub fn view(&self) -> DashboardView {
        DashboardView::compute(&self.records)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::empty()
    }
}
