pub mod records;
pub mod join;
pub mod aggregation;
pub mod source;
pub mod sqlite_source;
pub mod snapshot;
pub mod render;
pub mod config;
pub mod server;
pub mod telemetry;
pub mod demo;

pub use records::{
    parse_registration_date, ActivityFact, Feature, FeatureCounters, RecordError, UnifiedRecord,
    UserDimension, UserId,
};
pub use join::join;
pub use aggregation::{
    adoption_rates, country_distribution, daily_active_users, AdoptionRate, CountryCount,
    DashboardView, DauPoint, Panel, PanelKind,
};
pub use source::{
    fetch_or_empty, DataSource, DataSourceError, InMemoryDataSource, SourceTables,
    UnavailableDataSource,
};
pub use sqlite_source::SqliteDataSource;
pub use snapshot::{Snapshot, SnapshotInfo};
pub use render::{CsvReportRenderer, Figure, FigureRenderer, Renderer};
pub use config::{ConfigError, SourceConfig};
pub use server::{run_server, ApiError, AppState, ServerConfig};
