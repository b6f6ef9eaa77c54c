use crate::records::{ActivityFact, UserDimension};
use std::fmt;

/// The two raw tables the dashboard is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTables {
    pub facts: Vec<ActivityFact>,
    pub dims: Vec<UserDimension>,
}

impl SourceTables {
    /// Creates a new SourceTables.
    pub fn new(facts: Vec<ActivityFact>, dims: Vec<UserDimension>) -> Self {
        SourceTables { facts, dims }
    }

    /// Tables with no rows, used when the source cannot be read.
    pub fn empty() -> Self {
        SourceTables::default()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.dims.is_empty()
    }
}

/// Trait for data source abstraction.
///
/// Implementations hand back both tables in one call so the dashboard never
/// sees half a refresh. Implementations can be:
/// - In-memory vectors (for testing and fixtures)
/// - SQLite database
/// - Any other relational store
pub trait DataSource {
    /// Reads the activity fact and user dimension tables.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached or either query fails.
    fn fetch(&self) -> Result<SourceTables, DataSourceError>;
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn fetch(&self) -> Result<SourceTables, DataSourceError> {
        (**self).fetch()
    }
}

/// Errors that can occur when reading from a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// The store could not be opened or reached
    Unavailable(String),
    /// A query against one of the tables failed
    Query { table: String, message: String },
    /// Configured table name is not a plain SQL identifier
    InvalidTableName(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Unavailable(msg) => write!(f, "Data source unavailable: {}", msg),
            DataSourceError::Query { table, message } => {
                write!(f, "Query on '{}' failed: {}", table, message)
            }
            DataSourceError::InvalidTableName(name) => {
                write!(f, "Invalid table name: '{}'", name)
            }
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Fetches from `source`, substituting empty tables on failure.
///
/// This is the adapter boundary: the fault is logged here and the rest of the
/// pipeline only ever sees well-formed, possibly empty, tables.
pub fn fetch_or_empty(source: &dyn DataSource) -> SourceTables {
    match source.fetch() {
        Ok(tables) => {
            log::info!(
                "Loaded {} activity rows and {} user rows",
                tables.facts.len(),
                tables.dims.len()
            );
            tables
        }
        Err(e) => {
            log::error!("Error fetching data: {}; continuing with empty tables", e);
            SourceTables::empty()
        }
    }
}

/// In-memory data source implementation for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    tables: SourceTables,
}

impl InMemoryDataSource {
    /// Creates a new empty in-memory data source.
    pub fn new() -> Self {
        InMemoryDataSource::default()
    }

    /// Creates a source serving the given rows.
    pub fn with_rows(facts: Vec<ActivityFact>, dims: Vec<UserDimension>) -> Self {
        InMemoryDataSource {
            tables: SourceTables::new(facts, dims),
        }
    }

    pub fn add_fact(&mut self, fact: ActivityFact) {
        self.tables.facts.push(fact);
    }

    pub fn add_dimension(&mut self, dim: UserDimension) {
        self.tables.dims.push(dim);
    }

    /// Clears all rows from the source.
    pub fn clear(&mut self) {
        self.tables = SourceTables::empty();
    }
}

impl DataSource for InMemoryDataSource {
    fn fetch(&self) -> Result<SourceTables, DataSourceError> {
        Ok(self.tables.clone())
    }
}

/// A source that always fails, for exercising the empty-on-fault path.
#[derive(Debug, Clone)]
pub struct UnavailableDataSource {
    reason: String,
}

impl UnavailableDataSource {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableDataSource {
            reason: reason.into(),
        }
    }
}

impl DataSource for UnavailableDataSource {
    fn fetch(&self) -> Result<SourceTables, DataSourceError> {
        Err(DataSourceError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FeatureCounters;

    #[test]
    fn in_memory_source_returns_its_rows() {
        let mut source = InMemoryDataSource::new();
        source.add_fact(
            ActivityFact::from_date_str("1", "2024-01-01", FeatureCounters::default()).unwrap(),
        );
        source.add_dimension(UserDimension::new("1", Some("US")));

        let tables = source.fetch().unwrap();
        assert_eq!(tables.facts.len(), 1);
        assert_eq!(tables.dims.len(), 1);

        source.clear();
        assert!(source.fetch().unwrap().is_empty());
    }

    #[test]
    fn fetch_or_empty_swallows_faults() {
        let source = UnavailableDataSource::new("connection refused");
        assert_eq!(
            source.fetch().unwrap_err(),
            DataSourceError::Unavailable("connection refused".to_string())
        );
        assert!(fetch_or_empty(&source).is_empty());
    }

    #[test]
    fn boxed_sources_delegate() {
        let source: Box<dyn DataSource> = Box::new(InMemoryDataSource::with_rows(
            vec![],
            vec![UserDimension::new("1", None)],
        ));
        assert_eq!(fetch_or_empty(&source).dims.len(), 1);
    }

    #[test]
    fn error_messages_name_the_table() {
        let err = DataSourceError::Query {
            table: "dim_users".to_string(),
            message: "no such table".to_string(),
        };
        assert_eq!(err.to_string(), "Query on 'dim_users' failed: no such table");
    }
}
