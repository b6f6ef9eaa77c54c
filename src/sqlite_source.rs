use crate::config::SourceConfig;
use crate::records::{
    parse_registration_date, timestamp_from_epoch, ActivityFact, Feature, FeatureCounters,
    UserDimension, UserId,
};
use crate::source::{DataSource, DataSourceError, SourceTables};
use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Result as SqliteResult};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-based data source implementation.
///
/// Reads the activity fact and user dimension tables named in its
/// [`SourceConfig`]. Sources opened with [`SqliteDataSource::open`] never
/// write to the store; [`SqliteDataSource::create`] sets up the schema for
/// loading data.
#[derive(Debug)]
pub struct SqliteDataSource {
    conn: Connection,
    fact_table: String,
    dim_table: String,
}

impl SqliteDataSource {
    /// Opens an existing database read-only.
    ///
    /// # Arguments
    /// * `config` - Database path and table names. The file must already exist.
    ///
    /// # Returns
    /// Returns `Ok(SqliteDataSource)` if successful. Missing tables are not an
    /// error here; they surface as a query error on [`DataSource::fetch`].
    ///
    /// # Errors
    /// Returns an error if a table name is not a plain identifier or the
    /// database cannot be opened.
    pub fn open(config: &SourceConfig) -> Result<Self, DataSourceError> {
        config
            .validate()
            .map_err(|e| DataSourceError::InvalidTableName(e.to_string()))?;
        let conn = Connection::open_with_flags(
            Path::new(&config.database_path),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DataSourceError::Unavailable(e.to_string()))?;
        Ok(Self::with_connection(conn, config))
    }

    /// Opens (or creates) a database for writing and ensures both tables exist.
    ///
    /// # Arguments
    /// * `config` - Database path and table names. If the file doesn't exist, it will be created.
    ///
    /// # Returns
    /// Returns `Ok(SqliteDataSource)` if successful, or an error if connection fails.
    ///
    /// # Errors
    /// Returns an error if a table name is not a plain identifier, the
    /// database cannot be opened, or schema creation fails.
    pub fn create(config: &SourceConfig) -> Result<Self, DataSourceError> {
        config
            .validate()
            .map_err(|e| DataSourceError::InvalidTableName(e.to_string()))?;
        let conn = Connection::open(Path::new(&config.database_path))
            .map_err(|e| DataSourceError::Unavailable(e.to_string()))?;
        Self::with_schema(Self::with_connection(conn, config))
    }

    /// Creates a data source over an in-memory database with default table names.
    ///
    /// Useful for testing.
    ///
    /// # Returns
    /// Returns `Ok(SqliteDataSource)` with both tables created, or an error if
    /// connection fails.
    pub fn new_in_memory() -> Result<Self, DataSourceError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DataSourceError::Unavailable(e.to_string()))?;
        Self::with_schema(Self::with_connection(conn, &SourceConfig::default()))
    }

    fn with_connection(conn: Connection, config: &SourceConfig) -> Self {
        SqliteDataSource {
            conn,
            fact_table: config.fact_table.clone(),
            dim_table: config.dim_table.clone(),
        }
    }

    fn with_schema(source: Self) -> Result<Self, DataSourceError> {
        source
            .ensure_schema()
            .map_err(|e| DataSourceError::Unavailable(format!("schema setup failed: {}", e)))?;
        Ok(source)
    }

    /// Ensures both tables exist, creating them if they don't.
    pub fn ensure_schema(&self) -> SqliteResult<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    user_id TEXT NOT NULL,
                    registration_date TEXT,
                    total_resumes_uploaded INTEGER,
                    total_applications INTEGER,
                    total_courses_enrolled INTEGER,
                    total_assessments_taken INTEGER
                )",
                self.fact_table
            ),
            [],
        )?;

        // No primary key: duplicate users are resolved by the join, not the store.
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    user_id TEXT NOT NULL,
                    country TEXT
                )",
                self.dim_table
            ),
            [],
        )?;

        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_user_id ON {0}(user_id)",
                self.fact_table
            ),
            [],
        )?;
        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_user_id ON {0}(user_id)",
                self.dim_table
            ),
            [],
        )?;

        Ok(())
    }

    /// Checks if a table exists in the database.
    pub fn table_exists(&self, table_name: &str) -> SqliteResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
        stmt.exists([table_name])
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn insert_fact(&self, fact: &ActivityFact) -> SqliteResult<()> {
        insert_fact_with(&self.conn, &self.fact_table, fact)
    }

    pub fn insert_dimension(&self, dim: &UserDimension) -> SqliteResult<()> {
        insert_dimension_with(&self.conn, &self.dim_table, dim)
    }

    /// Inserts both tables' rows in a single transaction.
    pub fn insert_batch(
        &mut self,
        facts: &[ActivityFact],
        dims: &[UserDimension],
    ) -> SqliteResult<()> {
        let tx = self.conn.transaction()?;
        for dim in dims {
            insert_dimension_with(&tx, &self.dim_table, dim)?;
        }
        for fact in facts {
            insert_fact_with(&tx, &self.fact_table, fact)?;
        }
        tx.commit()
    }

    /// Deletes every row from both tables.
    pub fn clear(&self) -> SqliteResult<()> {
        self.conn
            .execute(&format!("DELETE FROM {}", self.fact_table), [])?;
        self.conn
            .execute(&format!("DELETE FROM {}", self.dim_table), [])?;
        Ok(())
    }

    fn query_error(&self, table: &str) -> impl Fn(rusqlite::Error) -> DataSourceError {
        let table = table.to_string();
        move |e| DataSourceError::Query {
            table: table.clone(),
            message: e.to_string(),
        }
    }

    fn load_facts(&self) -> Result<Vec<ActivityFact>, DataSourceError> {
        let to_err = self.query_error(&self.fact_table);
        let columns: Vec<&str> = Feature::ALL.iter().map(Feature::column).collect();
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT user_id, registration_date, {} FROM {} ORDER BY rowid",
                columns.join(", "),
                self.fact_table
            ))
            .map_err(&to_err)?;

        let rows = stmt
            .query_map([], |row| {
                let Some(user_id) = user_id_from(row.get_ref(0)?) else {
                    return Ok(None);
                };
                let registered_at = registered_at_from(row.get_ref(1)?);
                let counters = FeatureCounters::new(
                    counter_from(row.get_ref(2)?, Feature::ResumesUploaded),
                    counter_from(row.get_ref(3)?, Feature::ApplicationsSubmitted),
                    counter_from(row.get_ref(4)?, Feature::CoursesEnrolled),
                    counter_from(row.get_ref(5)?, Feature::AssessmentsTaken),
                );
                Ok(Some(ActivityFact::new(user_id, registered_at, counters)))
            })
            .map_err(&to_err)?;

        let mut facts = Vec::new();
        let mut skipped = 0usize;
        for row_result in rows {
            match row_result.map_err(&to_err)? {
                Some(fact) => facts.push(fact),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} fact rows without a user_id", skipped);
        }
        Ok(facts)
    }

    fn load_dimensions(&self) -> Result<Vec<UserDimension>, DataSourceError> {
        let to_err = self.query_error(&self.dim_table);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT user_id, country FROM {} ORDER BY rowid",
                self.dim_table
            ))
            .map_err(&to_err)?;

        let rows = stmt
            .query_map([], |row| {
                let user_id = user_id_from(row.get_ref(0)?);
                let country = country_from(row.get_ref(1)?);
                Ok(user_id.map(|user_id| UserDimension { user_id, country }))
            })
            .map_err(&to_err)?;

        let mut dims = Vec::new();
        for row_result in rows {
            if let Some(dim) = row_result.map_err(&to_err)? {
                dims.push(dim);
            }
        }
        Ok(dims)
    }
}

impl DataSource for SqliteDataSource {
    fn fetch(&self) -> Result<SourceTables, DataSourceError> {
        let facts = self.load_facts()?;
        let dims = self.load_dimensions()?;
        Ok(SourceTables::new(facts, dims))
    }
}

fn insert_fact_with(conn: &Connection, table: &str, fact: &ActivityFact) -> SqliteResult<()> {
    let c = &fact.counters;
    conn.execute(
        &format!(
            "INSERT INTO {} (user_id, registration_date, total_resumes_uploaded,
                total_applications, total_courses_enrolled, total_assessments_taken)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            table
        ),
        params![
            fact.user_id.as_str(),
            fact.registered_at
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
            to_sql_int(c.resumes_uploaded),
            to_sql_int(c.applications),
            to_sql_int(c.courses_enrolled),
            to_sql_int(c.assessments_taken),
        ],
    )?;
    Ok(())
}

fn insert_dimension_with(conn: &Connection, table: &str, dim: &UserDimension) -> SqliteResult<()> {
    conn.execute(
        &format!("INSERT INTO {} (user_id, country) VALUES (?1, ?2)", table),
        params![dim.user_id.as_str(), dim.country.as_deref()],
    )?;
    Ok(())
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn user_id_from(value: ValueRef<'_>) -> Option<UserId> {
    match value {
        ValueRef::Integer(id) => Some(UserId::from(id)),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| UserId::from(trimmed))
        }
        ValueRef::Real(id) if id.fract() == 0.0 => Some(UserId::from(id as i64)),
        _ => None,
    }
}

fn country_from(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        // Coded labels, e.g. ISO 3166 numeric codes
        ValueRef::Integer(code) => Some(code.to_string()),
        ValueRef::Real(code) if code.fract() == 0.0 => Some((code as i64).to_string()),
        ValueRef::Real(code) => Some(code.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn registered_at_from(value: ValueRef<'_>) -> Option<NaiveDateTime> {
    let parsed = match value {
        ValueRef::Null => return None,
        // TEXT affinity turns epoch integers into digit strings.
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            parse_registration_date(&text).or_else(|e| {
                text.trim()
                    .parse::<i64>()
                    .map_err(|_| e)
                    .and_then(timestamp_from_epoch)
            })
        }
        ValueRef::Integer(secs) => timestamp_from_epoch(secs),
        ValueRef::Real(secs) => timestamp_from_epoch(secs.trunc() as i64),
        ValueRef::Blob(_) => return None,
    };
    match parsed {
        Ok(ts) => Some(ts),
        Err(e) => {
            log::warn!("Unreadable registration_date treated as missing: {}", e);
            None
        }
    }
}

fn counter_from(value: ValueRef<'_>, feature: Feature) -> u64 {
    let raw = match value {
        ValueRef::Integer(n) => n,
        ValueRef::Real(n) => n.trunc() as i64,
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).trim().parse().unwrap_or(0),
        ValueRef::Null | ValueRef::Blob(_) => 0,
    };
    if raw < 0 {
        log::warn!("Negative {} counter {} clamped to zero", feature.column(), raw);
        return 0;
    }
    raw as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn source() -> SqliteDataSource {
        SqliteDataSource::new_in_memory().unwrap()
    }

    fn temp_db_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dashboard-test-{}.db", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_schema_created_on_open() {
        let source = source();
        assert!(source.table_exists("fact_user_activity").unwrap());
        assert!(source.table_exists("dim_users").unwrap());
        assert!(!source.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_schema_creation_idempotent() {
        let source = source();
        source.ensure_schema().unwrap();
        assert!(source.table_exists("dim_users").unwrap());
    }

    #[test]
    fn test_fresh_database_reads_empty() {
        let tables = source().fetch().unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_insert_and_fetch_round_trip() {
        let mut source = source();
        let facts = vec![
            ActivityFact::from_date_str("1", "2024-01-01 09:15:00", FeatureCounters::new(1, 0, 2, 0))
                .unwrap(),
            ActivityFact::new("2", None, FeatureCounters::default()),
        ];
        let dims = vec![
            UserDimension::new("1", Some("US")),
            UserDimension::new("2", None),
        ];
        source.insert_batch(&facts, &dims).unwrap();

        let tables = source.fetch().unwrap();
        assert_eq!(tables.facts, facts);
        assert_eq!(tables.dims, dims);
    }

    #[test]
    fn test_reads_loosely_typed_columns() {
        let source = source();
        let conn = source.connection();
        conn.execute(
            "INSERT INTO fact_user_activity VALUES (7, 1704153600, NULL, '3', 1.0, -2)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO fact_user_activity VALUES ('8', 'not a date', 1, 0, 0, 0)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO fact_user_activity VALUES ('  ', '2024-01-01', 1, 0, 0, 0)", [])
            .unwrap();

        let facts = source.fetch().unwrap().facts;
        assert_eq!(facts.len(), 2, "blank user_id row is skipped");

        assert_eq!(facts[0].user_id, UserId::from("7"));
        assert_eq!(
            facts[0].registered_at.map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(facts[0].counters, FeatureCounters::new(0, 3, 1, 0));

        assert_eq!(facts[1].registered_at, None);
    }

    #[test]
    fn test_reads_coded_country_labels() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE dim_users (user_id, country);
             INSERT INTO dim_users VALUES (1, 840);
             INSERT INTO dim_users VALUES (2, 124.0);
             INSERT INTO dim_users VALUES (3, X'00ff');
             INSERT INTO dim_users VALUES (4, 'BR');",
        )
        .unwrap();
        let source = SqliteDataSource::with_connection(conn, &SourceConfig::default());

        let dims = source.load_dimensions().unwrap();
        let countries: Vec<_> = dims.iter().map(|d| d.country.as_deref()).collect();
        assert_eq!(countries, vec![Some("840"), Some("124"), None, Some("BR")]);
    }

    #[test]
    fn test_compact_text_date_is_not_an_epoch() {
        let source = source();
        source
            .connection()
            .execute(
                "INSERT INTO fact_user_activity VALUES ('1', '20240101', 1, 0, 0, 0)",
                [],
            )
            .unwrap();

        let facts = source.fetch().unwrap().facts;
        assert_eq!(
            facts[0].registered_at.map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn test_dimension_rows_keep_store_order() {
        let source = source();
        source.insert_dimension(&UserDimension::new("1", Some("US"))).unwrap();
        source.insert_dimension(&UserDimension::new("1", Some("MX"))).unwrap();

        let dims = source.fetch().unwrap().dims;
        assert_eq!(dims[0].country.as_deref(), Some("US"));
        assert_eq!(dims[1].country.as_deref(), Some("MX"));
    }

    #[test]
    fn test_custom_table_names() {
        let path = temp_db_path();
        let config = SourceConfig {
            database_path: path.to_string_lossy().to_string(),
            fact_table: "activity".to_string(),
            dim_table: "users".to_string(),
        };
        let source = SqliteDataSource::create(&config).unwrap();
        assert!(source.table_exists("activity").unwrap());
        assert!(source.table_exists("users").unwrap());
        source.insert_dimension(&UserDimension::new("1", Some("US"))).unwrap();
        drop(source);

        let reader = SqliteDataSource::open(&config).unwrap();
        assert_eq!(reader.fetch().unwrap().dims.len(), 1);
        drop(reader);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_open_reads_without_touching_schema() {
        let path = temp_db_path();
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE fact_user_activity (user_id, registration_date,
                    total_resumes_uploaded, total_applications,
                    total_courses_enrolled, total_assessments_taken);
                 CREATE TABLE dim_users (user_id, country);
                 INSERT INTO fact_user_activity VALUES (1, '2024-01-01', 1, 0, 0, 0);
                 INSERT INTO dim_users VALUES (1, 'US');",
            )
            .unwrap();
        }

        let source = SqliteDataSource::open(&SourceConfig::new(path.to_string_lossy())).unwrap();
        let tables = source.fetch().unwrap();
        assert_eq!(tables.facts.len(), 1);
        assert_eq!(tables.dims.len(), 1);

        let indexes: i64 = source
            .connection()
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type='index'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(indexes, 0);
        assert!(source
            .connection()
            .execute("CREATE INDEX idx_dim_user ON dim_users(user_id)", [])
            .is_err());

        drop(source);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_open_with_missing_tables_reads_as_no_data() {
        let path = temp_db_path();
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (id INTEGER)")
            .unwrap();

        let source = SqliteDataSource::open(&SourceConfig::new(path.to_string_lossy())).unwrap();
        assert!(matches!(source.fetch(), Err(DataSourceError::Query { .. })));
        assert!(crate::source::fetch_or_empty(&source).is_empty());
        assert!(!source.table_exists("fact_user_activity").unwrap());

        drop(source);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_open_missing_file_is_unavailable() {
        let path = temp_db_path();
        assert!(matches!(
            SqliteDataSource::open(&SourceConfig::new(path.to_string_lossy())),
            Err(DataSourceError::Unavailable(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let config = SourceConfig {
            fact_table: "facts; --".to_string(),
            ..SourceConfig::new(":memory:")
        };
        assert!(matches!(
            SqliteDataSource::open(&config),
            Err(DataSourceError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_clear_removes_rows() {
        let source = source();
        source.insert_dimension(&UserDimension::new("1", Some("US"))).unwrap();
        source.clear().unwrap();
        assert!(source.fetch().unwrap().is_empty());
    }
}
