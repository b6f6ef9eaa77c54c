use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier shared by fact and dimension rows.
///
/// Integer identifiers coming from the store are kept in their decimal text
/// form so that `42` and `"42"` join to the same user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId.
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id.to_string())
    }
}

/// Tracked product features, in the order the dashboard presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    ResumesUploaded,
    ApplicationsSubmitted,
    CoursesEnrolled,
    AssessmentsTaken,
}

impl Feature {
    /// Every feature in presentation order.
    pub const ALL: [Feature; 4] = [
        Feature::ResumesUploaded,
        Feature::ApplicationsSubmitted,
        Feature::CoursesEnrolled,
        Feature::AssessmentsTaken,
    ];

    /// Human readable label used on charts and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Feature::ResumesUploaded => "Resumes Uploaded",
            Feature::ApplicationsSubmitted => "Applications Submitted",
            Feature::CoursesEnrolled => "Courses Enrolled",
            Feature::AssessmentsTaken => "Assessments Taken",
        }
    }

    /// Column holding this feature's counter in the fact table.
    pub fn column(&self) -> &'static str {
        match self {
            Feature::ResumesUploaded => "total_resumes_uploaded",
            Feature::ApplicationsSubmitted => "total_applications",
            Feature::CoursesEnrolled => "total_courses_enrolled",
            Feature::AssessmentsTaken => "total_assessments_taken",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cumulative per-feature usage counters of one activity snapshot.
///
/// A counter the store left empty is read as zero, i.e. "not adopted".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounters {
    pub resumes_uploaded: u64,
    pub applications: u64,
    pub courses_enrolled: u64,
    pub assessments_taken: u64,
}

impl FeatureCounters {
    /// Creates counters in presentation order.
    pub fn new(
        resumes_uploaded: u64,
        applications: u64,
        courses_enrolled: u64,
        assessments_taken: u64,
    ) -> Self {
        FeatureCounters {
            resumes_uploaded,
            applications,
            courses_enrolled,
            assessments_taken,
        }
    }

    pub fn get(&self, feature: Feature) -> u64 {
        match feature {
            Feature::ResumesUploaded => self.resumes_uploaded,
            Feature::ApplicationsSubmitted => self.applications,
            Feature::CoursesEnrolled => self.courses_enrolled,
            Feature::AssessmentsTaken => self.assessments_taken,
        }
    }

    /// Returns true if the user has used `feature` at least once.
    pub fn has_adopted(&self, feature: Feature) -> bool {
        self.get(feature) > 0
    }
}

/// One row of the activity fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFact {
    /// Foreign key into the user dimension
    pub user_id: UserId,
    /// Registration timestamp; `None` when the source value was missing or unreadable
    pub registered_at: Option<NaiveDateTime>,
    /// Feature usage counters
    pub counters: FeatureCounters,
}

impl ActivityFact {
    /// Creates a new ActivityFact.
    pub fn new(
        user_id: impl Into<UserId>,
        registered_at: Option<NaiveDateTime>,
        counters: FeatureCounters,
    ) -> Self {
        ActivityFact {
            user_id: user_id.into(),
            registered_at,
            counters,
        }
    }

    /// Creates a fact from a date-like string, see [`parse_registration_date`].
    pub fn from_date_str(
        user_id: impl Into<UserId>,
        date: &str,
        counters: FeatureCounters,
    ) -> Result<Self, RecordError> {
        let registered_at = parse_registration_date(date)?;
        Ok(ActivityFact::new(user_id, Some(registered_at), counters))
    }
}

/// One row of the user dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDimension {
    pub user_id: UserId,
    pub country: Option<String>,
}

impl UserDimension {
    /// Creates a new UserDimension.
    pub fn new(user_id: impl Into<UserId>, country: Option<&str>) -> Self {
        UserDimension {
            user_id: user_id.into(),
            country: country.map(str::to_string),
        }
    }
}

/// A fact row enriched with its user's dimension attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub user_id: UserId,
    pub registered_at: Option<NaiveDateTime>,
    pub counters: FeatureCounters,
    /// `None` when the user has no dimension row or no usable country
    pub country: Option<String>,
}

impl UnifiedRecord {
    /// Calendar date of the activity, with time of day discarded.
    pub fn activity_date(&self) -> Option<NaiveDate> {
        self.registered_at.map(|ts| ts.date())
    }
}

/// Errors raised while interpreting raw source values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Value is not a recognised date or timestamp
    InvalidDate(String),
    /// Epoch value outside the representable range
    TimestampOutOfRange(i64),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::InvalidDate(value) => write!(f, "Invalid date: '{}'", value),
            RecordError::TimestampOutOfRange(secs) => {
                write!(f, "Timestamp out of range: {}", secs)
            }
        }
    }
}

impl std::error::Error for RecordError {}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses a date-like registration value.
///
/// Accepts plain dates (`2024-01-01`, compact `20240101`), naive date-times
/// with a space or `T` separator and optional fractional seconds, and RFC 3339
/// timestamps. Offsets
/// are dropped rather than converted: the local calendar date the row was
/// recorded on is what the dashboard groups by.
pub fn parse_registration_date(value: &str) -> Result<NaiveDateTime, RecordError> {
    let trimmed = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.naive_local());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    if let Some(date) = parse_compact_date(trimmed) {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }

    Err(RecordError::InvalidDate(value.to_string()))
}

/// `YYYYMMDD`, checked before any digit string is read as an epoch.
fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Converts a Unix epoch (seconds) into a naive UTC timestamp.
pub fn timestamp_from_epoch(secs: i64) -> Result<NaiveDateTime, RecordError> {
    DateTime::from_timestamp(secs, 0)
        .map(|ts| ts.naive_utc())
        .ok_or(RecordError::TimestampOutOfRange(secs))
}
