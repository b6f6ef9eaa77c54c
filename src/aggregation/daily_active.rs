use crate::records::{UnifiedRecord, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Distinct active users on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DauPoint {
    pub date: NaiveDate,
    pub active_users: usize,
}

impl DauPoint {
    pub fn new(date: NaiveDate, active_users: usize) -> Self {
        DauPoint { date, active_users }
    }
}

/// Counts distinct users per calendar date.
///
/// Output is sparse and ascending by date: only dates present in the data get
/// a point. Records without a timestamp cannot be placed on a day and are
/// skipped.
pub fn daily_active_users(records: &[UnifiedRecord]) -> Vec<DauPoint> {
    let mut by_date: BTreeMap<NaiveDate, HashSet<&UserId>> = BTreeMap::new();
    let mut undated = 0usize;

    for record in records {
        match record.activity_date() {
            Some(date) => {
                by_date.entry(date).or_default().insert(&record.user_id);
            }
            None => undated += 1,
        }
    }

    if undated > 0 {
        tracing::debug!(undated, "skipping records without an activity date");
    }

    by_date
        .into_iter()
        .map(|(date, users)| DauPoint::new(date, users.len()))
        .collect()
}
