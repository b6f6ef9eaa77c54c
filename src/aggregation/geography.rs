use crate::records::UnifiedRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Label of the bucket holding rows without a known country.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Number of unified rows attributed to one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    /// `None` for the unknown bucket
    pub country: Option<String>,
    pub users: usize,
}

impl CountryCount {
    pub fn new(country: Option<&str>, users: usize) -> Self {
        CountryCount {
            country: country.map(str::to_string),
            users,
        }
    }

    /// Display label, with the unknown bucket spelled out.
    pub fn label(&self) -> &str {
        self.country.as_deref().unwrap_or(UNKNOWN_COUNTRY)
    }
}

/// Counts unified rows per country label.
///
/// Rows whose user has no country land in the unknown bucket, so the counts
/// always sum to `records.len()`. Groups are ordered by descending count,
/// ties broken by label. A country literally named like the unknown bucket
/// sorts before the bucket itself.
pub fn country_distribution(records: &[UnifiedRecord]) -> Vec<CountryCount> {
    let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.country.as_deref()).or_insert(0) += 1;
    }

    let mut series: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, users)| CountryCount::new(country, users))
        .collect();
    series.sort_by(|a, b| {
        (Reverse(a.users), a.label(), a.country.is_none())
            .cmp(&(Reverse(b.users), b.label(), b.country.is_none()))
    });
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FeatureCounters, UserId};

    fn record(user: &str, country: Option<&str>) -> UnifiedRecord {
        UnifiedRecord {
            user_id: UserId::from(user),
            registered_at: None,
            counters: FeatureCounters::default(),
            country: country.map(str::to_string),
        }
    }

    #[test]
    fn counts_rows_per_country_sorted() {
        let records = vec![
            record("1", Some("US")),
            record("1", Some("US")),
            record("2", Some("CA")),
            record("3", Some("BR")),
            record("4", Some("US")),
        ];
        assert_eq!(
            country_distribution(&records),
            vec![
                CountryCount::new(Some("US"), 3),
                CountryCount::new(Some("BR"), 1),
                CountryCount::new(Some("CA"), 1),
            ]
        );
    }

    #[test]
    fn missing_country_gets_unknown_bucket() {
        let records = vec![record("1", None), record("2", Some("US")), record("3", None)];
        let series = country_distribution(&records);
        assert_eq!(series[0], CountryCount::new(None, 2));
        assert_eq!(series[0].label(), UNKNOWN_COUNTRY);
        assert_eq!(series.iter().map(|c| c.users).sum::<usize>(), records.len());
    }

    #[test]
    fn unknown_bucket_sorts_after_same_named_country() {
        for records in [
            vec![record("1", None), record("2", Some(UNKNOWN_COUNTRY))],
            vec![record("2", Some(UNKNOWN_COUNTRY)), record("1", None)],
        ] {
            assert_eq!(
                country_distribution(&records),
                vec![
                    CountryCount::new(Some(UNKNOWN_COUNTRY), 1),
                    CountryCount::new(None, 1),
                ]
            );
        }
    }

    #[test]
    fn empty_input_gives_empty_series() {
        assert!(country_distribution(&[]).is_empty());
    }
}
