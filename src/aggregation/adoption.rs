use crate::records::{Feature, UnifiedRecord, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Share of all distinct users that used a feature at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRate {
    pub feature: Feature,
    /// Fraction in `[0.0, 1.0]`
    pub rate: f64,
}

impl AdoptionRate {
    pub fn new(feature: Feature, rate: f64) -> Self {
        AdoptionRate { feature, rate }
    }
}

/// Computes the adoption rate of every feature, in [`Feature::ALL`] order.
///
/// A user counts as an adopter when any of their rows has the feature's
/// counter above zero. Returns an empty series when there are no users.
pub fn adoption_rates(records: &[UnifiedRecord]) -> Vec<AdoptionRate> {
    let users: HashSet<&UserId> = records.iter().map(|r| &r.user_id).collect();
    let total_users = users.len();
    if total_users == 0 {
        return Vec::new();
    }

    let mut adopters: [HashSet<&UserId>; 4] = Default::default();
    for record in records {
        for (idx, feature) in Feature::ALL.iter().enumerate() {
            if record.counters.has_adopted(*feature) {
                adopters[idx].insert(&record.user_id);
            }
        }
    }

    Feature::ALL
        .iter()
        .zip(adopters.iter())
        .map(|(feature, set)| AdoptionRate::new(*feature, set.len() as f64 / total_users as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FeatureCounters;

    fn record(user: &str, counters: FeatureCounters) -> UnifiedRecord {
        UnifiedRecord {
            user_id: UserId::from(user),
            registered_at: None,
            counters,
            country: None,
        }
    }

    fn rates(series: &[AdoptionRate]) -> Vec<f64> {
        series.iter().map(|r| r.rate).collect()
    }

    #[test]
    fn counts_distinct_adopters_not_rows() {
        let records = vec![
            record("1", FeatureCounters::new(1, 0, 0, 0)),
            record("1", FeatureCounters::new(2, 0, 0, 0)),
            record("2", FeatureCounters::new(0, 1, 0, 0)),
        ];
        let series = adoption_rates(&records);
        assert_eq!(rates(&series), vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn adoption_in_any_row_counts() {
        let records = vec![
            record("1", FeatureCounters::new(0, 0, 0, 0)),
            record("1", FeatureCounters::new(0, 0, 3, 0)),
            record("2", FeatureCounters::new(0, 0, 0, 0)),
            record("3", FeatureCounters::new(0, 0, 0, 0)),
            record("4", FeatureCounters::new(0, 0, 1, 5)),
        ];
        let series = adoption_rates(&records);
        assert_eq!(rates(&series), vec![0.0, 0.0, 0.5, 0.25]);
    }

    #[test]
    fn order_is_fixed() {
        let series = adoption_rates(&[record("1", FeatureCounters::new(0, 0, 0, 9))]);
        let features: Vec<_> = series.iter().map(|r| r.feature).collect();
        assert_eq!(features, Feature::ALL.to_vec());
        assert!(series.iter().all(|r| (0.0..=1.0).contains(&r.rate)));
    }

    #[test]
    fn no_users_gives_empty_series() {
        assert!(adoption_rates(&[]).is_empty());
    }
}
