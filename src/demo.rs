//! Deterministic demo data for local runs of the dashboard.

use crate::records::{ActivityFact, FeatureCounters, UserDimension};
use crate::source::SourceTables;
use chrono::{Duration, NaiveDate, NaiveTime};

const COUNTRIES: [Option<&str>; 7] = [
    Some("US"),
    Some("IN"),
    Some("US"),
    Some("GB"),
    Some("CA"),
    Some("NG"),
    None,
];

/// Builds `users` users active over `days` days starting at `start`.
///
/// Users are active on a day when `(user * 7 + day * 3) % 5 < 2`, so roughly
/// two in five users show up daily. Every seventh user has no country and
/// every eleventh has no dimension row at all. Days past the end of the
/// calendar are dropped.
pub fn demo_tables(start: NaiveDate, days: u32, users: u32) -> SourceTables {
    let mut facts = Vec::new();
    let mut dims = Vec::new();

    for user in 1..=users {
        if user % 11 != 0 {
            dims.push(UserDimension::new(
                i64::from(user),
                COUNTRIES[(user as usize) % COUNTRIES.len()],
            ));
        }

        for day in 0..days {
            if !is_active(user, day) {
                continue;
            }
            let Some(date) = start.checked_add_signed(Duration::days(i64::from(day))) else {
                break;
            };
            let (u, d) = (u64::from(user), u64::from(day));
            let hour = 8 + ((u + d) % 10) as u32;
            let minute = ((u * 13) % 60) as u32;
            let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
            let progress = u64::from(day / 7);
            let counters = FeatureCounters::new(
                if user % 2 == 0 { 1 + progress } else { 0 },
                if user % 3 == 0 { progress } else { 0 },
                if user % 4 == 0 { 1 } else { 0 },
                if user % 5 == 0 && day > 10 { 1 } else { 0 },
            );
            facts.push(ActivityFact::new(
                i64::from(user),
                Some(date.and_time(time)),
                counters,
            ));
        }
    }

    SourceTables::new(facts, dims)
}

fn is_active(user: u32, day: u32) -> bool {
    (u64::from(user) * 7 + u64::from(day) * 3) % 5 < 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_facts_and_partial_dimensions() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let tables = demo_tables(start, 30, 50);
        assert!(!tables.facts.is_empty());
        assert_eq!(tables.dims.len(), 50 - 4);
        assert!(tables
            .facts
            .iter()
            .all(|f| f.registered_at.map(|ts| ts.date() >= start).unwrap_or(false)));
    }

    #[test]
    fn activity_rule_handles_large_arguments() {
        assert!(is_active(u32::MAX, u32::MAX));
        assert!(!is_active(u32::MAX, 1));
        assert!(!is_active(1, 0));
    }

    #[test]
    fn days_past_calendar_end_are_dropped() {
        let start = NaiveDate::MAX - Duration::days(2);
        let tables = demo_tables(start, 10, 5);
        assert!(tables
            .facts
            .iter()
            .all(|f| f.registered_at.map(|ts| ts.date() >= start).unwrap_or(false)));
    }

    #[test]
    fn is_deterministic() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(demo_tables(start, 10, 20), demo_tables(start, 10, 20));
    }
}
