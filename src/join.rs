//! Left join of activity facts onto user dimensions.

use crate::records::{ActivityFact, UnifiedRecord, UserDimension, UserId};
use std::collections::HashMap;

/// Left-joins `facts` onto `dims` by user id.
///
/// Every fact row appears exactly once in the output, in input order. Facts
/// without a matching dimension row keep an unknown country. When several
/// dimension rows share a user id the first one in `dims` wins.
///
/// If either side is empty the result is empty: an empty dimension table
/// means the load failed or the store is empty, and the dashboard treats
/// both as "no data".
pub fn join(facts: &[ActivityFact], dims: &[UserDimension]) -> Vec<UnifiedRecord> {
    if facts.is_empty() || dims.is_empty() {
        return Vec::new();
    }

    let mut countries: HashMap<&UserId, Option<&str>> = HashMap::with_capacity(dims.len());
    let mut shadowed = 0usize;
    for dim in dims {
        if countries.contains_key(&dim.user_id) {
            shadowed += 1;
            continue;
        }
        countries.insert(&dim.user_id, normalize_country(dim.country.as_deref()));
    }

    if shadowed > 0 {
        log::warn!(
            "{} duplicate user dimension rows ignored; first row per user_id kept",
            shadowed
        );
    }

    let mut unmatched = 0usize;
    let records: Vec<UnifiedRecord> = facts
        .iter()
        .map(|fact| {
            let country = match countries.get(&fact.user_id) {
                Some(country) => country.map(str::to_string),
                None => {
                    unmatched += 1;
                    None
                }
            };
            UnifiedRecord {
                user_id: fact.user_id.clone(),
                registered_at: fact.registered_at,
                counters: fact.counters,
                country,
            }
        })
        .collect();

    if unmatched > 0 {
        log::debug!("{} fact rows have no matching user dimension", unmatched);
    }

    records
}

/// Blank country labels are folded into the unknown bucket. Other labels are
/// kept verbatim, surrounding whitespace included.
fn normalize_country(country: Option<&str>) -> Option<&str> {
    country.filter(|c| !c.trim().is_empty())
}
