//! Observation preparation: average removal and field strength deduplication
//!
//! Both steps are pure: they take the observations as a slice and return a
//! new vector, keeping the relative input order of the survivors.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use super::types::Observation;

/// Drop synthesized average-of-sessions rows
#[must_use]
pub fn filter_averages(observations: &[Observation]) -> Vec<Observation> {
    observations
        .iter()
        .filter(|obs| !obs.is_average)
        .cloned()
        .collect()
}

/// Keep one observation per subject and scan date
///
/// The highest field strength wins (3T over 1.5T). A missing strength ranks
/// below every recorded one, and among equal strengths the earliest input
/// row is kept.
#[must_use]
pub fn deduplicate(observations: &[Observation]) -> Vec<Observation> {
    let mut best: FxHashMap<(&str, NaiveDate), usize> = FxHashMap::default();

    for (idx, obs) in observations.iter().enumerate() {
        best.entry((obs.subject.as_str(), obs.scan_date))
            .and_modify(|current| {
                let incumbent = &observations[*current];
                if compare_strength(obs.field_strength, incumbent.field_strength)
                    == Ordering::Greater
                {
                    *current = idx;
                }
            })
            .or_insert(idx);
    }

    let mut keep = vec![false; observations.len()];
    for idx in best.into_values() {
        keep[idx] = true;
    }

    observations
        .iter()
        .zip(keep)
        .filter_map(|(obs, kept)| kept.then(|| obs.clone()))
        .collect()
}

fn compare_strength(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(row: usize, subject: &str, date: (i32, u32, u32), field: Option<f64>, avg: bool) -> Observation {
        Observation {
            row,
            subject: subject.to_string(),
            scan_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            field_strength: field,
            is_average: avg,
        }
    }

    #[test]
    fn test_filter_averages() {
        let input = vec![
            obs(0, "7", (2021, 2, 1), Some(3.0), false),
            obs(1, "7", (2021, 2, 1), None, true),
        ];
        let filtered = filter_averages(&input);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].row, 0);
    }

    #[test]
    fn test_higher_field_strength_wins() {
        let input = vec![
            obs(0, "7", (2020, 1, 10), Some(1.5), false),
            obs(1, "7", (2020, 1, 10), Some(3.0), false),
            obs(2, "8", (2020, 1, 10), Some(1.5), false),
        ];
        let rows: Vec<usize> = deduplicate(&input).iter().map(|o| o.row).collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn test_ties_keep_first_row_and_missing_ranks_last() {
        let input = vec![
            obs(0, "7", (2020, 1, 10), None, false),
            obs(1, "7", (2020, 1, 10), Some(3.0), false),
            obs(2, "7", (2020, 1, 10), Some(3.0), false),
            obs(3, "9", (2020, 5, 1), None, false),
            obs(4, "9", (2020, 5, 1), None, false),
        ];
        let rows: Vec<usize> = deduplicate(&input).iter().map(|o| o.row).collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_distinct_dates_are_kept() {
        let input = vec![
            obs(0, "7", (2021, 2, 1), Some(1.5), false),
            obs(1, "7", (2020, 1, 10), Some(3.0), false),
        ];
        assert_eq!(deduplicate(&input), input);
    }
}
