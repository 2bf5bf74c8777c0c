//! Survival score heuristic for startup records.
//!
//! Four independent threshold checks, each adding a fixed number of points:
//!
//! | Condition | Points |
//! |-----------|--------|
//! | `closed_at` absent (still operating) | 3 |
//! | `age_last_funding_year` > 5 | 2 |
//! | `relationships` > 20 | 2 |
//! | `age_last_milestone_year` > 3 | 1 |
//!
//! Missing or non-numeric fields contribute nothing; the score is always in `0..=8`.

use crate::models::Record;

pub const CLOSED_AT: &str = "closed_at";
pub const FUNDING_AGE: &str = "age_last_funding_year";
pub const RELATIONSHIPS: &str = "relationships";
pub const MILESTONE_AGE: &str = "age_last_milestone_year";

pub const MAX_SCORE: u8 = 8;

/// Compute the survival score for one startup record.
pub fn survival_score(record: &Record) -> u8 {
    let mut score = 0;

    if record.get(CLOSED_AT).is_none() {
        score += 3;
    }
    if exceeds(record, FUNDING_AGE, 5.0) {
        score += 2;
    }
    if exceeds(record, RELATIONSHIPS, 20.0) {
        score += 2;
    }
    if exceeds(record, MILESTONE_AGE, 3.0) {
        score += 1;
    }

    score
}

fn exceeds(record: &Record, column: &str, threshold: f64) -> bool {
    record.number(column).is_some_and(|v| v > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(closed: &str, funding: &str, relationships: &str, milestone: &str) -> Record {
        Record::from_pairs([
            ("name", "Acme"),
            (CLOSED_AT, closed),
            (FUNDING_AGE, funding),
            (RELATIONSHIPS, relationships),
            (MILESTONE_AGE, milestone),
        ])
    }

    #[test]
    fn test_all_rules_fire() {
        assert_eq!(survival_score(&row("", "6", "25", "4")), 8);
    }

    #[test]
    fn test_closed_and_at_thresholds_scores_zero() {
        assert_eq!(survival_score(&row("2012-03-01", "5", "20", "3")), 0);
    }

    #[test]
    fn test_open_company_scores_at_least_three() {
        for (f, r, m) in [("0", "0", "0"), ("", "", ""), ("x", "y", "z"), ("9", "1", "0.5")] {
            assert!(survival_score(&row("", f, r, m)) >= 3);
        }
    }

    #[test]
    fn test_missing_columns_contribute_nothing() {
        let record = Record::from_pairs([("name", "Ghost"), (CLOSED_AT, "2010-01-01")]);
        assert_eq!(survival_score(&record), 0);
        assert_eq!(survival_score(&Record::default()), 3);
    }

    #[test]
    fn test_relationship_threshold_toggles_exactly_two() {
        for closed in ["", "2011-01-01"] {
            for funding in ["1", "7"] {
                for milestone in ["0", "4"] {
                    let below = survival_score(&row(closed, funding, "20", milestone));
                    let above = survival_score(&row(closed, funding, "21", milestone));
                    assert_eq!(above - below, 2);
                }
            }
        }
    }

    #[test]
    fn test_score_bounded() {
        let values = ["", "0", "3", "3.5", "5", "6", "20", "21", "100", "-4", "abc"];
        for closed in ["", "2011-01-01"] {
            for f in values {
                for r in values {
                    for m in values {
                        assert!(survival_score(&row(closed, f, r, m)) <= MAX_SCORE);
                    }
                }
            }
        }
    }

    #[test]
    fn test_fractional_values_compare_strictly() {
        assert_eq!(survival_score(&row("x", "5.01", "20.5", "3.01")), 5);
    }
}
