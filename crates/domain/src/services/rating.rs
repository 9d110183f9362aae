//! Review rating aggregation.

use serde::Serialize;

/// Aggregate stored on the professional row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub rating_avg: f64,
    pub review_count: i32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating_avg: 0.0,
        review_count: 0,
    };

    /// Averages the given ratings, rounded to two decimals.
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::EMPTY;
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let avg = sum as f64 / ratings.len() as f64;
        Self {
            rating_avg: round2(avg),
            review_count: ratings.len() as i32,
        }
    }

    /// Builds the summary from SQL `AVG`/`COUNT` output.
    pub fn from_aggregate(avg: Option<f64>, count: i64) -> Self {
        match avg {
            Some(avg) if count > 0 => Self {
                rating_avg: round2(avg),
                review_count: count as i32,
            },
            _ => Self::EMPTY,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
