// libs/scheduling-cell/src/services/scoring.rs
use chrono::{DateTime, Utc};

use crate::models::{FeasibleSlot, WeightConfig};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Whole days until `start`, rounded up. Anything later today counts as 1.
pub fn days_from_today(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((start - now).num_milliseconds() as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// Weighted cost of a slot; lower is better.
pub fn score_slot(slot: &FeasibleSlot, weights: &WeightConfig, now: DateTime<Utc>) -> i64 {
    let days = days_from_today(slot.proposed_start, now) as f64;

    let cost = days * weights.date_weight
        + slot.total_travel_minutes as f64 * weights.travel_time_weight
        + slot.total_travel_distance_km * weights.distance_weight;

    cost.round() as i64
}

/// Scores every slot and sorts ascending. Equal scores keep their input order.
pub fn score_and_rank(
    slots: Vec<FeasibleSlot>,
    weights: &WeightConfig,
    now: DateTime<Utc>,
) -> Vec<FeasibleSlot> {
    let mut scored: Vec<FeasibleSlot> = slots
        .into_iter()
        .map(|mut slot| {
            slot.score = Some(score_slot(&slot, weights, now));
            slot
        })
        .collect();

    scored.sort_by_key(|slot| slot.score.unwrap_or(i64::MAX));
    scored
}
