// libs/scheduling-cell/src/services/gaps.rs
use tracing::debug;

use crate::models::{BusyInterval, CandidateGap, SchedulingConfig};

/// Turns each worker's busy intervals into buffered free windows.
///
/// Only the space between two consecutive commitments counts; time before
/// the first or after the last one is never offered.
pub fn find_gaps(intervals: &[BusyInterval], config: &SchedulingConfig) -> Vec<CandidateGap> {
    // Workers in order of first appearance
    let mut groups: Vec<(&str, Vec<&BusyInterval>)> = Vec::new();
    for interval in intervals {
        match groups.iter_mut().find(|(id, _)| *id == interval.worker_id) {
            Some((_, group)) => group.push(interval),
            None => groups.push((interval.worker_id.as_str(), vec![interval])),
        }
    }

    let min_gap = config.min_gap();
    let buffer = config.buffer();
    let mut gaps = Vec::new();

    for (worker_id, mut group) in groups {
        group.sort_by_key(|interval| interval.start);

        for pair in group.windows(2) {
            let (current, next) = (pair[0], pair[1]);

            if next.start - current.end < min_gap {
                continue;
            }

            let start = current.end + buffer;
            let end = next.start - buffer;
            if end <= start {
                continue;
            }

            gaps.push(CandidateGap {
                worker_id: worker_id.to_string(),
                start,
                end,
                location_before: current.location_after.clone(),
                coordinates_before: current.coordinates_after,
                location_after: next.location_before.clone(),
                coordinates_after: next.coordinates_before,
            });
        }
    }

    debug!("Found {} candidate gaps in {} busy intervals", gaps.len(), intervals.len());
    gaps
}
