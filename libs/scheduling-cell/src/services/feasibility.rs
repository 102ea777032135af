// libs/scheduling-cell/src/services/feasibility.rs
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::SchedulingError;
use crate::models::{
    CandidateGap, Coordinate, FeasibleSlot, LegDetails, SchedulingConfig, TravelEstimate,
};
use crate::services::travel::TravelEstimator;

/// Slots that fit, in gap order, plus how many gaps could not be evaluated.
#[derive(Debug, Clone, Default)]
pub struct FeasibilityReport {
    pub slots: Vec<FeasibleSlot>,
    pub skipped: usize,
}

enum GapOutcome {
    Feasible(FeasibleSlot),
    DoesNotFit,
    Skipped,
}

/// Places a single visit into a gap given both travel legs.
///
/// Returns `None` when the two legs plus the visit exceed the gap.
pub fn plan_visit(
    gap: &CandidateGap,
    leg_before: TravelEstimate,
    leg_after: TravelEstimate,
    visit_duration: Duration,
    display_offset: FixedOffset,
) -> Option<FeasibleSlot> {
    let required = leg_before.minutes + visit_duration.num_minutes() + leg_after.minutes;
    if required > gap.available_minutes() {
        return None;
    }

    let proposed_start = gap.start + Duration::minutes(leg_before.minutes);
    let proposed_end = proposed_start + visit_duration;

    Some(FeasibleSlot {
        id: format!("{}-{}", gap.worker_id, gap.start.timestamp_millis()),
        worker_id: gap.worker_id.clone(),
        proposed_start,
        proposed_end,
        display_time: proposed_start
            .with_timezone(&display_offset)
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        total_travel_minutes: leg_before.minutes + leg_after.minutes,
        total_travel_distance_km: leg_before.km + leg_after.km,
        score: None,
        leg_details: LegDetails {
            travel_before_minutes: leg_before.minutes,
            travel_after_minutes: leg_after.minutes,
            distance_before_km: leg_before.km,
            distance_after_km: leg_after.km,
        },
    })
}

pub struct FeasibilityTester {
    travel: Arc<dyn TravelEstimator>,
    visit_duration: Duration,
    display_offset: FixedOffset,
    max_concurrent_gaps: usize,
    leg_timeout: StdDuration,
}

impl FeasibilityTester {
    pub fn new(travel: Arc<dyn TravelEstimator>, config: &SchedulingConfig) -> Self {
        Self {
            travel,
            visit_duration: config.visit_duration(),
            display_offset: config.local_offset(),
            max_concurrent_gaps: config.max_concurrent_gaps.max(1),
            leg_timeout: config.provider_timeout,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.travel.is_ready()
    }

    /// Tests one visit insertion per gap against the patient location.
    pub async fn test_feasibility(
        &self,
        gaps: &[CandidateGap],
        patient: Coordinate,
    ) -> FeasibilityReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_gaps));

        let outcomes = futures::future::join_all(gaps.iter().map(|gap| {
            let semaphore = Arc::clone(&semaphore);

            async move {
                let Some((before, after)) = gap.endpoints() else {
                    debug!("Gap {} for worker {} lacks coordinates", gap.start, gap.worker_id);
                    return GapOutcome::Skipped;
                };

                let legs = match semaphore.acquire().await {
                    Ok(_permit) => self.estimate_legs(before, patient, after).await,
                    Err(e) => Err(SchedulingError::Internal(format!(
                        "feasibility limiter closed: {}",
                        e
                    ))),
                };

                match legs {
                    Ok((leg_before, leg_after)) => match plan_visit(
                        gap,
                        leg_before,
                        leg_after,
                        self.visit_duration,
                        self.display_offset,
                    ) {
                        Some(slot) => GapOutcome::Feasible(slot),
                        None => GapOutcome::DoesNotFit,
                    },
                    Err(e) if e.is_recoverable() => {
                        warn!(
                            "Dropping gap at {} for worker {}: {}",
                            gap.start, gap.worker_id, e
                        );
                        GapOutcome::Skipped
                    }
                    Err(e) => {
                        error!(
                            "Gap at {} for worker {} could not be evaluated: {}",
                            gap.start, gap.worker_id, e
                        );
                        GapOutcome::Skipped
                    }
                }
            }
        }))
        .await;

        let mut report = FeasibilityReport::default();
        for outcome in outcomes {
            match outcome {
                GapOutcome::Feasible(slot) => report.slots.push(slot),
                GapOutcome::DoesNotFit => {}
                GapOutcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            "{} of {} gaps can take the visit ({} skipped)",
            report.slots.len(),
            gaps.len(),
            report.skipped
        );

        report
    }

    async fn estimate_legs(
        &self,
        before: Coordinate,
        patient: Coordinate,
        after: Coordinate,
    ) -> Result<(TravelEstimate, TravelEstimate), SchedulingError> {
        let legs = async {
            tokio::try_join!(
                self.travel.estimate(before, patient),
                self.travel.estimate(patient, after)
            )
        };

        timeout(self.leg_timeout, legs).await.map_err(|_| {
            SchedulingError::TravelEstimate(format!(
                "no answer within {}s",
                self.leg_timeout.as_secs()
            ))
        })?
    }
}
