// libs/scheduling-cell/src/services/optimizer.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, instrument};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{OptimizationOutcome, OptimizerState, SchedulingConfig};
use crate::services::calendar::{
    CalendarAggregator, CalendarProvider, CalendarSnapshot, GoogleCalendarClient,
};
use crate::services::feasibility::FeasibilityTester;
use crate::services::gaps::find_gaps;
use crate::services::geocoding::{Geocoder, GoogleGeocoder};
use crate::services::maps::MapsHandle;
use crate::services::registry::{
    SupabaseWeightSource, SupabaseWorkerRegistry, WeightSource, WorkerRegistry,
};
use crate::services::scoring::score_and_rank;
use crate::services::travel::{estimator_for, TravelEstimator};

/// Keeps the loading flag raised for the lifetime of one run.
///
/// Dropping the last guard while the state still reads `Loading` (the run
/// was cancelled before it recorded an outcome) resets it to `Idle`.
struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
    state: &'a watch::Sender<OptimizerState>,
}

impl<'a> LoadingGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, state: &'a watch::Sender<OptimizerState>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        state.send_replace(OptimizerState::Loading);
        Self { in_flight, state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.send_if_modified(|state| {
                if *state == OptimizerState::Loading {
                    *state = OptimizerState::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }
}

/// Runs the slot pipeline for one patient address at a time per call.
///
/// Concurrent calls are independent; `is_loading` stays true while any of
/// them is in flight and the state reflects the last one to finish.
pub struct SlotOptimizer {
    geocoder: Arc<dyn Geocoder>,
    registry: Arc<dyn WorkerRegistry>,
    calendars: CalendarAggregator,
    weights: Arc<dyn WeightSource>,
    feasibility: FeasibilityTester,
    config: SchedulingConfig,
    state: watch::Sender<OptimizerState>,
    in_flight: AtomicUsize,
}

impl SlotOptimizer {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        travel: Arc<dyn TravelEstimator>,
        registry: Arc<dyn WorkerRegistry>,
        calendar: Arc<dyn CalendarProvider>,
        weights: Arc<dyn WeightSource>,
        config: SchedulingConfig,
    ) -> Self {
        let (state, _) = watch::channel(OptimizerState::Idle);

        Self {
            geocoder,
            registry,
            calendars: CalendarAggregator::new(calendar, config.provider_timeout),
            weights,
            feasibility: FeasibilityTester::new(travel, &config),
            config,
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Production wiring: Google providers plus the Supabase registry.
    /// Travel estimates follow `AppConfig::travel_estimator`.
    pub fn from_config(app_config: &AppConfig, maps: Arc<MapsHandle>) -> Self {
        let supabase = SupabaseClient::new(app_config);

        Self::new(
            Arc::new(GoogleGeocoder::new(Arc::clone(&maps)).with_region("br")),
            estimator_for(app_config.travel_estimator, maps),
            Arc::new(SupabaseWorkerRegistry::new(supabase.clone())),
            Arc::new(GoogleCalendarClient::new(app_config)),
            Arc::new(SupabaseWeightSource::new(supabase)),
            SchedulingConfig::from_app_config(app_config),
        )
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn state(&self) -> OptimizerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OptimizerState> {
        self.state.subscribe()
    }

    pub async fn optimize(&self, address: &str) -> Result<OptimizationOutcome, SchedulingError> {
        self.optimize_at(address, Utc::now()).await
    }

    /// Runs the pipeline with `now` as the start of the lookahead window.
    #[instrument(skip(self, now))]
    pub async fn optimize_at(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<OptimizationOutcome, SchedulingError> {
        let _guard = LoadingGuard::enter(&self.in_flight, &self.state);

        let result = self.run(address.trim(), now).await;

        match &result {
            Ok(outcome) => {
                info!(
                    "Optimization returned {} slots ({} gaps skipped, {} workers skipped)",
                    outcome.slots.len(),
                    outcome.skipped_gaps,
                    outcome.skipped_workers
                );
                self.state.send_replace(OptimizerState::Succeeded);
            }
            Err(e) => {
                error!("Optimization failed: {}", e);
                self.state.send_replace(OptimizerState::Failed(e.to_string()));
            }
        }

        result
    }

    async fn run(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<OptimizationOutcome, SchedulingError> {
        if address.is_empty() {
            return Err(SchedulingError::InvalidAddress(
                "address must not be blank".to_string(),
            ));
        }

        if !self.geocoder.is_ready() || !self.feasibility.is_ready() {
            return Err(SchedulingError::ProviderUnavailable(
                "mapping provider is not ready".to_string(),
            ));
        }

        let window_end = now + self.config.lookahead();

        let (patient, snapshot, weights) = tokio::try_join!(
            self.geocoder.geocode(address),
            self.collect_calendars(now, window_end),
            async { Ok::<_, SchedulingError>(self.weights.get_weights().await) },
        )?;

        let gaps = find_gaps(&snapshot.intervals, &self.config);
        let report = self.feasibility.test_feasibility(&gaps, patient).await;

        let mut slots = score_and_rank(report.slots, &weights, now);
        slots.truncate(self.config.shortlist_size);

        Ok(OptimizationOutcome {
            slots,
            skipped_gaps: report.skipped,
            skipped_workers: snapshot.failed_workers.len(),
        })
    }

    async fn collect_calendars(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<CalendarSnapshot, SchedulingError> {
        let workers = self.registry.list_active_workers().await?;
        if workers.is_empty() {
            return Err(SchedulingError::NoActiveWorkers);
        }

        Ok(self.calendars.collect(&workers, window_start, window_end).await)
    }
}
