// Fakes shared by the scheduling-cell integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use scheduling_cell::error::SchedulingError;
use scheduling_cell::models::{
    BusyInterval, Coordinate, SchedulingConfig, TravelEstimate, WeightConfig, Worker,
};
use scheduling_cell::services::{
    CalendarProvider, Geocoder, SlotOptimizer, StaticWeights, TravelEstimator, WorkerRegistry,
};

pub const LAB: Coordinate = Coordinate::new(-19.9245, -43.9352);
pub const PATIENT: Coordinate = Coordinate::new(-19.9300, -43.9400);
pub const UNREACHABLE: Coordinate = Coordinate::new(0.0, 0.0);

/// Monday 2025-03-10 08:00 in Brasília.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
}

pub fn worker(id: &str) -> Worker {
    Worker {
        id: id.to_string(),
        name: id.to_uppercase(),
        calendar_ref: format!("{}-agenda", id),
    }
}

pub fn busy(worker_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BusyInterval {
    BusyInterval {
        worker_id: worker_id.to_string(),
        start,
        end,
        location_before: None,
        coordinates_before: Some(LAB),
        location_after: None,
        coordinates_after: Some(LAB),
    }
}

/// Two one-hour commitments separated by exactly the minimum gap.
pub fn day_with_gap(worker_id: &str, day: u32) -> Vec<BusyInterval> {
    vec![
        busy(worker_id, at(day, 12, 0), at(day, 13, 0)),
        busy(worker_id, at(day, 14, 30), at(day, 15, 30)),
    ]
}

pub struct FixedGeocoder {
    pub result: Result<Coordinate, SchedulingError>,
    pub ready: bool,
}

impl FixedGeocoder {
    pub fn ok(coordinate: Coordinate) -> Self {
        Self { result: Ok(coordinate), ready: true }
    }

    pub fn failing(error: SchedulingError) -> Self {
        Self { result: Err(error), ready: true }
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn geocode(&self, _address: &str) -> Result<Coordinate, SchedulingError> {
        self.result.clone()
    }
}

/// Never answers, keeping a run in flight until it is dropped.
pub struct PendingGeocoder;

#[async_trait]
impl Geocoder for PendingGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinate, SchedulingError> {
        std::future::pending().await
    }
}

/// Same estimate for every leg, except legs starting at `UNREACHABLE`.
pub struct FixedTravel(pub TravelEstimate);

#[async_trait]
impl TravelEstimator for FixedTravel {
    async fn estimate(
        &self,
        origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<TravelEstimate, SchedulingError> {
        if origin == UNREACHABLE {
            return Err(SchedulingError::TravelEstimate("NotFound".to_string()));
        }
        Ok(self.0)
    }
}

pub struct StaticRegistry(pub Result<Vec<Worker>, SchedulingError>);

#[async_trait]
impl WorkerRegistry for StaticRegistry {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, SchedulingError> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub schedules: HashMap<String, Vec<BusyInterval>>,
    pub failing: Vec<String>,
}

impl FakeCalendar {
    pub fn with(mut self, worker_id: &str, intervals: Vec<BusyInterval>) -> Self {
        self.schedules
            .entry(worker_id.to_string())
            .or_default()
            .extend(intervals);
        self
    }

    pub fn failing_for(mut self, worker_id: &str) -> Self {
        self.failing.push(worker_id.to_string());
        self
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn fetch_busy_intervals(
        &self,
        worker_id: &str,
        _calendar_ref: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SchedulingError> {
        if self.failing.iter().any(|id| id == worker_id) {
            return Err(SchedulingError::CalendarFetch {
                worker_id: worker_id.to_string(),
                message: "403 Forbidden".to_string(),
            });
        }

        Ok(self
            .schedules
            .get(worker_id)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter(|i| i.end > window_start && i.start < window_end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn five_minute_legs() -> FixedTravel {
    FixedTravel(TravelEstimate { minutes: 5, km: 1.0 })
}

pub fn optimizer(
    geocoder: FixedGeocoder,
    travel: impl TravelEstimator + 'static,
    registry: StaticRegistry,
    calendar: FakeCalendar,
) -> SlotOptimizer {
    SlotOptimizer::new(
        Arc::new(geocoder),
        Arc::new(travel),
        Arc::new(registry),
        Arc::new(calendar),
        Arc::new(StaticWeights(WeightConfig::default())),
        SchedulingConfig::default(),
    )
}
