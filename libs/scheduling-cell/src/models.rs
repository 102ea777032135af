use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use shared_config::AppConfig;

pub const MIN_GAP_MINUTES: i64 = 90;
pub const BUFFER_MINUTES: i64 = 15;
pub const VISIT_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;
pub const SHORTLIST_SIZE: usize = 6;

// Brasília time, where the collection teams operate.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// "lat,lng" as accepted by the mapping provider.
    pub fn to_query(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// An active collector whose calendar is scanned for gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub calendar_ref: String,
}

/// A committed obligation on a worker's calendar.
///
/// `*_before` is where the worker travels from to reach the commitment,
/// `*_after` is where the worker is once it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub worker_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location_before: Option<String>,
    pub coordinates_before: Option<Coordinate>,
    pub location_after: Option<String>,
    pub coordinates_after: Option<Coordinate>,
}

/// Buffered free time between two consecutive commitments of one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateGap {
    pub worker_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location_before: Option<String>,
    pub coordinates_before: Option<Coordinate>,
    pub location_after: Option<String>,
    pub coordinates_after: Option<Coordinate>,
}

impl CandidateGap {
    pub fn available_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn endpoints(&self) -> Option<(Coordinate, Coordinate)> {
        Some((self.coordinates_before?, self.coordinates_after?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub minutes: i64,
    pub km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegDetails {
    pub travel_before_minutes: i64,
    pub travel_after_minutes: i64,
    pub distance_before_km: f64,
    pub distance_after_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibleSlot {
    pub id: String,
    pub worker_id: String,
    pub proposed_start: DateTime<Utc>,
    pub proposed_end: DateTime<Utc>,
    /// Proposed start as shown to the operator, in the team's local time.
    pub display_time: String,
    pub total_travel_minutes: i64,
    pub total_travel_distance_km: f64,
    /// Unset until the scoring stage runs. Lower is better.
    pub score: Option<i64>,
    pub leg_details: LegDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub date_weight: f64,
    pub travel_time_weight: f64,
    pub distance_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            date_weight: 10.0,
            travel_time_weight: 15.0,
            distance_weight: 8.0,
        }
    }
}

// ==============================================================================
// PIPELINE CONFIGURATION
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub min_gap_minutes: i64,
    pub buffer_minutes: i64,
    pub visit_duration_minutes: i64,
    pub lookahead_days: i64,
    pub shortlist_size: usize,
    /// Gaps evaluated at once; each gap issues two travel estimates.
    pub max_concurrent_gaps: usize,
    pub provider_timeout: std::time::Duration,
    pub utc_offset_minutes: i32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_gap_minutes: MIN_GAP_MINUTES,
            buffer_minutes: BUFFER_MINUTES,
            visit_duration_minutes: VISIT_DURATION_MINUTES,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            shortlist_size: SHORTLIST_SIZE,
            max_concurrent_gaps: 1,
            provider_timeout: std::time::Duration::from_secs(10),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl SchedulingConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider_timeout: std::time::Duration::from_secs(config.provider_timeout_secs),
            ..Self::default()
        }
    }

    pub fn min_gap(&self) -> Duration {
        Duration::minutes(self.min_gap_minutes)
    }

    pub fn buffer(&self) -> Duration {
        Duration::minutes(self.buffer_minutes)
    }

    pub fn visit_duration(&self) -> Duration {
        Duration::minutes(self.visit_duration_minutes)
    }

    pub fn lookahead(&self) -> Duration {
        Duration::days(self.lookahead_days)
    }

    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

// ==============================================================================
// ORCHESTRATION MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum OptimizerState {
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

/// Ranked shortlist plus the number of items dropped by recovered errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub slots: Vec<FeasibleSlot>,
    pub skipped_gaps: usize,
    pub skipped_workers: usize,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerStatusResponse {
    pub state: OptimizerState,
    pub is_loading: bool,
}
