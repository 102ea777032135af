use std::env;
use tracing::warn;

const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Which travel estimator the optimizer is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelEstimatorKind {
    /// Road durations from the mapping provider.
    #[default]
    DistanceMatrix,
    /// Great-circle distance at a fixed speed, no provider quota used.
    StraightLine,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_maps_api_key: String,
    pub google_maps_base_url: String,
    pub google_calendar_base_url: String,
    pub google_calendar_access_token: String,
    pub provider_timeout_secs: u64,
    pub travel_estimator: TravelEstimatorKind,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("GOOGLE_MAPS_API_KEY not set, using empty value");
                    String::new()
                }),
            google_maps_base_url: env::var("GOOGLE_MAPS_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("GOOGLE_MAPS_BASE_URL not set, using default");
                    DEFAULT_MAPS_BASE_URL.to_string()
                }),
            google_calendar_base_url: env::var("GOOGLE_CALENDAR_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("GOOGLE_CALENDAR_BASE_URL not set, using default");
                    DEFAULT_CALENDAR_BASE_URL.to_string()
                }),
            google_calendar_access_token: env::var("GOOGLE_CALENDAR_ACCESS_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("GOOGLE_CALENDAR_ACCESS_TOKEN not set, using empty value");
                    String::new()
                }),
            provider_timeout_secs: parse_provider_timeout(env::var("PROVIDER_TIMEOUT_SECS").ok()),
            travel_estimator: parse_travel_estimator(env::var("TRAVEL_ESTIMATOR").ok()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn is_maps_configured(&self) -> bool {
        !self.google_maps_api_key.is_empty()
            && !self.google_maps_base_url.is_empty()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.google_calendar_base_url.is_empty()
            && !self.google_calendar_access_token.is_empty()
    }
}

fn parse_provider_timeout(value: Option<String>) -> u64 {
    let Some(value) = value else {
        warn!("PROVIDER_TIMEOUT_SECS not set, using default");
        return DEFAULT_PROVIDER_TIMEOUT_SECS;
    };

    match value.trim().parse::<u64>() {
        Ok(0) => {
            warn!("PROVIDER_TIMEOUT_SECS must be positive, using default");
            DEFAULT_PROVIDER_TIMEOUT_SECS
        }
        Ok(secs) => secs,
        Err(e) => {
            warn!("Invalid PROVIDER_TIMEOUT_SECS '{}' ({}), using default", value, e);
            DEFAULT_PROVIDER_TIMEOUT_SECS
        }
    }
}

fn parse_travel_estimator(value: Option<String>) -> TravelEstimatorKind {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("distance_matrix") => TravelEstimatorKind::DistanceMatrix,
        Some("straight_line") => TravelEstimatorKind::StraightLine,
        Some(other) => {
            warn!("Unknown TRAVEL_ESTIMATOR '{}', using distance_matrix", other);
            TravelEstimatorKind::DistanceMatrix
        }
    }
}
