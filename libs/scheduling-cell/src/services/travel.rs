// libs/scheduling-cell/src/services/travel.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use shared_config::TravelEstimatorKind;

use crate::error::SchedulingError;
use crate::models::{Coordinate, TravelEstimate};
use crate::services::maps::{MapsHandle, ProviderReply, ProviderStatus};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average urban driving speed for straight-line estimates.
const DEFAULT_SPEED_KMH: f64 = 25.0;

const DEFAULT_MIN_MINUTES: i64 = 5;

/// Travel duration and distance between two points.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TravelEstimator: Send + Sync {
    fn is_ready(&self) -> bool {
        true
    }

    async fn estimate(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelEstimate, SchedulingError>;
}

fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

// ==============================================================================
// DISTANCE MATRIX
// ==============================================================================

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: ProviderStatus,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: ProviderStatus,
    duration: Option<MatrixValue>,
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

impl From<DistanceMatrixResponse> for ProviderReply<TravelEstimate> {
    fn from(response: DistanceMatrixResponse) -> Self {
        if response.status != ProviderStatus::Ok {
            return ProviderReply::failure(response.status, response.error_message);
        }

        let Some(element) = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
        else {
            return ProviderReply::failure(
                ProviderStatus::ZeroResults,
                Some("matrix contained no elements".to_string()),
            );
        };

        if element.status != ProviderStatus::Ok {
            return ProviderReply::failure(element.status, None);
        }

        match (element.duration, element.distance) {
            (Some(duration), Some(distance)) => ProviderReply::Success(TravelEstimate {
                minutes: (duration.value / 60.0).round() as i64,
                km: round_km(distance.value / 1000.0),
            }),
            _ => ProviderReply::failure(
                ProviderStatus::UnknownError,
                Some("element is missing duration or distance".to_string()),
            ),
        }
    }
}

/// Road travel estimates from the Google Distance Matrix web service.
pub struct DistanceMatrixEstimator {
    maps: Arc<MapsHandle>,
}

impl DistanceMatrixEstimator {
    pub fn new(maps: Arc<MapsHandle>) -> Self {
        Self { maps }
    }
}

#[async_trait]
impl TravelEstimator for DistanceMatrixEstimator {
    fn is_ready(&self) -> bool {
        self.maps.is_ready()
    }

    async fn estimate(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelEstimate, SchedulingError> {
        let client = self.maps.client()?;

        let params = [
            ("origins", origin.to_query()),
            ("destinations", destination.to_query()),
            ("mode", "driving".to_string()),
            ("units", "metric".to_string()),
        ];

        let response: DistanceMatrixResponse = client
            .get_json("distancematrix", &params)
            .await
            .map_err(|e| {
                warn!("Distance matrix request failed: {}", e);
                SchedulingError::TravelEstimate(e.to_string())
            })?;

        let estimate = ProviderReply::from(response).into_result(SchedulingError::TravelEstimate)?;
        debug!(
            "Travel {} -> {}: {} min, {} km",
            origin.to_query(),
            destination.to_query(),
            estimate.minutes,
            estimate.km
        );

        Ok(estimate)
    }
}

// ==============================================================================
// STRAIGHT-LINE ESTIMATES
// ==============================================================================

/// Great-circle estimator, selected with `TRAVEL_ESTIMATOR=straight_line`
/// for local runs that should not spend Distance Matrix quota.
///
/// Ignores the road network, so durations are optimistic on long legs.
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
    /// Floor applied to every leg, covering parking and access time.
    pub min_minutes: i64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            min_minutes: DEFAULT_MIN_MINUTES,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64, min_minutes: i64) -> Self {
        Self { speed_kmh, min_minutes }
    }

    fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let lat1_rad = from.latitude.to_radians();
        let lat2_rad = to.latitude.to_radians();
        let delta_lat = (to.latitude - from.latitude).to_radians();
        let delta_lng = (to.longitude - from.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    pub fn estimate_between(&self, from: Coordinate, to: Coordinate) -> TravelEstimate {
        let km = Self::haversine_km(from, to);
        let minutes = ((km / self.speed_kmh) * 60.0).round() as i64;

        TravelEstimate {
            minutes: minutes.max(self.min_minutes),
            km: round_km(km),
        }
    }
}

#[async_trait]
impl TravelEstimator for HaversineEstimator {
    async fn estimate(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<TravelEstimate, SchedulingError> {
        Ok(self.estimate_between(origin, destination))
    }
}

/// Builds the estimator configured for this deployment.
pub fn estimator_for(kind: TravelEstimatorKind, maps: Arc<MapsHandle>) -> Arc<dyn TravelEstimator> {
    match kind {
        TravelEstimatorKind::DistanceMatrix => Arc::new(DistanceMatrixEstimator::new(maps)),
        TravelEstimatorKind::StraightLine => {
            info!("Using straight-line travel estimates");
            Arc::new(HaversineEstimator::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_config::AppConfig;

    const LAB: Coordinate = Coordinate::new(-19.9245, -43.9352);
    const SAVASSI: Coordinate = Coordinate::new(-19.9396, -43.9364);

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineEstimator::haversine_km(LAB, LAB);
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Belo Horizonte to Rio de Janeiro, roughly 340 km
        let rio = Coordinate::new(-22.9068, -43.1729);
        let dist = HaversineEstimator::haversine_km(LAB, rio);
        assert!(dist > 320.0 && dist < 360.0, "BH to Rio should be ~340km, got {}", dist);
    }

    #[test]
    fn test_short_legs_hit_minimum() {
        let estimator = HaversineEstimator::default();
        let estimate = estimator.estimate_between(LAB, SAVASSI);
        assert_eq!(estimate.minutes, 5);
        assert!((estimate.km - 1.7).abs() < 0.11, "got {}", estimate.km);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let estimator = HaversineEstimator::new(25.0, 5);
        // ~0.0899 degrees of latitude is ~10 km; 10 km at 25 km/h = 24 minutes
        let north = Coordinate::new(LAB.latitude + 0.0899, LAB.longitude);
        let estimate = estimator.estimate_between(LAB, north);
        assert_eq!(estimate.minutes, 24);
        assert_eq!(estimate.km, 10.0);
    }

    #[test]
    fn test_matrix_element_conversion() {
        let response: DistanceMatrixResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "rows": [{ "elements": [{
                "status": "OK",
                "duration": { "value": 750, "text": "13 mins" },
                "distance": { "value": 4260, "text": "4.3 km" }
            }]}]
        }))
        .unwrap();

        assert_eq!(
            ProviderReply::from(response),
            ProviderReply::Success(TravelEstimate { minutes: 13, km: 4.3 })
        );
    }

    #[test]
    fn test_matrix_element_status_failure() {
        let response: DistanceMatrixResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }]
        }))
        .unwrap();

        assert_eq!(
            ProviderReply::from(response),
            ProviderReply::failure(ProviderStatus::ZeroResults, None)
        );
    }

    #[test]
    fn test_estimator_selection() {
        let config = AppConfig {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            google_maps_api_key: String::new(),
            google_maps_base_url: String::new(),
            google_calendar_base_url: String::new(),
            google_calendar_access_token: String::new(),
            provider_timeout_secs: 1,
            travel_estimator: TravelEstimatorKind::StraightLine,
        };
        let maps = Arc::new(MapsHandle::new(&config));

        // The road estimator waits for the maps client, the straight-line one never does.
        assert!(!estimator_for(TravelEstimatorKind::DistanceMatrix, Arc::clone(&maps)).is_ready());
        assert!(estimator_for(config.travel_estimator, maps).is_ready());
    }
}
