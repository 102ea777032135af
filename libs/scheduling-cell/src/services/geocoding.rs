// libs/scheduling-cell/src/services/geocoding.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::SchedulingError;
use crate::models::Coordinate;
use crate::services::maps::{MapsHandle, ProviderReply, ProviderStatus};

/// Resolves a free-text address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn is_ready(&self) -> bool {
        true
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, SchedulingError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: ProviderStatus,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<GeocodeResponse> for ProviderReply<Coordinate> {
    fn from(response: GeocodeResponse) -> Self {
        if response.status != ProviderStatus::Ok {
            return ProviderReply::failure(response.status, response.error_message);
        }

        match response.results.first() {
            Some(result) => ProviderReply::Success(Coordinate::new(
                result.geometry.location.lat,
                result.geometry.location.lng,
            )),
            None => ProviderReply::failure(ProviderStatus::ZeroResults, None),
        }
    }
}

/// Geocoder backed by the Google Geocoding web service.
pub struct GoogleGeocoder {
    maps: Arc<MapsHandle>,
    region: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(maps: Arc<MapsHandle>) -> Self {
        Self { maps, region: None }
    }

    /// Bias results towards a ccTLD region code, e.g. "br".
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    fn is_ready(&self) -> bool {
        self.maps.is_ready()
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Coordinate, SchedulingError> {
        let client = self.maps.client()?;

        let mut params = vec![("address", address.to_string())];
        if let Some(region) = &self.region {
            params.push(("region", region.clone()));
        }

        let response: GeocodeResponse = client
            .get_json("geocode", &params)
            .await
            .map_err(|e| {
                warn!("Geocoding request failed: {}", e);
                SchedulingError::Geocoding(e.to_string())
            })?;

        let coordinate = ProviderReply::from(response).into_result(SchedulingError::Geocoding)?;
        debug!("Geocoded address to {:?}", coordinate);

        Ok(coordinate)
    }
}
