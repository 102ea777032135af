use chrono::{DateTime, Utc};
use serde_json::json;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_maps_api_key: String,
    pub google_maps_base_url: String,
    pub google_calendar_base_url: String,
    pub google_calendar_access_token: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            google_maps_api_key: "test-maps-key".to_string(),
            google_maps_base_url: "http://localhost:54322/maps/api".to_string(),
            google_calendar_base_url: "http://localhost:54323/calendar/v3".to_string(),
            google_calendar_access_token: "test-calendar-token".to_string(),
        }
    }
}

impl TestConfig {
    /// Points every provider at the same mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            google_maps_base_url: format!("{}/maps/api", uri),
            google_calendar_base_url: format!("{}/calendar/v3", uri),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            google_maps_api_key: self.google_maps_api_key.clone(),
            google_maps_base_url: self.google_maps_base_url.clone(),
            google_calendar_base_url: self.google_calendar_base_url.clone(),
            google_calendar_access_token: self.google_calendar_access_token.clone(),
            provider_timeout_secs: 2,
            travel_estimator: Default::default(),
        }
    }
}

/// Canned payloads in the shape returned by the external providers.
pub struct MockProviderResponses;

impl MockProviderResponses {
    pub fn geocode_ok(lat: f64, lng: f64) -> serde_json::Value {
        json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Av. Afonso Pena, 1000 - Centro, Belo Horizonte - MG, Brasil",
                "geometry": { "location": { "lat": lat, "lng": lng } }
            }]
        })
    }

    pub fn geocode_status(status: &str, message: Option<&str>) -> serde_json::Value {
        match message {
            Some(message) => json!({ "status": status, "results": [], "error_message": message }),
            None => json!({ "status": status, "results": [] }),
        }
    }

    pub fn distance_matrix_ok(duration_secs: u64, distance_meters: u64) -> serde_json::Value {
        json!({
            "status": "OK",
            "origin_addresses": ["Origin"],
            "destination_addresses": ["Destination"],
            "rows": [{ "elements": [{
                "status": "OK",
                "duration": { "value": duration_secs, "text": format!("{} mins", duration_secs / 60) },
                "distance": { "value": distance_meters, "text": format!("{} m", distance_meters) }
            }]}]
        })
    }

    pub fn distance_matrix_element_status(status: &str) -> serde_json::Value {
        json!({
            "status": "OK",
            "rows": [{ "elements": [{ "status": status }] }]
        })
    }

    pub fn calendar_event(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> serde_json::Value {
        json!({
            "status": "confirmed",
            "summary": "Coleta domiciliar",
            "start": { "dateTime": start.to_rfc3339() },
            "end": { "dateTime": end.to_rfc3339() },
            "extendedProperties": { "private": {
                "originLat": origin.0.to_string(),
                "originLng": origin.1.to_string(),
                "destinationLat": destination.0.to_string(),
                "destinationLng": destination.1.to_string()
            }}
        })
    }

    pub fn calendar_page(items: Vec<serde_json::Value>, next_page_token: Option<&str>) -> serde_json::Value {
        match next_page_token {
            Some(token) => json!({ "kind": "calendar#events", "items": items, "nextPageToken": token }),
            None => json!({ "kind": "calendar#events", "items": items }),
        }
    }

    pub fn collector_row(id: &str, name: &str, calendar_id: Option<&str>) -> serde_json::Value {
        json!({ "id": id, "name": name, "calendar_id": calendar_id })
    }

    pub fn weights_row(date: f64, travel_time: f64, distance: f64) -> serde_json::Value {
        json!({
            "date_weight": date,
            "travel_time_weight": travel_time,
            "distance_weight": distance
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null
        })
    }
}
