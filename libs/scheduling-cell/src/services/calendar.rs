// libs/scheduling-cell/src/services/calendar.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;

use crate::error::SchedulingError;
use crate::models::{BusyInterval, Coordinate, Worker};

const ORIGIN_ADDRESS_KEY: &str = "originAddress";
const ORIGIN_LAT_KEY: &str = "originLat";
const ORIGIN_LNG_KEY: &str = "originLng";
const DESTINATION_ADDRESS_KEY: &str = "destinationAddress";
const DESTINATION_LAT_KEY: &str = "destinationLat";
const DESTINATION_LNG_KEY: &str = "destinationLng";

/// Source of committed obligations for a single worker.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn fetch_busy_intervals(
        &self,
        worker_id: &str,
        calendar_ref: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SchedulingError>;
}

// ==============================================================================
// GOOGLE CALENDAR ADAPTER
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEvent {
    status: Option<String>,
    location: Option<String>,
    start: EventTime,
    end: EventTime,
    extended_properties: Option<ExtendedProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtendedProperties {
    #[serde(default)]
    private: std::collections::HashMap<String, String>,
}

impl ExtendedProperties {
    fn text(&self, key: &str) -> Option<String> {
        self.private
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn coordinate(&self, lat_key: &str, lng_key: &str) -> Option<Coordinate> {
        let lat = self.private.get(lat_key)?.trim().parse::<f64>().ok()?;
        let lng = self.private.get(lng_key)?.trim().parse::<f64>().ok()?;
        Some(Coordinate::new(lat, lng))
    }
}

impl CalendarEvent {
    /// Timed, non-cancelled events become busy intervals. All-day entries
    /// carry only a date and do not block collection times.
    fn into_busy_interval(self, worker_id: &str) -> Option<BusyInterval> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }

        let start = self.start.date_time?;
        let end = self.end.date_time?;
        if end <= start {
            return None;
        }

        let props = self.extended_properties.unwrap_or_default();

        Some(BusyInterval {
            worker_id: worker_id.to_string(),
            start,
            end,
            location_before: props.text(ORIGIN_ADDRESS_KEY),
            coordinates_before: props.coordinate(ORIGIN_LAT_KEY, ORIGIN_LNG_KEY),
            location_after: props.text(DESTINATION_ADDRESS_KEY).or(self.location),
            coordinates_after: props.coordinate(DESTINATION_LAT_KEY, DESTINATION_LNG_KEY),
        })
    }
}

/// Reads busy intervals from the Google Calendar v3 events list.
pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.google_calendar_base_url.trim_end_matches('/').to_string(),
            access_token: config.google_calendar_access_token.clone(),
        }
    }

    async fn fetch_page(
        &self,
        calendar_ref: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<EventsPage, reqwest::Error> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_ref)
        );

        let mut query = vec![
            ("timeMin", window_start.to_rfc3339()),
            ("timeMax", window_end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        self.http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<EventsPage>()
            .await
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    #[instrument(skip(self))]
    async fn fetch_busy_intervals(
        &self,
        worker_id: &str,
        calendar_ref: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SchedulingError> {
        let mut intervals = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(calendar_ref, window_start, window_end, page_token.as_deref())
                .await
                .map_err(|e| SchedulingError::CalendarFetch {
                    worker_id: worker_id.to_string(),
                    message: e.to_string(),
                })?;

            intervals.extend(
                page.items
                    .into_iter()
                    .filter_map(|event| event.into_busy_interval(worker_id)),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Fetched {} busy intervals for worker {}", intervals.len(), worker_id);
        Ok(intervals)
    }
}

// ==============================================================================
// AGGREGATION
// ==============================================================================

/// Busy intervals of every worker, plus the workers whose fetch failed.
#[derive(Debug, Clone, Default)]
pub struct CalendarSnapshot {
    pub intervals: Vec<BusyInterval>,
    pub failed_workers: Vec<String>,
}

/// Fans out one calendar fetch per worker and merges the results.
///
/// A worker whose fetch errors or times out contributes no intervals; the
/// run carries on with the rest.
pub struct CalendarAggregator {
    provider: Arc<dyn CalendarProvider>,
    timeout: Duration,
}

impl CalendarAggregator {
    pub fn new(provider: Arc<dyn CalendarProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn collect(
        &self,
        workers: &[Worker],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> CalendarSnapshot {
        let fetches = workers.iter().map(|worker| {
            let provider = Arc::clone(&self.provider);
            let limit = self.timeout;

            async move {
                let result = timeout(
                    limit,
                    provider.fetch_busy_intervals(
                        &worker.id,
                        &worker.calendar_ref,
                        window_start,
                        window_end,
                    ),
                )
                .await;

                match result {
                    Ok(Ok(intervals)) => Ok(intervals),
                    Ok(Err(e)) => {
                        warn!("Failed to fetch calendar for worker {}: {}", worker.id, e);
                        Err(worker.id.clone())
                    }
                    Err(_) => {
                        warn!("Timeout fetching calendar for worker {}", worker.id);
                        Err(worker.id.clone())
                    }
                }
            }
        });

        let results = futures::future::join_all(fetches).await;

        let mut snapshot = CalendarSnapshot::default();
        for result in results {
            match result {
                Ok(intervals) => snapshot.intervals.extend(intervals),
                Err(worker_id) => snapshot.failed_workers.push(worker_id),
            }
        }

        info!(
            "Collected {} busy intervals from {} workers ({} failed)",
            snapshot.intervals.len(),
            workers.len(),
            snapshot.failed_workers.len()
        );

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: serde_json::Value) -> CalendarEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_event_with_private_locations() {
        let interval = event(serde_json::json!({
            "status": "confirmed",
            "start": { "dateTime": "2025-03-10T09:00:00-03:00" },
            "end": { "dateTime": "2025-03-10T10:00:00-03:00" },
            "extendedProperties": { "private": {
                "originAddress": "Rua da Bahia, 1000",
                "originLat": "-19.9245",
                "originLng": "-43.9352",
                "destinationLat": "-19.9200",
                "destinationLng": "-43.9300"
            }}
        }))
        .into_busy_interval("shirley")
        .unwrap();

        assert_eq!(interval.worker_id, "shirley");
        assert_eq!(interval.start.to_rfc3339(), "2025-03-10T12:00:00+00:00");
        assert_eq!(interval.location_before.as_deref(), Some("Rua da Bahia, 1000"));
        assert_eq!(interval.coordinates_before, Some(Coordinate::new(-19.9245, -43.9352)));
        assert_eq!(interval.coordinates_after, Some(Coordinate::new(-19.92, -43.93)));
        assert_eq!(interval.location_after, None);
    }

    #[test]
    fn test_event_location_used_as_destination() {
        let interval = event(serde_json::json!({
            "location": "Av. Afonso Pena, 500",
            "start": { "dateTime": "2025-03-10T09:00:00Z" },
            "end": { "dateTime": "2025-03-10T10:00:00Z" }
        }))
        .into_busy_interval("carlos")
        .unwrap();

        assert_eq!(interval.location_after.as_deref(), Some("Av. Afonso Pena, 500"));
        assert!(interval.coordinates_before.is_none());
    }

    #[test]
    fn test_cancelled_and_all_day_events_are_skipped() {
        let cancelled = event(serde_json::json!({
            "status": "cancelled",
            "start": { "dateTime": "2025-03-10T09:00:00Z" },
            "end": { "dateTime": "2025-03-10T10:00:00Z" }
        }));
        assert!(cancelled.into_busy_interval("carlos").is_none());

        let all_day = event(serde_json::json!({
            "start": { "date": "2025-03-10" },
            "end": { "date": "2025-03-11" }
        }));
        assert!(all_day.into_busy_interval("carlos").is_none());
    }

    #[test]
    fn test_unparseable_coordinates_are_ignored() {
        let interval = event(serde_json::json!({
            "start": { "dateTime": "2025-03-10T09:00:00Z" },
            "end": { "dateTime": "2025-03-10T10:00:00Z" },
            "extendedProperties": { "private": { "originLat": "abc", "originLng": "-43.9" } }
        }))
        .into_busy_interval("carlos")
        .unwrap();

        assert!(interval.coordinates_before.is_none());
    }
}
