// libs/scheduling-cell/src/services/maps.rs
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::SchedulingError;

/// Status codes shared by the Geocoding and Distance Matrix web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    NotFound,
    OverQueryLimit,
    OverDailyLimit,
    RequestDenied,
    InvalidRequest,
    MaxElementsExceeded,
    MaxDimensionsExceeded,
    MaxRouteLengthExceeded,
    UnknownError,
    #[serde(other)]
    Unrecognized,
}

/// Provider answer after the status field has been interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply<T> {
    Success(T),
    Failure {
        status: ProviderStatus,
        message: Option<String>,
    },
}

impl<T> ProviderReply<T> {
    pub fn failure(status: ProviderStatus, message: Option<String>) -> Self {
        ProviderReply::Failure { status, message }
    }

    pub fn into_result<E>(self, to_error: impl FnOnce(String) -> E) -> Result<T, E> {
        match self {
            ProviderReply::Success(value) => Ok(value),
            ProviderReply::Failure { status, message } => {
                let detail = match message {
                    Some(message) => format!("{:?}: {}", status, message),
                    None => format!("{:?}", status),
                };
                Err(to_error(detail))
            }
        }
    }
}

/// Authenticated HTTP client for the mapping web services.
pub struct MapsClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl MapsClient {
    pub(crate) async fn get_json<T>(
        &self,
        service: &str,
        params: &[(&str, String)],
    ) -> Result<T, reqwest::Error>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}/json", self.base_url, service);
        debug!("Calling maps service {}", url);

        self.http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

/// Process-wide handle to the mapping client.
///
/// Initialized at most once; consumers fail with `ProviderUnavailable`
/// until `initialize` has completed successfully.
pub struct MapsHandle {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: OnceCell<Arc<MapsClient>>,
}

impl MapsHandle {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.google_maps_api_key.clone(),
            base_url: config.google_maps_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.provider_timeout_secs),
            client: OnceCell::new(),
        }
    }

    pub async fn initialize(&self) -> Result<Arc<MapsClient>, SchedulingError> {
        self.client
            .get_or_try_init(|| async {
                if self.api_key.is_empty() {
                    return Err(SchedulingError::ProviderUnavailable(
                        "GOOGLE_MAPS_API_KEY is not configured".to_string(),
                    ));
                }

                let http = Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| SchedulingError::ProviderUnavailable(e.to_string()))?;

                info!("Maps client initialized for {}", self.base_url);
                Ok(Arc::new(MapsClient {
                    http,
                    api_key: self.api_key.clone(),
                    base_url: self.base_url.clone(),
                }))
            })
            .await
            .map(Arc::clone)
    }

    pub fn client(&self) -> Result<Arc<MapsClient>, SchedulingError> {
        self.client.get().cloned().ok_or_else(|| {
            SchedulingError::ProviderUnavailable("maps client has not been initialized".to_string())
        })
    }

    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }
}
