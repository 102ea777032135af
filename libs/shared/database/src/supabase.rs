use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Thin PostgREST client for the document database.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Service reads without a user session authenticate with the anon key.
        let bearer = auth_token.unwrap_or(&self.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET a table path and deserialize every returned row.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>>
    where T: DeserializeOwned {
        let rows: Vec<Value> = self.request(Method::GET, path, None, None).await?;

        let parsed = rows.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;

        Ok(parsed)
    }
}
