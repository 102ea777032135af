// libs/scheduling-cell/src/services/registry.rs
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{WeightConfig, Worker};

/// Lists the workers whose calendars take part in a run.
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, SchedulingError>;
}

/// Supplies the scoring weights; implementations never fail.
#[async_trait]
pub trait WeightSource: Send + Sync {
    async fn get_weights(&self) -> WeightConfig;
}

#[derive(Debug, Deserialize)]
struct CollectorRow {
    id: String,
    name: String,
    calendar_id: Option<String>,
}

pub struct SupabaseWorkerRegistry {
    supabase: SupabaseClient,
}

impl SupabaseWorkerRegistry {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl WorkerRegistry for SupabaseWorkerRegistry {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, SchedulingError> {
        let path = "/rest/v1/collectors?active=eq.true&select=id,name,calendar_id&order=name.asc";

        let rows: Vec<CollectorRow> = self
            .supabase
            .select(path)
            .await
            .map_err(|e| SchedulingError::Registry(e.to_string()))?;

        let workers: Vec<Worker> = rows
            .into_iter()
            .filter_map(|row| match row.calendar_id {
                Some(calendar_ref) if !calendar_ref.is_empty() => Some(Worker {
                    id: row.id,
                    name: row.name,
                    calendar_ref,
                }),
                _ => {
                    warn!("Collector {} has no calendar configured, skipping", row.id);
                    None
                }
            })
            .collect();

        debug!("Registry returned {} active workers", workers.len());
        Ok(workers)
    }
}

#[derive(Debug, Deserialize)]
struct WeightRow {
    date_weight: f64,
    travel_time_weight: f64,
    distance_weight: f64,
}

/// Weights stored in the `scheduling_weights` table, defaults on any failure.
pub struct SupabaseWeightSource {
    supabase: SupabaseClient,
}

impl SupabaseWeightSource {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl WeightSource for SupabaseWeightSource {
    async fn get_weights(&self) -> WeightConfig {
        let path = "/rest/v1/scheduling_weights?select=date_weight,travel_time_weight,distance_weight&limit=1";

        match self.supabase.select::<WeightRow>(path).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => WeightConfig {
                    date_weight: row.date_weight,
                    travel_time_weight: row.travel_time_weight,
                    distance_weight: row.distance_weight,
                },
                None => {
                    debug!("No scheduling weights stored, using defaults");
                    WeightConfig::default()
                }
            },
            Err(e) => {
                warn!("Failed to load scheduling weights, using defaults: {}", e);
                WeightConfig::default()
            }
        }
    }
}

/// Fixed weights, for deployments without a weights table.
#[derive(Debug, Clone, Default)]
pub struct StaticWeights(pub WeightConfig);

#[async_trait]
impl WeightSource for StaticWeights {
    async fn get_weights(&self) -> WeightConfig {
        self.0
    }
}
