use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Address could not be geocoded: {0}")]
    Geocoding(String),

    #[error("Mapping provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Travel estimate failed: {0}")]
    TravelEstimate(String),

    #[error("Calendar fetch failed for worker {worker_id}: {message}")]
    CalendarFetch { worker_id: String, message: String },

    #[error("No active workers available")]
    NoActiveWorkers,

    #[error("Worker registry error: {0}")]
    Registry(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Optimization failed: {0}")]
    Internal(String),
}

impl SchedulingError {
    /// Errors that only drop the affected gap or worker instead of the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SchedulingError::TravelEstimate(_) | SchedulingError::CalendarFetch { .. }
        )
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        let message = err.to_string();
        match err {
            SchedulingError::Geocoding(_) => AppError::ValidationError(message),
            SchedulingError::InvalidAddress(_) => AppError::BadRequest(message),
            SchedulingError::ProviderUnavailable(_) => AppError::ServiceUnavailable(message),
            SchedulingError::NoActiveWorkers => AppError::NotFound(message),
            SchedulingError::Registry(_) => AppError::Database(message),
            SchedulingError::TravelEstimate(_) | SchedulingError::CalendarFetch { .. } => {
                AppError::ExternalService(message)
            }
            SchedulingError::Internal(_) => AppError::Internal(message),
        }
    }
}
