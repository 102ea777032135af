pub mod calendar;
pub mod feasibility;
pub mod gaps;
pub mod geocoding;
pub mod maps;
pub mod optimizer;
pub mod registry;
pub mod scoring;
pub mod travel;

pub use calendar::{CalendarAggregator, CalendarProvider, CalendarSnapshot, GoogleCalendarClient};
pub use feasibility::{FeasibilityReport, FeasibilityTester};
pub use gaps::find_gaps;
pub use geocoding::{Geocoder, GoogleGeocoder};
pub use maps::MapsHandle;
pub use optimizer::SlotOptimizer;
pub use registry::{
    StaticWeights, SupabaseWeightSource, SupabaseWorkerRegistry, WeightSource, WorkerRegistry,
};
pub use scoring::score_and_rank;
pub use travel::{estimator_for, DistanceMatrixEstimator, HaversineEstimator, TravelEstimator};
