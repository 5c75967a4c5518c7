pub mod cancellation;
pub mod error;
pub mod measurement_source;
pub mod polling;
pub mod projector;
pub mod scheduler;
pub mod smoothing;
pub mod store;
