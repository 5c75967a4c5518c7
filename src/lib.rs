// Client-side core of the skogsnet telemetry dashboard
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
