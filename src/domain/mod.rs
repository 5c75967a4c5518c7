pub mod chart;
pub mod dashboard;
pub mod measurement;
pub mod range;
