// Presentation layer - HTTP surface over the dashboard core
pub mod app_state;
pub mod handlers;
