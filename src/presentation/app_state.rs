// Application state for HTTP handlers
use crate::application::polling::PollingController;
use crate::application::projector::ChartProjector;
use crate::domain::chart::ColorAssignment;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PollingController>,
    pub projector: ChartProjector,
    pub colors: ColorAssignment,
}
