// Port to the remote measurement service
use crate::application::cancellation::CancellationToken;
use crate::application::error::FetchError;
use crate::domain::measurement::{LatestSnapshot, Measurement};
use crate::domain::range::TimeRange;
use async_trait::async_trait;

#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Latest snapshot. `Ok(None)` means the service explicitly has no data.
    async fn fetch_latest(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<LatestSnapshot>, FetchError>;

    /// Aggregated series for `range`, as the service returned it.
    async fn fetch_series(
        &self,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<Measurement>, FetchError>;
}
