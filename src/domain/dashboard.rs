// Range picker entries offered alongside the chart
use super::range::TimeRange;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeOption {
    pub token: &'static str,
    pub label: &'static str,
    pub bucket_seconds: u32,
    pub selected: bool,
}

/// One entry per selectable range. When `current` is the service default
/// nothing is marked selected.
pub fn range_options(current: TimeRange) -> Vec<RangeOption> {
    TimeRange::SELECTABLE
        .into_iter()
        .map(|range| RangeOption {
            token: range.token(),
            label: range.label(),
            bucket_seconds: range.bucket_seconds(),
            selected: range == current,
        })
        .collect()
}
