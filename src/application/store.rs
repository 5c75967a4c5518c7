// In-memory holder for the live snapshot and series
use crate::domain::measurement::{LatestSnapshot, TimeSeries};
use crate::domain::range::TimeRange;
use std::sync::{Arc, PoisonError, RwLock};

/// Replace-on-write value holder. Readers get `Arc`s, so a reader always
/// sees one complete value, never a half-applied update.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    latest: Option<Arc<LatestSnapshot>>,
    series: Option<Arc<TimeSeries>>,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the series. A series built for another range is relabelled.
    pub fn set_series(&mut self, range: TimeRange, series: TimeSeries) {
        let series = if series.range() == range {
            series
        } else {
            TimeSeries::normalized(range, series.points().to_vec()).0
        };
        self.series = Some(Arc::new(series));
    }

    /// Replaces the snapshot; `None` clears it.
    pub fn set_latest(&mut self, snapshot: Option<LatestSnapshot>) {
        self.latest = snapshot.map(Arc::new);
    }

    pub fn series(&self) -> Option<Arc<TimeSeries>> {
        self.series.clone()
    }

    pub fn latest(&self) -> Option<Arc<LatestSnapshot>> {
        self.latest.clone()
    }
}

/// Store handle shared between the polling controller (sole writer) and
/// readers such as HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MeasurementStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&MeasurementStore) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn series(&self) -> Option<Arc<TimeSeries>> {
        self.read(MeasurementStore::series)
    }

    pub fn latest(&self) -> Option<Arc<LatestSnapshot>> {
        self.read(MeasurementStore::latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::measurement::Measurement;

    fn series(range: TimeRange, stamps: &[i64]) -> TimeSeries {
        let points = stamps
            .iter()
            .map(|&timestamp| Measurement {
                timestamp,
                ..Default::default()
            })
            .collect();
        TimeSeries::normalized(range, points).0
    }

    #[test]
    fn test_replace_on_write() {
        let mut store = MeasurementStore::new();
        assert!(store.series().is_none());
        assert!(store.latest().is_none());

        store.set_series(TimeRange::OneHour, series(TimeRange::OneHour, &[0, 60_000]));
        let first = store.series().unwrap();

        store.set_series(TimeRange::Week, series(TimeRange::Week, &[3_600_000]));
        let second = store.series().unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.range(), TimeRange::Week);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_set_series_relabels_range() {
        let mut store = MeasurementStore::new();
        store.set_series(TimeRange::Month, series(TimeRange::Today, &[0]));
        assert_eq!(store.series().unwrap().range(), TimeRange::Month);
    }

    #[test]
    fn test_set_latest_none_clears() {
        let store = SharedStore::new();
        store.write(|s| {
            s.set_latest(Some(LatestSnapshot::new(Measurement::default(), Some(0.5))))
        });
        assert!(store.latest().is_some());

        store.write(|s| s.set_latest(None));
        assert!(store.latest().is_none());
    }
}
