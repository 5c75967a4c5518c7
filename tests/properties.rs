//! Property tests for smoothing, series normalization and projection.

use chrono::{Offset, Utc};
use proptest::prelude::*;
use skogsnet_telemetry::application::projector::ChartProjector;
use skogsnet_telemetry::application::smoothing::{moving_average, moving_average_sparse};
use skogsnet_telemetry::domain::chart::{ColorAssignment, Quantity};
use skogsnet_telemetry::domain::measurement::{Measurement, TimeSeries};
use skogsnet_telemetry::domain::range::TimeRange;
use std::collections::BTreeSet;

fn readings() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-50.0f64..50.0, 0..64)
}

proptest! {
    #[test]
    fn small_windows_are_identity(values in readings(), window in 0usize..=1) {
        prop_assert_eq!(moving_average(&values, window), values);
    }

    #[test]
    fn smoothing_preserves_length(values in readings(), window in 0usize..16) {
        prop_assert_eq!(moving_average(&values, window).len(), values.len());
    }

    #[test]
    fn constant_input_stays_constant(c in -50.0f64..50.0, len in 0usize..40, window in 1usize..12) {
        let values = vec![c; len];
        for v in moving_average(&values, window) {
            prop_assert!((v - c).abs() < 1e-9, "{} drifted from {}", v, c);
        }
    }

    #[test]
    fn smoothed_values_stay_within_input_bounds(values in readings(), window in 2usize..10) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for v in moving_average(&values, window) {
            prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
        }
    }

    #[test]
    fn sparse_smoothing_keeps_gaps_in_place(
        values in proptest::collection::vec(proptest::option::of(-50.0f64..50.0), 0..64),
        window in 0usize..10,
    ) {
        let smoothed = moving_average_sparse(&values, window);
        prop_assert_eq!(smoothed.len(), values.len());
        for (raw, out) in values.iter().zip(&smoothed) {
            prop_assert_eq!(raw.is_some(), out.is_some());
        }
    }

    #[test]
    fn normalized_series_is_strictly_increasing(
        stamps in proptest::collection::vec(0i64..10_000, 0..64),
    ) {
        let points: Vec<Measurement> = stamps
            .iter()
            .map(|&timestamp| Measurement { timestamp, ..Default::default() })
            .collect();
        let (series, dropped) = TimeSeries::normalized(TimeRange::Today, points);

        prop_assert!(series.points().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        let unique: BTreeSet<i64> = stamps.iter().copied().collect();
        prop_assert_eq!(series.len(), unique.len());
        prop_assert_eq!(dropped, stamps.len() - unique.len());
    }

    #[test]
    fn missing_outside_temperature_projects_as_gap(
        outside in proptest::collection::vec(prop_oneof![Just(0.0f64), 1.0f64..30.0], 1..40),
        window in 1usize..8,
    ) {
        let series: Vec<Measurement> = outside
            .iter()
            .enumerate()
            .map(|(i, &t)| Measurement {
                timestamp: i as i64 * 60_000,
                avg_weather_temp: t,
                ..Default::default()
            })
            .collect();

        let projector = ChartProjector::new(window, Utc.fix());
        let bundle = projector.project(&series, &ColorAssignment::default(), TimeRange::SixHours);
        let plotted = bundle.series_for(Quantity::OutsideTemperature).unwrap();

        prop_assert_eq!(plotted.points.len(), outside.len());
        for (raw, point) in outside.iter().zip(&plotted.points) {
            prop_assert_eq!(*raw == 0.0, point.value.is_none());
        }
    }
}
