// Chart projector - Maps stored measurements into render-ready plot data
use crate::application::smoothing::{moving_average, moving_average_sparse};
use crate::domain::chart::{
    AxisId, AxisSide, AxisSpec, ColorAssignment, LatestReadout, PlotBundle, PlotPoint, PlotSeries,
    Quantity, TickLabel, Trend,
};
use crate::domain::measurement::{LatestSnapshot, Measurement, present};
use crate::domain::range::{TickPolicy, TimeRange};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Stateless projection settings. `project` and `readout` are pure.
#[derive(Debug, Clone, Copy)]
pub struct ChartProjector {
    smoothing_window: usize,
    offset: FixedOffset,
}

impl ChartProjector {
    pub fn new(smoothing_window: usize, offset: FixedOffset) -> Self {
        Self {
            smoothing_window,
            offset,
        }
    }

    pub fn project(
        &self,
        series: &[Measurement],
        colors: &ColorAssignment,
        range: TimeRange,
    ) -> PlotBundle {
        let tick_policy = range.tick_policy();

        PlotBundle {
            range,
            tick_policy,
            axes: axes(colors),
            series: Quantity::ALL
                .into_iter()
                .map(|quantity| self.project_quantity(series, quantity, colors))
                .collect(),
            ticks: self.ticks(series, tick_policy),
        }
    }

    /// Tick labels for a series. Consecutive points falling on the same
    /// day and label share one tick.
    pub fn ticks(&self, series: &[Measurement], policy: TickPolicy) -> Vec<TickLabel> {
        let mut ticks: Vec<TickLabel> = Vec::new();
        let mut last: Option<NaiveDate> = None;
        for m in series {
            let Some((day, text)) = policy.slot(m.timestamp, self.offset) else {
                continue;
            };
            if last == Some(day) && ticks.last().is_some_and(|prev| prev.text == text) {
                continue;
            }
            last = Some(day);
            ticks.push(TickLabel {
                time_ms: m.timestamp,
                text,
            });
        }
        ticks
    }

    pub fn readout(&self, latest: Option<&LatestSnapshot>) -> LatestReadout {
        let Some(snapshot) = latest else {
            return LatestReadout::default();
        };
        let m = &snapshot.measurement;

        LatestReadout {
            timestamp: Some(m.timestamp),
            temperature: Some(m.avg_temperature),
            humidity: Some(m.avg_humidity),
            outside_temperature: m.outside_temperature(),
            outside_humidity: m.outside_humidity(),
            wind_speed: Some(m.avg_wind_speed),
            description: non_empty(&m.description),
            city: non_empty(&m.city),
            trajectory: snapshot.trajectory,
            trend: snapshot.trajectory.map(Trend::from_trajectory),
        }
    }

    fn project_quantity(
        &self,
        series: &[Measurement],
        quantity: Quantity,
        colors: &ColorAssignment,
    ) -> PlotSeries {
        let raw: Vec<Option<f64>> = series.iter().map(|m| raw_value(m, quantity)).collect();

        let values = if !quantity.smoothed() {
            raw
        } else if quantity == Quantity::OutsideTemperature {
            moving_average_sparse(&raw, self.smoothing_window)
        } else {
            let dense: Vec<f64> = raw.iter().map(|v| v.unwrap_or_default()).collect();
            moving_average(&dense, self.smoothing_window)
                .into_iter()
                .map(Some)
                .collect()
        };

        let points = series
            .iter()
            .zip(values)
            .map(|(m, value)| PlotPoint {
                time_ms: m.timestamp,
                value,
            })
            .collect();

        PlotSeries {
            quantity,
            name: quantity.name().to_string(),
            axis: quantity.axis(),
            unit: quantity.unit(),
            color: colors.color_for(quantity).to_string(),
            points,
        }
    }
}

impl Default for ChartProjector {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW, Utc.fix())
    }
}

fn raw_value(m: &Measurement, quantity: Quantity) -> Option<f64> {
    match quantity {
        Quantity::Temperature => Some(m.avg_temperature),
        Quantity::OutsideTemperature => present(m.avg_weather_temp),
        Quantity::Humidity => Some(m.avg_humidity),
        Quantity::WindSpeed => Some(m.avg_wind_speed),
    }
}

fn axes(colors: &ColorAssignment) -> Vec<AxisSpec> {
    vec![
        AxisSpec {
            id: AxisId::Temperature,
            title: "Temperature (°C)".to_string(),
            unit: Quantity::Temperature.unit(),
            side: AxisSide::Left,
            color: colors.temperature.clone(),
        },
        AxisSpec {
            id: AxisId::Humidity,
            title: "Humidity %".to_string(),
            unit: Quantity::Humidity.unit(),
            side: AxisSide::Right,
            color: colors.humidity.clone(),
        },
        AxisSpec {
            id: AxisId::Wind,
            title: "Wind Speed (m/s)".to_string(),
            unit: Quantity::WindSpeed.unit(),
            side: AxisSide::Right,
            color: colors.wind_speed.clone(),
        },
    ]
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(timestamp: i64, temp: f64, outside: f64) -> Measurement {
        Measurement {
            timestamp,
            avg_temperature: temp,
            avg_humidity: 40.0,
            avg_weather_temp: outside,
            avg_wind_speed: 3.0,
            ..Default::default()
        }
    }

    fn values(bundle: &PlotBundle, quantity: Quantity) -> Vec<Option<f64>> {
        bundle.series_for(quantity).unwrap().values().collect()
    }

    #[test]
    fn test_smoothed_temperature() {
        let projector = ChartProjector::new(3, Utc.fix());
        let series = [
            m(0, 20.0, 5.0),
            m(60_000, 22.0, 5.0),
            m(120_000, 24.0, 5.0),
        ];

        let bundle = projector.project(&series, &ColorAssignment::default(), TimeRange::OneHour);
        assert_eq!(
            values(&bundle, Quantity::Temperature),
            vec![Some(20.0), Some(21.0), Some(22.0)]
        );
        assert_eq!(
            values(&bundle, Quantity::WindSpeed),
            vec![Some(3.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn test_axis_assignment() {
        let bundle = ChartProjector::default().project(
            &[m(0, 20.0, 1.0)],
            &ColorAssignment::default(),
            TimeRange::Today,
        );

        let axis = |q| bundle.series_for(q).unwrap().axis;
        assert_eq!(axis(Quantity::Temperature), AxisId::Temperature);
        assert_eq!(axis(Quantity::OutsideTemperature), AxisId::Temperature);
        assert_eq!(axis(Quantity::Humidity), AxisId::Humidity);
        assert_eq!(axis(Quantity::WindSpeed), AxisId::Wind);
        assert_eq!(bundle.axes.len(), 3);
        assert_eq!(
            bundle.series_for(Quantity::Humidity).unwrap().unit.symbol(),
            "%"
        );
        assert_eq!(bundle.series_for(Quantity::Temperature).unwrap().color, "#ef4444");
    }

    #[test]
    fn test_missing_outside_temperature_is_a_gap() {
        let projector = ChartProjector::new(1, Utc.fix());
        let series = [m(0, 20.0, 4.0), m(60_000, 20.0, 0.0), m(120_000, 20.0, 6.0)];

        let bundle = projector.project(&series, &ColorAssignment::default(), TimeRange::OneHour);
        assert_eq!(
            values(&bundle, Quantity::OutsideTemperature),
            vec![Some(4.0), None, Some(6.0)]
        );

        let smoothed = ChartProjector::new(5, Utc.fix()).project(
            &series,
            &ColorAssignment::default(),
            TimeRange::OneHour,
        );
        assert_eq!(
            values(&smoothed, Quantity::OutsideTemperature),
            vec![Some(4.0), None, Some(5.0)]
        );
    }

    #[test]
    fn test_ticks_follow_range_policy() {
        let projector = ChartProjector::new(1, Utc.fix());
        let series: Vec<Measurement> = (0..12).map(|i| m(i * 60_000, 20.0, 1.0)).collect();

        let bundle = projector.project(&series, &ColorAssignment::default(), TimeRange::OneHour);
        let texts: Vec<&str> = bundle.ticks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["00:00", "00:05", "00:10"]);
    }

    #[test]
    fn test_calendar_ticks_one_per_day() {
        let projector = ChartProjector::new(1, Utc.fix());
        let day = 86_400_000;
        let series: Vec<Measurement> = (0..6).map(|i| m(i * day / 2, 20.0, 1.0)).collect();

        let ticks = projector.ticks(&series, TimeRange::Year.tick_policy());
        let texts: Vec<&str> = ticks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["01 Jan", "02 Jan", "03 Jan"]);
    }

    #[test]
    fn test_daily_points_keep_one_tick_each() {
        let projector = ChartProjector::new(1, Utc.fix());
        let day = 86_400_000;
        let series: Vec<Measurement> = (0..30).map(|i| m(i * day, 20.0, 1.0)).collect();

        for range in [TimeRange::Week, TimeRange::Month] {
            let bundle = projector.project(&series, &ColorAssignment::default(), range);
            assert_eq!(bundle.ticks.len(), 30, "{}", range);
            assert_eq!(bundle.ticks[1].time_ms, day);
        }
    }

    #[test]
    fn test_empty_series_projects_empty_bundle() {
        let bundle = ChartProjector::default().project(
            &[],
            &ColorAssignment::default(),
            TimeRange::All,
        );
        assert!(bundle.is_empty());
        assert_eq!(bundle.series.len(), 4);
        assert!(bundle.ticks.is_empty());
    }

    #[test]
    fn test_readout() {
        let projector = ChartProjector::default();
        assert!(!projector.readout(None).has_data());

        let mut latest = m(1_000, 21.0, 0.0);
        latest.description = "clear sky".to_string();
        let snapshot = LatestSnapshot::new(latest, Some(-0.4));

        let readout = projector.readout(Some(&snapshot));
        assert!(readout.has_data());
        assert_eq!(readout.temperature, Some(21.0));
        assert_eq!(readout.outside_temperature, None);
        assert_eq!(readout.description.as_deref(), Some("clear sky"));
        assert_eq!(readout.city, None);
        assert_eq!(readout.trend, Some(Trend::Falling));
    }
}
