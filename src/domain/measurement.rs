// Measurement domain models
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::range::TimeRange;

/// Outside-weather value the upstream service reports when it had no weather
/// reading for the bucket.
pub const MISSING_SENTINEL: f64 = 0.0;

/// One aggregated sample as returned by the measurement service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurement {
    #[serde(rename = "AggregatedTimestamp", alias = "timestamp", deserialize_with = "nullable")]
    pub timestamp: i64,
    #[serde(rename = "AvgTemperature", alias = "temperature", deserialize_with = "nullable")]
    pub avg_temperature: f64,
    #[serde(rename = "AvgHumidity", alias = "humidity", deserialize_with = "nullable")]
    pub avg_humidity: f64,
    #[serde(rename = "AvgWeatherTemp", alias = "weather_temp", deserialize_with = "nullable")]
    pub avg_weather_temp: f64,
    #[serde(rename = "AvgWeatherHumidity", deserialize_with = "nullable")]
    pub avg_weather_humidity: f64,
    #[serde(rename = "AvgWindSpeed", deserialize_with = "nullable")]
    pub avg_wind_speed: f64,
    #[serde(rename = "AvgWindDeg", deserialize_with = "nullable")]
    pub avg_wind_deg: f64,
    #[serde(rename = "AvgClouds", deserialize_with = "nullable")]
    pub avg_clouds: f64,
    /// Averaged on the wire, so it arrives as a float and is rounded here.
    #[serde(rename = "AvgWeatherCode", deserialize_with = "weather_code")]
    pub weather_code: i64,
    #[serde(rename = "Description", deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "City", deserialize_with = "nullable")]
    pub city: String,
}

impl Measurement {
    /// Outside temperature, or `None` when the service had no weather data.
    pub fn outside_temperature(&self) -> Option<f64> {
        present(self.avg_weather_temp)
    }

    /// Outside humidity, same sentinel rule as the outside temperature.
    pub fn outside_humidity(&self) -> Option<f64> {
        present(self.avg_weather_humidity)
    }
}

/// Maps the missing sentinel to `None`.
pub fn present(value: f64) -> Option<f64> {
    if value == MISSING_SENTINEL {
        None
    } else {
        Some(value)
    }
}

/// The most recent measurement plus the temperature trend behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSnapshot {
    pub measurement: Measurement,
    /// Temperature change since the previous snapshot. Absent when the
    /// service had no earlier point or answered with the legacy shape.
    pub trajectory: Option<f64>,
}

impl LatestSnapshot {
    pub fn new(measurement: Measurement, trajectory: Option<f64>) -> Self {
        Self {
            measurement,
            trajectory,
        }
    }
}

/// An immutable series for one range, ascending by timestamp with no
/// duplicate timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    range: TimeRange,
    points: Arc<[Measurement]>,
}

impl TimeSeries {
    /// Builds a series, restoring the ordering invariant if the input broke
    /// it. Returns the series and the number of duplicate points dropped.
    pub fn normalized(range: TimeRange, mut points: Vec<Measurement>) -> (Self, usize) {
        if !points.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
            points.sort_by_key(|m| m.timestamp);
        }
        let before = points.len();
        points.dedup_by_key(|m| m.timestamp);
        let dropped = before - points.len();

        (
            Self {
                range,
                points: points.into(),
            },
            dropped,
        )
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn points(&self) -> &[Measurement] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn weather_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .map(|code| code.round() as i64)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: i64, temp: f64) -> Measurement {
        Measurement {
            timestamp,
            avg_temperature: temp,
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_service_fields() {
        let json = r#"{
            "AggregatedTimestamp": 1700000000000,
            "AvgTemperature": 21.5,
            "AvgHumidity": 40.25,
            "City": "Umea",
            "AvgWeatherTemp": -3.5,
            "AvgWeatherHumidity": 80,
            "AvgWindSpeed": 4.2,
            "AvgWindDeg": 270,
            "AvgClouds": 75,
            "AvgWeatherCode": 802.6,
            "Description": "broken clouds"
        }"#;

        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.timestamp, 1_700_000_000_000);
        assert_eq!(m.avg_temperature, 21.5);
        assert_eq!(m.weather_code, 803);
        assert_eq!(m.city, "Umea");
        assert_eq!(m.outside_temperature(), Some(-3.5));
    }

    #[test]
    fn test_deserialize_nulls_and_legacy_keys() {
        let json = r#"{
            "timestamp": 60000,
            "temperature": 20.0,
            "humidity": 35.0,
            "weather_temp": null,
            "Description": null
        }"#;

        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.timestamp, 60_000);
        assert_eq!(m.avg_humidity, 35.0);
        assert_eq!(m.avg_weather_temp, MISSING_SENTINEL);
        assert_eq!(m.outside_temperature(), None);
        assert!(m.description.is_empty());
    }

    #[test]
    fn test_normalized_sorts_and_dedups() {
        let (series, dropped) = TimeSeries::normalized(
            TimeRange::OneHour,
            vec![at(120, 3.0), at(0, 1.0), at(60, 2.0), at(60, 9.0)],
        );

        let stamps: Vec<i64> = series.points().iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![0, 60, 120]);
        assert_eq!(dropped, 1);
        assert_eq!(series.range(), TimeRange::OneHour);
    }

    #[test]
    fn test_normalized_keeps_ordered_input() {
        let input = vec![at(0, 20.0), at(60_000, 22.0), at(120_000, 24.0)];
        let (series, dropped) = TimeSeries::normalized(TimeRange::Today, input.clone());
        assert_eq!(series.points(), input.as_slice());
        assert_eq!(dropped, 0);
    }
}
