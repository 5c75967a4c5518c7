// Response shape detection for the measurement service endpoints
use crate::application::error::FetchError;
use crate::domain::measurement::{LatestSnapshot, Measurement};
use serde_json::Value;

pub const LATEST_ENDPOINT: &str = "/api/measurements/latest";
pub const SERIES_ENDPOINT: &str = "/api/measurements";

/// Which of the two observed `latest` shapes the service answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestShape {
    /// `{ "latest": Measurement | null, "trajectory": number | null }`
    Envelope,
    /// `[Measurement]`, without a trajectory.
    LegacyArray,
}

pub fn detect_latest_shape(value: &Value) -> Option<LatestShape> {
    match value {
        Value::Object(map) if map.contains_key("latest") => Some(LatestShape::Envelope),
        Value::Array(items) if items.len() == 1 => Some(LatestShape::LegacyArray),
        _ => None,
    }
}

pub fn parse_latest(value: Value) -> Result<Option<LatestSnapshot>, FetchError> {
    match value {
        Value::Object(mut map) if map.contains_key("latest") => {
            let trajectory = match map.remove("trajectory") {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64(),
                Some(other) => {
                    return Err(FetchError::shape(
                        LATEST_ENDPOINT,
                        format!("trajectory must be a number or null, got {}", kind(&other)),
                    ));
                }
            };
            match map.remove("latest") {
                None | Some(Value::Null) => Ok(None),
                Some(latest) => {
                    let measurement = measurement(LATEST_ENDPOINT, latest)?;
                    Ok(Some(LatestSnapshot::new(measurement, trajectory)))
                }
            }
        }
        Value::Array(items) if items.len() == 1 => {
            let measurement = items
                .into_iter()
                .next()
                .map(|item| measurement(LATEST_ENDPOINT, item))
                .transpose()?;
            Ok(measurement.map(|m| LatestSnapshot::new(m, None)))
        }
        other => Err(FetchError::shape(
            LATEST_ENDPOINT,
            format!(
                "expected an object with 'latest' or a one-element array, got {}",
                describe(&other)
            ),
        )),
    }
}

pub fn parse_series(value: Value) -> Result<Vec<Measurement>, FetchError> {
    let Value::Array(items) = value else {
        return Err(FetchError::shape(
            SERIES_ENDPOINT,
            format!("expected an array, got {}", kind(&value)),
        ));
    };
    items
        .into_iter()
        .map(|item| measurement(SERIES_ENDPOINT, item))
        .collect()
}

fn measurement(endpoint: &'static str, value: Value) -> Result<Measurement, FetchError> {
    if !value.is_object() {
        return Err(FetchError::shape(
            endpoint,
            format!("expected a measurement object, got {}", kind(&value)),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| FetchError::shape(endpoint, format!("invalid measurement: {}", e)))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("an array of {}", items.len()),
        other => kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(ts: i64) -> Value {
        json!({
            "AggregatedTimestamp": ts,
            "AvgTemperature": 21.0,
            "AvgHumidity": 45.0,
            "AvgWeatherTemp": 0,
            "Description": ""
        })
    }

    #[test]
    fn test_envelope_shape() {
        let snapshot = parse_latest(json!({ "latest": sample(10), "trajectory": 0.25 }))
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.measurement.timestamp, 10);
        assert_eq!(snapshot.trajectory, Some(0.25));
    }

    #[test]
    fn test_envelope_without_data() {
        let value = json!({ "latest": null, "trajectory": null });
        assert_eq!(detect_latest_shape(&value), Some(LatestShape::Envelope));
        assert_eq!(parse_latest(value).unwrap(), None);
    }

    #[test]
    fn test_legacy_array_shape() {
        let value = json!([sample(20)]);
        assert_eq!(detect_latest_shape(&value), Some(LatestShape::LegacyArray));

        let snapshot = parse_latest(value).unwrap().unwrap();
        assert_eq!(snapshot.measurement.timestamp, 20);
        assert_eq!(snapshot.trajectory, None);
    }

    #[test]
    fn test_latest_rejects_other_shapes() {
        for value in [json!([]), json!([sample(1), sample(2)]), json!({ "x": 1 }), json!("nope")] {
            let err = parse_latest(value).unwrap_err();
            assert!(matches!(err, FetchError::Shape { .. }), "{}", err);
        }
        assert!(parse_latest(json!({ "latest": sample(1), "trajectory": "up" })).is_err());
    }

    #[test]
    fn test_series_requires_array() {
        let points = parse_series(json!([sample(0), sample(60000)])).unwrap();
        assert_eq!(points.len(), 2);
        assert!(parse_series(json!([])).unwrap().is_empty());

        let err = parse_series(json!({ "error": "boom" })).unwrap_err();
        assert!(err.to_string().contains("expected an array, got object"));

        let err = parse_series(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("measurement object"));
    }
}
