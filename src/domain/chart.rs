// Render-ready chart models
use serde::Serialize;

use super::range::{TickPolicy, TimeRange};

/// The measured quantities a chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Temperature,
    OutsideTemperature,
    Humidity,
    WindSpeed,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Temperature,
        Quantity::OutsideTemperature,
        Quantity::Humidity,
        Quantity::WindSpeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Quantity::Temperature => "Temperature",
            Quantity::OutsideTemperature => "Outside temperature",
            Quantity::Humidity => "Humidity",
            Quantity::WindSpeed => "Wind Speed",
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            Quantity::Temperature | Quantity::OutsideTemperature => Unit::Celsius,
            Quantity::Humidity => Unit::Percent,
            Quantity::WindSpeed => Unit::MetersPerSecond,
        }
    }

    pub fn axis(self) -> AxisId {
        match self {
            Quantity::Temperature | Quantity::OutsideTemperature => AxisId::Temperature,
            Quantity::Humidity => AxisId::Humidity,
            Quantity::WindSpeed => AxisId::Wind,
        }
    }

    /// Wind is plotted raw; the other channels go through the moving average.
    pub fn smoothed(self) -> bool {
        !matches!(self, Quantity::WindSpeed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "m/s")]
    MetersPerSecond,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Percent => "%",
            Unit::MetersPerSecond => "m/s",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    Temperature,
    Humidity,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    pub id: AxisId,
    pub title: String,
    pub unit: Unit,
    pub side: AxisSide,
    pub color: String,
}

/// A point whose `value` is `None` is a gap: the line breaks there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub time_ms: i64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub quantity: Quantity,
    pub name: String,
    pub axis: AxisId,
    pub unit: Unit,
    pub color: String,
    pub points: Vec<PlotPoint>,
}

impl PlotSeries {
    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickLabel {
    pub time_ms: i64,
    pub text: String,
}

/// Everything the rendering layer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotBundle {
    pub range: TimeRange,
    pub tick_policy: TickPolicy,
    pub axes: Vec<AxisSpec>,
    pub series: Vec<PlotSeries>,
    pub ticks: Vec<TickLabel>,
}

impl PlotBundle {
    pub fn series_for(&self, quantity: Quantity) -> Option<&PlotSeries> {
        self.series.iter().find(|s| s.quantity == quantity)
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// Colors per plotted quantity, as CSS color strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorAssignment {
    pub temperature: String,
    pub outside_temperature: String,
    pub humidity: String,
    pub wind_speed: String,
}

impl ColorAssignment {
    pub fn color_for(&self, quantity: Quantity) -> &str {
        match quantity {
            Quantity::Temperature => &self.temperature,
            Quantity::OutsideTemperature => &self.outside_temperature,
            Quantity::Humidity => &self.humidity,
            Quantity::WindSpeed => &self.wind_speed,
        }
    }
}

impl Default for ColorAssignment {
    fn default() -> Self {
        Self {
            temperature: "#ef4444".to_string(),
            outside_temperature: "#ffae00ff".to_string(),
            humidity: "#3b82f6".to_string(),
            wind_speed: "#ff00ff".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

impl Trend {
    pub fn from_trajectory(trajectory: f64) -> Self {
        if trajectory > 0.0 {
            Trend::Rising
        } else if trajectory < 0.0 {
            Trend::Falling
        } else {
            Trend::Steady
        }
    }
}

/// Display values for the latest snapshot. Every field is `None` when the
/// store holds no snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LatestReadout {
    pub timestamp: Option<i64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub outside_temperature: Option<f64>,
    pub outside_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub trajectory: Option<f64>,
    pub trend: Option<Trend>,
}

impl LatestReadout {
    pub fn has_data(&self) -> bool {
        self.timestamp.is_some()
    }
}
