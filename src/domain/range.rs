// Time range selectors and the tick-label policy each one implies
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A server-side history window. The client passes the token through
/// unchanged; it only derives the tick policy from it locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeRange {
    /// Empty token: the service picks its own default window.
    ServerDefault,
    All,
    OneHour,
    SixHours,
    TwelveHours,
    TwentyFourHours,
    #[default]
    Today,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub const SELECTABLE: [TimeRange; 9] = [
        TimeRange::All,
        TimeRange::OneHour,
        TimeRange::SixHours,
        TimeRange::TwelveHours,
        TimeRange::TwentyFourHours,
        TimeRange::Today,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
    ];

    /// The token sent as `?range=`.
    pub fn token(self) -> &'static str {
        match self {
            TimeRange::ServerDefault => "",
            TimeRange::All => "all",
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::TwelveHours => "12h",
            TimeRange::TwentyFourHours => "24h",
            TimeRange::Today => "today",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::ServerDefault => "Default",
            TimeRange::All => "All",
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::TwelveHours => "12h",
            TimeRange::TwentyFourHours => "24h",
            TimeRange::Today => "Today",
            TimeRange::Week => "Week",
            TimeRange::Month => "Month",
            TimeRange::Year => "Year",
        }
    }

    /// Width of the aggregation bucket the service uses for this window.
    pub fn bucket_seconds(self) -> u32 {
        match self {
            TimeRange::OneHour
            | TimeRange::SixHours
            | TimeRange::TwelveHours
            | TimeRange::TwentyFourHours
            | TimeRange::Today => 60,
            TimeRange::Week
            | TimeRange::Month
            | TimeRange::Year
            | TimeRange::All
            | TimeRange::ServerDefault => 86_400,
        }
    }

    pub fn tick_policy(self) -> TickPolicy {
        match self {
            TimeRange::OneHour | TimeRange::SixHours => TickPolicy::EveryMinutes(5),
            TimeRange::TwelveHours => TickPolicy::EveryMinutes(30),
            TimeRange::TwentyFourHours | TimeRange::Today => TickPolicy::EveryHours(1),
            TimeRange::Week => TickPolicy::EveryHours(2),
            TimeRange::Month => TickPolicy::EveryHours(6),
            TimeRange::Year | TimeRange::All | TimeRange::ServerDefault => {
                TickPolicy::CalendarDate
            }
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range token '{0}'")]
pub struct UnknownRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(TimeRange::ServerDefault);
        }
        TimeRange::SELECTABLE
            .into_iter()
            .find(|r| r.token() == s)
            .ok_or_else(|| UnknownRange(s.to_string()))
    }
}

impl TryFrom<String> for TimeRange {
    type Error = UnknownRange;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.token().to_string()
    }
}

/// Which x-axis timestamps get a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum TickPolicy {
    /// Time-of-day label on every minute divisible by the step.
    EveryMinutes(u32),
    /// Time-of-day label on the hour, for hours divisible by the step.
    EveryHours(u32),
    /// One date label per calendar day.
    CalendarDate,
}

impl TickPolicy {
    /// Whether a point at `timestamp_ms` may carry a label.
    pub fn accepts(self, timestamp_ms: i64, offset: FixedOffset) -> bool {
        let Some(local) = local_time(timestamp_ms, offset) else {
            return false;
        };
        match self {
            TickPolicy::EveryMinutes(step) => local.minute() % step.max(1) == 0,
            TickPolicy::EveryHours(step) => local.minute() == 0 && local.hour() % step.max(1) == 0,
            TickPolicy::CalendarDate => true,
        }
    }

    /// Label text for `timestamp_ms`, `None` if the policy rejects it.
    pub fn label(self, timestamp_ms: i64, offset: FixedOffset) -> Option<String> {
        self.slot(timestamp_ms, offset).map(|(_, text)| text)
    }

    /// Local calendar day and label text of an accepted timestamp. Two
    /// points with the same slot would draw the same tick.
    pub fn slot(self, timestamp_ms: i64, offset: FixedOffset) -> Option<(NaiveDate, String)> {
        if !self.accepts(timestamp_ms, offset) {
            return None;
        }
        let local = local_time(timestamp_ms, offset)?;
        let text = match self {
            TickPolicy::CalendarDate => local.format("%d %b").to_string(),
            _ => local.format("%H:%M").to_string(),
        };
        Some((local.date_naive(), text))
    }
}

fn local_time(timestamp_ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|utc| utc.with_timezone(&offset))
}
