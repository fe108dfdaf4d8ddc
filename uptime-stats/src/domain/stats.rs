use super::CheckPk;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use serde_json::Number;
use std::collections::BTreeMap;

/// Names resolved during a run, keyed by check.
pub type CheckNames = BTreeMap<CheckPk, String>;

/// A single response-time sample, as the API's `[timestamp, value]` pair.
/// The value keeps the API's own number representation, so `1` stays `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint(pub String, pub Number);

impl Datapoint {
    pub fn new(timestamp: impl Into<String>, response_time: impl Into<Number>) -> Self {
        Self(timestamp.into(), response_time.into())
    }

    pub fn timestamp(&self) -> &str {
        &self.0
    }

    pub fn response_time(&self) -> &Number {
        &self.1
    }
}

/// An up/down state change recorded for a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub pk: String,
    pub created_at: String,
    /// Absent while the alert is still ongoing.
    pub ended_at: Option<String>,
    pub state_is_up: bool,
    pub ignored: bool,
    pub duration_secs: Option<i64>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticBlock {
    pub response_time_datapoints: Vec<Datapoint>,
    pub alerts: Vec<Alert>,
}

/// One entry of the bulk stats endpoint's `checks` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckStatistics {
    pub pk: CheckPk,
    pub statistics: Vec<StatisticBlock>,
}

/// The payload of one single-day stats call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDay {
    pub date: NaiveDate,
    pub checks: Vec<CheckStatistics>,
}

/// Everything fetched for one requested check, oldest day first.
/// `pk` is `None` for the account-wide series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSeries {
    pub pk: Option<CheckPk>,
    pub days: Vec<StatDay>,
}

/// The result of a whole run: series in request order plus the names
/// resolved along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub series: Vec<CheckSeries>,
    pub names: CheckNames,
}

impl AggregatedStats {
    /// Iterates over every check entry of every day, in fetch order.
    pub fn entries(&self) -> impl Iterator<Item = &CheckStatistics> {
        self.series
            .iter()
            .flat_map(|series| &series.days)
            .flat_map(|day| &day.checks)
    }

    /// The resolved name of a check, or an empty string if it never was.
    pub fn name_of(&self, pk: &CheckPk) -> &str {
        self.names.get(pk).map(String::as_str).unwrap_or_default()
    }
}
