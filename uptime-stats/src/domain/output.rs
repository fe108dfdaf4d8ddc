use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind of artifact the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKind {
    ResponseTime,
    Alerts,
}

impl OutputKind {
    pub const ALL: [OutputKind; 2] = [OutputKind::ResponseTime, OutputKind::Alerts];

    pub fn name(self) -> &'static str {
        match self {
            Self::ResponseTime => "response_time",
            Self::Alerts => "alerts",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown output '{}'; expected one of: response_time, alerts",
                    s
                )
            })
    }
}

/// How results are encoded on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One table per output kind.
    #[default]
    Csv,
    /// A single document holding the full aggregated result.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown format '{}'; expected csv or json", other)),
        }
    }
}
