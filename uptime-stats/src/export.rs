use crate::domain::{AggregatedStats, OutputFormat, OutputKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const RESPONSE_TIME_HEADER: [&str; 4] = ["checkPK", "checkName", "dateTime", "responseTime"];
pub const ALERTS_HEADER: [&str; 9] = [
    "alertPK",
    "checkPK",
    "checkName",
    "createdAt",
    "endedAt",
    "stateIsUp",
    "ignored",
    "durationSecs",
    "output",
];
pub const JSON_FILE_NAME: &str = "stats.json";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Could not write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize a row of {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to serialize {path:?} as JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One response-time sample of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeRow {
    #[serde(rename = "checkPK")]
    pub check_pk: String,
    #[serde(rename = "checkName")]
    pub check_name: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "responseTime")]
    pub response_time: serde_json::Number,
}

/// One alert of one check, with its free-text output on a single line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    #[serde(rename = "alertPK")]
    pub alert_pk: String,
    #[serde(rename = "checkPK")]
    pub check_pk: String,
    pub check_name: String,
    pub created_at: String,
    pub ended_at: Option<String>,
    pub state_is_up: bool,
    pub ignored: bool,
    pub duration_secs: Option<i64>,
    pub output: String,
}

/// Replaces every run of whitespace with a single space.
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    WHITESPACE_RUN.replace_all(text, " ")
}

pub fn response_time_rows(stats: &AggregatedStats) -> Vec<ResponseTimeRow> {
    let mut rows = vec![];
    for entry in stats.entries() {
        let check_name = stats.name_of(&entry.pk);
        for block in &entry.statistics {
            for point in &block.response_time_datapoints {
                rows.push(ResponseTimeRow {
                    check_pk: entry.pk.to_string(),
                    check_name: check_name.to_owned(),
                    date_time: point.timestamp().to_owned(),
                    response_time: point.response_time().clone(),
                });
            }
        }
    }
    rows
}

pub fn alert_rows(stats: &AggregatedStats) -> Vec<AlertRow> {
    let mut rows = vec![];
    for entry in stats.entries() {
        let check_name = stats.name_of(&entry.pk);
        for block in &entry.statistics {
            for alert in &block.alerts {
                rows.push(AlertRow {
                    alert_pk: alert.pk.clone(),
                    check_pk: entry.pk.to_string(),
                    check_name: check_name.to_owned(),
                    created_at: alert.created_at.clone(),
                    ended_at: alert.ended_at.clone(),
                    state_is_up: alert.state_is_up,
                    ignored: alert.ignored,
                    duration_secs: alert.duration_secs,
                    output: collapse_whitespace(&alert.output).into_owned(),
                });
            }
        }
    }
    rows
}

/// The kinds to produce; asking for none means asking for all.
pub fn selected_kinds(requested: &[OutputKind]) -> BTreeSet<OutputKind> {
    if requested.is_empty() {
        OutputKind::ALL.into_iter().collect()
    } else {
        requested.iter().copied().collect()
    }
}

fn write_to_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ExportError::Json {
        path: path.to_owned(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_owned(),
        source,
    })
}

// The header is written up front so that an empty table still has one.
fn write_to_csv<T: Serialize>(header: &[&str], rows: &[T], path: &Path) -> Result<(), ExportError> {
    let csv_err = |source: csv::Error| ExportError::Csv {
        path: path.to_owned(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(header).map_err(csv_err)?;
    rows.iter()
        .try_for_each(|row| writer.serialize(row))
        .map_err(csv_err)?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Writes aggregated results into a directory, overwriting earlier exports.
pub struct Exporter {
    directory: PathBuf,
    format: OutputFormat,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    /// Returns the paths written. In JSON mode the whole result goes into a
    /// single document, whatever kinds were requested.
    pub fn export(
        &self,
        kinds: &[OutputKind],
        stats: &AggregatedStats,
    ) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| ExportError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let written = match self.format {
            OutputFormat::Json => {
                let path = self.directory.join(JSON_FILE_NAME);
                write_to_json(stats, &path)?;
                vec![path]
            }
            OutputFormat::Csv => selected_kinds(kinds)
                .into_iter()
                .map(|kind| self.export_csv(kind, stats))
                .collect::<Result<_, _>>()?,
        };
        for path in &written {
            tracing::info!("Successfully wrote to {:?}", path);
        }
        Ok(written)
    }

    fn export_csv(&self, kind: OutputKind, stats: &AggregatedStats) -> Result<PathBuf, ExportError> {
        let path = self.directory.join(format!("{}.csv", kind.name()));
        match kind {
            OutputKind::ResponseTime => {
                write_to_csv(&RESPONSE_TIME_HEADER, &response_time_rows(stats), &path)?
            }
            OutputKind::Alerts => write_to_csv(&ALERTS_HEADER, &alert_rows(stats), &path)?,
        }
        Ok(path)
    }
}
