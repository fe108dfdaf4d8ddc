use crate::configuration::Settings;
use crate::domain::{
    CheckPk, CheckSelection, DEFAULT_WINDOW_DAYS, DateWindow, OutputFormat, OutputKind,
    parse_end_date,
};
use crate::governor::PacingStrategy;
use chrono::NaiveDate;
use secrecy::SecretString;
use std::path::PathBuf;

/// Command-line arguments. Anything left unset falls back to the
/// configuration file and environment.
#[derive(Debug, clap::Parser)]
#[command(
    name = "uptime-stats",
    version,
    about = "Download response times and alerts in bulk for Uptime.com checks."
)]
pub struct Args {
    /// Your Uptime.com API token.
    #[arg(short, long)]
    pub token: Option<String>,

    /// Primary keys of the checks to pull data from, comma separated (eg. 147,789).
    /// Without it, data for every check in the account is fetched.
    #[arg(
        short = 'p',
        long = "check-ids",
        visible_alias = "check_pk",
        value_delimiter = ','
    )]
    pub check_ids: Vec<CheckPk>,

    /// Last day to fetch, as YYYY-MM-DD or an ISO 8601 date-time. Defaults to today.
    #[arg(short, long, value_parser = parse_end_date)]
    pub date: Option<NaiveDate>,

    /// Number of days before --date to fetch as well.
    #[arg(short, long = "num-days", visible_alias = "num_days")]
    pub num_days: Option<u32>,

    /// Data to export, comma separated: response_time, alerts. Defaults to all.
    #[arg(short, long, value_delimiter = ',')]
    pub output: Vec<OutputKind>,

    /// File format: csv or json.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Directory the exported files are written to.
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// The Uptime.com API endpoint to use, eg. https://uptime.com/api/v1/
    #[arg(long)]
    pub api: Option<String>,

    /// How to space requests when the rate limit would be exceeded: fixed or token-bucket.
    #[arg(long)]
    pub pacing: Option<PacingStrategy>,

    /// Configuration file to read instead of ./configuration.yaml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn selection(&self) -> CheckSelection {
        CheckSelection::from_keys(self.check_ids.clone())
    }

    pub fn window_days(&self) -> u32 {
        self.num_days.unwrap_or(DEFAULT_WINDOW_DAYS)
    }

    pub fn window(&self, today: NaiveDate) -> Result<DateWindow, String> {
        DateWindow::ending_at(self.date.unwrap_or(today), self.window_days())
    }

    /// Lets flags win over the configuration file and environment.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(token) = &self.token {
            settings.api.token = Some(SecretString::from(token.clone()));
        }
        if let Some(api) = &self.api {
            settings.api.base_url = api.clone();
        }
        if let Some(format) = self.format {
            settings.export.format = format;
        }
        if let Some(dir) = &self.out_dir {
            settings.export.directory = dir.clone();
        }
        if let Some(pacing) = self.pacing {
            settings.rate.pacing = pacing;
        }
    }
}
