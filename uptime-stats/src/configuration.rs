use crate::client::{ApiClient, ApiError, parse_base_url};
use crate::domain::OutputFormat;
use crate::governor::{
    Clock, DEFAULT_DELAY, DEFAULT_RATE_LIMIT, FixedDelay, NoPacing, Pacer, PacingStrategy,
    SystemClock, Throttle, TokenBucket,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://uptime.com/api/v1/";
pub const ENV_PREFIX: &str = "UPTIME_STATS";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub rate: RateSettings,
    pub export: ExportSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            token: None,
            timeout_milliseconds: 30_000,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    /// Builds the run's client; fails if no token was configured anywhere.
    pub fn client(&self) -> Result<ApiClient, ApiError> {
        let token = self.token.as_ref().ok_or(ApiError::MissingToken)?;
        ApiClient::new(parse_base_url(&self.base_url)?, token, self.timeout())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub limit_per_minute: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub burst: u32,
    pub pacing: PacingStrategy,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            limit_per_minute: DEFAULT_RATE_LIMIT,
            delay_milliseconds: DEFAULT_DELAY.as_millis() as u64,
            burst: 1,
            pacing: PacingStrategy::default(),
        }
    }
}

impl RateSettings {
    pub fn pacer(&self, throttle: Throttle) -> Box<dyn Pacer> {
        self.pacer_with_clock(throttle, SystemClock)
    }

    pub fn pacer_with_clock<C: Clock + 'static>(
        &self,
        throttle: Throttle,
        clock: C,
    ) -> Box<dyn Pacer> {
        match (throttle, self.pacing) {
            (Throttle::Off, _) => Box::new(NoPacing),
            (Throttle::On, PacingStrategy::Fixed) => Box::new(FixedDelay::new(
                Duration::from_millis(self.delay_milliseconds),
                clock,
            )),
            (Throttle::On, PacingStrategy::TokenBucket) => {
                Box::new(TokenBucket::new(self.limit_per_minute, self.burst, clock))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub directory: PathBuf,
    pub format: OutputFormat,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            format: OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

/// Reads `configuration.{yaml,json,toml}` from the working directory, or the
/// file given, then applies `UPTIME_STATS__SECTION__KEY` environment overrides.
pub fn get_configuration(file: Option<&Path>) -> Result<Settings, config::ConfigError> {
    let file_source = match file {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("configuration").required(false),
    };
    config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}
