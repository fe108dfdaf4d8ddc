use crate::domain::{CheckPk, CheckStatistics};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const CHECK_PATH: &str = "checks/{pk}";
pub const BULK_STATS_PATH: &str = "checks/bulk/stats/";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{status} from {url}: {body}")]
    Status {
        status: StatusCode,
        url: Url,
        body: String,
    },
    #[error("Request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("Response from {url} is not valid JSON")]
    Decode {
        url: Url,
        #[source]
        source: serde_json::Error,
    },
    #[error("Response from {endpoint} doesn't match the expected schema")]
    Shape {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("No API token given; pass --token or set {}__API__TOKEN", crate::configuration::ENV_PREFIX)]
    MissingToken,
    #[error("The API token is not a valid header value")]
    InvalidToken(#[source] reqwest::header::InvalidHeaderValue),
    #[error("Failed to build the HTTP client")]
    Client(#[source] reqwest::Error),
}

/// The two Uptime.com endpoints an export needs.
pub trait UptimeApi {
    /// Human-readable name of a check.
    fn check_name(&self, pk: &CheckPk) -> Result<String, ApiError>;

    /// Statistics for exactly one calendar day, either for one check or,
    /// with `pk == None`, for every check in the account.
    fn stats_for_day(
        &self,
        pk: Option<&CheckPk>,
        day: NaiveDate,
    ) -> Result<Vec<CheckStatistics>, ApiError>;
}

impl<A: UptimeApi + ?Sized> UptimeApi for &A {
    fn check_name(&self, pk: &CheckPk) -> Result<String, ApiError> {
        (**self).check_name(pk)
    }

    fn stats_for_day(
        &self,
        pk: Option<&CheckPk>,
        day: NaiveDate,
    ) -> Result<Vec<CheckStatistics>, ApiError> {
        (**self).stats_for_day(pk, day)
    }
}

#[derive(Debug, Deserialize)]
struct CheckDetail {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BulkStats {
    checks: Vec<CheckStatistics>,
}

fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    value: serde_json::Value,
) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Shape { endpoint, source })
}

/// Parses a base URL, making sure relative paths are appended to it rather
/// than replacing its last segment.
pub fn parse_base_url(s: &str) -> Result<Url, ApiError> {
    let with_slash = if s.ends_with('/') {
        s.to_owned()
    } else {
        format!("{}/", s)
    };
    let url = Url::parse(&with_slash).map_err(|e| ApiError::InvalidUrl {
        url: s.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl {
            url: s.to_owned(),
            reason: "not usable as a base URL".into(),
        });
    }
    Ok(url)
}

/// Blocking client for the Uptime.com REST API. Holds only configuration;
/// every call is independent.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, token: &SecretString, timeout: Duration) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token.expose_secret()))
            .map_err(ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self { http, base_url })
    }

    fn url_for(&self, path_template: &str, pk: Option<&CheckPk>) -> Result<Url, ApiError> {
        let path = match pk {
            Some(pk) => path_template.replace("{pk}", pk.as_ref()),
            None if path_template.contains("{pk}") => {
                return Err(ApiError::InvalidUrl {
                    url: path_template.to_owned(),
                    reason: "path needs a check key but none was given".into(),
                });
            }
            None => path_template.to_owned(),
        };
        self.base_url.join(&path).map_err(|e| ApiError::InvalidUrl {
            url: path,
            reason: e.to_string(),
        })
    }

    /// Sends one authenticated request and decodes its JSON body.
    /// Any non-2xx status is an error; nothing is retried.
    #[tracing::instrument(
        name = "Calling the Uptime API",
        skip(self, pk, query, body),
        fields(pk = pk.map(tracing::field::display))
    )]
    pub fn call(
        &self,
        method: Method,
        path_template: &str,
        pk: Option<&CheckPk>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url_for(path_template, pk)?;
        let mut request = self.http.request(method, url.clone()).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            tracing::error!("{} from {}", status, url);
            return Err(ApiError::Status {
                status,
                url,
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|source| ApiError::Decode { url, source })
    }
}

impl UptimeApi for ApiClient {
    fn check_name(&self, pk: &CheckPk) -> Result<String, ApiError> {
        let value = self.call(Method::GET, CHECK_PATH, Some(pk), &[], None)?;
        let detail: CheckDetail = decode(CHECK_PATH, value)?;
        Ok(detail.name)
    }

    fn stats_for_day(
        &self,
        pk: Option<&CheckPk>,
        day: NaiveDate,
    ) -> Result<Vec<CheckStatistics>, ApiError> {
        let day = day.format("%Y-%m-%d").to_string();
        let mut query = Vec::with_capacity(4);
        if let Some(pk) = pk {
            query.push(("pk", pk.to_string()));
        }
        query.push(("start_date", day.clone()));
        query.push(("end_date", day));
        query.push(("include_alerts", "1".to_owned()));

        let value = self.call(Method::GET, BULK_STATS_PATH, None, &query, None)?;
        let stats: BulkStats = decode(BULK_STATS_PATH, value)?;
        Ok(stats.checks)
    }
}
