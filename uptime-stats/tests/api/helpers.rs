use once_cell::sync::Lazy;
use secrecy::SecretString;
use serde_json::{Value, json};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tempfile::TempDir;
use uptime_stats::client::{ApiClient, parse_base_url};
use uptime_stats::configuration::LogFormat;
use uptime_stats::telemetry::{get_subscriber, init_subscriber};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(default_filter_level, LogFormat::Pretty, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to set up test logging");
    } else {
        let subscriber = get_subscriber(default_filter_level, LogFormat::Pretty, std::io::sink);
        init_subscriber(subscriber).expect("Failed to set up test logging");
    };
});

/// A mock Uptime.com API plus a scratch directory for exports.
pub struct TestApi {
    pub server: MockServer,
    pub out_dir: TempDir,
}

impl TestApi {
    pub async fn spawn() -> Self {
        // `TRACING` is only executed the first time `initialize` is invoked.
        Lazy::force(&TRACING);

        Self {
            server: MockServer::start().await,
            out_dir: tempfile::tempdir().expect("Failed to create a scratch directory."),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    pub fn out_path(&self, file: &str) -> std::path::PathBuf {
        self.out_dir.path().join(file)
    }

    pub async fn mount_check(&self, pk: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/checks/{}", pk)))
            .and(header("Authorization", format!("token {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pk": pk, "name": name })))
            .expect(1)
            .named(format!("name of check {}", pk))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_day(&self, pk: &str, day: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/checks/bulk/stats/"))
            .and(header("Authorization", format!("token {}", TOKEN).as_str()))
            .and(query_param("pk", pk))
            .and(query_param("start_date", day))
            .and(query_param("end_date", day))
            .and(query_param("include_alerts", "1"))
            .respond_with(response)
            .named(format!("stats of check {} on {}", pk, day))
            .mount(&self.server)
            .await;
    }

    /// `start_date` of every stats request received, in arrival order.
    pub async fn requested_days(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .expect("Request recording is disabled")
            .into_iter()
            .filter(|request| request.url.path() == "/checks/bulk/stats/")
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "start_date")
                    .map(|(_, value)| value.into_owned())
            })
            .collect()
    }

    /// Runs the real binary against the mock server, from the scratch directory.
    pub async fn run_cli(&self, args: &[&str]) -> Output {
        self.run_cli_with_env(args, &[]).await
    }

    /// Same as `run_cli`, with extra environment variables for the process.
    pub async fn run_cli_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_uptime-stats"));
        command
            .current_dir(self.out_dir.path())
            .args(["--token", TOKEN, "--api", &self.base_url(), "--out-dir", "."])
            .args(args)
            .env_remove("RUST_LOG")
            .envs(env.iter().copied());
        tokio::task::spawn_blocking(move || command.output())
            .await
            .expect("CLI task panicked")
            .expect("Failed to execute the CLI")
    }
}

/// Builds a client for `base_url` on a blocking-friendly thread and hands it to `f`.
pub async fn with_client<T, F>(base_url: String, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&ApiClient) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let token = SecretString::from(TOKEN);
        let url = parse_base_url(&base_url).expect("Invalid mock server URL");
        let client =
            ApiClient::new(url, &token, Duration::from_secs(5)).expect("Failed to build client");
        f(&client)
    })
    .await
    .expect("Client task panicked")
}

/// A bulk stats body with one datapoint and, optionally, one alert.
pub fn day_payload(pk: u64, day: &str, alert_output: Option<&str>) -> Value {
    let alerts: Vec<Value> = alert_output
        .map(|output| {
            json!({
                "pk": 1000 + pk,
                "created_at": format!("{}T12:00:00Z", day),
                "ended_at": null,
                "state_is_up": false,
                "ignored": false,
                "duration_secs": null,
                "output": output,
            })
        })
        .into_iter()
        .collect();
    json!({
        "checks": [{
            "pk": pk,
            "statistics": [{
                "response_time_datapoints": [[format!("{}T00:00:00Z", day), 0.42]],
                "alerts": alerts,
                "uptime": 100.0,
            }],
        }],
    })
}

pub fn csv_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
        .lines()
        .map(str::to_owned)
        .collect()
}
