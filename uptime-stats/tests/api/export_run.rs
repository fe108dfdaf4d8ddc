use crate::helpers::{TestApi, csv_lines, day_payload};
use uptime_stats::domain::AggregatedStats;
use uptime_stats::export::{ALERTS_HEADER, RESPONSE_TIME_HEADER};
use wiremock::ResponseTemplate;

const WINDOW: [&str; 4] = ["2024-01-07", "2024-01-08", "2024-01-09", "2024-01-10"];

async fn mount_window(app: &TestApi, alert_output: Option<&str>) {
    app.mount_check("42", "Homepage").await;
    for day in WINDOW {
        app.mount_day(
            "42",
            day,
            ResponseTemplate::new(200).set_body_json(day_payload(42, day, alert_output)),
        )
        .await;
    }
}

#[tokio::test]
async fn a_window_is_fetched_day_by_day_and_written_as_csv() {
    // Arrange
    let app = TestApi::spawn().await;
    mount_window(&app, None).await;

    // Act
    let output = app.run_cli(&["-p", "42", "-d", "2024-01-10", "-n", "3"]).await;

    // Assert
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(app.requested_days().await, WINDOW);

    let lines = csv_lines(&app.out_path("response_time.csv"));
    assert_eq!(lines[0], RESPONSE_TIME_HEADER.join(","));
    let expected: Vec<String> = WINDOW
        .iter()
        .map(|day| format!("42,Homepage,{}T00:00:00Z,0.42", day))
        .collect();
    assert_eq!(lines[1..], expected[..]);

    // No alerts on any day still leaves a well-formed file
    assert_eq!(csv_lines(&app.out_path("alerts.csv")), vec![ALERTS_HEADER.join(",")]);
}

#[tokio::test]
async fn a_failing_day_aborts_the_run_without_writing() {
    // Arrange
    let app = TestApi::spawn().await;
    app.mount_check("42", "Homepage").await;
    app.mount_day(
        "42",
        "2024-01-07",
        ResponseTemplate::new(200).set_body_json(day_payload(42, "2024-01-07", None)),
    )
    .await;
    app.mount_day(
        "42",
        "2024-01-08",
        ResponseTemplate::new(500).set_body_string("Internal error"),
    )
    .await;

    // Act
    let output = app.run_cli(&["-p", "42", "-d", "2024-01-10", "-n", "3"]).await;

    // Assert
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2024-01-08"), "{}", stderr);
    assert!(stderr.contains("500"), "{}", stderr);
    assert_eq!(app.requested_days().await, ["2024-01-07", "2024-01-08"]);
    assert!(!app.out_path("response_time.csv").exists());
    assert!(!app.out_path("alerts.csv").exists());
}

#[tokio::test]
async fn only_the_requested_output_is_written() {
    // Arrange
    let app = TestApi::spawn().await;
    mount_window(&app, Some("HTTP 503\n  Service\tUnavailable")).await;

    // Act
    let output = app
        .run_cli(&["-p", "42", "-d", "2024-01-10", "-n", "3", "-o", "alerts"])
        .await;

    // Assert
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!app.out_path("response_time.csv").exists());
    let lines = csv_lines(&app.out_path("alerts.csv"));
    assert_eq!(lines.len(), 1 + WINDOW.len());
    assert_eq!(
        lines[1],
        "1042,42,Homepage,2024-01-07T12:00:00Z,,false,false,,HTTP 503 Service Unavailable"
    );
}

#[tokio::test]
async fn json_format_writes_the_whole_aggregate() {
    // Arrange
    let app = TestApi::spawn().await;
    mount_window(&app, Some("down")).await;

    // Act
    let output = app
        .run_cli(&["-p", "42", "-d", "2024-01-10", "-n", "3", "-f", "json"])
        .await;

    // Assert
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!app.out_path("response_time.csv").exists());
    let contents = std::fs::read_to_string(app.out_path("stats.json")).unwrap();
    let stats: AggregatedStats = serde_json::from_str(&contents).unwrap();
    assert_eq!(stats.series.len(), 1);
    assert_eq!(stats.series[0].days.len(), WINDOW.len());
    assert_eq!(stats.name_of(&"42".parse().unwrap()), "Homepage");
}

#[tokio::test]
async fn the_rate_limit_warning_survives_a_strict_log_filter() {
    // Arrange
    let app = TestApi::spawn().await;
    mount_window(&app, None).await;

    // Act
    let output = app
        .run_cli_with_env(
            &["-p", "42", "-d", "2024-01-10", "-n", "3"],
            &[
                ("UPTIME_STATS__LOG__FILTER", "error"),
                ("UPTIME_STATS__RATE__LIMIT_PER_MINUTE", "30"),
            ],
        )
        .await;

    // Assert
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(
        stderr.contains("Uptime API has a rate limit of 30 calls per minute."),
        "{}",
        stderr
    );
    assert!(stderr.contains("If more than 30 calls are required"), "{}", stderr);
}

#[tokio::test]
async fn a_missing_token_fails_before_any_request() {
    let app = TestApi::spawn().await;

    let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_uptime-stats"));
    command
        .current_dir(app.out_dir.path())
        .args(["--api", &app.base_url(), "-p", "42"])
        .env_remove("UPTIME_STATS__API__TOKEN");
    let output = tokio::task::spawn_blocking(move || command.output())
        .await
        .unwrap()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("token"));
    assert!(app.server.received_requests().await.unwrap().is_empty());
}
