use anyhow::Context;
use clap::Parser;
use uptime_stats::aggregator::Aggregator;
use uptime_stats::cli::Args;
use uptime_stats::configuration::get_configuration;
use uptime_stats::export::Exporter;
use uptime_stats::governor::{CallBudget, Throttle, rate_limit_warning};
use uptime_stats::telemetry::{get_subscriber, init_subscriber};

fn main() -> anyhow::Result<()> {
    // Parse arguments and settings before anything touches the network
    let args = Args::parse();
    let mut settings =
        get_configuration(args.config.as_deref()).context("Failed to read configuration.")?;
    args.apply(&mut settings);

    let subscriber = get_subscriber(
        settings.log.filter.clone(),
        settings.log.format,
        std::io::stderr,
    );
    init_subscriber(subscriber)?;

    // Printed regardless of the log filter
    eprintln!("{}", rate_limit_warning(settings.rate.limit_per_minute));

    let today = chrono::Local::now().date_naive();
    let window = args.window(today).map_err(anyhow::Error::msg)?;
    let selection = args.selection();
    let client = settings.api.client()?;

    // Decide up front whether every call must be paced
    let budget = CallBudget::estimate(&selection, args.window_days());
    tracing::info!("Est. number of calls: {}", budget);
    let throttle = Throttle::decide(budget, settings.rate.limit_per_minute);
    match throttle {
        Throttle::On => tracing::warn!(
            "Est. number of calls exceeds Uptime rate limit of {} req/min. Request slow down will occur.",
            settings.rate.limit_per_minute
        ),
        Throttle::Off => tracing::info!("Request slowdown will NOT occur."),
    }

    let stats = Aggregator::new(&client, settings.rate.pacer(throttle))
        .aggregate(&selection, window)
        .context("Aborting; no files were written")?;

    let written = Exporter::new(&settings.export.directory, settings.export.format)
        .export(&args.output, &stats)
        .context("Failed to write the export")?;
    tracing::info!(
        "Exported {} days for {} series into {} file(s)",
        window.day_count(),
        stats.series.len(),
        written.len()
    );
    Ok(())
}
