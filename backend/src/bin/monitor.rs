//! Standalone hazard monitor.
//!
//! Polls weather and earthquake data for each configured location, evaluates
//! the enabled hazards and dispatches alerts once a probability reaches the
//! location's threshold.
//!
//! Usage:
//!   waveguard-monitor --config waveguard.toml
//!   waveguard-monitor --name "Mumbai, India" --lat 19.076 --lon 72.8777 --once

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use shared::{HazardType, Location};
use tokio_util::sync::CancellationToken;
use waveguard::config::SAMPLE_CONFIG;
use waveguard::services::SystemClock;
use waveguard::{init_tracing, shutdown_signal, Config, Services};

#[derive(Parser)]
#[command(name = "waveguard-monitor", about = "Scheduled hazard monitoring and alerting")]
struct Cli {
    /// Configuration file; defaults to config/<environment>.toml
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Monitor a single location instead of the configured ones
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    #[arg(long, default_value = "Custom location")]
    name: String,

    /// Alert threshold for the single location
    #[arg(long)]
    threshold: Option<f64>,

    /// Hazards for the single location
    #[arg(long, value_delimiter = ',', default_value = "flood,cyclone")]
    hazards: Vec<HazardType>,

    /// Run one cycle per location, print the reports and exit
    #[arg(long)]
    once: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.print_sample_config {
        print!("{}", SAMPLE_CONFIG);
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut config = Config::load_from(cli.config.as_deref())?;
    init_tracing(&config.log_format);

    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        let mut location = Location::new(cli.name.clone(), lat, lon);
        location.alert_threshold = cli.threshold.unwrap_or(config.monitor.default_threshold);
        location.hazards = cli.hazards.clone();
        config.monitor.locations = vec![location];
    }
    config.validate()?;

    if config.monitor.locations.is_empty() {
        anyhow::bail!("no locations to monitor; add [[monitor.locations]] or pass --lat/--lon");
    }

    let services = Services::from_config(&config).await?;
    let monitor = Arc::new(services.monitor(&config, Arc::new(SystemClock)));

    if cli.once {
        let reports = monitor.run_once().await;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(Arc::clone(&monitor).run(cancel.clone()));

    shutdown_signal().await;
    cancel.cancel();
    handle.await?;
    Ok(())
}
