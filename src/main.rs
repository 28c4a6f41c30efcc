//! Binary entry point: reads tagged lines from stdin, feeds them through
//! the transformation core, and writes generated FLARM sentences to stdout.
//!
//! The real serial/I2C transport and the Datahub pub/sub layer that would
//! normally carry these lines are out of scope for this crate; this binary
//! exists to exercise `soar_flightbox::core::TransformationCore` end to end,
//! tagging each stdin line with a `nmea:`/`sbs1:`/`ogn:` prefix to stand in
//! for the content-type metadata the real datahub attaches.

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use soar_flightbox::altimeter::{Altimeter, ConstantAltimeter};
use soar_flightbox::core::TransformationCore;
use soar_flightbox::model::DataHubItem;
use soar_flightbox::FlarmGeneratorConfig;

#[derive(Parser, Debug)]
#[command(
    name = "flightbox-transform",
    about = "Fuse SBS-1/OGN/NMEA traffic into FLARM PFLAA/PFLAU sentences."
)]
struct Args {
    /// Path to the `[DEFAULT]`-section INI configuration file.
    #[arg(long, default_value = "/etc/flightbox/pcasconf.ini")]
    config: String,

    /// Log level override (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let level: Level = log_level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(soar_flightbox::log_format::TargetFirstFormat)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match FlarmGeneratorConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {e}", args.config);
            std::process::exit(1);
        }
    };

    info!(
        my_icao = %config.my_icao,
        my_tail = %config.my_tail,
        modec_det = ?config.modec_det,
        "resolved configuration"
    );

    let altimeter: Arc<dyn Altimeter> = Arc::new(ConstantAltimeter(0.0));
    let core = TransformationCore::spawn(config, altimeter);
    let input_tx = core.input_sender();
    let mut output_rx = core.take_output_rx().await;

    let writer_handle = tokio::spawn(async move {
        let stdout = std::io::stdout();
        while let Some(DataHubItem::Flarm(sentence)) = output_rx.recv().await {
            let mut handle = stdout.lock();
            let _ = handle.write_all(sentence.as_bytes());
            let _ = handle.flush();
        }
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let item = if let Some(rest) = line.strip_prefix("nmea:") {
            Some(DataHubItem::Nmea(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("sbs1:") {
            Some(DataHubItem::Sbs1(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("ogn:") {
            Some(DataHubItem::Ogn(rest.to_string()))
        } else {
            None
        };

        if let Some(item) = item {
            if input_tx.send(item).await.is_err() {
                break;
            }
        }
    }

    drop(input_tx);
    core.shutdown().await;
    let _ = writer_handle.await;
}
