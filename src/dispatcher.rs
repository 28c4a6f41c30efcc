//! Input dispatcher: the single consumer loop that drains the inbound
//! datahub queue and routes each item to its content-type handler.
//!
//! Terminates when the `mpsc::Receiver` closes, i.e. once every sender has
//! been dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::model::{DataHubItem, GnssStatus};
use crate::nmea::handle_nmea_sentence;
use crate::ogn::handle_ogn_line;
use crate::registry::Registry;
use crate::sbs1::handle_sbs1_line;

/// Consumes `input_rx` until the channel closes, dispatching each item to
/// its handler. Runs as its own task, spawned alongside the FLARM generator.
pub async fn run(
    mut input_rx: mpsc::Receiver<DataHubItem>,
    registry: Arc<Registry>,
    gnss: Arc<Mutex<GnssStatus>>,
) {
    info!("input dispatcher running");

    while let Some(item) = input_rx.recv().await {
        let now = Instant::now();
        match item {
            DataHubItem::Nmea(sentence) => {
                let mut gnss = gnss.lock().await;
                handle_nmea_sentence(&sentence, &mut gnss);
            }
            DataHubItem::Sbs1(line) => {
                handle_sbs1_line(&line, &registry, now).await;
            }
            DataHubItem::Ogn(line) => {
                let gnss_snapshot = gnss.lock().await.clone();
                handle_ogn_line(&line, &registry, &gnss_snapshot, now).await;
            }
            DataHubItem::Flarm(_) => {
                debug!("ignoring outbound-tagged item received on the input queue");
            }
        }
    }

    info!("input dispatcher terminating: channel closed");
}
