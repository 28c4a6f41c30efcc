//! Transformation core: owns the aircraft registry and own-ship GNSS state,
//! wires the inbound/outbound datahub queues, and supervises the dispatcher
//! and FLARM generator tasks.
//!
//! Constructs both locked shared structures, then runs the dispatcher and
//! generator tasks concurrently, each owned by a struct with a
//! `shutdown()` method.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::altimeter::Altimeter;
use crate::config::FlarmGeneratorConfig;
use crate::dispatcher;
use crate::flarm;
use crate::model::{DataHubItem, GnssStatus};
use crate::queue_config::{queue_warning_threshold, INPUT_QUEUE_SIZE, OUTPUT_QUEUE_SIZE};
use crate::registry::Registry;

/// Period of the FLARM-generation sweep: once per second.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub struct TransformationCore {
    input_tx: mpsc::Sender<DataHubItem>,
    output_rx: Mutex<Option<mpsc::Receiver<DataHubItem>>>,
    registry: Arc<Registry>,
    gnss: Arc<Mutex<GnssStatus>>,
    dispatcher_handle: JoinHandle<()>,
    generator_handle: JoinHandle<()>,
}

impl TransformationCore {
    /// Spawns the dispatcher and generator tasks and returns a handle that
    /// owns both channel endpoints callers interact with: `input_tx` to
    /// feed inbound items, `take_output_rx` to drain outbound FLARM
    /// sentences.
    pub fn spawn(config: FlarmGeneratorConfig, altimeter: Arc<dyn Altimeter>) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_SIZE);
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_QUEUE_SIZE);

        let registry = Arc::new(Registry::new());
        let gnss = Arc::new(Mutex::new(GnssStatus::default()));

        let dispatcher_handle = tokio::spawn(dispatcher::run(input_rx, registry.clone(), gnss.clone()));
        let generator_handle = tokio::spawn(run_generator(config, registry.clone(), gnss.clone(), altimeter, output_tx));

        Self {
            input_tx,
            output_rx: Mutex::new(Some(output_rx)),
            registry,
            gnss,
            dispatcher_handle,
            generator_handle,
        }
    }

    pub fn input_sender(&self) -> mpsc::Sender<DataHubItem> {
        self.input_tx.clone()
    }

    /// Takes ownership of the outbound receiver. Callable exactly once;
    /// panics if called twice since only one consumer can drain the queue.
    pub async fn take_output_rx(&self) -> mpsc::Receiver<DataHubItem> {
        self.output_rx
            .lock()
            .await
            .take()
            .expect("take_output_rx called more than once")
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn gnss(&self) -> Arc<Mutex<GnssStatus>> {
        self.gnss.clone()
    }

    /// Closes the inbound queue and waits for both tasks to drain and
    /// terminate.
    pub async fn shutdown(self) {
        drop(self.input_tx);
        if let Err(e) = self.dispatcher_handle.await {
            warn!("dispatcher task join error: {e}");
        }
        self.generator_handle.abort();
        let _ = self.generator_handle.await;
        info!("transformation core terminated");
    }
}

#[instrument(skip_all)]
async fn run_generator(
    config: FlarmGeneratorConfig,
    registry: Arc<Registry>,
    gnss: Arc<Mutex<GnssStatus>>,
    altimeter: Arc<dyn Altimeter>,
    output_tx: mpsc::Sender<DataHubItem>,
) {
    info!("FLARM generator running");
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let gnss_snapshot = gnss.lock().await.clone();

        let mut outgoing = Vec::new();
        registry
            .sweep_and_expire(now, |rec| {
                if let Some(sentences) = flarm::generate_for_aircraft(&config, &gnss_snapshot, altimeter.as_ref(), rec) {
                    outgoing.extend(sentences);
                }
            })
            .await;

        let depth = OUTPUT_QUEUE_SIZE - output_tx.capacity();
        if depth >= queue_warning_threshold(OUTPUT_QUEUE_SIZE) {
            warn!("outbound datahub queue depth {depth}/{OUTPUT_QUEUE_SIZE} past warning threshold");
        }

        for sentence in outgoing {
            if output_tx.send(DataHubItem::Flarm(sentence)).await.is_err() {
                warn!("outbound datahub queue closed; stopping FLARM generator");
                return;
            }
        }
    }
}
