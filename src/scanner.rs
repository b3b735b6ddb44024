use futures::Stream;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::probe::probe_with_cancel;
use crate::types::ScanResult;

/// Ports buffered between the producer and the workers.
pub const WORK_QUEUE_CAPACITY: usize = 100;

/// Tokio channels need at least one slot; one slot is the closest thing to a
/// rendezvous handoff and keeps in-flight results at O(concurrency).
pub const RESULT_CHANNEL_CAPACITY: usize = 1;

type WorkQueue = Arc<Mutex<mpsc::Receiver<u16>>>;

/// Fixed-size pool of connect workers over a shared, read-only address list.
///
/// Every port handed to [`ScanEngine::run`] is probed against every address
/// exactly once, and every probe yields exactly one [`ScanResult`] on the
/// returned [`ResultStream`]. The stream ends once all workers have drained the
/// work queue and exited.
#[derive(Debug, Clone)]
pub struct ScanEngine {
    addresses: Arc<[IpAddr]>,
    concurrency: usize,
    timeout: Duration,
}

impl ScanEngine {
    /// `concurrency` below 1 is raised to 1.
    pub fn new(addresses: Vec<IpAddr>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            addresses: addresses.into(),
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of results a run over `port_count` ports will produce.
    pub fn total_work(&self, port_count: usize) -> u64 {
        self.addresses.len() as u64 * port_count as u64
    }

    /// Start scanning `ports` and return the completion-ordered result stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self, ports: Vec<u16>) -> ResultStream {
        self.run_with_cancel(ports, CancellationToken::new())
    }

    /// Variant of [`ScanEngine::run`] that stops early once `cancel` fires.
    ///
    /// After cancellation no new ports are published, workers stop pulling
    /// work, and in-flight probes are abandoned without a result. The stream
    /// still terminates normally.
    pub fn run_with_cancel(&self, ports: Vec<u16>, cancel: CancellationToken) -> ResultStream {
        let (work_tx, work_rx) = mpsc::channel::<u16>(WORK_QUEUE_CAPACITY);
        let (results_tx, results_rx) = mpsc::channel::<ScanResult>(RESULT_CHANNEL_CAPACITY);
        let work_rx: WorkQueue = Arc::new(Mutex::new(work_rx));

        debug!(
            workers = self.concurrency,
            hosts = self.addresses.len(),
            ports = ports.len(),
            timeout_ms = self.timeout.as_millis() as u64,
            "starting scan"
        );

        // All workers exist before the first port is published.
        let mut workers = JoinSet::new();
        for id in 0..self.concurrency {
            workers.spawn(worker(
                id,
                self.addresses.clone(),
                work_rx.clone(),
                results_tx.clone(),
                self.timeout,
                cancel.clone(),
            ));
        }

        tokio::spawn(produce(ports, work_tx, cancel));

        // The supervisor keeps the last result sender alive until every worker
        // has returned; dropping it is what ends the stream.
        tokio::spawn(async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "scan worker terminated abnormally");
                }
            }
            drop(results_tx);
            debug!("all workers finished, closing result stream");
        });

        ResultStream { rx: results_rx }
    }
}

/// Publish every port, then close the queue by dropping the sender.
async fn produce(ports: Vec<u16>, work_tx: mpsc::Sender<u16>, cancel: CancellationToken) {
    for port in ports {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("scan cancelled, producer stopping");
                break;
            }
            sent = work_tx.send(port) => {
                if sent.is_err() {
                    // every worker is gone
                    break;
                }
            }
        }
    }
}

async fn worker(
    id: usize,
    addresses: Arc<[IpAddr]>,
    work_rx: WorkQueue,
    results_tx: mpsc::Sender<ScanResult>,
    timeout: Duration,
    cancel: CancellationToken,
) {
    debug!(worker = id, "worker started");

    'ports: loop {
        let next = {
            let mut rx = work_rx.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                port = rx.recv() => port,
            }
        };
        let Some(port) = next else { break };

        for &ip in addresses.iter() {
            let Some(result) = probe_with_cancel(ip, port, timeout, &cancel).await else {
                break 'ports;
            };
            let delivered = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = results_tx.send(result) => sent.is_ok(),
            };
            if !delivered {
                debug!(worker = id, "result stream closed, worker exiting");
                break 'ports;
            }
        }
    }

    debug!(worker = id, "worker finished");
}

/// Results of one engine run, in completion order.
///
/// Ends exactly when every worker has finished. Dropping it early makes the
/// workers stop at their next handoff.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<ScanResult>,
}

impl ResultStream {
    /// Next result, or `None` once the scan has completed.
    pub async fn recv(&mut self) -> Option<ScanResult> {
        self.rx.recv().await
    }

    /// Drain the stream to completion.
    pub async fn collect_all(mut self) -> Vec<ScanResult> {
        let mut out = Vec::new();
        while let Some(res) = self.rx.recv().await {
            out.push(res);
        }
        out
    }
}

impl Stream for ResultStream {
    type Item = ScanResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
