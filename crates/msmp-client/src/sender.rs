//! Outgoing request batching
//!
//! Calls are queued without bound and written by one task. After the first request
//! of a batch arrives the task waits for the batch window, takes everything queued
//! meanwhile, and writes the lot as a single JSON array frame.

use msmp_core::Request;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{ClientError, Result};
use crate::pending::PendingCalls;
use crate::transport::BoxedSink;

/// How long closing the sink may take once the loop has stopped
const SINK_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

const UNSENT_REASON: &str = "connection closed before the request was sent";

pub struct RequestSender {
    queue: mpsc::UnboundedSender<Request>,
    cancel: CancellationToken,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl RequestSender {
    /// Spawn the send loop over `sink`
    pub fn spawn(
        sink: BoxedSink,
        pending: Arc<PendingCalls>,
        batch_delay: Duration,
        ping_interval: Option<Duration>,
    ) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let send_loop = SendLoop {
            sink,
            rx,
            pending,
            batch_delay,
            ping_interval,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(send_loop.run());

        Self {
            queue,
            cancel,
            task: parking_lot::Mutex::new(Some(task)),
        }
    }

    /// Queue a request for the next batch
    pub fn enqueue(&self, request: Request) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::ConnectionLost(
                "request sender is closed".to_string(),
            ));
        }
        self.queue.send(request).map_err(|_| {
            ClientError::ConnectionLost("request sender is closed".to_string())
        })
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the loop, fail whatever is still queued and close the sink
    pub async fn close(&self) {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Send loop ended abnormally");
            }
        }
    }
}

impl Drop for RequestSender {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SendLoop {
    sink: BoxedSink,
    rx: mpsc::UnboundedReceiver<Request>,
    pending: Arc<PendingCalls>,
    batch_delay: Duration,
    ping_interval: Option<Duration>,
    cancel: CancellationToken,
}

impl SendLoop {
    async fn run(mut self) {
        let mut ping = self.ping_interval.map(|period| {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });

        loop {
            let first = tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick(&mut ping) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        result = self.sink.ping() => {
                            if let Err(e) = result {
                                warn!(error = %e, "Ping failed");
                            }
                        }
                    }
                    continue;
                }
                request = self.rx.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            if !self.batch_delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        self.fail(vec![first], UNSENT_REASON);
                        break;
                    }
                    _ = tokio::time::sleep(self.batch_delay) => {}
                }
            }

            let mut batch = vec![first];
            while let Ok(request) = self.rx.try_recv() {
                batch.push(request);
            }
            self.write(batch).await;
        }

        self.rx.close();
        let mut leftover = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            leftover.push(request);
        }
        self.fail(leftover, UNSENT_REASON);

        match tokio::time::timeout(SINK_CLOSE_TIMEOUT, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Closing sink failed"),
            Err(_) => warn!("Sink did not close in time, dropping it"),
        }
    }

    async fn write(&mut self, batch: Vec<Request>) {
        let frame = match serde_json::to_string(&batch) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode batch");
                for request in batch {
                    self.pending.complete(request.id, Err(encode_error(&e)));
                }
                return;
            }
        };

        debug!(size = batch.len(), "Sending batch");
        trace!(%frame, "Outgoing frame");

        // A stalled write must not keep the loop from closing
        tokio::select! {
            _ = self.cancel.cancelled() => {
                warn!(size = batch.len(), "Batch write interrupted by close");
                self.fail(batch, UNSENT_REASON);
            }
            result = self.sink.send(frame) => {
                if let Err(e) = result {
                    warn!(error = %e, size = batch.len(), "Batch write failed");
                    for request in batch {
                        self.pending
                            .complete(request.id, Err(ClientError::Transport(e.clone())));
                    }
                }
            }
        }
    }

    fn fail(&self, requests: Vec<Request>, reason: &str) {
        if requests.is_empty() {
            return;
        }
        debug!(count = requests.len(), "Failing unsent requests");
        for request in requests {
            self.pending
                .complete(request.id, Err(ClientError::ConnectionLost(reason.to_string())));
        }
    }
}

/// One JSON error per request of a batch that failed to encode
fn encode_error(error: &serde_json::Error) -> ClientError {
    ClientError::Json(serde::ser::Error::custom(error.to_string()))
}

async fn tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
