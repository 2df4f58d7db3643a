// THEORY:
// The `WorkerPool` is the parallel execution layer. It owns a fixed number of
// executor threads, created once and reused for every computation, so thread
// start-up cost is paid a single time per engine.
//
// Key architectural principles:
// 1.  **Message Passing Only**: Each executor owns the receiving end of its own
//     task channel. A task carries everything the executor needs (shared,
//     read-only pixels and boundary plus its slice) and a oneshot sender for the
//     answer. Nothing mutable is shared between the orchestrator and executors.
// 2.  **Pre-Reduced Answers**: Executors never ship matched pixels back; they
//     reduce their slice to a `PartialSum`, which keeps every reply a few bytes.
// 3.  **Failure Isolation**: A unit of work that fails (bad slice, panic) answers
//     with a `WorkError` for that unit alone. The executor survives and keeps
//     serving, so one broken request never poisons the pool.
// 4.  **Join Barrier**: `run_all` dispatches every unit and waits for all of them.
//     There is no streaming reduction and no cancellation.
// 5.  **Leases**: A caller may attach a `Lease` to a run. Every queued task holds a
//     clone until its unit has been scanned, so whatever the lease guards stays
//     held until the executors are done with the run, even if the caller stops
//     waiting for the answers.

use crate::core_modules::geometry::Bounds;
use crate::core_modules::mask::Boundary;
use crate::core_modules::partial_sum::PartialSum;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::WorkError;
use futures::future::join_all;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

pub type WorkResult = Result<PartialSum, WorkError>;

/// Opaque value kept alive by every task of a run.
pub type Lease = Arc<dyn Any + Send + Sync>;

/// One slice of one computation.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// The full image, shared read-only by every unit of the computation.
    pub pixels: Arc<PixelBuffer>,
    /// The compound boundary, built once per computation.
    pub boundary: Arc<Boundary>,
    /// The rectangle this unit scans.
    pub slice: Bounds,
}

struct Task {
    unit: WorkUnit,
    reply: oneshot::Sender<WorkResult>,
    lease: Option<Lease>,
}

/// A fixed set of executor threads.
///
/// Dropping the pool closes every task channel. Executors finish the tasks
/// already queued and then exit on their own; the drop never blocks on them.
pub struct WorkerPool {
    senders: Vec<mpsc::UnboundedSender<Task>>,
}

impl WorkerPool {
    /// Starts `worker_count` executors (at least one).
    pub fn new(worker_count: usize) -> std::io::Result<Self> {
        let worker_count = worker_count.max(1);
        let mut senders = Vec::with_capacity(worker_count);

        for worker in 0..worker_count {
            let (tx, rx) = mpsc::unbounded_channel::<Task>();
            thread::Builder::new()
                .name(format!("region-color-worker-{worker}"))
                .spawn(move || Self::worker_loop(worker, rx))?;
            senders.push(tx);
        }
        debug!(worker_count, "worker pool started");

        Ok(Self { senders })
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    fn worker_loop(worker: usize, mut rx: mpsc::UnboundedReceiver<Task>) {
        while let Some(Task { unit, reply, lease }) = rx.blocking_recv() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                scan_slice(&unit.pixels, &unit.boundary, &unit.slice)
            }));
            let result = outcome.unwrap_or_else(|payload| {
                Err(WorkError::Panicked {
                    worker,
                    message: panic_message(payload.as_ref()),
                })
            });
            trace!(worker, slice = ?unit.slice, ok = result.is_ok(), "unit finished");
            // Released before answering, so a caller holding the last answer also
            // holds the last lease.
            drop(lease);
            // The orchestrator may have given up on this computation already.
            let _ = reply.send(result);
        }
        trace!(worker, "worker stopped");
    }

    /// Sends unit `i` to executor `i mod n` and returns the pending answers in
    /// the same order as `units`.
    pub fn dispatch(
        &self,
        units: Vec<WorkUnit>,
        lease: Option<Lease>,
    ) -> Vec<(usize, oneshot::Receiver<WorkResult>)> {
        units
            .into_iter()
            .enumerate()
            .map(|(i, unit)| {
                let worker = i % self.senders.len();
                let (reply, answer) = oneshot::channel();
                let task = Task {
                    unit,
                    reply,
                    lease: lease.clone(),
                };
                // A send failure drops `reply`, which surfaces as a closed receiver.
                let _ = self.senders[worker].send(task);
                (worker, answer)
            })
            .collect()
    }

    /// Dispatches every unit and waits until all of them have answered.
    pub async fn run_all(&self, units: Vec<WorkUnit>, lease: Option<Lease>) -> Vec<WorkResult> {
        let pending = self.dispatch(units, lease).into_iter().map(|(worker, answer)| async move {
            answer
                .await
                .unwrap_or(Err(WorkError::Disconnected { worker }))
        });
        join_all(pending).await
    }
}

/// Reduces the pixels of `slice` that lie inside `boundary`, scanning row by row.
pub fn scan_slice(pixels: &PixelBuffer, boundary: &Boundary, slice: &Bounds) -> WorkResult {
    if !slice.fits_within(pixels.width(), pixels.height()) {
        return Err(WorkError::SliceOutOfBounds {
            left: slice.left,
            top: slice.top,
            right: slice.right,
            bottom: slice.bottom,
            width: pixels.width(),
            height: pixels.height(),
        });
    }

    let mut sum = PartialSum::default();
    for y in slice.top..slice.bottom {
        let row = pixels.row(y as u32, slice.left as u32, slice.right as u32);
        for (x, rgb) in (slice.left..slice.right).zip(row) {
            if boundary.contains(x, y) {
                sum.push(rgb);
            }
        }
    }
    Ok(sum)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
