// THEORY:
// The `pipeline` module is the top-level API of the engine. `ColorEngine` takes a
// `ComputeRequest` (an image and the polygons drawn over it) and produces one
// representative color, appending it to its result collection.
//
// Key architectural principles:
// 1.  **Explicit State**: The engine is either `Ready` or `Computing`. The state is
//     a field of the engine, flipped by a guard value so that every way out of a
//     computation (success, no result, failure) returns it to `Ready`. The guard
//     is also the lease of the dispatched units: a caller that stops waiting does
//     not free the engine before the executors are done with its units.
// 2.  **Reject, Don't Queue**: A request that arrives while another is in flight
//     is refused with `Busy`. The running computation is unaffected.
// 3.  **Two Paths, One Formula**: Without polygons the whole image is reduced in
//     place; with polygons the selection is cut into slices and reduced by the
//     worker pool. Both end in the same RMS aggregation.
// 4.  **All or Nothing**: If any unit of work fails, every partial result is
//     discarded and the request fails as a whole. Selecting zero pixels is not a
//     failure; it simply yields no color.

use crate::core_modules::geometry::{PolygonSet, selection_bounds};
use crate::core_modules::mask::Boundary;
use crate::core_modules::partial_sum::{PartialSum, Rgb, combine};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::region_planner::plan_slices;
use crate::core_modules::results::ResultList;
use crate::core_modules::worker_pool::{Lease, WorkUnit, WorkerPool};
use crate::error::{EngineError, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::geometry::{Point, Polygon};
pub use crate::core_modules::results::Color;

/// Configuration for the ColorEngine.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Number of executors in the worker pool. `None` uses the number of logical
    /// CPUs. Values below one are raised to one.
    pub worker_count: Option<usize>,
}

impl EngineConfig {
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count: Some(worker_count),
        }
    }

    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Everything one computation needs.
#[derive(Debug, Clone)]
pub struct ComputeRequest {
    /// Name given to the resulting color, usually the image file name.
    pub name: String,
    pub pixels: Arc<PixelBuffer>,
    /// The selection. Empty means the whole image.
    pub polygons: PolygonSet,
}

impl ComputeRequest {
    pub fn new(name: impl Into<String>, pixels: Arc<PixelBuffer>, polygons: PolygonSet) -> Self {
        Self {
            name: name.into(),
            pixels,
            polygons,
        }
    }

    pub fn whole_image(name: impl Into<String>, pixels: Arc<PixelBuffer>) -> Self {
        Self::new(name, pixels, Vec::new())
    }
}

/// The outcome of a successful computation.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeOutcome {
    /// A color was computed and appended to the results.
    Color(Color),
    /// The selection covered no pixels. Nothing was appended.
    NoResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Computing,
}

const READY: u8 = 0;
const COMPUTING: u8 = 1;

/// Holds the engine in `Computing` for as long as it lives.
struct ComputingGuard {
    state: Arc<AtomicU8>,
}

impl Drop for ComputingGuard {
    fn drop(&mut self) {
        self.state.store(READY, Ordering::Release);
    }
}

enum Job {
    WholeImage(Arc<PixelBuffer>),
    Slices(Vec<WorkUnit>),
}

/// The main, top-level struct for the color engine.
pub struct ColorEngine {
    pool: WorkerPool,
    state: Arc<AtomicU8>,
    results: Mutex<ResultList>,
}

impl ColorEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let pool = WorkerPool::new(config.resolved_worker_count())?;
        Ok(Self {
            pool,
            state: Arc::new(AtomicU8::new(READY)),
            results: Mutex::new(ResultList::new()),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn state(&self) -> EngineState {
        match self.state.load(Ordering::Acquire) {
            COMPUTING => EngineState::Computing,
            _ => EngineState::Ready,
        }
    }

    /// Computes the representative color of the request's selection.
    ///
    /// Fails with `Busy` when another computation is in flight and with
    /// `ComputeFailure` when any unit of work fails.
    ///
    /// Dropping the returned future abandons the request, but the engine stays
    /// `Computing` until the executors have finished every unit already queued.
    pub async fn compute(&self, request: ComputeRequest) -> Result<ComputeOutcome> {
        let guard: Lease = Arc::new(self.begin()?);
        let job = self.plan(&request);
        self.run(request.name, job, &guard).await
    }

    /// A copy of every color computed so far, oldest first.
    pub fn results(&self) -> Vec<Color> {
        self.with_results(|results| results.snapshot())
    }

    /// Runs `f` against the result collection.
    pub fn with_results<R>(&self, f: impl FnOnce(&mut ResultList) -> R) -> R {
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut results)
    }

    fn begin(&self) -> Result<ComputingGuard> {
        self.state
            .compare_exchange(READY, COMPUTING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("computation requested while another one is in flight");
                EngineError::Busy
            })?;
        Ok(ComputingGuard {
            state: self.state.clone(),
        })
    }

    /// Turns a request into the work that has to be done for it.
    fn plan(&self, request: &ComputeRequest) -> Job {
        if request.polygons.is_empty() {
            return Job::WholeImage(request.pixels.clone());
        }

        let (width, height) = (request.pixels.width(), request.pixels.height());
        let bounds = match selection_bounds(&request.polygons, width, height) {
            Ok(bounds) => bounds,
            Err(err) => {
                debug!(%err, "no polygon has any point; nothing to select");
                return Job::Slices(Vec::new());
            }
        };
        let slices = plan_slices(&bounds, self.pool.worker_count());
        debug!(?bounds, ?slices, "planned selection");

        let boundary = Arc::new(Boundary::from_polygons(&request.polygons));
        Job::Slices(
            slices
                .into_iter()
                .map(|slice| WorkUnit {
                    pixels: request.pixels.clone(),
                    boundary: boundary.clone(),
                    slice,
                })
                .collect(),
        )
    }

    async fn run(&self, name: String, job: Job, guard: &Lease) -> Result<ComputeOutcome> {
        let rgb = match job {
            Job::WholeImage(pixels) => pixels.pixels().collect::<PartialSum>().rms(),
            Job::Slices(units) => self.reduce(units, guard.clone()).await?,
        };

        let Some(rgb) = rgb else {
            debug!(%name, "selection matched no pixels");
            return Ok(ComputeOutcome::NoResult);
        };

        let color = Color::new(name, rgb);
        info!(
            name = %color.name,
            r = color.r,
            g = color.g,
            b = color.b,
            "computed average color"
        );
        self.with_results(|results| results.push(color.clone()));
        Ok(ComputeOutcome::Color(color))
    }

    /// Runs every unit on the pool and combines the partial sums.
    async fn reduce(&self, units: Vec<WorkUnit>, guard: Lease) -> Result<Option<Rgb>> {
        let partials = self
            .pool
            .run_all(units, Some(guard))
            .await
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| {
                error!(%err, "error calculating average color");
                EngineError::ComputeFailure(err)
            })?;

        debug!(?partials, "joined partial sums");
        Ok(combine(partials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::Bounds;
    use crate::error::WorkError;
    use std::time::Duration;

    #[test]
    fn config_resolves_at_least_one_worker() {
        assert_eq!(EngineConfig::with_workers(0).resolved_worker_count(), 1);
        assert_eq!(EngineConfig::with_workers(3).resolved_worker_count(), 3);
        assert!(EngineConfig::default().resolved_worker_count() >= 1);
    }

    #[test]
    fn guard_restores_ready() {
        let engine = ColorEngine::new(EngineConfig::with_workers(1)).unwrap();
        {
            let _guard = engine.begin().unwrap();
            assert_eq!(engine.state(), EngineState::Computing);
            assert!(matches!(engine.begin(), Err(EngineError::Busy)));
        }
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn busy_while_guard_is_held() {
        let engine = ColorEngine::new(EngineConfig::with_workers(2)).unwrap();
        let pixels = Arc::new(PixelBuffer::filled(4, 4, [1, 2, 3, 255]));

        let guard = engine.begin().unwrap();
        let rejected = engine.compute(ComputeRequest::whole_image("a", pixels.clone())).await;
        assert!(matches!(rejected, Err(EngineError::Busy)));
        drop(guard);

        let accepted = engine.compute(ComputeRequest::whole_image("a", pixels)).await;
        assert!(matches!(accepted, Ok(ComputeOutcome::Color(_))));
    }

    #[tokio::test]
    async fn abandoned_request_holds_the_engine_until_its_units_finish() {
        let engine = ColorEngine::new(EngineConfig::with_workers(1)).unwrap();
        let pixels = Arc::new(PixelBuffer::filled(2000, 2000, [7, 7, 7, 255]));
        let square = Polygon::new(
            "all",
            vec![
                Point::new(0, 0),
                Point::new(2000, 0),
                Point::new(2000, 2000),
                Point::new(0, 2000),
            ],
        );
        let request = ComputeRequest::new("big", pixels.clone(), vec![square]);

        let mut pending = Box::pin(engine.compute(request));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        drop(pending);

        assert_eq!(engine.state(), EngineState::Computing);
        let rejected = engine.compute(ComputeRequest::whole_image("small", pixels.clone())).await;
        assert!(matches!(rejected, Err(EngineError::Busy)));

        let settled = async {
            while engine.state() == EngineState::Computing {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(30), settled)
            .await
            .expect("executors finish the abandoned units");

        assert!(engine.results().is_empty());
        let outcome = engine.compute(ComputeRequest::whole_image("small", pixels)).await.unwrap();
        assert!(matches!(outcome, ComputeOutcome::Color(_)));
    }

    #[tokio::test]
    async fn failed_unit_fails_the_whole_request() {
        let engine = ColorEngine::new(EngineConfig::with_workers(2)).unwrap();
        let pixels = Arc::new(PixelBuffer::filled(8, 8, [9, 9, 9, 255]));
        let boundary = Arc::new(Boundary::default());
        let units = vec![
            WorkUnit {
                pixels: pixels.clone(),
                boundary: boundary.clone(),
                slice: Bounds::new(0, 0, 4, 8),
            },
            WorkUnit {
                pixels: pixels.clone(),
                boundary,
                slice: Bounds::new(4, 0, 12, 8),
            },
        ];

        let guard: Lease = Arc::new(engine.begin().unwrap());
        let outcome = engine.run("broken".into(), Job::Slices(units), &guard).await;
        drop(guard);

        assert!(matches!(
            outcome,
            Err(EngineError::ComputeFailure(WorkError::SliceOutOfBounds { .. }))
        ));
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(engine.results().is_empty());

        // The engine and its pool stay usable.
        let outcome = engine.compute(ComputeRequest::whole_image("ok", pixels)).await.unwrap();
        assert_eq!(
            outcome,
            ComputeOutcome::Color(Color::new("ok", Rgb { r: 9.0, g: 9.0, b: 9.0 }))
        );
        assert_eq!(engine.results().len(), 1);
    }
}
