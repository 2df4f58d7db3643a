use thiserror::Error;

/// Errors surfaced by the color engine to its caller.
///
/// `NoResult` is deliberately absent: selecting zero pixels is a valid outcome
/// and is reported through `ComputeOutcome::NoResult` instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("geometry requires at least one point")]
    EmptyGeometry,

    #[error("a computation is already in flight")]
    Busy,

    #[error("error calculating average color: {0}")]
    ComputeFailure(#[from] WorkError),

    #[error("failed to start worker pool: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for RGBA8")]
    BufferSize { expected: usize, actual: usize },
}

/// Failure of a single unit of work inside the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("slice {left},{top}..{right},{bottom} lies outside the {width}x{height} image")]
    SliceOutOfBounds {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        width: u32,
        height: u32,
    },

    #[error("worker {worker} panicked: {message}")]
    Panicked { worker: usize, message: String },

    #[error("worker {worker} is no longer reachable")]
    Disconnected { worker: usize },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
