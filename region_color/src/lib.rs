// THEORY:
// This file is the main entry point for the `region_color` library crate.
//
// The public surface is the `ColorEngine` in `pipeline` and the request/outcome
// types around it. The building blocks (geometry, slicing, masking, the worker
// pool and the RMS aggregation) live in `core_modules` and are public so that
// front ends can reuse them, e.g. to preview a selection's bounds.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::pixel_buffer::PixelBuffer;
pub use error::{EngineError, WorkError};
pub use pipeline::{
    Color, ColorEngine, ComputeOutcome, ComputeRequest, EngineConfig, EngineState, Point, Polygon,
};
