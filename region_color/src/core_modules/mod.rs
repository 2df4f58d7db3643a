pub mod color_format;
pub mod geometry;
pub mod mask;
pub mod partial_sum;
pub mod pixel_buffer;
pub mod region_planner;
pub mod results;
pub mod worker_pool;
