// THEORY:
// The `region_planner` cuts the selection rectangle into one strip per worker.
// Strips are taken along the longer side of the rectangle so that each one stays
// as close to square as possible, which keeps the amount of work per strip even.
//
// The planner is a pure function: the same bounds and worker count always yield
// the same strips, in order, and together they cover the bounds exactly.

use crate::core_modules::geometry::Bounds;

/// The axis a rectangle is cut along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Vertical cuts; strips are columns.
    Horizontal,
    /// Horizontal cuts; strips are rows.
    Vertical,
}

impl Axis {
    /// Picks the longer side. Square rectangles are cut horizontally.
    pub fn for_bounds(bounds: &Bounds) -> Self {
        if bounds.width() >= bounds.height() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }
}

/// Partitions `bounds` into at most `worker_count` contiguous slices.
///
/// Degenerate bounds produce no slices at all.
pub fn plan_slices(bounds: &Bounds, worker_count: usize) -> Vec<Bounds> {
    if bounds.is_empty() {
        return Vec::new();
    }

    let workers = worker_count.max(1) as i64;
    let axis = Axis::for_bounds(bounds);
    let (start, end) = match axis {
        Axis::Horizontal => (bounds.left, bounds.right),
        Axis::Vertical => (bounds.top, bounds.bottom),
    };
    let length = (end - start) as i64;
    let extent = ((length + workers - 1) / workers) as i32;

    let mut slices = Vec::with_capacity(workers as usize);
    let mut edge = start;
    while edge < end {
        let far = end.min(edge.saturating_add(extent));
        slices.push(match axis {
            Axis::Horizontal => Bounds::new(edge, bounds.top, far, bounds.bottom),
            Axis::Vertical => Bounds::new(bounds.left, edge, bounds.right, far),
        });
        edge = far;
    }
    slices
}
