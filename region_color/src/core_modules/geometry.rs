// THEORY:
// The `geometry` module is the foundation of region selection. Everything the
// engine knows about "where" comes from here: the integer `Point`, the closed
// `Polygon`, and the axis-aligned rectangles that describe which part of the
// image has to be scanned at all.
//
// Key architectural principles:
// 1.  **Integer Pixels**: Vertices live on the pixel grid. Fractional input from
//     an editor is rounded once, at creation, and never interpolated afterwards.
// 2.  **Two Rectangles**: `Extent` is the tight floating-point box around some
//     vertices; `Bounds` is the integer box that is actually scanned. Turning
//     one into the other always rounds outward so no vertex is ever cut off.
// 3.  **Clamping Last**: Bounds are clamped to the image only after rounding, and
//     clamping may legitimately collapse them to zero area.

use crate::error::{EngineError, Result};

/// A vertex on the pixel grid.
///
/// Deserialization accepts fractional coordinates and rounds them through
/// [`Point::from_f64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawPoint"))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Snaps an arbitrary position to the nearest pixel coordinate.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

/// A vertex as an editor reports it, before snapping to the grid.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[cfg(feature = "serde")]
impl From<RawPoint> for Point {
    fn from(raw: RawPoint) -> Self {
        Point::from_f64(raw.x, raw.y)
    }
}

/// A closed boundary drawn over the image.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    /// Identifier assigned by whoever created the polygon.
    pub id: String,
    /// Display name; not used by the computation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// The vertices in drawing order. The edge from the last vertex back to the
    /// first is implicit.
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            points,
        }
    }

    /// Fewer than three vertices enclose no area.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3
    }
}

pub type PolygonSet = Vec<Polygon>;

/// Tight floating-point box around a set of vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Extent {
    /// Floors the leading edges and ceils the trailing ones.
    pub fn round_outward(&self) -> Bounds {
        Bounds::new(
            self.left.floor() as i32,
            self.top.floor() as i32,
            self.right.ceil() as i32,
            self.bottom.ceil() as i32,
        )
    }
}

/// Integer rectangle. `right` and `bottom` are exclusive when scanning pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Builds a rectangle from its edges. Inverted edges are collapsed so that
    /// width and height are never negative.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clamps every edge into `[0, image_width] x [0, image_height]`.
    pub fn clamp(&self, image_width: u32, image_height: u32) -> Self {
        let max_x = image_width as i32;
        let max_y = image_height as i32;
        Self::new(
            self.left.clamp(0, max_x),
            self.top.clamp(0, max_y),
            self.right.clamp(0, max_x),
            self.bottom.clamp(0, max_y),
        )
    }

    /// True when the rectangle lies within a `width`x`height` image.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right <= image_width as i32
            && self.bottom <= image_height as i32
    }
}

/// Computes the tight box around `points`.
pub fn compute_bounds<'a, I>(points: I) -> Result<Extent>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut points = points.into_iter();
    let first = points.next().ok_or(EngineError::EmptyGeometry)?;

    let mut extent = Extent {
        left: first.x as f64,
        top: first.y as f64,
        right: first.x as f64,
        bottom: first.y as f64,
    };
    for point in points {
        let (x, y) = (point.x as f64, point.y as f64);
        extent.left = extent.left.min(x);
        extent.right = extent.right.max(x);
        extent.top = extent.top.min(y);
        extent.bottom = extent.bottom.max(y);
    }
    Ok(extent)
}

/// Computes the scan rectangle for a polygon set: the box around every vertex
/// of every polygon, rounded outward and clamped to the image.
///
/// Polygons without vertices are skipped. Returns `EmptyGeometry` only when no
/// polygon has any vertex at all.
pub fn selection_bounds(
    polygons: &[Polygon],
    image_width: u32,
    image_height: u32,
) -> Result<Bounds> {
    let extent = compute_bounds(polygons.iter().flat_map(|p| p.points.iter()))?;
    Ok(extent.round_outward().clamp(image_width, image_height))
}
