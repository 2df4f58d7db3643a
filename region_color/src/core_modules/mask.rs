// THEORY:
// The `mask` module decides which pixels belong to the selection. All polygons of
// a request are combined into a single compound `Boundary` and classified with the
// non-zero winding rule, exactly like a vector path filled with a non-zero fill.
//
// Consequences that are part of the contract:
// - Overlapping contours wound in the same direction union their areas; the
//   overlap is counted once because a pixel is either in or out.
// - A contour wound against its enclosing contour cancels it and cuts a hole.
// - Self-intersecting contours follow the same rule lobe by lobe.
//
// The test point is the integer pixel coordinate itself. Edges are half-open: a
// vertex or edge pixel on the left/top side of a region is inside, one on the
// right/bottom side is outside. A unit square at (x, y) therefore selects the
// single pixel (x, y).

use crate::core_modules::geometry::{Point, Polygon};

/// The compound path every worker classifies against. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Boundary {
    /// Closed contours in polygon order. Open polygons are dropped on build.
    contours: Vec<Vec<Point>>,
}

impl Boundary {
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let contours = polygons
            .iter()
            .filter(|polygon| polygon.is_closed())
            .map(|polygon| polygon.points.clone())
            .collect();
        Self { contours }
    }

    pub fn contours(&self) -> &[Vec<Point>] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Sum of the winding numbers of every contour around `(x, y)`.
    pub fn winding_number(&self, x: i32, y: i32) -> i32 {
        let p = Point::new(x, y);
        self.contours.iter().map(|contour| winding_number(p, contour)).sum()
    }

    /// Non-zero winding test.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.winding_number(x, y) != 0
    }
}

/// Signed crossings of a rightward ray from `p` with the closed `contour`.
fn winding_number(p: Point, contour: &[Point]) -> i32 {
    let mut wn = 0;
    let mut j = contour.len() - 1;
    for i in 0..contour.len() {
        let a = contour[j];
        let b = contour[i];
        if a.y <= p.y {
            if b.y > p.y && is_left(a, b, p) > 0 {
                wn += 1;
            }
        } else if b.y <= p.y && is_left(a, b, p) < 0 {
            wn -= 1;
        }
        j = i;
    }
    wn
}

/// Cross product sign: > 0 when `p` is left of the directed edge `a -> b`.
#[inline(always)]
fn is_left(a: Point, b: Point, p: Point) -> i64 {
    let (ax, ay) = (a.x as i64, a.y as i64);
    let (bx, by) = (b.x as i64, b.y as i64);
    let (px, py) = (p.x as i64, p.y as i64);
    (bx - ax) * (py - ay) - (px - ax) * (by - ay)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(coords: &[(i32, i32)]) -> Polygon {
        Polygon::new("p", coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn square(left: i32, top: i32, right: i32, bottom: i32, clockwise: bool) -> Polygon {
        let mut coords = vec![(left, top), (right, top), (right, bottom), (left, bottom)];
        if !clockwise {
            coords.reverse();
        }
        polygon(&coords)
    }

    fn selected(boundary: &Boundary, width: i32, height: i32) -> Vec<(i32, i32)> {
        let mut hits = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if boundary.contains(x, y) {
                    hits.push((x, y));
                }
            }
        }
        hits
    }

    #[test]
    fn unit_square_selects_one_pixel() {
        for clockwise in [true, false] {
            let boundary = Boundary::from_polygons(&[square(2, 3, 3, 4, clockwise)]);
            assert_eq!(selected(&boundary, 6, 6), vec![(2, 3)]);
        }
    }

    #[test]
    fn square_area_is_half_open() {
        let boundary = Boundary::from_polygons(&[square(1, 1, 5, 4, true)]);
        let hits = selected(&boundary, 8, 8);
        assert_eq!(hits.len(), 12);
        assert!(boundary.contains(1, 1));
        assert!(boundary.contains(4, 3));
        assert!(!boundary.contains(5, 1));
        assert!(!boundary.contains(1, 4));
    }

    #[test]
    fn open_polygons_are_dropped() {
        let boundary = Boundary::from_polygons(&[
            polygon(&[(0, 0), (5, 5)]),
            polygon(&[(1, 1)]),
            Polygon::new("empty", Vec::new()),
        ]);
        assert!(boundary.is_empty());
        assert!(selected(&boundary, 6, 6).is_empty());
    }

    #[test]
    fn same_direction_overlap_is_a_union() {
        let boundary =
            Boundary::from_polygons(&[square(2, 2, 6, 6, true), square(2, 2, 6, 6, true)]);
        assert_eq!(boundary.winding_number(3, 3).abs(), 2);
        assert_eq!(selected(&boundary, 10, 10).len(), 16);
    }

    #[test]
    fn partially_overlapping_squares_union() {
        let boundary =
            Boundary::from_polygons(&[square(0, 0, 4, 4, false), square(2, 2, 6, 6, false)]);
        assert_eq!(selected(&boundary, 10, 10).len(), 16 + 16 - 4);
    }

    #[test]
    fn opposite_direction_nesting_cuts_a_hole() {
        let boundary =
            Boundary::from_polygons(&[square(0, 0, 10, 10, true), square(3, 3, 7, 7, false)]);
        assert!(!boundary.contains(4, 4));
        assert!(boundary.contains(1, 1));
        assert!(boundary.contains(7, 7));
        assert_eq!(selected(&boundary, 12, 12).len(), 100 - 16);
    }

    #[test]
    fn same_direction_nesting_keeps_inner_area() {
        let boundary =
            Boundary::from_polygons(&[square(0, 0, 10, 10, true), square(3, 3, 7, 7, true)]);
        assert!(boundary.contains(4, 4));
        assert_eq!(selected(&boundary, 12, 12).len(), 100);
    }

    #[test]
    fn bow_tie_fills_both_lobes() {
        let boundary = Boundary::from_polygons(&[polygon(&[(0, 0), (4, 4), (4, 0), (0, 4)])]);
        assert_eq!(boundary.winding_number(1, 2), 1);
        assert_eq!(boundary.winding_number(3, 2), -1);
        assert!(!boundary.contains(2, 1));
        assert!(!boundary.contains(2, 3));
    }

    #[test]
    fn points_outside_the_contour_are_out() {
        let boundary = Boundary::from_polygons(&[polygon(&[(2, 2), (8, 2), (5, 8)])]);
        assert!(boundary.contains(5, 4));
        assert!(!boundary.contains(0, 0));
        assert!(!boundary.contains(-3, 4));
        assert!(!boundary.contains(9, 4));
        assert!(!boundary.contains(5, 9));
    }
}
