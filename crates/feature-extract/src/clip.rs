//! Polyline clipping against an axis-aligned rectangle.
//!
//! Used twice by the contour engine: in pixel space to strip the tracer's
//! frame ("unframing"), and in geographic space to trim lines that run past
//! the bounds after cylinder wrapping.

use crate::isolines::{Isoline, PixelPoint};
use field_common::Bounds;

/// Axis-aligned clip rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ClipRect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// `[eps, eps, width - eps, height - eps]` in pixel space.
    pub fn inset(width: f64, height: f64, epsilon: f64) -> Self {
        Self::new(epsilon, epsilon, width - epsilon, height - epsilon)
    }

    /// The bounds as an `[lng, lat]` rectangle.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self::new(bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat)
    }
}

/// Clip segment `a -> b` (Liang-Barsky).
///
/// Returns the visible part and whether its start and end were moved.
pub fn clip_segment(
    a: PixelPoint,
    b: PixelPoint,
    rect: &ClipRect,
) -> Option<(PixelPoint, PixelPoint, bool, bool)> {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, a[0] - rect.min_x),
        (dx, rect.max_x - a[0]),
        (-dy, a[1] - rect.min_y),
        (dy, rect.max_y - a[1]),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    let at = |t: f64| [a[0] + t * dx, a[1] + t * dy];
    let start = if t0 > 0.0 { at(t0) } else { a };
    let end = if t1 < 1.0 { at(t1) } else { b };
    Some((start, end, t0 > 0.0, t1 < 1.0))
}

/// Clip a polyline, splitting it where it leaves the rectangle.
///
/// A closed ring that stays inside is returned unchanged. A ring cut open
/// has its first and last pieces joined when the ring's start point was
/// inside, so the seam does not add a break.
pub fn clip_isoline(line: &Isoline, rect: &ClipRect) -> Vec<Isoline> {
    let mut pieces: Vec<Vec<PixelPoint>> = Vec::new();
    let mut current: Vec<PixelPoint> = Vec::new();
    let mut clipped = false;

    for w in line.points.windows(2) {
        match clip_segment(w[0], w[1], rect) {
            None => {
                clipped = true;
                flush(&mut current, &mut pieces);
            }
            Some((start, end, start_moved, end_moved)) => {
                if start_moved || current.is_empty() {
                    flush(&mut current, &mut pieces);
                    current.push(start);
                }
                current.push(end);
                if end_moved {
                    flush(&mut current, &mut pieces);
                }
                clipped |= start_moved || end_moved;
            }
        }
    }
    flush(&mut current, &mut pieces);

    if !clipped && pieces.len() == 1 {
        return vec![Isoline {
            points: pieces.remove(0),
            closed: line.closed,
        }];
    }

    if line.closed && pieces.len() >= 2 {
        let ring_start = line.points.first().copied();
        let joins = pieces[0].first().copied() == ring_start
            && pieces.last().and_then(|p| p.last().copied()) == ring_start;
        if joins {
            let head = pieces.remove(0);
            if let Some(tail) = pieces.last_mut() {
                tail.extend_from_slice(&head[1..]);
            }
        }
    }

    pieces.into_iter().map(Isoline::open).collect()
}

fn flush(current: &mut Vec<PixelPoint>, pieces: &mut Vec<Vec<PixelPoint>>) {
    if current.len() >= 2 {
        pieces.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> ClipRect {
        ClipRect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_segment_inside() {
        let r = clip_segment([1.0, 1.0], [2.0, 2.0], &unit()).unwrap();
        assert_eq!(r, ([1.0, 1.0], [2.0, 2.0], false, false));
    }

    #[test]
    fn test_segment_crossing() {
        let (s, e, sm, em) = clip_segment([-5.0, 5.0], [15.0, 5.0], &unit()).unwrap();
        assert_eq!(s, [0.0, 5.0]);
        assert_eq!(e, [10.0, 5.0]);
        assert!(sm && em);
    }

    #[test]
    fn test_segment_outside() {
        assert!(clip_segment([-5.0, -5.0], [-1.0, 20.0], &unit()).is_none());
        assert!(clip_segment([11.0, 0.0], [11.0, 10.0], &unit()).is_none());
    }

    #[test]
    fn test_polyline_split_in_two() {
        let line = Isoline::open(vec![[1.0, 1.0], [5.0, 1.0], [5.0, 20.0], [8.0, 20.0], [8.0, 1.0]]);
        let pieces = clip_isoline(&line, &unit());
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].points, vec![[1.0, 1.0], [5.0, 1.0], [5.0, 10.0]]);
        assert_eq!(pieces[1].points, vec![[8.0, 10.0], [8.0, 1.0]]);
    }

    #[test]
    fn test_ring_inside_stays_closed() {
        let ring = Isoline {
            points: vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
            closed: true,
        };
        let out = clip_isoline(&ring, &unit());
        assert_eq!(out, vec![ring]);
    }

    #[test]
    fn test_ring_cut_once_joins_at_seam() {
        // square ring poking out of the right edge, starting inside
        let ring = Isoline {
            points: vec![[5.0, 2.0], [12.0, 2.0], [12.0, 8.0], [5.0, 8.0], [5.0, 2.0]],
            closed: true,
        };
        let out = clip_isoline(&ring, &unit());
        assert_eq!(out.len(), 1);
        assert!(!out[0].closed);
        assert_eq!(out[0].points, vec![[10.0, 8.0], [5.0, 8.0], [5.0, 2.0], [10.0, 2.0]]);
    }
}
