//! Isoline tracing using the marching squares algorithm.
//!
//! The grid is traced inside a synthetic frame of `-inf` nodes so that every
//! isoline touching the data edge closes around the frame instead of ending
//! in the middle of a cell. Frame nodes sit on the raster's outer pixel
//! edges (x = 0 and x = width), data nodes on pixel centres (x = i + 0.5).
//! The frame runs are removed afterwards by clipping (see [`crate::clip`]).

use field_common::ScalarGrid;
use std::collections::{HashMap, VecDeque};

/// A point in raster pixel space.
pub type PixelPoint = [f64; 2];

/// A traced polyline in pixel space.
///
/// Closed rings repeat their first point at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Isoline {
    pub points: Vec<PixelPoint>,
    pub closed: bool,
}

impl Isoline {
    pub fn open(points: Vec<PixelPoint>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    /// Pixel bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let mut bbox = (first[0], first[1], first[0], first[1]);
        for p in &self.points[1..] {
            bbox.0 = bbox.0.min(p[0]);
            bbox.1 = bbox.1.min(p[1]);
            bbox.2 = bbox.2.max(p[0]);
            bbox.3 = bbox.3.max(p[1]);
        }
        Some(bbox)
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]))
            .sum()
    }
}

/// Cell edge identifier: `2 * node_index` for the horizontal edge leaving a
/// node eastward, `2 * node_index + 1` for the vertical edge leaving it
/// southward.
type EdgeId = usize;

/// The grid seen through its one-node `-inf` frame.
struct FramedGrid<'a> {
    grid: &'a ScalarGrid,
    width: usize,
    height: usize,
}

impl<'a> FramedGrid<'a> {
    fn new(grid: &'a ScalarGrid) -> Self {
        Self {
            grid,
            width: grid.width + 2,
            height: grid.height + 2,
        }
    }

    #[inline]
    fn value(&self, i: usize, j: usize) -> f64 {
        if i == 0 || j == 0 || i == self.width - 1 || j == self.height - 1 {
            f64::NEG_INFINITY
        } else {
            self.grid.get(i - 1, j - 1)
        }
    }

    #[inline]
    fn position(&self, i: usize, j: usize) -> PixelPoint {
        [
            axis_position(i, self.width, self.grid.width),
            axis_position(j, self.height, self.grid.height),
        ]
    }

    fn horizontal(&self, i: usize, j: usize) -> EdgeId {
        2 * (j * self.width + i)
    }

    fn vertical(&self, i: usize, j: usize) -> EdgeId {
        2 * (j * self.width + i) + 1
    }

    /// Where `level` crosses the edge between nodes `a` and `b`.
    ///
    /// A crossing next to a frame node is pinned to the frame position.
    fn crossing(&self, a: (usize, usize), b: (usize, usize), level: f64) -> PixelPoint {
        let (va, vb) = (self.value(a.0, a.1), self.value(b.0, b.1));
        let (pa, pb) = (self.position(a.0, a.1), self.position(b.0, b.1));
        if va == f64::NEG_INFINITY {
            return pa;
        }
        if vb == f64::NEG_INFINITY {
            return pb;
        }

        let t = if (vb - va).abs() < f64::EPSILON {
            0.5
        } else {
            ((level - va) / (vb - va)).clamp(0.0, 1.0)
        };
        [pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])]
    }
}

fn axis_position(framed: usize, framed_len: usize, len: usize) -> f64 {
    if framed == 0 {
        0.0
    } else if framed == framed_len - 1 {
        len as f64
    } else {
        framed as f64 - 0.5
    }
}

/// Trace all isolines of `grid` at `level`, in pixel space.
///
/// Nodes `>= level` count as inside. Cells with a NaN corner produce no
/// segments. Saddles are resolved by the average of the four corners.
pub fn trace_isolines(grid: &ScalarGrid, level: f64) -> Vec<Isoline> {
    if grid.width == 0 || grid.height == 0 || !level.is_finite() {
        return vec![];
    }

    let framed = FramedGrid::new(grid);
    let mut segments: Vec<(EdgeId, EdgeId)> = Vec::new();
    let mut points: HashMap<EdgeId, PixelPoint> = HashMap::new();

    march_squares(&framed, level, &mut segments, &mut points);
    connect_segments(&segments, &points)
}

/// Emit one or two edge-to-edge segments per cell.
fn march_squares(
    framed: &FramedGrid<'_>,
    level: f64,
    segments: &mut Vec<(EdgeId, EdgeId)>,
    points: &mut HashMap<EdgeId, PixelPoint>,
) {
    for j in 0..framed.height - 1 {
        for i in 0..framed.width - 1 {
            let tl = framed.value(i, j);
            let tr = framed.value(i + 1, j);
            let br = framed.value(i + 1, j + 1);
            let bl = framed.value(i, j + 1);

            if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }
            if cell_index == 0 || cell_index == 15 {
                continue;
            }

            let top = (framed.horizontal(i, j), (i, j), (i + 1, j));
            let right = (framed.vertical(i + 1, j), (i + 1, j), (i + 1, j + 1));
            let bottom = (framed.horizontal(i, j + 1), (i, j + 1), (i + 1, j + 1));
            let left = (framed.vertical(i, j), (i, j), (i, j + 1));

            let center_inside = (tl + tr + br + bl) / 4.0 >= level;
            let (first, second) = match cell_index {
                1 | 14 => ((left, top), None),
                2 | 13 => ((top, right), None),
                3 | 12 => ((left, right), None),
                4 | 11 => ((right, bottom), None),
                6 | 9 => ((top, bottom), None),
                7 | 8 => ((left, bottom), None),
                // saddles: the centre decides which corner pair is cut off
                5 if center_inside => ((top, right), Some((left, bottom))),
                5 => ((left, top), Some((right, bottom))),
                10 if center_inside => ((left, top), Some((right, bottom))),
                _ => ((top, right), Some((left, bottom))),
            };

            for ((ea, a0, a1), (eb, b0, b1)) in std::iter::once(first).chain(second) {
                points
                    .entry(ea)
                    .or_insert_with(|| framed.crossing(a0, a1, level));
                points
                    .entry(eb)
                    .or_insert_with(|| framed.crossing(b0, b1, level));
                segments.push((ea, eb));
            }
        }
    }
}

/// Join segments sharing an edge crossing into polylines.
///
/// Every crossing is shared by at most two segments, so each chain is
/// extended forward then backward until it closes or runs out.
fn connect_segments(
    segments: &[(EdgeId, EdgeId)],
    points: &HashMap<EdgeId, PixelPoint>,
) -> Vec<Isoline> {
    let mut ends: HashMap<EdgeId, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (idx, &(a, b)) in segments.iter().enumerate() {
        ends.entry(a).or_default().push(idx);
        ends.entry(b).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let (a, b) = segments[start];
        let mut chain: VecDeque<EdgeId> = VecDeque::from([a, b]);
        let mut closed = false;

        while let Some(&tail) = chain.back() {
            let Some(next) = take_next(&ends, &mut used, tail) else {
                break;
            };
            let other = other_end(segments[next], tail);
            chain.push_back(other);
            if Some(&other) == chain.front() {
                closed = true;
                break;
            }
        }

        if !closed {
            while let Some(&head) = chain.front() {
                let Some(prev) = take_next(&ends, &mut used, head) else {
                    break;
                };
                chain.push_front(other_end(segments[prev], head));
            }
        }

        let points: Vec<PixelPoint> = chain.iter().filter_map(|e| points.get(e).copied()).collect();
        if points.len() >= 2 {
            lines.push(Isoline { points, closed });
        }
    }

    lines
}

fn take_next(ends: &HashMap<EdgeId, Vec<usize>>, used: &mut [bool], edge: EdgeId) -> Option<usize> {
    let next = ends.get(&edge)?.iter().copied().find(|&s| !used[s])?;
    used[next] = true;
    Some(next)
}

fn other_end(segment: (EdgeId, EdgeId), edge: EdgeId) -> EdgeId {
    if segment.0 == edge {
        segment.1
    } else {
        segment.0
    }
}

/// Apply Chaikin's corner cutting algorithm for smoothing.
///
/// Open lines keep their end points; closed rings stay closed.
pub fn smooth_isoline(line: &Isoline, iterations: u32) -> Isoline {
    if iterations == 0 || line.points.len() < 3 {
        return line.clone();
    }

    let mut points = line.points.clone();
    if line.closed {
        points.pop();
    }

    for _ in 0..iterations {
        let n = points.len();
        let mut new_points = Vec::with_capacity(n * 2 + 2);
        if !line.closed {
            new_points.push(points[0]);
        }

        let pairs = if line.closed { n } else { n - 1 };
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            // 25% and 75% along the segment
            new_points.push([0.75 * p1[0] + 0.25 * p2[0], 0.75 * p1[1] + 0.25 * p2[1]]);
            new_points.push([0.25 * p1[0] + 0.75 * p2[0], 0.25 * p1[1] + 0.75 * p2[1]]);
        }

        if !line.closed {
            new_points.push(points[n - 1]);
        }
        points = new_points;
    }

    if line.closed {
        points.push(points[0]);
    }
    Isoline {
        points,
        closed: line.closed,
    }
}
