//! Path storage and building.
//!
//! A [Path] is a flat buffer of verbs and fixed-point points. The scan
//! converter does not walk this storage directly: it asks for
//! [contours](struct.Path.html#method.contours), which present every
//! subpath as a ring of segments with a synthetic closing segment
//! appended, so an edge can walk to its neighbours with plain index
//! arithmetic and wrap-around.

use crate::fixed::{Fixed, FixedPoint, FixedRect};
use crate::flatten::{log2_samples, FlattenedIterator};
use crate::math::Point;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Verb {
    Begin,
    LineTo,
    CurveTo,
    End { closed: bool },
}

/// A 2D path in fixed-point device space.
#[derive(Clone, Debug, Default)]
pub struct Path {
    points: Vec<FixedPoint>,
    verbs: Vec<Verb>,
    num_subpaths: u32,
    has_curves: bool,
}

/// Builds a path from f32 user-space points.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    path: Path,
    in_subpath: bool,
    first: FixedPoint,
}

/// Identifies one segment of one contour ring within a fill operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SegmentId {
    pub contour: u32,
    pub segment: u32,
}

/// One edge of a contour ring. `ctrl` carries the two interior control
/// points when the edge is a cubic bézier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContourSegment {
    pub from: FixedPoint,
    pub to: FixedPoint,
    pub ctrl: Option<(FixedPoint, FixedPoint)>,
}

impl ContourSegment {
    #[inline]
    pub fn is_curve(&self) -> bool {
        self.ctrl.is_some()
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to && self.ctrl.is_none()
    }
}

/// A closed ring of segments. The last segment is always the closing
/// segment back to the ring's first point (possibly zero-length).
#[derive(Clone, Debug)]
pub struct Contour {
    pub segments: Vec<ContourSegment>,
}

impl Contour {
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segment after `i`, wrapping past the closer.
    #[inline]
    pub fn next_index(&self, i: usize) -> usize {
        if i + 1 == self.segments.len() {
            0
        } else {
            i + 1
        }
    }

    /// The segment before `i`, wrapping past the ring start.
    #[inline]
    pub fn prev_index(&self, i: usize) -> usize {
        if i == 0 {
            self.segments.len() - 1
        } else {
            i - 1
        }
    }
}

impl PathBuilder {
    /// Starts a new subpath at `at`.
    pub fn begin(&mut self, at: Point) {
        assert!(!self.in_subpath, "begin() while a subpath is open");
        let at = FixedPoint::from_f32(at);
        self.in_subpath = true;
        self.first = at;
        self.path.verbs.push(Verb::Begin);
        self.path.points.push(at);
        self.path.num_subpaths += 1;
    }

    /// Adds a line segment to the current subpath.
    pub fn line_to(&mut self, to: Point) {
        assert!(self.in_subpath, "line_to() with no open subpath");
        self.path.verbs.push(Verb::LineTo);
        self.path.points.push(FixedPoint::from_f32(to));
    }

    /// Adds a cubic bézier segment to the current subpath.
    pub fn cubic_bezier_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        assert!(self.in_subpath, "cubic_bezier_to() with no open subpath");
        self.path.verbs.push(Verb::CurveTo);
        self.path.points.push(FixedPoint::from_f32(ctrl1));
        self.path.points.push(FixedPoint::from_f32(ctrl2));
        self.path.points.push(FixedPoint::from_f32(to));
        self.path.has_curves = true;
    }

    /// Ends the current subpath, closing it if requested.
    pub fn end(&mut self, close: bool) {
        assert!(self.in_subpath, "end() with no open subpath");
        self.in_subpath = false;
        self.path.verbs.push(Verb::End { closed: close });
    }

    /// Shorthand for `end(true)`.
    pub fn close(&mut self) {
        self.end(true);
    }

    /// Consumes the builder. An unfinished subpath is ended unclosed.
    pub fn build(mut self) -> Path {
        if self.in_subpath {
            self.end(false);
        }
        self.path
    }
}

impl Path {
    pub fn builder() -> PathBuilder {
        PathBuilder::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    #[inline]
    pub fn num_subpaths(&self) -> u32 {
        self.num_subpaths
    }

    #[inline]
    pub fn has_curves(&self) -> bool {
        self.has_curves
    }

    /// The bounding box of the path, from the control polygons (curves are
    /// not flattened, so the box is conservative). `None` when the path
    /// has no points.
    pub fn bounding_box(&self) -> Option<FixedRect> {
        let first = *self.points.first()?;
        let mut bbox = FixedRect { p: first, q: first };
        for pt in &self.points[1..] {
            bbox.p.x = bbox.p.x.min(pt.x);
            bbox.p.y = bbox.p.y.min(pt.y);
            bbox.q.x = bbox.q.x.max(pt.x);
            bbox.q.y = bbox.q.y.max(pt.y);
        }
        Some(bbox)
    }

    /// When the path is a single axis-aligned rectangle, its box.
    pub fn as_rectangle(&self) -> Option<FixedRect> {
        if self.num_subpaths != 1 || self.has_curves {
            return None;
        }
        let contour = self.contours().pop()?;
        let mut corners: Vec<FixedPoint> = Vec::with_capacity(4);
        for seg in &contour.segments {
            if seg.is_degenerate() {
                continue;
            }
            corners.push(seg.from);
        }
        if corners.len() != 4 {
            return None;
        }
        let (a, b, c, d) = (corners[0], corners[1], corners[2], corners[3]);
        let alternating = (a.x == b.x && b.y == c.y && c.x == d.x && d.y == a.y)
            || (a.y == b.y && b.x == c.x && c.y == d.y && d.x == a.x);
        if !alternating {
            return None;
        }
        Some(FixedRect {
            p: FixedPoint {
                x: a.x.min(c.x),
                y: a.y.min(c.y),
            },
            q: FixedPoint {
                x: a.x.max(c.x),
                y: a.y.max(c.y),
            },
        })
    }

    /// The subpaths as segment rings. Every ring carries a closing segment
    /// back to its first point, so consumers never have to special-case
    /// open subpaths; a coincident closer is zero-length and skipped by the
    /// contour scanner.
    pub fn contours(&self) -> Vec<Contour> {
        let mut contours = Vec::with_capacity(self.num_subpaths as usize);
        let mut cursor = 0;
        let mut segments: Vec<ContourSegment> = Vec::new();
        let mut first = FixedPoint::ZERO;
        let mut current = FixedPoint::ZERO;
        for verb in &self.verbs {
            match verb {
                Verb::Begin => {
                    first = self.points[cursor];
                    cursor += 1;
                    current = first;
                }
                Verb::LineTo => {
                    let to = self.points[cursor];
                    cursor += 1;
                    segments.push(ContourSegment {
                        from: current,
                        to,
                        ctrl: None,
                    });
                    current = to;
                }
                Verb::CurveTo => {
                    let ctrl1 = self.points[cursor];
                    let ctrl2 = self.points[cursor + 1];
                    let to = self.points[cursor + 2];
                    cursor += 3;
                    segments.push(ContourSegment {
                        from: current,
                        to,
                        ctrl: Some((ctrl1, ctrl2)),
                    });
                    current = to;
                }
                Verb::End { .. } => {
                    if !segments.is_empty() {
                        // The closer. An explicit close and a synthetic one
                        // produce the same ring.
                        segments.push(ContourSegment {
                            from: current,
                            to: first,
                            ctrl: None,
                        });
                        contours.push(Contour {
                            segments: core::mem::take(&mut segments),
                        });
                    }
                }
            }
        }
        contours
    }

    /// A copy of the path with every curve replaced by its piecewise-linear
    /// approximation within `flatness`. Returns `None` when a curve's
    /// control polygon is outside the subdividable coordinate range.
    pub fn flattened(&self, flatness: Fixed) -> Option<Path> {
        let mut out = Path {
            points: Vec::with_capacity(self.points.len()),
            verbs: Vec::with_capacity(self.verbs.len()),
            num_subpaths: self.num_subpaths,
            has_curves: false,
        };
        let mut cursor = 0;
        let mut current = FixedPoint::ZERO;
        for verb in &self.verbs {
            match verb {
                Verb::Begin => {
                    current = self.points[cursor];
                    cursor += 1;
                    out.verbs.push(Verb::Begin);
                    out.points.push(current);
                }
                Verb::LineTo => {
                    current = self.points[cursor];
                    cursor += 1;
                    out.verbs.push(Verb::LineTo);
                    out.points.push(current);
                }
                Verb::CurveTo => {
                    let ctrl1 = self.points[cursor];
                    let ctrl2 = self.points[cursor + 1];
                    let to = self.points[cursor + 2];
                    cursor += 3;
                    let k = log2_samples(current, ctrl1, ctrl2, to, flatness);
                    let mut fi = FlattenedIterator::init_curve(current, ctrl1, ctrl2, to, k)?;
                    loop {
                        let more = fi.next();
                        out.verbs.push(Verb::LineTo);
                        out.points.push(FixedPoint {
                            x: fi.lx1,
                            y: fi.ly1,
                        });
                        if !more {
                            break;
                        }
                    }
                    current = to;
                }
                Verb::End { closed } => {
                    out.verbs.push(Verb::End { closed: *closed });
                }
            }
        }
        Some(out)
    }

    /// Merges subpaths that start at the same point into single contours.
    ///
    /// Used for big paths to reduce active-list churn during the sweep: the
    /// rings are concatenated through the shared vertex, which leaves every
    /// edge (and therefore every winding contribution) unchanged.
    pub fn merge_contacting_subpaths(&mut self) {
        if self.num_subpaths < 2 {
            return;
        }
        // Gather the verb/point spans of each subpath, keyed by start.
        let mut spans: Vec<(FixedPoint, core::ops::Range<usize>, core::ops::Range<usize>)> =
            Vec::with_capacity(self.num_subpaths as usize);
        let mut verb_start = 0;
        let mut point_start = 0;
        let mut point_cursor = 0;
        let mut first = FixedPoint::ZERO;
        for (i, verb) in self.verbs.iter().enumerate() {
            match verb {
                Verb::Begin => {
                    verb_start = i;
                    point_start = point_cursor;
                    first = self.points[point_cursor];
                    point_cursor += 1;
                }
                Verb::LineTo => point_cursor += 1,
                Verb::CurveTo => point_cursor += 3,
                Verb::End { .. } => {
                    spans.push((first, verb_start..i + 1, point_start..point_cursor));
                }
            }
        }
        let mut groups: BTreeMap<(i32, i32), Vec<usize>> = BTreeMap::new();
        for (i, (start, _, _)) in spans.iter().enumerate() {
            groups
                .entry((start.x.raw(), start.y.raw()))
                .or_insert_with(Vec::new)
                .push(i);
        }
        if groups.len() == spans.len() {
            return;
        }
        let mut verbs = Vec::with_capacity(self.verbs.len());
        let mut points = Vec::with_capacity(self.points.len());
        let mut num_subpaths = 0;
        let mut merged: Vec<bool> = alloc::vec![false; spans.len()];
        for i in 0..spans.len() {
            if merged[i] {
                continue;
            }
            let start = spans[i].0;
            let group = &groups[&(start.x.raw(), start.y.raw())];
            num_subpaths += 1;
            verbs.push(Verb::Begin);
            points.push(start);
            for &j in group {
                merged[j] = true;
                let (_, jvr, jpr) = &spans[j];
                // Interior verbs, with the closer made explicit so the
                // next ring starts back at the shared vertex.
                for verb in &self.verbs[jvr.start + 1..jvr.end - 1] {
                    verbs.push(*verb);
                }
                for pt in &self.points[jpr.start + 1..jpr.end] {
                    points.push(*pt);
                }
                verbs.push(Verb::LineTo);
                points.push(start);
            }
            // The trailing explicit closer doubles as the end-of-ring.
            verbs.pop();
            points.pop();
            verbs.push(Verb::End { closed: true });
        }
        self.verbs = verbs;
        self.points = points;
        self.num_subpaths = num_subpaths;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    #[test]
    fn build_and_ring() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.line_to(point(1.0, 1.0));
        builder.end(false);
        let path = builder.build();

        let contours = path.contours();
        assert_eq!(contours.len(), 1);
        let ring = &contours[0];
        // Two explicit segments plus the synthetic closer.
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.segments[2].from, ring.segments[1].to);
        assert_eq!(ring.segments[2].to, ring.segments[0].from);
        assert_eq!(ring.next_index(2), 0);
        assert_eq!(ring.prev_index(0), 2);
    }

    #[test]
    fn rectangle_detection() {
        let mut builder = Path::builder();
        builder.begin(point(1.0, 2.0));
        builder.line_to(point(5.0, 2.0));
        builder.line_to(point(5.0, 4.0));
        builder.line_to(point(1.0, 4.0));
        builder.close();
        let path = builder.build();

        let rect = path.as_rectangle().unwrap();
        assert_eq!(rect.p, FixedPoint::from_f32(point(1.0, 2.0)));
        assert_eq!(rect.q, FixedPoint::from_f32(point(5.0, 4.0)));

        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(2.0, 0.0));
        builder.line_to(point(1.0, 2.0));
        builder.close();
        assert!(builder.build().as_rectangle().is_none());
    }

    #[test]
    fn flattening_removes_curves() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.cubic_bezier_to(point(0.0, 4.0), point(4.0, 4.0), point(4.0, 0.0));
        builder.close();
        let path = builder.build();
        assert!(path.has_curves());

        let flat = path.flattened(Fixed::from_f32(0.1)).unwrap();
        assert!(!flat.has_curves());
        let ring = &flat.contours()[0];
        assert!(ring.len() > 3);
        // Flattening preserves the endpoints.
        assert_eq!(ring.segments[0].from, FixedPoint::ZERO);
        assert_eq!(
            ring.segments[ring.len() - 2].to,
            FixedPoint::from_f32(point(4.0, 0.0))
        );
    }

    #[test]
    fn merge_subpaths_sharing_a_start() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.line_to(point(1.0, 1.0));
        builder.close();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(-1.0, 0.0));
        builder.line_to(point(-1.0, -1.0));
        builder.close();
        builder.begin(point(5.0, 5.0));
        builder.line_to(point(6.0, 5.0));
        builder.line_to(point(6.0, 6.0));
        builder.close();
        let mut path = builder.build();

        let edges_before: usize = path.contours().iter().map(|c| c.len()).sum();
        path.merge_contacting_subpaths();
        assert_eq!(path.num_subpaths(), 2);
        let edges_after: usize = path.contours().iter().map(|c| c.len()).sum();
        assert_eq!(edges_before, edges_after);
    }
}
