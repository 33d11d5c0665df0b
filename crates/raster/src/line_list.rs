//! Active line management.
//!
//! During a fill, every edge currently crossed by the sweep line is an
//! [ActiveLine]. The lines live in a per-fill arena indexed by `u32`, with
//! the X-ordered list threaded through `prev`/`next` links behind a
//! permanently resident head whose `x_current` is the negative saturation
//! value, so backward walks terminate without an end test. Slot 0 of the
//! arena is that sentinel.
//!
//! Lines waiting for the sweep to reach them sit in the Y-sorted list;
//! horizontal edges get their own list, rotated once per band.

use crate::error::{FillError, FillResult};
use crate::fill::FillParams;
use crate::path::fixed::{Fixed, FixedPoint};
use crate::path::flatten::{log2_samples, FlattenedIterator};
use crate::path::{Contour, SegmentId};

use alloc::vec::Vec;

pub(crate) const NIL: u32 = u32::MAX;
pub(crate) const X_HEAD: u32 = 0;

/// Arena capacity reserved up front; typical fills never allocate past it.
const MAX_LOCAL_ACTIVE: usize = 20;

/// The direction of an edge with respect to the sweep, or its
/// classification against the fill's Y range during contour scanning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Down,
    Horizontal,
    Up,
    /// Entirely outside `ymin..ymax`; only used while scanning contours.
    OutOfRange,
}

impl Dir {
    /// The winding contribution of an edge crossing: +1 up, -1 down.
    #[inline]
    pub fn winding(self) -> i32 {
        match self {
            Dir::Up => 1,
            Dir::Down => -1,
            _ => 0,
        }
    }

    #[inline]
    pub fn as_i8(self) -> i8 {
        self.winding() as i8
    }
}

/// The signed even-odd parity of a per-contour winding counter.
#[inline]
fn signed_eo(a: i32) -> i32 {
    if a < 0 {
        -(a & 1)
    } else if a > 0 {
        a & 1
    } else {
        0
    }
}

/// An edge currently crossed by the sweep line, monotonically increasing
/// in Y. `start.y <= end.y` always holds; horizontal edges never enter the
/// X list.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ActiveLine {
    pub start: FixedPoint,
    pub end: FixedPoint,
    pub diff: FixedPoint,
    /// X at the current sweep Y.
    pub x_current: Fixed,
    /// X at the proposed band top.
    pub x_next: Fixed,
    pub direction: Dir,
    /// Whether the embedded iterator has more sub-segments to deliver;
    /// true while a curve is being expanded chord by chord.
    pub more_flattened: bool,
    /// The contour segment this line currently lies on.
    pub seg: SegmentId,
    /// Owned by value; never aliases another line's iterator.
    pub fi: FlattenedIterator,
    pub prev: u32,
    pub next: u32,
}

impl ActiveLine {
    fn new() -> Self {
        ActiveLine {
            start: FixedPoint::ZERO,
            end: FixedPoint::ZERO,
            diff: FixedPoint::ZERO,
            x_current: Fixed::ZERO,
            x_next: Fixed::ZERO,
            direction: Dir::Horizontal,
            more_flattened: false,
            seg: SegmentId {
                contour: 0,
                segment: 0,
            },
            fi: FlattenedIterator::init_line(FixedPoint::ZERO, FixedPoint::ZERO),
            prev: NIL,
            next: NIL,
        }
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.end.x == self.start.x
    }

    /// The X coordinate of this line at `y`, which must lie within
    /// `[start.y, end.y]`.
    pub fn x_at_y(&self, y: Fixed) -> Fixed {
        if y == self.end.y {
            self.end.x
        } else {
            debug_assert!(!self.diff.y.is_zero());
            self.start.x + self.diff.x.mul_div(y - self.start.y, self.diff.y)
        }
    }
}

#[cfg(feature = "profiling")]
#[derive(Clone, Debug, Default)]
pub struct FillStats {
    pub bands: u64,
    pub band_steps: u64,
    pub band_fills: u64,
    pub crossings: u64,
}

/// The master container for one fill: the active-line arena, the Y-sorted
/// waiting list, the X-ordered active list, the horizontal lists and the
/// per-contour winding counters.
pub(crate) struct LineList {
    pub lines: Vec<ActiveLine>,
    /// Head of the Y-sorted waiting list.
    pub y_list: u32,
    /// Insertion cursor into the Y list; starts tend to arrive nearly
    /// sorted.
    pub y_line: u32,
    /// Horizontal edges seen in the current band, and in the previous one.
    pub h_list0: u32,
    pub h_list1: u32,
    /// Per-contour winding counters; empty unless smart winding is on.
    pub windings: Vec<i32>,
    /// The prevailing up/down direction while scanning a contour.
    pub main_dir: Dir,
    /// The lowest Y above the fill range; the sweep can stop there.
    pub y_break: Fixed,
    #[cfg(feature = "profiling")]
    pub stats: FillStats,
}

impl LineList {
    pub fn new() -> Self {
        let mut lines = Vec::with_capacity(MAX_LOCAL_ACTIVE);
        let mut head = ActiveLine::new();
        head.x_current = Fixed::MIN;
        lines.push(head);
        LineList {
            lines,
            y_list: NIL,
            y_line: NIL,
            h_list0: NIL,
            h_list1: NIL,
            windings: Vec::new(),
            main_dir: Dir::Horizontal,
            y_break: Fixed::MAX,
            #[cfg(feature = "profiling")]
            stats: FillStats::default(),
        }
    }

    #[inline]
    pub fn x_first(&self) -> u32 {
        self.lines[X_HEAD as usize].next
    }

    #[inline]
    pub fn line(&self, i: u32) -> &ActiveLine {
        &self.lines[i as usize]
    }

    #[inline]
    pub fn line_mut(&mut self, i: u32) -> &mut ActiveLine {
        &mut self.lines[i as usize]
    }

    /// Allocates a fresh active line slot.
    pub fn make_al(&mut self) -> u32 {
        self.lines.push(ActiveLine::new());
        (self.lines.len() - 1) as u32
    }

    /// Advances the winding state for an edge crossing, either with the
    /// single counter or, for smart winding, with the per-contour
    /// even-odd intersection.
    #[inline]
    pub fn advance_winding<const SMART: bool>(&mut self, inside: &mut i32, alp: u32) {
        if SMART {
            let k = self.lines[alp as usize].seg.contour as usize;
            let dir = self.lines[alp as usize].direction.winding();
            let v = self.windings[k];
            *inside -= signed_eo(v);
            let v = v + dir;
            self.windings[k] = v;
            *inside += signed_eo(v);
        } else {
            *inside += self.lines[alp as usize].direction.winding();
        }
    }

    /// Orders two active lines that overlap in Y: which is to the left at
    /// Y values just above the current one. Returns -1, 0 or 1.
    ///
    /// Tolerates a missing line (degenerate paths that reach beyond the
    /// coordinate space); absent compares as leftmost.
    pub fn x_order(&self, lp1: u32, lp2: u32) -> i32 {
        if lp1 == NIL || lp2 == NIL {
            return -1;
        }
        let l1 = &self.lines[lp1 as usize];
        let l2 = &self.lines[lp2 as usize];
        if l1.x_current < l2.x_current {
            return -1;
        }
        if l1.x_current > l2.x_current {
            return 1;
        }
        // Same X: order by slope. Check the fast case where the slopes
        // have opposite signs first.
        let s1 = l1.start.x < l1.end.x;
        if s1 != (l2.start.x < l2.end.x) {
            return if s1 { 1 } else { -1 };
        }
        // We want the sign of dx1/dy1 - dx2/dy2, and both dy are
        // positive, so of dx1*dy2 - dx2*dy1. The products need more than
        // 64 bits for the widest coordinates, so use 128 and stay exact.
        let dx1 = i128::from(l1.diff.x.raw());
        let dy1 = i128::from(l1.diff.y.raw());
        let dx2 = i128::from(l2.diff.x.raw());
        let dy2 = i128::from(l2.diff.y.raw());
        let diff = dx1 * dy2 - dx2 * dy1;
        if diff < 0 {
            -1
        } else if diff > 0 {
            1
        } else {
            0
        }
    }

    /// Inserts a new line in the Y ordering, starting the walk at the
    /// previous insertion point.
    pub fn insert_y_line(&mut self, alp: u32) {
        let y_start = self.lines[alp as usize].start.y;
        let yp = self.y_line;
        if yp == NIL {
            self.lines[alp as usize].next = NIL;
            self.lines[alp as usize].prev = NIL;
            self.y_list = alp;
        } else if y_start >= self.lines[yp as usize].start.y {
            // Insert after the cursor.
            let mut yp = yp;
            loop {
                let nyp = self.lines[yp as usize].next;
                if nyp == NIL || y_start <= self.lines[nyp as usize].start.y {
                    self.lines[alp as usize].next = nyp;
                    self.lines[alp as usize].prev = yp;
                    self.lines[yp as usize].next = alp;
                    if nyp != NIL {
                        self.lines[nyp as usize].prev = alp;
                    }
                    break;
                }
                yp = nyp;
            }
        } else {
            // Insert before the cursor.
            let mut yp = yp;
            loop {
                let nyp = self.lines[yp as usize].prev;
                if nyp == NIL || y_start >= self.lines[nyp as usize].start.y {
                    self.lines[alp as usize].prev = nyp;
                    self.lines[alp as usize].next = yp;
                    self.lines[yp as usize].prev = alp;
                    if nyp != NIL {
                        self.lines[nyp as usize].next = alp;
                    } else {
                        self.y_list = alp;
                    }
                    break;
                }
                yp = nyp;
            }
        }
        self.y_line = alp;
    }

    /// Inserts a newly active line in the X ordering, scanning forward
    /// from the sentinel head.
    pub fn insert_x_new(&mut self, alp: u32) {
        let start_x = self.lines[alp as usize].start.x;
        // Both are needed so resort works when the spot starts with a
        // horizontal segment.
        self.lines[alp as usize].x_current = start_x;
        self.lines[alp as usize].x_next = start_x;
        let mut prev = X_HEAD;
        loop {
            let next = self.lines[prev as usize].next;
            if next == NIL || self.x_order(next, alp) >= 0 {
                self.lines[alp as usize].next = next;
                self.lines[alp as usize].prev = prev;
                if next != NIL {
                    self.lines[next as usize].prev = alp;
                }
                self.lines[prev as usize].next = alp;
                break;
            }
            prev = next;
        }
    }

    /// Pushes a horizontal line onto the current band's list. The list is
    /// unordered; X intervals may overlap.
    pub fn insert_h_new(&mut self, alp: u32) {
        self.lines[alp as usize].next = self.h_list0;
        self.lines[alp as usize].prev = NIL;
        if self.h_list0 != NIL {
            self.lines[self.h_list0 as usize].prev = alp;
        }
        self.h_list0 = alp;
    }

    /// Whether a horizontal span with these endpoints was already painted
    /// in the current or the previous band. A degenerate loop lists the
    /// same horizontal from both of its sides; painting it once is enough.
    pub fn h_span_painted(&self, start: FixedPoint, end: FixedPoint) -> bool {
        let (lo, hi) = if start.x <= end.x {
            (start, end)
        } else {
            (end, start)
        };
        for &head in &[self.h_list0, self.h_list1] {
            let mut alp = head;
            while alp != NIL {
                let l = &self.lines[alp as usize];
                let (l_lo, l_hi) = if l.start.x <= l.end.x {
                    (l.start, l.end)
                } else {
                    (l.end, l.start)
                };
                if l_lo == lo && l_hi == hi {
                    return true;
                }
                alp = l.next;
            }
        }
        false
    }

    /// Unlinks a line from the X list.
    pub fn remove_al(&mut self, alp: u32) {
        let prev = self.lines[alp as usize].prev;
        let next = self.lines[alp as usize].next;
        self.lines[prev as usize].next = next;
        if next != NIL {
            self.lines[next as usize].prev = prev;
        }
    }

    /// Re-sorts the X list by moving `alp` backward to its proper spot.
    pub fn resort_x_line(&mut self, alp: u32) {
        let mut prev = self.lines[alp as usize].prev;
        let mut next = self.lines[alp as usize].next;
        self.lines[prev as usize].next = next;
        if next != NIL {
            self.lines[next as usize].prev = prev;
        }
        while self.x_order(prev, alp) > 0 {
            next = prev;
            prev = self.lines[prev as usize].prev;
        }
        self.lines[alp as usize].next = next;
        self.lines[alp as usize].prev = prev;
        // next might be NIL if alp was in the correct spot already.
        if next != NIL {
            self.lines[next as usize].prev = alp;
        }
        // prev can be missing if the path reaches (beyond) the extent of
        // the coordinate space.
        if prev != NIL {
            self.lines[prev as usize].next = alp;
        }
    }

    /// Loads the current sub-segment of the embedded iterator into the
    /// line, advancing the iterator first when requested. Down edges read
    /// the chord reversed so `start.y <= end.y` keeps holding.
    pub fn step_al(&mut self, alp: u32, move_iterator: bool) {
        let l = &mut self.lines[alp as usize];
        let forth = l.direction == Dir::Up || !l.fi.curve;
        if move_iterator {
            let more = if forth { l.fi.next() } else { l.fi.prev() };
            l.more_flattened = more;
        }
        // ly0 == ly1 happens when the curve tangent is horizontal.
        if forth {
            l.start = FixedPoint {
                x: l.fi.lx0,
                y: l.fi.ly0,
            };
            l.end = FixedPoint {
                x: l.fi.lx1,
                y: l.fi.ly1,
            };
        } else {
            l.start = FixedPoint {
                x: l.fi.lx1,
                y: l.fi.ly1,
            };
            l.end = FixedPoint {
                x: l.fi.lx0,
                y: l.fi.ly0,
            };
        }
        l.diff = FixedPoint {
            x: l.end.x - l.start.x,
            y: l.end.y - l.start.y,
        };
    }

    /// (Re)initializes `alp` on the given contour segment, according to the
    /// line's direction. Down edges walk the segment's flattening
    /// backwards after a forward pre-scan.
    pub fn init_al(
        &mut self,
        alp: u32,
        contour: &Contour,
        cid: u32,
        edge: usize,
        fp: &FillParams,
    ) -> FillResult {
        let s = contour.segments[edge];
        let direction = self.lines[alp as usize].direction;
        if let Some((ctrl1, ctrl2)) = s.ctrl {
            let k = log2_samples(s.from, ctrl1, ctrl2, s.to, fp.fixed_flat);
            let mut fi = FlattenedIterator::init_curve(s.from, ctrl1, ctrl2, s.to, k)
                .ok_or(FillError::DegenerateCurve)?;
            if direction == Dir::Up {
                self.lines[alp as usize].fi = fi;
                self.step_al(alp, true);
            } else {
                let mut more_any = false;
                loop {
                    let more = fi.next();
                    more_any |= more;
                    if !more {
                        break;
                    }
                }
                fi.switch_to_backscan(more_any);
                self.lines[alp as usize].fi = fi;
                self.lines[alp as usize].more_flattened = more_any;
                self.step_al(alp, false);
            }
        } else {
            // Down lines are iterated from their endpoint back to their
            // anchor so the chord ascends in Y.
            let (a, b) = if direction == Dir::Up {
                (s.from, s.to)
            } else {
                (s.to, s.from)
            };
            self.lines[alp as usize].fi = FlattenedIterator::init_line(a, b);
            self.step_al(alp, true);
        }
        self.lines[alp as usize].seg = SegmentId {
            contour: cid,
            segment: edge as u32,
        };
        Ok(())
    }

    /// Handles a line that just ended: splice in the next contour segment
    /// in the walking direction, or drop the line when the walk passed the
    /// top of the subpath loop. Returns whether the line was removed.
    pub fn end_x_line(&mut self, alp: u32, contours: &[Contour], fp: &FillParams) -> Result<bool, FillError> {
        {
            let l = &self.lines[alp as usize];
            if l.end.y < l.start.y {
                // A horizontal part of a curve near a Y maximum can be
                // scanned from both spot boundaries; dropping it here
                // keeps the raster independent of that.
                self.remove_al(alp);
                return Ok(true);
            }
            if l.more_flattened {
                return Ok(false);
            }
        }
        let sid = self.lines[alp as usize].seg;
        let direction = self.lines[alp as usize].direction;
        let contour = &contours[sid.contour as usize];
        // All subpaths are closed rings, so walking wraps around without
        // visiting the anchor point twice.
        let next_edge = if direction == Dir::Up {
            contour.next_index(sid.segment as usize)
        } else {
            contour.prev_index(sid.segment as usize)
        };
        self.init_al(alp, contour, sid.contour, next_edge, fp)?;
        let l = &self.lines[alp as usize];
        if l.start.y > l.end.y {
            self.remove_al(alp);
            return Ok(true);
        }
        let start_x = l.start.x;
        let l = &mut self.lines[alp as usize];
        l.x_current = start_x;
        l.x_next = start_x;
        Ok(false)
    }

    /// Advances every active line to `y1`, stepping iterators, splicing
    /// follow-up segments and restoring the X order.
    pub fn move_al_by_y(&mut self, y1: Fixed, contours: &[Contour], fp: &FillParams) -> FillResult {
        let mut x = Fixed::MIN;
        let mut alp = self.x_first();
        while alp != NIL {
            let nlp = self.lines[alp as usize].next;
            let mut notend = false;
            {
                let l = &mut self.lines[alp as usize];
                l.x_current = l.x_next;
            }
            if self.lines[alp as usize].end.y == y1 && self.lines[alp as usize].more_flattened {
                self.step_al(alp, true);
                let l = &mut self.lines[alp as usize];
                l.x_current = l.start.x;
                l.x_next = l.start.x;
                notend = l.end.y >= l.start.y;
            }
            let keep = self.lines[alp as usize].end.y > y1 || notend;
            if keep {
                if self.lines[alp as usize].x_next <= x {
                    self.resort_x_line(alp);
                } else {
                    x = self.lines[alp as usize].x_next;
                }
            } else {
                let removed = self.end_x_line(alp, contours, fp)?;
                if !removed {
                    if self.lines[alp as usize].x_next <= x {
                        self.resort_x_line(alp);
                    } else {
                        x = self.lines[alp as usize].x_next;
                    }
                }
            }
            alp = nlp;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(x: f32, y: f32) -> FixedPoint {
        FixedPoint {
            x: Fixed::from_f32(x),
            y: Fixed::from_f32(y),
        }
    }

    fn fake_line(ll: &mut LineList, start: FixedPoint, end: FixedPoint) -> u32 {
        let alp = ll.make_al();
        let l = ll.line_mut(alp);
        l.start = start;
        l.end = end;
        l.diff = FixedPoint {
            x: end.x - start.x,
            y: end.y - start.y,
        };
        l.x_current = start.x;
        l.direction = Dir::Up;
        alp
    }

    #[test]
    fn x_order_prefers_smaller_current_x() {
        let mut ll = LineList::new();
        let a = fake_line(&mut ll, fp(1.0, 0.0), fp(1.0, 4.0));
        let b = fake_line(&mut ll, fp(2.0, 0.0), fp(2.0, 4.0));
        assert_eq!(ll.x_order(a, b), -1);
        assert_eq!(ll.x_order(b, a), 1);
        // A missing line compares as leftmost.
        assert_eq!(ll.x_order(NIL, a), -1);
    }

    #[test]
    fn x_order_breaks_ties_by_slope() {
        let mut ll = LineList::new();
        // Same X at the shared start; the edge heading left must precede
        // the one heading right, and a steeper rightward edge precedes a
        // shallower one.
        let leftward = fake_line(&mut ll, fp(3.0, 0.0), fp(1.0, 4.0));
        let steep = fake_line(&mut ll, fp(3.0, 0.0), fp(4.0, 4.0));
        let shallow = fake_line(&mut ll, fp(3.0, 0.0), fp(7.0, 4.0));
        assert_eq!(ll.x_order(leftward, steep), -1);
        assert_eq!(ll.x_order(steep, shallow), -1);
        assert_eq!(ll.x_order(shallow, leftward), 1);
        assert_eq!(ll.x_order(steep, steep), 0);
    }

    #[test]
    fn insert_and_resort_preserve_x_order() {
        let mut ll = LineList::new();
        let a = fake_line(&mut ll, fp(5.0, 0.0), fp(5.0, 4.0));
        let b = fake_line(&mut ll, fp(1.0, 0.0), fp(1.0, 4.0));
        let c = fake_line(&mut ll, fp(3.0, 0.0), fp(3.0, 4.0));
        ll.lines[X_HEAD as usize].next = NIL;
        ll.lines[X_HEAD as usize].x_current = Fixed::MIN;
        ll.insert_x_new(a);
        ll.insert_x_new(b);
        ll.insert_x_new(c);
        assert_eq!(ll.x_first(), b);
        assert_eq!(ll.line(b).next, c);
        assert_eq!(ll.line(c).next, a);

        // Move the rightmost line to the far left and re-sort it.
        ll.line_mut(a).x_current = Fixed::from_f32(0.0);
        ll.resort_x_line(a);
        assert_eq!(ll.x_first(), a);
        assert_eq!(ll.line(a).next, b);
        assert_eq!(ll.line(b).next, c);
        assert_eq!(ll.line(c).next, NIL);
    }
}
