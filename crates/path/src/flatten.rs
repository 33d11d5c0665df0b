//! Piecewise-linear enumeration of path segments.
//!
//! A [FlattenedIterator] walks one path segment as a sequence of straight
//! sub-segments: a line yields exactly one, a cubic bézier yields `2^k`
//! chords sampled at dyadic parameters. The iterator can step forward,
//! step backward, and switch to a backward scan after a forward pre-scan,
//! which is what the scan converter needs to walk the two sides of a
//! non-monotonic curve in increasing Y.
//!
//! Chord endpoints are evaluated with exact 64 bit de Casteljau steps so
//! that forward and backward enumeration produce bit-identical points.

use crate::fixed::{Fixed, FixedPoint};

/// Coordinates above this magnitude cannot be subdivided safely.
const COORD_LIMIT: i32 = i32::MAX / 2;

/// Maximum subdivision level: 2^16 chords per curve.
pub const MAX_LOG2_SAMPLES: u32 = 16;

/// Enumerates the straight sub-segments of one path segment.
///
/// The current chord runs from `(lx0, ly0)` to `(lx1, ly1)`; `(x0, y0)` and
/// `(x3, y3)` are the whole segment's endpoints.
#[derive(Copy, Clone, Debug)]
pub struct FlattenedIterator {
    pub x0: Fixed,
    pub y0: Fixed,
    pub x3: Fixed,
    pub y3: Fixed,
    pub lx0: Fixed,
    pub ly0: Fixed,
    pub lx1: Fixed,
    pub ly1: Fixed,
    /// False when the segment is a single straight line.
    pub curve: bool,
    cx1: Fixed,
    cy1: Fixed,
    cx2: Fixed,
    cy2: Fixed,
    k: u32,
    count: u32,
    // The current chord is [i - 1, i] in dyadic steps; 0 before the first
    // call to next().
    i: u32,
}

#[inline]
fn lerp(a: Fixed, b: Fixed, num: u32, k: u32) -> Fixed {
    let d = i64::from(b.raw()) - i64::from(a.raw());
    Fixed::from_raw((i64::from(a.raw()) + ((d * i64::from(num)) >> k)) as i32)
}

impl FlattenedIterator {
    /// Seeds the iterator with a single straight sub-segment. The chord is
    /// immediately valid.
    pub fn init_line(from: FixedPoint, to: FixedPoint) -> Self {
        FlattenedIterator {
            x0: from.x,
            y0: from.y,
            x3: to.x,
            y3: to.y,
            lx0: from.x,
            ly0: from.y,
            lx1: to.x,
            ly1: to.y,
            curve: false,
            cx1: from.x,
            cy1: from.y,
            cx2: to.x,
            cy2: to.y,
            k: 0,
            count: 1,
            i: 0,
        }
    }

    /// Seeds the iterator at subdivision level `k` over a cubic bézier.
    /// Returns `None` when the control polygon exceeds the subdividable
    /// coordinate range. The first chord becomes valid after `next()`.
    pub fn init_curve(
        from: FixedPoint,
        ctrl1: FixedPoint,
        ctrl2: FixedPoint,
        to: FixedPoint,
        k: u32,
    ) -> Option<Self> {
        for p in &[from, ctrl1, ctrl2, to] {
            if p.x.raw().wrapping_abs() > COORD_LIMIT || p.y.raw().wrapping_abs() > COORD_LIMIT {
                return None;
            }
        }
        let k = k.min(MAX_LOG2_SAMPLES);
        Some(FlattenedIterator {
            x0: from.x,
            y0: from.y,
            x3: to.x,
            y3: to.y,
            lx0: from.x,
            ly0: from.y,
            lx1: from.x,
            ly1: from.y,
            curve: true,
            cx1: ctrl1.x,
            cy1: ctrl1.y,
            cx2: ctrl2.x,
            cy2: ctrl2.y,
            k,
            count: 1 << k,
            i: 0,
        })
    }

    /// The curve point at dyadic parameter `num / 2^k`, by de Casteljau
    /// with exact 64 bit interpolation steps.
    fn point_at(&self, num: u32) -> FixedPoint {
        if num == 0 {
            return FixedPoint {
                x: self.x0,
                y: self.y0,
            };
        }
        if num == self.count {
            return FixedPoint {
                x: self.x3,
                y: self.y3,
            };
        }
        let k = self.k;
        let ax = lerp(self.x0, self.cx1, num, k);
        let ay = lerp(self.y0, self.cy1, num, k);
        let bx = lerp(self.cx1, self.cx2, num, k);
        let by = lerp(self.cy1, self.cy2, num, k);
        let cx = lerp(self.cx2, self.x3, num, k);
        let cy = lerp(self.cy2, self.y3, num, k);
        let abx = lerp(ax, bx, num, k);
        let aby = lerp(ay, by, num, k);
        let bcx = lerp(bx, cx, num, k);
        let bcy = lerp(by, cy, num, k);
        FixedPoint {
            x: lerp(abx, bcx, num, k),
            y: lerp(aby, bcy, num, k),
        }
    }

    #[inline]
    fn load_chord(&mut self) {
        let p0 = self.point_at(self.i - 1);
        let p1 = self.point_at(self.i);
        self.lx0 = p0.x;
        self.ly0 = p0.y;
        self.lx1 = p1.x;
        self.ly1 = p1.y;
    }

    /// Advances to the next sub-segment. Returns whether more sub-segments
    /// remain after it.
    pub fn next(&mut self) -> bool {
        if !self.curve {
            self.i = 1;
            return false;
        }
        if self.i < self.count {
            self.i += 1;
            self.load_chord();
        }
        self.i < self.count
    }

    /// Steps back to the previous sub-segment. Returns whether more
    /// sub-segments remain before it.
    pub fn prev(&mut self) -> bool {
        debug_assert!(self.curve);
        if self.i > 1 {
            self.i -= 1;
            self.load_chord();
        }
        self.i > 1
    }

    /// Repositions for backward enumeration after a forward pre-scan.
    ///
    /// Dyadic evaluation is position-independent, so there is no state to
    /// rebuild; the current chord stays valid and `prev()` walks back from
    /// it.
    pub fn switch_to_backscan(&mut self, _more: bool) {
        debug_assert!(self.curve);
    }
}

/// The subdivision level needed to keep chords of the given cubic within
/// `flatness` of the curve.
///
/// Uses the control-polygon deviation `max(|3c1 - 2p0 - p3|, |3c2 - 2p3 -
/// p0|)` (component-wise), which shrinks by a factor of four per
/// subdivision level.
pub fn log2_samples(
    from: FixedPoint,
    ctrl1: FixedPoint,
    ctrl2: FixedPoint,
    to: FixedPoint,
    flatness: Fixed,
) -> u32 {
    let dev = |c: Fixed, a: Fixed, b: Fixed| -> i64 {
        (3 * i64::from(c.raw()) - 2 * i64::from(a.raw()) - i64::from(b.raw())).abs()
    };
    let mut d = dev(ctrl1.x, from.x, to.x)
        .max(dev(ctrl1.y, from.y, to.y))
        .max(dev(ctrl2.x, to.x, from.x))
        .max(dev(ctrl2.y, to.y, from.y));
    let flat = i64::from(flatness.raw().max(1));
    let mut k = 0;
    while d > flat && k < MAX_LOG2_SAMPLES {
        d >>= 2;
        k += 1;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed_point;
    use alloc::vec::Vec;

    fn fp(x: f32, y: f32) -> FixedPoint {
        fixed_point(Fixed::from_f32(x), Fixed::from_f32(y))
    }

    #[test]
    fn line_yields_one_chord() {
        let mut fi = FlattenedIterator::init_line(fp(0.0, 0.0), fp(3.0, 4.0));
        assert!(!fi.curve);
        assert_eq!((fi.lx0, fi.ly0), (Fixed::ZERO, Fixed::ZERO));
        assert_eq!(fi.lx1, Fixed::from_i32(3));
        assert!(!fi.next());
        assert_eq!(fi.lx1, Fixed::from_i32(3));
    }

    #[test]
    fn curve_chords_join_and_hit_endpoints() {
        let mut fi =
            FlattenedIterator::init_curve(fp(0.0, 0.0), fp(1.0, 2.0), fp(3.0, 2.0), fp(4.0, 0.0), 3)
                .unwrap();
        let mut prev_end = (Fixed::ZERO, Fixed::ZERO);
        let mut n = 0;
        loop {
            let more = fi.next();
            assert_eq!((fi.lx0, fi.ly0), prev_end);
            prev_end = (fi.lx1, fi.ly1);
            n += 1;
            if !more {
                break;
            }
        }
        assert_eq!(n, 8);
        assert_eq!(prev_end, (Fixed::from_i32(4), Fixed::ZERO));
    }

    #[test]
    fn backward_scan_reproduces_forward_chords() {
        let mut fi =
            FlattenedIterator::init_curve(fp(0.0, 0.0), fp(0.0, 3.0), fp(3.0, 3.0), fp(3.0, 0.0), 2)
                .unwrap();
        let mut forward = Vec::new();
        loop {
            let more = fi.next();
            forward.push((fi.lx0, fi.ly0, fi.lx1, fi.ly1));
            if !more {
                break;
            }
        }
        fi.switch_to_backscan(false);
        let mut backward = Vec::new();
        backward.push((fi.lx0, fi.ly0, fi.lx1, fi.ly1));
        loop {
            let more = fi.prev();
            backward.push((fi.lx0, fi.ly0, fi.lx1, fi.ly1));
            if !more {
                break;
            }
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn degenerate_coordinates_are_rejected() {
        let huge = fixed_point(Fixed::from_raw(i32::MAX - 1), Fixed::ZERO);
        assert!(
            FlattenedIterator::init_curve(fp(0.0, 0.0), huge, fp(1.0, 1.0), fp(2.0, 2.0), 4)
                .is_none()
        );
    }

    #[test]
    fn flatness_drives_subdivision() {
        let p0 = fp(0.0, 0.0);
        let c1 = fp(0.0, 16.0);
        let c2 = fp(16.0, 16.0);
        let p3 = fp(16.0, 0.0);
        let coarse = log2_samples(p0, c1, c2, p3, Fixed::from_i32(16));
        let fine = log2_samples(p0, c1, c2, p3, Fixed::EPSILON);
        assert!(coarse < fine);
        assert!(fine <= MAX_LOG2_SAMPLES);
        // A straight control polygon needs no subdivision at a loose
        // tolerance.
        let line = log2_samples(fp(0.0, 0.0), fp(1.0, 1.0), fp(2.0, 2.0), fp(3.0, 3.0), Fixed::ONE);
        assert_eq!(line, 0);
    }
}
