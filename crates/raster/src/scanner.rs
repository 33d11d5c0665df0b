//! The contour scanner.
//!
//! Walks each closed subpath and seeds the Y-sorted waiting list with
//! exactly the edges that can contribute to the fill: a pair of down/up
//! lines at every local Y minimum, single lines where a contour enters or
//! leaves the fill's Y range, and horizontal entries for isolated
//! horizontal segments that the fill adjustment makes paintable.
//!
//! Each contour is walked twice. The backward pre-scan finds the
//! prevailing up/down direction right before the ring's anchor point (and
//! detects purely horizontal contours); the forward scan then classifies
//! every flattened sub-segment and emits the seeds.

use crate::error::{FillError, FillResult};
use crate::fill::FillParams;
use crate::line_list::{Dir, LineList};
use crate::path::fixed::Fixed;
use crate::path::flatten::{log2_samples, FlattenedIterator};
use crate::path::{Contour, SegmentId};

/// Classifies a sub-segment against the fill's Y range.
#[inline]
pub(crate) fn compute_dir(fp: &FillParams, y0: Fixed, y1: Fixed) -> Dir {
    if y0.max(y1) < fp.ymin || y0.min(y1) > fp.ymax {
        return Dir::OutOfRange;
    }
    if y0 < y1 {
        Dir::Up
    } else if y0 > y1 {
        Dir::Down
    } else {
        Dir::Horizontal
    }
}

/// A walking position on one contour segment: the flattening iterator plus
/// the classification state of its current sub-segment.
#[derive(Copy, Clone, Debug)]
struct ContourCursor {
    edge: usize,
    fi: FlattenedIterator,
    dir: Dir,
    more_flattened: bool,
    first_flattened: bool,
    monotonic_y: bool,
}

fn init_contour_cursor(
    fp: &FillParams,
    contour: &Contour,
    edge: usize,
) -> Result<ContourCursor, FillError> {
    let s = contour.segments[edge];
    let mut curve_ctrl = None;
    if let Some((c1, c2)) = s.ctrl {
        let ymin = s.from.y.min(c1.y).min(c2.y).min(s.to.y);
        let ymax = s.from.y.max(c1.y).max(c2.y).max(s.to.y);
        let in_band = ymin <= fp.ymax && ymax >= fp.ymin;
        let crossing = ymin < fp.ymin && ymax >= fp.ymin;
        let monotonic = !in_band
            || (!crossing
                && ((s.from.y <= c1.y && c1.y <= c2.y && c2.y <= s.to.y)
                    || (s.from.y >= c1.y && c1.y >= c2.y && c2.y >= s.to.y)));
        if !monotonic {
            curve_ctrl = Some((c1, c2));
        }
    }
    let monotonic_y = curve_ctrl.is_none();
    let (fi, dir) = if let Some((c1, c2)) = curve_ctrl {
        let k = log2_samples(s.from, c1, c2, s.to, fp.fixed_flat);
        let fi = FlattenedIterator::init_curve(s.from, c1, c2, s.to, k)
            .ok_or(FillError::DegenerateCurve)?;
        (fi, Dir::OutOfRange)
    } else {
        // A straight stand-in is enough for monotonic curves here; the
        // active line rebuilds the real iterator when it is seeded.
        let dir = compute_dir(fp, s.from.y, s.to.y);
        (FlattenedIterator::init_line(s.from, s.to), dir)
    };
    Ok(ContourCursor {
        edge,
        fi,
        dir,
        more_flattened: false,
        first_flattened: true,
        monotonic_y,
    })
}

/// Adds one monotonic edge (or a horizontal entry) to the Y list.
fn add_y_line(
    ll: &mut LineList,
    contour: &Contour,
    cid: u32,
    edge: usize,
    dir: Dir,
    fp: &FillParams,
) -> FillResult {
    let alp = ll.make_al();
    ll.line_mut(alp).more_flattened = false;
    ll.line_mut(alp).direction = dir;
    match dir {
        Dir::Up | Dir::Down => {
            ll.init_al(alp, contour, cid, edge, fp)?;
        }
        Dir::Horizontal => {
            let s = contour.segments[edge];
            let l = ll.line_mut(alp);
            l.start = s.from;
            l.end = s.to;
            l.seg = SegmentId {
                contour: cid,
                segment: edge as u32,
            };
        }
        Dir::OutOfRange => unreachable!(),
    }
    ll.insert_y_line(alp);
    Ok(())
}

/// Seeds an active line from an already positioned curve iterator.
fn add_y_curve_part(
    ll: &mut LineList,
    cid: u32,
    edge: usize,
    dir: Dir,
    fi: &FlattenedIterator,
    more1: bool,
    step_back: bool,
    fp: &FillParams,
) -> FillResult {
    let alp = ll.make_al();
    {
        let l = ll.line_mut(alp);
        l.direction = dir;
        l.seg = SegmentId {
            contour: cid,
            segment: edge as u32,
        };
        l.fi = *fi;
        l.more_flattened = more1;
        if dir != Dir::Up && more1 {
            l.fi.switch_to_backscan(more1);
        }
    }
    if step_back {
        loop {
            let more = {
                let l = ll.line_mut(alp);
                let more = l.fi.prev();
                l.more_flattened = more;
                more
            };
            let l = ll.line(alp);
            if compute_dir(fp, l.fi.ly0, l.fi.ly1) != Dir::OutOfRange {
                break;
            }
            if !more {
                break;
            }
        }
    }
    ll.step_al(alp, false);
    ll.insert_y_line(alp);
    Ok(())
}

/// Seeds the down/up pair rooted at a local Y minimum, where the previous
/// run `q` headed down and `p` heads up.
fn start_al_pair(
    ll: &mut LineList,
    contour: &Contour,
    cid: u32,
    q: &ContourCursor,
    p: &ContourCursor,
    fp: &FillParams,
) -> FillResult {
    if q.monotonic_y {
        add_y_line(ll, contour, cid, q.edge, Dir::Down, fp)?;
    } else {
        add_y_curve_part(ll, cid, q.edge, Dir::Down, &q.fi, !q.first_flattened, false, fp)?;
    }
    if p.monotonic_y {
        add_y_line(ll, contour, cid, p.edge, Dir::Up, fp)?;
    } else {
        add_y_curve_part(ll, cid, p.edge, Dir::Up, &p.fi, p.more_flattened, false, fp)?;
    }
    Ok(())
}

/// Walks the rest of a non-monotonic curve segment, seeding a down/up pair
/// at every interior local minimum.
///
/// The number of minima can vary with arithmetic precision; this walk does
/// not depend on it.
fn start_al_pair_from_min(
    ll: &mut LineList,
    cid: u32,
    q: &mut ContourCursor,
    fp: &FillParams,
) -> FillResult {
    // q stands at the first sub-segment, which is not the last.
    loop {
        let more = q.fi.next();
        q.more_flattened = more;
        let dir = compute_dir(fp, q.fi.ly0, q.fi.ly1);
        if q.fi.ly0 > fp.ymax && ll.y_break > q.fi.ly0 {
            ll.y_break = q.fi.ly0;
        }
        if q.fi.ly1 > fp.ymax && ll.y_break > q.fi.ly1 {
            ll.y_break = q.fi.ly1;
        }
        if q.fi.ly0 >= fp.ymin {
            if dir == Dir::Up && ll.main_dir == Dir::Down {
                add_y_curve_part(ll, cid, q.edge, Dir::Down, &q.fi, true, true, fp)?;
                add_y_curve_part(ll, cid, q.edge, Dir::Up, &q.fi, q.more_flattened, false, fp)?;
            } else if q.fi.ly1 < fp.ymin {
                add_y_curve_part(ll, cid, q.edge, Dir::Down, &q.fi, true, false, fp)?;
            }
        } else if q.fi.ly1 >= fp.ymin {
            add_y_curve_part(ll, cid, q.edge, Dir::Up, &q.fi, q.more_flattened, false, fp)?;
        }
        q.first_flattened = false;
        q.dir = dir;
        if dir == Dir::Down || dir == Dir::Up {
            ll.main_dir = dir;
        }
        if !q.more_flattened {
            break;
        }
    }
    // q stands at the last sub-segment.
    Ok(())
}

/// Whether an isolated horizontal segment at `y` colors pixels of its own
/// under the current fill adjustment.
fn horizontal_colors_pixels(fp: &FillParams, y: Fixed) -> bool {
    fp.adjust_below + fp.adjust_above >= Fixed::ONE - Fixed::EPSILON
        || (y - fp.adjust_below).pixround() < (y + fp.adjust_above).pixround()
}

fn scan_contour(ll: &mut LineList, contour: &Contour, cid: u32, fp: &FillParams) -> FillResult {
    let n = contour.len();
    let mut only_horizontal = true;
    let mut save_q: Option<ContourCursor> = None;

    // Backward pre-scan: walk the ring from its closer towards its anchor
    // until a non-horizontal, in-range run is found. Its direction becomes
    // the prevailing direction on the far side of the anchor point.
    ll.main_dir = Dir::Horizontal;
    let mut q;
    let mut q_edge = n - 1;
    loop {
        q = init_contour_cursor(fp, contour, q_edge)?;
        loop {
            let more = q.fi.next();
            q.dir = compute_dir(fp, q.fi.ly0, q.fi.ly1);
            if q.dir == Dir::Down || q.dir == Dir::Up {
                ll.main_dir = q.dir;
            }
            if !more {
                break;
            }
            q.first_flattened = false;
        }
        // first_flattened stays true iff the segment needed no subdivision.
        q.more_flattened = false;
        if ll.main_dir != Dir::Horizontal {
            only_horizontal = false;
            break;
        }
        // Remember the first in-range section so the forward scan can
        // anchor on it when the whole contour turns out horizontal.
        if save_q.is_none() && q.dir != Dir::OutOfRange {
            save_q = Some(q);
        }
        if q_edge == 0 {
            break;
        }
        q_edge -= 1;
    }
    if let Some(saved) = save_q {
        q = saved;
    }

    // Forward scan: q trails as the latest down-or-horizontal run, and a
    // down-to-up transition inside the Y range is a local minimum.
    for p_edge in 0..n {
        let s = contour.segments[p_edge];
        if !only_horizontal && s.is_degenerate() {
            continue;
        }
        let mut p = init_contour_cursor(fp, contour, p_edge)?;
        loop {
            // Find the next flattened section that is within range.
            loop {
                let more = p.fi.next();
                p.more_flattened = more;
                p.dir = compute_dir(fp, p.fi.ly0, p.fi.ly1);
                if !(p.more_flattened && p.dir == Dir::OutOfRange) {
                    break;
                }
            }
            // Track the smallest endpoint above the range so the sweep
            // can stop early.
            if p.fi.ly0 > fp.ymax && ll.y_break > p.fi.ly0 {
                ll.y_break = p.fi.ly0;
            }
            if p.fi.ly1 > fp.ymax && ll.y_break > p.fi.ly1 {
                ll.y_break = p.fi.ly1;
            }

            let mut added = false;
            if p.dir == Dir::Horizontal {
                if p.monotonic_y && horizontal_colors_pixels(fp, s.to.y) {
                    // Seed it here rather than from the fill loop, so the
                    // band walk never has to discover horizontals itself.
                    add_y_line(ll, contour, cid, p_edge, Dir::Horizontal, fp)?;
                    added = true;
                }
            } else {
                if p.fi.ly0 >= fp.ymin {
                    if p.dir == Dir::Up && ll.main_dir == Dir::Down {
                        // A local minimum; seed the pair rooted at it.
                        start_al_pair(ll, contour, cid, &q, &p, fp)?;
                        added = true;
                    } else if p.fi.ly1 < fp.ymin {
                        // Heading down out of range.
                        if p.monotonic_y {
                            add_y_line(ll, contour, cid, p_edge, Dir::Down, fp)?;
                        } else {
                            add_y_curve_part(
                                ll,
                                cid,
                                p_edge,
                                Dir::Down,
                                &p.fi,
                                !p.first_flattened,
                                false,
                                fp,
                            )?;
                        }
                        added = true;
                    }
                } else if p.fi.ly1 >= fp.ymin {
                    // Heading up into range.
                    if p.monotonic_y {
                        add_y_line(ll, contour, cid, p_edge, Dir::Up, fp)?;
                    } else {
                        add_y_curve_part(
                            ll,
                            cid,
                            p_edge,
                            Dir::Up,
                            &p.fi,
                            p.more_flattened,
                            false,
                            fp,
                        )?;
                    }
                    added = true;
                }
                if p.dir == Dir::Down || p.dir == Dir::Up {
                    ll.main_dir = p.dir;
                }
            }
            if !p.monotonic_y && p.more_flattened {
                start_al_pair_from_min(ll, cid, &mut p, fp)?;
                added = true;
            }
            if p.dir == Dir::Down || p.dir == Dir::Horizontal {
                q = p;
            }
            if added || !p.more_flattened {
                break;
            }
        }
    }
    Ok(())
}

/// Builds the Y-sorted list of active-line seeds for the whole path.
/// Horizontal lines only enter when they might color pixels of their own.
pub(crate) fn add_y_list(ll: &mut LineList, contours: &[Contour], fp: &FillParams) -> FillResult {
    ll.y_break = Fixed::MAX;
    for (cid, contour) in contours.iter().enumerate() {
        if contour.is_empty() {
            continue;
        }
        scan_contour(ll, contour, cid as u32, fp)?;
    }
    Ok(())
}
