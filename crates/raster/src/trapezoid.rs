//! The trapezoid fill loop.
//!
//! Takes lines off of the Y list and adds them to the X list as needed,
//! walking the sweep through the path's vertical extent one band at a
//! time. Within a band, the X-ordered active list is scanned pairwise and
//! one trapezoid is emitted per inside region under the winding rule.
//!
//! The loop is monomorphized over four orthogonal flags so the per-band
//! walk never branches on them: spot analysis, smart winding, fill
//! adjustment, and direct back-end painting. `spot_into_trapezoids`
//! dispatches once per fill to the right specialization.

use crate::device::{Device, FixedEdge};
use crate::error::{FillResult, InternalError};
use crate::fill::FillParams;
use crate::intersect::intersect_al;
use crate::line_list::{Dir, LineList, NIL, X_HEAD};
use crate::path::fixed::{Fixed, FixedPoint};
use crate::path::Contour;

use arrayvec::ArrayVec;

/// Whether any pixel center lies in the adjusted band `[y, y1)`.
#[inline]
fn covering_pixel_centers(y: Fixed, y1: Fixed, adjust_below: Fixed, adjust_above: Fixed) -> bool {
    (y - adjust_below).pixround() < (y1 + adjust_above).pixround()
}

#[inline]
fn fill_rect<D: Device + ?Sized, const DIRECT: bool>(
    dev: &mut D,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
) -> FillResult {
    if w > 0 && h > 0 {
        if DIRECT {
            dev.fill_rectangle(x, y, w, h)?;
        } else {
            dev.fill_rectangle_rop(x, y, w, h)?;
        }
    }
    Ok(())
}

/// Detects curve sub-segments that went horizontal at the current sweep
/// position; the caller then advances past them by one step.
pub(crate) fn process_h_segments(ll: &LineList, y: Fixed) -> bool {
    let mut alp = ll.x_first();
    let mut found = false;
    while alp != NIL {
        let l = ll.line(alp);
        if l.start.y == y && l.end.y == y {
            found = true;
        }
        alp = l.next;
    }
    found
}

/// One piece of a slanted-trapezoid decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlantPiece {
    Trapezoid {
        left: FixedEdge,
        right: FixedEdge,
        ybot: Fixed,
        ytop: Fixed,
    },
    Rectangle {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },
}

/// Decomposes the band between a slanted pair of edges, with fill
/// adjustment, into at most three pieces: a lower adjustment trapezoid,
/// the central region, and an upper adjustment trapezoid. When the two
/// adjustment bands overlap the whole entity is less than two pixels
/// high, and a pixel-row rectangle with up to two thin trapezoids covers
/// it instead.
#[allow(clippy::too_many_arguments)]
pub(crate) fn slant_pieces(
    fp: &FillParams,
    flp_start: FixedPoint,
    flp_end: FixedPoint,
    flp_x_current: Fixed,
    flp_x_next: Fixed,
    alp_start: FixedPoint,
    alp_end: FixedPoint,
    alp_x_current: Fixed,
    alp_x_next: Fixed,
    y: Fixed,
    y1: Fixed,
) -> ArrayVec<SlantPiece, 3> {
    let yb = y - fp.adjust_below;
    let ya = y + fp.adjust_above;
    let y1b = y1 - fp.adjust_below;
    let y1a = y1 + fp.adjust_above;

    // Set up all the edges, even though not all may be needed.
    let mut slant_left = FixedEdge {
        start: FixedPoint {
            x: flp_start.x - fp.adjust_left,
            y: Fixed::ZERO,
        },
        end: FixedPoint {
            x: flp_end.x - fp.adjust_left,
            y: Fixed::ZERO,
        },
    };
    let mut slant_right = FixedEdge {
        start: FixedPoint {
            x: alp_start.x + fp.adjust_right,
            y: Fixed::ZERO,
        },
        end: FixedPoint {
            x: alp_end.x + fp.adjust_right,
            y: Fixed::ZERO,
        },
    };
    let vert_left;
    let vert_right;
    let (plbot, prbot, pltop, prtop);
    if flp_start.x < flp_end.x {
        vert_left = vertical_edge(flp_x_current - fp.adjust_left, yb, ya);
        vert_right = vertical_edge(alp_x_next + fp.adjust_right, y1b, y1a);
        slant_left.start.y = flp_start.y + fp.adjust_above;
        slant_left.end.y = flp_end.y + fp.adjust_above;
        slant_right.start.y = alp_start.y - fp.adjust_below;
        slant_right.end.y = alp_end.y - fp.adjust_below;
        plbot = vert_left;
        prbot = slant_right;
        pltop = slant_left;
        prtop = vert_right;
    } else {
        vert_left = vertical_edge(flp_x_next - fp.adjust_left, y1b, y1a);
        vert_right = vertical_edge(alp_x_current + fp.adjust_right, yb, ya);
        slant_left.start.y = flp_start.y - fp.adjust_below;
        slant_left.end.y = flp_end.y - fp.adjust_below;
        slant_right.start.y = alp_start.y + fp.adjust_above;
        slant_right.end.y = alp_end.y + fp.adjust_above;
        plbot = slant_left;
        prbot = vert_right;
        pltop = vert_left;
        prtop = slant_right;
    }

    let mut pieces = ArrayVec::new();
    if ya >= y1b {
        // The upper and lower adjustment bands overlap.
        let iyb = yb.to_pixel();
        let iya = ya.to_pixel();
        let iy1b = y1b.to_pixel();
        let iy1a = y1a.to_pixel();

        if iy1b > iyb {
            pieces.push(SlantPiece::Trapezoid {
                left: plbot,
                right: prbot,
                ybot: yb,
                ytop: y1b,
            });
        }
        if iya > iy1b {
            let ix = vert_left.start.x.to_pixel();
            let iw = vert_right.start.x.to_pixel() - ix;
            pieces.push(SlantPiece::Rectangle {
                x: ix,
                y: iy1b,
                w: iw,
                h: iya - iy1b,
            });
        }
        if iy1a > iya {
            pieces.push(SlantPiece::Trapezoid {
                left: pltop,
                right: prtop,
                ybot: ya,
                ytop: y1a,
            });
        }
    } else {
        // Clip the central trapezoid to the band box where possible; this
        // saves a lot of work when filling paths that cross band
        // boundaries.
        let yac = if fp.pbox.p.y < ya {
            pieces.push(SlantPiece::Trapezoid {
                left: plbot,
                right: prbot,
                ybot: yb,
                ytop: ya,
            });
            ya
        } else {
            fp.pbox.p.y
        };
        if fp.pbox.q.y > y1b {
            pieces.push(SlantPiece::Trapezoid {
                left: slant_left,
                right: slant_right,
                ybot: yac,
                ytop: y1b,
            });
            pieces.push(SlantPiece::Trapezoid {
                left: pltop,
                right: prtop,
                ybot: y1b,
                ytop: y1a,
            });
        } else {
            pieces.push(SlantPiece::Trapezoid {
                left: slant_left,
                right: slant_right,
                ybot: yac,
                ytop: fp.pbox.q.y,
            });
        }
    }
    pieces
}

#[inline]
fn vertical_edge(x: Fixed, ybot: Fixed, ytop: Fixed) -> FixedEdge {
    FixedEdge {
        start: FixedPoint { x, y: ybot },
        end: FixedPoint { x, y: ytop },
    }
}

fn fill_slant_adjust<D: Device + ?Sized, const DIRECT: bool>(
    dev: &mut D,
    fp: &FillParams,
    ll: &LineList,
    flp: u32,
    alp: u32,
    y: Fixed,
    y1: Fixed,
) -> FillResult {
    let fl = ll.line(flp);
    let al = ll.line(alp);
    let pieces = slant_pieces(
        fp,
        fl.start,
        fl.end,
        fl.x_current,
        fl.x_next,
        al.start,
        al.end,
        al.x_current,
        al.x_next,
        y,
        y1,
    );
    for piece in &pieces {
        match piece {
            SlantPiece::Trapezoid {
                left,
                right,
                ybot,
                ytop,
            } => {
                if ybot < ytop {
                    dev.fill_trapezoid(left, right, *ybot, *ytop, false)?;
                }
            }
            SlantPiece::Rectangle { x, y, w, h } => {
                fill_rect::<D, DIRECT>(dev, *x, *y, *w, *h)?;
            }
        }
    }
    Ok(())
}

/// The band walk itself, specialized over the template flags.
fn trap_loop<
    D: Device + ?Sized,
    const IS_SPOTAN: bool,
    const SMART: bool,
    const ADJUST: bool,
    const DIRECT: bool,
>(
    dev: &mut D,
    ll: &mut LineList,
    contours: &[Contour],
    fp: &FillParams,
    band_mask: Fixed,
) -> FillResult {
    let rule = fp.rule;
    let y_limit = fp.ymax;
    let all_bands = IS_SPOTAN;
    let adjust_left = if ADJUST { fp.adjust_left } else { Fixed::ZERO };
    let adjust_right = if ADJUST { fp.adjust_right } else { Fixed::ZERO };
    let adjust_below = if ADJUST { fp.adjust_below } else { Fixed::ZERO };
    let adjust_above = if ADJUST { fp.adjust_above } else { Fixed::ZERO };

    let mut yll = ll.y_list;
    if yll == NIL {
        // Empty list.
        return Ok(());
    }
    let mut y = ll.line(yll).start.y; // first Y value
    ll.lines[X_HEAD as usize].next = NIL;
    ll.lines[X_HEAD as usize].x_current = Fixed::MIN; // stop backward scans
    loop {
        incr!(ll.stats, band_steps);
        // Move newly active lines from the Y list to the X list.
        while yll != NIL && ll.line(yll).start.y == y {
            let ynext = ll.line(yll).next; // insertion smashes the links
            ll.y_list = ynext;
            if ll.y_line == yll {
                ll.y_line = ynext;
            }
            if ynext != NIL {
                ll.line_mut(ynext).prev = NIL;
            }
            if ll.line(yll).direction == Dir::Horizontal {
                // Paint isolated horizontal lines immediately, so they
                // cannot be lost to a zero-height trapezoid.
                let l = ll.line(yll);
                let (start, end) = (l.start, l.end);
                if !ll.h_span_painted(start, end) {
                    let yi = (y - adjust_below).to_pixel();
                    let (x0, x1) = if start.x <= end.x {
                        (start.x, end.x)
                    } else {
                        (end.x, start.x)
                    };
                    let xi = (x0 - adjust_left).to_pixel();
                    let wi = (x1 + adjust_right).to_pixel() - xi;
                    fill_rect::<D, DIRECT>(dev, xi, yi, wi, 1)?;
                }
                ll.insert_h_new(yll);
            } else {
                ll.insert_x_new(yll);
            }
            yll = ynext;
        }
        // Mustn't leave by Y before process_h_segments.
        if ll.x_first() == NIL {
            // No active lines; skip to the next start.
            if yll == NIL {
                break;
            }
            y = ll.line(yll).start.y;
            ll.h_list1 = ll.h_list0;
            ll.h_list0 = NIL;
            continue;
        }
        // Find the next evaluation point: the smallest Y at which an
        // active line ends or a waiting line begins, capped to the
        // device's preferred band height.
        let mut y1 = if yll != NIL {
            ll.line(yll).start.y
        } else {
            ll.y_break
        };
        {
            let y_band = y | Fixed::from_raw(!band_mask.raw());
            if y1 > y_band {
                y1 = y_band + Fixed::EPSILON;
            }
        }
        let mut alp = ll.x_first();
        while alp != NIL {
            if ll.line(alp).end.y < y1 {
                y1 = ll.line(alp).end.y;
            }
            alp = ll.line(alp).next;
        }
        if y == y1 {
            let flat_found = process_h_segments(ll, y);
            ll.move_al_by_y(y1, contours, fp)?;
            if flat_found {
                yll = ll.y_list;
                continue;
            }
        }
        if y >= y_limit {
            break;
        }
        // Look for line intersections before y1; they may shorten the
        // band.
        let mut covering = covering_pixel_centers(y, y1, adjust_below, adjust_above);
        if y != y1 {
            intersect_al(ll, y, &mut y1, if covering { 1 } else { -1 }, all_bands);
            covering = covering_pixel_centers(y, y1, adjust_below, adjust_above);
        }
        // Fill a multi-trapezoid band for the active lines.
        if covering || all_bands {
            incr!(ll.stats, bands);
            let mut inside: i32 = 0;
            let mut flp: u32 = NIL;
            if SMART {
                for w in ll.windings.iter_mut() {
                    *w = 0;
                }
            }
            let mut alp = ll.x_first();
            while alp != NIL {
                if (inside & rule) == 0 {
                    // Outside; check whether this edge takes us in.
                    ll.advance_winding::<SMART>(&mut inside, alp);
                    if (inside & rule) != 0 {
                        flp = alp;
                    }
                    alp = ll.line(alp).next;
                    continue;
                }
                ll.advance_winding::<SMART>(&mut inside, alp);
                if (inside & rule) != 0 {
                    // Still inside.
                    alp = ll.line(alp).next;
                    continue;
                }
                // Going from inside to outside; if the next region
                // contacts this one on a zero-width seam, unite them.
                // This simplifies the data for the spot analyzer and
                // avoids a one-pixel rounding seam, though with dropout
                // prevention it may shift which pixel a narrow trapezoid
                // picks.
                let next = ll.line(alp).next;
                if next != NIL
                    && ll.line(alp).x_current == ll.line(next).x_current
                    && ll.line(alp).x_next == ll.line(next).x_next
                {
                    ll.advance_winding::<SMART>(&mut inside, next);
                    alp = ll.line(next).next;
                    continue;
                }
                if flp == NIL {
                    return Err(InternalError::InconsistentActiveList.into());
                }
                // Fill the region between flp and alp.
                incr!(ll.stats, band_fills);
                let left_vertical = ll.line(flp).is_vertical();
                let right_vertical = ll.line(alp).is_vertical();
                if ADJUST
                    && !(left_vertical && right_vertical)
                    && !(fp.adjust_below | fp.adjust_above).is_zero()
                {
                    fill_slant_adjust::<D, DIRECT>(dev, fp, ll, flp, alp, y, y1)?;
                } else if IS_SPOTAN {
                    // Raw descriptors go to the analyzer; segment
                    // identities cannot travel through the painting
                    // interface.
                    let (y0d, y1d) = (y, y1);
                    let fl = *ll.line(flp);
                    let al = *ll.line(alp);
                    let analyzer = dev
                        .as_spot_analyzer()
                        .ok_or(InternalError::MissingSpotAnalyzer)?;
                    analyzer.store_trapezoid(
                        y0d,
                        y1d,
                        fl.x_current,
                        al.x_current,
                        fl.x_next,
                        al.x_next,
                        fl.seg,
                        al.seg,
                        fl.direction.as_i8(),
                        al.direction.as_i8(),
                    )?;
                } else if left_vertical && right_vertical {
                    let ybot;
                    let ytop;
                    if ADJUST {
                        ybot = (y - fp.adjust_below).max(fp.pbox.p.y);
                        ytop = (y1 + fp.adjust_above).min(fp.pbox.q.y);
                    } else {
                        ybot = y.max(fp.pbox.p.y);
                        ytop = y1.min(fp.pbox.q.y);
                    }
                    if ytop > ybot {
                        let yi = ybot.to_pixel();
                        let hi = ytop.to_pixel() - yi;
                        let mut xli = (ll.line(flp).end.x - adjust_left).to_pixel();
                        let mut xi = (ll.line(alp).end.x + adjust_right).to_pixel();
                        if xli == xi
                            && ADJUST
                            && !(fp.adjust_left | fp.adjust_right).is_zero()
                        {
                            // The scan is empty but something must be
                            // painted against a dropout. Choose the pixel
                            // column closer to the region.
                            let xx = Fixed::from_i32(xli);
                            if xx - ll.line(flp).end.x < ll.line(alp).end.x - xx {
                                xi += 1;
                            } else {
                                xli -= 1;
                            }
                        }
                        fill_rect::<D, DIRECT>(dev, xli, yi, xi - xli, hi)?;
                    }
                } else {
                    let ybot = y.max(fp.pbox.p.y);
                    let ytop = y1.min(fp.pbox.q.y);
                    if ybot < ytop {
                        let le = FixedEdge {
                            start: ll.line(flp).start,
                            end: ll.line(flp).end,
                        };
                        let re = FixedEdge {
                            start: ll.line(alp).start,
                            end: ll.line(alp).end,
                        };
                        dev.fill_trapezoid(&le, &re, ybot, ytop, false)?;
                    }
                }
                alp = ll.line(alp).next;
            }
        }
        ll.move_al_by_y(y1, contours, fp)?;
        ll.h_list1 = ll.h_list0;
        ll.h_list0 = NIL;
        y = y1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::fixed::FixedRect;

    fn params() -> FillParams {
        let big = Fixed::from_i32(1 << 15);
        FillParams {
            adjust_left: Fixed::HALF,
            adjust_right: Fixed::HALF,
            adjust_below: Fixed::HALF,
            adjust_above: Fixed::HALF,
            ymin: -big,
            ymax: big,
            pbox: FixedRect {
                p: FixedPoint { x: -big, y: -big },
                q: FixedPoint { x: big, y: big },
            },
            rule: -1,
            is_spotan: false,
            fill_by_trapezoids: true,
            fill_direct: true,
            fixed_flat: Fixed::ONE,
            log: false,
        }
    }

    fn fp(x: f32, y: f32) -> FixedPoint {
        FixedPoint {
            x: Fixed::from_f32(x),
            y: Fixed::from_f32(y),
        }
    }

    #[test]
    fn slant_decomposition_produces_three_contiguous_pieces() {
        let fo = params();
        let y = Fixed::ZERO;
        let y1 = Fixed::from_i32(4);
        let pieces = slant_pieces(
            &fo,
            fp(0.0, 0.0),
            fp(4.0, 4.0),
            Fixed::ZERO,
            Fixed::from_i32(4),
            fp(1.0, 0.0),
            fp(5.0, 4.0),
            Fixed::from_i32(1),
            Fixed::from_i32(5),
            y,
            y1,
        );
        assert_eq!(pieces.len(), 3);
        let mut prev_top = None;
        for piece in &pieces {
            match piece {
                SlantPiece::Trapezoid { ybot, ytop, .. } => {
                    assert!(ybot < ytop);
                    if let Some(prev) = prev_top {
                        assert_eq!(*ybot, prev, "pieces must abut without overlap");
                    } else {
                        assert_eq!(*ybot, y - fo.adjust_below);
                    }
                    prev_top = Some(*ytop);
                }
                SlantPiece::Rectangle { .. } => panic!("tall bands decompose into trapezoids"),
            }
        }
        assert_eq!(prev_top, Some(y1 + fo.adjust_above));
    }

    #[test]
    fn shallow_band_collapses_to_a_pixel_row() {
        let fo = params();
        let y = Fixed::ZERO;
        let y1 = Fixed::from_f32(0.25);
        let pieces = slant_pieces(
            &fo,
            fp(0.0, 0.0),
            fp(1.0, 1.0),
            Fixed::ZERO,
            Fixed::from_f32(0.25),
            fp(1.0, 0.0),
            fp(2.0, 1.0),
            Fixed::from_i32(1),
            Fixed::from_f32(1.25),
            y,
            y1,
        );
        assert_eq!(pieces.len(), 1);
        match pieces[0] {
            SlantPiece::Rectangle { y, h, w, .. } => {
                assert_eq!((y, h), (0, 1));
                assert!(w > 0);
            }
            SlantPiece::Trapezoid { .. } => panic!("overlapping adjustment bands use a rectangle"),
        }
    }
}

/// Main trapezoid filling entry: picks the specialization matching the
/// fill's flag vector.
pub(crate) fn spot_into_trapezoids<D: Device + ?Sized>(
    dev: &mut D,
    ll: &mut LineList,
    contours: &[Contour],
    fp: &FillParams,
    band_mask: Fixed,
) -> FillResult {
    debug_assert!(fp.fill_by_trapezoids);
    if fp.is_spotan {
        return trap_loop::<D, true, false, false, true>(dev, ll, contours, fp, band_mask);
    }
    let adjusted = !(fp.adjust_below | fp.adjust_above | fp.adjust_left | fp.adjust_right).is_zero();
    let smart = !ll.windings.is_empty();
    match (adjusted, smart, fp.fill_direct) {
        (true, _, true) => trap_loop::<D, false, false, true, true>(dev, ll, contours, fp, band_mask),
        (true, _, false) => trap_loop::<D, false, false, true, false>(dev, ll, contours, fp, band_mask),
        (false, true, true) => trap_loop::<D, false, true, false, true>(dev, ll, contours, fp, band_mask),
        (false, true, false) => trap_loop::<D, false, true, false, false>(dev, ll, contours, fp, band_mask),
        (false, false, true) => trap_loop::<D, false, false, false, true>(dev, ll, contours, fp, band_mask),
        (false, false, false) => trap_loop::<D, false, false, false, false>(dev, ll, contours, fp, band_mask),
    }
}
