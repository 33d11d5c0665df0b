//! The scan-line fill loop.
//!
//! The alternative to trapezoid decomposition, used when curves should be
//! painted cheaply at a coarse flatness or when a non-idempotent raster
//! operation requires every pixel to be written exactly once. The sweep
//! runs band by band like the trapezoid loop, but instead of emitting
//! trapezoids it accumulates the pixel columns covered on each sampling
//! row into a coalescing [RangeList] and flushes the row as 1-pixel-tall
//! rectangles once the sweep passes it. Coalescing guarantees the
//! write-once property.
//!
//! Row `r` samples at the pixel-center line `ys = r + 1/2`; with fill
//! adjustment the sampling window widens to `[ys - adjust_above,
//! ys + adjust_below)` of path Y values. Bands are shortened at window
//! boundaries so each band feeds exactly one row.

use crate::device::Device;
use crate::error::FillResult;
use crate::fill::FillParams;
use crate::intersect::intersect_al;
use crate::line_list::{Dir, LineList, NIL, X_HEAD};
use crate::path::fixed::Fixed;
use crate::path::Contour;
use crate::range_list::RangeList;
use crate::trapezoid::process_h_segments;

/// The sampling row whose window contains `y` or is the next one above,
/// with the window's bounds.
fn sample_window(fp: &FillParams, y: Fixed) -> (i32, Fixed, Fixed) {
    let half = Fixed::HALF;
    let r_try = (y - half + fp.adjust_above).to_i32();
    let hi = Fixed::from_i32(r_try) + half + fp.adjust_below;
    if hi > y {
        (r_try, Fixed::from_i32(r_try) + half - fp.adjust_above, hi)
    } else {
        let r = r_try + 1;
        (
            r,
            Fixed::from_i32(r) + half - fp.adjust_above,
            Fixed::from_i32(r) + half + fp.adjust_below,
        )
    }
}

/// Adds the pixel columns of every inside region of the band `[y, y1]` to
/// the range list. Region bounds take each bounding edge's whole X extent
/// over the band, so a slanted edge contributes everything it sweeps past
/// within the sampling window.
fn merge_ranges(rl: &mut RangeList, ll: &LineList, fp: &FillParams) {
    rl.rescan();
    let rule = fp.rule;
    let mut inside: i32 = 0;
    let mut flp: u32 = NIL;
    let mut alp = ll.x_first();
    while alp != NIL {
        let was_inside = (inside & rule) != 0;
        inside += ll.line(alp).direction.winding();
        let now_inside = (inside & rule) != 0;
        if !was_inside && now_inside {
            flp = alp;
        } else if was_inside && !now_inside && flp != NIL {
            let l = ll.line(flp);
            let r = ll.line(alp);
            let lx = l.x_current.min(l.x_next);
            let rx = r.x_current.max(r.x_next);
            let mut xmin = (lx - fp.adjust_left).to_pixel();
            let mut xmax = (rx + fp.adjust_right).to_pixel();
            if xmin == xmax && !(fp.adjust_left | fp.adjust_right).is_zero() {
                // A zero-width scan under adjustment still has to paint
                // something against a dropout; take the closer column.
                let xx = Fixed::from_i32(xmin);
                if xx - lx < rx - xx {
                    xmax += 1;
                } else {
                    xmin -= 1;
                }
            }
            rl.add(xmin, xmax);
        }
        alp = ll.line(alp).next;
    }
}

fn flush_row<D: Device + ?Sized, const DIRECT: bool>(
    dev: &mut D,
    rl: &mut RangeList,
    row: Option<i32>,
) -> FillResult {
    if let Some(row) = row {
        for (rmin, rmax) in rl.iter() {
            if rmax > rmin {
                if DIRECT {
                    dev.fill_rectangle(rmin, row, rmax - rmin, 1)?;
                } else {
                    dev.fill_rectangle_rop(rmin, row, rmax - rmin, 1)?;
                }
            }
        }
    }
    rl.reset();
    Ok(())
}

fn scan_loop<D: Device + ?Sized, const DIRECT: bool>(
    dev: &mut D,
    ll: &mut LineList,
    contours: &[Contour],
    fp: &FillParams,
    band_mask: Fixed,
) -> FillResult {
    let mut yll = ll.y_list;
    if yll == NIL {
        return Ok(());
    }
    let mut y = ll.line(yll).start.y;
    ll.lines[X_HEAD as usize].next = NIL;
    ll.lines[X_HEAD as usize].x_current = Fixed::MIN;
    let mut rl = RangeList::new();
    let mut cur_row: Option<i32> = None;
    loop {
        while yll != NIL && ll.line(yll).start.y == y {
            let ynext = ll.line(yll).next;
            ll.y_list = ynext;
            if ll.y_line == yll {
                ll.y_line = ynext;
            }
            if ynext != NIL {
                ll.line_mut(ynext).prev = NIL;
            }
            if ll.line(yll).direction == Dir::Horizontal {
                // Isolated horizontals paint immediately, exactly as in
                // the trapezoid loop.
                let l = ll.line(yll);
                let (start, end) = (l.start, l.end);
                if !ll.h_span_painted(start, end) {
                    let yi = (y - fp.adjust_below).to_pixel();
                    let (x0, x1) = if start.x <= end.x {
                        (start.x, end.x)
                    } else {
                        (end.x, start.x)
                    };
                    let xi = (x0 - fp.adjust_left).to_pixel();
                    let wi = (x1 + fp.adjust_right).to_pixel() - xi;
                    if wi > 0 {
                        if DIRECT {
                            dev.fill_rectangle(xi, yi, wi, 1)?;
                        } else {
                            dev.fill_rectangle_rop(xi, yi, wi, 1)?;
                        }
                    }
                }
                ll.insert_h_new(yll);
            } else {
                ll.insert_x_new(yll);
            }
            yll = ynext;
        }
        if ll.x_first() == NIL {
            flush_row::<D, DIRECT>(dev, &mut rl, cur_row)?;
            cur_row = None;
            if yll == NIL {
                break;
            }
            y = ll.line(yll).start.y;
            ll.h_list1 = ll.h_list0;
            ll.h_list0 = NIL;
            continue;
        }
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
        if y >= fp.ymax {
            break;
        }
        if y != y1 {
            // Shorten the band at the next sampling-window boundary so it
            // feeds a single row.
            let (row, win_lo, win_hi) = sample_window(fp, y);
            let boundary = if y < win_lo { win_lo } else { win_hi };
            if y1 > boundary {
                y1 = boundary;
            }
            intersect_al(ll, y, &mut y1, 1, false);
            if y < win_hi && y1 >= win_lo {
                if cur_row != Some(row) {
                    flush_row::<D, DIRECT>(dev, &mut rl, cur_row)?;
                    cur_row = Some(row);
                }
                merge_ranges(&mut rl, ll, fp);
            }
        }
        ll.move_al_by_y(y1, contours, fp)?;
        ll.h_list1 = ll.h_list0;
        ll.h_list0 = NIL;
        y = y1;
    }
    flush_row::<D, DIRECT>(dev, &mut rl, cur_row)?;
    Ok(())
}

/// Scan-line filling entry; only the direct/non-direct painting choice is
/// specialized here.
pub(crate) fn spot_into_scan_lines<D: Device + ?Sized>(
    dev: &mut D,
    ll: &mut LineList,
    contours: &[Contour],
    fp: &FillParams,
    band_mask: Fixed,
) -> FillResult {
    debug_assert!(!fp.fill_by_trapezoids);
    if fp.fill_direct {
        scan_loop::<D, true>(dev, ll, contours, fp, band_mask)
    } else {
        scan_loop::<D, false>(dev, ll, contours, fp, band_mask)
    }
}
