//! The edge-intersection resolver.
//!
//! Before a band `[y, y1)` is painted, any pair of active edges that would
//! swap X order inside it shortens the band to the earliest crossing, and
//! both edges get the same `x_next` at the crossing so the X order stays
//! total. Coincident triples are coalesced afterwards with a weighted
//! average in which near-vertical edges dominate and exactly vertical
//! edges take priority.

use crate::line_list::{ActiveLine, LineList, NIL};
use crate::path::fixed::Fixed;

/// Finds a crossing of two adjacent active lines within `[y, y1]`, given
/// that `x_current` and `x_next` are valid for `y` and `y1`. Returns the
/// crossing Y, which is kept strictly above `y`.
fn intersect(endp: &ActiveLine, alp: &ActiveLine, y: Fixed, y1: Fixed) -> Option<Fixed> {
    let dx_old = alp.x_current - endp.x_current;
    let dx_den = dx_old + endp.x_next - alp.x_next;

    if dx_den <= dx_old || dx_den.is_zero() {
        // The intersection is not possible.
        return None;
    }
    let dy = y1 - y;
    // The crossing value does not have to be very accurate, but it does
    // have to be greater than y and less than y1.
    let mut y_new = dy.mul_div(dx_old, dx_den) + y;
    if y_new <= y {
        // Not possible; recompute the intersection accurately from the
        // full edge endpoints.
        let (ys, xs0, xs1) = if endp.start.y < alp.start.y {
            (alp.start.y, endp.x_at_y(alp.start.y), alp.start.x)
        } else {
            (endp.start.y, endp.start.x, alp.x_at_y(endp.start.y))
        };
        let (ye, xe0, xe1) = if endp.end.y > alp.end.y {
            (alp.end.y, endp.x_at_y(alp.end.y), alp.end.x)
        } else {
            (endp.end.y, endp.end.x, alp.x_at_y(endp.end.y))
        };
        let dy_full = ye - ys;
        let dx0 = xe0 - xs0;
        let dx1 = xe1 - xs1;
        if dx0 == dx1 {
            // The two lines are coincident. Do nothing.
            y_new = y1;
        } else {
            // We need xs0 + t * dx0 == xs1 + t * dx1.
            y_new = ys + (xs0 - xs1).mul_div(dy_full, dx1 - dx0);
            if y_new <= y {
                // Only possible through some kind of numeric disaster,
                // but it has to be checked.
                y_new = y + Fixed::EPSILON;
            }
        }
    }
    Some(y_new)
}

/// A mixing weight proportional to the edge's steepness, so that
/// near-vertical edges dominate an averaged crossing X.
#[inline]
fn coord_weight(alp: &ActiveLine) -> i64 {
    debug_assert!(!alp.diff.x.is_zero());
    let slope = (i64::from(alp.diff.y.raw()) * 8 / i64::from(alp.diff.x.raw())).abs();
    1 + slope.min(256)
}

/// Sets `x_next` of every line from `from` up to (excluding) `to`.
fn set_x_next(ll: &mut LineList, from: u32, to: u32, x: Fixed) {
    let mut alp = from;
    while alp != to {
        ll.line_mut(alp).x_next = x;
        alp = ll.line(alp).next;
    }
}

/// Computes `x_next` at the band top for all active lines, shortening the
/// band to the earliest crossing found. `draw < 0` means the band will not
/// be painted, in which case crossings are ignored unless every band
/// matters (spot analysis).
pub(crate) fn intersect_al(
    ll: &mut LineList,
    y: Fixed,
    y_top: &mut Fixed,
    draw: i32,
    all_bands: bool,
) {
    let mut y1 = *y_top;
    if y == y1 {
        // A horizontal-only band; the resolver could handle it with
        // x_next equal to x_current, but bypass it for safety.
    } else if draw >= 0 || all_bands {
        let mut x = Fixed::MIN;
        let mut stopx = ll.x_first();
        let mut endp = NIL;
        let mut alp = ll.x_first();
        // Invariant: for all lines up to stopx, x_next is valid for y1.
        while alp != NIL {
            let mut nx = ll.line(alp).x_at_y(y1);
            ll.line_mut(alp).x_next = nx;
            if nx >= x {
                x = nx;
            } else if endp != NIL && ll.line(alp).x_current >= ll.line(endp).x_current {
                if let Some(y_new) = intersect(ll.line(endp), ll.line(alp), y, y1) {
                    if y_new <= y1 {
                        incr!(ll.stats, crossings);
                        stopx = endp;
                        y1 = y_new;
                        nx = if ll.line(endp).diff.x.is_zero() {
                            ll.line(endp).start.x
                        } else if ll.line(alp).diff.x.is_zero() {
                            ll.line(alp).start.x
                        } else {
                            let nx0 = ll.line(endp).x_at_y(y1);
                            let nx1 = ll.line(alp).x_at_y(y1);
                            if nx0 != nx1 {
                                // Arithmetic errors made the two sides
                                // disagree; pick an intermediate point.
                                let w0 = coord_weight(ll.line(endp));
                                let w1 = coord_weight(ll.line(alp));
                                Fixed::from_raw(
                                    ((w0 * i64::from(nx0.raw()) + w1 * i64::from(nx1.raw()))
                                        / (w0 + w1)) as i32,
                                )
                            } else {
                                nx0
                            }
                        };
                        // Ensure both sides share the crossing X. Triple
                        // intersections are repaired below.
                        ll.line_mut(endp).x_next = nx;
                        ll.line_mut(alp).x_next = nx;
                    }
                    if nx > x {
                        x = nx;
                    }
                }
            }
            endp = alp;
            alp = ll.line(alp).next;
        }
        // Recompute x_next for the lines before the intersection.
        let mut alp = ll.x_first();
        while alp != stopx {
            let nx = ll.line(alp).x_at_y(y1);
            ll.line_mut(alp).x_next = nx;
            alp = ll.line(alp).next;
        }
        repair_x_monotonicity(ll);
    } else {
        let mut alp = ll.x_first();
        while alp != NIL {
            let nx = ll.line(alp).x_at_y(y1);
            ll.line_mut(alp).x_next = nx;
            alp = ll.line(alp).next;
        }
    }
    *y_top = y1;
}

/// Coalesces runs of lines whose `x_next` came out decreasing (triple and
/// higher-order coincidences) onto one shared X. Vertical members keep
/// priority: once one is seen, only verticals are averaged.
fn repair_x_monotonicity(ll: &mut LineList) {
    if ll.x_first() == NIL {
        return;
    }
    loop {
        // Any decreasing pair left?
        let mut endp = ll.x_first();
        let mut x1 = ll.line(endp).x_next;
        let mut alp = ll.line(endp).next;
        let mut out_of_order = false;
        while alp != NIL {
            let x = ll.line(alp).x_next;
            if x < x1 {
                out_of_order = true;
                break;
            }
            x1 = x;
            alp = ll.line(alp).next;
        }
        if !out_of_order {
            break;
        }
        let mut endp = ll.x_first();
        let mut x1 = ll.line(endp).x_next;
        // Negative k counts vertical members; positive k accumulates
        // weights.
        let mut k: i64 = 0;
        let mut sx: i64 = 0;
        let mut n = 0;
        let mut alp = ll.line(endp).next;
        while alp != NIL {
            let x = ll.line(alp).x_next;
            if x < x1 {
                if n == 0 {
                    if ll.line(endp).diff.x.is_zero() {
                        k = -1;
                        sx = i64::from(x1.raw());
                    } else {
                        k = coord_weight(ll.line(endp));
                        sx = i64::from(x1.raw()) * k;
                    }
                    n = 1;
                }
                n += 1;
                if ll.line(alp).diff.x.is_zero() {
                    // Vertical lines have a higher priority.
                    if k <= -1 {
                        sx += i64::from(x.raw());
                        k -= 1;
                    } else {
                        k = -1;
                        sx = i64::from(x.raw());
                    }
                } else if k > 0 {
                    let w = coord_weight(ll.line(alp));
                    sx += i64::from(x.raw()) * w;
                    k += w;
                }
            } else {
                if n > 1 {
                    let k = k.abs();
                    set_x_next(ll, endp, alp, Fixed::from_raw(((sx + k / 2) / k) as i32));
                }
                x1 = x;
                n = 0;
                endp = alp;
            }
            alp = ll.line(alp).next;
        }
        if n > 1 {
            let k = k.abs();
            set_x_next(ll, endp, NIL, Fixed::from_raw(((sx + k / 2) / k) as i32));
        }
    }
}
