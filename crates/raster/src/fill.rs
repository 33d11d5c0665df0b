//! The fill dispatcher.
//!
//! [fill_path] is the crate's entry point. It computes the path's
//! bounding box, intersects it with the device clip box, resolves the
//! fill-adjust values, chooses between the trapezoid and scan-line
//! algorithms, builds the Y-sorted active-line seeds and runs the chosen
//! loop. All per-fill state lives on this call's stack and in the
//! transient line list; there are no suspension points.

use crate::device::Device;
use crate::error::{FillError, FillResult};
use crate::line_list::LineList;
use crate::path::fixed::{Fixed, FixedPoint, FixedRect};
use crate::path::{Contour, Path};
use crate::scanline::spot_into_scan_lines;
use crate::scanner::add_y_list;
use crate::trapezoid::spot_into_trapezoids;
use crate::FillOptions;

use alloc::vec;
use alloc::vec::Vec;

/// Paths with more subpaths than this get flattened and their contacting
/// contours merged, to reduce active-list churn.
const BIG_PATH_SUBPATHS: u32 = 50;

/// The immutable per-fill parameter block the loops read.
pub(crate) struct FillParams {
    pub adjust_left: Fixed,
    pub adjust_right: Fixed,
    pub adjust_below: Fixed,
    pub adjust_above: Fixed,
    /// The path bbox Y range, clipped.
    pub ymin: Fixed,
    pub ymax: Fixed,
    /// The paint box: bbox intersected with the clip, expanded by adjust.
    pub pbox: FixedRect,
    /// Winding-rule mask: -1 non-zero, +1 even-odd.
    pub rule: i32,
    pub is_spotan: bool,
    pub fill_by_trapezoids: bool,
    pub fill_direct: bool,
    /// Flatness tolerance for curve subdivision.
    pub fixed_flat: Fixed,
    pub log: bool,
}

/// Fills `path` on `device` under the center-of-pixel rule, adjusted by
/// the options' sub-pixel pads.
///
/// The adjust parameters keep regions from coming out too faint: every
/// filled region is expanded by them on all four sides. An adjust of
/// exactly one half approximates the any-part-of-pixel rule; the left and
/// bottom pads then shrink by one epsilon so objects falling exactly on
/// pixel boundaries do not get one pixel too wide.
pub fn fill_path<D: Device + ?Sized>(
    device: &mut D,
    path: &Path,
    options: &FillOptions,
) -> FillResult {
    let mut ibox = match path.bounding_box() {
        Some(bbox) => bbox,
        None => return Ok(()),
    };
    let adjust = FixedPoint {
        x: Fixed::from_f32(options.adjust_x),
        y: Fixed::from_f32(options.adjust_y),
    };
    let clip = device.clip_box();
    if !ibox.is_within(&clip) {
        // If the intersection is empty, this fill is a no-op.
        ibox.intersect(&clip);
        if ibox.p.x - adjust.x >= ibox.q.x + adjust.x
            || ibox.p.y - adjust.y >= ibox.q.y + adjust.y
        {
            return Ok(());
        }
    }
    // The proper adjustment values. The exact half case is tweaked so the
    // any-part-of-pixel effect does not color an extra pixel for objects
    // falling exactly on pixel boundaries.
    let (adjust_left, adjust_right) = if adjust.x == Fixed::HALF {
        (Fixed::HALF - Fixed::EPSILON, Fixed::HALF)
    } else {
        (adjust.x, adjust.x)
    };
    let (adjust_below, adjust_above) = if adjust.y == Fixed::HALF {
        (Fixed::HALF - Fixed::EPSILON, Fixed::HALF)
    } else {
        (adjust.y, adjust.y)
    };
    let pbox = FixedRect {
        p: FixedPoint {
            x: ibox.p.x - adjust.x,
            y: ibox.p.y - adjust.y,
        },
        q: FixedPoint {
            x: ibox.q.x + adjust.x,
            y: ibox.q.y + adjust.y,
        },
    };
    let is_spotan = device.as_spot_analyzer().is_some();
    let fixed_flat = Fixed::from_f32(options.flatness);

    // Trapezoids paint rectangles and straight edges fast and draw
    // zero-height horizontal spans; scan lines are faster on curves and
    // write every pixel at most once when adjusting, which matters for
    // non-idempotent raster operations.
    let mut fill_by_trapezoids =
        !path.has_curves() || options.flatness >= 1.0 || is_spotan;
    if fill_by_trapezoids && !is_spotan && !options.idempotent_op {
        if let Some(rbox) = path.as_rectangle() {
            let x0 = (rbox.p.x - adjust_left).to_pixel();
            let y0 = (rbox.p.y - adjust_below).to_pixel();
            let x1 = (rbox.q.x + adjust_right).to_pixel();
            let y1 = (rbox.q.y + adjust_above).to_pixel();
            return device
                .fill_rectangle_rop(x0, y0, x1 - x0, y1 - y0)
                .map_err(FillError::from);
        }
        if !(adjust_left | adjust_right | adjust_below | adjust_above).is_zero() {
            // Avoid writing pixels twice.
            fill_by_trapezoids = false;
        }
    }

    let big_path = path.num_subpaths() > BIG_PATH_SUBPATHS;
    let contours: Vec<Contour> = if big_path && !is_spotan {
        let mut flat = path
            .flattened(fixed_flat)
            .ok_or(FillError::DegenerateCurve)?;
        flat.merge_contacting_subpaths();
        flat.contours()
    } else {
        // Curves are walked directly through their flattened iterators;
        // no copy is needed.
        path.contours()
    };

    let fp = FillParams {
        adjust_left,
        adjust_right,
        adjust_below,
        adjust_above,
        ymin: ibox.p.y,
        ymax: ibox.q.y,
        pbox,
        rule: options.fill_rule.mask(),
        is_spotan,
        fill_by_trapezoids,
        fill_direct: options.fill_direct,
        fixed_flat,
        log: log_enabled(),
    };
    fill_log!(
        fp,
        "[f] fill: {} contours, adjust=({:?},{:?}), traps={}",
        contours.len(),
        adjust.x,
        adjust.y,
        fp.fill_by_trapezoids
    );

    let mut ll = LineList::new();
    add_y_list(&mut ll, &contours, &fp)?;
    if options.smart_winding {
        ll.windings = vec![0; contours.len()];
    }

    let max_fill_band = device.max_fill_band();
    let band_mask = if max_fill_band == 0 {
        Fixed::MIN
    } else {
        Fixed::from_i32(-max_fill_band)
    };
    if fill_by_trapezoids {
        spot_into_trapezoids(device, &mut ll, &contours, &fp, band_mask)
    } else {
        spot_into_scan_lines(device, &mut ll, &contours, &fp, band_mask)
    }
}

#[cfg(all(debug_assertions, feature = "std"))]
fn log_enabled() -> bool {
    std::env::var("SCANFILL_FORCE_LOGGING").is_ok()
}

#[cfg(not(all(debug_assertions, feature = "std")))]
fn log_enabled() -> bool {
    false
}
