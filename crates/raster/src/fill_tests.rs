use crate::device::{Device, FillCommand, FixedEdge, RecordingDevice, SpotAnalyzer};
use crate::error::DeviceError;
use crate::path::fixed::{Fixed, FixedPoint, FixedRect};
use crate::path::math::point;
use crate::path::{Path, SegmentId};
use crate::{fill_path, FillOptions};

use alloc::vec::Vec;

fn rect_path(x0: f32, y0: f32, x1: f32, y1: f32) -> Path {
    let mut builder = Path::builder();
    builder.begin(point(x0, y0));
    builder.line_to(point(x1, y0));
    builder.line_to(point(x1, y1));
    builder.line_to(point(x0, y1));
    builder.close();
    builder.build()
}

fn edge_x_at(e: &FixedEdge, y: Fixed) -> Fixed {
    let dy = e.end.y - e.start.y;
    if dy.is_zero() {
        e.start.x
    } else {
        e.start.x + (e.end.x - e.start.x).mul_div(y - e.start.y, dy)
    }
}

/// A device that rasterizes the emitted commands into a write-count grid,
/// with the usual pixel-center rule for trapezoids.
struct CoverageDevice {
    x0: i32,
    y0: i32,
    w: i32,
    h: i32,
    counts: Vec<u32>,
}

impl CoverageDevice {
    fn new(x0: i32, y0: i32, w: i32, h: i32) -> Self {
        CoverageDevice {
            x0,
            y0,
            w,
            h,
            counts: alloc::vec![0; (w * h) as usize],
        }
    }

    fn paint(&mut self, x: i32, y: i32) {
        assert!(
            x >= self.x0 && x < self.x0 + self.w && y >= self.y0 && y < self.y0 + self.h,
            "paint outside the expected area: ({}, {})",
            x,
            y
        );
        self.counts[((y - self.y0) * self.w + (x - self.x0)) as usize] += 1;
    }

    fn count(&self, x: i32, y: i32) -> u32 {
        self.counts[((y - self.y0) * self.w + (x - self.x0)) as usize]
    }

    fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// The covered columns of one row, as an inclusive range.
    fn row_span(&self, y: i32) -> Option<(i32, i32)> {
        let mut span = None;
        for x in self.x0..self.x0 + self.w {
            if self.count(x, y) > 0 {
                span = match span {
                    None => Some((x, x)),
                    Some((lo, _)) => Some((lo, x)),
                };
            }
        }
        span
    }
}

impl Device for CoverageDevice {
    fn fill_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<(), DeviceError> {
        for yy in y..y + h {
            for xx in x..x + w {
                self.paint(xx, yy);
            }
        }
        Ok(())
    }

    fn fill_trapezoid(
        &mut self,
        left: &FixedEdge,
        right: &FixedEdge,
        ybot: Fixed,
        ytop: Fixed,
        _swap_axes: bool,
    ) -> Result<(), DeviceError> {
        for row in ybot.to_pixel()..ytop.to_pixel() {
            let ys = Fixed::from_i32(row) + Fixed::HALF;
            let xl = edge_x_at(left, ys);
            let xr = edge_x_at(right, ys);
            for col in xl.to_pixel()..xr.to_pixel() {
                self.paint(col, row);
            }
        }
        Ok(())
    }
}

#[test]
fn unit_square_is_one_rectangle() {
    let path = rect_path(0.0, 0.0, 1.0, 1.0);
    let mut device = RecordingDevice::new();
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(
        device.commands,
        alloc::vec![FillCommand::Rectangle {
            x: 0,
            y: 0,
            w: 1,
            h: 1,
        }]
    );
}

#[test]
fn integer_rectangle_covers_exactly_w_by_h() {
    let path = rect_path(2.0, 3.0, 7.0, 6.0);
    let mut device = CoverageDevice::new(0, 0, 10, 10);
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(device.total(), 5 * 3);
    assert_eq!(device.max_count(), 1);
    for y in 3..6 {
        assert_eq!(device.row_span(y), Some((2, 6)));
    }
}

#[test]
fn triangle_covers_pixel_centers_once() {
    // (0,0) (4,0) (2,4): four pixels on the first row, then two, then two.
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(4.0, 0.0));
    builder.line_to(point(2.0, 4.0));
    builder.close();
    let path = builder.build();

    let mut device = CoverageDevice::new(0, 0, 6, 6);
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(device.max_count(), 1);
    assert_eq!(device.row_span(0), Some((0, 3)));
    assert_eq!(device.row_span(1), Some((1, 2)));
    assert_eq!(device.row_span(2), Some((1, 2)));
    assert_eq!(device.row_span(3), None);
}

#[test]
fn coincident_squares_cancel_under_even_odd() {
    let mut builder = Path::builder();
    for _ in 0..2 {
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.line_to(point(1.0, 1.0));
        builder.line_to(point(0.0, 1.0));
        builder.close();
    }
    let path = builder.build();

    let mut device = RecordingDevice::new();
    fill_path(&mut device, &path, &FillOptions::even_odd()).unwrap();
    assert_eq!(device.commands, alloc::vec![]);
}

#[test]
fn same_direction_squares_paint_once_under_non_zero() {
    let mut builder = Path::builder();
    for _ in 0..2 {
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(3.0, 0.0));
        builder.line_to(point(3.0, 2.0));
        builder.line_to(point(0.0, 2.0));
        builder.close();
    }
    let path = builder.build();

    let mut device = CoverageDevice::new(0, 0, 4, 4);
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(device.max_count(), 1);
    assert_eq!(device.total(), 6);
}

#[test]
fn opposite_direction_squares_cancel_under_non_zero() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(2.0, 0.0));
    builder.line_to(point(2.0, 2.0));
    builder.line_to(point(0.0, 2.0));
    builder.close();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(0.0, 2.0));
    builder.line_to(point(2.0, 2.0));
    builder.line_to(point(2.0, 0.0));
    builder.close();
    let path = builder.build();

    let mut device = RecordingDevice::new();
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(device.commands, alloc::vec![]);
}

#[test]
fn hairline_paints_one_row_through_the_horizontal_path() {
    // A closed zero-area loop along y = 0. Without the horizontal dropout
    // handling this would produce no trapezoids at all.
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(10.0, 0.0));
    builder.close();
    let path = builder.build();

    let mut device = CoverageDevice::new(-2, -2, 16, 5);
    let options = FillOptions::non_zero().with_adjust(0.5, 0.5);
    fill_path(&mut device, &path, &options).unwrap();

    assert!(device.total() > 0);
    for y in -2..3 {
        for x in -2..14 {
            if device.count(x, y) > 0 {
                assert_eq!(y, 0, "hairline painted outside its row");
            }
        }
    }
    // The segment [0, 10] touches columns 0 through 10.
    let (lo, hi) = device.row_span(0).unwrap();
    assert_eq!((lo, hi), (0, 10));
}

#[test]
fn bowtie_fills_both_rules_alike() {
    let build = || {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(2.0, 2.0));
        builder.line_to(point(2.0, 0.0));
        builder.line_to(point(0.0, 2.0));
        builder.close();
        builder.build()
    };

    let mut non_zero = CoverageDevice::new(0, 0, 4, 4);
    fill_path(&mut non_zero, &build(), &FillOptions::non_zero()).unwrap();
    let mut even_odd = CoverageDevice::new(0, 0, 4, 4);
    fill_path(&mut even_odd, &build(), &FillOptions::even_odd()).unwrap();

    // The two triangles do not overlap, so the rules agree, and the
    // crossing must not make any pixel paint twice.
    assert_eq!(non_zero.max_count(), 1);
    assert_eq!(even_odd.counts, non_zero.counts);
    assert_eq!(non_zero.count(0, 0), 1);
    assert_eq!(non_zero.count(0, 1), 1);
}

#[test]
fn adjusted_narrow_slant_leaves_no_gap() {
    // A one-pixel-wide parallelogram tilted 45 degrees, with vertical end
    // caps so the slanted-adjustment path does the work.
    let build = || {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(4.0, 4.0));
        builder.line_to(point(4.0, 3.0));
        builder.line_to(point(0.0, -1.0));
        builder.close();
        builder.build()
    };
    let options = FillOptions::non_zero().with_adjust(0.5, 0.5);

    // The scan-line algorithm writes every pixel exactly once.
    let mut scan = CoverageDevice::new(-2, -3, 10, 10);
    let scan_options = options.with_idempotent_op(false);
    fill_path(&mut scan, &build(), &scan_options).unwrap();
    assert_eq!(scan.max_count(), 1);
    for y in -1..5 {
        let span = scan.row_span(y);
        assert!(span.is_some(), "row {} left uncovered", y);
        let (lo, hi) = span.unwrap();
        // Contiguous: every column of the span is covered.
        for x in lo..=hi {
            assert_eq!(scan.count(x, y), 1, "gap at ({}, {})", x, y);
        }
    }

    // The slanted-trapezoid decomposition covers every row with no gap
    // either, and never reaches outside what the scan-line extent rule
    // admits.
    let mut trap = CoverageDevice::new(-2, -3, 10, 10);
    fill_path(&mut trap, &build(), &options).unwrap();
    for y in -1..5 {
        assert!(trap.row_span(y).is_some(), "trapezoid row {} uncovered", y);
    }
    for y in -3..7 {
        for x in -2..8 {
            if trap.count(x, y) > 0 {
                assert!(
                    scan.count(x, y) > 0,
                    "trapezoid decomposition strayed at ({}, {})",
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn trapezoids_are_emitted_bottom_up_and_banded() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(8.0, 0.0));
    builder.line_to(point(4.0, 8.0));
    builder.close();
    let path = builder.build();

    let mut device = RecordingDevice::new();
    device.band = 2;
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();

    let band_mask = Fixed::from_i32(-2).raw();
    let mut last_ybot = Fixed::MIN;
    let mut traps = 0;
    for command in &device.commands {
        if let FillCommand::Trapezoid { ybot, ytop, .. } = command {
            assert!(*ybot < *ytop);
            assert!(*ybot >= last_ybot, "trapezoids not in band order");
            last_ybot = *ybot;
            // Each trapezoid stays within one device band.
            assert_eq!(
                ybot.raw() & band_mask,
                (ytop.raw() - 1) & band_mask,
                "trapezoid crosses a band boundary"
            );
            traps += 1;
        }
    }
    assert!(traps >= 4);
}

#[test]
fn fills_are_deterministic() {
    let build = || {
        let mut builder = Path::builder();
        builder.begin(point(0.1, 0.2));
        builder.line_to(point(7.3, 0.8));
        builder.line_to(point(6.1, 6.9));
        builder.line_to(point(3.5, 2.2));
        builder.line_to(point(0.7, 5.8));
        builder.close();
        builder.build()
    };
    let options = FillOptions::non_zero().with_adjust(0.5, 0.5);
    let mut first = RecordingDevice::new();
    fill_path(&mut first, &build(), &options).unwrap();
    let mut second = RecordingDevice::new();
    fill_path(&mut second, &build(), &options).unwrap();
    assert_eq!(first.commands, second.commands);
    assert!(!first.commands.is_empty());
}

#[test]
fn clip_box_culls_the_whole_fill() {
    let path = rect_path(0.0, 0.0, 4.0, 4.0);
    let clip = FixedRect {
        p: FixedPoint {
            x: Fixed::from_i32(10),
            y: Fixed::from_i32(10),
        },
        q: FixedPoint {
            x: Fixed::from_i32(20),
            y: Fixed::from_i32(20),
        },
    };
    let mut device = RecordingDevice::with_clip(clip);
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
    assert_eq!(device.commands, alloc::vec![]);
}

#[test]
fn non_idempotent_rectangle_takes_the_shortcut() {
    let path = rect_path(1.0, 1.0, 5.0, 3.0);
    let mut device = RecordingDevice::new();
    let options = FillOptions::non_zero().with_idempotent_op(false);
    fill_path(&mut device, &path, &options).unwrap();
    assert_eq!(
        device.commands,
        alloc::vec![FillCommand::Rectangle {
            x: 1,
            y: 1,
            w: 4,
            h: 2,
        }]
    );
}

#[test]
fn smart_winding_evaluates_each_contour_even_odd() {
    // A contour looping twice around the same square: the plain non-zero
    // rule paints it (winding two), while smart winding reduces each
    // contour to its own parity and cancels it.
    let build = || {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        for _ in 0..2 {
            builder.line_to(point(2.0, 0.0));
            builder.line_to(point(2.0, 2.0));
            builder.line_to(point(0.0, 2.0));
            builder.line_to(point(0.0, 0.0));
        }
        builder.close();
        builder.build()
    };

    let mut plain = CoverageDevice::new(0, 0, 3, 3);
    fill_path(&mut plain, &build(), &FillOptions::non_zero()).unwrap();
    assert_eq!(plain.total(), 4);
    assert_eq!(plain.max_count(), 1);

    let mut smart = RecordingDevice::new();
    let options = FillOptions::non_zero().with_smart_winding(true);
    fill_path(&mut smart, &build(), &options).unwrap();
    assert_eq!(smart.commands, alloc::vec![]);
}

#[test]
fn smart_winding_is_invariant_in_the_number_of_copies() {
    let build = |copies: usize| {
        let mut builder = Path::builder();
        for _ in 0..copies {
            builder.begin(point(0.0, 0.0));
            builder.line_to(point(3.0, 0.0));
            builder.line_to(point(3.0, 3.0));
            builder.line_to(point(0.0, 3.0));
            builder.close();
        }
        builder.build()
    };
    let options = FillOptions::non_zero().with_smart_winding(true);

    let mut one = RecordingDevice::new();
    fill_path(&mut one, &build(1), &options).unwrap();
    let mut three = RecordingDevice::new();
    fill_path(&mut three, &build(3), &options).unwrap();
    assert_eq!(one.commands, three.commands);
    assert!(!one.commands.is_empty());
}

#[derive(Default)]
struct AnalyzerDevice {
    traps: Vec<(Fixed, Fixed, Fixed, Fixed, SegmentId, SegmentId, i8, i8)>,
    painted: bool,
}

impl SpotAnalyzer for AnalyzerDevice {
    fn store_trapezoid(
        &mut self,
        y0: Fixed,
        y1: Fixed,
        xbot_left: Fixed,
        xbot_right: Fixed,
        _xtop_left: Fixed,
        _xtop_right: Fixed,
        left_seg: SegmentId,
        right_seg: SegmentId,
        left_dir: i8,
        right_dir: i8,
    ) -> Result<(), DeviceError> {
        self.traps
            .push((y0, y1, xbot_left, xbot_right, left_seg, right_seg, left_dir, right_dir));
        Ok(())
    }
}

impl Device for AnalyzerDevice {
    fn fill_rectangle(&mut self, _x: i32, _y: i32, _w: i32, _h: i32) -> Result<(), DeviceError> {
        self.painted = true;
        Ok(())
    }

    fn fill_trapezoid(
        &mut self,
        _left: &FixedEdge,
        _right: &FixedEdge,
        _ybot: Fixed,
        _ytop: Fixed,
        _swap_axes: bool,
    ) -> Result<(), DeviceError> {
        self.painted = true;
        Ok(())
    }

    fn as_spot_analyzer(&mut self) -> Option<&mut dyn SpotAnalyzer> {
        Some(self)
    }
}

#[test]
fn spot_analyzer_receives_raw_trapezoids() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 1.0));
    builder.line_to(point(4.0, 1.0));
    builder.line_to(point(2.0, 5.0));
    builder.close();
    let path = builder.build();

    let mut device = AnalyzerDevice::default();
    fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();

    assert!(!device.painted, "spot analysis must not render");
    assert!(!device.traps.is_empty());
    let mut last_y = Fixed::MIN;
    for (y0, y1, xl, xr, left_seg, right_seg, left_dir, right_dir) in &device.traps {
        assert!(y0 >= &last_y);
        assert!(y1 > y0);
        assert!(xl <= xr);
        // The left side of a clockwise-in-device-space triangle descends,
        // the right side ascends.
        assert_eq!(*left_dir, -1);
        assert_eq!(*right_dir, 1);
        assert_ne!(left_seg, right_seg);
        last_y = *y0;
    }
}

#[test]
fn errors_from_the_device_unwind_the_fill() {
    struct FailingDevice {
        calls: u32,
    }
    impl Device for FailingDevice {
        fn fill_rectangle(&mut self, _: i32, _: i32, _: i32, _: i32) -> Result<(), DeviceError> {
            self.calls += 1;
            Err(DeviceError::Backend(-13))
        }
        fn fill_trapezoid(
            &mut self,
            _: &FixedEdge,
            _: &FixedEdge,
            _: Fixed,
            _: Fixed,
            _: bool,
        ) -> Result<(), DeviceError> {
            self.calls += 1;
            Err(DeviceError::Backend(-13))
        }
    }

    let path = rect_path(0.0, 0.0, 4.0, 4.0);
    let mut device = FailingDevice { calls: 0 };
    let result = fill_path(&mut device, &path, &FillOptions::non_zero());
    assert_eq!(
        result,
        Err(crate::FillError::Device(DeviceError::Backend(-13)))
    );
    assert_eq!(device.calls, 1);
}

#[test]
fn curves_fill_through_both_algorithms() {
    let build = || {
        let mut builder = Path::builder();
        builder.begin(point(1.0, 1.0));
        builder.cubic_bezier_to(point(1.0, 7.0), point(7.0, 7.0), point(7.0, 1.0));
        builder.close();
        builder.build()
    };

    // Coarse flatness: trapezoids walk the curve chord by chord.
    let mut trap = CoverageDevice::new(0, 0, 8, 8);
    fill_path(&mut trap, &build(), &FillOptions::non_zero().with_flatness(1.0)).unwrap();
    assert!(trap.total() > 0);
    assert_eq!(trap.max_count(), 1);

    // Fine flatness routes through the scan-line loop.
    let mut scan = CoverageDevice::new(0, 0, 8, 8);
    fill_path(&mut scan, &build(), &FillOptions::non_zero().with_flatness(0.1)).unwrap();
    assert!(scan.total() > 0);
    assert_eq!(scan.max_count(), 1);

    // The dome covers its widest row near the base in both cases.
    assert!(trap.row_span(2).is_some());
    assert!(scan.row_span(2).is_some());
}

#[test]
fn non_monotonic_curve_seeds_interior_minima() {
    // An S-shaped cubic whose Y direction reverses twice inside one
    // segment; the scanner must emit pairs at the interior minima.
    let mut builder = Path::builder();
    builder.begin(point(0.0, 2.0));
    builder.cubic_bezier_to(point(0.0, 10.0), point(8.0, -6.0), point(8.0, 2.0));
    builder.line_to(point(8.0, 4.0));
    builder.line_to(point(0.0, 4.0));
    builder.close();
    let path = builder.build();

    let mut device = CoverageDevice::new(-1, -3, 12, 12);
    fill_path(&mut device, &path, &FillOptions::non_zero().with_flatness(1.0)).unwrap();
    assert!(device.total() > 0);
    assert_eq!(device.max_count(), 1);
}
