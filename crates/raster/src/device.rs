//! The output side of the scan converter.
//!
//! ## Overview
//!
//! The converter does not touch pixels itself. It decomposes the filled
//! region into axis-aligned rectangles and trapezoids and hands them to a
//! type implementing the [`Device`](trait.Device.html) trait. This keeps
//! the core independent from color handling, halftoning and raster
//! operations: a device color is whatever state the device holds when the
//! fill runs.
//!
//! Within one fill, trapezoids are emitted in non-decreasing band order
//! and, inside a band, in increasing X order. Devices may rely on this for
//! incremental output.
//!
//! The [`RecordingDevice`](struct.RecordingDevice.html) stores the emitted
//! commands in a plain vector. It is convenient for tests and for
//! consumers that replay the decomposition elsewhere.
//!
//! Spot analysis is a different output mode: the converter passes raw
//! trapezoid descriptors, including the source segment of each side, to a
//! [`SpotAnalyzer`](trait.SpotAnalyzer.html) instead of painting. This is
//! what glyph grid-fitting code consumes.

use crate::error::DeviceError;
use crate::path::fixed::{Fixed, FixedPoint, FixedRect};
use crate::path::SegmentId;

use alloc::vec::Vec;

/// One side of a trapezoid: a line from `start` to `end` in fixed-point
/// device space, not necessarily vertical.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FixedEdge {
    pub start: FixedPoint,
    pub end: FixedPoint,
}

/// A rendering back-end the converter paints through.
pub trait Device {
    /// Paints an axis-aligned rectangle of whole pixels.
    fn fill_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<(), DeviceError>;

    /// Paints a rectangle through the device's raster operation. Devices
    /// with no special raster-op path can keep the default.
    fn fill_rectangle_rop(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<(), DeviceError> {
        self.fill_rectangle(x, y, w, h)
    }

    /// Paints the region between two edges, clipped to `[ybot, ytop]`.
    /// With `swap_axes` the roles of X and Y are exchanged.
    fn fill_trapezoid(
        &mut self,
        left: &FixedEdge,
        right: &FixedEdge,
        ybot: Fixed,
        ytop: Fixed,
        swap_axes: bool,
    ) -> Result<(), DeviceError>;

    /// The device's clipping box. Painting outside of it is the device's
    /// problem, but the converter uses it to cull whole fills and to clip
    /// bands.
    fn clip_box(&self) -> FixedRect {
        default_clip_box()
    }

    /// The maximum band height the device prefers, in pixels. Zero means
    /// unlimited. When non-zero, every emitted trapezoid satisfies
    /// `(y1 - 1) & band_mask == y & band_mask` with
    /// `band_mask = -max_fill_band` in fixed point.
    fn max_fill_band(&self) -> i32 {
        0
    }

    /// Devices that analyze spot topology instead of rendering return
    /// their analyzer here; the converter then feeds raw trapezoid
    /// descriptors to it and paints nothing.
    fn as_spot_analyzer(&mut self) -> Option<&mut dyn SpotAnalyzer> {
        None
    }
}

/// Consumes raw trapezoid descriptors for spot topology analysis.
pub trait SpotAnalyzer {
    fn store_trapezoid(
        &mut self,
        y0: Fixed,
        y1: Fixed,
        xbot_left: Fixed,
        xbot_right: Fixed,
        xtop_left: Fixed,
        xtop_right: Fixed,
        left_seg: SegmentId,
        right_seg: SegmentId,
        left_dir: i8,
        right_dir: i8,
    ) -> Result<(), DeviceError>;
}

/// One painting call recorded by a [`RecordingDevice`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FillCommand {
    Rectangle {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },
    Trapezoid {
        left: FixedEdge,
        right: FixedEdge,
        ybot: Fixed,
        ytop: Fixed,
    },
}

/// A device that records every painting call instead of rendering.
#[derive(Clone, Debug, Default)]
pub struct RecordingDevice {
    pub commands: Vec<FillCommand>,
    pub clip: Option<FixedRect>,
    pub band: i32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        RecordingDevice {
            commands: Vec::new(),
            clip: None,
            band: 0,
        }
    }

    pub fn with_clip(clip: FixedRect) -> Self {
        RecordingDevice {
            commands: Vec::new(),
            clip: Some(clip),
            band: 0,
        }
    }
}

impl Device for RecordingDevice {
    fn fill_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32) -> Result<(), DeviceError> {
        if w > 0 && h > 0 {
            self.commands.push(FillCommand::Rectangle { x, y, w, h });
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
        if ybot < ytop {
            self.commands.push(FillCommand::Trapezoid {
                left: *left,
                right: *right,
                ybot,
                ytop,
            });
        }
        Ok(())
    }

    fn clip_box(&self) -> FixedRect {
        match self.clip {
            Some(clip) => clip,
            None => default_clip_box(),
        }
    }

    fn max_fill_band(&self) -> i32 {
        self.band
    }
}

/// A clipping box far larger than any real device, but with enough slack
/// that adjust expansion cannot overflow the coordinate space.
fn default_clip_box() -> FixedRect {
    let huge = Fixed::from_raw(i32::MAX / 2);
    FixedRect {
        p: FixedPoint { x: -huge, y: -huge },
        q: FixedPoint { x: huge, y: huge },
    }
}
