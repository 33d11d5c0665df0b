#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::too_many_arguments)]
#![no_std]

//! Scan conversion of filled paths into device trapezoids and scan-line
//! runs.
//!
//! ## Overview
//!
//! The entry point is [fill_path](fn.fill_path.html): it takes a
//! fixed-point [Path](../scanfill_path/struct.Path.html), a set of
//! [FillOptions](struct.FillOptions.html) and a back-end implementing the
//! [Device](trait.Device.html) trait, and paints the region inside the
//! path under the selected winding rule.
//!
//! The converter is a Y-band sweep. A contour scanner seeds active lines
//! at every local Y minimum of every subpath; the sweep keeps them in an
//! X-ordered list, shortens each band at edge crossings, and emits one
//! trapezoid per inside region per band, or per-scan-line pixel runs when
//! the scan-line algorithm is selected. Sub-pixel fill adjustment
//! implements the any-part-of-pixel rule, and dropout prevention
//! guarantees that horizontal hairlines and degenerate-width regions
//! still paint.
//!
//! The output contract and the recording device live in the
//! [device module](device/index.html).
//!
//! ## Example
//!
//! ```
//! use scanfill_raster::{fill_path, FillOptions, RecordingDevice};
//! use scanfill_path::math::point;
//! use scanfill_path::Path;
//!
//! let mut builder = Path::builder();
//! builder.begin(point(0.0, 0.0));
//! builder.line_to(point(10.0, 0.0));
//! builder.line_to(point(10.0, 10.0));
//! builder.line_to(point(0.0, 10.0));
//! builder.end(true);
//! let path = builder.build();
//!
//! let mut device = RecordingDevice::new();
//! fill_path(&mut device, &path, &FillOptions::non_zero()).unwrap();
//! assert!(!device.commands.is_empty());
//! ```

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub use scanfill_path as path;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

// Debug-only logging, enabled at runtime with SCANFILL_FORCE_LOGGING.
#[cfg(all(debug_assertions, feature = "std"))]
macro_rules! fill_log {
    ($obj:expr, $fmt:expr) => (
        if $obj.log {
            std::println!($fmt);
        }
    );
    ($obj:expr, $fmt:expr, $($arg:tt)*) => (
        if $obj.log {
            std::println!($fmt, $($arg)*);
        }
    );
}

#[cfg(not(all(debug_assertions, feature = "std")))]
macro_rules! fill_log {
    ($obj:expr, $fmt:expr) => {};
    ($obj:expr, $fmt:expr, $($arg:tt)*) => {};
}

#[cfg(feature = "profiling")]
macro_rules! incr {
    ($stats:expr, $field:ident) => {
        $stats.$field += 1
    };
}

#[cfg(not(feature = "profiling"))]
macro_rules! incr {
    ($stats:expr, $field:ident) => {};
}

pub mod device;
mod error;
mod fill;
mod intersect;
mod line_list;
mod range_list;
mod scanline;
mod scanner;
mod trapezoid;

#[cfg(test)]
mod fill_tests;

#[doc(inline)]
pub use crate::device::{Device, FillCommand, FixedEdge, RecordingDevice, SpotAnalyzer};

#[doc(inline)]
pub use crate::error::*;

#[doc(inline)]
pub use crate::fill::fill_path;

pub use crate::path::FillRule;

/// Parameters for a fill operation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct FillOptions {
    /// Maximum allowed distance between a curve and its piecewise-linear
    /// approximation, in pixels.
    ///
    /// Default value: `FillOptions::DEFAULT_FLATNESS`.
    pub flatness: f32,

    /// The winding rule deciding what is inside the path.
    ///
    /// Default value: `NonZero`.
    pub fill_rule: FillRule,

    /// Horizontal sub-pixel pad applied to both sides of every filled
    /// region. A value of 0.5 approximates the any-part-of-pixel rule.
    ///
    /// Default value: `0.0`.
    pub adjust_x: f32,

    /// Vertical sub-pixel pad; see `adjust_x`.
    ///
    /// Default value: `0.0`.
    pub adjust_y: f32,

    /// Evaluate the even-odd rule per contour and intersect the results.
    /// Used for grid-fitted character fills, where each glyph contour
    /// must hold its own.
    ///
    /// Default value: `false`.
    pub smart_winding: bool,

    /// Whether the device's raster operation is idempotent. When it is
    /// not, every pixel must be written exactly once and the converter
    /// avoids algorithms that may double-paint.
    ///
    /// Default value: `true`.
    pub idempotent_op: bool,

    /// Whether painting may bypass the device's raster-op path and call
    /// `fill_rectangle` directly (a pure color).
    ///
    /// Default value: `true`.
    pub fill_direct: bool,
}

impl FillOptions {
    /// Default flattening tolerance.
    pub const DEFAULT_FLATNESS: f32 = 1.0;
    /// Default fill rule.
    pub const DEFAULT_FILL_RULE: FillRule = FillRule::NonZero;

    pub const DEFAULT: Self = FillOptions {
        flatness: Self::DEFAULT_FLATNESS,
        fill_rule: Self::DEFAULT_FILL_RULE,
        adjust_x: 0.0,
        adjust_y: 0.0,
        smart_winding: false,
        idempotent_op: true,
        fill_direct: true,
    };

    #[inline]
    pub fn non_zero() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub fn even_odd() -> Self {
        let mut options = Self::DEFAULT;
        options.fill_rule = FillRule::EvenOdd;
        options
    }

    #[inline]
    pub const fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    #[inline]
    pub const fn with_flatness(mut self, flatness: f32) -> Self {
        self.flatness = flatness;
        self
    }

    /// Sets both sub-pixel pads. Character rendering typically uses
    /// one half together with `with_smart_winding`.
    #[inline]
    pub const fn with_adjust(mut self, adjust_x: f32, adjust_y: f32) -> Self {
        self.adjust_x = adjust_x;
        self.adjust_y = adjust_y;
        self
    }

    #[inline]
    pub const fn with_smart_winding(mut self, smart: bool) -> Self {
        self.smart_winding = smart;
        self
    }

    #[inline]
    pub const fn with_idempotent_op(mut self, idempotent: bool) -> Self {
        self.idempotent_op = idempotent;
        self
    }

    #[inline]
    pub const fn with_fill_direct(mut self, direct: bool) -> Self {
        self.fill_direct = direct;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
