//! Scan conversion of filled 2D paths.
//!
//! `scanfill` turns a flattened vector path into the set of device pixels it
//! covers, decomposed either into trapezoids (one per pair of left/right
//! active edges per Y band) or into scan-line runs. It implements the
//! non-zero and even-odd winding rules, sub-pixel fill adjustment for the
//! any-part-of-pixel rule, and dropout prevention so that thin or degenerate
//! regions still paint.
//!
//! # Crates
//!
//! * **scanfill_path** - Fixed-point scalar math, path storage and building,
//!   and the flattened segment iterator.
//! * **scanfill_raster** - The scan converter itself: the fill dispatcher,
//!   the trapezoid and scan-line fill loops, and the device back-end traits.
//!
//! This meta-crate (`scanfill`) reexports the other scanfill crates for
//! convenience.
//!
//! ```ignore
//! use scanfill::raster::fill_path;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! use scanfill_raster::fill_path;
//! ```
//!
//! # Example
//!
//! ```
//! use scanfill::path::Path;
//! use scanfill::path::math::point;
//! use scanfill::raster::{fill_path, FillOptions, RecordingDevice};
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
//!
//! println!("painted: {:?}", device.commands);
//! ```

#![no_std]

pub use scanfill_path as path;
pub use scanfill_raster as raster;

pub use crate::path::math;
pub use crate::path::{FillRule, Path};
pub use crate::raster::{fill_path, Device, FillError, FillOptions, FillResult};
