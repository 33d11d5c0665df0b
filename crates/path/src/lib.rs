#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![no_std]

//! Data structures to build and store 2D paths in fixed-point device space.
//!
//! Paths are built from f32 user-space points and stored as 32 bit
//! fixed-point device coordinates, which is what the scan converter in
//! `scanfill_raster` consumes. See the [Path](struct.Path.html) builder API
//! and the [flatten](flatten/index.html) module for the piecewise-linear
//! curve iterator.
//!
//! This crate is reexported in [scanfill](https://docs.rs/scanfill/).
//!
//! # Examples
//!
//! ```
//! use scanfill_path::Path;
//! use scanfill_path::math::point;
//!
//! let mut builder = Path::builder();
//! builder.begin(point(0.0, 0.0));
//! builder.line_to(point(1.0, 2.0));
//! builder.line_to(point(2.0, 0.0));
//! builder.close();
//!
//! let path = builder.build();
//! assert_eq!(path.num_subpaths(), 1);
//! ```

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod fixed;
pub mod flatten;
pub mod path;

#[doc(inline)]
pub use crate::fixed::{fixed_point, Fixed, FixedPoint, FixedRect, FRACTION_BITS};
#[doc(inline)]
pub use crate::flatten::FlattenedIterator;
#[doc(inline)]
pub use crate::path::{Contour, ContourSegment, Path, PathBuilder, SegmentId};

pub mod math {
    //! f32 user-space geometry aliases over euclid, converted to fixed
    //! point at path-building time.

    /// Alias for ```euclid::default::Point2D<f32>```.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for ```euclid::default::Vector2D<f32>```.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// Alias for ```euclid::default::Box2D<f32>```.
    pub type Box2D = euclid::default::Box2D<f32>;

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f32, y: f32) -> Vector {
        Vector::new(x, y)
    }
}

/// The fill rule defines how to determine what is inside and what is
/// outside of the shape.
///
/// See the SVG specification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

impl FillRule {
    /// The winding-number mask for this rule: a counter `w` is inside when
    /// `w & mask != 0`. Even-odd keeps the parity bit only, non-zero keeps
    /// every bit.
    #[inline]
    pub fn mask(self) -> i32 {
        match self {
            FillRule::EvenOdd => 1,
            FillRule::NonZero => -1,
        }
    }

    #[inline]
    pub fn is_in(self, winding_number: i32) -> bool {
        (winding_number & self.mask()) != 0
    }

    #[inline]
    pub fn is_out(self, winding_number: i32) -> bool {
        !self.is_in(winding_number)
    }
}
