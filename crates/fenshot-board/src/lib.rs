//! Board localisation for chess photographs.
//!
//! ## Quickstart
//!
//! ```
//! use fenshot_board::{CornerLocator, CornerParams};
//! use fenshot_core::BoundingBox;
//!
//! let boxes = [
//!     BoundingBox::new(10.0, 10.0, 8.0, 8.0),
//!     BoundingBox::new(630.0, 10.0, 8.0, 8.0),
//!     BoundingBox::new(630.0, 630.0, 8.0, 8.0),
//!     BoundingBox::new(10.0, 630.0, 8.0, 8.0),
//! ];
//! let corners = CornerLocator::new(CornerParams::default()).locate(&boxes).unwrap();
//! println!("centroid: {:?}", corners.centroid());
//! ```
//!
//! Stages, in pipeline order:
//! 1. [`CornerLocator`]: corner boxes -> labeled [`CornerSet`].
//! 2. [`rectify_from_corners`]: perspective warp to the 640x640 canonical square.
//! 3. [`GridResolver`]: grid contour -> [`GridQuad`] -> second warp.
//! 4. [`OrientationCorrector`]: caller-driven half-turn, quarter-turn diagnostic.

mod corners;
mod grid;
mod orientation;
mod params;
mod rectify;

pub use corners::{CornerError, CornerLabel, CornerLocator, CornerSet, ANGLE_EPS};
pub use grid::{GridError, GridQuad, GridResolver, ResolvedGrid};
pub use orientation::{
    CornerPatches, OrientationCorrector, OrientationReport, OrientedBoard, ParseTopSideError,
    TopSide,
};
pub use params::{CornerParams, GridParams, OrientationParams};
pub use rectify::{
    canonical_corners, canonical_transform, rectify_from_corners, rectify_quad, RectifiedBoard,
    RectifyError,
};
