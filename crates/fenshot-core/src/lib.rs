//! Core types and utilities for reading chess positions from photographs.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any detector, engine or image codec: images are plain RGB
//! buffers and every transform is a 3x3 [`Homography`].

mod bbox;
mod color;
mod homography;
mod image;
mod logger;
mod polygon;

pub use bbox::BoundingBox;
pub use color::{rgb_to_lab8, Lab8};
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use image::{sample_bilinear_rgb, sample_bilinear_rgb_u8, RgbImage, RgbImageView};
pub use polygon::{approx_closed_polygon, closed_perimeter};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_logging, init_with_level, level_from_str};

pub use nalgebra::Point2;

/// Side length, in pixels, of the canonical rectified board image.
pub const CANONICAL_SIDE: usize = 640;
