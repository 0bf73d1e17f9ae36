//! Adapters between `image` buffers and the lightweight core image types.

use std::path::Path;

use fenshot_core::{RgbImage, RgbImageView};
use image::error::{ParameterError, ParameterErrorKind};
use image::ImageError;

/// Borrow an `image::RgbImage` as a core view.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert any decoded image into an owned core RGB buffer.
pub fn from_dynamic(img: ::image::DynamicImage) -> RgbImage {
    let rgb = img.to_rgb8();
    RgbImage {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        data: rgb.into_raw(),
    }
}

/// Decode an image file into an owned RGB buffer.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, ImageError> {
    Ok(from_dynamic(::image::open(path)?))
}

/// Copy a core RGB buffer into an `image::RgbImage`.
pub fn to_image(img: &RgbImage) -> Option<::image::RgbImage> {
    ::image::RgbImage::from_raw(
        u32::try_from(img.width).ok()?,
        u32::try_from(img.height).ok()?,
        img.data.clone(),
    )
}

/// Encode a core RGB buffer to disk; the format follows the file extension.
pub fn save_rgb(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), ImageError> {
    let buf = to_image(img).ok_or_else(|| {
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    buf.save(path)
}
