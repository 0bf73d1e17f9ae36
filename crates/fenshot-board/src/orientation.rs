//! Board orientation in the grid-rectified frame.
//!
//! The half-turn is decided by the caller (which colour sits at the top of
//! the photo). The quarter-turn is only detected: the bottom corner squares
//! are sampled in Lab and compared against the "dark a1, light h1" rule.

use std::fmt;
use std::str::FromStr;

use fenshot_core::{rgb_to_lab8, Homography, Lab8, RgbImage, RgbImageView};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::OrientationParams;

/// Which side's pieces are at the top edge of the photograph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopSide {
    White,
    #[default]
    Black,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown top side {0:?}, expected \"white\" or \"black\"")]
pub struct ParseTopSideError(pub String);

impl FromStr for TopSide {
    type Err = ParseTopSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(TopSide::White),
            "black" | "b" => Ok(TopSide::Black),
            _ => Err(ParseTopSideError(s.to_string())),
        }
    }
}

impl fmt::Display for TopSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TopSide::White => "white",
            TopSide::Black => "black",
        })
    }
}

/// Mean Lab colour of each corner patch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerPatches {
    pub top_left: Lab8,
    pub top_right: Lab8,
    pub bottom_left: Lab8,
    pub bottom_right: Lab8,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationReport {
    /// The half-turn requested by the caller was applied.
    pub rotated_180: bool,
    pub patches: CornerPatches,
    /// Corner colours disagree with a standard board; the image was left as is.
    pub needs_quarter_turn: bool,
}

/// Grid-rectified image after orientation handling.
#[derive(Clone, Debug)]
pub struct OrientedBoard {
    pub image: RgbImage,
    /// Grid frame -> oriented frame (identity or half-turn).
    pub h_oriented_from_grid: Homography,
    pub report: OrientationReport,
}

#[derive(Clone, Debug, Default)]
pub struct OrientationCorrector {
    params: OrientationParams,
}

impl OrientationCorrector {
    pub fn new(params: OrientationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OrientationParams {
        &self.params
    }

    /// Average `samples` random pixels from the border band of the patch at
    /// `(x0, y0)`. Returns the default colour when nothing can be sampled.
    fn sample_patch<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        x0: usize,
        y0: usize,
        size: usize,
        rng: &mut R,
    ) -> Lab8 {
        let band = self.params.border_width.clamp(1, size.max(1));
        if size == 0 || self.params.samples == 0 {
            return Lab8::default();
        }

        let mut sum = [0.0f32; 3];
        let mut count = 0usize;
        for _ in 0..self.params.samples {
            let near_band = |rng: &mut R, origin: usize| {
                if rng.gen_bool(0.5) {
                    rng.gen_range(origin..origin + band)
                } else {
                    rng.gen_range(origin + size - band..origin + size)
                }
            };
            let (x, y) = if rng.gen_bool(0.5) {
                let x = rng.gen_range(x0..x0 + size);
                (x, near_band(&mut *rng, y0))
            } else {
                let x = near_band(&mut *rng, x0);
                (x, rng.gen_range(y0..y0 + size))
            };
            if let Some(rgb) = image.pixel(x, y) {
                let lab = rgb_to_lab8(rgb);
                sum[0] += lab.l;
                sum[1] += lab.a;
                sum[2] += lab.b;
                count += 1;
            }
        }

        if count == 0 {
            return Lab8::default();
        }
        let n = count as f32;
        Lab8 {
            l: sum[0] / n,
            a: sum[1] / n,
            b: sum[2] / n,
        }
    }

    /// Sample the four corner patches (one board square each).
    pub fn sample_corners<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        rng: &mut R,
    ) -> CornerPatches {
        let size = self.params.patch_size.min(image.width).min(image.height);
        let right = image.width - size;
        let bottom = image.height - size;
        CornerPatches {
            top_left: self.sample_patch(image, 0, 0, size, rng),
            top_right: self.sample_patch(image, right, 0, size, rng),
            bottom_left: self.sample_patch(image, 0, bottom, size, rng),
            bottom_right: self.sample_patch(image, right, bottom, size, rng),
        }
    }

    /// Dark bottom-left square next to a light bottom-right square.
    ///
    /// Only the bottom row is compared: a1 dark and h1 light. The top-right
    /// patch (h8, also dark on a correct board) is sampled for diagnostics
    /// but takes no part in the decision, so a board whose bottom-right
    /// reads dark is flagged even when its top-right matches.
    pub fn is_canonical(&self, patches: &CornerPatches) -> bool {
        let l_t = self.params.l_threshold;
        let b_t = self.params.b_threshold;
        let bl = patches.bottom_left;
        let br = patches.bottom_right;
        (bl.l < l_t || bl.b < b_t) && (br.l > l_t || br.b > b_t)
    }

    /// Apply the caller's half-turn, then check for a residual quarter-turn.
    ///
    /// The quarter-turn is reported, never applied.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, image, rng), fields(top = %top))
    )]
    pub fn correct<R: Rng + ?Sized>(
        &self,
        image: RgbImage,
        top: TopSide,
        rng: &mut R,
    ) -> OrientedBoard {
        let rotated_180 = top == TopSide::White;
        let (image, h_oriented_from_grid) = if rotated_180 {
            debug!("white at top, rotating the board by 180 degrees");
            let side = image.width.max(image.height);
            (image.rotated_180(), Homography::rotation_180(side))
        } else {
            (image, Homography::identity())
        };

        let patches = self.sample_corners(&image.view(), rng);
        let needs_quarter_turn = !self.is_canonical(&patches);
        if needs_quarter_turn {
            warn!(
                "corner colours suggest a quarter-turn (bottom-left L={:.1} b={:.1}, bottom-right L={:.1} b={:.1}); leaving the board as is",
                patches.bottom_left.l, patches.bottom_left.b, patches.bottom_right.l, patches.bottom_right.b
            );
        }

        OrientedBoard {
            image,
            h_oriented_from_grid,
            report: OrientationReport {
                rotated_180,
                patches,
                needs_quarter_turn,
            },
        }
    }
}
