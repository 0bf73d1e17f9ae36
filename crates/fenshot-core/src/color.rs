//! sRGB to CIE L*a*b* conversion.
//!
//! Values are returned in the 8-bit convention used by common vision
//! toolkits: `L` scaled to `0..=255`, `a` and `b` offset by `+128`. The
//! orientation thresholds are expressed in these units.

use palette::{IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

/// Lab triple in 8-bit scaling.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Lab8 {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl From<Lab> for Lab8 {
    fn from(lab: Lab) -> Self {
        Self {
            l: lab.l * 255.0 / 100.0,
            a: lab.a + 128.0,
            b: lab.b + 128.0,
        }
    }
}

/// Convert one sRGB pixel (D65 white point).
pub fn rgb_to_lab8(rgb: [u8; 3]) -> Lab8 {
    let lab: Lab = Srgb::new(rgb[0], rgb[1], rgb[2])
        .into_format::<f32>()
        .into_color();
    lab.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn black_and_white_hit_the_ends_of_the_l_range() {
        let black = rgb_to_lab8([0, 0, 0]);
        assert_abs_diff_eq!(black.l, 0.0, epsilon = 0.5);
        assert_abs_diff_eq!(black.b, 128.0, epsilon = 0.5);

        let white = rgb_to_lab8([255, 255, 255]);
        assert_abs_diff_eq!(white.l, 255.0, epsilon = 0.5);
        assert_abs_diff_eq!(white.a, 128.0, epsilon = 0.5);
        assert_abs_diff_eq!(white.b, 128.0, epsilon = 0.5);
    }

    #[test]
    fn board_square_colours_straddle_the_l_threshold() {
        // typical dark and light wooden squares
        assert!(rgb_to_lab8([90, 60, 40]).l < 100.0);
        assert!(rgb_to_lab8([240, 217, 181]).l > 200.0);
    }

    #[test]
    fn yellow_has_positive_b() {
        let yellow = rgb_to_lab8([240, 200, 80]);
        assert!(yellow.b > 170.0, "b = {}", yellow.b);
        let blue = rgb_to_lab8([40, 60, 200]);
        assert!(blue.b < 100.0, "b = {}", blue.b);
    }
}
