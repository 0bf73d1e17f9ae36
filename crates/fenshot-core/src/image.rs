/// Borrowed, row-major interleaved RGB buffer (`len = width * height * 3`).
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// Image of the given size filled with a single colour.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 3;
            self.data[idx..idx + 3].copy_from_slice(&rgb);
        }
    }

    /// Fill the axis-aligned rectangle `[x0, x1) x [y0, y1)`, clipped to the image.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.put_pixel(x, y, rgb);
            }
        }
    }

    /// Rotate by 180 degrees (pixel `(x, y)` moves to `(w-1-x, h-1-y)`).
    pub fn rotated_180(&self) -> RgbImage {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3).rev() {
            data.extend_from_slice(px);
        }
        RgbImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl RgbImageView<'_> {
    /// Pixel at integer coordinates, `None` outside the image.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

#[inline]
fn get_rgb(src: &RgbImageView<'_>, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 {
        return [0.0; 3];
    }
    match src.pixel(x as usize, y as usize) {
        Some([r, g, b]) => [r as f32, g as f32, b as f32],
        None => [0.0; 3],
    }
}

/// Bilinear sample of all three channels; pixels outside the image read as black.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImageView<'_>, x: f32, y: f32) -> [f32; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    let p10 = get_rgb(src, x0 + 1, y0);
    let p01 = get_rgb(src, x0, y0 + 1);
    let p11 = get_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = a + fy * (b - a);
    }
    out
}

#[inline]
pub fn sample_bilinear_rgb_u8(src: &RgbImageView<'_>, x: f32, y: f32) -> [u8; 3] {
    sample_bilinear_rgb(src, x, y).map(|v| v.clamp(0.0, 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_interpolates_between_neighbours() {
        let mut img = RgbImage::filled(2, 1, [0, 0, 0]);
        img.put_pixel(1, 0, [200, 100, 50]);
        let v = sample_bilinear_rgb(&img.view(), 0.5, 0.0);
        assert_eq!(v, [100.0, 50.0, 25.0]);
    }

    #[test]
    fn samples_outside_read_black() {
        let img = RgbImage::filled(4, 4, [255, 255, 255]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), -5.0, -5.0), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), 1.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn rotation_moves_origin_to_far_corner() {
        let mut img = RgbImage::filled(3, 2, [0, 0, 0]);
        img.put_pixel(0, 0, [9, 8, 7]);
        let rot = img.rotated_180();
        assert_eq!(rot.view().pixel(2, 1), Some([9, 8, 7]));
        assert_eq!(rot.view().pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(rot.rotated_180(), img);
    }
}
