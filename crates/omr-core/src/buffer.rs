//! Row-major image buffers used across the pipeline.
//!
//! `From` conversions borrow `image` crate buffers without copying.

/// Borrowed single-channel 8-bit image.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned single-channel 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl<'a> From<&'a ::image::GrayImage> for GrayImageView<'a> {
    fn from(img: &'a ::image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw(),
        }
    }
}

/// Borrowed interleaved 8-bit image with 1 (gray), 3 (RGB) or 4 (RGBA) channels.
#[derive(Clone, Copy, Debug)]
pub struct PixelImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: &'a [u8], // row-major, len = w*h*channels
}

/// Owned interleaved 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl PixelImage {
    pub fn view(&self) -> PixelImageView<'_> {
        PixelImageView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: &self.data,
        }
    }

    /// Copy a decoded image, keeping gray and RGBA layouts and converting
    /// everything else to RGB.
    pub fn from_dynamic(img: &::image::DynamicImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        match img {
            ::image::DynamicImage::ImageLuma8(gray) => Self {
                width,
                height,
                channels: 1,
                data: gray.as_raw().clone(),
            },
            ::image::DynamicImage::ImageRgba8(rgba) => Self {
                width,
                height,
                channels: 4,
                data: rgba.as_raw().clone(),
            },
            other => Self {
                width,
                height,
                channels: 3,
                data: other.to_rgb8().into_raw(),
            },
        }
    }
}

impl<'a> From<&'a ::image::RgbImage> for PixelImageView<'a> {
    fn from(img: &'a ::image::RgbImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            channels: 3,
            data: img.as_raw(),
        }
    }
}

impl<'a> From<&'a ::image::RgbaImage> for PixelImageView<'a> {
    fn from(img: &'a ::image::RgbaImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            channels: 4,
            data: img.as_raw(),
        }
    }
}

impl<'a> From<&'a ::image::GrayImage> for PixelImageView<'a> {
    fn from(img: &'a ::image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            channels: 1,
            data: img.as_raw(),
        }
    }
}

impl PixelImageView<'_> {
    /// Luma conversion with ITU-R BT.601 weights; alpha is ignored.
    pub fn to_gray(&self) -> GrayImage {
        let n = self.width * self.height;
        let data = match self.channels {
            1 => self.data[..n].to_vec(),
            c if c >= 3 => self
                .data
                .chunks_exact(c)
                .take(n)
                .map(|px| {
                    let l = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                    ((l + 500) / 1000) as u8
                })
                .collect(),
            // Two-channel (gray + alpha) input.
            c => self.data.chunks_exact(c).take(n).map(|px| px[0]).collect(),
        };
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }

    #[inline]
    fn get(&self, x: i32, y: i32, c: usize) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[(y as usize * self.width + x as usize) * self.channels + c]
    }
}

/// Bilinear sample of channel `c` at pixel-index coordinates (integer values
/// hit pixel centers). Out-of-bounds neighbours read as 0.
#[inline]
pub fn sample_bilinear(src: &PixelImageView<'_>, x: f32, y: f32, c: usize) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = src.get(x0, y0, c) as f32;
    let p10 = src.get(x0 + 1, y0, c) as f32;
    let p01 = src.get(x0, y0 + 1, c) as f32;
    let p11 = src.get(x0 + 1, y0 + 1, c) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Thresholded image: non-zero bytes are foreground (ink).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinaryImage {
    pub const FOREGROUND: u8 = 255;

    /// All-background image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(if f(x, y) { Self::FOREGROUND } else { 0 });
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x] != 0
    }

    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = if on { Self::FOREGROUND } else { 0 };
        }
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Copy into an `image::GrayImage` (foreground = 255) for `imageproc`.
    pub fn to_luma(&self) -> ::image::GrayImage {
        ::image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            ::image::Luma([self.data[y as usize * self.width + x as usize]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_to_gray_uses_luma_weights() {
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let view = PixelImageView {
            width: 4,
            height: 1,
            channels: 3,
            data: &data,
        };
        let gray = view.to_gray();
        assert_eq!(gray.data, vec![76, 150, 29, 255]);
    }

    #[test]
    fn bilinear_hits_pixel_centers_exactly() {
        let data = vec![10, 20, 30, 40];
        let view = PixelImageView {
            width: 2,
            height: 2,
            channels: 1,
            data: &data,
        };
        assert_eq!(sample_bilinear(&view, 1.0, 0.0, 0), 20.0);
        assert_eq!(sample_bilinear(&view, 0.5, 0.5, 0), 25.0);
    }

    #[test]
    fn binary_image_counts_foreground() {
        let img = BinaryImage::from_fn(4, 3, |x, y| x == y);
        assert_eq!(img.foreground_count(), 3);
        assert!(img.is_foreground(2, 2));
        assert!(!img.is_foreground(3, 2));
        assert!(!img.is_foreground(10, 10));
    }
}
