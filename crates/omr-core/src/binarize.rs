//! Ink segmentation: Gaussian pre-blur followed by an inverted,
//! Gaussian-weighted adaptive threshold.

use crate::{BinaryImage, GrayImageView};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Adaptive threshold settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeParams {
    /// Sigma of the smoothing blur applied before thresholding (`0` disables).
    ///
    /// The default matches a 5×5 Gaussian kernel.
    pub pre_blur_sigma: f32,
    /// Odd neighbourhood size used for the local Gaussian mean (≥ 3).
    pub block_size: u32,
    /// Constant subtracted from the local mean; a pixel is ink when
    /// `gray <= mean - offset`.
    pub offset: f32,
}

impl Default for BinarizeParams {
    fn default() -> Self {
        Self {
            pre_blur_sigma: 1.1,
            block_size: 11,
            offset: 2.0,
        }
    }
}

impl BinarizeParams {
    /// Gaussian sigma equivalent to a `block_size` kernel.
    pub fn block_sigma(&self) -> f32 {
        let k = self.block_size.max(3) as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

/// Segment dark ink from a grayscale image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(gray, params), fields(width = gray.width, height = gray.height))
)]
pub fn binarize(gray: &GrayImageView<'_>, params: &BinarizeParams) -> BinaryImage {
    let Some(src) = ::image::GrayImage::from_raw(
        gray.width as u32,
        gray.height as u32,
        gray.data[..gray.width * gray.height].to_vec(),
    ) else {
        return BinaryImage::new(gray.width, gray.height);
    };

    let smoothed = if params.pre_blur_sigma > 0.0 {
        gaussian_blur_f32(&src, params.pre_blur_sigma)
    } else {
        src
    };
    let mean = gaussian_blur_f32(&smoothed, params.block_sigma());

    let data = smoothed
        .as_raw()
        .iter()
        .zip(mean.as_raw())
        .map(|(&v, &m)| {
            if v as f32 <= m as f32 - params.offset {
                BinaryImage::FOREGROUND
            } else {
                0
            }
        })
        .collect();

    BinaryImage {
        width: gray.width,
        height: gray.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrayImage;

    fn white_with_black_square(w: usize, h: usize, x0: usize, y0: usize, s: usize) -> GrayImage {
        let mut data = vec![255u8; w * h];
        for y in y0..y0 + s {
            for x in x0..x0 + s {
                data[y * w + x] = 0;
            }
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn flat_image_has_no_ink() {
        let img = GrayImage {
            width: 32,
            height: 32,
            data: vec![200; 32 * 32],
        };
        let bin = binarize(&img.view(), &BinarizeParams::default());
        assert_eq!(bin.foreground_count(), 0);
    }

    #[test]
    fn dark_square_edges_become_ink() {
        let img = white_with_black_square(40, 40, 12, 12, 16);
        let bin = binarize(&img.view(), &BinarizeParams::default());
        // Inside the square, one pixel from its border.
        assert!(bin.is_foreground(13, 20));
        assert!(bin.is_foreground(20, 13));
        // Far outside the square.
        assert!(!bin.is_foreground(2, 2));
        assert!(!bin.is_foreground(37, 37));
    }

    #[test]
    fn block_sigma_matches_kernel_rule() {
        let params = BinarizeParams::default();
        approx::assert_relative_eq!(params.block_sigma(), 2.0, epsilon = 1e-6);
    }
}
