//! Edge-correct background blur
//!
//! Blurring a bitmap directly and cropping it back pulls empty pixels in from
//! outside the canvas, which shows up as a dark or transparent fringe along
//! the borders. The compositor instead blurs a working surface padded on all
//! sides with edge-clamped content: each outer strip of the source is
//! stretched across its padding band and each padding corner is filled with
//! the matching corner pixel. The blurred surface is then cropped back to the
//! canvas size.

use crate::config::EditorConfig;
use image::{imageops, ImageBuffer, RgbaImage};
use tracing::{instrument, trace};

/// Padding per unit of blur radius
pub const DEFAULT_PADDING_FACTOR: u32 = 3;

/// Upper bound for padding on each side, in pixels
pub const DEFAULT_PADDING_CAP: u32 = 100;

/// Padding used for `radius` with the default factor and cap
#[must_use]
pub fn padding_for_radius(radius: u32) -> u32 {
    radius
        .saturating_mul(DEFAULT_PADDING_FACTOR)
        .min(DEFAULT_PADDING_CAP)
}

/// Extend `image` by `pad` pixels on every side with edge-clamped content
///
/// Every padded pixel takes the value of the nearest source pixel, which
/// stretches the outermost rows and columns over the bands and fills the
/// corners with the corner pixels.
#[must_use]
pub fn pad_edge_clamped(image: &RgbaImage, pad: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if pad == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;
    let offset = i64::from(pad);

    ImageBuffer::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = (i64::from(x) - offset).clamp(0, max_x) as u32;
        let sy = (i64::from(y) - offset).clamp(0, max_y) as u32;
        *image.get_pixel(sx, sy)
    })
}

/// Blurs the full canvas area without border fringing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundBlurCompositor {
    padding_factor: u32,
    padding_cap: u32,
}

impl Default for BackgroundBlurCompositor {
    fn default() -> Self {
        Self {
            padding_factor: DEFAULT_PADDING_FACTOR,
            padding_cap: DEFAULT_PADDING_CAP,
        }
    }
}

impl BackgroundBlurCompositor {
    #[must_use]
    pub fn new(padding_factor: u32, padding_cap: u32) -> Self {
        Self {
            padding_factor,
            padding_cap,
        }
    }

    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.blur_padding_factor, config.blur_padding_cap)
    }

    /// Padding applied on each side for `radius`
    #[must_use]
    pub fn padding(&self, radius: u32) -> u32 {
        radius
            .saturating_mul(self.padding_factor)
            .min(self.padding_cap)
    }

    /// Blur `image` drawn at `width`×`height` with a Gaussian of standard deviation `radius`
    ///
    /// The output is always exactly `width`×`height`. A radius of zero returns
    /// the image unchanged.
    #[instrument(skip(self, image), fields(src_width = image.width(), src_height = image.height()))]
    pub fn blur_background(&self, image: &RgbaImage, width: u32, height: u32, radius: u32) -> RgbaImage {
        let fitted = if image.dimensions() == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, width, height, imageops::FilterType::Triangle)
        };

        if radius == 0 || width == 0 || height == 0 {
            return fitted;
        }

        let pad = self.padding(radius);
        let padded = pad_edge_clamped(&fitted, pad);
        trace!(
            pad,
            padded_width = padded.width(),
            padded_height = padded.height(),
            "Blurring padded surface"
        );

        let blurred = imageops::blur(&padded, radius as f32);
        imageops::crop_imm(&blurred, pad, pad, width, height).to_image()
    }
}

/// Blur with the default padding settings
#[must_use]
pub fn blur_background(image: &RgbaImage, width: u32, height: u32, radius: u32) -> RgbaImage {
    BackgroundBlurCompositor::default().blur_background(image, width, height, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn test_padding_for_radius() {
        assert_eq!(padding_for_radius(0), 0);
        assert_eq!(padding_for_radius(1), 3);
        assert_eq!(padding_for_radius(15), 45);
        assert_eq!(padding_for_radius(34), 100);
        assert_eq!(padding_for_radius(1000), 100);
    }

    #[test]
    fn test_pad_edge_clamped_bands_and_corners() {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([1, 0, 0, 255]));
        image.put_pixel(2, 0, Rgba([2, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([3, 0, 0, 255]));
        image.put_pixel(2, 1, Rgba([4, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([5, 0, 0, 255]));

        let padded = pad_edge_clamped(&image, 2);
        assert_eq!(padded.dimensions(), (7, 6));

        // corners come from the matching corner pixel
        assert_eq!(padded.get_pixel(0, 0)[0], 1);
        assert_eq!(padded.get_pixel(6, 0)[0], 2);
        assert_eq!(padded.get_pixel(0, 5)[0], 3);
        assert_eq!(padded.get_pixel(6, 5)[0], 4);

        // top band stretches the top row
        assert_eq!(padded.get_pixel(3, 0)[0], 5);
        assert_eq!(padded.get_pixel(3, 1)[0], 5);

        // centre is the source
        assert_eq!(padded.get_pixel(2, 2), image.get_pixel(0, 0));
        assert_eq!(padded.get_pixel(4, 3), image.get_pixel(2, 1));
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let image = gradient(23, 17);
        let result = blur_background(&image, 23, 17, 0);
        assert_eq!(result, image);
    }

    #[test]
    fn test_output_dimensions_match_canvas() {
        let image = gradient(31, 9);
        for radius in [1, 4, 8, 15, 60] {
            let result = blur_background(&image, 31, 9, radius);
            assert_eq!(result.dimensions(), (31, 9), "radius {}", radius);
        }
    }

    #[test]
    fn test_no_fringe_on_uniform_image() {
        let image = RgbaImage::from_pixel(40, 30, Rgba([200, 120, 40, 255]));
        let result = blur_background(&image, 40, 30, 8);

        for (x, y) in [(0, 0), (39, 0), (0, 29), (39, 29), (20, 0), (0, 15)] {
            let pixel = result.get_pixel(x, y);
            assert_eq!(pixel[3], 255, "alpha at ({x}, {y})");
            assert!((i32::from(pixel[0]) - 200).abs() <= 1, "red at ({x}, {y}) = {}", pixel[0]);
            assert!((i32::from(pixel[1]) - 120).abs() <= 1);
            assert!((i32::from(pixel[2]) - 40).abs() <= 1);
        }
    }

    #[test]
    fn test_border_keeps_local_colour() {
        // left half black, right half white: the outer columns stay close to their own side
        let image = ImageBuffer::from_fn(60, 20, |x, _| {
            if x < 30 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let result = blur_background(&image, 60, 20, 4);

        assert!(result.get_pixel(0, 0)[0] < 10);
        assert!(result.get_pixel(59, 19)[0] > 245);
        // the seam is actually blurred
        let seam = result.get_pixel(30, 10)[0];
        assert!(seam > 20 && seam < 235, "seam value {}", seam);
    }

    #[test]
    fn test_resizes_to_canvas_when_needed() {
        let image = gradient(10, 10);
        let result = blur_background(&image, 20, 5, 2);
        assert_eq!(result.dimensions(), (20, 5));
    }

    #[test]
    fn test_custom_padding() {
        let compositor = BackgroundBlurCompositor::new(2, 10);
        assert_eq!(compositor.padding(3), 6);
        assert_eq!(compositor.padding(9), 10);
        assert_eq!(compositor, BackgroundBlurCompositor::from_config(
            &EditorConfig::builder().blur_padding(2, 10).build().unwrap()
        ));
    }
}
