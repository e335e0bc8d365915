//! Film-grain synthesis
//!
//! Grain is achromatic: one noise value is drawn per pixel and added to the
//! red, green and blue channels alike. Alpha is never touched. Sums are
//! rounded and saturated to `[0, 255]`.

use image::RgbaImage;
use rand::Rng;

/// Scale from the 0–50 slider range to a per-channel perturbation ceiling
pub const STRENGTH_PER_STEP: f32 = 2.55;

/// Peak-to-peak noise amplitude for a slider `intensity`
#[must_use]
pub fn grain_strength(intensity: u8) -> f32 {
    f32::from(intensity) * STRENGTH_PER_STEP
}

/// Add grain to `buffer` in place using the thread-local RNG
pub fn apply_grain(buffer: &mut RgbaImage, intensity: u8) {
    apply_grain_with_rng(buffer, intensity, &mut rand::thread_rng());
}

/// Add grain to `buffer` in place, drawing noise from `rng`
///
/// Each pixel receives a value drawn uniformly from
/// `[-strength / 2, +strength / 2]`. An intensity of zero leaves the buffer
/// untouched.
pub fn apply_grain_with_rng<R: Rng + ?Sized>(buffer: &mut RgbaImage, intensity: u8, rng: &mut R) {
    if intensity == 0 {
        return;
    }

    let half = grain_strength(intensity) / 2.0;
    for pixel in buffer.pixels_mut() {
        let noise: f32 = rng.gen_range(-half..=half);
        for channel in pixel.0.iter_mut().take(3) {
            *channel = add_saturating(*channel, noise);
        }
    }
}

fn add_saturating(value: u8, noise: f32) -> u8 {
    (f32::from(value) + noise).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use rand::{rngs::StdRng, SeedableRng};

    fn sample(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 11 % 256) as u8, 128, (y * 17 % 256) as u8, ((x + y) * 9 % 256) as u8])
        })
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let original = sample(16, 16);
        let mut buffer = original.clone();
        apply_grain(&mut buffer, 0);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_alpha_is_preserved() {
        let original = sample(32, 8);
        let mut buffer = original.clone();
        apply_grain(&mut buffer, 50);

        for (before, after) in original.pixels().zip(buffer.pixels()) {
            assert_eq!(before[3], after[3]);
        }
    }

    #[test]
    fn test_noise_is_achromatic() {
        let mut buffer = RgbaImage::from_pixel(20, 20, Rgba([100, 100, 100, 255]));
        apply_grain(&mut buffer, 30);

        for pixel in buffer.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn test_noise_stays_within_strength() {
        let mut buffer = RgbaImage::from_pixel(64, 64, Rgba([128, 128, 128, 255]));
        apply_grain(&mut buffer, 20);

        // strength 51 -> +-25.5, rounding allows one more step
        for pixel in buffer.pixels() {
            let delta = (i32::from(pixel[0]) - 128).abs();
            assert!(delta <= 26, "delta {}", delta);
        }
    }

    #[test]
    fn test_saturates_at_channel_bounds() {
        let mut buffer = ImageBuffer::from_fn(64, 1, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        apply_grain(&mut buffer, 50);

        // no wraparound: dark pixels stay dark, bright stay bright
        for (x, _, pixel) in buffer.enumerate_pixels() {
            if x % 2 == 0 {
                assert!(pixel[0] <= 64);
            } else {
                assert!(pixel[0] >= 191);
            }
        }
    }

    #[test]
    fn test_repeated_calls_differ() {
        let original = RgbaImage::from_pixel(32, 32, Rgba([90, 90, 90, 255]));
        let mut first = original.clone();
        let mut second = original.clone();
        apply_grain(&mut first, 40);
        apply_grain(&mut second, 40);
        assert_ne!(first, second);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let original = sample(16, 16);
        let mut first = original.clone();
        let mut second = original.clone();
        apply_grain_with_rng(&mut first, 25, &mut StdRng::seed_from_u64(9));
        apply_grain_with_rng(&mut second, 25, &mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);
        assert_ne!(first, original);
    }

    #[test]
    fn test_grain_strength() {
        assert!((grain_strength(50) - 127.5).abs() < f32::EPSILON * 128.0);
        assert!(grain_strength(0).abs() < f32::EPSILON);
    }
}
