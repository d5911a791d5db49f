//! Perceptual image comparison.
//!
//! Both images are flattened onto white, converted to luma and resampled to
//! a fixed 16×16 grid, which makes the comparison independent of resolution
//! and tolerant of anti-aliasing noise. Similarity is
//! `100 * (1 - mean|Δ| / 255)`.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::bridge::ImageHandle;

const GRID: u32 = 16;

/// Outcome of comparing an implementation against a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualComparison {
    /// Similarity percentage in `0.0..=100.0`.
    pub similarity: f64,
    pub threshold: f64,
    pub passed: bool,
}

/// Compare two images against a tolerance threshold (percent).
pub fn compare(reference: &ImageHandle, actual: &ImageHandle, threshold: f64) -> VisualComparison {
    let similarity = similarity(reference, actual);
    VisualComparison {
        similarity,
        threshold,
        passed: similarity >= threshold,
    }
}

/// Similarity percentage of two images. Empty or malformed images compare
/// as 0.
pub fn similarity(a: &ImageHandle, b: &ImageHandle) -> f64 {
    let (Some(grid_a), Some(grid_b)) = (luma_grid(a), luma_grid(b)) else {
        return 0.0;
    };
    let total_diff: f64 = grid_a
        .pixels()
        .zip(grid_b.pixels())
        .map(|(x, y)| (f64::from(x[0]) - f64::from(y[0])).abs())
        .sum();
    let mean_diff = total_diff / f64::from(GRID * GRID);
    (100.0 * (1.0 - mean_diff / 255.0)).clamp(0.0, 100.0)
}

fn luma_grid(img: &ImageHandle) -> Option<GrayImage> {
    if img.is_empty() {
        return None;
    }
    let pixels = img.to_rgba_image()?;
    let mut flat = RgbaImage::from_pixel(img.width, img.height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut flat, &pixels, 0, 0);
    let luma = imageops::grayscale(&flat);
    Some(imageops::resize(&luma, GRID, GRID, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_identical_images_are_100() {
        let img = ImageHandle::solid(64, 48, [120, 30, 200, 255]);
        assert!((similarity(&img, &img) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_black_vs_white_is_0() {
        let a = ImageHandle::solid(32, 32, BLACK);
        let b = ImageHandle::solid(32, 32, WHITE);
        assert!(similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn test_resolution_independent() {
        let small = ImageHandle::solid(8, 8, BLACK);
        let large = ImageHandle::solid(800, 600, BLACK);
        assert!((similarity(&small, &large) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_changed_is_about_50() {
        let a = ImageHandle::solid(32, 32, BLACK);
        let mut rgba = Vec::new();
        for _y in 0..32 {
            for x in 0..32 {
                rgba.extend_from_slice(if x < 16 { &BLACK } else { &WHITE });
            }
        }
        let b = ImageHandle::new(32, 32, rgba);
        let s = similarity(&a, &b);
        assert!((s - 50.0).abs() < 2.0, "similarity was {s}");
    }

    #[test]
    fn test_empty_image_is_0() {
        let a = ImageHandle::new(0, 0, vec![]);
        let b = ImageHandle::solid(4, 4, BLACK);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_malformed_buffer_is_0() {
        let a = ImageHandle::new(4, 4, vec![0; 7]);
        let b = ImageHandle::solid(4, 4, BLACK);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_decoded_screenshot_matches_reference() {
        let reference = ImageHandle::solid(40, 20, [0, 85, 255, 255]);
        let png = reference.encode_png().expect("encode");
        let screenshot = ImageHandle::decode(&png).expect("decode");
        assert!(compare(&reference, &screenshot, 95.0).passed);
    }

    #[test]
    fn test_compare_threshold() {
        let a = ImageHandle::solid(16, 16, BLACK);
        let outcome = compare(&a, &a, 95.0);
        assert!(outcome.passed);
        let b = ImageHandle::solid(16, 16, WHITE);
        let outcome = compare(&a, &b, 95.0);
        assert!(!outcome.passed);
        assert_eq!(outcome.threshold, 95.0);
    }

    #[test]
    fn test_transparent_reads_as_white() {
        let transparent = ImageHandle::solid(4, 4, [0, 0, 0, 0]);
        let white = ImageHandle::solid(4, 4, WHITE);
        assert!((similarity(&transparent, &white) - 100.0).abs() < 1e-9);
    }
}
