//! Injectable seams to the browser-automation and design-tool services.
//!
//! Implement these traits to plug in a real automation backend, the
//! MCP-style HTTP bridges in [`crate::mcp`], or the test fakes in
//! [`crate::fakes`].

use std::collections::BTreeMap;
use std::io::Cursor;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::domain::Viewport;
use crate::error::{Result, ReviewError};

/// Raw RGBA image returned by a screenshot or design-tool export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub width: u32,
    pub height: u32,

    /// Row-major RGBA8 pixels; `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl ImageHandle {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// An image filled with a single colour.
    pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let rgba = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, rgba)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.rgba.is_empty()
    }

    /// Decode a PNG or JPEG.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(image::load_from_memory(bytes)?.to_rgba8().into())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let img = self.to_rgba_image().ok_or_else(|| {
            ReviewError::Capture(format!(
                "image is {}x{} but carries {} bytes",
                self.width,
                self.height,
                self.rgba.len()
            ))
        })?;
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    /// `None` when the pixel buffer does not match the dimensions.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }

    /// RGBA of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl From<RgbaImage> for ImageHandle {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}

/// Console message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Error,
    Warning,
    Info,
    Log,
}

/// A browser console message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Web performance timings for the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Largest Contentful Paint in milliseconds.
    pub lcp_ms: f64,

    /// First Input Delay in milliseconds.
    pub fid_ms: f64,

    /// Cumulative Layout Shift (unitless).
    pub cls: f64,
}

/// Design variables of a node, keyed by variable name.
pub type VariableDefs = BTreeMap<String, String>;

/// Browser automation bridge.
#[async_trait]
pub trait BrowserBridge: Send + Sync {
    /// Navigate to `url` with the given viewport.
    async fn navigate(&self, url: &str, viewport: Viewport) -> Result<()>;

    /// Screenshot the element matching `selector`, or the page.
    async fn screenshot(&self, selector: Option<&str>, full_page: bool) -> Result<ImageHandle>;

    /// Visible HTML of the element matching `selector`, or the document.
    async fn visible_html(&self, selector: Option<&str>) -> Result<String>;

    async fn visible_text(&self) -> Result<String>;

    /// Console messages, optionally restricted to one level.
    async fn console_logs(&self, filter: Option<ConsoleLevel>) -> Result<Vec<ConsoleMessage>>;

    async fn performance_metrics(&self) -> Result<PerformanceMetrics>;

    async fn close(&self) -> Result<()>;
}

/// Design tool bridge (Figma dev-mode style).
#[async_trait]
pub trait DesignToolBridge: Send + Sync {
    async fn variable_defs(&self, node_id: &str) -> Result<VariableDefs>;

    /// Rendered reference image of a node.
    async fn image(&self, node_id: &str) -> Result<ImageHandle>;

    /// Generated component code for a node.
    async fn code(&self, node_id: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_image_size() {
        let img = ImageHandle::solid(3, 2, [10, 20, 30, 255]);
        assert_eq!(img.rgba.len(), 24);
        assert_eq!(img.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(img.pixel(3, 0), None);
    }

    #[test]
    fn test_png_encode_decode() {
        let img = ImageHandle::solid(5, 3, [0, 85, 255, 255]);
        let png = img.encode_png().expect("encode");
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(ImageHandle::decode(&png).expect("decode"), img);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = ImageHandle::decode(b"not an image").expect_err("garbage");
        assert!(matches!(err, ReviewError::Image(_)));
    }

    #[test]
    fn test_mismatched_buffer_has_no_image_view() {
        let img = ImageHandle::new(4, 4, vec![0; 10]);
        assert!(img.to_rgba_image().is_none());
        assert!(img.encode_png().is_err());
    }

    #[test]
    fn test_empty_image() {
        assert!(ImageHandle::new(0, 0, vec![]).is_empty());
        assert!(!ImageHandle::solid(1, 1, [0, 0, 0, 0]).is_empty());
    }
}
