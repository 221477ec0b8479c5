//! Thumbnail rendering.
//!
//! Turns any blob plus its declared MIME type into a fixed-size JPEG data
//! URI. Images are decoded and fitted onto a card; everything else, and
//! images that fail to decode, gets a colored file icon labelled with the
//! extension, size and type.

mod filetype;
mod font;
mod surface;

pub use filetype::{adjust_brightness, extension_for, FileFamily};
pub use surface::{Paint, Rect, Surface, MAX_DIMENSION};

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::config::ThumbnailConfig;
use crate::format::format_size;
use crate::Result;

const BACKGROUND_FROM: [u8; 3] = [0xf8, 0xfa, 0xfc];
const BACKGROUND_TO: [u8; 3] = [0xf1, 0xf5, 0xf9];
const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

/// Layout reference size; icon geometry is expressed in these units.
const REFERENCE_SIZE: f32 = 300.0;

/// A 1x1 GIF used when no thumbnail can be produced at all.
const PLACEHOLDER_DATA_URI: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

/// Static placeholder image for files whose thumbnail cannot be rendered.
pub fn placeholder_data_uri() -> &'static str {
    PLACEHOLDER_DATA_URI
}

/// Renders thumbnails with a fixed canvas configuration.
#[derive(Debug, Clone)]
pub struct ThumbnailRenderer {
    size: u32,
    inner_size: u32,
    quality: u8,
}

impl Default for ThumbnailRenderer {
    fn default() -> Self {
        Self::new(&ThumbnailConfig::default())
    }
}

impl ThumbnailRenderer {
    /// Create a renderer from configuration.
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            size: config.size,
            inner_size: config.inner_size.min(config.size),
            quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Canvas edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Render a thumbnail as a JPEG data URI.
    ///
    /// Decode failures fall back to the file icon. The only error is
    /// `RenderSurfaceUnavailable`, when the canvas cannot be created or encoded.
    pub fn render(&self, data: &[u8], mime_type: &str) -> Result<String> {
        let mut surface = Surface::acquire(self.size, self.size)?;
        let edge = self.size as f32;

        surface.fill(Paint::Linear {
            from: BACKGROUND_FROM,
            to: BACKGROUND_TO,
            start: (0.0, 0.0),
            end: (edge, edge),
        });

        if mime_type.starts_with("image/") {
            match image::load_from_memory(data) {
                Ok(decoded) => self.draw_image(&mut surface, &decoded),
                Err(e) => {
                    debug!(mime_type, error = %e, "image decode failed, drawing file icon");
                    self.draw_file_icon(&mut surface, mime_type, data.len() as u64);
                }
            }
        } else {
            self.draw_file_icon(&mut surface, mime_type, data.len() as u64);
        }

        surface.into_data_uri(self.quality)
    }

    /// Fit the image into the inner box on a white card with a soft shadow.
    fn draw_image(&self, surface: &mut Surface, decoded: &DynamicImage) {
        let fitted = decoded
            .resize(self.inner_size, self.inner_size, FilterType::Triangle)
            .to_rgba8();
        let (width, height) = (fitted.width() as f32, fitted.height() as f32);
        let x = ((self.size as f32 - width) / 2.0).floor();
        let y = ((self.size as f32 - height) / 2.0).floor();
        let k = self.scale();

        let card = Rect::new(x, y, width, height).inflate(5.0 * k);
        surface.drop_shadow(card.offset_y(4.0 * k), 8.0 * k, 10.0 * k, 0.1);
        surface.fill_rounded_rect(card, 8.0 * k, Paint::Solid(WHITE), 1.0);
        surface.draw_image_clipped(&fitted, x, y, 4.0 * k);
    }

    /// Draw a colored file card labelled with extension, size and type.
    fn draw_file_icon(&self, surface: &mut Surface, mime_type: &str, size: u64) {
        let k = self.scale();
        let family = FileFamily::of(mime_type);
        let color = family.color();

        let card = Rect::new(75.0 * k, 75.0 * k, 150.0 * k, 180.0 * k);
        surface.drop_shadow(card.offset_y(8.0 * k), 12.0 * k, 15.0 * k, 0.2);
        surface.fill_rounded_rect(
            card,
            12.0 * k,
            Paint::Linear {
                from: color,
                to: adjust_brightness(color, -20),
                start: (75.0 * k, 75.0 * k),
                end: (225.0 * k, 225.0 * k),
            },
            1.0,
        );

        // Folded corner
        surface.fill_triangle(
            [
                (195.0 * k, 75.0 * k),
                (225.0 * k, 105.0 * k),
                (195.0 * k, 105.0 * k),
            ],
            WHITE,
            0.3,
        );

        let center = 150.0 * k;
        let label = extension_for(mime_type).to_uppercase();
        surface.draw_text_centered(&label, center, 140.0 * k, self.text_scale(4.0), WHITE, 1.0);
        surface.draw_text_centered(
            &format_size(size),
            center,
            165.0 * k,
            self.text_scale(2.0),
            WHITE,
            0.8,
        );
        surface.draw_text_centered(
            family.description(),
            center,
            200.0 * k,
            self.text_scale(2.0),
            WHITE,
            0.6,
        );
    }

    fn scale(&self) -> f32 {
        self.size as f32 / REFERENCE_SIZE
    }

    fn text_scale(&self, base: f32) -> u32 {
        (base * self.scale()).round().max(1.0) as u32
    }
}
