//! Drawing surface for thumbnails.
//!
//! A `Surface` owns an opaque RGB canvas. It is acquired once per render,
//! drawn on, and consumed by `into_data_uri`; dropping it on any early
//! return releases the pixel buffer.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use super::font;
use crate::{Result, VaultError};

/// Largest canvas edge accepted, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflate(self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    /// Move the rectangle down by `dy`.
    pub fn offset_y(self, dy: f32) -> Self {
        Self::new(self.x, self.y + dy, self.width, self.height)
    }

    /// Signed distance from a point to the rounded rectangle (negative inside).
    fn rounded_distance(&self, px: f32, py: f32, radius: f32) -> f32 {
        let radius = radius.min(self.width / 2.0).min(self.height / 2.0).max(0.0);
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        let dx = (px - cx).abs() - (self.width / 2.0 - radius);
        let dy = (py - cy).abs() - (self.height / 2.0 - radius);
        let outside = (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt();
        outside + dx.max(dy).min(0.0) - radius
    }

    /// Pixel bounds clamped to a canvas, as (x0, y0, x1, y1) exclusive.
    fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clamp = |v: f32, max: u32| v.max(0.0).min(max as f32) as u32;
        (
            clamp(self.x.floor(), width),
            clamp(self.y.floor(), height),
            clamp((self.x + self.width).ceil(), width),
            clamp((self.y + self.height).ceil(), height),
        )
    }
}

/// Fill style.
#[derive(Debug, Clone, Copy)]
pub enum Paint {
    Solid([u8; 3]),
    /// Linear gradient from `start` (color `from`) to `end` (color `to`).
    Linear {
        from: [u8; 3],
        to: [u8; 3],
        start: (f32, f32),
        end: (f32, f32),
    },
}

impl Paint {
    fn color_at(&self, px: f32, py: f32) -> [u8; 3] {
        match *self {
            Paint::Solid(rgb) => rgb,
            Paint::Linear {
                from,
                to,
                start,
                end,
            } => {
                let (vx, vy) = (end.0 - start.0, end.1 - start.1);
                let len_sq = vx * vx + vy * vy;
                let t = if len_sq > 0.0 {
                    (((px - start.0) * vx + (py - start.1) * vy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                mix(from, to, t)
            }
        }
    }
}

/// Opaque RGB drawing surface.
pub struct Surface {
    canvas: RgbImage,
}

impl Surface {
    /// Acquire a canvas of the given size.
    pub fn acquire(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(VaultError::RenderSurfaceUnavailable(format!(
                "cannot allocate a {width}x{height} canvas"
            )));
        }

        Ok(Self {
            canvas: RgbImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Paint the whole canvas.
    pub fn fill(&mut self, paint: Paint) {
        for (x, y, pixel) in self.canvas.enumerate_pixels_mut() {
            pixel.0 = paint.color_at(x as f32 + 0.5, y as f32 + 0.5);
        }
    }

    /// Fill a rounded rectangle with anti-aliased edges.
    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, paint: Paint, alpha: f32) {
        let (x0, y0, x1, y1) = rect.pixel_bounds(self.width(), self.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (0.5 - rect.rounded_distance(px, py, radius)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, paint.color_at(px, py), coverage * alpha);
                }
            }
        }
    }

    /// Draw a soft shadow for a rounded rectangle, fading out over `blur` pixels.
    pub fn drop_shadow(&mut self, rect: Rect, radius: f32, blur: f32, alpha: f32) {
        let blur = blur.max(1.0);
        let area = rect.inflate(blur);
        let (x0, y0, x1, y1) = area.pixel_bounds(self.width(), self.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let distance = rect.rounded_distance(x as f32 + 0.5, y as f32 + 0.5, radius);
                let falloff = (0.5 - distance / blur).clamp(0.0, 1.0);
                if falloff > 0.0 {
                    self.blend(x, y, [0, 0, 0], falloff * alpha);
                }
            }
        }
    }

    /// Composite an image at (x, y), clipped to rounded corners.
    pub fn draw_image_clipped(&mut self, image: &RgbaImage, x: f32, y: f32, radius: f32) {
        let rect = Rect::new(x, y, image.width() as f32, image.height() as f32);
        let (x0, y0, x1, y1) = rect.pixel_bounds(self.width(), self.height());
        for cy in y0..y1 {
            for cx in x0..x1 {
                let (px, py) = (cx as f32 + 0.5, cy as f32 + 0.5);
                let sx = (px - x).floor();
                let sy = (py - y).floor();
                if sx < 0.0 || sy < 0.0 || sx >= rect.width || sy >= rect.height {
                    continue;
                }
                let source = image.get_pixel(sx as u32, sy as u32).0;
                let coverage = (0.5 - rect.rounded_distance(px, py, radius)).clamp(0.0, 1.0);
                let alpha = coverage * source[3] as f32 / 255.0;
                if alpha > 0.0 {
                    self.blend(cx, cy, [source[0], source[1], source[2]], alpha);
                }
            }
        }
    }

    /// Fill a triangle (no anti-aliasing).
    pub fn fill_triangle(&mut self, points: [(f32, f32); 3], rgb: [u8; 3], alpha: f32) {
        let min_x = points.iter().map(|p| p.0).fold(f32::MAX, f32::min);
        let min_y = points.iter().map(|p| p.1).fold(f32::MAX, f32::min);
        let max_x = points.iter().map(|p| p.0).fold(f32::MIN, f32::max);
        let max_y = points.iter().map(|p| p.1).fold(f32::MIN, f32::max);
        let bounds = Rect::new(min_x, min_y, max_x - min_x, max_y - min_y);
        let (x0, y0, x1, y1) = bounds.pixel_bounds(self.width(), self.height());

        let edge = |a: (f32, f32), b: (f32, f32), p: (f32, f32)| {
            (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
        };
        let [a, b, c] = points;

        for y in y0..y1 {
            for x in x0..x1 {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let (w0, w1, w2) = (edge(a, b, p), edge(b, c, p), edge(c, a, p));
                let inside =
                    (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if inside {
                    self.blend(x, y, rgb, alpha);
                }
            }
        }
    }

    /// Draw text centered on `center_x` with its bottom edge at `baseline`.
    pub fn draw_text_centered(
        &mut self,
        text: &str,
        center_x: f32,
        baseline: f32,
        scale: u32,
        rgb: [u8; 3],
        alpha: f32,
    ) {
        let scale = scale.max(1);
        let width = (font::text_width(text) * scale) as f32;
        let left = (center_x - width / 2.0).round() as i64;
        let top = (baseline - (font::GLYPH_HEIGHT * scale) as f32).round() as i64;

        for (index, c) in text.chars().enumerate() {
            let origin_x = left + (index as u32 * font::ADVANCE * scale) as i64;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let px = origin_x + (col * scale) as i64;
                    let py = top + (row as u32 * scale) as i64;
                    self.fill_block(px, py, scale, rgb, alpha);
                }
            }
        }
    }

    fn fill_block(&mut self, x: i64, y: i64, size: u32, rgb: [u8; 3], alpha: f32) {
        for dy in 0..size as i64 {
            for dx in 0..size as i64 {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 && px < self.width() as i64 && py < self.height() as i64 {
                    self.blend(px as u32, py as u32, rgb, alpha);
                }
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f32) {
        let pixel = self.canvas.get_pixel_mut(x, y);
        pixel.0 = mix(pixel.0, rgb, alpha.clamp(0.0, 1.0));
    }

    /// Read back a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.canvas.get_pixel(x, y).0
    }

    /// Encode the canvas as a JPEG data URI, releasing the surface.
    pub fn into_data_uri(self, quality: u8) -> Result<String> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .write_image(
                self.canvas.as_raw(),
                self.canvas.width(),
                self.canvas.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| VaultError::RenderSurfaceUnavailable(format!("JPEG encoding failed: {e}")))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
        Ok(format!("data:image/jpeg;base64,{encoded}"))
    }
}

fn mix(from: [u8; 3], to: [u8; 3], t: f32) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let value = from[i] as f32 + (to[i] as f32 - from[i] as f32) * t;
        out[i] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_rejects_degenerate_sizes() {
        assert!(matches!(
            Surface::acquire(0, 10),
            Err(VaultError::RenderSurfaceUnavailable(_))
        ));
        assert!(Surface::acquire(MAX_DIMENSION + 1, 10).is_err());
        assert!(Surface::acquire(10, 10).is_ok());
    }

    #[test]
    fn test_fill_solid() {
        let mut surface = Surface::acquire(4, 4).unwrap();
        surface.fill(Paint::Solid([1, 2, 3]));
        assert_eq!(surface.pixel(0, 0), [1, 2, 3]);
        assert_eq!(surface.pixel(3, 3), [1, 2, 3]);
    }

    #[test]
    fn test_linear_gradient_endpoints() {
        let mut surface = Surface::acquire(100, 100).unwrap();
        surface.fill(Paint::Linear {
            from: [0, 0, 0],
            to: [200, 200, 200],
            start: (0.0, 0.0),
            end: (100.0, 100.0),
        });
        assert!(surface.pixel(0, 0)[0] < 5);
        assert!(surface.pixel(99, 99)[0] > 195);
        let mid = surface.pixel(50, 50)[0];
        assert!((95..=105).contains(&mid));
    }

    #[test]
    fn test_rounded_rect_leaves_corners() {
        let mut surface = Surface::acquire(40, 40).unwrap();
        surface.fill(Paint::Solid([0, 0, 0]));
        surface.fill_rounded_rect(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            12.0,
            Paint::Solid([255, 255, 255]),
            1.0,
        );
        assert_eq!(surface.pixel(0, 0), [0, 0, 0]);
        assert_eq!(surface.pixel(20, 20), [255, 255, 255]);
        assert_eq!(surface.pixel(20, 0), [255, 255, 255]);
    }

    #[test]
    fn test_blend_alpha() {
        let mut surface = Surface::acquire(1, 1).unwrap();
        surface.fill(Paint::Solid([0, 0, 0]));
        surface.fill_rounded_rect(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            0.0,
            Paint::Solid([200, 200, 200]),
            0.5,
        );
        assert_eq!(surface.pixel(0, 0), [100, 100, 100]);
    }

    #[test]
    fn test_triangle_fill() {
        let mut surface = Surface::acquire(10, 10).unwrap();
        surface.fill(Paint::Solid([0, 0, 0]));
        surface.fill_triangle([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], [255, 0, 0], 1.0);
        assert_eq!(surface.pixel(1, 1), [255, 0, 0]);
        assert_eq!(surface.pixel(9, 9), [0, 0, 0]);
    }

    #[test]
    fn test_shadow_darkens_below_rect() {
        let mut surface = Surface::acquire(60, 60).unwrap();
        surface.fill(Paint::Solid([255, 255, 255]));
        surface.drop_shadow(Rect::new(20.0, 20.0, 20.0, 20.0), 4.0, 10.0, 0.5);
        assert!(surface.pixel(30, 30)[0] < 255);
        assert_eq!(surface.pixel(0, 0), [255, 255, 255]);
    }

    #[test]
    fn test_draw_image_clipped_respects_alpha() {
        let mut surface = Surface::acquire(10, 10).unwrap();
        surface.fill(Paint::Solid([0, 0, 0]));
        let mut picture = RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        picture.put_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
        surface.draw_image_clipped(&picture, 2.0, 2.0, 0.0);

        assert_eq!(surface.pixel(2, 2), [255, 255, 255]);
        assert_eq!(surface.pixel(3, 3), [0, 0, 0]);
        assert_eq!(surface.pixel(7, 7), [0, 0, 0]);
    }

    #[test]
    fn test_text_draws_pixels() {
        let mut surface = Surface::acquire(50, 20).unwrap();
        surface.fill(Paint::Solid([0, 0, 0]));
        surface.draw_text_centered("I", 25.0, 15.0, 1, [255, 255, 255], 1.0);
        // Middle column of "I" is lit at the row above the baseline.
        assert_eq!(surface.pixel(25, 14), [255, 255, 255]);
    }

    #[test]
    fn test_into_data_uri() {
        let mut surface = Surface::acquire(8, 8).unwrap();
        surface.fill(Paint::Solid([10, 20, 30]));
        let uri = surface.into_data_uri(90).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.len() > "data:image/jpeg;base64,".len());
    }

    #[test]
    fn test_mix() {
        assert_eq!(mix([0, 0, 0], [255, 255, 255], 0.0), [0, 0, 0]);
        assert_eq!(mix([0, 0, 0], [255, 255, 255], 1.0), [255, 255, 255]);
        assert_eq!(mix([0, 100, 200], [100, 100, 0], 0.5), [50, 100, 100]);
    }
}
