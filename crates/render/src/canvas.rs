use anyhow::{ensure, Result};
use image::RgbImage;

pub type Rgb = [u8; 3];

/// The rectangle of world space mapped onto a canvas. `y` points up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// A viewport centred on the origin.
    #[must_use]
    pub fn centered(half_width: f32, half_height: f32) -> Self {
        Self::new(-half_width, half_width, -half_height, half_height)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// An RGB raster with a world-space coordinate system.
///
/// All primitives are clipped against the image, so drawing partly or
/// entirely off-screen is allowed.
pub struct Canvas {
    image: RgbImage,
    viewport: Viewport,
}

impl Canvas {
    pub fn new(width: u32, height: u32, viewport: Viewport) -> Result<Self> {
        ensure!(width > 0 && height > 0, "canvas must be at least 1x1, got {width}x{height}");
        ensure!(
            viewport.width() > 0.0 && viewport.height() > 0.0,
            "degenerate viewport {viewport:?}"
        );
        Ok(Self { image: RgbImage::new(width, height), viewport })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Colour of the pixel at column `x`, row `y` (row 0 at the top).
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    /// Maps a world point to continuous pixel coordinates.
    #[must_use]
    pub fn to_pixel(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let v = &self.viewport;
        let px = (x - v.x_min) / v.width() * self.width() as f32;
        let py = (v.y_max - y) / v.height() * self.height() as f32;
        (px, py)
    }

    /// Pixels per world unit along x.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.width() as f32 / self.viewport.width()
    }

    pub fn clear(&mut self, color: Rgb) {
        for p in self.image.pixels_mut() {
            p.0 = color;
        }
    }

    /// A filled, axis-aligned rectangle between two world corners.
    pub fn rect(&mut self, a: (f32, f32), b: (f32, f32), color: Rgb) {
        let (ax, ay) = self.to_pixel(a);
        let (bx, by) = self.to_pixel(b);
        let (x0, x1) = (ax.min(bx), ax.max(bx));
        let (y0, y1) = (ay.min(by), ay.max(by));
        self.fill_where(x0, y0, x1, y1, color, |px, py| {
            px >= x0 && px <= x1 && py >= y0 && py <= y1
        });
    }

    /// A filled circle; `radius` is in world units.
    pub fn circle(&mut self, center: (f32, f32), radius: f32, color: Rgb) {
        let (cx, cy) = self.to_pixel(center);
        let r = (radius * self.scale()).max(0.5);
        self.fill_where(cx - r, cy - r, cx + r, cy + r, color, |px, py| {
            (px - cx).powi(2) + (py - cy).powi(2) <= r * r
        });
    }

    /// A segment with round caps; `thickness` is in world units.
    pub fn line(&mut self, a: (f32, f32), b: (f32, f32), thickness: f32, color: Rgb) {
        let (ax, ay) = self.to_pixel(a);
        let (bx, by) = self.to_pixel(b);
        let half = (0.5 * thickness * self.scale()).max(0.5);
        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx * dx + dy * dy;
        self.fill_where(
            ax.min(bx) - half,
            ay.min(by) - half,
            ax.max(bx) + half,
            ay.max(by) + half,
            color,
            |px, py| {
                let t = if len_sq > 0.0 {
                    (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (qx, qy) = (ax + t * dx, ay + t * dy);
                (px - qx).powi(2) + (py - qy).powi(2) <= half * half
            },
        );
    }

    pub fn polyline(&mut self, points: &[(f32, f32)], thickness: f32, color: Rgb) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], thickness, color);
        }
    }

    /// Paints every pixel whose centre lies in the pixel-space box and
    /// satisfies `inside`.
    fn fill_where<F>(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb, inside: F)
    where
        F: Fn(f32, f32) -> bool,
    {
        let (w, h) = (self.width() as f32, self.height() as f32);
        if !(x1 >= 0.0 && y1 >= 0.0 && x0 < w && y0 < h) {
            return;
        }
        let col0 = x0.max(0.0).floor() as u32;
        let col1 = x1.min(w - 1.0).ceil() as u32;
        let row0 = y0.max(0.0).floor() as u32;
        let row1 = y1.min(h - 1.0).ceil() as u32;
        for row in row0..=row1.min(self.height() - 1) {
            for col in col0..=col1.min(self.width() - 1) {
                if inside(col as f32 + 0.5, row as f32 + 0.5) {
                    self.image.get_pixel_mut(col, row).0 = color;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_y_points_up() {
        let canvas = Canvas::new(100, 50, Viewport::centered(2.0, 1.0)).unwrap();
        assert_eq!(canvas.to_pixel((0.0, 0.0)), (50.0, 25.0));
        assert_eq!(canvas.to_pixel((-2.0, 1.0)), (0.0, 0.0));
        assert_eq!(canvas.to_pixel((2.0, -1.0)), (100.0, 50.0));
    }

    #[test]
    fn degenerate_canvas_is_rejected() {
        assert!(Canvas::new(0, 10, Viewport::centered(1.0, 1.0)).is_err());
        assert!(Canvas::new(10, 10, Viewport::new(1.0, 1.0, 0.0, 1.0)).is_err());
    }
}
