//! Software rendering for the environments: a 2-D raster [`Canvas`] addressed
//! in world coordinates, and a [`FrameSink`] that stores canvases as PNG
//! frames on disk.

pub mod canvas;
pub mod frames;

pub use canvas::{Canvas, Rgb, Viewport};
pub use frames::FrameSink;

/// A few named colours shared by the environment renderers.
pub mod colors {
    use super::Rgb;

    pub const BACKGROUND: Rgb = [245, 245, 240];
    pub const GROUND: Rgb = [90, 90, 90];
    pub const BODY: Rgb = [40, 90, 160];
    pub const LINK: Rgb = [200, 120, 40];
    pub const JOINT: Rgb = [30, 30, 30];
    pub const GOAL: Rgb = [40, 170, 70];
}
