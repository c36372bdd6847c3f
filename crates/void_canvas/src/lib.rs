//! # void_canvas - 2D Drawing Surface
//!
//! A small canvas-style drawing interface:
//! - [`DrawSurface`]: paths, fill/stroke, arcs, images, transforms, alpha
//! - [`RecordingSurface`]: records every call, for tests and headless hosts
//! - `CanvasSurface` (feature `web`): a browser `CanvasRenderingContext2d`
//!
//! Coordinates are pixels, origin top-left, +y down.

pub mod recording;
#[cfg(feature = "web")]
pub mod web;

use void_math::Rect;

pub use recording::{DrawCommand, RecordingSurface};
#[cfg(feature = "web")]
pub use web::{CanvasError, CanvasSurface};

/// A canvas-like 2D drawing target
pub trait DrawSurface {
    /// Surface width in pixels
    fn width(&self) -> f32;
    /// Surface height in pixels
    fn height(&self) -> f32;

    /// Push the current transform and style state
    fn save(&mut self);
    /// Pop the last saved state
    fn restore(&mut self);
    /// Erase the whole surface
    fn clear(&mut self);

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f32);
    fn set_global_alpha(&mut self, alpha: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn close_path(&mut self);
    /// Arc around `(x, y)` from `start` to `end` radians, clockwise
    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn translate(&mut self, x: f32, y: f32);
    /// Rotate subsequent drawing by `angle` radians, clockwise
    fn rotate(&mut self, angle: f32);

    /// Natural size of an image, or `None` while it is not loaded
    fn image_size(&mut self, src: &str) -> Option<(f32, f32)>;
    /// Draw `src` (or the `source` slice of it) into `dest`
    fn draw_image(&mut self, src: &str, source: Option<Rect>, dest: Rect);

    /// Closed polygon path through `points`
    fn polygon(&mut self, points: &[(f32, f32)]) {
        let Some(&(x, y)) = points.first() else {
            return;
        };
        self.begin_path();
        self.move_to(x, y);
        for &(x, y) in &points[1..] {
            self.line_to(x, y);
        }
        self.close_path();
    }
}
