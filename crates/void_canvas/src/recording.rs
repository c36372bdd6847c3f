//! Recording surface
//!
//! Keeps every call as a [`DrawCommand`] so drawing code can run without a
//! browser and be inspected afterwards.

use crate::DrawSurface;
use std::collections::HashMap;
use void_math::Rect;

/// One recorded drawing call
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Clear,
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f32),
    GlobalAlpha(f32),
    BeginPath,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    ClosePath,
    Arc {
        x: f32,
        y: f32,
        radius: f32,
        start: f32,
        end: f32,
    },
    Fill,
    Stroke,
    Translate(f32, f32),
    Rotate(f32),
    Image {
        src: String,
        source: Option<Rect>,
        dest: Rect,
    },
}

/// Surface that records calls instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
    images: HashMap<String, (f32, f32)>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

impl RecordingSurface {
    /// Create a surface of the given pixel size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            images: HashMap::new(),
        }
    }

    /// Register an image as loaded with the given natural size
    pub fn with_image(mut self, src: impl Into<String>, width: f32, height: f32) -> Self {
        self.images.insert(src.into(), (width, height));
        self
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take recorded commands, leaving the surface empty
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Every image draw call, in order
    pub fn images_drawn(&self) -> Vec<(&str, Option<Rect>, Rect)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { src, source, dest } => Some((src.as_str(), *source, *dest)),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn clear(&mut self) {
        self.push(DrawCommand::Clear);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle(style.to_owned()));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle(style.to_owned()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo(x, y));
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start,
            end,
        });
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Translate(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.push(DrawCommand::Rotate(angle));
    }

    fn image_size(&mut self, src: &str) -> Option<(f32, f32)> {
        self.images.get(src).copied()
    }

    fn draw_image(&mut self, src: &str, source: Option<Rect>, dest: Rect) {
        self.push(DrawCommand::Image {
            src: src.to_owned(),
            source,
            dest,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_math::Vec2;

    #[test]
    fn test_polygon_builds_closed_path() {
        let mut surface = RecordingSurface::default();
        surface.polygon(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::BeginPath,
                DrawCommand::MoveTo(0.0, 0.0),
                DrawCommand::LineTo(10.0, 0.0),
                DrawCommand::LineTo(0.0, 10.0),
                DrawCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn test_empty_polygon_draws_nothing() {
        let mut surface = RecordingSurface::default();
        surface.polygon(&[]);
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_unknown_image_has_no_size() {
        let mut surface = RecordingSurface::default().with_image("hero.png", 32.0, 48.0);
        assert_eq!(surface.image_size("hero.png"), Some((32.0, 48.0)));
        assert_eq!(surface.image_size("missing.png"), None);
    }

    #[test]
    fn test_take_commands_empties() {
        let mut surface = RecordingSurface::default();
        surface.clear();
        let dest = Rect::from_corners(Vec2::ZERO, Vec2::ONE);
        surface.draw_image("a.png", None, dest);

        assert_eq!(surface.images_drawn(), vec![("a.png", None, dest)]);
        assert_eq!(surface.take_commands().len(), 2);
        assert!(surface.commands().is_empty());
    }
}
