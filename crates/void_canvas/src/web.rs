//! Browser canvas backend

use crate::DrawSurface;
use std::collections::HashMap;
use thiserror::Error;
use void_math::Rect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Errors while acquiring a canvas
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("browser window or document not available")]
    NoDocument,

    #[error("no canvas element with id '{0}'")]
    CanvasNotFound(String),

    #[error("canvas has no 2d context")]
    NoContext,

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for CanvasError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{:?}", value))
    }
}

/// [`DrawSurface`] over a `CanvasRenderingContext2d`
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl CanvasSurface {
    /// Look up a canvas element by id and take its 2d context
    pub fn from_canvas_id(canvas_id: &str) -> Result<Self, CanvasError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(CanvasError::NoDocument)?;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| CanvasError::CanvasNotFound(canvas_id.to_owned()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| CanvasError::CanvasNotFound(canvas_id.to_owned()))?;

        Self::new(canvas)
    }

    /// Wrap an existing canvas element
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, CanvasError> {
        let context = canvas
            .get_context("2d")?
            .ok_or(CanvasError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| CanvasError::NoContext)?;

        Ok(Self {
            canvas,
            context,
            images: HashMap::new(),
        })
    }

    /// The underlying 2d context
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }

    /// Cached image element for `src`, created and started loading on first use
    fn image(&mut self, src: &str) -> Option<&HtmlImageElement> {
        if !self.images.contains_key(src) {
            match HtmlImageElement::new() {
                Ok(image) => {
                    image.set_src(src);
                    self.images.insert(src.to_owned(), image);
                }
                Err(e) => {
                    log::warn!("Could not create image element for {}: {:?}", src, e);
                    return None;
                }
            }
        }
        self.images.get(src)
    }
}

fn warn_on_err(op: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("canvas {} failed: {:?}", op, e);
    }
}

impl DrawSurface for CanvasSurface {
    fn width(&self) -> f32 {
        self.canvas.width() as f32
    }

    fn height(&self) -> f32 {
        self.canvas.height() as f32
    }

    fn save(&mut self) {
        self.context.save();
    }

    fn restore(&mut self) {
        self.context.restore();
    }

    fn clear(&mut self) {
        self.context
            .clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.context.set_fill_style_str(style);
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.context.set_stroke_style_str(style);
    }

    fn set_line_width(&mut self, width: f32) {
        self.context.set_line_width(width as f64);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.context.set_global_alpha(alpha as f64);
    }

    fn begin_path(&mut self) {
        self.context.begin_path();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.context.move_to(x as f64, y as f64);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.context.line_to(x as f64, y as f64);
    }

    fn close_path(&mut self) {
        self.context.close_path();
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32) {
        warn_on_err(
            "arc",
            self.context
                .arc(x as f64, y as f64, radius as f64, start as f64, end as f64),
        );
    }

    fn fill(&mut self) {
        self.context.fill();
    }

    fn stroke(&mut self) {
        self.context.stroke();
    }

    fn translate(&mut self, x: f32, y: f32) {
        warn_on_err("translate", self.context.translate(x as f64, y as f64));
    }

    fn rotate(&mut self, angle: f32) {
        warn_on_err("rotate", self.context.rotate(angle as f64));
    }

    fn image_size(&mut self, src: &str) -> Option<(f32, f32)> {
        let image = self.image(src)?;
        if !image.complete() || image.natural_width() == 0 {
            return None;
        }
        Some((image.natural_width() as f32, image.natural_height() as f32))
    }

    fn draw_image(&mut self, src: &str, source: Option<Rect>, dest: Rect) {
        let Some(image) = self.image(src).cloned() else {
            return;
        };
        let result = match source {
            Some(s) => self
                .context
                .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    &image,
                    s.min.x as f64,
                    s.min.y as f64,
                    s.width() as f64,
                    s.height() as f64,
                    dest.min.x as f64,
                    dest.min.y as f64,
                    dest.width() as f64,
                    dest.height() as f64,
                ),
            None => self.context.draw_image_with_html_image_element_and_dw_and_dh(
                &image,
                dest.min.x as f64,
                dest.min.y as f64,
                dest.width() as f64,
                dest.height() as f64,
            ),
        };
        warn_on_err("draw_image", result);
    }
}
