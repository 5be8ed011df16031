//! Freehand signature capture
//!
//! A pad records strokes as they are drawn: pointer-down starts a stroke,
//! each move appends a segment, pointer-up ends it. Confirming keeps the
//! drawing as an SVG data URL, which becomes the field's value.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::CaptureError;

/// Default pad size in pixels
pub const PAD_WIDTH: f64 = 500.0;
pub const PAD_HEIGHT: f64 = 250.0;

const STROKE_COLOR: &str = "#1e3a8a";
const STROKE_WIDTH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One continuous pen-down..pen-up path
pub type Stroke = Vec<Point>;

/// Drawing surface for a single capture session
#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: f64,
    height: f64,
    strokes: Vec<Stroke>,
    drawing: bool,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(PAD_WIDTH, PAD_HEIGHT)
    }
}

impl SignaturePad {
    /// A pad of the given size. Sizes that are not positive and finite
    /// fall back to the default dimension for that axis.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: pad_extent(width, PAD_WIDTH),
            height: pad_extent(height, PAD_HEIGHT),
            strokes: Vec::new(),
            drawing: false,
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let start = self.clip(x, y);
        self.strokes.push(vec![start]);
        self.drawing = true;
    }

    /// Extend the active stroke; ignored while the pen is up
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if !self.drawing {
            return false;
        }
        let point = self.clip(x, y);
        match self.strokes.last_mut() {
            Some(stroke) => {
                stroke.push(point);
                true
            }
            None => false,
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|s| s.is_empty())
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Replay recorded strokes onto the pad
    pub fn replay(&mut self, strokes: &[Stroke]) {
        for stroke in strokes {
            let mut points = stroke.iter();
            if let Some(first) = points.next() {
                self.pointer_down(first.x, first.y);
                for p in points {
                    self.pointer_move(p.x, p.y);
                }
                self.pointer_up();
            }
        }
    }

    pub fn confirm(&self) -> Result<CapturedSignature, CaptureError> {
        if self.is_empty() {
            return Err(CaptureError::Empty);
        }
        Ok(CapturedSignature {
            width: self.width,
            height: self.height,
            strokes: self
                .strokes
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
        })
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clip(&self, x: f64, y: f64) -> Point {
        Point::new(clip_axis(x, self.width), clip_axis(y, self.height))
    }
}

fn pad_extent(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// NaN lands on the origin
fn clip_axis(value: f64, extent: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, extent)
}

/// A confirmed drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedSignature {
    pub width: f64,
    pub height: f64,
    pub strokes: Vec<Stroke>,
}

impl CapturedSignature {
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for stroke in &self.strokes {
            let mut d = String::new();
            for (i, p) in stroke.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{}{:.1} {:.1} ", cmd, p.x, p.y);
            }
            if stroke.len() == 1 {
                // A tap draws a dot
                d.push_str("l0 0 ");
            }
            let _ = write!(
                svg,
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
                d.trim_end(),
                STROKE_COLOR,
                STROKE_WIDTH
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// Field value form: `data:image/svg+xml;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:image/svg+xml;base64,{}", BASE64.encode(self.to_svg()))
    }
}
