//! Page rendering adapter
//!
//! The editor and wizard only need to know how large a rendered page is and
//! how many pages there are; fields are overlaid from their percentages. The
//! bundled [`LopdfRenderer`] reads both from the PDF's page tree.

use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, warn};

use crate::coords::{percent_to_surface, Position};
use crate::error::RenderError;
use crate::model::{file_extension, Document, Field};

/// Render scale applied to PDF points
pub const DEFAULT_SCALE: f64 = 1.5;

/// US Letter, used when a page has no MediaBox
const LETTER_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Self {
        match file_extension(file_name).as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("jpg" | "jpeg" | "png" | "webp") => FileKind::Image,
            _ => FileKind::Other,
        }
    }
}

/// A rendered page surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedPage {
    pub page: u32,
    pub total_pages: u32,
    pub width: f64,
    pub height: f64,
}

impl RenderedPage {
    /// Pixel position of a field's anchor on this surface
    pub fn overlay_position(&self, field: &Field) -> (f64, f64) {
        percent_to_surface(
            Position {
                x: field.x,
                y: field.y,
            },
            self.width,
            self.height,
        )
    }
}

pub trait PageRenderer {
    /// Render `page` (1-based) of the file at `source`
    fn render_page(&self, source: &str, page: u32) -> Result<RenderedPage, RenderError>;
}

/// Reads page count and MediaBox with lopdf
#[derive(Debug, Clone)]
pub struct LopdfRenderer {
    scale: f64,
}

impl Default for LopdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl LopdfRenderer {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn render_bytes(&self, bytes: &[u8], page: u32) -> Result<RenderedPage, RenderError> {
        let doc =
            lopdf::Document::load_mem(bytes).map_err(|e| RenderError::Parse(e.to_string()))?;
        let pages = doc.get_pages();
        let total = pages.len() as u32;
        let page_id = *pages
            .get(&page)
            .ok_or(RenderError::PageNotFound { page, total })?;

        let page_dict = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| RenderError::Parse(format!("Failed to get page object: {}", e)))?;
        let [_, _, width, height] = media_box(&doc, page_dict)?;

        Ok(RenderedPage {
            page,
            total_pages: total,
            width: width * self.scale,
            height: height * self.scale,
        })
    }
}

impl PageRenderer for LopdfRenderer {
    fn render_page(&self, source: &str, page: u32) -> Result<RenderedPage, RenderError> {
        if FileKind::from_file_name(source) != FileKind::Pdf {
            return Err(RenderError::Unsupported(source.to_string()));
        }
        let bytes = std::fs::read(source).map_err(|e| RenderError::Io {
            path: source.to_string(),
            source: e,
        })?;
        self.render_bytes(&bytes, page)
    }
}

/// MediaBox as [x, y, width, height], falling back to the parent node
fn media_box(doc: &lopdf::Document, page_dict: &Dictionary) -> Result<[f64; 4], RenderError> {
    if let Ok(rect) = page_dict.get(b"MediaBox") {
        return parse_rect(doc, rect);
    }

    let parent: Option<ObjectId> = page_dict
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok();
    if let Some(parent_id) = parent {
        if let Ok(rect) = doc
            .get_object(parent_id)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"MediaBox"))
        {
            return parse_rect(doc, rect);
        }
    }

    Ok(LETTER_MEDIA_BOX)
}

fn parse_rect(doc: &lopdf::Document, obj: &Object) -> Result<[f64; 4], RenderError> {
    let arr = match obj {
        Object::Array(a) => a,
        Object::Reference(id) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .map_err(|_| RenderError::Parse("MediaBox reference is not an array".into()))?,
        _ => return Err(RenderError::Parse("MediaBox is not an array".into())),
    };

    if arr.len() != 4 {
        return Err(RenderError::Parse(format!(
            "MediaBox has {} elements, expected 4",
            arr.len()
        )));
    }

    let mut values = [0.0f64; 4];
    for (i, obj) in arr.iter().enumerate() {
        values[i] = number(doc, obj)?;
    }

    // [x1, y1, x2, y2] -> [x, y, width, height]
    Ok([
        values[0],
        values[1],
        values[2] - values[0],
        values[3] - values[1],
    ])
}

fn number(doc: &lopdf::Document, obj: &Object) -> Result<f64, RenderError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        Object::Reference(id) => {
            let resolved = doc
                .get_object(*id)
                .map_err(|e| RenderError::Parse(format!("Failed to resolve: {}", e)))?;
            number(doc, resolved)
        }
        _ => Err(RenderError::Parse("Expected number in rectangle".into())),
    }
}

/// What a page area shows after a render attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    Rendered(RenderedPage),
    /// Non-PDF upload, shown without a rendering
    Placeholder { file_name: String },
    /// Render failed; the viewer offers a manual retry
    Failed { message: String },
}

/// Render a document page, degrading instead of failing
pub fn load_page(renderer: &dyn PageRenderer, doc: &Document, page: u32) -> PageView {
    if FileKind::from_file_name(&doc.file_name) != FileKind::Pdf {
        return PageView::Placeholder {
            file_name: doc.file_name.clone(),
        };
    }
    let source = doc.file_url.as_deref().unwrap_or(&doc.file_name);
    match renderer.render_page(source, page) {
        Ok(rendered) => {
            debug!(document = %doc.id, page, total = rendered.total_pages, "Page rendered");
            PageView::Rendered(rendered)
        }
        Err(RenderError::Unsupported(_)) => PageView::Placeholder {
            file_name: doc.file_name.clone(),
        },
        Err(e) => {
            warn!(document = %doc.id, page, error = %e, "Page render failed");
            PageView::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Page cursor bounded to [1, total]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNavigator {
    current: u32,
    total: u32,
}

impl PageNavigator {
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Adopt a new page count, pulling the cursor back into range
    pub fn set_total(&mut self, total: u32) {
        self.total = total.max(1);
        self.current = self.current.min(self.total);
    }

    /// Jump to `page`. Out-of-range pages leave the cursor where it is.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page == 0 || page > self.total {
            return false;
        }
        self.current = page;
        true
    }

    pub fn next(&mut self) -> u32 {
        self.current = (self.current + 1).min(self.total);
        self.current
    }

    pub fn previous(&mut self) -> u32 {
        self.current = self.current.saturating_sub(1).max(1);
        self.current
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Ticket for one in-flight render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
    pub page: u32,
}

/// Tracks which render request is still wanted. Starting a new one
/// supersedes the previous; results for stale tickets are dropped.
#[derive(Debug, Default)]
pub struct RenderTracker {
    generation: u64,
    closed: bool,
}

impl RenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, page: u32) -> RenderTicket {
        self.generation += 1;
        self.closed = false;
        RenderTicket {
            generation: self.generation,
            page,
        }
    }

    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        !self.closed && ticket.generation == self.generation
    }

    /// Keep `result` only if its ticket is still current
    pub fn accept<T>(&self, ticket: &RenderTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(page = ticket.page, "Discarding stale render result");
            None
        }
    }

    /// The view went away; every outstanding ticket is stale
    pub fn close(&mut self) {
        self.closed = true;
    }
}
