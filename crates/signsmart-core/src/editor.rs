//! Document editor: signers, field placement and drag-to-move
//!
//! The editor owns a working copy of a [`Document`]. Every operation either
//! applies fully or returns an [`EditorError`] with the copy untouched, and
//! no operation leaves a field pointing at a signer that is not in the list.
//! Nothing here persists; `save` hands the result back to the caller.

use tracing::debug;

use crate::coords::{pointer_to_percent, PageBounds, Position};
use crate::error::EditorError;
use crate::model::{new_id, Contact, Document, DocumentStatus, Field, FieldType, Signer, SigningOrder};
use crate::render::{load_page, PageNavigator, PageRenderer, PageView, RenderTicket, RenderTracker};
use crate::textgen::FieldSuggestion;

/// Where suggested fields start stacking, and the gap between them (percent)
const SUGGESTION_TOP: f64 = 15.0;
const SUGGESTION_STEP: f64 = 10.0;

/// Partial update for a signer; `None` leaves the value as is
#[derive(Debug, Clone, Default)]
pub struct SignerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub order: Option<u32>,
}

pub struct Editor {
    doc: Document,
    pages: PageNavigator,
    renders: RenderTracker,
    /// Field being dragged, between pointer-down and pointer-up
    moving: Option<String>,
}

impl Editor {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            pages: PageNavigator::default(),
            renders: RenderTracker::new(),
            moving: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    // ============================================================
    // Page navigation
    // ============================================================

    pub fn current_page(&self) -> u32 {
        self.pages.current()
    }

    pub fn total_pages(&self) -> u32 {
        self.pages.total()
    }

    /// Record the page count reported by the renderer
    pub fn set_page_count(&mut self, total: u32) {
        self.pages.set_total(total);
    }

    pub fn next_page(&mut self) -> u32 {
        self.pages.next()
    }

    pub fn previous_page(&mut self) -> u32 {
        self.pages.previous()
    }

    pub fn go_to_page(&mut self, page: u32) -> Result<(), EditorError> {
        if !self.pages.go_to(page) {
            return Err(EditorError::PageOutOfRange {
                page,
                total: self.pages.total(),
            });
        }
        Ok(())
    }

    /// Fields overlaid on the page being shown
    pub fn fields_on_current_page(&self) -> impl Iterator<Item = &Field> {
        self.doc.fields_on_page(self.pages.current())
    }

    // ============================================================
    // Page rendering
    // ============================================================

    /// Start rendering the current page. Any earlier request is superseded.
    pub fn request_render(&mut self) -> RenderTicket {
        self.renders.begin(self.pages.current())
    }

    /// Take a render result. Results for superseded requests, or for a page
    /// the editor has since left, are dropped. A successful render updates
    /// the page count.
    pub fn complete_render(&mut self, ticket: &RenderTicket, view: PageView) -> Option<PageView> {
        if ticket.page != self.pages.current() {
            debug!(document = %self.doc.id, page = ticket.page, "Render result for a page no longer shown");
            return None;
        }
        let view = self.renders.accept(ticket, view)?;
        if let PageView::Rendered(page) = &view {
            self.pages.set_total(page.total_pages);
        }
        Some(view)
    }

    /// Render the current page in one step
    pub fn render_current(&mut self, renderer: &dyn PageRenderer) -> Option<PageView> {
        let ticket = self.request_render();
        let view = load_page(renderer, &self.doc, ticket.page);
        self.complete_render(&ticket, view)
    }

    /// The page view went away; outstanding renders are stale
    pub fn close_view(&mut self) {
        self.renders.close();
    }

    // ============================================================
    // Document settings
    // ============================================================

    pub fn set_title(&mut self, title: &str) {
        self.doc.title = title.to_string();
    }

    pub fn set_signing_order(&mut self, order: SigningOrder) {
        self.doc.signing_order = order;
    }

    pub fn set_reminders(&mut self, enabled: bool) {
        self.doc.reminders_enabled = enabled;
    }

    // ============================================================
    // Signers
    // ============================================================

    /// Append a blank signer ranked after the existing ones
    pub fn add_signer(&mut self) -> &Signer {
        let signer = Signer::new("", self.next_rank());
        debug!(document = %self.doc.id, signer = %signer.id, "Signer added");
        self.doc.signers.push(signer);
        &self.doc.signers[self.doc.signers.len() - 1]
    }

    /// Append a signer with identity details, returning its id
    pub fn add_named_signer(&mut self, name: &str, email: &str, phone: &str) -> String {
        let mut signer = Signer::new(name, self.next_rank());
        signer.email = email.to_string();
        signer.phone = phone.to_string();
        let id = signer.id.clone();
        debug!(document = %self.doc.id, signer = %id, "Signer added");
        self.doc.signers.push(signer);
        id
    }

    /// Append a signer copied from a saved contact
    pub fn add_signer_from_contact(&mut self, contact: &Contact) -> String {
        self.add_named_signer(&contact.name, &contact.email, &contact.phone)
    }

    fn next_rank(&self) -> u32 {
        self.doc.signers.len() as u32 + 1
    }

    pub fn update_signer(&mut self, id: &str, update: SignerUpdate) -> Result<(), EditorError> {
        let signer = self
            .doc
            .signers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| EditorError::SignerNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            signer.name = name;
        }
        if let Some(email) = update.email {
            signer.email = email;
        }
        if let Some(phone) = update.phone {
            signer.phone = phone;
        }
        if let Some(order) = update.order {
            signer.order = order;
        }
        Ok(())
    }

    /// Remove a signer together with the fields it owned.
    /// Returns how many fields went with it.
    pub fn remove_signer(&mut self, id: &str) -> Result<usize, EditorError> {
        let index = self
            .doc
            .signers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| EditorError::SignerNotFound(id.to_string()))?;
        self.doc.signers.remove(index);

        let before = self.doc.fields.len();
        self.doc.fields.retain(|f| f.signer_id != id);
        let removed = before - self.doc.fields.len();

        if let Some(moving) = &self.moving {
            if self.doc.field(moving).is_none() {
                self.moving = None;
            }
        }

        debug!(document = %self.doc.id, signer = %id, removed_fields = removed, "Signer removed");
        Ok(removed)
    }

    // ============================================================
    // Fields
    // ============================================================

    /// Place a field on the current page, owned by the first signer
    pub fn add_field(&mut self, field_type: FieldType, at: Position) -> Result<String, EditorError> {
        let owner = self
            .doc
            .signers
            .first()
            .map(|s| s.id.clone())
            .ok_or(EditorError::NoSigners)?;

        let at = Position::clamped(at.x, at.y);
        let field = Field {
            id: new_id(),
            field_type,
            label: field_type.default_label().to_string(),
            page: self.pages.current(),
            x: at.x,
            y: at.y,
            required: true,
            value: None,
            signer_id: owner,
        };
        let id = field.id.clone();
        debug!(
            document = %self.doc.id,
            field = %id,
            field_type = %field_type,
            page = self.pages.current(),
            x = at.x,
            y = at.y,
            "Field added"
        );
        self.doc.fields.push(field);
        Ok(id)
    }

    /// Place suggested fields on the current page, stacked top to bottom
    /// down the middle. Blank labels keep the type's default.
    pub fn place_suggestions(
        &mut self,
        suggestions: &[FieldSuggestion],
    ) -> Result<Vec<String>, EditorError> {
        if self.doc.signers.is_empty() {
            return Err(EditorError::NoSigners);
        }
        let mut placed = Vec::with_capacity(suggestions.len());
        for (i, suggestion) in suggestions.iter().enumerate() {
            let y = SUGGESTION_TOP + SUGGESTION_STEP * i as f64;
            let id = self.add_field(suggestion.field_type, Position::clamped(50.0, y))?;
            if !suggestion.label.trim().is_empty() {
                self.set_field_label(&id, suggestion.label.trim())?;
            }
            placed.push(id);
        }
        Ok(placed)
    }

    /// Place a field where a palette item was dropped on the page
    pub fn drop_field(
        &mut self,
        field_type: FieldType,
        pointer_x: f64,
        pointer_y: f64,
        bounds: PageBounds,
    ) -> Result<String, EditorError> {
        self.add_field(field_type, pointer_to_percent(pointer_x, pointer_y, bounds))
    }

    pub fn remove_field(&mut self, id: &str) -> Result<(), EditorError> {
        let index = self.field_index(id)?;
        self.doc.fields.remove(index);
        if self.moving.as_deref() == Some(id) {
            self.moving = None;
        }
        Ok(())
    }

    /// Hand a field to another signer of this document
    pub fn assign_field(&mut self, field_id: &str, signer_id: &str) -> Result<(), EditorError> {
        if self.doc.signer(signer_id).is_none() {
            return Err(EditorError::SignerNotFound(signer_id.to_string()));
        }
        let index = self.field_index(field_id)?;
        self.doc.fields[index].signer_id = signer_id.to_string();
        Ok(())
    }

    pub fn set_field_label(&mut self, field_id: &str, label: &str) -> Result<(), EditorError> {
        let index = self.field_index(field_id)?;
        self.doc.fields[index].label = label.to_string();
        Ok(())
    }

    pub fn set_field_required(&mut self, field_id: &str, required: bool) -> Result<(), EditorError> {
        let index = self.field_index(field_id)?;
        self.doc.fields[index].required = required;
        Ok(())
    }

    /// Set a field's position directly, clamped to the page
    pub fn move_field(&mut self, field_id: &str, to: Position) -> Result<Position, EditorError> {
        let index = self.field_index(field_id)?;
        let to = Position::clamped(to.x, to.y);
        let field = &mut self.doc.fields[index];
        field.x = to.x;
        field.y = to.y;
        Ok(to)
    }

    fn field_index(&self, id: &str) -> Result<usize, EditorError> {
        self.doc
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| EditorError::FieldNotFound(id.to_string()))
    }

    // ============================================================
    // Drag session
    // ============================================================

    /// Pointer-down on a placed field
    pub fn begin_move(&mut self, field_id: &str) -> Result<(), EditorError> {
        self.field_index(field_id)?;
        self.moving = Some(field_id.to_string());
        Ok(())
    }

    /// Pointer-move while dragging. Returns the new position, or `None`
    /// when no drag is in progress.
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64, bounds: PageBounds) -> Option<Position> {
        let id = self.moving.clone()?;
        let pos = pointer_to_percent(pointer_x, pointer_y, bounds);
        self.move_field(&id, pos).ok()
    }

    /// Pointer-up anywhere in the window
    pub fn end_move(&mut self) {
        if let Some(id) = self.moving.take() {
            debug!(document = %self.doc.id, field = %id, "Field move ended");
        }
    }

    pub fn moving_field(&self) -> Option<&str> {
        self.moving.as_deref()
    }

    // ============================================================
    // Output
    // ============================================================

    /// Finish editing: the document is ready to be sent. Sending restarts
    /// the reminder schedule.
    pub fn save(mut self) -> Document {
        self.end_move();
        self.doc.status = DocumentStatus::InProgress;
        self.doc.last_reminder_hours = None;
        self.doc.touch();
        self.doc
    }

    /// Keep the edits without changing the document's status
    pub fn into_draft(mut self) -> Document {
        self.end_move();
        self.doc.touch();
        self.doc
    }
}
