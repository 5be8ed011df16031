//! Signer wizard: one step per field, then a terminal completed state
//!
//! The wizard only moves on explicit requests (`next`, `previous`, `select`,
//! or confirming a drawn signature). Typing into a field never advances.
//! Finishing is gated on every field having a value; that is the only check.
//! The wizard does not touch the store; `finish` returns a
//! [`SigningCompletion`] for the document store to apply.
//!
//! A page cursor follows the active field so the page holding it is the one
//! shown; it can also be moved on its own to look around the document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::capture::SignaturePad;
use crate::error::WizardError;
use crate::model::{Document, Field, InputKind};
use crate::queue::SigningQueue;
use crate::render::PageNavigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    /// Working on the field at this index
    Field(usize),
    Completed,
}

/// Result of a forward step
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(usize),
    /// Already on the last field and something is still empty
    Blocked { filled: usize, total: usize },
    Finished(SigningCompletion),
}

/// Everything the store needs to record a finished signing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningCompletion {
    pub document_id: String,
    pub signer_id: Option<String>,
    /// Field id -> captured value
    pub values: HashMap<String, String>,
    pub completed_at: DateTime<Utc>,
}

pub struct SignerWizard {
    document_id: String,
    signer_id: Option<String>,
    fields: Vec<Field>,
    state: WizardState,
    values: HashMap<String, String>,
    pages: PageNavigator,
}

impl SignerWizard {
    /// Start a session over every field of the document
    pub fn new(doc: &Document, signer_id: Option<&str>) -> Self {
        debug!(document = %doc.id, fields = doc.fields.len(), "Signing session started");
        let mut wizard = Self {
            document_id: doc.id.clone(),
            signer_id: signer_id.map(str::to_string),
            fields: doc.fields.clone(),
            state: WizardState::Field(0),
            values: HashMap::new(),
            pages: PageNavigator::new(last_field_page(&doc.fields)),
        };
        wizard.focus(0);
        wizard
    }

    /// Start a session, refusing ids that are not on the document and
    /// signers whose sequential turn has not come
    pub fn for_signer(doc: &Document, signer_id: &str) -> Result<Self, WizardError> {
        SigningQueue::new(doc).check_turn(signer_id)?;
        Ok(Self::new(doc, Some(signer_id)))
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn signer_id(&self) -> Option<&str> {
        self.signer_id.as_deref()
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            WizardState::Field(i) if i < self.fields.len() => Some(i),
            _ => None,
        }
    }

    pub fn current_field(&self) -> Option<&Field> {
        self.current_index().map(|i| &self.fields[i])
    }

    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).map(String::as_str)
    }

    pub fn is_filled(&self, field_id: &str) -> bool {
        self.values.contains_key(field_id)
    }

    pub fn filled_count(&self) -> usize {
        self.values.len()
    }

    pub fn total(&self) -> usize {
        self.fields.len()
    }

    /// Share of fields filled, 0-100
    pub fn progress_percent(&self) -> u8 {
        if self.fields.is_empty() {
            return 100;
        }
        ((self.filled_count() as f64 / self.total() as f64) * 100.0).round() as u8
    }

    /// The finish gate: open once every field has a value
    pub fn can_finish(&self) -> bool {
        self.filled_count() >= self.total()
    }

    // ============================================================
    // Pages
    // ============================================================

    pub fn current_page(&self) -> u32 {
        self.pages.current()
    }

    pub fn total_pages(&self) -> u32 {
        self.pages.total()
    }

    /// Record the page count reported by the renderer. Pages holding
    /// fields stay reachable even if the renderer reports fewer.
    pub fn set_page_count(&mut self, total: u32) {
        self.pages.set_total(total.max(last_field_page(&self.fields)));
    }

    pub fn next_page(&mut self) -> u32 {
        self.pages.next()
    }

    pub fn previous_page(&mut self) -> u32 {
        self.pages.previous()
    }

    /// Show another page without changing the active field
    pub fn go_to_page(&mut self, page: u32) -> Result<(), WizardError> {
        if !self.pages.go_to(page) {
            return Err(WizardError::PageOutOfRange {
                page,
                total: self.pages.total(),
            });
        }
        Ok(())
    }

    /// Fields on the page being shown, with their wizard index
    pub fn fields_on_current_page(&self) -> Vec<(usize, &Field)> {
        let page = self.pages.current();
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.page == page)
            .collect()
    }

    /// Make `index` the active field and show its page
    fn focus(&mut self, index: usize) {
        self.state = WizardState::Field(index);
        if let Some(field) = self.fields.get(index) {
            self.pages.go_to(field.page);
        }
    }

    // ============================================================
    // Navigation
    // ============================================================

    /// Jump to a field (tapping it on the page)
    pub fn select(&mut self, index: usize) -> Result<(), WizardError> {
        self.ensure_open()?;
        if index >= self.fields.len() {
            return Err(WizardError::IndexOutOfRange {
                index,
                count: self.fields.len(),
            });
        }
        self.focus(index);
        Ok(())
    }

    pub fn previous(&mut self) -> Result<usize, WizardError> {
        self.ensure_open()?;
        let index = self.current_index().unwrap_or(0).saturating_sub(1);
        self.focus(index);
        Ok(index)
    }

    /// Move to the next field, or finish from the last one when the gate is open
    pub fn next(&mut self) -> Result<Advance, WizardError> {
        self.ensure_open()?;
        let index = self.current_index().unwrap_or(0);
        if index + 1 < self.fields.len() {
            self.focus(index + 1);
            return Ok(Advance::Moved(index + 1));
        }
        if !self.can_finish() {
            return Ok(Advance::Blocked {
                filled: self.filled_count(),
                total: self.total(),
            });
        }
        self.finish().map(Advance::Finished)
    }

    // ============================================================
    // Input
    // ============================================================

    /// Typed input for the current field. Blank input is ignored so the
    /// filled count never goes down.
    pub fn enter_text(&mut self, text: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        let field = self.require_current()?;
        if field.field_type.input_kind() == InputKind::Stroke {
            return Err(WizardError::SignatureRequired(field.id.clone()));
        }
        if text.trim().is_empty() {
            return Ok(());
        }
        let id = field.id.clone();
        self.values.insert(id, text.to_string());
        Ok(())
    }

    /// Checkbox input for the current field
    pub fn set_checked(&mut self, checked: bool) -> Result<(), WizardError> {
        self.enter_text(if checked { "true" } else { "false" })
    }

    /// Record a drawn signature for the current field and move on when a
    /// later field exists
    pub fn confirm_signature(&mut self, pad: &SignaturePad) -> Result<WizardState, WizardError> {
        self.ensure_open()?;
        let field = self.require_current()?;
        if field.field_type.input_kind() != InputKind::Stroke {
            return Err(WizardError::NotASignatureField(field.id.clone()));
        }
        let id = field.id.clone();
        let captured = pad.confirm()?;
        self.values.insert(id, captured.to_data_url());

        if let Some(index) = self.current_index() {
            if index + 1 < self.fields.len() {
                self.focus(index + 1);
            }
        }
        Ok(self.state)
    }

    /// Close the session once every field has a value
    pub fn finish(&mut self) -> Result<SigningCompletion, WizardError> {
        self.ensure_open()?;
        if !self.can_finish() {
            return Err(WizardError::Incomplete {
                filled: self.filled_count(),
                total: self.total(),
            });
        }
        self.state = WizardState::Completed;
        info!(document = %self.document_id, fields = self.total(), "Signing session finished");
        Ok(SigningCompletion {
            document_id: self.document_id.clone(),
            signer_id: self.signer_id.clone(),
            values: self.values.clone(),
            completed_at: Utc::now(),
        })
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.state == WizardState::Completed {
            return Err(WizardError::AlreadyCompleted);
        }
        Ok(())
    }

    fn require_current(&self) -> Result<&Field, WizardError> {
        self.current_field().ok_or(WizardError::IndexOutOfRange {
            index: 0,
            count: self.fields.len(),
        })
    }
}

fn last_field_page(fields: &[Field]) -> u32 {
    fields.iter().map(|f| f.page).max().unwrap_or(1)
}
