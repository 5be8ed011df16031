//! Optional text generation for reminders, summaries and field suggestions
//!
//! Generation is best effort. Callers go through [`FallbackText`], which
//! swaps in a fixed template whenever the backend errors or is disabled, and
//! an empty suggestion list when field analysis fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TextGenError;
use crate::model::FieldType;

/// Characters of document text handed to field analysis
pub const SUGGEST_INPUT_LIMIT: usize = 3000;

/// A field proposed from the document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSuggestion {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
}

impl FieldSuggestion {
    pub fn new(field_type: FieldType, label: &str) -> Self {
        Self {
            field_type,
            label: label.to_string(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short, polite reminder asking `signer_name` to sign `title`
    async fn generate_reminder(
        &self,
        title: &str,
        signer_name: &str,
    ) -> Result<String, TextGenError>;

    /// One-paragraph description of the document
    async fn summarize(&self, title: &str, file_name: &str) -> Result<String, TextGenError>;

    /// Fields the document's text appears to ask for
    async fn suggest_fields(&self, text: &str) -> Result<Vec<FieldSuggestion>, TextGenError>;
}

/// Keyword cues for the template generator, in suggestion order
const FIELD_CUES: &[(&[&str], FieldType, &str)] = &[
    (&["full name", "name:", "שם מלא"], FieldType::Text, "Full name"),
    (&["id number", "identity", "תעודת זהות", "ת.ז"], FieldType::IdNumber, "ID Number"),
    (&["address", "כתובת"], FieldType::Address, "Address"),
    (&["amount", "total", "סכום", "₪"], FieldType::Amount, "Amount"),
    (&["i agree", "i accept", "terms", "מאשר"], FieldType::Checkbox, "Terms accepted"),
    (&["date", "תאריך"], FieldType::Date, "Date"),
    (&["initial"], FieldType::Initials, "Initials"),
    (&["signature", "sign here", "signed", "חתימה"], FieldType::Signature, "Signature"),
];

/// Local generator built from fixed phrasing
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

#[async_trait]
impl TextGenerator for TemplateGenerator {
    async fn generate_reminder(
        &self,
        title: &str,
        signer_name: &str,
    ) -> Result<String, TextGenError> {
        let name = signer_name.trim();
        let greeting = if name.is_empty() {
            "Hello".to_string()
        } else {
            format!("Hello {}", name)
        };
        Ok(format!(
            "{}, a quick reminder that \"{}\" is still waiting for your signature. It only takes a minute.",
            greeting, title
        ))
    }

    async fn summarize(&self, title: &str, file_name: &str) -> Result<String, TextGenError> {
        Ok(format!(
            "\"{}\" ({}) is ready for review and signature.",
            title, file_name
        ))
    }

    /// One suggestion per cue found in the text
    async fn suggest_fields(&self, text: &str) -> Result<Vec<FieldSuggestion>, TextGenError> {
        let haystack = text.to_lowercase();
        Ok(FIELD_CUES
            .iter()
            .filter(|(words, _, _)| words.iter().any(|w| haystack.contains(w)))
            .map(|(_, field_type, label)| FieldSuggestion::new(*field_type, label))
            .collect())
    }
}

/// Always fails; selected when generation is turned off
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate_reminder(&self, _: &str, _: &str) -> Result<String, TextGenError> {
        Err(TextGenError::Disabled)
    }

    async fn summarize(&self, _: &str, _: &str) -> Result<String, TextGenError> {
        Err(TextGenError::Disabled)
    }

    async fn suggest_fields(&self, _: &str) -> Result<Vec<FieldSuggestion>, TextGenError> {
        Err(TextGenError::Disabled)
    }
}

/// First [`SUGGEST_INPUT_LIMIT`] characters of `text`
pub fn truncate_for_analysis(text: &str) -> &str {
    match text.char_indices().nth(SUGGEST_INPUT_LIMIT) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub const FALLBACK_REMINDER: &str = "Hello, this is a reminder to sign the document.";
pub const FALLBACK_SUMMARY: &str = "Summary unavailable.";

/// Wraps a generator so failures degrade to fixed text
pub struct FallbackText<G> {
    inner: G,
}

impl<G: TextGenerator> FallbackText<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub async fn reminder_or_default(&self, title: &str, signer_name: &str) -> String {
        match self.inner.generate_reminder(title, signer_name).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_REMINDER.to_string(),
            Err(TextGenError::Disabled) => FALLBACK_REMINDER.to_string(),
            Err(e) => {
                warn!(error = %e, "Reminder generation failed, using fallback");
                FALLBACK_REMINDER.to_string()
            }
        }
    }

    pub async fn summary_or_default(&self, title: &str, file_name: &str) -> String {
        match self.inner.summarize(title, file_name).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_SUMMARY.to_string(),
            Err(TextGenError::Disabled) => FALLBACK_SUMMARY.to_string(),
            Err(e) => {
                warn!(error = %e, "Summary generation failed, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
        }
    }

    /// Suggested fields for the text, or none when analysis fails
    pub async fn suggestions_or_empty(&self, text: &str) -> Vec<FieldSuggestion> {
        let text = truncate_for_analysis(text);
        if text.trim().is_empty() {
            return Vec::new();
        }
        match self.inner.suggest_fields(text).await {
            Ok(suggestions) => {
                debug!(count = suggestions.len(), "Field suggestions generated");
                suggestions
            }
            Err(TextGenError::Disabled) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Field analysis failed, suggesting nothing");
                Vec::new()
            }
        }
    }
}

impl FallbackText<Box<dyn TextGenerator>> {
    /// Pick a generator by its config name; unknown names disable generation
    pub fn from_name(name: &str) -> Self {
        let inner: Box<dyn TextGenerator> = match name.trim().to_ascii_lowercase().as_str() {
            "template" => Box::new(TemplateGenerator),
            "disabled" | "off" | "none" => Box::new(DisabledGenerator),
            other => {
                warn!(generator = other, "Unknown text generator, disabling");
                Box::new(DisabledGenerator)
            }
        };
        Self::new(inner)
    }
}

#[async_trait]
impl TextGenerator for Box<dyn TextGenerator> {
    async fn generate_reminder(
        &self,
        title: &str,
        signer_name: &str,
    ) -> Result<String, TextGenError> {
        (**self).generate_reminder(title, signer_name).await
    }

    async fn summarize(&self, title: &str, file_name: &str) -> Result<String, TextGenError> {
        (**self).summarize(title, file_name).await
    }

    async fn suggest_fields(&self, text: &str) -> Result<Vec<FieldSuggestion>, TextGenError> {
        (**self).suggest_fields(text).await
    }
}
