use thiserror::Error;

/// Rejected editor operations; the document is left unchanged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Add at least one signer before placing fields")]
    NoSigners,

    #[error("Signer not found: {0}")]
    SignerNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Page {page} is outside 1..={total}")]
    PageOutOfRange { page: u32, total: u32 },
}

/// Rejected wizard transitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Field index {index} out of range ({count} fields)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Field {0} needs a drawn signature, not typed input")]
    SignatureRequired(String),

    #[error("Field {0} does not take a drawn signature")]
    NotASignatureField(String),

    #[error("Fill all fields before finishing ({filled} of {total} filled)")]
    Incomplete { filled: usize, total: usize },

    #[error("Signing already completed")]
    AlreadyCompleted,

    #[error("Waiting for {waiting_on} to sign first")]
    OutOfTurn { waiting_on: String },

    #[error("Signer {0} is not on this document")]
    UnknownSigner(String),

    #[error("Page {page} is outside 1..={total}")]
    PageOutOfRange { page: u32, total: u32 },

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Draw a signature before confirming")]
    Empty,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Unsupported upload {0}: expected .pdf, .doc or .docx")]
    UnsupportedUpload(String),

    #[error("Document {0} is already completed")]
    AlreadyCompleted(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Page {page} not found ({total} pages)")]
    PageNotFound { page: u32, total: u32 },

    #[error("Only PDF files can be rendered: {0}")]
    Unsupported(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextGenError {
    #[error("Text generation is disabled")]
    Disabled,

    #[error("Text generation failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShareError {
    #[error("Signer {0} has no phone number")]
    MissingPhone(String),

    #[error("Signer {0} has no email address")]
    MissingEmail(String),

    #[error("Signer not found: {0}")]
    SignerNotFound(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid app URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notice delivery failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notice rejected: {0}")]
    Rejected(String),
}
