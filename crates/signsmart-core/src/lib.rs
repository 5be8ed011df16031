//! SignSmart core: prepare documents for signature and collect signatures
//!
//! A sender uploads a file, adds signers, and places typed fields on its
//! pages ([`editor`]). Signing links ([`share`]) open a step-by-step wizard
//! ([`wizard`]) in which each field is filled, with drawn signatures coming
//! from [`capture`]. Documents and contacts persist as JSON blobs
//! ([`store`]), and the sender hears about finished documents through
//! [`notify`].

pub mod capture;
pub mod coords;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod model;
pub mod notify;
pub mod queue;
pub mod reminders;
pub mod render;
pub mod route;
pub mod share;
pub mod store;
pub mod textgen;
pub mod wizard;

pub use capture::{CapturedSignature, Point, SignaturePad, Stroke};
pub use coords::{PageBounds, Position};
pub use dashboard::{DashboardView, StatusCounts};
pub use editor::{Editor, SignerUpdate};
pub use error::{
    CaptureError, EditorError, NotifyError, RenderError, ShareError, StoreError, TextGenError,
    WizardError,
};
pub use model::{
    Contact, Document, DocumentStatus, Field, FieldType, InputKind, Signer, SigningOrder,
};
pub use notify::{CompletionNotice, CompletionNotifier, LogNotifier, OutboxNotifier};
pub use queue::SigningQueue;
pub use reminders::{ReminderDecision, ReminderSchedule, SweepReport};
pub use render::{LopdfRenderer, PageRenderer, PageView, RenderedPage};
pub use route::{Route, View};
pub use share::{Channel, Invitation, ShareLinks};
pub use store::{ContactStore, DirDriver, DocumentStore, MemoryDriver, StorageDriver};
pub use textgen::{FallbackText, FieldSuggestion, TemplateGenerator, TextGenerator};
pub use wizard::{Advance, SignerWizard, SigningCompletion, WizardState};
