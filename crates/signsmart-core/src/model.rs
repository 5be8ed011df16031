//! Document, signer, field and contact types
//!
//! These are the records kept in the persisted stores. Serialized names
//! follow the browser storage layout (`fileName`, `signerId`, `hasSigned`, ...)
//! so existing blobs load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// File extensions accepted for upload
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Generate a fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lowercased extension of a file name, if it has one
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether a file name carries one of the accepted upload extensions
pub fn is_accepted_upload(file_name: &str) -> bool {
    file_extension(file_name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Lifecycle status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Uploaded, still being prepared
    Pending,
    /// Sent out, waiting for signatures
    InProgress,
    Completed,
    Expired,
    /// Overdue, flagged for follow-up by the sender
    Escalated,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        DocumentStatus::Pending,
        DocumentStatus::InProgress,
        DocumentStatus::Completed,
        DocumentStatus::Expired,
        DocumentStatus::Escalated,
    ];

    /// Human-readable badge text
    pub fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Draft",
            DocumentStatus::InProgress => "Awaiting signature",
            DocumentStatus::Completed => "Signed",
            DocumentStatus::Expired => "Expired",
            DocumentStatus::Escalated => "Escalated",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "PENDING"),
            DocumentStatus::InProgress => write!(f, "IN_PROGRESS"),
            DocumentStatus::Completed => write!(f, "COMPLETED"),
            DocumentStatus::Expired => write!(f, "EXPIRED"),
            DocumentStatus::Escalated => write!(f, "ESCALATED"),
        }
    }
}

/// How a field collects its value from the signer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Freehand stroke capture
    Stroke,
    Checkbox,
    Text,
}

/// Static presentation data for a field type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTypeSpec {
    pub label: &'static str,
    pub icon: &'static str,
    pub input: InputKind,
}

/// Kind of value a field collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Signature,
    Initials,
    Text,
    Date,
    IdNumber,
    Address,
    Amount,
    Checkbox,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Signature,
        FieldType::Initials,
        FieldType::Text,
        FieldType::Date,
        FieldType::IdNumber,
        FieldType::Address,
        FieldType::Amount,
        FieldType::Checkbox,
    ];

    /// Lookup table entry for this type
    pub const fn spec(self) -> FieldTypeSpec {
        match self {
            FieldType::Signature => FieldTypeSpec {
                label: "Signature",
                icon: "check",
                input: InputKind::Stroke,
            },
            FieldType::Initials => FieldTypeSpec {
                label: "Initials",
                icon: "RT",
                input: InputKind::Text,
            },
            FieldType::Text => FieldTypeSpec {
                label: "Text",
                icon: "text",
                input: InputKind::Text,
            },
            FieldType::Date => FieldTypeSpec {
                label: "Date",
                icon: "calendar",
                input: InputKind::Text,
            },
            FieldType::IdNumber => FieldTypeSpec {
                label: "ID Number",
                icon: "id",
                input: InputKind::Text,
            },
            FieldType::Address => FieldTypeSpec {
                label: "Address",
                icon: "pin",
                input: InputKind::Text,
            },
            FieldType::Amount => FieldTypeSpec {
                label: "Amount",
                icon: "currency",
                input: InputKind::Text,
            },
            FieldType::Checkbox => FieldTypeSpec {
                label: "Terms accepted",
                icon: "box",
                input: InputKind::Checkbox,
            },
        }
    }

    pub fn default_label(self) -> &'static str {
        self.spec().label
    }

    pub fn input_kind(self) -> InputKind {
        self.spec().input
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FieldType::Signature => "SIGNATURE",
            FieldType::Initials => "INITIALS",
            FieldType::Text => "TEXT",
            FieldType::Date => "DATE",
            FieldType::IdNumber => "ID_NUMBER",
            FieldType::Address => "ADDRESS",
            FieldType::Amount => "AMOUNT",
            FieldType::Checkbox => "CHECKBOX",
        };
        f.write_str(tag)
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        FieldType::ALL
            .into_iter()
            .find(|t| t.to_string() == normalized)
            .ok_or_else(|| format!("Unknown field type: {}", s))
    }
}

/// Whether signers act in rank order or independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningOrder {
    #[default]
    Sequential,
    Parallel,
}

impl FromStr for SigningOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(SigningOrder::Sequential),
            "parallel" => Ok(SigningOrder::Parallel),
            other => Err(format!("Unknown signing order: {}", other)),
        }
    }
}

/// A party who fills one or more fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Rank, only meaningful under sequential signing
    pub order: u32,
    #[serde(default)]
    pub has_signed: bool,
}

impl Signer {
    pub fn new(name: &str, order: u32) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            email: String::new(),
            phone: String::new(),
            order,
            has_signed: false,
        }
    }

    /// Name for display, falling back when the sender left it blank
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unnamed signer"
        } else {
            &self.name
        }
    }
}

/// A placeholder on a page that a signer must fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    /// 1-based page number
    pub page: u32,
    /// Horizontal position, percent of page width
    pub x: f64,
    /// Vertical position, percent of page height
    pub y: f64,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub signer_id: String,
}

/// An uploaded file routed for signatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub signers: Vec<Signer>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub signing_order: SigningOrder,
    #[serde(default)]
    pub reminders_enabled: bool,
    /// Latest reminder offset (hours after sending) already issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminder_hours: Option<u32>,
}

impl Document {
    /// New draft for a freshly uploaded file
    pub fn from_upload(file_name: &str, file_url: Option<String>) -> Self {
        let title = file_name.split('.').next().unwrap_or(file_name).to_string();
        let now = Utc::now();
        Self {
            id: new_id(),
            title,
            file_name: file_name.to_string(),
            file_url,
            status: DocumentStatus::Pending,
            created_at: now,
            updated_at: now,
            signers: Vec::new(),
            fields: Vec::new(),
            signing_order: SigningOrder::Sequential,
            reminders_enabled: true,
            last_reminder_hours: None,
        }
    }

    pub fn signer(&self, id: &str) -> Option<&Signer> {
        self.signers.iter().find(|s| s.id == id)
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields placed on a given page
    pub fn fields_on_page(&self, page: u32) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.page == page)
    }

    /// Fields whose owner is missing from the signer list
    pub fn dangling_fields(&self) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| self.signer(&f.signer_id).is_none())
            .collect()
    }

    /// Every field references a signer of this document
    pub fn references_are_valid(&self) -> bool {
        self.dangling_fields().is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.status == DocumentStatus::Completed
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A reusable signer identity, independent of any document.
///
/// Older contact blobs split the name into `firstName`/`lastName`; both
/// shapes deserialize, and contacts are always written with a single `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredContact")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredContact {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
}

impl From<StoredContact> for Contact {
    fn from(raw: StoredContact) -> Self {
        let name = match raw.name {
            Some(name) => name,
            None => format!("{} {}", raw.first_name.trim(), raw.last_name.trim())
                .trim()
                .to_string(),
        };
        Self {
            id: raw.id,
            name,
            email: raw.email,
            phone: raw.phone,
        }
    }
}

impl Contact {
    pub fn new(name: &str, email: &str, phone: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }
    }

    /// Copy a signer's identity into a contact
    pub fn from_signer(signer: &Signer) -> Self {
        Self::new(&signer.name, &signer.email, &signer.phone)
    }
}
