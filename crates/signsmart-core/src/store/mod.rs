//! Persistence for documents and contacts
//!
//! Each collection is a single JSON array under a fixed key. Every mutation
//! rewrites the whole array.

mod contacts;
mod documents;
mod driver;

pub use contacts::ContactStore;
pub use documents::DocumentStore;
pub use driver::{DirDriver, MemoryDriver, StorageDriver};

pub const DOCUMENTS_KEY: &str = "signsmart_docs";
pub const CONTACTS_KEY: &str = "signsmart_contacts";
