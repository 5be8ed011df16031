use tracing::{debug, error, info};

use super::driver::StorageDriver;
use super::DOCUMENTS_KEY;
use crate::error::StoreError;
use crate::model::{is_accepted_upload, Document, DocumentStatus};
use crate::wizard::SigningCompletion;

/// The persisted document collection, newest first
pub struct DocumentStore<D> {
    driver: D,
    docs: Vec<Document>,
}

impl<D: StorageDriver> DocumentStore<D> {
    /// Load the collection. A blob that fails to parse is logged and
    /// replaced by an empty collection on the next write.
    pub fn load(driver: D) -> Result<Self, StoreError> {
        let docs = match driver.read(DOCUMENTS_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_slice::<Vec<Document>>(&raw) {
                Ok(docs) => docs,
                Err(e) => {
                    error!(key = DOCUMENTS_KEY, error = %e, "Stored documents are unreadable, starting empty");
                    Vec::new()
                }
            },
        };
        debug!(count = docs.len(), "Documents loaded");
        Ok(Self { driver, docs })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn list(&self) -> &[Document] {
        &self.docs
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Replace the document with the same id, or add it at the front
    pub fn upsert(&mut self, doc: Document) -> Result<(), StoreError> {
        match self.docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => *existing = doc,
            None => self.docs.insert(0, doc),
        }
        self.persist()
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.docs.len();
        self.docs.retain(|d| d.id != id);
        if self.docs.len() == before {
            return Ok(false);
        }
        info!(document = id, "Document deleted");
        self.persist()?;
        Ok(true)
    }

    /// Register an upload as a new pending document
    pub fn create_from_upload(
        &mut self,
        file_name: &str,
        file_url: Option<String>,
    ) -> Result<Document, StoreError> {
        if !is_accepted_upload(file_name) {
            return Err(StoreError::UnsupportedUpload(file_name.to_string()));
        }
        let doc = Document::from_upload(file_name, file_url);
        info!(document = %doc.id, file = file_name, "Document uploaded");
        self.upsert(doc.clone())?;
        Ok(doc)
    }

    /// Mutate a stored document in place and persist
    pub fn update<F>(&mut self, id: &str, f: F) -> Result<&Document, StoreError>
    where
        F: FnOnce(&mut Document),
    {
        let index = self.index_of(id)?;
        f(&mut self.docs[index]);
        self.persist()?;
        Ok(&self.docs[index])
    }

    /// Record a finished signing session: values land on their fields and
    /// the document is marked completed with every signer signed.
    pub fn apply_completion(
        &mut self,
        completion: &SigningCompletion,
    ) -> Result<&Document, StoreError> {
        let index = self.index_of(&completion.document_id)?;
        let doc = &mut self.docs[index];
        if doc.is_completed() {
            return Err(StoreError::AlreadyCompleted(doc.id.clone()));
        }

        for field in doc.fields.iter_mut() {
            if let Some(value) = completion.values.get(&field.id) {
                field.value = Some(value.clone());
            }
        }
        for signer in doc.signers.iter_mut() {
            signer.has_signed = true;
        }
        doc.status = DocumentStatus::Completed;
        doc.updated_at = completion.completed_at;
        info!(document = %doc.id, "Document completed");

        self.persist()?;
        Ok(&self.docs[index])
    }

    fn index_of(&self, id: &str) -> Result<usize, StoreError> {
        self.docs
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.docs)?;
        self.driver.write(DOCUMENTS_KEY, &json)
    }
}
