use tracing::{error, info};

use super::driver::StorageDriver;
use super::CONTACTS_KEY;
use crate::error::StoreError;
use crate::model::{Contact, Signer};
use crate::share::digits_only;

/// Saved signers, reusable across documents
pub struct ContactStore<D> {
    driver: D,
    contacts: Vec<Contact>,
}

impl<D: StorageDriver> ContactStore<D> {
    pub fn load(driver: D) -> Result<Self, StoreError> {
        let contacts = match driver.read(CONTACTS_KEY)? {
            None => Vec::new(),
            Some(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                error!(key = CONTACTS_KEY, error = %e, "Stored contacts are unreadable, starting empty");
                Vec::new()
            }),
        };
        Ok(Self { driver, contacts })
    }

    pub fn list(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn add(&mut self, contact: Contact) -> Result<&Contact, StoreError> {
        info!(contact = %contact.id, "Contact added");
        self.contacts.push(contact);
        self.persist()?;
        let last = self.contacts.len() - 1;
        Ok(&self.contacts[last])
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.id != id);
        if self.contacts.len() == before {
            return Err(StoreError::ContactNotFound(id.to_string()));
        }
        self.persist()
    }

    /// Save a document's signers as contacts. Signers already known by
    /// email or phone digits are skipped, as are signers with neither.
    /// Returns how many were added.
    pub fn import_signers(&mut self, signers: &[Signer]) -> Result<usize, StoreError> {
        let mut added = 0;
        for signer in signers {
            let email = signer.email.trim().to_ascii_lowercase();
            let phone = digits_only(&signer.phone);
            if email.is_empty() && phone.is_empty() {
                continue;
            }
            let known = self.contacts.iter().any(|c| {
                (!email.is_empty() && c.email.trim().to_ascii_lowercase() == email)
                    || (!phone.is_empty() && digits_only(&c.phone) == phone)
            });
            if !known {
                self.contacts.push(Contact::from_signer(signer));
                added += 1;
            }
        }
        if added > 0 {
            info!(added, "Signers imported as contacts");
            self.persist()?;
        }
        Ok(added)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.contacts)?;
        self.driver.write(CONTACTS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDriver;

    fn signer(name: &str, email: &str, phone: &str) -> Signer {
        let mut s = Signer::new(name, 1);
        s.email = email.into();
        s.phone = phone.into();
        s
    }

    #[test]
    fn test_add_and_delete() {
        let mut store = ContactStore::load(MemoryDriver::new()).unwrap();
        let id = store
            .add(Contact::new("Dana", "dana@example.com", "050"))
            .unwrap()
            .id
            .clone();
        assert_eq!(store.list().len(), 1);
        store.delete(&id).unwrap();
        assert!(store.list().is_empty());
        assert!(matches!(
            store.delete(&id),
            Err(StoreError::ContactNotFound(_))
        ));
    }

    #[test]
    fn test_import_dedupes() {
        let mut store = ContactStore::load(MemoryDriver::new()).unwrap();
        store
            .add(Contact::new("Dana", "Dana@Example.com", ""))
            .unwrap();

        let added = store
            .import_signers(&[
                signer("Dana again", "dana@example.com", ""),
                signer("Avi", "", "050-111-2222"),
                signer("Avi dup", "", "0501112222"),
                signer("Nobody", "", ""),
            ])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[1].name, "Avi");
    }

    #[test]
    fn test_unreadable_blob_starts_empty() {
        let driver = MemoryDriver::new().with_blob(CONTACTS_KEY, [0xff, 0xfe, b'[', b']']);
        assert!(ContactStore::load(driver).unwrap().list().is_empty());

        let driver = MemoryDriver::new().with_blob(CONTACTS_KEY, "[{\"id\":");
        assert!(ContactStore::load(driver).unwrap().list().is_empty());
    }

    #[test]
    fn test_loads_split_name_contacts() {
        let driver = MemoryDriver::new().with_blob(
            CONTACTS_KEY,
            r#"[{"id":"c1","firstName":"Israel","lastName":"Israeli","phone":"0501234567","email":"israel@example.com"}]"#,
        );
        let store = ContactStore::load(driver).unwrap();
        let contact = store.get("c1").unwrap();
        assert_eq!(contact.name, "Israel Israeli");
        assert_eq!(contact.phone, "0501234567");
        assert_eq!(contact.email, "israel@example.com");
    }

    #[test]
    fn test_contacts_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = crate::store::DirDriver::new(tmp.path());
        let mut store = ContactStore::load(driver.clone()).unwrap();
        store.add(Contact::new("Dana", "", "050")).unwrap();

        let reloaded = ContactStore::load(driver).unwrap();
        assert_eq!(reloaded.list(), store.list());
    }
}
