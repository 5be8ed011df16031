//! Ordered view over a document's signers
//!
//! Under [`SigningOrder::Sequential`] a signer's turn comes once everyone
//! ranked before them has signed. Under `Parallel` anyone may sign at any
//! time. Whether the turn is enforced is up to the caller.

use crate::error::WizardError;
use crate::model::{Document, Signer, SigningOrder};

pub struct SigningQueue<'a> {
    policy: SigningOrder,
    /// Signers sorted by rank; ties keep list position
    ranked: Vec<&'a Signer>,
}

impl<'a> SigningQueue<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let mut ranked: Vec<&Signer> = doc.signers.iter().collect();
        // Stable sort keeps list position for duplicate ranks
        ranked.sort_by_key(|s| s.order);
        Self {
            policy: doc.signing_order,
            ranked,
        }
    }

    pub fn policy(&self) -> SigningOrder {
        self.policy
    }

    /// Signers in the order they are expected to act
    pub fn ranked(&self) -> &[&'a Signer] {
        &self.ranked
    }

    /// First signer in rank order who has not signed yet
    pub fn next_pending(&self) -> Option<&'a Signer> {
        self.ranked.iter().copied().find(|s| !s.has_signed)
    }

    /// Signers still outstanding, in rank order
    pub fn pending(&self) -> impl Iterator<Item = &'a Signer> + '_ {
        self.ranked.iter().copied().filter(|s| !s.has_signed)
    }

    pub fn all_signed(&self) -> bool {
        self.ranked.iter().all(|s| s.has_signed)
    }

    /// Whether `signer_id` may sign now under the document's policy.
    /// Ids that are not on the document never get a turn.
    pub fn check_turn(&self, signer_id: &str) -> Result<(), WizardError> {
        if !self.ranked.iter().any(|s| s.id == signer_id) {
            return Err(WizardError::UnknownSigner(signer_id.to_string()));
        }
        if self.policy == SigningOrder::Parallel {
            return Ok(());
        }
        for signer in &self.ranked {
            if signer.id == signer_id {
                break;
            }
            if !signer.has_signed {
                return Err(WizardError::OutOfTurn {
                    waiting_on: signer.display_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
