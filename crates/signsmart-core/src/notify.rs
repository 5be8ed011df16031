//! Completion notices
//!
//! Once a signing session is recorded the sender gets a notice. Delivery is
//! best effort: a failed notice is logged and never undoes the completion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::model::Document;

/// Name used when the document has no signer to credit
pub const UNKNOWN_SIGNER: &str = "Unknown signer";

/// What the sender is told about a finished document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionNotice {
    pub document_id: String,
    pub title: String,
    pub signer_name: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionNotice {
    /// Credit the session's signer when known, otherwise the first signer
    pub fn new(doc: &Document, signer_id: Option<&str>, completed_at: DateTime<Utc>) -> Self {
        let signer = signer_id
            .and_then(|id| doc.signer(id))
            .or_else(|| doc.signers.first());
        let signer_name = signer
            .map(|s| s.display_name().trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_SIGNER)
            .to_string();
        Self {
            document_id: doc.id.clone(),
            title: doc.title.clone(),
            signer_name,
            completed_at,
        }
    }
}

#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn document_completed(&self, notice: &CompletionNotice) -> Result<(), NotifyError>;
}

/// Writes the notice to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl CompletionNotifier for LogNotifier {
    async fn document_completed(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        info!(
            document = %notice.document_id,
            title = %notice.title,
            signer = %notice.signer_name,
            "Document signed"
        );
        Ok(())
    }
}

/// Appends each notice as one JSON line to a file that a mailer can drain
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CompletionNotifier for OutboxNotifier {
    async fn document_completed(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        let line = serde_json::to_string(notice)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Pick a notifier by its config name. `none` turns notices off; unknown
/// names fall back to the log.
pub fn notifier_from_name(name: &str, data_dir: &Path) -> Option<Box<dyn CompletionNotifier>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "log" => Some(Box::new(LogNotifier)),
        "outbox" => Some(Box::new(OutboxNotifier::new(data_dir.join("outbox.jsonl")))),
        "none" | "off" | "disabled" => None,
        other => {
            warn!(notifier = other, "Unknown notifier, logging notices instead");
            Some(Box::new(LogNotifier))
        }
    }
}

/// Deliver a notice, logging instead of failing. Returns whether it went out.
pub async fn notify_completion(notifier: &dyn CompletionNotifier, notice: &CompletionNotice) -> bool {
    match notifier.document_completed(notice).await {
        Ok(()) => true,
        Err(e) => {
            warn!(document = %notice.document_id, error = %e, "Completion notice failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Signer;
    use pretty_assertions::assert_eq;

    fn signed_doc() -> Document {
        let mut doc = Document::from_upload("lease.pdf", None);
        doc.id = "doc1".into();
        let mut dana = Signer::new("Dana", 1);
        dana.id = "dana".into();
        let mut avi = Signer::new("Avi", 2);
        avi.id = "avi".into();
        doc.signers = vec![dana, avi];
        doc
    }

    struct Unreachable;

    #[async_trait]
    impl CompletionNotifier for Unreachable {
        async fn document_completed(&self, _: &CompletionNotice) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected("smtp down".into()))
        }
    }

    #[test]
    fn test_notice_credits_session_signer() {
        let doc = signed_doc();
        let now = Utc::now();
        assert_eq!(CompletionNotice::new(&doc, Some("avi"), now).signer_name, "Avi");
        assert_eq!(CompletionNotice::new(&doc, None, now).signer_name, "Dana");
        assert_eq!(CompletionNotice::new(&doc, Some("ghost"), now).signer_name, "Dana");

        let mut empty = doc.clone();
        empty.signers.clear();
        assert_eq!(CompletionNotice::new(&empty, None, now).signer_name, UNKNOWN_SIGNER);
    }

    #[tokio::test]
    async fn test_failed_notice_is_not_an_error() {
        let notice = CompletionNotice::new(&signed_doc(), None, Utc::now());
        assert!(!notify_completion(&Unreachable, &notice).await);
        assert!(notify_completion(&LogNotifier, &notice).await);
    }

    #[tokio::test]
    async fn test_outbox_appends_json_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let outbox = OutboxNotifier::new(tmp.path().join("outbox.jsonl"));
        let notice = CompletionNotice::new(&signed_doc(), None, Utc::now());
        outbox.document_completed(&notice).await.unwrap();
        outbox.document_completed(&notice).await.unwrap();

        let raw = std::fs::read_to_string(outbox.path()).unwrap();
        let lines: Vec<CompletionNotice> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, vec![notice.clone(), notice]);
    }

    #[tokio::test]
    async fn test_outbox_in_missing_directory_fails_softly() {
        let tmp = tempfile::tempdir().unwrap();
        let outbox = OutboxNotifier::new(tmp.path().join("missing/outbox.jsonl"));
        let notice = CompletionNotice::new(&signed_doc(), None, Utc::now());
        assert!(!notify_completion(&outbox, &notice).await);
    }

    #[test]
    fn test_notifier_from_name() {
        let dir = Path::new("/tmp");
        assert!(notifier_from_name("log", dir).is_some());
        assert!(notifier_from_name("Outbox", dir).is_some());
        assert!(notifier_from_name("none", dir).is_none());
        assert!(notifier_from_name("pager", dir).is_some());
    }
}
