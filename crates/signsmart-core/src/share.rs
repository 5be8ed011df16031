//! Deep links and prefilled outbound messages
//!
//! Sending is opening the generated URL; there is no delivery tracking.

use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::error::ShareError;
use crate::model::{Document, Signer};

/// Query parameter carrying the document id
pub const SIGN_PARAM: &str = "sign";
/// Query parameter carrying the signer id
pub const SIGNER_PARAM: &str = "signer";

const WHATSAPP_BASE: &str = "https://wa.me";

/// Builds links against the app's own URL
#[derive(Debug, Clone)]
pub struct ShareLinks {
    base_url: Url,
}

impl ShareLinks {
    /// `app_url` must be absolute. Any query string or fragment on it is
    /// dropped.
    pub fn new(app_url: &str) -> Result<Self, ShareError> {
        let mut base_url =
            Url::parse(app_url.trim()).map_err(|e| ShareError::InvalidBaseUrl {
                url: app_url.to_string(),
                reason: e.to_string(),
            })?;
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `<base>?sign=<document>[&signer=<signer>]`
    pub fn signing_link(&self, document_id: &str, signer_id: Option<&str>) -> String {
        let mut link = self.base_url.clone();
        {
            let mut query = link.query_pairs_mut();
            query.append_pair(SIGN_PARAM, document_id);
            if let Some(signer) = signer_id {
                query.append_pair(SIGNER_PARAM, signer);
            }
        }
        link.into()
    }
}

/// Strip everything but ASCII digits from a phone number
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn whatsapp_url(phone: &str, text: &str) -> String {
    format!(
        "{}/{}?text={}",
        WHATSAPP_BASE,
        digits_only(phone),
        urlencoding::encode(text)
    )
}

pub fn mailto_url(email: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        email.trim(),
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    WhatsApp,
    Email,
}

/// A signing request addressed to one signer
#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub signer_id: String,
    pub signer_name: String,
    pub link: String,
    pub subject: String,
    pub message: String,
    phone: String,
    email: String,
}

impl Invitation {
    /// Build the request text. With a generated reminder the message leads
    /// with it; otherwise a fixed greeting is used.
    pub fn new(
        links: &ShareLinks,
        doc: &Document,
        signer: &Signer,
        reminder: Option<&str>,
    ) -> Self {
        let link = links.signing_link(&doc.id, Some(&signer.id));
        let message = match reminder {
            Some(text) if !text.trim().is_empty() => {
                format!("{}\n\nQuick signing link:\n{}", text.trim(), link)
            }
            _ => format!(
                "Hello {}, please sign \"{}\": {}",
                signer.display_name(),
                doc.title,
                link
            ),
        };
        Self {
            signer_id: signer.id.clone(),
            signer_name: signer.display_name().to_string(),
            subject: format!("Signature request: {}", doc.title),
            link,
            message,
            phone: signer.phone.clone(),
            email: signer.email.clone(),
        }
    }

    /// Look the signer up on the document and build the request
    pub fn for_signer(
        links: &ShareLinks,
        doc: &Document,
        signer_id: &str,
        reminder: Option<&str>,
    ) -> Result<Self, ShareError> {
        let signer = doc
            .signer(signer_id)
            .ok_or_else(|| ShareError::SignerNotFound(signer_id.to_string()))?;
        Ok(Self::new(links, doc, signer, reminder))
    }

    pub fn whatsapp_url(&self) -> Result<String, ShareError> {
        if digits_only(&self.phone).is_empty() {
            return Err(ShareError::MissingPhone(self.signer_name.clone()));
        }
        Ok(whatsapp_url(&self.phone, &self.message))
    }

    pub fn mailto_url(&self) -> Result<String, ShareError> {
        if self.email.trim().is_empty() {
            return Err(ShareError::MissingEmail(self.signer_name.clone()));
        }
        Ok(mailto_url(&self.email, &self.subject, &self.message))
    }

    pub fn url_for(&self, channel: Channel) -> Result<String, ShareError> {
        match channel {
            Channel::WhatsApp => self.whatsapp_url(),
            Channel::Email => self.mailto_url(),
        }
    }
}

/// System clipboard access
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ShareError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// No clipboard; hand the text back for manual copy
    Manual(String),
}

pub fn copy_link(clipboard: Option<&mut dyn Clipboard>, link: &str) -> CopyOutcome {
    match clipboard {
        Some(cb) => match cb.write_text(link) {
            Ok(()) => CopyOutcome::Copied,
            Err(e) => {
                warn!(error = %e, "Clipboard write failed, falling back to manual copy");
                CopyOutcome::Manual(link.to_string())
            }
        },
        None => CopyOutcome::Manual(link.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc_and_signer() -> (Document, Signer) {
        let mut doc = Document::from_upload("lease.pdf", None);
        doc.id = "doc123".into();
        let mut signer = Signer::new("Dana", 1);
        signer.id = "s1".into();
        signer.phone = "050-111 2222".into();
        signer.email = "dana@example.com".into();
        doc.signers.push(signer.clone());
        (doc, signer)
    }

    #[test]
    fn test_base_url_drops_query_and_fragment() {
        let links = ShareLinks::new("https://app.example.com/sign/?sign=old#top").unwrap();
        assert_eq!(links.base_url(), "https://app.example.com/sign/");
        let links = ShareLinks::new("https://app.example.com#x").unwrap();
        assert_eq!(links.base_url(), "https://app.example.com/");
    }

    #[test]
    fn test_relative_base_url_rejected() {
        assert!(matches!(
            ShareLinks::new("/app"),
            Err(ShareError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_signing_link_encodes_ids() {
        let links = ShareLinks::new("https://app.example.com/app").unwrap();
        let link = links.signing_link("doc 1", Some("a&b"));
        assert_eq!(link, "https://app.example.com/app?sign=doc+1&signer=a%26b");
        assert_eq!(
            crate::route::Route::from_url(&link),
            crate::route::Route::Sign {
                document_id: "doc 1".into(),
                signer_id: Some("a&b".into())
            }
        );
    }

    #[test]
    fn test_signing_link() {
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        assert_eq!(
            links.signing_link("doc123", None),
            "https://app.example.com/?sign=doc123"
        );
        assert_eq!(
            links.signing_link("doc123", Some("s1")),
            "https://app.example.com/?sign=doc123&signer=s1"
        );
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("+972 (50) 111-2222"), "972501112222");
        assert_eq!(digits_only("n/a"), "");
    }

    #[test]
    fn test_whatsapp_link() {
        let (doc, signer) = doc_and_signer();
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        let invite = Invitation::new(&links, &doc, &signer, None);
        let url = invite.whatsapp_url().unwrap();
        assert!(url.starts_with("https://wa.me/0501112222?text="));
        assert!(url.contains("Hello%20Dana"));
        assert!(url.contains("sign%3Ddoc123%26signer%3Ds1"));
    }

    #[test]
    fn test_mailto_link() {
        let (doc, signer) = doc_and_signer();
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        let invite = Invitation::new(&links, &doc, &signer, None);
        let url = invite.mailto_url().unwrap();
        assert!(url.starts_with("mailto:dana@example.com?subject=Signature%20request%3A%20lease&body="));
    }

    #[test]
    fn test_reminder_text_leads_message() {
        let (doc, signer) = doc_and_signer();
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        let invite = Invitation::new(&links, &doc, &signer, Some("Friendly reminder"));
        assert_eq!(
            invite.message,
            "Friendly reminder\n\nQuick signing link:\nhttps://app.example.com/?sign=doc123&signer=s1"
        );
    }

    #[test]
    fn test_missing_contact_details() {
        let (doc, mut signer) = doc_and_signer();
        signer.phone = "---".into();
        signer.email = " ".into();
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        let invite = Invitation::new(&links, &doc, &signer, None);
        assert_eq!(
            invite.url_for(Channel::WhatsApp),
            Err(ShareError::MissingPhone("Dana".into()))
        );
        assert_eq!(
            invite.url_for(Channel::Email),
            Err(ShareError::MissingEmail("Dana".into()))
        );
    }

    #[test]
    fn test_unknown_signer() {
        let (doc, _) = doc_and_signer();
        let links = ShareLinks::new("https://app.example.com/").unwrap();
        assert!(matches!(
            Invitation::for_signer(&links, &doc, "nope", None),
            Err(ShareError::SignerNotFound(_))
        ));
    }

    struct Broken;

    impl Clipboard for Broken {
        fn write_text(&mut self, _text: &str) -> Result<(), ShareError> {
            Err(ShareError::Clipboard("denied".into()))
        }
    }

    struct Recorder(Vec<String>);

    impl Clipboard for Recorder {
        fn write_text(&mut self, text: &str) -> Result<(), ShareError> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_copy_link_fallbacks() {
        assert_eq!(copy_link(None, "x"), CopyOutcome::Manual("x".into()));
        assert_eq!(
            copy_link(Some(&mut Broken), "x"),
            CopyOutcome::Manual("x".into())
        );
        let mut recorder = Recorder(Vec::new());
        assert_eq!(copy_link(Some(&mut recorder), "x"), CopyOutcome::Copied);
        assert_eq!(recorder.0, vec!["x".to_string()]);
    }
}
