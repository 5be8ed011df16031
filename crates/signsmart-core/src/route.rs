//! Deep-link routing
//!
//! A URL carrying `sign=<id>` opens that document's signing wizard; any
//! other URL lands on the dashboard.

use tracing::{debug, warn};
use url::Url;

use crate::model::Document;
use crate::share::{SIGNER_PARAM, SIGN_PARAM};
use crate::store::{DocumentStore, StorageDriver};

/// Resolves relative input such as `/?sign=x` or `?sign=x`
const RELATIVE_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Sign {
        document_id: String,
        signer_id: Option<String>,
    },
}

impl Route {
    /// Parse the query string of `url`. Only the first occurrence of each
    /// parameter counts; an empty `sign` value is treated as absent. Input
    /// that does not parse as a URL lands on the dashboard.
    pub fn from_url(url: &str) -> Self {
        let Some(parsed) = parse_lenient(url) else {
            return Route::Dashboard;
        };

        let first = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };

        match first(SIGN_PARAM) {
            Some(document_id) => Route::Sign {
                document_id,
                signer_id: first(SIGNER_PARAM),
            },
            None => Route::Dashboard,
        }
    }
}

fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(url))
            .map_err(|e| warn!(url, error = %e, "Unparseable link, opening dashboard"))
            .ok(),
        Err(e) => {
            warn!(url, error = %e, "Unparseable link, opening dashboard");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Wizard {
        document: Document,
        signer_id: Option<String>,
    },
    NotFound(String),
}

pub fn resolve<D: StorageDriver>(route: &Route, store: &DocumentStore<D>) -> View {
    match route {
        Route::Dashboard => View::Dashboard,
        Route::Sign {
            document_id,
            signer_id,
        } => match store.get(document_id) {
            Some(doc) => {
                debug!(document = %document_id, "Opening signing view");
                View::Wizard {
                    document: doc.clone(),
                    signer_id: signer_id.clone(),
                }
            }
            None => {
                warn!(document = %document_id, "Signing link points at an unknown document");
                View::NotFound(document_id.clone())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_url_is_dashboard() {
        assert_eq!(Route::from_url("https://app.example.com/"), Route::Dashboard);
        assert_eq!(
            Route::from_url("https://app.example.com/?tab=archive"),
            Route::Dashboard
        );
        assert_eq!(Route::from_url("https://app.example.com/?sign="), Route::Dashboard);
    }

    #[test]
    fn test_sign_parameter() {
        assert_eq!(
            Route::from_url("https://app.example.com/?sign=doc123"),
            Route::Sign {
                document_id: "doc123".into(),
                signer_id: None
            }
        );
        assert_eq!(
            Route::from_url("/?signer=s%201&sign=doc123#top"),
            Route::Sign {
                document_id: "doc123".into(),
                signer_id: Some("s 1".into())
            }
        );
    }

    #[test]
    fn test_encoded_parameter_names() {
        assert_eq!(
            Route::from_url("https://app.example.com/?si%67n=doc123"),
            Route::Sign {
                document_id: "doc123".into(),
                signer_id: None
            }
        );
        assert_eq!(
            Route::from_url("https://app.example.com/?sign=doc+1&signer=a%26b"),
            Route::Sign {
                document_id: "doc 1".into(),
                signer_id: Some("a&b".into())
            }
        );
    }

    #[test]
    fn test_unparseable_url_is_dashboard() {
        assert_eq!(Route::from_url("http://[::1"), Route::Dashboard);
        assert_eq!(Route::from_url(""), Route::Dashboard);
    }

    #[test]
    fn test_first_occurrence_wins() {
        assert_eq!(
            Route::from_url("?sign=a&sign=b"),
            Route::Sign {
                document_id: "a".into(),
                signer_id: None
            }
        );
    }
}
