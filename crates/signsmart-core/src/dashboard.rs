//! Dashboard listing: search, active/archive split, status counters

use serde::Serialize;

use crate::model::{Document, DocumentStatus};

/// Documents whose title contains `query`, case-insensitively.
/// A blank query matches everything.
pub fn search<'a>(docs: &'a [Document], query: &str) -> Vec<&'a Document> {
    let needle = query.trim().to_lowercase();
    docs.iter()
        .filter(|d| needle.is_empty() || d.title.to_lowercase().contains(&needle))
        .collect()
}

/// Search results split by archive state
#[derive(Debug, Default)]
pub struct DashboardView<'a> {
    /// Anything not yet completed
    pub active: Vec<&'a Document>,
    pub archived: Vec<&'a Document>,
}

impl<'a> DashboardView<'a> {
    pub fn build(docs: &'a [Document], query: &str) -> Self {
        let (archived, active) = search(docs, query)
            .into_iter()
            .partition(|d| d.status == DocumentStatus::Completed);
        Self { active, archived }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub expired: usize,
    pub escalated: usize,
}

impl StatusCounts {
    pub fn tally(docs: &[Document]) -> Self {
        let mut counts = Self::default();
        for doc in docs {
            *counts.slot(doc.status) += 1;
        }
        counts
    }

    pub fn get(&self, status: DocumentStatus) -> usize {
        match status {
            DocumentStatus::Pending => self.pending,
            DocumentStatus::InProgress => self.in_progress,
            DocumentStatus::Completed => self.completed,
            DocumentStatus::Expired => self.expired,
            DocumentStatus::Escalated => self.escalated,
        }
    }

    pub fn total(&self) -> usize {
        DocumentStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    fn slot(&mut self, status: DocumentStatus) -> &mut usize {
        match status {
            DocumentStatus::Pending => &mut self.pending,
            DocumentStatus::InProgress => &mut self.in_progress,
            DocumentStatus::Completed => &mut self.completed,
            DocumentStatus::Expired => &mut self.expired,
            DocumentStatus::Escalated => &mut self.escalated,
        }
    }
}
