//! Follow-up schedule for documents out for signature
//!
//! The clock starts at the document's `updatedAt`, which `save` stamps when
//! the document is sent. Sweeps change status only and leave that
//! timestamp alone, so later thresholds are still measured from the send.
//! Each reminder offset is reported once: a sweep records the latest offset
//! it issued on the document and later sweeps skip offsets up to it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::{Document, DocumentStatus};
use crate::store::{DocumentStore, StorageDriver};

fn default_offsets() -> Vec<u32> {
    vec![24, 48, 72]
}

fn default_escalate_after_days() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    /// Hours after sending at which a reminder goes out
    #[serde(default = "default_offsets")]
    pub offsets_hours: Vec<u32>,
    #[serde(default = "default_escalate_after_days")]
    pub escalate_after_days: u32,
    /// Unsigned documents expire after this many days; never when unset
    #[serde(default)]
    pub expire_after_days: Option<u32>,
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self {
            offsets_hours: default_offsets(),
            escalate_after_days: default_escalate_after_days(),
            expire_after_days: None,
        }
    }
}

/// What is owed on one document at a given instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderDecision {
    /// Offsets (hours) that have elapsed and were not issued yet, ascending
    pub due_offsets: Vec<u32>,
    pub escalate: bool,
    pub expire: bool,
}

impl ReminderDecision {
    pub fn is_idle(&self) -> bool {
        self.due_offsets.is_empty() && !self.escalate && !self.expire
    }
}

impl ReminderSchedule {
    pub fn evaluate(&self, doc: &Document, now: DateTime<Utc>) -> ReminderDecision {
        let elapsed = now.signed_duration_since(doc.updated_at);
        let mut decision = ReminderDecision::default();

        let outstanding = matches!(
            doc.status,
            DocumentStatus::InProgress | DocumentStatus::Escalated
        );
        if outstanding {
            if let Some(days) = self.expire_after_days {
                decision.expire = elapsed >= Duration::days(i64::from(days));
            }
        }

        if doc.status != DocumentStatus::InProgress || !doc.reminders_enabled {
            return decision;
        }

        let issued = doc.last_reminder_hours;
        let mut offsets: Vec<u32> = self
            .offsets_hours
            .iter()
            .copied()
            .filter(|h| elapsed >= Duration::hours(i64::from(*h)))
            .filter(|h| issued.map_or(true, |last| *h > last))
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        decision.due_offsets = offsets;
        decision.escalate = elapsed >= Duration::days(i64::from(self.escalate_after_days));
        decision
    }

    /// When the next reminder falls due, if one is still scheduled
    pub fn next_reminder_at(&self, doc: &Document, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if doc.status != DocumentStatus::InProgress || !doc.reminders_enabled {
            return None;
        }
        self.offsets_hours
            .iter()
            .map(|h| doc.updated_at + Duration::hours(i64::from(*h)))
            .filter(|at| *at > now)
            .min()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub escalated: Vec<String>,
    pub expired: Vec<String>,
    /// Document id and the latest newly elapsed reminder offset
    pub reminders_due: Vec<(String, u32)>,
}

/// Apply the schedule to every stored document
pub fn sweep<D: StorageDriver>(
    store: &mut DocumentStore<D>,
    schedule: &ReminderSchedule,
    now: DateTime<Utc>,
) -> Result<SweepReport, StoreError> {
    let decisions: Vec<(String, ReminderDecision)> = store
        .list()
        .iter()
        .map(|doc| (doc.id.clone(), schedule.evaluate(doc, now)))
        .filter(|(_, d)| !d.is_idle())
        .collect();

    let mut report = SweepReport::default();
    for (id, decision) in decisions {
        if decision.expire {
            store.update(&id, |doc| doc.status = DocumentStatus::Expired)?;
            warn!(document = %id, "Document expired unsigned");
            report.expired.push(id);
            continue;
        }
        if let Some(&latest) = decision.due_offsets.last() {
            store.update(&id, |doc| doc.last_reminder_hours = Some(latest))?;
            info!(document = %id, hours = latest, "Reminder due");
            report.reminders_due.push((id.clone(), latest));
        }
        if decision.escalate {
            store.update(&id, |doc| doc.status = DocumentStatus::Escalated)?;
            info!(document = %id, "Document escalated");
            report.escalated.push(id);
        }
    }
    Ok(report)
}
