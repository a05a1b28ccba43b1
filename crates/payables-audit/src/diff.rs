//! Change detection between two snapshots.
//!
//! Scalar fields are compared by their serialized form and reported one
//! record per changed field. List-valued relations are compared by entry
//! fingerprint as multisets: membership changes are reported as `Removed`
//! and `Added` records, never as per-field edits.

use payables_core::{AllocationEntry, Installment, Invoice, Withholding};
use serde::Serialize;
use thiserror::Error;

use crate::record::{AuditAction, AuditContext, AuditRecord, FieldLabels};

/// Errors that can occur while building an audit record.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A snapshot could not be serialized.
    #[error("failed to serialize audit snapshot for {field}: {source}")]
    Serialize {
        /// The field being recorded.
        field: String,
        /// The underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// A content key identifying a list entry by its significant fields.
pub trait Fingerprint {
    /// `|`-joined significant fields.
    fn fingerprint(&self) -> String;
}

/// A record whose changes can be audited.
pub trait Auditable {
    /// Scalar fields as `(key, serialized value)`.
    fn tracked_fields(&self) -> Vec<(&'static str, Option<String>)>;

    /// List-valued relations as `(key, entry fingerprints)`.
    fn tracked_lists(&self) -> Vec<(&'static str, Vec<String>)>;
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Fingerprint for Withholding {
    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.kind,
            opt(self.base),
            opt(self.rate),
            self.value
        )
    }
}

impl Fingerprint for AllocationEntry {
    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.label,
            opt(self.percentage),
            opt(self.value),
            opt(self.note.as_deref())
        )
    }
}

// The sequence label is derived from list position and left out.
impl Fingerprint for Installment {
    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.id.0,
            self.value,
            self.due_date,
            if self.paid { "paid" } else { "open" },
            opt(self.payment_date),
            opt(self.bank.as_deref())
        )
    }
}

fn fingerprints<T: Fingerprint>(entries: &[T]) -> Vec<String> {
    entries.iter().map(Fingerprint::fingerprint).collect()
}

impl Auditable for Invoice {
    fn tracked_fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("supplier", Some(self.supplier.clone())),
            ("gross", Some(self.gross().to_string())),
            ("discount", Some(self.discount().to_string())),
            ("net", Some(self.net().to_string())),
            ("status", Some(self.status.to_string())),
            ("bank", self.bank.clone()),
            ("barcode", self.barcode.clone()),
            ("settled_on", self.settled_on.map(|d| d.to_string())),
        ]
    }

    fn tracked_lists(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            ("withholdings", fingerprints(self.withholdings())),
            ("categories", fingerprints(&self.categories)),
            ("cost_centers", fingerprints(&self.cost_centers)),
            ("installments", fingerprints(&self.installments)),
        ]
    }
}

/// Compare two snapshots and emit one record per change.
///
/// Fields are reported in tracking order, followed by list changes (for each
/// list, removals before additions). Identical snapshots produce no records.
pub fn diff<T: Auditable>(
    before: &T,
    after: &T,
    labels: &FieldLabels,
    ctx: &AuditContext,
) -> Vec<AuditRecord> {
    let mut records = Vec::new();

    for ((key, old), (_, new)) in before
        .tracked_fields()
        .into_iter()
        .zip(after.tracked_fields())
    {
        if old != new {
            records.push(AuditRecord::new(
                ctx,
                AuditAction::Update,
                Some(labels.label(key).to_string()),
                old,
                new,
            ));
        }
    }

    for ((key, old), (_, new)) in before.tracked_lists().into_iter().zip(after.tracked_lists()) {
        let (removed, added) = membership_changes(&old, &new);
        let label = labels.label(key);
        for fp in removed {
            records.push(AuditRecord::new(
                ctx,
                AuditAction::Removed,
                Some(label.to_string()),
                Some(fp),
                None,
            ));
        }
        for fp in added {
            records.push(AuditRecord::new(
                ctx,
                AuditAction::Added,
                Some(label.to_string()),
                None,
                Some(fp),
            ));
        }
    }

    records
}

/// Multiset difference of two fingerprint lists, preserving list order.
fn membership_changes(before: &[String], after: &[String]) -> (Vec<String>, Vec<String>) {
    let mut remaining: Vec<Option<&String>> = before.iter().map(Some).collect();
    let mut added = Vec::new();

    for fp in after {
        match remaining.iter_mut().find(|slot| slot.is_some_and(|r| r == fp)) {
            Some(slot) => *slot = None,
            None => added.push(fp.clone()),
        }
    }

    let removed = remaining.into_iter().flatten().cloned().collect();
    (removed, added)
}

/// Build a record for a discrete event, serializing the snapshots as JSON.
///
/// Unlike [`diff`], an event is always recorded: the action itself is the change.
pub fn event<S: Serialize>(
    action: AuditAction,
    field: &str,
    before: Option<&S>,
    after: Option<&S>,
    ctx: &AuditContext,
) -> Result<AuditRecord, AuditError> {
    let previous = before.map(|s| snapshot(field, s)).transpose()?;
    let new = after.map(|s| snapshot(field, s)).transpose()?;
    Ok(AuditRecord::new(
        ctx,
        action,
        Some(field.to_string()),
        previous,
        new,
    ))
}

fn snapshot<S: Serialize>(field: &str, value: &S) -> Result<String, AuditError> {
    serde_json::to_string(value).map_err(|source| AuditError::Serialize {
        field: field.to_string(),
        source,
    })
}
