//! Audit record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Who made a change, and when.
///
/// Passed explicitly to every emitting function; the emitter never reads a
/// clock or a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Actor identity.
    pub actor: String,
    /// Timestamp of the change.
    pub at: DateTime<Utc>,
}

impl AuditContext {
    /// Create a context.
    #[must_use]
    pub fn new(actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            actor: actor.into(),
            at,
        }
    }
}

/// Kind of change an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A tracked field changed value.
    Update,
    /// An entry was added to a tracked list.
    Added,
    /// An entry was removed from a tracked list.
    Removed,
    /// An installment was settled.
    Settlement,
    /// An installment settlement was reversed.
    Reversal,
}

impl AuditAction {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Settlement => "settlement",
            Self::Reversal => "reversal",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized change record.
///
/// Records are built once and never mutated; fields are private and exposed
/// through getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    actor: String,
    action: AuditAction,
    field: Option<String>,
    previous: Option<String>,
    new: Option<String>,
    at: DateTime<Utc>,
}

impl AuditRecord {
    pub(crate) fn new(
        ctx: &AuditContext,
        action: AuditAction,
        field: Option<String>,
        previous: Option<String>,
        new: Option<String>,
    ) -> Self {
        Self {
            actor: ctx.actor.clone(),
            action,
            field,
            previous,
            new,
            at: ctx.at,
        }
    }

    /// Actor identity.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Kind of change.
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    /// Affected field label.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Serialized previous value.
    #[must_use]
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Serialized new value.
    #[must_use]
    pub fn new_value(&self) -> Option<&str> {
        self.new.as_deref()
    }

    /// Timestamp.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.at.to_rfc3339(), self.actor, self.action)?;
        if let Some(field) = &self.field {
            write!(f, " {field}")?;
        }
        write!(
            f,
            ": {} -> {}",
            self.previous.as_deref().unwrap_or("-"),
            self.new.as_deref().unwrap_or("-")
        )
    }
}

/// Display labels for tracked field keys.
///
/// Keys without a label are reported under the key itself.
#[derive(Debug, Clone, Default)]
pub struct FieldLabels {
    labels: HashMap<String, String>,
}

impl FieldLabels {
    /// Create an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels for the fields and lists tracked on invoices.
    #[must_use]
    pub fn invoice_defaults() -> Self {
        Self::new()
            .with("supplier", "Supplier")
            .with("gross", "Gross amount")
            .with("discount", "Discount")
            .with("net", "Net amount")
            .with("status", "Status")
            .with("bank", "Bank")
            .with("barcode", "Barcode")
            .with("settled_on", "Settlement date")
            .with("withholdings", "Withholdings")
            .with("categories", "Categories")
            .with("cost_centers", "Cost centers")
            .with("installments", "Installments")
    }

    /// Add or replace a label.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(key.into(), label.into());
        self
    }

    /// Label for `key`, falling back to the key.
    #[must_use]
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map_or(key, String::as_str)
    }
}
