use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allocator::IdentifierSource;
use crate::error::Result;
use crate::identifier::Identifier;

/// Severity of a reported failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Minor,
    Major,
    Critical,
}

/// Workflow state of a failure record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStatus {
    #[default]
    Active,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    #[serde(rename = "On Hold")]
    OnHold,
}

/// A failure record as submitted for creation, before it has necessarily
/// been assigned an identifier.
///
/// Imports and updates arrive with `identifier` already populated; fresh
/// reports leave it empty and receive one at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDraft {
    pub identifier: Option<Identifier>,
    pub severity: Severity,
    pub status: FailureStatus,
    pub reported_at: DateTime<Utc>,
    pub summary: String,
}

/// A failure record ready to persist, identifier included.
///
/// The identifier is immutable from here on; no update path ever rewrites
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub identifier: Identifier,
    pub severity: Severity,
    pub status: FailureStatus,
    pub reported_at: DateTime<Utc>,
    pub summary: String,
}

impl FailureDraft {
    /// A fresh report with no identifier, default severity and status.
    pub fn new(summary: impl Into<String>, reported_at: DateTime<Utc>) -> Self {
        Self {
            identifier: None,
            severity: Severity::default(),
            status: FailureStatus::default(),
            reported_at,
            summary: summary.into(),
        }
    }

    /// Resolves the draft into a persistable record, calling the allocator
    /// exactly once if and only if the draft carries no identifier.
    ///
    /// A draft that already has an identifier passes it through untouched;
    /// the allocator is not consulted and no sequence number is consumed.
    ///
    /// # Errors
    ///
    /// Propagates the allocator's failure unchanged. No record may be
    /// created without an identifier, so the caller must abort creation on
    /// error (retrying the whole operation when
    /// [`is_retryable`](crate::Error::is_retryable) says so).
    pub fn into_record(self, ids: &impl IdentifierSource) -> Result<FailureRecord> {
        let identifier = match self.identifier {
            Some(identifier) => identifier,
            None => ids.allocate_next()?,
        };
        Ok(FailureRecord {
            identifier,
            severity: self.severity,
            status: self.status,
            reported_at: self.reported_at,
            summary: self.summary,
        })
    }
}
