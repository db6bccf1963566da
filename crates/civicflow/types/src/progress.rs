//! Work progress records filed by the awarded contractor
//!
//! A `completion`-type record reaching `approved` is the unique trigger for
//! resolving the tender and its source issue. The cascade engine refuses to
//! re-fire once the tender is verified, so at most one completion record per
//! tender ever has that effect.

use crate::{ActorId, TenderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a work progress record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressId(pub String);

impl ProgressId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for ProgressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of progress a record reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressType {
    Start,
    Update,
    Milestone,
    Completion,
}

impl ProgressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::Milestone => "milestone",
            Self::Completion => "completion",
        }
    }
}

impl std::fmt::Display for ProgressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review status of a progress record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ProgressStatus {
    pub const ALL: [ProgressStatus; 4] = [
        Self::Draft,
        Self::Submitted,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A progress report filed against an awarded tender.
///
/// Tender and contractor refs are immutable; the contractor must equal the
/// tender's awarded contractor at creation (checked by the store).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkProgressRecord {
    /// Unique identifier
    pub id: ProgressId,
    /// The tender this record reports on
    pub tender_id: TenderId,
    /// The filing contractor
    pub contractor_id: ActorId,
    /// Kind of progress reported
    pub progress_type: ProgressType,
    /// Percent complete, inclusive 0..=100
    pub progress_percentage: u8,
    /// Free-text report body
    pub note: String,
    /// Review status
    pub status: ProgressStatus,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write
    pub version: u64,
}

impl WorkProgressRecord {
    pub fn new(
        id: ProgressId,
        tender_id: TenderId,
        contractor_id: ActorId,
        progress_type: ProgressType,
        progress_percentage: u8,
        note: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tender_id,
            contractor_id,
            progress_type,
            progress_percentage,
            note: note.into(),
            status: ProgressStatus::Draft,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_completion(&self) -> bool {
        self.progress_type == ProgressType::Completion
    }

    /// Stamp a committed write
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_draft() {
        let record = WorkProgressRecord::new(
            ProgressId::new("wpr-1"),
            TenderId::new("tender-1"),
            ActorId::new("contractor-1"),
            ProgressType::Start,
            0,
            "Mobilized on site",
            Utc::now(),
        );
        assert_eq!(record.status, ProgressStatus::Draft);
        assert!(!record.is_completion());
    }

    #[test]
    fn test_completion_detection() {
        let record = WorkProgressRecord::new(
            ProgressId::new("wpr-2"),
            TenderId::new("tender-1"),
            ActorId::new("contractor-1"),
            ProgressType::Completion,
            100,
            "Done",
            Utc::now(),
        );
        assert!(record.is_completion());
    }

    #[test]
    fn test_type_wire_names() {
        let json = serde_json::to_string(&ProgressType::Milestone).unwrap();
        assert_eq!(json, "\"milestone\"");
        assert!(serde_json::from_str::<ProgressType>("\"final\"").is_err());
    }
}
