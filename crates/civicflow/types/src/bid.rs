//! Bids placed by contractors against open tenders

use crate::{ActorId, TenderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a bid
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidId(pub String);

impl BidId {
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

impl std::fmt::Display for BidId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bid lifecycle status. Everything except `pending` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl BidStatus {
    pub const ALL: [BidStatus; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Withdrawn,
    ];

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contractor's bid on a tender. Tender and bidder refs are immutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    /// Unique identifier
    pub id: BidId,
    /// The tender this bid targets
    pub tender_id: TenderId,
    /// The bidding contractor
    pub user_id: ActorId,
    /// Offered amount in minor currency units
    pub amount: i64,
    /// Lifecycle status
    pub status: BidStatus,
    /// When the bid was placed
    pub created_at: DateTime<Utc>,
    /// When the bid was last written
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write
    pub version: u64,
}

impl Bid {
    pub fn new(
        id: BidId,
        tender_id: TenderId,
        user_id: ActorId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tender_id,
            user_id,
            amount,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Stamp a committed write
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}
