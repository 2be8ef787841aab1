use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One user's claim on one deal. `(user_id, deal_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub deal_id: ObjectId,
    #[serde(default)]
    pub status: ClaimStatus,
    pub claimed_at: DateTime,
    pub approved_at: Option<DateTime>,
    pub expires_at: Option<DateTime>,
    pub redemption_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Active,
    Expired,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Active => "active",
            ClaimStatus::Expired => "expired",
        }
    }

    /// Forward-only lifecycle: nothing ever returns to `pending`.
    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Pending, ClaimStatus::Approved)
                | (ClaimStatus::Pending, ClaimStatus::Rejected)
                | (ClaimStatus::Approved, ClaimStatus::Expired)
                | (ClaimStatus::Active, ClaimStatus::Expired)
        )
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            "active" => Ok(ClaimStatus::Active),
            "expired" => Ok(ClaimStatus::Expired),
            other => Err(format!("Unknown claim status: {other}")),
        }
    }
}

impl Claim {
    pub const COLLECTION: &'static str = "claims";

    /// Expiry is resolved at read time: an approved claim past `expires_at`
    /// reads as expired even though the stored status is unchanged.
    pub fn effective_status(&self, now: DateTime) -> ClaimStatus {
        match self.status {
            ClaimStatus::Approved | ClaimStatus::Active
                if self.expires_at.is_some_and(|at| at <= now) =>
            {
                ClaimStatus::Expired
            }
            status => status,
        }
    }
}
