use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    pub company: Option<String>,
    pub website_url: Option<String>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Trust level of an account. Ordered so that a higher role satisfies
/// every requirement of a lower one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Verified,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    #[serde(rename = "none")]
    NotRequested,
    Pending,
    Approved,
    Rejected,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
