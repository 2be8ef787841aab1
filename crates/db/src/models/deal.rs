use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub partner: Partner,
    pub category: Category,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub eligibility_conditions: EligibilityConditions,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub discount_value: Option<String>,
    pub valid_until: Option<DateTime>,
    pub claim_limit: Option<u32>,
    #[serde(default)]
    pub claim_count: u32,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub redemption_instructions: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub name: String,
    pub logo: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EligibilityConditions {
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cloud,
    Marketing,
    Analytics,
    Productivity,
    Development,
    Design,
    Communication,
    Finance,
    Legal,
    Hr,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Public,
    Locked,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Cloud,
        Category::Marketing,
        Category::Analytics,
        Category::Productivity,
        Category::Development,
        Category::Design,
        Category::Communication,
        Category::Finance,
        Category::Legal,
        Category::Hr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cloud => "cloud",
            Category::Marketing => "marketing",
            Category::Analytics => "analytics",
            Category::Productivity => "productivity",
            Category::Development => "development",
            Category::Design => "design",
            Category::Communication => "communication",
            Category::Finance => "finance",
            Category::Legal => "legal",
            Category::Hr => "hr",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Locked => "locked",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AccessLevel::Public),
            "locked" => Ok(AccessLevel::Locked),
            other => Err(format!("Unknown access level: {other}")),
        }
    }
}

fn bool_true() -> bool {
    true
}

impl Deal {
    pub const COLLECTION: &'static str = "deals";

    /// Derived on every read, never persisted: active, not past `valid_until`,
    /// and still under `claim_limit`.
    pub fn is_available(&self, now: DateTime) -> bool {
        if !self.is_active {
            return false;
        }
        if self.valid_until.is_some_and(|until| until <= now) {
            return false;
        }
        if self.claim_limit.is_some_and(|limit| self.claim_count >= limit) {
            return false;
        }
        true
    }

    /// Locked deals that demand verification are gated on the claimant.
    pub fn requires_verified_claimant(&self) -> bool {
        self.access_level == AccessLevel::Locked && self.eligibility_conditions.requires_verification
    }
}
