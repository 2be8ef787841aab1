use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use startup_deals_db::models::{Claim, ClaimStatus};

use super::base::{BaseDao, DaoResult};

/// The claim ledger. Uniqueness of `(user_id, deal_id)` and of issued
/// redemption codes is enforced by indexes, so inserts surface conflicts as
/// `DaoError::DuplicateKey`.
pub struct ClaimDao {
    pub base: BaseDao<Claim>,
}

impl ClaimDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Claim::COLLECTION),
        }
    }

    pub async fn insert(&self, claim: &Claim) -> DaoResult<Claim> {
        let id = self.base.insert_one(claim).await?;
        self.base.find_by_id(id).await
    }

    pub async fn exists_for(&self, user_id: ObjectId, deal_id: ObjectId) -> DaoResult<bool> {
        Ok(self
            .base
            .count(doc! { "user_id": user_id, "deal_id": deal_id })
            .await?
            > 0)
    }

    pub async fn code_in_use(&self, code: &str) -> DaoResult<bool> {
        Ok(self.base.count(doc! { "redemption_code": code }).await? > 0)
    }

    /// Newest first, optionally narrowed to an effective status.
    pub async fn list_for_user(
        &self,
        user_id: ObjectId,
        status: Option<ClaimStatus>,
        now: DateTime,
    ) -> DaoResult<Vec<Claim>> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(status) = status {
            for (key, value) in status_filter(status, now) {
                filter.insert(key, value);
            }
        }
        self.base
            .find_many(filter, Some(doc! { "claimed_at": -1 }))
            .await
    }

    /// Move a pending claim to approved. Returns false when the claim was not
    /// pending any more.
    pub async fn approve(
        &self,
        claim_id: ObjectId,
        redemption_code: &str,
        approved_at: DateTime,
        expires_at: DateTime,
    ) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": claim_id, "status": ClaimStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": ClaimStatus::Approved.as_str(),
                        "redemption_code": redemption_code,
                        "approved_at": approved_at,
                        "expires_at": expires_at,
                    }
                },
            )
            .await
    }

    /// Move a pending claim to rejected with the reason in `notes`.
    pub async fn reject(&self, claim_id: ObjectId, reason: &str) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": claim_id, "status": ClaimStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": ClaimStatus::Rejected.as_str(),
                        "notes": reason,
                    }
                },
            )
            .await
    }

    pub async fn delete(&self, claim_id: ObjectId) -> DaoResult<bool> {
        Ok(self.base.hard_delete(doc! { "_id": claim_id }).await? > 0)
    }
}

/// Query fragment for an effective status. Expiry is not stored, so
/// `approved` and `expired` are split on `expires_at` at query time.
pub fn status_filter(status: ClaimStatus, now: DateTime) -> Document {
    let live = [ClaimStatus::Approved.as_str(), ClaimStatus::Active.as_str()];
    match status {
        ClaimStatus::Expired => doc! {
            "$or": [
                { "status": ClaimStatus::Expired.as_str() },
                { "status": { "$in": live.to_vec() }, "expires_at": { "$lte": now } },
            ]
        },
        ClaimStatus::Approved | ClaimStatus::Active => doc! {
            "status": status.as_str(),
            "$or": [ { "expires_at": null }, { "expires_at": { "$gt": now } } ],
        },
        ClaimStatus::Pending | ClaimStatus::Rejected => doc! { "status": status.as_str() },
    }
}
