use bson::{oid::ObjectId, DateTime};
use startup_deals_config::ClaimSettings;
use startup_deals_db::models::{AccessLevel, Claim, ClaimStatus, Deal, User};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::dao::{DaoError, claim::ClaimDao, deal::DealDao};
use crate::redemption::generate_redemption_code;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Deal not found")]
    NotFound,
    #[error("This deal is no longer active")]
    Inactive,
    #[error("This deal is no longer available")]
    Unavailable,
    #[error("This deal requires verification. Please verify your account first.")]
    VerificationRequired,
    #[error("You have already claimed this deal")]
    AlreadyClaimed,
    #[error("Claim not found")]
    ClaimNotFound,
    #[error("Cannot move a {from} claim to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("Redemption code is already in use")]
    CodeTaken,
    #[error("Could not mint a unique redemption code")]
    CodeSpaceExhausted,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

/// A claim together with the deal it references. The deal is `None` only if
/// it has been removed from the catalog.
#[derive(Debug, Clone)]
pub struct ClaimWithDeal {
    pub claim: Claim,
    pub deal: Option<Deal>,
}

/// Decide whether `user` may claim `deal` and which status the claim starts
/// in. Checks run in a fixed order and the first failure wins. The
/// already-claimed check needs the ledger and is done by the caller.
pub fn check_eligibility(user: &User, deal: &Deal, now: DateTime) -> Result<ClaimStatus, ClaimError> {
    if !deal.is_active {
        return Err(ClaimError::Inactive);
    }
    if !deal.is_available(now) {
        return Err(ClaimError::Unavailable);
    }
    if deal.requires_verified_claimant() && !user.is_verified {
        return Err(ClaimError::VerificationRequired);
    }
    Ok(initial_status(deal))
}

/// Locked deals wait for review, public deals are approved on the spot.
pub fn initial_status(deal: &Deal) -> ClaimStatus {
    match deal.access_level {
        AccessLevel::Locked => ClaimStatus::Pending,
        AccessLevel::Public => ClaimStatus::Approved,
    }
}

pub fn expiry_after(from: DateTime, days: u32) -> DateTime {
    DateTime::from_millis(from.timestamp_millis() + i64::from(days) * DAY_MILLIS)
}

fn is_code_conflict(message: &str) -> bool {
    message.contains("redemption_code")
}

/// Claim gate plus the ledger operations built on it.
pub struct ClaimService {
    deals: Arc<DealDao>,
    claims: Arc<ClaimDao>,
    settings: ClaimSettings,
}

impl ClaimService {
    pub fn new(deals: Arc<DealDao>, claims: Arc<ClaimDao>, settings: ClaimSettings) -> Self {
        Self {
            deals,
            claims,
            settings,
        }
    }

    fn code_attempts(&self) -> u32 {
        self.settings.redemption_code_attempts.max(1)
    }

    /// Run the gate and, on success, record the claim and count it against
    /// the deal. Public deals come back approved with a redemption code.
    pub async fn attempt_claim(
        &self,
        user: &User,
        deal_id: ObjectId,
    ) -> Result<ClaimWithDeal, ClaimError> {
        let user_id = user.id.ok_or(DaoError::MissingId)?;
        let now = DateTime::now();

        let deal = match self.deals.base.find_by_id(deal_id).await {
            Ok(deal) => deal,
            Err(DaoError::NotFound) => return Err(ClaimError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let status = check_eligibility(user, &deal, now).inspect_err(|e| {
            warn!(user = %user_id, deal = %deal_id, reason = %e, "Claim refused");
        })?;

        if self.claims.exists_for(user_id, deal_id).await? {
            warn!(user = %user_id, deal = %deal_id, "Duplicate claim refused");
            return Err(ClaimError::AlreadyClaimed);
        }

        let claim = self.insert_claim(user_id, deal_id, status, now).await?;
        let claim_id = claim.id.ok_or(DaoError::MissingId)?;

        // The guard re-checks limit and expiry at write time. Losing that race
        // means the claim just written must not stand.
        if !self.deals.try_increment_claim_count(deal_id, now).await? {
            warn!(user = %user_id, deal = %deal_id, "Deal exhausted while claiming");
            let cleanup = self.discard_claim(claim_id).await;
            return Err(lost_race(claim_id, cleanup));
        }

        info!(
            user = %user_id,
            deal = %deal_id,
            claim = %claim_id,
            status = claim.status.as_str(),
            "Deal claimed"
        );

        self.with_deal(claim).await
    }

    /// Remove a claim that was never counted against its deal, retrying once.
    async fn discard_claim(&self, claim_id: ObjectId) -> Result<bool, DaoError> {
        match self.claims.delete(claim_id).await {
            Ok(deleted) => Ok(deleted),
            Err(e) => {
                warn!(claim = %claim_id, error = %e, "Retrying removal of uncounted claim");
                self.claims.delete(claim_id).await
            }
        }
    }

    async fn insert_claim(
        &self,
        user_id: ObjectId,
        deal_id: ObjectId,
        status: ClaimStatus,
        now: DateTime,
    ) -> Result<Claim, ClaimError> {
        for _ in 0..self.code_attempts() {
            let mut claim = Claim {
                id: None,
                user_id,
                deal_id,
                status,
                claimed_at: now,
                approved_at: None,
                expires_at: None,
                redemption_code: None,
                notes: None,
                created_at: now,
                updated_at: now,
            };
            if status == ClaimStatus::Approved {
                claim.redemption_code = Some(self.mint_code().await?);
                claim.approved_at = Some(now);
                claim.expires_at = Some(expiry_after(now, self.settings.redemption_ttl_days));
            }

            match self.claims.insert(&claim).await {
                Ok(claim) => return Ok(claim),
                Err(DaoError::DuplicateKey(msg)) if is_code_conflict(&msg) => {
                    warn!("Redemption code taken at insert, retrying");
                }
                Err(DaoError::DuplicateKey(_)) => return Err(ClaimError::AlreadyClaimed),
                Err(e) => return Err(e.into()),
            }
        }
        Err(ClaimError::CodeSpaceExhausted)
    }

    /// A fresh code that is not yet in the ledger.
    pub async fn mint_code(&self) -> Result<String, ClaimError> {
        for attempt in 1..=self.code_attempts() {
            let code = generate_redemption_code();
            if !self.claims.code_in_use(&code).await? {
                return Ok(code);
            }
            warn!(attempt, "Redemption code collision");
        }
        Err(ClaimError::CodeSpaceExhausted)
    }

    /// Approve a pending claim, minting a code when none is supplied.
    pub async fn approve(
        &self,
        claim_id: ObjectId,
        redemption_code: Option<String>,
        expiry_days: Option<u32>,
    ) -> Result<ClaimWithDeal, ClaimError> {
        let claim = self.find_claim(claim_id).await?;
        let now = DateTime::now();
        ensure_transition(&claim, ClaimStatus::Approved, now)?;

        let days = expiry_days.unwrap_or(self.settings.redemption_ttl_days);
        let expires_at = expiry_after(now, days);

        if let Some(code) = redemption_code {
            return match self.claims.approve(claim_id, &code, now, expires_at).await {
                Ok(true) => self.approved(claim_id).await,
                Ok(false) => Err(transition_error(ClaimStatus::Pending, ClaimStatus::Approved)),
                Err(DaoError::DuplicateKey(_)) => Err(ClaimError::CodeTaken),
                Err(e) => Err(e.into()),
            };
        }

        for _ in 0..self.code_attempts() {
            let code = self.mint_code().await?;
            match self.claims.approve(claim_id, &code, now, expires_at).await {
                Ok(true) => return self.approved(claim_id).await,
                Ok(false) => return Err(transition_error(ClaimStatus::Pending, ClaimStatus::Approved)),
                Err(DaoError::DuplicateKey(msg)) if is_code_conflict(&msg) => {
                    warn!(claim = %claim_id, "Redemption code taken at approval, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ClaimError::CodeSpaceExhausted)
    }

    async fn approved(&self, claim_id: ObjectId) -> Result<ClaimWithDeal, ClaimError> {
        info!(claim = %claim_id, "Claim approved");
        self.with_deal(self.find_claim(claim_id).await?).await
    }

    /// Reject a pending claim, keeping the reason as the claim's note.
    pub async fn reject(&self, claim_id: ObjectId, reason: &str) -> Result<ClaimWithDeal, ClaimError> {
        let claim = self.find_claim(claim_id).await?;
        ensure_transition(&claim, ClaimStatus::Rejected, DateTime::now())?;

        if !self.claims.reject(claim_id, reason).await? {
            return Err(transition_error(ClaimStatus::Pending, ClaimStatus::Rejected));
        }
        info!(claim = %claim_id, "Claim rejected");
        self.with_deal(self.find_claim(claim_id).await?).await
    }

    /// Every claim of the user, newest first, each with its deal attached.
    pub async fn list_for_user(
        &self,
        user_id: ObjectId,
        status: Option<ClaimStatus>,
    ) -> Result<Vec<ClaimWithDeal>, ClaimError> {
        let claims = self
            .claims
            .list_for_user(user_id, status, DateTime::now())
            .await?;

        let mut deal_ids: Vec<ObjectId> = claims.iter().map(|c| c.deal_id).collect();
        deal_ids.sort();
        deal_ids.dedup();

        let deals: HashMap<ObjectId, Deal> = self
            .deals
            .find_by_ids(deal_ids)
            .await?
            .into_iter()
            .filter_map(|deal| deal.id.map(|id| (id, deal)))
            .collect();

        Ok(claims
            .into_iter()
            .map(|claim| {
                let deal = deals.get(&claim.deal_id).cloned();
                ClaimWithDeal { claim, deal }
            })
            .collect())
    }

    async fn find_claim(&self, claim_id: ObjectId) -> Result<Claim, ClaimError> {
        match self.claims.base.find_by_id(claim_id).await {
            Ok(claim) => Ok(claim),
            Err(DaoError::NotFound) => Err(ClaimError::ClaimNotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn with_deal(&self, claim: Claim) -> Result<ClaimWithDeal, ClaimError> {
        let deal = match self.deals.base.find_by_id(claim.deal_id).await {
            Ok(deal) => Some(deal),
            Err(DaoError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(ClaimWithDeal { claim, deal })
    }
}

/// Losing the counter race always reads as `Unavailable`. A failed cleanup
/// is logged, not surfaced.
fn lost_race(claim_id: ObjectId, cleanup: Result<bool, DaoError>) -> ClaimError {
    if let Err(e) = cleanup {
        error!(claim = %claim_id, error = %e, "Failed to remove uncounted claim");
    }
    ClaimError::Unavailable
}

fn ensure_transition(claim: &Claim, next: ClaimStatus, now: DateTime) -> Result<(), ClaimError> {
    let current = claim.effective_status(now);
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(transition_error(current, next))
    }
}

fn transition_error(from: ClaimStatus, to: ClaimStatus) -> ClaimError {
    ClaimError::InvalidTransition {
        from: from.as_str(),
        to: to.as_str(),
    }
}
