use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use startup_deals_db::models::{ClaimStatus, Role};
use startup_deals_services::{ClaimError, ClaimWithDeal, requires_role};

use super::{deal::DealResponse, rfc3339};
use crate::{
    error::ApiError,
    extractors::{
        auth::AuthUser,
        json::{ApiJson, ApiQuery},
    },
    response::{Envelope, success, success_with_message},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub deal_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClaimQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApproveClaimRequest {
    pub redemption_code: Option<String>,
    pub expiry_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectClaimRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimList {
    pub count: usize,
    pub claims: Vec<ClaimResponse>,
}

#[derive(Debug, Serialize)]
pub struct ClaimEnvelope {
    pub claim: ClaimResponse,
}

/// A claim with its deal populated. `status` is the effective status, so a
/// lapsed approval reads as `expired`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: String,
    pub user_id: String,
    pub deal_id: String,
    pub deal: Option<DealResponse>,
    pub status: ClaimStatus,
    pub claimed_at: String,
    pub approved_at: Option<String>,
    pub expires_at: Option<String>,
    pub redemption_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl ClaimResponse {
    pub fn from_claim(entry: ClaimWithDeal, now: DateTime) -> Self {
        let ClaimWithDeal { claim, deal } = entry;
        Self {
            id: claim.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: claim.user_id.to_hex(),
            deal_id: claim.deal_id.to_hex(),
            deal: deal.map(|deal| DealResponse::from_deal(deal, now)),
            status: claim.effective_status(now),
            claimed_at: rfc3339(claim.claimed_at),
            approved_at: claim.approved_at.map(rfc3339),
            expires_at: claim.expires_at.map(rfc3339),
            redemption_code: claim.redemption_code,
            notes: claim.notes,
            created_at: rfc3339(claim.created_at),
        }
    }
}

/// The `status` query of a claim listing.
#[derive(Debug, PartialEq, Eq)]
enum StatusQuery {
    All,
    Only(ClaimStatus),
    /// Names no known status, so no claim can match.
    Unmatched,
}

/// `all` or an empty value lists every claim.
fn parse_status(value: Option<&str>) -> StatusQuery {
    match value.map(str::trim) {
        None | Some("") | Some("all") => StatusQuery::All,
        Some(value) => value
            .parse()
            .map(StatusQuery::Only)
            .unwrap_or(StatusQuery::Unmatched),
    }
}

/// Redemption codes live between one day and ten years.
const MAX_EXPIRY_DAYS: u32 = 3650;

fn check_expiry_days(days: u32) -> Result<(), ApiError> {
    if (1..=MAX_EXPIRY_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Expiry must be between 1 and {MAX_EXPIRY_DAYS} days"
        )))
    }
}

fn parse_claim_id(claim_id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(claim_id).map_err(|_| ClaimError::ClaimNotFound.into())
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateClaimRequest>,
) -> Result<(StatusCode, Json<Envelope<ClaimEnvelope>>), ApiError> {
    let deal_id = body
        .deal_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Deal ID is required".to_string()))?;
    let deal_id = ObjectId::parse_str(deal_id).map_err(|_| ClaimError::NotFound)?;

    let entry = state.claims.attempt_claim(&auth.user, deal_id).await?;
    let message = match entry.claim.status {
        ClaimStatus::Pending => "Claim submitted successfully. Pending approval.",
        _ => "Deal claimed successfully!",
    };

    Ok((
        StatusCode::CREATED,
        success_with_message(
            message,
            ClaimEnvelope {
                claim: ClaimResponse::from_claim(entry, DateTime::now()),
            },
        ),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ClaimQuery>,
) -> Result<Json<Envelope<ClaimList>>, ApiError> {
    let status = match parse_status(query.status.as_deref()) {
        StatusQuery::All => None,
        StatusQuery::Only(status) => Some(status),
        StatusQuery::Unmatched => {
            return Ok(success(ClaimList {
                count: 0,
                claims: Vec::new(),
            }));
        }
    };

    let now = DateTime::now();
    let claims: Vec<ClaimResponse> = state
        .claims
        .list_for_user(auth.user_id, status)
        .await?
        .into_iter()
        .map(|entry| ClaimResponse::from_claim(entry, now))
        .collect();

    Ok(success(ClaimList {
        count: claims.len(),
        claims,
    }))
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(claim_id): Path<String>,
    ApiJson(body): ApiJson<ApproveClaimRequest>,
) -> Result<Json<Envelope<ClaimEnvelope>>, ApiError> {
    requires_role(&auth.user, Role::Admin)?;
    let claim_id = parse_claim_id(&claim_id)?;

    if let Some(days) = body.expiry_days {
        check_expiry_days(days)?;
    }
    let code = body
        .redemption_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty());

    let entry = state
        .claims
        .approve(claim_id, code, body.expiry_days)
        .await?;

    Ok(success_with_message(
        "Claim approved",
        ClaimEnvelope {
            claim: ClaimResponse::from_claim(entry, DateTime::now()),
        },
    ))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(claim_id): Path<String>,
    ApiJson(body): ApiJson<RejectClaimRequest>,
) -> Result<Json<Envelope<ClaimEnvelope>>, ApiError> {
    requires_role(&auth.user, Role::Admin)?;
    let claim_id = parse_claim_id(&claim_id)?;

    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest(
            "Rejection reason is required".to_string(),
        ));
    }

    let entry = state.claims.reject(claim_id, reason).await?;

    Ok(success_with_message(
        "Claim rejected",
        ClaimEnvelope {
            claim: ClaimResponse::from_claim(entry, DateTime::now()),
        },
    ))
}
