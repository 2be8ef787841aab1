use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use startup_deals_db::models::{AccessLevel, Category, Deal, Role};
use startup_deals_services::{
    dao::{DaoError, deal::DealFilter},
    requires_role,
    validation::{DealInput, validated},
};
use tracing::info;

use super::rfc3339;
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
pub struct DealQuery {
    pub category: Option<String>,
    pub access_level: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DealList {
    pub count: usize,
    pub deals: Vec<DealResponse>,
}

#[derive(Debug, Serialize)]
pub struct DealEnvelope {
    pub deal: DealResponse,
}

#[derive(Debug, Serialize)]
pub struct PartnerView {
    pub name: String,
    pub logo: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityView {
    pub requires_verification: bool,
    pub requirements: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub partner: PartnerView,
    pub category: Category,
    pub access_level: AccessLevel,
    pub eligibility_conditions: EligibilityView,
    pub benefits: Vec<String>,
    pub discount_value: Option<String>,
    pub valid_until: Option<String>,
    pub claim_limit: Option<u32>,
    pub claim_count: u32,
    pub is_active: bool,
    pub is_available: bool,
    pub tags: Vec<String>,
    pub redemption_instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DealResponse {
    /// `is_available` is computed against `now` on every read.
    pub fn from_deal(deal: Deal, now: DateTime) -> Self {
        let is_available = deal.is_available(now);
        Self {
            id: deal.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: deal.title,
            description: deal.description,
            short_description: deal.short_description,
            partner: PartnerView {
                name: deal.partner.name,
                logo: deal.partner.logo,
                website: deal.partner.website,
            },
            category: deal.category,
            access_level: deal.access_level,
            eligibility_conditions: EligibilityView {
                requires_verification: deal.eligibility_conditions.requires_verification,
                requirements: deal.eligibility_conditions.requirements,
            },
            benefits: deal.benefits,
            discount_value: deal.discount_value,
            valid_until: deal.valid_until.map(rfc3339),
            claim_limit: deal.claim_limit,
            claim_count: deal.claim_count,
            is_active: deal.is_active,
            is_available,
            tags: deal.tags,
            redemption_instructions: deal.redemption_instructions,
            created_at: rfc3339(deal.created_at),
            updated_at: rfc3339(deal.updated_at),
        }
    }
}

fn deal_not_found() -> ApiError {
    ApiError::NotFound("Deal not found".to_string())
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DealQuery>,
) -> Result<Json<Envelope<DealList>>, ApiError> {
    let filter = DealFilter::parse(
        query.category.as_deref(),
        query.access_level.as_deref(),
        query.search.as_deref(),
        query.sort.as_deref(),
    );

    let now = DateTime::now();
    let deals: Vec<DealResponse> = state
        .deals
        .list(&filter)
        .await?
        .into_iter()
        .map(|deal| DealResponse::from_deal(deal, now))
        .collect();

    Ok(success(DealList {
        count: deals.len(),
        deals,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<DealInput>,
) -> Result<(StatusCode, Json<Envelope<DealEnvelope>>), ApiError> {
    requires_role(&auth.user, Role::Admin)?;
    let input = validated(body)?;

    let deal = state.deals.create(input).await?;
    info!(
        deal = %deal.id.map(|id| id.to_hex()).unwrap_or_default(),
        admin = %auth.user_id,
        "Deal created"
    );

    Ok((
        StatusCode::CREATED,
        success_with_message(
            "Deal created successfully",
            DealEnvelope {
                deal: DealResponse::from_deal(deal, DateTime::now()),
            },
        ),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(deal_id): Path<String>,
) -> Result<Json<Envelope<DealEnvelope>>, ApiError> {
    let id = ObjectId::parse_str(&deal_id).map_err(|_| deal_not_found())?;

    let deal = match state.deals.base.find_by_id(id).await {
        Ok(deal) => deal,
        Err(DaoError::NotFound) => return Err(deal_not_found()),
        Err(e) => return Err(e.into()),
    };

    Ok(success(DealEnvelope {
        deal: DealResponse::from_deal(deal, DateTime::now()),
    }))
}
