use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use startup_deals_db::models::{Deal, EligibilityConditions, Partner};

use super::base::{BaseDao, DaoError, DaoResult};
use crate::validation::DealInput;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DealSort {
    #[default]
    Newest,
    Oldest,
    Popular,
}

impl DealSort {
    /// Unknown or missing values fall back to newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => DealSort::Oldest,
            Some("popular") => DealSort::Popular,
            _ => DealSort::Newest,
        }
    }

    pub fn to_document(self) -> Document {
        match self {
            DealSort::Newest => doc! { "created_at": -1 },
            DealSort::Oldest => doc! { "created_at": 1 },
            DealSort::Popular => doc! { "claim_count": -1, "created_at": -1 },
        }
    }
}

/// Catalog listing filters. Only active deals are ever listed.
///
/// Category and access level are exact matches on the stored name, so a value
/// that names no category simply matches nothing.
#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    pub category: Option<String>,
    pub access_level: Option<String>,
    pub search: Option<String>,
    pub sort: DealSort,
}

impl DealFilter {
    /// Build from raw query values. `all` and empty values mean no filter.
    pub fn parse(
        category: Option<&str>,
        access_level: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            category: non_wildcard(category).map(str::to_string),
            access_level: non_wildcard(access_level).map(str::to_string),
            search,
            sort: DealSort::parse(sort),
        }
    }

    pub fn to_query(&self) -> Document {
        let mut query = doc! { "is_active": true };
        if let Some(ref category) = self.category {
            query.insert("category", category.as_str());
        }
        if let Some(ref level) = self.access_level {
            query.insert("access_level", level.as_str());
        }
        if let Some(ref search) = self.search {
            query.insert("$text", doc! { "$search": search.as_str() });
        }
        query
    }
}

fn non_wildcard(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "all")
}

/// Matches the deal only while it can still take one more claim. Used as the
/// guard on the counter increment so the limit holds under concurrent claims.
pub fn claimable_filter(deal_id: ObjectId, now: DateTime) -> Document {
    doc! {
        "_id": deal_id,
        "is_active": true,
        "$and": [
            { "$or": [ { "valid_until": null }, { "valid_until": { "$gt": now } } ] },
            {
                "$or": [
                    { "claim_limit": null },
                    { "$expr": { "$lt": ["$claim_count", "$claim_limit"] } },
                ]
            },
        ],
    }
}

pub struct DealDao {
    pub base: BaseDao<Deal>,
}

impl DealDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Deal::COLLECTION),
        }
    }

    pub async fn create(&self, input: DealInput) -> DaoResult<Deal> {
        let deal = build_deal(input, DateTime::now())?;
        let id = self.base.insert_one(&deal).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self, filter: &DealFilter) -> DaoResult<Vec<Deal>> {
        self.base
            .find_many(filter.to_query(), Some(filter.sort.to_document()))
            .await
    }

    pub async fn find_by_ids(&self, ids: Vec<ObjectId>) -> DaoResult<Vec<Deal>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": ids } }, None)
            .await
    }

    /// Count one more claim against the deal if it is still claimable.
    /// Returns false when the guard no longer matches.
    pub async fn try_increment_claim_count(
        &self,
        deal_id: ObjectId,
        now: DateTime,
    ) -> DaoResult<bool> {
        self.base
            .update_one(
                claimable_filter(deal_id, now),
                doc! { "$inc": { "claim_count": 1 } },
            )
            .await
    }

    /// Drop every deal and insert the given catalog.
    pub async fn replace_catalog(&self, inputs: Vec<DealInput>) -> DaoResult<usize> {
        let now = DateTime::now();
        let deals = inputs
            .into_iter()
            .map(|input| build_deal(input, now))
            .collect::<DaoResult<Vec<_>>>()?;

        self.base.hard_delete(doc! {}).await?;
        if deals.is_empty() {
            return Ok(0);
        }
        let result = self.base.collection().insert_many(&deals).await?;
        Ok(result.inserted_ids.len())
    }
}

fn build_deal(input: DealInput, now: DateTime) -> DaoResult<Deal> {
    let category = input
        .category()
        .ok_or_else(|| DaoError::Validation(format!("Unknown category: {}", input.category)))?;
    let access_level = input.access_level();

    Ok(Deal {
        id: None,
        title: input.title,
        description: input.description,
        short_description: input.short_description,
        partner: Partner {
            name: input.partner.name,
            logo: input.partner.logo,
            website: input.partner.website,
        },
        category,
        access_level,
        eligibility_conditions: EligibilityConditions {
            requires_verification: input.eligibility_conditions.requires_verification,
            requirements: input.eligibility_conditions.requirements,
        },
        benefits: input.benefits,
        discount_value: input.discount_value,
        valid_until: input.valid_until.map(DateTime::from_chrono),
        claim_limit: input.claim_limit,
        claim_count: 0,
        is_active: input.is_active.unwrap_or(true),
        tags: input.tags,
        redemption_instructions: input.redemption_instructions,
        created_at: now,
        updated_at: now,
    })
}
