use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Claim, Deal, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "is_verified": 1 }),
            index(bson::doc! { "created_at": -1 }),
        ],
    )
    .await?;

    // Deals
    create_indexes(
        db,
        Deal::COLLECTION,
        vec![
            index(bson::doc! { "category": 1 }),
            index(bson::doc! { "access_level": 1 }),
            index(bson::doc! { "is_active": 1 }),
            index(bson::doc! { "created_at": -1 }),
            index(bson::doc! {
                "title": "text",
                "description": "text",
                "short_description": "text",
            }),
        ],
    )
    .await?;

    // Claims
    create_indexes(
        db,
        Claim::COLLECTION,
        vec![
            index_unique(bson::doc! { "user_id": 1, "deal_id": 1 }),
            index(bson::doc! { "user_id": 1, "status": 1 }),
            index(bson::doc! { "deal_id": 1, "status": 1 }),
            index(bson::doc! { "claimed_at": -1 }),
            // Pending claims carry a null code, so only strings take part.
            IndexModel::builder()
                .keys(bson::doc! { "redemption_code": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(
                            bson::doc! { "redemption_code": { "$type": "string" } },
                        )
                        .build(),
                )
                .build(),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
