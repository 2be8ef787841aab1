//! Replace the deal catalog with the bundled partner deals, or with the
//! JSON file given as the first argument.

use anyhow::Context;
use startup_deals_config::Settings;
use startup_deals_db::{connect, indexes::ensure_indexes};
use startup_deals_services::{
    dao::deal::DealDao,
    validation::{DealInput, validated},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BUNDLED_CATALOG: &str = include_str!("../../seed/deals.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startup_deals_seed=info,startup_deals_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading catalog {path}"))?,
        None => BUNDLED_CATALOG.to_string(),
    };
    let deals = parse_catalog(&raw)?;

    let settings = Settings::load()?;
    let db = connect(&settings.database).await?;
    ensure_indexes(&db).await?;

    let inserted = DealDao::new(&db).replace_catalog(deals).await?;
    info!(inserted, database = %settings.database.name, "Deal catalog seeded");

    Ok(())
}

fn parse_catalog(raw: &str) -> anyhow::Result<Vec<DealInput>> {
    let inputs: Vec<DealInput> = serde_json::from_str(raw).context("parsing deal catalog")?;
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let title = input.title.clone();
            validated(input).with_context(|| format!("deal #{index} ({title}) is invalid"))
        })
        .collect()
}
