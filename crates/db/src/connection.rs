use mongodb::{Client, Database, options::ClientOptions};
use startup_deals_config::DatabaseSettings;
use tracing::info;

/// Open a pooled client and ping the server before handing out the database.
pub async fn connect(database: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&database.url).await?;
    client_options.app_name = Some("startup-deals".to_string());

    if let Some(max_pool) = database.max_pool_size {
        client_options.max_pool_size = Some(max_pool);
    }
    if let Some(min_pool) = database.min_pool_size {
        client_options.min_pool_size = Some(min_pool);
    }

    let client = Client::with_options(client_options)?;

    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    info!(db = %database.name, "Connected to MongoDB");

    Ok(client.database(&database.name))
}
