use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use recipegram::{
    actions::{ingredients, tags},
    delete_cache_value,
    schema::{IngredientSeed, TagSeed},
    CacheKey, Config,
};

/// Seeds the ingredient and tag reference tables from JSON fixture files.
/// Rows that already exist are skipped.
#[derive(Parser, Debug)]
#[command(name = "load_ingredients")]
struct Args {
    /// Ingredient fixture, a JSON array of {name, measurement_unit}
    #[arg(long, default_value = "fixtures/ingredients.json")]
    ingredients: PathBuf,

    /// Optional tag fixture, a JSON array of {name, slug}
    #[arg(long)]
    tags: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    let raw = fs::read_to_string(&args.ingredients)
        .with_context(|| format!("failed to read {}", args.ingredients.display()))?;
    let seeds: Vec<IngredientSeed> =
        serde_json::from_str(&raw).context("malformed ingredient fixture")?;

    let inserted = ingredients::bulk_insert_ingredients(&seeds, &pool).await?;
    log::info!("inserted {inserted} of {} ingredients", seeds.len());
    invalidate(&config, CacheKey::Ingredients).await;

    if let Some(path) = &args.tags {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let seeds: Vec<TagSeed> = serde_json::from_str(&raw).context("malformed tag fixture")?;

        let inserted = tags::bulk_insert_tags(&seeds, &pool).await?;
        log::info!("inserted {inserted} of {} tags", seeds.len());
        invalidate(&config, CacheKey::Tags).await;
    }

    Ok(())
}

/// Drops the cached reference list. A missing cache is not an error, the
/// entry would expire on its own.
async fn invalidate(config: &Config, key: CacheKey) {
    let connection = match redis::Client::open(config.redis_url.as_str()) {
        Ok(client) => client.get_multiplexed_async_connection().await,
        Err(e) => Err(e),
    };

    match connection {
        Ok(mut cache) => {
            if let Err(e) = delete_cache_value(key.as_str(), &mut cache).await {
                log::warn!("failed to invalidate {}: {e}", key.as_str());
            }
        }
        Err(e) => log::warn!("cache unavailable, skipping invalidation: {e}"),
    }
}
