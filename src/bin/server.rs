use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use recipegram::{routes::routes, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let client =
        redis::Client::open(config.redis_url.as_str()).context("invalid redis url")?;
    let cache = client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to redis")?;

    log::info!("listening on {}", config.bind_addr);
    let secret = config.secret_key.clone().into_bytes();
    warp::serve(routes(pool, cache, secret))
        .run(config.bind_addr)
        .await;

    Ok(())
}
