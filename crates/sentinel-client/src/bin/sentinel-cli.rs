//! Sentinel client binary

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; keys may come from the real environment
    dotenvy::dotenv().ok();

    sentinel_client::cli::run().await?;
    Ok(())
}
