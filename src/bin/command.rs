use anyhow::{Context, Result};
use s3_image_resizer::{app::App, client, record::NotificationRecord};
use std::env::var;

/// Resize a single object in place, given by the `BUCKET` and `KEY`
/// environment variables.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();
    let app = App::from_env()?;
    let client = client::build().await;

    let bucket = var("BUCKET").context("BUCKET is required")?;
    let key = var("KEY").context("KEY is required")?;
    let record =
        NotificationRecord::new(bucket, key).context("BUCKET and KEY must not be empty")?;

    app.handle_records([record], &client).await
}
