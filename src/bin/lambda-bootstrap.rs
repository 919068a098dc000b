use anyhow::{anyhow, Result};
use aws_sdk_s3::Client;
use lambda_runtime::{run, service_fn, LambdaEvent};
use s3_image_resizer::{app::App, client, record::NotificationRecord};
use serde_json::Value;

/// Resize every object named in the S3 event, stopping at the first
/// failure.
async fn function_handler(event: LambdaEvent<Value>, app: &App, client: &Client) -> Result<()> {
    let records = NotificationRecord::from_payload(event.payload);
    app.handle_records(records, client).await
}

/// Run an AWS Lambda function that listens to S3 events and resizes
/// each new object in place, overwriting it with a JPEG that fits the
/// configured bounding box.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();
    let app = App::from_env()?;
    let client = client::build().await;

    run(service_fn(|event| function_handler(event, &app, &client)))
        .await
        .map_err(|e| anyhow!("{:?}", e))
}
