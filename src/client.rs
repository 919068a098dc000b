//! Defines the S3 client and its use as an object store.

use crate::error::ResizeError;
use crate::storage::ObjectStore;
use async_trait::async_trait;
use aws_config::from_env;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::env;
use tracing::{debug, instrument};

/// Classify a failed S3 request. Service error codes are the only
/// reliable signal; anything without one is taken as transient.
fn classify<E, R>(e: SdkError<E, R>, bucket: &str, key: &str) -> ResizeError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let (code, message) = match &e {
        SdkError::ServiceError(se) => {
            let err = se.err();
            (
                err.code().map(String::from),
                err.message()
                    .map(String::from)
                    .unwrap_or_else(|| err.to_string()),
            )
        }
        _ => (None, format!("{:?}", e)),
    };
    let (bucket, key) = (String::from(bucket), String::from(key));
    match code.as_deref() {
        Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => {
            ResizeError::ObjectNotFound { bucket, key }
        }
        Some("AccessDenied")
        | Some("AllAccessDisabled")
        | Some("PermanentRedirect")
        | Some("AuthorizationHeaderMalformed")
        | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch") => ResizeError::AccessDenied {
            bucket,
            key,
            message,
        },
        _ => ResizeError::TransientStorage {
            bucket,
            key,
            message,
        },
    }
}

#[async_trait]
impl ObjectStore for Client {
    /// Downloads a single object from storage.
    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ResizeError> {
        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;
        debug!(content_length = output.content_length(), "Fetched object");
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ResizeError::TransientStorage {
                bucket: String::from(bucket),
                key: String::from(key),
                message: e.to_string(),
            })?;
        Ok(body.into_bytes().to_vec())
    }

    /// Uploads a single object to storage.
    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ResizeError> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;
        Ok(())
    }
}

/// Build the S3 client from the environment. `AWS_ENDPOINT_URL` may
/// point it at an S3-compatible service instead.
pub async fn build() -> Client {
    let endpoint_url_var = env::var("AWS_ENDPOINT_URL");
    let s3_config = if let Ok(endpoint_url) = endpoint_url_var {
        from_env()
            .endpoint_url(
                if endpoint_url.starts_with("http://") || endpoint_url.starts_with("https://") {
                    endpoint_url
                } else {
                    format!("https://{}", endpoint_url)
                },
            )
            .region("us-east-1") // should be OK since the endpoint was overridden
            .load()
    } else {
        from_env().load()
    }
    .await;
    Client::new(&s3_config)
}
