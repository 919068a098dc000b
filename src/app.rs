//! Defines the read-only application state and the handling of
//! records.

use crate::conf::Settings;
use crate::error::{Failure, ResizeError};
use crate::record::NotificationRecord;
use crate::resize::{Resizer, OUTPUT_CONTENT_TYPE};
use crate::storage::ObjectStore;
use anyhow::{Context, Result};
use envy::from_env;
use regex::Regex;
use tokio::task::spawn_blocking;
use tracing::{error, info, instrument};

/// An App is an initialized application state, derived from
/// settings. This is only useful to pre-compute stuff that will be
/// used constantly.
#[derive(Debug)]
pub struct App {
    /// The original settings.
    pub settings: Settings,

    /// The regex that matches S3 event keys.
    pub match_key_re: Regex,

    /// The image transformation.
    pub resizer: Resizer,
}

impl App {
    /// Initialize an App instance given a settings struct. Consumes
    /// the settings struct.
    pub fn new(settings: Settings) -> Result<Self> {
        let match_key_re = if let Some(match_key) = &settings.match_key {
            Regex::new(&format!(
                "^{}$",
                match_key
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<String>>()
                    .join("[^/]*?")
            ))
        } else {
            Regex::new("")
        }
        .context("Invalid MATCH_KEY filter")?;
        let resizer = Resizer::new(&settings)?;
        Ok(App {
            settings,
            match_key_re,
            resizer,
        })
    }

    /// Initialize an App instance from environment variables.
    pub fn from_env() -> Result<Self> {
        let settings = from_env().context("Invalid configuration")?;
        Self::new(settings)
    }

    /// Resize a single object in place: fetch it, fit it into the
    /// bounding box, and overwrite it with the JPEG encoded result.
    #[instrument(skip(self, record, store), fields(bucket = %record.bucket, key = %record.key))]
    pub async fn handle_record<S>(
        &self,
        record: &NotificationRecord,
        store: &S,
    ) -> Result<(), Failure>
    where
        S: ObjectStore + ?Sized,
    {
        if !self.match_key_re.is_match(&record.key) {
            info!("Key doesn't match the configured filter; skipping");
            return Ok(());
        }
        let data = store.get_object(&record.bucket, &record.key).await?;
        let resizer = self.resizer;
        let output = spawn_blocking(move || resizer.process(&data).map_err(Failure::from))
            .await
            .map_err(|e| ResizeError::Aborted(e.to_string()))??;
        info!(
            source_width = output.source.width,
            source_height = output.source.height,
            width = output.target.width,
            height = output.target.height,
            "Resized image"
        );
        store
            .put_object(
                &record.bucket,
                &record.key,
                output.bytes,
                OUTPUT_CONTENT_TYPE,
            )
            .await?;
        Ok(())
    }

    /// Handle records one after the other. The first failure is
    /// logged and returned, and the records after it are not
    /// attempted.
    pub async fn handle_records<S, I>(&self, records: I, store: &S) -> Result<()>
    where
        S: ObjectStore + ?Sized,
        I: IntoIterator<Item = NotificationRecord>,
    {
        for record in records {
            if let Err(failure) = self.handle_record(&record, store).await {
                let Failure { error, backtrace } = failure;
                let e = anyhow::Error::new(error).context(format!("Failed to resize {}", record));
                let message = format!("{:#}", e);
                error!(
                    bucket = %record.bucket,
                    key = %record.key,
                    error = %message,
                    backtrace = %backtrace,
                    "Failed to handle record"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
