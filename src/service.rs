//! Paste read/write flows
//!
//! Read: locator → select → open. Write: input → seal → insert → locator.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::client::StorageClient;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::locator::Locator;
use crate::transform;
use crate::types::{Paste, WriteOptions};

/// Reads and writes pastes against one backend
#[derive(Clone)]
pub struct PasteService {
    service_url: String,
    storage: StorageClient,
}

impl PasteService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            service_url: config.service_url.clone(),
            storage: StorageClient::new(config)?,
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Fetch and decrypt the paste behind `url`
    pub async fn read(&self, url: &str) -> Result<Paste> {
        let locator = Locator::parse(url)?;
        self.read_locator(locator).await
    }

    pub async fn read_locator(&self, locator: Locator) -> Result<Paste> {
        let response = self
            .storage
            .select(&locator.fingerprint_hex(), &locator.hash_hex())
            .await?;

        let content = transform::open(response.row, locator.key())?;
        debug!(
            request_id = %response.request_id,
            bytes = content.len(),
            "Read paste"
        );

        Ok(Paste::new(locator, None, response.request_id, content))
    }

    /// Store everything `input` yields
    ///
    /// The input is buffered whole; size limits are the caller's business.
    pub async fn write<R>(&self, mut input: R, options: &WriteOptions) -> Result<Paste>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = Vec::new();
        input.read_to_end(&mut content).await?;
        self.write_bytes(content, options).await
    }

    pub async fn write_bytes(&self, content: Vec<u8>, options: &WriteOptions) -> Result<Paste> {
        let sealed = transform::seal(
            &content,
            options.key.as_deref(),
            options.previous.as_ref(),
        )?;

        let request_id = self.storage.insert(&sealed.row).await?;

        let locator = Locator::new(
            self.service_url.clone(),
            sealed.fingerprint,
            sealed.hash,
            options.key.clone(),
        );
        info!(
            hash = %sealed.row.hash_hex,
            chained = options.previous.is_some(),
            "Wrote paste"
        );

        Ok(Paste::new(locator, options.previous, request_id, content))
    }
}
