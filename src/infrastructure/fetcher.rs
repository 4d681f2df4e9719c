//! Streaming payload downloader.
//!
//! Downloads an artifact to a `.part` file and renames it into place once
//! the transfer is complete, so the cache never contains a half-written
//! payload under its final name.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::application::PayloadFetcher;
use crate::domain::{AppError, Result};

/// reqwest-backed file downloader.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a downloader.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rcm-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::operation_with(format!("download of {url} failed"), e))?
            .error_for_status()
            .map_err(|e| AppError::operation_with(format!("download of {url} rejected"), e))?;

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}", part.display()), e))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::operation_with(format!("download of {url} interrupted"), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::io(format!("Failed to write {}", part.display()), e))?;
        }

        file.sync_all()
            .await
            .map_err(|e| AppError::io(format!("Failed to flush {}", part.display()), e))?;

        Ok(())
    }
}

impl PayloadFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<PathBuf>> + Send {
        async move {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }

            let mut part = dest.as_os_str().to_owned();
            part.push(".part");
            let part = PathBuf::from(part);

            if let Err(e) = self.stream_to(url, &part).await {
                // The partial file is this primitive's mess to clean up.
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }

            tokio::fs::rename(&part, dest)
                .await
                .map_err(|e| AppError::io(format!("Failed to move into {}", dest.display()), e))?;

            Ok(dest.to_path_buf())
        }
    }
}
