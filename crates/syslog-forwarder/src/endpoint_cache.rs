// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::errors::CacheError;

/// Single-slot store for the last resolved endpoint URL.
///
/// The slot is not keyed: one value is valid for the lifetime of the execution
/// environment, and the last write wins.
#[async_trait]
pub trait EndpointCache: Send + Sync {
    /// Returns the cached URL, or `None` on a miss.
    async fn read(&self) -> Option<String>;
    async fn write(&self, url: &str) -> Result<(), CacheError>;
}

/// Keeps the URL as plain text in a local file, `/tmp/url` by default.
#[derive(Debug, Clone)]
pub struct FileEndpointCache {
    path: PathBuf,
}

impl FileEndpointCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EndpointCache for FileEndpointCache {
    async fn read(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let url = contents.trim();
                if url.is_empty() {
                    debug!("Endpoint cache {} is empty", self.path.display());
                    None
                } else {
                    debug!("Read endpoint cache {} url={url}", self.path.display());
                    Some(url.to_string())
                }
            }
            Err(e) => {
                debug!("Endpoint cache {} miss: {e}", self.path.display());
                None
            }
        }
    }

    async fn write(&self, url: &str) -> Result<(), CacheError> {
        tokio::fs::write(&self.path, url.as_bytes())
            .await
            .map_err(|source| CacheError {
                path: self.path.display().to_string(),
                source,
            })
    }
}
