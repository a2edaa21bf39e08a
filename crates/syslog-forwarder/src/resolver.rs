// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resolves the syslog endpoint for a function.
//!
//! The cache is consulted first and trusted without validation. On a miss the
//! stack named after the function is described and its `Url` parameter is used,
//! then written back to the cache on a best-effort basis.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::endpoint_cache::EndpointCache;
use crate::errors::{LookupError, ResolveError};

/// Name of the stack parameter holding the syslog URL
pub const URL_PARAMETER: &str = "Url";

/// A deployed stack and its input parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub parameters: Vec<(String, String)>,
}

impl StackDescription {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Looks up stacks by name in an infrastructure-as-code service
#[async_trait]
pub trait StackDescriber: Send + Sync {
    async fn describe_stacks(&self, name: &str) -> Result<Vec<StackDescription>, LookupError>;
}

#[derive(Clone)]
pub struct EndpointResolver {
    cache: Arc<dyn EndpointCache>,
    describer: Arc<dyn StackDescriber>,
}

impl EndpointResolver {
    pub fn new(cache: Arc<dyn EndpointCache>, describer: Arc<dyn StackDescriber>) -> Self {
        Self { cache, describer }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Endpoint, ResolveError> {
        if let Some(url) = self.cache.read().await {
            debug!("Using cached syslog url={url}");
            return Endpoint::parse(&url);
        }

        let url = self.describe_url(identifier).await?;
        let endpoint = Endpoint::parse(&url)?;

        match self.cache.write(&url).await {
            Ok(()) => debug!("Cached syslog url={url}"),
            Err(e) => warn!("{e}"),
        }

        Ok(endpoint)
    }

    async fn describe_url(&self, identifier: &str) -> Result<String, ResolveError> {
        let stacks = self
            .describer
            .describe_stacks(identifier)
            .await
            .map_err(|source| ResolveError::Lookup {
                identifier: identifier.to_string(),
                source,
            })?;

        debug!("Described {} stack(s) named {identifier}", stacks.len());

        let not_found = || ResolveError::NotFound {
            identifier: identifier.to_string(),
        };

        match stacks.as_slice() {
            [stack] => stack
                .parameter(URL_PARAMETER)
                .map(str::to_string)
                .ok_or_else(not_found),
            _ => Err(not_found()),
        }
    }
}
