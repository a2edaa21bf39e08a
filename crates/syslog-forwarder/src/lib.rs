// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards CloudWatch Logs subscription batches to a syslog collector.
//!
//! Each invocation resolves the collector endpoint (cache first, then the
//! function's CloudFormation stack), opens one connection, and sends every log
//! event as an RFC5424 message built from the parsed line.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batch;
pub mod cloudformation;
pub mod config;
pub mod endpoint;
pub mod endpoint_cache;
pub mod errors;
pub mod formatter;
pub mod forwarder;
pub mod parser;
pub mod pipeline;
pub mod resolver;

pub use config::ForwarderConfig;
pub use errors::PipelineError;
pub use pipeline::{Pipeline, Summary};

use std::sync::Arc;

use crate::cloudformation::CloudFormationDescriber;
use crate::endpoint_cache::FileEndpointCache;
use crate::errors::ConnectionError;
use crate::formatter::MessageFormatter;
use crate::forwarder::TransportConnector;
use crate::resolver::EndpointResolver;

/// Wires the production collaborators: file cache, CloudFormation lookup and
/// socket transports.
pub async fn build_pipeline(config: &ForwarderConfig) -> Result<Pipeline, ConnectionError> {
    let cache = Arc::new(FileEndpointCache::new(config.cache_path.clone()));
    let describer = Arc::new(CloudFormationDescriber::from_env().await);
    let connector = Arc::new(TransportConnector::from_config(config)?);
    Ok(Pipeline::new(
        EndpointResolver::new(cache, describer),
        connector,
        MessageFormatter::from_config(config),
    ))
}
