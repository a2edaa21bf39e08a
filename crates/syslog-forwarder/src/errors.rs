// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for each stage of the forwarding pipeline.
//!
//! Resolution, decoding and connection errors end an invocation. Delivery errors
//! are counted per event and never escape the pipeline.

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reading the process configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors resolving the syslog endpoint for a function
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not find stack {identifier} Url Parameter")]
    NotFound { identifier: String },

    #[error("Failed to describe stack {identifier}: {source}")]
    Lookup {
        identifier: String,
        #[source]
        source: LookupError,
    },

    #[error("Invalid syslog endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Failure reported by the stack description service
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LookupError {
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Endpoint cache I/O failure. Never terminal.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write endpoint cache {path}: {source}")]
pub struct CacheError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Errors decoding a CloudWatch Logs subscription envelope
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Could not parse event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Could not base64 decode awslogs data: {0}")]
    Base64(#[source] base64::DecodeError),

    #[error("Could not gunzip awslogs data: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("Could not parse decoded awslogs payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Errors opening the transport connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {address} over {transport}: {source}")]
    Connect {
        transport: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {timeout_ms} ms connecting to {address}")]
    Timeout { address: String, timeout_ms: u128 },

    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TLS server name {0:?}")]
    InvalidServerName(String),

    #[error("Failed to build TLS configuration: {0}")]
    TlsConfig(String),
}

/// Error sending a single message. Counted, never terminal.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to write syslog message: {0}")]
    Write(#[source] std::io::Error),

    #[error("Timed out after {0} ms writing syslog message")]
    Timeout(u128),

    #[error("Syslog connection is broken after an earlier failed write")]
    Broken,
}

/// Terminal failure of a single invocation
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl PipelineError {
    /// Short error family name, used as the Lambda `errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Resolve(_) => "ResolutionError",
            PipelineError::Decode(_) => "MalformedInputError",
            PipelineError::Connection(_) => "ConnectionError",
        }
    }
}
