// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs subscription payloads.
//!
//! The invocation event is `{"awslogs": {"data": "<base64>"}}` where `data` is a
//! gzip stream wrapping the JSON batch.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use std::io::Read;

use crate::errors::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    pub message_type: String,
    #[serde(default)]
    pub owner: String,
    pub log_group: String,
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: Option<String>,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    /// The line handed to the parser: `<timestamp> <message>`.
    pub fn line(&self) -> String {
        format!("{} {}", self.timestamp, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    awslogs: AwsLogs,
}

#[derive(Debug, Deserialize)]
struct AwsLogs {
    data: String,
}

pub fn decode(payload: &[u8]) -> Result<LogBatch, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(DecodeError::Envelope)?;
    let compressed = BASE64_STANDARD
        .decode(envelope.awslogs.data.trim())
        .map_err(DecodeError::Base64)?;

    let mut decompressed = Vec::new();
    MultiGzDecoder::new(compressed.as_slice())
        .read_to_end(&mut decompressed)
        .map_err(DecodeError::Gzip)?;

    serde_json::from_slice(&decompressed).map_err(DecodeError::Payload)
}
