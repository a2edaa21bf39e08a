// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use base64::prelude::{Engine as _, BASE64_STANDARD};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::io::Write;

/// Wraps log events the way a CloudWatch Logs subscription delivers them.
pub fn subscription_event(events: &[(i64, &str)]) -> Vec<u8> {
    let log_events: Vec<_> = events
        .iter()
        .enumerate()
        .map(|(i, (timestamp, message))| {
            json!({ "id": i.to_string(), "timestamp": timestamp, "message": message })
        })
        .collect();
    let batch = json!({
        "messageType": "DATA_MESSAGE",
        "owner": "123456789012",
        "logGroup": "convox-web",
        "logStream": "web:RGBCKLEZHCX/ec329dcefd61",
        "subscriptionFilters": ["convox-syslog"],
        "logEvents": log_events,
    });

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(batch.to_string().as_bytes())
        .expect("gzip write");
    let compressed = encoder.finish().expect("gzip finish");
    json!({ "awslogs": { "data": BASE64_STANDARD.encode(compressed) } })
        .to_string()
        .into_bytes()
}
