// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::SecondsFormat;

use crate::config::ForwarderConfig;
use crate::parser::ParsedLine;

/// Builds RFC5424 messages: `<PRI>VERSION TIMESTAMP HOSTNAME PROGRAM TAG - - CONTENT`.
///
/// Hostname comes from configuration, never from the line.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    priority: u8,
    version: u8,
    hostname: String,
}

impl MessageFormatter {
    pub fn new(priority: u8, version: u8, hostname: impl Into<String>) -> Self {
        Self {
            priority,
            version,
            hostname: hostname.into(),
        }
    }

    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self::new(config.priority, config.version, config.hostname.clone())
    }

    pub fn format(&self, parsed: &ParsedLine<'_>) -> String {
        // whole seconds, UTC, `Z` suffix
        let timestamp = parsed
            .timestamp()
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            "<{}>{} {} {} {} {} - - {}",
            self.priority,
            self.version,
            timestamp,
            self.hostname,
            parsed.program,
            parsed.tag,
            parsed.content
        )
    }
}
