// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Splits a convox-style log line into syslog fields.
//!
//! Lines look like
//!
//! ```text
//! 1460682044602 httpd web:RGBCKLEZHCX/ec329dcefd61 10.0.3.37 - - "GET / HTTP/1.1" 304 -
//! ^ epoch ms    ^ src ^ group:stream/container     ^ content
//! ```
//!
//! Parsing is total. A line that does not fit the pattern is passed through
//! unchanged with the current time, an empty program and a `-` tag.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Tag used when the line carries no container id
pub const NIL_TAG: &str = "-";

lazy_static! {
    /// `<epoch ms> <src> <group>:<stream>/<container> <content>`, unanchored
    #[allow(clippy::expect_used)]
    static ref LINE_PATTERN: Regex =
        Regex::new(r"([0-9]+) ([^ ]+) ([^:]+):([^/]+)/([^ ]+) (.*)")
            .expect("failed creating regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Milliseconds since the unix epoch
    pub timestamp_ms: i64,
    /// `group:stream`, empty when the line did not match
    pub program: String,
    pub tag: &'a str,
    pub content: &'a str,
}

impl ParsedLine<'_> {
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp_ms).unwrap_or_default()
    }
}

pub fn parse(raw: &str) -> ParsedLine<'_> {
    let Some(caps) = LINE_PATTERN.captures(raw) else {
        debug!("Line did not match pattern, passing through");
        return ParsedLine {
            timestamp_ms: now_ms(),
            program: String::new(),
            tag: NIL_TAG,
            content: raw,
        };
    };

    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let digits = field(1);
    let timestamp_ms = match digits.parse::<i64>() {
        Ok(ms) if DateTime::from_timestamp_millis(ms).is_some() => ms,
        _ => {
            debug!("Could not parse epoch milliseconds {digits:?}, using current time");
            now_ms()
        }
    };

    ParsedLine {
        timestamp_ms,
        program: format!("{}:{}", field(3), field(4)),
        tag: field(5),
        content: field(6),
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
