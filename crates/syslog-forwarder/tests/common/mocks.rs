// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock stack describer for resolver and pipeline tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use syslog_forwarder::errors::LookupError;
use syslog_forwarder::resolver::{StackDescriber, StackDescription};

/// Returns the same stacks for every lookup and counts calls
pub struct MockStackDescriber {
    stacks: Vec<StackDescription>,
    calls: AtomicUsize,
}

impl MockStackDescriber {
    pub fn with_urls(urls: &[&str]) -> Self {
        let stacks = urls
            .iter()
            .map(|url| StackDescription {
                name: "convox-syslog".to_string(),
                parameters: vec![
                    ("Private".to_string(), "No".to_string()),
                    ("Url".to_string(), url.to_string()),
                ],
            })
            .collect();
        Self {
            stacks,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StackDescriber for MockStackDescriber {
    async fn describe_stacks(&self, _name: &str) -> Result<Vec<StackDescription>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stacks.clone())
    }
}
