// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One invocation, start to finish.
//!
//! ```text
//!   resolve endpoint ─> open connection ─> decode batch ─> (parse, format, send)* ─> summary
//! ```
//!
//! Any failure before the per-event loop ends the invocation. Inside the loop a
//! failed send is counted and the next event is processed.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::batch::{self, LogBatch};
use crate::errors::PipelineError;
use crate::formatter::MessageFormatter;
use crate::forwarder::{Connector, DeliveryTally};
use crate::parser;
use crate::resolver::EndpointResolver;

/// Result of a completed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub log_group: String,
    pub log_stream: String,
    pub message_type: String,
    pub num_log_events: usize,
    pub tally: DeliveryTally,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogGroup={} LogStream={} MessageType={} NumLogEvents={} logs={} errs={}",
            self.log_group,
            self.log_stream,
            self.message_type,
            self.num_log_events,
            self.tally.logs,
            self.tally.errs
        )
    }
}

#[derive(Clone)]
pub struct Pipeline {
    resolver: EndpointResolver,
    connector: Arc<dyn Connector>,
    formatter: MessageFormatter,
}

impl Pipeline {
    pub fn new(
        resolver: EndpointResolver,
        connector: Arc<dyn Connector>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            resolver,
            connector,
            formatter,
        }
    }

    /// Forwards every event in `payload` to the endpoint resolved for `identifier`.
    pub async fn run(&self, identifier: &str, payload: &[u8]) -> Result<Summary, PipelineError> {
        let endpoint = self.resolver.resolve(identifier).await.map_err(|e| {
            error!("Failed to resolve syslog endpoint identifier={identifier} err={e}");
            e
        })?;
        debug!("Resolved syslog url={endpoint}");

        let mut connection = self.connector.open(&endpoint).await.map_err(|e| {
            error!("Failed to connect to syslog url={endpoint} err={e}");
            e
        })?;

        let batch = match batch::decode(payload) {
            Ok(batch) => batch,
            Err(e) => {
                error!("Could not decode awslogs data err={e}");
                connection.close().await;
                return Err(e.into());
            }
        };
        debug!(
            "Decoded batch log_group={} log_stream={} events={}",
            batch.log_group,
            batch.log_stream,
            batch.log_events.len()
        );

        let mut tally = DeliveryTally::default();
        for event in &batch.log_events {
            let line = event.line();
            let message = self.formatter.format(&parser::parse(&line));
            debug!("{message}");

            let result = connection.send(&message).await;
            if let Err(e) = &result {
                error!("Failed to forward event id={:?}: {e}", event.id);
            }
            tally.record(&result);
        }
        connection.close().await;

        let summary = summarize(batch, tally);
        info!("{summary}");
        Ok(summary)
    }
}

fn summarize(batch: LogBatch, tally: DeliveryTally) -> Summary {
    Summary {
        num_log_events: batch.log_events.len(),
        log_group: batch.log_group,
        log_stream: batch.log_stream,
        message_type: batch.message_type,
        tally,
    }
}
