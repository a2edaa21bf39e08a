// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::Parameter;
use aws_sdk_cloudformation::Client;
use tracing::debug;

use crate::errors::LookupError;
use crate::resolver::{StackDescriber, StackDescription};

/// Describes stacks with the CloudFormation `DescribeStacks` API.
#[derive(Debug, Clone)]
pub struct CloudFormationDescriber {
    client: Client,
}

impl CloudFormationDescriber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default credential and region chain.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl StackDescriber for CloudFormationDescriber {
    async fn describe_stacks(&self, name: &str) -> Result<Vec<StackDescription>, LookupError> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| {
                LookupError::with_source(format!("{}", DisplayErrorContext(&e)), e)
            })?;

        let stacks: Vec<StackDescription> = output
            .stacks()
            .iter()
            .map(|stack| StackDescription {
                name: name.to_string(),
                parameters: parameter_pairs(stack.parameters()),
            })
            .collect();
        debug!("DescribeStacks name={name} stacks={stacks:?}");
        Ok(stacks)
    }
}

fn parameter_pairs(parameters: &[Parameter]) -> Vec<(String, String)> {
    parameters
        .iter()
        .filter_map(|p| {
            Some((
                p.parameter_key()?.to_string(),
                p.parameter_value().unwrap_or_default().to_string(),
            ))
        })
        .collect()
}
