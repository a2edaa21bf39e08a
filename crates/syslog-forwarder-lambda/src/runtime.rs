// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Minimal client for the Lambda Runtime API.
//!
//! ```text
//!   GET  /2018-06-01/runtime/invocation/next
//!   POST /2018-06-01/runtime/invocation/{request_id}/response
//!   POST /2018-06-01/runtime/invocation/{request_id}/error
//!   POST /2018-06-01/runtime/init/error
//! ```

use serde::Serialize;
use tracing::{debug, error, info};

use syslog_forwarder::Pipeline;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Runtime API request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Runtime API {path} returned {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("Runtime API invocation is missing the {REQUEST_ID_HEADER} header")]
    MissingRequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub request_id: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse<'a> {
    error_message: &'a str,
    error_type: &'a str,
}

#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    /// `runtime_api` is the `host:port` from `AWS_LAMBDA_RUNTIME_API`.
    pub fn new(runtime_api: &str) -> Self {
        Self::with_base_url(format!("http://{runtime_api}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            // no timeout: `next` long-polls until an event arrives
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{API_VERSION}/runtime/{path}", self.base_url)
    }

    pub async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        let path = "invocation/next";
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| request_error(path, source))?;
        if !response.status().is_success() {
            return Err(RuntimeError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(RuntimeError::MissingRequestId)?;
        let payload = response
            .bytes()
            .await
            .map_err(|source| request_error(path, source))?
            .to_vec();

        Ok(Invocation {
            request_id,
            payload,
        })
    }

    pub async fn respond(&self, request_id: &str, summary: &str) -> Result<(), RuntimeError> {
        let path = format!("invocation/{request_id}/response");
        self.post(&path, &summary).await
    }

    pub async fn report_error(
        &self,
        request_id: &str,
        error_type: &str,
        message: &str,
    ) -> Result<(), RuntimeError> {
        let path = format!("invocation/{request_id}/error");
        self.post(
            &path,
            &ErrorResponse {
                error_message: message,
                error_type,
            },
        )
        .await
    }

    pub async fn report_init_error(&self, error_type: &str, message: &str) -> Result<(), RuntimeError> {
        self.post(
            "init/error",
            &ErrorResponse {
                error_message: message,
                error_type,
            },
        )
        .await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), RuntimeError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| request_error(path, source))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RuntimeError::Status {
                path: path.to_string(),
                status: response.status(),
            })
        }
    }
}

fn request_error(path: &str, source: reqwest::Error) -> RuntimeError {
    RuntimeError::Request {
        path: path.to_string(),
        source,
    }
}

/// Runs one invocation through the pipeline and reports the outcome.
pub async fn handle_invocation(
    runtime: &RuntimeClient,
    pipeline: &Pipeline,
    function_name: &str,
    invocation: Invocation,
) -> Result<(), RuntimeError> {
    debug!("Received invocation request_id={}", invocation.request_id);
    match pipeline.run(function_name, &invocation.payload).await {
        Ok(summary) => {
            runtime
                .respond(&invocation.request_id, &summary.to_string())
                .await
        }
        Err(e) => {
            error!("Invocation request_id={} failed: {e}", invocation.request_id);
            runtime
                .report_error(&invocation.request_id, e.kind(), &e.to_string())
                .await
        }
    }
}

/// Processes invocations one at a time until the Runtime API fails.
pub async fn serve(
    runtime: &RuntimeClient,
    pipeline: &Pipeline,
    function_name: &str,
) -> Result<(), RuntimeError> {
    info!("Waiting for invocations");
    loop {
        let invocation = runtime.next_invocation().await?;
        if let Err(e) = handle_invocation(runtime, pipeline, function_name, invocation).await {
            error!("Failed to report invocation result: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Arc;
    use syslog_forwarder::endpoint_cache::FileEndpointCache;
    use syslog_forwarder::errors::LookupError;
    use syslog_forwarder::formatter::MessageFormatter;
    use syslog_forwarder::forwarder::TransportConnector;
    use syslog_forwarder::resolver::{EndpointResolver, StackDescriber, StackDescription};

    struct NoStacks;

    #[async_trait::async_trait]
    impl StackDescriber for NoStacks {
        async fn describe_stacks(&self, _name: &str) -> Result<Vec<StackDescription>, LookupError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_next_invocation() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/2018-06-01/runtime/invocation/next")
            .with_status(200)
            .with_header("Lambda-Runtime-Aws-Request-Id", "8476a536-e9f4-11e8-9739-2dfe598c3fcd")
            .with_body(r#"{"awslogs":{"data":"H4sI"}}"#)
            .create_async()
            .await;

        let runtime = RuntimeClient::with_base_url(server.url());
        let invocation = runtime.next_invocation().await.unwrap();

        mock.assert_async().await;
        assert_eq!(invocation.request_id, "8476a536-e9f4-11e8-9739-2dfe598c3fcd");
        assert_eq!(invocation.payload, br#"{"awslogs":{"data":"H4sI"}}"#.to_vec());
    }

    #[tokio::test]
    async fn test_next_invocation_requires_request_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/2018-06-01/runtime/invocation/next")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let runtime = RuntimeClient::with_base_url(server.url());
        let err = runtime.next_invocation().await.unwrap_err();
        assert!(matches!(err, RuntimeError::MissingRequestId));
    }

    #[tokio::test]
    async fn test_respond_posts_summary_as_json_string() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/2018-06-01/runtime/invocation/req-1/response")
            .match_body(Matcher::Json(json!(
                "LogGroup=g LogStream=s MessageType=DATA_MESSAGE NumLogEvents=3 logs=2 errs=1"
            )))
            .with_status(202)
            .create_async()
            .await;

        let runtime = RuntimeClient::with_base_url(server.url());
        runtime
            .respond(
                "req-1",
                "LogGroup=g LogStream=s MessageType=DATA_MESSAGE NumLogEvents=3 logs=2 errs=1",
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_report_init_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/2018-06-01/runtime/init/error")
            .match_body(Matcher::Json(json!({
                "errorMessage": "Missing required environment variable AWS_LAMBDA_FUNCTION_NAME",
                "errorType": "ConfigError"
            })))
            .with_status(202)
            .create_async()
            .await;

        let runtime = RuntimeClient::with_base_url(format!("{}/", server.url()));
        runtime
            .report_init_error(
                "ConfigError",
                "Missing required environment variable AWS_LAMBDA_FUNCTION_NAME",
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_response_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/2018-06-01/runtime/invocation/req-1/response")
            .with_status(413)
            .create_async()
            .await;

        let runtime = RuntimeClient::with_base_url(server.url());
        let err = runtime.respond("req-1", "summary").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Status { status, .. } if status.as_u16() == 413));
    }

    #[tokio::test]
    async fn test_failed_invocation_reports_error_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/2018-06-01/runtime/invocation/req-2/error")
            .match_body(Matcher::PartialJson(json!({
                "errorType": "ResolutionError",
                "errorMessage": "Could not find stack convox-syslog Url Parameter"
            })))
            .with_status(202)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            EndpointResolver::new(
                Arc::new(FileEndpointCache::new(dir.path().join("url"))),
                Arc::new(NoStacks),
            ),
            Arc::new(
                TransportConnector::new(
                    std::time::Duration::from_secs(1),
                    std::time::Duration::from_secs(1),
                )
                .unwrap(),
            ),
            MessageFormatter::new(22, 1, "convox-syslog"),
        );

        let runtime = RuntimeClient::with_base_url(server.url());
        handle_invocation(
            &runtime,
            &pipeline,
            "convox-syslog",
            Invocation {
                request_id: "req-2".to_string(),
                payload: b"{}".to_vec(),
            },
        )
        .await
        .unwrap();
        mock.assert_async().await;
    }
}
