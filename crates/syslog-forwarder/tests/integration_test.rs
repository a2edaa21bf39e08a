// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::fixtures::subscription_event;
use common::mocks::MockStackDescriber;
use std::sync::Arc;
use std::time::Duration;
use syslog_forwarder::endpoint_cache::{EndpointCache, FileEndpointCache};
use syslog_forwarder::errors::ResolveError;
use syslog_forwarder::formatter::MessageFormatter;
use syslog_forwarder::forwarder::TransportConnector;
use syslog_forwarder::resolver::EndpointResolver;
use syslog_forwarder::{Pipeline, PipelineError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::timeout;

const ACCESS_LOG: &str = r#"httpd web:RGBCKLEZHCX/ec329dcefd61 10.0.3.37 - - [15/Apr/2016:01:00:44 +0000] "GET / HTTP/1.1" 304 -"#;

fn transport() -> Arc<TransportConnector> {
    Arc::new(
        TransportConnector::new(Duration::from_secs(2), Duration::from_secs(2))
            .expect("failed to build transport"),
    )
}

#[tokio::test]
async fn pipeline_forwards_batch_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("unable to bind listener");
    let port = listener.local_addr().expect("local addr").port();
    let collector = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut lines = BufReader::new(stream).lines();
        let mut received = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            received.push(line);
        }
        received
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(FileEndpointCache::new(dir.path().join("url")));
    let describer = Arc::new(MockStackDescriber::with_urls(&[&format!(
        "tcp://127.0.0.1:{port}"
    )]));
    let pipeline = Pipeline::new(
        EndpointResolver::new(cache.clone(), describer.clone()),
        transport(),
        MessageFormatter::new(22, 1, "convox-syslog"),
    );

    let payload = subscription_event(&[(1460682044602, ACCESS_LOG), (1460682045000, "no structure")]);
    let summary = pipeline
        .run("convox-syslog", &payload)
        .await
        .expect("pipeline should succeed");

    assert_eq!(
        summary.to_string(),
        "LogGroup=convox-web LogStream=web:RGBCKLEZHCX/ec329dcefd61 MessageType=DATA_MESSAGE NumLogEvents=2 logs=2 errs=0"
    );

    let received = timeout(Duration::from_secs(2), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0],
        r#"<22>1 2016-04-15T01:00:44Z convox-syslog web:RGBCKLEZHCX ec329dcefd61 - - 10.0.3.37 - - [15/Apr/2016:01:00:44 +0000] "GET / HTTP/1.1" 304 -"#
    );
    assert!(received[1].starts_with("<22>1 "));
    assert!(received[1].ends_with(" convox-syslog  - - - 1460682045000 no structure"));

    // the lookup result was cached for the next invocation
    assert_eq!(
        cache.read().await,
        Some(format!("tcp://127.0.0.1:{port}"))
    );
    assert_eq!(describer.calls(), 1);
}

#[tokio::test]
async fn resolver_reuses_cached_endpoint() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(FileEndpointCache::new(dir.path().join("url")));
    let describer = Arc::new(MockStackDescriber::with_urls(&[
        "tcp+tls://logs3.papertrailapp.com:32912",
    ]));
    let resolver = EndpointResolver::new(cache, describer.clone());

    let first = resolver.resolve("convox-syslog").await.expect("first resolve");
    let second = resolver.resolve("convox-syslog").await.expect("second resolve");

    assert_eq!(first, second);
    assert_eq!(describer.calls(), 1);
}

#[tokio::test]
async fn ambiguous_stacks_leave_cache_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("url");
    let cache = Arc::new(FileEndpointCache::new(&path));
    let describer = Arc::new(MockStackDescriber::with_urls(&[
        "tcp+tls://logs3.papertrailapp.com:32912",
        "udp://10.0.0.5:514",
    ]));
    let resolver = EndpointResolver::new(cache, describer);

    let err = resolver
        .resolve("convox-syslog")
        .await
        .expect_err("two stacks should not resolve");
    assert!(matches!(err, ResolveError::NotFound { ref identifier } if identifier == "convox-syslog"));
    assert!(!path.exists());
}

#[tokio::test]
async fn unreachable_collector_fails_invocation() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("unable to bind listener");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("url");
    std::fs::write(&path, format!("tcp://127.0.0.1:{port}\n")).expect("seed cache");

    let pipeline = Pipeline::new(
        EndpointResolver::new(
            Arc::new(FileEndpointCache::new(&path)),
            Arc::new(MockStackDescriber::with_urls(&[])),
        ),
        transport(),
        MessageFormatter::new(22, 1, "convox-syslog"),
    );

    let err = pipeline
        .run("convox-syslog", &subscription_event(&[(1460682044602, ACCESS_LOG)]))
        .await
        .expect_err("connection should be refused");
    assert!(matches!(err, PipelineError::Connection(_)));
    assert_eq!(err.kind(), "ConnectionError");
}
