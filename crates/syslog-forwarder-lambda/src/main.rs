// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod runtime;

use std::{env, process};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use syslog_forwarder::{build_pipeline, ForwarderConfig};

use crate::runtime::RuntimeClient;

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    let log_level = env::var("SYSLOG_FORWARDER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let runtime_api = match env::var("AWS_LAMBDA_RUNTIME_API") {
        Ok(value) => value,
        Err(_) => {
            error!("AWS_LAMBDA_RUNTIME_API is not set. Shutting down syslog forwarder.");
            process::exit(1);
        }
    };
    let runtime = RuntimeClient::new(&runtime_api);

    let config = match ForwarderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            if let Err(report_err) = runtime.report_init_error("ConfigError", &e.to_string()).await {
                error!("Failed to report init error: {report_err}");
            }
            process::exit(1);
        }
    };

    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Unable to build forwarding pipeline: {e}");
            if let Err(report_err) = runtime.report_init_error("ConnectionError", &e.to_string()).await {
                error!("Failed to report init error: {report_err}");
            }
            process::exit(1);
        }
    };

    info!(
        "Syslog forwarder started function={} hostname={}",
        config.function_name, config.hostname
    );

    if let Err(e) = runtime::serve(&runtime, &pipeline, &config.function_name).await {
        error!("Runtime API failure, shutting down: {e}");
        process::exit(1);
    }
}
