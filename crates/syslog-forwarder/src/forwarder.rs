// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of formatted messages to the syslog collector.
//!
//! A connection is opened once per invocation and every message is written to
//! it in order, one newline-terminated frame per message. There is no retry and
//! no buffering: a failed write is reported to the caller, which counts it and
//! moves on to the next message.

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::config::ForwarderConfig;
use crate::endpoint::{Endpoint, Transport};
use crate::errors::{ConnectionError, DeliveryError};

/// Counts of delivered and failed messages for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTally {
    pub logs: usize,
    pub errs: usize,
}

impl DeliveryTally {
    pub fn record<E>(&mut self, result: &Result<(), E>) {
        match result {
            Ok(()) => self.logs += 1,
            Err(_) => self.errs += 1,
        }
    }
}

/// An open session with the collector
#[async_trait]
pub trait SyslogConnection: Send {
    async fn send(&mut self, message: &str) -> Result<(), DeliveryError>;
    /// Flushes and shuts the session down.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn SyslogConnection>, ConnectionError>;
}

/// Opens TCP, TLS and UDP connections according to the endpoint scheme.
#[derive(Clone)]
pub struct TransportConnector {
    connect_timeout: Duration,
    write_timeout: Duration,
    tls: TlsConnector,
}

impl TransportConnector {
    pub fn new(connect_timeout: Duration, write_timeout: Duration) -> Result<Self, ConnectionError> {
        Ok(Self {
            connect_timeout,
            write_timeout,
            tls: TlsConnector::from(Arc::new(tls_client_config()?)),
        })
    }

    pub fn from_config(config: &ForwarderConfig) -> Result<Self, ConnectionError> {
        Self::new(config.connect_timeout, config.write_timeout)
    }

    async fn connect_tcp(&self, endpoint: &Endpoint) -> Result<TcpStream, ConnectionError> {
        let address = endpoint.address();
        let stream = timeout(self.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: address.clone(),
                timeout_ms: self.connect_timeout.as_millis(),
            })?
            .map_err(|source| ConnectionError::Connect {
                transport: endpoint.transport().as_str(),
                address: address.clone(),
                source,
            })?;
        stream
            .set_nodelay(true)
            .map_err(|source| ConnectionError::Connect {
                transport: endpoint.transport().as_str(),
                address,
                source,
            })?;
        Ok(stream)
    }

    async fn connect_tls(
        &self,
        endpoint: &Endpoint,
    ) -> Result<TlsStream<TcpStream>, ConnectionError> {
        let server_name = ServerName::try_from(endpoint.host().to_string())
            .map_err(|_| ConnectionError::InvalidServerName(endpoint.host().to_string()))?;
        let tcp = self.connect_tcp(endpoint).await?;
        timeout(self.connect_timeout, self.tls.connect(server_name, tcp))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: endpoint.address(),
                timeout_ms: self.connect_timeout.as_millis(),
            })?
            .map_err(|source| ConnectionError::Tls {
                host: endpoint.host().to_string(),
                source,
            })
    }

    async fn connect_udp(&self, endpoint: &Endpoint) -> Result<UdpSocket, ConnectionError> {
        let address = endpoint.address();
        let connect_error = |source| ConnectionError::Connect {
            transport: endpoint.transport().as_str(),
            address: address.clone(),
            source,
        };
        let bind = if endpoint.host().contains(':') {
            "[::]:0"
        } else {
            "0.0.0.0:0"
        };
        let socket = UdpSocket::bind(bind).await.map_err(connect_error)?;
        timeout(self.connect_timeout, socket.connect(&address))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: address.clone(),
                timeout_ms: self.connect_timeout.as_millis(),
            })?
            .map_err(connect_error)?;
        Ok(socket)
    }
}

#[async_trait]
impl Connector for TransportConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn SyslogConnection>, ConnectionError> {
        debug!(
            "Dialing syslog scheme={} host={}",
            endpoint.transport(),
            endpoint.address()
        );
        let connection = match endpoint.transport() {
            Transport::Tcp => Connection::Tcp(self.connect_tcp(endpoint).await?),
            Transport::TcpTls => Connection::Tls(Box::new(self.connect_tls(endpoint).await?)),
            Transport::Udp => Connection::Udp(self.connect_udp(endpoint).await?),
        };
        Ok(Box::new(TransportConnection {
            connection,
            write_timeout: self.write_timeout,
            broken: false,
        }))
    }
}

enum Connection {
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Udp(UdpSocket),
}

struct TransportConnection {
    connection: Connection,
    write_timeout: Duration,
    /// Set once a stream write fails part way; the stream may hold a partial frame.
    broken: bool,
}

#[async_trait]
impl SyslogConnection for TransportConnection {
    async fn send(&mut self, message: &str) -> Result<(), DeliveryError> {
        if self.broken {
            return Err(DeliveryError::Broken);
        }
        let frame = frame(message);
        let write_timeout = self.write_timeout;
        let write = async {
            match &mut self.connection {
                Connection::Tcp(stream) => write_frame(stream, frame.as_bytes()).await,
                Connection::Tls(stream) => write_frame(stream.as_mut(), frame.as_bytes()).await,
                Connection::Udp(socket) => socket.send(frame.as_bytes()).await.map(|_| ()),
            }
        };
        let result = timeout(write_timeout, write)
            .await
            .map_err(|_| DeliveryError::Timeout(write_timeout.as_millis()))
            .and_then(|written| written.map_err(DeliveryError::Write));

        // datagrams are independent, a stream cannot resync after a partial frame
        if result.is_err() && !matches!(self.connection, Connection::Udp(_)) {
            warn!("Marking syslog connection broken, remaining messages will fail");
            self.broken = true;
        }
        result
    }

    async fn close(self: Box<Self>) {
        let write_timeout = self.write_timeout;
        let shutdown = async move {
            match self.connection {
                Connection::Tcp(mut stream) => stream.shutdown().await,
                Connection::Tls(mut stream) => stream.shutdown().await,
                Connection::Udp(_) => Ok(()),
            }
        };
        match timeout(write_timeout, shutdown).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Error closing syslog connection: {e}"),
            Err(_) => debug!("Timed out closing syslog connection"),
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

/// Terminates the message with exactly the newline the collector splits on.
fn frame(message: &str) -> String {
    if message.ends_with('\n') {
        message.to_string()
    } else {
        format!("{message}\n")
    }
}

fn tls_client_config() -> Result<rustls::ClientConfig, ConnectionError> {
    let mut root_cert_store = rustls::RootCertStore::empty();
    let native_certs = rustls_native_certs::load_native_certs();
    for err in &native_certs.errors {
        debug!("Failed to load native certificate: {err}");
    }
    for cert in native_certs.certs {
        if let Err(err) = root_cert_store.add(cert) {
            debug!("Failed to parse certificate: {:?}", err);
        }
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ConnectionError::TlsConfig(e.to_string()))?
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();
    Ok(config)
}
