// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::ResolveError;
use std::fmt;
use url::Url;

/// Transport named by the endpoint URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    TcpTls,
    Udp,
}

impl Transport {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "tcp" => Some(Self::Tcp),
            "tcp+tls" => Some(Self::TcpTls),
            "udp" => Some(Self::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::TcpTls => "tcp+tls",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syslog collector address, e.g. `tcp+tls://logs3.papertrailapp.com:32912`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    transport: Transport,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::InvalidEndpoint {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        let transport = Transport::from_scheme(url.scheme())
            .ok_or_else(|| invalid(&format!("unsupported scheme {:?}", url.scheme())))?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid("missing host"))?;
        // url keeps brackets around IPv6 literals
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let port = url.port().ok_or_else(|| invalid("missing port"))?;

        Ok(Self {
            url: raw.to_string(),
            transport,
            host,
            port,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` suitable for socket connect calls
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
