// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! HTTP client for the cryptographic service
//!
//! Each (algorithm, operation) pair has exactly one binding. A dispatch issues exactly
//! one request: there is no retry, and whatever the transport produced is handed to the
//! interpreter unchanged.

use crate::config::ClientConfig;
use crate::interpreter::{interpret, OperationResponse, RawOutcome, RawReply, TransportCause};
use crate::protocol::OperationKind;
use crate::registry::AlgorithmDescriptor;
use crate::validator::NormalizedParams;
use crate::{Error, Result};
use reqwest::{Client, ClientBuilder, Method, Request};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// HTTP method and path for one operation of one algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub method: Method,
    pub path: String,
}

impl Binding {
    /// `GET /api/<slug>/keypair` for key generation, `POST /api/<slug>/<op>` otherwise
    pub fn new(descriptor: &AlgorithmDescriptor, kind: OperationKind) -> Self {
        let method = if kind.has_body() {
            Method::POST
        } else {
            Method::GET
        };
        Self {
            method,
            path: format!("/api/{}/{}", descriptor.slug, kind.path_segment()),
        }
    }
}

/// Transport to the cryptographic service
pub struct Dispatcher {
    client: Client,
    base_url: Url,
}

impl Dispatcher {
    /// Create a new dispatcher with configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .use_rustls_tls()
            .build()
            .map_err(Error::Network)?;

        let mut base_url = config.base_url()?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Absolute URL for a binding, keeping any path prefix of the base URL
    pub fn url_for(&self, binding: &Binding) -> Result<Url> {
        self.base_url
            .join(binding.path.trim_start_matches('/'))
            .map_err(|e| Error::Internal(format!("Invalid request path {}: {}", binding.path, e)))
    }

    /// Build the request for one operation without sending it
    pub fn prepare(
        &self,
        descriptor: &AlgorithmDescriptor,
        kind: OperationKind,
        params: &NormalizedParams,
    ) -> std::result::Result<Request, TransportCause> {
        let binding = Binding::new(descriptor, kind);
        let url = self
            .url_for(&binding)
            .map_err(|e| TransportCause::Network(e.to_string()))?;

        // Field names only: bodies carry keys and plaintext
        debug!(
            fields = ?params.iter().map(|(f, _)| f.wire_name()).collect::<Vec<_>>(),
            "{} {}",
            binding.method,
            url
        );

        let builder = if binding.method == Method::GET {
            self.client.get(url)
        } else {
            self.client.post(url).json(&params.to_body())
        };
        builder.build().map_err(TransportCause::from)
    }

    /// Put a prepared request on the wire and return the raw outcome
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: Request) -> RawOutcome {
        let url = request.url().clone();
        let response = self.client.execute(request).await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            TransportCause::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read response from {}: {}", url, e);
            TransportCause::from(e)
        })?;

        debug!("Received HTTP {} ({} bytes)", status, body.len());
        Ok(RawReply { status, body })
    }

    /// Issue the request and return the raw outcome
    #[instrument(skip_all, fields(algorithm = descriptor.id, kind = %kind))]
    pub async fn send(
        &self,
        descriptor: &AlgorithmDescriptor,
        kind: OperationKind,
        params: &NormalizedParams,
    ) -> RawOutcome {
        let request = self.prepare(descriptor, kind, params)?;
        self.execute(request).await
    }

    /// Issue the request and interpret the reply
    pub async fn dispatch(
        &self,
        descriptor: &AlgorithmDescriptor,
        kind: OperationKind,
        params: &NormalizedParams,
    ) -> OperationResponse {
        interpret(kind, self.send(descriptor, kind, params).await)
    }
}
