// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Round-trip driver
//!
//! A [`Console`] takes one [`OperationRequest`] through
//! `Idle -> Validating -> Dispatching -> AwaitingResponse -> Completed`. A rejected
//! request goes from `Validating` straight to `Completed` without touching the
//! network. Front ends observe the phase through a `tokio::sync::watch` channel and
//! typically only care about [`Phase::is_in_flight`].
//!
//! Concurrent round trips share nothing mutable except the metrics counters.

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::interpreter::{interpret, OperationResponse};
use crate::metrics::Metrics;
use crate::protocol::OperationRequest;
use crate::registry;
use crate::validator::{validate, Invalid};
use crate::Result;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// Where a round trip currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Validating,
    Dispatching,
    AwaitingResponse,
    Completed,
}

impl Phase {
    /// The one flag a front end needs for a spinner or a disabled button
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Dispatching | Self::AwaitingResponse)
    }
}

/// Final result of a round trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "completion", rename_all = "camelCase")]
pub enum Completion {
    /// Rejected locally; nothing was sent
    Rejected { invalid: Invalid },
    /// Sent, and the reply (or its absence) was interpreted
    Responded { response: OperationResponse },
}

impl Completion {
    pub fn response(&self) -> Option<&OperationResponse> {
        match self {
            Self::Responded { response } => Some(response),
            Self::Rejected { .. } => None,
        }
    }

    pub fn invalid(&self) -> Option<&Invalid> {
        match self {
            Self::Rejected { invalid } => Some(invalid),
            Self::Responded { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.response().is_some_and(OperationResponse::is_success)
    }
}

/// Validates, dispatches and interprets operations
pub struct Console {
    dispatcher: Dispatcher,
    metrics: Metrics,
}

impl Console {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            dispatcher: Dispatcher::new(config)?,
            metrics: Metrics::new(),
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run one round trip
    ///
    /// Fails only when the algorithm id is not registered.
    pub async fn execute(&self, request: &OperationRequest) -> Result<Completion> {
        let (phase, _) = watch::channel(Phase::Idle);
        self.execute_observed(request, &phase).await
    }

    /// Run one round trip, publishing each phase change to `phase`
    #[instrument(skip_all, fields(id = %request.id, algorithm = %request.algorithm, kind = %request.kind))]
    pub async fn execute_observed(
        &self,
        request: &OperationRequest,
        phase: &watch::Sender<Phase>,
    ) -> Result<Completion> {
        let descriptor = registry::describe(&request.algorithm)?;

        phase.send_replace(Phase::Validating);
        let params = match validate(descriptor, request.kind, &request.params) {
            Ok(params) => params,
            Err(invalid) => {
                debug!(field = ?invalid.field, reason = ?invalid.reason, "Rejected: {}", invalid);
                self.metrics.record_rejection();
                phase.send_replace(Phase::Completed);
                return Ok(Completion::Rejected { invalid });
            }
        };

        phase.send_replace(Phase::Dispatching);
        let started = Instant::now();
        let outcome = match self.dispatcher.prepare(descriptor, request.kind, &params) {
            Ok(prepared) => {
                phase.send_replace(Phase::AwaitingResponse);
                self.dispatcher.execute(prepared).await
            }
            Err(cause) => Err(cause),
        };
        let response = interpret(request.kind, outcome);

        let latency = started.elapsed();
        self.metrics
            .record_response(&response, latency.as_micros() as u64);
        match &response {
            OperationResponse::Success { .. } => info!("Completed in {:?}", latency),
            other => info!("Failed in {:?}: {}", latency, other.user_message().unwrap_or_default()),
        }

        phase.send_replace(Phase::Completed);
        Ok(Completion::Responded { response })
    }
}
