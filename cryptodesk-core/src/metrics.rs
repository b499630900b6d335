// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Metrics collection and reporting

use crate::interpreter::OperationResponse;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const LATENCY_WINDOW: usize = 10_000;

/// Per-outcome counters shared by every round trip
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,

    // Outcome counters
    operations_total: AtomicU64,
    rejected: AtomicU64,
    succeeded: AtomicU64,
    application_errors: AtomicU64,
    transport_errors: AtomicU64,

    // Dispatch latency (microseconds)
    latencies: RwLock<Vec<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                operations_total: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                succeeded: AtomicU64::new(0),
                application_errors: AtomicU64::new(0),
                transport_errors: AtomicU64::new(0),
                latencies: RwLock::new(Vec::with_capacity(LATENCY_WINDOW)),
            }),
        }
    }

    /// Request rejected locally, nothing was sent
    pub fn record_rejection(&self) {
        self.inner.operations_total.fetch_add(1, Ordering::Relaxed);
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Request dispatched and interpreted
    pub fn record_response(&self, response: &OperationResponse, latency_micros: u64) {
        self.inner.operations_total.fetch_add(1, Ordering::Relaxed);
        let counter = match response {
            OperationResponse::Success { .. } => &self.inner.succeeded,
            OperationResponse::ApplicationError { .. } => &self.inner.application_errors,
            OperationResponse::TransportError { .. } => &self.inner.transport_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let mut latencies = self.inner.latencies.write();
        latencies.push(latency_micros);
        if latencies.len() > LATENCY_WINDOW {
            latencies.drain(0..LATENCY_WINDOW / 2);
        }
    }

    pub fn operations_total(&self) -> u64 {
        self.inner.operations_total.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.inner.succeeded.load(Ordering::Relaxed)
    }

    pub fn application_errors(&self) -> u64 {
        self.inner.application_errors.load(Ordering::Relaxed)
    }

    pub fn transport_errors(&self) -> u64 {
        self.inner.transport_errors.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    pub fn latency_percentile(&self, percentile: f64) -> Option<u64> {
        let latencies = self.inner.latencies.read();
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let rank = (sorted.len() as f64 * percentile).ceil() as usize;
        let index = rank.saturating_sub(1).min(sorted.len() - 1);
        Some(sorted[index])
    }

    pub fn latency_p50(&self) -> Option<u64> {
        self.latency_percentile(0.50)
    }

    pub fn latency_p99(&self) -> Option<u64> {
        self.latency_percentile(0.99)
    }

    /// Generate Prometheus-compatible metrics output
    pub fn prometheus_format(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP cryptodesk_operations_total Total number of operations\n");
        output.push_str("# TYPE cryptodesk_operations_total counter\n");
        output.push_str(&format!("cryptodesk_operations_total {}\n", self.operations_total()));

        output.push_str("# HELP cryptodesk_operations Operations by outcome\n");
        output.push_str("# TYPE cryptodesk_operations counter\n");
        for (outcome, value) in [
            ("rejected", self.rejected()),
            ("success", self.succeeded()),
            ("application_error", self.application_errors()),
            ("transport_error", self.transport_errors()),
        ] {
            output.push_str(&format!(
                "cryptodesk_operations{{outcome=\"{}\"}} {}\n",
                outcome, value
            ));
        }

        output.push_str("# HELP cryptodesk_uptime_seconds Client uptime in seconds\n");
        output.push_str("# TYPE cryptodesk_uptime_seconds gauge\n");
        output.push_str(&format!("cryptodesk_uptime_seconds {}\n", self.uptime_seconds()));

        if let Some(p50) = self.latency_p50() {
            output.push_str("# HELP cryptodesk_latency_p50_microseconds Dispatch latency 50th percentile\n");
            output.push_str("# TYPE cryptodesk_latency_p50_microseconds gauge\n");
            output.push_str(&format!("cryptodesk_latency_p50_microseconds {}\n", p50));
        }

        if let Some(p99) = self.latency_p99() {
            output.push_str("# HELP cryptodesk_latency_p99_microseconds Dispatch latency 99th percentile\n");
            output.push_str("# TYPE cryptodesk_latency_p99_microseconds gauge\n");
            output.push_str(&format!("cryptodesk_latency_p99_microseconds {}\n", p99));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{Payload, TransportCause};

    #[test]
    fn test_outcome_counters() {
        let metrics = Metrics::new();
        let success = OperationResponse::Success {
            payload: Payload::Verification { valid: true },
        };
        let refused = OperationResponse::ApplicationError {
            message: "bad key".into(),
        };
        let lost = OperationResponse::TransportError {
            cause: TransportCause::Timeout,
            server_message: None,
        };

        metrics.record_rejection();
        metrics.record_response(&success, 100);
        metrics.record_response(&success, 200);
        metrics.record_response(&refused, 300);
        metrics.record_response(&lost, 400);

        assert_eq!(metrics.operations_total(), 5);
        assert_eq!(metrics.rejected(), 1);
        assert_eq!(metrics.succeeded(), 2);
        assert_eq!(metrics.application_errors(), 1);
        assert_eq!(metrics.transport_errors(), 1);

        let text = metrics.prometheus_format();
        assert!(text.contains("cryptodesk_operations_total 5"));
        assert!(text.contains("cryptodesk_operations{outcome=\"success\"} 2"));
    }

    #[test]
    fn test_latency_percentiles() {
        let metrics = Metrics::new();
        let success = OperationResponse::Success {
            payload: Payload::Text { result: "x".into() },
        };

        assert_eq!(metrics.latency_p50(), None);
        for i in 1..=100 {
            metrics.record_response(&success, i);
        }

        assert_eq!(metrics.latency_p50(), Some(50));
        assert_eq!(metrics.latency_p99(), Some(99));
        assert_eq!(metrics.latency_percentile(1.0), Some(100));
        assert_eq!(metrics.latency_percentile(0.0), Some(1));
    }
}
