// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! CryptoDesk Core Library
//!
//! This crate is the operation layer between a user-facing front end and a remote HTTP
//! service that performs symmetric and asymmetric encryption, signatures, hashing, key
//! derivation and text encodings. Nothing cryptographic happens here: the crate decides
//! which remote operation to call, rejects bad input before it leaves the process, and
//! folds the service's inconsistent reply envelopes into one typed result.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `registry`: Static table of algorithm descriptors
//! - `protocol`: Request vocabulary (fields, operation kinds, requests)
//! - `encoding`: Local format checks for hex, base64 and radix text
//! - `validator`: Pure parameter validation and normalization
//! - `dispatcher`: HTTP bindings and the single-shot transport call
//! - `interpreter`: Response envelope normalization
//! - `console`: Round-trip driver with observable phases
//! - `config`: Configuration management with validation
//! - `metrics`: Outcome counters and latency tracking
//! - `error`: Unified error types
//!
//! # Round trip
//!
//! ```text
//! input ──> validator ──(valid)──> dispatcher ──> service ──> interpreter ──> result
//!               │
//!               └──(invalid)──> rejection, no network call
//! ```

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod encoding;
pub mod error;
pub mod interpreter;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod validator;

pub use console::{Completion, Console, Phase};
pub use error::{Error, Result};
pub use interpreter::{OperationResponse, Payload};
pub use protocol::{Field, OperationKind, OperationRequest};
pub use registry::{describe, AlgorithmDescriptor, Category, Mode};
pub use validator::{validate, Invalid, NormalizedParams, ValidationResult};

/// Library version, sent in the default user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default service base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout (30 s)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Upper bound accepted for the request timeout (5 min)
pub const MAX_TIMEOUT_MS: u64 = 300_000;
