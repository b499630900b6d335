// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Error types for the CryptoDesk client
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! Per-operation failures (validation, application, transport) are not errors in this
//! sense: they are values carried by [`crate::console::Completion`].

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CryptoDesk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network communication failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Algorithm or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
