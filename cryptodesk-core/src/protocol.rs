// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Request vocabulary shared with the remote service
//!
//! Defines the fixed set of body fields the service understands, the operation kinds
//! and their path segments, and the per-action [`OperationRequest`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Named request parameter
///
/// Every variant except [`Field::KeySize`] maps to a JSON body field of the same
/// (camelCase) name. `KeySize` is the nominal key size in bits picked by the user; it
/// is checked locally and never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Key,
    Data,
    Iv,
    Mode,
    OutputEncoding,
    Encoding,
    PrivateKey,
    PublicKey,
    PublicKeyX,
    PublicKeyY,
    Modulus,
    SignatureR,
    SignatureS,
    Password,
    Salt,
    Iterations,
    KeyLength,
    KeySize,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Key,
        Field::Data,
        Field::Iv,
        Field::Mode,
        Field::OutputEncoding,
        Field::Encoding,
        Field::PrivateKey,
        Field::PublicKey,
        Field::PublicKeyX,
        Field::PublicKeyY,
        Field::Modulus,
        Field::SignatureR,
        Field::SignatureS,
        Field::Password,
        Field::Salt,
        Field::Iterations,
        Field::KeyLength,
        Field::KeySize,
    ];

    /// Name of the field in request bodies
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Data => "data",
            Self::Iv => "iv",
            Self::Mode => "mode",
            Self::OutputEncoding => "outputEncoding",
            Self::Encoding => "encoding",
            Self::PrivateKey => "privateKey",
            Self::PublicKey => "publicKey",
            Self::PublicKeyX => "publicKeyX",
            Self::PublicKeyY => "publicKeyY",
            Self::Modulus => "modulus",
            Self::SignatureR => "signatureR",
            Self::SignatureS => "signatureS",
            Self::Password => "password",
            Self::Salt => "salt",
            Self::Iterations => "iterations",
            Self::KeyLength => "keyLength",
            Self::KeySize => "keySize",
        }
    }

    /// Human label used in validation messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Data => "input text",
            Self::Iv => "IV",
            Self::Mode => "mode",
            Self::OutputEncoding | Self::Encoding => "encoding",
            Self::PrivateKey => "private key",
            Self::PublicKey => "public key",
            Self::PublicKeyX => "public key X coordinate",
            Self::PublicKeyY => "public key Y coordinate",
            Self::Modulus => "modulus",
            Self::SignatureR => "signature R",
            Self::SignatureS => "signature S",
            Self::Password => "password",
            Self::Salt => "salt",
            Self::Iterations => "iteration count",
            Self::KeyLength => "derived key length",
            Self::KeySize => "key size",
        }
    }

    /// Whether the field is sent to the service
    pub fn is_transmitted(&self) -> bool {
        !matches!(self, Self::KeySize)
    }

    /// Parse from a wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.wire_name().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Kind of remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    Hash,
    Encode,
    Decode,
    GenerateKey,
}

impl OperationKind {
    /// Path segment appended to the algorithm's base path
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Hash => "hash",
            Self::Encode => "encode",
            Self::Decode => "decode",
            Self::GenerateKey => "keypair",
        }
    }

    /// Operations whose input is the output of an earlier encrypt/encode step
    pub fn consumes_encoded_input(&self) -> bool {
        matches!(self, Self::Decrypt | Self::Decode)
    }

    /// Key generation takes no body parameters
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::GenerateKey)
    }

    /// Parse from string (case-insensitive, accepts path segments as aliases)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encrypt" => Some(Self::Encrypt),
            "decrypt" => Some(Self::Decrypt),
            "sign" => Some(Self::Sign),
            "verify" => Some(Self::Verify),
            "hash" | "digest" | "derive" => Some(Self::Hash),
            "encode" => Some(Self::Encode),
            "decode" => Some(Self::Decode),
            "generatekey" | "generate-key" | "keypair" | "keygen" => Some(Self::GenerateKey),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GenerateKey => "generateKey",
            other => other.path_segment(),
        };
        f.write_str(name)
    }
}

/// One user action against one algorithm
///
/// Created per action and discarded once the round trip completes. The `id` only
/// correlates log lines; it is never sent to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub id: Uuid,
    pub algorithm: String,
    pub kind: OperationKind,
    pub params: BTreeMap<Field, String>,
}

impl OperationRequest {
    pub fn new(algorithm: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            algorithm: algorithm.into(),
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Set a parameter, replacing any earlier value
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.params.insert(field, value.into());
        self
    }

    pub fn param(&self, field: Field) -> Option<&str> {
        self.params.get(&field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wire_names() {
        assert_eq!(Field::OutputEncoding.wire_name(), "outputEncoding");
        assert_eq!(Field::PublicKeyX.wire_name(), "publicKeyX");
        assert_eq!(Field::parse("keylength"), Some(Field::KeyLength));
        assert_eq!(Field::parse("signatureR"), Some(Field::SignatureR));
        assert_eq!(Field::parse("nonsense"), None);
        assert!(!Field::KeySize.is_transmitted());
    }

    #[test]
    fn test_field_serde_matches_wire_name() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.wire_name()));
        }
    }

    #[test]
    fn test_operation_kind_parse() {
        assert_eq!(OperationKind::parse("ENCRYPT"), Some(OperationKind::Encrypt));
        assert_eq!(OperationKind::parse("keypair"), Some(OperationKind::GenerateKey));
        assert_eq!(OperationKind::parse("derive"), Some(OperationKind::Hash));
        assert_eq!(OperationKind::parse("explode"), None);
        assert_eq!(OperationKind::GenerateKey.path_segment(), "keypair");
        assert_eq!(OperationKind::GenerateKey.to_string(), "generateKey");
        assert!(!OperationKind::GenerateKey.has_body());
        assert!(OperationKind::Decode.consumes_encoded_input());
    }

    #[test]
    fn test_request_builder() {
        let request = OperationRequest::new("AES", OperationKind::Encrypt)
            .with(Field::Key, "0123456789abcdef")
            .with(Field::Data, "hello");
        assert_eq!(request.param(Field::Key), Some("0123456789abcdef"));
        assert_eq!(request.param(Field::Iv), None);
    }
}
