// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Response envelope normalization
//!
//! The service signals success in several ways: an explicit `status: 0`, or just the
//! presence of `result`, `data`, `valid`, `r`/`s` or key fields. Failure is a non-zero
//! `status` with a `message`, or an HTTP error status. [`interpret`] folds all of that
//! into exactly one [`OperationResponse`] and never panics.

use crate::protocol::OperationKind;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shown when the service reports failure without saying why
pub const GENERIC_FAILURE: &str = "The service could not complete the operation";

/// Shown for any transport-level failure
pub const GENERIC_TRANSPORT_FAILURE: &str = "Request to the cryptographic service failed";

/// Raw HTTP reply, before any interpretation
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: Bytes,
}

impl RawReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// What the transport produced: a reply, or the reason there is none
pub type RawOutcome = std::result::Result<RawReply, TransportCause>;

/// Why no usable reply was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum TransportCause {
    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportCause {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportCause::Timeout
        } else if e.is_decode() {
            TransportCause::Decode(e.to_string())
        } else {
            TransportCause::Network(e.to_string())
        }
    }
}

/// Key material returned by key generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus: Option<String>,
    #[serde(default, rename = "publicKeyX", skip_serializing_if = "Option::is_none")]
    pub public_key_x: Option<String>,
    #[serde(default, rename = "publicKeyY", skip_serializing_if = "Option::is_none")]
    pub public_key_y: Option<String>,
}

impl KeyPair {
    /// A private key plus some form of public key
    fn is_complete(&self) -> bool {
        let has_public =
            self.public_key.is_some() || (self.public_key_x.is_some() && self.public_key_y.is_some());
        self.private_key.is_some() && has_public
    }
}

/// Successful result of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Payload {
    /// Ciphertext, plaintext, digest, derived key or encoded text
    Text { result: String },
    KeyPair(KeyPair),
    Signature { r: String, s: String },
    /// A failed verification is still a successful operation
    Verification { valid: bool },
}

/// Result of one round trip; exactly one variant is populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum OperationResponse {
    Success {
        payload: Payload,
    },
    /// The service understood the request and refused it
    ApplicationError {
        message: String,
    },
    /// No usable reply
    #[serde(rename_all = "camelCase")]
    TransportError {
        cause: TransportCause,
        server_message: Option<String>,
    },
}

impl OperationResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Text result, if this is a text success
    pub fn text(&self) -> Option<&str> {
        match self.payload() {
            Some(Payload::Text { result }) => Some(result),
            _ => None,
        }
    }

    /// Message suitable for the user
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::ApplicationError { message } => Some(message.clone()),
            Self::TransportError {
                server_message: Some(detail),
                ..
            } => Some(format!("{}: {}", GENERIC_TRANSPORT_FAILURE, detail)),
            Self::TransportError { .. } => Some(GENERIC_TRANSPORT_FAILURE.to_string()),
        }
    }
}

/// Normalize a raw transport outcome for an operation of the given kind
pub fn interpret(kind: OperationKind, outcome: RawOutcome) -> OperationResponse {
    let reply = match outcome {
        Ok(reply) => reply,
        Err(cause) => {
            return OperationResponse::TransportError {
                cause,
                server_message: None,
            }
        }
    };

    let parsed = serde_json::from_slice::<Value>(&reply.body);

    if !(200..300).contains(&reply.status) {
        let server_message = match &parsed {
            Ok(Value::Object(body)) => message_of(body),
            _ => None,
        };
        return OperationResponse::TransportError {
            cause: TransportCause::HttpStatus(reply.status),
            server_message,
        };
    }

    let body = match parsed {
        Ok(Value::Object(body)) => body,
        Ok(other) => {
            return OperationResponse::TransportError {
                cause: TransportCause::Decode(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )),
                server_message: None,
            }
        }
        Err(e) => {
            return OperationResponse::TransportError {
                cause: TransportCause::Decode(e.to_string()),
                server_message: None,
            }
        }
    };

    if let Some(status) = body.get("status") {
        if !status_ok(status) {
            return OperationResponse::ApplicationError {
                message: message_of(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            };
        }
    }

    match extract_payload(kind, &body) {
        Some(payload) => OperationResponse::Success { payload },
        None => OperationResponse::ApplicationError {
            message: message_of(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        },
    }
}

/// `status` values the service uses for success
fn status_ok(status: &Value) -> bool {
    match status {
        Value::Null => true,
        Value::Bool(ok) => *ok,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => {
            let s = s.trim();
            s == "0" || s.eq_ignore_ascii_case("ok") || s.eq_ignore_ascii_case("success")
        }
        _ => false,
    }
}

/// Server-supplied error text, wherever the endpoint put it
fn message_of(body: &Map<String, Value>) -> Option<String> {
    let direct = ["message", "msg", "error"]
        .into_iter()
        .find_map(|k| body.get(k).and_then(Value::as_str));
    let nested = || {
        body.get("error")
            .and_then(Value::as_object)
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    };
    direct
        .or_else(nested)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn extract_payload(kind: OperationKind, body: &Map<String, Value>) -> Option<Payload> {
    match kind {
        OperationKind::Encrypt
        | OperationKind::Decrypt
        | OperationKind::Hash
        | OperationKind::Encode
        | OperationKind::Decode => ["result", "data"]
            .into_iter()
            .find_map(|k| body.get(k).and_then(text_of))
            .map(|result| Payload::Text { result }),
        OperationKind::GenerateKey => key_pair_of(body).map(Payload::KeyPair),
        OperationKind::Sign => {
            let r = body.get("r").or_else(|| body.get("signatureR")).and_then(text_of)?;
            let s = body.get("s").or_else(|| body.get("signatureS")).and_then(text_of)?;
            Some(Payload::Signature { r, s })
        }
        OperationKind::Verify => ["valid", "result"]
            .into_iter()
            .find_map(|k| body.get(k).and_then(bool_of))
            .map(|valid| Payload::Verification { valid }),
    }
}

/// Key fields at the top level, or wrapped in `result`/`data`
fn key_pair_of(body: &Map<String, Value>) -> Option<KeyPair> {
    let candidates = std::iter::once(body).chain(
        ["result", "data"]
            .into_iter()
            .filter_map(|k| body.get(k).and_then(Value::as_object)),
    );
    for candidate in candidates {
        let pair = KeyPair {
            public_key: candidate.get("publicKey").and_then(text_of),
            private_key: candidate.get("privateKey").and_then(text_of),
            modulus: candidate.get("modulus").and_then(text_of),
            public_key_x: candidate.get("publicKeyX").and_then(text_of),
            public_key_y: candidate.get("publicKeyY").and_then(text_of),
        };
        if pair.is_complete() {
            return Some(pair);
        }
    }
    None
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> RawOutcome {
        Ok(RawReply::new(200, body.to_string()))
    }

    #[test]
    fn test_hash_success_with_status() {
        let response = interpret(
            OperationKind::Hash,
            ok(r#"{"status":0,"result":"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"}"#),
        );
        assert_eq!(
            response.text(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_success_by_presence() {
        let response = interpret(OperationKind::Encrypt, ok(r#"{"data":"00ff"}"#));
        assert_eq!(response.text(), Some("00ff"));
    }

    #[test]
    fn test_status_error() {
        let response = interpret(
            OperationKind::Decrypt,
            ok(r#"{"status":1,"message":"bad padding"}"#),
        );
        assert_eq!(
            response,
            OperationResponse::ApplicationError {
                message: "bad padding".into()
            }
        );

        let response = interpret(OperationKind::Decrypt, ok(r#"{"status":false}"#));
        assert_eq!(
            response,
            OperationResponse::ApplicationError {
                message: GENERIC_FAILURE.into()
            }
        );
    }

    #[test]
    fn test_missing_expected_field_is_application_error() {
        let response = interpret(OperationKind::Hash, ok(r#"{"status":0}"#));
        assert!(matches!(response, OperationResponse::ApplicationError { .. }));

        let response = interpret(OperationKind::Verify, ok(r#"{"message":"curve mismatch"}"#));
        assert_eq!(response.user_message().as_deref(), Some("curve mismatch"));
    }

    #[test]
    fn test_malformed_body_is_transport_error() {
        for body in ["not json", "", "[1,2]", "\"result\""] {
            let response = interpret(OperationKind::Hash, ok(body));
            assert!(
                matches!(
                    response,
                    OperationResponse::TransportError {
                        cause: TransportCause::Decode(_),
                        ..
                    }
                ),
                "body {:?}",
                body
            );
        }
    }

    #[test]
    fn test_network_failure() {
        let response = interpret(
            OperationKind::Encrypt,
            Err(TransportCause::Network("connection refused".into())),
        );
        assert_eq!(
            response.user_message().as_deref(),
            Some(GENERIC_TRANSPORT_FAILURE)
        );
    }

    #[test]
    fn test_http_error_status() {
        let response = interpret(
            OperationKind::Verify,
            Ok(RawReply::new(500, "<html>Internal Server Error</html>")),
        );
        assert_eq!(
            response,
            OperationResponse::TransportError {
                cause: TransportCause::HttpStatus(500),
                server_message: None,
            }
        );

        let response = interpret(
            OperationKind::Encrypt,
            Ok(RawReply::new(400, r#"{"error":{"message":"key too short"}}"#)),
        );
        assert_eq!(
            response.user_message().as_deref(),
            Some("Request to the cryptographic service failed: key too short")
        );
    }

    #[test]
    fn test_key_pair() {
        let response = interpret(
            OperationKind::GenerateKey,
            ok(r#"{"publicKey":"010001","privateKey":"abcd","modulus":"c0ffee"}"#),
        );
        let Some(Payload::KeyPair(pair)) = response.payload() else {
            panic!("expected key pair, got {:?}", response);
        };
        assert_eq!(pair.public_key.as_deref(), Some("010001"));
        assert_eq!(pair.private_key.as_deref(), Some("abcd"));
        assert_eq!(pair.modulus.as_deref(), Some("c0ffee"));

        let response = interpret(
            OperationKind::GenerateKey,
            ok(r#"{"status":0,"data":{"privateKey":"01","publicKeyX":"02","publicKeyY":"03"}}"#),
        );
        assert!(response.is_success());

        let response = interpret(OperationKind::GenerateKey, ok(r#"{"publicKey":"01"}"#));
        assert!(matches!(response, OperationResponse::ApplicationError { .. }));
    }

    #[test]
    fn test_signature_and_verification() {
        let response = interpret(OperationKind::Sign, ok(r#"{"r":"0a","s":"0b"}"#));
        assert_eq!(
            response.payload(),
            Some(&Payload::Signature {
                r: "0a".into(),
                s: "0b".into()
            })
        );

        let response = interpret(OperationKind::Verify, ok(r#"{"status":0,"valid":false}"#));
        assert_eq!(
            response.payload(),
            Some(&Payload::Verification { valid: false })
        );
    }

    #[test]
    fn test_serialized_shape() {
        let response = OperationResponse::Success {
            payload: Payload::Text {
                result: "abc".into(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["payload"]["type"], "text");
        assert_eq!(json["payload"]["result"], "abc");
    }
}
