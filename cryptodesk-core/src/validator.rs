// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Parameter validation and normalization
//!
//! [`validate`] turns the raw strings a user typed into the exact body the service
//! expects, or explains which field is wrong. It is pure: no I/O, no mutation of the
//! descriptor or the input map.
//!
//! # Key and IV length convention
//!
//! Block cipher keys are measured in one of two ways depending on the mode:
//!
//! - ECB: the key is text, one ASCII character per byte (`"0123456789abcdef"` is a
//!   16-byte AES key).
//! - every chained mode: key and IV are hex, two characters per byte
//!   (`"000102...0f"`, 32 characters, is a 16-byte AES key).
//!
//! Messages always state the expected length in the unit the user has to type.

use crate::encoding::{self, TextEncoding};
use crate::protocol::{Field, OperationKind};
use crate::registry::{AlgorithmDescriptor, KeyConstraint, KeyFormat, Mode, OperationSpec};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Outcome of [`validate`]
pub type ValidationResult = std::result::Result<NormalizedParams, Invalid>;

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reason {
    UnsupportedOperation,
    Missing,
    UnsupportedMode,
    UnsupportedEncoding,
    KeyLength,
    KeySize,
    NonAsciiKey,
    IvLength,
    Format,
    NotAPositiveInteger,
    OutOfRange,
}

/// A rejected request, scoped to the offending field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Invalid {
    /// `None` only when the operation itself is not supported
    pub field: Option<Field>,
    pub reason: Reason,
    pub message: String,
}

impl Invalid {
    fn new(field: Field, reason: Reason, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            reason,
            message: message.into(),
        }
    }

    fn missing(field: Field) -> Self {
        Self::new(field, Reason::Missing, format!("missing {}", field.label()))
    }

    fn format(field: Field, err: encoding::FormatError) -> Self {
        let message = match field {
            Field::Data => err.to_string(),
            other => format!("{} is {}", other.label(), err),
        };
        Self::new(field, Reason::Format, message)
    }
}

/// Parameters ready to be sent, keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedParams(BTreeMap<Field, String>);

impl NormalizedParams {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON request body using wire field names
    pub fn to_body(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(f, v)| (f.wire_name().to_string(), Value::String(v.clone())))
            .collect()
    }
}

/// Validate raw user input for one operation of one algorithm
pub fn validate(
    descriptor: &AlgorithmDescriptor,
    kind: OperationKind,
    raw: &BTreeMap<Field, String>,
) -> ValidationResult {
    let spec = descriptor.operation(kind).ok_or_else(|| Invalid {
        field: None,
        reason: Reason::UnsupportedOperation,
        message: format!("{} does not support {}", descriptor.id, kind),
    })?;

    for field in spec.required {
        if present(raw, *field).is_none() {
            return Err(Invalid::missing(*field));
        }
    }

    let mut out = BTreeMap::new();

    let mode = resolve_mode(descriptor, raw)?;
    if let Some(mode) = mode {
        if Some(mode) != descriptor.default_mode() {
            out.insert(Field::Mode, mode.as_str().to_string());
        }
    }

    if let (Some(constraint), Some(key)) = (descriptor.key, present(raw, Field::Key)) {
        let format = descriptor.key_format(mode);
        let key = check_key(constraint, format, key, present(raw, Field::KeySize))?;
        out.insert(Field::Key, key);
    }

    if let Some(mode) = mode.filter(|m| descriptor.iv_required(*m) && spec.accepts(Field::Iv)) {
        let iv = check_iv(descriptor, mode, present(raw, Field::Iv))?;
        out.insert(Field::Iv, iv);
    }

    let encoding = resolve_encoding(descriptor, spec, raw)?;
    if let (Some(field), Some(encoding)) = (spec.encoding_field(), encoding) {
        out.insert(field, encoding.as_str().to_string());
    }

    for (&field, value) in raw {
        if !spec.accepts(field) || !field.is_transmitted() || out.contains_key(&field) {
            continue;
        }
        if matches!(
            field,
            Field::Mode | Field::Iv | Field::OutputEncoding | Field::Encoding
        ) {
            continue;
        }
        if value.trim().is_empty() {
            continue;
        }
        let normalized = normalize_field(descriptor, kind, field, value, encoding)?;
        out.insert(field, normalized);
    }

    Ok(NormalizedParams(out))
}

/// Non-blank value of a field
fn present(raw: &BTreeMap<Field, String>, field: Field) -> Option<&str> {
    raw.get(&field)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn resolve_mode(
    descriptor: &AlgorithmDescriptor,
    raw: &BTreeMap<Field, String>,
) -> Result<Option<Mode>, Invalid> {
    if descriptor.modes.is_empty() {
        return Ok(None);
    }
    let Some(value) = present(raw, Field::Mode) else {
        return Ok(descriptor.default_mode());
    };
    Mode::parse(value)
        .filter(|m| descriptor.supports_mode(*m))
        .map(Some)
        .ok_or_else(|| {
            let expected: Vec<&str> = descriptor.modes.iter().map(Mode::as_str).collect();
            Invalid::new(
                Field::Mode,
                Reason::UnsupportedMode,
                format!(
                    "unsupported mode '{}' for {} (expected {})",
                    value.trim(),
                    descriptor.id,
                    expected.join("/")
                ),
            )
        })
}

fn resolve_encoding(
    descriptor: &AlgorithmDescriptor,
    spec: &OperationSpec,
    raw: &BTreeMap<Field, String>,
) -> Result<Option<TextEncoding>, Invalid> {
    let Some(field) = spec.encoding_field() else {
        return Ok(descriptor.default_encoding());
    };
    // The service names this field either way depending on the endpoint
    let value = present(raw, field)
        .or_else(|| present(raw, Field::OutputEncoding))
        .or_else(|| present(raw, Field::Encoding));
    let Some(value) = value else {
        return Ok(descriptor.default_encoding());
    };
    TextEncoding::parse(value)
        .filter(|e| descriptor.supports_encoding(*e))
        .map(Some)
        .ok_or_else(|| {
            let expected: Vec<&str> = descriptor.encodings.iter().map(TextEncoding::as_str).collect();
            Invalid::new(
                field,
                Reason::UnsupportedEncoding,
                format!(
                    "unsupported encoding '{}' for {} (expected {})",
                    value.trim(),
                    descriptor.id,
                    expected.join("/")
                ),
            )
        })
}

/// Measure a key or IV, returning its normalized text and byte length
fn measure(field: Field, format: KeyFormat, value: &str) -> Result<(String, usize), Invalid> {
    match format {
        KeyFormat::Text => {
            if !value.is_ascii() {
                return Err(Invalid::new(
                    field,
                    Reason::NonAsciiKey,
                    format!("{} must contain only ASCII characters", field.label()),
                ));
            }
            Ok((value.to_string(), value.len()))
        }
        KeyFormat::Hex => {
            let hex = encoding::normalize_hex(value)
                .ok_or_else(|| Invalid::format(field, encoding::FormatError(TextEncoding::Hex)))?;
            let bytes = hex.len() / 2;
            Ok((hex, bytes))
        }
    }
}

fn check_key(
    constraint: KeyConstraint,
    format: KeyFormat,
    key: &str,
    key_size: Option<&str>,
) -> Result<String, Invalid> {
    let (normalized, bytes) = measure(Field::Key, format, key)?;
    let actual = format.chars_for(bytes);

    if !constraint.lengths.contains(&bytes) {
        let expected: Vec<String> = constraint
            .lengths
            .iter()
            .map(|n| format.chars_for(*n).to_string())
            .collect();
        return Err(Invalid::new(
            Field::Key,
            Reason::KeyLength,
            format!(
                "key length must be {} {}, got {}",
                expected.join("/"),
                format.unit(),
                actual
            ),
        ));
    }

    if let Some(size) = key_size {
        let nominal = nominal_key_bytes(constraint, size)?;
        if nominal != bytes {
            return Err(Invalid::new(
                Field::Key,
                Reason::KeyLength,
                format!(
                    "key length must be {} {} for a {}-bit key, got {}",
                    format.chars_for(nominal),
                    format.unit(),
                    nominal * 8,
                    actual
                ),
            ));
        }
    }

    Ok(normalized)
}

/// Parse the nominal key size (bits) into bytes
fn nominal_key_bytes(constraint: KeyConstraint, size: &str) -> Result<usize, Invalid> {
    let size = size.trim();
    let digits = size.strip_suffix("-bit").unwrap_or(size).trim();
    let bits = digits.parse::<usize>().ok();
    match bits {
        Some(bits) if bits % 8 == 0 && constraint.lengths.contains(&(bits / 8)) => Ok(bits / 8),
        _ => {
            let expected: Vec<String> = constraint.lengths.iter().map(|n| (n * 8).to_string()).collect();
            Err(Invalid::new(
                Field::KeySize,
                Reason::KeySize,
                format!(
                    "key size must be {} bits, got '{}'",
                    expected.join("/"),
                    size
                ),
            ))
        }
    }
}

fn check_iv(descriptor: &AlgorithmDescriptor, mode: Mode, iv: Option<&str>) -> Result<String, Invalid> {
    let iv = iv.ok_or_else(|| Invalid::missing(Field::Iv))?;
    let block_size = descriptor.block_size.unwrap_or_default();
    let format = descriptor.key_format(Some(mode));
    let (normalized, bytes) = measure(Field::Iv, format, iv)?;
    if bytes != block_size {
        return Err(Invalid::new(
            Field::Iv,
            Reason::IvLength,
            format!(
                "IV length must be {} {} in {} mode, got {}",
                format.chars_for(block_size),
                format.unit(),
                mode.as_str().to_uppercase(),
                format.chars_for(bytes)
            ),
        ));
    }
    Ok(normalized)
}

fn normalize_field(
    descriptor: &AlgorithmDescriptor,
    kind: OperationKind,
    field: Field,
    value: &str,
    encoding: Option<TextEncoding>,
) -> Result<String, Invalid> {
    match field {
        Field::Data if kind.consumes_encoded_input() => match encoding {
            Some(encoding) => encoding
                .normalize(value)
                .map_err(|e| Invalid::format(Field::Data, e)),
            None => Ok(value.to_string()),
        },
        Field::PrivateKey
        | Field::PublicKey
        | Field::PublicKeyX
        | Field::PublicKeyY
        | Field::Modulus
        | Field::SignatureR
        | Field::SignatureS
            if descriptor.category.uses_hex_key_material() =>
        {
            TextEncoding::Hex
                .normalize(value)
                .map_err(|e| Invalid::format(field, e))
        }
        Field::Iterations => {
            let n = positive_integer(field, value)?;
            if n > u64::from(u32::MAX) {
                return Err(Invalid::new(
                    field,
                    Reason::OutOfRange,
                    format!("{} must be at most {}, got {}", field.label(), u32::MAX, n),
                ));
            }
            Ok(n.to_string())
        }
        Field::KeyLength => {
            let n = positive_integer(field, value)?;
            if let Some((min, max)) = descriptor.derived_key_bytes {
                if n < u64::from(min) || n > u64::from(max) {
                    return Err(Invalid::new(
                        field,
                        Reason::OutOfRange,
                        format!(
                            "{} must be between {} and {} bytes, got {}",
                            field.label(),
                            min,
                            max,
                            n
                        ),
                    ));
                }
            }
            Ok(n.to_string())
        }
        _ => Ok(value.to_string()),
    }
}

fn positive_integer(field: Field, value: &str) -> Result<u64, Invalid> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            Invalid::new(
                field,
                Reason::NotAPositiveInteger,
                format!("{} must be a positive integer", field.label()),
            )
        })
}
