// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Local format checks for encoded text
//!
//! The service returns ciphertext, digests and encoded data as text in one of five
//! representations. Before a decrypt or decode request is sent, the input is checked
//! against the declared representation here, so a typo produces a precise message
//! instead of a generic server failure.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text representation of binary data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Hexadecimal, two characters per byte
    Hex,
    /// Standard base64 with `=` padding
    Base64,
    /// Whitespace-separated base-2 bytes
    Binary,
    /// Whitespace-separated base-8 bytes
    Octal,
    /// Whitespace-separated base-10 bytes
    Decimal,
}

/// Standard alphabet; padding optional, unused trailing bits ignored
const BASE64_INPUT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Input did not match its declared encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not a valid {} string", adjective(.0))]
pub struct FormatError(pub TextEncoding);

impl TextEncoding {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hex" | "hexadecimal" => Some(Self::Hex),
            "base64" | "b64" => Some(Self::Base64),
            "binary" | "bin" => Some(Self::Binary),
            "octal" | "oct" => Some(Self::Octal),
            "decimal" | "dec" => Some(Self::Decimal),
            _ => None,
        }
    }

    /// Canonical name sent to the service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64 => "base64",
            Self::Binary => "binary",
            Self::Octal => "octal",
            Self::Decimal => "decimal",
        }
    }

    /// Radix of the per-byte group encodings
    pub fn radix(&self) -> Option<u32> {
        match self {
            Self::Binary => Some(2),
            Self::Octal => Some(8),
            Self::Decimal => Some(10),
            Self::Hex | Self::Base64 => None,
        }
    }

    /// Check `text` against this encoding and return its normalized form
    ///
    /// Hex and base64 ignore all whitespace. Radix encodings keep one space between
    /// byte groups.
    pub fn normalize(&self, text: &str) -> Result<String, FormatError> {
        let normalized = match self {
            Self::Hex => normalize_hex(text),
            Self::Base64 => {
                let compact = strip_whitespace(text);
                BASE64_INPUT
                    .decode(&compact)
                    .ok()
                    .filter(|bytes| !bytes.is_empty())
                    .map(|_| compact)
            }
            Self::Binary | Self::Octal | Self::Decimal => {
                let radix = self.radix().unwrap_or(10);
                normalize_radix_groups(text, radix)
            }
        };
        normalized.ok_or(FormatError(*self))
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.normalize(text).is_ok()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn adjective(encoding: &TextEncoding) -> &'static str {
    match encoding {
        TextEncoding::Hex => "hexadecimal",
        other => other.as_str(),
    }
}

/// Remove every whitespace character
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize a hex string, or `None` if it is empty, odd-length or has non-hex digits
pub fn normalize_hex(text: &str) -> Option<String> {
    let compact = strip_whitespace(text);
    if compact.is_empty() {
        return None;
    }
    hex::decode(&compact).ok().map(|_| compact)
}

fn normalize_radix_groups(text: &str, radix: u32) -> Option<String> {
    let groups: Vec<&str> = text.split_whitespace().collect();
    if groups.is_empty() {
        return None;
    }
    for group in &groups {
        // from_str_radix tolerates a leading '+', the service does not
        if !group.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        u8::from_str_radix(group, radix).ok()?;
    }
    Some(groups.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse() {
        assert_eq!(TextEncoding::parse("HEX"), Some(TextEncoding::Hex));
        assert_eq!(TextEncoding::parse("b64"), Some(TextEncoding::Base64));
        assert_eq!(TextEncoding::parse(" octal "), Some(TextEncoding::Octal));
        assert_eq!(TextEncoding::parse("base32"), None);
    }

    #[test]
    fn test_hex() {
        assert!(TextEncoding::Hex.is_valid("ba7816bf"));
        assert!(TextEncoding::Hex.is_valid("BA78 16BF"));
        assert!(!TextEncoding::Hex.is_valid("zz11"));
        assert!(!TextEncoding::Hex.is_valid("abc"));
        assert!(!TextEncoding::Hex.is_valid(""));
        assert_eq!(TextEncoding::Hex.normalize("ab cd\nef").unwrap(), "abcdef");
    }

    #[test]
    fn test_base64() {
        assert!(TextEncoding::Base64.is_valid("aGVsbG8="));
        assert!(TextEncoding::Base64.is_valid("aGVs\nbG8="));
        assert!(TextEncoding::Base64.is_valid("aGVsbG8"));
        assert!(!TextEncoding::Base64.is_valid("a*b="));
        assert!(!TextEncoding::Base64.is_valid("=aGV"));
        assert!(!TextEncoding::Base64.is_valid("aGVsb"));
    }

    #[test]
    fn test_base64_ignores_trailing_bits() {
        for text in ["aGl=", "QUI", "YQ", "YR=="] {
            assert_eq!(TextEncoding::Base64.normalize(text).as_deref(), Ok(text));
        }
    }

    #[test]
    fn test_radix_groups() {
        assert_eq!(
            TextEncoding::Binary.normalize("01101000   01101001").unwrap(),
            "01101000 01101001"
        );
        assert!(!TextEncoding::Binary.is_valid("0120"));
        assert!(TextEncoding::Octal.is_valid("150 151"));
        assert!(!TextEncoding::Octal.is_valid("400"));
        assert!(TextEncoding::Decimal.is_valid("104 105 255"));
        assert!(!TextEncoding::Decimal.is_valid("256"));
        assert!(!TextEncoding::Decimal.is_valid("+12"));
    }

    #[test]
    fn test_format_error_message() {
        let err = TextEncoding::Hex.normalize("zz11").unwrap_err();
        assert_eq!(err.to_string(), "not a valid hexadecimal string");
        let err = TextEncoding::Base64.normalize("@@").unwrap_err();
        assert_eq!(err.to_string(), "not a valid base64 string");
    }

    proptest! {
        #[test]
        fn prop_hex_check_is_idempotent(
            bytes in proptest::collection::vec(any::<u8>(), 1..64),
            upper in any::<bool>(),
            gap in 0usize..8,
        ) {
            let mut s = hex::encode(&bytes);
            if upper {
                s = s.to_uppercase();
            }
            if gap > 0 && gap < s.len() {
                s.insert(gap, ' ');
            }

            let once = TextEncoding::Hex.normalize(&s);
            prop_assert!(once.is_ok());
            let once = once.unwrap();
            let twice = TextEncoding::Hex.normalize(&once);
            prop_assert_eq!(twice, Ok(once.clone()));
            prop_assert_eq!(hex::decode(&once).unwrap(), bytes);
        }
    }
}
