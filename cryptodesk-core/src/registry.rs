// SPDX-License-Identifier: MIT
//
// CryptoDesk: Validated Client for a Remote Cryptographic Service
// Copyright (c) 2025 CryptoDesk Contributors

//! Algorithm registry
//!
//! Single source of truth for what each supported algorithm needs and accepts. The
//! table is built once, lives for the whole process and is never mutated; adding an
//! algorithm means adding an entry to [`ALGORITHMS`].

use crate::encoding::TextEncoding;
use crate::protocol::{Field, OperationKind};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    SymmetricCipher,
    AsymmetricCipher,
    Signature,
    Hash,
    Kdf,
    Encoding,
}

impl Category {
    /// Key material for these families is exchanged as hex
    pub fn uses_hex_key_material(&self) -> bool {
        matches!(self, Self::AsymmetricCipher | Self::Signature)
    }
}

/// Block cipher mode of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Ecb,
    Cbc,
    Ctr,
    Cfb,
    Ofb,
    Gcm,
}

impl Mode {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ecb" => Some(Self::Ecb),
            "cbc" => Some(Self::Cbc),
            "ctr" => Some(Self::Ctr),
            "cfb" => Some(Self::Cfb),
            "ofb" => Some(Self::Ofb),
            "gcm" => Some(Self::Gcm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ecb => "ecb",
            Self::Cbc => "cbc",
            Self::Ctr => "ctr",
            Self::Cfb => "cfb",
            Self::Ofb => "ofb",
            Self::Gcm => "gcm",
        }
    }

    /// ECB is the only mode without an IV
    pub fn uses_iv(&self) -> bool {
        !matches!(self, Self::Ecb)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a key string maps to key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// One ASCII character per byte
    Text,
    /// Two hex digits per byte
    Hex,
}

impl KeyFormat {
    /// Unit name used in length messages
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Text => "characters",
            Self::Hex => "hex characters",
        }
    }

    /// Characters needed to express `bytes` bytes
    pub fn chars_for(&self, bytes: usize) -> usize {
        match self {
            Self::Text => bytes,
            Self::Hex => bytes * 2,
        }
    }
}

/// Which [`KeyFormat`] applies to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyMeasure {
    Fixed(KeyFormat),
    /// Text in ECB, hex in every chained mode
    ByMode,
}

/// Accepted key lengths in bytes
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KeyConstraint {
    pub lengths: &'static [usize],
    pub measure: KeyMeasure,
}

/// Fields accepted by one operation of one algorithm
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationSpec {
    pub kind: OperationKind,
    pub required: &'static [Field],
    pub optional: &'static [Field],
}

impl OperationSpec {
    pub fn accepts(&self, field: Field) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    /// The field that carries the output/input encoding, if any
    pub fn encoding_field(&self) -> Option<Field> {
        [Field::OutputEncoding, Field::Encoding]
            .into_iter()
            .find(|f| self.accepts(*f))
    }
}

/// Static metadata for one algorithm
#[derive(Debug, Serialize)]
pub struct AlgorithmDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    /// Path segment under `/api/`
    pub slug: &'static str,
    pub category: Category,
    /// Supported modes; the first one is the default
    pub modes: &'static [Mode],
    pub key: Option<KeyConstraint>,
    /// IV length in bytes for chained modes
    pub block_size: Option<usize>,
    /// Supported encodings; the first one is the default
    pub encodings: &'static [TextEncoding],
    pub operations: &'static [OperationSpec],
    /// Inclusive derived key length range in bytes (KDF only)
    pub derived_key_bytes: Option<(u32, u32)>,
}

impl AlgorithmDescriptor {
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.kind == kind)
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        self.operation(kind).is_some()
    }

    pub fn default_mode(&self) -> Option<Mode> {
        self.modes.first().copied()
    }

    pub fn supports_mode(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn iv_required(&self, mode: Mode) -> bool {
        self.block_size.is_some() && mode.uses_iv()
    }

    pub fn default_encoding(&self) -> Option<TextEncoding> {
        self.encodings.first().copied()
    }

    pub fn supports_encoding(&self, encoding: TextEncoding) -> bool {
        self.encodings.contains(&encoding)
    }

    /// Key convention for the given mode
    pub fn key_format(&self, mode: Option<Mode>) -> KeyFormat {
        match self.key.map(|k| k.measure) {
            Some(KeyMeasure::Fixed(format)) => format,
            Some(KeyMeasure::ByMode) => match mode {
                Some(m) if m.uses_iv() => KeyFormat::Hex,
                _ => KeyFormat::Text,
            },
            None => KeyFormat::Text,
        }
    }
}

const BLOCK_MODES: &[Mode] = &[Mode::Ecb, Mode::Cbc, Mode::Ctr, Mode::Cfb, Mode::Ofb, Mode::Gcm];
const CIPHER_ENCODINGS: &[TextEncoding] = &[TextEncoding::Hex, TextEncoding::Base64];

const BLOCK_CIPHER_FIELDS: &[Field] = &[Field::Mode, Field::Iv, Field::OutputEncoding, Field::KeySize];

const BLOCK_CIPHER_OPS: &[OperationSpec] = &[
    OperationSpec {
        kind: OperationKind::Encrypt,
        required: &[Field::Key, Field::Data],
        optional: BLOCK_CIPHER_FIELDS,
    },
    OperationSpec {
        kind: OperationKind::Decrypt,
        required: &[Field::Key, Field::Data],
        optional: BLOCK_CIPHER_FIELDS,
    },
];

const KEYPAIR_OP: OperationSpec = OperationSpec {
    kind: OperationKind::GenerateKey,
    required: &[],
    optional: &[],
};

const RSA_OPS: &[OperationSpec] = &[
    KEYPAIR_OP,
    OperationSpec {
        kind: OperationKind::Encrypt,
        required: &[Field::Data, Field::PublicKey, Field::Modulus],
        optional: &[Field::OutputEncoding],
    },
    OperationSpec {
        kind: OperationKind::Decrypt,
        required: &[Field::Data, Field::PrivateKey, Field::Modulus],
        optional: &[Field::OutputEncoding],
    },
];

const EC_CIPHER_OPS: &[OperationSpec] = &[
    KEYPAIR_OP,
    OperationSpec {
        kind: OperationKind::Encrypt,
        required: &[Field::Data, Field::PublicKey],
        optional: &[Field::OutputEncoding],
    },
    OperationSpec {
        kind: OperationKind::Decrypt,
        required: &[Field::Data, Field::PrivateKey],
        optional: &[Field::OutputEncoding],
    },
];

const ECDSA_OPS: &[OperationSpec] = &[
    KEYPAIR_OP,
    OperationSpec {
        kind: OperationKind::Sign,
        required: &[Field::Data, Field::PrivateKey],
        optional: &[],
    },
    OperationSpec {
        kind: OperationKind::Verify,
        required: &[
            Field::Data,
            Field::PublicKeyX,
            Field::PublicKeyY,
            Field::SignatureR,
            Field::SignatureS,
        ],
        optional: &[],
    },
];

const DIGEST_OPS: &[OperationSpec] = &[OperationSpec {
    kind: OperationKind::Hash,
    required: &[Field::Data],
    optional: &[Field::Encoding],
}];

const HMAC_OPS: &[OperationSpec] = &[OperationSpec {
    kind: OperationKind::Hash,
    required: &[Field::Key, Field::Data],
    optional: &[Field::Encoding],
}];

const PBKDF2_OPS: &[OperationSpec] = &[OperationSpec {
    kind: OperationKind::Hash,
    required: &[Field::Password, Field::Salt, Field::Iterations, Field::KeyLength],
    optional: &[Field::Encoding],
}];

const BASE64_OPS: &[OperationSpec] = &[
    OperationSpec {
        kind: OperationKind::Encode,
        required: &[Field::Data],
        optional: &[],
    },
    OperationSpec {
        kind: OperationKind::Decode,
        required: &[Field::Data],
        optional: &[],
    },
];

const HEX_OPS: &[OperationSpec] = &[
    OperationSpec {
        kind: OperationKind::Encode,
        required: &[Field::Data],
        optional: &[Field::Encoding],
    },
    OperationSpec {
        kind: OperationKind::Decode,
        required: &[Field::Data],
        optional: &[Field::Encoding],
    },
];

const fn block_cipher(
    id: &'static str,
    name: &'static str,
    slug: &'static str,
    lengths: &'static [usize],
    block_size: usize,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        id,
        name,
        slug,
        category: Category::SymmetricCipher,
        modes: BLOCK_MODES,
        key: Some(KeyConstraint {
            lengths,
            measure: KeyMeasure::ByMode,
        }),
        block_size: Some(block_size),
        encodings: CIPHER_ENCODINGS,
        operations: BLOCK_CIPHER_OPS,
        derived_key_bytes: None,
    }
}

const fn keyless(
    id: &'static str,
    name: &'static str,
    slug: &'static str,
    category: Category,
    encodings: &'static [TextEncoding],
    operations: &'static [OperationSpec],
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        id,
        name,
        slug,
        category,
        modes: &[],
        key: None,
        block_size: None,
        encodings,
        operations,
        derived_key_bytes: None,
    }
}

/// Every supported algorithm, in listing order
pub static ALGORITHMS: [AlgorithmDescriptor; 18] = [
    block_cipher("AES", "AES", "aes", &[16, 24, 32], 16),
    block_cipher("DES", "DES", "des", &[8], 8),
    block_cipher("3DES", "Triple DES", "3des", &[16, 24], 8),
    block_cipher("SM4", "SM4", "sm4", &[16], 16),
    keyless("RSA1024", "RSA (1024-bit)", "rsa1024", Category::AsymmetricCipher, CIPHER_ENCODINGS, RSA_OPS),
    keyless("RSA2048", "RSA (2048-bit)", "rsa2048", Category::AsymmetricCipher, CIPHER_ENCODINGS, RSA_OPS),
    keyless("ECC", "Elliptic curve encryption", "ecc", Category::AsymmetricCipher, CIPHER_ENCODINGS, EC_CIPHER_OPS),
    keyless("SM2", "SM2", "sm2", Category::AsymmetricCipher, CIPHER_ENCODINGS, EC_CIPHER_OPS),
    keyless("ECDSA", "ECDSA", "ecdsa", Category::Signature, &[], ECDSA_OPS),
    keyless("MD5", "MD5", "md5", Category::Hash, CIPHER_ENCODINGS, DIGEST_OPS),
    keyless("SHA1", "SHA-1", "sha1", Category::Hash, CIPHER_ENCODINGS, DIGEST_OPS),
    keyless("SHA256", "SHA-256", "sha256", Category::Hash, CIPHER_ENCODINGS, DIGEST_OPS),
    keyless("SHA512", "SHA-512", "sha512", Category::Hash, CIPHER_ENCODINGS, DIGEST_OPS),
    keyless("SM3", "SM3", "sm3", Category::Hash, CIPHER_ENCODINGS, DIGEST_OPS),
    keyless("HMACSHA256", "HMAC-SHA256", "hmacsha256", Category::Hash, CIPHER_ENCODINGS, HMAC_OPS),
    AlgorithmDescriptor {
        id: "PBKDF2",
        name: "PBKDF2",
        slug: "pbkdf2",
        category: Category::Kdf,
        modes: &[],
        key: None,
        block_size: None,
        encodings: CIPHER_ENCODINGS,
        operations: PBKDF2_OPS,
        derived_key_bytes: Some((16, 512)),
    },
    keyless("BASE64", "Base64", "base64", Category::Encoding, &[TextEncoding::Base64], BASE64_OPS),
    keyless(
        "HEX",
        "Hex / radix text",
        "hex",
        Category::Encoding,
        &[
            TextEncoding::Hex,
            TextEncoding::Binary,
            TextEncoding::Octal,
            TextEncoding::Decimal,
        ],
        HEX_OPS,
    ),
];

/// Id-indexed view over [`ALGORITHMS`]
pub struct Registry {
    by_id: HashMap<String, &'static AlgorithmDescriptor>,
}

impl Registry {
    fn build() -> Self {
        let by_id = ALGORITHMS
            .iter()
            .map(|d| (d.id.to_ascii_uppercase(), d))
            .collect();
        Self { by_id }
    }

    /// Look up a descriptor by id (case-insensitive)
    pub fn describe(&self, id: &str) -> Result<&'static AlgorithmDescriptor> {
        self.by_id
            .get(&id.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| Error::NotFound(format!("algorithm '{}'", id)))
    }

    /// Descriptors in listing order
    pub fn iter(&self) -> impl Iterator<Item = &'static AlgorithmDescriptor> {
        ALGORITHMS.iter()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Process-wide registry
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::build)
}

/// Shorthand for `registry().describe(id)`
pub fn describe(id: &str) -> Result<&'static AlgorithmDescriptor> {
    registry().describe(id)
}
