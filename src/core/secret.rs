//! Random secret generation.
//!
//! Secrets are drawn from the operating system CSPRNG and text-encoded
//! for storage in env and token files.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

/// Text encoding applied to the raw secret bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Standard padded base64.
    Base64,
    /// Lowercase hexadecimal.
    Hex,
}

/// A generated secret value.
///
/// The encoded text is wiped from memory on drop, and `Debug` never
/// prints it.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    value: String,
}

impl Secret {
    /// Wrap an existing value, e.g. one read back from an env file.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The encoded secret text.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Short SHA-256 fingerprint, safe to print.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.value.as_bytes());
        hex::encode(&digest[..6])
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.value.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Generate `byte_length` random bytes and encode them.
///
/// # Errors
///
/// Returns `SecretError::InvalidLength` if `byte_length` is zero.
pub fn generate_secret(byte_length: usize, encoding: Encoding) -> Result<Secret> {
    if byte_length == 0 {
        return Err(SecretError::InvalidLength.into());
    }

    let mut bytes = vec![0u8; byte_length];
    OsRng.fill_bytes(&mut bytes);

    let value = match encoding {
        Encoding::Base64 => STANDARD.encode(&bytes),
        Encoding::Hex => hex::encode(&bytes),
    };
    bytes.zeroize();

    Ok(Secret { value })
}
