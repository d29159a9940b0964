//! Salted owner PIN hash.
//!
//! The owner PIN is stored only as `PBKDF2-HMAC-SHA256(pin, salt)` with a
//! fresh 16-byte salt per hash and a fixed work factor.
//!
//! # Format
//!
//! The current format is [`HashScheme::V1`], serialized bare as
//! `<salt_hex>:<hash_hex>`. Any future scheme is serialized with an explicit
//! `<scheme>$<iterations>$` prefix, so hashes written by older builds keep
//! verifying after the work factor is raised.

use std::{fmt, str::FromStr};

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{constant_time_eq, error::PinHashError};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes.
pub const HASH_LEN: usize = 32;

/// PBKDF2 iteration count of [`HashScheme::V1`].
pub const V1_ITERATIONS: u32 = 100_000;

/// Upper bound accepted when parsing prefixed hashes.
const MAX_ITERATIONS: u32 = 10_000_000;

/// Identifier written in front of prefixed hashes.
const PBKDF2_SHA256_ID: &str = "pbkdf2-sha256";

/// Hashing parameters a stored hash was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// PBKDF2-HMAC-SHA256, 100,000 iterations, bare `salt:hash` encoding
    V1,
    /// PBKDF2-HMAC-SHA256 with an explicit iteration count
    Pbkdf2Sha256 {
        /// Iteration count
        iterations: u32,
    },
}

impl HashScheme {
    /// PBKDF2 iteration count.
    pub fn iterations(self) -> u32 {
        match self {
            Self::V1 => V1_ITERATIONS,
            Self::Pbkdf2Sha256 { iterations } => iterations,
        }
    }
}

/// Salted one-way hash of the owner PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct PinHash {
    scheme: HashScheme,
    salt: [u8; SALT_LEN],
    hash: [u8; HASH_LEN],
}

impl PinHash {
    /// Hash `pin` with the current scheme and a caller-supplied salt.
    ///
    /// Callers MUST draw `salt` fresh from a secure source for every hash.
    /// Returns `None` for an empty PIN: hashing it would record "PIN
    /// protection enabled" without any real secret behind it.
    pub fn derive(pin: &str, salt: [u8; SALT_LEN]) -> Option<Self> {
        Self::derive_with(HashScheme::V1, pin, salt)
    }

    /// Hash `pin` with an explicit scheme.
    pub fn derive_with(scheme: HashScheme, pin: &str, salt: [u8; SALT_LEN]) -> Option<Self> {
        if pin.is_empty() {
            return None;
        }

        let mut hash = [0u8; HASH_LEN];
        pbkdf2_hmac::<Sha256>(pin.as_bytes(), &salt, scheme.iterations(), &mut hash);
        Some(Self { scheme, salt, hash })
    }

    /// Check `pin` against this hash in constant time.
    pub fn verify(&self, pin: &str) -> bool {
        if pin.is_empty() {
            return false;
        }

        let mut candidate = Zeroizing::new([0u8; HASH_LEN]);
        pbkdf2_hmac::<Sha256>(pin.as_bytes(), &self.salt, self.scheme.iterations(), &mut *candidate);
        constant_time_eq(&*candidate, &self.hash)
    }

    /// Scheme this hash was produced with.
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Random salt.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Derived hash bytes.
    pub fn hash(&self) -> &[u8; HASH_LEN] {
        &self.hash
    }

    /// Whether the hash should be recomputed with the current work factor.
    ///
    /// Only the iteration count matters: a prefixed hash at the V1 count is
    /// as strong as the bare form.
    pub fn needs_rehash(&self) -> bool {
        self.scheme.iterations() != V1_ITERATIONS
    }
}

impl fmt::Display for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let HashScheme::Pbkdf2Sha256 { iterations } = self.scheme {
            write!(f, "{PBKDF2_SHA256_ID}${iterations}$")?;
        }
        write!(f, "{}:{}", hex::encode(self.salt), hex::encode(self.hash))
    }
}

impl fmt::Debug for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinHash")
            .field("scheme", &self.scheme)
            .field("salt", &hex::encode(self.salt))
            .finish_non_exhaustive()
    }
}

impl FromStr for PinHash {
    type Err = PinHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, body) = match s.split_once('$') {
            None => (HashScheme::V1, s),
            Some((id, rest)) => {
                if id != PBKDF2_SHA256_ID {
                    return Err(PinHashError::UnknownScheme(id.to_string()));
                }
                let (iterations, body) = rest.split_once('$').ok_or(PinHashError::Malformed)?;
                let iterations: u32 =
                    iterations.parse().map_err(|_| PinHashError::InvalidIterations)?;
                if iterations == 0 || iterations > MAX_ITERATIONS {
                    return Err(PinHashError::InvalidIterations);
                }
                (HashScheme::Pbkdf2Sha256 { iterations }, body)
            },
        };

        let (salt_hex, hash_hex) = body.split_once(':').ok_or(PinHashError::Malformed)?;
        let salt = decode_fixed::<SALT_LEN>(salt_hex, "salt")?;
        let hash = decode_fixed::<HASH_LEN>(hash_hex, "hash")?;

        Ok(Self { scheme, salt, hash })
    }
}

fn decode_fixed<const N: usize>(hex_str: &str, field: &'static str) -> Result<[u8; N], PinHashError> {
    let mut out = [0u8; N];
    if hex_str.len() != N * 2 {
        return Err(PinHashError::InvalidLength { field, expected: N * 2, actual: hex_str.len() });
    }
    hex::decode_to_slice(hex_str, &mut out).map_err(|_| PinHashError::InvalidHex(field))?;
    Ok(out)
}
