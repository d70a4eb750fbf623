//! # Payment identifiers
//!
//! Storage keys payments by a 12-byte identifier. Clients only ever see the
//! 24 character lowercase hex form produced by [`PaymentId::to_hex`].
//!
//! Layout of a generated identifier:
//! - bytes 0..4: seconds since the Unix epoch, big-endian
//! - bytes 4..9: random value fixed for the lifetime of the process
//! - bytes 9..12: counter, big-endian, seeded randomly and incremented per id
//!
//! Comparing the raw bytes therefore orders identifiers by creation time, and
//! by generation sequence within a second.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use rand::Rng;
use thiserror::Error;

pub const ID_LEN: usize = 12;
const HEX_LEN: usize = ID_LEN * 2;
const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| rand::thread_rng().gen());
static COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::thread_rng().gen_range(0..=COUNTER_MASK / 2)));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier must be 24 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("identifier contains non-hex characters")]
    InvalidCharacter,
    #[error("stored identifier has {0} bytes, expected 12")]
    InvalidBytes(usize),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaymentId([u8; ID_LEN]);

impl PaymentId {
    /// Generate a new identifier that sorts after every identifier previously
    /// generated by this process in an earlier second.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_LEN];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse the external form. Input of the wrong length is rejected, never
    /// padded or truncated.
    pub fn parse(external: &str) -> Result<Self, IdError> {
        if external.len() != HEX_LEN {
            return Err(IdError::InvalidLength(external.len()));
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(external, &mut bytes).map_err(|_| IdError::InvalidCharacter)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Rebuild an identifier from the bytes kept in storage.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let bytes: [u8; ID_LEN] = bytes
            .try_into()
            .map_err(|_| IdError::InvalidBytes(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentId({})", self.to_hex())
    }
}
