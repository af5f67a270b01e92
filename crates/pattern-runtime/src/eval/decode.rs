// Numeric decode pipeline: raw bytes -> endianness transform -> sign extension

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, EvalError};

/// Byte order of a concrete read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    /// Decode the script-level enumerant: 0 = native, 1 = big, 2 = little.
    /// `native` is whatever the runtime is configured to treat as native.
    pub fn from_enumerant(value: u128, native: Endianness) -> Result<Self, EvalError> {
        match value {
            0 => Ok(native),
            1 => Ok(Endianness::Big),
            2 => Ok(Endianness::Little),
            other => Err(EvalError::new(ErrorKind::InvalidValueType {
                expected: "endian enumerant",
                found: "unsigned integer",
            })
            .with_hint(format!(
                "Endian {} is unknown. Use 0 (native), 1 (big) or 2 (little).",
                other
            ))),
        }
    }
}

/// Largest width the pipeline handles, in bytes
pub const MAX_READ_SIZE: u64 = 16;

/// Reject widths outside `1..=16`
pub fn check_read_size(size: i128) -> Result<u64, EvalError> {
    if (1..=MAX_READ_SIZE as i128).contains(&size) {
        Ok(size as u64)
    } else {
        Err(EvalError::new(ErrorKind::InvalidSize(size)).with_hint("Try a value between 1 and 16."))
    }
}

/// Load up to 16 stored bytes into a 128-bit container, first byte lowest.
/// Bytes above `bytes.len()` stay zero.
pub fn load_container(bytes: &[u8]) -> u128 {
    debug_assert!(bytes.len() <= 16);
    let mut buf = [0u8; 16];
    buf[..bytes.len()].copy_from_slice(bytes);
    u128::from_le_bytes(buf)
}

/// Reverse the low `size` bytes of the container for big-endian data.
/// Only the occupied window moves; higher bytes remain zero.
pub fn change_endianness(value: u128, size: u64, endian: Endianness) -> u128 {
    match endian {
        Endianness::Little => value,
        Endianness::Big => {
            let mut buf = value.to_le_bytes();
            buf[..size as usize].reverse();
            u128::from_le_bytes(buf)
        }
    }
}

/// Arithmetic sign extension from bit `bits - 1` to the full 128 bits
pub fn sign_extend(bits: u64, value: u128) -> i128 {
    if bits == 0 || bits >= 128 {
        return value as i128;
    }
    let shift = 128 - bits as u32;
    ((value << shift) as i128) >> shift
}

/// Decode an unsigned integer of `bytes.len()` bytes
pub fn decode_unsigned(bytes: &[u8], endian: Endianness) -> u128 {
    change_endianness(load_container(bytes), bytes.len() as u64, endian)
}

/// Decode a signed integer of `bytes.len()` bytes, sign-extended to 128 bits
pub fn decode_signed(bytes: &[u8], endian: Endianness) -> i128 {
    sign_extend(bytes.len() as u64 * 8, decode_unsigned(bytes, endian))
}
