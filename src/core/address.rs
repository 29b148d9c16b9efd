//! Snippet addresses and the high/low split used by load-immediate idioms.
//!
//! A load-immediate sequence on PowerPC adds a sign-extended low half to a
//! shifted high half. When bit 15 of the address is set the low half reads
//! as negative, so the high half must be one larger to compensate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::target::AddressingWidth;
use crate::error::{PublishError, Result};

/// Runtime address of an emitted snippet, sized for the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnippetAddress {
    value: u64,
    width: AddressingWidth,
}

impl SnippetAddress {
    /// Create a new address, rejecting values wider than the target.
    pub fn new(value: u64, width: AddressingWidth) -> Result<Self> {
        if width == AddressingWidth::Narrow && value > u64::from(u32::MAX) {
            return Err(PublishError::AddressOutOfRange {
                address: value,
                bits: width.bits(),
            });
        }
        Ok(Self { value, width })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> AddressingWidth {
        self.width
    }
}

impl fmt::Display for SnippetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            AddressingWidth::Narrow => write!(f, "{:#010x}", self.value),
            AddressingWidth::Wide => write!(f, "{:#018x}", self.value),
        }
    }
}

/// Low 16 bits of an address, as consumed by a sign-extending immediate.
pub fn lo16(address: u64) -> u16 {
    (address & 0xFFFF) as u16
}

/// Sign-extend a 16-bit immediate field to 64 bits.
pub fn sign_extend16(field: u16) -> u64 {
    field as i16 as i64 as u64
}

/// Computes the upper part of an address split for a load-immediate idiom.
///
/// The returned value is already shifted right by 16. Narrow targets get a
/// 16-bit result, wide targets a 48-bit one.
pub trait HighPart {
    fn high_part(&self, address: u64, width: AddressingWidth) -> u64;
}

/// High part compensated for the sign extension of the low half.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignCompensated;

impl HighPart for SignCompensated {
    fn high_part(&self, address: u64, width: AddressingWidth) -> u64 {
        let carry = (address >> 15) & 1;
        match width {
            AddressingWidth::Narrow => ((address & 0xFFFF_FFFF) >> 16).wrapping_add(carry) & 0xFFFF,
            AddressingWidth::Wide => (address >> 16) + carry,
        }
    }
}

impl<F> HighPart for F
where
    F: Fn(u64, AddressingWidth) -> u64,
{
    fn high_part(&self, address: u64, width: AddressingWidth) -> u64 {
        self(address, width)
    }
}
