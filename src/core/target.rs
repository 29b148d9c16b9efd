//! Target configuration consumed by publication.
//!
//! The addressing width and byte order are fixed per compilation and are
//! read-only while snippets are being finalized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{PublishError, Result};

/// Addressing width of the build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingWidth {
    /// 32-bit addressing
    Narrow,
    /// 64-bit addressing
    Wide,
}

impl AddressingWidth {
    /// Number of significant address bits.
    pub fn bits(self) -> u32 {
        match self {
            AddressingWidth::Narrow => 32,
            AddressingWidth::Wide => 64,
        }
    }

    /// Size of a pointer in bytes.
    pub fn pointer_size(self) -> usize {
        match self {
            AddressingWidth::Narrow => 4,
            AddressingWidth::Wide => 8,
        }
    }

    pub fn is_wide(self) -> bool {
        matches!(self, AddressingWidth::Wide)
    }
}

impl fmt::Display for AddressingWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingWidth::Narrow => write!(f, "Narrow"),
            AddressingWidth::Wide => write!(f, "Wide"),
        }
    }
}

/// Byte order of instruction words and data in the code buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "Little"),
            Endianness::Big => write!(f, "Big"),
        }
    }
}

/// Build/target facts read by the publisher and the snippet coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Addressing width (selects the idiom shape and the TOC path)
    pub width: AddressingWidth,
    /// Byte order of emitted words
    pub endianness: Endianness,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::ppc64()
    }
}

impl TargetConfig {
    pub fn new(width: AddressingWidth, endianness: Endianness) -> Self {
        Self { width, endianness }
    }

    /// 32-bit big-endian PowerPC.
    pub fn ppc32() -> Self {
        Self::new(AddressingWidth::Narrow, Endianness::Big)
    }

    /// 64-bit big-endian PowerPC.
    pub fn ppc64() -> Self {
        Self::new(AddressingWidth::Wide, Endianness::Big)
    }

    /// 64-bit little-endian PowerPC.
    pub fn ppc64le() -> Self {
        Self::new(AddressingWidth::Wide, Endianness::Little)
    }

    pub fn is_64bit(&self) -> bool {
        self.width.is_wide()
    }

    pub fn pointer_size(&self) -> usize {
        self.width.pointer_size()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| {
            PublishError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }
}
