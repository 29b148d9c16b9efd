//! Error types for snippet address publication.
//!
//! Publication itself has no user-facing failure mode. Every variant here
//! reports a broken caller precondition (a malformed patch site, a bad slot
//! index) or a failure of a collaborator such as the code buffer.

use thiserror::Error;

use crate::core::target::AddressingWidth;

/// Main error type for publication operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A word access fell outside the emitted buffer
    #[error("Patch site {offset:#x} out of range for {len}-byte buffer")]
    PatchSiteOutOfRange { offset: usize, len: usize },

    /// Instruction words are 4-byte aligned
    #[error("Patch site {offset:#x} is not word aligned")]
    MisalignedPatchSite { offset: usize },

    /// The idiom would begin before the start of the buffer
    #[error("Idiom '{shape}' anchored at {anchor:#x} needs {span} words")]
    IdiomUnderflow {
        anchor: usize,
        shape: &'static str,
        span: usize,
    },

    /// Address does not fit the configured addressing width
    #[error("Address {address:#x} does not fit in {bits} bits")]
    AddressOutOfRange { address: u64, bits: u32 },

    /// Address built for one width handed to a publisher for another
    #[error("Address {address:#x} is {found} but the publisher targets {expected}")]
    WidthMismatch {
        address: u64,
        expected: AddressingWidth,
        found: AddressingWidth,
    },

    /// Constant pool slot index outside the table
    #[error("Constant pool slot {index} out of range (capacity {capacity})")]
    SlotOutOfRange { index: i32, capacity: usize },

    /// Constant pool slots are written once per snippet
    #[error("Constant pool slot {index} already holds {existing:#x}")]
    SlotAlreadyWritten { index: i32, existing: u64 },

    /// Code buffer capacity exceeded
    #[error("Code buffer exhausted: requested {requested} bytes, {remaining} remaining")]
    BufferExhausted { requested: usize, remaining: usize },

    /// Emitter reported a cursor smaller than its own block length
    #[error("Metadata cursor {cursor:#x} precedes its {length}-byte block")]
    MetadataUnderflow { cursor: usize, length: usize },

    /// Invalid target configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Disassembler setup or decoding errors
    #[error("Disassembly error: {0}")]
    Disassembly(String),
}

/// Result type alias for publication operations
pub type Result<T> = std::result::Result<T, PublishError>;

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Serialization(err.to_string())
    }
}
