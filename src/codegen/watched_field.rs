//! Watched instance field metadata block.
//!
//! Describes one instrumented field access site: the method it lives in,
//! its bytecode location and the field offset. A runtime helper reads the
//! block to decide whether the access has to be redirected.

use serde::{Deserialize, Serialize};

use crate::core::buffer::CodeBuffer;
use crate::core::target::TargetConfig;
use crate::error::Result;

/// Writes a fixed-length metadata block into the code buffer.
pub trait MetadataEmitter {
    /// Length of the block in bytes for `target`.
    fn metadata_length(&self, target: &TargetConfig) -> usize;

    /// Append the block and return the cursor just past it.
    fn emit_metadata(&self, buffer: &mut CodeBuffer, target: &TargetConfig) -> Result<usize>;
}

/// Three pointer-size fields, in target byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchedInstanceFieldData {
    /// Method containing the access
    pub method: u64,
    /// Bytecode index of the access
    pub location: u64,
    /// Offset of the field in the instance
    pub offset: u64,
}

impl WatchedInstanceFieldData {
    pub const FIELD_COUNT: usize = 3;

    pub fn new(method: u64, location: u64, offset: u64) -> Self {
        Self {
            method,
            location,
            offset,
        }
    }

    /// Decode a block previously emitted at `offset`.
    pub fn read_from(buffer: &CodeBuffer, offset: usize, target: &TargetConfig) -> Result<Self> {
        let step = target.pointer_size();
        Ok(Self {
            method: buffer.read_pointer(offset, target.width)?,
            location: buffer.read_pointer(offset + step, target.width)?,
            offset: buffer.read_pointer(offset + 2 * step, target.width)?,
        })
    }
}

impl MetadataEmitter for WatchedInstanceFieldData {
    fn metadata_length(&self, target: &TargetConfig) -> usize {
        Self::FIELD_COUNT * target.pointer_size()
    }

    fn emit_metadata(&self, buffer: &mut CodeBuffer, target: &TargetConfig) -> Result<usize> {
        let mut block = CodeBuffer::new(0, self.metadata_length(target), buffer.endianness());
        block.put_pointer(self.method, target.width)?;
        block.put_pointer(self.location, target.width)?;
        block.put_pointer(self.offset, target.width)?;
        // Single append: an exhausted buffer gets no partial block.
        buffer.put_bytes(block.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Endianness;
    use crate::error::PublishError;

    #[test]
    fn test_length_per_width() {
        let data = WatchedInstanceFieldData::new(1, 2, 3);
        assert_eq!(data.metadata_length(&TargetConfig::ppc32()), 12);
        assert_eq!(data.metadata_length(&TargetConfig::ppc64()), 24);
    }

    #[test]
    fn test_emit_and_read_back() {
        let target = TargetConfig::ppc64le();
        let mut buf = CodeBuffer::new(0x7000, 64, Endianness::Little);
        buf.put_u32(0x6000_0000).unwrap();
        let data = WatchedInstanceFieldData::new(0xFEED_0000_1000, 17, 0x28);
        let end = data.emit_metadata(&mut buf, &target).unwrap();
        assert_eq!(end, 4 + 24);
        assert_eq!(WatchedInstanceFieldData::read_from(&buf, 4, &target).unwrap(), data);
    }

    #[test]
    fn test_emit_truncates_narrow_fields() {
        let target = TargetConfig::ppc32();
        let mut buf = CodeBuffer::new(0, 64, Endianness::Big);
        let data = WatchedInstanceFieldData::new(0xAAAA_BBBB, 5, 8);
        data.emit_metadata(&mut buf, &target).unwrap();
        assert_eq!(&buf.bytes()[..4], &[0xAA, 0xAA, 0xBB, 0xBB]);
    }

    #[test]
    fn test_emit_exhausted_leaves_cursor() {
        let target = TargetConfig::ppc64();
        let mut buf = CodeBuffer::new(0, 16, Endianness::Big);
        let err = WatchedInstanceFieldData::new(1, 2, 3)
            .emit_metadata(&mut buf, &target)
            .unwrap_err();
        assert!(matches!(err, PublishError::BufferExhausted { requested: 24, .. }));
        assert_eq!(buf.cursor(), 0);
    }
}
