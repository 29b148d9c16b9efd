//! CodeBuffer: the binary instruction buffer shared by one compilation.
//!
//! Appends advance the cursor; word accesses used for patching are bounded,
//! alignment-checked and never move the cursor.

use crate::core::target::{AddressingWidth, Endianness};
use crate::error::{PublishError, Result};

/// Size of one PowerPC instruction word in bytes.
pub const WORD_SIZE: usize = 4;

/// Mask of the immediate field in a D-form instruction word.
pub const IMMEDIATE_MASK: u32 = 0x0000_FFFF;

/// Growable, capacity-limited code buffer mapped at a fixed runtime base.
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    base: u64,
    bytes: Vec<u8>,
    capacity: usize,
    endianness: Endianness,
}

impl CodeBuffer {
    pub fn new(base: u64, capacity: usize, endianness: Endianness) -> Self {
        Self {
            base,
            bytes: Vec::with_capacity(capacity),
            capacity,
            endianness,
        }
    }

    /// Runtime address of offset 0.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Offset of the next free byte.
    pub fn cursor(&self) -> usize {
        self.bytes.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Runtime address of a buffer offset.
    pub fn address_at(&self, offset: usize) -> u64 {
        self.base.wrapping_add(offset as u64)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append raw bytes, returning the cursor after them.
    pub fn put_bytes(&mut self, data: &[u8]) -> Result<usize> {
        if data.len() > self.remaining() {
            return Err(PublishError::BufferExhausted {
                requested: data.len(),
                remaining: self.remaining(),
            });
        }
        self.bytes.extend_from_slice(data);
        Ok(self.cursor())
    }

    /// Append one instruction word.
    pub fn put_u32(&mut self, word: u32) -> Result<usize> {
        let encoded = match self.endianness {
            Endianness::Little => word.to_le_bytes(),
            Endianness::Big => word.to_be_bytes(),
        };
        self.put_bytes(&encoded)
    }

    /// Append a pointer-size value.
    pub fn put_pointer(&mut self, value: u64, width: AddressingWidth) -> Result<usize> {
        match (width, self.endianness) {
            (AddressingWidth::Narrow, Endianness::Little) => {
                self.put_bytes(&(value as u32).to_le_bytes())
            }
            (AddressingWidth::Narrow, Endianness::Big) => {
                self.put_bytes(&(value as u32).to_be_bytes())
            }
            (AddressingWidth::Wide, Endianness::Little) => self.put_bytes(&value.to_le_bytes()),
            (AddressingWidth::Wide, Endianness::Big) => self.put_bytes(&value.to_be_bytes()),
        }
    }

    /// Read a pointer-size value at `offset`.
    pub fn read_pointer(&self, offset: usize, width: AddressingWidth) -> Result<u64> {
        let b = self.slice(offset, width.pointer_size())?;
        Ok(match (width, self.endianness) {
            (AddressingWidth::Narrow, Endianness::Little) => {
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64
            }
            (AddressingWidth::Narrow, Endianness::Big) => {
                u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64
            }
            (AddressingWidth::Wide, Endianness::Little) => {
                u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            (AddressingWidth::Wide, Endianness::Big) => {
                u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
        })
    }

    /// Check that a full instruction word lives at `offset`.
    pub fn check_word(&self, offset: usize) -> Result<()> {
        if offset % WORD_SIZE != 0 {
            return Err(PublishError::MisalignedPatchSite { offset });
        }
        self.slice(offset, WORD_SIZE).map(|_| ())
    }

    /// Read the instruction word at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.check_word(offset)?;
        let b = &self.bytes[offset..offset + WORD_SIZE];
        Ok(match self.endianness {
            Endianness::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Endianness::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        })
    }

    /// Overwrite the instruction word at `offset`.
    pub fn write_u32(&mut self, offset: usize, word: u32) -> Result<()> {
        self.check_word(offset)?;
        let encoded = match self.endianness {
            Endianness::Little => word.to_le_bytes(),
            Endianness::Big => word.to_be_bytes(),
        };
        self.bytes[offset..offset + WORD_SIZE].copy_from_slice(&encoded);
        Ok(())
    }

    /// OR a 16-bit field into the immediate bits of the word at `offset`.
    ///
    /// Bits 16..31 of the word are left as they are.
    pub fn or_low16(&mut self, offset: usize, field: u16) -> Result<()> {
        let word = self.read_u32(offset)?;
        self.write_u32(offset, word | (u32::from(field) & IMMEDIATE_MASK))
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(PublishError::PatchSiteOutOfRange {
                offset,
                len: self.bytes.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_advances_cursor() {
        let mut buf = CodeBuffer::new(0x1000, 64, Endianness::Big);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.address_at(0), buf.base());
        assert_eq!(buf.put_u32(0x3960_0000).unwrap(), 4);
        assert_eq!(buf.put_pointer(0xAABB, AddressingWidth::Wide).unwrap(), 12);
        assert_eq!(buf.address_at(buf.cursor()), 0x100C);
        assert_eq!(buf.remaining(), 52);
    }

    #[test]
    fn test_word_byte_order() {
        let mut big = CodeBuffer::new(0, 8, Endianness::Big);
        big.put_u32(0x3D6B_0001).unwrap();
        assert_eq!(big.bytes(), &[0x3D, 0x6B, 0x00, 0x01]);

        let mut little = CodeBuffer::new(0, 8, Endianness::Little);
        little.put_u32(0x3D6B_0001).unwrap();
        assert_eq!(little.bytes(), &[0x01, 0x00, 0x6B, 0x3D]);
        assert_eq!(little.read_u32(0).unwrap(), 0x3D6B_0001);
    }

    #[test]
    fn test_exhaustion() {
        let mut buf = CodeBuffer::new(0, 6, Endianness::Big);
        buf.put_u32(0).unwrap();
        let err = buf.put_u32(0).unwrap_err();
        assert!(matches!(
            err,
            PublishError::BufferExhausted {
                requested: 4,
                remaining: 2
            }
        ));
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_or_low16_preserves_high_bits() {
        let mut buf = CodeBuffer::new(0, 8, Endianness::Big);
        buf.put_u32(0xDEAD_0000).unwrap();
        buf.or_low16(0, 0x1234).unwrap();
        assert_eq!(buf.read_u32(0).unwrap(), 0xDEAD_1234);
        // OR merge, never overwrite
        buf.or_low16(0, 0x0001).unwrap();
        assert_eq!(buf.read_u32(0).unwrap(), 0xDEAD_1235);
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_word_access_checks() {
        let mut buf = CodeBuffer::new(0, 16, Endianness::Big);
        buf.put_u32(0).unwrap();
        buf.put_u32(0).unwrap();
        assert!(matches!(
            buf.read_u32(2),
            Err(PublishError::MisalignedPatchSite { offset: 2 })
        ));
        assert!(matches!(
            buf.or_low16(8, 1),
            Err(PublishError::PatchSiteOutOfRange { offset: 8, len: 8 })
        ));
    }

    #[test]
    fn test_read_pointer() {
        let mut buf = CodeBuffer::new(0, 16, Endianness::Little);
        buf.put_pointer(0xCAFE_F00D, AddressingWidth::Narrow).unwrap();
        assert_eq!(buf.read_pointer(0, AddressingWidth::Narrow).unwrap(), 0xCAFE_F00D);
        assert!(buf.read_pointer(0, AddressingWidth::Wide).is_err());
    }
}
