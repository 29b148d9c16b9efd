//! Address materialization idioms as data.
//!
//! Instruction selection emits a fixed sequence of load-immediate
//! instructions with zeroed immediates and remembers its last ("lower")
//! instruction. An [`IdiomShape`] says which word, counted back from that
//! anchor, receives which 16-bit part of the address.
//!
//! Narrow (3 words):
//!
//! ```text
//!   anchor-2  li     rX, lo
//!   anchor-1  <companion, untouched>
//!   anchor    addis  rX, rX, hi(adjusted)
//! ```
//!
//! Wide (5 words):
//!
//! ```text
//!   anchor-4  lis    rT, adjusted[32..48]
//!   anchor-3  ori    rT, rT, adjusted[16..32]
//!   anchor-2  lis    rX, adjusted[0..16]
//!   anchor-1  rldimi rX, rT, 32, 0      <untouched>
//!   anchor    addi   rX, rX, lo
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::{lo16, HighPart};
use crate::core::buffer::WORD_SIZE;
use crate::core::target::AddressingWidth;

/// Location of the anchor instruction word of an idiom in the code buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchSite(usize);

impl PatchSite {
    /// `offset` is the byte offset of the anchor word.
    pub fn new(offset: usize) -> Self {
        PatchSite(offset)
    }

    pub fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for PatchSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{:#x}", self.0)
    }
}

/// Which part of the address an immediate field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPart {
    /// Low 16 bits, unadjusted.
    Low,
    /// 16 bits of the sign-compensated high part, starting at `shift`.
    Adjusted { shift: u32 },
}

/// One patched immediate within an idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmediateField {
    /// Distance from the anchor, in instruction words.
    pub words_before: usize,
    pub part: AddressPart,
}

/// Fixed layout of a materialization idiom.
#[derive(Debug, PartialEq, Eq)]
pub struct IdiomShape {
    pub name: &'static str,
    /// Words from the first instruction through the anchor, inclusive.
    pub span: usize,
    pub fields: &'static [ImmediateField],
}

pub static NARROW_IDIOM: IdiomShape = IdiomShape {
    name: "li/addis",
    span: 3,
    fields: &[
        ImmediateField {
            words_before: 0,
            part: AddressPart::Adjusted { shift: 0 },
        },
        ImmediateField {
            words_before: 2,
            part: AddressPart::Low,
        },
    ],
};

pub static WIDE_IDIOM: IdiomShape = IdiomShape {
    name: "lis/ori/lis/rldimi/addi",
    span: 5,
    fields: &[
        ImmediateField {
            words_before: 0,
            part: AddressPart::Low,
        },
        ImmediateField {
            words_before: 2,
            part: AddressPart::Adjusted { shift: 0 },
        },
        ImmediateField {
            words_before: 3,
            part: AddressPart::Adjusted { shift: 16 },
        },
        ImmediateField {
            words_before: 4,
            part: AddressPart::Adjusted { shift: 32 },
        },
    ],
};

impl IdiomShape {
    pub fn for_width(width: AddressingWidth) -> &'static IdiomShape {
        match width {
            AddressingWidth::Narrow => &NARROW_IDIOM,
            AddressingWidth::Wide => &WIDE_IDIOM,
        }
    }

    /// Value of `field` for `address`, given the already computed high part.
    pub fn field_value(field: &ImmediateField, address: u64, adjusted: u64) -> u16 {
        match field.part {
            AddressPart::Low => lo16(address),
            AddressPart::Adjusted { shift } => ((adjusted >> shift) & 0xFFFF) as u16,
        }
    }

    /// All field values for `address`, in declaration order.
    pub fn split(
        &self,
        address: u64,
        width: AddressingWidth,
        high: &dyn HighPart,
    ) -> Vec<(ImmediateField, u16)> {
        let adjusted = high.high_part(address, width);
        self.fields
            .iter()
            .map(|f| (*f, Self::field_value(f, address, adjusted)))
            .collect()
    }
}

/// An idiom shape bound to its anchor in a buffer.
#[derive(Debug, Clone, Copy)]
pub struct MaterializationIdiom {
    anchor: PatchSite,
    shape: &'static IdiomShape,
}

impl MaterializationIdiom {
    pub fn new(anchor: PatchSite, shape: &'static IdiomShape) -> Self {
        Self { anchor, shape }
    }

    pub fn for_width(anchor: PatchSite, width: AddressingWidth) -> Self {
        Self::new(anchor, IdiomShape::for_width(width))
    }

    pub fn anchor(&self) -> PatchSite {
        self.anchor
    }

    pub fn shape(&self) -> &'static IdiomShape {
        self.shape
    }

    /// Byte offset of the first instruction, `None` if it precedes the buffer.
    pub fn start_offset(&self) -> Option<usize> {
        self.anchor
            .offset()
            .checked_sub((self.shape.span - 1) * WORD_SIZE)
    }

    /// Byte offset of the word holding `field`.
    pub fn field_offset(&self, field: &ImmediateField) -> Option<usize> {
        self.anchor
            .offset()
            .checked_sub(field.words_before * WORD_SIZE)
    }

    /// Byte range covered by the whole idiom.
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        self.start_offset()
            .map(|start| start..self.anchor.offset() + WORD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::SignCompensated;

    #[test]
    fn test_shapes_fit_span() {
        for shape in [&NARROW_IDIOM, &WIDE_IDIOM] {
            for f in shape.fields {
                assert!(f.words_before < shape.span, "{} field out of span", shape.name);
            }
        }
        assert_eq!(NARROW_IDIOM.fields.len(), 2);
        assert_eq!(WIDE_IDIOM.fields.len(), 4);
    }

    #[test]
    fn test_wide_field_offsets() {
        let idiom = MaterializationIdiom::for_width(PatchSite::new(0x20), AddressingWidth::Wide);
        let offsets: Vec<usize> = idiom
            .shape()
            .fields
            .iter()
            .filter_map(|f| idiom.field_offset(f))
            .collect();
        assert_eq!(offsets, vec![0x20, 0x18, 0x14, 0x10]);
        assert_eq!(idiom.byte_range(), Some(0x10..0x24));
    }

    #[test]
    fn test_underflow_detected() {
        let idiom = MaterializationIdiom::for_width(PatchSite::new(8), AddressingWidth::Wide);
        assert_eq!(idiom.start_offset(), None);
        let idiom = MaterializationIdiom::for_width(PatchSite::new(8), AddressingWidth::Narrow);
        assert_eq!(idiom.start_offset(), Some(0));
    }

    #[test]
    fn test_split_wide_scenario() {
        let parts = WIDE_IDIOM.split(0x0000_0001_2345_6789, AddressingWidth::Wide, &SignCompensated);
        let values: Vec<u16> = parts.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0x6789, 0x2345, 0x0001, 0x0000]);
    }

    #[test]
    fn test_split_narrow_scenario() {
        let parts = NARROW_IDIOM.split(0x0000_8123, AddressingWidth::Narrow, &SignCompensated);
        let values: Vec<u16> = parts.iter().map(|(_, v)| *v).collect();
        // anchor gets the adjusted high part, anchor-2 the low half
        assert_eq!(values, vec![0x0001, 0x8123]);
    }
}
