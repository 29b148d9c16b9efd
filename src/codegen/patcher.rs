//! Immediate patcher for address materialization idioms.
//!
//! Each 16-bit part of the address is OR-merged into the immediate bits of
//! its instruction word. The opcode and register bits already emitted by
//! instruction selection are never touched.

use tracing::trace;

use crate::codegen::idiom::{
    AddressPart, IdiomShape, MaterializationIdiom, PatchSite, NARROW_IDIOM, WIDE_IDIOM,
};
use crate::core::address::{sign_extend16, HighPart};
use crate::core::buffer::{CodeBuffer, IMMEDIATE_MASK};
use crate::core::target::AddressingWidth;
use crate::error::{PublishError, Result};

/// Patch the narrow `li`/`addis` idiom anchored at `site`.
pub fn patch_narrow(
    buffer: &mut CodeBuffer,
    site: PatchSite,
    address: u64,
    high: &dyn HighPart,
) -> Result<usize> {
    let idiom = MaterializationIdiom::new(site, &NARROW_IDIOM);
    patch_idiom(buffer, &idiom, address, AddressingWidth::Narrow, high)
}

/// Patch the wide five-word idiom anchored at `site`.
pub fn patch_wide(
    buffer: &mut CodeBuffer,
    site: PatchSite,
    address: u64,
    high: &dyn HighPart,
) -> Result<usize> {
    let idiom = MaterializationIdiom::new(site, &WIDE_IDIOM);
    patch_idiom(buffer, &idiom, address, AddressingWidth::Wide, high)
}

/// Patch every immediate field of `idiom` with its part of `address`.
///
/// All target words are checked before the first write, so an error leaves
/// the buffer unchanged. Returns the number of words patched.
pub fn patch_idiom(
    buffer: &mut CodeBuffer,
    idiom: &MaterializationIdiom,
    address: u64,
    width: AddressingWidth,
    high: &dyn HighPart,
) -> Result<usize> {
    let offsets = resolve_offsets(buffer, idiom)?;
    let parts = idiom.shape().split(address, width, high);

    for (offset, (field, value)) in offsets.iter().zip(parts.iter()) {
        trace!(
            offset = format_args!("{:#x}", offset),
            part = ?field.part,
            value = format_args!("{:#06x}", value),
            "patch immediate"
        );
        buffer.or_low16(*offset, *value)?;
    }
    Ok(offsets.len())
}

/// Reconstruct the address encoded in a patched idiom.
///
/// Inverse of [`patch_idiom`] for idioms whose immediates were zero before
/// patching.
pub fn decode_idiom(
    buffer: &CodeBuffer,
    idiom: &MaterializationIdiom,
    width: AddressingWidth,
) -> Result<u64> {
    let offsets = resolve_offsets(buffer, idiom)?;
    let mut low = 0u16;
    let mut adjusted = 0u64;
    for (offset, field) in offsets.iter().zip(idiom.shape().fields) {
        let value = buffer.read_u32(*offset)? & IMMEDIATE_MASK;
        match field.part {
            AddressPart::Low => low = value as u16,
            AddressPart::Adjusted { shift } => adjusted |= u64::from(value) << shift,
        }
    }
    let address = (adjusted << 16).wrapping_add(sign_extend16(low));
    Ok(match width {
        AddressingWidth::Narrow => address & 0xFFFF_FFFF,
        AddressingWidth::Wide => address,
    })
}

fn resolve_offsets(buffer: &CodeBuffer, idiom: &MaterializationIdiom) -> Result<Vec<usize>> {
    let shape: &IdiomShape = idiom.shape();
    let underflow = || PublishError::IdiomUnderflow {
        anchor: idiom.anchor().offset(),
        shape: shape.name,
        span: shape.span,
    };
    idiom.start_offset().ok_or_else(underflow)?;

    shape
        .fields
        .iter()
        .map(|field| -> Result<usize> {
            let offset = idiom.field_offset(field).ok_or_else(underflow)?;
            buffer.check_word(offset)?;
            Ok(offset)
        })
        .collect()
}
