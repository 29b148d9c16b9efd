//! PowerPC disassembly of patched instruction words via capstone.
//!
//! Used for trace-level logging of materialization idioms after patching.

use capstone::{Arch, Capstone, Endian, Mode, NO_EXTRA_MODE};

use crate::core::target::{AddressingWidth, Endianness, TargetConfig};
use crate::error::{PublishError, Result};

fn cs_for(target: &TargetConfig) -> Result<Capstone> {
    let mode = match target.width {
        AddressingWidth::Narrow => Mode::Mode32,
        AddressingWidth::Wide => Mode::Mode64,
    };
    let endian = match target.endianness {
        Endianness::Big => Endian::Big,
        Endianness::Little => Endian::Little,
    };
    Capstone::new_raw(Arch::PPC, mode, NO_EXTRA_MODE, Some(endian))
        .map_err(|e| PublishError::Disassembly(e.to_string()))
}

/// Disassemble `bytes` mapped at `address`, one line per instruction.
pub fn render_words(target: &TargetConfig, bytes: &[u8], address: u64) -> Result<Vec<String>> {
    let cs = cs_for(target)?;
    let insns = cs
        .disasm_all(bytes, address)
        .map_err(|e| PublishError::Disassembly(e.to_string()))?;
    Ok(insns
        .iter()
        .map(|insn| {
            format!(
                "{:#x}: {} {}",
                insn.address(),
                insn.mnemonic().unwrap_or("?"),
                insn.op_str().unwrap_or("")
            )
        })
        .collect())
}
