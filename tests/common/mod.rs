//! Shared helpers for integration tests.
//!
//! Instruction selection is not part of this crate, so tests lay down the
//! materialization idioms themselves with zeroed immediates.

#![allow(dead_code)]

use snippet_publish::codegen::idiom::PatchSite;
use snippet_publish::core::buffer::CodeBuffer;
use snippet_publish::core::target::Endianness;

/// `li r11,0` ; `ori 0,0,0` ; `addis r11,r11,0`
pub const NARROW_TEMPLATE: [u32; 3] = [0x3960_0000, 0x6000_0000, 0x3D6B_0000];

/// `lis r12,0` ; `ori r12,r12,0` ; `lis r11,0` ; `rldimi r11,r12,32,0` ; `addi r11,r11,0`
pub const WIDE_TEMPLATE: [u32; 5] = [
    0x3D80_0000,
    0x618C_0000,
    0x3D60_0000,
    0x798B_000E,
    0x396B_0000,
];

/// Code buffer with a few leading words so idioms do not start at offset 0.
pub fn buffer(base: u64, endianness: Endianness) -> CodeBuffer {
    let mut buf = CodeBuffer::new(base, 4096, endianness);
    for _ in 0..2 {
        buf.put_u32(0x6000_0000).expect("prologue");
    }
    buf
}

/// Append `template` and return the site of its last word.
pub fn emit_idiom(buf: &mut CodeBuffer, template: &[u32]) -> PatchSite {
    for word in template {
        buf.put_u32(*word).expect("idiom");
    }
    PatchSite::new(buf.cursor() - 4)
}

/// Instruction words of the idiom ending at `site`.
pub fn idiom_words(buf: &CodeBuffer, site: PatchSite, len: usize) -> Vec<u32> {
    let start = site.offset() + 4 - len * 4;
    (0..len)
        .map(|i| buf.read_u32(start + i * 4).expect("word"))
        .collect()
}

/// Small deterministic xorshift generator for address sweeps.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}
