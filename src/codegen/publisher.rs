//! Address publisher: choose where a snippet address goes and write it.
//!
//! Selection order:
//! 1. wide target with a usable TOC slot: store the address in the TOC;
//! 2. otherwise, if a materialization idiom was recorded, patch it;
//! 3. otherwise publish nothing. An unreferenced snippet is not an error.

use serde::{Deserialize, Serialize};
use tracing::{enabled, trace, Level};

use crate::codegen::idiom::{MaterializationIdiom, PatchSite};
use crate::codegen::patcher::patch_idiom;
use crate::core::address::{HighPart, SnippetAddress};
use crate::core::buffer::CodeBuffer;
use crate::core::target::{AddressingWidth, TargetConfig};
use crate::core::toc::{TableOfConstants, TocIndex};
use crate::disasm::render_words;
use crate::error::{PublishError, Result};

/// Publication path picked for one snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPath {
    ConstantPool(TocIndex),
    Patch(PatchSite),
    Skip,
}

/// What a publish call actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Publication {
    /// Address stored in a TOC slot
    ConstantPool { index: TocIndex },
    /// Address patched into `words` immediates of the idiom at `site`
    Patched { site: PatchSite, words: usize },
    /// No publication target was configured
    Unpublished,
}

/// Pick the publication path. Total and side-effect free.
pub fn select_path(
    width: AddressingWidth,
    slot: Option<TocIndex>,
    site: Option<PatchSite>,
) -> PublishPath {
    match (slot, site) {
        (Some(index), _) if width.is_wide() && !index.is_full() => PublishPath::ConstantPool(index),
        (_, Some(site)) => PublishPath::Patch(site),
        _ => PublishPath::Skip,
    }
}

/// Publishes a snippet address into the location arranged for it.
pub trait Publisher {
    /// Target the publisher was configured for.
    fn target(&self) -> &TargetConfig;

    fn publish(
        &mut self,
        buffer: &mut CodeBuffer,
        address: SnippetAddress,
        slot: Option<TocIndex>,
        site: Option<PatchSite>,
    ) -> Result<Publication>;
}

/// Publisher bound to one compilation unit's TOC and high-part rule.
pub struct AddressPublisher<'a> {
    target: TargetConfig,
    toc: &'a mut dyn TableOfConstants,
    high: &'a dyn HighPart,
}

impl<'a> AddressPublisher<'a> {
    pub fn new(
        target: TargetConfig,
        toc: &'a mut dyn TableOfConstants,
        high: &'a dyn HighPart,
    ) -> Self {
        Self { target, toc, high }
    }

    fn trace_idiom(&self, buffer: &CodeBuffer, idiom: &MaterializationIdiom) {
        let Some(range) = idiom.byte_range() else {
            return;
        };
        let Some(bytes) = buffer.bytes().get(range.clone()) else {
            return;
        };
        match render_words(&self.target, bytes, buffer.address_at(range.start)) {
            Ok(lines) => {
                for line in lines {
                    trace!(shape = idiom.shape().name, "{}", line);
                }
            }
            Err(e) => trace!(error = %e, "could not render patched idiom"),
        }
    }
}

impl Publisher for AddressPublisher<'_> {
    fn target(&self) -> &TargetConfig {
        &self.target
    }

    fn publish(
        &mut self,
        buffer: &mut CodeBuffer,
        address: SnippetAddress,
        slot: Option<TocIndex>,
        site: Option<PatchSite>,
    ) -> Result<Publication> {
        let width = self.target.width;
        if address.width() != width {
            return Err(PublishError::WidthMismatch {
                address: address.value(),
                expected: width,
                found: address.width(),
            });
        }
        match select_path(width, slot, site) {
            PublishPath::ConstantPool(index) => {
                self.toc.set_slot(index, address.value())?;
                Ok(Publication::ConstantPool { index })
            }
            PublishPath::Patch(site) => {
                let idiom = MaterializationIdiom::for_width(site, width);
                let words = patch_idiom(buffer, &idiom, address.value(), width, self.high)?;
                if enabled!(Level::TRACE) {
                    self.trace_idiom(buffer, &idiom);
                }
                Ok(Publication::Patched { site, words })
            }
            PublishPath::Skip => Ok(Publication::Unpublished),
        }
    }
}
