//! Watched instance field snippet: emit the metadata block, then publish
//! its address to the code that loads it.

use tracing::debug_span;

use crate::codegen::idiom::PatchSite;
use crate::codegen::observer::{PublishEvent, PublishObserver};
use crate::codegen::publisher::Publisher;
use crate::codegen::watched_field::{MetadataEmitter, WatchedInstanceFieldData};
use crate::core::address::SnippetAddress;
use crate::core::buffer::CodeBuffer;
use crate::core::toc::TocIndex;
use crate::error::{PublishError, Result};

/// Out-of-line metadata snippet for one watched field access.
#[derive(Debug, Clone)]
pub struct WatchedInstanceFieldSnippet<E = WatchedInstanceFieldData> {
    metadata: E,
    toc_index: Option<TocIndex>,
    lower_instruction: Option<PatchSite>,
}

impl<E: MetadataEmitter> WatchedInstanceFieldSnippet<E> {
    pub fn new(metadata: E) -> Self {
        Self {
            metadata,
            toc_index: None,
            lower_instruction: None,
        }
    }

    /// TOC slot reserved for the snippet address.
    pub fn with_toc_index(mut self, index: TocIndex) -> Self {
        self.toc_index = Some(index);
        self
    }

    /// Anchor of the idiom that materializes the snippet address.
    pub fn with_lower_instruction(mut self, site: PatchSite) -> Self {
        self.lower_instruction = Some(site);
        self
    }

    pub fn toc_index(&self) -> Option<TocIndex> {
        self.toc_index
    }

    pub fn lower_instruction(&self) -> Option<PatchSite> {
        self.lower_instruction
    }

    /// Emit the snippet body and publish its address.
    ///
    /// Layout follows the publisher's target. Returns the cursor just past
    /// the metadata block. Publication only rewrites bytes emitted earlier,
    /// so the cursor is the same one the metadata emitter returned.
    pub fn emit_snippet_body<P: Publisher + ?Sized>(
        &self,
        buffer: &mut CodeBuffer,
        publisher: &mut P,
        observer: Option<&mut dyn PublishObserver>,
    ) -> Result<usize> {
        let target = *publisher.target();
        let span = debug_span!("emit_snippet_body", width = %target.width);
        let _guard = span.enter();

        let cursor = self.metadata.emit_metadata(buffer, &target)?;
        let length = self.metadata.metadata_length(&target);
        let start = cursor
            .checked_sub(length)
            .ok_or(PublishError::MetadataUnderflow { cursor, length })?;

        let address = SnippetAddress::new(buffer.address_at(start), target.width)?;
        let publication =
            publisher.publish(buffer, address, self.toc_index, self.lower_instruction)?;

        if let Some(observer) = observer {
            observer.on_publish(&PublishEvent {
                address: address.value(),
                publication,
            });
        }

        Ok(start + length)
    }
}
