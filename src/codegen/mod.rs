//! Snippet emission and address publication for the PowerPC back end.
//!
//! The snippet coordinator emits a metadata block, the publisher decides
//! between a TOC slot and an immediate patch, and the patcher rewrites the
//! load-immediate idiom in place.

pub mod idiom;
pub mod observer;
pub mod patcher;
pub mod publisher;
pub mod snippet;
pub mod watched_field;
