//! Core data types for snippet address publication.
//!
//! Target configuration, snippet addresses with their high/low split, the
//! code buffer being finalized and the Table of Constants.

pub mod address;
pub mod buffer;
pub mod target;
pub mod toc;
