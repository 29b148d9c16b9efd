//! Publication of out-of-line snippet addresses into emitted PowerPC code.

/// Core data types module
pub mod core;

pub mod codegen;
pub mod disasm;
pub mod error;
pub mod logging;

pub use codegen::publisher::{AddressPublisher, Publication, Publisher};
pub use codegen::snippet::WatchedInstanceFieldSnippet;
pub use error::{PublishError, Result};
