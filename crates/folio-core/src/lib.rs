// crates/folio-core/src/lib.rs
// Folio - include loader and rebind coordination for a static portfolio site
// No browser-only dependencies allowed here (native + WASM compatible)

#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod contact;
pub mod error;
pub mod features;
pub mod host;
pub mod include;
pub mod rebind;
pub mod signal;
pub mod video;

#[cfg(feature = "memory-host")]
pub mod memory;

pub use config::SiteConfig;
pub use error::{ContactError, FetchError, FolioError, IncludeError, Result};
pub use host::{DomEvent, Handler, ListenTarget, NodeKey, PageHost, Query, Timer};
pub use include::{INCLUDES_LOADED_EVENT, IncludeLoader, IncludeReport};
pub use rebind::{BindKey, BindRegistry, Coordinator, Feature, Trigger};
pub use signal::CompletionSignal;
