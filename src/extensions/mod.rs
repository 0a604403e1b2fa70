//! Extension system for ExtHost
//!
//! This module manages runtime-loaded, independently versioned extensions
//! inside a long-running host process: archives in a watched directory are
//! discovered, validated, instantiated in isolated contexts, and carried
//! through the load/enable/disable/unload lifecycle — including hot reload
//! when an archive changes on disk — without restarting the host.
//!
//! # Architecture
//!
//! - **types**: the `Extension` capability contract, statuses, and the
//!   manifest resource
//! - **scanner**: change detection — new / modified / removed / unchanged
//!   classification against recorded modification times
//! - **loader**: archive validation and instantiation behind the
//!   `ArchiveLoader` trait (`NativeLoader` for dynamic libraries,
//!   `BuiltinLoader` for startup-registered factories)
//! - **manager**: the lifecycle controller owning the extension and
//!   timestamp tables and the batch update algorithm
//! - **registry**: the operator-facing facade binding one controller to
//!   one fixed directory
//! - **macros**: `declare_extension!`, the FFI exports a native extension
//!   crate generates
//!
//! # Directory layout
//!
//! ```text
//! extensions/
//! ├── counter.so        # native archive (cdylib built with declare_extension!)
//! ├── greeter.dylib
//! └── sample.ext        # builtin archive: manifest text naming a factory
//! ```
//!
//! # Example manifest
//!
//! ```text
//! entry-point=exthost_extension_entry
//! name=counter
//! version=1.0.0
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use exthost::extensions::ExtensionRegistry;
//!
//! let mut registry = ExtensionRegistry::native("extensions");
//! registry.init().unwrap();
//!
//! // Later, from a periodic maintenance tick:
//! let report = registry.update_extensions().unwrap();
//! println!(
//!     "{} loaded, {} reloaded, {} removed, {} total",
//!     report.loaded.len(),
//!     report.reloaded.len(),
//!     report.removed.len(),
//!     registry.size()
//! );
//! ```

pub mod loader;
mod macros;
mod manager;
mod registry;
mod scanner;
pub mod types;

pub use loader::{ArchiveLoader, BuiltinLoader, LoadContext, NativeLoader, ValidatedExtension};
pub use manager::{ExtensionManager, LoadedExtension, UpdateReport};
pub use registry::{ExtensionRegistry, DEFAULT_DIRECTORY};
pub use scanner::{scan, ScanReport};
pub use types::{
    Extension, ExtensionStatus, Manifest, ABI_SYMBOL, ABI_VERSION, MANIFEST_SYMBOL,
};
