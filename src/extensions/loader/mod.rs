//! Archive validation and instantiation.
//!
//! A loader turns one candidate archive file into a live, contract-checked
//! extension instance inside its own isolated execution context. Two
//! implementations share the [`ArchiveLoader`] trait:
//!
//! - **native**: archives are platform dynamic libraries; each is opened in
//!   its own `libloading` namespace and its manifest, ABI version, and
//!   entry-point constructor are resolved as exported symbols.
//! - **builtin**: archives are flat key/value manifest files whose entry
//!   point resolves against factories registered at startup — the loading
//!   mechanism for statically linked hosts, and the deterministic loader
//!   the test suite drives the lifecycle with.
//!
//! A loader either returns a fully instantiated extension or an error with
//! nothing registered and nothing left loaded; partial results do not
//! exist.

pub mod builtin;
pub mod native;

pub use builtin::BuiltinLoader;
pub use native::NativeLoader;

use std::path::{Path, PathBuf};

use super::types::{Extension, Manifest};
use crate::error::Result;

/// An isolated execution context scoped to one archive.
///
/// The context owns every symbol and resource the archive introduced: for
/// native archives that is the `libloading::Library` handle, so two
/// archives with colliding internal names never interfere. Discarding the
/// context is the unload operation's main side effect — dropping the
/// library handle retires the archive's namespace. Builtin archives are
/// statically linked and own no library; their context carries only the
/// source-file identity.
#[derive(Debug)]
pub struct LoadContext {
    source: PathBuf,
    library: Option<libloading::Library>,
}

impl LoadContext {
    /// Context owning a dynamically opened library namespace.
    pub fn isolated(source: PathBuf, library: libloading::Library) -> Self {
        Self {
            source,
            library: Some(library),
        }
    }

    /// Context for a statically linked extension.
    pub fn resident(source: PathBuf) -> Self {
        Self {
            source,
            library: None,
        }
    }

    /// The archive file this context was opened for. This is the explicit
    /// id-to-file correlation the lifecycle controller uses; no name
    /// matching is involved.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether the context owns a dynamic library namespace.
    pub fn is_isolated(&self) -> bool {
        self.library.is_some()
    }
}

/// A successfully validated and instantiated extension, ready for the
/// lifecycle controller to register.
pub struct ValidatedExtension {
    /// The live instance. Must be dropped before `context`, which owns the
    /// code it runs.
    pub instance: Box<dyn Extension>,

    /// The manifest the archive declared itself with.
    pub manifest: Manifest,

    /// The isolation context owning the archive's namespace.
    pub context: LoadContext,
}

/// The "resolve an entry point by name within an isolated namespace"
/// capability.
///
/// Implementations perform the full validation pipeline for one candidate
/// archive: open the isolated context, locate and parse the manifest
/// resource, verify the extension contract, and instantiate the declared
/// entry point with no arguments. Every failure is returned as an error
/// the caller treats as a non-fatal, per-candidate validation failure.
pub trait ArchiveLoader: Send {
    /// File extensions that mark candidate archives for this loader.
    fn archive_extensions(&self) -> &[&str];

    /// Validate and instantiate one candidate archive.
    fn load(&self, archive: &Path) -> Result<ValidatedExtension>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_context_has_no_library() {
        let ctx = LoadContext::resident(PathBuf::from("/tmp/sample.ext"));
        assert!(!ctx.is_isolated());
        assert_eq!(ctx.source(), Path::new("/tmp/sample.ext"));
    }
}
