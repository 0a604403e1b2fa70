//! Registry facade binding the lifecycle controller to one fixed directory.
//!
//! The original design here would be a process-wide singleton; this crate
//! instead ships an explicit context object constructed once at process
//! startup and threaded through to whatever needs it (command handlers,
//! the maintenance tick). Same fixed directory binding, same operation
//! set, no ambient global state, and dropping it at process exit reclaims
//! everything — there is no explicit teardown.

use std::path::{Path, PathBuf};

use tracing::error;
use uuid::Uuid;

use super::loader::{ArchiveLoader, NativeLoader};
use super::manager::{ExtensionManager, LoadedExtension, UpdateReport};
use crate::error::Result;

/// Default name of the watched directory.
pub const DEFAULT_DIRECTORY: &str = "extensions";

/// The operator-facing entry point for extension management.
///
/// Wraps one [`ExtensionManager`] bound to one directory. The facade's
/// update path additionally enables whatever the update loaded or
/// reloaded, so an archive dropped into the directory at runtime becomes
/// active after the next update pass.
pub struct ExtensionRegistry {
    manager: ExtensionManager,
}

impl ExtensionRegistry {
    /// Create a registry over `directory` using the given loader.
    pub fn new(directory: impl Into<PathBuf>, loader: Box<dyn ArchiveLoader>) -> Self {
        Self {
            manager: ExtensionManager::new(directory, loader),
        }
    }

    /// Create a registry loading native archives from `directory`.
    pub fn native(directory: impl Into<PathBuf>) -> Self {
        Self::new(directory, Box::new(NativeLoader::new()))
    }

    /// Load and enable all extensions currently in the directory.
    pub fn init(&mut self) -> Result<()> {
        self.manager.load_all()
    }

    /// Detect and apply archive changes, then enable everything the
    /// update loaded or reloaded.
    pub fn update_extensions(&mut self) -> Result<UpdateReport> {
        let report = self.manager.update_all()?;
        for id in report.loaded.iter().chain(report.reloaded.iter()) {
            if let Err(e) = self.manager.enable_by_id(*id) {
                error!(extension = %id, error = %e, "Extension on_enable hook failed");
            }
        }
        Ok(report)
    }

    /// Reload one modified archive by extension id, enabling the
    /// replacement instance. No-op if the id is unknown or its archive is
    /// unmodified.
    pub fn update_extension_by_id(&mut self, id: Uuid) -> Result<()> {
        if let Some(new_id) = self.manager.update_extension_by_id(id)? {
            if let Err(e) = self.manager.enable_by_id(new_id) {
                error!(extension = %new_id, error = %e, "Extension on_enable hook failed");
            }
        }
        Ok(())
    }

    /// Enable an extension by id. A missing id is a silent no-op.
    pub fn enable_by_id(&mut self, id: Uuid) -> Result<()> {
        self.manager.enable_by_id(id)
    }

    /// Disable an extension by id. A missing id is a silent no-op.
    pub fn disable_by_id(&mut self, id: Uuid) -> Result<()> {
        self.manager.disable_by_id(id)
    }

    /// Enable every loaded extension.
    pub fn enable_all(&mut self) {
        self.manager.enable_all()
    }

    /// Disable every loaded extension.
    pub fn disable_all(&mut self) {
        self.manager.disable_all()
    }

    /// Unload an extension by id. A missing id is a silent no-op.
    pub fn unload(&mut self, id: Uuid) {
        self.manager.unload(id)
    }

    /// Number of loaded extensions, regardless of status.
    pub fn size(&self) -> usize {
        self.manager.size()
    }

    /// Look up a loaded extension by id.
    pub fn get(&self, id: Uuid) -> Option<&LoadedExtension> {
        self.manager.get(id)
    }

    /// Iterate over all loaded extensions.
    pub fn extensions(&self) -> impl Iterator<Item = &LoadedExtension> {
        self.manager.extensions()
    }

    /// The watched directory this registry is bound to.
    pub fn directory(&self) -> &Path {
        self.manager.directory()
    }
}
