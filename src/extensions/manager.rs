//! Lifecycle controller for loaded extensions.
//!
//! The [`ExtensionManager`] owns the authoritative tables — extension
//! records keyed by id, and source timestamps keyed by archive path — and
//! orchestrates load, enable, disable, unload, and the batch update
//! algorithm. All operations run to completion synchronously on the
//! calling thread; every mutating operation takes `&mut self`, so the
//! no-concurrent-callers contract is enforced by the borrow checker rather
//! than by locks.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::loader::{ArchiveLoader, LoadContext};
use super::scanner::{self, ScanReport};
use super::types::{Extension, ExtensionStatus};
use crate::error::Result;

/// A loaded extension: the live instance plus its identity, status, and
/// isolation context.
///
/// Exactly one record exists per loaded extension. The id is assigned at
/// instantiation and never reused — reloading an archive produces a new
/// record with a new id.
pub struct LoadedExtension {
    id: Uuid,
    name: String,
    status: ExtensionStatus,
    // Field order is load-bearing: `instance` must drop before `context`,
    // which owns the code the instance runs.
    instance: Box<dyn Extension>,
    context: LoadContext,
}

impl LoadedExtension {
    fn new(instance: Box<dyn Extension>, context: LoadContext) -> Self {
        let name = instance.name().to_string();
        Self {
            id: Uuid::new_v4(),
            name,
            status: ExtensionStatus::Disabled,
            instance,
            context,
        }
    }

    /// Unique identifier, immutable for the instance's lifetime.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Display label. Not a unique key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ExtensionStatus {
        self.status
    }

    /// The archive file this extension was instantiated from.
    pub fn source(&self) -> &Path {
        self.context.source()
    }

    /// The only sanctioned status mutation. No state-machine validation is
    /// performed; callers are trusted to pair enable/disable correctly.
    pub fn update_status(&mut self, new_status: ExtensionStatus) {
        self.status = new_status;
    }
}

/// What a batch update changed.
///
/// The controller reports ids rather than acting on them so the caller
/// chooses the enable state of freshly (re)loaded extensions.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Extensions loaded from archives new to this scan.
    pub loaded: Vec<Uuid>,

    /// Fresh instances replacing modified archives.
    pub reloaded: Vec<Uuid>,

    /// Archives whose extensions were retired because the file is gone.
    pub removed: Vec<PathBuf>,
}

impl UpdateReport {
    /// Whether the update changed nothing.
    pub fn is_quiet(&self) -> bool {
        self.loaded.is_empty() && self.reloaded.is_empty() && self.removed.is_empty()
    }
}

/// The lifecycle controller.
///
/// Binds one watched directory to one [`ArchiveLoader`] and owns every
/// extension loaded from it.
pub struct ExtensionManager {
    directory: PathBuf,
    loader: Box<dyn ArchiveLoader>,
    extensions: HashMap<Uuid, LoadedExtension>,
    timestamps: HashMap<PathBuf, SystemTime>,
}

impl ExtensionManager {
    /// Create a controller for `directory`, loading archives with `loader`.
    pub fn new(directory: impl Into<PathBuf>, loader: Box<dyn ArchiveLoader>) -> Self {
        Self {
            directory: directory.into(),
            loader,
            extensions: HashMap::new(),
            timestamps: HashMap::new(),
        }
    }

    /// The watched directory this controller is bound to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load every currently-new archive, then enable everything loaded.
    ///
    /// Invalid archives are skipped with a warning; the batch never aborts
    /// on a bad candidate.
    pub fn load_all(&mut self) -> Result<()> {
        let scan = self.scan()?;
        for archive in &scan.new {
            self.load_archive(archive);
        }
        info!(total = self.size(), "Total extensions loaded");
        self.enable_all();
        Ok(())
    }

    /// Detect and apply archive changes: removed, then modified, then new.
    ///
    /// All three phases consume one scan snapshot, so a rename seen as
    /// remove-plus-add within a single scan can never hold two active
    /// instances claiming the same archive. Newly loaded and reloaded
    /// extensions are left disabled; their ids are reported so the caller
    /// chooses their enable state.
    pub fn update_all(&mut self) -> Result<UpdateReport> {
        info!("Checking for extension updates");
        let scan = self.scan()?;
        let mut report = UpdateReport::default();

        for archive in &scan.removed {
            if self.remove_archive(archive) {
                report.removed.push(archive.clone());
            }
        }
        for archive in &scan.modified {
            if let Some(id) = self.reload_archive(archive) {
                report.reloaded.push(id);
            }
        }
        for archive in &scan.new {
            if let Some(id) = self.load_archive(archive) {
                report.loaded.push(id);
            }
        }

        info!(
            loaded = report.loaded.len(),
            reloaded = report.reloaded.len(),
            removed = report.removed.len(),
            "Extension update check completed"
        );
        Ok(report)
    }

    /// Enable an extension by id. A missing id is a silent no-op.
    ///
    /// # Errors
    /// Propagates the extension's `on_enable` error; the status transition
    /// does not happen in that case.
    pub fn enable_by_id(&mut self, id: Uuid) -> Result<()> {
        if let Some(record) = self.extensions.get_mut(&id) {
            record.instance.on_enable()?;
            record.update_status(ExtensionStatus::Enabled);
        }
        Ok(())
    }

    /// Disable an extension by id. A missing id is a silent no-op.
    ///
    /// # Errors
    /// Propagates the extension's `on_disable` error; the status transition
    /// does not happen in that case.
    pub fn disable_by_id(&mut self, id: Uuid) -> Result<()> {
        if let Some(record) = self.extensions.get_mut(&id) {
            record.instance.on_disable()?;
            record.update_status(ExtensionStatus::Disabled);
        }
        Ok(())
    }

    /// Enable every loaded extension, irrespective of current status.
    ///
    /// A hook failure is logged for the offending extension and the batch
    /// continues; the failed extension keeps its previous status.
    pub fn enable_all(&mut self) {
        for (id, record) in self.extensions.iter_mut() {
            match record.instance.on_enable() {
                Ok(()) => record.update_status(ExtensionStatus::Enabled),
                Err(e) => error!(extension = %id, error = %e, "Extension on_enable hook failed"),
            }
        }
    }

    /// Disable every loaded extension, irrespective of current status.
    ///
    /// Hook failures are logged per extension; the batch continues.
    pub fn disable_all(&mut self) {
        for (id, record) in self.extensions.iter_mut() {
            match record.instance.on_disable() {
                Ok(()) => record.update_status(ExtensionStatus::Disabled),
                Err(e) => error!(extension = %id, error = %e, "Extension on_disable hook failed"),
            }
        }
    }

    /// Unload an extension: `on_disable` defensively if still enabled,
    /// then remove it from both tables. A missing id is a silent no-op.
    ///
    /// Dropping the record drops the instance and then its isolation
    /// context, which is what actually retires the archive's namespace.
    pub fn unload(&mut self, id: Uuid) {
        let Some(mut record) = self.extensions.remove(&id) else {
            return;
        };

        if record.status() == ExtensionStatus::Enabled {
            if let Err(e) = record.instance.on_disable() {
                error!(extension = %id, error = %e, "Extension on_disable hook failed");
            }
        }

        self.timestamps.remove(record.source());
        info!(extension = %id, name = %record.name(), "Unloaded extension");
    }

    /// Reload the one modified archive correlated with `id`, alone.
    ///
    /// No-op if the id is unknown or its archive has not been modified.
    /// Returns the replacement extension's id when a reload happened.
    pub fn update_extension_by_id(&mut self, id: Uuid) -> Result<Option<Uuid>> {
        let Some(source) = self
            .extensions
            .get(&id)
            .map(|record| record.source().to_path_buf())
        else {
            return Ok(None);
        };

        let scan = self.scan()?;
        if scan.modified.contains(&source) {
            Ok(self.reload_archive(&source))
        } else {
            Ok(None)
        }
    }

    /// Number of loaded extensions, regardless of enabled/disabled status.
    pub fn size(&self) -> usize {
        self.extensions.len()
    }

    /// Look up a loaded extension by id.
    pub fn get(&self, id: Uuid) -> Option<&LoadedExtension> {
        self.extensions.get(&id)
    }

    /// Iterate over all loaded extensions.
    pub fn extensions(&self) -> impl Iterator<Item = &LoadedExtension> {
        self.extensions.values()
    }

    fn scan(&self) -> Result<ScanReport> {
        scanner::scan(
            &self.directory,
            &self.timestamps,
            self.loader.archive_extensions(),
        )
    }

    /// Validate, instantiate, and register one archive.
    ///
    /// On any validation failure the candidate is skipped with a warning
    /// and nothing is registered.
    fn load_archive(&mut self, archive: &Path) -> Option<Uuid> {
        let mtime = match fs::metadata(archive).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "Cannot read archive metadata, skipping");
                return None;
            }
        };

        let validated = match self.loader.load(archive) {
            Ok(validated) => validated,
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "Skipping invalid extension archive");
                return None;
            }
        };

        let record = LoadedExtension::new(validated.instance, validated.context);
        let id = record.id();
        self.extensions.insert(id, record);
        self.timestamps.insert(archive.to_path_buf(), mtime);

        // on_load runs exactly once per instance, after registration.
        if let Some(record) = self.extensions.get_mut(&id) {
            if let Err(e) = record.instance.on_load() {
                error!(extension = %id, error = %e, "Extension on_load hook failed");
            }
        }

        info!(extension = %id, archive = %archive.display(), "Loaded extension");
        Some(id)
    }

    /// Retire the extension backed by an archive that no longer exists.
    fn remove_archive(&mut self, archive: &Path) -> bool {
        // The timestamp entry must go regardless of correlation, or the
        // vanished file would be reported as removed on every future scan.
        self.timestamps.remove(archive);

        let Some(id) = self.extension_id_by_source(archive) else {
            return false;
        };

        if self.status_of(id) == Some(ExtensionStatus::Enabled) {
            if let Err(e) = self.disable_by_id(id) {
                error!(extension = %id, error = %e, "Extension on_disable hook failed");
            }
        }
        self.unload(id);
        info!(archive = %archive.display(), "Removed extension");
        true
    }

    /// Retire the old instance of a modified archive, then load the new
    /// content as a fresh load.
    fn reload_archive(&mut self, archive: &Path) -> Option<Uuid> {
        info!(archive = %archive.display(), "Modified extension detected, reloading");

        if let Some(id) = self.extension_id_by_source(archive) {
            let was_enabled = self.status_of(id) == Some(ExtensionStatus::Enabled);
            if let Some(record) = self.extensions.get_mut(&id) {
                record.update_status(ExtensionStatus::Outdated);
            }
            if was_enabled {
                if let Err(e) = self.disable_by_id(id) {
                    error!(extension = %id, error = %e, "Extension on_disable hook failed");
                }
            }
            self.unload(id);
        }

        self.load_archive(archive)
    }

    /// Explicit id-to-file correlation via the source path recorded in
    /// each extension's isolation context.
    fn extension_id_by_source(&self, archive: &Path) -> Option<Uuid> {
        self.extensions
            .iter()
            .find(|(_, record)| record.source() == archive)
            .map(|(id, _)| *id)
    }

    fn status_of(&self, id: Uuid) -> Option<ExtensionStatus> {
        self.extensions.get(&id).map(|record| record.status())
    }
}
