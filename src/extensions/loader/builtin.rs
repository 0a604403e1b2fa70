//! Build-time extension factories for statically linked hosts.
//!
//! On targets where dynamic loading is unavailable or unwanted, extensions
//! are compiled into the host and register a factory against their
//! entry-point name at startup. An archive is then just the manifest text
//! itself, in a `.ext` file inside the watched directory; its `entry-point`
//! key selects the registered factory. Change detection, reload, and the
//! whole lifecycle behave exactly as with native archives — only the
//! instantiation step differs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::super::types::{Extension, Manifest};
use super::{ArchiveLoader, LoadContext, ValidatedExtension};
use crate::error::{ExtHostError, Result};

/// Factory constructing one extension instance with no arguments.
pub type ExtensionFactory = Box<dyn Fn() -> Box<dyn Extension> + Send + Sync>;

/// Loader resolving entry points against startup-registered factories.
///
/// # Example
///
/// ```no_run
/// use exthost::extensions::{BuiltinLoader, Extension};
/// use exthost::Result;
///
/// struct Greeter;
///
/// impl Extension for Greeter {
///     fn name(&self) -> &str {
///         "greeter"
///     }
///     fn on_enable(&mut self) -> Result<()> {
///         Ok(())
///     }
///     fn on_disable(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut loader = BuiltinLoader::new();
/// loader.register("greeter", || Box::new(Greeter)).unwrap();
/// ```
pub struct BuiltinLoader {
    /// Map from entry-point name to its factory.
    factories: HashMap<String, ExtensionFactory>,
}

impl BuiltinLoader {
    /// Create a new loader with no registered factories.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under an entry-point name.
    ///
    /// # Returns
    /// `Ok(())` on success, or `ExtHostError::Config` if the name is
    /// already taken — factories are identities, silently replacing one
    /// would let two archives claim the same entry point.
    pub fn register<F>(&mut self, entry_point: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        let entry_point = entry_point.into();
        if self.factories.contains_key(&entry_point) {
            return Err(ExtHostError::Config(format!(
                "entry point '{}' is already registered",
                entry_point
            )));
        }
        self.factories.insert(entry_point, Box::new(factory));
        Ok(())
    }

    /// Whether a factory is registered under this entry-point name.
    pub fn is_registered(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }

    /// Number of registered factories.
    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }
}

impl Default for BuiltinLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveLoader for BuiltinLoader {
    fn archive_extensions(&self) -> &[&str] {
        &["ext"]
    }

    fn load(&self, archive: &Path) -> Result<ValidatedExtension> {
        let text = fs::read_to_string(archive)
            .map_err(|e| ExtHostError::Manifest(format!("cannot read manifest: {}", e)))?;

        let manifest = Manifest::parse(&text)?;
        manifest.validate()?;

        let factory = self.factories.get(&manifest.entry_point).ok_or_else(|| {
            ExtHostError::Instantiation(format!(
                "entry point '{}' is not registered",
                manifest.entry_point
            ))
        })?;

        // Contract satisfaction is static here: a factory can only produce
        // a Box<dyn Extension>.
        let instance = factory();

        Ok(ValidatedExtension {
            instance,
            manifest,
            context: LoadContext::resident(archive.to_path_buf()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use tempfile::TempDir;

    struct Probe;

    impl Extension for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn on_enable(&mut self) -> Result<()> {
            Ok(())
        }

        fn on_disable(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn loader_with_probe() -> BuiltinLoader {
        let mut loader = BuiltinLoader::new();
        loader.register("probe", || Box::new(Probe)).unwrap();
        loader
    }

    #[test]
    fn test_register_and_query() {
        let loader = loader_with_probe();
        assert!(loader.is_registered("probe"));
        assert!(!loader.is_registered("other"));
        assert_eq!(loader.factory_count(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut loader = loader_with_probe();
        let result = loader.register("probe", || Box::new(Probe));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("already registered"));
        assert_eq!(loader.factory_count(), 1);
    }

    #[test]
    fn test_load_valid_archive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("probe.ext");
        std::fs::write(&path, "entry-point=probe\nname=probe\n").unwrap();

        let loader = loader_with_probe();
        let validated = loader.load(&path).unwrap();
        assert_eq!(validated.instance.name(), "probe");
        assert_eq!(validated.manifest.entry_point, "probe");
        assert_eq!(validated.context.source(), path.as_path());
        assert!(!validated.context.is_isolated());
    }

    #[test]
    fn test_load_missing_archive_is_a_manifest_error() {
        let loader = loader_with_probe();
        let result = loader.load(Path::new("/nonexistent/probe.ext"));
        assert!(matches!(result, Err(ExtHostError::Manifest(_))));
    }

    #[test]
    fn test_load_archive_without_entry_point_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.ext");
        std::fs::write(&path, "name=broken\n").unwrap();

        let loader = loader_with_probe();
        let result = loader.load(&path);
        assert!(matches!(result, Err(ExtHostError::Manifest(_))));
    }

    #[test]
    fn test_load_unregistered_entry_point() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stranger.ext");
        std::fs::write(&path, "entry-point=stranger\n").unwrap();

        let loader = loader_with_probe();
        let result = loader.load(&path);
        assert!(matches!(result, Err(ExtHostError::Instantiation(_))));
    }
}
