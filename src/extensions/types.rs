//! Extension contract and core data types.
//!
//! This module defines the capability contract every extension satisfies,
//! the status an extension moves through over its life, and the manifest
//! resource an archive declares itself with.

use regex::Regex;

use crate::error::{ExtHostError, Result};

/// ABI version for native archive loading.
///
/// Incremented when breaking changes are made to the extension interface.
/// A native archive whose exported ABI version differs is rejected as not
/// satisfying the extension contract.
pub const ABI_VERSION: u32 = 1;

/// Symbol a native archive exports to return its manifest text.
///
/// Signature: `extern "C" fn() -> *const c_char`, NUL-terminated flat
/// key/value text. `declare_extension!` generates this export.
pub const MANIFEST_SYMBOL: &str = "exthost_manifest";

/// Symbol a native archive exports to return its ABI version.
///
/// Signature: `extern "C" fn() -> u32`.
pub const ABI_SYMBOL: &str = "exthost_abi_version";

/// The capability contract for a runtime-loaded extension.
///
/// An extension is the unit of independently versioned, independently
/// reloadable behavior inside the host. Hooks return `Result` so a
/// misbehaving extension can be reported without taking the rest of an
/// update batch down with it: bulk operations log a hook error and move
/// on, id-keyed operations propagate it to the caller. On a hook error
/// the status transition that would have followed does not happen.
pub trait Extension: Send {
    /// Display label for the extension. Not a unique key.
    fn name(&self) -> &str;

    /// One-time initialization, invoked exactly once per instance,
    /// directly after successful instantiation.
    fn on_load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Activates behavior. May be called multiple times over the
    /// instance's life; there is no built-in idempotence guard.
    fn on_enable(&mut self) -> Result<()>;

    /// Deactivates behavior, symmetric to [`Extension::on_enable`].
    fn on_disable(&mut self) -> Result<()>;
}

/// The status of a loaded extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionStatus {
    /// Loaded but not currently active.
    #[default]
    Disabled,
    /// Active.
    Enabled,
    /// Backing archive has changed on disk; the instance is about to be
    /// retired by the reload path.
    Outdated,
}

impl std::fmt::Display for ExtensionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled => write!(f, "enabled"),
            Self::Outdated => write!(f, "outdated"),
        }
    }
}

/// The manifest resource an archive declares itself with.
///
/// Flat key/value text: one `key=value` pair per line, `#` starts a
/// comment, blank lines are ignored, unknown keys are tolerated. The
/// required `entry-point` key names the constructor the loader resolves
/// inside the archive's namespace.
///
/// # Example
///
/// ```text
/// # counter extension
/// entry-point=exthost_extension_entry
/// name=counter
/// version=1.2.0
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Name of the entry-point constructor to resolve and invoke.
    pub entry_point: String,

    /// Optional display name declared by the archive.
    pub name: Option<String>,

    /// Optional version string. Informational only; the host performs no
    /// compatibility checks beyond manifest presence.
    pub version: Option<String>,
}

impl Manifest {
    /// Parse manifest text into a [`Manifest`].
    ///
    /// # Errors
    /// - `ExtHostError::Manifest` if a non-comment line has no `=`
    ///   separator, or if the required `entry-point` key is missing.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entry_point = None;
        let mut name = None;
        let mut version = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ExtHostError::Manifest(format!("malformed manifest line: '{}'", line))
            })?;

            match key.trim() {
                "entry-point" => entry_point = Some(value.trim().to_string()),
                "name" => name = Some(value.trim().to_string()),
                "version" => version = Some(value.trim().to_string()),
                // Unknown keys are tolerated for forward compatibility.
                _ => {}
            }
        }

        let entry_point = entry_point
            .ok_or_else(|| ExtHostError::Manifest("missing 'entry-point' key".to_string()))?;

        Ok(Self {
            entry_point,
            name,
            version,
        })
    }

    /// Validate manifest field values.
    ///
    /// Performs the following checks:
    /// - `entry-point` must be a resolvable symbol name: 1-128 characters,
    ///   alphanumeric and underscores only, not starting with a digit
    /// - `name`, if present, must be 1-64 characters, alphanumeric and
    ///   hyphens only, starting with an alphanumeric character
    ///
    /// # Returns
    /// `Ok(())` if valid, or `ExtHostError::Manifest` describing the
    /// violation.
    pub fn validate(&self) -> Result<()> {
        let entry_re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]{0,127}$").unwrap();
        if !entry_re.is_match(&self.entry_point) {
            return Err(ExtHostError::Manifest(format!(
                "invalid entry-point '{}': must be 1-128 alphanumeric characters and underscores, not starting with a digit",
                self.entry_point
            )));
        }

        if let Some(name) = &self.name {
            let name_re = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-]{0,63}$").unwrap();
            if !name_re.is_match(name) {
                return Err(ExtHostError::Manifest(format!(
                    "invalid extension name '{}': must be 1-64 alphanumeric characters and hyphens, starting with alphanumeric",
                    name
                )));
            }
        }

        Ok(())
    }
}
