//! Native archive loader for `.so`/`.dylib`/`.dll` extension libraries.
//!
//! Each archive is opened in its own `libloading::Library` namespace and
//! must export three symbols, normally generated by `declare_extension!`:
//!
//! - [`MANIFEST_SYMBOL`]: returns the NUL-terminated manifest text
//! - [`ABI_SYMBOL`]: returns the ABI version the archive was built against
//! - the constructor named by the manifest's `entry-point` key, returning
//!   a heap-allocated `*mut dyn Extension`

use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;

use libloading::{Library, Symbol};

use super::super::types::{Extension, Manifest, ABI_SYMBOL, ABI_VERSION, MANIFEST_SYMBOL};
use super::{ArchiveLoader, LoadContext, ValidatedExtension};
use crate::error::{ExtHostError, Result};

/// Loader for native extension archives.
pub struct NativeLoader;

impl NativeLoader {
    /// Create a new native loader.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveLoader for NativeLoader {
    fn archive_extensions(&self) -> &[&str] {
        &["so", "dylib", "dll"]
    }

    fn load(&self, archive: &Path) -> Result<ValidatedExtension> {
        let library = unsafe { Library::new(archive) }
            .map_err(|e| ExtHostError::Instantiation(format!("cannot open archive: {}", e)))?;

        let manifest = read_manifest(&library)?;
        manifest.validate()?;
        check_abi(&library)?;
        let instance = instantiate(&library, &manifest.entry_point)?;

        Ok(ValidatedExtension {
            instance,
            manifest,
            context: LoadContext::isolated(archive.to_path_buf(), library),
        })
    }
}

/// Resolve and parse the manifest resource exported by the archive.
fn read_manifest(library: &Library) -> Result<Manifest> {
    let manifest_fn: Symbol<'_, unsafe extern "C" fn() -> *const c_char> =
        unsafe { library.get(MANIFEST_SYMBOL.as_bytes()) }
            .map_err(|_| ExtHostError::Manifest("no manifest resource found".to_string()))?;

    let ptr = unsafe { manifest_fn() };
    if ptr.is_null() {
        return Err(ExtHostError::Manifest(
            "manifest resource is empty".to_string(),
        ));
    }

    let text = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| ExtHostError::Manifest("manifest text is not valid UTF-8".to_string()))?;

    Manifest::parse(text)
}

/// Verify the archive was built against the host's extension contract.
fn check_abi(library: &Library) -> Result<()> {
    let abi_fn: Symbol<'_, unsafe extern "C" fn() -> u32> =
        unsafe { library.get(ABI_SYMBOL.as_bytes()) }.map_err(|_| {
            ExtHostError::Contract(
                "archive exports no ABI version and does not satisfy the extension contract"
                    .to_string(),
            )
        })?;

    let got = unsafe { abi_fn() };
    if got != ABI_VERSION {
        return Err(ExtHostError::Contract(format!(
            "ABI version {} does not match host version {}",
            got, ABI_VERSION
        )));
    }

    Ok(())
}

/// Resolve the manifest-declared constructor and invoke it.
fn instantiate(library: &Library, entry_point: &str) -> Result<Box<dyn Extension>> {
    let constructor: Symbol<'_, unsafe extern "C" fn() -> *mut dyn Extension> =
        unsafe { library.get(entry_point.as_bytes()) }.map_err(|e| {
            ExtHostError::Instantiation(format!("entry point '{}' not found: {}", entry_point, e))
        })?;

    let raw = unsafe { constructor() };
    if raw.is_null() {
        return Err(ExtHostError::Instantiation(format!(
            "entry point '{}' returned no instance",
            entry_point
        )));
    }

    // Ownership of the instance transfers to the host; it is freed by the
    // normal Box drop when the extension is unloaded.
    Ok(unsafe { Box::from_raw(raw) })
}
