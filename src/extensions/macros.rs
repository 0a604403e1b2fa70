//! FFI export generation for native extension crates.

/// Declare a type as the entry point of a native extension archive.
///
/// Expands to the three exports the native loader resolves when it opens
/// the archive's namespace:
///
/// - `exthost_abi_version` — the contract check
/// - `exthost_manifest` — the flat key/value manifest text, naming
///   `exthost_extension_entry` as its `entry-point`
/// - `exthost_extension_entry` — the no-argument constructor
///
/// The type must implement `Extension` and `Default`. `name` and `version`
/// must be string literals (they are spliced into the manifest at compile
/// time).
///
/// # Example
///
/// ```ignore
/// // In a crate built with crate-type = ["cdylib"]:
/// use exthost::declare_extension;
/// use exthost::extensions::Extension;
/// use exthost::Result;
///
/// #[derive(Default)]
/// struct Counter {
///     ticks: u64,
/// }
///
/// impl Extension for Counter {
///     fn name(&self) -> &str {
///         "counter"
///     }
///     fn on_enable(&mut self) -> Result<()> {
///         self.ticks += 1;
///         Ok(())
///     }
///     fn on_disable(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// declare_extension!(Counter, name: "counter", version: "1.0.0");
/// ```
#[macro_export]
macro_rules! declare_extension {
    ($ty:ty, name: $name:expr, version: $version:expr $(,)?) => {
        #[no_mangle]
        pub extern "C" fn exthost_abi_version() -> u32 {
            $crate::extensions::ABI_VERSION
        }

        #[no_mangle]
        pub extern "C" fn exthost_manifest() -> *const ::std::os::raw::c_char {
            concat!(
                "entry-point=exthost_extension_entry\n",
                "name=",
                $name,
                "\n",
                "version=",
                $version,
                "\n\0"
            )
            .as_ptr() as *const ::std::os::raw::c_char
        }

        // The fat pointer crosses the boundary between two Rust artifacts
        // built against the same ABI_VERSION; it is never handed to C.
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn exthost_extension_entry() -> *mut dyn $crate::extensions::Extension {
            let instance: Box<dyn $crate::extensions::Extension> =
                Box::new(<$ty as Default>::default());
            Box::into_raw(instance)
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::extensions::types::{Extension, Manifest, ABI_VERSION};
    use std::ffi::CStr;

    #[derive(Default)]
    struct Sample;

    impl Extension for Sample {
        fn name(&self) -> &str {
            "sample"
        }

        fn on_enable(&mut self) -> Result<()> {
            Ok(())
        }

        fn on_disable(&mut self) -> Result<()> {
            Ok(())
        }
    }

    declare_extension!(Sample, name: "sample", version: "0.1.0");

    #[test]
    fn test_generated_abi_version_matches_host() {
        assert_eq!(exthost_abi_version(), ABI_VERSION);
    }

    #[test]
    fn test_generated_manifest_parses_and_validates() {
        let text = unsafe { CStr::from_ptr(exthost_manifest()) }
            .to_str()
            .unwrap();
        let manifest = Manifest::parse(text).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.entry_point, "exthost_extension_entry");
        assert_eq!(manifest.name.as_deref(), Some("sample"));
        assert_eq!(manifest.version.as_deref(), Some("0.1.0"));
    }

    #[test]
    fn test_generated_entry_constructs_an_instance() {
        let raw = exthost_extension_entry();
        assert!(!raw.is_null());
        let instance = unsafe { Box::from_raw(raw) };
        assert_eq!(instance.name(), "sample");
    }
}
