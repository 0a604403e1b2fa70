//! Scan command — one-shot load and report of the extensions directory.

use std::path::PathBuf;

use anyhow::{Context, Result};

use exthost::extensions::ExtensionRegistry;
use exthost::Config;

pub(crate) fn cmd_scan(dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let dir = dir.unwrap_or_else(|| config.extensions_dir());

    let mut registry = ExtensionRegistry::native(&dir);
    registry
        .init()
        .with_context(|| format!("Failed to load extensions from {:?}", dir))?;

    println!("{} extension(s) in {}", registry.size(), dir.display());
    for record in registry.extensions() {
        println!("  {}  {:<24} {}", record.id(), record.name(), record.status());
    }

    Ok(())
}
