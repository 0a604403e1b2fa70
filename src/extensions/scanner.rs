//! Source scanning and change detection for extension archives.
//!
//! The scanner enumerates candidate archive files in the watched directory
//! and classifies them against the previously recorded timestamp table into
//! four disjoint sets: new, modified, removed, and unchanged. Classification
//! is pure change detection; acting on the sets is the lifecycle
//! controller's job.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::error::Result;

/// The result of scanning the watched directory.
///
/// The four sets are disjoint by construction: a file present on disk is
/// either *new* (absent from the timestamp table), *modified* (recorded,
/// with a strictly newer modification time), or *unchanged*; a recorded
/// file absent from disk is *removed*. Vectors are sorted so iteration and
/// logging are deterministic.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Present on disk, absent from the timestamp table.
    pub new: Vec<PathBuf>,

    /// Present in both, current modification time strictly greater than
    /// the recorded one.
    pub modified: Vec<PathBuf>,

    /// Present in the timestamp table, absent from disk.
    pub removed: Vec<PathBuf>,

    /// Present in both with no newer modification time.
    pub unchanged: Vec<PathBuf>,
}

impl ScanReport {
    /// Whether the scan found nothing to act on.
    pub fn is_quiet(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Scan `dir` for archive files and classify them against `known`.
///
/// The directory is created (recursively) if absent; an empty or freshly
/// created directory scans successfully to four empty sets. Only regular
/// files whose extension matches one of `archive_extensions` are
/// candidates. A candidate whose metadata cannot be read is skipped with a
/// warning rather than failing the scan.
///
/// # Arguments
/// * `dir` - The watched directory
/// * `known` - The source timestamp table recorded at load time
/// * `archive_extensions` - File extensions that mark a candidate archive
///
/// # Errors
/// `ExtHostError::Io` if the directory cannot be created or listed.
pub fn scan(
    dir: &Path,
    known: &HashMap<PathBuf, SystemTime>,
    archive_extensions: &[&str],
) -> Result<ScanReport> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let mut report = ScanReport::default();
    let mut present: Vec<PathBuf> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || !is_archive(&path, archive_extensions) {
            continue;
        }

        let mtime = match entry.metadata().and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "Cannot read archive metadata, skipping");
                continue;
            }
        };

        present.push(path.clone());
        match known.get(&path) {
            None => report.new.push(path),
            Some(&recorded) if mtime > recorded => report.modified.push(path),
            Some(_) => report.unchanged.push(path),
        }
    }

    report.removed = known
        .keys()
        .filter(|recorded| !present.contains(*recorded))
        .cloned()
        .collect();

    report.new.sort();
    report.modified.sort();
    report.removed.sort();
    report.unchanged.sort();

    Ok(report)
}

/// Whether a path carries one of the candidate archive extensions.
fn is_archive(path: &Path, archive_extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| archive_extensions.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    const EXTS: &[&str] = &["ext"];

    /// Record every file currently on disk into a timestamp table, the way
    /// the lifecycle controller does after loading.
    fn record_all(dir: &Path) -> HashMap<PathBuf, SystemTime> {
        let report = scan(dir, &HashMap::new(), EXTS).unwrap();
        report
            .new
            .into_iter()
            .map(|path| {
                let mtime = fs::metadata(&path).unwrap().modified().unwrap();
                (path, mtime)
            })
            .collect()
    }

    #[test]
    fn test_scan_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("extensions");
        assert!(!dir.exists());

        let report = scan(&dir, &HashMap::new(), EXTS).unwrap();
        assert!(dir.exists());
        assert!(report.is_quiet());
        assert!(report.unchanged.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let report = scan(tmp.path(), &HashMap::new(), EXTS).unwrap();
        assert!(report.new.is_empty());
        assert!(report.modified.is_empty());
        assert!(report.removed.is_empty());
        assert!(report.unchanged.is_empty());
    }

    #[test]
    fn test_scan_classifies_new_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.ext"), "entry-point=a\n").unwrap();
        fs::write(tmp.path().join("b.ext"), "entry-point=b\n").unwrap();

        let report = scan(tmp.path(), &HashMap::new(), EXTS).unwrap();
        assert_eq!(report.new.len(), 2);
        assert!(report.modified.is_empty());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_scan_ignores_non_archive_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "hello").unwrap();
        fs::write(tmp.path().join("no_extension"), "hello").unwrap();
        fs::create_dir(tmp.path().join("subdir.ext")).unwrap();

        let report = scan(tmp.path(), &HashMap::new(), EXTS).unwrap();
        assert!(report.new.is_empty());
    }

    #[test]
    fn test_rescan_without_changes_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.ext"), "entry-point=a\n").unwrap();
        let known = record_all(tmp.path());

        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert!(report.is_quiet());
        assert_eq!(report.unchanged.len(), 1);
    }

    #[test]
    fn test_scan_detects_modified_on_strictly_newer_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ext");
        fs::write(&path, "entry-point=a\n").unwrap();
        let known = record_all(tmp.path());

        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();

        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert_eq!(report.modified, vec![path]);
        assert!(report.new.is_empty());
        assert!(report.unchanged.is_empty());
    }

    #[test]
    fn test_scan_equal_mtime_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ext");
        fs::write(&path, "entry-point=a\n").unwrap();
        let known = record_all(tmp.path());

        // Pin the mtime to exactly the recorded value; "modified" requires
        // strictly greater.
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(known[&path]).unwrap();

        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert!(report.modified.is_empty());
        assert_eq!(report.unchanged.len(), 1);
    }

    #[test]
    fn test_scan_detects_removed_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ext");
        fs::write(&path, "entry-point=a\n").unwrap();
        let known = record_all(tmp.path());

        fs::remove_file(&path).unwrap();

        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert_eq!(report.removed, vec![path]);
        assert!(report.new.is_empty());
    }

    #[test]
    fn test_sets_are_disjoint_across_mixed_changes() {
        let tmp = TempDir::new().unwrap();
        let kept = tmp.path().join("kept.ext");
        let touched = tmp.path().join("touched.ext");
        let gone = tmp.path().join("gone.ext");
        fs::write(&kept, "entry-point=kept\n").unwrap();
        fs::write(&touched, "entry-point=touched\n").unwrap();
        fs::write(&gone, "entry-point=gone\n").unwrap();
        let known = record_all(tmp.path());

        fs::remove_file(&gone).unwrap();
        let file = File::options().write(true).open(&touched).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        let added = tmp.path().join("added.ext");
        fs::write(&added, "entry-point=added\n").unwrap();

        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert_eq!(report.new, vec![added]);
        assert_eq!(report.modified, vec![touched]);
        assert_eq!(report.removed, vec![gone]);
        assert_eq!(report.unchanged, vec![kept]);
    }

    #[test]
    fn test_file_never_new_and_modified_in_same_scan() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.ext");
        fs::write(&path, "entry-point=a\n").unwrap();

        // Unknown file with any mtime is new, never modified.
        let report = scan(tmp.path(), &HashMap::new(), EXTS).unwrap();
        assert_eq!(report.new, vec![path.clone()]);
        assert!(report.modified.is_empty());

        // Known file is modified, never new.
        let known = record_all(tmp.path());
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        let report = scan(tmp.path(), &known, EXTS).unwrap();
        assert!(report.new.is_empty());
        assert_eq!(report.modified, vec![path]);
    }
}
