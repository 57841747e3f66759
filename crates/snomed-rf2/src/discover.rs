//! Release-directory discovery.
//!
//! Walks a release directory for `.txt` files whose names decode as RF2
//! snapshot files. Full and Delta files are left alone: the store is a
//! snapshot rebuilt by re-ingestion.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Rf2Error, Rf2Result};
use crate::filename::Rf2Filename;

/// The snapshot files found in a release directory.
#[derive(Debug, Clone, Default)]
pub struct ReleaseFiles {
    /// Decoded snapshot files, in discovery order.
    pub files: Vec<(PathBuf, Rf2Filename)>,
    /// Greatest version date seen across the files, YYYYMMDD.
    pub release_date: Option<u32>,
}

impl ReleaseFiles {
    /// Returns true if at least one concept file was found.
    pub fn has_concepts(&self) -> bool {
        self.files
            .iter()
            .any(|(_, decoded)| decoded.entity == crate::filename::Entity::Concept)
    }
}

/// Recursively discovers RF2 snapshot files beneath `path`.
///
/// Files that do not follow the RF2 naming convention are skipped with
/// a debug event; an entirely empty result is not an error (callers
/// decide whether a release without concept files is usable).
pub fn discover_release_files<P: AsRef<Path>>(path: P) -> Rf2Result<ReleaseFiles> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(Rf2Error::DirectoryNotFound { path: path.display().to_string() });
    }

    let mut release = ReleaseFiles::default();
    walk(path, &mut release)?;
    release.files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(release)
}

fn walk(dir: &Path, release: &mut ReleaseFiles) -> Rf2Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&entry_path, release)?;
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".txt") {
            continue;
        }

        match Rf2Filename::parse(&name) {
            Ok(decoded) if decoded.is_snapshot() => {
                release.release_date =
                    Some(release.release_date.unwrap_or(0).max(decoded.version_date));
                release.files.push((entry_path, decoded));
            }
            Ok(_) => debug!(file = %name, "skipping non-snapshot release file"),
            Err(_) => debug!(file = %name, "skipping file without RF2 naming"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn touch(path: &Path, header: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(path).unwrap();
        writeln!(file, "{header}").unwrap();
    }

    #[test]
    fn test_discovers_nested_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(
            &base.join("Snapshot/Terminology/sct2_Concept_Snapshot_INT_20230131.txt"),
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId",
        );
        touch(
            &base.join("Snapshot/Refset/Language/der2_cRefset_LanguageSnapshot-en_INT_20230131.txt"),
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tacceptabilityId",
        );
        touch(
            &base.join("Full/Terminology/sct2_Concept_Full_INT_20230131.txt"),
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId",
        );
        touch(&base.join("README.txt"), "not an RF2 file");

        let release = discover_release_files(base).unwrap();
        assert_eq!(release.files.len(), 2);
        assert!(release.has_concepts());
        assert_eq!(release.release_date, Some(20230131));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let err = discover_release_files("/nonexistent/release").unwrap_err();
        assert!(matches!(err, Rf2Error::DirectoryNotFound { .. }));
    }
}
