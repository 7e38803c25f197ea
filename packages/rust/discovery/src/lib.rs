//! Source page discovery.
//!
//! Section pages live one level below a source root, in a small set of
//! subdirectories. The locator resolves configured file names to concrete
//! paths and refuses configurations where a name would resolve ambiguously.

use std::path::{Path, PathBuf};

use datawalker_shared::{DatawalkerError, LocatorMiss, Result, SectionConfig, SourceLocation};
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// PageLocator
// ---------------------------------------------------------------------------

/// Resolves `(section, file)` pairs against the subdirectories of a root.
#[derive(Debug, Clone)]
pub struct PageLocator {
    root: PathBuf,
    /// Directories searched, in search order.
    dirs: Vec<PathBuf>,
}

impl PageLocator {
    /// Open a locator over `root`.
    ///
    /// When `subdirs` is empty every immediate subdirectory of `root` is
    /// searched, in sorted name order. Named subdirectories that do not exist
    /// are skipped.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>, subdirs: &[String]) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())
            .map_err(|e| DatawalkerError::io(root.as_ref(), e))?;

        if !root.is_dir() {
            return Err(DatawalkerError::io(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source root is not a directory"),
            ));
        }

        let dirs = if subdirs.is_empty() {
            list_subdirs(&root)?
        } else {
            subdirs
                .iter()
                .map(|name| root.join(name))
                .filter(|dir| {
                    let exists = dir.is_dir();
                    if !exists {
                        debug!(dir = %dir.display(), "configured subdirectory missing, skipping");
                    }
                    exists
                })
                .collect()
        };

        debug!(dirs = dirs.len(), "locator ready");
        Ok(Self { root, dirs })
    }

    /// The absolute source root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories searched, in order.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find `file` for `section`. Returns `None` when no directory has it.
    pub fn locate(&self, section: &str, file: &str) -> Option<SourceLocation> {
        self.candidates(file).into_iter().next().map(|path| SourceLocation {
            section: section.to_string(),
            path,
        })
    }

    /// Every searched path holding a file named `file`.
    fn candidates(&self, file: &str) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file))
            .filter(|p| p.is_file())
            .collect()
    }

    /// Reject configurations the locator cannot resolve unambiguously.
    ///
    /// File names must be bare names, and no name may exist in more than one
    /// searched directory.
    #[instrument(skip_all, fields(sections = sections.len()))]
    pub fn validate(&self, sections: &SectionConfig) -> Result<()> {
        for file in sections.file_names() {
            if file.is_empty() || file.contains(['/', '\\']) || file == "." || file == ".." {
                return Err(DatawalkerError::config(format!(
                    "'{file}' is not a plain file name"
                )));
            }

            let found = self.candidates(file);
            if found.len() > 1 {
                let dirs = found
                    .iter()
                    .filter_map(|p| p.parent())
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(DatawalkerError::config(format!(
                    "'{file}' is ambiguous: found in {} directories ({dirs})",
                    found.len()
                )));
            }
        }
        Ok(())
    }

    /// Every configured file that no searched directory holds.
    pub fn missing_files(&self, sections: &SectionConfig) -> Vec<LocatorMiss> {
        sections
            .iter()
            .flat_map(|section| {
                section
                    .files
                    .iter()
                    .filter(|file| self.locate(&section.name, file).is_none())
                    .map(|file| LocatorMiss {
                        section: section.name.clone(),
                        file: file.clone(),
                    })
            })
            .collect()
    }
}

/// Immediate subdirectories of `root`, sorted by name.
fn list_subdirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|e| DatawalkerError::io(root, e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatawalkerError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Data files
// ---------------------------------------------------------------------------

/// Data files under `data_root` that do not exist.
///
/// Page scripts load these at render time; the pipeline never reads them, so
/// a missing one is only worth a warning.
pub fn missing_data_files(data_root: &Path, names: &[String]) -> Vec<String> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !data_root.join(name).is_file())
        .cloned()
        .collect();

    if !missing.is_empty() {
        warn!(root = %data_root.display(), ?missing, "data files missing");
    }
    missing
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use datawalker_shared::SectionSpec;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dw-locator-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<html><body></body></html>").unwrap();
    }

    #[test]
    fn locates_file_in_any_subdirectory() {
        let root = temp_root();
        touch(&root, "overview/creator.html");
        touch(&root, "access/instructions.html");

        let locator = PageLocator::open(&root, &[]).unwrap();
        let loc = locator.locate("overview", "instructions.html").unwrap();
        assert_eq!(loc.section, "overview");
        assert!(loc.path.is_absolute());
        assert!(loc.path.ends_with("access/instructions.html"));

        assert!(locator.locate("overview", "nope.html").is_none());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn search_order_is_sorted() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("b")).unwrap();
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("loose.html"), "").unwrap();

        let locator = PageLocator::open(&root, &[]).unwrap();
        let names: Vec<_> = locator
            .search_dirs()
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn explicit_subdirs_bound_the_search() {
        let root = temp_root();
        touch(&root, "overview/creator.html");
        touch(&root, "drafts/temporal.html");

        let subdirs = vec!["overview".to_string(), "missing".to_string()];
        let locator = PageLocator::open(&root, &subdirs).unwrap();
        assert_eq!(locator.search_dirs().len(), 1);
        assert!(locator.locate("overview", "creator.html").is_some());
        assert!(locator.locate("overview", "temporal.html").is_none());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn ambiguous_file_is_a_config_error() {
        let root = temp_root();
        touch(&root, "overview/fields.html");
        touch(&root, "codebook/fields.html");

        let locator = PageLocator::open(&root, &[]).unwrap();
        let sections = SectionConfig::new(vec![SectionSpec::new("codebook", ["fields.html"])]);
        let err = locator.validate(&sections).unwrap_err();
        assert!(matches!(err, DatawalkerError::Config { .. }));
        assert!(err.to_string().contains("ambiguous"));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn path_like_file_names_rejected() {
        let root = temp_root();
        touch(&root, "overview/creator.html");

        let locator = PageLocator::open(&root, &[]).unwrap();
        let sections =
            SectionConfig::new(vec![SectionSpec::new("overview", ["overview/creator.html"])]);
        assert!(locator.validate(&sections).is_err());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = std::env::temp_dir().join(format!("dw-missing-{}", uuid::Uuid::now_v7()));
        let err = PageLocator::open(&root, &[]).unwrap_err();
        assert!(matches!(err, DatawalkerError::Io { .. }));
    }

    #[test]
    fn reports_missing_files_in_config_order() {
        let root = temp_root();
        touch(&root, "overview/creator.html");

        let locator = PageLocator::open(&root, &[]).unwrap();
        let sections = SectionConfig::new(vec![
            SectionSpec::new("overview", ["creator.html", "temporal.html"]),
            SectionSpec::new("sources", ["references.html"]),
        ]);
        let missing = locator.missing_files(&sections);
        let shown: Vec<_> = missing.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["overview/temporal.html", "sources/references.html"]);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn reports_missing_data_files() {
        let root = temp_root();
        std::fs::write(root.join("temporal_data.json"), "[]").unwrap();

        let names = vec!["temporal_data.json".to_string(), "force_graph_data.json".to_string()];
        assert_eq!(missing_data_files(&root, &names), vec!["force_graph_data.json"]);
        std::fs::remove_dir_all(&root).ok();
    }
}
