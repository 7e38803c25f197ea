//! End-to-end `build` pipeline: sections → locate → extract → adapt → fold → assemble.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use datawalker_discovery::PageLocator;
use datawalker_extract::{ExtractOptions, extract_file};
use datawalker_shared::{
    AppConfig, DatawalkerError, LocatorMiss, MountRuleConfig, Result, SectionConfig,
};
use datawalker_viz::MountRegistry;

use crate::aggregate::{SectionContent, aggregate};
use crate::assembler::{Template, assemble};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory whose subdirectories hold the section pages.
    pub source_root: PathBuf,
    /// Subdirectories to search; empty means all of them.
    pub subdirs: Vec<String>,
    /// Ordered sections.
    pub sections: SectionConfig,
    /// Extraction policy.
    pub extract: ExtractOptions,
    /// Mount rules appended to the built-in ones.
    pub mount_rules: Vec<MountRuleConfig>,
    /// Page shell; the built-in shell when `None`.
    pub template: Option<PathBuf>,
}

impl BuildConfig {
    /// Validate `config` and compile it into a run configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        MountRegistry::with_rules(&config.mount_rules)?;
        Ok(Self {
            source_root: config.source.root.clone(),
            subdirs: config.source.subdirs.clone(),
            sections: config.sections.clone(),
            extract: ExtractOptions::from_config(&config.extract)?,
            mount_rules: config.mount_rules.clone(),
            template: config.output.template.clone(),
        })
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The composed document.
    pub document: String,
    /// Number of section containers emitted.
    pub section_count: usize,
    /// Number of pages extracted.
    pub page_count: usize,
    /// Configured files that were not found.
    pub misses: Vec<LocatorMiss>,
    /// Hex SHA-256 of `document`.
    pub digest: String,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each configured file is handled (found or not).
    fn page_processed(&self, file: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_processed(&self, _file: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full pipeline and return the document.
///
/// 1. Validate sections, load the template and mount rules
/// 2. Open the locator and reject ambiguous file names
/// 3. Per section, per file: locate, extract, adapt
/// 4. Fold everything into aggregated assets
/// 5. Assemble the document
///
/// Missing files are recorded and skipped. Any parse or template failure
/// aborts the run.
#[instrument(skip_all, fields(root = %config.source_root.display(), sections = config.sections.len()))]
pub fn build_document(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    progress.phase("Checking configuration");
    config.sections.validate()?;
    let template = Template::load(config.template.as_deref())?;
    let registry = MountRegistry::with_rules(&config.mount_rules)?;

    progress.phase("Locating pages");
    let locator = PageLocator::open(&config.source_root, &config.subdirs)?;
    locator.validate(&config.sections)?;

    let total: usize = config.sections.iter().map(|s| s.files.len()).sum();
    info!(total, "processing section pages");

    let mut sections = Vec::with_capacity(config.sections.len());
    let mut misses = Vec::new();
    let mut current = 0;

    for section in &config.sections {
        let mut pages = Vec::with_capacity(section.files.len());

        for file in &section.files {
            current += 1;

            match locator.locate(&section.name, file) {
                Some(location) => {
                    let content = extract_file(&location.path, &config.extract)?;
                    pages.push(registry.adapt(content));
                    debug!(section = %section.name, path = %location.path.display(), "page added");
                }
                None => {
                    warn!(section = %section.name, file = %file, "page not found, skipping");
                    misses.push(LocatorMiss {
                        section: section.name.clone(),
                        file: file.clone(),
                    });
                }
            }

            progress.page_processed(file, current, total);
        }

        sections.push(SectionContent::new(section.name.clone(), pages));
    }

    let page_count = sections.iter().map(|s| s.pages.len()).sum();

    progress.phase("Assembling document");
    let assets = aggregate(sections);
    let document = assemble(&assets, &template);
    let digest = sha256_hex(&document);

    let result = BuildResult {
        section_count: assets.sections.len(),
        page_count,
        misses,
        digest,
        document,
        elapsed: start.elapsed(),
    };

    info!(
        sections = result.section_count,
        pages = result.page_count,
        misses = result.misses.len(),
        digest = %result.digest,
        "document built"
    );
    progress.done(&result);

    Ok(result)
}

/// Build the document and write it to `out`.
///
/// Nothing is written unless the build succeeds.
pub fn run_to_file(
    config: &BuildConfig,
    out: &Path,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let result = build_document(config, progress)?;
    write_document(out, &result.document)?;
    Ok(result)
}

/// Write `document` to `path` atomically (temp file, then rename).
pub fn write_document(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatawalkerError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DatawalkerError::config(format!("{} is not a file path", path.display())))?;
    // Per-run name so concurrent writers to one target only race on the rename.
    let temp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::now_v7()));

    std::fs::write(&temp, document).map_err(|e| DatawalkerError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| DatawalkerError::io(path, e))?;

    info!(path = %path.display(), bytes = document.len(), "document written");
    Ok(())
}

fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
