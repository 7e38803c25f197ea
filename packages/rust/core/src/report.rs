//! Per-section analysis of the source pages.
//!
//! A dry survey of what a build would consume: how many pages each section
//! resolves, how many styles and scripts they carry, and which external
//! libraries they pull in before any allow-list filtering.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use datawalker_discovery::PageLocator;
use datawalker_extract::survey;
use datawalker_shared::{DatawalkerError, Result};

use crate::pipeline::BuildConfig;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub sections: Vec<SectionReport>,
    /// Distinct external script URLs across all pages, sorted.
    pub external_scripts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub name: String,
    pub pages: usize,
    pub total_scripts: usize,
    pub total_styles: usize,
    /// Found files, relative to the source root.
    pub files: Vec<PathBuf>,
    /// Configured files that were not found.
    pub missing: Vec<String>,
}

impl AnalysisReport {
    pub fn page_count(&self) -> usize {
        self.sections.iter().map(|s| s.pages).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            DatawalkerError::validation(format!("JSON serialization failed: {e}"))
        })
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| DatawalkerError::io(path, e))?;
        debug!(path = %path.display(), "wrote analysis report");
        Ok(())
    }
}

/// Survey every configured page without building anything.
#[instrument(skip_all, fields(root = %config.source_root.display()))]
pub fn analyze(config: &BuildConfig) -> Result<AnalysisReport> {
    config.sections.validate()?;
    let locator = PageLocator::open(&config.source_root, &config.subdirs)?;
    locator.validate(&config.sections)?;

    let mut external = BTreeSet::new();
    let mut sections = Vec::with_capacity(config.sections.len());

    for section in &config.sections {
        let mut report = SectionReport {
            name: section.name.clone(),
            pages: 0,
            total_scripts: 0,
            total_styles: 0,
            files: Vec::new(),
            missing: Vec::new(),
        };

        for file in &section.files {
            let Some(location) = locator.locate(&section.name, file) else {
                report.missing.push(file.clone());
                continue;
            };

            let html = std::fs::read_to_string(&location.path)
                .map_err(|e| DatawalkerError::io(&location.path, e))?;
            let page = survey(&html);

            report.pages += 1;
            report.total_scripts += page.script_count;
            report.total_styles += page.style_count;
            external.extend(page.external_scripts);
            report.files.push(
                location
                    .path
                    .strip_prefix(locator.root())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| location.path.clone()),
            );
        }

        debug!(
            section = %report.name,
            pages = report.pages,
            scripts = report.total_scripts,
            styles = report.total_styles,
            "section surveyed"
        );
        sections.push(report);
    }

    let report = AnalysisReport {
        generated_at: Utc::now(),
        root: locator.root().to_path_buf(),
        sections,
        external_scripts: external.into_iter().collect(),
    };

    info!(
        pages = report.page_count(),
        external = report.external_scripts.len(),
        "analysis complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datawalker_extract::ExtractOptions;
    use datawalker_shared::{SectionConfig, SectionSpec};

    fn fixture() -> PathBuf {
        let root = std::env::temp_dir().join(format!("dw-report-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(root.join("overview")).unwrap();
        std::fs::create_dir_all(root.join("uses")).unwrap();
        std::fs::write(
            root.join("overview/creator.html"),
            r#"<html><head><style>a{}</style>
               <script src="https://d3js.org/d3.v7.min.js"></script></head>
               <body><script>draw()</script></body></html>"#,
        )
        .unwrap();
        std::fs::write(
            root.join("uses/applications.html"),
            r#"<html><head><script src="https://cdn.example.com/jquery.js"></script>
               <script src="https://d3js.org/d3.v7.min.js"></script></head>
               <body><style>b{}</style><style>c{}</style></body></html>"#,
        )
        .unwrap();
        root
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            source_root: root.to_path_buf(),
            subdirs: Vec::new(),
            sections: SectionConfig::new(vec![
                SectionSpec::new("overview", ["creator.html", "temporal.html"]),
                SectionSpec::new("uses", ["applications.html"]),
            ]),
            extract: ExtractOptions::default(),
            mount_rules: Vec::new(),
            template: None,
        }
    }

    #[test]
    fn counts_per_section() {
        let root = fixture();
        let report = analyze(&config(&root)).unwrap();

        assert_eq!(report.sections.len(), 2);
        let overview = &report.sections[0];
        assert_eq!(overview.pages, 1);
        assert_eq!(overview.total_scripts, 2);
        assert_eq!(overview.total_styles, 1);
        assert_eq!(overview.files, vec![PathBuf::from("overview/creator.html")]);
        assert_eq!(overview.missing, vec!["temporal.html"]);

        let uses = &report.sections[1];
        assert_eq!(uses.total_scripts, 2);
        assert_eq!(uses.total_styles, 2);
        assert_eq!(report.page_count(), 2);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn external_scripts_are_distinct_and_sorted() {
        let root = fixture();
        let report = analyze(&config(&root)).unwrap();
        assert_eq!(
            report.external_scripts,
            vec![
                "https://cdn.example.com/jquery.js",
                "https://d3js.org/d3.v7.min.js"
            ]
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn serializes_to_json() {
        let root = fixture();
        let report = analyze(&config(&root)).unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sections"][1]["name"], "uses");
        assert!(value["generated_at"].is_string());

        let out = root.join("report.json");
        report.write_json(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), json);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = std::env::temp_dir().join(format!("dw-report-none-{}", uuid::Uuid::now_v7()));
        assert!(analyze(&config(&root)).is_err());
    }
}
