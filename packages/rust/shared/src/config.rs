//! Application configuration for Datawalker.
//!
//! The config file is looked up as `./datawalker.toml`, then
//! `~/.datawalker/datawalker.toml`. CLI flags override config file values,
//! which override defaults. Relative paths are resolved against the
//! working directory.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DatawalkerError, Result};
use crate::types::{SectionConfig, SectionSpec};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "datawalker.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".datawalker";

// ---------------------------------------------------------------------------
// Config structs (matching datawalker.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where source documents and data files live.
    #[serde(default)]
    pub source: SourceConfig,

    /// Extraction policy.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Output location and page shell.
    #[serde(default)]
    pub output: OutputConfig,

    /// Ordered sections.
    #[serde(default = "default_sections")]
    pub sections: SectionConfig,

    /// Extra visualization mount rules, appended after the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_rules: Vec<MountRuleConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            extract: ExtractConfig::default(),
            output: OutputConfig::default(),
            sections: default_sections(),
            mount_rules: Vec::new(),
        }
    }
}

/// The seven-step walk through the walkability dataset documentation.
fn default_sections() -> SectionConfig {
    SectionConfig::new(vec![
        SectionSpec::new(
            "overview",
            ["creator.html", "temporal.html", "geographic.html"],
        ),
        SectionSpec::new("access", ["instructions.html", "requirements.html"]),
        SectionSpec::new("standards", ["structure.html"]),
        SectionSpec::new("codebook", ["fields.html"]),
        SectionSpec::new("context", ["analysis.html"]),
        SectionSpec::new("uses", ["applications.html"]),
        SectionSpec::new("sources", ["references.html"]),
    ])
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory whose immediate subdirectories hold the source pages.
    #[serde(default = "default_source_root")]
    pub root: PathBuf,

    /// Subdirectories to search. Empty means every immediate subdirectory.
    #[serde(default)]
    pub subdirs: Vec<String>,

    /// Directory holding the data files the page scripts load.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Data files referenced by inline scripts (checked, never read).
    #[serde(default = "default_data_files")]
    pub data_files: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
            subdirs: Vec::new(),
            data_root: default_data_root(),
            data_files: default_data_files(),
        }
    }
}

fn default_source_root() -> PathBuf {
    PathBuf::from("tufte_tests")
}
fn default_data_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_data_files() -> Vec<String> {
    vec![
        "atlanta_walkability_wgs84.geojson".into(),
        "force_graph_data.json".into(),
        "temporal_data.json".into(),
    ]
}

/// `[extract]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Elements carrying any of these classes are dropped before extraction.
    #[serde(default = "default_control_classes")]
    pub control_classes: Vec<String>,

    /// External scripts are kept only when their URL contains one of these.
    #[serde(default = "default_script_allow")]
    pub script_allow: Vec<String>,

    /// Regex rewrites applied to every extracted style block, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_rewrites: Vec<StyleRewriteConfig>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            control_classes: default_control_classes(),
            script_allow: default_script_allow(),
            style_rewrites: Vec::new(),
        }
    }
}

fn default_control_classes() -> Vec<String> {
    vec![
        "nav-buttons".into(),
        "control-button".into(),
        "controls".into(),
        "navigation".into(),
    ]
}
fn default_script_allow() -> Vec<String> {
    vec!["d3".into(), "topojson".into()]
}

/// `[[extract.style_rewrites]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRewriteConfig {
    /// Regular expression matched against style text.
    pub pattern: String,
    /// Replacement text (`$1` style group references allowed).
    pub replacement: String,
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the composed document is written.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Page shell template. The built-in shell is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            template: None,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("datawalker.html")
}

/// `[[mount_rules]]` entry: a user-declared visualization container contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountRuleConfig {
    /// Rule name for tracing.
    pub name: String,
    /// Substring whose presence in an inline script activates the rule.
    pub marker: String,
    /// Container class the source page used.
    pub old_class: String,
    /// Container class the page shell expects.
    pub new_class: String,
    /// Inline style injected on the renamed container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizing: Option<String>,
}

impl AppConfig {
    /// Check sections and rewrite patterns. Mount rules are checked when
    /// they are compiled.
    pub fn validate(&self) -> Result<()> {
        self.sections.validate()?;

        for rewrite in &self.extract.style_rewrites {
            Regex::new(&rewrite.pattern).map_err(|e| {
                DatawalkerError::validation(format!(
                    "invalid style rewrite pattern '{}': {e}",
                    rewrite.pattern
                ))
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.datawalker/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DatawalkerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.datawalker/datawalker.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// Tries `./datawalker.toml`, then the user config file, and falls back to
/// defaults when neither exists.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DatawalkerError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DatawalkerError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(?path, sections = config.sections.len(), "loaded config");

    Ok(config)
}

/// Create the user config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DatawalkerError::io(&dir, e))?;
    let path = dir.join(CONFIG_FILE_NAME);
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`.
pub fn init_config_at(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DatawalkerError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| DatawalkerError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("control_classes"));
        assert!(toml_str.contains("[[sections]]"));
        assert!(toml_str.contains("creator.html"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, config);
        assert_eq!(parsed.sections.len(), 7);
        assert_eq!(parsed.sections.0[0].name, "overview");
        assert_eq!(parsed.sections.0[6].name, "sources");
    }

    #[test]
    fn sections_keep_declared_order() {
        let toml_str = r#"
[source]
root = "pages"

[[sections]]
name = "zeta"
files = ["z.html"]

[[sections]]
name = "alpha"
files = ["a.html", "b.html"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let names: Vec<_> = config.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.source.root, PathBuf::from("pages"));
        assert_eq!(config.extract.script_allow, vec!["d3", "topojson"]);
        config.validate().expect("valid");
    }

    #[test]
    fn mount_rules_and_rewrites_parse() {
        let toml_str = r#"
[[extract.style_rewrites]]
pattern = 'background:\s*#fff'
replacement = "background: var(--bg-color)"

[[mount_rules]]
name = "heatmap"
marker = "d3.interpolateViridis"
old_class = "grid"
new_class = "heat-grid"
sizing = "height: 300px;"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.extract.style_rewrites.len(), 1);
        assert_eq!(config.mount_rules[0].new_class, "heat-grid");
        assert_eq!(config.sections.len(), 7);
        config.validate().expect("valid");
    }

    #[test]
    fn invalid_rewrite_pattern_rejected() {
        let mut config = AppConfig::default();
        config.extract.style_rewrites.push(StyleRewriteConfig {
            pattern: "(unclosed".into(),
            replacement: String::new(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid style rewrite pattern"));
    }
}
