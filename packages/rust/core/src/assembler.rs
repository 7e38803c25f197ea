//! Document assembler.
//!
//! Serializes aggregated assets and splices them into the page shell by
//! exact placeholder replacement.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, instrument, warn};

use datawalker_shared::{DatawalkerError, Result, ScriptFragment, escape_attr};

use crate::aggregate::{AggregatedAssets, SectionMarkup, StyleSet};

/// Placeholder replaced with the combined style block.
pub const STYLES_SLOT: &str = "{{STYLES}}";
/// Placeholder replaced with the script elements.
pub const SCRIPTS_SLOT: &str = "{{SCRIPTS}}";
/// Placeholder replaced with the section containers.
pub const SECTIONS_SLOT: &str = "{{SECTIONS}}";

const BUILTIN_SHELL: &str = include_str!("../templates/shell.html");

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(STYLES|SCRIPTS|SECTIONS)\}\}").expect("valid regex"));

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// The page shell: literal markup with three placeholders.
///
/// A missing placeholder is not an error; that asset class is simply absent
/// from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The shell bundled with the crate.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SHELL)
    }

    /// Read a template file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatawalkerError::assembly(format!("cannot read template {}: {e}", path.display()))
        })?;
        Ok(Self::new(text))
    }

    /// Read `path` when given, otherwise use the built-in shell.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Placeholders this template does not contain.
    pub fn missing_slots(&self) -> Vec<&'static str> {
        [STYLES_SLOT, SCRIPTS_SLOT, SECTIONS_SLOT]
            .into_iter()
            .filter(|slot| !self.text.contains(slot))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// One `<style>` block holding every unique fragment in set order, or
/// nothing when the set is empty.
pub fn render_styles(styles: &StyleSet) -> String {
    if styles.is_empty() {
        return String::new();
    }
    let body = styles
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    format!("<style>\n{body}\n</style>")
}

/// Script elements in encounter order, external and inline interleaved.
pub fn render_scripts(scripts: &[ScriptFragment]) -> String {
    scripts
        .iter()
        .map(|script| match script {
            ScriptFragment::External { src } => {
                format!(r#"<script src="{}"></script>"#, escape_attr(src))
            }
            ScriptFragment::Inline { code } => format!("<script>{code}</script>"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Section containers in configured order.
pub fn render_sections(sections: &[SectionMarkup]) -> String {
    sections
        .iter()
        .map(|s| s.markup.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produce the final document text.
#[instrument(skip_all, fields(
    styles = assets.styles.len(),
    scripts = assets.scripts.len(),
    sections = assets.sections.len(),
))]
pub fn assemble(assets: &AggregatedAssets, template: &Template) -> String {
    let missing = template.missing_slots();
    if !missing.is_empty() {
        warn!(?missing, "template lacks placeholders; those assets are dropped");
    }

    let styles = render_styles(&assets.styles);
    let scripts = render_scripts(&assets.scripts);
    let sections = render_sections(&assets.sections);

    // One pass over the template only; inserted content is never rescanned.
    let document = SLOT_RE
        .replace_all(template.as_str(), |caps: &Captures| match &caps[1] {
            "STYLES" => styles.as_str(),
            "SCRIPTS" => scripts.as_str(),
            _ => sections.as_str(),
        })
        .into_owned();

    debug!(len = document.len(), "document assembled");
    document
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
