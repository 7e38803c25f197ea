//! Core domain types shared by the aggregation pipeline.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DatawalkerError, Result};

// ---------------------------------------------------------------------------
// Section configuration
// ---------------------------------------------------------------------------

/// One section: a name and the files that make it up, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Section name; also the step identifier in the output.
    pub name: String,
    /// Source file names belonging to this section.
    pub files: Vec<String>,
}

impl SectionSpec {
    pub fn new<I, S>(name: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered section → file-list mapping.
///
/// Order determines final document order and section numbering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionConfig(pub Vec<SectionSpec>);

impl SectionConfig {
    pub fn new(sections: Vec<SectionSpec>) -> Self {
        Self(sections)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionSpec> {
        self.0.iter()
    }

    /// Every distinct file name across all sections, in first-seen order.
    pub fn file_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .flat_map(|s| s.files.iter())
            .map(String::as_str)
            .filter(|f| seen.insert(*f))
            .collect()
    }

    /// Reject configurations the pipeline cannot honor.
    ///
    /// A valid configuration has at least one section, unique non-empty
    /// section names, and at least one file per section.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(DatawalkerError::config("no sections configured"));
        }

        let mut names = HashSet::new();
        for section in &self.0 {
            if section.name.trim().is_empty() {
                return Err(DatawalkerError::config("section name must not be empty"));
            }
            if !names.insert(section.name.as_str()) {
                return Err(DatawalkerError::config(format!(
                    "duplicate section '{}'",
                    section.name
                )));
            }
            if section.files.is_empty() {
                return Err(DatawalkerError::config(format!(
                    "section '{}' lists no files",
                    section.name
                )));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SectionConfig {
    type Item = &'a SectionSpec;
    type IntoIter = std::slice::Iter<'a, SectionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A configured file resolved to a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// The configured section the file was requested for.
    pub section: String,
    /// Absolute path of the matching file.
    pub path: PathBuf,
}

/// A configured file that was not found in any searched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorMiss {
    pub section: String,
    pub file: String,
}

impl std::fmt::Display for LocatorMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.section, self.file)
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// A script extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptFragment {
    /// `<script src="...">` reference, kept verbatim.
    External { src: String },
    /// Inline script body, after path normalization.
    Inline { code: String },
}

impl ScriptFragment {
    pub fn external(src: impl Into<String>) -> Self {
        Self::External { src: src.into() }
    }

    pub fn inline(code: impl Into<String>) -> Self {
        Self::Inline { code: code.into() }
    }

    /// Inline code, if this is an inline fragment.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Inline { code } => Some(code),
            Self::External { .. } => None,
        }
    }
}

/// Raw style-sheet text. Equality is exact text equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleFragment(pub String);

impl StyleFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StyleFragment {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StyleFragment {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Everything pulled out of one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Inline style blocks, in document order.
    pub styles: Vec<StyleFragment>,
    /// Script elements, in document order.
    pub scripts: Vec<ScriptFragment>,
    /// Wrapped body markup.
    pub body: String,
    /// Name of the directory the source file lives in.
    pub section_name: String,
    /// Where the content came from.
    pub source_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Title-case a section name: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased (`"data-walk"` → `"Data-Walk"`).
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Escape text for use inside a double-quoted HTML attribute value.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> SectionConfig {
        SectionConfig::new(vec![
            SectionSpec::new("overview", ["creator.html", "temporal.html"]),
            SectionSpec::new("access", ["instructions.html"]),
        ])
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("overview"), "Overview");
        assert_eq!(title_case("data-walk"), "Data-Walk");
        assert_eq!(title_case("USES"), "Uses");
        assert_eq!(title_case("step2go"), "Step2Go");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn attribute_escaping() {
        assert_eq!(escape_attr("overview"), "overview");
        assert_eq!(escape_attr(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
    }

    #[test]
    fn valid_sections_pass() {
        sections().validate().expect("valid config");
    }

    #[test]
    fn duplicate_section_rejected() {
        let mut cfg = sections();
        cfg.0.push(SectionSpec::new("overview", ["x.html"]));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate section 'overview'"));
    }

    #[test]
    fn empty_file_list_rejected() {
        let cfg = SectionConfig::new(vec![SectionSpec::new("sources", Vec::<String>::new())]);
        assert!(cfg.validate().is_err());
        assert!(SectionConfig::default().validate().is_err());
    }

    #[test]
    fn file_names_are_distinct_and_ordered() {
        let mut cfg = sections();
        cfg.0.push(SectionSpec::new("uses", ["creator.html", "apps.html"]));
        assert_eq!(
            cfg.file_names(),
            vec!["creator.html", "temporal.html", "instructions.html", "apps.html"]
        );
    }

    #[test]
    fn script_fragment_code_accessor() {
        assert_eq!(ScriptFragment::inline("x()").code(), Some("x()"));
        assert_eq!(ScriptFragment::external("d3.js").code(), None);
    }
}
