//! Textual fix-ups applied to extracted fragments.
//!
//! Everything here is blind string or regex substitution; nothing parses
//! CSS or JavaScript.

use regex::Regex;

use datawalker_shared::{DatawalkerError, Result, StyleRewriteConfig};

/// Relative-parent prefixes stripped from inline scripts, longest first.
const PARENT_PREFIXES: [&str; 2] = ["../../", "../"];

/// Strip relative-parent path segments from inline script text.
///
/// Page scripts load data files relative to their own directory; once merged
/// the document sits next to the data. The substitution is blind: every
/// occurrence goes, including ones that are not paths at all.
pub fn normalize_script_paths(code: &str) -> String {
    PARENT_PREFIXES
        .iter()
        .fold(code.to_string(), |acc, prefix| acc.replace(prefix, ""))
}

/// A compiled `pattern → replacement` rewrite for style text.
#[derive(Debug, Clone)]
pub struct StyleRewrite {
    pattern: Regex,
    replacement: String,
}

impl StyleRewrite {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            DatawalkerError::validation(format!("invalid style rewrite pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn apply(&self, css: &str) -> String {
        self.pattern
            .replace_all(css, self.replacement.as_str())
            .into_owned()
    }
}

impl TryFrom<&StyleRewriteConfig> for StyleRewrite {
    type Error = DatawalkerError;

    fn try_from(cfg: &StyleRewriteConfig) -> Result<Self> {
        Self::new(&cfg.pattern, cfg.replacement.clone())
    }
}

/// Run every rewrite over `css`, in order.
pub fn apply_style_rewrites(css: &str, rewrites: &[StyleRewrite]) -> String {
    rewrites
        .iter()
        .fold(css.to_string(), |acc, rewrite| rewrite.apply(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_parent_prefixes_everywhere() {
        let code = r#"d3.json("../../force_graph_data.json"); d3.json('../temporal_data.json');"#;
        assert_eq!(
            normalize_script_paths(code),
            r#"d3.json("force_graph_data.json"); d3.json('temporal_data.json');"#
        );
    }

    #[test]
    fn stripping_is_blind() {
        // Not a path, stripped anyway.
        assert_eq!(normalize_script_paths("x = 'a../b'"), "x = 'ab'");
        assert_eq!(normalize_script_paths("../../../deep.json"), "deep.json");
    }

    #[test]
    fn code_without_prefixes_is_untouched() {
        let code = "const width = 960;";
        assert_eq!(normalize_script_paths(code), code);
    }

    #[test]
    fn style_rewrites_apply_in_order() {
        let rewrites = vec![
            StyleRewrite::new(r"background:\s*#fff", "background: var(--bg-color)").unwrap(),
            StyleRewrite::new(r"var\(--bg-color\)", "var(--paper)").unwrap(),
        ];
        assert_eq!(
            apply_style_rewrites("body { background:  #fff; }", &rewrites),
            "body { background: var(--paper); }"
        );
        assert_eq!(apply_style_rewrites("p {}", &[]), "p {}");
    }

    #[test]
    fn bad_pattern_is_a_validation_error() {
        let err = StyleRewrite::new("[", "").unwrap_err();
        assert!(matches!(err, DatawalkerError::Validation { .. }));
    }
}
