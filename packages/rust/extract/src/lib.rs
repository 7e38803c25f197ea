//! Fragment extraction from section pages.
//!
//! Parses one standalone page and splits it into the pieces the composite
//! document needs: inline styles, scripts, and the body markup. Navigation
//! and playback controls are dropped before anything is collected, since the
//! page shell provides its own.

mod normalize;
mod survey;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use datawalker_shared::{
    DatawalkerError, ExtractConfig, ExtractedContent, Result, ScriptFragment, StyleFragment,
    escape_attr,
};

pub use normalize::{StyleRewrite, apply_style_rewrites, normalize_script_paths};
pub use survey::{PageSurvey, survey};

static BODY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[\s>/]").expect("valid regex"));
/// Comments and raw-text elements, where a `<body` is not a tag. An
/// unterminated one runs to the end of input, as the HTML tokenizer does.
static NON_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--(?:.*?-->|.*)|<script\b[^>]*>(?:.*?</script\s*>|.*)|<style\b[^>]*>(?:.*?</style\s*>|.*)",
    )
    .expect("valid regex")
});

static STYLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("valid selector"));
static SCRIPT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static CLASSED_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("valid selector"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Extraction policy.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Elements with any of these classes are removed.
    pub control_classes: Vec<String>,
    /// External script URLs must contain one of these to be kept.
    pub script_allow: Vec<String>,
    /// Rewrites applied to each style block.
    pub style_rewrites: Vec<StyleRewrite>,
}

impl ExtractOptions {
    /// Build options from the `[extract]` config section, compiling rewrites.
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        let style_rewrites = config
            .style_rewrites
            .iter()
            .map(StyleRewrite::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            control_classes: config.control_classes.clone(),
            script_allow: config.script_allow.clone(),
            style_rewrites,
        })
    }

    fn is_control(&self, class: &str) -> bool {
        self.control_classes.iter().any(|c| c == class)
    }

    fn allows_script(&self, src: &str) -> bool {
        self.script_allow.iter().any(|lib| src.contains(lib.as_str()))
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        let config = ExtractConfig::default();
        Self {
            control_classes: config.control_classes,
            script_allow: config.script_allow,
            style_rewrites: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Read and extract the page at `path`.
///
/// The section name recorded on the content is the name of the directory
/// containing the file.
pub fn extract_file(path: &Path, opts: &ExtractOptions) -> Result<ExtractedContent> {
    let html = std::fs::read_to_string(path).map_err(|e| DatawalkerError::io(path, e))?;
    let section_name = path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    extract(&html, path, &section_name, opts)
}

/// Extract fragments from page source `html`.
///
/// Fails with a parse error when the source has no `<body>` element; the
/// HTML5 parser would otherwise synthesize an empty one and the page would
/// silently vanish from the output.
#[instrument(skip(html, opts), fields(path = %source_path.display()))]
pub fn extract(
    html: &str,
    source_path: &Path,
    section_name: &str,
    opts: &ExtractOptions,
) -> Result<ExtractedContent> {
    if !has_body_tag(html) {
        return Err(DatawalkerError::parse(source_path, "no <body> element"));
    }

    let mut doc = Html::parse_document(html);

    let removed = remove_controls(&mut doc, opts);
    let styles = collect_styles(&doc, opts);
    let scripts = collect_scripts(&doc, opts);
    let inner = body_markup(&mut doc)
        .ok_or_else(|| DatawalkerError::parse(source_path, "no <body> element"))?;

    let body = format!(
        r#"<div class="fragment" data-section="{}">{}</div>"#,
        escape_attr(section_name),
        inner.trim()
    );

    debug!(
        removed,
        styles = styles.len(),
        scripts = scripts.len(),
        body_len = body.len(),
        "page extracted"
    );

    Ok(ExtractedContent {
        styles,
        scripts,
        body,
        section_name: section_name.to_string(),
        source_path: source_path.to_path_buf(),
    })
}

/// Whether the source has a real `<body>` start tag, outside comments,
/// scripts, and style blocks.
fn has_body_tag(html: &str) -> bool {
    BODY_TAG_RE.is_match(&NON_MARKUP_RE.replace_all(html, ""))
}

/// Detach every element carrying a control class. Returns how many went.
fn remove_controls(doc: &mut Html, opts: &ExtractOptions) -> usize {
    let ids: Vec<_> = doc
        .select(&CLASSED_SEL)
        .filter(|el| el.value().classes().any(|c| opts.is_control(c)))
        .map(|el| el.id())
        .collect();

    let count = ids.len();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    count
}

fn collect_styles(doc: &Html, opts: &ExtractOptions) -> Vec<StyleFragment> {
    doc.select(&STYLE_SEL)
        .map(|el| el.text().collect::<String>())
        .filter(|css| !css.trim().is_empty())
        .map(|css| StyleFragment(apply_style_rewrites(&css, &opts.style_rewrites)))
        .collect()
}

fn collect_scripts(doc: &Html, opts: &ExtractOptions) -> Vec<ScriptFragment> {
    let mut scripts = Vec::new();

    for el in doc.select(&SCRIPT_SEL) {
        if let Some(src) = el.value().attr("src") {
            if opts.allows_script(src) {
                scripts.push(ScriptFragment::external(src));
            } else {
                debug!(src, "dropping external script outside the allow-list");
            }
            continue;
        }

        let code = el.text().collect::<String>();
        if code.trim().is_empty() {
            continue;
        }
        scripts.push(ScriptFragment::inline(normalize_script_paths(&code)));
    }

    scripts
}

/// Inner markup of `<body>` with its scripts removed.
fn body_markup(doc: &mut Html) -> Option<String> {
    let script_ids: Vec<_> = doc
        .select(&BODY_SEL)
        .next()?
        .select(&SCRIPT_SEL)
        .map(|el| el.id())
        .collect();

    for id in script_ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    doc.select(&BODY_SEL).next().map(|body| body.inner_html())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>.chart { height: 400px; }</style>
  <script src="https://d3js.org/d3.v7.min.js"></script>
  <script src="https://cdn.example.com/jquery.min.js"></script>
</head>
<body>
  <div class="nav-buttons"><button>Prev</button><button>Next</button></div>
  <h1>Temporal Patterns</h1>
  <div class="chart"></div>
  <div class="controls"><button class="control-button">Play</button></div>
  <style>.note { color: #333; }</style>
  <script>
    d3.json("../../temporal_data.json").then(draw);
  </script>
</body>
</html>"#;

    fn page_path() -> PathBuf {
        PathBuf::from("/site/tufte_tests/overview/temporal.html")
    }

    fn run(html: &str) -> ExtractedContent {
        extract(html, &page_path(), "overview", &ExtractOptions::default()).unwrap()
    }

    #[test]
    fn collects_styles_in_document_order() {
        let content = run(PAGE);
        assert_eq!(
            content.styles,
            vec![
                StyleFragment::from(".chart { height: 400px; }"),
                StyleFragment::from(".note { color: #333; }"),
            ]
        );
    }

    #[test]
    fn keeps_only_allow_listed_external_scripts() {
        let content = run(PAGE);
        assert_eq!(content.scripts.len(), 2);
        assert_eq!(
            content.scripts[0],
            ScriptFragment::external("https://d3js.org/d3.v7.min.js")
        );
        let code = content.scripts[1].code().unwrap();
        assert!(code.contains(r#"d3.json("temporal_data.json")"#));
        assert!(!code.contains("../"));
    }

    #[test]
    fn control_elements_never_reach_the_body() {
        let content = run(PAGE);
        assert!(!content.body.contains("nav-buttons"));
        assert!(!content.body.contains("Prev"));
        assert!(!content.body.contains("control-button"));
        assert!(!content.body.contains("Play"));
        assert!(content.body.contains("<h1>Temporal Patterns</h1>"));
        assert!(content.body.contains(r#"<div class="chart"></div>"#));
    }

    #[test]
    fn body_has_no_scripts_and_is_wrapped() {
        let content = run(PAGE);
        assert!(!content.body.contains("<script"));
        assert!(content
            .body
            .starts_with(r#"<div class="fragment" data-section="overview">"#));
        assert!(content.body.ends_with("</div>"));
        assert_eq!(content.section_name, "overview");
        assert_eq!(content.source_path, page_path());
    }

    #[test]
    fn missing_body_is_a_parse_error() {
        let html = "<html><head><style>p{}</style></head></html>";
        let err = extract(html, &page_path(), "overview", &ExtractOptions::default())
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn body_only_in_comment_or_script_is_a_parse_error() {
        for html in [
            "<html><head><!-- <body> --><title>x</title></head></html>",
            "<html><head><script>const s = '<body>';</script></head></html>",
            "<html><head><style>/* <body class=x> */</style></head></html>",
            "<html><head><!-- unterminated <body></head></html>",
        ] {
            let err = extract(html, &page_path(), "overview", &ExtractOptions::default())
                .unwrap_err();
            assert!(err.is_parse(), "accepted {html}");
        }
    }

    #[test]
    fn real_body_after_commented_one_is_accepted() {
        let html = "<html><!-- <body> --><head><script>'<body>'</script></head><body><p>ok</p></body></html>";
        let content = run(html);
        assert!(content.body.contains("<p>ok</p>"));
    }

    #[test]
    fn body_tag_with_attributes_is_accepted() {
        let html = r#"<html><BODY class="light"><p>hi</p></BODY></html>"#;
        let content = run(html);
        assert!(content.body.contains("<p>hi</p>"));
        assert!(content.styles.is_empty());
        assert!(content.scripts.is_empty());
    }

    #[test]
    fn empty_blocks_are_skipped() {
        let html = "<html><head><style>  </style></head><body><script>\n</script></body></html>";
        let content = run(html);
        assert!(content.styles.is_empty());
        assert!(content.scripts.is_empty());
    }

    #[test]
    fn style_rewrites_are_applied() {
        let mut opts = ExtractOptions::default();
        opts.style_rewrites
            .push(StyleRewrite::new(r"color:\s*#333", "color: var(--text-color)").unwrap());
        let content = extract(PAGE, &page_path(), "overview", &opts).unwrap();
        assert_eq!(content.styles[1].as_str(), ".note { color: var(--text-color); }");
    }

    #[test]
    fn section_name_comes_from_containing_directory() {
        let dir = std::env::temp_dir()
            .join(format!("dw-extract-test-{}", uuid::Uuid::now_v7()))
            .join("codebook");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fields.html");
        std::fs::write(&path, "<html><body><table></table></body></html>").unwrap();

        let content = extract_file(&path, &ExtractOptions::default()).unwrap();
        assert_eq!(content.section_name, "codebook");
        assert!(content.body.contains(r#"data-section="codebook""#));

        std::fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn options_from_config() {
        let mut config = ExtractConfig::default();
        config.script_allow = vec!["scrollama".into()];
        config.style_rewrites.push(datawalker_shared::StyleRewriteConfig {
            pattern: "a".into(),
            replacement: "b".into(),
        });
        let opts = ExtractOptions::from_config(&config).unwrap();
        assert!(opts.allows_script("https://unpkg.com/scrollama"));
        assert!(!opts.allows_script("https://d3js.org/d3.v7.min.js"));
        assert_eq!(opts.style_rewrites.len(), 1);
    }
}
