//! Read-only page survey for the analysis report.

use std::sync::LazyLock;

use scraper::{Html, Selector};

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static STYLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("valid selector"));
static SCRIPT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

/// Counts of what a page carries, taken before any filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSurvey {
    pub title: Option<String>,
    pub style_count: usize,
    pub script_count: usize,
    /// Every `src` seen, allow-listed or not, in document order.
    pub external_scripts: Vec<String>,
}

/// Survey page source `html`. Never fails; a page without a body still
/// reports its head.
pub fn survey(html: &str) -> PageSurvey {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let external_scripts = doc
        .select(&SCRIPT_SEL)
        .filter_map(|el| el.value().attr("src"))
        .map(String::from)
        .collect();

    PageSurvey {
        title,
        style_count: doc.select(&STYLE_SEL).count(),
        script_count: doc.select(&SCRIPT_SEL).count(),
        external_scripts,
    }
}
