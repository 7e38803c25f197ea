//! Folding extracted pages into one set of document assets.
//!
//! Aggregation is a pure fold over sections in configured order, so it never
//! touches the filesystem and can be exercised on hand-built content.

use std::collections::HashSet;

use datawalker_shared::{ExtractedContent, ScriptFragment, StyleFragment, escape_attr, title_case};

// ---------------------------------------------------------------------------
// StyleSet
// ---------------------------------------------------------------------------

/// Unique style fragments, iterated in first-insertion order.
///
/// Uniqueness is exact text equality; the order only exists so that two runs
/// over the same input serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSet {
    order: Vec<StyleFragment>,
    seen: HashSet<StyleFragment>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `style`. Returns `false` when an identical fragment is present.
    pub fn insert(&mut self, style: StyleFragment) -> bool {
        if self.seen.contains(&style) {
            return false;
        }
        self.seen.insert(style.clone());
        self.order.push(style);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StyleFragment> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Extend<StyleFragment> for StyleSet {
    fn extend<I: IntoIterator<Item = StyleFragment>>(&mut self, iter: I) {
        for style in iter {
            self.insert(style);
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The pages extracted for one configured section, in file order.
#[derive(Debug, Clone, Default)]
pub struct SectionContent {
    pub name: String,
    pub pages: Vec<ExtractedContent>,
}

impl SectionContent {
    pub fn new(name: impl Into<String>, pages: Vec<ExtractedContent>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }
}

/// One rendered scroll step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarkup {
    /// Machine-readable step identifier (the section name).
    pub step: String,
    /// Human-readable title.
    pub title: String,
    /// The complete `<section>` element.
    pub markup: String,
}

impl SectionMarkup {
    /// Wrap page bodies in a section container with a position indicator.
    pub fn render<'a>(name: &str, bodies: impl IntoIterator<Item = &'a str>) -> Self {
        let title = title_case(name);
        let bodies = bodies.into_iter().collect::<Vec<_>>().join("\n");

        let markup = format!(
            r#"<section class="section" data-step="{step}" data-title="{title_attr}">
    <div class="node"></div>
    <div class="content">
        <div class="fragment-stack">
{bodies}
        </div>
    </div>
</section>"#,
            step = escape_attr(name),
            title_attr = escape_attr(&title),
        );

        Self {
            step: name.to_string(),
            title,
            markup,
        }
    }
}

// ---------------------------------------------------------------------------
// AggregatedAssets
// ---------------------------------------------------------------------------

/// Everything the assembler splices into the page shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedAssets {
    /// Deduplicated styles.
    pub styles: StyleSet,
    /// All scripts, in encounter order, duplicates retained.
    pub scripts: Vec<ScriptFragment>,
    /// One entry per configured section, in order.
    pub sections: Vec<SectionMarkup>,
}

/// Fold one section into the accumulator.
///
/// A section with no pages still yields a container, so the step count always
/// matches the configuration.
pub fn merge_section(mut acc: AggregatedAssets, section: SectionContent) -> AggregatedAssets {
    for page in &section.pages {
        acc.styles.extend(page.styles.iter().cloned());
        acc.scripts.extend(page.scripts.iter().cloned());
    }

    acc.sections.push(SectionMarkup::render(
        &section.name,
        section.pages.iter().map(|p| p.body.as_str()),
    ));
    acc
}

/// Fold sections, in the order given, into one set of assets.
pub fn aggregate(sections: impl IntoIterator<Item = SectionContent>) -> AggregatedAssets {
    sections
        .into_iter()
        .fold(AggregatedAssets::default(), merge_section)
}
