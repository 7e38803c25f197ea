//! Visualization re-mounting for merged pages.
//!
//! Section pages bootstrap their charts against container classes chosen in
//! isolation (`.chart`, `.connection-graph`, ...). The page shell styles a
//! different, shared set of containers. Mount adapters spot a visualization
//! by a marker in the page's inline script and rename both the selector
//! literals and the container so the chart still finds its mount point.
//!
//! Detection is substring presence, not analysis. A page with no marker
//! passes through untouched, and a rule whose container is missing is a
//! silent no-op.

mod rule;

use tracing::{debug, instrument};

use datawalker_shared::{ExtractedContent, MountRuleConfig, Result, ScriptFragment};

pub use rule::MountRule;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A known visualization type and how to re-home it.
pub trait MountAdapter: Send + Sync {
    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;

    /// Whether `code` bootstraps this visualization.
    fn detect(&self, code: &str) -> bool;

    /// Point selector literals in `code` at the shared container.
    fn rewrite_script(&self, code: &str) -> String;

    /// Rename the page's container. `None` when there is nothing to rename.
    fn rewrite_body(&self, body: &str) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds mount adapters, applied in registration order.
pub struct MountRegistry {
    adapters: Vec<Box<dyn MountAdapter>>,
}

impl MountRegistry {
    /// Registry with the built-in rules for the shared page shell.
    pub fn new() -> Self {
        Self {
            adapters: builtin_rules()
                .into_iter()
                .map(|rule| Box::new(rule) as Box<dyn MountAdapter>)
                .collect(),
        }
    }

    /// Built-in rules followed by the configured ones.
    pub fn with_rules(extra: &[MountRuleConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for cfg in extra {
            registry.register(Box::new(MountRule::try_from(cfg)?));
        }
        Ok(registry)
    }

    /// Registry with no adapters at all.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Append an adapter after the existing ones.
    pub fn register(&mut self, adapter: Box<dyn MountAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapters whose marker occurs in any of the page's inline scripts.
    pub fn matching(&self, content: &ExtractedContent) -> Vec<&dyn MountAdapter> {
        self.adapters
            .iter()
            .map(|adapter| &**adapter)
            .filter(|adapter| {
                content
                    .scripts
                    .iter()
                    .filter_map(ScriptFragment::code)
                    .any(|code| adapter.detect(code))
            })
            .collect()
    }

    /// Re-home every detected visualization in `content`.
    ///
    /// Matching is decided on the scripts as extracted, before any rule
    /// rewrites them.
    #[instrument(skip_all, fields(path = %content.source_path.display()))]
    pub fn adapt(&self, content: ExtractedContent) -> ExtractedContent {
        let matched = self.matching(&content);
        if matched.is_empty() {
            return content;
        }

        let ExtractedContent {
            styles,
            mut scripts,
            mut body,
            section_name,
            source_path,
        } = content;

        for adapter in matched {
            scripts = scripts
                .into_iter()
                .map(|script| match script {
                    ScriptFragment::Inline { code } => ScriptFragment::Inline {
                        code: adapter.rewrite_script(&code),
                    },
                    external => external,
                })
                .collect();

            match adapter.rewrite_body(&body) {
                Some(rewritten) => {
                    debug!(adapter = adapter.name(), "container re-mounted");
                    body = rewritten;
                }
                None => debug!(adapter = adapter.name(), "no container to re-mount"),
            }
        }

        ExtractedContent {
            styles,
            scripts,
            body,
            section_name,
            source_path,
        }
    }
}

impl Default for MountRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Containers the page shell styles, keyed by the marker that implies them.
fn builtin_rules() -> Vec<MountRule> {
    let specs: [(&str, &str, &str, &str, Option<&str>); 3] = [
        (
            "force-graph",
            "forceSimulation",
            "connection-graph",
            "force-graph",
            Some("width: 100%; height: 400px;"),
        ),
        ("temporal-chart", "temporal-chart", "chart", "temporal-chart", None),
        (
            "structure-tree",
            "structure-diagram",
            "structure-diagram",
            "structure-tree",
            Some("width: 100%; height: 500px;"),
        ),
    ];

    specs
        .into_iter()
        .map(|(name, marker, old, new, sizing)| {
            MountRule::new(name, marker, old, new, sizing.map(String::from))
                .expect("valid built-in mount rule")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
