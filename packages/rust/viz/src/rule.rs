//! Table-driven mount rule: marker → container class rename.

use regex::{Captures, Regex};

use datawalker_shared::{DatawalkerError, MountRuleConfig, Result};

use super::MountAdapter;

/// A visualization container contract.
///
/// When `marker` occurs in a page's inline script, the page's scripts are
/// pointed at `.new_class` instead of `.old_class`, and the page's first
/// `old_class` container is renamed to match.
#[derive(Debug, Clone)]
pub struct MountRule {
    name: String,
    marker: String,
    old_class: String,
    new_class: String,
    sizing: Option<String>,
    /// Quoted `.old_class` selector literals.
    selector_re: Regex,
    /// Opening tag whose class list holds `old_class`.
    container_re: Regex,
    /// Any class list holding `new_class`.
    new_class_re: Regex,
}

impl MountRule {
    /// Compile a rule. Class names must be single tokens.
    pub fn new(
        name: impl Into<String>,
        marker: impl Into<String>,
        old_class: impl Into<String>,
        new_class: impl Into<String>,
        sizing: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let marker = marker.into();
        let old_class = old_class.into();
        let new_class = new_class.into();

        if marker.is_empty() || old_class.is_empty() || new_class.is_empty() {
            return Err(DatawalkerError::validation(format!(
                "mount rule '{name}' needs a marker, old class and new class"
            )));
        }
        if old_class.contains(char::is_whitespace) || new_class.contains(char::is_whitespace) {
            return Err(DatawalkerError::validation(format!(
                "mount rule '{name}' classes must be single class names"
            )));
        }

        let old = regex::escape(&old_class);
        let new = regex::escape(&new_class);

        let selector_re = compile(&name, &format!(r#"'\.{old}'|"\.{old}"|`\.{old}`"#))?;
        let container_re = compile(
            &name,
            &format!(
                r#"(?P<open><[A-Za-z][A-Za-z0-9-]*[^>]*?\sclass=")(?P<before>(?:[^"]*?\s)?){old}(?P<after>(?:\s[^"]*)?)"(?P<rest>[^>]*>)"#
            ),
        )?;
        let new_class_re = compile(&name, &format!(r#"\sclass="(?:[^"]*\s)?{new}(?:\s[^"]*)?""#))?;

        Ok(Self {
            name,
            marker,
            old_class,
            new_class,
            sizing,
            selector_re,
            container_re,
            new_class_re,
        })
    }

    pub fn old_class(&self) -> &str {
        &self.old_class
    }

    pub fn new_class(&self) -> &str {
        &self.new_class
    }

    pub fn sizing(&self) -> Option<&str> {
        self.sizing.as_deref()
    }
}

impl TryFrom<&MountRuleConfig> for MountRule {
    type Error = DatawalkerError;

    fn try_from(cfg: &MountRuleConfig) -> Result<Self> {
        Self::new(
            cfg.name.clone(),
            cfg.marker.clone(),
            cfg.old_class.clone(),
            cfg.new_class.clone(),
            cfg.sizing.clone(),
        )
    }
}

impl MountAdapter for MountRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, code: &str) -> bool {
        code.contains(self.marker.as_str())
    }

    fn rewrite_script(&self, code: &str) -> String {
        self.selector_re
            .replace_all(code, |caps: &Captures| {
                let quote = &caps[0][..1];
                format!("{quote}.{}{quote}", self.new_class)
            })
            .into_owned()
    }

    fn rewrite_body(&self, body: &str) -> Option<String> {
        if self.new_class_re.is_match(body) {
            return None;
        }

        let caps = self.container_re.captures(body)?;
        let whole = caps.get(0)?;
        let rest = &caps["rest"];

        let style = match &self.sizing {
            Some(sizing) if !caps["open"].contains(" style=") && !rest.contains(" style=") => {
                format!(r#" style="{sizing}""#)
            }
            _ => String::new(),
        };

        let tag = format!(
            r#"{}{}{}{}"{style}{rest}"#,
            &caps["open"], &caps["before"], self.new_class, &caps["after"],
        );

        let mut out = String::with_capacity(body.len() + tag.len());
        out.push_str(&body[..whole.start()]);
        out.push_str(&tag);
        out.push_str(&body[whole.end()..]);
        Some(out)
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| DatawalkerError::validation(format!("mount rule '{name}': {e}")))
}
