//! Placeholder template rendering
//!
//! Substitutes `{{ dotted.path }}` placeholders with values looked up in a
//! JSON context. Missing paths and `null` render empty, strings render
//! unquoted, anything else renders as compact JSON.

use crate::traits::TemplateRenderer;
use crate::types::Template;
use anyhow::Result;
use serde_json::Value;

/// Default renderer for escalation templates
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a template source against a context
    pub fn render(&self, source: &str, context: &Value) -> String {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let path = after[..end].trim();
                    if let Some(value) = lookup(context, path) {
                        push_value(&mut out, value);
                    }
                    rest = &after[end + 2..];
                },
                None => {
                    // Unterminated placeholder, keep it literally
                    out.push_str(&rest[start..]);
                    rest = "";
                },
            }
        }
        out.push_str(rest);
        out
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render_subject(&self, template: &Template, context: &Value) -> Result<String> {
        Ok(self.render(&template.subject, context))
    }

    fn render_body(&self, template: &Template, context: &Value) -> Result<String> {
        Ok(self.render(&template.body, context))
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(context, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {},
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}
