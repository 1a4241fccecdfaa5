use std::collections::BTreeMap;

use handlebars::Handlebars;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::registry::{Registry, Template};

/// Key every stock template expects.
pub const IMAGE_NAME: &str = "image_name";

// A run of backslashes followed by a simple `{{name}}` expression. An odd
// number of backslashes escapes the braces.
const PLACEHOLDER_PATTERN: &str = r"(\\*)\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

// Handlebars keywords that look like placeholders but never read the context.
const KEYWORDS: [&str; 2] = ["else", "this"];

/// Values substituted into template bodies, keyed by placeholder name.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_image(image_name: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.insert(IMAGE_NAME, image_name);
        ctx
    }

    /// Sets `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Substitutes placeholders in the templates of one registry.
///
/// Every body is compiled up front, so a syntax error surfaces when the
/// renderer is built rather than halfway through a request. Rendering is
/// strict (a missing value is an error) and values are written verbatim,
/// never re-scanned or HTML-escaped.
pub struct Renderer {
    handlebars: Handlebars<'static>,
    placeholder: Regex,
}

impl Renderer {
    pub fn new(registry: &Registry) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        for template in registry.iter() {
            debug!("Compiling template: {}", template.name);
            handlebars.register_template_string(&template.name, &template.body)?;
        }

        Ok(Self {
            handlebars,
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// Placeholder names referenced by `template`, in order of first use.
    pub fn placeholders(&self, template: &Template) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for cap in self.placeholder.captures_iter(&template.body) {
            let escaped = cap[1].len() % 2 == 1;
            let name = &cap[2];
            if escaped || KEYWORDS.contains(&name) {
                continue;
            }
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Placeholders of `template` that `ctx` has no value for.
    pub fn missing(&self, template: &Template, ctx: &RenderContext) -> Vec<String> {
        self.placeholders(template)
            .into_iter()
            .filter(|name| !ctx.contains_key(name))
            .collect()
    }

    pub fn render(&self, template: &Template, ctx: &RenderContext) -> Result<String> {
        if !self.handlebars.has_template(&template.name) {
            return Err(Error::TemplateNotFound(template.name.clone()));
        }
        if let Some(name) = self.missing(template, ctx).into_iter().next() {
            return Err(Error::UnresolvedPlaceholder {
                template: template.name.clone(),
                name,
            });
        }
        Ok(self.handlebars.render(&template.name, ctx)?)
    }
}
