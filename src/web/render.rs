//! Template rendering
//!
//! Templates are compiled into the binary and loaded into a single Tera
//! instance at startup.

use anyhow::{Context as _, Result};
use rust_embed::RustEmbed;
use std::error::Error as _;
use tera::{Context, Tera};

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load every embedded template
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name)
                .with_context(|| format!("Embedded template vanished: {}", name))?;
            let content = String::from_utf8(file.data.into_owned())
                .with_context(|| format!("Template is not valid UTF-8: {}", name))?;
            templates.push((name.into_owned(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .context("Failed to compile templates")?;
        tracing::debug!(count = tera.get_template_names().count(), "Templates loaded");

        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut message = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                message.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            anyhow::anyhow!(message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let renderer = Renderer::new().unwrap();
        let names: Vec<&str> = renderer.tera.get_template_names().collect();
        assert!(names.contains(&"base.html"));
        assert!(names.contains(&"posts/detail.html"));
    }

    #[test]
    fn test_render_missing_template() {
        let renderer = Renderer::new().unwrap();
        let err = renderer.render("nope.html", &Context::new()).unwrap_err();
        assert!(err.to_string().contains("nope.html"));
    }
}
