//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary; there is no theme
//! directory to resolve at run time.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// A listing entry, dates already localized for display
#[derive(Debug, Clone, Serialize)]
pub struct PostItem {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

/// One content block of an article, body already rendered to HTML
#[derive(Debug, Clone, Serialize)]
pub struct PostBlock {
    pub heading: String,
    pub html: String,
}

/// Full article page data
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub date: String,
    pub read_time: usize,
    /// Present only when the document was edited after publication
    pub edited_at: Option<String>,
    pub blocks: Vec<PostBlock>,
}

/// Stylesheet shipped with the generated site
pub const STYLESHEET: &str = include_str!("theme/style.css");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescaping is off: rich-text bodies are already HTML and the
        // plain-text fields are escaped when the context is built
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("fallback.html", include_str!("theme/fallback.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("theme/partials/post_item.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_parse() {
        // Tera validates templates at registration time
        TemplateRenderer::new().unwrap();
    }

    #[test]
    fn test_fallback_renders_loading_state() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site_title", "spacetraveling");
        let html = renderer.render("fallback.html", &context).unwrap();
        assert!(html.contains("Carregando..."));
    }
}
