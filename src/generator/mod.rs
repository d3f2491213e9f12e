//! Generator module - renders pages into the public directory
//!
//! Rendering is a pure function of normalized documents; fetching lives in
//! the commands and the server. That split keeps every template testable
//! without a network.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;
use url::Url;

use crate::config::SiteConfig;
use crate::content::{richtext, ContentBlock, Document, NavDoc};
use crate::helpers;
use crate::templates::{PostBlock, PostItem, PostPage, TemplateRenderer, STYLESHEET};

/// Renders listing and article pages with the embedded theme
pub struct Generator {
    config: SiteConfig,
    public_dir: PathBuf,
    renderer: TemplateRenderer,
}

impl Generator {
    pub fn new(config: &SiteConfig, public_dir: &Path) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            public_dir: public_dir.to_path_buf(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Common template variables
    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site_title", &richtext::escape_html(&self.config.title));
        context.insert(
            "site_description",
            &richtext::escape_html(&self.config.description),
        );
        context.insert("language", &self.config.language);
        context
    }

    /// Build a listing entry from a normalized document
    pub fn post_item(&self, doc: &Document) -> PostItem {
        PostItem {
            uid: doc.uid.clone(),
            title: richtext::escape_html(&doc.data.title),
            subtitle: richtext::escape_html(&doc.data.subtitle),
            author: richtext::escape_html(&doc.data.author),
            date: helpers::format_date(&doc.first_publication_date),
        }
    }

    /// Render one listing entry fragment (also served by the load-more API)
    pub fn render_post_item(&self, doc: &Document) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &self.post_item(doc));
        self.renderer.render("partials/post_item.html", &context)
    }

    /// Render the listing page with its embedded load-more cursor
    pub fn render_listing(&self, docs: &[Document], next_page: Option<&Url>) -> Result<String> {
        let items: Vec<PostItem> = docs.iter().map(|d| self.post_item(d)).collect();

        let mut context = self.base_context();
        context.insert("posts", &items);
        context.insert(
            "next_page",
            &next_page.map(|u| richtext::escape_html(u.as_str())),
        );
        self.renderer.render("index.html", &context)
    }

    /// Render an article page
    pub fn render_post(
        &self,
        doc: &Document,
        prev: Option<&NavDoc>,
        next: Option<&NavDoc>,
        preview: bool,
    ) -> Result<String> {
        let blocks: Vec<PostBlock> = doc
            .data
            .content
            .iter()
            .map(|block: &ContentBlock| PostBlock {
                heading: richtext::escape_html(&block.heading),
                html: richtext::as_html(&block.body),
            })
            .collect();

        let page = PostPage {
            uid: doc.uid.clone(),
            title: richtext::escape_html(&doc.data.title),
            author: richtext::escape_html(&doc.data.author),
            banner_url: doc.data.banner.url.clone(),
            date: helpers::format_date(&doc.first_publication_date),
            read_time: helpers::read_time_minutes(&doc.data.content),
            edited_at: doc
                .edited()
                .then(|| helpers::format_datetime(&doc.last_publication_date)),
            blocks,
        };

        let mut context = self.base_context();
        context.insert("post", &page);
        context.insert("prev", &prev);
        context.insert("next", &next);
        context.insert("preview", &preview);
        self.renderer.render("post.html", &context)
    }

    /// Render the loading placeholder shown while a page is being built
    pub fn render_fallback(&self) -> Result<String> {
        self.renderer.render("fallback.html", &self.base_context())
    }

    /// Render the not-found page
    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context())
    }

    /// Write the listing page to `index.html`
    pub fn write_listing(&self, docs: &[Document], next_page: Option<&Url>) -> Result<PathBuf> {
        let html = self.render_listing(docs, next_page)?;
        self.write_file("index.html", &html)
    }

    /// Write an article page to `post/<uid>/index.html`
    pub fn write_post(
        &self,
        doc: &Document,
        prev: Option<&NavDoc>,
        next: Option<&NavDoc>,
    ) -> Result<PathBuf> {
        let html = self.render_post(doc, prev, next, false)?;
        self.write_file(&format!("post/{}/index.html", doc.uid), &html)
    }

    /// Write the embedded static assets
    pub fn write_assets(&self) -> Result<()> {
        self.write_file("assets/style.css", STYLESHEET)?;
        Ok(())
    }

    fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let output_path = self.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Banner, DocumentData};
    use crate::content::richtext::RichTextNode;
    use chrono::{TimeZone, Utc};

    fn sample_doc(uid: &str, edited: bool) -> Document {
        let published = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        let last = if edited {
            Utc.with_ymd_and_hms(2021, 3, 19, 15, 49, 0).unwrap()
        } else {
            published
        };
        Document {
            uid: uid.to_string(),
            first_publication_date: published,
            last_publication_date: last,
            data: DocumentData {
                title: "Como utilizar Hooks".to_string(),
                subtitle: "Pensando em sincronização".to_string(),
                author: "Joseph Oliveira".to_string(),
                banner: Banner {
                    url: "https://images.example.com/banner.png".to_string(),
                },
                content: vec![ContentBlock {
                    heading: "Proin et varius".to_string(),
                    body: vec![RichTextNode::paragraph("hello world foo")],
                }],
            },
        }
    }

    fn generator(dir: &Path) -> Generator {
        Generator::new(&SiteConfig::default(), dir).unwrap()
    }

    #[test]
    fn test_listing_with_cursor_shows_load_more() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());
        let cursor = Url::parse("https://example.cdn.prismic.io/api/v2/documents/search?page=2")
            .unwrap();

        let html = gen
            .render_listing(&[sample_doc("hooks", false)], Some(&cursor))
            .unwrap();
        assert!(html.contains("Como utilizar Hooks"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(cursor.as_str()));
    }

    #[test]
    fn test_listing_without_cursor_has_no_load_more() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());

        let html = gen.render_listing(&[sample_doc("hooks", false)], None).unwrap();
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_post_page_read_time_and_edited_marker() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());

        let html = gen.render_post(&sample_doc("hooks", true), None, None, false).unwrap();
        assert!(html.contains("1 min"));
        assert!(html.contains("* editado em 19 mar 2021, às 15:49"));

        let html = gen.render_post(&sample_doc("hooks", false), None, None, false).unwrap();
        assert!(!html.contains("* editado em"));
    }

    #[test]
    fn test_post_page_neighbor_links() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());
        let next = NavDoc {
            uid: "criando-um-app".to_string(),
            title: "Criando um app".to_string(),
        };

        let html = gen
            .render_post(&sample_doc("hooks", false), None, Some(&next), false)
            .unwrap();
        assert!(!html.contains("Post anterior"));
        assert!(html.contains("Próximo post"));
        assert!(html.contains("/post/criando-um-app"));
    }

    #[test]
    fn test_preview_exit_link() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());

        let html = gen.render_post(&sample_doc("hooks", false), None, None, true).unwrap();
        assert!(html.contains("/api/exit-preview"));

        let html = gen.render_post(&sample_doc("hooks", false), None, None, false).unwrap();
        assert!(!html.contains("/api/exit-preview"));
    }

    #[test]
    fn test_write_post_layout_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path());

        let path = gen.write_post(&sample_doc("hooks", false), None, None).unwrap();
        assert_eq!(path, dir.path().join("post/hooks/index.html"));
        assert!(path.exists());
    }
}
