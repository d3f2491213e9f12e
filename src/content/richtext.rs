//! Rich-text rendering
//!
//! The backend delivers article bodies as a flat sequence of typed text
//! nodes with character-offset span annotations. This module turns that
//! representation into HTML, and extracts plain text for word counting.
//!
//! Unknown node or span kinds are not an error: they render as plain
//! paragraphs / unstyled text, so a newer backend schema degrades instead
//! of breaking article pages.

use serde::{Deserialize, Serialize};

/// One rich-text node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image nodes carry their source URL at the node level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextNode {
    /// A plain paragraph node
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: NodeKind::Paragraph,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

/// Node kinds understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(other)]
    Other,
}

/// An inline annotation over a character range of a node's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
}

/// Render a rich-text body to HTML.
///
/// Consecutive list items are grouped into a single `<ul>`/`<ol>`.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<NodeKind> = None;

    for node in nodes {
        let list_kind = match node.kind {
            NodeKind::ListItem | NodeKind::OrderedListItem => Some(node.kind),
            _ => None,
        };

        if open_list != list_kind {
            if let Some(kind) = open_list {
                html.push_str(list_close(kind));
            }
            if let Some(kind) = list_kind {
                html.push_str(list_open(kind));
            }
            open_list = list_kind;
        }

        match node.kind {
            NodeKind::Heading1 => wrap(&mut html, "h1", node),
            NodeKind::Heading2 => wrap(&mut html, "h2", node),
            NodeKind::Heading3 => wrap(&mut html, "h3", node),
            NodeKind::Heading4 => wrap(&mut html, "h4", node),
            NodeKind::Heading5 => wrap(&mut html, "h5", node),
            NodeKind::Heading6 => wrap(&mut html, "h6", node),
            NodeKind::Preformatted => wrap(&mut html, "pre", node),
            NodeKind::ListItem | NodeKind::OrderedListItem => wrap(&mut html, "li", node),
            NodeKind::Image => {
                let url = node.url.as_deref().unwrap_or("");
                let alt = node.alt.as_deref().unwrap_or("");
                html.push_str(&format!(
                    r#"<img src="{}" alt="{}">"#,
                    escape_html(url),
                    escape_html(alt)
                ));
            }
            NodeKind::Paragraph | NodeKind::Other => wrap(&mut html, "p", node),
        }
    }

    if let Some(kind) = open_list {
        html.push_str(list_close(kind));
    }

    html
}

/// Extract the plain text of a body, one node per line
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_open(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::OrderedListItem => "<ol>",
        _ => "<ul>",
    }
}

fn list_close(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::OrderedListItem => "</ol>",
        _ => "</ul>",
    }
}

fn wrap(html: &mut String, tag: &str, node: &RichTextNode) {
    html.push('<');
    html.push_str(tag);
    html.push('>');
    html.push_str(&render_spans(&node.text, &node.spans));
    html.push_str("</");
    html.push_str(tag);
    html.push('>');
}

/// Apply span annotations to a node's text.
///
/// Offsets are character positions. At every position, spans ending there
/// are closed (innermost first) before new spans open.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for pos in 0..=chars.len() {
        let mut closing: Vec<&Span> = spans.iter().filter(|s| s.end == pos).collect();
        closing.sort_by(|a, b| b.start.cmp(&a.start));
        for span in closing {
            out.push_str(close_tag(span));
        }

        let mut opening: Vec<&Span> = spans.iter().filter(|s| s.start == pos).collect();
        opening.sort_by(|a, b| b.end.cmp(&a.end));
        for span in opening {
            out.push_str(&open_tag(span));
        }

        if let Some(&c) = chars.get(pos) {
            push_escaped(&mut out, c);
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let url = span
                .data
                .as_ref()
                .and_then(|d| d.url.as_deref())
                .unwrap_or("");
            format!(r#"<a href="{}">"#, escape_html(url))
        }
        SpanKind::Other => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Other => "",
    }
}

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, text: &str) -> RichTextNode {
        RichTextNode {
            kind,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let nodes = vec![
            node(NodeKind::Heading2, "Title"),
            node(NodeKind::Paragraph, "Body text"),
        ];
        assert_eq!(as_html(&nodes), "<h2>Title</h2><p>Body text</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let nodes = vec![node(NodeKind::Paragraph, "a < b & c")];
        assert_eq!(as_html(&nodes), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_spans() {
        let mut n = node(NodeKind::Paragraph, "hello world");
        n.spans = vec![
            Span {
                start: 0,
                end: 5,
                kind: SpanKind::Strong,
                data: None,
            },
            Span {
                start: 6,
                end: 11,
                kind: SpanKind::Em,
                data: None,
            },
        ];
        assert_eq!(
            as_html(&[n]),
            "<p><strong>hello</strong> <em>world</em></p>"
        );
    }

    #[test]
    fn test_hyperlink_span() {
        let mut n = node(NodeKind::Paragraph, "see docs");
        n.spans = vec![Span {
            start: 4,
            end: 8,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                url: Some("https://example.com".to_string()),
            }),
        }];
        assert_eq!(
            as_html(&[n]),
            r#"<p>see <a href="https://example.com">docs</a></p>"#
        );
    }

    #[test]
    fn test_span_offsets_are_character_based() {
        let mut n = node(NodeKind::Paragraph, "café bom");
        n.spans = vec![Span {
            start: 5,
            end: 8,
            kind: SpanKind::Strong,
            data: None,
        }];
        assert_eq!(as_html(&[n]), "<p>café <strong>bom</strong></p>");
    }

    #[test]
    fn test_list_grouping() {
        let nodes = vec![
            node(NodeKind::ListItem, "one"),
            node(NodeKind::ListItem, "two"),
            node(NodeKind::Paragraph, "after"),
        ];
        assert_eq!(
            as_html(&nodes),
            "<ul><li>one</li><li>two</li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_unknown_kind_degrades_to_paragraph() {
        let json = r#"[{"type": "embed", "text": "x"}]"#;
        let nodes: Vec<RichTextNode> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes[0].kind, NodeKind::Other);
        assert_eq!(as_html(&nodes), "<p>x</p>");
    }

    #[test]
    fn test_as_text() {
        let nodes = vec![
            node(NodeKind::Paragraph, "hello world"),
            node(NodeKind::Paragraph, "foo"),
        ];
        assert_eq!(as_text(&nodes), "hello world\nfoo");
    }
}
