//! Portable Text → HTML
//!
//! 所有文本都做 HTML 转义。连续的列表项合并为 `<ul>`/`<ol>`，按 `level` 嵌套。

use tera::escape_html;
use tracing::debug;

use crate::models::config::SanityConfig;
use crate::models::portable_text::{Block, CodeBlock, ImageBlock, ImageRef, Span, TextBlock};

const IMAGE_CDN: &str = "https://cdn.sanity.io/images";

#[derive(Debug, Clone, Default)]
pub struct PortableTextRenderer {
    /// 图片 URL 前缀，形如 `https://cdn.sanity.io/images/{project}/{dataset}`
    image_base: Option<String>,
}

impl PortableTextRenderer {
    pub fn new(image_base: Option<String>) -> Self {
        Self { image_base }
    }

    pub fn from_config(config: &SanityConfig) -> Self {
        let image_base = config
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|project| format!("{}/{}/{}", IMAGE_CDN, project, config.dataset));
        Self::new(image_base)
    }

    /// 渲染块序列
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        let mut lists: Vec<(&'static str, u32)> = Vec::new();

        for block in blocks {
            match block {
                Block::Text(text) if text.list_item.is_some() => {
                    let tag = match text.list_item.as_deref() {
                        Some("number") => "ol",
                        _ => "ul",
                    };
                    open_list_item(&mut out, &mut lists, tag, text.level());
                    self.render_spans(&mut out, text);
                }
                Block::Text(text) => {
                    close_lists(&mut out, &mut lists);
                    let tag = match text.style() {
                        style @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote") => style,
                        _ => "p",
                    };
                    out.push_str(&format!("<{}>", tag));
                    self.render_spans(&mut out, text);
                    out.push_str(&format!("</{}>", tag));
                }
                Block::Image(image) => {
                    close_lists(&mut out, &mut lists);
                    self.render_image(&mut out, image);
                }
                Block::Code(code) => {
                    close_lists(&mut out, &mut lists);
                    render_code(&mut out, code);
                }
                Block::Unknown => {
                    close_lists(&mut out, &mut lists);
                    debug!("Skipping unsupported Portable Text block");
                }
            }
        }

        close_lists(&mut out, &mut lists);
        out
    }

    fn render_spans(&self, out: &mut String, block: &TextBlock) {
        for span in &block.children {
            render_span(out, block, span);
        }
    }

    fn render_image(&self, out: &mut String, image: &ImageBlock) {
        let Some(base) = &self.image_base else {
            debug!("No image CDN configured, skipping image block");
            return;
        };
        let Some(asset) = image.asset.as_ref().and_then(|asset| ImageRef::parse(&asset.reference)) else {
            debug!("Image block without a valid asset reference");
            return;
        };

        out.push_str("<figure>");
        out.push_str(&format!(
            r#"<img src="{}/{}" width="{}" height="{}" alt="{}" loading="lazy"/>"#,
            base,
            asset.file_name(),
            asset.width,
            asset.height,
            escape_html(image.alt.as_deref().unwrap_or_default())
        ));
        if let Some(caption) = image.caption.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!("<figcaption>{}</figcaption>", escape_html(caption)));
        }
        out.push_str("</figure>");
    }
}

fn open_list_item(out: &mut String, lists: &mut Vec<(&'static str, u32)>, tag: &'static str, level: u32) {
    while let Some(&(open_tag, open_level)) = lists.last() {
        if open_level > level || (open_level == level && open_tag != tag) {
            out.push_str(&format!("</li></{}>", open_tag));
            lists.pop();
        } else {
            break;
        }
    }

    match lists.last() {
        Some(&(_, open_level)) if open_level == level => out.push_str("</li><li>"),
        _ => {
            out.push_str(&format!("<{}><li>", tag));
            lists.push((tag, level));
        }
    }
}

fn close_lists(out: &mut String, lists: &mut Vec<(&'static str, u32)>) {
    while let Some((tag, _)) = lists.pop() {
        out.push_str(&format!("</li></{}>", tag));
    }
}

fn render_span(out: &mut String, block: &TextBlock, span: &Span) {
    let mut open = String::new();
    let mut close = Vec::new();

    for mark in &span.marks {
        let tag = match mark.as_str() {
            "strong" => Some("strong"),
            "em" => Some("em"),
            "code" => Some("code"),
            "underline" => Some("u"),
            "strike-through" => Some("s"),
            _ => None,
        };
        if let Some(tag) = tag {
            open.push_str(&format!("<{}>", tag));
            close.push(format!("</{}>", tag));
            continue;
        }

        match block.mark_def(mark) {
            Some(def) if def.kind == "link" => {
                let Some(href) = def.href.as_deref().filter(|href| is_safe_href(href)) else {
                    continue;
                };
                let external = href.starts_with("http://") || href.starts_with("https://");
                open.push_str(&format!(r#"<a href="{}""#, escape_html(href)));
                if external {
                    open.push_str(r#" rel="noopener noreferrer""#);
                }
                if def.blank.unwrap_or(false) {
                    open.push_str(r#" target="_blank""#);
                }
                open.push('>');
                close.push("</a>".to_string());
            }
            _ => debug!("Ignoring unknown mark '{}'", mark),
        }
    }

    out.push_str(&open);
    out.push_str(&escape_html(&span.text).replace('\n', "<br/>"));
    for tag in close.iter().rev() {
        out.push_str(tag);
    }
}

fn render_code(out: &mut String, code: &CodeBlock) {
    let language: String = code
        .language
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if language.is_empty() {
        out.push_str("<pre><code>");
    } else {
        out.push_str(&format!(r#"<pre><code class="language-{}">"#, language));
    }
    out.push_str(&escape_html(&code.code));
    out.push_str("</code></pre>");
}

fn is_safe_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    !(lower.starts_with("javascript:") || lower.starts_with("data:") || lower.starts_with("vbscript:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocks(value: serde_json::Value) -> Vec<Block> {
        serde_json::from_value(value).unwrap()
    }

    fn paragraph(text: &str) -> serde_json::Value {
        json!({"_type": "block", "style": "normal", "children": [{"_type": "span", "text": text, "marks": []}], "markDefs": []})
    }

    #[test]
    fn test_paragraph_and_heading() {
        let html = PortableTextRenderer::default().render(&blocks(json!([
            {"_type": "block", "style": "h2", "children": [{"_type": "span", "text": "Title"}]},
            paragraph("Hello")
        ])));
        assert_eq!(html, "<h2>Title</h2><p>Hello</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = PortableTextRenderer::default().render(&blocks(json!([paragraph("<script>x</script> & more")])));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn test_marks_and_links() {
        let html = PortableTextRenderer::default().render(&blocks(json!([{
            "_type": "block",
            "children": [
                {"_type": "span", "text": "bold", "marks": ["strong"]},
                {"_type": "span", "text": " and ", "marks": []},
                {"_type": "span", "text": "link", "marks": ["l1", "em"]},
                {"_type": "span", "text": "bad", "marks": ["l2"]}
            ],
            "markDefs": [
                {"_key": "l1", "_type": "link", "href": "https://example.com"},
                {"_key": "l2", "_type": "link", "href": "javascript:alert(1)"}
            ]
        }])));

        assert_eq!(
            html,
            concat!(
                "<p><strong>bold</strong> and ",
                r#"<a href="https:&#x2F;&#x2F;example.com" rel="noopener noreferrer"><em>link</em></a>"#,
                "bad</p>"
            )
        );
    }

    #[test]
    fn test_lists_group_and_nest() {
        let item = |text: &str, kind: &str, level: u32| {
            json!({"_type": "block", "listItem": kind, "level": level, "children": [{"_type": "span", "text": text}]})
        };
        let html = PortableTextRenderer::default().render(&blocks(json!([
            item("a", "bullet", 1),
            item("b", "bullet", 2),
            item("c", "bullet", 1),
            item("one", "number", 1),
            paragraph("after")
        ])));

        assert_eq!(
            html,
            "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul><ol><li>one</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_image_block_uses_cdn() {
        let renderer = PortableTextRenderer::from_config(&SanityConfig {
            project_id: Some("proj".to_string()),
            ..SanityConfig::default()
        });
        let html = renderer.render(&blocks(json!([{
            "_type": "image",
            "asset": {"_ref": "image-abc-640x480-png"},
            "alt": "A \"quoted\" alt",
            "caption": "Caption"
        }])));

        assert!(html.starts_with("<figure><img src=\"https://cdn.sanity.io/images/proj/production/abc-640x480.png\""));
        assert!(html.contains(r#"width="640" height="480""#));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.ends_with("<figcaption>Caption</figcaption></figure>"));
    }

    #[test]
    fn test_image_without_project_is_skipped() {
        let html = PortableTextRenderer::default().render(&blocks(json!([
            {"_type": "image", "asset": {"_ref": "image-abc-640x480-png"}}
        ])));
        assert!(html.is_empty());
    }

    #[test]
    fn test_code_and_unknown_blocks() {
        let html = PortableTextRenderer::default().render(&blocks(json!([
            {"_type": "code", "code": "let x = 1 < 2;", "language": "rust"},
            {"_type": "callToAction", "label": "Buy"}
        ])));
        assert_eq!(html, r#"<pre><code class="language-rust">let x = 1 &lt; 2;</code></pre>"#);
    }
}
