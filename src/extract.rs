//! Page content extraction.
//!
//! Turns a DOM snapshot (the page's outer HTML) into an [`ExtractedContent`]
//! record: title, meta description, headings, main text, links, and images.
//! Extraction is pure and side-effect free; degenerate documents produce
//! empty fields rather than errors.

use crate::types::{ExtractedContent, Heading, ImageRef, LinkRef, PageInfo};
use chrono::{SecondsFormat, Utc};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Maximum characters of main text kept per page.
pub const MAX_TEXT_CHARS: usize = 100_000;

/// Maximum links kept per page, in document order.
pub const MAX_LINKS: usize = 20;

/// Maximum images kept per page, in document order.
pub const MAX_IMAGES: usize = 10;

/// Maximum characters of body text in the lightweight page-info path.
pub const PAGE_INFO_TEXT_CHARS: usize = 5_000;

/// Selectors tried in priority order to find the main content root.
const CONTENT_ROOT_SELECTORS: &[&str] = &["main", "article", "#content", ".content"];

/// Extract readable content from a page's HTML.
///
/// `page_url` is the tab's URL, used to resolve relative link and image
/// targets to absolute URLs.
pub fn extract_content(html: &str, page_url: &str) -> ExtractedContent {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    ExtractedContent {
        title: document_title(&document),
        meta_description: meta_description(&document),
        headings: headings(&document),
        text_content: main_text(&document),
        links: links(&document, base.as_ref()),
        images: images(&document, base.as_ref()),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Lightweight companion path: title, URL, and the first
/// [`PAGE_INFO_TEXT_CHARS`] characters of body text.
pub fn page_info(html: &str, page_url: &str) -> PageInfo {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").unwrap();

    let mut text = match document.select(&body).next() {
        Some(el) => element_text(el),
        None => String::new(),
    };
    truncate_chars(&mut text, PAGE_INFO_TEXT_CHARS);

    PageInfo {
        title: document_title(&document),
        url: page_url.to_string(),
        text_content: text,
    }
}

fn document_title(document: &Html) -> String {
    let title = Selector::parse("title").unwrap();
    document
        .select(&title)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

fn meta_description(document: &Html) -> String {
    let meta = Selector::parse(r#"meta[name="description"]"#).unwrap();
    document
        .select(&meta)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

fn headings(document: &Html) -> Vec<Heading> {
    let selector = Selector::parse("h1, h2, h3").unwrap();
    document
        .select(&selector)
        .filter_map(|el| {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if text.is_empty() {
                return None;
            }
            Some(Heading {
                level: el.value().name().to_lowercase(),
                text,
            })
        })
        .collect()
}

/// Main text: first match of the content-root chain, else body, else the
/// document root, with script/style subtrees skipped.
fn main_text(document: &Html) -> String {
    let root = CONTENT_ROOT_SELECTORS
        .iter()
        .find_map(|css| {
            let selector = Selector::parse(css).unwrap();
            document.select(&selector).next()
        })
        .or_else(|| {
            let body = Selector::parse("body").unwrap();
            document.select(&body).next()
        })
        .unwrap_or_else(|| document.root_element());

    let mut text = element_text(root);
    truncate_chars(&mut text, MAX_TEXT_CHARS);
    text
}

fn links(document: &Html, base: Option<&Url>) -> Vec<LinkRef> {
    let selector = Selector::parse("a[href]").unwrap();
    document
        .select(&selector)
        .filter_map(|el| {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if text.is_empty() {
                return None;
            }
            let href = el.value().attr("href")?;
            Some(LinkRef {
                text,
                url: resolve_url(base, href),
            })
        })
        .take(MAX_LINKS)
        .collect()
}

fn images(document: &Html, base: Option<&Url>) -> Vec<ImageRef> {
    let selector = Selector::parse("img[src]").unwrap();
    document
        .select(&selector)
        .filter_map(|el| {
            let src = el.value().attr("src")?;
            if src.trim().is_empty() {
                return None;
            }
            Some(ImageRef {
                alt: el.value().attr("alt").unwrap_or_default().to_string(),
                src: resolve_url(base, src),
            })
        })
        .take(MAX_IMAGES)
        .collect()
}

/// Resolve a possibly-relative target against the page URL. Targets the
/// base cannot absorb (unknown schemes, missing base) pass through verbatim.
fn resolve_url(base: Option<&Url>, raw: &str) -> String {
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// Rendered text of an element with script/style/noscript subtrees skipped
/// and whitespace runs collapsed.
fn element_text(el: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style" | "noscript") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                    // Element boundaries separate words in rendered text
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate in place to at most `max` characters, on a char boundary.
fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html>
        <head>
            <title>  Test   Page </title>
            <meta name="description" content="A page for tests">
        </head>
        <body>
            <h1>Top</h1>
            <h2>   </h2>
            <h3>Sub <em>heading</em></h3>
            <nav><a href="/home">Home</a></nav>
            <main>
                <p>Main body text.</p>
                <script>var hidden = "should not appear";</script>
                <a href="https://other.example/x">Other</a>
                <a href="relative/path">Relative</a>
                <a href="#frag"></a>
                <img src="/logo.png" alt="Logo">
                <img src="" alt="empty">
            </main>
        </body>
    </html>"##;

    #[test]
    fn test_title_and_meta() {
        let content = extract_content(PAGE, "https://example.com/page");
        assert_eq!(content.title, "Test Page");
        assert_eq!(content.meta_description, "A page for tests");
    }

    #[test]
    fn test_headings_skip_empty() {
        let content = extract_content(PAGE, "https://example.com/page");
        let levels: Vec<&str> = content.headings.iter().map(|h| h.level.as_str()).collect();
        assert_eq!(levels, ["h1", "h3"]);
        assert_eq!(content.headings[1].text, "Sub heading");
    }

    #[test]
    fn test_main_content_root_preferred_over_body() {
        let content = extract_content(PAGE, "https://example.com/page");
        assert!(content.text_content.contains("Main body text."));
        // Text outside <main> is not part of the content root
        assert!(!content.text_content.contains("Home"));
    }

    #[test]
    fn test_script_text_excluded() {
        let content = extract_content(PAGE, "https://example.com/page");
        assert!(!content.text_content.contains("should not appear"));
    }

    #[test]
    fn test_links_resolved_and_filtered() {
        let content = extract_content(PAGE, "https://example.com/dir/page");
        let urls: Vec<&str> = content.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://example.com/home",
                "https://other.example/x",
                "https://example.com/dir/relative/path",
            ]
        );
        // The empty-text fragment link is excluded
        assert!(content.links.iter().all(|l| !l.text.is_empty()));
    }

    #[test]
    fn test_images_resolved_and_filtered() {
        let content = extract_content(PAGE, "https://example.com/page");
        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].src, "https://example.com/logo.png");
        assert_eq!(content.images[0].alt, "Logo");
    }

    #[test]
    fn test_link_cap() {
        let mut html = String::from("<html><body>");
        for i in 0..40 {
            html.push_str(&format!(r#"<a href="/p{i}">link {i}</a>"#));
        }
        html.push_str("</body></html>");

        let content = extract_content(&html, "https://example.com/");
        assert_eq!(content.links.len(), MAX_LINKS);
        assert_eq!(content.links[0].text, "link 0");
    }

    #[test]
    fn test_image_cap() {
        let mut html = String::from("<html><body>");
        for i in 0..25 {
            html.push_str(&format!(r#"<img src="/i{i}.png" alt="i{i}">"#));
        }
        html.push_str("</body></html>");

        let content = extract_content(&html, "https://example.com/");
        assert_eq!(content.images.len(), MAX_IMAGES);
    }

    #[test]
    fn test_text_truncation() {
        let big = "word ".repeat(40_000);
        let html = format!("<html><body><main>{}</main></body></html>", big);
        let content = extract_content(&html, "https://example.com/");
        assert!(content.text_content.chars().count() <= MAX_TEXT_CHARS);
    }

    #[test]
    fn test_degenerate_document() {
        let content = extract_content("", "https://example.com/");
        assert_eq!(content.title, "");
        assert_eq!(content.meta_description, "");
        assert!(content.headings.is_empty());
        assert!(content.links.is_empty());
    }

    #[test]
    fn test_fallback_to_body_without_content_root() {
        let html = "<html><body><p>plain body</p></body></html>";
        let content = extract_content(html, "https://example.com/");
        assert_eq!(content.text_content, "plain body");
    }

    #[test]
    fn test_content_root_priority_order() {
        let html = r#"<html><body>
            <div class="content">class text</div>
            <article>article text</article>
        </body></html>"#;
        let content = extract_content(html, "https://example.com/");
        assert_eq!(content.text_content, "article text");
    }

    #[test]
    fn test_unresolvable_href_kept_verbatim() {
        let html = r#"<html><body><a href="javascript:void(0)">Click</a></body></html>"#;
        let content = extract_content(html, "https://example.com/");
        assert_eq!(content.links[0].url, "javascript:void(0)");
    }

    #[test]
    fn test_page_info_truncates_body() {
        let big = "x".repeat(20_000);
        let html = format!(
            "<html><head><title>T</title></head><body>{}</body></html>",
            big
        );
        let info = page_info(&html, "https://example.com/");
        assert_eq!(info.title, "T");
        assert_eq!(info.url, "https://example.com/");
        assert_eq!(info.text_content.chars().count(), PAGE_INFO_TEXT_CHARS);
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let content = extract_content("<html></html>", "https://example.com/");
        assert!(chrono::DateTime::parse_from_rfc3339(&content.timestamp).is_ok());
    }
}
