//! Readable-text extraction from HTML

use scraper::{ElementRef, Html, Selector};

/// Elements whose text counts as a content block.
const BLOCK_TAGS: [&str; 10] = [
    "h1", "h2", "h3", "h4", "p", "li", "pre", "blockquote", "td", "dd",
];

/// Containers tried, in order, as the content root.
const ROOT_TAGS: [&str; 3] = ["article", "main", "body"];

/// Text under these never counts.
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Turns a fetched document into plain text. CPU-bound; callers run it off
/// the async executor.
pub trait TextExtractor: Send + Sync {
    /// `None` (or empty text) means nothing readable was found.
    fn extract(&self, html: &str) -> Option<String>;
}

impl<F> TextExtractor for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn extract(&self, html: &str) -> Option<String> {
        self(html)
    }
}

/// Default extractor built on `scraper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        extract_readable_text(html)
    }
}

pub fn extract_readable_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let root = ROOT_TAGS.iter().find_map(|tag| {
        Selector::parse(tag)
            .ok()
            .and_then(|sel| document.select(&sel).next())
    })?;

    let block_sel = Selector::parse(&BLOCK_TAGS.join(", ")).ok()?;

    let blocks: Vec<String> = root
        .select(&block_sel)
        .filter(|elem| !inside_block(elem))
        .map(|elem| compact_ws(&visible_text(elem)))
        .filter(|text| !text.is_empty())
        .collect();

    let text = if blocks.is_empty() {
        compact_ws(&visible_text(root))
    } else {
        blocks.join("\n")
    };

    (!text.is_empty()).then_some(text)
}

fn inside_block(elem: &ElementRef<'_>) -> bool {
    elem.ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|e| BLOCK_TAGS.contains(&e.name()))
}

fn visible_text(elem: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in elem.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| SKIP_TAGS.contains(&e.name()));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
