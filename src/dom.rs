//! Thin query layer over [`scraper`] used by the extractors.
//!
//! Elements are located with CSS selectors and read back as attributes, text,
//! or content fragments. Nothing here knows about the portal's markup.

use itertools::Itertools;
use scraper::{ElementRef, Html, Node, Selector};

/// A parsed page.
///
/// Parsing never fails; malformed markup is repaired the way a browser
/// would repair it.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document, typically a driver's page source.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// First element anywhere in the document matching `selector`.
    pub fn find(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }
}

/// First descendant of `scope` matching `selector`.
pub fn find<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// All descendants of `scope` matching `selector`, in document order.
pub fn find_all<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// Value of attribute `name` on `element`, if present.
pub fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}

/// How text nodes under an element are combined.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Placed between consecutive text nodes.
    pub separator: &'static str,
    /// Trim each text node and drop the ones left empty.
    pub strip: bool,
}

impl TextOptions {
    /// Trimmed text nodes glued together, e.g. `"<b>Big</b> news"` -> `"Bignews"`.
    pub const STRIPPED: Self = Self {
        separator: "",
        strip: true,
    };

    /// Trimmed text nodes, one per line.
    pub const LINES: Self = Self {
        separator: "\n",
        strip: true,
    };
}

/// All text under `element`, combined according to `options`.
///
/// # Arguments
///
/// * `element` - Root of the subtree to read
/// * `options` - Separator and per-node trimming
///
/// # Returns
///
/// The joined text; an element without text gives `""`.
///
/// # Examples
///
/// ```ignore
/// // <div><p> First </p><p>Second</p></div>
/// assert_eq!(text(div, TextOptions::LINES), "First\nSecond");
/// assert_eq!(text(div, TextOptions::STRIPPED), "FirstSecond");
/// ```
pub fn text(element: ElementRef<'_>, options: TextOptions) -> String {
    if options.strip {
        element
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .join(options.separator)
    } else {
        element.text().join(options.separator)
    }
}

/// Text of `element` trimmed as a whole, or `None` when nothing is left.
pub fn trimmed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// The direct children of `element` as trimmed strings.
///
/// Blank text nodes (indentation between tags) are not fragments; child
/// elements always are, even when they carry no text.
///
/// # Examples
///
/// ```ignore
/// // <div>Reuters <i class="dot"></i> 2h ago</div>
/// assert_eq!(fragments(div), vec!["Reuters", "", "2h ago"]);
/// ```
pub fn fragments(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => {
                let t = t.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Node::Element(_) => ElementRef::wrap(child).map(|e| text(e, TextOptions::STRIPPED)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn test_find_scoped_and_global() {
        let doc = Document::parse(
            r#"<div id="a"><p class="x">one</p></div><div id="b"><p class="x">two</p></div>"#,
        );
        let b = doc.find(&sel("#b")).unwrap();
        let p = find(b, &sel("p.x")).unwrap();
        assert_eq!(trimmed_text(p).as_deref(), Some("two"));
        let body = doc.find(&sel("body")).unwrap();
        assert_eq!(find_all(body, &sel("p.x")).len(), 2);
        assert!(doc.find(&sel("#c")).is_none());
    }

    #[test]
    fn test_text_options() {
        let doc = Document::parse("<div id=t>\n  <p> First </p>\n  <p>Second</p>\n</div>");
        let div = doc.find(&sel("#t")).unwrap();
        assert_eq!(text(div, TextOptions::LINES), "First\nSecond");
        assert_eq!(text(div, TextOptions::STRIPPED), "FirstSecond");
        let raw = TextOptions {
            separator: "|",
            strip: false,
        };
        assert_eq!(text(div, raw), "\n  | First |\n  |Second|\n");
    }

    #[test]
    fn test_trimmed_text_empty_is_none() {
        let doc = Document::parse("<span id=s>   </span>");
        assert_eq!(trimmed_text(doc.find(&sel("#s")).unwrap()), None);
    }

    #[test]
    fn test_fragments_skip_blank_text() {
        let doc = Document::parse(
            "<div id=f>\n   Reuters\n   <i class=dot></i>\n   2h ago\n</div>",
        );
        let frags = fragments(doc.find(&sel("#f")).unwrap());
        assert_eq!(frags, vec!["Reuters", "", "2h ago"]);
    }

    #[test]
    fn test_attr() {
        let doc = Document::parse(r#"<a id=l href="/x" aria-label="Label">t</a>"#);
        let a = doc.find(&sel("#l")).unwrap();
        assert_eq!(attr(a, "aria-label").as_deref(), Some("Label"));
        assert_eq!(attr(a, "title"), None);
    }
}
