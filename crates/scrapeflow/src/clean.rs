//! HTML cleaning utilities
//!
//! Turns rendered HTML into newline-separated plain text: boilerplate
//! elements are removed from the tree, the most content-like region is
//! selected and its text nodes are joined line by line.

use scraper::{ElementRef, Html, Selector};

/// Elements removed (with their whole subtree) before extraction
pub const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript",
];

/// Content regions, in order of preference
const CONTENT_SELECTORS: &[&str] = &["main", "article", "body"];

/// Clean rendered HTML into normalized plain text
pub fn clean_html(html: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_elements(&mut document, STRIPPED_TAGS);

    let root = select_content_root(&document);
    normalize_lines(&extract_text(root))
}

/// Detach every element matching one of `tags` from the document tree
fn strip_elements(document: &mut Html, tags: &[&str]) {
    let Ok(selector) = Selector::parse(&tags.join(", ")) else {
        return;
    };

    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        // Nested matches may sit inside an already detached subtree; detaching again is a no-op
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Pick `<main>`, then `<article>`, then `<body>`, then the whole document
fn select_content_root(document: &Html) -> ElementRef<'_> {
    for sel_str in CONTENT_SELECTORS {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(el) = document.select(&sel).next() {
                return el;
            }
        }
    }
    document.root_element()
}

/// Join the trimmed, non-empty text nodes under `root` with newlines
fn extract_text(root: ElementRef<'_>) -> String {
    root.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop blank lines and trim the rest, keeping one line per line
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lines() {
        assert_eq!(normalize_lines("A\n\n\nB\n"), "A\nB");
        assert_eq!(normalize_lines("  one  \n \t \n two"), "one\ntwo");
        assert_eq!(normalize_lines(""), "");
        assert_eq!(normalize_lines("\n\n\n"), "");
    }

    #[test]
    fn test_strips_boilerplate_elements() {
        let html = r#"<html><head><style>.x { color: red }</style></head><body>
            <header>Site Header</header>
            <nav>Home | About</nav>
            <p>Real content</p>
            <script>alert('bad');</script>
            <aside>Related links</aside>
            <iframe>frame text</iframe>
            <noscript>Enable JS</noscript>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = clean_html(html);
        assert_eq!(text, "Real content");
    }

    #[test]
    fn test_prefers_main_over_body() {
        let html = r#"<html><body>
            <div>Sidebar text</div>
            <main><h1>Title</h1><p>Main text</p></main>
        </body></html>"#;

        let text = clean_html(html);
        assert_eq!(text, "Title\nMain text");
        assert!(!text.contains("Sidebar"));
    }

    #[test]
    fn test_falls_back_to_article() {
        let html = r#"<html><body>
            <div>Outside</div>
            <article><p>Story</p></article>
        </body></html>"#;

        assert_eq!(clean_html(html), "Story");
    }

    #[test]
    fn test_main_wins_over_article() {
        let html = r#"<html><body>
            <article>First article</article>
            <main>Main region</main>
        </body></html>"#;

        assert_eq!(clean_html(html), "Main region");
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><head><title>Ignored</title></head><body><p>One</p><p>Two</p></body></html>";
        assert_eq!(clean_html(html), "One\nTwo");
    }

    #[test]
    fn test_fragment_without_structure() {
        // html5ever synthesizes <html>/<body> around bare text
        assert_eq!(clean_html("just text"), "just text");
    }

    #[test]
    fn test_stripped_tags_inside_main() {
        let html = r#"<main><p>Keep</p><nav>Drop</nav><style>p{}</style></main>"#;
        assert_eq!(clean_html(html), "Keep");
    }

    #[test]
    fn test_nested_stripped_tags() {
        let html = r#"<body><header><nav>menu</nav>brand</header><p>Body</p></body>"#;
        assert_eq!(clean_html(html), "Body");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<body><p>Fish &amp; Chips &lt;3</p></body>";
        assert_eq!(clean_html(html), "Fish & Chips <3");
    }

    #[test]
    fn test_malformed_html_degrades() {
        let html = "<body><p>Unclosed <b>bold<p>Next";
        let text = clean_html(html);
        assert!(text.contains("Unclosed"));
        assert!(text.contains("bold"));
        assert!(text.contains("Next"));
    }

    #[test]
    fn test_inner_text_whitespace_collapsed_per_line() {
        let html = "<body><pre>\n  line one\n\n\n  line two\n</pre></body>";
        assert_eq!(clean_html(html), "line one\nline two");
    }
}
