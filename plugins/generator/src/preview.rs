//! Composes generated parts into one document

use html_escape::encode_double_quoted_attribute;
use webcraft_core::{HANDLER_SHIM, SHIM_ATTRIBUTE};

use crate::response::GeneratedSite;

pub const PREVIEW_TITLE: &str = "WebCraft Preview";

/// A standalone document: style framework, the generated CSS, the handler
/// shim, the body markup and the generated script, in that order
pub fn compose_preview_document(site: &GeneratedSite, style_framework_url: &str) -> String {
    let mut head = format!(
        "<meta charset=\"UTF-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>{}</title>\n",
        PREVIEW_TITLE
    );
    if !style_framework_url.trim().is_empty() {
        head.push_str(&format!(
            "<script src=\"{}\"></script>\n",
            encode_double_quoted_attribute(style_framework_url.trim())
        ));
    }
    head.push_str(&format!("<style>{}</style>\n", site.css));
    head.push_str(&format!("<script {}>{}</script>\n", SHIM_ATTRIBUTE, HANDLER_SHIM));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n{}</head>\n<body>\n{}\n<script>{}</script>\n</body>\n</html>\n",
        head, site.html, site.js
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcraft_core::{Document, ExportConfig, Exporter};

    fn site() -> GeneratedSite {
        GeneratedSite {
            html: "<main><button onclick=\"go()\">Go</button></main>".to_string(),
            css: "main { padding: 1rem; }".to_string(),
            js: "function go() {}".to_string(),
        }
    }

    #[test]
    fn test_document_layout() {
        let html = compose_preview_document(&site(), "https://cdn.tailwindcss.com");
        let doc = Document::parse(&html);
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();

        let scripts = doc.elements_by_tag("script");
        assert_eq!(scripts.len(), 3);
        assert_eq!(doc.get_attribute(scripts[0], "src"), Some("https://cdn.tailwindcss.com"));
        assert!(doc.has_attribute(scripts[1], SHIM_ATTRIBUTE));
        assert_eq!(doc.parent(scripts[1]), Some(head));
        assert_eq!(doc.parent(scripts[2]), Some(body));
        assert_eq!(doc.inner_html(scripts[2]), "function go() {}");

        let style = doc.first_element_by_tag("style").unwrap();
        assert_eq!(doc.inner_html(style), "main { padding: 1rem; }");
        assert!(html.contains("<title>WebCraft Preview</title>"));
    }

    #[test]
    fn test_export_keeps_the_single_shim() {
        let html = compose_preview_document(&site(), "");
        assert!(!html.contains("<script src="));
        let exporter = Exporter::new(ExportConfig::default());
        assert_eq!(exporter.prepare(&html), html);
    }
}
