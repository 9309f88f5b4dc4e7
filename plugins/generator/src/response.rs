//! Splitting generated text into its delimited regions

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use webcraft_core::{Result, WebcraftError};

/// One delimited region of a generation reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Html,
    Css,
    Js,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Html, Region::Css, Region::Js];

    pub fn start(&self) -> &'static str {
        match self {
            Region::Html => "HTML_START",
            Region::Css => "CSS_START",
            Region::Js => "JS_START",
        }
    }

    pub fn end(&self) -> &'static str {
        match self {
            Region::Html => "HTML_END",
            Region::Css => "CSS_END",
            Region::Js => "JS_END",
        }
    }

    /// Trimmed text between the first start delimiter and the end delimiter after it
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = text.find(self.start())? + self.start().len();
        let len = text[start..].find(self.end())?;
        Some(text[start..start + len].trim())
    }
}

/// The three parts of a generated site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSite {
    pub html: String,
    pub css: String,
    pub js: String,
}

/// Parse a reply. A missing region becomes an empty string; a reply
/// without any complete region is a generation error.
pub fn parse_generated_text(text: &str) -> Result<GeneratedSite> {
    if text.trim().is_empty() {
        return Err(WebcraftError::generation("No content generated from the AI"));
    }

    let [html, css, js] = Region::ALL.map(|region| region.extract(text));
    if html.is_none() && css.is_none() && js.is_none() {
        warn!("Generated text carries no delimited region ({} bytes)", text.len());
        return Err(WebcraftError::generation(
            "The generated response could not be understood. Please try again.",
        ));
    }
    for (region, found) in Region::ALL.iter().zip([html, css, js]) {
        if found.is_none() {
            debug!("Region {:?} missing from generated text", region);
        }
    }

    Ok(GeneratedSite {
        html: html.unwrap_or_default().to_string(),
        css: css.unwrap_or_default().to_string(),
        js: js.unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_regions_are_trimmed() {
        let text = "Sure! HTML_START\n<h1>Hi</h1>\nHTML_END\nCSS_START h1 { color: red; } CSS_END\nJS_START\nconsole.log(1);\nJS_END";
        let site = parse_generated_text(text).unwrap();
        assert_eq!(site.html, "<h1>Hi</h1>");
        assert_eq!(site.css, "h1 { color: red; }");
        assert_eq!(site.js, "console.log(1);");
    }

    #[test]
    fn test_missing_regions_degrade_to_empty() {
        let site = parse_generated_text("HTML_START<p>x</p>HTML_END JS_START unterminated").unwrap();
        assert_eq!(site.html, "<p>x</p>");
        assert_eq!(site.css, "");
        assert_eq!(site.js, "");
    }

    #[test]
    fn test_first_region_wins() {
        let site = parse_generated_text("HTML_START a HTML_END HTML_START b HTML_END").unwrap();
        assert_eq!(site.html, "a");
    }

    #[test]
    fn test_undelimited_or_empty_text_is_a_generation_error() {
        assert!(matches!(
            parse_generated_text("<html>no markers</html>"),
            Err(WebcraftError::Generation(_))
        ));
        assert!(matches!(parse_generated_text("  "), Err(WebcraftError::Generation(_))));
    }
}
