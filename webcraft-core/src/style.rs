//! Inline `style` attribute handling shared by the editor and the renderer
//!
//! Declarations split on `;` and `:` only at the top level, so values such as
//! `url(data:image/png;base64,...)` or quoted font names survive a parse and
//! re-render intact.

use html_escape::encode_double_quoted_attribute;
use std::fmt;

/// Ordered list of inline style declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

/// Byte offsets of `delimiter` outside parentheses and quoted strings
fn top_level_positions(source: &str, delimiter: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, ch) in source.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(open) => {
                if ch == '\\' {
                    escaped = true;
                } else if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '\\' => escaped = true,
                '"' | '\'' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if ch == delimiter && depth == 0 => positions.push(index),
                _ => {}
            },
        }
    }
    positions
}

fn split_declarations(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for position in top_level_positions(source, ';') {
        parts.push(&source[start..position]);
        start = position + 1;
    }
    parts.push(&source[start..]);
    parts
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(source: &str) -> Self {
        let declarations = split_declarations(source)
            .into_iter()
            .filter_map(|declaration| {
                let colon = top_level_positions(declaration, ':').into_iter().next()?;
                let name = declaration[..colon].trim().to_ascii_lowercase();
                let value = declaration[colon + 1..].trim();
                (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
            })
            .collect();
        Self { declarations }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, keeping its position when it already exists
    pub fn set<V: Into<String>>(&mut self, property: &str, value: V) {
        let property = property.to_ascii_lowercase();
        let value = value.into();
        match self.declarations.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value,
            None => self.declarations.push((property, value)),
        }
    }

    pub fn with<V: Into<String>>(mut self, property: &str, value: V) -> Self {
        self.set(property, value);
        self
    }

    /// Like [`InlineStyle::with`], skipping unset and blank values
    pub fn with_opt(self, property: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => self.with(property, value),
            None => self,
        }
    }

    pub fn remove(&mut self, property: &str) {
        self.declarations.retain(|(name, _)| name != property);
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// ` style="..."` including the leading space, or nothing when empty
    pub fn to_attribute(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!(" style=\"{}\"", encode_double_quoted_attribute(&self.to_string()))
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .declarations
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_and_render() {
        let mut style = InlineStyle::parse("color: red;  Margin:0 ; ;bogus");
        assert_eq!(style.get("margin"), Some("0"));
        style.set("outline", "2px solid #3b82f6");
        style.set("color", "blue");
        assert_eq!(style.to_string(), "color: blue; margin: 0; outline: 2px solid #3b82f6");
        style.remove("margin");
        assert_eq!(style.to_string(), "color: blue; outline: 2px solid #3b82f6");
    }

    #[test]
    fn test_url_values_keep_their_colons() {
        let style = InlineStyle::parse("background: url(https://x.test/a.png)");
        assert_eq!(style.get("background"), Some("url(https://x.test/a.png)"));
    }

    #[test]
    fn test_semicolons_inside_urls_and_quotes_do_not_split() {
        let style = InlineStyle::parse(
            "background:url(data:image/png;base64,AAAA);font-family:\"A;B\", serif;content:'x:y;z'",
        );
        assert_eq!(style.get("background"), Some("url(data:image/png;base64,AAAA)"));
        assert_eq!(style.get("font-family"), Some("\"A;B\", serif"));
        assert_eq!(style.get("content"), Some("'x:y;z'"));
        assert_eq!(
            style.to_string(),
            "background: url(data:image/png;base64,AAAA); font-family: \"A;B\", serif; content: 'x:y;z'"
        );
    }

    #[test]
    fn test_builder_skips_unset_and_blank_values() {
        let style = InlineStyle::new()
            .with("height", "4rem")
            .with_opt("width", None)
            .with_opt("min-height", Some("  "))
            .with_opt("padding", Some("2rem"));
        assert_eq!(style.to_attribute(), " style=\"height: 4rem; padding: 2rem\"");
        assert_eq!(InlineStyle::new().to_attribute(), "");
    }

    #[test]
    fn test_attribute_escapes_quotes() {
        let style = InlineStyle::new().with("font-family", "\"Inter\", sans-serif");
        assert_eq!(
            style.to_attribute(),
            " style=\"font-family: &quot;Inter&quot;, sans-serif\""
        );
    }
}
