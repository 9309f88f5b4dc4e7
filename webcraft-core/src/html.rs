//! Tolerant HTML tokenizer and tree builder.
//!
//! Every token carries the exact source slice it was read from, which is
//! what lets [`Document::serialize`](crate::dom::Document::serialize)
//! reproduce an unmodified document byte for byte. Markup that cannot be
//! placed in the tree is kept as a raw node rather than dropped.

use crate::dom::{Attribute, Document, Element, NodeId, NodeKind, RawAttribute};

#[derive(Debug)]
enum Token {
    Start {
        element: Element,
        self_closing: bool,
    },
    End {
        name: String,
        raw: String,
    },
    Text(String),
    Comment(String),
    Doctype(String),
    Raw(String),
}

pub(crate) fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

/// Start tags that implicitly close an open element of the returned kind
fn implicitly_closes(open: &str, incoming: &str) -> bool {
    match open {
        "li" => incoming == "li",
        "option" => incoming == "option",
        "p" => matches!(
            incoming,
            "p" | "div"
                | "ul"
                | "ol"
                | "section"
                | "article"
                | "header"
                | "footer"
                | "nav"
                | "aside"
                | "table"
                | "form"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
        ),
        _ => false,
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn starts_with(bytes: &[u8], at: usize, pattern: &[u8]) -> bool {
    bytes.len() >= at + pattern.len() && &bytes[at..at + pattern.len()] == pattern
}

fn starts_with_ignore_case(bytes: &[u8], at: usize, pattern: &[u8]) -> bool {
    bytes.len() >= at + pattern.len() && bytes[at..at + pattern.len()].eq_ignore_ascii_case(pattern)
}

fn find_byte(bytes: &[u8], from: usize, target: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|b| *b == target)
        .map(|offset| from + offset)
}

fn find_sequence(bytes: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut text_start = 0;

    let flush_text = |out: &mut Vec<Token>, from: usize, to: usize| {
        if to > from {
            out.push(Token::Text(source[from..to].to_string()));
        }
    };

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        if starts_with(bytes, i, b"<!--") {
            flush_text(&mut out, text_start, i);
            let end = find_sequence(bytes, i + 4, b"-->")
                .map(|at| at + 3)
                .unwrap_or(bytes.len());
            out.push(Token::Comment(source[i..end].to_string()));
            i = end;
            text_start = i;
            continue;
        }

        if starts_with(bytes, i, b"<!") || starts_with(bytes, i, b"<?") {
            flush_text(&mut out, text_start, i);
            let end = find_byte(bytes, i, b'>')
                .map(|at| at + 1)
                .unwrap_or(bytes.len());
            let raw = source[i..end].to_string();
            if starts_with_ignore_case(bytes, i, b"<!doctype") {
                out.push(Token::Doctype(raw));
            } else if bytes[i + 1] == b'!' {
                out.push(Token::Comment(raw));
            } else {
                out.push(Token::Raw(raw));
            }
            i = end;
            text_start = i;
            continue;
        }

        if starts_with(bytes, i, b"</") {
            if let Some((token, next)) = parse_end_tag(source, i) {
                flush_text(&mut out, text_start, i);
                out.push(token);
                i = next;
                text_start = i;
                continue;
            }
            i += 1;
            continue;
        }

        let Some((element, self_closing, next)) = parse_start_tag(source, i) else {
            i += 1;
            continue;
        };

        flush_text(&mut out, text_start, i);
        let raw_text_tag = (!self_closing && is_raw_text_tag(&element.tag)).then(|| element.tag.clone());
        out.push(Token::Start {
            element,
            self_closing,
        });
        i = next;
        text_start = i;

        if let Some(tag) = raw_text_tag {
            match find_raw_text_end(bytes, i, &tag) {
                Some(close_at) => {
                    flush_text(&mut out, i, close_at);
                    match parse_end_tag(source, close_at) {
                        Some((token, next)) => {
                            out.push(token);
                            i = next;
                        }
                        None => i = close_at,
                    }
                }
                None => {
                    flush_text(&mut out, i, bytes.len());
                    i = bytes.len();
                }
            }
            text_start = i;
        }
    }

    flush_text(&mut out, text_start, bytes.len());
    out
}

fn find_raw_text_end(bytes: &[u8], from: usize, tag: &str) -> Option<usize> {
    let mut i = from;
    while let Some(at) = find_sequence(bytes, i, b"</") {
        let name_end = at + 2 + tag.len();
        if starts_with_ignore_case(bytes, at + 2, tag.as_bytes())
            && bytes
                .get(name_end)
                .map(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
                .unwrap_or(false)
        {
            return Some(at);
        }
        i = at + 2;
    }
    None
}

fn parse_end_tag(source: &str, start: usize) -> Option<(Token, usize)> {
    let bytes = source.as_bytes();
    let name_start = start + 2;
    if !bytes.get(name_start).copied().map(is_name_start).unwrap_or(false) {
        return None;
    }
    let mut name_end = name_start;
    while name_end < bytes.len() && is_tag_name_char(bytes[name_end]) {
        name_end += 1;
    }
    let close = find_byte(bytes, name_end, b'>')?;
    Some((
        Token::End {
            name: source[name_start..name_end].to_ascii_lowercase(),
            raw: source[start..=close].to_string(),
        },
        close + 1,
    ))
}

/// Parse `<name attr=value ...>` starting at `start`; returns the element,
/// whether it was written self-closing, and the offset after the tag
fn parse_start_tag(source: &str, start: usize) -> Option<(Element, bool, usize)> {
    let bytes = source.as_bytes();
    let name_start = start + 1;
    if !bytes.get(name_start).copied().map(is_name_start).unwrap_or(false) {
        return None;
    }
    let mut i = name_start;
    while i < bytes.len() && is_tag_name_char(bytes[i]) {
        i += 1;
    }
    let raw_name = source[name_start..i].to_string();
    let mut element = Element::created(&raw_name);
    element.raw_name = raw_name;
    element.end_tag = None;

    let mut segment_start = i;
    loop {
        // Whitespace and stray slashes belong to the next attribute's source
        while i < bytes.len()
            && (bytes[i].is_ascii_whitespace() || (bytes[i] == b'/' && !starts_with(bytes, i, b"/>")))
        {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }

        if bytes[i] == b'>' {
            element.start_tail = source[segment_start..=i].to_string();
            return Some((element, false, i + 1));
        }
        if starts_with(bytes, i, b"/>") {
            element.start_tail = source[segment_start..i + 2].to_string();
            return Some((element, true, i + 2));
        }

        let (attribute, next) = parse_attribute(source, segment_start, i)?;
        element.attrs.push(attribute);
        i = next;
        segment_start = i;
    }
}

fn parse_attribute(source: &str, segment_start: usize, name_start: usize) -> Option<(Attribute, usize)> {
    let bytes = source.as_bytes();
    let mut i = name_start;
    while i < bytes.len()
        && !bytes[i].is_ascii_whitespace()
        && !matches!(bytes[i], b'=' | b'>')
        && !starts_with(bytes, i, b"/>")
    {
        i += 1;
    }
    if i == name_start {
        // Something like a lone `=`; swallow one byte so parsing moves on
        i += 1;
    }
    let name = source[name_start..i].to_ascii_lowercase();

    let mut cursor = i;
    while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
        cursor += 1;
    }

    let mut value = None;
    let mut end = i;
    if cursor < bytes.len() && bytes[cursor] == b'=' {
        cursor += 1;
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if cursor >= bytes.len() {
            return None;
        }
        match bytes[cursor] {
            quote @ (b'"' | b'\'') => {
                let close = find_byte(bytes, cursor + 1, quote)?;
                value = Some(source[cursor + 1..close].to_string());
                end = close + 1;
            }
            _ => {
                let mut value_end = cursor;
                while value_end < bytes.len()
                    && !bytes[value_end].is_ascii_whitespace()
                    && bytes[value_end] != b'>'
                {
                    value_end += 1;
                }
                value = Some(source[cursor..value_end].to_string());
                end = value_end;
            }
        }
    }

    let value = value.map(|raw| html_escape::decode_html_entities(&raw).into_owned());
    let attribute = Attribute {
        name: name.clone(),
        value: value.clone(),
        raw: Some(RawAttribute {
            source: source[segment_start..end].to_string(),
            name,
            value,
        }),
    };
    Some((attribute, end))
}

fn build_tree(tokens: Vec<Token>) -> Document {
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];

    for token in tokens {
        let current = stack.last().copied().unwrap_or_else(|| doc.root());
        match token {
            Token::Text(raw) => {
                doc.push_parsed(current, NodeKind::Text(raw));
            }
            Token::Comment(raw) => {
                doc.push_parsed(current, NodeKind::Comment(raw));
            }
            Token::Doctype(raw) => {
                doc.push_parsed(current, NodeKind::Doctype(raw));
            }
            Token::Raw(raw) => {
                doc.push_parsed(current, NodeKind::Raw(raw));
            }
            Token::Start {
                element,
                self_closing,
            } => {
                while stack.len() > 1 {
                    let open = stack[stack.len() - 1];
                    let closes = doc
                        .tag_name(open)
                        .map(|tag| implicitly_closes(tag, &element.tag))
                        .unwrap_or(false);
                    if !closes {
                        break;
                    }
                    stack.pop();
                }

                let parent = stack.last().copied().unwrap_or_else(|| doc.root());
                let leaf = self_closing || is_void(&element.tag);
                let id = doc.push_parsed(parent, NodeKind::Element(element));
                if !leaf {
                    stack.push(id);
                }
            }
            Token::End { name, raw } => {
                let matched = stack
                    .iter()
                    .skip(1)
                    .rposition(|id| doc.is_element(*id, &name))
                    .map(|position| position + 1);

                match matched {
                    Some(position) => {
                        let id = stack[position];
                        doc.set_end_tag(id, raw);
                        stack.truncate(position);
                    }
                    None => {
                        doc.push_parsed(current, NodeKind::Raw(raw));
                    }
                }
            }
        }
    }

    doc
}

/// Parse a full document or fragment
pub fn parse_document(source: &str) -> Document {
    build_tree(tokenize(source))
}
