//! Instrumentation marks and original-attribute stashes.
//!
//! Every attribute the editor adds starts with `data-wb-`. Before the editor
//! changes an attribute the page already owns, the original is stashed in
//! `data-wb-orig-<name>`:
//!
//! - valueless stash: the attribute was absent
//! - empty stash value: the attribute was present without a value
//! - `=<value>`: the attribute was present with `<value>`
//!
//! Restoring writes the original back onto the same attribute, so an
//! untouched attribute serializes exactly as it was parsed.

use webcraft_core::{Document, NodeId, NodeKind};

pub const TEXT: &str = "data-wb-text";
pub const IMAGE: &str = "data-wb-image";
pub const LINK: &str = "data-wb-link";
pub const CONTAINER: &str = "data-wb-container";
pub const SELECTED: &str = "data-wb-selected";

/// Marks applied by the passes and the selection
pub const ELEMENT_MARKS: [&str; 5] = [TEXT, IMAGE, LINK, CONTAINER, SELECTED];

/// Carried by every node the editor creates
pub const UI: &str = "data-wb-ui";
pub const ORIG_PREFIX: &str = "data-wb-orig-";
pub const HANDLER_PREFIX: &str = "data-wb-handler-";

/// Inline handlers that would fire on editing gestures
pub const INTERCEPTED_HANDLERS: [&str; 4] = ["onclick", "ondblclick", "onmousedown", "onmouseup"];

/// Editor-created node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiKind {
    ImageFrame,
    ImageOverlay,
    DragHandle,
    Styles,
}

impl UiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiKind::ImageFrame => "image-frame",
            UiKind::ImageOverlay => "image-overlay",
            UiKind::DragHandle => "drag-handle",
            UiKind::Styles => "styles",
        }
    }
}

pub fn ui_kind(doc: &Document, id: NodeId) -> Option<UiKind> {
    match doc.get_attribute(id, UI)? {
        "image-frame" => Some(UiKind::ImageFrame),
        "image-overlay" => Some(UiKind::ImageOverlay),
        "drag-handle" => Some(UiKind::DragHandle),
        "styles" => Some(UiKind::Styles),
        _ => None,
    }
}

/// True for editor-created nodes and anything inside them.
/// An image frame's own image belongs to the page, not the editor.
pub fn is_editor_ui(doc: &Document, id: NodeId) -> bool {
    let in_ui = |node: NodeId| doc.has_attribute(node, UI);
    if in_ui(id) {
        return true;
    }
    doc.ancestors(id).into_iter().any(|ancestor| {
        in_ui(ancestor) && ui_kind(doc, ancestor) != Some(UiKind::ImageFrame)
    })
}

/// Decoded text of the page content under `id`, ignoring editor UI and
/// script or style bodies
pub fn page_text(doc: &Document, id: NodeId) -> String {
    doc.descendants(id)
        .into_iter()
        .filter(|node| matches!(doc.kind(*node), Some(NodeKind::Text(_))))
        .filter(|node| !is_editor_ui(doc, *node) && !doc.has_ancestor_tag(*node, &["script", "style"]))
        .map(|node| doc.text_content(node))
        .collect()
}

/// Create an editor-owned element
pub fn create_ui_element(doc: &mut Document, tag: &str, kind: UiKind) -> NodeId {
    let id = doc.create_element(tag);
    doc.set_attribute(id, UI, Some(kind.as_str()));
    id
}

fn stash_name(name: &str) -> String {
    format!("{}{}", ORIG_PREFIX, name)
}

fn encode(original: Option<Option<&str>>) -> Option<String> {
    match original {
        None => None,
        Some(None) => Some(String::new()),
        Some(Some(value)) => Some(format!("={}", value)),
    }
}

fn decode(stash: Option<&str>) -> Option<Option<String>> {
    match stash {
        None => None,
        Some("") => Some(None),
        Some(value) => Some(Some(value.strip_prefix('=').unwrap_or(value).to_string())),
    }
}

pub fn is_stashed(doc: &Document, id: NodeId, name: &str) -> bool {
    doc.has_attribute(id, &stash_name(name))
}

/// Remember the page's own value of `name` before the editor changes it
pub fn stash_original(doc: &mut Document, id: NodeId, name: &str) {
    if is_stashed(doc, id, name) {
        return;
    }
    let original = doc
        .element(id)
        .and_then(|element| element.attribute(name))
        .map(|attr| attr.value.clone());
    let encoded = encode(original.as_ref().map(|value| value.as_deref()));
    doc.set_attribute(id, &stash_name(name), encoded.as_deref());
}

/// Set an attribute the page may own, stashing the original first
pub fn set_instrumented(doc: &mut Document, id: NodeId, name: &str, value: Option<&str>) {
    stash_original(doc, id, name);
    doc.set_attribute(id, name, value);
}

/// The page's own value: `None` when absent, `Some(None)` when valueless
pub fn baseline(doc: &Document, id: NodeId, name: &str) -> Option<Option<String>> {
    let element = doc.element(id)?;
    match element.attribute(&stash_name(name)) {
        Some(stash) => decode(stash.value.as_deref()),
        None => element.attribute(name).map(|attr| attr.value.clone()),
    }
}

/// Record a user edit of an attribute the editor may have stashed, so that
/// the edit survives restoration
pub fn set_baseline(doc: &mut Document, id: NodeId, name: &str, value: &str) {
    if is_stashed(doc, id, name) {
        doc.set_attribute(id, &stash_name(name), Some(&format!("={}", value)));
    } else {
        doc.set_attribute(id, name, Some(value));
    }
}

/// Put the page's own value back and drop the stash
pub fn restore_original(doc: &mut Document, id: NodeId, name: &str) {
    let Some(stash) = doc.remove_attribute(id, &stash_name(name)) else {
        return;
    };
    match decode(stash.value.as_deref()) {
        None => {
            doc.remove_attribute(id, name);
        }
        Some(value) => {
            doc.set_attribute(id, name, value.as_deref());
        }
    }
}

/// Names of all stashed attributes on an element
pub fn stashed_names(doc: &Document, id: NodeId) -> Vec<String> {
    doc.element(id)
        .map(|element| {
            element
                .attrs
                .iter()
                .filter_map(|attr| attr.name.strip_prefix(ORIG_PREFIX).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Names of all relocated inline handlers on an element
pub fn relocated_handlers(doc: &Document, id: NodeId) -> Vec<String> {
    doc.element(id)
        .map(|element| {
            element
                .attrs
                .iter()
                .filter_map(|attr| attr.name.strip_prefix(HANDLER_PREFIX).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document, tag: &str) -> NodeId {
        doc.first_element_by_tag(tag).unwrap()
    }

    #[test]
    fn test_restore_absent_attribute_removes_it() {
        let source = "<p>x</p>";
        let mut doc = Document::parse(source);
        let p = first(&doc, "p");
        set_instrumented(&mut doc, p, "contenteditable", Some("true"));
        assert_eq!(doc.get_attribute(p, "contenteditable"), Some("true"));
        restore_original(&mut doc, p, "contenteditable");
        assert_eq!(doc.serialize(), source);
    }

    #[test]
    fn test_restore_keeps_original_source_text() {
        let source = "<p style='color:red' contenteditable>x</p>";
        let mut doc = Document::parse(source);
        let p = first(&doc, "p");
        set_instrumented(&mut doc, p, "style", Some("color:red; outline: 2px solid #3b82f6"));
        set_instrumented(&mut doc, p, "contenteditable", Some("true"));
        // a second stash must not overwrite the first
        set_instrumented(&mut doc, p, "style", Some("outline: none"));

        assert_eq!(baseline(&doc, p, "style"), Some(Some("color:red".to_string())));
        assert_eq!(baseline(&doc, p, "contenteditable"), Some(None));

        restore_original(&mut doc, p, "style");
        restore_original(&mut doc, p, "contenteditable");
        assert_eq!(doc.serialize(), source);
    }

    #[test]
    fn test_set_baseline_survives_restore() {
        let mut doc = Document::parse("<div>x</div>");
        let div = first(&doc, "div");
        set_instrumented(&mut doc, div, "style", Some("outline: 2px solid #3b82f6"));
        set_baseline(&mut doc, div, "style", "position: absolute; left: 4px");
        restore_original(&mut doc, div, "style");
        assert_eq!(doc.get_attribute(div, "style"), Some("position: absolute; left: 4px"));
        assert!(stashed_names(&doc, div).is_empty());
    }

    #[test]
    fn test_editor_ui_detection() {
        let mut doc = Document::parse("<body><img src=a.png></body>");
        let body = first(&doc, "body");
        let img = first(&doc, "img");
        let frame = create_ui_element(&mut doc, "div", UiKind::ImageFrame);
        doc.replace(img, frame);
        doc.append_child(frame, img);
        let overlay = create_ui_element(&mut doc, "div", UiKind::ImageOverlay);
        doc.append_child(frame, overlay);

        assert!(is_editor_ui(&doc, frame));
        assert!(is_editor_ui(&doc, overlay));
        assert!(!is_editor_ui(&doc, img));
        assert!(!is_editor_ui(&doc, body));
        assert_eq!(ui_kind(&doc, overlay), Some(UiKind::ImageOverlay));
    }
}
