//! Detection of page scripting that only works in preview

use serde::Serialize;
use webcraft_core::{Document, NodeId};

use crate::marks;

/// Scripting features found in a loaded document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractivityReport {
    pub script_count: usize,
    pub has_forms: bool,
    pub has_search: bool,
    pub has_click_handlers: bool,
}

impl InteractivityReport {
    pub fn detect(doc: &Document) -> Self {
        let elements = doc.elements();
        Self {
            script_count: elements
                .iter()
                .filter(|id| doc.is_element(**id, "script"))
                .count(),
            has_forms: elements.iter().any(|id| doc.is_element(*id, "form")),
            has_search: elements.iter().any(|id| is_search_input(doc, *id)),
            has_click_handlers: elements.iter().any(|id| has_click_handler(doc, *id)),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.script_count > 0 || self.has_forms || self.has_search || self.has_click_handlers
    }

    /// Human-readable feature list, in display order
    pub fn features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        if self.has_forms {
            features.push("Forms processing");
        }
        if self.has_search {
            features.push("Search functionality");
        }
        if self.has_click_handlers {
            features.push("Interactive elements");
        }
        features
    }
}

fn contains_search(value: Option<&str>) -> bool {
    value
        .map(|value| value.to_lowercase().contains("search"))
        .unwrap_or(false)
}

fn is_search_input(doc: &Document, id: NodeId) -> bool {
    if !doc.is_element(id, "input") {
        return false;
    }
    doc.get_attribute(id, "type")
        .map(|kind| kind.eq_ignore_ascii_case("search"))
        .unwrap_or(false)
        || contains_search(doc.get_attribute(id, "placeholder"))
        || contains_search(doc.get_attribute(id, "name"))
}

/// True for an inline click handler, live or relocated by the editor
pub fn has_click_handler(doc: &Document, id: NodeId) -> bool {
    doc.has_attribute(id, "onclick")
        || doc.has_attribute(id, &format!("{}onclick", marks::HANDLER_PREFIX))
}
