//! Drag repositioning of top-level containers
//!
//! Geometry comes from a [`LayoutSource`]; without layout information every
//! box sits at the origin. Offsets are relative to the parent's box and are
//! written as `position: absolute; left; top`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use webcraft_core::{Document, InlineStyle, NodeId};

use crate::listeners::{GestureKind, Handler, ListenerId, ListenerRegistry, ListenerTarget};
use crate::marks;
use crate::realm::ElementRef;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Source of element bounding boxes
pub trait LayoutSource: Send + Sync {
    fn bounding_box(&self, doc: &Document, node: NodeId) -> Option<Rect>;
}

/// A layout source that knows nothing about layout
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl LayoutSource for NoLayout {
    fn bounding_box(&self, _doc: &Document, _node: NodeId) -> Option<Rect> {
        None
    }
}

/// A layout source answering from a fixed table of boxes
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    boxes: HashMap<NodeId, Rect>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_box(mut self, node: NodeId, rect: Rect) -> Self {
        self.boxes.insert(node, rect);
        self
    }

    pub fn set(&mut self, node: NodeId, rect: Rect) {
        self.boxes.insert(node, rect);
    }
}

impl LayoutSource for FixedLayout {
    fn bounding_box(&self, _doc: &Document, node: NodeId) -> Option<Rect> {
        self.boxes.get(&node).copied()
    }
}

/// One drag gesture, from pointer down on a handle to pointer up
#[derive(Debug)]
pub(crate) struct DragSession {
    target: ElementRef,
    grab: (f64, f64),
    listeners: [ListenerId; 2],
}

impl DragSession {
    /// Record the grab offset and install realm-wide move/up listeners
    pub(crate) fn begin(
        doc: &Document,
        layout: &dyn LayoutSource,
        listeners: &mut ListenerRegistry,
        target: ElementRef,
        x: f64,
        y: f64,
    ) -> Self {
        let element_box = layout
            .bounding_box(doc, target.node())
            .unwrap_or_default();
        let grab = (x - element_box.x, y - element_box.y);
        let listeners = [
            listeners.add(ListenerTarget::Realm, GestureKind::PointerMove, Handler::DragMove),
            listeners.add(ListenerTarget::Realm, GestureKind::PointerUp, Handler::DragEnd),
        ];
        debug!("Drag started on {} grabbed at {:?}", target.node(), grab);
        Self {
            target,
            grab,
            listeners,
        }
    }

    pub(crate) fn target(&self) -> ElementRef {
        self.target
    }

    /// Offset of the dragged element within its parent for a pointer position
    pub(crate) fn offset_for(&self, doc: &Document, layout: &dyn LayoutSource, x: f64, y: f64) -> (f64, f64) {
        let parent_box = doc
            .parent(self.target.node())
            .and_then(|parent| layout.bounding_box(doc, parent))
            .unwrap_or_default();
        (x - parent_box.x - self.grab.0, y - parent_box.y - self.grab.1)
    }

    /// Remove the realm listeners; called on every way out of a drag
    pub(crate) fn finish(self, listeners: &mut ListenerRegistry) {
        listeners.remove_all(&self.listeners);
        debug!("Drag finished on {}", self.target.node());
    }
}

fn px(value: f64) -> String {
    format!("{}px", value.round() as i64)
}

fn place(style: &mut InlineStyle, left: f64, top: f64) {
    style.set("position", "absolute");
    style.set("left", &px(left));
    style.set("top", &px(top));
}

/// Write an offset into the live style and into the page's own style, so the
/// move survives cleanup
pub(crate) fn write_position(doc: &mut Document, node: NodeId, left: f64, top: f64) {
    let mut own = marks::baseline(doc, node, "style")
        .flatten()
        .map(|style| InlineStyle::parse(&style))
        .unwrap_or_default();
    place(&mut own, left, top);
    marks::set_baseline(doc, node, "style", &own.to_string());

    if marks::is_stashed(doc, node, "style") {
        let mut live = InlineStyle::parse(doc.get_attribute(node, "style").unwrap_or(""));
        place(&mut live, left, top);
        doc.set_attribute(node, "style", Some(&live.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::{Realm, SandboxPolicy};

    #[test]
    fn test_offset_is_relative_to_parent_and_grab_point() {
        let mut realm = Realm::new(SandboxPolicy::new(["allow-same-origin"]));
        realm.load("<body><section>x</section></body>");
        let doc = realm.try_read().unwrap();
        let body = doc.body().unwrap();
        let section = doc.first_element_by_tag("section").unwrap();
        let layout = FixedLayout::new()
            .with_box(body, Rect::new(10.0, 20.0, 800.0, 600.0))
            .with_box(section, Rect::new(30.0, 40.0, 200.0, 100.0));

        let mut listeners = ListenerRegistry::new();
        let session = DragSession::begin(doc, &layout, &mut listeners, realm.element_ref(section), 35.0, 45.0);
        assert_eq!(listeners.count_for(ListenerTarget::Realm), 2);

        // grabbed 5px into the section; pointer now at (115, 145)
        assert_eq!(session.offset_for(doc, &layout, 115.0, 145.0), (100.0, 120.0));

        session.finish(&mut listeners);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_position_survives_style_restore() {
        let mut doc = Document::parse("<section style=\"color: red\">x</section>");
        let section = doc.first_element_by_tag("section").unwrap();
        marks::set_instrumented(&mut doc, section, "style", Some("color: red; outline: 2px solid #3b82f6"));

        write_position(&mut doc, section, 12.4, 7.6);
        assert_eq!(
            doc.get_attribute(section, "style"),
            Some("color: red; outline: 2px solid #3b82f6; position: absolute; left: 12px; top: 8px")
        );

        marks::restore_original(&mut doc, section, "style");
        assert_eq!(
            doc.get_attribute(section, "style"),
            Some("color: red; position: absolute; left: 12px; top: 8px")
        );
    }

    #[test]
    fn test_position_without_selection_writes_style_directly() {
        let mut doc = Document::parse("<section>x</section>");
        let section = doc.first_element_by_tag("section").unwrap();
        write_position(&mut doc, section, 0.0, 0.0);
        assert_eq!(
            doc.get_attribute(section, "style"),
            Some("position: absolute; left: 0px; top: 0px")
        );
    }
}
