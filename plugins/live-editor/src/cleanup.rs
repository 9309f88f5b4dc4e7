//! Removal of every instrumentation artifact
//!
//! [`cleanup`] works on any tree, live or copied, and is idempotent.
//! [`capture`] always cleans a deep copy so the live session is untouched.

use tracing::{debug, info};
use webcraft_core::{Document, NodeId};

use crate::marks::{self, UiKind};

fn instrumentable(doc: &Document) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|id| !doc.is_element(*id, "script") && !doc.has_ancestor_tag(*id, &["script"]))
        .collect()
}

/// Put framed images back into their original slot and drop the frame
fn unwrap_image_frames(doc: &mut Document) -> usize {
    let frames: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|id| marks::ui_kind(doc, *id) == Some(UiKind::ImageFrame))
        .collect();

    for frame in &frames {
        let image = doc
            .children(*frame)
            .iter()
            .copied()
            .find(|child| doc.element(*child).is_some() && !doc.has_attribute(*child, marks::UI));
        match image {
            Some(image) => {
                doc.replace(*frame, image);
            }
            None => {
                doc.detach(*frame);
            }
        }
    }
    frames.len()
}

fn remove_editor_nodes(doc: &mut Document) -> usize {
    let nodes: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|id| doc.has_attribute(*id, marks::UI))
        .collect();
    for node in &nodes {
        doc.detach(*node);
    }
    nodes.len()
}

fn restore_handlers(doc: &mut Document, id: NodeId) {
    for name in marks::relocated_handlers(doc, id) {
        let relocated = format!("{}{}", marks::HANDLER_PREFIX, name);
        if doc.has_attribute(id, &name) {
            doc.remove_attribute(id, &relocated);
            continue;
        }
        if let Some(element) = doc.element_mut(id) {
            element.rename(&relocated, &name);
        }
    }
}

/// Strip frames, overlays, handles, marks and stashes; restore relocated
/// handlers. Script elements pass through untouched.
pub fn cleanup(doc: &mut Document) {
    let frames = unwrap_image_frames(doc);
    let ui_nodes = remove_editor_nodes(doc);

    for id in instrumentable(doc) {
        restore_handlers(doc, id);
        for name in marks::stashed_names(doc, id) {
            marks::restore_original(doc, id, &name);
        }
        for mark in marks::ELEMENT_MARKS {
            doc.remove_attribute(id, mark);
        }
    }

    debug!(
        "Cleanup unwrapped {} image frames and removed {} editor nodes",
        frames, ui_nodes
    );
}

/// Serialize a cleaned deep copy of `doc`
pub fn capture(doc: &Document) -> String {
    let mut copy = doc.clone();
    cleanup(&mut copy);
    let html = copy.serialize();
    info!("Captured document ({} bytes)", html.len());
    html
}
