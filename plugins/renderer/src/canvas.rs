//! Canvas mode: editable frames around each component

use html_escape::encode_double_quoted_attribute as attr;
use serde::{Deserialize, Serialize};
use tracing::debug;
use webcraft_core::{BuilderState, Component};

use crate::components::render_components;
use crate::{RenderContext, RenderMode, RenderResult};

/// Attribute carrying the component id on each canvas frame
pub const CANVAS_ID_ATTRIBUTE: &str = "data-component-id";

/// A control activated on the canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CanvasAction {
    Remove { id: String },
    /// Drop `moved` onto the slot held by `target`
    Reorder { moved: String, target: String },
}

impl CanvasAction {
    pub fn apply(&self, state: &mut BuilderState) {
        debug!("Applying canvas action {:?}", self);
        match self {
            CanvasAction::Remove { id } => state.remove_component(id),
            CanvasAction::Reorder { moved, target } => state.reorder_components(moved, target),
        }
    }
}

pub(crate) fn frame(component: &Component, inner: RenderResult) -> RenderResult {
    let id = attr(&component.id);
    let mut framed = RenderResult::new(format!(
        "<div class=\"group relative border border-gray-200 rounded-lg p-4 mb-4 bg-white component-container\" \
         {}=\"{}\" data-component-type=\"{}\">\
         <div class=\"absolute right-2 top-2 flex gap-2 opacity-0 group-hover:opacity-100 transition-opacity\">\
         <button type=\"button\" class=\"p-1 hover:bg-gray-100 rounded\" data-action=\"remove\" data-target=\"{}\" title=\"Remove\">&#10005;</button>\
         <button type=\"button\" class=\"p-1 hover:bg-gray-100 rounded cursor-move\" data-action=\"drag\" data-target=\"{}\" title=\"Drag to reorder\">&#8942;&#8942;</button>\
         </div>",
        CANVAS_ID_ATTRIBUTE, id, component.kind, id, id
    ));
    framed.absorb(inner);
    framed.html.push_str("</div>");
    framed
}

/// The canvas surface for the current page's working list
pub fn render_canvas(state: &BuilderState, context: &RenderContext) -> RenderResult {
    let mut canvas = context.clone();
    canvas.mode = RenderMode::Canvas;

    let mut result = RenderResult::new(
        "<div class=\"flex-1 p-8 bg-gray-50 min-h-screen\">\
         <div class=\"max-w-4xl mx-auto bg-white min-h-[calc(100vh-4rem)] p-8 rounded-lg shadow-sm\" data-canvas>"
            .to_string(),
    );
    result.absorb(render_components(state.components(), &canvas));
    result.html.push_str("</div></div>");
    result
}
