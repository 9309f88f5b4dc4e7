//! Instrumentation passes
//!
//! Each pass marks the elements it cares about, registers listeners and
//! returns a [`PassDisposer`] holding those listener ids. Passes are
//! idempotent: running one again over an instrumented tree adds no second
//! frame, handle or stylesheet.

use serde::Serialize;
use tracing::{debug, warn};
use webcraft_core::{Document, EditorConfig, MarkerConfig, NodeId};

use crate::listeners::{GestureKind, Handler, ListenerId, ListenerRegistry};
use crate::marks::{self, UiKind};
use crate::EditorError;

/// Hover and selection affordances shared by every instrumented page
pub const AFFORDANCE_CSS: &str = r#"
[data-wb-text]:hover, [data-wb-link]:hover { outline: 2px dashed #93c5fd; }
[data-wb-container]:hover { outline: 1px dotted #9ca3af; }
[data-wb-image] { cursor: pointer; }
[data-wb-ui="image-frame"] { position: relative; display: inline-block; }
[data-wb-ui="image-overlay"] { position: absolute; top: 0; right: 0; bottom: 0; left: 0; display: none; align-items: center; justify-content: center; background-color: rgba(0, 0, 0, 0.5); color: white; font-size: 14px; font-weight: bold; cursor: pointer; }
[data-wb-ui="drag-handle"] { position: absolute; top: -1.5rem; left: 0; padding: 0.25rem; border-radius: 0.25rem; background-color: #3b82f6; color: white; font-size: 0.75rem; cursor: move; opacity: 0; }
[data-wb-container]:hover > [data-wb-ui="drag-handle"] { opacity: 1; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassKind {
    AffordanceStyles,
    Text,
    Image,
    Link,
    Container,
    HandlerGuard,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PassKind::AffordanceStyles => "affordance-styles",
            PassKind::Text => "text",
            PassKind::Image => "image",
            PassKind::Link => "link",
            PassKind::Container => "container",
            PassKind::HandlerGuard => "handler-guard",
        };
        f.write_str(name)
    }
}

/// What a pass needs besides the document
pub struct PassContext<'a> {
    pub config: &'a EditorConfig,
    pub listeners: &'a mut ListenerRegistry,
}

/// Undo handle for one pass application
#[derive(Debug)]
pub struct PassDisposer {
    kind: PassKind,
    listeners: Vec<ListenerId>,
    marked: usize,
    used_fallback: bool,
}

impl PassDisposer {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            listeners: Vec::new(),
            marked: 0,
            used_fallback: false,
        }
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn marked(&self) -> usize {
        self.marked
    }

    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn track(&mut self, listener: ListenerId) {
        self.listeners.push(listener);
    }

    /// Remove every listener this pass registered
    pub fn dispose(self, registry: &mut ListenerRegistry) {
        registry.remove_all(&self.listeners);
    }
}

/// One declarative instrumentation step
pub trait InstrumentationPass: Send + Sync {
    fn kind(&self) -> PassKind;

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub kind: PassKind,
    pub marked: usize,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassFailure {
    pub kind: PassKind,
    pub reason: String,
}

/// Outcome of running the pass list once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentationReport {
    pub passes: Vec<PassSummary>,
    pub failures: Vec<PassFailure>,
}

impl InstrumentationReport {
    pub fn marked(&self, kind: PassKind) -> usize {
        self.passes
            .iter()
            .filter(|summary| summary.kind == kind)
            .map(|summary| summary.marked)
            .sum()
    }

    pub fn used_fallback(&self, kind: PassKind) -> bool {
        self.passes
            .iter()
            .any(|summary| summary.kind == kind && summary.used_fallback)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The standard pass list, in application order
pub fn default_passes() -> Vec<Box<dyn InstrumentationPass>> {
    vec![
        Box::new(AffordanceStylesPass),
        Box::new(TextPass),
        Box::new(ImagePass),
        Box::new(LinkPass),
        Box::new(ContainerPass),
        Box::new(HandlerGuardPass),
    ]
}

/// Run every pass; a failing pass is logged and the rest still run
pub fn run_passes(
    passes: &[Box<dyn InstrumentationPass>],
    doc: &mut Document,
    config: &EditorConfig,
    listeners: &mut ListenerRegistry,
) -> (Vec<PassDisposer>, InstrumentationReport) {
    let mut disposers = Vec::with_capacity(passes.len());
    let mut report = InstrumentationReport::default();

    for pass in passes {
        let mut ctx = PassContext {
            config,
            listeners: &mut *listeners,
        };
        match pass.apply(doc, &mut ctx) {
            Ok(disposer) => {
                debug!(
                    "Pass {} marked {} elements{}",
                    disposer.kind,
                    disposer.marked,
                    if disposer.used_fallback { " (fallback)" } else { "" }
                );
                report.passes.push(PassSummary {
                    kind: disposer.kind,
                    marked: disposer.marked,
                    used_fallback: disposer.used_fallback,
                });
                disposers.push(disposer);
            }
            Err(e) => {
                warn!("Instrumentation pass {} failed: {}", pass.kind(), e);
                report.failures.push(PassFailure {
                    kind: pass.kind(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (disposers, report)
}

/// Strip the per-pass marks so a re-run starts from the page's own state
pub fn clear_pass_marks(doc: &mut Document) {
    for id in doc.elements() {
        for mark in [marks::TEXT, marks::IMAGE, marks::LINK, marks::CONTAINER] {
            doc.remove_attribute(id, mark);
        }
    }
}

fn carries_marker(doc: &Document, id: NodeId, marker: &MarkerConfig) -> bool {
    doc.get_attribute(id, &marker.attribute) == Some(marker.value.as_str())
}

/// Page elements the content passes may touch: outside `head`, outside
/// editor UI, and not raw-text containers
fn page_elements(doc: &Document) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|id| {
            !matches!(doc.tag_name(*id), Some("script" | "style" | "head" | "html" | "body"))
                && !doc.has_ancestor_tag(*id, &["head", "script", "style"])
                && !marks::is_editor_ui(doc, *id)
        })
        .collect()
}

fn tag_in(doc: &Document, id: NodeId, tags: &[String]) -> bool {
    doc.tag_name(id)
        .map(|tag| tags.iter().any(|candidate| candidate == tag))
        .unwrap_or(false)
}

/// Injects the stylesheet carrying hover and selection affordances
pub struct AffordanceStylesPass;

impl InstrumentationPass for AffordanceStylesPass {
    fn kind(&self) -> PassKind {
        PassKind::AffordanceStyles
    }

    fn apply(&self, doc: &mut Document, _ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let present = doc
            .elements()
            .into_iter()
            .any(|id| marks::ui_kind(doc, id) == Some(UiKind::Styles));
        if present {
            return Ok(disposer);
        }

        let style = marks::create_ui_element(doc, "style", UiKind::Styles);
        let css = doc.create_raw_text(AFFORDANCE_CSS);
        doc.append_child(style, css);

        let inserted = match doc.head() {
            Some(head) => doc.append_child(head, style),
            // after any doctype or leading comment, ahead of the first element
            None => {
                let root = doc.root();
                let first_element = doc
                    .children(root)
                    .iter()
                    .copied()
                    .find(|child| doc.element(*child).is_some());
                match first_element {
                    Some(element) => doc.insert_before(element, style),
                    None => doc.append_child(root, style),
                }
            }
        };
        if !inserted {
            return Err(EditorError::InvalidTarget(
                "could not place the editor stylesheet".to_string(),
            ));
        }
        disposer.marked = 1;
        Ok(disposer)
    }
}

/// Makes text-bearing elements selectable for in-place editing
pub struct TextPass;

impl InstrumentationPass for TextPass {
    fn kind(&self) -> PassKind {
        PassKind::Text
    }

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let candidates = page_elements(doc);

        let explicit: Vec<NodeId> = candidates
            .iter()
            .copied()
            .filter(|id| carries_marker(doc, *id, &ctx.config.text_marker))
            .collect();

        let targets = if explicit.is_empty() {
            disposer.used_fallback = true;
            candidates
                .into_iter()
                .filter(|id| {
                    tag_in(doc, *id, &ctx.config.fallback_text_tags)
                        && !marks::page_text(doc, *id).trim().is_empty()
                })
                .collect()
        } else {
            explicit
        };

        for id in targets {
            doc.set_attribute(id, marks::TEXT, None);
            disposer.track(ctx.listeners.on_node(id, GestureKind::Click, Handler::SelectText));
            disposer.marked += 1;
        }
        Ok(disposer)
    }
}

/// Frames editable images with a replacement overlay
pub struct ImagePass;

impl ImagePass {
    fn frame_for(doc: &mut Document, img: NodeId) -> Result<(NodeId, NodeId), EditorError> {
        let existing_frame = doc
            .parent(img)
            .filter(|parent| marks::ui_kind(doc, *parent) == Some(UiKind::ImageFrame));

        let frame = match existing_frame {
            Some(frame) => frame,
            None => {
                let frame = marks::create_ui_element(doc, "div", UiKind::ImageFrame);
                if !doc.replace(img, frame) {
                    return Err(EditorError::InvalidTarget(format!(
                        "image {} has no parent to frame it in",
                        img
                    )));
                }
                doc.append_child(frame, img);
                frame
            }
        };

        let existing_overlay = doc
            .children(frame)
            .iter()
            .copied()
            .find(|child| marks::ui_kind(doc, *child) == Some(UiKind::ImageOverlay));
        let overlay = match existing_overlay {
            Some(overlay) => overlay,
            None => {
                let overlay = marks::create_ui_element(doc, "div", UiKind::ImageOverlay);
                let label = doc.create_text("Upload Image");
                doc.append_child(overlay, label);
                doc.append_child(frame, overlay);
                overlay
            }
        };

        Ok((frame, overlay))
    }

    /// Frame each target and register its listeners. On failure every
    /// listener registered so far is removed before the error is returned.
    fn instrument(
        doc: &mut Document,
        targets: Vec<NodeId>,
        ctx: &mut PassContext<'_>,
        mut disposer: PassDisposer,
    ) -> Result<PassDisposer, EditorError> {
        for image in targets {
            let (frame, overlay) = match Self::frame_for(doc, image) {
                Ok(parts) => parts,
                Err(e) => {
                    disposer.dispose(ctx.listeners);
                    return Err(e);
                }
            };
            doc.set_attribute(image, marks::IMAGE, None);

            let open = Handler::OpenImageReplacement { image };
            disposer.track(ctx.listeners.on_node(image, GestureKind::Click, open));
            disposer.track(ctx.listeners.on_node(overlay, GestureKind::Click, open));
            disposer.track(ctx.listeners.on_node(
                frame,
                GestureKind::PointerEnter,
                Handler::ShowOverlay { overlay },
            ));
            disposer.track(ctx.listeners.on_node(
                frame,
                GestureKind::PointerLeave,
                Handler::HideOverlay { overlay },
            ));
            disposer.marked += 1;
        }
        Ok(disposer)
    }
}

impl InstrumentationPass for ImagePass {
    fn kind(&self) -> PassKind {
        PassKind::Image
    }

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let images: Vec<NodeId> = page_elements(doc)
            .into_iter()
            .filter(|id| doc.is_element(*id, "img"))
            .collect();

        let explicit: Vec<NodeId> = images
            .iter()
            .copied()
            .filter(|id| carries_marker(doc, *id, &ctx.config.image_marker))
            .collect();

        let targets = if explicit.is_empty() {
            disposer.used_fallback = true;
            images
                .into_iter()
                .filter(|id| {
                    doc.get_attribute(*id, "src")
                        .map(|src| !src.trim().is_empty())
                        .unwrap_or(false)
                })
                .collect()
        } else {
            explicit
        };

        Self::instrument(doc, targets, ctx, disposer)
    }
}

/// Gives anchors a double-click gesture for editing their destination
pub struct LinkPass;

impl InstrumentationPass for LinkPass {
    fn kind(&self) -> PassKind {
        PassKind::Link
    }

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let anchors: Vec<NodeId> = page_elements(doc)
            .into_iter()
            .filter(|id| doc.is_element(*id, "a"))
            .collect();

        for anchor in anchors {
            doc.set_attribute(anchor, marks::LINK, None);
            disposer.track(ctx.listeners.on_node(
                anchor,
                GestureKind::DoubleClick,
                Handler::EditLinkTarget,
            ));
            disposer.marked += 1;
        }
        Ok(disposer)
    }
}

/// Adds hover outlines to block containers and drag handles to top-level ones
pub struct ContainerPass;

impl ContainerPass {
    fn is_drag_candidate(doc: &Document, id: NodeId, config: &EditorConfig) -> bool {
        let Some(parent) = doc.parent(id) else {
            return false;
        };
        Some(parent) == doc.body() || tag_in(doc, parent, &config.drag_parent_tags)
    }

    fn handle_for(doc: &mut Document, container: NodeId) -> NodeId {
        let existing = doc
            .children(container)
            .iter()
            .copied()
            .find(|child| marks::ui_kind(doc, *child) == Some(UiKind::DragHandle));
        if let Some(handle) = existing {
            return handle;
        }

        let handle = marks::create_ui_element(doc, "div", UiKind::DragHandle);
        let label = doc.create_text("Move");
        doc.append_child(handle, label);
        doc.append_child(container, handle);
        handle
    }
}

impl InstrumentationPass for ContainerPass {
    fn kind(&self) -> PassKind {
        PassKind::Container
    }

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let containers: Vec<NodeId> = page_elements(doc)
            .into_iter()
            .filter(|id| tag_in(doc, *id, &ctx.config.container_tags))
            .collect();

        for container in containers {
            doc.set_attribute(container, marks::CONTAINER, None);
            disposer.track(ctx.listeners.on_node(
                container,
                GestureKind::Click,
                Handler::SelectContainer,
            ));

            if Self::is_drag_candidate(doc, container, ctx.config) {
                marks::stash_original(doc, container, "class");
                if let Some(element) = doc.element_mut(container) {
                    element.add_class("group");
                    element.add_class("relative");
                }
                let handle = Self::handle_for(doc, container);
                disposer.track(ctx.listeners.on_node(
                    handle,
                    GestureKind::PointerDown,
                    Handler::BeginDrag { target: container },
                ));
            }
            disposer.marked += 1;
        }
        Ok(disposer)
    }
}

/// Moves inline handlers aside so editing clicks do not trigger page behaviour
pub struct HandlerGuardPass;

impl InstrumentationPass for HandlerGuardPass {
    fn kind(&self) -> PassKind {
        PassKind::HandlerGuard
    }

    fn apply(&self, doc: &mut Document, ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
        let mut disposer = PassDisposer::new(self.kind());
        let elements: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|id| !doc.is_element(*id, "script") && !marks::is_editor_ui(doc, *id))
            .collect();

        for id in elements {
            for name in marks::INTERCEPTED_HANDLERS {
                if !doc.has_attribute(id, name) {
                    continue;
                }
                let relocated = format!("{}{}", marks::HANDLER_PREFIX, name);
                let renamed = doc
                    .element_mut(id)
                    .map(|element| element.rename(name, &relocated))
                    .unwrap_or(false);
                if !renamed {
                    debug!("Left {} on {} in place; {} already exists", name, id, relocated);
                }
            }

            if !marks::relocated_handlers(doc, id).is_empty() {
                disposer.track(ctx.listeners.on_node(id, GestureKind::Click, Handler::SelectElement));
                disposer.marked += 1;
            }
        }
        Ok(disposer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::ListenerTarget;

    fn instrument(source: &str) -> (Document, ListenerRegistry, InstrumentationReport) {
        let mut doc = Document::parse(source);
        let config = EditorConfig::default();
        let mut listeners = ListenerRegistry::new();
        let (_, report) = run_passes(&default_passes(), &mut doc, &config, &mut listeners);
        (doc, listeners, report)
    }

    #[test]
    fn test_explicit_markers_win_over_fallback() {
        let (doc, _, report) = instrument(
            "<body><h1 data-editable=\"true\">A</h1><p>B</p><img src=a.png data-editable=\"image\"><img src=b.png></body>",
        );
        assert_eq!(report.marked(PassKind::Text), 1);
        assert!(!report.used_fallback(PassKind::Text));
        assert_eq!(report.marked(PassKind::Image), 1);
        let p = doc.first_element_by_tag("p").unwrap();
        assert!(!doc.has_attribute(p, marks::TEXT));
    }

    #[test]
    fn test_fallback_applies_per_pass() {
        let (doc, _, report) = instrument(
            "<body><h1 data-editable=\"true\">A</h1><p>B</p><img src=a.png><img src=\"\"></body>",
        );
        assert!(!report.used_fallback(PassKind::Text));
        assert!(report.used_fallback(PassKind::Image));
        let images = doc.elements_by_tag("img");
        assert!(doc.has_attribute(images[0], marks::IMAGE));
        assert!(!doc.has_attribute(images[1], marks::IMAGE));
    }

    #[test]
    fn test_image_is_framed_once() {
        let source = "<body><p><img src=a.png></p></body>";
        let mut doc = Document::parse(source);
        let config = EditorConfig::default();
        let mut listeners = ListenerRegistry::new();
        let passes = default_passes();
        run_passes(&passes, &mut doc, &config, &mut listeners);
        clear_pass_marks(&mut doc);
        run_passes(&passes, &mut doc, &config, &mut listeners);

        let frames: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|id| marks::ui_kind(&doc, *id) == Some(UiKind::ImageFrame))
            .collect();
        assert_eq!(frames.len(), 1);
        let styles = doc
            .elements()
            .into_iter()
            .filter(|id| marks::ui_kind(&doc, *id) == Some(UiKind::Styles))
            .count();
        assert_eq!(styles, 1);
    }

    #[test]
    fn test_drag_handles_only_on_top_level_containers() {
        let (doc, listeners, _) = instrument(
            "<body><section><div>inner</div></section><main><article>a</article></main><footer><div>deep</div></footer></body>",
        );
        let handles: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|id| marks::ui_kind(&doc, *id) == Some(UiKind::DragHandle))
            .collect();
        let owners: Vec<&str> = handles
            .iter()
            .filter_map(|handle| doc.parent(*handle).and_then(|p| doc.tag_name(p)))
            .collect();
        // section (body child), div (section child), article (main child), footer (body child)
        assert_eq!(owners, vec!["section", "div", "article", "footer"]);
        for handle in handles {
            assert_eq!(listeners.count_for(ListenerTarget::Node(handle)), 1);
        }
    }

    #[test]
    fn test_handlers_are_relocated_but_scripts_untouched() {
        let (doc, _, report) = instrument(
            "<body><button onclick=\"go()\">Go</button><script onclick=\"x\">go()</script></body>",
        );
        let button = doc.first_element_by_tag("button").unwrap();
        assert!(!doc.has_attribute(button, "onclick"));
        assert_eq!(doc.get_attribute(button, "data-wb-handler-onclick"), Some("go()"));
        let script = doc.first_element_by_tag("script").unwrap();
        assert!(doc.has_attribute(script, "onclick"));
        assert_eq!(report.marked(PassKind::HandlerGuard), 1);
    }

    #[test]
    fn test_styles_without_head_go_after_the_doctype() {
        let source = "<!DOCTYPE html>\n<body><p>x</p></body>";
        let (doc, _, report) = instrument(source);
        assert!(report.is_complete());
        assert!(doc.serialize().starts_with("<!DOCTYPE html>\n<style"));

        let root = doc.root();
        let style = doc
            .children(root)
            .iter()
            .copied()
            .find(|id| marks::ui_kind(&doc, *id) == Some(UiKind::Styles))
            .unwrap();
        let body = doc.body().unwrap();
        let position = |id: NodeId| doc.children(root).iter().position(|child| *child == id);
        assert!(position(style) < position(body));
        assert!(!matches!(doc.kind(doc.children(root)[0]), Some(webcraft_core::NodeKind::Element(_))));
    }

    #[test]
    fn test_image_failure_releases_earlier_listeners() {
        let mut doc = Document::parse("<body><img src=a.png></body>");
        let attached = doc.first_element_by_tag("img").unwrap();
        let detached = doc.create_element("img");
        let config = EditorConfig::default();
        let mut listeners = ListenerRegistry::new();
        let mut ctx = PassContext {
            config: &config,
            listeners: &mut listeners,
        };

        let result = ImagePass::instrument(
            &mut doc,
            vec![attached, detached],
            &mut ctx,
            PassDisposer::new(PassKind::Image),
        );
        assert!(matches!(result, Err(EditorError::InvalidTarget(_))));
        assert!(listeners.is_empty());
    }

    struct FailingPass;

    impl InstrumentationPass for FailingPass {
        fn kind(&self) -> PassKind {
            PassKind::Link
        }

        fn apply(&self, _doc: &mut Document, _ctx: &mut PassContext<'_>) -> Result<PassDisposer, EditorError> {
            Err(EditorError::InvalidTarget("broken".to_string()))
        }
    }

    #[test]
    fn test_failing_pass_does_not_stop_the_others() {
        let mut doc = Document::parse("<body><p>x</p><a href=\"/\">y</a></body>");
        let config = EditorConfig::default();
        let mut listeners = ListenerRegistry::new();
        let passes: Vec<Box<dyn InstrumentationPass>> =
            vec![Box::new(FailingPass), Box::new(TextPass)];
        let (disposers, report) = run_passes(&passes, &mut doc, &config, &mut listeners);

        assert_eq!(disposers.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.marked(PassKind::Text), 2);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_disposers_remove_their_listeners() {
        let mut doc = Document::parse("<body><p>x</p><a href=\"/\">y</a></body>");
        let config = EditorConfig::default();
        let mut listeners = ListenerRegistry::new();
        let (disposers, _) = run_passes(&default_passes(), &mut doc, &config, &mut listeners);
        assert!(!listeners.is_empty());
        for disposer in disposers {
            disposer.dispose(&mut listeners);
        }
        assert!(listeners.is_empty());
    }
}
