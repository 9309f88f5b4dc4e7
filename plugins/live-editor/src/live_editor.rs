//! The live editing session
//!
//! [`LiveEditor`] owns the realm, the listener registry, the pass list and
//! the single selection. Every document access goes through the realm guard.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;
use webcraft_core::{
    Document, EditorConfig, Exporter, HandoffKey, HandoffStore, InlineStyle, NodeId, Notice,
    Result as CoreResult,
};

use crate::cleanup;
use crate::drag::{self, DragSession, LayoutSource, NoLayout};
use crate::gesture::{Gesture, GestureOutcome};
use crate::interactivity::{self, InteractivityReport};
use crate::listeners::{GestureKind, Handler, ListenerRegistry, ListenerTarget};
use crate::marks;
use crate::passes::{self, InstrumentationPass, InstrumentationReport, PassDisposer};
use crate::realm::{ElementRef, Realm, SandboxPolicy};
use crate::selection::{ImageTarget, Selection, SelectionMode};
use crate::EditorError;

/// Outline drawn around the selected element
pub const SELECTION_OUTLINE: &str = "2px solid #3b82f6";

/// Message shown after a successful save
pub const SAVED_MESSAGE: &str = "Your changes have been saved!";

/// Shown while the selection carries an inline click handler
pub const HANDLER_NOTICE: &str =
    "This element has JavaScript functionality. Switch to Preview mode to test it.";

/// One editing session over one realm
pub struct LiveEditor {
    pub(crate) id: Uuid,
    pub(crate) config: EditorConfig,
    pub(crate) realm: Realm,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) passes: Vec<Box<dyn InstrumentationPass>>,
    pub(crate) disposers: Vec<PassDisposer>,
    pub(crate) selection: Selection,
    pub(crate) drag: Option<DragSession>,
    pub(crate) layout: Box<dyn LayoutSource>,
    pub(crate) preview: Option<String>,
    pub(crate) interactivity: InteractivityReport,
    pub(crate) report: InstrumentationReport,
    saved_hash: Option<String>,
}

impl LiveEditor {
    pub fn new(config: EditorConfig) -> Self {
        let realm = Realm::new(SandboxPolicy::new(config.sandbox.clone()));
        Self {
            id: Uuid::new_v4(),
            config,
            realm,
            listeners: ListenerRegistry::new(),
            passes: passes::default_passes(),
            disposers: Vec::new(),
            selection: Selection::default(),
            drag: None,
            layout: Box::new(NoLayout),
            preview: None,
            interactivity: InteractivityReport::default(),
            report: InstrumentationReport::default(),
            saved_hash: None,
        }
    }

    pub fn with_layout<L: LayoutSource + 'static>(mut self, layout: L) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Replace the pass list; takes effect on the next load
    pub fn with_passes(mut self, passes: Vec<Box<dyn InstrumentationPass>>) -> Self {
        self.passes = passes;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Render `source` into the realm and instrument it
    pub fn load(&mut self, source: &str) -> Result<&InstrumentationReport, EditorError> {
        if let Some(session) = self.drag.take() {
            session.finish(&mut self.listeners);
        }
        self.listeners.clear();
        self.disposers.clear();
        self.selection.clear();
        self.preview = None;
        self.report = InstrumentationReport::default();

        self.realm.load(source);
        let doc = self.realm.try_write()?;
        self.interactivity = InteractivityReport::detect(doc);

        self.instrument()?;
        self.saved_hash = Some(content_hash(&self.capture()?));

        info!(
            "Editor {} loaded document: {} text, {} image, {} container elements",
            self.id,
            self.report.marked(passes::PassKind::Text),
            self.report.marked(passes::PassKind::Image),
            self.report.marked(passes::PassKind::Container)
        );
        Ok(&self.report)
    }

    fn instrument(&mut self) -> Result<(), EditorError> {
        let doc = self.realm.try_write()?;
        let (disposers, report) =
            passes::run_passes(&self.passes, doc, &self.config, &mut self.listeners);
        self.disposers = disposers;
        self.report = report;
        Ok(())
    }

    /// Dispose every pass listener and run the pass list again
    pub fn reinstrument(&mut self) -> Result<&InstrumentationReport, EditorError> {
        for disposer in self.disposers.drain(..) {
            disposer.dispose(&mut self.listeners);
        }
        passes::clear_pass_marks(self.realm.try_write()?);
        self.instrument()?;
        Ok(&self.report)
    }

    pub fn report(&self) -> &InstrumentationReport {
        &self.report
    }

    pub fn interactivity(&self) -> &InteractivityReport {
        &self.interactivity
    }

    pub fn document(&self) -> Result<&Document, EditorError> {
        self.realm.try_read()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn selected(&self) -> Option<ElementRef> {
        self.selection.element()
    }

    pub fn image_target(&self) -> Option<ImageTarget> {
        self.selection.image_target()
    }

    /// The selected node, if the reference is still current
    pub fn selected_node(&self) -> Option<NodeId> {
        self.selection
            .element()
            .and_then(|element| self.realm.resolve(element).ok())
    }

    /// True when the selection carries an inline click handler, which only
    /// runs in preview
    pub fn selected_has_handlers(&self) -> bool {
        match (self.selected_node(), self.realm.try_read()) {
            (Some(node), Ok(doc)) => interactivity::has_click_handler(doc, node),
            _ => false,
        }
    }

    /// Inline notice for the current selection, if it needs one
    pub fn selection_notice(&self) -> Option<Notice> {
        self.selected_has_handlers()
            .then(|| Notice::inline(HANDLER_NOTICE))
    }

    pub(crate) fn resolve_selected(&self) -> Result<NodeId, EditorError> {
        let element = self.selection.element().ok_or(EditorError::NoSelection)?;
        self.realm.resolve(element)
    }

    /// Select `node`, clearing any previous selection first
    pub fn select(&mut self, node: NodeId, mode: SelectionMode) -> Result<ElementRef, EditorError> {
        {
            let doc = self.realm.try_read()?;
            if doc.element(node).is_none() || !doc.is_attached(node) {
                return Err(EditorError::InvalidTarget(format!(
                    "node {} is not an element of the document",
                    node
                )));
            }
            if marks::is_editor_ui(doc, node) {
                return Err(EditorError::InvalidTarget(
                    "editor controls cannot be selected".to_string(),
                ));
            }
        }

        self.clear_visuals(self.selection.element());
        let element = self.realm.element_ref(node);
        apply_visuals(self.realm.try_write()?, node, mode == SelectionMode::EditingText);
        self.selection.set(element, mode);
        debug!("Selected {} ({})", node, mode);
        Ok(element)
    }

    /// Clear the selection and its editing affordances
    pub fn deselect(&mut self) -> Result<bool, EditorError> {
        if let Some(session) = self.drag.take() {
            session.finish(&mut self.listeners);
        }
        let had_selection = self.selection.element().is_some();
        self.clear_visuals(self.selection.modal_origin());
        self.clear_visuals(self.selection.element());
        self.selection.clear();
        if had_selection {
            debug!("Selection cleared");
        }
        Ok(had_selection)
    }

    /// Remove selection visuals from `element` if it still resolves
    pub(crate) fn clear_visuals(&mut self, element: Option<ElementRef>) {
        let Some(node) = element.and_then(|element| self.realm.resolve(element).ok()) else {
            return;
        };
        if let Ok(doc) = self.realm.try_write() {
            clear_visuals(doc, node);
        }
    }

    /// Finish a modal by moving the visual selection onto `node`
    pub(crate) fn commit_modal(&mut self, node: NodeId) -> Result<ElementRef, EditorError> {
        self.clear_visuals(self.selection.modal_origin());
        self.selection.close_modal(SelectionMode::Selected);
        self.select(node, SelectionMode::Selected)
    }

    /// Leave a pending modal; the document is untouched
    pub fn cancel_modal(&mut self) -> Option<ElementRef> {
        if !self.selection.mode().is_modal() {
            return self.selection.element();
        }
        debug!("Modal {} cancelled", self.selection.mode());
        self.selection.cancel_modal()
    }

    /// Route one realm gesture to its listeners
    pub fn dispatch(&mut self, gesture: Gesture) -> Result<GestureOutcome, EditorError> {
        if self.preview.is_some() || self.selection.mode().is_modal() {
            return Ok(GestureOutcome::Ignored);
        }
        self.realm.try_read()?;

        match &gesture {
            Gesture::Input { text } => return self.input_text(text),
            Gesture::PointerMove { x, y } | Gesture::PointerUp { x, y } => {
                let handlers = self.listeners.handlers(ListenerTarget::Realm, gesture.kind());
                for handler in handlers {
                    match handler {
                        Handler::DragMove => return self.drag_move(*x, *y),
                        Handler::DragEnd => return Ok(self.end_drag()),
                        _ => {}
                    }
                }
                return Ok(GestureOutcome::Unhandled);
            }
            _ => {}
        }

        let Some(target) = gesture.target() else {
            return Ok(GestureOutcome::Unhandled);
        };
        let chain = {
            let doc = self.realm.try_read()?;
            if !doc.is_attached(target) {
                return Ok(GestureOutcome::Unhandled);
            }
            let mut chain = vec![target];
            chain.extend(doc.ancestors(target));
            chain
        };

        for current in &chain {
            let handlers = self
                .listeners
                .handlers(ListenerTarget::Node(*current), gesture.kind());
            for handler in handlers {
                if let Some(outcome) = self.run_handler(handler, *current, &gesture)? {
                    return Ok(outcome);
                }
            }
        }

        // a click inside the selection keeps it
        let inside_selection = self
            .selected_node()
            .map(|selected| chain.contains(&selected))
            .unwrap_or(false);
        if gesture.kind() == GestureKind::Click && !inside_selection && self.deselect()? {
            return Ok(GestureOutcome::Deselected);
        }
        Ok(GestureOutcome::Unhandled)
    }

    fn run_handler(
        &mut self,
        handler: Handler,
        current: NodeId,
        gesture: &Gesture,
    ) -> Result<Option<GestureOutcome>, EditorError> {
        let outcome = match handler {
            Handler::SelectText => self.selected_outcome(current, SelectionMode::EditingText)?,
            Handler::SelectElement | Handler::SelectContainer => {
                self.selected_outcome(current, SelectionMode::Selected)?
            }
            Handler::OpenImageReplacement { image } => {
                let image = self.realm.element_ref(image);
                self.realm.resolve(image)?;
                self.selection.open_modal(
                    image,
                    SelectionMode::AwaitingImageReplacement,
                    Some(ImageTarget::Existing),
                );
                debug!("Image replacement requested for {}", image.node());
                GestureOutcome::ImageReplacementRequested { image }
            }
            Handler::EditLinkTarget => {
                let link = self.realm.element_ref(current);
                let href = self
                    .realm
                    .try_read()?
                    .get_attribute(current, "href")
                    .map(str::to_string);
                self.selection
                    .open_modal(link, SelectionMode::AwaitingLinkEdit, None);
                GestureOutcome::LinkEditRequested { link, href }
            }
            Handler::BeginDrag { target: container } => {
                let (x, y) = gesture.position().unwrap_or_default();
                self.begin_drag(container, x, y)?
            }
            Handler::ShowOverlay { overlay } => {
                self.realm
                    .try_write()?
                    .set_attribute(overlay, "style", Some("display: flex"));
                GestureOutcome::OverlayShown
            }
            Handler::HideOverlay { overlay } => {
                self.realm.try_write()?.remove_attribute(overlay, "style");
                GestureOutcome::OverlayHidden
            }
            Handler::DragMove | Handler::DragEnd => return Ok(None),
        };
        Ok(Some(outcome))
    }

    fn selected_outcome(&mut self, node: NodeId, mode: SelectionMode) -> Result<GestureOutcome, EditorError> {
        let element = self.select(node, mode)?;
        Ok(GestureOutcome::Selected { element, mode })
    }

    /// Replace the page content of the element being edited, keeping editor
    /// controls inside it
    fn input_text(&mut self, text: &str) -> Result<GestureOutcome, EditorError> {
        if self.selection.mode() != SelectionMode::EditingText {
            return Ok(GestureOutcome::Unhandled);
        }
        let node = self.resolve_selected()?;
        let doc = self.realm.try_write()?;
        for child in doc.children(node).to_vec() {
            if !doc.has_attribute(child, marks::UI) {
                doc.detach(child);
            }
        }
        let text_node = doc.create_text(text);
        doc.prepend_child(node, text_node);
        debug!("Updated text of {}", node);
        Ok(GestureOutcome::TextUpdated)
    }

    fn begin_drag(&mut self, container: NodeId, x: f64, y: f64) -> Result<GestureOutcome, EditorError> {
        if let Some(session) = self.drag.take() {
            session.finish(&mut self.listeners);
        }
        let target = self.select(container, SelectionMode::BeingDragged)?;
        let doc = self.realm.try_read()?;
        let session = DragSession::begin(doc, self.layout.as_ref(), &mut self.listeners, target, x, y);
        self.drag = Some(session);
        Ok(GestureOutcome::DragStarted { target })
    }

    fn drag_move(&mut self, x: f64, y: f64) -> Result<GestureOutcome, EditorError> {
        let Some(target) = self.drag.as_ref().map(|session| session.target()) else {
            return Ok(GestureOutcome::Unhandled);
        };
        let node = match self.realm.resolve(target) {
            Ok(node) => node,
            Err(e) => {
                warn!("Dragged element disappeared: {}", e);
                self.cancel_drag();
                return Err(e);
            }
        };
        let Some(session) = &self.drag else {
            return Ok(GestureOutcome::Unhandled);
        };
        let (left, top) = session.offset_for(self.realm.try_read()?, self.layout.as_ref(), x, y);
        drag::write_position(self.realm.try_write()?, node, left, top);
        Ok(GestureOutcome::DragMoved { left, top })
    }

    fn end_drag(&mut self) -> GestureOutcome {
        if self.cancel_drag() {
            GestureOutcome::DragEnded
        } else {
            GestureOutcome::Unhandled
        }
    }

    /// Stop a drag in progress; the element keeps its last position
    pub fn cancel_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(session) => {
                session.finish(&mut self.listeners);
                self.selection.set_mode(SelectionMode::Selected);
                true
            }
            None => false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Clean serialization of the live document; the live tree is untouched
    pub fn capture(&self) -> Result<String, EditorError> {
        Ok(cleanup::capture(self.realm.try_read()?))
    }

    pub fn has_unsaved_changes(&self) -> Result<bool, EditorError> {
        let current = content_hash(&self.capture()?);
        Ok(self.saved_hash.as_deref() != Some(current.as_str()))
    }

    /// Capture and hand the document to the handoff store
    pub async fn save(&mut self, store: &HandoffStore) -> CoreResult<Notice> {
        let html = self.capture()?;
        let hash = content_hash(&html);
        store.set(HandoffKey::EditedContent, html).await?;
        self.saved_hash = Some(hash);
        info!("Editor {} saved its document", self.id);
        Ok(Notice::inline(SAVED_MESSAGE))
    }

    /// Capture and write the export file
    pub async fn export(&self, exporter: &Exporter, path: &Path) -> CoreResult<PathBuf> {
        let html = self.capture()?;
        exporter.export(&html, path).await
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// The clean document shown while previewing
    pub fn preview_document(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Switch between editing and preview; returns true when previewing
    pub fn toggle_preview(&mut self) -> Result<bool, EditorError> {
        if self.preview.take().is_some() {
            debug!("Editor {} left preview", self.id);
            return Ok(false);
        }
        self.cancel_modal();
        self.deselect()?;
        self.preview = Some(self.capture()?);
        debug!("Editor {} entered preview", self.id);
        Ok(true)
    }
}

fn apply_visuals(doc: &mut Document, node: NodeId, editing: bool) {
    marks::stash_original(doc, node, "style");
    let mut style = InlineStyle::parse(doc.get_attribute(node, "style").unwrap_or(""));
    style.set("outline", SELECTION_OUTLINE);
    doc.set_attribute(node, "style", Some(&style.to_string()));
    doc.set_attribute(node, marks::SELECTED, None);
    if editing {
        marks::set_instrumented(doc, node, "contenteditable", Some("true"));
    }
}

fn clear_visuals(doc: &mut Document, node: NodeId) {
    marks::restore_original(doc, node, "style");
    marks::restore_original(doc, node, "contenteditable");
    doc.remove_attribute(node, marks::SELECTED);
}

fn content_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
