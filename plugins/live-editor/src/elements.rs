//! Link editing, link conversion and element deletion

use tracing::{debug, info};

use crate::live_editor::LiveEditor;
use crate::marks::{self, UiKind};
use crate::realm::ElementRef;
use crate::selection::SelectionMode;
use crate::EditorError;

impl LiveEditor {
    /// Open the link target modal for the selected anchor; returns its href
    pub fn begin_link_edit(&mut self) -> Result<Option<String>, EditorError> {
        let element = self.selection.element().ok_or(EditorError::NoSelection)?;
        let node = self.realm.resolve(element)?;
        let doc = self.realm.try_read()?;
        if !doc.is_element(node, "a") {
            return Err(EditorError::InvalidTarget(
                "Only links have a destination to edit".to_string(),
            ));
        }
        let href = doc.get_attribute(node, "href").map(str::to_string);
        self.selection
            .open_modal(element, SelectionMode::AwaitingLinkEdit, None);
        Ok(href)
    }

    /// Finish the link modal. `None` or blank input keeps the current href.
    /// Returns whether the href changed.
    pub fn submit_link_target(&mut self, href: Option<&str>) -> Result<bool, EditorError> {
        if self.selection.mode() != SelectionMode::AwaitingLinkEdit {
            return Err(EditorError::InvalidTarget(
                "No link edit is pending".to_string(),
            ));
        }
        let Some(href) = href.map(str::trim).filter(|href| !href.is_empty()) else {
            self.cancel_modal();
            return Ok(false);
        };

        let element = self.selection.element().ok_or(EditorError::NoSelection)?;
        let node = match self.realm.resolve(element) {
            Ok(node) => node,
            Err(e) => {
                self.selection.cancel_modal();
                return Err(e);
            }
        };
        self.realm
            .try_write()?
            .set_attribute(node, "href", Some(href));
        debug!("Link {} now points to {}", node, href);
        self.commit_modal(node)?;
        Ok(true)
    }

    /// Wrap the selected element's content in a new anchor that takes its place
    pub fn convert_to_link(&mut self, href: &str) -> Result<ElementRef, EditorError> {
        let href = href.trim();
        if href.is_empty() {
            return Err(EditorError::Validation("Please enter a link URL".to_string()));
        }
        let node = self.resolve_selected()?;
        if self.realm.try_read()?.is_element(node, "a") {
            return Err(EditorError::InvalidTarget(
                "The element is already a link".to_string(),
            ));
        }
        self.cancel_drag();

        let doc = self.realm.try_write()?;
        let anchor = doc.create_element("a");
        doc.set_attribute(anchor, "href", Some(href));
        for child in doc.children(node).to_vec() {
            if !doc.has_attribute(child, marks::UI) {
                doc.append_child(anchor, child);
            }
        }
        if !doc.replace(node, anchor) {
            return Err(EditorError::InvalidTarget(
                "The element has no parent to replace it in".to_string(),
            ));
        }

        self.selection.clear();
        self.reinstrument()?;
        info!("Converted {} into a link to {}", node, href);
        self.select(anchor, SelectionMode::Selected)
    }

    /// Remove the selected element from the document
    pub fn delete_selected(&mut self) -> Result<(), EditorError> {
        let node = self.resolve_selected()?;
        self.cancel_drag();

        let doc = self.realm.try_write()?;
        let removed = match doc.parent(node) {
            Some(frame) if marks::ui_kind(doc, frame) == Some(UiKind::ImageFrame) => frame,
            _ => node,
        };
        doc.detach(removed);

        self.selection.clear();
        self.reinstrument()?;
        info!("Deleted {}", node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Gesture, GestureOutcome};
    use webcraft_core::EditorConfig;

    fn loaded(source: &str) -> LiveEditor {
        let mut editor = LiveEditor::new(EditorConfig::default());
        editor.load(source).unwrap();
        editor
    }

    fn first(editor: &LiveEditor, tag: &str) -> webcraft_core::NodeId {
        editor.document().unwrap().first_element_by_tag(tag).unwrap()
    }

    #[test]
    fn test_double_click_edits_link_target() {
        let mut editor = loaded("<body><a href=\"/old\">Go</a></body>");
        let a = first(&editor, "a");
        let outcome = editor.dispatch(Gesture::DoubleClick { target: a }).unwrap();
        assert!(matches!(
            outcome,
            GestureOutcome::LinkEditRequested { href: Some(ref h), .. } if h == "/old"
        ));
        // gestures wait while the prompt is open
        assert_eq!(
            editor.dispatch(Gesture::Click { target: a }).unwrap(),
            GestureOutcome::Ignored
        );
        assert!(editor.submit_link_target(Some("/new")).unwrap());
        assert_eq!(editor.capture().unwrap(), "<body><a href=\"/new\">Go</a></body>");
    }

    #[test]
    fn test_cancelled_or_blank_link_edit_keeps_href() {
        let source = "<body><a href=\"/keep\">Go</a></body>";
        let mut editor = loaded(source);
        let a = first(&editor, "a");

        editor.dispatch(Gesture::DoubleClick { target: a }).unwrap();
        assert!(!editor.submit_link_target(None).unwrap());
        editor.dispatch(Gesture::DoubleClick { target: a }).unwrap();
        assert!(!editor.submit_link_target(Some("   ")).unwrap());

        assert_eq!(editor.capture().unwrap(), source);
        assert!(!editor.selection_mode().is_modal());
    }

    #[test]
    fn test_convert_to_link_keeps_slot_and_children() {
        let mut editor = loaded("<body><div><p class=\"c\">Hi <b>there</b></p><hr></div></body>");
        let p = first(&editor, "p");
        editor.select(p, SelectionMode::EditingText).unwrap();
        let link = editor.convert_to_link("https://example.com").unwrap();

        assert_eq!(editor.selected(), Some(link));
        assert_eq!(
            editor.capture().unwrap(),
            "<body><div><a href=\"https://example.com\">Hi <b>there</b></a><hr></div></body>"
        );
        assert!(matches!(
            editor.convert_to_link("   "),
            Err(EditorError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_selected_image_removes_frame() {
        let mut editor = loaded("<body><p>a</p><img src=\"x.png\"><p>b</p></body>");
        let img = first(&editor, "img");
        editor.select(img, SelectionMode::Selected).unwrap();
        editor.delete_selected().unwrap();

        assert_eq!(editor.selected(), None);
        assert_eq!(editor.capture().unwrap(), "<body><p>a</p><p>b</p></body>");
        assert_eq!(editor.delete_selected(), Err(EditorError::NoSelection));
    }
}
