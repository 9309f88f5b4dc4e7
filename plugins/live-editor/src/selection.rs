//! Selection state machine
//!
//! At most one element is selected. Its sub-state is one of the
//! [`SelectionMode`] values, so an element can never be editing text,
//! awaiting an image and being dragged at the same time.

use crate::realm::ElementRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Idle,
    Selected,
    EditingText,
    AwaitingImageReplacement,
    AwaitingLinkEdit,
    BeingDragged,
}

impl SelectionMode {
    /// Modes that wait on a dialog; realm gestures are ignored meanwhile
    pub fn is_modal(&self) -> bool {
        matches!(
            self,
            SelectionMode::AwaitingImageReplacement | SelectionMode::AwaitingLinkEdit
        )
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SelectionMode::Idle => "idle",
            SelectionMode::Selected => "selected",
            SelectionMode::EditingText => "editing-text",
            SelectionMode::AwaitingImageReplacement => "awaiting-image",
            SelectionMode::AwaitingLinkEdit => "awaiting-link",
            SelectionMode::BeingDragged => "dragging",
        };
        f.write_str(name)
    }
}

/// What a pending image replacement will do once a source arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    /// Update the selected image's source
    Existing,
    /// Replace the selected element with a new image
    Convert,
}

/// State saved when a modal opens so that cancelling can restore it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModalReturn {
    element: Option<ElementRef>,
    mode: SelectionMode,
}

#[derive(Debug, Default)]
pub struct Selection {
    element: Option<ElementRef>,
    mode: SelectionMode,
    modal_return: Option<ModalReturn>,
    image_target: Option<ImageTarget>,
}

impl Selection {
    pub fn element(&self) -> Option<ElementRef> {
        self.element
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn image_target(&self) -> Option<ImageTarget> {
        self.image_target
    }

    pub(crate) fn set(&mut self, element: ElementRef, mode: SelectionMode) {
        self.element = Some(element);
        self.mode = mode;
    }

    pub(crate) fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = if self.element.is_some() {
            mode
        } else {
            SelectionMode::Idle
        };
    }

    pub(crate) fn clear(&mut self) {
        self.element = None;
        self.mode = SelectionMode::Idle;
        self.modal_return = None;
        self.image_target = None;
    }

    /// Enter a modal mode for `element`, remembering what to return to
    pub(crate) fn open_modal(
        &mut self,
        element: ElementRef,
        mode: SelectionMode,
        image_target: Option<ImageTarget>,
    ) {
        self.modal_return = Some(ModalReturn {
            element: self.element,
            mode: self.mode,
        });
        self.element = Some(element);
        self.mode = mode;
        self.image_target = image_target;
    }

    /// The element that carried the selection when the modal opened
    pub(crate) fn modal_origin(&self) -> Option<ElementRef> {
        self.modal_return.and_then(|previous| previous.element)
    }

    /// Leave the modal after it completed
    pub(crate) fn close_modal(&mut self, mode: SelectionMode) {
        self.modal_return = None;
        self.image_target = None;
        self.set_mode(mode);
    }

    /// Leave the modal without effect; returns the restored selection
    pub(crate) fn cancel_modal(&mut self) -> Option<ElementRef> {
        if let Some(previous) = self.modal_return.take() {
            self.element = previous.element;
            self.mode = previous.mode;
        }
        self.image_target = None;
        self.element
    }
}
