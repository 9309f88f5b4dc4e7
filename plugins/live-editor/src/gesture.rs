//! Realm gestures and what dispatching them did

use webcraft_core::NodeId;

use crate::listeners::GestureKind;
use crate::realm::ElementRef;
use crate::selection::SelectionMode;

/// A discrete user gesture inside the realm
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Click { target: NodeId },
    DoubleClick { target: NodeId },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId },
    PointerDown { target: NodeId, x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// Typed content for the element being edited
    Input { text: String },
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::Click { .. } => GestureKind::Click,
            Gesture::DoubleClick { .. } => GestureKind::DoubleClick,
            Gesture::PointerEnter { .. } => GestureKind::PointerEnter,
            Gesture::PointerLeave { .. } => GestureKind::PointerLeave,
            Gesture::PointerDown { .. } => GestureKind::PointerDown,
            Gesture::PointerMove { .. } => GestureKind::PointerMove,
            Gesture::PointerUp { .. } => GestureKind::PointerUp,
            Gesture::Input { .. } => GestureKind::Input,
        }
    }

    /// The node the gesture was aimed at; realm-wide gestures have none
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Gesture::Click { target }
            | Gesture::DoubleClick { target }
            | Gesture::PointerEnter { target }
            | Gesture::PointerLeave { target }
            | Gesture::PointerDown { target, .. } => Some(*target),
            Gesture::PointerMove { .. } | Gesture::PointerUp { .. } | Gesture::Input { .. } => None,
        }
    }

    /// Pointer coordinates, when the gesture carries them
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Gesture::PointerDown { x, y, .. }
            | Gesture::PointerMove { x, y }
            | Gesture::PointerUp { x, y } => Some((*x, *y)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Preview mode or a pending modal swallowed the gesture
    Ignored,
    /// No listener consumed the gesture
    Unhandled,
    Selected { element: ElementRef, mode: SelectionMode },
    Deselected,
    ImageReplacementRequested { image: ElementRef },
    /// The caller should prompt for a destination, prefilled with `href`
    LinkEditRequested { link: ElementRef, href: Option<String> },
    OverlayShown,
    OverlayHidden,
    DragStarted { target: ElementRef },
    DragMoved { left: f64, top: f64 },
    DragEnded,
    TextUpdated,
}
