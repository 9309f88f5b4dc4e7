//! In-document live editing for WebCraft
//!
//! The engine loads an HTML document into a guarded realm, instruments it
//! with a list of passes, routes user gestures to selection and editing
//! operations and captures a clean copy of the document on demand.

pub mod cleanup;
pub mod drag;
pub mod elements;
pub mod gesture;
pub mod image;
pub mod interactivity;
pub mod listeners;
pub mod live_editor;
pub mod marks;
pub mod passes;
pub mod realm;
pub mod selection;

pub use cleanup::{capture, cleanup};
pub use drag::{FixedLayout, LayoutSource, NoLayout, Rect};
pub use gesture::{Gesture, GestureOutcome};
pub use image::{validate_image_file, ImageFile, ImageSource, ImageUploader};
pub use interactivity::InteractivityReport;
pub use listeners::{GestureKind, Handler, ListenerId, ListenerRegistry, ListenerTarget};
pub use live_editor::{LiveEditor, HANDLER_NOTICE, SAVED_MESSAGE};
pub use passes::{
    default_passes, InstrumentationPass, InstrumentationReport, PassContext, PassDisposer,
    PassKind,
};
pub use realm::{ElementRef, Realm, RealmAccess, SandboxPolicy};
pub use selection::{ImageTarget, SelectionMode};

use thiserror::Error;
use webcraft_core::WebcraftError;

/// Errors raised inside the live editor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Access denied: {reason}. {remediation}")]
    AccessDenied { reason: String, remediation: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("{0}")]
    Validation(String),

    #[error("No element is selected")]
    NoSelection,

    #[error("The selected element is no longer part of the document")]
    StaleReference,

    #[error("No document is loaded")]
    NoDocument,
}

impl From<EditorError> for WebcraftError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::AccessDenied {
                reason,
                remediation,
            } => WebcraftError::AccessDenied {
                reason,
                remediation,
            },
            EditorError::Validation(message) => WebcraftError::Validation(message),
            EditorError::NoDocument => WebcraftError::Validation(
                "No content found. Please generate a website first.".to_string(),
            ),
            other @ (EditorError::InvalidTarget(_)
            | EditorError::NoSelection
            | EditorError::StaleReference) => WebcraftError::InvalidTarget(other.to_string()),
        }
    }
}
