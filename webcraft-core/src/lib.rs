//! WebCraft Core - shared foundation of the WebCraft site builder
//!
//! This crate provides the error taxonomy, configuration, the lossless HTML
//! document model used by the live editor, the structured builder state and
//! the persistence seams (handoff store, object storage, export).

pub mod builder;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod handoff;
pub mod html;
pub mod storage;
pub mod style;

// Re-export commonly used types
pub use builder::{slugify, BuilderState, BuilderStore, Page, PageUpdate};
pub use component::{
    Alignment, ButtonVariant, Component, ComponentKind, ComponentProps, ComponentUpdate,
    LinkTarget, NavItem,
};
pub use config::{
    Config, ConfigLoadContext, ConfigMetadata, EditorConfig, ExportConfig, GeneratorConfig,
    MarkerConfig, StorageConfig, ValidationStatus,
};
pub use dom::{Attribute, Document, Element, NodeId, NodeKind};
pub use error::{ErrorSeverity, Notice, NoticeStyle, Result, WebcraftError};
pub use export::{inject_handler_shim, write_atomic, Exporter, HANDLER_SHIM, SHIM_ATTRIBUTE};
pub use handoff::{HandoffKey, HandoffStore};
pub use storage::{upload_path, FsObjectStore, InMemoryObjectStore, ObjectStore};
pub use style::InlineStyle;
