//! WebCraft Generator - turns a natural-language prompt into a starter site
//!
//! The prompt is enriched with deterministic hints, wrapped in an instruction
//! template and sent to a [`TextGenerator`]. The reply is split into its
//! HTML, CSS and JavaScript regions and composed into a preview document the
//! live editor can open.

pub mod backend;
pub mod client;
pub mod preview;
pub mod prompt;
pub mod response;

pub use backend::{GeminiBackend, GenerationRequest, TextGenerator};
pub use client::GenerationClient;
pub use preview::{compose_preview_document, PREVIEW_TITLE};
pub use prompt::{build_instruction, enhance_prompt};
pub use response::{parse_generated_text, GeneratedSite, Region};
