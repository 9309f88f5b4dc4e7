//! Transient key/value scratch space shared by the generation and editing views

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Result, WebcraftError};

/// The fixed set of handoff entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandoffKey {
    /// The complete document as last saved by the editor
    EditedContent,
    GeneratedHtml,
    GeneratedCss,
    GeneratedJs,
}

impl HandoffKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffKey::EditedContent => "editedContent",
            HandoffKey::GeneratedHtml => "generatedHtml",
            HandoffKey::GeneratedCss => "generatedCss",
            HandoffKey::GeneratedJs => "generatedJs",
        }
    }
}

/// Process-wide handoff store, optionally mirrored to a JSON file
#[derive(Clone, Default)]
pub struct HandoffStore {
    entries: Arc<RwLock<HashMap<HandoffKey, String>>>,
    path: Option<PathBuf>,
}

impl HandoffStore {
    /// A store that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading existing entries when the file exists
    pub async fn open(path: &Path) -> Result<Self> {
        let entries = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                WebcraftError::persistence(format!(
                    "Handoff file {} is corrupt: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened handoff store at {}", path.display());
        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            path: Some(path.to_path_buf()),
        })
    }

    pub async fn get(&self, key: HandoffKey) -> Option<String> {
        self.entries.read().await.get(&key).cloned()
    }

    pub async fn set(&self, key: HandoffKey, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key, value);
        self.persist(&entries).await
    }

    pub async fn remove(&self, key: HandoffKey) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(&key);
        self.persist(&entries).await?;
        Ok(removed)
    }

    /// Store a freshly generated site; the combined document also becomes the
    /// content the editor opens next
    pub async fn store_generated(
        &self,
        html: &str,
        css: &str,
        js: &str,
        document: &str,
    ) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(HandoffKey::GeneratedHtml, html.to_string());
        entries.insert(HandoffKey::GeneratedCss, css.to_string());
        entries.insert(HandoffKey::GeneratedJs, js.to_string());
        entries.insert(HandoffKey::EditedContent, document.to_string());
        self.persist(&entries).await
    }

    /// The document the editor should open
    pub async fn editor_document(&self) -> Result<String> {
        self.get(HandoffKey::EditedContent)
            .await
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                WebcraftError::validation("No content found. Please generate a website first.")
            })
    }

    async fn persist(&self, entries: &HashMap<HandoffKey, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            warn!("Failed to write handoff file {}: {}", path.display(), e);
            WebcraftError::persistence(format!("Failed to save {}: {}", path.display(), e))
        })
    }
}
