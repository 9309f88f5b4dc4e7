//! Export shim: prepares finished documents for standalone use and writes them

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ExportConfig;
use crate::dom::Document;
use crate::error::{Result, WebcraftError};

/// Attribute identifying the injected startup script
pub const SHIM_ATTRIBUTE: &str = "data-webcraft-shim";

/// Startup script re-assigning inline `onclick` attributes to themselves.
///
/// Setting the attribute makes the browser compile the original handler text
/// again. Nothing is evaluated from strings here.
pub const HANDLER_SHIM: &str = r#"
document.addEventListener('DOMContentLoaded', function () {
  document.querySelectorAll('[onclick]').forEach(function (el) {
    if (typeof el.onclick !== 'function') {
      el.setAttribute('onclick', el.getAttribute('onclick'));
    }
  });
});
"#;

/// Insert the handler shim into `head` unless it is already present.
/// Returns whether the document changed.
pub fn inject_handler_shim(doc: &mut Document) -> bool {
    let present = doc
        .elements_by_tag("script")
        .into_iter()
        .any(|script| doc.has_attribute(script, SHIM_ATTRIBUTE));
    if present {
        return false;
    }

    let script = doc.create_element("script");
    doc.set_attribute(script, SHIM_ATTRIBUTE, None);
    let body = doc.create_raw_text(HANDLER_SHIM);
    doc.append_child(script, body);

    match doc.head() {
        Some(head) => doc.append_child(head, script),
        None => match doc.first_element_by_tag("html") {
            Some(html) => doc.prepend_child(html, script),
            None => {
                let root = doc.root();
                doc.prepend_child(root, script)
            }
        },
    }
}

/// Prepares and writes exported documents
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Final markup for a captured document
    pub fn prepare(&self, document: &str) -> String {
        if !self.config.inject_handler_shim {
            return document.to_string();
        }
        let mut doc = Document::parse(document);
        inject_handler_shim(&mut doc);
        doc.serialize()
    }

    /// Where the download lands inside `dir`
    pub fn download_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.file_name)
    }

    /// Prepare `document` and write it to `path` atomically
    pub async fn export(&self, document: &str, path: &Path) -> Result<PathBuf> {
        let prepared = self.prepare(document);
        write_atomic(path, prepared.as_bytes()).await?;
        info!("Exported {} bytes to {}", prepared.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Write through a temporary sibling and rename it into place; on failure
/// the temporary file is removed and nothing is left at `path`
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            WebcraftError::persistence(format!("Not a file path: {}", path.display()))
        })?;
    let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    let result = async {
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", temp.display(), cleanup);
            }
        }
        return Err(WebcraftError::persistence(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        )));
    }

    Ok(())
}
