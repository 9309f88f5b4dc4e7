//! Image replacement: upload validation and the engine operations

use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};
use webcraft_core::{
    upload_path, EditorConfig, ObjectStore, Result as CoreResult, StorageConfig, WebcraftError,
};

use crate::live_editor::LiveEditor;
use crate::realm::ElementRef;
use crate::selection::{ImageTarget, SelectionMode};
use crate::EditorError;

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new<N: Into<String>, M: Into<String>>(name: N, mime_type: M, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Where a replacement image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(ImageFile),
    /// Used as given; reachability is not checked
    Url(String),
}

/// Check type and size before anything is uploaded
pub fn validate_image_file(
    file: &ImageFile,
    accepted_mime_prefix: &str,
    max_bytes: u64,
) -> Result<(), EditorError> {
    if !file.mime_type.starts_with(accepted_mime_prefix) {
        return Err(EditorError::Validation(
            "Please upload an image file".to_string(),
        ));
    }
    if file.bytes.len() as u64 > max_bytes {
        let limit_mb = max_bytes / (1024 * 1024);
        return Err(EditorError::Validation(format!(
            "Image must be smaller than {}MB",
            limit_mb
        )));
    }
    Ok(())
}

/// Turns an [`ImageSource`] into a URL, uploading files to object storage
#[derive(Clone)]
pub struct ImageUploader {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    accepted_mime_prefix: String,
    max_bytes: u64,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn ObjectStore>, storage: &StorageConfig, editor: &EditorConfig) -> Self {
        Self {
            store,
            prefix: storage.upload_prefix.clone(),
            accepted_mime_prefix: editor.accepted_mime_prefix.clone(),
            max_bytes: editor.max_upload_bytes,
        }
    }

    pub fn validate(&self, file: &ImageFile) -> Result<(), EditorError> {
        validate_image_file(file, &self.accepted_mime_prefix, self.max_bytes)
    }

    pub async fn upload(&self, file: &ImageFile) -> CoreResult<String> {
        self.validate(file)?;
        let path = upload_path(&self.prefix, &file.name, SystemTime::now());
        let url = self.store.upload(&path, &file.bytes, &file.mime_type).await?;
        info!("Uploaded image {} ({} bytes)", path, file.bytes.len());
        Ok(url)
    }

    pub async fn resolve(&self, source: ImageSource) -> CoreResult<String> {
        match source {
            ImageSource::File(file) => self.upload(&file).await,
            ImageSource::Url(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(WebcraftError::validation("Please enter an image URL"));
                }
                Ok(url.to_string())
            }
        }
    }
}

impl LiveEditor {
    /// Open the image replacement modal for the selection. A non-image is
    /// only accepted when the caller confirmed converting it.
    pub fn begin_image_replacement(&mut self, convert: bool) -> Result<ImageTarget, EditorError> {
        let element = self.selection.element().ok_or(EditorError::NoSelection)?;
        let node = self.realm.resolve(element)?;
        let is_image = self.realm.try_read()?.is_element(node, "img");

        let target = match (is_image, convert) {
            (true, _) => ImageTarget::Existing,
            (false, true) => ImageTarget::Convert,
            (false, false) => {
                return Err(EditorError::InvalidTarget(
                    "This element is not an image. Confirm converting it to replace it with an image."
                        .to_string(),
                ))
            }
        };
        self.selection
            .open_modal(element, SelectionMode::AwaitingImageReplacement, Some(target));
        debug!("Image replacement opened for {} ({:?})", node, target);
        Ok(target)
    }

    /// Complete the pending replacement with `url`
    pub fn apply_image_source(&mut self, url: &str) -> Result<ElementRef, EditorError> {
        if self.selection.mode() != SelectionMode::AwaitingImageReplacement {
            return Err(EditorError::InvalidTarget(
                "No image replacement is pending".to_string(),
            ));
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(EditorError::Validation(
                "Please enter an image URL".to_string(),
            ));
        }
        let element = self.selection.element().ok_or(EditorError::NoSelection)?;
        let node = match self.realm.resolve(element) {
            Ok(node) => node,
            Err(e) => {
                self.selection.cancel_modal();
                return Err(e);
            }
        };

        match self.selection.image_target() {
            Some(ImageTarget::Convert) => {
                self.clear_visuals(self.selection.modal_origin());
                self.clear_visuals(Some(element));
                let use_marker = !self.report.used_fallback(crate::passes::PassKind::Image);
                let marker = self.config.image_marker.clone();

                let doc = self.realm.try_write()?;
                let image = doc.create_element("img");
                doc.set_attribute(image, "src", Some(url));
                doc.set_attribute(image, "style", Some("max-width: 100%"));
                if use_marker {
                    doc.set_attribute(image, &marker.attribute, Some(&marker.value));
                }
                if !doc.replace(node, image) {
                    self.selection.cancel_modal();
                    return Err(EditorError::InvalidTarget(
                        "The element has no parent to replace it in".to_string(),
                    ));
                }

                self.selection.clear();
                self.reinstrument()?;
                info!("Converted {} into an image", node);
                self.select(image, SelectionMode::Selected)
            }
            _ => {
                self.realm
                    .try_write()?
                    .set_attribute(node, "src", Some(url));
                info!("Replaced image source of {}", node);
                self.commit_modal(node)
            }
        }
    }

    /// Resolve `source` (uploading files) and complete the pending replacement
    pub async fn replace_image(
        &mut self,
        uploader: &ImageUploader,
        source: ImageSource,
    ) -> CoreResult<ElementRef> {
        if self.selection.mode() != SelectionMode::AwaitingImageReplacement {
            return Err(EditorError::InvalidTarget("No image replacement is pending".to_string()).into());
        }
        let url = uploader.resolve(source).await?;
        Ok(self.apply_image_source(&url)?)
    }
}
