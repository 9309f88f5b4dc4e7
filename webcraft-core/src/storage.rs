//! Object storage seam: an opaque key to public-URL mapping

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, WebcraftError};

/// Binary asset storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path` and return its public URL
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// File names stored directly under `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    async fn delete(&self, paths: &[String]) -> Result<()>;
}

/// Build the storage key for an upload: `<prefix>/<unix-millis>-<name>`,
/// with every character outside `[A-Za-z0-9.]` replaced by `_`
pub fn upload_path(prefix: &str, file_name: &str, at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}-{}", millis, sanitized)
    } else {
        format!("{}/{}-{}", prefix, millis, sanitized)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn check_key(path: &str) -> Result<()> {
    let relative = Path::new(path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, PathComponent::Normal(_)));
    if path.trim().is_empty() || escapes {
        return Err(WebcraftError::validation(format!(
            "Invalid storage path: {:?}",
            path
        )));
    }
    Ok(())
}

fn direct_children<'a, I>(keys: I, prefix: &str) -> Vec<String>
where
    I: Iterator<Item = &'a String>,
{
    let prefix = prefix.trim_matches('/');
    keys.filter_map(|key| {
        let rest = if prefix.is_empty() {
            key.as_str()
        } else {
            key.strip_prefix(prefix)?.strip_prefix('/')?
        };
        (!rest.contains('/')).then(|| rest.to_string())
    })
    .collect()
}

/// Object store kept in memory; counts upload attempts that reached it
#[derive(Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    uploads: Arc<AtomicUsize>,
    base_url: String,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

impl InMemoryObjectStore {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            uploads: Arc::new(AtomicUsize::new(0)),
            base_url: base_url.into(),
        }
    }

    /// Number of upload calls received
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub async fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        check_key(path)?;
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        debug!("Stored {} bytes at {}", bytes.len(), path);
        Ok(join_url(&self.base_url, path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().await;
        Ok(direct_children(objects.keys(), prefix))
    }

    async fn delete(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.write().await;
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}

/// Object store backed by a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, base_url: S) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        check_key(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            WebcraftError::persistence(format!("Failed to store {}: {}", target.display(), e))
        })?;
        info!("Uploaded {} ({} bytes)", path, bytes.len());
        Ok(join_url(&self.base_url, path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_matches('/');
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.resolve(prefix)?
        };

        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            let target = self.resolve(path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
