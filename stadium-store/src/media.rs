use async_trait::async_trait;
use stadium_core::field::Upload;
use stadium_core::repository::MediaStore;
use stadium_core::{CoreError, CoreResult};
use std::path::{Component, Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const IMAGE_DIR: &str = "images";

/// Stores uploads on local disk under `<root>/images/`.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> CoreResult<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(CoreError::StorageError(format!(
                "refusing media path outside the media root: {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, upload: &Upload) -> CoreResult<String> {
        let relative = format!(
            "{}/{}_{}",
            IMAGE_DIR,
            Uuid::new_v4().simple(),
            sanitize_file_name(&upload.file_name)
        );
        let target = self.resolve(&relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::StorageError(e.to_string()))?;
        }
        tokio::fs::write(&target, &upload.bytes)
            .await
            .map_err(|e| CoreError::StorageError(e.to_string()))?;
        info!("Stored {} bytes at {}", upload.bytes.len(), target.display());
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> CoreResult<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| CoreError::StorageError(format!("{}: {}", target.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("pitch photo (1).jpg"), "pitch_photo__1_.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());

        let path = store.save(&Upload::new("goal.png", vec![1, 2, 3])).await.unwrap();
        assert!(path.starts_with("images/"));
        assert!(path.ends_with("_goal.png"));
        let on_disk = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(on_disk, vec![1, 2, 3]);

        store.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        assert!(store.remove(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());
        assert!(matches!(
            store.remove("../outside.png").await,
            Err(CoreError::StorageError(_))
        ));
    }
}
