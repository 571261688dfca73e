use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use tracing::info;

use devflow_core::error::{DevflowError, Result};
use devflow_core::traits::ArtifactStore;

/// Filesystem artifact store.
///
/// Each artifact is written whole to a `.tmp` sibling and renamed into
/// place, so a crash mid-write never leaves a half-written file where
/// a later read can see it.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if name.trim().is_empty() || escapes {
            return Err(DevflowError::InvalidInput(format!(
                "artifact name '{}' escapes the artifact directory",
                name
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, name: &str, content: &str) -> BoxFuture<'_, Result<()>> {
        let name = name.to_string();
        let content = content.to_string();

        Box::pin(async move {
            let path = self.resolve(&name)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "artifact".to_string());
            let tmp = path.with_file_name(format!("{}.tmp", file_name));
            tokio::fs::write(&tmp, content.as_bytes()).await?;
            tokio::fs::rename(&tmp, &path).await?;

            info!(artifact = %name, path = %path.display(), "Saved artifact");
            Ok(())
        })
    }
}
