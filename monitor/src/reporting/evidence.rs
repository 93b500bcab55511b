use anyhow::Context;
use std::path::{Path, PathBuf};

/// Directory where evidence frames are kept once a report fires.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Copies `source` to `infraction_<millis>.<ext>` and returns the new path.
    pub async fn archive(&self, source: &Path, timestamp: f64) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating evidence dir {}", self.dir.display()))?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        let millis = (timestamp * 1000.0).round().max(0.0) as u64;
        let target = self
            .dir
            .join(format!("infraction_{:010}.{}", millis, extension));

        tokio::fs::copy(source, &target)
            .await
            .with_context(|| format!("copying evidence {}", source.display()))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn archive_copies_frame_with_timestamp_name() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("frame.jpg");
        std::fs::write(&source, b"\xFF\xD8jpeg").unwrap();

        let store = EvidenceStore::new(temp.path().join("evidence"));
        let archived = store.archive(&source, 12.5).await.unwrap();

        assert_eq!(
            archived.file_name().unwrap().to_str().unwrap(),
            "infraction_0000012500.jpg"
        );
        assert_eq!(std::fs::read(&archived).unwrap(), b"\xFF\xD8jpeg");
    }

    #[tokio::test]
    async fn archive_reports_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(temp.path());
        let err = store
            .archive(&temp.path().join("missing.jpg"), 1.0)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("copying evidence"));
    }
}
