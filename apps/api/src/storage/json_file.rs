use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{sort_newest_first, CandidateStore, StorageError};
use crate::screening::profile::CandidateProfile;

/// Stores every candidate in one pretty-printed JSON array on local disk.
///
/// Writes go through a temp file and a rename, under a mutex, so concurrent
/// sessions never interleave a read-modify-write.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty list. Unparseable content is an error,
    /// so a save never overwrites records it could not read.
    async fn read_all(&self) -> Result<Vec<CandidateProfile>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_all(&self, profiles: &[CandidateProfile]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(profiles)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for JsonFileStore {
    async fn save(&self, profile: &CandidateProfile) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.read_all().await?;
        match profiles
            .iter_mut()
            .find(|p| p.session_id() == profile.session_id())
        {
            Some(existing) => {
                debug!("Replacing stored candidate {}", profile.session_id());
                *existing = profile.clone();
            }
            None => profiles.push(profile.clone()),
        }
        self.write_all(&profiles).await?;

        info!(
            "Saved candidate {} to {} ({} records)",
            profile.session_id(),
            self.path.display(),
            profiles.len()
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CandidateProfile>, StorageError> {
        let mut profiles = match self.read_all().await {
            Ok(profiles) => profiles,
            Err(StorageError::Json(e)) => {
                warn!(
                    "Candidate file {} is not valid JSON ({e}); listing it as empty",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        sort_newest_first(&mut profiles);
        Ok(profiles)
    }

    fn backend_name(&self) -> &'static str {
        "json_file"
    }
}
