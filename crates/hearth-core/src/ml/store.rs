//! Model artifact persistence
//!
//! Artifacts and metadata live per household under a root directory as
//! JSON files. Writes go through a temp file in the same directory and a
//! rename, so a reader never observes a half-written model and the
//! previous artifact stays usable until the swap.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ModelArtifact, ModelMetadata};
use crate::error::Result;

const MODEL_FILE: &str = "model.json";
const META_FILE: &str = "metadata.json";

/// Storage backend for trained models
pub trait ModelStore {
    fn save(&self, household_id: i64, artifact: &ModelArtifact, meta: &ModelMetadata)
        -> Result<()>;
    fn load(&self, household_id: i64) -> Result<Option<ModelArtifact>>;
    fn load_metadata(&self, household_id: i64) -> Result<Option<ModelMetadata>>;
}

/// Filesystem-backed model store
pub struct FsModelStore {
    root: PathBuf,
}

impl FsModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn household_dir(&self, household_id: i64) -> PathBuf {
        self.root.join(household_id.to_string())
    }

    fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(dir.join(filename))
            .map_err(|e| crate::error::Error::Io(e.error))?;
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ModelStore for FsModelStore {
    fn save(
        &self,
        household_id: i64,
        artifact: &ModelArtifact,
        meta: &ModelMetadata,
    ) -> Result<()> {
        let dir = self.household_dir(household_id);
        Self::write_atomic(&dir, MODEL_FILE, &serde_json::to_vec(artifact)?)?;
        Self::write_atomic(&dir, META_FILE, &serde_json::to_vec_pretty(meta)?)?;
        debug!(household_id, dir = %dir.display(), "model artifact saved");
        Ok(())
    }

    fn load(&self, household_id: i64) -> Result<Option<ModelArtifact>> {
        Self::read_json(&self.household_dir(household_id).join(MODEL_FILE))
    }

    fn load_metadata(&self, household_id: i64) -> Result<Option<ModelMetadata>> {
        Self::read_json(&self.household_dir(household_id).join(META_FILE))
    }
}
