//! Sequence-model checkpoints.
//!
//! Provides serializable snapshots of the model weights, enabling:
//! - Disk persistence (atomic save/load)
//! - Loading weights exported from an offline training run
//! - Shape validation before a checkpoint reaches inference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::lstm::{DenseLayer, LstmLayer};
use super::network::SequenceModel;

/// Checkpoint format version written by this crate.
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error ({path}): {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("checkpoint dimension mismatch: {}", .0.join("; "))]
    DimensionMismatch(Vec<String>),

    #[error("unsupported checkpoint version {found} (supported: {supported})", supported = CHECKPOINT_VERSION)]
    UnsupportedVersion { found: u32 },
}

/// Provenance attached to a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub model_name: String,
    pub created_at: DateTime<Utc>,
    /// False for freshly initialised weights
    pub trained: bool,
    /// Validation loss of the training run, when known
    #[serde(default)]
    pub validation_loss: Option<f64>,
}

/// Complete snapshot of the sequence model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCheckpoint {
    /// Format version for forward compatibility.
    pub version: u32,
    pub metadata: CheckpointMetadata,
    pub lstm1: LstmLayer,
    pub lstm2: LstmLayer,
    pub dense: DenseLayer,
    pub output: DenseLayer,
}

impl ModelCheckpoint {
    pub fn from_model(model: &SequenceModel, metadata: CheckpointMetadata) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            metadata,
            lstm1: model.lstm1.clone(),
            lstm2: model.lstm2.clone(),
            dense: model.dense.clone(),
            output: model.output.clone(),
        }
    }

    /// Parse and validate checkpoint JSON.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, CheckpointError> {
        let cp: Self = serde_json::from_slice(data)?;
        cp.validate()?;
        Ok(cp)
    }

    /// Version and tensor-shape checks.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion { found: self.version });
        }
        let model = self.to_model_unchecked();
        let errors = model.shape_errors();
        if !errors.is_empty() {
            return Err(CheckpointError::DimensionMismatch(errors));
        }
        let non_finite = [&self.lstm1.kernel, &self.lstm1.recurrent_kernel, &self.lstm1.bias]
            .into_iter()
            .chain([&self.lstm2.kernel, &self.lstm2.recurrent_kernel, &self.lstm2.bias])
            .chain([&self.dense.kernel, &self.dense.bias, &self.output.kernel, &self.output.bias])
            .flat_map(|v| v.iter())
            .any(|w| !w.is_finite());
        if non_finite {
            return Err(CheckpointError::DimensionMismatch(vec!["weights contain NaN or Inf".to_string()]));
        }
        Ok(())
    }

    /// Validated model.
    pub fn into_model(self) -> Result<SequenceModel, CheckpointError> {
        self.validate()?;
        Ok(self.to_model_unchecked())
    }

    fn to_model_unchecked(&self) -> SequenceModel {
        SequenceModel {
            lstm1: self.lstm1.clone(),
            lstm2: self.lstm2.clone(),
            dense: self.dense.clone(),
            output: self.output.clone(),
        }
    }
}

/// Save a checkpoint to disk atomically (write temp file, then rename).
pub fn save_to_disk(cp: &ModelCheckpoint, path: &Path) -> Result<(), CheckpointError> {
    let io_err = |source| CheckpointError::Io { path: path.to_path_buf(), source };
    let json = serde_json::to_vec(cp)?;

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Load and validate a checkpoint from disk.
pub fn load_from_disk(path: &Path) -> Result<ModelCheckpoint, CheckpointError> {
    let data = std::fs::read(path).map_err(|source| CheckpointError::Io { path: path.to_path_buf(), source })?;
    ModelCheckpoint::from_json_slice(&data)
}

/// Async variant of [`load_from_disk`] for use on the runtime.
pub async fn load_from_disk_async(path: &Path) -> Result<ModelCheckpoint, CheckpointError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| CheckpointError::Io { path: path.to_path_buf(), source })?;
    ModelCheckpoint::from_json_slice(&data)
}
