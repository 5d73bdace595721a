//! # Classifier handles and model metadata
//!
//! [`Classifier`] is the seam between the prediction pipelines and whatever
//! runs the network. The production implementation is the burn-backed
//! `network::BurnClassifier`; tests substitute their own.
//!
//! A model file is accompanied by a JSON sidecar with the same stem
//! (`brain_tumor_model.bin` → `brain_tumor_model.json`) describing how the
//! network was built:
//!
//! ```json
//! { "input_channels": 3, "num_classes": 1, "image_size": 224 }
//! ```
//!
//! `image_size` is the square side images are resized to before inference.
//! A missing sidecar means [`ModelMetadata::default`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::preprocess::{ImageTensor, DEFAULT_TARGET_SIZE};

/// A loaded binary image classifier.
///
/// `predict` receives a `[1, C, H, W]` tensor and returns the output vector of
/// the single batch entry (one sigmoid value, or one probability per class).
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;

    /// `(width, height)` images are resized to before `predict`.
    fn input_size(&self) -> (u32, u32) {
        DEFAULT_TARGET_SIZE
    }
}

/// Shared, read-only handle to a loaded classifier.
pub type ClassifierHandle = Arc<dyn Classifier>;

/// Shape information stored next to a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default = "default_input_channels")]
    pub input_channels: usize,
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

fn default_input_channels() -> usize {
    3
}

fn default_num_classes() -> usize {
    1
}

fn default_image_size() -> u32 {
    224
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            input_channels: default_input_channels(),
            num_classes: default_num_classes(),
            image_size: default_image_size(),
        }
    }
}

impl ModelMetadata {
    /// Location of the sidecar for a model file.
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        model_path.with_extension("json")
    }

    /// Read the sidecar next to `model_path`, if there is one.
    pub fn load_sidecar(model_path: &Path) -> Result<Option<Self>, ClassifierError> {
        let path = Self::sidecar_path(model_path);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|e| ClassifierError::Load {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let metadata = serde_json::from_str(&json).map_err(|e| ClassifierError::Load {
            path,
            reason: format!("invalid metadata: {e}"),
        })?;
        Ok(Some(metadata))
    }

    /// Write the sidecar next to `model_path`.
    pub fn save_sidecar(&self, model_path: &Path) -> Result<(), ClassifierError> {
        let path = Self::sidecar_path(model_path);
        let json = serde_json::to_string_pretty(self).map_err(|e| ClassifierError::Load {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| ClassifierError::Load {
            path,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sidecar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("brain_tumor_model.bin");
        assert_eq!(ModelMetadata::load_sidecar(&model).unwrap(), None);
    }

    #[test]
    fn sidecar_round_trips_next_to_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("pneumonia_model.bin");
        let metadata = ModelMetadata {
            input_channels: 1,
            num_classes: 2,
            image_size: 224,
        };

        metadata.save_sidecar(&model).unwrap();

        assert!(dir.path().join("pneumonia_model.json").exists());
        assert_eq!(ModelMetadata::load_sidecar(&model).unwrap(), Some(metadata));
    }

    #[test]
    fn partial_sidecar_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("brain.bin");
        fs::write(dir.path().join("brain.json"), r#"{"num_classes": 2}"#).unwrap();

        let metadata = ModelMetadata::load_sidecar(&model).unwrap().unwrap();
        assert_eq!(metadata.input_channels, 3);
        assert_eq!(metadata.num_classes, 2);
        assert_eq!(metadata.image_size, 224);
    }

    #[test]
    fn malformed_sidecar_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("brain.bin");
        fs::write(dir.path().join("brain.json"), "{ not json").unwrap();

        assert!(matches!(
            ModelMetadata::load_sidecar(&model),
            Err(ClassifierError::Load { .. })
        ));
    }
}
