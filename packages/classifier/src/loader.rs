//! # Model loading
//!
//! Both classifiers are loaded once at process start and handed to the request
//! handlers as [`LoadedModels`]. Loading never fails the process: a missing or
//! unreadable model file is logged and its slot stays `None`, which the
//! predictors turn into a "Model not available" result.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::model::ClassifierHandle;

/// Where the model files live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_brain_file")]
    pub brain_file: String,
    #[serde(default = "default_pneumonia_file")]
    pub pneumonia_file: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_brain_file() -> String {
    "brain_tumor_model.bin".to_string()
}

fn default_pneumonia_file() -> String {
    "pneumonia_model.bin".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            brain_file: default_brain_file(),
            pneumonia_file: default_pneumonia_file(),
        }
    }
}

impl ModelSettings {
    pub fn brain_path(&self) -> PathBuf {
        self.dir.join(&self.brain_file)
    }

    pub fn pneumonia_path(&self) -> PathBuf {
        self.dir.join(&self.pneumonia_file)
    }
}

/// The two classifier slots. `None` means the model is unavailable.
#[derive(Clone, Default)]
pub struct LoadedModels {
    pub brain: Option<ClassifierHandle>,
    pub pneumonia: Option<ClassifierHandle>,
}

impl fmt::Debug for LoadedModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModels")
            .field("brain", &self.brain.is_some())
            .field("pneumonia", &self.pneumonia.is_some())
            .finish()
    }
}

/// Load both classifiers with the default (burn) opener.
pub fn load_models(settings: &ModelSettings) -> LoadedModels {
    load_models_with(settings, open_model)
}

/// Load both classifiers using `open` to deserialize each existing file.
pub fn load_models_with<F>(settings: &ModelSettings, open: F) -> LoadedModels
where
    F: Fn(&Path) -> Result<ClassifierHandle, ClassifierError>,
{
    LoadedModels {
        brain: load_slot("brain", &settings.brain_path(), &open),
        pneumonia: load_slot("pneumonia", &settings.pneumonia_path(), &open),
    }
}

fn load_slot<F>(name: &str, path: &Path, open: &F) -> Option<ClassifierHandle>
where
    F: Fn(&Path) -> Result<ClassifierHandle, ClassifierError>,
{
    if !path.exists() {
        tracing::warn!(model = name, path = %path.display(), "model file not found");
        return None;
    }

    match open(path) {
        Ok(handle) => {
            tracing::info!(model = name, path = %path.display(), "model loaded");
            Some(handle)
        }
        Err(e) => {
            tracing::error!(model = name, path = %path.display(), "failed to load model: {}", e);
            None
        }
    }
}

#[cfg(feature = "burn")]
fn open_model(path: &Path) -> Result<ClassifierHandle, ClassifierError> {
    Ok(std::sync::Arc::new(crate::network::BurnClassifier::load(path)?))
}

#[cfg(not(feature = "burn"))]
fn open_model(path: &Path) -> Result<ClassifierHandle, ClassifierError> {
    Err(ClassifierError::Load {
        path: path.to_path_buf(),
        reason: "built without the `burn` feature".to_string(),
    })
}
