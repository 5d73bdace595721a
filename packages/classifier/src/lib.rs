//! # Classifier crate - medical image inference for MediScan
//!
//! Everything between "an image file on disk" and "a labelled, scored result"
//! lives here. The crate has no knowledge of HTTP, sessions or the database; the
//! `api` crate drives it from its upload routes.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`preprocess`] | - | Decode, resize and normalise an image into an [`ImageTensor`] |
//! | [`interpret`] | - | Turn a raw output vector into a [`Prediction`] |
//! | [`labels`] | - | Configurable label pairs and class-index conventions |
//! | [`model`] | - | The [`Classifier`] trait and the model sidecar [`ModelMetadata`] |
//! | [`network`] | `burn` | The convolutional network and its burn-backed [`Classifier`] |
//! | [`loader`] | - | Startup loading of the brain tumour and pneumonia handles |
//! | [`predict`] | - | `predict_brain_tumor` / `predict_pneumonia` pipelines |
//!
//! A missing model is never an error: the loader leaves the slot empty and the
//! predictors answer with [`Prediction::unavailable`].

pub mod error;
pub mod interpret;
pub mod labels;
pub mod loader;
pub mod model;
#[cfg(feature = "burn")]
pub mod network;
pub mod predict;
pub mod preprocess;

pub use error::ClassifierError;
pub use interpret::{Prediction, MODEL_UNAVAILABLE};
pub use labels::{LabelConfig, LabelPair};
pub use loader::{load_models, LoadedModels, ModelSettings};
pub use model::{Classifier, ClassifierHandle, ModelMetadata};
pub use predict::{predict_brain_tumor, predict_pneumonia};
pub use preprocess::{preprocess, preprocess_bytes, ChannelMode, ImageTensor, DEFAULT_TARGET_SIZE};
