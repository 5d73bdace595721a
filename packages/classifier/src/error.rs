//! Error type shared by every stage of the inference pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The file could not be read or is not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("tensor data has {actual} values but shape {shape:?} needs {expected}")]
    InvalidTensor {
        shape: [usize; 4],
        expected: usize,
        actual: usize,
    },

    /// The tensor does not have the channel count the model was built for.
    #[error("model expects {expected} input channel(s), got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("classifier returned an empty output vector")]
    EmptyOutput,

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("failed to load model {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}
