//! # Image preprocessing
//!
//! Converts an image file (or an in-memory buffer) into the tensor layout the
//! classifiers consume:
//!
//! - resized, not cropped, to the target size with nearest-neighbour sampling;
//! - converted to one channel ([`ChannelMode::Grayscale`]) or three
//!   ([`ChannelMode::Color`]);
//! - intensities scaled linearly from `0..=255` to `0.0..=1.0`;
//! - laid out channels-first with a leading batch dimension: `[1, C, H, W]`.
//!
//! Decode failures are returned as [`ClassifierError::Decode`] and never
//! recovered here; the predictors decide what to do with them.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Input resolution (width, height) both classifiers were trained on.
pub const DEFAULT_TARGET_SIZE: (u32, u32) = (224, 224);

/// Colour handling applied before the image is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Grayscale,
    Color,
}

impl ChannelMode {
    pub fn channels(self) -> usize {
        match self {
            ChannelMode::Grayscale => 1,
            ChannelMode::Color => 3,
        }
    }
}

/// A dense `f32` tensor in `[batch, channels, height, width]` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    shape: [usize; 4],
}

impl ImageTensor {
    /// Wrap raw values, checking that they fill `shape` exactly.
    pub fn new(data: Vec<f32>, shape: [usize; 4]) -> Result<Self, ClassifierError> {
        let expected = shape.iter().product();
        if data.len() != expected {
            return Err(ClassifierError::InvalidTensor {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn channels(&self) -> usize {
        self.shape[1]
    }

    pub fn height(&self) -> usize {
        self.shape[2]
    }

    pub fn width(&self) -> usize {
        self.shape[3]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Load the image at `path` and build a model input tensor from it.
pub fn preprocess(
    path: impl AsRef<Path>,
    target_size: (u32, u32),
    mode: ChannelMode,
) -> Result<ImageTensor, ClassifierError> {
    let img = image::open(path.as_ref())?;
    Ok(tensor_from_image(&img, target_size, mode))
}

/// Same as [`preprocess`] for an encoded image already held in memory.
pub fn preprocess_bytes(
    bytes: &[u8],
    target_size: (u32, u32),
    mode: ChannelMode,
) -> Result<ImageTensor, ClassifierError> {
    let img = image::load_from_memory(bytes)?;
    Ok(tensor_from_image(&img, target_size, mode))
}

fn tensor_from_image(img: &DynamicImage, (width, height): (u32, u32), mode: ChannelMode) -> ImageTensor {
    let plane = width as usize * height as usize;

    let data = match mode {
        ChannelMode::Grayscale => {
            let gray = imageops::resize(&img.to_luma8(), width, height, FilterType::Nearest);
            gray.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect()
        }
        ChannelMode::Color => {
            let rgb = imageops::resize(&img.to_rgb8(), width, height, FilterType::Nearest);
            let mut data = vec![0.0f32; 3 * plane];
            for (i, pixel) in rgb.pixels().enumerate() {
                for (channel, value) in pixel.0.iter().enumerate() {
                    data[channel * plane + i] = f32::from(*value) / 255.0;
                }
            }
            data
        }
    };

    ImageTensor {
        data,
        shape: [1, mode.channels(), height as usize, width as usize],
    }
}
