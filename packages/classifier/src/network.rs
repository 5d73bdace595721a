//! Convolutional network used by both scan classifiers, plus the burn-backed
//! [`Classifier`] that runs it on the CPU.
//!
//! # Architecture
//! - {Conv 3x3 (stride 2, padding 1) + ReLU} x 3, doubling the filters each time
//! - global average pooling to `[batch, 4 * base_filters]`
//! - linear head to `num_classes`
//! - sigmoid when `num_classes == 1`, softmax otherwise
//!
//! Global pooling keeps the head independent of the input resolution.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use burn::{
    backend::NdArray,
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{activation, backend::Backend, Tensor, TensorData},
};

use crate::error::ClassifierError;
use crate::model::{Classifier, ModelMetadata};
use crate::preprocess::ImageTensor;

/// Backend used for serving.
pub type InferenceBackend = NdArray;

type InferenceDevice = <InferenceBackend as Backend>::Device;

/// Network configuration.
#[derive(Config, Debug)]
pub struct ScanNetConfig {
    /// 1 for grayscale inputs, 3 for RGB.
    pub input_channels: usize,
    pub num_classes: usize,
    #[config(default = 16)]
    pub base_filters: usize,
}

impl ScanNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ScanNet<B> {
        let f = self.base_filters;
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };

        ScanNet {
            conv1: conv([self.input_channels, f]),
            conv2: conv([f, 2 * f]),
            conv3: conv([2 * f, 4 * f]),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: LinearConfig::new(4 * f, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ScanNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: AdaptiveAvgPool2d,
    head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> ScanNet<B> {
    /// `images`: `[batch, channels, height, width]` → logits `[batch, num_classes]`.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.activation.forward(self.conv3.forward(x));

        let x = self.pool.forward(x);
        let [_, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        self.head.forward(x)
    }

    /// Forward pass followed by sigmoid (one class) or softmax (several).
    pub fn probabilities(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(images);
        let [_, classes] = logits.dims();
        if classes == 1 {
            activation::sigmoid(logits)
        } else {
            activation::softmax(logits, 1)
        }
    }
}

/// A [`ScanNet`] with its weights restored from disk.
///
/// Inference goes through a mutex: burn modules are `Send` but not
/// guaranteed `Sync`.
pub struct BurnClassifier {
    model: Mutex<ScanNet<InferenceBackend>>,
    metadata: ModelMetadata,
    device: InferenceDevice,
}

impl BurnClassifier {
    /// Build the network described by the sidecar and load the weights
    /// recorded at `path`.
    ///
    /// The restored network runs once on a blank input before it is
    /// accepted, so weights that disagree with the sidecar fail here rather
    /// than on the first request.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let metadata = ModelMetadata::load_sidecar(path)?.unwrap_or_default();
        let device = InferenceDevice::default();

        let bytes = fs::read(path).map_err(|e| ClassifierError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record = Recorder::<InferenceBackend>::load(&recorder, bytes, &device)
            .map_err(|e| ClassifierError::Load {
                path: path.to_path_buf(),
                reason: format!("{e:?}"),
            })?;

        let load_error = |reason: String| ClassifierError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let config = ScanNetConfig::new(metadata.input_channels, metadata.num_classes);
        let model = panic::catch_unwind(AssertUnwindSafe(|| {
            config.init::<InferenceBackend>(&device).load_record(record)
        }))
        .map_err(|payload| load_error(panic_message(payload.as_ref())))?;

        let size = metadata.image_size as usize;
        let blank = Tensor::<InferenceBackend, 4>::zeros([1, metadata.input_channels, size, size], &device);
        let output = forward(&model, blank)
            .map_err(|reason| load_error(format!("weights do not match metadata: {reason}")))?;
        if output.len() != metadata.num_classes {
            return Err(load_error(format!(
                "weights produce {} output(s), metadata declares {}",
                output.len(),
                metadata.num_classes
            )));
        }

        Ok(Self::from_model(model, metadata, device))
    }

    pub fn from_model(
        model: ScanNet<InferenceBackend>,
        metadata: ModelMetadata,
        device: InferenceDevice,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            metadata,
            device,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl Classifier for BurnClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        if input.channels() != self.metadata.input_channels {
            return Err(ClassifierError::ChannelMismatch {
                expected: self.metadata.input_channels,
                actual: input.channels(),
            });
        }

        let data = TensorData::new(input.as_slice().to_vec(), input.shape());
        let tensor = Tensor::<InferenceBackend, 4>::from_data(data, &self.device);

        // The model is never mutated, so a poisoned lock still guards a
        // usable network.
        let model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        forward(&model, tensor).map_err(ClassifierError::Inference)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.metadata.image_size, self.metadata.image_size)
    }
}

/// Run `model` and flatten its output, turning a panic inside burn (for
/// example a weight shape that does not fit the input) into an error.
fn forward(
    model: &ScanNet<InferenceBackend>,
    input: Tensor<InferenceBackend, 4>,
) -> Result<Vec<f32>, String> {
    let output = panic::catch_unwind(AssertUnwindSafe(|| model.probabilities(input)))
        .map_err(|payload| panic_message(payload.as_ref()))?;

    output.into_data().to_vec::<f32>().map_err(|e| format!("{e:?}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "forward pass panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write the weights of a freshly initialised network, without a sidecar.
    fn record_weights(dir: &Path, name: &str, input_channels: usize, num_classes: usize) -> std::path::PathBuf {
        let device = InferenceDevice::default();
        let model = ScanNetConfig::new(input_channels, num_classes).init::<InferenceBackend>(&device);

        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let bytes = Recorder::<InferenceBackend>::record(&recorder, model.into_record(), ()).unwrap();

        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn record_model(dir: &Path, name: &str, metadata: &ModelMetadata) -> std::path::PathBuf {
        let path = record_weights(dir, name, metadata.input_channels, metadata.num_classes);
        metadata.save_sidecar(&path).unwrap();
        path
    }

    fn filled(value: f32, channels: usize, size: usize) -> ImageTensor {
        ImageTensor::new(vec![value; channels * size * size], [1, channels, size, size]).unwrap()
    }

    #[test]
    fn two_class_network_outputs_a_distribution() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ModelMetadata {
            input_channels: 1,
            num_classes: 2,
            image_size: 224,
        };
        let path = record_model(dir.path(), "pneumonia_model.bin", &metadata);

        let classifier = BurnClassifier::load(&path).unwrap();
        assert_eq!(classifier.metadata(), &metadata);

        let probs = classifier.predict(&filled(0.5, 1, 224)).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn single_class_network_outputs_a_probability() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ModelMetadata::default();
        let path = record_model(dir.path(), "brain_tumor_model.bin", &metadata);

        let classifier = BurnClassifier::load(&path).unwrap();
        let probs = classifier.predict(&filled(0.25, 3, 64)).unwrap();

        assert_eq!(probs.len(), 1);
        assert!((0.0..=1.0).contains(&probs[0]));
    }

    #[test]
    fn wrong_channel_count_is_rejected_before_inference() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ModelMetadata::default();
        let path = record_model(dir.path(), "brain_tumor_model.bin", &metadata);

        let classifier = BurnClassifier::load(&path).unwrap();
        let err = classifier.predict(&filled(0.5, 1, 32)).unwrap_err();

        assert!(matches!(
            err,
            ClassifierError::ChannelMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn garbage_weights_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain_tumor_model.bin");
        fs::write(&path, b"not a burn record").unwrap();

        assert!(matches!(
            BurnClassifier::load(&path),
            Err(ClassifierError::Load { .. })
        ));
    }

    #[test]
    fn weights_with_other_channel_count_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        // Grayscale two-class weights; without a sidecar the defaults say
        // three channels and one class.
        let path = record_weights(dir.path(), "pneumonia_model.bin", 1, 2);

        assert!(matches!(
            BurnClassifier::load(&path),
            Err(ClassifierError::Load { .. })
        ));
    }

    #[test]
    fn weights_with_other_class_count_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_weights(dir.path(), "brain_tumor_model.bin", 3, 2);
        ModelMetadata {
            input_channels: 3,
            num_classes: 1,
            image_size: 32,
        }
        .save_sidecar(&path)
        .unwrap();

        assert!(matches!(
            BurnClassifier::load(&path),
            Err(ClassifierError::Load { .. })
        ));
    }

    #[test]
    fn failed_inference_leaves_the_model_usable() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = ModelMetadata {
            input_channels: 3,
            num_classes: 1,
            image_size: 32,
        };
        let path = record_model(dir.path(), "brain_tumor_model.bin", &metadata);
        let classifier = BurnClassifier::load(&path).unwrap();
        assert_eq!(classifier.input_size(), (32, 32));

        // Poison the lock the way a panicking forward pass would.
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = classifier.model.lock().unwrap();
                    panic!("forward pass blew up");
                })
                .join()
        });
        assert!(classifier.model.is_poisoned());

        let probs = classifier.predict(&filled(0.5, 3, 32)).unwrap();
        assert_eq!(probs.len(), 1);
    }
}
