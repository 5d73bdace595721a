//! Prediction pipelines: preprocess → infer → interpret.
//!
//! Both functions are blocking and CPU-bound; async callers should run them on
//! a blocking thread.

use std::path::Path;

use crate::error::ClassifierError;
use crate::interpret::{interpret_brain, interpret_pneumonia, Prediction};
use crate::labels::LabelPair;
use crate::model::Classifier;
use crate::preprocess::{preprocess, ChannelMode};

/// Classify a brain MRI. An absent model yields [`Prediction::unavailable`]
/// without touching `path`.
pub fn predict_brain_tumor(
    path: &Path,
    model: Option<&dyn Classifier>,
    labels: &LabelPair,
) -> Result<Prediction, ClassifierError> {
    let Some(model) = model else {
        return Ok(Prediction::unavailable());
    };

    let preds = run(path, model, ChannelMode::Color)?;
    interpret_brain(&preds, labels)
}

/// Classify a chest X-ray.
///
/// Grayscale is tried first; if preprocessing or inference fails the image is
/// retried once in color and that second error, if any, is returned.
pub fn predict_pneumonia(
    path: &Path,
    model: Option<&dyn Classifier>,
    labels: &LabelPair,
) -> Result<Prediction, ClassifierError> {
    let Some(model) = model else {
        return Ok(Prediction::unavailable());
    };

    let preds = match run(path, model, ChannelMode::Grayscale) {
        Ok(preds) => preds,
        Err(e) => {
            tracing::debug!("grayscale pass failed, retrying in color: {}", e);
            run(path, model, ChannelMode::Color)?
        }
    };
    interpret_pneumonia(&preds, labels)
}

fn run(path: &Path, model: &dyn Classifier, mode: ChannelMode) -> Result<Vec<f32>, ClassifierError> {
    let input = preprocess(path, model.input_size(), mode)?;
    model.predict(&input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::ImageTensor;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records the channel count of every call and answers from a script.
    struct Scripted {
        calls: Mutex<Vec<usize>>,
        reject_channels: Option<usize>,
        output: Vec<f32>,
    }

    impl Scripted {
        fn new(output: Vec<f32>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reject_channels: None,
                output,
            }
        }

        fn rejecting(channels: usize, output: Vec<f32>) -> Self {
            Self {
                reject_channels: Some(channels),
                ..Self::new(output)
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Classifier for Scripted {
        fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
            self.calls.lock().unwrap().push(input.channels());
            if self.reject_channels == Some(input.channels()) {
                return Err(ClassifierError::Inference(format!(
                    "cannot run on {} channel(s)",
                    input.channels()
                )));
            }
            Ok(self.output.clone())
        }
    }

    #[derive(Default)]
    struct AlwaysFails {
        calls: AtomicUsize,
    }

    impl Classifier for AlwaysFails {
        fn predict(&self, _input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClassifierError::Inference("boom".to_string()))
        }
    }

    fn scan(dir: &Path) -> PathBuf {
        let path = dir.join("scan.png");
        RgbImage::from_pixel(64, 64, Rgb([90, 90, 90])).save(&path).unwrap();
        path
    }

    #[test]
    fn absent_model_is_unavailable_even_for_missing_file() {
        let missing = Path::new("/definitely/not/here.png");

        let brain = predict_brain_tumor(missing, None, &LabelPair::brain_tumor()).unwrap();
        let pneumonia = predict_pneumonia(missing, None, &LabelPair::pneumonia()).unwrap();

        assert_eq!(brain, Prediction::unavailable());
        assert_eq!(pneumonia, Prediction::unavailable());
    }

    #[test]
    fn brain_runs_in_color() {
        let dir = tempfile::tempdir().unwrap();
        let model = Scripted::new(vec![0.2, 0.8]);

        let result =
            predict_brain_tumor(&scan(dir.path()), Some(&model), &LabelPair::brain_tumor()).unwrap();

        assert_eq!(model.calls(), vec![3]);
        assert_eq!(result, Prediction::new("Tumor Detected", 0.8));
    }

    #[test]
    fn pneumonia_prefers_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let model = Scripted::new(vec![0.3, 0.7]);

        let result =
            predict_pneumonia(&scan(dir.path()), Some(&model), &LabelPair::pneumonia()).unwrap();

        assert_eq!(model.calls(), vec![1]);
        assert_eq!(result.label, "Pneumonia Detected");
        assert_eq!(result.score, 0.7);
    }

    #[test]
    fn pneumonia_retries_once_in_color() {
        let dir = tempfile::tempdir().unwrap();
        let model = Scripted::rejecting(1, vec![0.1]);

        let result =
            predict_pneumonia(&scan(dir.path()), Some(&model), &LabelPair::pneumonia()).unwrap();

        assert_eq!(model.calls(), vec![1, 3]);
        assert_eq!(result.label, "Normal");
        assert_eq!(result.score, 0.9);
    }

    #[test]
    fn pneumonia_failure_in_both_modes_propagates() {
        let dir = tempfile::tempdir().unwrap();

        let model = AlwaysFails::default();

        let err = predict_pneumonia(&scan(dir.path()), Some(&model), &LabelPair::pneumonia())
            .unwrap_err();

        assert!(matches!(err, ClassifierError::Inference(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn undecodable_image_propagates_after_single_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xff\xd8 truncated").unwrap();
        let model = Scripted::new(vec![0.9]);

        let brain = predict_brain_tumor(&path, Some(&model), &LabelPair::brain_tumor());
        let pneumonia = predict_pneumonia(&path, Some(&model), &LabelPair::pneumonia());

        assert!(matches!(brain, Err(ClassifierError::Decode(_))));
        assert!(matches!(pneumonia, Err(ClassifierError::Decode(_))));
        assert!(model.calls().is_empty());
    }

    /// Expects 48x48 inputs and records the shapes it is given.
    #[derive(Default)]
    struct SmallInput {
        shapes: Mutex<Vec<[usize; 4]>>,
    }

    impl Classifier for SmallInput {
        fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
            self.shapes.lock().unwrap().push(input.shape());
            Ok(vec![0.4])
        }

        fn input_size(&self) -> (u32, u32) {
            (48, 48)
        }
    }

    #[test]
    fn images_are_resized_to_the_model_input_size() {
        let dir = tempfile::tempdir().unwrap();
        let model = SmallInput::default();

        predict_brain_tumor(&scan(dir.path()), Some(&model), &LabelPair::brain_tumor()).unwrap();
        predict_pneumonia(&scan(dir.path()), Some(&model), &LabelPair::pneumonia()).unwrap();

        assert_eq!(
            *model.shapes.lock().unwrap(),
            vec![[1, 3, 48, 48], [1, 1, 48, 48]]
        );
    }
}
