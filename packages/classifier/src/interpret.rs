//! # Output interpretation
//!
//! Classifiers emit one of three output shapes, all handled here:
//!
//! | Length | Meaning | Rule |
//! |--------|---------|------|
//! | 1 | sigmoid probability `p` of the positive class | positive iff `p > 0.5`; score is `p` or `1 - p` |
//! | 2 | per-class probabilities | see [`interpret_brain`] / [`interpret_pneumonia`] |
//! | > 2 | unknown mapping | `Class_<argmax>` with the arg-max probability |
//!
//! The score is always the confidence in the label that was chosen, rounded to
//! four decimal places.

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::labels::LabelPair;

/// Label reported when the requested classifier is not loaded.
pub const MODEL_UNAVAILABLE: &str = "Model not available";

/// A labelled classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score: round_score(score),
        }
    }

    /// The fallback result for an absent model handle.
    pub fn unavailable() -> Self {
        Self {
            label: MODEL_UNAVAILABLE.to_string(),
            score: 0.0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.label != MODEL_UNAVAILABLE
    }
}

/// Round to four decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Single sigmoid output. `p == 0.5` falls on the negative side.
pub fn interpret_sigmoid(p: f64, labels: &LabelPair) -> Prediction {
    let positive = p > 0.5;
    let score = if positive { p } else { 1.0 - p };
    Prediction::new(labels.select(positive), score)
}

/// Brain tumour outputs. With two classes the positive label wins ties.
pub fn interpret_brain(preds: &[f32], labels: &LabelPair) -> Result<Prediction, ClassifierError> {
    match preds {
        [] => Err(ClassifierError::EmptyOutput),
        [p] => Ok(interpret_sigmoid(f64::from(*p), labels)),
        [_, _] => {
            let positive_index = labels.positive_class();
            let p_yes = f64::from(preds[positive_index]);
            let p_no = f64::from(preds[1 - positive_index]);
            Ok(if p_yes >= p_no {
                Prediction::new(labels.positive.as_str(), p_yes)
            } else {
                Prediction::new(labels.negative.as_str(), p_no)
            })
        }
        _ => Ok(unknown_class(preds)),
    }
}

/// Pneumonia outputs. With two classes the arg-max decides; the first
/// maximum wins ties.
pub fn interpret_pneumonia(preds: &[f32], labels: &LabelPair) -> Result<Prediction, ClassifierError> {
    match preds {
        [] => Err(ClassifierError::EmptyOutput),
        [p] => Ok(interpret_sigmoid(f64::from(*p), labels)),
        [_, _] => {
            let (index, score) = argmax(preds);
            Ok(Prediction::new(labels.select(index == labels.positive_class()), score))
        }
        _ => Ok(unknown_class(preds)),
    }
}

fn unknown_class(preds: &[f32]) -> Prediction {
    let (index, score) = argmax(preds);
    tracing::warn!(
        classes = preds.len(),
        index,
        "classifier returned more than two classes; no label mapping available"
    );
    Prediction::new(format!("Class_{index}"), score)
}

fn argmax(preds: &[f32]) -> (usize, f64) {
    let mut best = 0;
    for (i, value) in preds.iter().enumerate().skip(1) {
        if *value > preds[best] {
            best = i;
        }
    }
    (best, f64::from(preds[best]))
}
