//! # Label configuration
//!
//! Each classifier is binary, so its output maps onto a [`LabelPair`]: the
//! label reported when the finding is present, the one reported when it is not,
//! and the class index that means "present" for two-class outputs.
//!
//! The defaults reproduce the conventions the bundled models were trained with
//! (`[negative, positive]` ordering for both), but they are plain configuration
//! and can be overridden from the `labels` section of the settings file.

use serde::{de, Deserialize, Deserializer, Serialize};

/// Labels for one binary classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelPair {
    pub positive: String,
    pub negative: String,
    /// Index of the positive class when the model emits two probabilities.
    /// Only 0 and 1 are accepted from configuration.
    #[serde(
        default = "default_positive_index",
        deserialize_with = "deserialize_positive_index"
    )]
    pub positive_index: usize,
}

fn default_positive_index() -> usize {
    1
}

fn deserialize_positive_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let index = usize::deserialize(deserializer)?;
    if index > 1 {
        return Err(de::Error::invalid_value(
            de::Unexpected::Unsigned(index as u64),
            &"0 or 1",
        ));
    }
    Ok(index)
}

impl LabelPair {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
            positive_index: default_positive_index(),
        }
    }

    /// Builder method to change which class index counts as positive.
    /// Anything above 1 is treated as 1 by the interpreters.
    pub fn with_positive_index(mut self, index: usize) -> Self {
        self.positive_index = index;
        self
    }

    /// Positive class index for a two-class output, always 0 or 1.
    pub fn positive_class(&self) -> usize {
        self.positive_index.min(1)
    }

    pub fn brain_tumor() -> Self {
        Self::new("Tumor Detected", "No Tumor")
    }

    pub fn pneumonia() -> Self {
        Self::new("Pneumonia Detected", "Normal")
    }

    /// Pick the label for a yes/no decision.
    pub fn select(&self, positive: bool) -> &str {
        if positive {
            &self.positive
        } else {
            &self.negative
        }
    }
}

/// Label pairs for both classifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "LabelPair::brain_tumor")]
    pub brain: LabelPair,
    #[serde(default = "LabelPair::pneumonia")]
    pub pneumonia: LabelPair,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            brain: LabelPair::brain_tumor(),
            pneumonia: LabelPair::pneumonia(),
        }
    }
}
