//! # Segmenter
//!
//! End-to-end word segmentation with a loaded model: split the text into
//! clusters, map them to ids, run the network and turn the best BIES tag of
//! every cluster into word boundaries.
//!
//! ```rust,no_run
//! use lstmseg_core::{ModelDescriptor, Segmenter, SegmenterConfig};
//!
//! let model = ModelDescriptor::from_json_path("Thai_graphclust_model4_heavy.json").unwrap();
//! let segmenter = Segmenter::new(model, SegmenterConfig::default());
//! let words = segmenter.segment("สวัสดีครับ").unwrap();
//! println!("{}", words.join("|"));
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::bies::{self, Bies};
use crate::error::Result;
use crate::inference::{InferenceConfig, InferenceEngine};
use crate::model::{ModelDescriptor, ModelType};

/// Configuration for [`Segmenter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub inference: InferenceConfig,
}

impl SegmenterConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }
}

/// Word segmenter backed by a bi-directional LSTM model.
#[derive(Debug, Clone)]
pub struct Segmenter {
    model: ModelDescriptor,
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(model: ModelDescriptor, config: SegmenterConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// Byte offsets of the cluster boundaries of `text`, including `0` and
    /// `text.len()`.
    ///
    /// Codepoints models split on `char`s, graphclust models on extended
    /// grapheme clusters.
    pub fn cluster_breakpoints(&self, text: &str) -> Vec<usize> {
        let mut breakpoints = vec![0];
        match self.model.model_type() {
            ModelType::Codepoints => {
                breakpoints.extend(text.char_indices().skip(1).map(|(i, _)| i));
            }
            ModelType::Graphclust => {
                breakpoints.extend(text.grapheme_indices(true).skip(1).map(|(i, _)| i));
            }
        }
        if !text.is_empty() {
            breakpoints.push(text.len());
        }
        breakpoints
    }

    /// Predicted tag of every cluster of `text`.
    pub fn tags(&self, text: &str) -> Result<(Vec<usize>, Vec<Bies>)> {
        let breakpoints = self.cluster_breakpoints(text);
        if text.is_empty() {
            return Ok((breakpoints, Vec::new()));
        }

        let ids = self
            .model
            .dictionary()
            .encode(breakpoints.windows(2).map(|w| &text[w[0]..w[1]]));
        let scores = InferenceEngine::new(&self.model)
            .with_config(self.config.inference)
            .predict(&ids)?;
        let tags = scores.iter().map(bies::best_tag).collect();
        Ok((breakpoints, tags))
    }

    /// Predicted tags of `text` spelled as a `bies` string.
    pub fn bies(&self, text: &str) -> Result<String> {
        let (_, tags) = self.tags(text)?;
        Ok(tags.iter().map(Bies::symbol).collect())
    }

    /// Byte offsets of the predicted word boundaries.
    pub fn word_breakpoints(&self, text: &str) -> Result<Vec<usize>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let (breakpoints, tags) = self.tags(text)?;
        bies::word_breakpoints(&breakpoints, &tags)
    }

    /// Split `text` into words.
    pub fn segment<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let breakpoints = self.word_breakpoints(text)?;
        Ok(breakpoints.windows(2).map(|w| &text[w[0]..w[1]]).collect())
    }

    /// `text` with `|` at every predicted word boundary, e.g. `|ab|cd|`.
    pub fn segment_to_string(&self, text: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        Ok(bies::segmented_string(text, &self.word_breakpoints(text)?))
    }
}
