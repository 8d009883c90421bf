//! # Model Descriptor
//!
//! A model name, its cluster type, the topology numbers, the dictionary and
//! the nine weight tensors, checked against each other once at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dictionary::GraphemeDictionary;
use crate::error::{LstmSegError, Result};
use crate::model::dump::WeightDump;
use crate::model::tensor::{TensorRole, WeightTensor, element_count};
use crate::model::topology::TopologyValidator;

/// What the dictionary keys of a model are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Single Unicode code points.
    Codepoints,
    /// Extended grapheme clusters.
    Graphclust,
}

impl ModelType {
    /// Infer the type from a model name such as `Thai_graphclust_model4_heavy`.
    ///
    /// The marker must not open the name; `_codepoints_` is checked first.
    pub fn from_model_name(model_name: &str) -> Result<Self> {
        let marked = |marker: &str| model_name.find(marker).is_some_and(|pos| pos > 0);
        if marked("_codepoints_") {
            Ok(ModelType::Codepoints)
        } else if marked("_graphclust_") {
            Ok(ModelType::Graphclust)
        } else {
            Err(LstmSegError::UnknownModelType {
                model_name: model_name.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Codepoints => "codepoints",
            ModelType::Graphclust => "graphclust",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = LstmSegError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "codepoints" => Ok(ModelType::Codepoints),
            "graphclust" => Ok(ModelType::Graphclust),
            other => Err(LstmSegError::UnknownModelType {
                model_name: other.to_string(),
            }),
        }
    }
}

/// A validated bi-directional LSTM segmentation model.
///
/// Only constructible through [`from_dump`](Self::from_dump) or
/// [`from_parts`](Self::from_parts), both of which run the topology check,
/// so every descriptor in circulation has consistent shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    model_name: String,
    model_type: ModelType,
    embeddings: usize,
    hunits: usize,
    dictionary: GraphemeDictionary,
    weights: Vec<WeightTensor>,
}

impl ModelDescriptor {
    /// Build a descriptor from a parsed weight dump.
    ///
    /// Checks run in this order: model type, tensor data lengths, topology,
    /// dictionary ids.
    pub fn from_dump(dump: WeightDump) -> Result<Self> {
        let model_type = ModelType::from_model_name(&dump.model)?;
        let weights = dump.tensors()?;

        let dict_size = dump.dic.0.len();
        let topology = TopologyValidator::infer(dict_size, &weights)?;
        topology.validate(&weights)?;

        let dictionary = GraphemeDictionary::from_entries(dump.dic.0)?;

        info!(
            model = %dump.model,
            kind = %model_type,
            dict_size,
            embeddings = topology.embeddings,
            hunits = topology.hunits,
            "loaded model"
        );

        Ok(Self {
            model_name: dump.model,
            model_type,
            embeddings: topology.embeddings,
            hunits: topology.hunits,
            dictionary,
            weights,
        })
    }

    /// Assemble a descriptor from already-typed parts.
    pub fn from_parts(
        model_name: impl Into<String>,
        model_type: ModelType,
        embeddings: usize,
        hunits: usize,
        dictionary: GraphemeDictionary,
        weights: Vec<WeightTensor>,
    ) -> Result<Self> {
        let topology = TopologyValidator::new(dictionary.len(), embeddings, hunits);
        topology.validate(&weights)?;
        if weights.len() != TensorRole::COUNT {
            return Err(LstmSegError::PreconditionViolation(format!(
                "expected {} weight tensors, got {}",
                TensorRole::COUNT,
                weights.len()
            )));
        }
        for tensor in &weights {
            let expected = element_count(&tensor.dim).ok_or_else(|| LstmSegError::ShapeOverflow {
                tensor: tensor.name.clone(),
                reason: format!("{:?} holds more than usize::MAX values", tensor.dim),
            })?;
            if tensor.data.len() != expected {
                return Err(LstmSegError::TensorDataLength {
                    tensor: tensor.name.clone(),
                    expected,
                    actual: tensor.data.len(),
                });
            }
        }
        debug!(embeddings, hunits, dict_size = dictionary.len(), "assembled model");

        Ok(Self {
            model_name: model_name.into(),
            model_type,
            embeddings,
            hunits,
            dictionary,
            weights,
        })
    }

    /// Read and validate a JSON weight dump from disk.
    pub fn from_json_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::from_dump(WeightDump::from_path(path)?)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn embeddings(&self) -> usize {
        self.embeddings
    }

    pub fn hunits(&self) -> usize {
        self.hunits
    }

    pub fn dictionary(&self) -> &GraphemeDictionary {
        &self.dictionary
    }

    /// The nine tensors in `mat1..mat9` order.
    pub fn weights(&self) -> &[WeightTensor] {
        &self.weights
    }

    pub fn tensor(&self, role: TensorRole) -> &WeightTensor {
        &self.weights[role.index()]
    }

    pub fn topology(&self) -> TopologyValidator {
        TopologyValidator::new(self.dictionary.len(), self.embeddings, self.hunits)
    }

    /// Short machine-readable description of the model.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            model: self.model_name.clone(),
            model_type: self.model_type,
            embeddings: self.embeddings,
            hunits: self.hunits,
            dict_size: self.dictionary.len(),
            parameters: self.weights.iter().map(WeightTensor::len).sum(),
        }
    }
}

/// Headline numbers of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub embeddings: usize,
    pub hunits: usize,
    pub dict_size: usize,
    pub parameters: usize,
}
