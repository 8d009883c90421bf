//! # Weight Topology Validation
//!
//! All nine tensor shapes of a bi-directional LSTM model follow from three
//! numbers: the dictionary size, the embedding width and the number of LSTM
//! cells per direction. The validator checks a tensor set against them and
//! stops at the first tensor that does not fit.

use crate::bies::Bies;
use crate::error::{LstmSegError, Result};
use crate::model::tensor::{TensorRole, WeightTensor, element_count};

/// Declared dimensions of a bi-directional LSTM model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyValidator {
    /// Dictionary entries, not counting the unknown id.
    pub dict_size: usize,
    /// Embedding width.
    pub embeddings: usize,
    /// LSTM cells in one direction.
    pub hunits: usize,
}

impl TopologyValidator {
    pub fn new(dict_size: usize, embeddings: usize, hunits: usize) -> Self {
        Self {
            dict_size,
            embeddings,
            hunits,
        }
    }

    /// Read `embeddings` from `mat1.dim[1]` and `hunits` from `mat3.dim[0]`.
    pub fn infer(dict_size: usize, tensors: &[WeightTensor]) -> Result<Self> {
        let dim_of = |role: TensorRole, axis: usize| -> Result<usize> {
            let tensor = tensor_for(tensors, role)?;
            tensor
                .dim
                .get(axis)
                .copied()
                .ok_or_else(|| LstmSegError::RankMismatch {
                    tensor: role.name().to_string(),
                    expected_rank: 2,
                    actual: tensor.dim.clone(),
                })
        };

        let embeddings = dim_of(TensorRole::Embedding, 1)?;
        let hunits = dim_of(TensorRole::ForwardRecurrent, 0)?;
        Ok(Self::new(dict_size, embeddings, hunits))
    }

    fn overflow(&self, role: TensorRole) -> LstmSegError {
        LstmSegError::ShapeOverflow {
            tensor: role.name().to_string(),
            reason: format!(
                "dict_size {}, embeddings {}, hunits {}",
                self.dict_size, self.embeddings, self.hunits
            ),
        }
    }

    /// Shape required for `role`.
    pub fn expected_shape(&self, role: TensorRole) -> Result<Vec<usize>> {
        let scaled = |n: usize, k: usize| n.checked_mul(k).ok_or_else(|| self.overflow(role));
        let tags = Bies::NUM_TAGS;
        Ok(match role {
            TensorRole::Embedding => {
                let rows = self.dict_size.checked_add(1).ok_or_else(|| self.overflow(role))?;
                vec![rows, self.embeddings]
            }
            TensorRole::ForwardKernel | TensorRole::BackwardKernel => {
                vec![self.embeddings, scaled(self.hunits, 4)?]
            }
            TensorRole::ForwardRecurrent | TensorRole::BackwardRecurrent => {
                vec![self.hunits, scaled(self.hunits, 4)?]
            }
            TensorRole::ForwardBias | TensorRole::BackwardBias => vec![scaled(self.hunits, 4)?],
            TensorRole::DenseKernel => vec![scaled(self.hunits, 2)?, tags],
            TensorRole::DenseBias => vec![tags],
        })
    }

    /// Number of values `role` holds under this topology.
    pub fn expected_len(&self, role: TensorRole) -> Result<usize> {
        element_count(&self.expected_shape(role)?).ok_or_else(|| self.overflow(role))
    }

    /// Number of values in all nine tensors together.
    pub fn total_len(&self) -> Result<usize> {
        TensorRole::all().iter().try_fold(0usize, |acc, role| {
            acc.checked_add(self.expected_len(*role)?)
                .ok_or_else(|| self.overflow(*role))
        })
    }

    /// Check every tensor in `mat1..mat9` order, failing on the first mismatch.
    ///
    /// `tensors` is indexed by [`TensorRole::index`]; a missing tensor is
    /// reported as a mismatch against an empty shape.
    pub fn validate(&self, tensors: &[WeightTensor]) -> Result<()> {
        for role in TensorRole::all() {
            let expected = self.expected_shape(*role)?;
            let actual = tensor_for(tensors, *role)?;
            if actual.dim != expected {
                return Err(LstmSegError::DimensionMismatch {
                    tensor: role.name().to_string(),
                    expected,
                    actual: actual.dim.clone(),
                });
            }
        }
        Ok(())
    }
}

fn tensor_for(tensors: &[WeightTensor], role: TensorRole) -> Result<&WeightTensor> {
    tensors
        .get(role.index())
        .ok_or_else(|| LstmSegError::DimensionMismatch {
            tensor: role.name().to_string(),
            expected: Vec::new(),
            actual: Vec::new(),
        })
}
