use crate::error::{LstmSegError, Result};

/// The nine weight tensors of a bi-directional LSTM segmentation model, in
/// serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorRole {
    Embedding,
    ForwardKernel,
    ForwardRecurrent,
    ForwardBias,
    BackwardKernel,
    BackwardRecurrent,
    BackwardBias,
    DenseKernel,
    DenseBias,
}

impl TensorRole {
    pub const COUNT: usize = 9;

    pub fn all() -> &'static [TensorRole; TensorRole::COUNT] {
        &[
            TensorRole::Embedding,
            TensorRole::ForwardKernel,
            TensorRole::ForwardRecurrent,
            TensorRole::ForwardBias,
            TensorRole::BackwardKernel,
            TensorRole::BackwardRecurrent,
            TensorRole::BackwardBias,
            TensorRole::DenseKernel,
            TensorRole::DenseBias,
        ]
    }

    /// Position in `mat1..mat9` (zero-based).
    pub fn index(&self) -> usize {
        match self {
            TensorRole::Embedding => 0,
            TensorRole::ForwardKernel => 1,
            TensorRole::ForwardRecurrent => 2,
            TensorRole::ForwardBias => 3,
            TensorRole::BackwardKernel => 4,
            TensorRole::BackwardRecurrent => 5,
            TensorRole::BackwardBias => 6,
            TensorRole::DenseKernel => 7,
            TensorRole::DenseBias => 8,
        }
    }

    /// Key of this tensor in the weight dump (`mat1`..`mat9`).
    pub fn name(&self) -> &'static str {
        match self {
            TensorRole::Embedding => "mat1",
            TensorRole::ForwardKernel => "mat2",
            TensorRole::ForwardRecurrent => "mat3",
            TensorRole::ForwardBias => "mat4",
            TensorRole::BackwardKernel => "mat5",
            TensorRole::BackwardRecurrent => "mat6",
            TensorRole::BackwardBias => "mat7",
            TensorRole::DenseKernel => "mat8",
            TensorRole::DenseBias => "mat9",
        }
    }
}

/// Number of values a tensor of shape `dim` holds, or `None` on overflow.
pub fn element_count(dim: &[usize]) -> Option<usize> {
    dim.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// A named, row-major `f32` tensor of rank 1 or 2.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTensor {
    pub name: String,
    pub dim: Vec<usize>,
    pub data: Vec<f32>,
}

impl WeightTensor {
    /// Create a tensor, checking that `data` fills `dim` exactly.
    pub fn new(name: impl Into<String>, dim: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let name = name.into();
        let Some(expected) = element_count(&dim) else {
            return Err(LstmSegError::ShapeOverflow {
                reason: format!("{dim:?} holds more than usize::MAX values"),
                tensor: name,
            });
        };
        if expected != data.len() {
            return Err(LstmSegError::TensorDataLength {
                tensor: name,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { name, dim, data })
    }

    /// All-zero tensor of the given shape.
    pub fn zeros(name: impl Into<String>, dim: Vec<usize>) -> Result<Self> {
        let name = name.into();
        let len = element_count(&dim).ok_or_else(|| LstmSegError::ShapeOverflow {
            tensor: name.clone(),
            reason: format!("{dim:?} holds more than usize::MAX values"),
        })?;
        Ok(Self {
            name,
            dim,
            data: vec![0.0; len],
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `r` of a rank-2 tensor. Panics if `r` is out of range.
    pub fn row(&self, r: usize) -> &[f32] {
        let cols = self.dim.get(1).copied().unwrap_or(1);
        &self.data[r * cols..(r + 1) * cols]
    }
}
