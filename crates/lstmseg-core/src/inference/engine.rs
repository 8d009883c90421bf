//! # Manual Inference Engine
//!
//! Runs a validated [`ModelDescriptor`] over a sequence of dictionary ids:
//! embedding lookup, a forward and a backward LSTM scan, a dense layer over
//! the concatenated hidden states and a softmax over the four BIES classes.

use tracing::debug;

use crate::bies::{Bies, ScoreRow};
use crate::error::{LstmSegError, Result};
use crate::inference::lstm::{LstmCell, LstmState};
use crate::model::{ModelDescriptor, TensorRole};

/// Configuration for [`InferenceEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Run the forward and backward scans on two scoped threads.
    pub parallel_directions: bool,
}

impl InferenceConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable running both directions concurrently.
    pub fn with_parallel_directions(mut self, enabled: bool) -> Self {
        self.parallel_directions = enabled;
        self
    }
}

/// Per-time-step hidden states of both scans, indexed by input position.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenStates {
    pub forward: Vec<Vec<f32>>,
    pub backward: Vec<Vec<f32>>,
}

/// Bi-directional LSTM forward pass over a borrowed model.
#[derive(Debug, Clone, Copy)]
pub struct InferenceEngine<'m> {
    model: &'m ModelDescriptor,
    config: InferenceConfig,
}

impl<'m> InferenceEngine<'m> {
    pub fn new(model: &'m ModelDescriptor) -> Self {
        Self {
            model,
            config: InferenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InferenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &'m ModelDescriptor {
        self.model
    }

    fn check_ids(&self, ids: &[u32]) -> Result<()> {
        let max = self.model.dictionary().len();
        if let Some((pos, id)) = ids.iter().enumerate().find(|&(_, &id)| id as usize > max) {
            return Err(LstmSegError::PreconditionViolation(format!(
                "id {id} at position {pos} is outside [0, {max}]"
            )));
        }
        Ok(())
    }

    fn embedding(&self, id: u32) -> &'m [f32] {
        self.model.tensor(TensorRole::Embedding).row(id as usize)
    }

    fn cell(&self, kernel: TensorRole, recurrent: TensorRole, bias: TensorRole) -> LstmCell<'m> {
        LstmCell::new(
            &self.model.tensor(kernel).data,
            &self.model.tensor(recurrent).data,
            &self.model.tensor(bias).data,
            self.model.hunits(),
        )
    }

    fn scan<I>(&self, cell: LstmCell<'m>, ids: &[u32], order: I) -> Vec<Vec<f32>>
    where
        I: Iterator<Item = usize>,
    {
        let mut out = vec![Vec::new(); ids.len()];
        let mut state = LstmState::zeros(cell.hunits());
        for t in order {
            state = cell.step(self.embedding(ids[t]), &state);
            out[t] = state.h.clone();
        }
        out
    }

    /// Hidden states of the forward scan (`0..n`) and the backward scan
    /// (`n-1..0`), both stored by input position.
    pub fn hidden_states(&self, ids: &[u32]) -> Result<HiddenStates> {
        self.check_ids(ids)?;

        let forward_cell = self.cell(
            TensorRole::ForwardKernel,
            TensorRole::ForwardRecurrent,
            TensorRole::ForwardBias,
        );
        let backward_cell = self.cell(
            TensorRole::BackwardKernel,
            TensorRole::BackwardRecurrent,
            TensorRole::BackwardBias,
        );
        let n = ids.len();

        let (forward, backward) = if self.config.parallel_directions {
            std::thread::scope(|s| {
                let bw = s.spawn(move || self.scan(backward_cell, ids, (0..n).rev()));
                let fw = self.scan(forward_cell, ids, 0..n);
                let bw = bw.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
                (fw, bw)
            })
        } else {
            (
                self.scan(forward_cell, ids, 0..n),
                self.scan(backward_cell, ids, (0..n).rev()),
            )
        };

        Ok(HiddenStates { forward, backward })
    }

    /// Class probabilities for every input id, in `B, I, E, S` column order.
    pub fn predict(&self, ids: &[u32]) -> Result<Vec<ScoreRow>> {
        let states = self.hidden_states(ids)?;
        let kernel = &self.model.tensor(TensorRole::DenseKernel).data;
        let bias = &self.model.tensor(TensorRole::DenseBias).data;

        let rows = states
            .forward
            .iter()
            .zip(&states.backward)
            .map(|(fw, bw)| {
                let mut row: ScoreRow = [0.0; Bies::NUM_TAGS];
                row.copy_from_slice(bias);
                for (r, &v) in fw.iter().chain(bw).enumerate() {
                    let weights = &kernel[r * Bies::NUM_TAGS..(r + 1) * Bies::NUM_TAGS];
                    for (acc, &w) in row.iter_mut().zip(weights) {
                        *acc += v * w;
                    }
                }
                softmax(&mut row);
                row
            })
            .collect::<Vec<_>>();

        debug!(
            model = self.model.model_name(),
            steps = rows.len(),
            parallel = self.config.parallel_directions,
            "ran inference"
        );
        Ok(rows)
    }
}

/// In-place softmax with the maximum subtracted first.
pub fn softmax(row: &mut [f32]) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in row.iter_mut() {
        *v /= sum;
    }
}
