//! # LSTM Cell
//!
//! One direction of the recurrent layer, evaluated straight from the flat
//! weight arrays. Gate pre-activations are laid out as four `hunits`-wide
//! chunks in the order input, forget, candidate, output.

/// Logistic function `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Hidden and cell state of one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmState {
    pub h: Vec<f32>,
    pub c: Vec<f32>,
}

impl LstmState {
    pub fn zeros(hunits: usize) -> Self {
        Self {
            h: vec![0.0; hunits],
            c: vec![0.0; hunits],
        }
    }
}

/// Borrowed weights of one LSTM direction.
#[derive(Debug, Clone, Copy)]
pub struct LstmCell<'w> {
    /// `[embeddings, 4*hunits]`, row-major.
    kernel: &'w [f32],
    /// `[hunits, 4*hunits]`, row-major.
    recurrent: &'w [f32],
    /// `[4*hunits]`.
    bias: &'w [f32],
    hunits: usize,
}

impl<'w> LstmCell<'w> {
    /// Wrap weight slices that already passed topology validation.
    pub fn new(kernel: &'w [f32], recurrent: &'w [f32], bias: &'w [f32], hunits: usize) -> Self {
        debug_assert_eq!(bias.len(), 4 * hunits);
        debug_assert_eq!(recurrent.len(), hunits * 4 * hunits);
        debug_assert_eq!(kernel.len() % (4 * hunits).max(1), 0);
        Self {
            kernel,
            recurrent,
            bias,
            hunits,
        }
    }

    pub fn hunits(&self) -> usize {
        self.hunits
    }

    /// Gate pre-activations `x·W + h·U + b`.
    fn preactivations(&self, x: &[f32], h: &[f32]) -> Vec<f32> {
        let width = 4 * self.hunits;
        let mut s = self.bias.to_vec();
        accumulate(&mut s, x, self.kernel, width);
        accumulate(&mut s, h, self.recurrent, width);
        s
    }

    /// Advance one time step with input vector `x`.
    pub fn step(&self, x: &[f32], state: &LstmState) -> LstmState {
        let n = self.hunits;
        let s = self.preactivations(x, &state.h);
        let (input, rest) = s.split_at(n);
        let (forget, rest) = rest.split_at(n);
        let (candidate, output) = rest.split_at(n);

        let mut next = LstmState::zeros(n);
        for k in 0..n {
            let i = sigmoid(input[k]);
            let f = sigmoid(forget[k]);
            let g = candidate[k].tanh();
            let o = sigmoid(output[k]);
            next.c[k] = i * g + f * state.c[k];
            next.h[k] = o * next.c[k].tanh();
        }
        next
    }
}

/// `acc += v · m` where `m` is row-major with `width` columns.
fn accumulate(acc: &mut [f32], v: &[f32], m: &[f32], width: usize) {
    for (r, &vr) in v.iter().enumerate() {
        if vr == 0.0 {
            continue;
        }
        let row = &m[r * width..(r + 1) * width];
        for (a, &w) in acc.iter_mut().zip(row) {
            *a += vr * w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) - 0.880_797).abs() < 1e-6);
        assert!((sigmoid(-2.0) - 0.119_203).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weights_keep_zero_state() {
        let (kernel, recurrent, bias) = (vec![0.0; 3 * 8], vec![0.0; 2 * 8], vec![0.0; 8]);
        let cell = LstmCell::new(&kernel, &recurrent, &bias, 2);
        let state = cell.step(&[1.0, -2.0, 3.0], &LstmState::zeros(2));
        assert_eq!(state, LstmState::zeros(2));
    }

    #[test]
    fn test_gate_order() {
        // one unit, input width 1, W = 0, U = 0; bias picks the gates
        let kernel = [0.0; 4];
        let recurrent = [0.0; 4];
        let (i, f, g, o) = (1.0f32, -1.0f32, 0.5f32, 2.0f32);
        let bias = [i, f, g, o];
        let cell = LstmCell::new(&kernel, &recurrent, &bias, 1);

        let prev = LstmState {
            h: vec![0.0],
            c: vec![0.3],
        };
        let next = cell.step(&[0.0], &prev);

        let c = sigmoid(i) * g.tanh() + sigmoid(f) * 0.3;
        let h = sigmoid(o) * c.tanh();
        assert!((next.c[0] - c).abs() < 1e-6);
        assert!((next.h[0] - h).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_layout_is_row_major() {
        // input width 2, one unit: x = [0, 1] must select row 1 of W
        let kernel = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 0.0];
        let recurrent = [0.0; 4];
        let bias = [10.0, 10.0, 0.0, 10.0];
        let cell = LstmCell::new(&kernel, &recurrent, &bias, 1);

        let next = cell.step(&[0.0, 1.0], &LstmState::zeros(1));
        let c = sigmoid(10.0) * 5.0f32.tanh();
        assert!((next.c[0] - c).abs() < 1e-6);
    }
}
