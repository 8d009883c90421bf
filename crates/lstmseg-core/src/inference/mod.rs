pub mod engine;
pub mod lstm;

pub use engine::{HiddenStates, InferenceConfig, InferenceEngine, softmax};
pub use lstm::{LstmCell, LstmState, sigmoid};
