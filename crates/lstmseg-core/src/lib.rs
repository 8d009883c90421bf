//! # LSTM Segmentation Core
//!
//! Tooling around bi-directional LSTM word segmentation models for scripts
//! written without spaces (Thai, Burmese, ...). Validates trained weight
//! dumps, converts them into the integer-vector resource bundle format used
//! by the runtime segmenter, and runs the network directly for segmentation
//! and evaluation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lstmseg_core::{BundleConfig, ModelDescriptor, codec};
//!
//! let model = ModelDescriptor::from_json_path("Thai_graphclust_model4_heavy.json").unwrap();
//! codec::write_file("Thai_graphclust_model4_heavy.txt", &model, &BundleConfig::default()).unwrap();
//!
//! let decoded = codec::decode_path("Thai_graphclust_model4_heavy.txt").unwrap();
//! assert_eq!(decoded, model);
//! ```
pub mod bies;
pub mod codec;
pub mod dictionary;
pub mod error;
pub mod eval;
pub mod inference;
pub mod model;
pub mod segmenter;

// Re-export primary API
pub use bies::{Bies, ScoreRow};
pub use codec::{BundleConfig, decode, decode_path, encode, write_file, write_to};
pub use dictionary::GraphemeDictionary;
pub use error::{LstmSegError, Result};
pub use eval::{
    EvaluationReport, Evaluator, EvaluatorConfig, LineScore, SegmentedLine, diff_count,
    parse_segmented_line,
};
pub use inference::{InferenceConfig, InferenceEngine};
pub use model::{
    ModelDescriptor, ModelSummary, ModelType, TensorRole, TopologyValidator, WeightDump,
    WeightTensor,
};
pub use segmenter::{Segmenter, SegmenterConfig};
