pub mod descriptor;
pub mod dump;
pub mod tensor;
pub mod topology;

pub use descriptor::{ModelDescriptor, ModelSummary, ModelType};
pub use dump::{OrderedEntries, RawTensor, WeightDump};
pub use tensor::{TensorRole, WeightTensor};
pub use topology::TopologyValidator;
