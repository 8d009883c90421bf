pub mod bits;
pub mod bundle;
pub mod reader;

pub use bits::{bits_to_float, float_to_bits};
pub use bundle::{BundleConfig, encode, write_file, write_to};
pub use reader::{decode, decode_path};
