//! # JSON Weight Dump
//!
//! Typed view of the weight dump written by the training scripts:
//!
//! ```json
//! { "model": "Thai_graphclust_model4_heavy",
//!   "dic": { "ก": 0, "า": 1 },
//!   "mat1": { "dim": [3, 16], "data": [0.1, ...] },
//!   ...
//!   "mat9": { "dim": [4], "data": [...] } }
//! ```
//!
//! The order of `dic` decides which embedding row belongs to which cluster,
//! so it is read into a list instead of a map.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::model::tensor::{TensorRole, WeightTensor};

/// Shape and row-major values of one tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTensor {
    pub dim: Vec<usize>,
    pub data: Vec<f32>,
}

/// `dic` entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedEntries(pub Vec<(String, i64)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from grapheme cluster to integer id")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, i64>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Serialize for OrderedEntries {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The complete weight dump of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDump {
    pub model: String,
    pub dic: OrderedEntries,
    pub mat1: RawTensor,
    pub mat2: RawTensor,
    pub mat3: RawTensor,
    pub mat4: RawTensor,
    pub mat5: RawTensor,
    pub mat6: RawTensor,
    pub mat7: RawTensor,
    pub mat8: RawTensor,
    pub mat9: RawTensor,
}

impl WeightDump {
    /// Parse a dump from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a dump from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse the dump stored at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading weight dump");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serialize back to JSON, keeping the dictionary order.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn raw(&self, role: TensorRole) -> &RawTensor {
        match role {
            TensorRole::Embedding => &self.mat1,
            TensorRole::ForwardKernel => &self.mat2,
            TensorRole::ForwardRecurrent => &self.mat3,
            TensorRole::ForwardBias => &self.mat4,
            TensorRole::BackwardKernel => &self.mat5,
            TensorRole::BackwardRecurrent => &self.mat6,
            TensorRole::BackwardBias => &self.mat7,
            TensorRole::DenseKernel => &self.mat8,
            TensorRole::DenseBias => &self.mat9,
        }
    }

    /// The nine tensors in `mat1..mat9` order, each checked for a consistent
    /// data length.
    pub fn tensors(&self) -> Result<Vec<WeightTensor>> {
        TensorRole::all()
            .iter()
            .map(|role| {
                let raw = self.raw(*role);
                WeightTensor::new(role.name(), raw.dim.clone(), raw.data.clone())
            })
            .collect()
    }
}
