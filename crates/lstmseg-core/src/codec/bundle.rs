//! # Resource Bundle Encoder
//!
//! Writes a validated model in the text resource-bundle format read by the
//! segmentation engine:
//!
//! ```text
//! // © 2021 and later: Unicode, Inc. and others.
//! // License & terms of use: http://www.unicode.org/copyright.html
//! Thai_graphclust_model4_heavy:table(nofallback){
//!     model{"Thai_graphclust_model4_heavy"}
//!     type{"graphclust"}
//!     embeddings:int{16}
//!     hunits:int{27}
//!     dict{
//!         "ก",
//!     }
//!     data:intvector{
//!         1040187392,
//!     }
//! }
//! ```
//!
//! Weights are stored as the bit patterns of their `f32` values read as
//! `i32`, tensor after tensor in `mat1..mat9` order.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::codec::bits::float_to_bits;
use crate::error::Result;
use crate::model::ModelDescriptor;

/// Byte order mark emitted in front of the header.
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Layout options of an encoded bundle. The weights are never affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Emit U+FEFF before the first comment line.
    pub byte_order_mark: bool,
    /// Text of the first comment line.
    pub copyright: String,
    /// Text of the second comment line.
    pub license: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            byte_order_mark: true,
            copyright: "© 2021 and later: Unicode, Inc. and others.".to_string(),
            license: "License & terms of use: http://www.unicode.org/copyright.html".to_string(),
        }
    }
}

impl BundleConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the leading byte order mark.
    pub fn with_byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }

    /// Replace the copyright line.
    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    /// Replace the license line.
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }
}

/// Escape a dictionary entry for use inside a quoted bundle string.
///
/// `"` and `\` get a backslash, `\n` `\r` `\t` use their short forms and
/// every other control character becomes `\uXXXX`, so an entry always stays
/// on one line.
pub fn escape(cluster: &str) -> String {
    let mut out = String::with_capacity(cluster.len());
    for c in cluster.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Encode `model` as bundle text. Identical inputs give identical output.
pub fn encode(model: &ModelDescriptor, config: &BundleConfig) -> String {
    let values: usize = model.weights().iter().map(|t| t.len()).sum();
    let mut out = String::with_capacity(256 + model.dictionary().len() * 16 + values * 13);

    // Writing into a String cannot fail.
    let _ = write_bundle(&mut out, model, config);

    debug!(
        model = model.model_name(),
        entries = model.dictionary().len(),
        values,
        bytes = out.len(),
        "encoded bundle"
    );
    out
}

fn write_bundle(out: &mut String, model: &ModelDescriptor, config: &BundleConfig) -> std::fmt::Result {
    let name = model.model_name();

    if config.byte_order_mark {
        out.push(BYTE_ORDER_MARK);
    }
    writeln!(out, "// {}", config.copyright)?;
    writeln!(out, "// {}", config.license)?;
    writeln!(out, "{name}:table(nofallback){{")?;
    writeln!(out, "    model{{\"{name}\"}}")?;
    writeln!(out, "    type{{\"{}\"}}", model.model_type())?;
    writeln!(out, "    embeddings:int{{{}}}", model.embeddings())?;
    writeln!(out, "    hunits:int{{{}}}", model.hunits())?;

    writeln!(out, "    dict{{")?;
    for cluster in model.dictionary().iter() {
        writeln!(out, "        \"{}\",", escape(cluster))?;
    }
    writeln!(out, "    }}")?;

    writeln!(out, "    data:intvector{{")?;
    for tensor in model.weights() {
        for value in &tensor.data {
            writeln!(out, "        {},", float_to_bits(*value))?;
        }
    }
    writeln!(out, "    }}")?;
    writeln!(out, "}}")
}

/// Encode `model` into any writer.
pub fn write_to<W: io::Write>(writer: &mut W, model: &ModelDescriptor, config: &BundleConfig) -> Result<()> {
    writer.write_all(encode(model, config).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Encode `model` to `path` without ever leaving a partial file there.
///
/// The bundle goes to a hidden sibling file first and is renamed over `path`
/// once it has been written and synced.
pub fn write_file<P: AsRef<Path>>(path: P, model: &ModelDescriptor, config: &BundleConfig) -> Result<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp)?;
        write_to(&mut file, model, config)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        info!(path = %path.display(), model = model.model_name(), "wrote resource bundle");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::GraphemeDictionary;
    use crate::model::descriptor::fixtures;
    use crate::model::{ModelType, TensorRole, TopologyValidator, WeightTensor};

    fn zero_model(name: &str, dictionary: GraphemeDictionary) -> ModelDescriptor {
        let topology = TopologyValidator::new(dictionary.len(), 1, 1);
        let mut weights: Vec<WeightTensor> = TensorRole::all()
            .iter()
            .map(|role| WeightTensor::zeros(role.name(), topology.expected_shape(*role).unwrap()).unwrap())
            .collect();
        weights[TensorRole::DenseBias.index()].data = vec![1.0, -1.0, 0.5, -0.0];
        ModelDescriptor::from_parts(name, ModelType::Codepoints, 1, 1, dictionary, weights).unwrap()
    }

    #[test]
    fn test_exact_layout() {
        let dict = GraphemeDictionary::from_entries([("a", 0)]).unwrap();
        let model = zero_model("Thai_codepoints_t", dict);
        let text = encode(&model, &BundleConfig::new().with_byte_order_mark(false));

        let mut expected = String::from(
            "// © 2021 and later: Unicode, Inc. and others.\n\
             // License & terms of use: http://www.unicode.org/copyright.html\n\
             Thai_codepoints_t:table(nofallback){\n    \
             model{\"Thai_codepoints_t\"}\n    \
             type{\"codepoints\"}\n    \
             embeddings:int{1}\n    \
             hunits:int{1}\n    \
             dict{\n        \
             \"a\",\n    \
             }\n    \
             data:intvector{\n",
        );
        // mat1 [2,1], mat2 [1,4], mat3 [1,4], mat4 [4], mat5..mat7, mat8 [2,4]
        for _ in 0..(2 + 4 + 4 + 4 + 4 + 4 + 4 + 8) {
            expected.push_str("        0,\n");
        }
        expected.push_str("        1065353216,\n");
        expected.push_str("        -1082130432,\n");
        expected.push_str("        1056964608,\n");
        expected.push_str("        -2147483648,\n");
        expected.push_str("    }\n}\n");

        assert_eq!(text, expected);
    }

    #[test]
    fn test_byte_order_mark_is_optional() {
        let model = fixtures::tiny_model("Thai_graphclust_tiny");
        let with = encode(&model, &BundleConfig::default());
        let without = encode(&model, &BundleConfig::default().with_byte_order_mark(false));

        assert!(with.starts_with("\u{FEFF}// ©"));
        assert!(without.starts_with("// ©"));
        assert_eq!(&with[BYTE_ORDER_MARK.len_utf8()..], without);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let model = fixtures::tiny_model("Thai_graphclust_tiny");
        let config = BundleConfig::default();
        assert_eq!(encode(&model, &config), encode(&model, &config));
    }

    #[test]
    fn test_dictionary_entries_are_escaped() {
        let dict = GraphemeDictionary::from_entries([("\"", 0), ("\\", 1), ("ก", 2)]).unwrap();
        let text = encode(&zero_model("Thai_codepoints_q", dict), &BundleConfig::default());

        assert!(text.contains("        \"\\\"\",\n"));
        assert!(text.contains("        \"\\\\\",\n"));
        assert!(text.contains("        \"ก\",\n"));
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\nb"), "a\\nb");
        assert_eq!(escape("\r\t"), "\\r\\t");
        assert_eq!(escape("\u{1}\u{7f}"), "\\u0001\\u007F");
        assert_eq!(escape("\u{85}"), "\\u0085");
        assert_eq!(escape("กข"), "กข");

        let dict = GraphemeDictionary::from_entries([("\n", 0), ("x", 1)]).unwrap();
        let text = encode(&zero_model("Thai_codepoints_n", dict), &BundleConfig::default());
        assert!(text.contains("    dict{\n        \"\\n\",\n        \"x\",\n    }\n"));
    }

    #[test]
    fn test_custom_header() {
        let model = fixtures::tiny_model("Thai_graphclust_tiny");
        let config = BundleConfig::new()
            .with_byte_order_mark(false)
            .with_copyright("© 2024 Example")
            .with_license("License: MIT");
        let text = encode(&model, &config);
        assert!(text.starts_with("// © 2024 Example\n// License: MIT\nThai_graphclust_tiny:table"));
    }

    #[test]
    fn test_write_file_replaces_target() {
        let model = fixtures::tiny_model("Thai_graphclust_tiny");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.txt");
        fs::write(&path, "stale").unwrap();

        write_file(&path, &model, &BundleConfig::default()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, encode(&model, &BundleConfig::default()));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_file_into_missing_directory_fails_cleanly() {
        let model = fixtures::tiny_model("Thai_graphclust_tiny");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("model.txt");
        assert!(write_file(&path, &model, &BundleConfig::default()).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
