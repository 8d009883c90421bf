//! # Resource Bundle Reader
//!
//! Parses the output of [`encode`](crate::codec::encode) back into a
//! [`ModelDescriptor`]. Only the layout written by the encoder is accepted;
//! this is not a general resource-bundle parser.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::bits::bits_to_float;
use crate::codec::bundle::BYTE_ORDER_MARK;
use crate::dictionary::GraphemeDictionary;
use crate::error::{LstmSegError, Result};
use crate::model::{ModelDescriptor, ModelType, TensorRole, TopologyValidator, WeightTensor};

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    /// Next non-blank, non-comment line, trimmed, with its 1-based number.
    fn next(&mut self) -> Result<(usize, &'a str)> {
        for (idx, line) in self.inner.by_ref() {
            self.last = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            return Ok((idx + 1, line));
        }
        Err(LstmSegError::malformed(self.last + 1, "unexpected end of bundle"))
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        let (no, line) = self.next()?;
        if line != expected {
            return Err(LstmSegError::malformed(
                no,
                format!("expected `{expected}`, found `{line}`"),
            ));
        }
        Ok(())
    }

    /// Value of a line shaped `<prefix><value><suffix>`.
    fn field(&mut self, prefix: &str, suffix: &str) -> Result<(usize, &'a str)> {
        let (no, line) = self.next()?;
        line.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .map(|value| (no, value))
            .ok_or_else(|| {
                LstmSegError::malformed(no, format!("expected `{prefix}...{suffix}`, found `{line}`"))
            })
    }
}

fn parse_usize(no: usize, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| LstmSegError::malformed(no, format!("`{value}` is not a non-negative integer")))
}

/// Undo [`escape`](crate::codec::bundle::escape) on a quoted entry such as `"\"",`.
fn parse_entry(no: usize, line: &str) -> Result<String> {
    let quoted = line
        .strip_suffix(',')
        .and_then(|l| l.strip_prefix('"'))
        .and_then(|l| l.strip_suffix('"'))
        .ok_or_else(|| LstmSegError::malformed(no, format!("bad dictionary entry `{line}`")))?;

    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let c = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == 4)
                        .and_then(char::from_u32)
                        .ok_or_else(|| LstmSegError::malformed(no, format!("bad escape `\\u{hex}`")))?;
                    out.push(c);
                }
                Some(escaped) => out.push(escaped),
                None => return Err(LstmSegError::malformed(no, "dangling escape")),
            },
            '"' => return Err(LstmSegError::malformed(no, "unescaped quote in entry")),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Parse bundle text produced by the encoder.
pub fn decode(text: &str) -> Result<ModelDescriptor> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut lines = Lines::new(text);

    let (_, table) = lines.field("", ":table(nofallback){")?;
    let (no, model) = lines.field("model{\"", "\"}")?;
    if model != table {
        return Err(LstmSegError::malformed(
            no,
            format!("model name `{model}` differs from table name `{table}`"),
        ));
    }
    let (no, ty) = lines.field("type{\"", "\"}")?;
    let model_type: ModelType = ty
        .parse()
        .map_err(|_| LstmSegError::malformed(no, format!("unknown model type `{ty}`")))?;
    let (no, embeddings) = lines.field("embeddings:int{", "}")?;
    let embeddings = parse_usize(no, embeddings)?;
    let (hunits_line, hunits) = lines.field("hunits:int{", "}")?;
    let hunits = parse_usize(hunits_line, hunits)?;

    lines.expect("dict{")?;
    let mut clusters = Vec::new();
    loop {
        let (no, line) = lines.next()?;
        if line == "}" {
            break;
        }
        clusters.push(parse_entry(no, line)?);
    }
    let dictionary = GraphemeDictionary::from_entries(
        clusters.into_iter().enumerate().map(|(i, c)| (c, i as i64)),
    )?;

    lines.expect("data:intvector{")?;
    let mut data = Vec::new();
    loop {
        let (no, line) = lines.next()?;
        if line == "}" {
            break;
        }
        let value = line.strip_suffix(',').unwrap_or(line);
        let bits: i32 = value
            .parse()
            .map_err(|_| LstmSegError::malformed(no, format!("`{value}` is not a 32-bit integer")))?;
        data.push(bits_to_float(bits));
    }
    lines.expect("}")?;

    let topology = TopologyValidator::new(dictionary.len(), embeddings, hunits);
    let expected = topology
        .total_len()
        .map_err(|e| LstmSegError::malformed(hunits_line, e.to_string()))?;
    let weights = split_weights(&topology, expected, data, lines.last)?;
    debug!(model = table, values = weights.iter().map(WeightTensor::len).sum::<usize>(), "decoded bundle");

    ModelDescriptor::from_parts(table, model_type, embeddings, hunits, dictionary, weights)
}

fn split_weights(
    topology: &TopologyValidator,
    expected: usize,
    data: Vec<f32>,
    line: usize,
) -> Result<Vec<WeightTensor>> {
    if data.len() != expected {
        return Err(LstmSegError::malformed(
            line,
            format!("topology needs {expected} weights, bundle holds {}", data.len()),
        ));
    }

    let mut rest = data.as_slice();
    let mut weights = Vec::with_capacity(TensorRole::COUNT);
    for role in TensorRole::all() {
        let (head, tail) = rest.split_at(topology.expected_len(*role)?);
        weights.push(WeightTensor::new(role.name(), topology.expected_shape(*role)?, head.to_vec())?);
        rest = tail;
    }
    Ok(weights)
}

/// Read and decode the bundle stored at `path`.
pub fn decode_path<P: AsRef<Path>>(path: P) -> Result<ModelDescriptor> {
    decode(&fs::read_to_string(path)?)
}
