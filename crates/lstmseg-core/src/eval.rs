//! # Evaluation
//!
//! Scores a [`Segmenter`] against gold text where words are delimited by
//! `|`, e.g. `|ทดลอง|ระบบ|`. Accuracy is the share of clusters whose
//! predicted BIES tag matches the gold tag, averaged over lines.
//!
//! Gold lines whose word boundaries split a cluster cannot be labelled for
//! the model and are skipped with a warning. Very short lines can be joined
//! into one scored unit with [`EvaluatorConfig::with_short_line_merging`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bies::{self, Bies};
use crate::error::{LstmSegError, Result};
use crate::segmenter::Segmenter;

/// Word delimiter in segmented text.
pub const WORD_DELIMITER: char = '|';

/// A gold line split into its plain text and word boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedLine {
    /// The line with every delimiter removed.
    pub text: String,
    /// Byte offsets into `text`, starting at `0` and ending at `text.len()`.
    pub word_breakpoints: Vec<usize>,
}

/// Split a `|`-delimited line into text and word breakpoints.
///
/// Missing outer delimiters are implied and repeated delimiters count once.
///
/// ```
/// use lstmseg_core::eval::parse_segmented_line;
///
/// let line = parse_segmented_line("ab||c");
/// assert_eq!(line.text, "abc");
/// assert_eq!(line.word_breakpoints, vec![0, 2, 3]);
/// ```
pub fn parse_segmented_line(line: &str) -> SegmentedLine {
    let mut text = String::with_capacity(line.len());
    let mut word_breakpoints = vec![0];
    for c in line.chars() {
        if c == WORD_DELIMITER {
            if word_breakpoints.last() != Some(&text.len()) {
                word_breakpoints.push(text.len());
            }
        } else {
            text.push(c);
        }
    }
    if word_breakpoints.last() != Some(&text.len()) {
        word_breakpoints.push(text.len());
    }
    SegmentedLine {
        text,
        word_breakpoints,
    }
}

/// Number of positions at which two BIES strings differ.
pub fn diff_count(expected: &str, actual: &str) -> Result<usize> {
    let (a, b) = (bies::parse_bies(expected)?, bies::parse_bies(actual)?);
    if a.len() != b.len() {
        return Err(LstmSegError::PreconditionViolation(format!(
            "BIES strings differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(&b).filter(|(x, y)| x != y).count())
}

/// Accuracy of one evaluated line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineScore {
    /// 1-based number of the line in its input.
    pub line: usize,
    pub clusters: usize,
    pub mismatches: usize,
    pub accuracy: f64,
}

/// Aggregated result of an evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub lines: Vec<LineScore>,
    /// Mean of the per-line accuracies; `0.0` when no line was scored.
    pub mean_accuracy: f64,
    /// 1-based numbers of gold lines whose boundaries split a cluster.
    #[serde(default)]
    pub skipped: Vec<usize>,
}

impl EvaluationReport {
    fn push(&mut self, score: LineScore) {
        let n = self.lines.len() as f64;
        self.mean_accuracy = (self.mean_accuracy * n + score.accuracy) / (n + 1.0);
        self.lines.push(score);
    }
}

/// Configuration for [`Evaluator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Lines shorter than this many chars are buffered instead of scored.
    /// `0` scores every line on its own.
    pub short_line: usize,
    /// Buffered short lines are scored together once they reach this many
    /// chars.
    pub merge_target: usize,
}

impl EvaluatorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join lines shorter than `short_line` chars until the joined text has
    /// at least `merge_target` chars, then score it as one line. Lengths
    /// count delimiters. A tail that never reaches `merge_target` is dropped.
    pub fn with_short_line_merging(mut self, short_line: usize, merge_target: usize) -> Self {
        self.short_line = short_line;
        self.merge_target = merge_target;
        self
    }
}

/// Runs a segmenter over gold lines and collects per-line accuracy.
#[derive(Debug)]
pub struct Evaluator<'s> {
    segmenter: &'s Segmenter,
    config: EvaluatorConfig,
    report: EvaluationReport,
    seen: usize,
    pending: String,
}

impl<'s> Evaluator<'s> {
    pub fn new(segmenter: &'s Segmenter) -> Self {
        Self {
            segmenter,
            config: EvaluatorConfig::default(),
            report: EvaluationReport::default(),
            seen: 0,
            pending: String::new(),
        }
    }

    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Score one gold line. Blank lines are counted but not scored.
    ///
    /// Returns `None` when nothing was scored: the line was blank, buffered
    /// as a short line, or skipped because a boundary falls inside a cluster.
    pub fn add_line(&mut self, line: &str) -> Result<Option<&LineScore>> {
        self.seen += 1;
        let line = line.trim();
        if parse_segmented_line(line).text.is_empty() {
            return Ok(None);
        }

        let merged;
        let line = if line.chars().count() < self.config.short_line {
            self.pending.push_str(line);
            if self.pending.chars().count() < self.config.merge_target {
                return Ok(None);
            }
            merged = std::mem::take(&mut self.pending);
            merged.as_str()
        } else {
            line
        };
        let gold = parse_segmented_line(line);

        let clusters = self.segmenter.cluster_breakpoints(&gold.text);
        let expected: String = match bies::label(&clusters, &gold.word_breakpoints) {
            Ok(labels) => labels.iter().map(Bies::symbol).collect(),
            Err(e) => {
                warn!(line = self.seen, error = %e, "skipping gold line");
                self.report.skipped.push(self.seen);
                return Ok(None);
            }
        };
        let predicted = self.segmenter.bies(&gold.text)?;
        let mismatches = diff_count(&expected, &predicted)?;

        let count = clusters.len() - 1;
        let score = LineScore {
            line: self.seen,
            clusters: count,
            mismatches,
            accuracy: 1.0 - mismatches as f64 / count as f64,
        };
        debug!(line = score.line, accuracy = score.accuracy, "scored line");
        self.report.push(score);
        Ok(self.report.lines.last())
    }

    /// Score every line of `text`.
    pub fn add_text(&mut self, text: &str) -> Result<()> {
        for line in text.lines() {
            self.add_line(line)?;
        }
        Ok(())
    }

    pub fn report(&self) -> &EvaluationReport {
        &self.report
    }

    pub fn finish(self) -> EvaluationReport {
        self.report
    }
}
