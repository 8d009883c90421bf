//! # BIES Tags for Word Segmentation
//!
//! Every grapheme cluster of a sentence gets one of four tags describing its
//! place in the enclosing word: Begin, Inside, End, or Single (a one-cluster
//! word). The inference engine emits one score per tag in this column order.

use std::fmt;

use crate::error::{LstmSegError, Result};

/// Position of a grapheme cluster inside its word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bies {
    Begin,
    Inside,
    End,
    Single,
}

/// One row of class scores, in `B, I, E, S` order.
pub type ScoreRow = [f32; Bies::NUM_TAGS];

impl Bies {
    /// Total number of distinct tags.
    pub const NUM_TAGS: usize = 4;

    /// All tags in column order. Also the tie-break priority of [`decode_scores`].
    pub fn all_tags() -> &'static [Bies] {
        &[Bies::Begin, Bies::Inside, Bies::End, Bies::Single]
    }

    /// Column of this tag in a score matrix.
    pub fn index(&self) -> usize {
        match self {
            Bies::Begin => 0,
            Bies::Inside => 1,
            Bies::End => 2,
            Bies::Single => 3,
        }
    }

    /// Get tag from column index.
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all_tags().get(idx).copied()
    }

    /// Lowercase symbol used in decoded BIES strings.
    pub fn symbol(&self) -> char {
        match self {
            Bies::Begin => 'b',
            Bies::Inside => 'i',
            Bies::End => 'e',
            Bies::Single => 's',
        }
    }

    /// Parse a symbol, case-insensitively.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'b' => Some(Bies::Begin),
            'i' => Some(Bies::Inside),
            'e' => Some(Bies::End),
            's' => Some(Bies::Single),
            _ => None,
        }
    }

    /// Whether a word starts at this cluster.
    pub fn starts_word(&self) -> bool {
        matches!(self, Bies::Begin | Bies::Single)
    }

    /// Whether a word ends after this cluster.
    pub fn ends_word(&self) -> bool {
        matches!(self, Bies::End | Bies::Single)
    }
}

impl fmt::Display for Bies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bies::Begin => write!(f, "B"),
            Bies::Inside => write!(f, "I"),
            Bies::End => write!(f, "E"),
            Bies::Single => write!(f, "S"),
        }
    }
}

/// Tag every grapheme cluster given cluster and word breakpoints.
///
/// Both lists are offsets into the same unsegmented string, starting with the
/// first offset (usually `0`) and ending with the string length. Every word
/// breakpoint must also be a cluster breakpoint.
///
/// # Examples
/// ```
/// use lstmseg_core::bies::{label, Bies};
///
/// let labels = label(&[0, 1, 2, 3, 4], &[0, 2, 4]).unwrap();
/// assert_eq!(labels, vec![Bies::Begin, Bies::End, Bies::Begin, Bies::End]);
/// ```
pub fn label(char_breakpoints: &[usize], word_breakpoints: &[usize]) -> Result<Vec<Bies>> {
    check_alignment(char_breakpoints, word_breakpoints)?;

    let mut labels = Vec::with_capacity(char_breakpoints.len().saturating_sub(1));
    let mut word_idx = 0;
    for span in char_breakpoints.windows(2) {
        let (char_st, char_fn) = (span[0], span[1]);
        let word_st = word_breakpoints[word_idx];
        let word_fn = word_breakpoints[word_idx + 1];

        let tag = match (char_st == word_st, char_fn == word_fn) {
            (true, false) => Bies::Begin,
            (false, false) => Bies::Inside,
            (false, true) => Bies::End,
            (true, true) => Bies::Single,
        };
        if tag.ends_word() {
            word_idx += 1;
        }
        labels.push(tag);
    }
    Ok(labels)
}

fn check_alignment(char_breakpoints: &[usize], word_breakpoints: &[usize]) -> Result<()> {
    let violation = |msg: &str| Err(LstmSegError::PreconditionViolation(msg.to_string()));

    if char_breakpoints.is_empty() || word_breakpoints.is_empty() {
        return violation("breakpoint lists must not be empty");
    }
    if !is_strictly_increasing(char_breakpoints) {
        return violation("grapheme cluster breakpoints must be strictly increasing");
    }
    if !is_strictly_increasing(word_breakpoints) {
        return violation("word breakpoints must be strictly increasing");
    }
    if char_breakpoints.first() != word_breakpoints.first()
        || char_breakpoints.last() != word_breakpoints.last()
    {
        return violation("word and grapheme cluster breakpoints must cover the same text");
    }
    if let Some(stray) = word_breakpoints
        .iter()
        .find(|&&bp| char_breakpoints.binary_search(&bp).is_err())
    {
        return Err(LstmSegError::PreconditionViolation(format!(
            "word breakpoint {stray} falls inside a grapheme cluster"
        )));
    }
    Ok(())
}

fn is_strictly_increasing(points: &[usize]) -> bool {
    points.windows(2).all(|w| w[0] < w[1])
}

/// Indicator matrix of a tag sequence, one row per cluster.
pub fn one_hot(labels: &[Bies]) -> Vec<ScoreRow> {
    labels
        .iter()
        .map(|tag| {
            let mut row = [0.0; Bies::NUM_TAGS];
            row[tag.index()] = 1.0;
            row
        })
        .collect()
}

/// Pick the best tag of every row and spell the result as a `bies` string.
///
/// Ties go to the earliest tag in `B, I, E, S` order.
pub fn decode_scores(scores: &[ScoreRow]) -> String {
    scores.iter().map(|row| best_tag(row).symbol()).collect()
}

/// Best tag of a single row with the `B > I > E > S` tie-break.
pub fn best_tag(row: &ScoreRow) -> Bies {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Bies::all_tags()
        .iter()
        .copied()
        .find(|tag| row[tag.index()] == max)
        // all-NaN rows compare unequal to everything
        .unwrap_or(Bies::Begin)
}

/// Parse a decoded `bies` string back into tags.
pub fn parse_bies(symbols: &str) -> Result<Vec<Bies>> {
    symbols
        .chars()
        .map(|c| {
            Bies::from_symbol(c).ok_or_else(|| {
                LstmSegError::PreconditionViolation(format!("invalid BIES symbol {c:?}"))
            })
        })
        .collect()
}

/// Word breakpoints implied by a tag sequence over the given cluster breakpoints.
///
/// A boundary is placed before every cluster that starts a word and after
/// every cluster that ends one, so malformed sequences (two `B` in a row, a
/// trailing `I`) still produce a usable segmentation.
pub fn word_breakpoints(char_breakpoints: &[usize], labels: &[Bies]) -> Result<Vec<usize>> {
    if char_breakpoints.len() != labels.len() + 1 {
        return Err(LstmSegError::PreconditionViolation(format!(
            "{} labels need {} cluster breakpoints, got {}",
            labels.len(),
            labels.len() + 1,
            char_breakpoints.len()
        )));
    }

    let mut out = Vec::with_capacity(char_breakpoints.len());
    out.push(char_breakpoints[0]);
    for (i, tag) in labels.iter().enumerate() {
        let (start, end) = (char_breakpoints[i], char_breakpoints[i + 1]);
        if tag.starts_word() && out.last() != Some(&start) {
            out.push(start);
        }
        if tag.ends_word() || i + 1 == labels.len() {
            out.push(end);
        }
    }
    Ok(out)
}

/// Insert `|` at every breakpoint of `text`, e.g. `|ab|cd|`.
pub fn segmented_string(text: &str, breakpoints: &[usize]) -> String {
    let mut out = String::with_capacity(text.len() + breakpoints.len());
    out.push('|');
    for span in breakpoints.windows(2) {
        out.push_str(&text[span[0]..span[1]]);
        out.push('|');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_index_roundtrip() {
        for tag in Bies::all_tags() {
            assert_eq!(Bies::from_index(tag.index()), Some(*tag));
            assert_eq!(Bies::from_symbol(tag.symbol()), Some(*tag));
        }
        assert_eq!(Bies::from_index(4), None);
    }

    #[test]
    fn test_label_two_words() {
        let labels = label(&[0, 1, 2, 3, 4], &[0, 2, 4]).unwrap();
        let shown: Vec<String> = labels.iter().map(|t| t.to_string()).collect();
        assert_eq!(shown, vec!["B", "E", "B", "E"]);
    }

    #[test]
    fn test_label_single_and_inside() {
        // "a" | "bcd" | "e"
        let labels = label(&[0, 1, 2, 3, 4, 5], &[0, 1, 4, 5]).unwrap();
        assert_eq!(
            labels,
            vec![
                Bies::Single,
                Bies::Begin,
                Bies::Inside,
                Bies::End,
                Bies::Single
            ]
        );
    }

    #[test]
    fn test_label_multibyte_clusters() {
        // clusters of 3 bytes each, one word of two clusters
        let labels = label(&[0, 3, 6], &[0, 6]).unwrap();
        assert_eq!(labels, vec![Bies::Begin, Bies::End]);
    }

    #[test]
    fn test_label_empty_text() {
        assert!(label(&[0], &[0]).unwrap().is_empty());
    }

    #[test]
    fn test_label_rejects_misaligned_words() {
        let err = label(&[0, 2, 4], &[0, 1, 4]).unwrap_err();
        assert!(matches!(err, LstmSegError::PreconditionViolation(_)));

        let err = label(&[0, 1, 2], &[0, 1]).unwrap_err();
        assert!(matches!(err, LstmSegError::PreconditionViolation(_)));

        let err = label(&[0, 2, 1], &[0, 1]).unwrap_err();
        assert!(matches!(err, LstmSegError::PreconditionViolation(_)));
    }

    #[test]
    fn test_decode_scores_tie_break() {
        assert_eq!(decode_scores(&[[0.5, 0.5, 0.5, 0.5]]), "b");
        assert_eq!(decode_scores(&[[0.1, 0.9, 0.1, 0.1]]), "i");
        assert_eq!(decode_scores(&[[0.0, 0.7, 0.0, 0.7]]), "i");
        assert_eq!(decode_scores(&[[0.0, 0.1, 0.7, 0.7]]), "e");
        assert_eq!(decode_scores(&[[0.1, 0.2, 0.3, 0.4]]), "s");
    }

    #[test]
    fn test_one_hot_decodes_back() {
        let labels = label(&[0, 1, 2, 3, 4, 5], &[0, 1, 4, 5]).unwrap();
        assert_eq!(decode_scores(&one_hot(&labels)), "sbies");
    }

    #[test]
    fn test_word_breakpoints_inverts_label() {
        let chars = [0, 1, 2, 3, 4, 5];
        let words = [0, 1, 4, 5];
        let labels = label(&chars, &words).unwrap();
        assert_eq!(word_breakpoints(&chars, &labels).unwrap(), words.to_vec());
    }

    #[test]
    fn test_word_breakpoints_tolerates_malformed_tags() {
        let tags = parse_bies("bbi").unwrap();
        assert_eq!(word_breakpoints(&[0, 1, 2, 3], &tags).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_segmented_string() {
        assert_eq!(segmented_string("abcd", &[0, 2, 4]), "|ab|cd|");
        assert_eq!(segmented_string("", &[0]), "|");
    }

    #[test]
    fn test_parse_bies_rejects_unknown_symbol() {
        assert!(parse_bies("bx").is_err());
        assert_eq!(parse_bies("BE").unwrap(), vec![Bies::Begin, Bies::End]);
    }
}
