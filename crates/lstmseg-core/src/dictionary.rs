//! # Grapheme Dictionary
//!
//! Maps grapheme clusters (or code points, for `codepoints` models) to the
//! embedding row that represents them. Ids follow insertion order, and one
//! extra id past the last entry stands for every cluster not in the table.

use std::collections::HashMap;

use crate::error::{LstmSegError, Result};

/// Ordered cluster-to-id table with an implicit unknown id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphemeDictionary {
    clusters: Vec<String>,
    ids: HashMap<String, u32>,
}

impl GraphemeDictionary {
    /// Create an empty dictionary. Every lookup returns the unknown id `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(cluster, value)` pairs in their stored order.
    ///
    /// Each value must equal the position of its pair; the embedding matrix
    /// is indexed by that position.
    ///
    /// # Examples
    /// ```
    /// use lstmseg_core::GraphemeDictionary;
    ///
    /// let dict = GraphemeDictionary::from_entries([("x", 0), ("y", 1)]).unwrap();
    /// assert_eq!(dict.lookup("y"), 1);
    /// assert_eq!(dict.lookup("z"), 2);
    /// ```
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        for (position, (cluster, value)) in entries.into_iter().enumerate() {
            let cluster = cluster.into();
            if value != position as i64 {
                return Err(LstmSegError::DictionaryIndexMismatch {
                    key: cluster,
                    expected_index: position,
                    actual_value: value,
                });
            }
            if !dict.push(cluster.clone()) {
                return Err(LstmSegError::DuplicateDictionaryEntry { key: cluster });
            }
        }
        Ok(dict)
    }

    /// Assign ids to the `threshold_count - 1` most frequent clusters.
    ///
    /// `ranked_clusters` must be sorted by descending frequency. Clusters
    /// beyond the threshold are left out and resolve to the unknown id, which
    /// therefore ends up being `threshold_count - 1` when enough clusters are
    /// supplied.
    pub fn build_from_ranked_frequencies<I, S>(ranked_clusters: I, threshold_count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capacity = threshold_count.saturating_sub(1);
        let mut dict = Self::new();
        for cluster in ranked_clusters {
            if dict.len() == capacity {
                break;
            }
            dict.push(cluster.into());
        }
        dict
    }

    fn push(&mut self, cluster: String) -> bool {
        if self.ids.contains_key(&cluster) {
            return false;
        }
        let id = self.clusters.len() as u32;
        self.ids.insert(cluster.clone(), id);
        self.clusters.push(cluster);
        true
    }

    /// Id of `cluster`, or [`unknown_id`](Self::unknown_id) if it is absent.
    pub fn lookup(&self, cluster: &str) -> u32 {
        self.ids
            .get(cluster)
            .copied()
            .unwrap_or_else(|| self.unknown_id())
    }

    /// Map a cluster sequence to ids.
    pub fn encode<'a, I>(&self, clusters: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        clusters.into_iter().map(|c| self.lookup(c)).collect()
    }

    /// The reserved id one past the largest assigned id.
    pub fn unknown_id(&self) -> u32 {
        self.clusters.len() as u32
    }

    /// Cluster stored under `id`, if any.
    pub fn get(&self, id: u32) -> Option<&str> {
        self.clusters.get(id as usize).map(String::as_str)
    }

    /// Number of assigned entries (the unknown id is not counted).
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().map(String::as_str)
    }
}
