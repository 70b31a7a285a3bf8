//! The patch corpus: a feature matrix with row-aligned group labels and classes.
//!
//! Rows are patches. Every row carries the label of the painting it was
//! cropped from and the ground-truth attribution class of that painting.
//! `PatchSet` is the same matrix without classes, for paintings of unknown
//! attribution.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::config::{OTHER_CLASS, TARGET_CLASS};
use crate::error::{PatchvoteError, Result};

#[derive(Debug, Clone)]
pub struct Corpus {
    pub x: Array2<f64>,
    pub labels: Vec<String>,
    pub classes: Array1<u8>,
}

impl Corpus {
    pub fn new(x: Array2<f64>, labels: Vec<String>, classes: Array1<u8>) -> Result<Self> {
        if labels.len() != x.nrows() {
            return Err(PatchvoteError::DimensionMismatch {
                context: "Group labels must align with feature rows".to_string(),
                expected: x.nrows(),
                found: labels.len(),
            });
        }
        if classes.len() != x.nrows() {
            return Err(PatchvoteError::DimensionMismatch {
                context: "Classes must align with feature rows".to_string(),
                expected: x.nrows(),
                found: classes.len(),
            });
        }
        if let Some(bad) = classes.iter().find(|&&c| c != OTHER_CLASS && c != TARGET_CLASS) {
            return Err(PatchvoteError::InvalidConfig(format!(
                "Classes must be {} or {}, found {}",
                OTHER_CLASS, TARGET_CLASS, bad
            )));
        }
        Ok(Corpus { x, labels, classes })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn class_vec(&self) -> Vec<u8> {
        self.classes.to_vec()
    }

    /// Number of patches per class, indexed by class id.
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &c in self.classes.iter() {
            counts[c as usize] += 1;
        }
        counts
    }

    pub fn log_input_data_summary(&self) {
        let [other, target] = self.class_counts();
        log::info!("----- Corpus Summary -----");
        log::info!(
            "{} target patches and {} other patches in {} groups",
            target,
            other,
            self.group_indices().len()
        );
        log::info!("Data shape: ({}, {})", self.n_samples(), self.n_features());
        log::info!("Labels shape: ({},)", self.labels.len());
        log::info!("Classes shape: ({},)", self.classes.len());
        log::debug!(
            "Data bytes: {}",
            self.x.len() * std::mem::size_of::<f64>()
        );
        log::info!("--------------------------");
    }

    /// Row indices of every group, keyed by group label in sorted order.
    pub fn group_indices(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, label) in self.labels.iter().enumerate() {
            groups.entry(label.as_str()).or_default().push(i);
        }
        groups
    }

    /// Row indices of a single group.
    pub fn indices_of(&self, label: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| if l == label { Some(i) } else { None })
            .collect()
    }

    /// Ground-truth class of a group, taken from its first patch.
    ///
    /// Groups whose patches disagree are a caller error; they are reported
    /// with a warning and resolved to the first patch's class.
    pub fn group_class(&self, indices: &[usize]) -> Option<u8> {
        let first = *indices.first()?;
        let class = self.classes[first];
        if indices.iter().any(|&i| self.classes[i] != class) {
            log::warn!(
                "Group '{}' mixes classes; using class {} of its first patch",
                self.labels[first],
                class
            );
        }
        Some(class)
    }

    pub fn select_features(&self, indices: &[usize]) -> Array2<f64> {
        self.x.select(Axis(0), indices)
    }

    /// Keep only the given rows across features, labels and classes.
    pub fn select(&self, indices: &[usize]) -> Corpus {
        Corpus {
            x: self.select_features(indices),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
            classes: self.classes.select(Axis(0), indices),
        }
    }
}

/// Patches of paintings whose attribution is unknown: features and group
/// labels only.
#[derive(Debug, Clone)]
pub struct PatchSet {
    pub x: Array2<f64>,
    pub labels: Vec<String>,
}

impl PatchSet {
    pub fn new(x: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if labels.len() != x.nrows() {
            return Err(PatchvoteError::DimensionMismatch {
                context: "Group labels must align with feature rows".to_string(),
                expected: x.nrows(),
                found: labels.len(),
            });
        }
        Ok(PatchSet { x, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn indices_of(&self, label: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| if l == label { Some(i) } else { None })
            .collect()
    }

    pub fn select_features(&self, indices: &[usize]) -> Array2<f64> {
        self.x.select(Axis(0), indices)
    }

    pub fn n_groups(&self) -> usize {
        let mut labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Patch Summary -----");
        log::info!("{} patches in {} groups", self.n_samples(), self.n_groups());
        log::info!("Data shape: ({}, {})", self.n_samples(), self.n_features());
        log::info!("-------------------------");
    }
}

impl From<Corpus> for PatchSet {
    fn from(corpus: Corpus) -> Self {
        PatchSet {
            x: corpus.x,
            labels: corpus.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn corpus() -> Corpus {
        Corpus::new(
            array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [1.1, 0.0]],
            vec![
                "vg_b".to_string(),
                "vg_b".to_string(),
                "nvg_a".to_string(),
                "vg_b".to_string(),
            ],
            array![1, 1, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_misaligned_labels() {
        let err = Corpus::new(
            array![[1.0], [2.0]],
            vec!["a".to_string()],
            array![1, 0],
        )
        .unwrap_err();
        assert!(matches!(err, PatchvoteError::DimensionMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn new_rejects_unknown_class() {
        let err = Corpus::new(array![[1.0]], vec!["a".to_string()], array![2]).unwrap_err();
        assert!(matches!(err, PatchvoteError::InvalidConfig(_)));
    }

    #[test]
    fn group_indices_are_sorted_and_complete() {
        let c = corpus();
        let groups = c.group_indices();
        let keys: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["nvg_a", "vg_b"]);
        assert_eq!(groups["vg_b"], vec![0, 1, 3]);
        assert_eq!(groups["nvg_a"], vec![2]);
    }

    #[test]
    fn select_keeps_rows_aligned() {
        let c = corpus();
        let sub = c.select(&[2, 3]);
        assert_eq!(sub.n_samples(), 2);
        assert_eq!(sub.labels, vec!["nvg_a", "vg_b"]);
        assert_eq!(sub.classes.to_vec(), vec![0, 1]);
        assert_eq!(sub.x[(1, 0)], 1.1);
    }

    #[test]
    fn class_counts_by_id() {
        assert_eq!(corpus().class_counts(), [1, 3]);
    }

    #[test]
    fn patch_set_drops_classes_but_keeps_groups() {
        let patches = PatchSet::from(corpus());
        assert_eq!(patches.n_samples(), 4);
        assert_eq!(patches.n_groups(), 2);
        assert_eq!(patches.indices_of("vg_b"), vec![0, 1, 3]);
        assert!(patches.indices_of("vg_missing").is_empty());
        assert_eq!(patches.select_features(&[2])[(0, 1)], 1.0);
    }

    #[test]
    fn patch_set_rejects_misaligned_labels() {
        let err = PatchSet::new(array![[1.0], [2.0]], vec!["a".to_string()]).unwrap_err();
        assert!(matches!(err, PatchvoteError::DimensionMismatch { expected: 2, found: 1, .. }));
    }
}
