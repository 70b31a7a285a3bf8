use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use super::load_corpus_from;
use crate::input::PipelineConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub n_patches: usize,
    pub n_features: usize,
    pub n_groups: usize,
    pub target_patches: usize,
    pub other_patches: usize,
}

/// Load the corpus and report its shape.
pub fn run_gather(dir: &Path, config: &PipelineConfig) -> Result<CorpusSummary> {
    let corpus = load_corpus_from(dir, config)?;
    let [other, target] = corpus.class_counts();
    let summary = CorpusSummary {
        n_patches: corpus.n_samples(),
        n_features: corpus.n_features(),
        n_groups: corpus.group_indices().len(),
        target_patches: target,
        other_patches: other,
    };

    println!("patches\t{}", summary.n_patches);
    println!("features\t{}", summary.n_features);
    println!("groups\t{}", summary.n_groups);
    println!("class 1\t{}", summary.target_patches);
    println!("class 0\t{}", summary.other_patches);
    Ok(summary)
}
