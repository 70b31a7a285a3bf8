//! One module per pipeline stage. Each stage reads its inputs from disk,
//! runs the library code and writes or prints its results.
pub mod calibrate;
pub mod classify;
pub mod gather;
pub mod scores;
pub mod train;

use std::path::Path;

use anyhow::{Context, Result};
use patchvote_classifiers::data_handling::{Corpus, PatchSet};
use patchvote_classifiers::io::{load_corpus, load_unlabeled};

use crate::input::PipelineConfig;

pub(crate) fn load_corpus_from(dir: &Path, config: &PipelineConfig) -> Result<Corpus> {
    let corpus = load_corpus(dir, &config.runtime)
        .with_context(|| format!("Failed to load patch corpus from {}", dir.display()))?;
    corpus.log_input_data_summary();
    Ok(corpus)
}

/// Load feature files whose names carry no class prefix.
pub(crate) fn load_patches_from(dir: &Path, config: &PipelineConfig) -> Result<PatchSet> {
    let patches = load_unlabeled(dir, &config.runtime)
        .with_context(|| format!("Failed to load patches from {}", dir.display()))?;
    patches.log_input_data_summary();
    Ok(patches)
}
