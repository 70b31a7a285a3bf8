//! Patch feature file reader.
//!
//! A corpus directory holds one file per painting (or per batch of patches).
//! Each file is a whitespace-delimited float matrix with one patch descriptor
//! per line. The filename encodes both the attribution class (`vg_` / `nvg_`
//! prefix) and the painting's group label (first two `_` tokens). Files of
//! paintings with unknown attribution carry no class prefix and are read
//! with `load_unlabeled`.
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::config::{
    RuntimeConfig, LABEL_SEPARATOR, OTHER_CLASS, OTHER_PREFIX, TARGET_CLASS, TARGET_PREFIX,
};
use crate::data_handling::{Corpus, PatchSet};
use crate::error::{PatchvoteError, Result};

/// Unit of work handed to a loader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Submission position; results are reassembled in this order.
    pub index: usize,
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug)]
struct LoadedFile {
    rows: Vec<Vec<f64>>,
    label: String,
    class: Option<u8>,
}

/// Row-aligned contents of a whole directory.
struct LoadedDir {
    x: Array2<f64>,
    labels: Vec<String>,
    classes: Vec<u8>,
}

/// Regular files of `dir`, sorted by filename.
pub fn list_feature_files<P: AsRef<Path>>(dir: P) -> Result<Vec<FileTask>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| PatchvoteError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PatchvoteError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        files.push((file_name, path));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    log::trace!(
        "Dir {} files: {:?}",
        dir.display(),
        files.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
    );

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(index, (file_name, path))| FileTask {
            index,
            path,
            file_name,
        })
        .collect())
}

/// Attribution class encoded in the filename prefix.
pub fn parse_class(file_name: &str) -> Result<u8> {
    let class = if file_name.starts_with(TARGET_PREFIX) {
        TARGET_CLASS
    } else if file_name.starts_with(OTHER_PREFIX) {
        OTHER_CLASS
    } else {
        return Err(PatchvoteError::InvalidClassPrefix {
            file_name: file_name.to_string(),
        });
    };
    log::trace!("File {} class: {}", file_name, class);
    Ok(class)
}

/// Group label: the first two `_`-separated tokens of the filename.
pub fn parse_label(file_name: &str) -> String {
    let label = file_name
        .split(LABEL_SEPARATOR)
        .take(2)
        .collect::<Vec<_>>()
        .join(&LABEL_SEPARATOR.to_string());
    log::trace!("File {} label: {}", file_name, label);
    label
}

/// Read a whitespace-delimited float matrix. Blank lines are skipped.
pub fn read_feature_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    log::trace!("Reading data from file {} ...", path.display());
    let content = fs::read_to_string(path).map_err(|e| PatchvoteError::io(path, e))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| PatchvoteError::InvalidFeatureValue {
                        path: path.to_path_buf(),
                        line: line_idx + 1,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(first) = rows.first().map(Vec::len) {
            if row.len() != first {
                return Err(PatchvoteError::DimensionMismatch {
                    context: format!("{} line {}", path.display(), line_idx + 1),
                    expected: first,
                    found: row.len(),
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PatchvoteError::EmptyFeatureFile(path.to_path_buf()));
    }
    log::trace!(
        "File {} features count: ({}, {})",
        path.display(),
        rows.len(),
        rows[0].len()
    );
    Ok(rows)
}

fn load_task(task: FileTask, read_class: bool) -> Result<LoadedFile> {
    let class = if read_class {
        Some(parse_class(&task.file_name)?)
    } else {
        None
    };
    let label = parse_label(&task.file_name);
    let rows = read_feature_file(&task.path)?;
    Ok(LoadedFile { rows, label, class })
}

fn load_dir(dir: &Path, runtime: &RuntimeConfig, read_class: bool) -> Result<LoadedDir> {
    let tasks = list_feature_files(dir)?;
    if tasks.is_empty() {
        return Err(PatchvoteError::EmptyCorpus(dir.to_path_buf()));
    }
    log::info!(
        "Loading {} feature files from {} using {} cores",
        tasks.len(),
        dir.display(),
        runtime.cores
    );

    let pool = runtime.thread_pool()?;
    let loaded: Vec<LoadedFile> = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| load_task(task, read_class))
            .collect::<Result<Vec<_>>>()
    })?;

    let n_features = loaded[0].rows[0].len();
    let n_rows: usize = loaded.iter().map(|f| f.rows.len()).sum();

    let mut data = Vec::with_capacity(n_rows * n_features);
    let mut labels = Vec::with_capacity(n_rows);
    let mut classes = Vec::with_capacity(if read_class { n_rows } else { 0 });
    for file in loaded {
        for row in file.rows {
            if row.len() != n_features {
                return Err(PatchvoteError::DimensionMismatch {
                    context: format!("Feature file for group '{}'", file.label),
                    expected: n_features,
                    found: row.len(),
                });
            }
            data.extend(row);
            labels.push(file.label.clone());
            if let Some(class) = file.class {
                classes.push(class);
            }
        }
    }

    let x = Array2::from_shape_vec((n_rows, n_features), data).map_err(|e| {
        PatchvoteError::InvalidConfig(format!("Failed to assemble feature matrix: {}", e))
    })?;
    Ok(LoadedDir { x, labels, classes })
}

/// Load every feature file of `dir` into a corpus.
///
/// Files are parsed on a pool of `runtime.cores` threads. Any failing file
/// aborts the load; a partial corpus is never returned.
pub fn load_corpus<P: AsRef<Path>>(dir: P, runtime: &RuntimeConfig) -> Result<Corpus> {
    let loaded = load_dir(dir.as_ref(), runtime, true)?;
    Corpus::new(loaded.x, loaded.labels, Array1::from_vec(loaded.classes))
}

/// Load every feature file of `dir` without reading a class from the
/// filename. Any name is accepted; the group label is still its first two
/// `_` tokens.
pub fn load_unlabeled<P: AsRef<Path>>(dir: P, runtime: &RuntimeConfig) -> Result<PatchSet> {
    let loaded = load_dir(dir.as_ref(), runtime, false)?;
    PatchSet::new(loaded.x, loaded.labels)
}

/// Newline-delimited group labels to report on. Blank lines are ignored.
pub fn read_targets<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PatchvoteError::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
