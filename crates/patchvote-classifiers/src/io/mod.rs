//! IO utilities for loading patch feature files and writing verdict tables.

pub mod feature_files;
pub mod verdicts;

pub use feature_files::{
    list_feature_files, load_corpus, load_unlabeled, parse_class, parse_label, read_feature_file,
    read_targets, FileTask,
};
pub use verdicts::write_verdicts_tsv;
