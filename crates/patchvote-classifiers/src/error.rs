use std::error::Error;
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PatchvoteError>;

/// Errors raised by corpus loading, training, scoring and model persistence.
#[derive(Debug)]
pub enum PatchvoteError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidClassPrefix {
        file_name: String,
    },
    InvalidFeatureValue {
        path: PathBuf,
        line: usize,
        token: String,
    },
    EmptyFeatureFile(PathBuf),
    EmptyCorpus(PathBuf),
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },
    InsufficientClassSamples {
        class: u8,
        count: usize,
        folds: usize,
    },
    InvalidConfig(String),
    NotFitted(&'static str),
    EmptyGroup(String),
    ScoringModeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    UnknownGroup(String),
    Numerical(String),
    ModelFormat(String),
    Serialization(serde_json::Error),
    WorkerPool(String),
}

impl fmt::Display for PatchvoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatchvoteError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            PatchvoteError::InvalidClassPrefix { file_name } => write!(
                f,
                "Invalid class prefix in '{}'. Valid prefixes are \"{}\" and \"{}\"",
                file_name,
                crate::config::TARGET_PREFIX,
                crate::config::OTHER_PREFIX
            ),
            PatchvoteError::InvalidFeatureValue { path, line, token } => write!(
                f,
                "Non-numeric feature value '{}' in {} at line {}",
                token,
                path.display(),
                line
            ),
            PatchvoteError::EmptyFeatureFile(path) => {
                write!(f, "Feature file {} contains no rows", path.display())
            }
            PatchvoteError::EmptyCorpus(path) => {
                write!(f, "No feature files found in {}", path.display())
            }
            PatchvoteError::DimensionMismatch {
                context,
                expected,
                found,
            } => write!(
                f,
                "{}: expected {} features, found {}",
                context, expected, found
            ),
            PatchvoteError::InsufficientClassSamples {
                class,
                count,
                folds,
            } => write!(
                f,
                "Cannot build {} stratified folds: class {} has only {} samples",
                folds, class, count
            ),
            PatchvoteError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PatchvoteError::NotFitted(name) => write!(f, "Model '{}' has not been fitted", name),
            PatchvoteError::EmptyGroup(method) => {
                write!(f, "Aggregation '{}' received a group with no patches", method)
            }
            PatchvoteError::ScoringModeMismatch { expected, found } => write!(
                f,
                "Aggregation expects {} scores but received {}",
                expected, found
            ),
            PatchvoteError::UnknownGroup(label) => {
                write!(f, "Group '{}' is not present in the corpus", label)
            }
            PatchvoteError::Numerical(msg) => write!(f, "Numerical failure: {}", msg),
            PatchvoteError::ModelFormat(msg) => write!(f, "Invalid model blob: {}", msg),
            PatchvoteError::Serialization(e) => write!(f, "Serialization error: {}", e),
            PatchvoteError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
        }
    }
}

impl Error for PatchvoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PatchvoteError::Io { source, .. } => Some(source),
            PatchvoteError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PatchvoteError {
    fn from(e: serde_json::Error) -> Self {
        PatchvoteError::Serialization(e)
    }
}

impl PatchvoteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchvoteError::Io {
            path: path.into(),
            source,
        }
    }
}
