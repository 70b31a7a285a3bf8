pub mod classifier_trait;
pub mod factory;
pub mod logistic;
pub mod svm;
pub mod utils;

pub use classifier_trait::ClassifierModel;
pub use factory::build_model;
pub use logistic::LogisticRegression;
pub use svm::SvmClassifier;
