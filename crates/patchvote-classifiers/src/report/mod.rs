//! Evaluation output: metrics, plotly figures and the HTML report.
pub mod html;
pub mod metrics;
pub mod plots;

pub use html::{classification_report, write_classification_report, Report, ReportSection};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use plots::{plot_confusion_bars, plot_distance_histogram};
