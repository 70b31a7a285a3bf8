//! Self-contained HTML evaluation report.
use std::fs;
use std::path::Path;

use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::error::{PatchvoteError, Result};
use crate::evaluate::Classification;
use crate::report::metrics::{ClassificationReport, ConfusionMatrix};
use crate::report::plots::{plot_confusion_bars, plot_distance_histogram};
use crate::trainer::TrainedModel;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let id = format!(
            "plot-{}-{}",
            self.title.to_lowercase().replace(' ', "-"),
            self.blocks.len()
        );
        self.blocks.push(PreEscaped(plot.to_inline_html(Some(&id))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    div class="block" { (block) }
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    version: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str) -> Self {
        Report {
            title: title.to_string(),
            version: version.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                         pre { background-color: #f5f5f5; padding: 10px; border-radius: 5px; }
                         table { border-collapse: collapse; }
                         td, th { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p { "patchvote " (self.version) " | generated " (generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render().into_string()).map_err(|e| PatchvoteError::io(path, e))
    }
}

fn metrics_table(report: &ClassificationReport) -> Markup {
    html! {
        table {
            tr { th { "class" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } }
            @for m in &report.per_class {
                tr {
                    td { (m.class) }
                    td { (format!("{:.2}", m.precision)) }
                    td { (format!("{:.2}", m.recall)) }
                    td { (format!("{:.2}", m.f1)) }
                    td { (m.support) }
                }
            }
        }
        p { "Accuracy: " (format!("{:.3}", report.accuracy)) }
    }
}

/// Assemble the evaluation report for one classification run.
///
/// `distances` and `classes` are the patch-level decision distances over the
/// corpus and their ground truth.
pub fn classification_report(
    classification: &Classification,
    model: &TrainedModel,
    distances: &[f64],
    classes: &[u8],
    version: &str,
) -> Result<Report> {
    let pairs = classification.rows().into_iter().map(|(_, t, v)| (t, v));
    let cm = ConfusionMatrix::from_pairs(pairs);
    let metrics = ClassificationReport::from_confusion(&cm);

    let mut report = Report::new("patchvote classification report", version);

    let mut overview = ReportSection::new("Overview");
    overview.add_content(html! {
        p {
            "Aggregation method: " b { (classification.method.to_string()) }
            ", kernel: " b { (format!("{:?}", model.kernel)) }
            ", best parameters: " code { (model.best_params.to_string()) }
            ", best CV F1: " (format!("{:.4}", model.best_score))
        }
        p {
            (classification.verdicts.len()) " groups classified, "
            (classification.failures.len()) " failed"
        }
    });
    overview.add_content(metrics_table(&metrics));
    overview.add_plot(plot_confusion_bars(&cm, "Verdicts by true class"));
    report.add_section(overview);

    let mut scores = ReportSection::new("Patch Distances");
    scores.add_content(html! { "Decision distances of every patch, split by ground truth." });
    scores.add_plot(plot_distance_histogram(distances, classes, "Patch distances")?);
    report.add_section(scores);

    let mut verdicts = ReportSection::new("Verdicts");
    verdicts.add_content(html! {
        table {
            tr { th { "group" } th { "truth" } th { "verdict" } }
            @for (label, truth, verdict) in classification.rows() {
                tr { td { (label) } td { (truth) } td { (verdict) } }
            }
        }
        @if !classification.failures.is_empty() {
            h3 { "Failures" }
            ul {
                @for failure in &classification.failures {
                    li { (failure.label) ": " (failure.cause) }
                }
            }
        }
    });
    report.add_section(verdicts);

    Ok(report)
}

pub fn write_classification_report<P: AsRef<Path>>(
    path: P,
    classification: &Classification,
    model: &TrainedModel,
    distances: &[f64],
    classes: &[u8],
    version: &str,
) -> Result<()> {
    let path = path.as_ref();
    let report = classification_report(classification, model, distances, classes, version)?;
    report.save_to_file(path)?;
    log::info!("Report saved to {}", path.display());
    Ok(())
}
