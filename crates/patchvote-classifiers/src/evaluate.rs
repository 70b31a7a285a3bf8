//! Leave-one-group-out scoring and per-painting classification.
//!
//! Each distinct group label is held out once. The held-out rows are scored
//! by an already trained model; the complementary rows form the train side
//! of the split and are exposed for inspection only.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationMethod;
use crate::config::ScoringMode;
use crate::data_handling::Corpus;
use crate::trainer::TrainedModel;

/// Scores of one group's patches, one entry per patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupScores {
    /// Hard class labels.
    Labels(Vec<u8>),
    /// Signed decision distances.
    Distances(Vec<f64>),
}

impl GroupScores {
    pub fn len(&self) -> usize {
        match self {
            GroupScores::Labels(v) => v.len(),
            GroupScores::Distances(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GroupScores::Labels(_) => "labels",
            GroupScores::Distances(_) => "distances",
        }
    }
}

/// Held-out group and the complementary training rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSplit {
    pub label: String,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// One split per distinct group label, in sorted label order.
pub fn leave_one_group_out_splits(corpus: &Corpus) -> Vec<GroupSplit> {
    let n = corpus.n_samples();
    corpus
        .group_indices()
        .into_iter()
        .map(|(label, test)| {
            let mut held_out = vec![false; n];
            for &i in &test {
                held_out[i] = true;
            }
            GroupSplit {
                label: label.to_string(),
                train: (0..n).filter(|&i| !held_out[i]).collect(),
                test,
            }
        })
        .collect()
}

/// A group that could not be scored or aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub label: String,
    pub cause: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub scores: BTreeMap<String, GroupScores>,
    pub failures: Vec<GroupFailure>,
}

pub struct LeaveOneGroupOut<'a> {
    model: &'a TrainedModel,
    mode: ScoringMode,
}

impl<'a> LeaveOneGroupOut<'a> {
    pub fn new(model: &'a TrainedModel, mode: ScoringMode) -> Self {
        LeaveOneGroupOut { model, mode }
    }

    /// Score every group of `corpus` exactly once.
    ///
    /// A group that fails to score is recorded and the remaining groups are
    /// still evaluated.
    pub fn evaluate(&self, corpus: &Corpus) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        for split in leave_one_group_out_splits(corpus) {
            log::trace!(
                "Scoring group {} ({} patches, {} outside the group)",
                split.label,
                split.test.len(),
                split.train.len()
            );
            let x_test = corpus.select_features(&split.test);
            match self.model.score(x_test.view(), self.mode) {
                Ok(scores) => {
                    report.scores.insert(split.label, scores);
                }
                Err(e) => {
                    log::warn!("Failed to score group {}: {}", split.label, e);
                    report.failures.push(GroupFailure {
                        label: split.label,
                        cause: e.to_string(),
                    });
                }
            }
        }
        log::info!(
            "Scored {} groups ({} failed)",
            report.scores.len(),
            report.failures.len()
        );
        report
    }
}

/// Per-group verdicts next to their ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub method: AggregationMethod,
    pub verdicts: BTreeMap<String, u8>,
    pub truths: BTreeMap<String, u8>,
    pub failures: Vec<GroupFailure>,
}

impl Classification {
    /// `(label, truth, verdict)` for every classified group, in label order.
    pub fn rows(&self) -> Vec<(&str, u8, u8)> {
        self.verdicts
            .iter()
            .filter_map(|(label, &verdict)| {
                self.truths
                    .get(label)
                    .map(|&truth| (label.as_str(), truth, verdict))
            })
            .collect()
    }

    pub fn accuracy(&self) -> f64 {
        let rows = self.rows();
        if rows.is_empty() {
            return 0.0;
        }
        let hits = rows.iter().filter(|(_, t, v)| t == v).count();
        hits as f64 / rows.len() as f64
    }
}

/// Leave-one-group-out scoring followed by aggregation.
pub fn classify(
    model: &TrainedModel,
    corpus: &Corpus,
    method: AggregationMethod,
) -> Classification {
    let report = LeaveOneGroupOut::new(model, method.scoring_mode()).evaluate(corpus);
    aggregate_report(report, corpus, method, model.classes)
}

/// Fold the scores of every group in `report` into one verdict.
///
/// Groups that cannot be aggregated join the report's failures; every other
/// group still receives its verdict. Ground truth is taken from `corpus`.
pub fn aggregate_report(
    report: EvaluationReport,
    corpus: &Corpus,
    method: AggregationMethod,
    classes: [u8; 2],
) -> Classification {
    let groups = corpus.group_indices();

    let mut verdicts = BTreeMap::new();
    let mut truths = BTreeMap::new();
    let mut failures = report.failures;
    for (label, scores) in report.scores {
        let truth = groups.get(label.as_str()).and_then(|idx| corpus.group_class(idx));
        match method.aggregate(&scores, classes) {
            Ok(verdict) => {
                log::debug!("{} -> {} ({} patches)", label, verdict, scores.len());
                if let Some(truth) = truth {
                    truths.insert(label.clone(), truth);
                }
                verdicts.insert(label, verdict);
            }
            Err(e) => {
                log::warn!("Failed to aggregate group {}: {}", label, e);
                failures.push(GroupFailure {
                    label,
                    cause: e.to_string(),
                })
            }
        }
    }

    Classification {
        method,
        verdicts,
        truths,
        failures,
    }
}
