//! Fold a group's patch scores into one verdict.
//!
//! `mode` votes over hard labels. The distance policies split the signed
//! distances into a positive side (scores >= 0) and a negative side
//! (scores <= 0, taken as magnitudes); an exact zero sits on both sides.
//! Every comparison is strict, so ties resolve to the negative class.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::config::ScoringMode;
use crate::error::{PatchvoteError, Result};
use crate::evaluate::GroupScores;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    Mode,
    Sum,
    Far,
    Mean,
    Median,
}

impl AggregationMethod {
    pub const ALL: [AggregationMethod; 5] = [
        AggregationMethod::Mode,
        AggregationMethod::Sum,
        AggregationMethod::Far,
        AggregationMethod::Mean,
        AggregationMethod::Median,
    ];

    /// Kind of patch scores the method consumes.
    pub fn scoring_mode(&self) -> ScoringMode {
        match self {
            AggregationMethod::Mode => ScoringMode::Predict,
            _ => ScoringMode::DecisionFunction,
        }
    }

    /// Verdict for one group, `classes` ordered negative first.
    pub fn aggregate(&self, scores: &GroupScores, classes: [u8; 2]) -> Result<u8> {
        match (self, scores) {
            (AggregationMethod::Mode, GroupScores::Labels(labels)) => aggregate_mode(labels),
            (AggregationMethod::Sum, GroupScores::Distances(d)) => Ok(aggregate_sum(d, classes)),
            (AggregationMethod::Far, GroupScores::Distances(d)) => Ok(aggregate_far(d, classes)),
            (AggregationMethod::Mean, GroupScores::Distances(d)) => Ok(aggregate_mean(d, classes)),
            (AggregationMethod::Median, GroupScores::Distances(d)) => {
                Ok(aggregate_median(d, classes))
            }
            (method, found) => Err(PatchvoteError::ScoringModeMismatch {
                expected: method.score_kind(),
                found: found.kind(),
            }),
        }
    }

    fn score_kind(&self) -> &'static str {
        match self.scoring_mode() {
            ScoringMode::Predict => "labels",
            ScoringMode::DecisionFunction => "distances",
        }
    }
}

impl FromStr for AggregationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mode" => Ok(AggregationMethod::Mode),
            "sum" => Ok(AggregationMethod::Sum),
            "far" => Ok(AggregationMethod::Far),
            "mean" => Ok(AggregationMethod::Mean),
            "median" => Ok(AggregationMethod::Median),
            _ => Err(format!(
                "Unknown aggregation method: {}. Valid options are: mode, sum, far, mean, median",
                s
            )),
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AggregationMethod::Mode => "mode",
            AggregationMethod::Sum => "sum",
            AggregationMethod::Far => "far",
            AggregationMethod::Mean => "mean",
            AggregationMethod::Median => "median",
        };
        write!(f, "{}", name)
    }
}

/// Most frequent label; ties go to the lowest label.
pub fn aggregate_mode(labels: &[u8]) -> Result<u8> {
    let mut counts = [0usize; 256];
    for &label in labels {
        counts[label as usize] += 1;
    }
    let mut best: Option<(u8, usize)> = None;
    for (label, &count) in counts.iter().enumerate() {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((label as u8, count));
        }
    }
    best.map(|(label, _)| label)
        .ok_or_else(|| PatchvoteError::EmptyGroup("mode".to_string()))
}

/// Positive when the distances sum to more than zero.
pub fn aggregate_sum(distances: &[f64], classes: [u8; 2]) -> u8 {
    pick(distances.iter().sum::<f64>() > 0.0, classes)
}

/// Positive when the farthest positive patch beats the farthest negative one.
pub fn aggregate_far(distances: &[f64], classes: [u8; 2]) -> u8 {
    let (pos, neg) = split_sides(distances);
    let far = |side: &[f64]| side.iter().copied().fold(0.0f64, f64::max);
    pick(far(&pos) > far(&neg), classes)
}

pub fn aggregate_mean(distances: &[f64], classes: [u8; 2]) -> u8 {
    let (pos, neg) = split_sides(distances);
    pick(side_mean(&pos) > side_mean(&neg), classes)
}

pub fn aggregate_median(distances: &[f64], classes: [u8; 2]) -> u8 {
    let (pos, neg) = split_sides(distances);
    pick(side_median(pos) > side_median(neg), classes)
}

/// Positive side and absolute negative side; zero lands in both.
fn split_sides(distances: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let pos = distances.iter().copied().filter(|&d| d >= 0.0).collect();
    let neg = distances
        .iter()
        .copied()
        .filter(|&d| d <= 0.0)
        .map(f64::abs)
        .collect();
    (pos, neg)
}

fn side_mean(side: &[f64]) -> f64 {
    if side.is_empty() {
        0.0
    } else {
        side.mean()
    }
}

fn side_median(side: Vec<f64>) -> f64 {
    if side.is_empty() {
        0.0
    } else {
        Data::new(side).median()
    }
}

#[inline]
fn pick(positive: bool, classes: [u8; 2]) -> u8 {
    if positive {
        classes[1]
    } else {
        classes[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CLASSES;

    #[test]
    fn mode_picks_majority() {
        assert_eq!(aggregate_mode(&[1, 1, 0]).unwrap(), 1);
        assert_eq!(aggregate_mode(&[0, 1, 0, 0]).unwrap(), 0);
    }

    #[test]
    fn mode_of_empty_group_is_an_error() {
        assert!(matches!(aggregate_mode(&[]), Err(PatchvoteError::EmptyGroup(_))));
    }

    #[test]
    fn all_positive_distances_are_positive() {
        let d = [0.2, 0.5, 0.1];
        assert_eq!(aggregate_far(&d, CLASSES), 1);
        assert_eq!(aggregate_mean(&d, CLASSES), 1);
        assert_eq!(aggregate_median(&d, CLASSES), 1);
        assert_eq!(aggregate_sum(&d, CLASSES), 1);
    }

    #[test]
    fn zero_sum_is_negative() {
        assert_eq!(aggregate_sum(&[0.5, -0.5], CLASSES), 0);
        assert_eq!(aggregate_sum(&[0.0], CLASSES), 0);
    }

    #[test]
    fn far_compares_extremes() {
        // Mostly negative, one strong positive patch.
        let d = [-0.1, -0.2, -0.3, 0.9];
        assert_eq!(aggregate_far(&d, CLASSES), 1);
        assert_eq!(aggregate_mean(&d, CLASSES), 1);
        assert_eq!(aggregate_sum(&d, CLASSES), 1);
        assert_eq!(aggregate_far(&[-0.9, 0.3], CLASSES), 0);
    }

    #[test]
    fn median_uses_each_side_separately() {
        // pos median 0.2, neg median 0.5
        let d = [0.1, 0.2, 3.0, -0.5, -0.4, -0.6];
        assert_eq!(aggregate_median(&d, CLASSES), 0);
        // sum and mean see the single large positive
        assert_eq!(aggregate_sum(&d, CLASSES), 1);
        assert_eq!(aggregate_mean(&d, CLASSES), 1);
    }

    #[test]
    fn zero_sits_on_both_sides() {
        // neg side = [0.0], pos side = [0.0]; equal extremes tie to negative.
        assert_eq!(aggregate_far(&[0.0], CLASSES), 0);
        assert_eq!(aggregate_mean(&[0.0], CLASSES), 0);
        assert_eq!(aggregate_median(&[0.0], CLASSES), 0);
        // pos = [0.0, 0.25] -> 0.125, neg = [0.0, 0.2] -> 0.1
        assert_eq!(aggregate_mean(&[0.0, -0.2, 0.25], CLASSES), 1);
    }

    #[test]
    fn empty_distances_are_negative() {
        for method in AggregationMethod::ALL.iter().skip(1) {
            let verdict = method
                .aggregate(&GroupScores::Distances(Vec::new()), CLASSES)
                .unwrap();
            assert_eq!(verdict, 0);
        }
    }

    #[test]
    fn mismatched_score_kind_is_rejected() {
        let err = AggregationMethod::Mode
            .aggregate(&GroupScores::Distances(vec![0.3]), CLASSES)
            .unwrap_err();
        assert!(matches!(
            err,
            PatchvoteError::ScoringModeMismatch {
                expected: "labels",
                found: "distances"
            }
        ));
        assert!(AggregationMethod::Far
            .aggregate(&GroupScores::Labels(vec![1]), CLASSES)
            .is_err());
    }

    #[test]
    fn methods_declare_their_scoring_mode() {
        assert_eq!(AggregationMethod::Mode.scoring_mode(), ScoringMode::Predict);
        for method in &AggregationMethod::ALL[1..] {
            assert_eq!(method.scoring_mode(), ScoringMode::DecisionFunction);
        }
    }

    #[test]
    fn parses_and_displays_names() {
        for method in AggregationMethod::ALL {
            let parsed: AggregationMethod = method.to_string().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert!("vote".parse::<AggregationMethod>().is_err());
    }
}
