//! Confusion matrix and per-class precision / recall / F1 over verdicts.
use std::fmt;

use serde::Serialize;

use crate::config::CLASSES;

/// Rows are true classes, columns predicted classes, both in class-id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut counts = [[0usize; 2]; 2];
        for (truth, predicted) in pairs {
            counts[class_index(truth)][class_index(predicted)] += 1;
        }
        ConfusionMatrix { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.counts[0][0] + self.counts[1][1]) as f64 / total as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:>10} {:>8} {:>8}", "true\\pred", CLASSES[0], CLASSES[1])?;
        for (i, row) in self.counts.iter().enumerate() {
            writeln!(f, "{:>10} {:>8} {:>8}", CLASSES[i], row[0], row[1])?;
        }
        Ok(())
    }
}

fn class_index(class: u8) -> usize {
    if class == CLASSES[1] {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let per_class: Vec<ClassMetrics> = (0..2)
            .map(|k| {
                let tp = cm.counts[k][k];
                let predicted = cm.counts[0][k] + cm.counts[1][k];
                let support = cm.counts[k][0] + cm.counts[k][1];
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                ClassMetrics {
                    class: CLASSES[k],
                    precision,
                    recall,
                    f1: harmonic(precision, recall),
                    support,
                }
            })
            .collect();

        let macro_avg = averaged(&per_class, [1.0, 1.0]);
        let weighted_avg = averaged(
            &per_class,
            [per_class[0].support as f64, per_class[1].support as f64],
        );

        ClassificationReport {
            per_class,
            accuracy: cm.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

fn averaged(per_class: &[ClassMetrics], weights: [f64; 2]) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let avg = |value: fn(&ClassMetrics) -> f64| {
        if norm == 0.0 {
            0.0
        } else {
            per_class
                .iter()
                .zip(weights)
                .map(|(m, w)| w * value(m))
                .sum::<f64>()
                / norm
        }
    };
    ClassMetrics {
        class: u8::MAX,
        precision: avg(|m| m.precision),
        recall: avg(|m| m.recall),
        f1: avg(|m| m.f1),
        support: per_class.iter().map(|m| m.support).sum(),
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn harmonic(p: f64, r: f64) -> f64 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.class, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
