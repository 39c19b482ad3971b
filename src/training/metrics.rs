//! Classification metrics for winner predictions

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::features::CategoricalEncoder;
use crate::Result;

/// Precision, recall and F1 for one predicted team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of this class
    pub support: usize,
}

/// Per-class metrics plus accuracy and averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Build a report from true and predicted codes, naming classes via `encoder`
    pub fn from_predictions(
        truth: &[u32],
        predicted: &[u32],
        encoder: &CategoricalEncoder,
    ) -> Result<Self> {
        let total = truth.len();
        let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct, total);

        // Classes present in either the truth or the predictions
        let labels: BTreeSet<u32> = truth.iter().chain(predicted).copied().collect();

        let mut classes = Vec::with_capacity(labels.len());
        for code in labels {
            let tp = truth
                .iter()
                .zip(predicted)
                .filter(|&(&t, &p)| t == code && p == code)
                .count();
            let predicted_count = predicted.iter().filter(|&&p| p == code).count();
            let support = truth.iter().filter(|&&t| t == code).count();

            let precision = ratio(tp, predicted_count);
            let recall = ratio(tp, support);
            classes.push(ClassMetrics {
                label: encoder.decode(code)?.to_string(),
                precision,
                recall,
                f1: f1(precision, recall),
                support,
            });
        }

        let macro_avg = average("macro avg", &classes, |_| 1.0, total);
        let weighted_avg = average("weighted avg", &classes, |c| c.support as f64, total);

        Ok(ClassificationReport {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
        })
    }

    pub fn total_support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn average<W: Fn(&ClassMetrics) -> f64>(
    label: &str,
    classes: &[ClassMetrics],
    weight: W,
    support: usize,
) -> ClassMetrics {
    let total_weight: f64 = classes.iter().map(&weight).sum();
    let mean = |field: fn(&ClassMetrics) -> f64| {
        if total_weight == 0.0 {
            0.0
        } else {
            classes.iter().map(|c| field(c) * weight(c)).sum::<f64>() / total_weight
        }
    };

    ClassMetrics {
        label: label.to_string(),
        precision: mean(|c| c.precision),
        recall: mean(|c| c.recall),
        f1: mean(|c| c.f1),
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain([self.weighted_avg.label.len()])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        )?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>, c: &ClassMetrics| {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label,
                c.precision,
                c.recall,
                c.f1,
                c.support,
                width = width
            )
        };

        for class in &self.classes {
            row(f, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support(),
            width = width
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> CategoricalEncoder {
        CategoricalEncoder::fit("team", [Some("CSK"), Some("MI"), Some("RCB")]).unwrap()
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = [0, 1, 1, 2];
        let report = ClassificationReport::from_predictions(&truth, &truth, &teams()).unwrap();

        assert_eq!(report.accuracy, 1.0);
        assert!(report.classes.iter().all(|c| c.f1 == 1.0));
        assert_eq!(report.total_support(), 4);
    }

    #[test]
    fn test_per_class_arithmetic() {
        // CSK: tp=1, predicted 2, support 2; MI: tp=1, predicted 2, support 2
        let truth = [0, 0, 1, 1];
        let predicted = [0, 1, 1, 0];
        let report = ClassificationReport::from_predictions(&truth, &predicted, &teams()).unwrap();

        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.classes.len(), 2);
        let csk = &report.classes[0];
        assert_eq!(csk.label, "CSK");
        assert_eq!(csk.precision, 0.5);
        assert_eq!(csk.recall, 0.5);
        assert_eq!(csk.support, 2);
        assert_eq!(report.macro_avg.f1, 0.5);
    }

    #[test]
    fn test_unpredicted_class_has_zero_precision() {
        let truth = [2, 0];
        let predicted = [0, 0];
        let report = ClassificationReport::from_predictions(&truth, &predicted, &teams()).unwrap();

        let rcb = report.classes.iter().find(|c| c.label == "RCB").unwrap();
        assert_eq!(rcb.precision, 0.0);
        assert_eq!(rcb.recall, 0.0);
        assert_eq!(rcb.f1, 0.0);
        assert_eq!(report.weighted_avg.support, 2);
    }

    #[test]
    fn test_display_lists_classes() {
        let truth = [0, 1];
        let text = ClassificationReport::from_predictions(&truth, &truth, &teams())
            .unwrap()
            .to_string();

        assert!(text.contains("precision"));
        assert!(text.contains("CSK"));
        assert!(text.contains("weighted avg"));
    }
}
