//! Acurácia por palavra (micro-média sobre todas as sentenças).

use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Accuracy {
    /// Palavras cuja tag prevista é igual à de referência.
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    pub fn accumulate(&mut self, true_tag: &str, predicted_tag: &str) {
        if true_tag == predicted_tag {
            self.correct += 1;
        }
        self.total += 1;
    }

    /// Fração de acertos; `0.0` quando nada foi avaliado.
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

impl Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} => {}", self.correct, self.total, self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let mut acc = Accuracy::default();
        assert_eq!(acc.value(), 0.0);
        acc.accumulate("NN", "NN");
        acc.accumulate("VB", "NN");
        acc.accumulate("DT", "DT");
        acc.accumulate("JJ", "JJ");
        assert_eq!(acc.correct, 3);
        assert!((acc.value() - 0.75).abs() < 1e-12);
        assert_eq!(acc.to_string(), "3/4 => 0.75");
    }
}
