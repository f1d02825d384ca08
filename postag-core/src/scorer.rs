//! # Pontuação Log-Linear e Normalização
//!
//! Para um conjunto de features ativas, cada classe recebe
//!
//! ```text
//! score(y) = w_{y,<default>} + Σ_{f ativa} w_{y,f}
//! ```
//!
//! e a distribuição é a softmax desses scores sobre **todas** as classes do modelo,
//! mesmo quando só as N melhores são devolvidas.
//!
//! Como as features derivadas (`prevT=`, `prevTwoTags=`) variam por hipótese pai mas
//! as features da palavra não, a busca calcula o score da palavra uma vez e depois
//! estende uma cópia por pai com [`ClassScores::with_features`].

use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use crate::features::FeatureSet;
use crate::model::MaxEntModel;

/// Scores não normalizados (log-space), um por classe, na ordem do modelo.
#[derive(Debug, Clone)]
pub struct ClassScores<'m> {
    model: &'m MaxEntModel,
    active: FeatureSet,
    values: Vec<f64>,
}

/// Uma classe candidata com sua probabilidade normalizada.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    /// Índice da classe no modelo.
    pub class: usize,
    pub probability: f64,
}

/// A soma das exponenciais ficou zero ou não finita.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("soma das exponenciais degenerada: {0}")]
pub struct DegenerateSum(pub f64);

/// Calcula o score log-linear de cada classe para as features dadas.
pub fn score<'m>(features: &FeatureSet, model: &'m MaxEntModel) -> ClassScores<'m> {
    let values = (0..model.num_classes())
        .map(|idx| {
            model.default_at(idx)
                + features
                    .iter()
                    .map(|f| model.feature_weight(idx, f))
                    .sum::<f64>()
        })
        .collect();
    ClassScores {
        model,
        active: features.clone(),
        values,
    }
}

impl<'m> ClassScores<'m> {
    /// Devolve uma cópia com o peso das features extras somado.
    ///
    /// Features já ativas são ignoradas: nenhuma feature contribui duas vezes.
    pub fn with_features<'a>(&self, extra: impl IntoIterator<Item = &'a str>) -> ClassScores<'m> {
        let mut out = self.clone();
        for feature in extra {
            if !out.active.insert(feature) {
                continue;
            }
            for (idx, v) in out.values.iter_mut().enumerate() {
                *v += self.model.feature_weight(idx, feature);
            }
        }
        out
    }

    /// Score da classe `label`, se declarada.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.model.class_index(label).map(|idx| self.values[idx])
    }

    /// Pares `(rótulo, score)` na ordem do modelo.
    pub fn iter(&self) -> impl Iterator<Item = (&'m str, f64)> + '_ {
        let model = self.model;
        self.values
            .iter()
            .enumerate()
            .map(move |(idx, &v)| (model.class_label(idx), v))
    }

    pub fn model(&self) -> &'m MaxEntModel {
        self.model
    }
}

/// Aplica softmax e retorna as `limit` classes mais prováveis, em ordem decrescente.
///
/// Empates de probabilidade são resolvidos pelo rótulo: o lexicograficamente
/// **maior** vem primeiro. Os scores são deslocados pelo máximo antes da
/// exponenciação para evitar overflow.
pub fn normalize_and_rank(scores: &ClassScores<'_>, limit: usize) -> Result<Vec<Candidate>, DegenerateSum> {
    let max_score = scores.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.values.iter().map(|s| (s - max_score).exp()).collect();
    let z: f64 = exps.iter().sum();
    if !z.is_finite() || z <= 0.0 {
        return Err(DegenerateSum(z));
    }

    let mut ranked: Vec<Candidate> = exps
        .iter()
        .enumerate()
        .map(|(class, e)| Candidate {
            class,
            probability: e / z,
        })
        .collect();

    let model = scores.model;
    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
            .then_with(|| model.class_label(b.class).cmp(model.class_label(a.class)))
    });
    ranked.truncate(limit);
    Ok(ranked)
}
