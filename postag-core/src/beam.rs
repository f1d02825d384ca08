//! # Busca em Feixe (Beam Search) sobre a Treliça de Tags
//!
//! Diferente do Viterbi, que explora todas as `T²` transições em cada posição, aqui
//! mantemos apenas um subconjunto podado de hipóteses por posição. Perde-se a
//! garantia de ótimo global em troca de uma largura de busca limitada.
//!
//! ## Algoritmo
//!
//! ```text
//! Posição 0:  features(w_0) + {prevT=BOS, prevTwoTags=BOS+BOS}
//!             → top_n classes → hipóteses filhas da raiz BOS → filtro de feixe
//!
//! Posição i:  para cada hipótese h do nível i-1:
//!                 features(w_i) + {prevT=h.tag, prevTwoTags=h.pai.tag+h.tag}
//!                 → top_n classes → filhas com p_caminho = p_local × h.p_caminho
//!             junta todas as filhas → filtro de feixe → filtro top_k
//!
//! Fim:        melhor hipótese do último nível → segue os ponteiros até a raiz
//! ```
//!
//! ## Poda
//!
//! 1. **Feixe**: mantém `h` se `log10(p(h)) >= log10(p_melhor) - beam_size`.
//! 2. **Top-K**: dos sobreviventes, mantém os `top_k` de maior `p(h)`. A ordenação é
//!    estável, então empates mantêm a ordem de descoberta (ordem do pai no nível
//!    anterior, depois posição da classe no ranking). Não é aplicado na posição 0.
//!
//! ## Representação
//!
//! Cada nível é um vetor (arena) e o pai de uma hipótese é um índice no nível anterior.
//! `parent = None` representa a raiz sintética BOS, compartilhada por todo o nível 0.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::DecoderConfig;
use crate::corpus::Sentence;
use crate::error::DecodeError;
use crate::features::{prev_tag_feature, prev_two_tags_feature, BOS};
use crate::model::MaxEntModel;
use crate::scorer::{self, ClassScores};

/// Uma tag candidata para a palavra de uma posição.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hypothesis {
    /// Índice da classe no modelo.
    pub tag: usize,
    /// P(tag | palavra, contexto) nesta posição.
    pub local_probability: f64,
    /// Produto das probabilidades locais desde o início da sentença.
    pub path_probability: f64,
    /// Índice do pai no nível anterior; `None` é a raiz BOS.
    pub parent: Option<usize>,
}

/// Hipóteses sobreviventes de uma posição.
pub type Level = Vec<Hypothesis>;

/// Floresta de hipóteses, um nível por posição da sentença.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trellis {
    levels: Vec<Level>,
}

impl Trellis {
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Tag da hipótese pai, ou [`BOS`] quando o pai é a raiz.
    fn parent_tag<'m>(&self, model: &'m MaxEntModel, position: usize, parent: Option<usize>) -> &'m str {
        match parent {
            Some(idx) => model.class_label(self.levels[position - 1][idx].tag),
            None => BOS,
        }
    }

    /// Índices `(posição, hipótese)` do caminho que termina em `terminal` no último nível,
    /// da esquerda para a direita.
    pub fn backtrace(&self, terminal: usize) -> Vec<(usize, usize)> {
        let mut path = Vec::with_capacity(self.levels.len());
        let mut cursor = Some(terminal);
        let mut position = self.levels.len();
        while let Some(idx) = cursor {
            position -= 1;
            path.push((position, idx));
            cursor = self.levels[position][idx].parent;
        }
        path.reverse();
        path
    }
}

/// Estatísticas de poda de uma posição (para inspeção e logs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeamStep {
    pub position: usize,
    /// Filhas geradas antes de qualquer poda.
    pub pooled: usize,
    /// Sobreviventes do filtro de feixe.
    pub after_beam: usize,
    /// Sobreviventes do filtro top-k (igual a `after_beam` na posição 0).
    pub kept: usize,
    pub best_path_probability: f64,
}

/// Uma palavra do melhor caminho.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEntry {
    pub word: String,
    pub tag: String,
    pub local_probability: f64,
}

/// Resultado da decodificação de uma sentença.
#[derive(Debug, Clone, Serialize)]
pub struct BeamResult {
    /// Melhor caminho, uma entrada por palavra, da esquerda para a direita.
    pub path: Vec<PathEntry>,
    pub path_probability: f64,
    pub steps: Vec<BeamStep>,
    pub trellis: Trellis,
}

/// Motor de busca em feixe. Só lê o modelo, então pode ser usado por várias threads.
pub struct BeamSearch<'m> {
    model: &'m MaxEntModel,
    config: DecoderConfig,
}

impl<'m> BeamSearch<'m> {
    pub fn new(model: &'m MaxEntModel, config: &DecoderConfig) -> Self {
        Self {
            model,
            config: *config,
        }
    }

    /// Decodifica a sequência de tags mais provável (dentro do feixe) para a sentença.
    ///
    /// # Erros
    /// - [`DecodeError::EmptyBeam`] se a poda elimina todos os candidatos de uma posição.
    /// - [`DecodeError::DegenerateModel`] se a softmax não pode ser normalizada.
    pub fn decode(&self, sentence: &Sentence) -> Result<BeamResult, DecodeError> {
        let mut trellis = Trellis::default();
        let mut steps = Vec::with_capacity(sentence.words.len());
        if sentence.words.is_empty() {
            return Ok(BeamResult {
                path: vec![],
                path_probability: 1.0,
                steps,
                trellis,
            });
        }

        // === Posição 0: filhas da raiz BOS ===
        let first = &sentence.words[0];
        let scores = scorer::score(&first.features, self.model).with_features([
            prev_tag_feature(BOS).as_str(),
            prev_two_tags_feature(BOS, BOS).as_str(),
        ]);
        let pooled: Vec<Hypothesis> = self
            .rank(&scores, sentence.index, 0)?
            .into_iter()
            .map(|c| Hypothesis {
                tag: c.class,
                local_probability: c.probability,
                path_probability: c.probability,
                parent: None,
            })
            .collect();
        let (level, step) = self.prune(pooled, sentence.index, 0, false)?;
        steps.push(step);
        trellis.levels.push(level);

        // === Posições 1..N-1 ===
        for position in 1..sentence.words.len() {
            let word = &sentence.words[position];
            // Features da palavra são as mesmas para todos os pais
            let base = scorer::score(&word.features, self.model);
            let prev_level = &trellis.levels[position - 1];

            let mut pooled = Vec::with_capacity(prev_level.len() * self.config.top_n.min(self.model.num_classes()));
            for (parent_idx, parent) in prev_level.iter().enumerate() {
                let prev_tag = self.model.class_label(parent.tag);
                let prev2_tag = trellis.parent_tag(self.model, position - 1, parent.parent);
                let scores = base.with_features([
                    prev_tag_feature(prev_tag).as_str(),
                    prev_two_tags_feature(prev2_tag, prev_tag).as_str(),
                ]);

                for c in self.rank(&scores, sentence.index, position)? {
                    pooled.push(Hypothesis {
                        tag: c.class,
                        local_probability: c.probability,
                        path_probability: c.probability * parent.path_probability,
                        parent: Some(parent_idx),
                    });
                }
            }

            let (level, step) = self.prune(pooled, sentence.index, position, true)?;
            steps.push(step);
            trellis.levels.push(level);
        }

        // === Melhor terminal + backtrace ===
        let last = trellis.levels.len() - 1;
        let terminal = best_in_level(&trellis.levels[last]).ok_or(DecodeError::EmptyBeam {
            sentence: sentence.index,
            position: last,
        })?;
        let path_probability = trellis.levels[last][terminal].path_probability;
        let path = trellis
            .backtrace(terminal)
            .into_iter()
            .map(|(position, idx)| {
                let h = &trellis.levels[position][idx];
                PathEntry {
                    word: sentence.words[position].word.clone(),
                    tag: self.model.class_label(h.tag).to_string(),
                    local_probability: h.local_probability,
                }
            })
            .collect();

        Ok(BeamResult {
            path,
            path_probability,
            steps,
            trellis,
        })
    }

    fn rank(&self, scores: &ClassScores<'_>, sentence: usize, position: usize) -> Result<Vec<scorer::Candidate>, DecodeError> {
        scorer::normalize_and_rank(scores, self.config.top_n).map_err(|e| DecodeError::DegenerateModel {
            sentence,
            position,
            sum: e.0,
        })
    }

    fn prune(&self, pooled: Vec<Hypothesis>, sentence: usize, position: usize, apply_top_k: bool) -> Result<(Level, BeamStep), DecodeError> {
        if pooled.is_empty() {
            return Err(DecodeError::EmptyBeam { sentence, position });
        }
        let n_pooled = pooled.len();
        let best_path_probability = max_path_probability(&pooled);

        let mut level = beam_filter(pooled, self.config.beam_size);
        let after_beam = level.len();
        if apply_top_k {
            top_k_filter(&mut level, self.config.top_k);
        }
        if level.is_empty() {
            return Err(DecodeError::EmptyBeam { sentence, position });
        }

        let step = BeamStep {
            position,
            pooled: n_pooled,
            after_beam,
            kept: level.len(),
            best_path_probability,
        };
        tracing::trace!(
            sentence,
            position,
            pooled = step.pooled,
            after_beam = step.after_beam,
            kept = step.kept,
            "nível da treliça podado"
        );
        Ok((level, step))
    }
}

fn max_path_probability(hyps: &[Hypothesis]) -> f64 {
    hyps.iter().map(|h| h.path_probability).fold(0.0, f64::max)
}

/// Mantém as hipóteses dentro de `beam_size` (em log10) do melhor caminho.
pub fn beam_filter(hyps: Vec<Hypothesis>, beam_size: f64) -> Vec<Hypothesis> {
    let threshold = max_path_probability(&hyps).log10() - beam_size;
    hyps.into_iter()
        .filter(|h| h.path_probability.log10() >= threshold)
        .collect()
}

/// Mantém os `top_k` caminhos mais prováveis. Ordenação estável: empates preservam a ordem de entrada.
pub fn top_k_filter(hyps: &mut Vec<Hypothesis>, top_k: usize) {
    hyps.sort_by(|a, b| {
        b.path_probability
            .partial_cmp(&a.path_probability)
            .unwrap_or(Ordering::Equal)
    });
    hyps.truncate(top_k);
}

/// Índice da hipótese de maior probabilidade de caminho (a primeira, em caso de empate).
fn best_in_level(level: &[Hypothesis]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, h) in level.iter().enumerate() {
        match best {
            Some((_, p)) if h.path_probability <= p => {}
            _ => best = Some((i, h.path_probability)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::WordRecord;

    fn word(w: &str, feats: &[&str]) -> WordRecord {
        WordRecord {
            word: w.to_string(),
            true_tag: "?".to_string(),
            features: feats.iter().copied().collect(),
        }
    }

    fn sentence(words: Vec<WordRecord>) -> Sentence {
        Sentence { index: 0, words }
    }

    fn hyp(path_probability: f64) -> Hypothesis {
        Hypothesis {
            tag: 0,
            local_probability: path_probability,
            path_probability,
            parent: None,
        }
    }

    /// Modelo pequeno com preferências léxicas e de transição.
    fn toy_model() -> MaxEntModel {
        let mut model = MaxEntModel::new();
        model.add_class("DT", 0.2);
        model.add_class("NN", 0.5);
        model.add_class("VB", 0.1);
        model.add_class("JJ", 0.0);
        let w = [
            ("DT", "curW=the", 3.0),
            ("NN", "curW=dog", 2.0),
            ("VB", "curW=dog", 1.6),
            ("NN", "curW=runs", 1.0),
            ("VB", "curW=runs", 1.8),
            ("JJ", "curW=fast", 1.5),
            ("NN", "prevT=DT", 1.5),
            ("JJ", "prevT=DT", 0.8),
            ("VB", "prevT=NN", 1.2),
            ("DT", "prevT=BOS", 0.5),
            ("JJ", "prevTwoTags=NN+VB", 0.9),
            ("NN", "prevTwoTags=BOS+DT", 0.3),
        ];
        for (tag, feat, weight) in w {
            model.set_weight(tag, feat, weight).unwrap();
        }
        model
    }

    fn toy_sentence() -> Sentence {
        sentence(vec![
            word("the", &["curW=the"]),
            word("dog", &["curW=dog", "prevW=the"]),
            word("runs", &["curW=runs"]),
            word("fast", &["curW=fast"]),
        ])
    }

    #[test]
    fn test_two_class_single_word() {
        let mut model = MaxEntModel::new();
        model.add_class("A", 0.0);
        model.add_class("B", 1.0);
        let config = DecoderConfig::new(10.0, 2, 2);
        let result = BeamSearch::new(&model, &config)
            .decode(&sentence(vec![word("w", &["curW=w"])]))
            .unwrap();

        let e = std::f64::consts::E;
        assert_eq!(result.path.len(), 1);
        assert_eq!(result.path[0].tag, "B");
        assert!((result.path[0].local_probability - e / (e + 1.0)).abs() < 1e-12);
        // Os dois candidatos sobrevivem no nível 0
        assert_eq!(result.trellis.levels()[0].len(), 2);
        let p_a = result.trellis.levels()[0][1].local_probability;
        assert!((p_a - 1.0 / (e + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_single_word_uses_level_zero() {
        let model = toy_model();
        let config = DecoderConfig::new(2.0, 3, 1);
        let result = BeamSearch::new(&model, &config)
            .decode(&sentence(vec![word("the", &["curW=the"])]))
            .unwrap();
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.trellis.len(), 1);
        // top_k = 1 não se aplica à posição 0
        assert_eq!(result.steps[0].kept, result.steps[0].after_beam);
        assert!(result.trellis.levels()[0].len() > 1);
        assert_eq!(result.path[0].tag, "DT");
    }

    #[test]
    fn test_path_probability_invariant() {
        let model = toy_model();
        let config = DecoderConfig::new(5.0, 4, 6);
        let result = BeamSearch::new(&model, &config).decode(&toy_sentence()).unwrap();
        let levels = result.trellis.levels();
        for (position, level) in levels.iter().enumerate() {
            for h in level {
                let parent_prob = match h.parent {
                    Some(p) => levels[position - 1][p].path_probability,
                    None => {
                        assert_eq!(position, 0);
                        1.0
                    }
                };
                assert!((h.path_probability - h.local_probability * parent_prob).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_backtrace_preserves_word_order() {
        let model = toy_model();
        let config = DecoderConfig::new(3.0, 3, 4);
        let s = toy_sentence();
        let result = BeamSearch::new(&model, &config).decode(&s).unwrap();
        assert_eq!(result.path.len(), s.words.len());
        let words: Vec<&str> = result.path.iter().map(|p| p.word.as_str()).collect();
        assert_eq!(words, vec!["the", "dog", "runs", "fast"]);
        let tags: Vec<&str> = result.path.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags[0], "DT");
        assert_eq!(tags[1], "NN");
        // Probabilidade do caminho é o produto das locais
        let product: f64 = result.path.iter().map(|p| p.local_probability).product();
        assert!((product - result.path_probability).abs() < 1e-12);
    }

    #[test]
    fn test_top_n_one_is_greedy() {
        let model = toy_model();
        let s = toy_sentence();

        // Decodificação gulosa feita à mão: argmax em cada posição
        let mut greedy: Vec<String> = Vec::new();
        for (i, w) in s.words.iter().enumerate() {
            let prev = if i >= 1 { greedy[i - 1].as_str() } else { BOS };
            let prev2 = if i >= 2 { greedy[i - 2].as_str() } else { BOS };
            let scores = scorer::score(&w.features, &model)
                .with_features([prev_tag_feature(prev).as_str(), prev_two_tags_feature(prev2, prev).as_str()]);
            let top = scorer::normalize_and_rank(&scores, 1).unwrap();
            greedy.push(model.class_label(top[0].class).to_string());
        }

        for (beam, k) in [(0.0, 1), (1.0, 3), (10.0, 50)] {
            let config = DecoderConfig::new(beam, 1, k);
            let result = BeamSearch::new(&model, &config).decode(&s).unwrap();
            let tags: Vec<String> = result.path.iter().map(|p| p.tag.clone()).collect();
            assert_eq!(tags, greedy);
            assert!(result.trellis.levels().iter().all(|l| l.len() == 1));
        }
    }

    #[test]
    fn test_zero_beam_keeps_only_ties() {
        let mut model = MaxEntModel::new();
        model.add_class("X", 1.0);
        model.add_class("Y", 1.0);
        model.add_class("Z", 0.0);
        let config = DecoderConfig::new(0.0, 3, 10);
        let s = sentence(vec![word("a", &[]), word("b", &[])]);
        let result = BeamSearch::new(&model, &config).decode(&s).unwrap();

        let sizes: Vec<usize> = result.trellis.levels().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 4]);
        for level in result.trellis.levels() {
            assert!(level.iter().all(|h| model.class_label(h.tag) != "Z"));
        }
    }

    #[test]
    fn test_beam_prunes_by_log10_margin() {
        let pooled = vec![hyp(0.5), hyp(0.06), hyp(0.04), hyp(0.004)];
        // 0.5 / 10 = 0.05: só 0.5 e 0.06 ficam com margem 1
        assert_eq!(beam_filter(pooled.clone(), 1.0).len(), 2);
        assert_eq!(beam_filter(pooled.clone(), 2.0).len(), 3);
        assert_eq!(beam_filter(pooled, 0.0).len(), 1);
    }

    #[test]
    fn test_pruning_is_monotonic() {
        let pooled: Vec<Hypothesis> = [0.3, 0.2, 0.2, 0.1, 0.05, 0.01, 0.001, 0.0001]
            .iter()
            .map(|&p| hyp(p))
            .collect();

        let mut prev = 0;
        for beam in [0.0, 0.25, 0.5, 1.0, 2.0, 3.0, 10.0] {
            let n = beam_filter(pooled.clone(), beam).len();
            assert!(n >= prev);
            prev = n;
        }

        let mut prev = usize::MAX;
        for k in (1..=10).rev() {
            let mut level = pooled.clone();
            top_k_filter(&mut level, k);
            assert!(level.len() <= prev);
            prev = level.len();
        }
    }

    #[test]
    fn test_top_k_ties_keep_discovery_order() {
        let mut level: Vec<Hypothesis> = (0..4)
            .map(|i| Hypothesis {
                tag: i,
                local_probability: 0.25,
                path_probability: 0.25,
                parent: Some(i),
            })
            .collect();
        level.push(hyp(0.5));
        top_k_filter(&mut level, 3);
        assert_eq!(level[0].path_probability, 0.5);
        assert_eq!(level[1].tag, 0);
        assert_eq!(level[2].tag, 1);
    }

    #[test]
    fn test_top_n_zero_is_empty_beam() {
        let model = toy_model();
        let config = DecoderConfig::new(1.0, 0, 3);
        let mut s = toy_sentence();
        s.index = 7;
        let err = BeamSearch::new(&model, &config).decode(&s).unwrap_err();
        assert_eq!(err, DecodeError::EmptyBeam { sentence: 7, position: 0 });
    }

    #[test]
    fn test_top_k_zero_is_empty_beam() {
        let model = toy_model();
        let config = DecoderConfig::new(1.0, 2, 0);
        let err = BeamSearch::new(&model, &config).decode(&toy_sentence()).unwrap_err();
        assert_eq!(err, DecodeError::EmptyBeam { sentence: 0, position: 1 });
    }

    #[test]
    fn test_degenerate_model_reports_position() {
        let mut model = MaxEntModel::new();
        model.add_class("A", 0.0);
        model.add_class("B", 0.0);
        model.set_weight("A", "curW=boom", f64::INFINITY).unwrap();
        let config = DecoderConfig::new(1.0, 2, 2);
        let s = Sentence {
            index: 3,
            words: vec![word("ok", &[]), word("boom", &["curW=boom"])],
        };
        let err = BeamSearch::new(&model, &config).decode(&s).unwrap_err();
        assert!(matches!(err, DecodeError::DegenerateModel { sentence: 3, position: 1, .. }));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let model = toy_model();
        let config = DecoderConfig::new(1.5, 3, 3);
        let engine = BeamSearch::new(&model, &config);
        let a = engine.decode(&toy_sentence()).unwrap();
        let b = engine.decode(&toy_sentence()).unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(a.steps, b.steps);
    }

    #[test]
    fn test_empty_sentence() {
        let model = toy_model();
        let config = DecoderConfig::new(1.0, 2, 2);
        let result = BeamSearch::new(&model, &config).decode(&sentence(vec![])).unwrap();
        assert!(result.path.is_empty());
        assert!(result.trellis.is_empty());
    }

    #[test]
    fn test_best_in_level_prefers_first_on_tie() {
        let level = vec![hyp(0.1), hyp(0.4), hyp(0.4)];
        assert_eq!(best_in_level(&level), Some(1));
        assert_eq!(best_in_level(&[]), None);
    }

    #[test]
    fn test_unknown_features_do_not_change_scores() {
        let model = toy_model();
        let config = DecoderConfig::new(2.0, 4, 4);
        let engine = BeamSearch::new(&model, &config);
        let plain = engine.decode(&sentence(vec![word("the", &["curW=the"])])).unwrap();
        let noisy = engine
            .decode(&sentence(vec![word("the", &["curW=the", "nunca=visto"])]))
            .unwrap();
        assert_eq!(plain.path, noisy.path);
    }
}
