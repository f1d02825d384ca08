//! # Driver de Decodificação
//!
//! Percorre as sentenças do corpus, roda a busca em feixe em cada uma e escreve
//! uma linha por palavra:
//!
//! ```text
//! <palavra> <tag_verdadeira> <tag_prevista> <P(tag_prevista | contexto)>
//! ```
//!
//! As sentenças são independentes e só compartilham o modelo (somente leitura), então
//! podem ser decodificadas em paralelo com `rayon`. Os resultados são recolhidos na
//! ordem original e escritos sequencialmente: a saída é idêntica nos dois modos.
//!
//! Se uma sentença falha, as linhas das sentenças anteriores já estão escritas e
//! não são desfeitas.

use std::fmt::Display;
use std::io::Write;

use rayon::prelude::*;
use serde::Serialize;

use crate::beam::BeamSearch;
use crate::config::DecoderConfig;
use crate::corpus::{Corpus, Sentence};
use crate::error::{ConfigError, DecodeError, TaggerError};
use crate::evaluation::Accuracy;
use crate::model::MaxEntModel;

/// Uma palavra decodificada, pronta para a saída.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedWord {
    pub word: String,
    pub true_tag: String,
    pub predicted_tag: String,
    /// Probabilidade local da tag prevista.
    pub probability: f64,
}

impl Display for TaggedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {:.5}",
            self.word, self.true_tag, self.predicted_tag, self.probability
        )
    }
}

/// Resumo de uma execução completa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub sentences: usize,
    pub words: usize,
    pub accuracy: Accuracy,
}

pub struct Decoder {
    model: MaxEntModel,
    config: DecoderConfig,
}

impl Decoder {
    /// Cria o decodificador, validando a configuração.
    pub fn new(model: MaxEntModel, config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &MaxEntModel {
        &self.model
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodifica uma sentença e junta a tag prevista com a de referência.
    pub fn decode_sentence(&self, sentence: &Sentence) -> Result<Vec<TaggedWord>, DecodeError> {
        let result = BeamSearch::new(&self.model, &self.config).decode(sentence)?;
        Ok(result
            .path
            .into_iter()
            .zip(&sentence.words)
            .map(|(entry, record)| TaggedWord {
                word: entry.word,
                true_tag: record.true_tag.clone(),
                predicted_tag: entry.tag,
                probability: entry.local_probability,
            })
            .collect())
    }

    /// Decodifica o corpus inteiro, escrevendo em `out` na ordem original.
    ///
    /// Retorna no primeiro erro de sentença, depois de escrever (e dar flush em)
    /// todas as sentenças anteriores.
    pub fn run(&self, corpus: &Corpus, mut out: impl Write) -> Result<RunSummary, TaggerError> {
        let results: Vec<Result<Vec<TaggedWord>, DecodeError>> = if self.config.parallel {
            corpus.sentences.par_iter().map(|s| self.decode_sentence(s)).collect()
        } else {
            corpus.sentences.iter().map(|s| self.decode_sentence(s)).collect()
        };

        let mut accuracy = Accuracy::default();
        for (sentence, result) in corpus.sentences.iter().zip(results) {
            let tagged = match result {
                Ok(tagged) => tagged,
                Err(e) => {
                    out.flush()?;
                    return Err(e.into());
                }
            };
            for w in &tagged {
                writeln!(out, "{w}")?;
                accuracy.accumulate(&w.true_tag, &w.predicted_tag);
            }
            tracing::debug!(sentence = sentence.index, words = tagged.len(), "sentença decodificada");
        }
        out.flush()?;

        tracing::info!(
            sentences = corpus.len(),
            words = accuracy.total,
            accuracy = accuracy.value(),
            "decodificação concluída"
        );
        Ok(RunSummary {
            sentences: corpus.len(),
            words: accuracy.total,
            accuracy,
        })
    }
}
