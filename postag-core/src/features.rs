//! # Features das Palavras
//!
//! Cada palavra do arquivo de teste já vem com suas features léxicas e de contexto
//! (`curW=The`, `prevW=BOS`, `nextW=Arizona`, ...). O decodificador só acrescenta
//! duas features que dependem da hipótese sendo expandida:
//!
//! - `prevT=<tag>`: tag da palavra anterior
//! - `prevTwoTags=<tag2>+<tag1>`: as duas tags anteriores
//!
//! No início da sentença as tags ausentes são substituídas por [`BOS`].
//!
//! ## Formato da linha
//!
//! ```text
//! <palavra> <tag_verdadeira> <feat1> <val1> <feat2> <val2> ...
//! 1-0-The DT curW=The 1 prevW=BOS 1 prev2W=BOS 1 nextW=Arizona 1
//! ```
//!
//! Os valores são ignorados: o modelo usa apenas a **presença** da feature.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Tag sintética da fronteira de início de sentença.
pub const BOS: &str = "BOS";

/// Nome da feature que carrega o peso default de cada classe no modelo.
pub const DEFAULT_FEATURE: &str = "<default>";

const PREV_TAG_PREFIX: &str = "prevT=";
const PREV_TWO_TAGS_PREFIX: &str = "prevTwoTags=";

pub fn prev_tag_feature(prev: &str) -> String {
    format!("{PREV_TAG_PREFIX}{prev}")
}

pub fn prev_two_tags_feature(prev2: &str, prev: &str) -> String {
    format!("{PREV_TWO_TAGS_PREFIX}{prev2}+{prev}")
}

/// Conjunto ordenado de nomes de features ativas.
///
/// Uma feature listada duas vezes na linha de entrada conta uma só vez no score,
/// por isso guardamos um conjunto e não uma lista. A ordem (`BTreeSet`) torna a
/// iteração determinística.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    names: BTreeSet<String>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna `true` se a feature ainda não estava presente.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Uma linha do fluxo de teste: a palavra, sua tag de referência e suas features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub true_tag: String,
    pub features: FeatureSet,
}

impl WordRecord {
    /// Interpreta uma linha `palavra tag feat val feat val ...`.
    ///
    /// `line_no` é usado apenas na mensagem de erro (1-based).
    pub fn parse(line: &str, line_no: usize) -> Result<Self, InputError> {
        let mut tokens = line.split_whitespace();
        let (word, true_tag) = match (tokens.next(), tokens.next()) {
            (Some(w), Some(t)) => (w, t),
            _ => {
                return Err(InputError::Malformed {
                    artifact: "fluxo de palavras",
                    line: line_no,
                    message: "esperado pelo menos `<palavra> <tag>`".into(),
                })
            }
        };

        let rest: Vec<&str> = tokens.collect();
        if rest.len() % 2 == 1 {
            tracing::debug!(line = line_no, "feature sem valor no fim da linha, mantendo apenas o nome");
        }
        let features = rest.iter().step_by(2).copied().collect();

        Ok(Self {
            word: word.to_string(),
            true_tag: true_tag.to_string(),
            features,
        })
    }
}
