//! # Corpus de Teste
//!
//! O driver recebe dois fluxos paralelos:
//!
//! - **palavras**: uma linha por palavra, `palavra tag feat val feat val ...`
//! - **fronteiras**: um inteiro por linha, o número de palavras de cada sentença
//!
//! As fronteiras particionam o fluxo de palavras em sentenças consecutivas.

use std::io::BufRead;

use serde::Serialize;

use crate::error::InputError;
use crate::features::WordRecord;

/// Uma sentença do arquivo de teste.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    /// Posição da sentença no arquivo (0-based), usada nas mensagens de erro.
    pub index: usize,
    pub words: Vec<WordRecord>,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Todas as sentenças de um arquivo de teste, na ordem original.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Corpus {
    pub sentences: Vec<Sentence>,
}

impl Corpus {
    /// Lê o fluxo de palavras particionado pelo fluxo de fronteiras.
    ///
    /// # Erros
    /// - [`InputError::Malformed`] para uma fronteira não numérica ou zero, ou uma linha
    ///   de palavra sem tag.
    /// - [`InputError::Truncated`] se as fronteiras pedem mais palavras do que existem.
    ///
    /// Linhas de palavra que sobram depois da última sentença são ignoradas (com aviso).
    pub fn read(words: impl BufRead, boundaries: impl BufRead) -> Result<Self, InputError> {
        let lengths = read_boundaries(boundaries)?;
        let expected: usize = lengths.iter().sum();

        let mut lines = words.lines().enumerate();
        let mut sentences = Vec::with_capacity(lengths.len());
        let mut found = 0;

        for (index, &len) in lengths.iter().enumerate() {
            let mut records = Vec::with_capacity(len);
            for _ in 0..len {
                let (i, line) = match lines.next() {
                    Some((i, line)) => (i, line?),
                    None => return Err(InputError::Truncated { expected, found }),
                };
                records.push(WordRecord::parse(&line, i + 1)?);
                found += 1;
            }
            sentences.push(Sentence { index, words: records });
        }

        let surplus = lines.filter(|(_, l)| l.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true)).count();
        if surplus > 0 {
            tracing::warn!(surplus, "linhas de palavras além da soma das fronteiras foram ignoradas");
        }

        tracing::debug!(sentences = sentences.len(), words = found, "corpus de teste carregado");
        Ok(Self { sentences })
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn total_words(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}

fn read_boundaries(reader: impl BufRead) -> Result<Vec<usize>, InputError> {
    let mut lengths = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let len: usize = trimmed.parse().map_err(|_| InputError::Malformed {
            artifact: "arquivo de fronteiras",
            line: i + 1,
            message: format!("`{trimmed}` não é um inteiro não negativo"),
        })?;
        if len == 0 {
            return Err(InputError::Malformed {
                artifact: "arquivo de fronteiras",
                line: i + 1,
                message: "sentença com zero palavras".into(),
            });
        }
        lengths.push(len);
    }
    Ok(lengths)
}
