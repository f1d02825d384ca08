//! # postag-core — Etiquetador MaxEnt com Busca em Feixe
//!
//! Este crate decodifica a sequência de tags morfossintáticas mais provável de cada
//! sentença sob um classificador de Entropia Máxima já treinado. Em vez do Viterbi
//! exaustivo, usa uma **busca em feixe** sobre uma treliça podada de hipóteses.
//!
//! ## Arquitetura
//!
//! O dado flui para frente dentro de uma sentença (palavra 0 → N-1) para construir as
//! hipóteses e para trás uma única vez para reconstruir o melhor caminho:
//!
//! 1.  **Modelo** ([`model`]): pesos `classe → feature → peso`, somente leitura.
//! 2.  **Pontuação** ([`scorer`]): score log-linear por classe, softmax e top-N.
//! 3.  **Busca em Feixe** ([`beam`]): treliça nível a nível, com três podas
//!     (margem de feixe, top-N por expansão, top-K por nível) e backtrace.
//! 4.  **Driver** ([`decoder`]): lê o corpus ([`corpus`]), decodifica sentença a sentença
//!     (em paralelo, se configurado), escreve a saída e mede a acurácia ([`evaluation`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::io::Cursor;
//! use postag_core::{Corpus, Decoder, DecoderConfig, MaxEntModel};
//!
//! let model = MaxEntModel::load(Cursor::new(
//!     "FEATURES FOR CLASS A\n<default> 0\nFEATURES FOR CLASS B\n<default> 1\n",
//! )).unwrap();
//! let corpus = Corpus::read(Cursor::new("w B curW=w 1\n"), Cursor::new("1\n")).unwrap();
//!
//! let decoder = Decoder::new(model, DecoderConfig::new(10.0, 2, 2)).unwrap();
//! let mut out = Vec::new();
//! let summary = decoder.run(&corpus, &mut out).unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), "w B B 0.73106\n");
//! assert_eq!(summary.accuracy.value(), 1.0);
//! ```

pub mod beam;
pub mod config;
pub mod corpus;
pub mod decoder;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod scorer;

pub use beam::{BeamResult, BeamSearch, BeamStep, Hypothesis, PathEntry, Trellis};
pub use config::DecoderConfig;
pub use corpus::{Corpus, Sentence};
pub use decoder::{Decoder, RunSummary, TaggedWord};
pub use error::{ConfigError, DecodeError, InputError, ModelError, TaggerError};
pub use evaluation::Accuracy;
pub use features::{FeatureSet, WordRecord};
pub use model::MaxEntModel;
