//! # Modelo MaxEnt Pré-treinado
//!
//! O modelo é um mapa `classe → (peso default, feature → peso)`, carregado uma vez
//! e somente leitura durante toda a decodificação. Por ser imutável, pode ser
//! compartilhado por várias threads decodificando sentenças diferentes.
//!
//! ## Formato do arquivo
//!
//! ```text
//! FEATURES FOR CLASS NNP
//!  <default> 3.7912278052488615
//!  curW=Pierre 1.0055824571891294
//!  prevW=BOS 0.15158438156724433
//! FEATURES FOR CLASS NNS
//!  <default> 2.956903172545647
//!  curW=Pierre -0.050694168880812344
//! ```
//!
//! Os pesos não são aprendidos aqui; o arquivo vem de um treinador externo.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ModelError;
use crate::features::DEFAULT_FEATURE;

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^\s*FEATURES FOR CLASS\s+(\S+)\s*$").expect("padrão de cabeçalho válido")
    })
}

/// Modelo de Entropia Máxima (regressão logística multinomial) já treinado.
///
/// $$ P(y|x) = \frac{\exp(w_{y,default} + \sum_{f \in x} w_{y,f})}{Z(x)} $$
#[derive(Debug, Clone, Default)]
pub struct MaxEntModel {
    /// Rótulos na ordem em que aparecem no arquivo.
    classes: Vec<String>,
    index: HashMap<String, usize>,
    /// Peso `<default>` de cada classe, alinhado com `classes`.
    defaults: Vec<f64>,
    /// Pesos das demais features, alinhados com `classes`.
    weights: Vec<HashMap<String, f64>>,
}

impl MaxEntModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrega o modelo de um arquivo em disco.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }

    /// Lê o modelo no formato de blocos `FEATURES FOR CLASS <tag>`.
    ///
    /// # Erros
    /// - [`ModelError::Malformed`] se uma feature aparece antes de qualquer cabeçalho,
    ///   se um peso não é número real, ou se uma classe não tem `<default>`.
    pub fn load(reader: impl BufRead) -> Result<Self, ModelError> {
        let mut model = Self::new();
        let mut current: Option<usize> = None;
        // Linha do cabeçalho e presença do `<default>` por classe
        let mut header_lines: Vec<usize> = Vec::new();
        let mut has_default: Vec<bool> = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(caps) = header_regex().captures(&line) {
                let label = &caps[1];
                let idx = match model.class_index(label) {
                    Some(idx) => {
                        // O bloco repetido substitui o anterior, mas a classe mantém a posição
                        tracing::warn!(class = label, line = line_no, "classe repetida no modelo, substituindo pesos");
                        model.weights[idx].clear();
                        model.defaults[idx] = 0.0;
                        has_default[idx] = false;
                        header_lines[idx] = line_no;
                        idx
                    }
                    None => {
                        header_lines.push(line_no);
                        has_default.push(false);
                        model.add_class(label, 0.0)
                    }
                };
                current = Some(idx);
                continue;
            }

            let idx = current.ok_or_else(|| ModelError::Malformed {
                line: line_no,
                message: "feature antes de qualquer cabeçalho `FEATURES FOR CLASS`".into(),
            })?;

            let mut parts = line.split_whitespace();
            let (name, raw) = match (parts.next(), parts.next(), parts.next()) {
                (Some(n), Some(w), None) => (n, w),
                _ => {
                    return Err(ModelError::Malformed {
                        line: line_no,
                        message: format!("esperado `<feature> <peso>`, encontrado `{}`", line.trim()),
                    })
                }
            };
            let weight: f64 = raw.parse().map_err(|_| ModelError::Malformed {
                line: line_no,
                message: format!("peso `{raw}` não é um número real"),
            })?;

            if name == DEFAULT_FEATURE {
                model.defaults[idx] = weight;
                has_default[idx] = true;
            } else {
                model.weights[idx].insert(name.to_string(), weight);
            }
        }

        if let Some(missing) = has_default.iter().position(|ok| !ok) {
            return Err(ModelError::Malformed {
                line: header_lines[missing],
                message: format!("classe `{}` sem peso `{DEFAULT_FEATURE}`", model.classes[missing]),
            });
        }

        tracing::debug!(classes = model.num_classes(), "modelo MaxEnt carregado");
        Ok(model)
    }

    /// Declara uma classe com seu peso default. Redeclarar só atualiza o default.
    pub fn add_class(&mut self, label: &str, default_weight: f64) -> usize {
        if let Some(idx) = self.class_index(label) {
            self.defaults[idx] = default_weight;
            return idx;
        }
        let idx = self.classes.len();
        self.classes.push(label.to_string());
        self.index.insert(label.to_string(), idx);
        self.defaults.push(default_weight);
        self.weights.push(HashMap::new());
        idx
    }

    /// Configura o peso de uma feature para uma classe já declarada.
    pub fn set_weight(&mut self, label: &str, feature: &str, weight: f64) -> Result<(), ModelError> {
        let idx = self
            .class_index(label)
            .ok_or_else(|| ModelError::UnknownClass(label.to_string()))?;
        if feature == DEFAULT_FEATURE {
            self.defaults[idx] = weight;
        } else {
            self.weights[idx].insert(feature.to_string(), weight);
        }
        Ok(())
    }

    /// Rótulos de todas as classes, na ordem de carga.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Rótulo da classe de índice `idx`.
    ///
    /// # Panics
    /// Se `idx` não veio deste modelo.
    pub fn class_label(&self, idx: usize) -> &str {
        &self.classes[idx]
    }

    /// Peso `<default>` obrigatório da classe.
    pub fn default_weight(&self, label: &str) -> Result<f64, ModelError> {
        self.class_index(label)
            .map(|idx| self.defaults[idx])
            .ok_or_else(|| ModelError::UnknownClass(label.to_string()))
    }

    /// Peso da feature para a classe, ou `0.0` se ausente (ou classe desconhecida).
    pub fn score_feature(&self, label: &str, feature: &str) -> f64 {
        self.class_index(label)
            .map(|idx| self.feature_weight(idx, feature))
            .unwrap_or(0.0)
    }

    pub(crate) fn default_at(&self, idx: usize) -> f64 {
        self.defaults[idx]
    }

    pub(crate) fn feature_weight(&self, idx: usize, feature: &str) -> f64 {
        self.weights[idx].get(feature).copied().unwrap_or(0.0)
    }
}
