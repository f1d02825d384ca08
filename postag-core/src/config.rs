//! # Configuração do Decodificador
//!
//! Os três parâmetros de poda chegam aqui explicitamente, em vez de serem lidos
//! de argumentos globais dentro da lógica de busca.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parâmetros da busca em feixe.
///
/// | Campo       | Papel                                                            |
/// |-------------|------------------------------------------------------------------|
/// | `beam_size` | Margem em log10 em relação ao melhor caminho de cada posição     |
/// | `top_n`     | Máximo de tags candidatas por expansão (por hipótese pai)        |
/// | `top_k`     | Máximo de caminhos mantidos em cada nível da treliça             |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub beam_size: f64,
    pub top_n: usize,
    pub top_k: usize,
    /// Decodifica sentenças em paralelo (rayon). Não altera a saída.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl DecoderConfig {
    pub fn new(beam_size: f64, top_n: usize, top_k: usize) -> Self {
        Self {
            beam_size,
            top_n,
            top_k,
            parallel: true,
        }
    }

    /// Verifica se os valores estão em faixas aceitáveis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.beam_size.is_finite() || self.beam_size < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "beam_size deve ser um real finito >= 0 (recebido {})",
                self.beam_size
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n deve ser > 0".into()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k deve ser > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(DecoderConfig::new(2.0, 3, 5).validate().is_ok());
        assert!(DecoderConfig::new(0.0, 1, 1).validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_values() {
        assert!(DecoderConfig::new(-1.0, 3, 5).validate().is_err());
        assert!(DecoderConfig::new(f64::NAN, 3, 5).validate().is_err());
        assert!(DecoderConfig::new(f64::INFINITY, 3, 5).validate().is_err());
        assert!(DecoderConfig::new(1.0, 0, 5).validate().is_err());
        assert!(DecoderConfig::new(1.0, 3, 0).validate().is_err());
    }
}
