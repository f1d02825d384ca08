//! # Tipos de Erro
//!
//! Os erros são agrupados por estágio (modelo, entrada, decodificação, configuração)
//! para que a mensagem final identifique o artefato e a posição do problema.
//!
//! Nenhum erro aqui é recuperável com nova tentativa: as entradas são determinísticas,
//! então rodar de novo com os mesmos arquivos reproduz a mesma falha.

use thiserror::Error;

/// Erro de alto nível, agregando todos os estágios.
#[derive(Error, Debug)]
pub enum TaggerError {
    #[error("erro no modelo: {0}")]
    Model(#[from] ModelError),

    #[error("erro na entrada: {0}")]
    Input(#[from] InputError),

    #[error("erro na decodificação: {0}")]
    Decode(#[from] DecodeError),

    #[error("configuração inválida: {0}")]
    Config(#[from] ConfigError),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros ao carregar ou consultar o arquivo de pesos MaxEnt.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Linha de feature antes de qualquer cabeçalho, peso não numérico, etc.
    #[error("modelo malformado na linha {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Classe consultada que nunca foi declarada no modelo.
    #[error("classe desconhecida: {0}")]
    UnknownClass(String),

    #[error("falha ao ler o modelo: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros nos fluxos de entrada do driver (palavras com features e fronteiras de sentença).
#[derive(Error, Debug)]
pub enum InputError {
    #[error("{artifact} malformado na linha {line}: {message}")]
    Malformed {
        artifact: &'static str,
        line: usize,
        message: String,
    },

    /// As fronteiras pedem mais palavras do que o fluxo de features contém.
    #[error("fluxo de palavras truncado: as fronteiras pedem {expected} palavras, mas só há {found}")]
    Truncated { expected: usize, found: usize },

    #[error("falha ao ler a entrada: {0}")]
    Io(#[from] std::io::Error),
}

/// Falhas fatais para uma sentença durante a busca em feixe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A soma das exponenciais no softmax é zero ou não finita.
    #[error("distribuição degenerada na sentença {sentence}, posição {position} (soma = {sum})")]
    DegenerateModel {
        sentence: usize,
        position: usize,
        sum: f64,
    },

    /// A poda eliminou todos os candidatos (ex: top_n = 0).
    #[error("feixe vazio na sentença {sentence}, posição {position}")]
    EmptyBeam { sentence: usize, position: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}
