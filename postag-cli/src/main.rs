//! Linha de comando do etiquetador MaxEnt com busca em feixe.
//!
//! ```bash
//! postag test.txt boundary.txt model.txt sys_output 2 5 10
//! ```
//!
//! Escreve `<palavra> <tag_verdadeira> <tag_prevista> <prob>` em `sys_output` e imprime
//! a acurácia em stdout.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use postag_core::{Corpus, Decoder, DecoderConfig, MaxEntModel};
use serde::Serialize;

mod logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Só a acurácia, em uma linha
    Plain,
    /// Resumo da execução em JSON
    Json,
}

/// Decodifica um arquivo de teste com um modelo MaxEnt usando busca em feixe.
#[derive(Parser, Debug)]
#[command(name = "postag", author, version, about, long_about = None)]
struct Cli {
    /// Palavras com features: `<palavra> <tag> <feat> <val> ...`
    test_data: PathBuf,

    /// Número de palavras de cada sentença, um por linha
    boundary_file: PathBuf,

    /// Pesos do modelo MaxEnt (blocos `FEATURES FOR CLASS <tag>`)
    model_file: PathBuf,

    /// Arquivo de saída (sobrescrito)
    sys_output: PathBuf,

    /// Margem do feixe em log10 em relação ao melhor caminho
    beam_size: f64,

    /// Tags candidatas por expansão
    top_n: usize,

    /// Caminhos mantidos por posição
    top_k: usize,

    /// Decodifica as sentenças em uma única thread
    #[arg(long)]
    sequential: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
    report: ReportFormat,

    /// Logs em nível debug
    #[arg(short, long)]
    verbose: bool,

    /// Logs em JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a DecoderConfig,
    sentences: usize,
    words: usize,
    correct: usize,
    accuracy: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let mut config = DecoderConfig::new(cli.beam_size, cli.top_n, cli.top_k);
    config.parallel = !cli.sequential;

    let model = MaxEntModel::from_path(&cli.model_file)
        .with_context(|| format!("falha ao carregar o modelo {}", cli.model_file.display()))?;
    tracing::info!(classes = model.num_classes(), "modelo carregado");

    let words = File::open(&cli.test_data)
        .with_context(|| format!("falha ao abrir {}", cli.test_data.display()))?;
    let boundaries = File::open(&cli.boundary_file)
        .with_context(|| format!("falha ao abrir {}", cli.boundary_file.display()))?;
    let corpus = Corpus::read(BufReader::new(words), BufReader::new(boundaries)).with_context(|| {
        format!(
            "falha ao ler {} / {}",
            cli.test_data.display(),
            cli.boundary_file.display()
        )
    })?;

    let decoder = Decoder::new(model, config).context("configuração inválida")?;
    let out = File::create(&cli.sys_output)
        .with_context(|| format!("falha ao criar {}", cli.sys_output.display()))?;
    let summary = decoder
        .run(&corpus, BufWriter::new(out))
        .with_context(|| format!("falha ao decodificar {}", cli.test_data.display()))?;

    match cli.report {
        ReportFormat::Plain => println!("{}", summary.accuracy.value()),
        ReportFormat::Json => {
            let report = Report {
                config: decoder.config(),
                sentences: summary.sentences,
                words: summary.words,
                correct: summary.accuracy.correct,
                accuracy: summary.accuracy.value(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
