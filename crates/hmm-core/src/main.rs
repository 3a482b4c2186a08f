//! `hmm` - discrete hidden Markov model toolkit.
//!
//! Scores, decodes, samples and trains categorical HMMs stored as JSON model
//! files. Payloads go to stdout as JSON; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use hmm_common::{DecodeAlgorithm, Diagnostic, Implementation};
use hmm_config::{resolve_fit_config, PresetName};
use hmm_core::exit_codes::ExitCode;
use hmm_core::inference::{seeded_rng, CategoricalHmm};
use hmm_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat,
};
use hmm_core::model_file::{load_model, save_model, ModelFile};
use hmm_core::observations::ObservationInput;
use hmm_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use hmm_core::training::Trainer;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "hmm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Total log-likelihood of the observations
    Score(ScoreArgs),
    /// Most likely hidden states
    Decode(DecodeArgs),
    /// MAP states, or posterior probabilities with --proba
    Predict(PredictArgs),
    /// Train a model with Baum-Welch
    Fit(FitArgs),
    /// Draw a synthetic sequence from a model
    Sample(SampleArgs),
    /// Print JSON schemas of the file formats
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ModelInput {
    /// Model file (JSON)
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Observation file (JSON), or - for stdin
    #[arg(long, short = 'i', default_value = "-")]
    input: PathBuf,

    /// Override the model's arithmetic
    #[arg(long, value_enum)]
    implementation: Option<Implementation>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    input: ModelInput,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    input: ModelInput,

    #[arg(long, short = 'a', value_enum, default_value_t = DecodeAlgorithm::Viterbi)]
    algorithm: DecodeAlgorithm,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    input: ModelInput,

    /// Print posterior probabilities instead of states
    #[arg(long)]
    proba: bool,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Number of hidden states for a new model
    #[arg(long, short = 'n', required_unless_present = "init_model")]
    states: Option<usize>,

    /// Start from an existing model instead of a fresh one
    #[arg(long, conflicts_with = "states")]
    init_model: Option<PathBuf>,

    /// Observation file (JSON), or - for stdin
    #[arg(long, short = 'i', default_value = "-")]
    input: PathBuf,

    /// Fit config file (TOML or JSON)
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Named config preset
    #[arg(long)]
    preset: Option<PresetName>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the trained model
    #[arg(long, short = 'o')]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Number of steps to draw
    #[arg(long, short = 'n')]
    n: usize,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type name (see --list)
    name: Option<String>,

    /// List available schema types
    #[arg(long, conflicts_with = "name")]
    list: bool,

    /// Print every schema
    #[arg(long, conflicts_with_all = ["name", "list"])]
    all: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] hmm_common::Error),

    #[error("{0}")]
    Args(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Engine(err) => ExitCode::for_error(err),
            CliError::Args(_) => ExitCode::ArgsError,
            CliError::Io { .. } => ExitCode::IoError,
        }
    }
}

impl From<hmm_config::ValidationError> for CliError {
    fn from(err: hmm_config::ValidationError) -> Self {
        CliError::Engine(err.into())
    }
}

type CliResult<T> = Result<T, CliError>;

#[derive(Serialize)]
struct ErrorOutput<'a> {
    error: String,
    code: u32,
    exit_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

fn read_text(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_sequences(path: &Path) -> CliResult<Vec<Vec<usize>>> {
    let text = read_text(path)?;
    Ok(ObservationInput::from_json_str(&text)?.into_sequences()?)
}

fn read_model(input: &ModelInput) -> CliResult<CategoricalHmm> {
    let mut model = load_model(&input.model)?;
    if let Some(implementation) = input.implementation {
        model.set_implementation(implementation);
    }
    Ok(model)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(hmm_common::Error::from)?;
    println!("{}", text);
    Ok(())
}

fn outcome(diagnostics: &[Diagnostic]) -> ExitCode {
    if diagnostics.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::Degenerate
    }
}

fn slices(sequences: &[Vec<usize>]) -> Vec<&[usize]> {
    sequences.iter().map(Vec::as_slice).collect()
}

#[derive(Serialize)]
struct ScoreOutput {
    log_likelihood: f64,
    n_sequences: usize,
    implementation: Implementation,
    diagnostics: Vec<Diagnostic>,
}

fn run_score(args: &ScoreArgs) -> CliResult<ExitCode> {
    let model = read_model(&args.input)?;
    let sequences = read_sequences(&args.input.input)?;
    let scored = model.score_samples(&slices(&sequences))?;
    print_json(&ScoreOutput {
        log_likelihood: scored.log_likelihood,
        n_sequences: sequences.len(),
        implementation: model.implementation(),
        diagnostics: scored.diagnostics.clone(),
    })?;
    Ok(outcome(&scored.diagnostics))
}

fn run_decode(args: &DecodeArgs) -> CliResult<ExitCode> {
    let model = read_model(&args.input)?;
    let sequences = read_sequences(&args.input.input)?;
    let decoded = model.decode(&slices(&sequences), args.algorithm)?;
    print_json(&decoded)?;
    Ok(outcome(&decoded.diagnostics))
}

#[derive(Serialize)]
struct PredictOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    states: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    posteriors: Option<Vec<Vec<f64>>>,
    diagnostics: Vec<Diagnostic>,
}

fn run_predict(args: &PredictArgs) -> CliResult<ExitCode> {
    let model = read_model(&args.input)?;
    let sequences = read_sequences(&args.input.input)?;
    let batch = slices(&sequences);
    let output = if args.proba {
        let scored = model.score_samples(&batch)?;
        PredictOutput {
            states: None,
            posteriors: Some(scored.posteriors),
            diagnostics: scored.diagnostics,
        }
    } else {
        let decoded = model.decode(&batch, DecodeAlgorithm::Map)?;
        PredictOutput {
            states: Some(decoded.states),
            posteriors: None,
            diagnostics: decoded.diagnostics,
        }
    };
    print_json(&output)?;
    Ok(outcome(&output.diagnostics))
}

#[derive(Serialize)]
struct FitOutput<'a> {
    model_path: &'a Path,
    config_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<String>,
    report: hmm_core::FitReport,
    model: ModelFile,
}

fn run_fit(args: &FitArgs) -> CliResult<ExitCode> {
    let resolved = resolve_fit_config(args.config.as_deref(), args.preset)?;
    let mut config = resolved.config;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let source = resolved.source.to_string();
    info!(
        event = event_names::CONFIG_LOADED,
        source = %source,
        hash = resolved.hash.as_deref().unwrap_or("-"),
        "fit configuration resolved"
    );

    let sequences = read_sequences(&args.input)?;
    let batch = slices(&sequences);
    let trainer = Trainer::new(config)?
        .with_context(LogContext::new(generate_run_id()).with_config_source(source.clone()));

    let (model, report) = match (&args.init_model, args.states) {
        (Some(path), _) => {
            let mut model = load_model(path)?;
            let report = trainer.fit_categorical(&mut model, &batch)?;
            (model, report)
        }
        (None, Some(states)) => trainer.fit_new(states, &batch)?,
        (None, None) => {
            return Err(CliError::Args(
                "either --states or --init-model is required".to_string(),
            ))
        }
    };

    save_model(&model, &args.out)?;
    debug!(path = %args.out.display(), "model written");
    let code = outcome(&report.diagnostics);
    print_json(&FitOutput {
        model_path: &args.out,
        config_source: source,
        config_hash: resolved.hash,
        report,
        model: ModelFile::from_model(&model),
    })?;
    Ok(code)
}

#[derive(Serialize)]
struct SampleOutput {
    observations: Vec<usize>,
    states: Vec<usize>,
}

fn run_sample(args: &SampleArgs) -> CliResult<ExitCode> {
    let model = load_model(&args.model)?;
    let mut rng = seeded_rng(args.seed);
    let sample = model.sample(args.n, &mut rng);
    print_json(&SampleOutput {
        observations: sample.observations,
        states: sample.states,
    })?;
    Ok(ExitCode::Clean)
}

fn run_schema(args: &SchemaArgs) -> CliResult<ExitCode> {
    if args.list {
        let list: Vec<_> = available_schemas()
            .into_iter()
            .map(|(name, description)| serde_json::json!({ "name": name, "description": description }))
            .collect();
        print_json(&list)?;
    } else if args.all {
        print_json(&generate_all_schemas())?;
    } else {
        let name = args.name.as_deref().unwrap_or("ModelFile");
        let schema = generate_schema(name)
            .ok_or_else(|| CliError::Args(format!("unknown schema type: {}", name)))?;
        print_json(&schema)?;
    }
    Ok(ExitCode::Clean)
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version come through here too
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            return code.into();
        }
    };

    let base = LogConfig::from_env(None, cli.global.log_format);
    let level = base.level.shifted(cli.global.verbose, cli.global.quiet);
    init_logging(&base.with_level(level));

    let result = match &cli.command {
        Commands::Score(args) => run_score(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Predict(args) => run_predict(args),
        Commands::Fit(args) => run_fit(args),
        Commands::Sample(args) => run_sample(args),
        Commands::Schema(args) => run_schema(args),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            let (engine_code, category) = match &err {
                CliError::Engine(inner) => (inner.code(), Some(inner.category().to_string())),
                _ => (0, None),
            };
            let output = ErrorOutput {
                error: err.to_string(),
                code: engine_code,
                exit_code: code.code_name(),
                category: category.as_deref(),
            };
            match serde_json::to_string_pretty(&output) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("error: {}", err),
            }
            code
        }
    };
    code.into()
}
