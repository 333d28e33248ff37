use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use cg_core::{
    JournalStream, ScoringMode, SchemaTarget, Validator, aggregate, audit, json_schema,
};
use cg_store::{GateConfig, load_documents, read_all, read_window};
use clap::{Parser, Subcommand};

/// Exit code for a journal that fails validation. Distinct from clap usage
/// errors (2) and runtime failures (1).
const EXIT_VIOLATIONS: u8 = 3;

#[derive(Parser)]
#[command(name = "cg", about = "Canon journal release gate and corpus cohesion audit")]
struct Cli {
    /// TOML config file (falls back to $CG_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Strictly validate the trailing window of a journal
    Validate {
        /// Path to JOURNAL.jsonl
        main: PathBuf,

        /// Path to SHADOW_JOURNAL.jsonl
        #[arg(long)]
        shadow: Option<PathBuf>,

        /// Trailing records to validate (0 = whole file)
        #[arg(long)]
        window: Option<usize>,

        /// Skip the shadow coverage policy (early-stage journals)
        #[arg(long)]
        no_shadow_coverage: bool,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize journal metrics for CI
    Aggregate {
        /// Path to JOURNAL.jsonl
        main: PathBuf,

        /// Path to SHADOW_JOURNAL.jsonl
        #[arg(long)]
        shadow: Option<PathBuf>,
    },

    /// Audit chunk cohesion across a document corpus
    Audit {
        /// JSONL file, JSON file, or directory of documents
        source: PathBuf,

        /// Number of documents to sample
        #[arg(long)]
        sample_size: Option<usize>,

        /// Scores strictly below this are anomalies
        #[arg(long)]
        threshold: Option<f64>,

        /// Seed for deterministic sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Characters kept in chunk previews
        #[arg(long)]
        preview_length: Option<usize>,

        /// Scoring convention: f1 or dice
        #[arg(long)]
        mode: Option<ScoringMode>,

        /// Write the JSON report here instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the JSON Schema for journal, shadow, document or report
    Schema {
        target: SchemaTarget,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<GateConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("CG_CONFIG").ok().map(PathBuf::from));
    GateConfig::load_optional(path.as_deref()).context("failed to load config")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Validate {
            main,
            shadow,
            window,
            no_shadow_coverage,
            json,
        } => cmd_validate(
            &cli,
            main,
            shadow.as_deref(),
            *window,
            *no_shadow_coverage,
            *json,
        ),
        Commands::Aggregate { main, shadow } => cmd_aggregate(main, shadow.as_deref()),
        Commands::Audit {
            source,
            sample_size,
            threshold,
            seed,
            preview_length,
            mode,
            report,
        } => cmd_audit(
            &cli,
            source,
            AuditOverrides {
                sample_size: *sample_size,
                threshold: *threshold,
                seed: *seed,
                preview_length: *preview_length,
                mode: *mode,
            },
            report.as_deref(),
        ),
        Commands::Schema { target } => cmd_schema(*target),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("cg: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(
    cli: &Cli,
    main: &Path,
    shadow: Option<&Path>,
    window: Option<usize>,
    no_shadow_coverage: bool,
    json: bool,
) -> Result<ExitCode> {
    let mut config = load_config(cli)?.validate.to_config();
    if let Some(window) = window {
        config.window = window;
    }
    if no_shadow_coverage {
        config.require_shadow_coverage = false;
    }
    let validator = Validator::new(config).context("invalid validator settings")?;

    let main_entries = read_window(main, validator.config().window)
        .with_context(|| format!("failed to read {}", main.display()))?;
    let shadow_entries = shadow
        .map(|path| {
            read_all(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .transpose()?;

    let main_label = main.display().to_string();
    let shadow_label = shadow.map(|p| p.display().to_string());
    let shadow_stream = match (&shadow_label, &shadow_entries) {
        (Some(label), Some(entries)) => Some(JournalStream::new(label, entries)),
        _ => None,
    };

    let verdict = validator.validate(JournalStream::new(&main_label, &main_entries), shadow_stream);
    tracing::info!(
        "validated {} entries from {}: {} violations",
        verdict.count,
        main.display(),
        verdict.violations.len()
    );

    if json {
        let payload = serde_json::json!({
            "ok": verdict.ok(),
            "summary": verdict.summary(),
            "violations": verdict.violations,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if verdict.ok() {
        println!("[OK] strict validation passed");
        println!("{}", serde_json::to_string(&verdict.summary())?);
    } else {
        println!("[FAIL] strict validation failed:");
        for message in verdict.messages() {
            println!(" - {message}");
        }
    }

    Ok(if verdict.ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_VIOLATIONS)
    })
}

fn cmd_aggregate(main: &Path, shadow: Option<&Path>) -> Result<ExitCode> {
    let entries =
        read_all(main).with_context(|| format!("failed to read {}", main.display()))?;
    let shadow_entries = match shadow {
        Some(path) => {
            read_all(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => Vec::new(),
    };

    let summary = aggregate(&entries, &shadow_entries);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}

struct AuditOverrides {
    sample_size: Option<usize>,
    threshold: Option<f64>,
    seed: Option<u64>,
    preview_length: Option<usize>,
    mode: Option<ScoringMode>,
}

fn cmd_audit(
    cli: &Cli,
    source: &Path,
    overrides: AuditOverrides,
    report_path: Option<&Path>,
) -> Result<ExitCode> {
    let mut config = load_config(cli)?.audit.to_config();
    config.sample_size = overrides.sample_size.unwrap_or(config.sample_size);
    config.threshold = overrides.threshold.unwrap_or(config.threshold);
    config.seed = overrides.seed.unwrap_or(config.seed);
    config.preview_length = overrides.preview_length.unwrap_or(config.preview_length);
    config.mode = overrides.mode.unwrap_or(config.mode);
    config.validate().context("invalid audit settings")?;

    let documents = load_documents(source)
        .with_context(|| format!("failed to load corpus {}", source.display()))?;
    let report = audit(&documents, &config).context("audit failed")?;
    tracing::info!(
        "audited {}/{} documents, {} pairs, {} anomalies",
        report.documents_sampled,
        report.documents_total,
        report.chunk_pairs_evaluated,
        report.anomalies.len()
    );

    let output = serde_json::to_string_pretty(&report)?;
    match report_path {
        Some(path) => {
            std::fs::write(path, format!("{output}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{output}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_schema(target: SchemaTarget) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&json_schema(target))?);
    Ok(ExitCode::SUCCESS)
}
