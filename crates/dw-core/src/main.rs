//! dropwatch core: suppression detection over daily count series.
//!
//! The main entry point for dw-core, handling:
//! - Detection runs for a single entity
//! - Day-to-day model inspection
//! - Configuration management

use clap::{Args, Parser, Subcommand, ValueEnum};
use dw_common::error::format_error_human;
use dw_common::{EntityKey, Error, Result, StructuredError};
use dw_config::validate::validate_config;
use dw_config::{list_presets, DetectorConfig, TapSet, CONFIG_SCHEMA_VERSION};
use dw_core::config::{load_config, ConfigOptions, ResolvedConfig};
use dw_core::exit_codes::ExitCode;
use dw_core::log_event;
use dw_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFlags, LogFormat, LogLevel,
    Stage,
};
use dw_core::pipeline::{detect, hash_input, train_model};
use dw_core::series::SeriesSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// dropwatch: detect suppression events in daily count series
#[derive(Parser)]
#[command(name = "dw-core")]
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
    /// Output format for results and errors
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Minimum log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "DW_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON on stdout
    Json,
    /// One line per result, human-readable errors
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Run suppression detection for one entity
    Detect(DetectArgs),

    /// Train and print the day-to-day model
    Model(ModelArgs),

    /// Configuration management
    Config(ConfigArgs),
}

/// Config file and preset selection
#[derive(Args, Debug, Clone)]
struct ConfigSelect {
    /// Config file (TOML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset to start from when no config file is found
    #[arg(long)]
    preset: Option<String>,
}

impl ConfigSelect {
    fn options(&self) -> ConfigOptions {
        ConfigOptions {
            config_path: self.config.clone(),
            preset: self.preset.clone(),
        }
    }
}

/// Overrides shared by the commands that train a model
#[derive(Args, Debug, Clone)]
struct RunOverrides {
    /// Input series document (JSON)
    #[arg(long, short)]
    input: PathBuf,

    /// Comma-separated taps in days, e.g. "1,7"
    #[arg(long)]
    taps: Option<String>,

    /// Trailing window of days to analyze
    #[arg(long)]
    days: Option<usize>,

    /// Size of the reference basket
    #[arg(long)]
    top: Option<usize>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    select: ConfigSelect,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Entity key to analyze
    #[arg(long, short)]
    entity: String,

    /// Override the particle count
    #[arg(long)]
    particles: Option<usize>,

    #[command(flatten)]
    run: RunOverrides,
}

#[derive(Args, Debug)]
struct ModelArgs {
    #[command(flatten)]
    run: RunOverrides,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration and its snapshot
    Show(ConfigSelect),
    /// Validate the resolved configuration
    Validate(ConfigSelect),
    /// Print the JSON Schema of the configuration file
    Schema,
    /// List the built-in presets
    Presets,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(LogFlags {
        level: cli.global.log_level,
        format: cli.global.log_format,
        verbose: cli.global.verbose,
        quiet: cli.global.quiet,
    });
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    let result = match &cli.command {
        Commands::Detect(args) => run_detect(&cli.global, &ctx, args),
        Commands::Model(args) => run_model(&cli.global, &ctx, args),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => output_error(&cli.global, &e),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

/// Envelope around every JSON payload.
#[derive(Serialize)]
struct Response<'a, T: Serialize> {
    schema_version: &'a str,
    run_id: &'a str,
    generated_at: String,
    #[serde(flatten)]
    body: T,
}

fn print_json<T: Serialize>(ctx: &LogContext, body: T) -> Result<()> {
    let response = Response {
        schema_version: CONFIG_SCHEMA_VERSION,
        run_id: &ctx.run_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        body,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Load config, apply CLI overrides, and re-validate.
fn resolve_run_config(
    ctx: &LogContext,
    overrides: &RunOverrides,
) -> Result<(ResolvedConfig, DetectorConfig)> {
    let resolved = load_config(&overrides.select.options())?;
    let mut config = resolved.config.clone();
    if let Some(taps) = &overrides.taps {
        config.taps = TapSet::parse(taps)?;
    }
    if let Some(days) = overrides.days {
        config.window_days = Some(days);
    }
    if let Some(top) = overrides.top {
        config.model.reference_count = top;
    }
    if let Some(seed) = overrides.seed {
        config.filter.seed = Some(seed);
    }
    validate_config(&config)?;
    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "run configured",
        taps = config.taps.to_string().as_str(),
        particles = config.filter.particle_count
    );
    Ok((resolved, config))
}

fn read_input(path: &Path) -> Result<(SeriesSet, String)> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::Input(format!("{} is not UTF-8: {}", path.display(), e)))?;
    let set = SeriesSet::from_json(&text)?;
    Ok((set, hash_input(text.as_bytes())))
}

fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    (StdRng::seed_from_u64(seed), seed)
}

fn run_detect(global: &GlobalOpts, ctx: &LogContext, args: &DetectArgs) -> Result<ExitCode> {
    let (resolved, mut config) = resolve_run_config(ctx, &args.run)?;
    if let Some(particles) = args.particles {
        config.filter.particle_count = particles;
        validate_config(&config)?;
    }
    let (set, input_hash) = read_input(&args.run.input)?;
    let entity = EntityKey::new(args.entity.as_str());
    let (mut rng, seed) = seeded_rng(config.filter.seed);

    let report = detect(&mut rng, &set, &entity, &config, ctx)?;
    let anomalies = report.summary.anomalies_found();
    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Classify,
        "detection finished",
        anomalies = anomalies,
        seed = seed
    );

    match global.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Body<'a> {
                seed: u64,
                input_hash: String,
                config: dw_config::ConfigSnapshot,
                report: &'a dw_core::pipeline::DetectionReport,
            }
            print_json(
                ctx,
                Body {
                    seed,
                    input_hash,
                    config: resolved.snapshot_of(&config),
                    report: &report,
                },
            )?;
        }
        OutputFormat::Summary => {
            let s = &report.summary;
            println!(
                "{} {}: {} steps, {} events ({} drops, {} rises), {} elevated, {} high, seed {}",
                ctx.run_id,
                report.entity,
                s.steps,
                s.events,
                s.drops,
                s.rises,
                s.elevated_steps,
                s.high_steps,
                seed
            );
            for c in report.classifications.iter().filter(|c| c.is_anomalous()) {
                println!(
                    "  {} step {}: censored {:.3} cumulative {:.3} {:?} {:?}",
                    c.date.as_deref().unwrap_or("-"),
                    c.step,
                    c.censored_fraction,
                    c.cumulative_fraction,
                    c.event,
                    c.activity
                );
            }
        }
    }

    Ok(if anomalies {
        ExitCode::AnomaliesFound
    } else {
        ExitCode::Clean
    })
}

fn run_model(global: &GlobalOpts, ctx: &LogContext, args: &ModelArgs) -> Result<ExitCode> {
    let (_, config) = resolve_run_config(ctx, &args.run)?;
    let (set, input_hash) = read_input(&args.run.input)?;
    let windowed = match config.window_days {
        Some(days) => set.window(days),
        None => set,
    };
    let (mut rng, seed) = seeded_rng(config.filter.seed);
    let trained = train_model(&mut rng, &windowed, &config.taps, &config.model)?;
    log_event!(
        ctx,
        INFO,
        event_names::MODEL_BUILT,
        Stage::Train,
        "day-to-day model built",
        reference = trained.reference.len(),
        positions = trained.model.len()
    );

    match global.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Body<'a> {
                seed: u64,
                input_hash: String,
                dates: &'a [String],
                model: &'a dw_core::pipeline::TrainedModel,
            }
            print_json(
                ctx,
                Body {
                    seed,
                    input_hash,
                    dates: windowed.dates(),
                    model: &trained,
                },
            )?;
        }
        OutputFormat::Summary => {
            println!(
                "model: {} positions, taps {}, {} reference entities",
                trained.model.len(),
                config.taps,
                trained.reference.len()
            );
        }
    }
    Ok(ExitCode::Clean)
}

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show(select) => {
            let resolved = load_config(&select.options())?;
            match global.format {
                OutputFormat::Json => {
                    #[derive(Serialize)]
                    struct Body {
                        snapshot: dw_config::ConfigSnapshot,
                        config: DetectorConfig,
                    }
                    print_json(
                        ctx,
                        Body {
                            snapshot: resolved.snapshot(),
                            config: resolved.config,
                        },
                    )?;
                }
                OutputFormat::Summary => {
                    let snapshot = resolved.snapshot();
                    println!(
                        "config: {} ({}) effective {}",
                        snapshot.config_path.as_deref().unwrap_or("<preset>"),
                        snapshot.config_source,
                        snapshot.short_id()
                    );
                }
            }
        }
        ConfigCommands::Validate(select) => {
            let resolved = load_config(&select.options())?;
            match global.format {
                OutputFormat::Json => {
                    let snapshot = resolved.snapshot();
                    print_json(
                        ctx,
                        serde_json::json!({
                            "status": "valid",
                            "path": snapshot.config_path,
                            "source": snapshot.config_source,
                            "effective_hash": snapshot.effective_hash,
                        }),
                    )?;
                }
                OutputFormat::Summary => println!("config validate: OK"),
            }
        }
        ConfigCommands::Schema => {
            println!("{}", serde_json::to_string_pretty(&DetectorConfig::json_schema())?);
        }
        ConfigCommands::Presets => match global.format {
            OutputFormat::Json => print_json(ctx, serde_json::json!({ "presets": list_presets() }))?,
            OutputFormat::Summary => {
                for p in list_presets() {
                    println!("{:<10} {}", p.name, p.description);
                }
            }
        },
    }
    Ok(ExitCode::Clean)
}

/// Report an error on stderr in the requested format.
fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(error).to_json()),
        OutputFormat::Summary => {
            eprintln!("{}", format_error_human(error, std::io::stderr().is_terminal()))
        }
    }
    ExitCode::from(error)
}
