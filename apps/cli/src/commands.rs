//! CLI command definitions, routing, and tracing setup.

use std::fs;
use std::path::{Path, PathBuf};

use certnorm_content::normalize_content;
use certnorm_core::{
    BatchSummary, Document, NormalizeOptions, ProgressReporter, normalize_document,
    normalize_files,
};
use certnorm_dedupe::prune;
use certnorm_shared::{AppConfig, Tokens, config_file_path, init_config, load_config};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// certnorm: normalize certification exam schedules and syllabi.
#[derive(Parser)]
#[command(
    name = "certnorm",
    version,
    about = "Normalize certification exam schedule tables and content trees into canonical JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Year for dates written without one (defaults to config, then the current year).
    #[arg(long, env = "CERTNORM_BASE_YEAR", global = true)]
    pub base_year: Option<i32>,

    /// Token dictionary TOML replacing the built-in one.
    #[arg(long, env = "CERTNORM_TOKENS", global = true)]
    pub tokens: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Normalize the schedule of one document, table JSON, or HTML file.
    Schedule {
        /// Input file (.json or .html).
        file: PathBuf,
    },

    /// Normalize the syllabus and coverage of a content tree.
    Content {
        /// Input JSON file.
        file: PathBuf,
    },

    /// Run the full pipeline over one or more documents.
    Normalize {
        /// Input files.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write `<name>.normalized.json` per input into this directory
        /// instead of printing.
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Token dictionary operations.
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Token dictionary subcommands.
#[derive(Subcommand)]
pub(crate) enum TokensAction {
    /// Load and compile a dictionary, reporting problems.
    Check {
        /// Dictionary to check (defaults to the resolved one).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the built-in dictionary.
    Default,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// valid JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "certnorm=info",
        1 => "certnorm=debug",
        _ => "certnorm=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Shared settings
// ---------------------------------------------------------------------------

/// Flags merged over the config file.
struct Settings {
    options: NormalizeOptions,
    tokens_path: Option<PathBuf>,
    pretty: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &AppConfig) -> Self {
        let base_year = cli
            .base_year
            .or(config.defaults.base_year)
            .unwrap_or_else(|| chrono::Local::now().year());
        Self {
            options: NormalizeOptions {
                base_year: Some(base_year),
            },
            tokens_path: cli
                .tokens
                .clone()
                .or_else(|| config.tokens.path.as_ref().map(PathBuf::from)),
            pretty: cli.pretty || config.defaults.pretty,
        }
    }

    fn load_tokens(&self) -> Result<Tokens> {
        Tokens::load(self.tokens_path.as_deref()).wrap_err("failed to load token dictionary")
    }

    fn render(&self, value: &Value) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let settings = Settings::resolve(&cli, &config);
    debug!(base_year = ?settings.options.base_year, tokens = ?settings.tokens_path, "settings resolved");

    match cli.command {
        Command::Schedule { file } => cmd_schedule(&settings, &file),
        Command::Content { file } => cmd_content(&settings, &file),
        Command::Normalize { files, out_dir } => cmd_normalize(&settings, &files, out_dir.as_deref()),
        Command::Tokens { action } => match action {
            TokensAction::Check { path } => cmd_tokens_check(&settings, path.as_deref()),
            TokensAction::Default => {
                print!("{}", certnorm_shared::DEFAULT_TOKENS);
                Ok(())
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_schedule(settings: &Settings, file: &Path) -> Result<()> {
    let tokens = settings.load_tokens()?;
    let (doc, kind) = Document::from_path(file)?;
    info!(file = %file.display(), ?kind, "normalizing schedule");

    let out = normalize_document(&doc, &tokens, &settings.options);
    let value = prune(serde_json::to_value(&out.schedule)?);
    println!("{}", settings.render(&value)?);
    Ok(())
}

fn cmd_content(settings: &Settings, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file).wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| eyre!("{} is not valid JSON: {e}", file.display()))?;
    info!(file = %file.display(), "normalizing content");

    let out = normalize_content(&raw);
    let value = prune(serde_json::to_value(&out)?);
    println!("{}", settings.render(&value)?);
    Ok(())
}

fn cmd_normalize(settings: &Settings, files: &[PathBuf], out_dir: Option<&Path>) -> Result<()> {
    let tokens = settings.load_tokens()?;
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir).wrap_err_with(|| format!("cannot create {}", dir.display()))?;
    }

    let reporter = CliProgress::new(files.len());
    let (outcomes, summary) = normalize_files(files, &tokens, &settings.options, &reporter);

    let mut printed = serde_json::Map::new();
    for outcome in outcomes {
        let output = match outcome.result {
            Ok(output) => output,
            Err(e) => {
                eprintln!("  skipped {}: {e}", outcome.path.display());
                continue;
            }
        };
        let value = output.to_pruned_json()?;
        match out_dir {
            Some(dir) => {
                let target = dir.join(output_name(&outcome.path));
                fs::write(&target, settings.render(&value)?)
                    .wrap_err_with(|| format!("cannot write {}", target.display()))?;
                info!(path = %target.display(), "wrote output");
            }
            None => {
                printed.insert(outcome.path.display().to_string(), value);
            }
        }
    }

    if out_dir.is_none() {
        println!("{}", settings.render(&Value::Object(printed))?);
    }

    eprintln!();
    eprintln!("  Documents:  {} ({} failed)", summary.documents, summary.failed);
    eprintln!("  Schedule:   {} entries, {} time slots", summary.entries, summary.time_slots);
    eprintln!("  Content:    {} syllabus, {} coverage", summary.syllabus, summary.coverage);
    eprintln!("  Time:       {:.2}s", summary.elapsed.as_secs_f64());

    if summary.documents == 0 && summary.failed > 0 {
        return Err(eyre!("no document could be normalized"));
    }
    Ok(())
}

/// `dir/page.json` → `page.normalized.json`
fn output_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    format!("{stem}.normalized.json")
}

fn cmd_tokens_check(settings: &Settings, path: Option<&Path>) -> Result<()> {
    let path = path.or(settings.tokens_path.as_deref());
    let tokens = Tokens::load(path).wrap_err("token dictionary is invalid")?;
    println!(
        "Token dictionary OK ({}): {} field matchers",
        path.map_or_else(|| "built-in".to_string(), |p| p.display().to_string()),
        tokens.fields.len(),
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    if let Ok(path) = config_file_path() {
        println!("# {}", path.display());
    }
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar on stderr.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn document_started(&self, path: &Path, _current: usize, _total: usize) {
        self.bar.set_message(path.display().to_string());
    }

    fn document_finished(&self, _path: &Path, _ok: bool) {
        self.bar.inc(1);
    }

    fn done(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}
