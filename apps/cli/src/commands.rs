//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use datawalker_core::pipeline::{BuildConfig, BuildResult, ProgressReporter};
use datawalker_discovery::{PageLocator, missing_data_files};
use datawalker_shared::{AppConfig, init_config, init_config_at, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Datawalker — stitch section pages into one scroll narrative.
#[derive(Parser)]
#[command(
    name = "datawalker",
    version,
    about = "Merge per-section HTML pages into a single scroll-driven document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./datawalker.toml, then ~/.datawalker/datawalker.toml).
    #[arg(long, global = true, env = "DATAWALKER_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Build the composite document.
    Build {
        /// Output file (defaults to `output.path` from config).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Page shell template (defaults to `output.template`, then the built-in shell).
        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// Report configured pages and data files that do not exist.
    Check,

    /// Survey section pages and print a JSON report.
    Analyze {
        /// Write the report here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "datawalker=info",
        1 => "datawalker=debug",
        _ => "datawalker=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Build { out, template } => cmd_build(config_path, out, template),
        Command::Check => cmd_check(config_path),
        Command::Analyze { out } => cmd_analyze(config_path, out.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    template: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if template.is_some() {
        config.output.template = template;
    }
    let out = out.unwrap_or_else(|| config.output.path.clone());

    let build_config = BuildConfig::from_app_config(&config)?;
    missing_data_files(&config.source.data_root, &config.source.data_files);

    info!(
        root = %build_config.source_root.display(),
        sections = build_config.sections.len(),
        out = %out.display(),
        "building document"
    );

    let reporter = CliProgress::new();
    let result = datawalker_core::run_to_file(&build_config, &out, &reporter)?;

    // Print summary
    println!();
    println!("  Document written!");
    println!("  Path:     {}", out.display());
    println!("  Sections: {}", result.section_count);
    println!("  Pages:    {}", result.page_count);
    println!("  Missing:  {}", result.misses.len());
    for miss in &result.misses {
        println!("            - {miss}");
    }
    println!("  SHA-256:  {}", result.digest);
    println!("  Time:     {:.2}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_check(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    config.validate()?;

    let locator = PageLocator::open(&config.source.root, &config.source.subdirs)?;
    locator.validate(&config.sections)?;

    let missing_pages = locator.missing_files(&config.sections);
    let missing_data = missing_data_files(&config.source.data_root, &config.source.data_files);

    println!();
    println!("  Source root: {}", locator.root().display());
    println!("  Searching:   {} directories", locator.search_dirs().len());
    println!();
    for section in &config.sections {
        println!("  {}", section.name);
        for file in &section.files {
            let mark = match locator.locate(&section.name, file) {
                Some(_) => "ok",
                None => "MISSING",
            };
            println!("    [{mark:>7}] {file}");
        }
    }
    println!();
    println!("  Data files ({})", config.source.data_root.display());
    for name in &config.source.data_files {
        let mark = if missing_data.contains(name) { "MISSING" } else { "ok" };
        println!("    [{mark:>7}] {name}");
    }
    println!();

    if missing_pages.is_empty() && missing_data.is_empty() {
        println!("  All files present.");
    } else {
        println!(
            "  {} page(s) and {} data file(s) missing.",
            missing_pages.len(),
            missing_data.len()
        );
    }
    println!();

    Ok(())
}

fn cmd_analyze(config_path: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let build_config = BuildConfig::from_app_config(&config)?;

    let report = datawalker_core::analyze(&build_config)?;

    match out {
        Some(path) => {
            report.write_json(path)?;
            println!(
                "Analysis of {} page(s) written to {}",
                report.page_count(),
                path.display()
            );
        }
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => {
            if path.exists() {
                return Err(eyre!("'{}' already exists", path.display()));
            }
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_processed(&self, file: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracting [{current}/{total}] {file}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
