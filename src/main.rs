use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

use sphinx_conf::{render_conf_py, to_json, to_yaml, DocsConfig, DocsSettings};

#[derive(Parser)]
#[command(name = "sphinx-conf", version, about = "Resolve Sphinx documentation-build configuration")]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true, default_value = "docs/sphinx-conf.toml")]
    config: PathBuf,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved configuration
    Show {
        #[arg(short, long, value_enum, default_value_t = Format::Py)]
        format: Format,
    },
    /// Write the resolved configuration as a conf.py
    Write {
        /// Defaults to conf.py next to the settings file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List documentation sources under a directory
    Sources {
        /// Defaults to the settings file's directory
        dir: Option<PathBuf>,
        /// List skipped paths instead of sources
        #[arg(long)]
        excluded: bool,
    },
    /// Print the copyright line
    Copyright {
        /// Year to derive for instead of the current one
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Py,
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let settings = DocsSettings::load(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    let base_dir = settings_dir(&cli.config);

    match cli.command {
        Command::Show { format } => {
            let config = resolve(settings, &base_dir)?;
            let rendered = match format {
                Format::Py => render_conf_py(&config)?,
                Format::Json => to_json(&config)?,
                Format::Yaml => to_yaml(&config)?,
            };
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
        Command::Write { output } => {
            let config = resolve(settings, &base_dir)?;
            let output = output.unwrap_or_else(|| base_dir.join("conf.py"));
            let rendered = render_conf_py(&config)?;
            std::fs::write(&output, rendered)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
        Command::Sources { dir, excluded } => {
            let root = dir.unwrap_or_else(|| base_dir.clone());
            let found = settings
                .general
                .discover_sources(&root)
                .with_context(|| format!("Failed to scan {}", root.display()))?;
            let listed = if excluded { found.excluded } else { found.sources };
            for path in listed {
                println!("{}", path.display());
            }
        }
        Command::Copyright { year } => {
            let config = match year {
                Some(year) => DocsConfig::resolve_for_year(settings, &base_dir, year),
                None => DocsConfig::resolve(settings, &base_dir),
            }
            .context("Failed to resolve configuration")?;
            println!("{}", config.info.copyright);
        }
    }

    Ok(())
}

fn resolve(settings: DocsSettings, base_dir: &Path) -> Result<DocsConfig> {
    DocsConfig::resolve(settings, base_dir).context("Failed to resolve configuration")
}

fn settings_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
