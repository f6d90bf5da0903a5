//! # Stargazer Geo CLI (`stars`)
//!
//! ## Usage
//!
//! ```bash
//! stars --config ./config/stars.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stars query-github --repo URL` | Fetch stargazers into the CSV cache |
//! | `stars geo-table` | Stars per country, ranked |
//! | `stars geo-map` | Stars per country on a world map (HTML) |
//! | `stars monthly` | New and cumulative stars per month |
//! | `stars daily` | New and cumulative stars per day |
//! | `stars detailed-month` | Daily stars for one month |
//! | `stars day-of-week` | Stars per weekday |
//!
//! ## Examples
//!
//! ```bash
//! GITHUB_TOKEN=... stars query-github --repo https://github.com/owner/repo
//! stars geo-table --trace-country brazil
//! stars geo-map --output ./out/map.html
//! stars detailed-month --month 9 --year 2018 --format json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use stargazer_geo::config::{self, Config};
use stargazer_geo::github::{self, Credentials};
use stargazer_geo::progress::{format_number, ProgressMode};
use stargazer_geo::{geo, map, trends, OutputFormat};
use stargazer_geo_core::temporal::Grouping;

/// Stargazer Geo: where a repository's stargazers live and when they came.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/stars.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "stars",
    version,
    about = "Stargazer geography and star history for GitHub repositories"
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stars.toml`. When that default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/stars.toml")]
    config: PathBuf,

    /// Star cache file; overrides `[cache] path`.
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every stargazer of a repository and write the cache.
    ///
    /// The cache file is truncated first. Each stargazer costs one extra
    /// request for the user profile, so authenticate for large repositories
    /// (token via the env var named by `github.token_env`, or --user/--password).
    QueryGithub {
        /// Repository URL, e.g. `https://github.com/owner/repo`.
        #[arg(long)]
        repo: String,

        /// Basic-auth user; falls back to `github.user`.
        #[arg(long)]
        user: Option<String>,

        /// Basic-auth password or personal access token.
        #[arg(long)]
        password: Option<String>,

        /// HTTPS proxy URL; falls back to `github.proxy`.
        #[arg(long)]
        proxy: Option<String>,

        /// Progress on stderr: off, human, json. Default: human when
        /// stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Stars per country, most-starred first.
    GeoTable {
        /// Log every location that matched this country.
        #[arg(long)]
        trace_country: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// Write a Leaflet HTML map with one circle per country.
    GeoMap {
        /// Output file; falls back to `report.map_output`.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        trace_country: Option<String>,
    },

    /// New and cumulative stars per month.
    Monthly {
        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// New and cumulative stars per day.
    Daily {
        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// Daily stars for one month, cumulative from everything before it.
    DetailedMonth {
        #[arg(long, default_value_t = 9)]
        month: u32,

        #[arg(long, default_value_t = 2018)]
        year: i32,

        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// Stars per day of the week, Monday first.
    DayOfWeek {
        /// Leave out the single busiest day.
        #[arg(long)]
        exclude_peak_day: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },
}

fn resolve_config(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli.config)?;
    let cache_path = cli.cache_file.clone().unwrap_or_else(|| cfg.cache.path.clone());

    match cli.command {
        Commands::QueryGithub {
            repo,
            user,
            password,
            proxy,
            progress,
        } => {
            let credentials = Credentials {
                user: user.or_else(|| cfg.github.user.clone()),
                password,
                proxy: proxy.or_else(|| cfg.github.proxy.clone()),
            };
            let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();
            let total = github::run_query(
                &cfg.github,
                &credentials,
                &repo,
                &cache_path,
                reporter.as_ref(),
            )
            .await?;
            println!("Total: {}", format_number(total));
        }
        Commands::GeoTable {
            trace_country,
            format,
        } => {
            geo::run_geo_table(&cfg, &cache_path, trace_country.as_deref(), format)?;
        }
        Commands::GeoMap {
            output,
            trace_country,
        } => {
            let output = output.unwrap_or_else(|| cfg.report.map_output.clone());
            map::run_geo_map(&cfg, &cache_path, &output, trace_country.as_deref())?;
        }
        Commands::Monthly { format } => {
            trends::run_grouped(&cache_path, Grouping::Monthly, format)?;
        }
        Commands::Daily { format } => {
            trends::run_grouped(&cache_path, Grouping::Daily, format)?;
        }
        Commands::DetailedMonth {
            month,
            year,
            format,
        } => {
            trends::run_month_detail(&cache_path, month, year, format)?;
        }
        Commands::DayOfWeek {
            exclude_peak_day,
            format,
        } => {
            trends::run_weekday(&cache_path, exclude_peak_day, format)?;
        }
    }

    Ok(())
}
