//! # Stargazer Geo
//!
//! Where do a GitHub repository's stargazers live, and when did they arrive?
//!
//! `stars query-github` walks a repository's stargazer list and caches one
//! CSV row per user profile. The report commands then read that cache:
//! the free-text `location` of each profile is matched to a country with the
//! rules in [`stargazer_geo_core::matcher`], and star timestamps are bucketed
//! by month, day and weekday.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────────┐
//! │ GitHub API   │──▶│  CSV cache  │──▶│ geo-table / geo-map  │
//! │ (reqwest)    │   │ (csv crate) │   │ monthly / daily / …  │
//! └──────────────┘   └─────────────┘   └──────────────────────┘
//!                                              ▲
//!                        countries + cities ───┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`cache`] | Star cache reader and writer |
//! | [`github`] | Stargazer ingestion from the GitHub API |
//! | [`progress`] | Ingestion progress on stderr |
//! | [`reference`] | Reference dataset loading |
//! | [`geo`] | Stars-per-country table |
//! | [`map`] | Leaflet HTML map |
//! | [`trends`] | Star history reports |

pub mod cache;
pub mod config;
pub mod geo;
pub mod github;
pub mod map;
pub mod progress;
pub mod reference;
pub mod trends;

/// Output format for report commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text tables.
    #[default]
    Console,
    /// Pretty-printed JSON on stdout.
    Json,
}
