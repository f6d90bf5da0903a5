use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("star_gazers.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReferenceConfig {
    #[serde(default = "default_countries_path")]
    pub countries: PathBuf,
    #[serde(default = "default_cities_path")]
    pub cities: PathBuf,
    #[serde(default = "default_centroids_path")]
    pub centroids: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            countries: default_countries_path(),
            cities: default_cities_path(),
            centroids: default_centroids_path(),
        }
    }
}

fn default_countries_path() -> PathBuf {
    PathBuf::from("data/countries-readable.json")
}
fn default_cities_path() -> PathBuf {
    PathBuf::from("data/world-cities_json.json")
}
fn default_centroids_path() -> PathBuf {
    PathBuf::from("data/average-latitude-longitude-countries.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            per_page: default_per_page(),
            user: None,
            token_env: default_token_env(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_per_page() -> u32 {
    50
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default)]
    pub trace_country: Option<String>,
    #[serde(default = "default_map_output")]
    pub map_output: PathBuf,
    #[serde(default = "default_map_max_radius")]
    pub map_max_radius: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trace_country: None,
            map_output: default_map_output(),
            map_max_radius: default_map_max_radius(),
        }
    }
}

fn default_map_output() -> PathBuf {
    PathBuf::from("stars_map.html")
}
fn default_map_max_radius() -> f64 {
    3_000_000.0
}

impl Config {
    /// All defaults; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=100).contains(&config.github.per_page) {
        anyhow::bail!("github.per_page must be in [1, 100]");
    }

    if config.github.api_base.trim().is_empty() {
        anyhow::bail!("github.api_base must not be empty");
    }

    let radius = config.report.map_max_radius;
    if radius.is_nan() || radius <= 0.0 {
        anyhow::bail!("report.map_max_radius must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.cache.path, PathBuf::from("star_gazers.csv"));
        assert_eq!(config.github.per_page, 50);
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert!(config.report.trace_country.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [cache]
            path = "/tmp/stars.csv"

            [github]
            per_page = 100
            proxy = "http://proxy:3128"

            [report]
            trace_country = "brazil"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.path, PathBuf::from("/tmp/stars.csv"));
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.github.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.report.trace_country.as_deref(), Some("brazil"));
    }

    #[test]
    fn test_per_page_out_of_range() {
        assert!(parse("[github]\nper_page = 0").is_err());
        assert!(parse("[github]\nper_page = 101").is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse(include_str!("../config/stars.example.toml")).unwrap();
        assert_eq!(config.github.max_retries, 3);
        assert_eq!(config.report.map_output, PathBuf::from("stars_map.html"));
    }

    #[test]
    fn test_bad_radius() {
        assert!(parse("[report]\nmap_max_radius = -1.0").is_err());
    }
}
