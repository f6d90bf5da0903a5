//! GitHub stargazer ingestion.
//!
//! Fetches the stargazer list of a repository page by page, looks up each
//! stargazer's public profile, and writes one row per star to the CSV cache.
//!
//! # Pagination
//!
//! Pages are requested with `?page=N&per_page=M` and the
//! `application/vnd.github.v3.star+json` media type (which adds
//! `starred_at`). Fetching stops at the first empty page, or at the first
//! page request that fails with a non-retryable status; what was written up
//! to that point stays in the cache. A failed *profile* lookup is fatal,
//! since a star without its profile cannot be classified.
//!
//! # Retry Strategy
//!
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, …)
//! - Network errors → retry
//! - Anything else → returned to the caller as-is

use anyhow::{bail, Context, Result};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use stargazer_geo_core::models::parse_starred_at;
use stargazer_geo_core::StarEvent;

use crate::cache::CacheWriter;
use crate::config::GithubConfig;
use crate::progress::{IngestProgressEvent, IngestProgressReporter};

const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

/// `owner/name` of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse `https://github.com/<owner>/<repo>` (scheme, trailing slash and
/// `.git` suffix optional) or a bare `<owner>/<repo>`.
pub fn parse_repo_url(url: &str) -> Result<RepoRef> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("github.com/");
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => bail!(
            "Not a GitHub repository URL: '{}' (expected https://github.com/<owner>/<repo>)",
            url
        ),
    }
}

/// Credentials and proxy given on the command line; they win over config.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone)]
enum Auth {
    Anonymous,
    Token(String),
    Basic { user: String, password: Option<String> },
}

/// One entry of the stargazers listing.
#[derive(Debug, Deserialize)]
pub struct StargazerEntry {
    pub starred_at: String,
    pub user: StargazerUser,
}

#[derive(Debug, Deserialize)]
pub struct StargazerUser {
    pub login: String,
}

/// The subset of `GET /users/<login>` we keep.
#[derive(Debug, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserProfile {
    /// Combine a profile with the star timestamp from the listing.
    pub fn into_event(self, index: usize, starred_at: &str) -> Result<StarEvent> {
        Ok(StarEvent {
            login: self.login,
            user_id: self.id,
            company: non_blank(self.company),
            name: non_blank(self.name),
            location: non_blank(self.location),
            bio: non_blank(self.bio),
            starred_at: parse_starred_at(index, starred_at)?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Thin GitHub REST client with retry/backoff.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    auth: Auth,
    max_retries: u32,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, credentials: &Credentials) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("stargazer-geo/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = credentials.proxy.as_ref().or(config.proxy.as_ref()) {
            builder = builder.proxy(
                reqwest::Proxy::https(proxy)
                    .with_context(|| format!("Invalid HTTPS proxy: {}", proxy))?,
            );
        }

        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        let user = credentials.user.clone().or_else(|| config.user.clone());
        let auth = match (token, user) {
            (Some(token), _) => Auth::Token(token),
            (None, Some(user)) => Auth::Basic {
                user,
                password: credentials.password.clone(),
            },
            (None, None) => Auth::Anonymous,
        };

        Ok(Self {
            http: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth,
            max_retries: config.max_retries,
        })
    }

    pub fn stargazers_url(&self, repo: &RepoRef, page: u32, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/stargazers?page={}&per_page={}",
            self.api_base, repo.owner, repo.name, page, per_page
        )
    }

    pub fn user_url(&self, login: &str) -> String {
        format!("{}/users/{}", self.api_base, login)
    }

    /// One page of stargazers. `None` means the listing ended with an error status.
    pub async fn stargazer_page(
        &self,
        repo: &RepoRef,
        page: u32,
        per_page: u32,
    ) -> Result<Option<Vec<StargazerEntry>>> {
        let response = self.get(&self.stargazers_url(repo, page, per_page)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, page, body = %body, "stargazer listing stopped");
            return Ok(None);
        }
        let entries = response
            .json()
            .await
            .with_context(|| format!("Invalid stargazer page {} for {}", page, repo))?;
        Ok(Some(entries))
    }

    pub async fn user_profile(&self, login: &str) -> Result<UserProfile> {
        let response = self.get(&self.user_url(login)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("GET {} failed with {}: {}", self.user_url(login), status, body);
        }
        response
            .json()
            .await
            .with_context(|| format!("Invalid profile for user '{}'", login))
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(url, attempt, ?delay, "retrying");
                tokio::time::sleep(delay).await;
            }

            let request = self.http.get(url).header("Accept", STAR_MEDIA_TYPE);
            let request = match &self.auth {
                Auth::Anonymous => request,
                Auth::Token(token) => request.bearer_auth(token),
                Auth::Basic { user, password } => request.basic_auth(user, password.as_ref()),
            };

            match request.send().await {
                Ok(response) if is_retryable(response.status()) => {
                    last_err = Some(anyhow::anyhow!("GET {} returned {}", url, response.status()));
                }
                Ok(response) => return Ok(response),
                Err(e) => last_err = Some(e.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("GET {} failed after retries", url)))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Fetch every stargazer of `repo_url` into the cache at `cache_path`.
///
/// The cache is truncated first. Returns the number of stars written.
pub async fn run_query(
    config: &GithubConfig,
    credentials: &Credentials,
    repo_url: &str,
    cache_path: &Path,
    progress: &dyn IngestProgressReporter,
) -> Result<u64> {
    let repo = parse_repo_url(repo_url)?;
    let client = GithubClient::new(config, credentials)?;
    let mut writer = CacheWriter::create(cache_path)?;

    let mut page = 1u32;
    loop {
        progress.report(IngestProgressEvent::Page {
            repo: repo.to_string(),
            page,
        });

        let Some(entries) = client.stargazer_page(&repo, page, config.per_page).await? else {
            break;
        };
        if entries.is_empty() {
            break;
        }

        for entry in entries {
            let index = writer.written() as usize;
            let profile = client.user_profile(&entry.user.login).await?;
            let event = profile.into_event(index, &entry.starred_at)?;
            writer.write(&event)?;
            progress.report(IngestProgressEvent::Star {
                repo: repo.to_string(),
                login: event.login.clone(),
                n: writer.written(),
            });
        }
        page += 1;
    }

    tracing::info!(
        repo = %repo,
        stars = writer.written(),
        cache = %cache_path.display(),
        "fetch complete"
    );
    Ok(writer.written())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        let expected = RepoRef {
            owner: "NervanaSystems".to_string(),
            name: "distiller".to_string(),
        };
        for url in [
            "https://github.com/NervanaSystems/distiller",
            "https://github.com/NervanaSystems/distiller/",
            "https://github.com/NervanaSystems/distiller.git",
            "github.com/NervanaSystems/distiller",
            "NervanaSystems/distiller",
        ] {
            assert_eq!(parse_repo_url(url).unwrap(), expected, "for {}", url);
        }
    }

    #[test]
    fn test_parse_repo_url_rejects() {
        assert!(parse_repo_url("https://github.com/onlyowner").is_err());
        assert!(parse_repo_url("https://github.com/a/b/tree/main").is_err());
        assert!(parse_repo_url("").is_err());
    }

    #[test]
    fn test_urls() {
        let config = GithubConfig {
            api_base: "https://ghe.example.com/api/v3/".to_string(),
            ..GithubConfig::default()
        };
        let client = GithubClient::new(&config, &Credentials::default()).unwrap();
        let repo = parse_repo_url("octo/cat").unwrap();
        assert_eq!(
            client.stargazers_url(&repo, 2, 50),
            "https://ghe.example.com/api/v3/repos/octo/cat/stargazers?page=2&per_page=50"
        );
        assert_eq!(
            client.user_url("someone"),
            "https://ghe.example.com/api/v3/users/someone"
        );
    }

    #[test]
    fn test_stargazer_page_shape() {
        let json = r#"[
            {"starred_at": "2018-05-01T10:00:00Z", "user": {"login": "alice", "id": 1}},
            {"starred_at": "2018-05-02T11:00:00Z", "user": {"login": "bob", "id": 2}}
        ]"#;
        let entries: Vec<StargazerEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].user.login, "bob");
    }

    #[test]
    fn test_profile_into_event() {
        let json = r#"{
            "login": "alice", "id": 99, "company": null, "name": "Alice",
            "location": "  ", "bio": "Rustacean", "public_repos": 12
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        let event = profile.into_event(0, "2018-05-01T10:00:00Z").unwrap();
        assert_eq!(event.user_id, 99);
        assert_eq!(event.name.as_deref(), Some("Alice"));
        assert!(event.location.is_none());
        assert!(event.company.is_none());
        assert_eq!(event.starred_at_str(), "2018-05-01T10:00:00Z");
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }
}
