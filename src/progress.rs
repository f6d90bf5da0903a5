//! Ingestion progress reporting.
//!
//! Reports progress during `stars query-github` so users can see which page
//! is being fetched and how many stargazers have been written. Progress is
//! emitted on **stderr** so stdout stays clean for scripts.

use std::io::Write;

/// A single progress event for ingestion.
#[derive(Clone, Debug)]
pub enum IngestProgressEvent {
    /// A stargazer page is being requested.
    Page { repo: String, page: u32 },
    /// One more stargazer has been written to the cache.
    Star { repo: String, login: String, n: u64 },
}

/// Reports ingestion progress. Implementations write to stderr (human or JSON).
pub trait IngestProgressReporter: Send + Sync {
    fn report(&self, event: IngestProgressEvent);
}

/// Human-friendly progress on stderr, one line per event:
///
/// ```text
/// fetch owner/repo  page 3
/// fetch owner/repo     1,204 stars  octocat
/// ```
pub struct StderrProgress;

fn human_line(event: &IngestProgressEvent) -> String {
    match event {
        IngestProgressEvent::Page { repo, page } => {
            format!("fetch {}  page {}\n", repo, page)
        }
        IngestProgressEvent::Star { repo, login, n } => {
            format!("fetch {}  {:>8} stars  {}\n", repo, format_number(*n), login)
        }
    }
}

impl IngestProgressReporter for StderrProgress {
    fn report(&self, event: IngestProgressEvent) {
        let line = human_line(&event);
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IngestProgressReporter for JsonProgress {
    fn report(&self, event: IngestProgressEvent) {
        let obj = match &event {
            IngestProgressEvent::Page { repo, page } => serde_json::json!({
                "event": "progress",
                "repo": repo,
                "phase": "page",
                "page": page
            }),
            IngestProgressEvent::Star { repo, login, n } => serde_json::json!({
                "event": "progress",
                "repo": repo,
                "phase": "star",
                "login": login,
                "n": n
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _event: IngestProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IngestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn human_lines() {
        let page = IngestProgressEvent::Page {
            repo: "owner/repo".to_string(),
            page: 3,
        };
        assert_eq!(human_line(&page), "fetch owner/repo  page 3\n");

        let star = IngestProgressEvent::Star {
            repo: "owner/repo".to_string(),
            login: "octocat".to_string(),
            n: 1204,
        };
        assert_eq!(human_line(&star), "fetch owner/repo     1,204 stars  octocat\n");
    }
}
