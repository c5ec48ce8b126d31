use crate::cli::Cli;
use std::fmt;
use std::path::PathBuf;

/// Runtime configuration shared by every component of a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_server: String,
    pub token_file: PathBuf,
    pub ca_file: PathBuf,
    pub verify_tls: bool,
    pub output: PathBuf,
    pub run_before_minute: u32,
    pub token_request_fallback: bool,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            api_server: cli.api_server.trim_end_matches('/').to_string(),
            token_file: cli.token_file.clone(),
            ca_file: cli.ca_file.clone(),
            verify_tls: cli.verify_tls,
            output: cli.output.clone(),
            run_before_minute: cli.run_before_minute,
            token_request_fallback: cli.token_request_fallback,
        }
    }
}

/// Raw bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    /// Returns `None` for a blank token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub namespace: String,
    pub pod: String,
    pub accessible: bool,
}

/// Totals of a single gated run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub namespaces: usize,
    pub pods: usize,
    pub accessible: usize,
    pub duplicates: usize,
    pub lines: usize,
}
