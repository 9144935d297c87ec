//! Image source loading for `<img>` elements.
//!
//! `data:` URIs and local files are always available. http(s) sources are
//! fetched when the `remote` feature is enabled, each bounded by the loader
//! timeout and by the deadline of the pass that requested it. Every other
//! scheme is unsupported.

use base64::Engine as _;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("unsupported image source: {0}")]
    Unsupported(String),

    #[error("failed to read {src}: {reason}")]
    Read { src: String, reason: String },

    #[error("fetching {0} timed out")]
    Timeout(String),
}

pub struct ResourceLoader {
    timeout: Duration,
    #[cfg(feature = "remote")]
    client: std::sync::OnceLock<reqwest::blocking::Client>,
}

impl ResourceLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            #[cfg(feature = "remote")]
            client: std::sync::OnceLock::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load the raw bytes behind `src`, giving up on remote sources once
    /// `deadline` has passed.
    pub fn load(&self, src: &str, deadline: Instant) -> Result<Vec<u8>, LoadError> {
        let src = src.trim();
        if src.starts_with("data:") {
            return parse_data_uri(src).ok_or_else(|| LoadError::Read {
                src: truncate(src),
                reason: "malformed data URI".into(),
            });
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return self.fetch(src, deadline);
        }
        let path = match src.strip_prefix("file://") {
            Some(p) => p,
            None if src.contains("://") => return Err(LoadError::Unsupported(truncate(src))),
            None => src,
        };
        std::fs::read(path).map_err(|e| LoadError::Read { src: src.to_string(), reason: e.to_string() })
    }

    /// Time left for one fetch: the loader timeout, cut short by `deadline`.
    pub fn fetch_budget(&self, deadline: Instant) -> Option<Duration> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            None
        } else {
            Some(remaining.min(self.timeout))
        }
    }

    #[cfg(feature = "remote")]
    fn fetch(&self, src: &str, deadline: Instant) -> Result<Vec<u8>, LoadError> {
        let budget = self.fetch_budget(deadline).ok_or_else(|| LoadError::Timeout(src.to_string()))?;
        let parsed = url::Url::parse(src).map_err(|_| LoadError::Unsupported(src.to_string()))?;
        // Built lazily so the blocking client is created on the thread that uses it.
        let client = match self.client.get() {
            Some(c) => c,
            None => {
                let built = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| LoadError::Read { src: src.to_string(), reason: e.to_string() })?;
                self.client.get_or_init(|| built)
            }
        };
        log::debug!("fetching image {} (budget {:?})", parsed, budget);
        let read_err = |e: reqwest::Error| {
            if e.is_timeout() {
                LoadError::Timeout(src.to_string())
            } else {
                LoadError::Read { src: src.to_string(), reason: e.to_string() }
            }
        };
        let resp = client.get(parsed).timeout(budget).send().map_err(read_err)?;
        if !resp.status().is_success() {
            return Err(LoadError::Read { src: src.to_string(), reason: format!("HTTP {}", resp.status()) });
        }
        resp.bytes().map(|b| b.to_vec()).map_err(read_err)
    }

    #[cfg(not(feature = "remote"))]
    fn fetch(&self, src: &str, _deadline: Instant) -> Result<Vec<u8>, LoadError> {
        Err(LoadError::Unsupported(src.to_string()))
    }
}

fn parse_data_uri(uri: &str) -> Option<Vec<u8>> {
    let (header, payload) = uri.strip_prefix("data:")?.split_once(',')?;
    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()
    } else {
        Some(payload.as_bytes().to_vec())
    }
}

fn truncate(src: &str) -> String {
    if src.len() <= 64 {
        return src.to_string();
    }
    let mut end = 64;
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &src[..end])
}
