//! Domain matching
//!
//! Hostnames are compared by loose, bidirectional substring containment after
//! normalization, so `google.com` matches `mail.google.com` and the reverse.
//! This is imprecise on purpose: a short pattern can also match an unrelated
//! longer host (`docs.google.com` vs a plain `google.com` search page). Callers
//! that need exact matching should not use this module.

use crate::error::EngineError;
use url::Url;

/// Lower-case, trim, drop a trailing dot and any leading `www.` labels
pub fn normalize(domain: &str) -> String {
    let mut normalized = domain.trim().to_lowercase();
    while normalized.ends_with('.') {
        normalized.pop();
    }
    while let Some(rest) = normalized.strip_prefix("www.") {
        normalized = rest.to_string();
    }
    normalized
}

/// Bidirectional containment of the normalized operands.
///
/// Empty operands never match.
pub fn matches(domain: &str, pattern: &str) -> bool {
    let domain = normalize(domain);
    let pattern = normalize(pattern);
    if domain.is_empty() || pattern.is_empty() {
        return false;
    }
    domain.contains(&pattern) || pattern.contains(&domain)
}

/// Whether `domain` matches any of `patterns`
pub fn is_in_list<S: AsRef<str>>(domain: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches(domain, p.as_ref()))
}

/// The parts of a tab URL the evaluator looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    host: String,
    path: String,
    url: Url,
}

impl PageUrl {
    /// Parse a tab URL. URLs without a host (`about:blank`, `data:`) are rejected.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let url = Url::parse(raw).map_err(|e| EngineError::InvalidUrl(format!("{raw}: {e}")))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| EngineError::InvalidUrl(format!("{raw}: no host")))?
            .to_string();
        let path = url.path().to_string();
        Ok(Self { host, path, url })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query-string parameter, percent-decoded
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}
