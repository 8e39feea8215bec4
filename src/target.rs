// target.rs - Target parsing and normalization
// Purpose: Turn the free-text domain list into validated scan targets

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    // Optional http(s) scheme, hostname or IPv4, optional port, optional path.
    // Quotes, whitespace and shell metacharacters are never accepted.
    static ref RE_TARGET: Regex = Regex::new(
        r"(?i)^(?:https?://)?[a-z0-9_](?:[a-z0-9_.-]*[a-z0-9_])?(?::\d{1,5})?(?:/[a-z0-9._~%/?=+,:@!-]*)?$"
    )
    .unwrap();
}

/// A single domain under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    url: String,
    host: String,
}

impl Target {
    /// Validate raw user input and normalize it. Returns None for input that
    /// cannot be handed to an external tool safely.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !RE_TARGET.is_match(raw) {
            return None;
        }

        let url = ensure_scheme(raw);
        let host = extract_host(&url);
        if host.is_empty() {
            return None;
        }

        Some(Self { url, host })
    }

    /// Scheme-prefixed form, e.g. `https://example.com`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Bare hostname, e.g. `example.com`
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Prefix `https://` unless the input already carries an http(s) scheme
pub fn ensure_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn extract_host(url: &str) -> String {
    let without_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);

    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    authority
        .split(':')
        .next()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

/// Split a whitespace separated domain list into targets.
/// Returns the accepted targets (deduplicated, input order kept) and the rejected tokens.
pub fn parse_targets(input: &str) -> (Vec<Target>, Vec<String>) {
    let mut targets: Vec<Target> = Vec::new();
    let mut rejected = Vec::new();

    for token in input.split_whitespace() {
        match Target::parse(token) {
            Some(target) => {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
            None => rejected.push(token.to_string()),
        }
    }

    (targets, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scheme() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
        // "http" as a hostname prefix is not a scheme
        assert_eq!(ensure_scheme("httpbin.org"), "https://httpbin.org");
    }

    #[test]
    fn test_target_host_extraction() {
        let target = Target::parse("http://Sub.Example.com:8080/login?x=1").unwrap();
        assert_eq!(target.url(), "http://Sub.Example.com:8080/login?x=1");
        assert_eq!(target.host(), "sub.example.com");

        let bare = Target::parse("example.com").unwrap();
        assert_eq!(bare.url(), "https://example.com");
        assert_eq!(bare.host(), "example.com");
    }

    #[test]
    fn test_rejects_shell_metacharacters() {
        assert!(Target::parse("example.com;id").is_none());
        assert!(Target::parse("$(whoami).example.com").is_none());
        assert!(Target::parse("example.com|nc").is_none());
        assert!(Target::parse("`id`").is_none());
        assert!(Target::parse("").is_none());
        assert!(Target::parse("ftp://example.com").is_none());
    }

    #[test]
    fn test_parse_targets_dedup_and_order() {
        let (targets, rejected) =
            parse_targets("b.example.com a.example.com  bad;host b.example.com\thttp://c.example.com");

        let urls: Vec<&str> = targets.iter().map(|t| t.url()).collect();
        assert_eq!(
            urls,
            vec!["https://b.example.com", "https://a.example.com", "http://c.example.com"]
        );
        assert_eq!(rejected, vec!["bad;host".to_string()]);
    }
}
