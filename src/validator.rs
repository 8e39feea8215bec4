// validator.rs - Proxy and TOR reachability checks
// Purpose: One HTTP probe per endpoint through the endpoint itself. No retries.

use crate::error::ReconError;
use crate::routing::ProxyEndpoint;
use async_trait::async_trait;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Proxy};
use std::time::Duration;

/// IP echo service used by default for every probe
pub const DEFAULT_PROBE_URL: &str = "http://httpbin.org/ip";

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { status: u16, body: String },
    Unreachable { reason: String },
}

impl ProbeOutcome {
    /// Any HTTP response came back
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }

    /// A response came back with a non-error status (< 400)
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { status, .. } if *status < 400)
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &ProxyEndpoint, timeout: Duration) -> ProbeOutcome;
}

/// Probes by fetching the echo URL through the endpoint with reqwest
#[derive(Debug, Clone)]
pub struct HttpProber {
    probe_url: String,
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_URL)
    }
}

impl HttpProber {
    pub fn new(probe_url: impl Into<String>) -> Self {
        Self {
            probe_url: probe_url.into(),
        }
    }

    fn client_for(endpoint: &ProxyEndpoint, timeout: Duration) -> Result<Client, reqwest::Error> {
        let proxy = Proxy::all(endpoint.as_url())?;
        Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &ProxyEndpoint, timeout: Duration) -> ProbeOutcome {
        let client = match Self::client_for(endpoint, timeout) {
            Ok(client) => client,
            Err(e) => {
                return ProbeOutcome::Unreachable {
                    reason: format!("invalid proxy: {}", e),
                };
            }
        };

        match client.get(&self.probe_url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                ProbeOutcome::Reachable { status, body }
            }
            Err(e) => ProbeOutcome::Unreachable {
                reason: e.to_string(),
            },
        }
    }
}

/// Verify TOR connectivity. Any HTTP response through the SOCKS endpoint counts.
/// Returns the echoed body (exit IP) on success.
pub async fn check_tor_connection<P: Prober + ?Sized>(
    prober: &P,
    endpoint: &ProxyEndpoint,
    timeout: Duration,
) -> Result<String, ReconError> {
    println!("{}", "[*] Checking TOR connection...".yellow());

    match prober.probe(endpoint, timeout).await {
        ProbeOutcome::Reachable { body, .. } => {
            println!(
                "{}",
                format!("[+] Connected to TOR. Your IP is: {}", body.trim()).green()
            );
            Ok(body)
        }
        ProbeOutcome::Unreachable { reason } => {
            println!(
                "{}",
                "[-] Failed to connect to TOR. Ensure TOR is running.".red()
            );
            Err(ReconError::TorUnreachable {
                endpoint: endpoint.to_string(),
                reason,
            })
        }
    }
}

/// Outcome of validating a proxy chain list
#[derive(Debug, Clone, Default)]
pub struct ProxyValidation {
    /// Working proxies, in the order they were listed
    pub valid: Vec<ProxyEndpoint>,
    /// Dropped candidates with the reason
    pub rejected: Vec<(String, String)>,
}

impl ProxyValidation {
    pub fn checked(&self) -> usize {
        self.valid.len() + self.rejected.len()
    }
}

/// Probe every candidate once and keep those that answered with a non-error status
pub async fn validate_proxies<P: Prober + ?Sized>(
    prober: &P,
    candidates: &[String],
    timeout: Duration,
) -> ProxyValidation {
    println!("{}", "[*] Validating proxy chain list...".yellow());

    let pb = ProgressBar::new(candidates.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }

    let mut report = ProxyValidation::default();

    for candidate in candidates {
        pb.set_message(candidate.clone());

        let Some(endpoint) = ProxyEndpoint::parse(candidate) else {
            pb.println(format!("{}", format!("[-] Failed: {} is not a proxy URL", candidate).red()));
            report
                .rejected
                .push((candidate.clone(), "unparsable".to_string()));
            pb.inc(1);
            continue;
        };

        let outcome = prober.probe(&endpoint, timeout).await;
        if outcome.is_ok() {
            pb.println(format!("{}", format!("[+] Success: Proxy {} is valid.", endpoint).green()));
            report.valid.push(endpoint);
        } else {
            let reason = match outcome {
                ProbeOutcome::Reachable { status, .. } => format!("HTTP {}", status),
                ProbeOutcome::Unreachable { reason } => reason,
            };
            pb.println(format!(
                "{}",
                format!("[-] Failed: Proxy {} is not valid ({})", endpoint, reason).red()
            ));
            report.rejected.push((candidate.clone(), reason));
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!(
        "{}",
        format!(
            "[+] {}/{} proxies usable",
            report.valid.len(),
            report.checked()
        )
        .green()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Answers from a fixed table keyed by host
    struct TableProber {
        answers: HashMap<String, ProbeOutcome>,
    }

    #[async_trait]
    impl Prober for TableProber {
        async fn probe(&self, endpoint: &ProxyEndpoint, _timeout: Duration) -> ProbeOutcome {
            self.answers
                .get(&endpoint.host)
                .cloned()
                .unwrap_or(ProbeOutcome::Unreachable {
                    reason: "connection refused".to_string(),
                })
        }
    }

    fn ok() -> ProbeOutcome {
        ProbeOutcome::Reachable {
            status: 200,
            body: "{\"origin\": \"1.2.3.4\"}".to_string(),
        }
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(ok().is_ok());
        let forbidden = ProbeOutcome::Reachable {
            status: 403,
            body: String::new(),
        };
        assert!(forbidden.is_reachable());
        assert!(!forbidden.is_ok());
        let down = ProbeOutcome::Unreachable {
            reason: "timeout".to_string(),
        };
        assert!(!down.is_reachable());
    }

    #[tokio::test]
    async fn test_validate_keeps_order_and_only_working() {
        let mut answers = HashMap::new();
        answers.insert("10.0.0.3".to_string(), ok());
        answers.insert("10.0.0.1".to_string(), ok());
        answers.insert(
            "10.0.0.2".to_string(),
            ProbeOutcome::Reachable {
                status: 502,
                body: String::new(),
            },
        );
        let prober = TableProber { answers };

        let candidates: Vec<String> = vec![
            "socks5://10.0.0.3:1080".to_string(),
            "http://10.0.0.2:8080".to_string(),
            "not a proxy".to_string(),
            "10.0.0.9:3128".to_string(),
            "10.0.0.1:3128".to_string(),
        ];

        let report = validate_proxies(&prober, &candidates, Duration::from_secs(1)).await;

        let hosts: Vec<&str> = report.valid.iter().map(|p| p.host.as_str()).collect();
        assert_eq!(hosts, vec!["10.0.0.3", "10.0.0.1"]);
        assert!(report.valid.len() <= candidates.len());
        assert_eq!(report.checked(), candidates.len());
        assert_eq!(report.rejected.len(), 3);
    }

    #[tokio::test]
    async fn test_validate_empty_list() {
        let prober = TableProber {
            answers: HashMap::new(),
        };
        let report = validate_proxies(&prober, &[], Duration::from_secs(1)).await;
        assert!(report.valid.is_empty());
        assert_eq!(report.checked(), 0);
    }

    #[tokio::test]
    async fn test_tor_check_accepts_any_response() {
        let mut answers = HashMap::new();
        answers.insert(
            "127.0.0.1".to_string(),
            ProbeOutcome::Reachable {
                status: 503,
                body: "1.2.3.4".to_string(),
            },
        );
        let prober = TableProber { answers };
        let tor = ProxyEndpoint::parse("socks5h://127.0.0.1:9050").unwrap();

        let body = check_tor_connection(&prober, &tor, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body, "1.2.3.4");
    }

    #[tokio::test]
    async fn test_tor_check_failure() {
        let prober = TableProber {
            answers: HashMap::new(),
        };
        let tor = ProxyEndpoint::parse("socks5h://127.0.0.1:9050").unwrap();

        let err = check_tor_connection(&prober, &tor, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::TorUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_http_prober_invalid_endpoint_is_unreachable() {
        // Nothing listens on port 9 of the loopback interface
        let prober = HttpProber::new("http://127.0.0.1:9/ip");
        let endpoint = ProxyEndpoint::parse("http://127.0.0.1:9").unwrap();
        let outcome = prober.probe(&endpoint, Duration::from_millis(500)).await;
        assert!(!outcome.is_reachable());
    }
}
