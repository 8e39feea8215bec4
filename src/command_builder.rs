// command_builder.rs - Tool invocation construction
// Purpose: Combine a target, a tool template and the routing mode into an argv

use crate::routing::RoutingMode;
use crate::target::Target;
use crate::tools::ToolKind;
use serde::Serialize;
use std::fmt;

/// Default proxy-chaining wrapper binary
pub const PROXYCHAINS_BIN: &str = "proxychains";

/// A fully built invocation. Executed without a shell; `Display` renders a
/// shell-quoted form for the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub tool: ToolKind,
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// True when the invocation goes through the proxy-chaining wrapper
    pub fn is_wrapped(&self) -> bool {
        self.tool.binary() != self.program
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.argv().into_iter().map(shell_quote).collect();
        f.write_str(&rendered.join(" "))
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Builds command lines with a fixed wrapper binary
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    proxychains_bin: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(PROXYCHAINS_BIN)
    }
}

impl CommandBuilder {
    pub fn new(proxychains_bin: impl Into<String>) -> Self {
        Self {
            proxychains_bin: proxychains_bin.into(),
        }
    }

    /// Pure: the same inputs always give the same command line.
    ///
    /// | routing    | result                                   |
    /// |------------|------------------------------------------|
    /// | Direct     | `<tool> <args>`                          |
    /// | Tor        | `proxychains <tool> <args>`              |
    /// | ProxyChain | `proxychains -q [-f conf] <tool> <args>` |
    ///
    /// An empty ProxyChain still gets the quiet wrapper.
    pub fn build(&self, target: &Target, tool: ToolKind, routing: &RoutingMode) -> CommandLine {
        let tool_args = tool.args(target);

        match routing {
            RoutingMode::Direct => CommandLine {
                tool,
                program: tool.binary().to_string(),
                args: tool_args,
            },
            RoutingMode::Tor => {
                let mut args = vec![tool.binary().to_string()];
                args.extend(tool_args);
                CommandLine {
                    tool,
                    program: self.proxychains_bin.clone(),
                    args,
                }
            }
            RoutingMode::ProxyChain(chain) => {
                let mut args = vec!["-q".to_string()];
                if let Some(ref conf) = chain.config_path {
                    args.push("-f".to_string());
                    args.push(conf.display().to_string());
                }
                args.push(tool.binary().to_string());
                args.extend(tool_args);
                CommandLine {
                    tool,
                    program: self.proxychains_bin.clone(),
                    args,
                }
            }
        }
    }
}

/// Build with the default wrapper binary
pub fn build(target: &Target, tool: ToolKind, routing: &RoutingMode) -> CommandLine {
    CommandBuilder::default().build(target, tool, routing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{ProxyChain, ProxyEndpoint};
    use std::path::PathBuf;

    fn modes() -> Vec<RoutingMode> {
        vec![
            RoutingMode::Direct,
            RoutingMode::Tor,
            RoutingMode::ProxyChain(ProxyChain {
                proxies: vec![ProxyEndpoint::parse("socks5://1.2.3.4:1080").unwrap()],
                config_path: Some(PathBuf::from("/tmp/stealthhawk-proxychains.conf")),
            }),
            RoutingMode::ProxyChain(ProxyChain::default()),
        ]
    }

    #[test]
    fn test_target_appears_once_for_every_mode_and_tool() {
        let target = Target::parse("example.com").unwrap();
        for routing in modes() {
            for tool in ToolKind::ALL {
                let cmd = build(&target, tool, &routing);
                let rendered = cmd.to_string();
                assert_eq!(
                    rendered.matches("example.com").count(),
                    1,
                    "{:?} / {:?}: {}",
                    tool,
                    routing,
                    rendered
                );
            }
        }
    }

    #[test]
    fn test_direct_has_no_wrapper() {
        let target = Target::parse("example.com").unwrap();
        let cmd = build(&target, ToolKind::Nmap, &RoutingMode::Direct);
        assert_eq!(cmd.program, "nmap");
        assert!(!cmd.is_wrapped());
        assert!(!cmd.to_string().contains("proxychains"));
        assert_eq!(cmd.to_string(), "nmap -sV -p- example.com");
    }

    #[test]
    fn test_tor_wrapper_without_quiet_flag() {
        let target = Target::parse("example.com").unwrap();
        let cmd = build(&target, ToolKind::Curl, &RoutingMode::Tor);
        assert_eq!(cmd.program, "proxychains");
        assert!(cmd.is_wrapped());
        assert!(!cmd.args.contains(&"-q".to_string()));
        assert_eq!(cmd.to_string(), "proxychains curl -I https://example.com");
    }

    #[test]
    fn test_proxy_chain_wrapper_is_quiet() {
        let target = Target::parse("example.com").unwrap();
        let routing = &modes()[2];
        let cmd = build(&target, ToolKind::WhatWeb, routing);
        assert_eq!(
            cmd.argv(),
            vec![
                "proxychains",
                "-q",
                "-f",
                "/tmp/stealthhawk-proxychains.conf",
                "whatweb",
                "https://example.com"
            ]
        );
    }

    #[test]
    fn test_empty_proxy_chain_still_wrapped() {
        let target = Target::parse("example.com").unwrap();
        let cmd = build(&target, ToolKind::SslScan, &RoutingMode::ProxyChain(ProxyChain::default()));
        assert_eq!(cmd.to_string(), "proxychains -q sslscan example.com");
    }

    #[test]
    fn test_display_quotes_glob() {
        let target = Target::parse("example.com").unwrap();
        let cmd = build(&target, ToolKind::Dirsearch, &RoutingMode::Direct);
        assert_eq!(cmd.to_string(), "dirsearch -u https://example.com -e '*'");
    }

    #[test]
    fn test_custom_wrapper_binary() {
        let target = Target::parse("example.com").unwrap();
        let builder = CommandBuilder::new("proxychains4");
        let cmd = builder.build(&target, ToolKind::Nikto, &RoutingMode::Tor);
        assert_eq!(cmd.argv(), vec!["proxychains4", "nikto", "-h", "https://example.com"]);
    }
}
