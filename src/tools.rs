// tools.rs - Static catalog of the wrapped reconnaissance tools
// Purpose: Tool identifiers, argument templates and install hints

use crate::target::Target;
use serde::Serialize;
use std::fmt;

/// Which representation of the target a tool expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// `https://example.com`
    Url,
    /// `example.com`
    Host,
}

/// The eight scanners, in the order they run against every target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Dirsearch,
    Sublist3r,
    Amass,
    Curl,
    Nmap,
    WhatWeb,
    Nikto,
    SslScan,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Dirsearch,
        ToolKind::Sublist3r,
        ToolKind::Amass,
        ToolKind::Curl,
        ToolKind::Nmap,
        ToolKind::WhatWeb,
        ToolKind::Nikto,
        ToolKind::SslScan,
    ];

    pub fn binary(self) -> &'static str {
        match self {
            ToolKind::Dirsearch => "dirsearch",
            ToolKind::Sublist3r => "sublist3r",
            ToolKind::Amass => "amass",
            ToolKind::Curl => "curl",
            ToolKind::Nmap => "nmap",
            ToolKind::WhatWeb => "whatweb",
            ToolKind::Nikto => "nikto",
            ToolKind::SslScan => "sslscan",
        }
    }

    /// Header printed above the tool's output
    pub fn title(self) -> &'static str {
        match self {
            ToolKind::Dirsearch => "Dirsearch Results",
            ToolKind::Sublist3r => "Sublist3r Results",
            ToolKind::Amass => "Amass Results",
            ToolKind::Curl => "Curl HTTP Headers",
            ToolKind::Nmap => "Nmap Scan Results",
            ToolKind::WhatWeb => "WhatWeb Results",
            ToolKind::Nikto => "Nikto Scan Results",
            ToolKind::SslScan => "SSLScan Results",
        }
    }

    pub fn target_form(self) -> TargetForm {
        match self {
            ToolKind::Dirsearch | ToolKind::Curl | ToolKind::WhatWeb | ToolKind::Nikto => {
                TargetForm::Url
            }
            ToolKind::Sublist3r | ToolKind::Amass | ToolKind::Nmap | ToolKind::SslScan => {
                TargetForm::Host
            }
        }
    }

    /// Argument vector for this tool against `target`. The target appears exactly once.
    pub fn args(self, target: &Target) -> Vec<String> {
        let t = match self.target_form() {
            TargetForm::Url => target.url(),
            TargetForm::Host => target.host(),
        };

        let args: Vec<&str> = match self {
            ToolKind::Dirsearch => vec!["-u", t, "-e", "*"],
            ToolKind::Sublist3r => vec!["-d", t, "-o", "subdomains.txt"],
            ToolKind::Amass => vec!["enum", "-d", t, "-o", "amass_subdomains.txt"],
            ToolKind::Curl => vec!["-I", t],
            ToolKind::Nmap => vec!["-sV", "-p-", t],
            ToolKind::WhatWeb => vec![t],
            ToolKind::Nikto => vec!["-h", t],
            ToolKind::SslScan => vec![t],
        };

        args.into_iter().map(str::to_string).collect()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Tool definition with installation info
pub struct ToolInfo {
    pub name: &'static str,
    pub binary: &'static str,
    pub description: &'static str,
    pub is_core: bool,
    pub install_cmd: &'static str,
}

/// Every binary a run may need: the eight scanners plus the routing helpers
pub fn get_tools_list() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: "dirsearch",
            binary: ToolKind::Dirsearch.binary(),
            description: "Directory brute-forcer",
            is_core: true,
            install_cmd: "apt-get install -y dirsearch || pip3 install dirsearch",
        },
        ToolInfo {
            name: "sublist3r",
            binary: ToolKind::Sublist3r.binary(),
            description: "Subdomain enumeration",
            is_core: true,
            install_cmd: "apt-get install -y sublist3r || pip3 install sublist3r",
        },
        ToolInfo {
            name: "amass",
            binary: ToolKind::Amass.binary(),
            description: "Subdomain and OSINT enumeration",
            is_core: true,
            install_cmd: "apt-get install -y amass || go install -v github.com/owasp-amass/amass/v4/...@master",
        },
        ToolInfo {
            name: "curl",
            binary: ToolKind::Curl.binary(),
            description: "HTTP header fetch",
            is_core: true,
            install_cmd: "apt-get install -y curl",
        },
        ToolInfo {
            name: "nmap",
            binary: ToolKind::Nmap.binary(),
            description: "Port and service scanner",
            is_core: true,
            install_cmd: "apt-get install -y nmap",
        },
        ToolInfo {
            name: "whatweb",
            binary: ToolKind::WhatWeb.binary(),
            description: "Web technology fingerprinting",
            is_core: true,
            install_cmd: "apt-get install -y whatweb",
        },
        ToolInfo {
            name: "nikto",
            binary: ToolKind::Nikto.binary(),
            description: "Web server vulnerability scanner",
            is_core: true,
            install_cmd: "apt-get install -y nikto",
        },
        ToolInfo {
            name: "sslscan",
            binary: ToolKind::SslScan.binary(),
            description: "TLS/SSL configuration audit",
            is_core: true,
            install_cmd: "apt-get install -y sslscan",
        },
        // Routing helpers, only needed for Tor / proxy chain runs
        ToolInfo {
            name: "tor",
            binary: "tor",
            description: "Tor daemon (SOCKS on 127.0.0.1:9050)",
            is_core: false,
            install_cmd: "apt-get install -y tor && systemctl start tor",
        },
        ToolInfo {
            name: "proxychains",
            binary: "proxychains",
            description: "Proxy chaining wrapper",
            is_core: false,
            install_cmd: "apt-get install -y proxychains4",
        },
    ]
}
