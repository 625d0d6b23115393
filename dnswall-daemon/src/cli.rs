//! Daemon CLI flags and environment-variable fallback.
//!
//! Resolution order for every setting is: explicit flag > environment
//! variable > built-in default (or "required" for the backend URL). Nothing
//! here touches `clap`'s `env` feature — fallback is applied by hand so the
//! precedence is explicit and easy to unit test.

use clap::Parser;
use dnswall_core::error::{Error, Result};

#[derive(Debug, Parser)]
#[command(version, about = "dnswall DNS front-end and HTTP admin daemon")]
pub struct Cli {
    /// KV backend connection string, e.g. etcd://kv:2379/dnswall?pattern=svc.local
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Address the DNS front-end binds (UDP and TCP).
    #[arg(short = 'a', long = "addr")]
    pub addr: Option<String>,

    /// Address the HTTP admin surface binds.
    #[arg(long = "http-addr")]
    pub http_addr: Option<String>,

    /// Comma-separated upstream nameservers used by the forwarder.
    #[arg(short = 'n', long = "nameservers")]
    pub nameservers: Option<String>,

    /// Comma-separated suffix patterns restricting which names the registry
    /// serves. Overrides any `pattern=` query parameters on the backend URL.
    #[arg(short = 'p', long = "patterns")]
    pub patterns: Option<String>,
}

/// Fully resolved daemon configuration, after flag/env/default resolution
/// and eager validation.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub dns_addr: std::net::SocketAddr,
    pub http_addr: std::net::SocketAddr,
    pub nameservers: Vec<std::net::SocketAddr>,
    pub patterns: Vec<String>,
}

fn env_or(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

impl Cli {
    /// Resolves flags against environment fallbacks and defaults, then
    /// validates shapes eagerly so startup fails fast with a typed error
    /// rather than panicking deep inside a server task.
    pub fn resolve(self) -> Result<Config> {
        let backend_url = self
            .backend
            .or_else(|| env_or("DNSWALL_BACKEND"))
            .ok_or_else(|| Error::MalformedConfig("missing required --backend (or DNSWALL_BACKEND)".to_string()))?;

        let addr = self
            .addr
            .or_else(|| env_or("DNSWALL_ADDR"))
            .unwrap_or_else(|| "0.0.0.0:53".to_string());
        let dns_addr = addr
            .parse()
            .map_err(|_| Error::MalformedConfig(format!("invalid --addr socket address: {addr}")))?;

        let http_addr = self
            .http_addr
            .or_else(|| env_or("DNSWALL_HTTP_ADDR"))
            .unwrap_or_else(|| "0.0.0.0:9090".to_string());
        let http_addr = http_addr.parse().map_err(|_| {
            Error::MalformedConfig(format!("invalid --http-addr socket address: {http_addr}"))
        })?;

        let nameservers = self
            .nameservers
            .or_else(|| env_or("DNSWALL_SERVERS"))
            .unwrap_or_default();
        let nameservers = nameservers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse().map_err(|_| {
                    Error::MalformedConfig(format!("invalid nameserver socket address: {s}"))
                })
            })
            .collect::<Result<Vec<std::net::SocketAddr>>>()?;

        let patterns = self
            .patterns
            .or_else(|| env_or("DNSWALL_PATTERNS"))
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            backend_url,
            dns_addr,
            http_addr,
            nameservers,
            patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fails_without_backend() {
        let cli = Cli {
            backend: None,
            addr: None,
            http_addr: None,
            nameservers: None,
            patterns: None,
        };
        assert!(matches!(cli.resolve(), Err(Error::MalformedConfig(_))));
    }

    #[test]
    fn resolve_applies_defaults() {
        let cli = Cli {
            backend: Some("etcd://kv:2379/dnswall".to_string()),
            addr: None,
            http_addr: None,
            nameservers: None,
            patterns: None,
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.dns_addr.to_string(), "0.0.0.0:53");
        assert_eq!(config.http_addr.to_string(), "0.0.0.0:9090");
        assert!(config.nameservers.is_empty());
    }

    #[test]
    fn resolve_parses_nameservers_and_patterns() {
        let cli = Cli {
            backend: Some("etcd://kv:2379/dnswall".to_string()),
            addr: None,
            http_addr: None,
            nameservers: Some("1.1.1.1:53, 8.8.8.8:53".to_string()),
            patterns: Some("svc.local, int.local".to_string()),
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.nameservers.len(), 2);
        assert_eq!(config.patterns, vec!["svc.local", "int.local"]);
    }

    #[test]
    fn resolve_rejects_bad_addr() {
        let cli = Cli {
            backend: Some("etcd://kv:2379/dnswall".to_string()),
            addr: Some("not-an-address".to_string()),
            http_addr: None,
            nameservers: None,
            patterns: None,
        };
        assert!(matches!(cli.resolve(), Err(Error::MalformedConfig(_))));
    }
}
