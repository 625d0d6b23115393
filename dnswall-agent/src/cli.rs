//! Agent CLI flags and environment-variable fallback.

use clap::Parser;
use dnswall_core::error::{Error, Result};

#[derive(Debug, Parser)]
#[command(version, about = "dnswall container discovery agent")]
pub struct Cli {
    /// KV backend connection string, e.g. etcd://kv:2379/dnswall?pattern=svc.local
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Docker daemon address.
    #[arg(long = "docker-url")]
    pub docker_url: Option<String>,

    /// Client TLS certificate used when connecting to the docker daemon.
    #[arg(long = "docker-tlscert")]
    pub docker_tls_cert: Option<String>,

    /// Client TLS key used when connecting to the docker daemon.
    #[arg(long = "docker-tlskey")]
    pub docker_tls_key: Option<String>,

    /// CA certificate used to verify the docker daemon.
    #[arg(long = "docker-tlsca")]
    pub docker_tls_ca: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert: String,
    pub key: String,
    pub ca: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub docker_url: String,
    pub tls: Option<TlsConfig>,
}

fn env_or(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

impl Cli {
    pub fn resolve(self) -> Result<Config> {
        let backend_url = self
            .backend
            .or_else(|| env_or("DNSWALL_BACKEND"))
            .ok_or_else(|| Error::MalformedConfig("missing required --backend (or DNSWALL_BACKEND)".to_string()))?;

        let docker_url = self
            .docker_url
            .or_else(|| env_or("DNSWALL_DOCKER_URL"))
            .unwrap_or_else(|| "unix:///var/run/docker.sock".to_string());

        let cert = self.docker_tls_cert.or_else(|| env_or("DNSWALL_TLS_CERT"));
        let key = self.docker_tls_key.or_else(|| env_or("DNSWALL_TLS_KEY"));
        let ca = self.docker_tls_ca.or_else(|| env_or("DNSWALL_TLS_CA"));

        let tls = match (cert, key, ca) {
            (Some(cert), Some(key), Some(ca)) => Some(TlsConfig { cert, key, ca }),
            (None, None, None) => None,
            _ => {
                return Err(Error::MalformedConfig(
                    "docker TLS requires cert, key and ca to all be set".to_string(),
                ))
            }
        };

        Ok(Config {
            backend_url,
            docker_url,
            tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            backend: Some("etcd://kv:2379/dnswall".to_string()),
            docker_url: None,
            docker_tls_cert: None,
            docker_tls_key: None,
            docker_tls_ca: None,
        }
    }

    #[test]
    fn resolve_applies_docker_default() {
        let config = empty_cli().resolve().unwrap();
        assert_eq!(config.docker_url, "unix:///var/run/docker.sock");
        assert!(config.tls.is_none());
    }

    #[test]
    fn resolve_rejects_partial_tls_config() {
        let mut cli = empty_cli();
        cli.docker_tls_cert = Some("/cert.pem".to_string());
        assert!(matches!(cli.resolve(), Err(Error::MalformedConfig(_))));
    }

    #[test]
    fn resolve_accepts_full_tls_config() {
        let mut cli = empty_cli();
        cli.docker_tls_cert = Some("/cert.pem".to_string());
        cli.docker_tls_key = Some("/key.pem".to_string());
        cli.docker_tls_ca = Some("/ca.pem".to_string());
        let config = cli.resolve().unwrap();
        assert!(config.tls.is_some());
    }
}
