//! Upstream resolvers used for any query the registry declines.

use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};

/// One `hickory-resolver` client over a fixed set of nameservers.
struct StubResolver {
    resolver: TokioResolver,
}

impl StubResolver {
    fn from_config(config: ResolverConfig) -> Self {
        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default()).build();
        Self { resolver }
    }

    /// Issues the generic lookup underlying the resolver's own
    /// `lookup_ip`/`txt_lookup` helpers, so any query type (A, AAAA, MX,
    /// TXT, NS, CNAME, SOA, PTR, …) is proxied verbatim rather than only
    /// the two address types.
    async fn resolve(&self, qname: &str, record_type: RecordType) -> Option<Vec<RData>> {
        let lookup = self.resolver.lookup(qname, record_type).await.ok()?;
        Some(lookup.iter().cloned().collect())
    }
}

/// Composes the two fallback resolvers the registry defers to, in the
/// fixed order `[resolv.conf forwarder, explicit-servers forwarder]`. The
/// first to return any answer wins; a resolver configured with no servers
/// (explicit list empty) is simply absent from the chain.
pub struct Forwarder {
    resolv_conf: StubResolver,
    explicit: Option<StubResolver>,
}

impl Forwarder {
    /// `nameservers` seeds the explicit-servers resolver; it is always
    /// tried after the system's `/etc/resolv.conf` configuration, never
    /// instead of it.
    pub fn new(nameservers: &[std::net::SocketAddr]) -> Self {
        let resolv_conf = StubResolver::from_config(ResolverConfig::default());

        let explicit = if nameservers.is_empty() {
            None
        } else {
            let mut config = ResolverConfig::new();
            for addr in nameservers {
                config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            }
            Some(StubResolver::from_config(config))
        };

        Self { resolv_conf, explicit }
    }

    /// Resolves `qname` for `record_type` — any record type, not just
    /// A/AAAA — trying the resolv.conf resolver first and the
    /// explicit-servers resolver second. Any resolution failure (timeout,
    /// NXDOMAIN, SERVFAIL) at a stage is a plain miss that falls through to
    /// the next stage, not an error.
    pub async fn resolve(&self, qname: &str, record_type: RecordType) -> Option<Vec<RData>> {
        if let Some(answer) = self.resolv_conf.resolve(qname, record_type).await {
            return Some(answer);
        }

        match &self.explicit {
            Some(explicit) => explicit.resolve(qname, record_type).await,
            None => None,
        }
    }
}
