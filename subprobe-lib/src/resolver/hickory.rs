//! Query backend built on `hickory-resolver`.
//!
//! All DNS protocol work (encoding, transport, retries, nameserver rotation)
//! happens inside hickory. This module only translates between its types and
//! the adapter's: query types to record types, answers to strings, and
//! resolve errors to a numeric code plus message.

use super::{Completion, QueryBackend};
use crate::error::ScanError;
use crate::types::{QueryType, ScanConfig};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::fmt;
use std::net::IpAddr;
use tracing::debug;

/// Numeric codes for failures where no DNS response code is available.
/// Values follow c-ares' error numbering.
pub mod codes {
    /// The server answered but the response was malformed or unusable
    pub const BAD_RESPONSE: u16 = 10;
    /// No nameserver could be reached
    pub const CONNECTION_REFUSED: u16 = 11;
    /// No answer before the configured timeout
    pub const TIMEOUT: u16 = 12;
    /// Anything else the resolver reported
    pub const OTHER: u16 = 16;
}

/// Backend issuing real DNS queries through a tokio-driven hickory resolver.
#[derive(Clone)]
pub struct HickoryBackend {
    resolver: TokioAsyncResolver,
    nameservers: Vec<IpAddr>,
}

impl HickoryBackend {
    /// Build a resolver from explicit scan settings.
    ///
    /// Uses `config.nameservers` over plain UDP/TCP port 53; an empty list
    /// falls back to the operating system's resolver configuration. Timeout
    /// and attempts come from `config` in both cases.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if a nameserver is not an IP address or
    /// the system configuration cannot be read.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let nameservers = parse_nameservers(&config.nameservers)?;

        let (resolver_config, mut opts) = if nameservers.is_empty() {
            read_system_conf().map_err(|e| {
                ScanError::config(format!("Failed to read system resolver configuration: {}", e))
            })?
        } else {
            let group = NameServerConfigGroup::from_ips_clear(&nameservers, 53, true);
            (
                ResolverConfig::from_parts(None, vec![], group),
                ResolverOpts::default(),
            )
        };

        opts.timeout = config.timeout;
        opts.attempts = config.attempts;

        debug!(
            nameservers = ?nameservers,
            timeout = ?config.timeout,
            attempts = config.attempts,
            "built hickory resolver"
        );

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
            nameservers,
        })
    }

    /// Nameservers this backend was configured with (empty for system config).
    pub fn nameservers(&self) -> &[IpAddr] {
        &self.nameservers
    }
}

impl fmt::Debug for HickoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryBackend")
            .field("nameservers", &self.nameservers)
            .finish_non_exhaustive()
    }
}

impl QueryBackend for HickoryBackend {
    fn submit(&self, name: &str, query_type: QueryType, completion: Completion) {
        let resolver = self.resolver.clone();
        let name = name.to_string();
        let record_type = record_type(query_type);

        tokio::spawn(async move {
            let outcome = resolver
                .lookup(absolute_name(&name).as_str(), record_type)
                .await
                .map(|lookup| {
                    lookup
                        .iter()
                        .filter(|rdata| rdata.record_type() == record_type)
                        .map(render_rdata)
                        .collect()
                })
                .map_err(|err| map_resolve_error(&err));

            if !completion.complete(outcome) {
                debug!(name = %name, "dropping answer for abandoned query");
            }
        });
    }
}

/// Fully qualified form of `name`, so the lookup never walks resolv.conf
/// search domains.
pub fn absolute_name(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Map a symbolic query type to hickory's record type via its numeric code.
pub fn record_type(query_type: QueryType) -> RecordType {
    RecordType::from(query_type.code())
}

fn parse_nameservers(nameservers: &[String]) -> Result<Vec<IpAddr>, ScanError> {
    nameservers
        .iter()
        .map(|ns| {
            ns.trim().parse::<IpAddr>().map_err(|_| {
                ScanError::config(format!("Invalid nameserver address '{}'", ns))
            })
        })
        .collect()
}

/// Addresses render as bare IPs; other record data uses its zone-file text.
fn render_rdata(rdata: &RData) -> String {
    match rdata {
        RData::A(a) => a.0.to_string(),
        RData::AAAA(aaaa) => aaaa.0.to_string(),
        other => other.to_string(),
    }
}

fn map_resolve_error(err: &ResolveError) -> ScanError {
    let code = match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => u16::from(*response_code),
        ResolveErrorKind::Timeout => codes::TIMEOUT,
        ResolveErrorKind::NoConnections | ResolveErrorKind::Io(_) => codes::CONNECTION_REFUSED,
        ResolveErrorKind::Proto(_) => codes::BAD_RESPONSE,
        _ => codes::OTHER,
    };
    ScanError::resolver(code, err.to_string())
}
