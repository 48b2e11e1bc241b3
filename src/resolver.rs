//! DMARC policy discovery. The DNS work is behind the [`DnsResolver`]
//! trait; the core only builds the `_dmarc.` lookup name, feeds candidate
//! TXT strings to the parser, and distinguishes "no policy published"
//! (an expected outcome, returned as `None`) from transport failures
//! (propagated unchanged).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    #[error("NXDOMAIN: domain does not exist")]
    NxDomain,
    #[error("SERVFAIL: server failure")]
    ServFail,
    #[error("timeout")]
    Timeout,
    #[error("DNS error: {0}")]
    Other(String),
}

/// DNS TXT lookup collaborator consumed by [`Record::query`].
pub trait DnsResolver: Clone + Send + Sync + 'static {
    fn query_txt(&self, name: &str) -> impl Future<Output = Result<Vec<String>, DnsError>> + Send;
}

impl Record {
    /// Discover the DMARC policy published for `domain`.
    ///
    /// Queries the TXT records at `_dmarc.<domain>` and returns the first
    /// candidate string that parses as a DMARC record. `Ok(None)` means the
    /// domain publishes no usable policy (NXDOMAIN, empty answer, or no
    /// parseable candidate); other DNS failures propagate unchanged.
    pub async fn query<R: DnsResolver>(
        resolver: &R,
        domain: &str,
    ) -> Result<Option<Record>, DnsError> {
        let name = domain::lookup_name(domain);
        debug!(name = %name, "looking up DMARC policy");

        let candidates = match resolver.query_txt(&name).await {
            Ok(candidates) => candidates,
            Err(DnsError::NxDomain) => return Ok(None),
            Err(err) => return Err(err),
        };

        for candidate in &candidates {
            match Record::parse(candidate) {
                Ok(record) => return Ok(Some(record)),
                Err(err) => {
                    warn!(name = %name, error = %err, "TXT candidate is not a valid DMARC record");
                }
            }
        }

        Ok(None)
    }
}

/// Hickory-backed resolver.
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Resolver with default configuration.
    pub fn new() -> Self {
        let resolver = TokioResolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .build();
        Self { resolver }
    }

    /// Resolver with explicit configuration and options.
    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();
        Self { resolver }
    }

    fn classify_error(e: &hickory_resolver::ResolveError) -> DnsError {
        let msg = e.to_string().to_lowercase();
        if msg.contains("nxdomain") || msg.contains("no records") {
            DnsError::NxDomain
        } else if msg.contains("timeout") {
            DnsError::Timeout
        } else if msg.contains("servfail") {
            DnsError::ServFail
        } else {
            DnsError::Other(e.to_string())
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsResolver for HickoryResolver {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => Ok(lookup.iter().map(|txt| txt.to_string()).collect()),
            Err(e) => Err(Self::classify_error(&e)),
        }
    }
}

/// In-memory resolver for tests.
#[derive(Clone, Default)]
pub struct MockResolver {
    txt_records: Arc<Mutex<HashMap<String, Vec<String>>>>,
    errors: Arc<Mutex<HashMap<String, DnsError>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_txt(&self, name: &str, records: Vec<String>) {
        self.txt_records
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), records);
    }

    pub fn set_nxdomain(&self, name: &str) {
        self.set_error(name, DnsError::NxDomain);
    }

    pub fn set_error(&self, name: &str, error: DnsError) {
        self.errors.lock().unwrap().insert(name.to_lowercase(), error);
    }
}

impl DnsResolver for MockResolver {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let name = name.to_lowercase();
        if let Some(err) = self.errors.lock().unwrap().get(&name) {
            return Err(err.clone());
        }
        Ok(self
            .txt_records
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default())
    }
}
