// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone analysis: turn a flat record set into services grouped by subdomain.
//!
//! One pass works on an index arena of the input records plus a claimed bit per
//! record. Every recognizer of the registry runs in priority order, searches the
//! unclaimed records and claims the ones it understands. Whatever is left when
//! all recognizers ran becomes one [`Orphan`] service per record, except DNSSEC
//! artifacts and the `__dnssec.<origin>` bookkeeping TXT which are dropped.
//!
//! A recognizer error aborts the whole pass: no partial analysis is ever
//! returned.
//!
//! # Example
//!
//! ```rust
//! use dnsvc::analyzer::analyze_zone;
//! use dnsvc::record::Record;
//! use dnsvc::registry::ServiceRegistry;
//!
//! let registry = ServiceRegistry::builtin().unwrap();
//! let records = vec![Record::txt("_scaleway-challenge", 300, "example.com.", "abc123")];
//!
//! let analysis = analyze_zone(&registry, "example.com.", records).unwrap();
//! let services = &analysis.services[""];
//! assert_eq!(services[0].meta.type_key, "abstract.ScalewayChallenge");
//! assert_eq!(services[0].meta.comment, "abc123");
//! ```

use hickory_proto::rr::RecordType;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::constants::DNSSEC_BOOKKEEPING_LABEL;
use crate::dns_errors::AnalyzerError;
use crate::metrics;
use crate::record::{fqdn, is_dnssec_type, relative_to, Record};
use crate::registry::ServiceRegistry;
use crate::service::{DynService, ServiceCombined, ServiceId, ServiceKind};
use crate::services::orphan::Orphan;

/// Index of a record in the analyzer arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

/// Handle on a service created during the current pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSlot {
    domain: String,
    index: usize,
}

impl ServiceSlot {
    /// Subdomain, relative to the origin, the service lives under.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Record search criteria. All set fields must match; empty or zero fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Owner name starts with this text
    pub prefix: String,

    /// Owner name equals this absolute name
    pub domain: String,

    /// Owner name ends with this text
    pub subdomains_of: String,

    /// Canonical text contains this text
    pub contains: String,

    /// Record type
    pub rtype: Option<RecordType>,

    /// TTL in seconds
    pub ttl: u32,
}

impl RecordFilter {
    /// Filter on record type.
    #[must_use]
    pub fn of_type(rtype: RecordType) -> Self {
        Self {
            rtype: Some(rtype),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = fqdn(domain);
        self
    }

    #[must_use]
    pub fn with_subdomains_of(mut self, suffix: impl Into<String>) -> Self {
        self.subdomains_of = suffix.into();
        self
    }

    #[must_use]
    pub fn with_contains(mut self, needle: impl Into<String>) -> Self {
        self.contains = needle.into();
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether `record` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let name = record.name();

        starts_with_ignore_case(name, &self.prefix)
            && ends_with_ignore_case(name, &self.subdomains_of)
            && (self.domain.is_empty() || name.eq_ignore_ascii_case(&self.domain))
            && self.rtype.map_or(true, |t| record.rtype() == t)
            && (self.ttl == 0 || record.ttl() == self.ttl)
            && (self.contains.is_empty() || record.canonical_text().contains(&self.contains))
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
    text.len()
        .checked_sub(suffix.len())
        .is_some_and(|start| {
            text.is_char_boundary(start) && text[start..].eq_ignore_ascii_case(suffix)
        })
}

/// Outcome of one analysis pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Services by subdomain relative to the origin (`""` for the apex).
    /// Owners outside the zone keep their absolute name.
    pub services: BTreeMap<String, Vec<ServiceCombined>>,

    /// Zone default TTL inferred from the records
    pub default_ttl: u32,

    /// Records deliberately discarded without a service
    pub dropped: usize,
}

impl Analysis {
    /// Total number of services.
    #[must_use]
    pub fn nb_services(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }

    /// Sum of the resource counts of all services.
    #[must_use]
    pub fn nb_resources(&self) -> usize {
        self.services
            .values()
            .flatten()
            .map(|s| s.meta.nb_resources)
            .sum()
    }
}

/// Working state of one analysis pass, handed to each recognizer.
#[derive(Debug)]
pub struct Analyzer {
    origin: String,
    arena: Vec<Record>,
    claimed: Vec<bool>,
    services: BTreeMap<String, Vec<ServiceCombined>>,
    default_ttl: u32,
    dropped: usize,
    current: &'static str,
}

impl Analyzer {
    /// Start a pass over `records`, with `fallback_ttl` as default TTL of an empty zone.
    #[must_use]
    pub fn new(origin: &str, records: Vec<Record>, fallback_ttl: u32) -> Self {
        let default_ttl = most_used_ttl(&records).unwrap_or(fallback_ttl);
        let claimed = vec![false; records.len()];

        Self {
            origin: fqdn(origin),
            arena: records,
            claimed,
            services: BTreeMap::new(),
            default_ttl,
            dropped: 0,
            current: "",
        }
    }

    /// Absolute zone origin.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Default TTL of the zone under analysis.
    #[must_use]
    pub fn default_ttl(&self) -> u32 {
        self.default_ttl
    }

    /// Unclaimed records matching any of `filters`, in input order, each at most once.
    #[must_use]
    pub fn search_rr(&self, filters: &[RecordFilter]) -> Vec<(RecordId, Record)> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.claimed[*i])
            .filter(|(_, record)| filters.iter().any(|f| f.matches(record)))
            .map(|(i, record)| (RecordId(i), record.clone()))
            .collect()
    }

    /// Read a record of the arena, claimed or not.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.arena.get(id.0)
    }

    /// Claim record `id` for `domain`.
    ///
    /// With `Some(service)`, a new service is created under the subdomain of
    /// `domain` relative to the origin, identified by the record's canonical
    /// text. With `None`, the record is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::ClaimInconsistency`] when `id` is unknown or
    /// already claimed.
    pub fn use_rr(
        &mut self,
        id: RecordId,
        domain: &str,
        service: Option<Box<dyn DynService>>,
    ) -> Result<Option<ServiceSlot>, AnalyzerError> {
        let record = self.claim(id)?;

        let Some(service) = service else {
            self.dropped += 1;
            return Ok(None);
        };

        let subdomain = relative_to(domain, &self.origin);
        let ttl = self.ttl_for(&record);
        let combined = ServiceCombined::new(
            service,
            ServiceId::from_record(&record),
            &subdomain,
            ttl,
            &self.origin,
        );

        let list = self.services.entry(subdomain.clone()).or_default();
        list.push(combined);

        Ok(Some(ServiceSlot {
            domain: subdomain,
            index: list.len() - 1,
        }))
    }

    /// Drop record `id` without creating any service.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::use_rr`].
    pub fn drop_rr(&mut self, id: RecordId) -> Result<(), AnalyzerError> {
        self.use_rr(id, "", None).map(|_| ())
    }

    /// Claim record `id` into the existing service `slot` of kind `S`.
    ///
    /// `update` folds the record into the service, then the comment and
    /// resource count are refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::ClaimInconsistency`] when the slot does not hold
    /// a service of kind `S`, or when `id` is unknown or already claimed.
    pub fn extend_rr<S, F>(
        &mut self,
        id: RecordId,
        slot: &ServiceSlot,
        update: F,
    ) -> Result<(), AnalyzerError>
    where
        S: ServiceKind,
        F: FnOnce(&mut S, &Record),
    {
        let holds_kind = self
            .services
            .get(&slot.domain)
            .and_then(|list| list.get(slot.index))
            .is_some_and(|combined| combined.service.downcast_ref::<S>().is_some());

        if !holds_kind {
            return Err(self.inconsistency(format!(
                "no {} service at slot {} of '{}'",
                S::TYPE_KEY,
                slot.index,
                slot.domain
            )));
        }

        let record = self.claim(id)?;
        let origin = self.origin.clone();

        if let Some(combined) = self
            .services
            .get_mut(&slot.domain)
            .and_then(|list| list.get_mut(slot.index))
        {
            if let Some(service) = combined.service.downcast_mut::<S>() {
                update(service, &record);
            }
            combined.refresh(&origin);
        }

        Ok(())
    }

    fn claim(&mut self, id: RecordId) -> Result<Record, AnalyzerError> {
        match self.claimed.get(id.0).copied() {
            None => Err(self.inconsistency(format!("record #{} does not exist", id.0))),
            Some(true) => Err(self.inconsistency(format!("record #{} is already claimed", id.0))),
            Some(false) => {
                self.claimed[id.0] = true;
                Ok(self.arena[id.0].clone())
            }
        }
    }

    fn inconsistency(&self, reason: String) -> AnalyzerError {
        AnalyzerError::ClaimInconsistency {
            type_key: self.current.to_string(),
            reason,
        }
    }

    fn ttl_for(&self, record: &Record) -> u32 {
        if record.ttl() == self.default_ttl {
            0
        } else {
            record.ttl()
        }
    }

    fn is_bookkeeping(&self, record: &Record) -> bool {
        record.rtype() == RecordType::TXT
            && record
                .name()
                .eq_ignore_ascii_case(&format!("{DNSSEC_BOOKKEEPING_LABEL}.{}", self.origin))
    }

    fn run_recognizers(&mut self, registry: &ServiceRegistry) -> Result<(), AnalyzerError> {
        for entry in registry.ordered_entries() {
            let Some(analyzer) = entry.analyzer else {
                continue;
            };

            self.current = entry.type_key;
            debug!(type_key = entry.type_key, "running recognizer");

            analyzer(self).map_err(|e| match e.downcast::<AnalyzerError>() {
                Ok(inner) => inner,
                Err(e) => AnalyzerError::RecognizerFailure {
                    type_key: entry.type_key.to_string(),
                    reason: format!("{e:#}"),
                },
            })?;
        }
        self.current = "";
        Ok(())
    }

    fn sweep_orphans(&mut self) -> usize {
        let mut orphans = 0;

        for i in 0..self.arena.len() {
            if self.claimed[i] {
                continue;
            }
            self.claimed[i] = true;

            let record = self.arena[i].clone();
            if is_dnssec_type(record.rtype()) || self.is_bookkeeping(&record) {
                self.dropped += 1;
                continue;
            }

            let subdomain = relative_to(record.name(), &self.origin);
            let combined = ServiceCombined::new(
                Box::new(Orphan::from_record(&record)),
                ServiceId::from_record(&record),
                &subdomain,
                self.ttl_for(&record),
                &self.origin,
            );
            self.services.entry(subdomain).or_default().push(combined);
            orphans += 1;
        }

        orphans
    }

    fn finish(self) -> Analysis {
        Analysis {
            services: self.services,
            default_ttl: self.default_ttl,
            dropped: self.dropped,
        }
    }
}

/// Most frequent TTL of `records`, the lowest one on ties. `None` when empty.
#[must_use]
pub fn most_used_ttl(records: &[Record]) -> Option<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.ttl()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(ttl_a, n_a), (ttl_b, n_b)| n_a.cmp(n_b).then(ttl_b.cmp(ttl_a)))
        .map(|(ttl, _)| ttl)
}

/// Analyse `records` of the zone `origin` with the default engine settings.
///
/// # Errors
///
/// Returns an [`AnalyzerError`] when a recognizer fails or misbehaves.
pub fn analyze_zone(
    registry: &ServiceRegistry,
    origin: &str,
    records: Vec<Record>,
) -> Result<Analysis, AnalyzerError> {
    analyze_zone_with(registry, origin, records, &EngineConfig::default())
}

/// Analyse `records` of the zone `origin`.
///
/// # Errors
///
/// Returns [`AnalyzerError::TooManyRecords`] above `config.max_records_per_zone`,
/// or the first recognizer error.
pub fn analyze_zone_with(
    registry: &ServiceRegistry,
    origin: &str,
    records: Vec<Record>,
    config: &EngineConfig,
) -> Result<Analysis, AnalyzerError> {
    let start = Instant::now();
    let span = tracing::info_span!("analyze_zone", origin, records = records.len());
    let _guard = span.enter();

    if records.len() > config.max_records_per_zone {
        warn!(
            count = records.len(),
            limit = config.max_records_per_zone,
            "zone too large to analyse"
        );
        metrics::record_analysis_error(start.elapsed());
        return Err(AnalyzerError::TooManyRecords {
            origin: origin.to_string(),
            count: records.len(),
            limit: config.max_records_per_zone,
        });
    }

    let mut analyzer = Analyzer::new(origin, records, config.default_zone_ttl);

    if let Err(e) = analyzer.run_recognizers(registry) {
        warn!(error = %e, "analysis aborted");
        metrics::record_analysis_error(start.elapsed());
        return Err(e);
    }

    let orphans = analyzer.sweep_orphans();
    let analysis = analyzer.finish();

    for type_key in recognized_type_keys(&analysis) {
        metrics::record_service_recognized(type_key);
    }
    metrics::record_leftovers(orphans, analysis.dropped);
    metrics::record_analysis_success(start.elapsed());

    info!(
        services = analysis.nb_services(),
        orphans,
        dropped = analysis.dropped,
        default_ttl = analysis.default_ttl,
        "zone analysed"
    );

    Ok(analysis)
}

/// Type keys of the services recognizers produced, orphans excluded.
fn recognized_type_keys(analysis: &Analysis) -> Vec<&str> {
    analysis
        .services
        .values()
        .flatten()
        .map(|combined| combined.meta.type_key.as_str())
        .filter(|type_key| *type_key != Orphan::TYPE_KEY)
        .collect()
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod analyzer_tests;
