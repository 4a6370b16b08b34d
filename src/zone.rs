// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone snapshots, domains and zone synthesis.
//!
//! A [`Zone`] is the immutable result of one analysis: services grouped by
//! subdomain plus the zone default TTL. A [`Domain`] keeps the append-only
//! history of the zones analysed for it, the last one being current.
//!
//! Synthesis walks a zone and asks every service for its records. A service
//! failing to produce records is reported on its own and never prevents the
//! rest of the zone from being generated.

use chrono::{DateTime, Utc};
use hickory_proto::rr::Name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::analyzer::Analysis;
use crate::constants::MIN_DOMAIN_NAME_LEN;
use crate::dns_errors::{DomainError, RegistryError, SynthesisError};
use crate::metrics;
use crate::record::{fqdn, Record};
use crate::registry::ServiceRegistry;
use crate::service::{ServiceCombined, ServiceId, StoredService};

/// Generate an integer identifier newtype allocated by the storage layer.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

identifier!(
    /// Identifier of a stored zone snapshot
    ZoneId
);
identifier!(
    /// Identifier of a domain
    DomainId
);
identifier!(
    /// Identifier of a user
    UserId
);
identifier!(
    /// Identifier of a provider configuration
    ProviderId
);

/// Metadata of a zone snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMeta {
    /// Identifier, allocated when the zone is stored
    pub id: ZoneId,

    /// User who created the snapshot
    pub id_author: UserId,

    /// TTL of services storing `0`
    pub default_ttl: u32,

    /// Last change of the snapshot
    pub last_modified: DateTime<Utc>,

    /// Message attached when the snapshot was committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_msg: Option<String>,

    /// When the snapshot was committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_date: Option<DateTime<Utc>>,

    /// When the snapshot was last pushed to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl ZoneMeta {
    /// Metadata of a fresh, unsaved snapshot.
    #[must_use]
    pub fn new(default_ttl: u32) -> Self {
        Self {
            id: ZoneId::default(),
            id_author: UserId::default(),
            default_ttl,
            last_modified: Utc::now(),
            commit_msg: None,
            commit_date: None,
            published: None,
        }
    }
}

/// A service unable to produce its records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisFailure {
    /// Identifier of the failing service
    pub service_id: ServiceId,

    /// Kind of the failing service
    pub type_key: String,

    /// Subdomain of the failing service
    pub domain: String,

    /// What went wrong
    pub error: SynthesisError,
}

/// Records generated from a zone.
#[derive(Clone, Debug, Default)]
pub struct Synthesis {
    /// Records of every healthy service
    pub records: Vec<Record>,

    /// Services that could not produce records
    pub failures: Vec<SynthesisFailure>,
}

impl Synthesis {
    /// Whether every service produced its records.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One analysed snapshot of a domain.
#[derive(Clone, Debug, Serialize)]
pub struct Zone {
    /// Snapshot metadata
    #[serde(flatten)]
    pub meta: ZoneMeta,

    /// Services by subdomain relative to the origin
    pub services: BTreeMap<String, Vec<ServiceCombined>>,
}

/// Persisted form of a [`Zone`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredZone {
    /// Snapshot metadata
    #[serde(flatten)]
    pub meta: ZoneMeta,

    /// Persisted services by subdomain
    #[serde(default)]
    pub services: BTreeMap<String, Vec<StoredService>>,
}

impl Zone {
    /// Wrap the outcome of an analysis into an unsaved snapshot.
    #[must_use]
    pub fn from_analysis(analysis: Analysis) -> Self {
        Self {
            meta: ZoneMeta::new(analysis.default_ttl),
            services: analysis.services,
        }
    }

    /// Total number of services.
    #[must_use]
    pub fn nb_services(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }

    /// Find a service by identifier.
    #[must_use]
    pub fn find_service(&self, id: &ServiceId) -> Option<&ServiceCombined> {
        self.services.values().flatten().find(|s| &s.meta.id == id)
    }

    /// Generate the records of every service of the zone `origin`.
    ///
    /// Services are walked by subdomain, then in their list order.
    #[must_use]
    pub fn generate_records(&self, origin: &str) -> Synthesis {
        let origin = fqdn(origin);
        let mut synthesis = Synthesis::default();

        for service in self.services.values().flatten() {
            match service.gen_rrs(self.meta.default_ttl, &origin) {
                Ok(records) => synthesis.records.extend(records),
                Err(error) => {
                    warn!(
                        service_id = %service.meta.id,
                        type_key = %service.meta.type_key,
                        domain = %service.meta.domain,
                        error = %error,
                        "service failed to generate its records"
                    );
                    metrics::record_synthesis_failure(&service.meta.type_key);
                    synthesis.failures.push(SynthesisFailure {
                        service_id: service.meta.id,
                        type_key: service.meta.type_key.clone(),
                        domain: service.meta.domain.clone(),
                        error,
                    });
                }
            }
        }

        debug!(
            records = synthesis.records.len(),
            failures = synthesis.failures.len(),
            "zone synthesized"
        );
        synthesis
    }

    /// Persisted form of the zone.
    ///
    /// # Errors
    ///
    /// Returns an error when a service body cannot be serialized.
    pub fn to_stored(&self) -> Result<StoredZone, serde_json::Error> {
        let mut services = BTreeMap::new();
        for (domain, list) in &self.services {
            let stored = list
                .iter()
                .map(ServiceCombined::to_stored)
                .collect::<Result<Vec<_>, _>>()?;
            services.insert(domain.clone(), stored);
        }

        Ok(StoredZone {
            meta: self.meta.clone(),
            services,
        })
    }

    /// Rebuild a zone from its persisted form, failing on the first unusable service.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownServiceType`] for a service kind no longer
    /// registered, or [`RegistryError::InvalidServiceData`] for a corrupted body.
    pub fn from_stored(stored: StoredZone, registry: &ServiceRegistry) -> Result<Self, RegistryError> {
        let mut services = BTreeMap::new();
        for (domain, list) in stored.services {
            let revived = list
                .into_iter()
                .map(|s| registry.revive(s))
                .collect::<Result<Vec<_>, _>>()?;
            services.insert(domain, revived);
        }

        Ok(Self {
            meta: stored.meta,
            services,
        })
    }

    /// Rebuild a zone from its persisted form, skipping unusable services.
    ///
    /// Returns the zone and the errors of the skipped services.
    #[must_use]
    pub fn from_stored_lossy(
        stored: StoredZone,
        registry: &ServiceRegistry,
    ) -> (Self, Vec<RegistryError>) {
        let mut services: BTreeMap<String, Vec<ServiceCombined>> = BTreeMap::new();
        let mut skipped = Vec::new();

        for (domain, list) in stored.services {
            let mut revived = Vec::with_capacity(list.len());
            for service in list {
                match registry.revive(service) {
                    Ok(service) => revived.push(service),
                    Err(e) => {
                        warn!(domain = %domain, error = %e, "skipping stored service");
                        skipped.push(e);
                    }
                }
            }
            if !revived.is_empty() {
                services.insert(domain, revived);
            }
        }

        (
            Self {
                meta: stored.meta,
                services,
            },
            skipped,
        )
    }
}

/// A domain managed on behalf of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Identifier
    pub id: DomainId,

    /// Owner
    pub id_owner: UserId,

    /// Provider the records live at
    pub id_provider: ProviderId,

    /// Absolute domain name
    pub domain_name: String,

    /// Free grouping label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    #[serde(default)]
    zone_history: Vec<ZoneId>,
}

impl Domain {
    /// A new domain with an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidDomainName`] when `name` is not a usable domain name.
    pub fn new(owner: UserId, provider: ProviderId, name: &str) -> Result<Self, DomainError> {
        let domain_name = fqdn(name.trim());
        let invalid = |reason: String| DomainError::InvalidDomainName {
            name: name.to_string(),
            reason,
        };

        if domain_name.trim_end_matches('.').len() < MIN_DOMAIN_NAME_LEN {
            return Err(invalid(format!(
                "must be at least {MIN_DOMAIN_NAME_LEN} characters long"
            )));
        }
        Name::from_ascii(&domain_name).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            id: DomainId::default(),
            id_owner: owner,
            id_provider: provider,
            domain_name,
            group: String::new(),
            zone_history: Vec::new(),
        })
    }

    /// Append a zone snapshot; it becomes the current zone.
    pub fn push_zone(&mut self, zone: ZoneId) {
        self.zone_history.push(zone);
    }

    /// Identifier of the current zone, if any was analysed.
    #[must_use]
    pub fn current_zone(&self) -> Option<ZoneId> {
        self.zone_history.last().copied()
    }

    /// Every snapshot, oldest first.
    #[must_use]
    pub fn zone_history(&self) -> &[ZoneId] {
        &self.zone_history
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
