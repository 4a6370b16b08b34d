// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Collaborator interfaces and the import and publish workflows.
//!
//! The engine neither talks to DNS providers nor persists anything. Provider
//! adapters implement [`RecordSource`], storage backends implement
//! [`ZoneStore`]; [`import_zone`] and [`publish_zone`] tie them to the analyzer
//! and to zone synthesis.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::analyzer::analyze_zone_with;
use crate::config::EngineConfig;
use crate::dns_errors::ImportError;
use crate::record::Record;
use crate::registry::ServiceRegistry;
use crate::zone::{Domain, Synthesis, UserId, Zone, ZoneId};

/// Access to the records of a domain at its DNS provider.
pub trait RecordSource {
    /// Check that the provider serves `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error when the domain is unknown or the provider unreachable.
    fn domain_exists(&self, domain: &str) -> Result<()>;

    /// Every record of `domain`, with absolute owner names.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot list the zone.
    fn zone_records(&self, domain: &str) -> Result<Vec<Record>>;

    /// Replace the records of `domain` with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider refuses the update.
    fn push_records(&self, domain: &str, records: &[Record]) -> Result<()>;
}

/// Persistence of zones and domains.
pub trait ZoneStore {
    /// Save a new zone, setting its allocated identifier in `zone.meta.id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the zone cannot be saved.
    fn create_zone(&mut self, zone: &mut Zone) -> Result<()>;

    /// Save the domain, including its zone history.
    ///
    /// # Errors
    ///
    /// Returns an error when the domain cannot be saved.
    fn update_domain(&mut self, domain: &Domain) -> Result<()>;
}

/// Import the current records of `domain` as a new zone snapshot.
///
/// The records are fetched from `source`, analysed, stored as a new zone
/// authored by `author`, and the zone is appended to the domain history.
///
/// # Errors
///
/// Returns [`ImportError::Source`] when the provider fails,
/// [`ImportError::Analysis`] when the analysis aborts, and
/// [`ImportError::Storage`] when saving the zone or the domain fails.
pub fn import_zone(
    registry: &ServiceRegistry,
    config: &EngineConfig,
    source: &dyn RecordSource,
    store: &mut dyn ZoneStore,
    domain: &mut Domain,
    author: UserId,
) -> Result<ZoneId, ImportError> {
    let name = domain.domain_name.clone();
    let source_error = |e: anyhow::Error| ImportError::Source {
        domain: name.clone(),
        reason: format!("{e:#}"),
    };
    let storage_error = |e: anyhow::Error| ImportError::Storage {
        domain: name.clone(),
        reason: format!("{e:#}"),
    };

    source.domain_exists(&name).map_err(source_error)?;
    let records = source.zone_records(&name).map_err(source_error)?;
    info!(domain = %name, records = records.len(), "importing zone");

    let analysis = analyze_zone_with(registry, &name, records, config)?;

    let mut zone = Zone::from_analysis(analysis);
    zone.meta.id_author = author;
    zone.meta.last_modified = Utc::now();

    store.create_zone(&mut zone).map_err(storage_error)?;
    domain.push_zone(zone.meta.id);
    store.update_domain(domain).map_err(storage_error)?;

    info!(
        domain = %name,
        zone_id = %zone.meta.id,
        services = zone.nb_services(),
        "zone imported"
    );
    Ok(zone.meta.id)
}

/// Generate the records of `zone` and push them to the provider of `domain`.
///
/// Services unable to produce records are left out and reported in the
/// returned [`Synthesis`]; the records of every other service are pushed.
///
/// # Errors
///
/// Returns an error when the provider refuses the records.
pub fn publish_zone(source: &dyn RecordSource, domain: &Domain, zone: &Zone) -> Result<Synthesis> {
    let synthesis = zone.generate_records(&domain.domain_name);

    for failure in &synthesis.failures {
        warn!(
            domain = %domain.domain_name,
            service_id = %failure.service_id,
            type_key = %failure.type_key,
            error = %failure.error,
            "service left out of publication"
        );
    }

    source
        .push_records(&domain.domain_name, &synthesis.records)
        .with_context(|| format!("Failed to publish zone {} of {}", zone.meta.id, domain.domain_name))?;

    info!(
        domain = %domain.domain_name,
        zone_id = %zone.meta.id,
        records = synthesis.records.len(),
        failures = synthesis.failures.len(),
        "zone published"
    );
    Ok(synthesis)
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
