// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Catalog of known service kinds.
//!
//! The registry is built once at start-up, then shared read-only (it is
//! `Send + Sync`) with every analysis pass. Entries are kept sorted by
//! priority, ties broken by registration order: recognizers that must get
//! first refusal on ambiguous record shapes are registered with lower
//! priority numbers than broad ones.
//!
//! # Example
//!
//! ```rust
//! use dnsvc::registry::ServiceRegistry;
//!
//! let registry = ServiceRegistry::builtin().unwrap();
//! let first = registry.ordered_entries().next().unwrap();
//! assert_eq!(first.type_key, "abstract.ScalewayChallenge");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::dns_errors::RegistryError;
use crate::service::{DynService, ServiceCombined, ServiceKind, StoredService};

/// Recognizer run by the analyzer for one service kind.
pub type AnalyzerFn = fn(&mut Analyzer) -> anyhow::Result<()>;

type Creator = fn() -> Box<dyn DynService>;
type Decoder = fn(serde_json::Value) -> Result<Box<dyn DynService>, serde_json::Error>;

/// Broad grouping of service kinds, for presentation.
///
/// The family is independent of the type key namespace: `svcs.Orphan` is
/// a hidden kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFamily {
    /// Services grouping records by intent
    Abstract,
    /// Services mapping one record type directly
    Provider,
    /// Services never shown to users
    Hidden,
}

/// Placement restrictions of a service kind, for editors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRestrictions {
    /// The service must be the only one on its subdomain
    #[serde(default)]
    pub alone: bool,

    /// Type keys of services that cannot share the subdomain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusive: Vec<String>,

    /// The service may only be accompanied by other near-alone services
    #[serde(default)]
    pub near_alone: bool,

    /// At most one service of this kind per subdomain
    #[serde(default)]
    pub single: bool,

    /// The service may only live at the zone apex
    #[serde(default)]
    pub root_only: bool,

    /// Record types the provider must support
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub need_types: Vec<String>,
}

/// Descriptive metadata of a service kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfos {
    /// Display name
    pub name: String,

    /// Short description
    pub description: String,

    /// Family of the kind
    pub family: ServiceFamily,

    /// Free categories (e.g. `temporary`, `email`)
    #[serde(default)]
    pub categories: Vec<String>,

    /// Placement restrictions
    #[serde(default)]
    pub restrictions: ServiceRestrictions,
}

/// One registered service kind.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Stable type key
    pub type_key: &'static str,

    /// Descriptive metadata
    pub infos: ServiceInfos,

    /// Recognizer order; lower runs first
    pub priority: i32,

    /// Registration order, used to break priority ties
    pub sequence: usize,

    /// Recognizer, `None` for kinds that are only ever created by users or the sweep
    pub analyzer: Option<AnalyzerFn>,

    creator: Creator,
    decoder: Decoder,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("type_key", &self.type_key)
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .field("has_analyzer", &self.analyzer.is_some())
            .finish_non_exhaustive()
    }
}

impl RegistryEntry {
    /// Zero-valued instance of this kind.
    #[must_use]
    pub fn create(&self) -> Box<dyn DynService> {
        (self.creator)()
    }

    /// Decode a stored service body of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidServiceData`] when the body does not decode.
    pub fn decode(&self, body: serde_json::Value) -> Result<Box<dyn DynService>, RegistryError> {
        (self.decoder)(body).map_err(|e| RegistryError::InvalidServiceData {
            type_key: self.type_key.to_string(),
            reason: e.to_string(),
        })
    }
}

fn create_service<S: ServiceKind>() -> Box<dyn DynService> {
    Box::new(S::default())
}

fn decode_service<S: ServiceKind>(
    body: serde_json::Value,
) -> Result<Box<dyn DynService>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<S>(body)?))
}

/// Read-only catalog of service kinds.
#[derive(Clone, Debug, Default)]
pub struct ServiceRegistry {
    entries: Vec<RegistryEntry>,
    registered: usize,
}

impl ServiceRegistry {
    /// Empty registry, for callers assembling their own set of kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in service kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateServiceType`] if two built-ins share a key.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::services::register_builtin_services(&mut registry)?;
        Ok(registry)
    }

    /// Register kind `S`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateServiceType`] when `S::TYPE_KEY` is taken.
    pub fn register<S: ServiceKind>(
        &mut self,
        analyzer: Option<AnalyzerFn>,
        infos: ServiceInfos,
        priority: i32,
    ) -> Result<(), RegistryError> {
        if self.entries.iter().any(|e| e.type_key == S::TYPE_KEY) {
            return Err(RegistryError::DuplicateServiceType {
                type_key: S::TYPE_KEY.to_string(),
            });
        }

        let entry = RegistryEntry {
            type_key: S::TYPE_KEY,
            infos,
            priority,
            sequence: self.registered,
            analyzer,
            creator: create_service::<S>,
            decoder: decode_service::<S>,
        };
        self.registered += 1;

        // Insert after every entry with priority <= ours to keep ties in registration order
        let position = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(position, entry);

        debug!(type_key = S::TYPE_KEY, priority, "registered service kind");
        Ok(())
    }

    /// Entries sorted by priority, ties in registration order.
    pub fn ordered_entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a kind by type key.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownServiceType`] when no kind matches.
    pub fn find_by_type_key(&self, type_key: &str) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.type_key == type_key)
            .ok_or_else(|| RegistryError::UnknownServiceType {
                type_key: type_key.to_string(),
            })
    }

    /// Zero-valued instance of the kind `type_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownServiceType`] when no kind matches.
    pub fn create(&self, type_key: &str) -> Result<Box<dyn DynService>, RegistryError> {
        Ok(self.find_by_type_key(type_key)?.create())
    }

    /// Rebuild a service from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownServiceType`] when the kind is gone, or
    /// [`RegistryError::InvalidServiceData`] when the body does not decode.
    pub fn revive(&self, stored: StoredService) -> Result<ServiceCombined, RegistryError> {
        let entry = self.find_by_type_key(&stored.meta.type_key)?;
        let service = entry.decode(stored.service)?;
        Ok(ServiceCombined {
            meta: stored.meta,
            service,
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
