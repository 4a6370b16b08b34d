// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fallback service wrapping exactly one unrecognized record.

use serde::{Deserialize, Serialize};

use crate::constants::{DNS_CLASS_IN, PRIORITY_NONE};
use crate::dns_errors::{RegistryError, SynthesisError};
use crate::record::{absolute_name, record_type_name, Record};
use crate::registry::{ServiceFamily, ServiceInfos, ServiceRegistry};
use crate::service::{Service, ServiceKind};

/// A record no recognizer claimed, kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Orphan {
    /// Record type mnemonic, `TYPE<n>` for types without one
    #[serde(rename = "Type")]
    pub record_type: String,

    /// Payload in presentation format
    pub rdata: String,
}

impl Orphan {
    /// Wrap `record`, whose owner becomes the service subdomain.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        Self {
            record_type: record_type_name(record.rtype()),
            rdata: record.rdata().to_string(),
        }
    }
}

impl Service for Orphan {
    fn nb_resources(&self) -> usize {
        1
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.record_type.clone()
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        let text = format!(
            "{} {ttl} {DNS_CLASS_IN} {} {}",
            absolute_name(domain, origin),
            self.record_type,
            self.rdata
        );
        Ok(vec![text.parse::<Record>()?])
    }
}

impl ServiceKind for Orphan {
    const TYPE_KEY: &'static str = "svcs.Orphan";
}

/// Register the orphan kind. It has no recognizer: the sweep creates orphans.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when already registered.
pub fn register(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    registry.register::<Orphan>(
        None,
        ServiceInfos {
            name: "Orphan Record".to_string(),
            description: "A record not handled by any known service.".to_string(),
            family: ServiceFamily::Hidden,
            categories: Vec::new(),
            restrictions: Default::default(),
        },
        PRIORITY_NONE,
    )
}

#[cfg(test)]
#[path = "orphan_tests.rs"]
mod orphan_tests;
