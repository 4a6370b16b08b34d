// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Alias of a subdomain to another name.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};

use crate::analyzer::{Analyzer, RecordFilter};
use crate::constants::PRIORITY_ALIAS;
use crate::dns_errors::{RegistryError, SynthesisError};
use crate::record::{fqdn, Record};
use crate::registry::{ServiceFamily, ServiceInfos, ServiceRegistry, ServiceRestrictions};
use crate::service::{Service, ServiceKind};

/// A single CNAME record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cname {
    /// Canonical name the subdomain points to
    pub target: String,
}

impl Service for Cname {
    fn nb_resources(&self) -> usize {
        1
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.target.trim_end_matches('.').to_string()
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        if self.target.is_empty() {
            return Err(SynthesisError::InvalidRecord {
                domain: domain.to_string(),
                reason: "alias without target".to_string(),
            });
        }

        Ok(vec![Record::new(
            domain,
            RecordType::CNAME,
            ttl,
            origin,
            fqdn(&self.target),
        )])
    }
}

impl ServiceKind for Cname {
    const TYPE_KEY: &'static str = "svcs.CNAME";
}

fn analyze(a: &mut Analyzer) -> anyhow::Result<()> {
    for (id, record) in a.search_rr(&[RecordFilter::of_type(RecordType::CNAME)]) {
        let target = record.target().to_string();
        if target.is_empty() {
            continue;
        }
        a.use_rr(id, record.name(), Some(Box::new(Cname { target })))?;
    }
    Ok(())
}

/// Register the CNAME kind.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when already registered.
pub fn register(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    registry.register::<Cname>(
        Some(analyze),
        ServiceInfos {
            name: "Subdomain alias".to_string(),
            description: "Make the subdomain an alias of another name.".to_string(),
            family: ServiceFamily::Provider,
            categories: vec!["alias".to_string()],
            restrictions: ServiceRestrictions {
                alone: true,
                single: true,
                need_types: vec!["CNAME".to_string()],
                ..Default::default()
            },
        },
        PRIORITY_ALIAS,
    )
}

#[cfg(test)]
#[path = "cname_tests.rs"]
mod cname_tests;
