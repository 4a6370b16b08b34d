// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scaleway domain ownership challenge.
//!
//! Scaleway asks for a TXT record at `_scaleway-challenge.<subdomain>` holding
//! a random token. The service lives on `<subdomain>` and owns the
//! `_scaleway-challenge` label below it.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{Analyzer, RecordFilter};
use crate::constants::{PRIORITY_CHALLENGE, SCALEWAY_CHALLENGE_LABEL};
use crate::dns_errors::{RegistryError, SynthesisError};
use crate::record::{domain_join, Record};
use crate::registry::{ServiceFamily, ServiceInfos, ServiceRegistry, ServiceRestrictions};
use crate::service::{ListSubdomains, Service, ServiceKind};

/// Temporary TXT proving control of the domain to Scaleway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalewayChallenge {
    /// Token provided by Scaleway
    pub challenge: String,
}

impl Service for ScalewayChallenge {
    fn nb_resources(&self) -> usize {
        1
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.challenge.clone()
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        if self.challenge.is_empty() {
            return Err(SynthesisError::InvalidRecord {
                domain: domain.to_string(),
                reason: "empty Scaleway challenge".to_string(),
            });
        }

        let name = domain_join(&[SCALEWAY_CHALLENGE_LABEL, domain]);
        Ok(vec![Record::txt(&name, ttl, origin, &self.challenge)])
    }

    fn as_subdomain_lister(&self) -> Option<&dyn ListSubdomains> {
        Some(self)
    }
}

impl ListSubdomains for ScalewayChallenge {
    fn list_subdomains(&self) -> Vec<String> {
        vec![SCALEWAY_CHALLENGE_LABEL.to_string()]
    }
}

impl ServiceKind for ScalewayChallenge {
    const TYPE_KEY: &'static str = "abstract.ScalewayChallenge";
}

fn analyze(a: &mut Analyzer) -> anyhow::Result<()> {
    let prefix = format!("{SCALEWAY_CHALLENGE_LABEL}.");
    let filter = RecordFilter::of_type(RecordType::TXT).with_prefix(prefix.as_str());

    for (id, record) in a.search_rr(&[filter]) {
        let Some(txt) = record.txt_data() else {
            debug!(record = %record, "skipping malformed Scaleway challenge");
            continue;
        };
        let challenge: String = txt
            .txt_data()
            .iter()
            .map(|s| String::from_utf8_lossy(s))
            .collect();

        let domain = &record.name()[prefix.len()..];
        debug!(domain, "found Scaleway challenge");

        a.use_rr(id, domain, Some(Box::new(ScalewayChallenge { challenge })))?;
    }

    Ok(())
}

/// Register the Scaleway challenge kind.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when already registered.
pub fn register(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    registry.register::<ScalewayChallenge>(
        Some(analyze),
        ServiceInfos {
            name: "Scaleway Challenge".to_string(),
            description: "Temporary record to prove that you control the domain.".to_string(),
            family: ServiceFamily::Abstract,
            categories: vec!["temporary".to_string()],
            restrictions: ServiceRestrictions {
                near_alone: true,
                ..Default::default()
            },
        },
        PRIORITY_CHALLENGE,
    )
}

#[cfg(test)]
#[path = "scaleway_challenge_tests.rs"]
mod scaleway_challenge_tests;
