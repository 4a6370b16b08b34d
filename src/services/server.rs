// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Addresses of a host: all A and AAAA records of a subdomain.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

use crate::analyzer::{Analyzer, RecordFilter, ServiceSlot};
use crate::constants::{COMMENT_SEPARATOR, PRIORITY_SERVER};
use crate::dns_errors::{RegistryError, SynthesisError};
use crate::record::Record;
use crate::registry::{ServiceFamily, ServiceInfos, ServiceRegistry};
use crate::service::{Service, ServiceKind};

/// A machine reachable on one or more addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Server {
    /// IPv4 and IPv6 addresses, in discovery order
    pub addresses: Vec<IpAddr>,
}

impl Service for Server {
    fn nb_resources(&self) -> usize {
        self.addresses.len()
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.addresses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(COMMENT_SEPARATOR)
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        if self.addresses.is_empty() {
            return Err(SynthesisError::InvalidRecord {
                domain: domain.to_string(),
                reason: "server without address".to_string(),
            });
        }

        Ok(self
            .addresses
            .iter()
            .map(|address| {
                let rtype = match address {
                    IpAddr::V4(_) => RecordType::A,
                    IpAddr::V6(_) => RecordType::AAAA,
                };
                Record::new(domain, rtype, ttl, origin, address.to_string())
            })
            .collect())
    }
}

impl ServiceKind for Server {
    const TYPE_KEY: &'static str = "abstract.Server";
}

/// Address of an A or AAAA record, `None` when the payload does not match the type.
fn record_address(record: &Record) -> Option<IpAddr> {
    let address: IpAddr = record.rdata().parse().ok()?;
    match (record.rtype(), address) {
        (RecordType::A, IpAddr::V4(_)) | (RecordType::AAAA, IpAddr::V6(_)) => Some(address),
        _ => None,
    }
}

fn analyze(a: &mut Analyzer) -> anyhow::Result<()> {
    let filters = [
        RecordFilter::of_type(RecordType::A),
        RecordFilter::of_type(RecordType::AAAA),
    ];
    let mut slots: HashMap<String, ServiceSlot> = HashMap::new();

    for (id, record) in a.search_rr(&filters) {
        let Some(address) = record_address(&record) else {
            debug!(record = %record, "skipping malformed address record");
            continue;
        };

        let owner = record.name().to_ascii_lowercase();
        match slots.get(&owner) {
            Some(slot) => {
                a.extend_rr::<Server, _>(id, slot, |svc, _| svc.addresses.push(address))?;
            }
            None => {
                let service = Server {
                    addresses: vec![address],
                };
                if let Some(slot) = a.use_rr(id, record.name(), Some(Box::new(service)))? {
                    slots.insert(owner, slot);
                }
            }
        }
    }

    Ok(())
}

/// Register the server kind.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when already registered.
pub fn register(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    registry.register::<Server>(
        Some(analyze),
        ServiceInfos {
            name: "Server".to_string(),
            description: "A host reachable on IPv4 and/or IPv6.".to_string(),
            family: ServiceFamily::Abstract,
            categories: vec!["server".to_string()],
            restrictions: Default::default(),
        },
        PRIORITY_SERVER,
    )
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
