// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mail exchangers of a subdomain, grouped into one service.
//!
//! Every MX record of an owner lands in the same service. The service keeps a
//! single TTL, the one of the first record it claimed, so synthesis emits all
//! exchangers of the owner at that TTL.

use hickory_proto::rr::rdata::MX;
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::txt::RDataParser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::analyzer::{Analyzer, RecordFilter, ServiceSlot};
use crate::constants::{COMMENT_SEPARATOR, PRIORITY_MAIL};
use crate::dns_errors::{RegistryError, SynthesisError};
use crate::record::{fqdn, Record};
use crate::registry::{ServiceFamily, ServiceInfos, ServiceRegistry, ServiceRestrictions};
use crate::service::{Service, ServiceKind};

/// One mail exchanger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailExchanger {
    /// Lower is preferred
    pub preference: u16,

    /// Absolute name of the mail server
    pub target: String,
}

impl MailExchanger {
    /// Parse an MX payload (`<preference> <target>`).
    #[must_use]
    pub fn from_rdata(rdata: &str) -> Option<Self> {
        if rdata.split_whitespace().count() != 2 {
            return None;
        }
        match RData::try_from_str(RecordType::MX, rdata) {
            Ok(RData::MX(mx)) => Some(Self {
                preference: mx.preference(),
                target: mx.exchange().to_ascii(),
            }),
            _ => None,
        }
    }

    /// Typed payload, with the target made absolute.
    fn to_rdata(&self, domain: &str) -> Result<MX, SynthesisError> {
        if self.target.is_empty() {
            return Err(SynthesisError::InvalidRecord {
                domain: domain.to_string(),
                reason: "mail exchanger without target".to_string(),
            });
        }
        let exchange =
            Name::from_ascii(fqdn(&self.target)).map_err(|e| SynthesisError::InvalidRecord {
                domain: domain.to_string(),
                reason: format!("invalid mail exchanger '{}': {e}", self.target),
            })?;
        Ok(MX::new(self.preference, exchange))
    }
}

/// All MX records of a subdomain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailExchangers {
    /// Exchangers in discovery order
    #[serde(rename = "MXs")]
    pub mxs: Vec<MailExchanger>,
}

impl Service for MailExchangers {
    fn nb_resources(&self) -> usize {
        self.mxs.len()
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.mxs
            .iter()
            .map(|mx| mx.target.trim_end_matches('.'))
            .collect::<Vec<_>>()
            .join(COMMENT_SEPARATOR)
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        self.mxs
            .iter()
            .map(|mx| {
                let mx = mx.to_rdata(domain)?;
                let rdata = format!("{} {}", mx.preference(), mx.exchange().to_ascii());
                Ok(Record::new(domain, RecordType::MX, ttl, origin, rdata))
            })
            .collect()
    }
}

impl ServiceKind for MailExchangers {
    const TYPE_KEY: &'static str = "abstract.MXs";
}

fn analyze(a: &mut Analyzer) -> anyhow::Result<()> {
    let mut slots: HashMap<String, ServiceSlot> = HashMap::new();

    for (id, record) in a.search_rr(&[RecordFilter::of_type(RecordType::MX)]) {
        let Some(mx) = MailExchanger::from_rdata(record.rdata()) else {
            debug!(record = %record, "skipping malformed MX");
            continue;
        };

        let owner = record.name().to_ascii_lowercase();
        match slots.get(&owner) {
            Some(slot) => {
                a.extend_rr::<MailExchangers, _>(id, slot, |svc, _| svc.mxs.push(mx))?;
            }
            None => {
                let service = MailExchangers { mxs: vec![mx] };
                if let Some(slot) = a.use_rr(id, record.name(), Some(Box::new(service)))? {
                    slots.insert(owner, slot);
                }
            }
        }
    }

    Ok(())
}

/// Register the mail exchangers kind.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when already registered.
pub fn register(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    registry.register::<MailExchangers>(
        Some(analyze),
        ServiceInfos {
            name: "E-Mail Servers".to_string(),
            description: "Mail exchangers receiving e-mail for the subdomain.".to_string(),
            family: ServiceFamily::Abstract,
            categories: vec!["email".to_string()],
            restrictions: ServiceRestrictions {
                single: true,
                need_types: vec!["MX".to_string()],
                ..Default::default()
            },
        },
        PRIORITY_MAIL,
    )
}

#[cfg(test)]
#[path = "mx_tests.rs"]
mod mx_tests;
