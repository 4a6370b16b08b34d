// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common fixtures for integration tests

#![allow(dead_code)]

use dnsvc::analyzer::{Analysis, Analyzer, RecordFilter};
use dnsvc::dns_errors::SynthesisError;
use dnsvc::record::Record;
use dnsvc::registry::{ServiceFamily, ServiceInfos, ServiceRestrictions};
use dnsvc::service::{Service, ServiceKind};
use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};

pub const ORIGIN: &str = "example.com.";

/// Parse canonical record lines
pub fn records(lines: &[&str]) -> Vec<Record> {
    lines
        .iter()
        .map(|line| line.parse().expect("fixture record should parse"))
        .collect()
}

/// A zone mixing every built-in kind, orphans and DNSSEC artifacts
pub fn mixed_zone() -> Vec<Record> {
    records(&[
        "example.com. 300 IN MX 10 mx1.example.com.",
        "example.com. 300 IN MX 20 mx2.example.com.",
        "example.com. 300 IN TXT \"v=spf1 mx -all\"",
        "example.com. 300 IN RRSIG A 13 2 300 20250101000000 20240101000000 12345 example.com. abcd",
        "www.example.com. 300 IN A 192.0.2.1",
        "www.example.com. 600 IN AAAA 2001:db8::1",
        "blog.example.com. 300 IN CNAME example.github.io.",
        "_scaleway-challenge.shop.example.com. 300 IN TXT \"abc123\"",
        "_sip._tcp.example.com. 3600 IN SRV 0 5 5060 sip.example.com.",
        "__dnssec.example.com. 300 IN TXT \"bookkeeping\"",
        "example.com. 300 IN DNSKEY 257 3 13 abcd",
    ])
}

/// Services, plus dropped records, must account for every input record
pub fn accounted_records(analysis: &Analysis) -> usize {
    analysis.nb_resources() + analysis.dropped
}

pub fn infos(name: &str) -> ServiceInfos {
    ServiceInfos {
        name: name.to_string(),
        description: String::new(),
        family: ServiceFamily::Abstract,
        categories: Vec::new(),
        restrictions: ServiceRestrictions::default(),
    }
}

/// Claims TXT records starting with `v=spf1`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Spf {
    pub policy: String,
}

/// Claims every TXT record
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnyTxt {
    pub text: String,
}

impl Service for Spf {
    fn nb_resources(&self) -> usize {
        1
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.policy.clone()
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        Ok(vec![Record::txt(domain, ttl, origin, &self.policy)])
    }
}

impl ServiceKind for Spf {
    const TYPE_KEY: &'static str = "test.Spf";
}

impl Service for AnyTxt {
    fn nb_resources(&self) -> usize {
        1
    }

    fn gen_comment(&self, _origin: &str) -> String {
        self.text.clone()
    }

    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        Ok(vec![Record::txt(domain, ttl, origin, &self.text)])
    }
}

impl ServiceKind for AnyTxt {
    const TYPE_KEY: &'static str = "test.AnyTxt";
}

pub fn analyze_spf(a: &mut Analyzer) -> anyhow::Result<()> {
    let filter = RecordFilter::of_type(RecordType::TXT).with_contains("\"v=spf1");
    for (id, record) in a.search_rr(&[filter]) {
        let policy = record.txt_joined();
        a.use_rr(id, record.name(), Some(Box::new(Spf { policy })))?;
    }
    Ok(())
}

pub fn analyze_any_txt(a: &mut Analyzer) -> anyhow::Result<()> {
    for (id, record) in a.search_rr(&[RecordFilter::of_type(RecordType::TXT)]) {
        let text = record.txt_joined();
        a.use_rr(id, record.name(), Some(Box::new(AnyTxt { text })))?;
    }
    Ok(())
}
