// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnsvc - DNS zone analysis and synthesis engine
//!
//! dnsvc turns the flat record set of a DNS zone into typed *services* (a
//! mail setup, a server's addresses, an ownership challenge, an alias) and
//! turns services back into the exact records a provider must serve.
//!
//! ## Overview
//!
//! - **Analysis** partitions records by subdomain, lets every registered
//!   recognizer claim the records it understands, and wraps whatever is left
//!   into orphan services so that no record is ever silently lost.
//! - **Synthesis** asks every service of a zone for its records. Analysing the
//!   synthesized records yields equivalent services again.
//!
//! ## Modules
//!
//! - [`record`] - Normalized resource records
//! - [`service`] - The service contract and its metadata
//! - [`registry`] - Catalog of service kinds, ordered by priority
//! - [`analyzer`] - The analysis pass
//! - [`zone`] - Zone snapshots, domains and synthesis
//! - [`services`] - Built-in service kinds
//! - [`provider`] - Provider and storage interfaces, import and publish workflows
//! - [`config`] - Engine settings
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use dnsvc::analyzer::analyze_zone;
//! use dnsvc::record::Record;
//! use dnsvc::registry::ServiceRegistry;
//! use dnsvc::zone::Zone;
//!
//! let registry = ServiceRegistry::builtin().unwrap();
//! let records: Vec<Record> = vec![
//!     "example.com. 300 IN MX 10 mx1.example.com.".parse().unwrap(),
//!     "www.example.com. 300 IN A 192.0.2.1".parse().unwrap(),
//! ];
//!
//! let zone = Zone::from_analysis(analyze_zone(&registry, "example.com.", records.clone()).unwrap());
//! assert_eq!(zone.nb_services(), 2);
//!
//! let synthesis = zone.generate_records("example.com.");
//! assert_eq!(synthesis.records, records);
//! ```

pub mod analyzer;
pub mod config;
pub mod constants;
pub mod dns_errors;
pub mod metrics;
pub mod provider;
pub mod record;
pub mod registry;
pub mod service;
pub mod services;
pub mod zone;
