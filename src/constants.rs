// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the dnsvc engine.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Class token written in the canonical text of every record
pub const DNS_CLASS_IN: &str = "IN";

/// Token standing for the zone apex in relative owner names
pub const APEX_NAME: &str = "@";

/// Maximum length of a single TXT character-string (RFC 1035 §3.3)
pub const TXT_CHUNK_MAX_LEN: usize = 255;

/// Mnemonic prefix of record types without a name (RFC 3597 `TYPE<n>`)
pub const GENERIC_TYPE_PREFIX: &str = "TYPE";

/// First token of a payload in the generic `\# <length> <hex>` form (RFC 3597)
pub const GENERIC_RDATA_MARKER: &str = "\\#";

// ============================================================================
// Analysis Constants
// ============================================================================

/// TTL used as zone default when a zone has no record to infer it from (1 hour)
pub const DEFAULT_ZONE_TTL_SECS: u32 = 3600;

/// Default upper bound on the number of records analysed in one pass
pub const DEFAULT_MAX_RECORDS_PER_ZONE: usize = 10_000;

/// Label of the TXT record used to keep DNSSEC bookkeeping inside a zone
///
/// The record `__dnssec.<origin>` is never surfaced as a service.
pub const DNSSEC_BOOKKEEPING_LABEL: &str = "__dnssec";

/// Length in bytes of a service identifier (SHA-1 digest)
pub const SERVICE_ID_LEN: usize = 20;

/// Minimum accepted length of a domain name given by a user
pub const MIN_DOMAIN_NAME_LEN: usize = 3;

// ============================================================================
// Service Priority Constants
// ============================================================================

/// Priority of narrowly-scoped challenge recognizers (run first)
pub const PRIORITY_CHALLENGE: i32 = 2;

/// Priority of mail exchange recognizers
pub const PRIORITY_MAIL: i32 = 10;

/// Priority of address (A/AAAA) recognizers
pub const PRIORITY_SERVER: i32 = 20;

/// Priority of single-record alias recognizers
pub const PRIORITY_ALIAS: i32 = 30;

/// Priority given to kinds without an analyzer (never run)
pub const PRIORITY_NONE: i32 = 1000;

// ============================================================================
// Built-in Service Constants
// ============================================================================

/// Owner label of Scaleway domain ownership challenges
pub const SCALEWAY_CHALLENGE_LABEL: &str = "_scaleway-challenge";

/// Separator used when joining several values in a service comment
pub const COMMENT_SEPARATOR: &str = ", ";

// ============================================================================
// Capability Names
// ============================================================================

/// Capability reported by services listing the sub-domains they own
pub const CAPABILITY_LIST_SUBDOMAINS: &str = "ListSubdomains";

/// Capability reported by services providing a custom settings form
pub const CAPABILITY_CUSTOM_SETTINGS_FORM: &str = "CustomSettingsForm";

// ============================================================================
// Logging Constants
// ============================================================================

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable selecting the log output format (`text` or `json`)
pub const LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";
