// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for record analysis, service synthesis and the service registry.
//!
//! This module provides specialized error types for:
//! - Parsing records from their textual form
//! - Analysis passes (recognizer failures, claim inconsistencies)
//! - Service synthesis (one service unable to produce its records)
//! - Registry lookups (unknown or duplicate service kinds)
//! - Domain validation
//! - Zone imports from a provider
//!
//! Analysis errors are all-or-nothing for a pass. Synthesis errors are reported
//! per service so that one broken service never blocks the rest of a zone.

use thiserror::Error;

/// Errors raised while parsing a record from its textual form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    /// The line holds no token at all
    #[error("Empty record line")]
    Empty,

    /// The line ended before all mandatory fields were read
    #[error("Record '{line}' is missing its {field}")]
    MissingField {
        /// The offending line
        line: String,
        /// Name of the missing field (`ttl`, `type` or `rdata`)
        field: &'static str,
    },

    /// The TTL token is not an unsigned 32-bit integer
    #[error("Invalid TTL '{ttl}' in record '{line}'")]
    InvalidTtl {
        /// The offending line
        line: String,
        /// The TTL token as read
        ttl: String,
    },

    /// The record type is not known
    #[error("Unknown record type '{rtype}' in record '{line}'")]
    UnknownType {
        /// The offending line
        line: String,
        /// The type token as read
        rtype: String,
    },

    /// The owner name is not an absolute, valid domain name
    #[error("Invalid owner name '{name}': {reason}")]
    InvalidName {
        /// The owner name as read
        name: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The payload is not valid for the record type
    #[error("Invalid {rtype} data in record '{line}': {reason}")]
    InvalidRdata {
        /// The offending line
        line: String,
        /// Record type mnemonic
        rtype: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

/// Errors that abort an analysis pass.
///
/// An analysis is never partially returned: a corrupted decomposition stored by
/// a caller would look complete to the user.
#[derive(Error, Debug, Clone)]
pub enum AnalyzerError {
    /// A registered recognizer reported an error
    #[error("Service analyzer '{type_key}' failed: {reason}")]
    RecognizerFailure {
        /// Type key of the failing service kind
        type_key: String,
        /// Error reported by the recognizer
        reason: String,
    },

    /// A recognizer tried to claim a record it was never offered
    ///
    /// This is a contract violation inside a recognizer, not a data problem.
    #[error("Service analyzer '{type_key}' claimed an unavailable record: {reason}")]
    ClaimInconsistency {
        /// Type key of the offending service kind
        type_key: String,
        /// What was wrong with the claim
        reason: String,
    },

    /// The zone holds more records than one pass is allowed to process
    #[error("Zone '{origin}' has {count} records, above the limit of {limit}")]
    TooManyRecords {
        /// Zone origin
        origin: String,
        /// Number of records submitted
        count: usize,
        /// Configured limit
        limit: usize,
    },
}

/// Errors raised when a service cannot produce its records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The stored state of the service cannot form a valid record
    #[error("Unable to generate records for '{domain}': {reason}")]
    InvalidRecord {
        /// Subdomain the service is attached to
        domain: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// A record rebuilt from stored text does not parse
    #[error("Unable to parse generated record: {0}")]
    Parse(#[from] RecordParseError),
}

/// Errors related to the service registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No registered service kind has this type key
    ///
    /// Storage callers may skip or flag the service instead of failing.
    #[error("Unknown service type '{type_key}'")]
    UnknownServiceType {
        /// The type key that was looked up
        type_key: String,
    },

    /// A service kind was registered twice
    #[error("Service type '{type_key}' is already registered")]
    DuplicateServiceType {
        /// The duplicated type key
        type_key: String,
    },

    /// Stored service data does not decode into its service kind
    #[error("Invalid data for service type '{type_key}': {reason}")]
    InvalidServiceData {
        /// Type key of the service kind
        type_key: String,
        /// Decoding error
        reason: String,
    },
}

impl RegistryError {
    /// Whether the error only concerns a single stored service and can be skipped.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownServiceType { .. } | Self::InvalidServiceData { .. }
        )
    }
}

/// Errors related to domain validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The domain name cannot be managed
    #[error("'{name}' is not a valid domain name: {reason}")]
    InvalidDomainName {
        /// The name as given
        name: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

/// Errors of the zone import workflow.
#[derive(Error, Debug, Clone)]
pub enum ImportError {
    /// The provider could not list the zone records
    #[error("Unable to retrieve records of '{domain}': {reason}")]
    Source {
        /// Domain being imported
        domain: String,
        /// Error reported by the provider
        reason: String,
    },

    /// The retrieved records could not be analysed
    #[error(transparent)]
    Analysis(#[from] AnalyzerError),

    /// The new zone or the domain could not be saved
    #[error("Unable to store zone of '{domain}': {reason}")]
    Storage {
        /// Domain being imported
        domain: String,
        /// Error reported by the storage layer
        reason: String,
    },
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
