// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Built-in service kinds.
//!
//! | Type key | Priority | Recognizes |
//! |----------|----------|------------|
//! | `abstract.ScalewayChallenge` | 2 | TXT at `_scaleway-challenge.<subdomain>` |
//! | `abstract.MXs` | 10 | every MX of a subdomain |
//! | `abstract.Server` | 20 | every A and AAAA of a subdomain |
//! | `svcs.CNAME` | 30 | a CNAME |
//! | `svcs.Orphan` | - | whatever is left |

pub mod cname;
pub mod mx;
pub mod orphan;
pub mod scaleway_challenge;
pub mod server;

use crate::dns_errors::RegistryError;
use crate::registry::ServiceRegistry;

/// Register every built-in kind into `registry`.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateServiceType`] when a kind is already registered.
pub fn register_builtin_services(registry: &mut ServiceRegistry) -> Result<(), RegistryError> {
    scaleway_challenge::register(registry)?;
    mx::register(registry)?;
    server::register(registry)?;
    cname::register(registry)?;
    orphan::register(registry)?;
    Ok(())
}
