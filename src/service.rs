// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The capability contract every service kind implements.
//!
//! A service is a user-facing grouping of one or more resource records. Each
//! kind implements [`Service`] (count, summarize, synthesize) and [`ServiceKind`]
//! (stable type key plus serde support). The blanket [`DynService`] trait turns
//! every kind into a trait object that the analyzer, the registry and zones can
//! hold without knowing the concrete type.
//!
//! Optional capabilities are queried, not inherited: a kind overrides
//! [`Service::as_subdomain_lister`] or [`Service::as_custom_settings_form`] to
//! expose them.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::any::Any;
use std::fmt;

use crate::constants::{
    CAPABILITY_CUSTOM_SETTINGS_FORM, CAPABILITY_LIST_SUBDOMAINS, SERVICE_ID_LEN,
};
use crate::dns_errors::SynthesisError;
use crate::record::Record;

/// Behaviour shared by all service kinds.
pub trait Service: Send + Sync + fmt::Debug {
    /// Number of resource records this service stands for.
    fn nb_resources(&self) -> usize;

    /// Short human summary used as the default label.
    fn gen_comment(&self, origin: &str) -> String;

    /// Rebuild the records this service stands for.
    ///
    /// `domain` is the subdomain relative to `origin` (`""` for the apex).
    ///
    /// # Errors
    ///
    /// Returns a [`SynthesisError`] when the stored state cannot form valid records.
    fn gen_rrs(&self, domain: &str, ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError>;

    /// Sub-domain listing capability, when supported.
    fn as_subdomain_lister(&self) -> Option<&dyn ListSubdomains> {
        None
    }

    /// Custom settings form capability, when supported.
    fn as_custom_settings_form(&self) -> Option<&dyn CustomSettingsForm> {
        None
    }
}

/// Services owning records below their own subdomain.
pub trait ListSubdomains {
    /// Labels, relative to the service's subdomain, under which records are created.
    fn list_subdomains(&self) -> Vec<String>;
}

/// Services presenting their settings through a multi-step form.
pub trait CustomSettingsForm {
    /// Build the form for the requested step.
    ///
    /// # Errors
    ///
    /// Returns an error when the step does not exist.
    fn settings_form(&self, step: i32) -> anyhow::Result<CustomForm>;
}

/// A multi-step settings form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomForm {
    /// Text presented before the fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub before_text: String,

    /// Text presented after the fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after_text: String,

    /// Names of the service fields shown at this step
    pub fields: Vec<String>,

    /// Step requested when the form is submitted, `None` on the last step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<i32>,
}

/// Static description of a concrete service kind.
pub trait ServiceKind: Service + Clone + Default + Serialize + DeserializeOwned + 'static {
    /// Stable registry key, `<family>.<TypeName>`.
    const TYPE_KEY: &'static str;
}

/// Object-safe view over any [`ServiceKind`].
pub trait DynService: Service + Any {
    /// Registry key of the concrete kind.
    fn type_key(&self) -> &'static str;

    /// Upcast for downcasting to the concrete kind.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete kind.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// JSON encoding of the service body.
    ///
    /// # Errors
    ///
    /// Returns an error when the body cannot be serialized.
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Boxed deep copy.
    fn clone_box(&self) -> Box<dyn DynService>;
}

impl<T: ServiceKind> DynService for T {
    fn type_key(&self) -> &'static str {
        T::TYPE_KEY
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn clone_box(&self) -> Box<dyn DynService> {
        Box::new(self.clone())
    }
}

impl dyn DynService {
    /// Borrow the concrete service, if it is of kind `S`.
    #[must_use]
    pub fn downcast_ref<S: ServiceKind>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }

    /// Mutably borrow the concrete service, if it is of kind `S`.
    pub fn downcast_mut<S: ServiceKind>(&mut self) -> Option<&mut S> {
        self.as_any_mut().downcast_mut::<S>()
    }
}

impl Clone for Box<dyn DynService> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Names of the optional capabilities a service supports.
#[must_use]
pub fn service_capabilities(service: &dyn DynService) -> Vec<&'static str> {
    let mut caps = Vec::new();
    if service.as_subdomain_lister().is_some() {
        caps.push(CAPABILITY_LIST_SUBDOMAINS);
    }
    if service.as_custom_settings_form().is_some() {
        caps.push(CAPABILITY_CUSTOM_SETTINGS_FORM);
    }
    caps
}

/// Deterministic service identifier: SHA-1 of a representative record's canonical text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId([u8; SERVICE_ID_LEN]);

impl ServiceId {
    /// Identifier of a service whose representative record is `record`.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        let digest = Sha1::digest(record.canonical_text().as_bytes());
        let mut id = [0u8; SERVICE_ID_LEN];
        id.copy_from_slice(&digest);
        Self(id)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SERVICE_ID_LEN] {
        &self.0
    }

    /// Decode an identifier from its base64 form.
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not base64 or not 20 bytes long.
    pub fn from_base64(text: &str) -> Result<Self, String> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| format!("invalid service id '{text}': {e}"))?;
        let id: [u8; SERVICE_ID_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            format!(
                "invalid service id '{text}': expected {SERVICE_ID_LEN} bytes, got {}",
                b.len()
            )
        })?;
        Ok(Self(id))
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({self})")
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(D::Error::custom)
    }
}

/// Metadata attached to a service inside a zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMeta {
    /// Registry type key of the service
    #[serde(rename = "_svctype")]
    pub type_key: String,

    /// Deterministic identifier
    #[serde(rename = "_id")]
    pub id: ServiceId,

    /// Subdomain relative to the zone origin (`""` for the apex)
    #[serde(rename = "_domain")]
    pub domain: String,

    /// TTL in seconds, `0` to inherit the zone default
    #[serde(rename = "_ttl")]
    pub ttl: u32,

    /// Generated summary
    #[serde(rename = "_comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    /// Free comment set by the user
    #[serde(rename = "_mycomment", default, skip_serializing_if = "String::is_empty")]
    pub user_comment: String,

    /// Number of records the service stood for when analysed
    #[serde(rename = "_tmp_hint_nb", default)]
    pub nb_resources: usize,
}

impl ServiceMeta {
    /// TTL to synthesize with, falling back on the zone default.
    #[must_use]
    pub fn effective_ttl(&self, default_ttl: u32) -> u32 {
        if self.ttl == 0 {
            default_ttl
        } else {
            self.ttl
        }
    }
}

/// A service together with its zone metadata.
#[derive(Debug, Clone)]
pub struct ServiceCombined {
    /// Zone metadata
    pub meta: ServiceMeta,

    /// The polymorphic service body
    pub service: Box<dyn DynService>,
}

impl ServiceCombined {
    /// Wrap `service`, computing its comment and resource count.
    #[must_use]
    pub fn new(
        service: Box<dyn DynService>,
        id: ServiceId,
        domain: &str,
        ttl: u32,
        origin: &str,
    ) -> Self {
        let meta = ServiceMeta {
            type_key: service.type_key().to_string(),
            id,
            domain: domain.to_string(),
            ttl,
            comment: service.gen_comment(origin),
            user_comment: String::new(),
            nb_resources: service.nb_resources(),
        };
        Self { meta, service }
    }

    /// Refresh the generated comment and resource count from the service body.
    pub fn refresh(&mut self, origin: &str) {
        self.meta.comment = self.service.gen_comment(origin);
        self.meta.nb_resources = self.service.nb_resources();
    }

    /// Records of this service, using `default_ttl` when the service inherits it.
    ///
    /// # Errors
    ///
    /// Returns the service's [`SynthesisError`].
    pub fn gen_rrs(&self, default_ttl: u32, origin: &str) -> Result<Vec<Record>, SynthesisError> {
        self.service
            .gen_rrs(&self.meta.domain, self.meta.effective_ttl(default_ttl), origin)
    }

    /// Persisted form of this service.
    ///
    /// # Errors
    ///
    /// Returns an error when the service body cannot be serialized.
    pub fn to_stored(&self) -> Result<StoredService, serde_json::Error> {
        Ok(StoredService {
            meta: self.meta.clone(),
            service: self.service.to_json()?,
        })
    }
}

impl Serialize for ServiceCombined {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_stored()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Persisted form of a [`ServiceCombined`], revived through the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredService {
    /// Zone metadata
    #[serde(flatten)]
    pub meta: ServiceMeta,

    /// Service body, decoded according to `meta.type_key`
    #[serde(rename = "Service")]
    pub service: serde_json::Value,
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
