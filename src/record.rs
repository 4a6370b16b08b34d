// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Normalized resource record shared by analysis and synthesis.
//!
//! A [`Record`] is the common currency between provider adapters, the analyzer
//! and service synthesis. Its owner name is always absolute (trailing dot) and
//! its payload is kept in presentation format, so that the canonical text
//!
//! ```text
//! <name> <ttl> IN <type> <rdata>
//! ```
//!
//! is both what service identifiers are hashed from and what free-text record
//! searches match against.
//!
//! TXT payloads are normalized to quoted character-strings, and types without
//! a mnemonic use the RFC 3597 forms (`TYPE<n>`, `\# <length> <hex>`), so that
//! the canonical text of a record parses back to the same record.
//!
//! # Example
//!
//! ```rust
//! use dnsvc::record::Record;
//!
//! let record = Record::txt("_scaleway-challenge", 300, "example.com.", "abc123");
//! assert_eq!(
//!     record.to_string(),
//!     "_scaleway-challenge.example.com. 300 IN TXT \"abc123\""
//! );
//!
//! let parsed: Record = record.to_string().parse().unwrap();
//! assert_eq!(parsed, record);
//! ```

use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::txt::RDataParser;
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use crate::constants::{
    APEX_NAME, DNS_CLASS_IN, GENERIC_RDATA_MARKER, GENERIC_TYPE_PREFIX, TXT_CHUNK_MAX_LEN,
};
use crate::dns_errors::RecordParseError;

/// One DNS resource record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    name: String,
    rtype: RecordType,
    ttl: u32,
    rdata: String,
}

impl Record {
    /// Build a record, resolving `name` against `origin`.
    ///
    /// `name` may be absolute (`www.example.com.`), relative (`www`) or the
    /// apex (`""` or `"@"`). A well-formed payload is normalized; a malformed
    /// one is kept as given and reported by [`Record::validate`].
    pub fn new(
        name: &str,
        rtype: RecordType,
        ttl: u32,
        origin: &str,
        rdata: impl Into<String>,
    ) -> Self {
        let rdata = rdata.into();
        let rdata = rdata.trim();
        Self {
            name: absolute_name(name, origin),
            rtype,
            ttl,
            rdata: normalize_rdata(rtype, rdata).unwrap_or_else(|_| rdata.to_string()),
        }
    }

    /// Build a TXT record holding `text`, split into quoted character-strings.
    pub fn txt(name: &str, ttl: u32, origin: &str, text: &str) -> Self {
        Self::new(name, RecordType::TXT, ttl, origin, quote_txt(text))
    }

    /// Absolute owner name, with trailing dot.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record type.
    #[must_use]
    pub fn rtype(&self) -> RecordType {
        self.rtype
    }

    /// Time to live in seconds.
    #[must_use]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Payload in presentation format.
    #[must_use]
    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    /// Canonical text used for hashing and substring search.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        self.to_string()
    }

    /// Check the payload against the record type.
    ///
    /// # Errors
    ///
    /// Returns [`RecordParseError::InvalidRdata`] when the payload does not parse.
    pub fn validate(&self) -> Result<(), RecordParseError> {
        normalize_rdata(self.rtype, &self.rdata)
            .map(|_| ())
            .map_err(|reason| RecordParseError::InvalidRdata {
                line: self.to_string(),
                rtype: record_type_name(self.rtype),
                reason,
            })
    }

    /// Typed TXT payload, `None` for other types or a malformed payload.
    #[must_use]
    pub fn txt_data(&self) -> Option<TXT> {
        if self.rtype != RecordType::TXT {
            return None;
        }
        let strings = parse_character_strings(&self.rdata).ok()?;
        Some(TXT::from_bytes(strings.iter().map(Vec::as_slice).collect()))
    }

    /// Character-strings of a TXT payload, unquoted and unescaped.
    ///
    /// Bytes that are not UTF-8 are replaced. Empty for a malformed payload.
    #[must_use]
    pub fn txt_strings(&self) -> Vec<String> {
        self.txt_data()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// TXT payload with all character-strings concatenated.
    #[must_use]
    pub fn txt_joined(&self) -> String {
        self.txt_strings().concat()
    }

    /// Last field of the payload, which for MX, CNAME, NS and SRV is the target host.
    #[must_use]
    pub fn target(&self) -> &str {
        self.rdata.split_whitespace().last().unwrap_or_default()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.name,
            self.ttl,
            DNS_CLASS_IN,
            record_type_name(self.rtype),
            self.rdata
        )
    }
}

impl FromStr for Record {
    type Err = RecordParseError;

    /// Parse the canonical text form. The class token is optional.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = next_token(line).ok_or(RecordParseError::Empty)?;
        let (ttl_token, rest) = next_token(rest).ok_or_else(|| missing(line, "ttl"))?;
        let (mut type_token, mut rest) = next_token(rest).ok_or_else(|| missing(line, "type"))?;

        if type_token.eq_ignore_ascii_case(DNS_CLASS_IN) {
            (type_token, rest) = next_token(rest).ok_or_else(|| missing(line, "type"))?;
        }

        let ttl = ttl_token
            .parse::<u32>()
            .map_err(|_| RecordParseError::InvalidTtl {
                line: line.trim().to_string(),
                ttl: ttl_token.to_string(),
            })?;

        let rtype = parse_record_type(type_token).ok_or_else(|| RecordParseError::UnknownType {
            line: line.trim().to_string(),
            rtype: type_token.to_string(),
        })?;

        validate_absolute_name(name)?;

        let rdata = rest.trim();
        if rdata.is_empty() {
            return Err(missing(line, "rdata"));
        }
        let rdata = normalize_rdata(rtype, rdata).map_err(|reason| RecordParseError::InvalidRdata {
            line: line.trim().to_string(),
            rtype: record_type_name(rtype),
            reason,
        })?;

        Ok(Self {
            name: name.to_string(),
            rtype,
            ttl,
            rdata,
        })
    }
}

/// Parse a record type mnemonic, case-insensitively. `TYPE<n>` is accepted for any type.
#[must_use]
pub fn parse_record_type(token: &str) -> Option<RecordType> {
    let token = token.to_ascii_uppercase();
    if let Some(code) = token.strip_prefix(GENERIC_TYPE_PREFIX) {
        return code.parse::<u16>().ok().map(RecordType::from);
    }
    match RecordType::from_str(&token) {
        Ok(RecordType::Unknown(_)) | Err(_) => None,
        Ok(rtype) => Some(rtype),
    }
}

/// Mnemonic of a record type, `TYPE<n>` for types without a name.
///
/// ```rust
/// use dnsvc::record::record_type_name;
/// use hickory_proto::rr::RecordType;
///
/// assert_eq!(record_type_name(RecordType::MX), "MX");
/// assert_eq!(record_type_name(RecordType::Unknown(99)), "TYPE99");
/// ```
#[must_use]
pub fn record_type_name(rtype: RecordType) -> String {
    match rtype {
        RecordType::Unknown(code) => format!("{GENERIC_TYPE_PREFIX}{code}"),
        other => other.to_string(),
    }
}

/// Whether records of this type are DNSSEC management artifacts.
#[must_use]
pub fn is_dnssec_type(rtype: RecordType) -> bool {
    matches!(
        rtype,
        RecordType::DNSKEY
            | RecordType::CDNSKEY
            | RecordType::CDS
            | RecordType::DS
            | RecordType::KEY
            | RecordType::NSEC
            | RecordType::NSEC3
            | RecordType::NSEC3PARAM
            | RecordType::RRSIG
            | RecordType::SIG
    )
}

/// Append the trailing dot to a name if it lacks one.
#[must_use]
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Join labels into a name, skipping empty and apex parts.
///
/// The result is absolute when the last part is.
///
/// ```rust
/// use dnsvc::record::domain_join;
///
/// assert_eq!(domain_join(&["_scaleway-challenge", "www"]), "_scaleway-challenge.www");
/// assert_eq!(domain_join(&["_scaleway-challenge", ""]), "_scaleway-challenge");
/// assert_eq!(domain_join(&["_scaleway-challenge", "other.org."]), "_scaleway-challenge.other.org.");
/// assert_eq!(domain_join(&["", "@"]), "");
/// ```
#[must_use]
pub fn domain_join(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.trim_matches('.'))
        .filter(|p| !p.is_empty() && *p != APEX_NAME)
        .collect::<Vec<_>>()
        .join(".");

    let absolute = parts.last().is_some_and(|p| p.len() > 1 && p.ends_with('.'));
    if absolute && !joined.is_empty() {
        fqdn(&joined)
    } else {
        joined
    }
}

/// Name of `name` relative to `origin`: `""` for the apex, `www` for `www.<origin>`.
///
/// Names outside the zone stay absolute, so that [`absolute_name`] gives them back unchanged.
#[must_use]
pub fn relative_to(name: &str, origin: &str) -> String {
    let name = name.trim_end_matches('.');
    let origin = origin.trim_end_matches('.');

    if origin.is_empty() {
        return name.to_string();
    }
    if name.eq_ignore_ascii_case(origin) {
        return String::new();
    }

    let split = name.len().saturating_sub(origin.len());
    if name.len() > origin.len() + 1 && name.is_char_boundary(split) {
        let (head, tail) = name.split_at(split);
        if tail.eq_ignore_ascii_case(origin) && head.ends_with('.') {
            return head.trim_end_matches('.').to_string();
        }
    }

    fqdn(name)
}

/// Resolve `name` against `origin` into an absolute name.
#[must_use]
pub fn absolute_name(name: &str, origin: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == APEX_NAME {
        return fqdn(origin);
    }
    if name.ends_with('.') {
        return name.to_string();
    }
    let origin = origin.trim_end_matches('.');
    if origin.is_empty() {
        fqdn(name)
    } else {
        format!("{name}.{origin}.")
    }
}

/// Quote `text` as TXT character-strings of at most 255 bytes each.
#[must_use]
pub fn quote_txt(text: &str) -> String {
    let mut chunks: Vec<&str> = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if i + c.len_utf8() - start > TXT_CHUNK_MAX_LEN {
            chunks.push(&text[start..i]);
            start = i;
        }
    }
    if start < text.len() || chunks.is_empty() {
        chunks.push(&text[start..]);
    }

    chunks
        .iter()
        .map(|chunk| quote_character_string(chunk.as_bytes()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized payload of an `rtype` record, or why `rdata` is not one.
fn normalize_rdata(rtype: RecordType, rdata: &str) -> Result<String, String> {
    match rtype {
        RecordType::TXT => {
            let strings = parse_character_strings(rdata)?;
            Ok(strings
                .iter()
                .map(|s| quote_character_string(s))
                .collect::<Vec<_>>()
                .join(" "))
        }
        RecordType::Unknown(_) => normalize_generic_rdata(rdata),
        // Signatures and keys come from the signer and are carried opaque
        rtype if is_dnssec_type(rtype) => Ok(rdata.to_string()),
        rtype => RData::try_from_str(rtype, rdata)
            .map(|_| rdata.to_string())
            .map_err(|e| e.to_string()),
    }
}

/// Normalize an RFC 3597 `\# <length> <hex>` payload to lowercase hex in one block.
fn normalize_generic_rdata(rdata: &str) -> Result<String, String> {
    let mut tokens = rdata.split_whitespace();
    if tokens.next() != Some(GENERIC_RDATA_MARKER) {
        return Err(format!("expected '{GENERIC_RDATA_MARKER} <length> <hex>'"));
    }

    let length: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or("missing or invalid data length")?;
    let hex: String = tokens.collect();

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("data is not hexadecimal".to_string());
    }
    if length.checked_mul(2) != Some(hex.len()) {
        return Err(format!(
            "data length {length} does not match {} hex digits",
            hex.len()
        ));
    }

    if hex.is_empty() {
        Ok(format!("{GENERIC_RDATA_MARKER} 0"))
    } else {
        Ok(format!(
            "{GENERIC_RDATA_MARKER} {length} {}",
            hex.to_ascii_lowercase()
        ))
    }
}

/// Decode TXT character-strings, quoted or bare, with `\X` and `\DDD` escapes.
fn parse_character_strings(rdata: &str) -> Result<Vec<Vec<u8>>, String> {
    let mut strings = Vec::new();
    let mut chars = rdata.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let quoted = c == '"';
        if quoted {
            chars.next();
        }

        let mut current = Vec::new();
        let mut closed = !quoted;
        while let Some(&c) = chars.peek() {
            if !quoted && c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' if quoted => {
                    closed = true;
                    break;
                }
                '"' => return Err("quote inside an unquoted character-string".to_string()),
                '\\' => push_escaped(&mut chars, &mut current)?,
                c => current.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
            }
        }

        if !closed {
            return Err("unterminated quoted character-string".to_string());
        }
        if current.len() > TXT_CHUNK_MAX_LEN {
            return Err(format!(
                "character-string longer than {TXT_CHUNK_MAX_LEN} bytes"
            ));
        }
        strings.push(current);
    }

    Ok(strings)
}

fn push_escaped(chars: &mut Peekable<Chars<'_>>, out: &mut Vec<u8>) -> Result<(), String> {
    let first = chars.next().ok_or("dangling escape")?;
    let Some(mut value) = first.to_digit(10) else {
        out.extend_from_slice(first.encode_utf8(&mut [0; 4]).as_bytes());
        return Ok(());
    };

    for _ in 0..2 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or("incomplete \\DDD escape")?;
        value = value * 10 + digit;
    }

    let byte = u8::try_from(value).map_err(|_| format!("escape \\{value} is not an octet"))?;
    out.push(byte);
    Ok(())
}

/// Quote one character-string, escaping quotes, backslashes and non-printable bytes.
fn quote_character_string(bytes: &[u8]) -> String {
    let mut quoted = String::with_capacity(bytes.len() + 2);
    quoted.push('"');

    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '"' | '\\' => {
                    quoted.push('\\');
                    quoted.push(c);
                }
                c if c.is_control() => {
                    push_decimal_escapes(&mut quoted, c.encode_utf8(&mut [0; 4]).as_bytes());
                }
                c => quoted.push(c),
            }
        }
        push_decimal_escapes(&mut quoted, chunk.invalid());
    }

    quoted.push('"');
    quoted
}

fn push_decimal_escapes(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        out.push_str(&format!("\\{byte:03}"));
    }
}

fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn missing(line: &str, field: &'static str) -> RecordParseError {
    RecordParseError::MissingField {
        line: line.trim().to_string(),
        field,
    }
}

fn validate_absolute_name(name: &str) -> Result<(), RecordParseError> {
    let parsed = Name::from_ascii(name).map_err(|e| RecordParseError::InvalidName {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    if !parsed.is_fqdn() {
        return Err(RecordParseError::InvalidName {
            name: name.to_string(),
            reason: "owner name must be absolute".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
