// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end properties of the analysis and synthesis passes
//!
//! These tests drive the public API only: parse records, analyse them with the
//! built-in registry (or a synthetic one), then synthesize records back.
//!
//! Run with: cargo test --test analysis_properties

mod common;

use common::{
    accounted_records, analyze_any_txt, analyze_spf, infos, mixed_zone, records, AnyTxt, Spf,
    ORIGIN,
};
use dnsvc::analyzer::{analyze_zone, Analysis};
use dnsvc::record::Record;
use dnsvc::registry::ServiceRegistry;
use dnsvc::service::ServiceId;
use dnsvc::services::scaleway_challenge::ScalewayChallenge;
use dnsvc::zone::{StoredZone, Zone};
use hickory_proto::rr::RecordType;

// ============================================================================
// Helper Functions
// ============================================================================

fn builtin() -> ServiceRegistry {
    ServiceRegistry::builtin().expect("built-in registry should build")
}

/// `(subdomain, type key, comment, resource count)` of every service, sorted
fn summary(analysis: &Analysis) -> Vec<(String, String, String, usize)> {
    let mut rows: Vec<_> = analysis
        .services
        .values()
        .flatten()
        .map(|s| {
            (
                s.meta.domain.clone(),
                s.meta.type_key.clone(),
                s.meta.comment.clone(),
                s.meta.nb_resources,
            )
        })
        .collect();
    rows.sort();
    rows
}

fn type_key_at<'a>(analysis: &'a Analysis, subdomain: &str, index: usize) -> &'a str {
    &analysis.services[subdomain][index].meta.type_key
}

// ============================================================================
// Totality
// ============================================================================

#[test]
fn test_every_record_is_accounted_for() {
    let input = mixed_zone();
    let analysis = analyze_zone(&builtin(), ORIGIN, input.clone()).unwrap();

    assert_eq!(accounted_records(&analysis), input.len());
    // RRSIG, DNSKEY and the __dnssec bookkeeping TXT
    assert_eq!(analysis.dropped, 3);
}

#[test]
fn test_unknown_records_become_orphans() {
    let analysis = analyze_zone(&builtin(), ORIGIN, mixed_zone()).unwrap();

    let orphans: Vec<_> = analysis
        .services
        .values()
        .flatten()
        .filter(|s| s.meta.type_key == "svcs.Orphan")
        .map(|s| s.meta.domain.as_str())
        .collect();

    // Apex SPF TXT and the SIP SRV record, nothing else
    assert_eq!(orphans.len(), 2);
    assert!(orphans.contains(&""));
    assert!(orphans.contains(&"_sip._tcp"));
}

#[test]
fn test_empty_zone() {
    let analysis = analyze_zone(&builtin(), ORIGIN, Vec::new()).unwrap();

    assert_eq!(analysis.nb_services(), 0);
    assert_eq!(analysis.dropped, 0);
    assert_eq!(analysis.default_ttl, 3600);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_analysis_is_deterministic() {
    let registry = builtin();
    let first = analyze_zone(&registry, ORIGIN, mixed_zone()).unwrap();
    let second = analyze_zone(&registry, ORIGIN, mixed_zone()).unwrap();

    let ids = |a: &Analysis| -> Vec<(String, ServiceId)> {
        a.services
            .values()
            .flatten()
            .map(|s| (s.meta.domain.clone(), s.meta.id))
            .collect()
    };

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_service_id_comes_from_first_record() {
    let input = records(&["blog.example.com. 300 IN CNAME example.github.io."]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input.clone()).unwrap();

    assert_eq!(
        analysis.services["blog"][0].meta.id,
        ServiceId::from_record(&input[0])
    );
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_regenerated_records_analyse_to_same_services() {
    let registry = builtin();
    let first = analyze_zone(&registry, ORIGIN, mixed_zone()).unwrap();
    let expected = summary(&first);

    let synthesis = Zone::from_analysis(first).generate_records(ORIGIN);
    assert!(synthesis.is_complete());

    let second = analyze_zone(&registry, ORIGIN, synthesis.records).unwrap();
    assert_eq!(summary(&second), expected);
    assert_eq!(second.dropped, 0);
}

#[test]
fn test_stored_zone_survives_json() {
    let registry = builtin();
    let zone = Zone::from_analysis(analyze_zone(&registry, ORIGIN, mixed_zone()).unwrap());
    let before = zone.generate_records(ORIGIN);

    let json = serde_json::to_string(&zone.to_stored().unwrap()).unwrap();
    let stored: StoredZone = serde_json::from_str(&json).unwrap();
    let revived = Zone::from_stored(stored, &registry).unwrap();

    assert_eq!(revived.nb_services(), zone.nb_services());
    assert_eq!(revived.generate_records(ORIGIN).records, before.records);
}

// ============================================================================
// Default TTL
// ============================================================================

#[test]
fn test_default_ttl_is_most_used() {
    let input = records(&[
        "a.example.com. 300 IN A 192.0.2.1",
        "b.example.com. 300 IN A 192.0.2.2",
        "c.example.com. 300 IN A 192.0.2.3",
        "d.example.com. 600 IN A 192.0.2.4",
    ]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input.clone()).unwrap();

    assert_eq!(analysis.default_ttl, 300);
    for domain in ["a", "b", "c"] {
        assert_eq!(analysis.services[domain][0].meta.ttl, 0, "{domain}");
    }
    assert_eq!(analysis.services["d"][0].meta.ttl, 600);

    let synthesis = Zone::from_analysis(analysis).generate_records(ORIGIN);
    assert_eq!(synthesis.records, input);
}

// ============================================================================
// Priority ordering
// ============================================================================

fn synthetic_registry(spf_first: bool) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    if spf_first {
        registry.register::<Spf>(Some(analyze_spf), infos("SPF"), 5).unwrap();
        registry.register::<AnyTxt>(Some(analyze_any_txt), infos("Text"), 50).unwrap();
    } else {
        registry.register::<AnyTxt>(Some(analyze_any_txt), infos("Text"), 50).unwrap();
        registry.register::<Spf>(Some(analyze_spf), infos("SPF"), 5).unwrap();
    }
    registry
}

#[test]
fn test_priority_wins_over_registration_order() {
    let input = records(&[
        "example.com. 300 IN TXT \"v=spf1 mx -all\"",
        "example.com. 300 IN TXT \"hello\"",
        "www.example.com. 300 IN TXT \"v=spf1 -all\"",
    ]);

    for spf_first in [true, false] {
        let registry = synthetic_registry(spf_first);
        let analysis = analyze_zone(&registry, ORIGIN, input.clone()).unwrap();

        assert_eq!(type_key_at(&analysis, "", 0), "test.Spf");
        assert_eq!(type_key_at(&analysis, "", 1), "test.AnyTxt");
        assert_eq!(type_key_at(&analysis, "www", 0), "test.Spf");
        assert_eq!(accounted_records(&analysis), input.len());
    }
}

#[test]
fn test_claimed_records_are_invisible_to_later_recognizers() {
    let input = records(&["example.com. 300 IN TXT \"v=spf1 mx -all\""]);
    let analysis = analyze_zone(&synthetic_registry(false), ORIGIN, input).unwrap();

    assert_eq!(analysis.nb_services(), 1);
    assert_eq!(type_key_at(&analysis, "", 0), "test.Spf");
}

// ============================================================================
// DNSSEC
// ============================================================================

#[test]
fn test_dnssec_artifacts_are_dropped() {
    let input = records(&[
        "example.com. 300 IN DNSKEY 257 3 13 abcd",
        "example.com. 300 IN NSEC www.example.com. A MX RRSIG NSEC",
        "__dnssec.example.com. 300 IN TXT \"state\"",
        "www.example.com. 300 IN A 192.0.2.1",
    ]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input).unwrap();

    assert_eq!(analysis.dropped, 3);
    assert_eq!(analysis.nb_services(), 1);
    assert_eq!(type_key_at(&analysis, "www", 0), "abstract.Server");

    let synthesis = Zone::from_analysis(analysis).generate_records(ORIGIN);
    assert!(synthesis
        .records
        .iter()
        .all(|r| r.rtype() == RecordType::A));
}

// ============================================================================
// Scaleway challenge
// ============================================================================

#[test]
fn test_scaleway_challenge_scenario() {
    let input = records(&["_scaleway-challenge.example.com. 300 IN TXT \"abc123\""]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input).unwrap();

    assert_eq!(analysis.nb_services(), 1);
    let service = &analysis.services[""][0];
    assert_eq!(service.meta.type_key, "abstract.ScalewayChallenge");
    assert_eq!(service.meta.comment, "abc123");
    assert_eq!(service.meta.nb_resources, 1);
    assert_eq!(service.meta.ttl, 0);
    assert_eq!(
        service.service.downcast_ref::<ScalewayChallenge>().unwrap().challenge,
        "abc123"
    );

    let synthesis = Zone::from_analysis(analysis).generate_records(ORIGIN);
    assert_eq!(
        synthesis.records,
        vec![Record::txt("_scaleway-challenge", 300, ORIGIN, "abc123")]
    );
    assert_eq!(
        synthesis.records[0].to_string(),
        "_scaleway-challenge.example.com. 300 IN TXT \"abc123\""
    );
}

#[test]
fn test_unquoted_scaleway_challenge_matches_quoted() {
    let bare = records(&["_scaleway-challenge.example.com. 300 IN TXT abc123"]);
    let quoted = records(&["_scaleway-challenge.example.com. 300 IN TXT \"abc123\""]);

    let registry = builtin();
    let from_bare = analyze_zone(&registry, ORIGIN, bare).unwrap();
    let from_quoted = analyze_zone(&registry, ORIGIN, quoted).unwrap();

    assert_eq!(
        from_bare.services[""][0].meta.id,
        from_quoted.services[""][0].meta.id
    );
    assert_eq!(summary(&from_bare), summary(&from_quoted));
}

#[test]
fn test_escaped_scaleway_challenge_round_trips() {
    let input = records(&[r#"_scaleway-challenge.example.com. 300 IN TXT "a\065b""#]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input.clone()).unwrap();

    assert_eq!(analysis.services[""][0].meta.comment, "aAb");

    let synthesis = Zone::from_analysis(analysis).generate_records(ORIGIN);
    assert_eq!(synthesis.records, input);
}

// ============================================================================
// Names and types outside the usual
// ============================================================================

#[test]
fn test_out_of_zone_records_keep_their_owner() {
    let input = records(&[
        "mail.other.org. 300 IN TXT \"hello\"",
        "www.other.org. 300 IN A 192.0.2.1",
    ]);
    let analysis = analyze_zone(&builtin(), ORIGIN, input.clone()).unwrap();

    assert_eq!(type_key_at(&analysis, "www.other.org.", 0), "abstract.Server");
    assert_eq!(type_key_at(&analysis, "mail.other.org.", 0), "svcs.Orphan");

    let synthesis = Zone::from_analysis(analysis).generate_records(ORIGIN);
    assert!(synthesis.is_complete());
    assert_eq!(synthesis.records, input);
}

#[test]
fn test_unnamed_type_survives_storage() {
    let registry = builtin();
    let input = records(&["www.example.com. 300 IN TYPE99 \\# 2 0102"]);
    let zone = Zone::from_analysis(analyze_zone(&registry, ORIGIN, input.clone()).unwrap());

    let json = serde_json::to_string(&zone.to_stored().unwrap()).unwrap();
    let stored: StoredZone = serde_json::from_str(&json).unwrap();
    let revived = Zone::from_stored(stored, &registry).unwrap();

    let synthesis = revived.generate_records(ORIGIN);
    assert!(synthesis.is_complete());
    assert_eq!(synthesis.records, input);
    assert_eq!(synthesis.records[0].rtype(), RecordType::Unknown(99));
}
