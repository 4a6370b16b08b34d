// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the Scaleway challenge service.

#[cfg(test)]
mod tests {
    use crate::analyzer::analyze_zone;
    use crate::record::Record;
    use crate::registry::ServiceRegistry;
    use crate::service::{service_capabilities, Service};
    use crate::services::scaleway_challenge::ScalewayChallenge;
    use hickory_proto::rr::RecordType;

    const ORIGIN: &str = "example.com.";

    #[test]
    fn test_recognized_at_apex() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record = Record::new(
            "_scaleway-challenge.example.com.",
            RecordType::TXT,
            300,
            ORIGIN,
            "abc123",
        );

        let analysis = analyze_zone(&registry, ORIGIN, vec![record]).unwrap();

        let apex = &analysis.services[""];
        assert_eq!(apex.len(), 1);
        assert_eq!(apex[0].meta.type_key, "abstract.ScalewayChallenge");
        assert_eq!(apex[0].meta.comment, "abc123");
        assert_eq!(apex[0].meta.nb_resources, 1);
        assert_eq!(apex[0].meta.ttl, 0);
    }

    #[test]
    fn test_recognized_below_subdomain() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record = Record::txt("_scaleway-challenge.shop", 300, ORIGIN, "token");

        let analysis = analyze_zone(&registry, ORIGIN, vec![record]).unwrap();

        let shop = &analysis.services["shop"];
        assert_eq!(shop[0].meta.type_key, "abstract.ScalewayChallenge");
        assert!(!analysis.services.contains_key("_scaleway-challenge.shop"));
    }

    #[test]
    fn test_other_txt_is_left_alone() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record = Record::txt("_scaleway-challengeX", 300, ORIGIN, "token");

        let analysis = analyze_zone(&registry, ORIGIN, vec![record]).unwrap();

        let services = &analysis.services["_scaleway-challengeX"];
        assert_eq!(services[0].meta.type_key, "svcs.Orphan");
    }

    #[test]
    fn test_gen_rrs() {
        let service = ScalewayChallenge {
            challenge: "abc123".to_string(),
        };

        let records = service.gen_rrs("", 300, ORIGIN).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].to_string(),
            "_scaleway-challenge.example.com. 300 IN TXT \"abc123\""
        );

        let records = service.gen_rrs("shop", 300, ORIGIN).unwrap();
        assert_eq!(records[0].name(), "_scaleway-challenge.shop.example.com.");
    }

    #[test]
    fn test_empty_challenge_fails() {
        let service = ScalewayChallenge::default();
        assert!(service.gen_rrs("", 300, ORIGIN).is_err());
    }

    #[test]
    fn test_lists_its_subdomain() {
        let service = ScalewayChallenge::default();
        let boxed: Box<dyn crate::service::DynService> = Box::new(service);

        assert_eq!(service_capabilities(boxed.as_ref()), vec!["ListSubdomains"]);
        assert_eq!(
            boxed.as_subdomain_lister().unwrap().list_subdomains(),
            vec!["_scaleway-challenge".to_string()]
        );
    }

    #[test]
    fn test_escaped_challenge_is_decoded() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record: Record = r#"_scaleway-challenge.example.com. 300 IN TXT "a\065b""#
            .parse()
            .unwrap();

        let analysis = analyze_zone(&registry, ORIGIN, vec![record.clone()]).unwrap();
        let service = &analysis.services[""][0];
        assert_eq!(
            service.service.downcast_ref::<ScalewayChallenge>().unwrap().challenge,
            "aAb"
        );

        let records = service.gen_rrs(analysis.default_ttl, ORIGIN).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_malformed_txt_becomes_orphan() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record = Record::new("_scaleway-challenge", RecordType::TXT, 300, ORIGIN, "\"abc");

        let analysis = analyze_zone(&registry, ORIGIN, vec![record]).unwrap();

        let services = &analysis.services["_scaleway-challenge"];
        assert_eq!(services[0].meta.type_key, "svcs.Orphan");
    }

    #[test]
    fn test_out_of_zone_challenge_keeps_its_owner() {
        let registry = ServiceRegistry::builtin().unwrap();
        let record = Record::txt("_scaleway-challenge.other.org.", 300, ORIGIN, "token");

        let analysis = analyze_zone(&registry, ORIGIN, vec![record.clone()]).unwrap();

        let service = &analysis.services["other.org."][0];
        assert_eq!(service.meta.type_key, "abstract.ScalewayChallenge");
        assert_eq!(service.gen_rrs(analysis.default_ttl, ORIGIN).unwrap(), vec![record]);
    }
}
