// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the mail exchangers service.

#[cfg(test)]
mod tests {
    use crate::analyzer::analyze_zone;
    use crate::dns_errors::{RecordParseError, SynthesisError};
    use crate::record::Record;
    use crate::registry::ServiceRegistry;
    use crate::service::Service;
    use crate::services::mx::{MailExchanger, MailExchangers};
    use hickory_proto::rr::RecordType;

    const ORIGIN: &str = "example.com.";

    fn mx(name: &str, rdata: &str) -> Record {
        Record::new(name, RecordType::MX, 300, ORIGIN, rdata)
    }

    #[test]
    fn test_parse_rdata() {
        assert_eq!(
            MailExchanger::from_rdata("10 mx1.example.com."),
            Some(MailExchanger {
                preference: 10,
                target: "mx1.example.com.".to_string()
            })
        );
        assert_eq!(MailExchanger::from_rdata("mx1.example.com."), None);
        assert_eq!(MailExchanger::from_rdata("70000 mx1.example.com."), None);
        assert_eq!(MailExchanger::from_rdata("10 a b"), None);
    }

    #[test]
    fn test_groups_mx_per_subdomain() {
        let registry = ServiceRegistry::builtin().unwrap();
        let records = vec![
            mx("", "10 mx1.example.com."),
            mx("", "20 mx2.example.com."),
            mx("lists", "10 mx1.example.com."),
        ];

        let analysis = analyze_zone(&registry, ORIGIN, records).unwrap();

        let apex = &analysis.services[""];
        assert_eq!(apex.len(), 1);
        assert_eq!(apex[0].meta.type_key, "abstract.MXs");
        assert_eq!(apex[0].meta.nb_resources, 2);
        assert_eq!(apex[0].meta.comment, "mx1.example.com, mx2.example.com");

        let lists = &analysis.services["lists"];
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].meta.nb_resources, 1);
    }

    #[test]
    fn test_id_comes_from_first_record() {
        let registry = ServiceRegistry::builtin().unwrap();
        let first = mx("", "10 mx1.example.com.");
        let records = vec![first.clone(), mx("", "20 mx2.example.com.")];

        let analysis = analyze_zone(&registry, ORIGIN, records).unwrap();

        assert_eq!(
            analysis.services[""][0].meta.id,
            crate::service::ServiceId::from_record(&first)
        );
    }

    #[test]
    fn test_malformed_mx_becomes_orphan() {
        let registry = ServiceRegistry::builtin().unwrap();
        let records = vec![mx("", "mx1.example.com.")];

        let analysis = analyze_zone(&registry, ORIGIN, records).unwrap();

        assert_eq!(analysis.services[""][0].meta.type_key, "svcs.Orphan");
    }

    #[test]
    fn test_gen_rrs() {
        let service = MailExchangers {
            mxs: vec![
                MailExchanger {
                    preference: 10,
                    target: "mx1.example.com.".to_string(),
                },
                MailExchanger {
                    preference: 20,
                    target: "mx2.example.net".to_string(),
                },
            ],
        };

        let records = service.gen_rrs("", 600, ORIGIN).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to_string(), "example.com. 600 IN MX 10 mx1.example.com.");
        assert_eq!(records[1].rdata(), "20 mx2.example.net.");
    }

    #[test]
    fn test_gen_rrs_rejects_empty_target() {
        let service = MailExchangers {
            mxs: vec![MailExchanger::default()],
        };

        assert!(service.gen_rrs("", 600, ORIGIN).is_err());
    }

    #[test]
    fn test_gen_rrs_rejects_invalid_target() {
        let service = MailExchangers {
            mxs: vec![MailExchanger {
                preference: 10,
                target: format!("{}.example.com.", "x".repeat(64)),
            }],
        };

        assert!(matches!(
            service.gen_rrs("", 600, ORIGIN),
            Err(SynthesisError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage_mx_line() {
        let err = "example.com. 300 IN MX garbage"
            .parse::<Record>()
            .unwrap_err();

        assert!(matches!(err, RecordParseError::InvalidRdata { ref rtype, .. } if rtype == "MX"));
    }

    #[test]
    fn test_grouped_exchangers_share_first_ttl() {
        let registry = ServiceRegistry::builtin().unwrap();
        let records = vec![
            Record::new("", RecordType::MX, 300, ORIGIN, "10 mx1.example.com."),
            Record::new("", RecordType::MX, 600, ORIGIN, "20 mx2.example.com."),
        ];

        let analysis = analyze_zone(&registry, ORIGIN, records).unwrap();
        let service = &analysis.services[""][0];
        assert_eq!(service.meta.nb_resources, 2);
        assert_eq!(service.meta.effective_ttl(analysis.default_ttl), 300);

        let regenerated = service.gen_rrs(analysis.default_ttl, ORIGIN).unwrap();
        assert_eq!(regenerated.len(), 2);
        assert!(regenerated.iter().all(|r| r.ttl() == 300));
    }
}
