// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the orphan fallback.

#[cfg(test)]
mod tests {
    use crate::dns_errors::{RecordParseError, SynthesisError};
    use crate::record::Record;
    use crate::service::Service;
    use crate::services::orphan::Orphan;
    use hickory_proto::rr::RecordType;

    #[test]
    fn test_from_record() {
        let record = Record::new("", RecordType::SRV, 300, "example.com.", "0 5 5060 sip.example.com.");
        let orphan = Orphan::from_record(&record);

        assert_eq!(orphan.record_type, "SRV");
        assert_eq!(orphan.rdata, "0 5 5060 sip.example.com.");
        assert_eq!(orphan.nb_resources(), 1);
        assert_eq!(orphan.gen_comment("example.com."), "SRV");
    }

    #[test]
    fn test_gen_rrs_is_lossless() {
        let record = Record::txt("www", 600, "example.com.", "v=spf1 -all");
        let orphan = Orphan::from_record(&record);

        let records = orphan.gen_rrs("www", 600, "example.com.").unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_gen_rrs_at_apex() {
        let orphan = Orphan {
            record_type: "NS".to_string(),
            rdata: "ns1.example.net.".to_string(),
        };

        let records = orphan.gen_rrs("", 3600, "example.com.").unwrap();
        assert_eq!(records[0].name(), "example.com.");
        assert_eq!(records[0].rtype(), RecordType::NS);
    }

    #[test]
    fn test_corrupted_orphan_is_a_synthesis_error() {
        let orphan = Orphan {
            record_type: "NOTATYPE".to_string(),
            rdata: "whatever".to_string(),
        };

        let err = orphan.gen_rrs("www", 300, "example.com.").unwrap_err();
        assert!(matches!(err, SynthesisError::Parse(_)));
    }

    #[test]
    fn test_empty_payload_is_a_synthesis_error() {
        let orphan = Orphan {
            record_type: "TXT".to_string(),
            rdata: String::new(),
        };

        assert!(orphan.gen_rrs("www", 300, "example.com.").is_err());
    }

    #[test]
    fn test_stored_body_layout() {
        let orphan = Orphan {
            record_type: "A".to_string(),
            rdata: "192.0.2.1".to_string(),
        };

        let json = serde_json::to_value(&orphan).unwrap();
        assert_eq!(json["Type"], "A");
        assert_eq!(json["Rdata"], "192.0.2.1");
    }

    #[test]
    fn test_invalid_payload_is_a_synthesis_error() {
        let orphan = Orphan {
            record_type: "A".to_string(),
            rdata: "not-an-ip".to_string(),
        };

        let err = orphan.gen_rrs("www", 300, "example.com.").unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::Parse(RecordParseError::InvalidRdata { ref rtype, .. }) if rtype == "A"
        ));
    }

    #[test]
    fn test_unnamed_type_round_trips() {
        let record = Record::new("www", RecordType::Unknown(99), 300, "example.com.", "\\# 2 0102");
        let orphan = Orphan::from_record(&record);

        assert_eq!(orphan.record_type, "TYPE99");
        assert_eq!(orphan.gen_comment("example.com."), "TYPE99");

        let records = orphan.gen_rrs("www", 300, "example.com.").unwrap();
        assert_eq!(records, vec![record]);
        assert_eq!(records[0].rtype(), RecordType::Unknown(99));
    }
}
