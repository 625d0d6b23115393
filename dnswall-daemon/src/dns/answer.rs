//! Builds A/AAAA answer records from a resolved [`dnswall_core::DomainDetail`].

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use hickory_server::proto::rr::{rdata, Name, RData, Record, RecordType};
use rand::seq::SliceRandom;

use dnswall_core::DomainDetail;

/// Projects `detail` to a deduplicated, shuffled list of A or AAAA records
/// for `name` and `record_type`. Unsupported record types yield an empty
/// list, which the handler treats as NOERROR/NODATA rather than an error.
pub fn build_answers(name: &Name, record_type: RecordType, detail: &DomainDetail, ttl: u32) -> Vec<Record> {
    let mut records = match record_type {
        RecordType::A => ipv4_records(name, detail, ttl),
        RecordType::AAAA => ipv6_records(name, detail, ttl),
        _ => Vec::new(),
    };

    records.shuffle(&mut rand::thread_rng());
    records
}

fn ipv4_records(name: &Name, detail: &DomainDetail, ttl: u32) -> Vec<Record> {
    let mut seen = HashSet::new();
    detail
        .items
        .iter()
        .filter_map(|item| item.host_ipv4.as_deref())
        .filter_map(|addr| Ipv4Addr::from_str(addr).ok())
        .filter(|addr| seen.insert(*addr))
        .map(|addr| Record::from_rdata(name.clone(), ttl, RData::A(rdata::A(addr))))
        .collect()
}

fn ipv6_records(name: &Name, detail: &DomainDetail, ttl: u32) -> Vec<Record> {
    let mut seen = HashSet::new();
    detail
        .items
        .iter()
        .filter_map(|item| item.host_ipv6.as_deref())
        .filter_map(|addr| Ipv6Addr::from_str(addr).ok())
        .filter(|addr| seen.insert(*addr))
        .map(|addr| Record::from_rdata(name.clone(), ttl, RData::AAAA(rdata::AAAA(addr))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnswall_core::DomainItem;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn builds_deduplicated_a_records() {
        let a = DomainItem::new("u1", Some("10.0.0.1".to_string()), None).unwrap();
        let b = DomainItem::new("u2", Some("10.0.0.1".to_string()), None).unwrap();
        let detail = DomainDetail::from_items("api.svc.local", vec![a, b]);

        let records = build_answers(&name("api.svc.local."), RecordType::A, &detail, 60);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn skips_items_without_the_requested_family() {
        let item = DomainItem::new("u1", Some("10.0.0.1".to_string()), None).unwrap();
        let detail = DomainDetail::from_items("api.svc.local", vec![item]);

        let records = build_answers(&name("api.svc.local."), RecordType::AAAA, &detail, 60);
        assert!(records.is_empty());
    }

    #[test]
    fn unsupported_record_type_yields_no_answers() {
        let item = DomainItem::new("u1", Some("10.0.0.1".to_string()), None).unwrap();
        let detail = DomainDetail::from_items("api.svc.local", vec![item]);

        let records = build_answers(&name("api.svc.local."), RecordType::MX, &detail, 60);
        assert!(records.is_empty());
    }

    #[test]
    fn shuffling_distributes_first_position_over_many_trials() {
        let a = DomainItem::new("u1", Some("10.0.0.1".to_string()), None).unwrap();
        let b = DomainItem::new("u2", Some("10.0.0.2".to_string()), None).unwrap();
        let detail = DomainDetail::from_items("api.svc.local", vec![a, b]);

        let mut first_addrs = HashSet::new();
        for _ in 0..200 {
            let records = build_answers(&name("api.svc.local."), RecordType::A, &detail, 60);
            if let Some(RData::A(addr)) = records.first().map(|r| r.data()) {
                first_addrs.insert(*addr);
            }
        }

        assert_eq!(first_addrs.len(), 2);
    }
}
