use std::collections::{BTreeMap, HashMap};

use crate::dns::{
    DNSPacket,
    enums::DNSResourceType,
    name::Name,
    rdata::{Dnskey, Ds, Nsec3, RData, Rrsig},
};

/// All records sharing one owner and type.
///
/// Keyed by canonical RDATA, so duplicates collapse and iteration
/// follows the RFC 4034 6.3 canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    pub name: Name,
    pub rtype: DNSResourceType,
    pub ttl: u32,
    records: BTreeMap<Vec<u8>, RData>,
}

impl RRset {
    pub fn new(name: Name, rtype: DNSResourceType, ttl: u32) -> Self {
        Self {
            name,
            rtype,
            ttl,
            records: BTreeMap::new(),
        }
    }

    /// Insert a record. Returns false if an identical one was already there.
    pub fn insert(&mut self, rdata: RData) -> bool {
        self.records.insert(rdata.to_wire(), rdata).is_none()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RData> {
        self.records.values()
    }

    /// (canonical RDATA, record) pairs in canonical order
    pub fn canonical(&self) -> impl Iterator<Item = (&[u8], &RData)> {
        self.records.iter().map(|(wire, rdata)| (wire.as_slice(), rdata))
    }

    pub fn dnskeys(&self) -> impl Iterator<Item = &Dnskey> {
        self.iter().filter_map(|r| match r {
            RData::DNSKEY(key) => Some(key),
            _ => None,
        })
    }

    pub fn ds_records(&self) -> impl Iterator<Item = &Ds> {
        self.iter().filter_map(|r| match r {
            RData::DS(ds) => Some(ds),
            _ => None,
        })
    }

    /// Zone-file lines, one per record: `owner ttl IN type rdata`
    pub fn presentation(&self) -> Vec<String> {
        self.iter()
            .map(|rdata| format!("{} {} IN {} {}", self.name, self.ttl, self.rtype, rdata))
            .collect()
    }
}

/// Records of one response, grouped by (owner, type).
#[derive(Debug, Default)]
pub struct RecordStore {
    rrsets: HashMap<(Name, DNSResourceType), RRset>,
    signatures: HashMap<(Name, DNSResourceType), Vec<Rrsig>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_packet(packet: &DNSPacket) -> Self {
        let mut store = Self::new();
        for (_place, record) in packet.records() {
            store.add(&record.name, record.ttl, record.rdata.clone(), record.rtype);
        }
        store
    }

    pub fn add(&mut self, owner: &Name, ttl: u32, rdata: RData, rtype: DNSResourceType) {
        match rdata {
            RData::RRSIG(sig) => {
                let sigs = self
                    .signatures
                    .entry((owner.clone(), sig.type_covered))
                    .or_default();
                if !sigs.contains(&sig) {
                    sigs.push(sig);
                }
            }
            _ if rtype == DNSResourceType::OPT => {}
            rdata => {
                self.rrsets
                    .entry((owner.clone(), rtype))
                    .or_insert_with(|| RRset::new(owner.clone(), rtype, ttl))
                    .insert(rdata);
            }
        }
    }

    pub fn rrset(&self, owner: &Name, rtype: DNSResourceType) -> Option<&RRset> {
        self.rrsets
            .get(&(owner.clone(), rtype))
            .filter(|set| !set.is_empty())
    }

    pub fn signatures(&self, owner: &Name, rtype: DNSResourceType) -> &[Rrsig] {
        self.signatures
            .get(&(owner.clone(), rtype))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every NSEC3 RRset in the response
    pub fn nsec3_rrsets(&self) -> impl Iterator<Item = &RRset> {
        self.rrsets
            .iter()
            .filter(|((_, rtype), _)| *rtype == DNSResourceType::NSEC3)
            .map(|(_, set)| set)
    }

    /// (owner, NSEC3) pairs from the NSEC3 RRsets `accept` lets through
    pub fn nsec3_records<F>(&self, mut accept: F) -> Vec<(Name, Nsec3)>
    where
        F: FnMut(&RRset) -> bool,
    {
        let mut out = Vec::new();
        for set in self.nsec3_rrsets().filter(|set| accept(set)) {
            for rdata in set.iter() {
                if let RData::NSEC3(nsec3) = rdata {
                    out.push((set.name.clone(), nsec3.clone()));
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty() && self.signatures.is_empty()
    }
}
