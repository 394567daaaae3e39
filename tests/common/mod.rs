//! Signed test zones and an in-memory upstream shared by the integration tests

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ring::signature::{Ed25519KeyPair, KeyPair};

use chainwalk::{
    ChainValidator,
    dns::{
        DNSPacket, EdnsOptions, QueryFlags,
        enums::DNSResourceType,
        name::Name,
        rdata::{Dnskey, Ds, Nsec3, RData, Rrsig, encode_type_bitmap},
        resource::DNSResource,
    },
    dnssec::{DigestType, RRset, TrustAnchor, dnskey_digest, nsec3_hash},
    error::{Result, ValidatorError},
    transport::Upstream,
};

/// Fixed clock for every signature made here
pub const NOW: u32 = 1_700_000_000;
pub const TTL: u32 = 3600;

pub fn name(text: &str) -> Name {
    Name::from_ascii(text).unwrap()
}

/// A zone with an Ed25519 KSK/ZSK pair derived from `seed`
pub struct TestZone {
    pub name: Name,
    pub ksk: Ed25519KeyPair,
    pub zsk: Ed25519KeyPair,
}

impl TestZone {
    pub fn new(zone: &str, seed: u8) -> Self {
        Self {
            name: name(zone),
            ksk: Ed25519KeyPair::from_seed_unchecked(&[seed; 32]).unwrap(),
            zsk: Ed25519KeyPair::from_seed_unchecked(&[seed.wrapping_add(0x80); 32]).unwrap(),
        }
    }

    pub fn ksk_dnskey(&self) -> Dnskey {
        dnskey(257, &self.ksk)
    }

    pub fn zsk_dnskey(&self) -> Dnskey {
        dnskey(256, &self.zsk)
    }

    pub fn dnskey_rrset(&self) -> RRset {
        rrset(
            &self.name,
            DNSResourceType::DNSKEY,
            vec![
                RData::DNSKEY(self.ksk_dnskey()),
                RData::DNSKEY(self.zsk_dnskey()),
            ],
        )
    }

    /// SHA-256 DS for the KSK, as the parent would publish it
    pub fn ds(&self) -> Ds {
        let key = self.ksk_dnskey();
        Ds {
            key_tag: key.key_tag(),
            algorithm: key.algorithm,
            digest_type: 2,
            digest: dnskey_digest(&self.name, &key, DigestType::Sha256).unwrap(),
        }
    }

    pub fn anchor(&self) -> TrustAnchor {
        TrustAnchor {
            zone: self.name.clone(),
            ds: self.ds(),
        }
    }

    pub fn sign_with_ksk(&self, set: &RRset) -> Rrsig {
        sign(&self.name, &self.ksk, 257, set)
    }

    pub fn sign_with_zsk(&self, set: &RRset) -> Rrsig {
        sign(&self.name, &self.zsk, 256, set)
    }

    /// DNSKEY RRset signed by the KSK
    pub fn publish_keys(&self, upstream: &mut MockUpstream) {
        let keys = self.dnskey_rrset();
        let sig = self.sign_with_ksk(&keys);
        upstream.answer(&self.name, DNSResourceType::DNSKEY, signed(&keys, &[sig]));
    }

    /// Signed DS RRset for `child` in this zone
    pub fn delegate(&self, child: &TestZone, upstream: &mut MockUpstream) {
        let ds = rrset(&child.name, DNSResourceType::DS, vec![RData::DS(child.ds())]);
        let sig = self.sign_with_zsk(&ds);
        upstream.answer(&child.name, DNSResourceType::DS, signed(&ds, &[sig]));
    }

    /// Answer `set` signed by the ZSK
    pub fn publish(&self, set: &RRset, upstream: &mut MockUpstream) {
        let sig = self.sign_with_zsk(set);
        upstream.answer(&set.name, set.rtype, signed(set, &[sig]));
    }

    /// An NSEC3 RRset of this zone whose hashed owner is `base`
    pub fn nsec3(&self, base: &[u8], next: &[u8], flags: u8, types: &[DNSResourceType]) -> RRset {
        let owner = self.name.prepend(&chainwalk::dns::rdata::base32hex_encode(base)).unwrap();
        rrset(
            &owner,
            DNSResourceType::NSEC3,
            vec![RData::NSEC3(Nsec3 {
                hash_algorithm: 1,
                flags,
                iterations: 0,
                salt: Vec::new(),
                next_hashed_owner: next.to_vec(),
                type_bitmap: encode_type_bitmap(types),
            })],
        )
    }

    /// NSEC3 interval spanning every hash except its two ends
    pub fn nsec3_covering_all(&self, opt_out: bool) -> RRset {
        self.nsec3(&[0x00; 20], &[0xff; 20], opt_out as u8, &[])
    }

    /// NSEC3 whose hashed owner is `owner` itself
    pub fn nsec3_matching(&self, owner: &Name, types: &[DNSResourceType]) -> RRset {
        self.nsec3(&hash_of(owner), &[0xff; 20], 0, types)
    }

    /// Put signed `records` in the authority section of the `qname`/`qtype` answer
    pub fn deny(&self, qname: &Name, qtype: DNSResourceType, records: &[RRset], upstream: &mut MockUpstream) {
        for set in records {
            let sig = self.sign_with_zsk(set);
            upstream.authority(qname, qtype, signed(set, &[sig]));
        }
    }
}

fn dnskey(flags: u16, pair: &Ed25519KeyPair) -> Dnskey {
    Dnskey {
        flags,
        protocol: 3,
        algorithm: 15,
        public_key: pair.public_key().as_ref().to_vec(),
    }
}

/// NSEC3 hash with no salt and no extra iterations
pub fn hash_of(owner: &Name) -> Vec<u8> {
    nsec3_hash(owner, &[], 0)
}

pub fn rrset(owner: &Name, rtype: DNSResourceType, records: Vec<RData>) -> RRset {
    let mut set = RRset::new(owner.clone(), rtype, TTL);
    for record in records {
        set.insert(record);
    }
    set
}

pub fn a_rrset(owner: &str, addr: &str) -> RRset {
    rrset(
        &name(owner),
        DNSResourceType::A,
        vec![RData::A(addr.parse().unwrap())],
    )
}

pub fn sign(zone: &Name, pair: &Ed25519KeyPair, flags: u16, set: &RRset) -> Rrsig {
    let labels = set.name.label_count() - usize::from(set.name.first_label() == Some(&b"*"[..]));
    let mut sig = Rrsig {
        type_covered: set.rtype,
        algorithm: 15,
        labels: labels as u8,
        original_ttl: set.ttl,
        expiration: NOW + 86_400,
        inception: NOW - 3_600,
        key_tag: dnskey(flags, pair).key_tag(),
        signer_name: zone.clone(),
        signature: Vec::new(),
    };
    let message = chainwalk::dnssec::signed_message(&sig, set).unwrap();
    sig.signature = pair.sign(&message).as_ref().to_vec();
    sig
}

/// Resource records of `set` followed by `sigs`
pub fn signed(set: &RRset, sigs: &[Rrsig]) -> Vec<DNSResource> {
    let mut records: Vec<DNSResource> = set
        .iter()
        .map(|rdata| DNSResource::new(set.name.clone(), set.ttl, rdata.clone()))
        .collect();
    records.extend(
        sigs.iter()
            .map(|sig| DNSResource::new(set.name.clone(), set.ttl, RData::RRSIG(sig.clone()))),
    );
    records
}

#[derive(Debug, Default, Clone)]
struct Canned {
    answers: Vec<DNSResource>,
    authorities: Vec<DNSResource>,
}

/// Answers from canned per-(name, type) records, encoded as real response messages.
/// Anything not configured gets an empty NOERROR response.
#[derive(Debug, Default)]
pub struct MockUpstream {
    responses: HashMap<(Name, DNSResourceType), Canned>,
    failing: HashSet<(Name, DNSResourceType)>,
    pub queries: Vec<(Name, DNSResourceType)>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&mut self, qname: &Name, qtype: DNSResourceType, records: Vec<DNSResource>) {
        self.responses
            .entry((qname.clone(), qtype))
            .or_default()
            .answers
            .extend(records);
    }

    pub fn authority(&mut self, qname: &Name, qtype: DNSResourceType, records: Vec<DNSResource>) {
        self.responses
            .entry((qname.clone(), qtype))
            .or_default()
            .authorities
            .extend(records);
    }

    /// Replace whatever `qname`/`qtype` answers with `records`
    pub fn replace(&mut self, qname: &Name, qtype: DNSResourceType, records: Vec<DNSResource>) {
        self.responses.remove(&(qname.clone(), qtype));
        self.answer(qname, qtype, records);
    }

    /// Make `qname`/`qtype` fail as if the connection dropped
    pub fn fail(&mut self, qname: &Name, qtype: DNSResourceType) {
        self.failing.insert((qname.clone(), qtype));
    }

    pub fn was_queried(&self, qname: &Name, qtype: DNSResourceType) -> bool {
        self.queries.iter().any(|(n, t)| n == qname && *t == qtype)
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn query(&mut self, qname: &Name, qtype: DNSResourceType) -> Result<Vec<u8>> {
        self.queries.push((qname.clone(), qtype));
        if self.failing.contains(&(qname.clone(), qtype)) {
            return Err(ValidatorError::Transport(format!(
                "connection closed while querying {} {}",
                qname, qtype
            )));
        }

        let mut packet = DNSPacket::query(
            0,
            qname,
            qtype,
            QueryFlags {
                recursion_desired: true,
                checking_disabled: true,
                authenticated_data: false,
            },
            EdnsOptions::default(),
        );
        packet.header.qr = true;
        packet.header.ra = true;
        if let Some(canned) = self.responses.get(&(qname.clone(), qtype)) {
            packet.answers = canned.answers.clone();
            packet.authorities = canned.authorities.clone();
        }
        Ok(packet.serialize()?)
    }
}

/// Root -> example, both signed, with a signed www.example A record
pub struct SecureExample {
    pub root: TestZone,
    pub example: TestZone,
    pub upstream: MockUpstream,
}

impl SecureExample {
    pub fn new() -> Self {
        let root = TestZone::new("", 1);
        let example = TestZone::new("example", 2);
        let mut upstream = MockUpstream::new();

        root.publish_keys(&mut upstream);
        root.delegate(&example, &mut upstream);
        example.publish_keys(&mut upstream);
        example.publish(&a_rrset("www.example", "192.0.2.1"), &mut upstream);

        Self {
            root,
            example,
            upstream,
        }
    }

    pub fn validator(self) -> ChainValidator<MockUpstream> {
        let anchor = self.root.anchor();
        ChainValidator::new(self.upstream, anchor).with_time(NOW)
    }
}
