use tracing::trace;

use super::{DnsSecAlgorithm, records::RRset};
use crate::dns::{
    enums::DNSResourceClass,
    name::Name,
    rdata::{DNSKEY_PROTOCOL, Dnskey, Rrsig},
};

/// RFC 4034 3.1.8.1 signed data: RRSIG RDATA minus the signature, then the
/// covered records in canonical order with the original TTL.
///
/// `None` when the RRSIG claims more labels than the owner has.
pub fn signed_message(rrsig: &Rrsig, rrset: &RRset) -> Option<Vec<u8>> {
    let owner = signing_owner(&rrset.name, rrsig.labels)?;
    let owner_wire = owner.to_wire();
    let class: u16 = DNSResourceClass::IN.into();

    let mut msg = Vec::with_capacity(256);
    rrsig.write_unsigned(&mut msg);
    for (rdata, _) in rrset.canonical() {
        msg.extend_from_slice(&owner_wire);
        msg.extend_from_slice(&rrset.rtype.to_u16().to_be_bytes());
        msg.extend_from_slice(&class.to_be_bytes());
        msg.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        msg.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        msg.extend_from_slice(rdata);
    }
    Some(msg)
}

/// Wildcard expansions are signed as `*.<closest encloser>` (RFC 4035 5.3.2).
fn signing_owner(owner: &Name, labels: u8) -> Option<Name> {
    let labels = labels as usize;
    let count = owner.label_count();
    if labels > count {
        return None;
    }
    if labels == count {
        return Some(owner.clone());
    }
    owner.suffix(labels).prepend("*").ok()
}

/// Check one signature with one key. Never fails, only answers.
pub fn verify(message: &[u8], signature: &[u8], key: &Dnskey) -> bool {
    match DnsSecAlgorithm::from_u8(key.algorithm) {
        Some(alg) => alg.verify(&key.public_key, message, signature),
        None => false,
    }
}

/// RFC 4034 3.1.5 serial-number comparison for inception <= now <= expiration
fn within_validity(rrsig: &Rrsig, now: u32) -> bool {
    (now.wrapping_sub(rrsig.inception) as i32) >= 0
        && (rrsig.expiration.wrapping_sub(now) as i32) >= 0
}

/// Verify `rrsig` over `rrset` against the keys of `zone`.
///
/// Besides the cryptography this requires the signer to be `zone`, the covered
/// type to match, the RRset to sit inside `zone`, a DNSSEC zone key with the
/// right tag and algorithm, and `now` inside the validity window.
pub fn verify_rrsig<'a, K>(zone: &Name, rrset: &RRset, rrsig: &Rrsig, keys: K, now: u32) -> bool
where
    K: IntoIterator<Item = &'a Dnskey>,
{
    if rrsig.signer_name != *zone
        || rrsig.type_covered != rrset.rtype
        || !rrset.name.is_subdomain_of(zone)
        || rrset.is_empty()
    {
        return false;
    }
    if !within_validity(rrsig, now) {
        trace!(
            "RRSIG for {} {} outside validity window ({}..{}, now {})",
            rrset.name, rrset.rtype, rrsig.inception, rrsig.expiration, now
        );
        return false;
    }
    let Some(message) = signed_message(rrsig, rrset) else {
        return false;
    };

    keys.into_iter()
        .filter(|key| {
            key.algorithm == rrsig.algorithm
                && key.protocol == DNSKEY_PROTOCOL
                && key.is_zone_key()
                && key.key_tag() == rrsig.key_tag
        })
        .any(|key| verify(&message, &rrsig.signature, key))
}

/// True when at least one of `sigs` verifies.
pub fn any_rrsig_verifies(
    zone: &Name,
    rrset: &RRset,
    sigs: &[Rrsig],
    keys: &[Dnskey],
    now: u32,
) -> bool {
    sigs.iter()
        .any(|sig| verify_rrsig(zone, rrset, sig, keys.iter(), now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::DNSResourceType;
    use crate::dns::rdata::RData;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    fn zone() -> Name {
        Name::from_ascii("example").unwrap()
    }

    fn key_pair() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed_unchecked(&[42u8; 32]).unwrap()
    }

    fn dnskey(pair: &Ed25519KeyPair) -> Dnskey {
        Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 15,
            public_key: pair.public_key().as_ref().to_vec(),
        }
    }

    fn a_rrset(owner: &str) -> RRset {
        let mut set = RRset::new(Name::from_ascii(owner).unwrap(), DNSResourceType::A, 300);
        set.insert(RData::A("192.0.2.1".parse().unwrap()));
        set.insert(RData::A("192.0.2.2".parse().unwrap()));
        set
    }

    fn sign(pair: &Ed25519KeyPair, set: &RRset, labels: u8) -> Rrsig {
        let mut sig = Rrsig {
            type_covered: set.rtype,
            algorithm: 15,
            labels,
            original_ttl: 300,
            expiration: 2_000,
            inception: 1_000,
            key_tag: dnskey(pair).key_tag(),
            signer_name: zone(),
            signature: Vec::new(),
        };
        let msg = signed_message(&sig, set).unwrap();
        sig.signature = pair.sign(&msg).as_ref().to_vec();
        sig
    }

    #[test]
    fn test_verify_rrsig_happy_path_and_window() {
        let pair = key_pair();
        let key = dnskey(&pair);
        let set = a_rrset("www.example");
        let sig = sign(&pair, &set, 2);

        assert!(verify_rrsig(&zone(), &set, &sig, [&key], 1_500));
        assert!(verify_rrsig(&zone(), &set, &sig, [&key], 1_000));
        assert!(!verify_rrsig(&zone(), &set, &sig, [&key], 999));
        assert!(!verify_rrsig(&zone(), &set, &sig, [&key], 2_001));
    }

    #[test]
    fn test_signer_and_key_flags_are_checked() {
        let pair = key_pair();
        let key = dnskey(&pair);
        let set = a_rrset("www.example");
        let sig = sign(&pair, &set, 2);

        let other_zone = Name::from_ascii("other").unwrap();
        assert!(!verify_rrsig(&other_zone, &set, &sig, [&key], 1_500));

        let not_zone_key = Dnskey {
            flags: 1,
            ..key.clone()
        };
        assert!(!verify_rrsig(&zone(), &set, &sig, [&not_zone_key], 1_500));

        let mut aaaa = set.clone();
        aaaa.rtype = DNSResourceType::AAAA;
        assert!(!verify_rrsig(&zone(), &aaaa, &sig, [&key], 1_500));
    }

    #[test]
    fn test_wildcard_owner_is_rebuilt() {
        let pair = key_pair();
        let key = dnskey(&pair);
        let wildcard = a_rrset("*.example");
        let sig = sign(&pair, &wildcard, 1);

        // the same data synthesised at a concrete name
        let mut expanded = wildcard.clone();
        expanded.name = Name::from_ascii("anything.example").unwrap();
        assert!(verify_rrsig(&zone(), &expanded, &sig, [&key], 1_500));

        let too_many_labels = Rrsig { labels: 5, ..sig };
        assert!(signed_message(&too_many_labels, &expanded).is_none());
    }

    #[test]
    fn test_record_order_does_not_matter() {
        let pair = key_pair();
        let set = a_rrset("www.example");
        let sig = sign(&pair, &set, 2);

        let mut reversed = RRset::new(set.name.clone(), DNSResourceType::A, 60);
        reversed.insert(RData::A("192.0.2.2".parse().unwrap()));
        reversed.insert(RData::A("192.0.2.1".parse().unwrap()));
        assert_eq!(signed_message(&sig, &set), signed_message(&sig, &reversed));
    }
}
