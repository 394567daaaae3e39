use ring::digest;
use tracing::{debug, trace};

use super::MAX_NSEC3_ITERATIONS;
use crate::dns::{
    enums::DNSResourceType,
    name::Name,
    rdata::{Nsec3, base32hex_decode},
};

/// The only NSEC3 hash algorithm defined (RFC 5155 11)
pub const NSEC3_HASH_SHA1: u8 = 1;

/// What a set of NSEC3 records says about one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nsec3Proof {
    /// A record's hashed owner equals the name's hash.
    ProvenExistence {
        /// The queried type is in that record's bitmap
        type_present: bool,
        /// NS without SOA: the name is an unsigned or signed zone cut
        delegation: bool,
    },
    /// The hash falls strictly inside some record's interval.
    ProvenDenial { opt_out: bool },
    /// Nothing matched or covered the hash.
    Ambiguous,
}

/// Iterated hash of RFC 5155 5: IH(salt, x, 0) = H(x || salt), then `iterations` more rounds.
pub fn nsec3_hash(name: &Name, salt: &[u8], iterations: u16) -> Vec<u8> {
    let mut input = name.to_wire();
    input.extend_from_slice(salt);
    let mut hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &input);

    for _ in 0..iterations {
        let mut ctx = digest::Context::new(&digest::SHA1_FOR_LEGACY_USE_ONLY);
        ctx.update(hash.as_ref());
        ctx.update(salt);
        hash = ctx.finish();
    }
    hash.as_ref().to_vec()
}

/// An NSEC3 record usable for proofs about names in `zone`.
struct Candidate<'a> {
    base: Vec<u8>,
    record: &'a Nsec3,
}

fn candidates<'a>(records: &'a [(Name, Nsec3)], zone: &Name) -> Vec<Candidate<'a>> {
    records
        .iter()
        .filter_map(|(owner, record)| {
            if owner.parent().as_ref() != Some(zone)
                || record.hash_algorithm != NSEC3_HASH_SHA1
                || record.iterations > MAX_NSEC3_ITERATIONS
            {
                trace!("Skipping NSEC3 at {} for zone {}", owner, zone);
                return None;
            }
            let base = base32hex_decode(std::str::from_utf8(owner.first_label()?).ok()?)?;
            if base.len() != record.next_hashed_owner.len() {
                return None;
            }
            Some(Candidate { base, record })
        })
        .collect()
}

/// Does `hash` fall strictly between `base` and `next` on the circular hash ring?
pub fn covers(base: &[u8], next: &[u8], hash: &[u8]) -> bool {
    if base < next {
        base < hash && hash < next
    } else if next < base {
        // the last record wraps around past the largest hash
        hash > base || hash < next
    } else {
        // a lone record spans the whole ring except itself
        hash != base
    }
}

/// Classify what `records` prove about `qname` / `qtype` within `zone`.
pub fn classify(
    records: &[(Name, Nsec3)],
    qname: &Name,
    qtype: DNSResourceType,
    zone: &Name,
) -> Nsec3Proof {
    if !qname.is_subdomain_of(zone) {
        return Nsec3Proof::Ambiguous;
    }
    let candidates = candidates(records, zone);
    let mut hashes: Vec<((Vec<u8>, u16), Vec<u8>)> = Vec::new();

    let mut denial = None;
    for candidate in &candidates {
        let params = (candidate.record.salt.clone(), candidate.record.iterations);
        let hash = match hashes.iter().find(|(p, _)| *p == params) {
            Some((_, h)) => h.clone(),
            None => {
                let h = nsec3_hash(qname, &params.0, params.1);
                hashes.push((params, h.clone()));
                h
            }
        };

        if hash == candidate.base {
            let record = candidate.record;
            let proof = Nsec3Proof::ProvenExistence {
                type_present: record.has_type(qtype),
                delegation: record.has_type(DNSResourceType::NS)
                    && !record.has_type(DNSResourceType::SOA),
            };
            debug!("NSEC3 matches {}: {:?}", qname, proof);
            return proof;
        }
        if denial.is_none() && covers(&candidate.base, &candidate.record.next_hashed_owner, &hash)
        {
            denial = Some(Nsec3Proof::ProvenDenial {
                opt_out: candidate.record.opt_out(),
            });
        }
    }

    let proof = denial.unwrap_or(Nsec3Proof::Ambiguous);
    debug!(
        "NSEC3 over {} candidate(s) for {} in {}: {:?}",
        candidates.len(),
        qname,
        zone,
        proof
    );
    proof
}
