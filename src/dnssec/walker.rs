use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, trace, warn};

use super::digest::{ds_is_supported, ds_matches_key};
use super::verifier::{any_rrsig_verifies, verify_rrsig};
use super::{BogusReason, Nsec3Proof, RRset, RecordStore, TrustAnchor, Validation, classify};
use crate::dns::{
    DNSPacket,
    enums::DNSResourceType,
    name::Name,
    rdata::{Dnskey, Ds},
};
use crate::error::{Result, ValidatorError};
use crate::transport::Upstream;

/// Keys trusted for one zone, fixed once the level is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneKeys {
    pub zone: Name,
    pub keys: Vec<Dnskey>,
}

/// What the DS query at one step of the walk decided.
enum Step {
    /// A signed DS RRset: the name is a secure zone cut.
    Delegation(RRset),
    /// Not a zone cut; stay in the current zone.
    SameZone,
    /// Done without looking at the target.
    Verdict(Validation),
    /// Below here nothing is signed.
    ContinueInsecure,
}

/// Walks the chain of trust from a DS trust anchor down to one RRset.
///
/// Each call to [`ChainValidator::validate`] is a complete, independent walk:
/// nothing learned in one walk is reused by the next.
pub struct ChainValidator<U> {
    upstream: U,
    anchor: TrustAnchor,
    now: Option<u32>,
}

impl<U: Upstream> ChainValidator<U> {
    pub fn new(upstream: U, anchor: TrustAnchor) -> Self {
        Self {
            upstream,
            anchor,
            now: None,
        }
    }

    /// Check signature validity windows against a fixed time instead of the clock.
    pub fn with_time(mut self, now: u32) -> Self {
        self.now = Some(now);
        self
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    fn now(&self) -> u32 {
        self.now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }

    /// Validate `target`/`rtype`, returning the end state and, when Secure, the RRset.
    ///
    /// Transport and decoding failures are errors; every DNSSEC failure is a
    /// Bogus verdict.
    pub async fn validate(&mut self, target: &Name, rtype: DNSResourceType) -> Result<Validation> {
        let now = self.now();
        info!("Validating {} {} from anchor {}", target, rtype, self.anchor);

        let mut zone = self.anchor.zone.clone();
        let mut ds_set: Vec<Ds> = vec![self.anchor.ds.clone()];
        let mut position = zone.clone();
        let mut keys: Option<ZoneKeys> = None;

        if !target.is_subdomain_of(&zone) {
            warn!("{} is not under the trust anchor {}", target, zone);
            return Ok(Validation::insecure());
        }

        for _ in 0..=target.label_count() {
            let current = match keys.take() {
                Some(current) => current,
                None => {
                    if !ds_set.iter().any(ds_is_supported) {
                        info!("No supported DS algorithm for {}, treating as insecure", zone);
                        return Ok(Validation::insecure());
                    }
                    match self.zone_keys(&zone, &ds_set, now).await? {
                        Some(current) => current,
                        None => {
                            warn!("No DNSKEY at {} matched a trusted DS", zone);
                            return Ok(Validation::bogus(BogusReason::NoTrustedKeys { zone }));
                        }
                    }
                }
            };

            let Some(next) = position.child_toward(target) else {
                return self.validate_target(&current, target, rtype, now).await;
            };

            match self.step(&current, &next, now).await? {
                Step::Delegation(ds_rrset) => {
                    if next == *target && rtype == DNSResourceType::DS {
                        debug!("Target DS RRset validated during the walk");
                        return Ok(Validation::secure(Some(ds_rrset)));
                    }
                    debug!("Secure delegation {} -> {}", current.zone, next);
                    ds_set = ds_rrset.ds_records().cloned().collect();
                    zone = next.clone();
                    position = next;
                }
                Step::SameZone => {
                    trace!("{} is inside zone {}", next, current.zone);
                    position = next;
                    keys = Some(current);
                }
                Step::Verdict(verdict) => return Ok(verdict),
                Step::ContinueInsecure => return self.continue_insecure(target, rtype).await,
            }
        }

        error!(
            "Label walk for {} {} ran past the target at {}",
            target, rtype, position
        );
        Err(ValidatorError::LabelWalkExhausted {
            target: target.clone(),
        })
    }

    async fn fetch(&mut self, name: &Name, rtype: DNSResourceType) -> Result<RecordStore> {
        let bytes = self.upstream.query(name, rtype).await?;
        let packet = DNSPacket::parse(&bytes)?;
        trace!(
            "{} {}: {} answer(s), {} authority record(s)",
            name,
            rtype,
            packet.answers.len(),
            packet.authorities.len()
        );
        Ok(RecordStore::from_packet(&packet))
    }

    /// Authenticate the DNSKEY RRset of `zone` from its parent's DS records.
    async fn zone_keys(&mut self, zone: &Name, ds_set: &[Ds], now: u32) -> Result<Option<ZoneKeys>> {
        let store = self.fetch(zone, DNSResourceType::DNSKEY).await?;
        let Some(key_set) = store.rrset(zone, DNSResourceType::DNSKEY) else {
            debug!("No DNSKEY RRset returned for {}", zone);
            return Ok(None);
        };

        let candidates: Vec<Dnskey> = key_set.dnskeys().cloned().collect();
        let anchored: Vec<Dnskey> = candidates
            .iter()
            .filter(|key| ds_set.iter().any(|ds| ds_matches_key(zone, ds, key)))
            .cloned()
            .collect();
        debug!(
            "{}: {} of {} DNSKEY(s) match a DS",
            zone,
            anchored.len(),
            candidates.len()
        );
        if anchored.is_empty() {
            return Ok(None);
        }
        if anchored.len() == candidates.len() {
            return Ok(Some(ZoneKeys {
                zone: zone.clone(),
                keys: anchored,
            }));
        }

        // A DS-anchored key vouches for the rest through its signature over the whole set
        let vouched = store
            .signatures(zone, DNSResourceType::DNSKEY)
            .iter()
            .any(|sig| verify_rrsig(zone, key_set, sig, &anchored, now));
        let keys = if vouched {
            candidates
        } else {
            debug!("No anchored key signs the DNSKEY RRset of {}", zone);
            anchored
        };
        Ok(Some(ZoneKeys {
            zone: zone.clone(),
            keys,
        }))
    }

    /// Query DS at `next` and decide whether it starts a new zone.
    async fn step(&mut self, current: &ZoneKeys, next: &Name, now: u32) -> Result<Step> {
        let store = self.fetch(next, DNSResourceType::DS).await?;

        if let Some(ds_rrset) = store.rrset(next, DNSResourceType::DS) {
            let sigs = store.signatures(next, DNSResourceType::DS);
            if any_rrsig_verifies(&current.zone, ds_rrset, sigs, &current.keys, now) {
                return Ok(Step::Delegation(ds_rrset.clone()));
            }
            warn!("DS RRset at {} failed verification ({} RRSIG(s))", next, sigs.len());
            return Ok(Step::Verdict(Validation::bogus(
                BogusReason::DsSignatureInvalid { name: next.clone() },
            )));
        }

        if store.nsec3_rrsets().next().is_none() {
            trace!("No DS and no NSEC3 at {}", next);
            return Ok(Step::SameZone);
        }

        let proof = self.validated_proof(&store, current, next, DNSResourceType::DS, now);
        let step = match proof {
            Nsec3Proof::ProvenDenial { opt_out: true } => {
                info!("Opt-out NSEC3 covers {}, insecure", next);
                Step::Verdict(Validation::insecure())
            }
            Nsec3Proof::ProvenDenial { opt_out: false }
            | Nsec3Proof::ProvenExistence {
                type_present: false,
                delegation: true,
            } => {
                info!("Proven unsigned at {}", next);
                Step::ContinueInsecure
            }
            Nsec3Proof::ProvenExistence {
                type_present: false,
                delegation: false,
            } => Step::SameZone,
            Nsec3Proof::ProvenExistence {
                type_present: true, ..
            } => {
                warn!("NSEC3 says {} has a DS, but none was returned", next);
                Step::Verdict(Validation::bogus(BogusReason::DsProvenButUnverified {
                    name: next.clone(),
                }))
            }
            Nsec3Proof::Ambiguous => {
                warn!("NSEC3 returned for {} proves nothing", next);
                Step::Verdict(Validation::bogus(BogusReason::AmbiguousDenial {
                    name: next.clone(),
                }))
            }
        };
        Ok(step)
    }

    /// Classify using only the NSEC3 RRsets signed by the current zone.
    fn validated_proof(
        &self,
        store: &RecordStore,
        current: &ZoneKeys,
        name: &Name,
        rtype: DNSResourceType,
        now: u32,
    ) -> Nsec3Proof {
        let records = store.nsec3_records(|set| {
            let sigs = store.signatures(&set.name, DNSResourceType::NSEC3);
            let ok = any_rrsig_verifies(&current.zone, set, sigs, &current.keys, now);
            if !ok {
                debug!("Ignoring unsigned or badly signed NSEC3 at {}", set.name);
            }
            ok
        });
        classify(&records, name, rtype, &current.zone)
    }

    async fn continue_insecure(&mut self, target: &Name, rtype: DNSResourceType) -> Result<Validation> {
        let store = self.fetch(target, rtype).await?;
        if store.signatures(target, rtype).is_empty() {
            Ok(Validation::insecure())
        } else {
            warn!("{} {} carries RRSIGs below an unsigned delegation", target, rtype);
            Ok(Validation::bogus(
                BogusReason::SignedUnderInsecureDelegation {
                    name: target.clone(),
                },
            ))
        }
    }

    async fn validate_target(
        &mut self,
        current: &ZoneKeys,
        target: &Name,
        rtype: DNSResourceType,
        now: u32,
    ) -> Result<Validation> {
        let store = self.fetch(target, rtype).await?;

        if let Some(rrset) = store.rrset(target, rtype) {
            let sigs = store.signatures(target, rtype);
            if any_rrsig_verifies(&current.zone, rrset, sigs, &current.keys, now) {
                info!("{} {} is secure ({} record(s))", target, rtype, rrset.len());
                return Ok(Validation::secure(Some(rrset.clone())));
            }
            warn!("No valid RRSIG over {} {} from {}", target, rtype, current.zone);
            return Ok(Validation::bogus(BogusReason::TargetSignatureInvalid {
                name: target.clone(),
            }));
        }

        let verdict = match self.validated_proof(&store, current, target, rtype, now) {
            Nsec3Proof::ProvenDenial { opt_out: false }
            | Nsec3Proof::ProvenExistence {
                type_present: false, ..
            } => {
                info!("Absence of {} {} is proven", target, rtype);
                Validation::secure(None)
            }
            Nsec3Proof::ProvenDenial { opt_out: true } if rtype == DNSResourceType::DS => {
                Validation::insecure()
            }
            Nsec3Proof::ProvenDenial { opt_out: true } => {
                Validation::bogus(BogusReason::OptOutNotApplicable {
                    name: target.clone(),
                })
            }
            proof => {
                warn!("Absence of {} {} not proven: {:?}", target, rtype, proof);
                Validation::bogus(BogusReason::UnprovenNonExistence {
                    name: target.clone(),
                })
            }
        };
        Ok(verdict)
    }
}
