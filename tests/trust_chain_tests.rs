mod common;

use chainwalk::dns::enums::DNSResourceType;
use chainwalk::dns::rdata::RData;
use chainwalk::dnssec::{BogusReason, TrustAnchor, ValidationState};
use chainwalk::error::ValidatorError;
use chainwalk::ChainValidator;
use common::*;

#[tokio::test]
async fn test_signed_answer_is_secure() {
    let mut validator = SecureExample::new().validator();
    let target = name("www.example");

    let result = validator.validate(&target, DNSResourceType::A).await.unwrap();

    assert_eq!(result.state, ValidationState::Secure);
    assert!(result.reason.is_none());
    let rrset = result.rrset.expect("secure answer carries the rrset");
    assert_eq!(rrset.presentation(), vec!["www.example. 3600 IN A 192.0.2.1"]);

    assert_eq!(
        validator.upstream().queries,
        vec![
            (name(""), DNSResourceType::DNSKEY),
            (name("example"), DNSResourceType::DS),
            (name("example"), DNSResourceType::DNSKEY),
            (name("www.example"), DNSResourceType::DS),
            (name("www.example"), DNSResourceType::A),
        ]
    );
}

#[tokio::test]
async fn test_repeated_walks_agree() {
    let mut validator = SecureExample::new().validator();
    let target = name("www.example");

    let first = validator.validate(&target, DNSResourceType::A).await.unwrap();
    let second = validator.validate(&target, DNSResourceType::A).await.unwrap();

    assert_eq!(first, second);
    // nothing carries over: the second walk repeats every query
    assert_eq!(validator.upstream().queries.len(), 10);
}

#[tokio::test]
async fn test_opt_out_delegation_is_insecure() {
    let root = TestZone::new("", 1);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    root.deny(
        &name("insecure"),
        DNSResourceType::DS,
        &[root.nsec3_covering_all(true)],
        &mut upstream,
    );

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("www.insecure"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Insecure);
    assert!(result.rrset.is_none());
    assert!(
        !validator
            .upstream()
            .was_queried(&name("www.insecure"), DNSResourceType::A)
    );
}

#[tokio::test]
async fn test_tampered_answer_signature_is_bogus() {
    let mut fx = SecureExample::new();
    let set = a_rrset("www.example", "192.0.2.1");
    let mut sig = fx.example.sign_with_zsk(&set);
    sig.signature[10] ^= 0x01;
    fx.upstream
        .replace(&set.name, DNSResourceType::A, signed(&set, &[sig]));

    let result = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Bogus);
    assert!(result.rrset.is_none());
    assert_eq!(
        result.reason,
        Some(BogusReason::TargetSignatureInvalid {
            name: name("www.example")
        })
    );
}

#[tokio::test]
async fn test_answer_modified_after_signing_is_bogus() {
    let mut fx = SecureExample::new();
    let original = a_rrset("www.example", "192.0.2.1");
    let sig = fx.example.sign_with_zsk(&original);
    let forged = a_rrset("www.example", "192.0.2.66");
    fx.upstream
        .replace(&forged.name, DNSResourceType::A, signed(&forged, &[sig]));

    let result = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(result.state, ValidationState::Bogus);
}

#[tokio::test]
async fn test_ds_signed_by_wrong_zone_is_bogus() {
    let mut fx = SecureExample::new();
    let ds = rrset(
        &fx.example.name,
        DNSResourceType::DS,
        vec![RData::DS(fx.example.ds())],
    );
    // the child cannot vouch for its own DS
    let sig = fx.example.sign_with_zsk(&ds);
    fx.upstream
        .replace(&ds.name, DNSResourceType::DS, signed(&ds, &[sig]));

    let result = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(
        result.reason,
        Some(BogusReason::DsSignatureInvalid {
            name: name("example")
        })
    );
}

#[tokio::test]
async fn test_key_tag_collision_does_not_authenticate() {
    let fx = SecureExample::new();
    let mut anchor = fx.root.anchor();
    // same tag, algorithm and digest type; different digest
    anchor.ds.digest[0] ^= 0xff;

    let mut validator = ChainValidator::new(fx.upstream, anchor).with_time(NOW);
    let result = validator
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Bogus);
    assert_eq!(
        result.reason,
        Some(BogusReason::NoTrustedKeys { zone: name("") })
    );
}

#[tokio::test]
async fn test_unsupported_anchor_digest_is_insecure() {
    let fx = SecureExample::new();
    let mut anchor: TrustAnchor = fx.root.anchor();
    anchor.ds.digest_type = 3;

    let mut validator = ChainValidator::new(fx.upstream, anchor).with_time(NOW);
    let result = validator
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Insecure);
    assert!(validator.upstream().queries.is_empty());
}

#[tokio::test]
async fn test_proven_unsigned_delegation_is_insecure() {
    let root = TestZone::new("", 1);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    root.deny(
        &name("unsigned"),
        DNSResourceType::DS,
        &[root.nsec3_covering_all(false)],
        &mut upstream,
    );
    let plain = a_rrset("www.unsigned", "192.0.2.7");
    upstream.answer(&plain.name, DNSResourceType::A, signed(&plain, &[]));

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("www.unsigned"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Insecure);
    assert!(
        validator
            .upstream()
            .was_queried(&name("www.unsigned"), DNSResourceType::A)
    );
}

#[tokio::test]
async fn test_signatures_below_unsigned_delegation_are_bogus() {
    let root = TestZone::new("", 1);
    let rogue = TestZone::new("unsigned", 9);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    root.deny(
        &name("unsigned"),
        DNSResourceType::DS,
        &[root.nsec3_covering_all(false)],
        &mut upstream,
    );
    rogue.publish(&a_rrset("www.unsigned", "192.0.2.7"), &mut upstream);

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("www.unsigned"), DNSResourceType::A)
        .await
        .unwrap();

    assert_eq!(
        result.reason,
        Some(BogusReason::SignedUnderInsecureDelegation {
            name: name("www.unsigned")
        })
    );
}

#[tokio::test]
async fn test_nsec3_delegation_without_ds_is_insecure() {
    let root = TestZone::new("", 1);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    let cut = name("unsigned");
    root.deny(
        &cut,
        DNSResourceType::DS,
        &[root.nsec3_matching(&cut, &[DNSResourceType::NS])],
        &mut upstream,
    );

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("host.unsigned"), DNSResourceType::AAAA)
        .await
        .unwrap();
    assert_eq!(result.state, ValidationState::Insecure);
}

#[tokio::test]
async fn test_nsec3_claiming_a_ds_is_bogus() {
    let root = TestZone::new("", 1);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    let cut = name("hidden");
    root.deny(
        &cut,
        DNSResourceType::DS,
        &[root.nsec3_matching(&cut, &[DNSResourceType::NS, DNSResourceType::DS])],
        &mut upstream,
    );

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("www.hidden"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(
        result.reason,
        Some(BogusReason::DsProvenButUnverified {
            name: name("hidden")
        })
    );
}

#[tokio::test]
async fn test_unsigned_nsec3_proves_nothing() {
    let root = TestZone::new("", 1);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    let denial = root.nsec3_covering_all(true);
    upstream.authority(&name("forged"), DNSResourceType::DS, signed(&denial, &[]));

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let result = validator
        .validate(&name("www.forged"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(
        result.reason,
        Some(BogusReason::AmbiguousDenial {
            name: name("forged")
        })
    );
}

#[tokio::test]
async fn test_nsec3_proof_of_no_cut_keeps_the_zone() {
    let mut fx = SecureExample::new();
    let www = name("www.example");
    fx.example.deny(
        &www,
        DNSResourceType::DS,
        &[fx
            .example
            .nsec3_matching(&www, &[DNSResourceType::A, DNSResourceType::RRSIG])],
        &mut fx.upstream,
    );

    let result = fx
        .validator()
        .validate(&www, DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(result.state, ValidationState::Secure);
}

#[tokio::test]
async fn test_zsk_needs_the_ksk_signature() {
    let mut fx = SecureExample::new();
    let keys = fx.example.dnskey_rrset();
    let mut sig = fx.example.sign_with_ksk(&keys);
    sig.signature[0] ^= 0x80;
    fx.upstream
        .replace(&keys.name, DNSResourceType::DNSKEY, signed(&keys, &[sig]));

    let result = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();

    // only the KSK is trusted, and the answer is signed by the ZSK
    assert_eq!(
        result.reason,
        Some(BogusReason::TargetSignatureInvalid {
            name: name("www.example")
        })
    );
}

#[tokio::test]
async fn test_expired_signatures_do_not_extend_trust() {
    let fx = SecureExample::new();
    let anchor = fx.root.anchor();
    let mut validator = ChainValidator::new(fx.upstream, anchor).with_time(NOW + 30 * 86_400);

    let result = validator
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(
        result.reason,
        Some(BogusReason::DsSignatureInvalid {
            name: name("example")
        })
    );
}

#[tokio::test]
async fn test_ds_target_is_returned_from_the_walk() {
    let fx = SecureExample::new();
    let expected = fx.example.ds();
    let mut validator = fx.validator();

    let result = validator
        .validate(&name("example"), DNSResourceType::DS)
        .await
        .unwrap();

    assert_eq!(result.state, ValidationState::Secure);
    let rrset = result.rrset.unwrap();
    assert_eq!(rrset.ds_records().collect::<Vec<_>>(), vec![&expected]);
    assert!(
        !validator
            .upstream()
            .was_queried(&name("example"), DNSResourceType::DNSKEY)
    );
}

#[tokio::test]
async fn test_missing_dnskey_is_bogus() {
    let root = TestZone::new("", 1);
    let mut validator = ChainValidator::new(MockUpstream::new(), root.anchor()).with_time(NOW);

    let result = validator
        .validate(&name("example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(
        result.reason,
        Some(BogusReason::NoTrustedKeys { zone: name("") })
    );
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    let mut fx = SecureExample::new();
    fx.upstream.fail(&name("example"), DNSResourceType::DNSKEY);

    let err = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidatorError::Transport(_)));
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_single_key_zone_is_secure() {
    let root = TestZone::new("", 1);
    let example = TestZone::new("example", 2);
    let mut upstream = MockUpstream::new();
    root.publish_keys(&mut upstream);
    root.delegate(&example, &mut upstream);

    let keys = rrset(
        &example.name,
        DNSResourceType::DNSKEY,
        vec![RData::DNSKEY(example.ksk_dnskey())],
    );
    let sig = example.sign_with_ksk(&keys);
    upstream.answer(&example.name, DNSResourceType::DNSKEY, signed(&keys, &[sig]));
    let www = a_rrset("www.example", "192.0.2.1");
    let sig = example.sign_with_ksk(&www);
    upstream.answer(&www.name, DNSResourceType::A, signed(&www, &[sig]));

    let mut validator = ChainValidator::new(upstream, root.anchor()).with_time(NOW);
    let first = validator.validate(&www.name, DNSResourceType::A).await.unwrap();
    let second = validator.validate(&www.name, DNSResourceType::A).await.unwrap();

    assert_eq!(first.state, ValidationState::Secure);
    let canonical = |v: &chainwalk::Validation| -> Vec<Vec<u8>> {
        v.rrset
            .as_ref()
            .unwrap()
            .canonical()
            .map(|(wire, _)| wire.to_vec())
            .collect()
    };
    assert_eq!(canonical(&first), canonical(&second));
}

#[tokio::test]
async fn test_answer_signed_by_unknown_key_is_bogus() {
    let mut fx = SecureExample::new();
    let impostor = TestZone::new("example", 7);
    let set = a_rrset("www.example", "192.0.2.1");
    let sig = impostor.sign_with_zsk(&set);
    fx.upstream
        .replace(&set.name, DNSResourceType::A, signed(&set, &[sig]));

    let result = fx
        .validator()
        .validate(&name("www.example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(result.state, ValidationState::Bogus);
}

#[tokio::test]
async fn test_opt_out_below_a_signed_zone_is_insecure() {
    let mut fx = SecureExample::new();
    let child = name("insecure.example");
    fx.example.deny(
        &child,
        DNSResourceType::DS,
        &[fx.example.nsec3_covering_all(true)],
        &mut fx.upstream,
    );

    let result = fx
        .validator()
        .validate(&name("www.insecure.example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(result.state, ValidationState::Insecure);
}

#[tokio::test]
async fn test_signed_data_below_denied_delegation_is_bogus() {
    let mut fx = SecureExample::new();
    let child = name("insecure.example");
    fx.example.deny(
        &child,
        DNSResourceType::DS,
        &[fx.example.nsec3_covering_all(false)],
        &mut fx.upstream,
    );
    let rogue = TestZone::new("insecure.example", 5);
    rogue.publish(&a_rrset("www.insecure.example", "192.0.2.8"), &mut fx.upstream);

    let result = fx
        .validator()
        .validate(&name("www.insecure.example"), DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(
        result.reason,
        Some(BogusReason::SignedUnderInsecureDelegation {
            name: name("www.insecure.example")
        })
    );
}
