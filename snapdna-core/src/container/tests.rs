use proptest::prelude::*;

use super::*;
use crate::blocks::{DnaSequence, SegmentCodec};
use crate::fixtures::{self, frame};

fn unregistered_code() -> impl Strategy<Value = u8> {
    let registry = Registry::standard();
    any::<u8>().prop_filter("registered type", move |code| {
        !registry.is_registered(*code)
    })
}

#[test]
fn t7_file_round_trips() {
    let data = fixtures::t7_file();
    let segments = decode_segments(&data, &Registry::standard()).unwrap();
    assert_eq!(segments.len(), 9);
    assert_eq!(segments[0].type_code(), codes::COOKIE);
    assert!(segments.iter().all(Segment::is_pristine));
    assert_eq!(encode_segments(&segments).unwrap(), data);
}

#[test]
fn payload_kinds_follow_registry() {
    let data = fixtures::t7_file();
    let segments = decode_segments(&data, &Registry::standard()).unwrap();
    let kind = |code: u8| {
        let segment = segments.iter().find(|s| s.type_code() == code).unwrap();
        match segment.payload() {
            Payload::Decoded(_) => "decoded",
            Payload::Opaque(_) => "opaque",
            Payload::Resettable { .. } => "resettable",
        }
    };
    assert_eq!(kind(codes::DNA), "decoded");
    assert_eq!(kind(codes::FEATURES), "decoded");
    assert_eq!(kind(codes::PRIMERS), "opaque");
    assert_eq!(kind(codes::HISTORY), "resettable");
    assert_eq!(kind(codes::HISTORY_NODE), "opaque");
    assert_eq!(kind(200), "opaque");
}

#[test]
fn mutation_only_touches_its_segment() {
    let data = fixtures::t7_file();
    let mut segments = decode_segments(&data, &Registry::standard()).unwrap();
    let dna = segments[1].block_mut().unwrap().as_dna_mut().unwrap();
    dna.bases.push(b'G');
    assert!(!segments[1].is_pristine());

    let out = encode_segments(&segments).unwrap();
    let before = read_frames(&data).unwrap();
    let after = read_frames(&out).unwrap();
    assert_eq!(before.len(), after.len());
    for (i, (old, new)) in before.iter().zip(&after).enumerate() {
        if i == 1 {
            assert_eq!(new.payload, b"\x02TAATACGACTCACTATAGGG");
        } else {
            assert_eq!(old.type_code, new.type_code);
            assert_eq!(old.payload, new.payload);
        }
    }
    assert_eq!(&out[..5 + fixtures::COOKIE.len()], &data[..5 + fixtures::COOKIE.len()]);

    let reread = decode_segments(&out, &Registry::standard()).unwrap();
    let dna = reread[1].block().unwrap().as_dna().unwrap();
    assert_eq!(dna.as_bytes(), b"TAATACGACTCACTATAGGG");
    assert_eq!(dna.topology, crate::blocks::Topology::Linear);
}

#[test]
fn mutable_borrow_without_change_reencodes_identically() {
    let data = fixtures::t7_file();
    let mut segments = decode_segments(&data, &Registry::standard()).unwrap();
    for segment in &mut segments {
        segment.block_mut();
    }
    assert_eq!(encode_segments(&segments).unwrap(), data);
}

#[test]
fn rejects_missing_cookie() {
    let data = frame(0, b"\x02ACGT");
    match decode_segments(&data, &Registry::standard()).unwrap_err() {
        SnapError::MalformedContainer { offset, .. } => assert_eq!(offset, 0),
        other => panic!("expected malformed container, got {other:?}"),
    }
}

#[test]
fn rejects_bad_magic() {
    let data = frame(codes::COOKIE, b"GeneSnap\x00\x01\x00\x0f\x00\x0e");
    assert!(matches!(
        decode_segments(&data, &Registry::standard()),
        Err(SnapError::MalformedContainer { .. })
    ));
}

#[test]
fn rejects_empty_input() {
    assert!(decode_segments(b"", &Registry::standard()).is_err());
}

#[test]
fn unsupported_version_is_reported() {
    let data = frame(codes::COOKIE, b"SnapGene\x00\x01\x00\x0f\x00\x40");
    assert!(matches!(
        decode_segments(&data, &Registry::standard()),
        Err(SnapError::UnsupportedVersion { version: 64 })
    ));
}

#[test]
fn malformed_markup_fails_whole_decode() {
    let mut data = frame(codes::COOKIE, fixtures::COOKIE);
    data.extend(frame(codes::FEATURES, b"<Features><Feature name=\"x\">"));
    assert!(matches!(
        decode_segments(&data, &Registry::standard()),
        Err(SnapError::MalformedMarkup { .. })
    ));
}

#[test]
fn zero_length_segments_round_trip() {
    let mut data = frame(codes::COOKIE, fixtures::COOKIE);
    data.extend(frame(codes::HISTORY, b""));
    data.extend(frame(codes::RESTRICTION_DIGEST, b""));
    data.extend(frame(99, b""));
    let segments = decode_segments(&data, &Registry::standard()).unwrap();
    assert_eq!(encode_segments(&segments).unwrap(), data);
}

#[test]
fn history_reset_uses_canonical_payload() {
    let data = fixtures::t7_file();
    let mut segments = decode_segments(&data, &Registry::standard()).unwrap();
    let history = segments
        .iter_mut()
        .find(|s| s.type_code() == codes::HISTORY)
        .unwrap();
    assert!(history.reset());
    assert_eq!(
        history.raw_bytes(),
        Some(crate::blocks::history::EMPTY_HISTORY)
    );
    assert!(!segments[0].clone().reset());
}

#[test]
fn custom_registry_extends_dispatch() {
    let mut registry = Registry::standard();
    registry.unregister(codes::FEATURES);
    let data = fixtures::t7_file();
    let segments = decode_segments(&data, &registry).unwrap();
    let features = segments
        .iter()
        .find(|s| s.type_code() == codes::FEATURES)
        .unwrap();
    assert!(features.is_opaque());
    assert_eq!(encode_segments(&segments).unwrap(), data);
}

#[test]
fn built_segment_encodes_with_standard_codec() {
    let segment = Segment::from_block(DnaSequence::new("ACGT"));
    assert_eq!(segment.type_code(), codes::DNA);
    assert!(!segment.is_pristine());
    let mut out = Vec::new();
    segment.write_to(&mut out).unwrap();
    assert_eq!(out, frame(codes::DNA, &DnaSequence::new("ACGT").to_bytes().unwrap()));
}

proptest! {
    #[test]
    fn opaque_payloads_survive(code in unregistered_code(), payload in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut data = frame(codes::COOKIE, fixtures::COOKIE);
        data.extend(frame(code, &payload));
        let segments = decode_segments(&data, &Registry::standard()).unwrap();
        prop_assert!(segments[1].is_opaque());
        prop_assert_eq!(segments[1].raw_bytes(), Some(payload.as_slice()));
        prop_assert_eq!(encode_segments(&segments).unwrap(), data);
    }

    #[test]
    fn any_opaque_stream_round_trips(
        parts in prop::collection::vec((unregistered_code(), prop::collection::vec(any::<u8>(), 0..64)), 0..12),
    ) {
        let mut data = frame(codes::COOKIE, fixtures::COOKIE);
        for (code, payload) in &parts {
            data.extend(frame(*code, payload));
        }
        let segments = decode_segments(&data, &Registry::standard()).unwrap();
        prop_assert_eq!(segments.len(), parts.len() + 1);
        prop_assert_eq!(encode_segments(&segments).unwrap(), data);
    }

    #[test]
    fn truncated_tail_is_rejected(cut in 1usize..9) {
        let data = fixtures::t7_file();
        let truncated = &data[..data.len() - cut];
        let is_malformed = matches!(
            decode_segments(truncated, &Registry::standard()),
            Err(SnapError::MalformedContainer { .. })
        );
        prop_assert!(is_malformed);
    }
}
