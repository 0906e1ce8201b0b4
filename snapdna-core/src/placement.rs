//! Positioning a feature template over every occurrence of a subsequence.

use memchr::memmem;

use crate::blocks::{Feature, FeatureSegment};

/// 0-based start of every occurrence of `query` in `haystack`, scanning left
/// to right. Matches do not overlap. Comparison is byte for byte, so case
/// and ambiguity codes must match literally. An empty query matches nothing.
pub fn find_occurrences(haystack: &[u8], query: &[u8]) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    memmem::find_iter(haystack, query).collect()
}

/// Copy of `template` moved onto the match starting at 0-based `offset`.
///
/// The segments move as one block: the leftmost segment start lands on the
/// first base of the match and the others keep their distance to it, so a
/// template copied from an existing feature is placed the same way as one
/// written from 1. A template with no segments gets one covering the match.
pub fn place_at(template: &Feature, offset: usize, query_len: usize) -> Feature {
    let mut feature = template.clone();
    feature.id = None;
    match feature.extent() {
        None => feature
            .segments
            .push(FeatureSegment::new(offset + 1, offset + query_len)),
        Some((anchor, _)) => {
            for segment in &mut feature.segments {
                *segment = segment.rebased(anchor, offset + 1);
            }
        }
    }
    feature
}

/// One positioned copy of `template` per occurrence of `query`.
pub fn place(template: &Feature, haystack: &[u8], query: &[u8]) -> Vec<Feature> {
    find_occurrences(haystack, query)
        .into_iter()
        .map(|offset| place_at(template, offset, query.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn finds_disjoint_occurrences() {
        assert_eq!(find_occurrences(b"GAATTCxxGAATTC", b"GAATTC"), vec![0, 8]);
    }

    #[test]
    fn overlapping_matches_are_skipped() {
        assert_eq!(find_occurrences(b"AAAA", b"AA"), vec![0, 2]);
        assert_eq!(find_occurrences(b"ATATA", b"ATA"), vec![0]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(find_occurrences(b"taatacgac", b"TAATACGAC").is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(find_occurrences(b"ACGT", b"").is_empty());
    }

    #[test]
    fn places_one_copy_per_match() {
        let template = Feature::new("EcoRI", "misc_feature");
        let placed = place(&template, b"GAATTCxxGAATTC", b"GAATTC");
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].segments, vec![FeatureSegment::new(1, 6)]);
        assert_eq!(placed[1].segments, vec![FeatureSegment::new(9, 14)]);
        assert!(placed.iter().all(|f| f.name == "EcoRI" && f.id.is_none()));
    }

    #[test]
    fn multi_segment_template_moves_as_a_block() {
        let template = Feature::new("split", "CDS")
            .with_segment(FeatureSegment::new(1, 3).with_color("#ff0000"))
            .with_segment(FeatureSegment::new(6, 8));
        let placed = place_at(&template, 10, 8);
        assert_eq!(placed.segments[0].start, 11);
        assert_eq!(placed.segments[0].end, 13);
        assert_eq!(placed.segments[0].color.as_deref(), Some("#ff0000"));
        assert_eq!(placed.segments[1].start, 16);
        assert_eq!(placed.segments[1].end, 18);
    }

    #[test]
    fn positioned_template_is_rebased_onto_the_match() {
        let template = Feature::new("T7", "promoter")
            .with_segment(FeatureSegment::new(5, 10))
            .with_segment(FeatureSegment::new(14, 16));
        let placed = place(&template, b"TAATACGACTCACTATAGG", b"TAATAC");
        assert_eq!(placed.len(), 1);
        let ranges: Vec<(usize, usize)> =
            placed[0].segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(1, 6), (10, 12)]);
    }

    #[test]
    fn no_match_places_nothing() {
        let template = Feature::new("lac", "promoter");
        assert!(place(&template, b"ACGTACGT", b"TTTT").is_empty());
    }

    proptest! {
        #[test]
        fn counts_planted_copies(
            k in 0usize..6,
            filler in prop::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'T')], 0..8),
        ) {
            // The query holds a G and the filler never does, so copies
            // cannot overlap or appear by accident.
            let query = b"GG";
            let mut hay = Vec::new();
            let mut expected = Vec::new();
            for _ in 0..k {
                hay.extend_from_slice(&filler);
                expected.push(hay.len());
                hay.extend_from_slice(query);
            }
            hay.extend_from_slice(&filler);

            let template = Feature::new("site", "misc_feature");
            let placed = place(&template, &hay, query);
            prop_assert_eq!(placed.len(), k);
            for (feature, start) in placed.iter().zip(&expected) {
                prop_assert_eq!(feature.segments.len(), 1);
                prop_assert_eq!(feature.segments[0].start, start + 1);
                prop_assert_eq!(feature.segments[0].end, start + query.len());
            }
        }
    }
}
