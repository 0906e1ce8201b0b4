pub mod alignments;
pub mod features;
pub mod header;
pub mod history;
pub mod notes;
pub mod references;
pub mod restriction;
pub mod sequence;

pub use alignments::{AlignableSequences, AlignedSequence, TraceBlob, TraceDescriptor};
pub use features::{
    Directionality, Feature, FeatureSegment, FeatureTable, QualifierValue, Qualifiers,
};
pub use header::Header;
pub use notes::{Notes, Stamp};
pub use references::Reference;
pub use restriction::RestrictionDigest;
pub use sequence::{DnaSequence, Methylation, ProteinSequence, Strandedness, Topology};

use std::str::FromStr;

use crate::container::Codec;
use crate::error::{SnapError, SnapResult};

/// A payload type with a matching decoder and encoder.
///
/// For any payload `b` that `from_bytes` accepts, `to_bytes` on the result
/// gives back `b` as long as the payload was written in canonical form.
pub trait SegmentCodec: Sized {
    const TYPE_CODE: u8;
    const NAME: &'static str;

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self>;
    fn to_bytes(&self) -> SnapResult<Vec<u8>>;
}

macro_rules! codec_for {
    ($variant:ident, $ty:ty) => {
        Codec {
            name: <$ty as SegmentCodec>::NAME,
            decode: |bytes| <$ty as SegmentCodec>::from_bytes(bytes).map(Block::$variant),
            encode: |block| match block {
                Block::$variant(inner) => inner.to_bytes(),
                _ => Err(SnapError::CodecMismatch {
                    name: <$ty as SegmentCodec>::NAME,
                }),
            },
        }
    };
}

macro_rules! blocks {
    ($($variant:ident($ty:ty) => $as_ref:ident, $as_mut:ident;)*) => {
        /// Decoded form of every segment type the standard registry knows.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Block {
            $($variant($ty),)*
        }

        impl Block {
            pub fn type_code(&self) -> u8 {
                match self {
                    $(Block::$variant(_) => <$ty as SegmentCodec>::TYPE_CODE,)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Block::$variant(_) => <$ty as SegmentCodec>::NAME,)*
                }
            }

            /// The standard codec for this block's segment type.
            pub fn codec(&self) -> Codec {
                match self {
                    $(Block::$variant(_) => codec_for!($variant, $ty),)*
                }
            }

            $(
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Block::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Block::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$ty> for Block {
                fn from(inner: $ty) -> Self {
                    Block::$variant(inner)
                }
            }
        )*

        pub(crate) fn standard_codecs() -> Vec<(u8, Codec)> {
            vec![$((<$ty as SegmentCodec>::TYPE_CODE, codec_for!($variant, $ty)),)*]
        }
    };
}

blocks! {
    Header(Header) => as_header, as_header_mut;
    Dna(DnaSequence) => as_dna, as_dna_mut;
    Protein(ProteinSequence) => as_protein, as_protein_mut;
    Features(FeatureTable) => as_features, as_features_mut;
    Notes(Notes) => as_notes, as_notes_mut;
    Alignments(AlignableSequences) => as_alignments, as_alignments_mut;
    AlignedSequence(AlignedSequence) => as_aligned_sequence, as_aligned_sequence_mut;
    RestrictionDigest(RestrictionDigest) => as_restriction_digest, as_restriction_digest_mut;
}

pub(crate) fn parse_attr<T: FromStr>(segment: &'static str, key: &str, value: &str) -> SnapResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SnapError::markup(segment, format!("invalid {key} value '{value}'")))
}

pub(crate) fn parse_flag(segment: &'static str, key: &str, value: &str) -> SnapResult<bool> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(SnapError::markup(
            segment,
            format!("invalid {key} flag '{value}'"),
        )),
    }
}

pub(crate) fn flag_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
