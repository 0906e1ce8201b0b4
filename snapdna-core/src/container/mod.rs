//! Segment stream codec.
//!
//! A file is a flat run of `[type: u8][len: u32 BE][payload]` frames. The
//! first frame is always the cookie. Payloads are handed to the
//! [`Registry`] for decoding; anything it does not know stays as raw bytes
//! and is written back untouched.

pub mod framing;
pub mod registry;

#[cfg(test)]
mod tests;

use std::borrow::Cow;

pub use framing::{read_frames, write_frame, Frame, FRAME_HEADER_LEN};
pub use registry::{Codec, DecodeFn, EncodeFn, Handler, Registry};

use crate::blocks::header::COOKIE_MAGIC;
use crate::blocks::Block;
use crate::error::{SnapError, SnapResult};

/// Segment type codes used by the format.
pub mod codes {
    pub const DNA: u8 = 0;
    pub const COMPRESSED_DNA: u8 = 1;
    pub const RESTRICTION_DIGEST: u8 = 3;
    pub const PRIMERS: u8 = 5;
    pub const NOTES: u8 = 6;
    pub const HISTORY: u8 = 7;
    pub const PROPERTIES: u8 = 8;
    pub const COOKIE: u8 = 9;
    pub const FEATURES: u8 = 10;
    pub const HISTORY_NODE: u8 = 11;
    pub const ALIGNED_SEQUENCE: u8 = 16;
    pub const ALIGNABLE_SEQUENCES: u8 = 17;
    pub const TRACE: u8 = 18;
    pub const URACIL: u8 = 19;
    pub const DNA_COLORS: u8 = 20;
    pub const PROTEIN: u8 = 21;
}

/// A decoded payload together with the encoder that writes it back.
///
/// `pristine` holds the bytes the block was decoded from. They are emitted
/// verbatim until the block is borrowed mutably.
#[derive(Clone, Debug)]
pub struct Decoded {
    block: Block,
    codec: Codec,
    pristine: Option<Vec<u8>>,
}

impl Decoded {
    pub(crate) fn pristine(block: Block, codec: Codec, bytes: Vec<u8>) -> Self {
        Self {
            block,
            codec,
            pristine: Some(bytes),
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn is_pristine(&self) -> bool {
        self.pristine.is_some()
    }

    fn encode(&self) -> SnapResult<Cow<'_, [u8]>> {
        match &self.pristine {
            Some(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            None => (self.codec.encode)(&self.block).map(Cow::Owned),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Payload {
    Decoded(Decoded),
    Opaque(Vec<u8>),
    Resettable {
        bytes: Vec<u8>,
        reset: &'static [u8],
    },
}

#[derive(Clone, Debug)]
pub struct Segment {
    type_code: u8,
    payload: Payload,
}

impl Segment {
    pub fn new(type_code: u8, payload: Payload) -> Self {
        Self { type_code, payload }
    }

    pub fn opaque(type_code: u8, bytes: Vec<u8>) -> Self {
        Self::new(type_code, Payload::Opaque(bytes))
    }

    /// A freshly built segment, encoded with the block's standard codec.
    pub fn from_block(block: impl Into<Block>) -> Self {
        let block = block.into();
        let type_code = block.type_code();
        let codec = block.codec();
        Self::new(
            type_code,
            Payload::Decoded(Decoded {
                block,
                codec,
                pristine: None,
            }),
        )
    }

    pub fn type_code(&self) -> u8 {
        self.type_code
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn block(&self) -> Option<&Block> {
        match &self.payload {
            Payload::Decoded(decoded) => Some(&decoded.block),
            _ => None,
        }
    }

    /// Mutable access to the decoded block. The segment is re-encoded from
    /// the block on the next write.
    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match &mut self.payload {
            Payload::Decoded(decoded) => {
                decoded.pristine = None;
                Some(&mut decoded.block)
            }
            _ => None,
        }
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Opaque(bytes) | Payload::Resettable { bytes, .. } => Some(bytes.as_slice()),
            Payload::Decoded(_) => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.payload, Payload::Opaque(_))
    }

    pub fn is_pristine(&self) -> bool {
        match &self.payload {
            Payload::Decoded(decoded) => decoded.is_pristine(),
            _ => true,
        }
    }

    /// Replace a resettable payload with its canonical value. Returns
    /// `false` for any other kind of payload.
    pub fn reset(&mut self) -> bool {
        match &mut self.payload {
            Payload::Resettable { bytes, reset } => {
                *bytes = reset.to_vec();
                true
            }
            _ => false,
        }
    }

    pub fn payload_bytes(&self) -> SnapResult<Cow<'_, [u8]>> {
        match &self.payload {
            Payload::Decoded(decoded) => decoded.encode(),
            Payload::Opaque(bytes) | Payload::Resettable { bytes, .. } => {
                Ok(Cow::Borrowed(bytes.as_slice()))
            }
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> SnapResult<()> {
        let payload = self.payload_bytes()?;
        write_frame(out, self.type_code, &payload)
    }
}

/// Decode a whole file. The first frame must be the cookie; no partial
/// result is returned on failure.
pub fn decode_segments(data: &[u8], registry: &Registry) -> SnapResult<Vec<Segment>> {
    let frames = read_frames(data)?;

    match frames.first() {
        None => {
            return Err(SnapError::MalformedContainer {
                msg: "empty input",
                offset: 0,
            })
        }
        Some(frame) if frame.type_code != codes::COOKIE => {
            return Err(SnapError::MalformedContainer {
                msg: "stream does not start with a cookie segment",
                offset: 0,
            })
        }
        Some(frame) if !frame.payload.starts_with(COOKIE_MAGIC) => {
            return Err(SnapError::MalformedContainer {
                msg: "cookie signature mismatch",
                offset: FRAME_HEADER_LEN,
            })
        }
        Some(_) => {}
    }

    let mut segments = Vec::with_capacity(frames.len());
    for frame in frames {
        let payload = registry.decode_payload(frame.type_code, frame.payload)?;
        tracing::debug!(
            type_code = frame.type_code,
            offset = frame.offset,
            len = frame.payload.len(),
            kind = registry.name_of(frame.type_code),
            "decoded segment"
        );
        segments.push(Segment::new(frame.type_code, payload));
    }
    Ok(segments)
}

pub fn encode_segments(segments: &[Segment]) -> SnapResult<Vec<u8>> {
    let mut out = Vec::new();
    for segment in segments {
        segment.write_to(&mut out)?;
    }
    Ok(out)
}
