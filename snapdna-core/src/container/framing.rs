use crate::error::{SnapError, SnapResult};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

/// Type code byte plus the big-endian u32 payload length.
pub const FRAME_HEADER_LEN: usize = 5;

/// One `[type][len][payload]` block, borrowed from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub type_code: u8,
    pub offset: usize,
    pub payload: &'a [u8],
}

/// Split a byte stream into frames without looking at any payload.
///
/// The stream has no end marker: it ends where the input ends. A header or
/// payload that runs past the end of the input fails the whole read.
pub fn read_frames(data: &[u8]) -> SnapResult<Vec<Frame<'_>>> {
    let mut frames = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let rest = &data[pos..];
        if rest.len() < FRAME_HEADER_LEN {
            return Err(SnapError::MalformedContainer {
                msg: "truncated segment header",
                offset: pos,
            });
        }

        let type_code = rest[0];
        let len = BigEndian::read_u32(&rest[1..FRAME_HEADER_LEN]) as usize;
        let body = &rest[FRAME_HEADER_LEN..];
        if body.len() < len {
            return Err(SnapError::MalformedContainer {
                msg: "segment length runs past end of input",
                offset: pos,
            });
        }

        frames.push(Frame {
            type_code,
            offset: pos,
            payload: &body[..len],
        });
        pos += FRAME_HEADER_LEN + len;
    }

    Ok(frames)
}

pub fn write_frame(out: &mut Vec<u8>, type_code: u8, payload: &[u8]) -> SnapResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| SnapError::SegmentTooLarge {
        type_code,
        len: payload.len(),
    })?;
    out.reserve(FRAME_HEADER_LEN + payload.len());
    out.push(type_code);
    out.write_u32::<BigEndian>(len)?;
    out.extend_from_slice(payload);
    Ok(())
}
