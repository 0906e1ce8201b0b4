use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::blocks::SegmentCodec;
use crate::container::codes;
use crate::error::{SnapError, SnapResult};

/// Restriction digest segment.
///
/// Layout: one lead byte, a big-endian u32 length, that many bytes of
/// comma-separated recognition sites, then a tail that is kept verbatim.
/// A zero-length payload is accepted and reads as an empty digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestrictionDigest {
    pub lead: u8,
    pub sites: Vec<String>,
    tail: Vec<u8>,
}

impl Default for RestrictionDigest {
    fn default() -> Self {
        Self {
            lead: 1,
            sites: Vec::new(),
            tail: Vec::new(),
        }
    }
}

impl RestrictionDigest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentCodec for RestrictionDigest {
    const TYPE_CODE: u8 = codes::RESTRICTION_DIGEST;
    const NAME: &'static str = "restriction digest";

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let malformed = |msg| SnapError::MalformedSegment {
            type_code: Self::TYPE_CODE,
            msg,
        };
        if bytes.len() < 5 {
            return Err(malformed("truncated site list header"));
        }

        let lead = bytes[0];
        let len = BigEndian::read_u32(&bytes[1..5]) as usize;
        let list = 5usize
            .checked_add(len)
            .and_then(|end| bytes.get(5..end))
            .ok_or_else(|| malformed("site list runs past end of segment"))?;
        let list = std::str::from_utf8(list).map_err(|_| malformed("site list is not ASCII"))?;
        let sites = if list.is_empty() {
            Vec::new()
        } else {
            list.split(',').map(str::to_string).collect()
        };

        Ok(Self {
            lead,
            sites,
            tail: bytes[5 + len..].to_vec(),
        })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let list = self.sites.join(",");
        let len = u32::try_from(list.len()).map_err(|_| SnapError::SegmentTooLarge {
            type_code: Self::TYPE_CODE,
            len: list.len(),
        })?;
        let mut out = Vec::with_capacity(5 + list.len() + self.tail.len());
        out.push(self.lead);
        out.write_u32::<BigEndian>(len)?;
        out.extend_from_slice(list.as_bytes());
        out.extend_from_slice(&self.tail);
        Ok(out)
    }
}
