use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::blocks::SegmentCodec;
use crate::container::{codes, FRAME_HEADER_LEN};
use crate::error::{SnapError, SnapResult};

pub const COOKIE_MAGIC: &[u8] = b"SnapGene";

/// Highest import version this codec claims to read.
pub const MAX_IMPORT_VERSION: u16 = 20;

const COOKIE_LEN: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Unknown,
    Dna,
    Protein,
    Other(u16),
}

impl From<u16> for FileType {
    fn from(value: u16) -> Self {
        match value {
            0 => FileType::Unknown,
            1 => FileType::Dna,
            2 => FileType::Protein,
            other => FileType::Other(other),
        }
    }
}

impl From<FileType> for u16 {
    fn from(value: FileType) -> Self {
        match value {
            FileType::Unknown => 0,
            FileType::Dna => 1,
            FileType::Protein => 2,
            FileType::Other(other) => other,
        }
    }
}

/// The cookie: magic signature, file type and version pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub file_type: FileType,
    pub export_version: u16,
    pub import_version: u16,
    trailing: Vec<u8>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            file_type: FileType::Dna,
            export_version: 14,
            import_version: 14,
            trailing: Vec::new(),
        }
    }
}

impl Header {
    fn check_versions(export_version: u16, import_version: u16) -> SnapResult<()> {
        if export_version == 0 {
            return Err(SnapError::UnsupportedVersion {
                version: export_version,
            });
        }
        if import_version == 0 || import_version > MAX_IMPORT_VERSION {
            return Err(SnapError::UnsupportedVersion {
                version: import_version,
            });
        }
        Ok(())
    }
}

impl SegmentCodec for Header {
    const TYPE_CODE: u8 = codes::COOKIE;
    const NAME: &'static str = "cookie";

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        if bytes.len() < COOKIE_LEN || !bytes.starts_with(COOKIE_MAGIC) {
            return Err(SnapError::MalformedContainer {
                msg: "cookie signature mismatch",
                offset: FRAME_HEADER_LEN,
            });
        }

        let file_type = BigEndian::read_u16(&bytes[8..10]);
        let export_version = BigEndian::read_u16(&bytes[10..12]);
        let import_version = BigEndian::read_u16(&bytes[12..14]);
        Self::check_versions(export_version, import_version)?;

        Ok(Self {
            file_type: file_type.into(),
            export_version,
            import_version,
            trailing: bytes[COOKIE_LEN..].to_vec(),
        })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut out = Vec::with_capacity(COOKIE_LEN + self.trailing.len());
        out.extend_from_slice(COOKIE_MAGIC);
        out.write_u16::<BigEndian>(self.file_type.into())?;
        out.write_u16::<BigEndian>(self.export_version)?;
        out.write_u16::<BigEndian>(self.import_version)?;
        out.extend_from_slice(&self.trailing);
        Ok(out)
    }
}
