use crate::blocks::SegmentCodec;
use crate::container::codes;
use crate::error::{SnapError, SnapResult};

const CIRCULAR: u8 = 0x01;
const DOUBLE_STRANDED: u8 = 0x02;
const DAM: u8 = 0x04;
const DCM: u8 = 0x08;
const ECOKI: u8 = 0x10;
const KNOWN_FLAGS: u8 = CIRCULAR | DOUBLE_STRANDED | DAM | DCM | ECOKI;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

impl Topology {
    pub fn as_str(self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Circular => "circular",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Topology::Linear),
            "circular" => Some(Topology::Circular),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strandedness {
    Single,
    #[default]
    Double,
}

impl Strandedness {
    pub fn as_str(self) -> &'static str {
        match self {
            Strandedness::Single => "single",
            Strandedness::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(Strandedness::Single),
            "double" => Some(Strandedness::Double),
            _ => None,
        }
    }
}

/// Independent methylation switches; any combination is valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Methylation {
    pub dam: bool,
    pub dcm: bool,
    pub ecoki: bool,
}

/// Nucleotide sequence segment: one flag byte followed by the bases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnaSequence {
    pub topology: Topology,
    pub strandedness: Strandedness,
    pub methylation: Methylation,
    pub bases: Vec<u8>,
    unknown_flags: u8,
}

impl DnaSequence {
    pub fn new(bases: impl Into<Vec<u8>>) -> Self {
        Self {
            bases: bases.into(),
            ..Self::default()
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn flags(&self) -> u8 {
        let mut flags = self.unknown_flags;
        if self.topology == Topology::Circular {
            flags |= CIRCULAR;
        }
        if self.strandedness == Strandedness::Double {
            flags |= DOUBLE_STRANDED;
        }
        if self.methylation.dam {
            flags |= DAM;
        }
        if self.methylation.dcm {
            flags |= DCM;
        }
        if self.methylation.ecoki {
            flags |= ECOKI;
        }
        flags
    }
}

impl SegmentCodec for DnaSequence {
    const TYPE_CODE: u8 = codes::DNA;
    const NAME: &'static str = "dna";

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        let (&flags, bases) = bytes.split_first().ok_or(SnapError::MalformedSegment {
            type_code: Self::TYPE_CODE,
            msg: "missing sequence flag byte",
        })?;

        Ok(Self {
            topology: if flags & CIRCULAR != 0 {
                Topology::Circular
            } else {
                Topology::Linear
            },
            strandedness: if flags & DOUBLE_STRANDED != 0 {
                Strandedness::Double
            } else {
                Strandedness::Single
            },
            methylation: Methylation {
                dam: flags & DAM != 0,
                dcm: flags & DCM != 0,
                ecoki: flags & ECOKI != 0,
            },
            bases: bases.to_vec(),
            unknown_flags: flags & !KNOWN_FLAGS,
        })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut out = Vec::with_capacity(1 + self.bases.len());
        out.push(self.flags());
        out.extend_from_slice(&self.bases);
        Ok(out)
    }
}

/// Protein sequence segment. The flag byte has no known meaning and is
/// carried as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProteinSequence {
    pub flags: u8,
    pub residues: Vec<u8>,
}

impl ProteinSequence {
    pub fn new(residues: impl Into<Vec<u8>>) -> Self {
        Self {
            flags: 0,
            residues: residues.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }
}

impl SegmentCodec for ProteinSequence {
    const TYPE_CODE: u8 = codes::PROTEIN;
    const NAME: &'static str = "protein";

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        let (&flags, residues) = bytes.split_first().ok_or(SnapError::MalformedSegment {
            type_code: Self::TYPE_CODE,
            msg: "missing sequence flag byte",
        })?;
        Ok(Self {
            flags,
            residues: residues.to_vec(),
        })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut out = Vec::with_capacity(1 + self.residues.len());
        out.push(self.flags);
        out.extend_from_slice(&self.residues);
        Ok(out)
    }
}
