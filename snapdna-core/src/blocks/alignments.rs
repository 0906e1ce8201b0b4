//! Trace descriptors (`<AlignableSequences>`) and the aligned-sequence
//! segments that carry the trace data they point to.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::blocks::{flag_str, parse_attr, parse_flag, SegmentCodec};
use crate::container::{codes, read_frames, write_frame};
use crate::error::{SnapError, SnapResult};
use crate::markup::{self, Element, MarkupDoc, Node};

const SEGMENT: &str = "alignable sequences";

/// One `<Sequence>` entry: a trace's name, id and display state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceDescriptor {
    pub id: u32,
    pub name: String,
    pub visible: Option<bool>,
    pub is_trace: Option<bool>,
    pub sort_order: Option<u32>,
    pub trimmed_range: Option<(i64, i64)>,
    pub manually_trimmed: Option<bool>,
    extra_attrs: Vec<(String, String)>,
}

impl TraceDescriptor {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_trace: Some(true),
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    fn from_element(el: &Element) -> SnapResult<Self> {
        let mut desc = Self::default();
        let mut has_id = false;
        for (key, value) in &el.attrs {
            match key.as_str() {
                "ID" => {
                    desc.id = parse_attr(SEGMENT, key, value)?;
                    has_id = true;
                }
                "name" => desc.name = value.clone(),
                "use" => desc.visible = Some(parse_flag(SEGMENT, key, value)?),
                "isTrace" => desc.is_trace = Some(parse_flag(SEGMENT, key, value)?),
                "sortOrder" => desc.sort_order = Some(parse_attr(SEGMENT, key, value)?),
                "trimmedRange" => {
                    let (start, end) = value.split_once("..").ok_or_else(|| {
                        SnapError::markup(SEGMENT, format!("invalid trimmed range '{value}'"))
                    })?;
                    desc.trimmed_range = Some((
                        parse_attr(SEGMENT, key, start)?,
                        parse_attr(SEGMENT, key, end)?,
                    ));
                }
                "manuallyTrimmed" => {
                    desc.manually_trimmed = Some(parse_flag(SEGMENT, key, value)?)
                }
                _ => desc.extra_attrs.push((key.clone(), value.clone())),
            }
        }
        if !has_id {
            return Err(SnapError::markup(SEGMENT, "sequence entry without an ID"));
        }
        Ok(desc)
    }

    fn to_element(&self) -> Element {
        let mut el = Element::new("Sequence");
        el.push_attr("ID", self.id.to_string());
        el.push_attr("name", self.name.as_str());
        if let Some(visible) = self.visible {
            el.push_attr("use", flag_str(visible));
        }
        if let Some(is_trace) = self.is_trace {
            el.push_attr("isTrace", flag_str(is_trace));
        }
        if let Some(order) = self.sort_order {
            el.push_attr("sortOrder", order.to_string());
        }
        if let Some((start, end)) = self.trimmed_range {
            el.push_attr("trimmedRange", format!("{start}..{end}"));
        }
        if let Some(trimmed) = self.manually_trimmed {
            el.push_attr("manuallyTrimmed", flag_str(trimmed));
        }
        el.attrs.extend(self.extra_attrs.iter().cloned());
        el
    }
}

/// The trace descriptor list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignableSequences {
    pub trim_stringency: Option<String>,
    pub sequences: Vec<TraceDescriptor>,
    decl: Option<String>,
    extra_attrs: Vec<(String, String)>,
    extra_children: Vec<Node>,
}

impl AlignableSequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u32 {
        self.sequences.iter().map(|s| s.id + 1).max().unwrap_or(0)
    }

    /// Rewrite every sort order to match the list position.
    pub fn sync_sort_order(&mut self) {
        for (order, desc) in self.sequences.iter_mut().enumerate() {
            desc.sort_order = Some(order as u32);
        }
    }
}

impl SegmentCodec for AlignableSequences {
    const TYPE_CODE: u8 = codes::ALIGNABLE_SEQUENCES;
    const NAME: &'static str = SEGMENT;

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        let doc = markup::parse(bytes, SEGMENT)?;
        if doc.root.name != "AlignableSequences" {
            return Err(SnapError::markup(
                SEGMENT,
                format!("expected <AlignableSequences>, found <{}>", doc.root.name),
            ));
        }

        let mut table = Self {
            decl: doc.decl,
            ..Self::default()
        };
        for (key, value) in &doc.root.attrs {
            match key.as_str() {
                "trimStringency" => table.trim_stringency = Some(value.clone()),
                _ => table.extra_attrs.push((key.clone(), value.clone())),
            }
        }
        for node in &doc.root.children {
            match node {
                Node::Element(child) if child.name == "Sequence" => {
                    table.sequences.push(TraceDescriptor::from_element(child)?);
                }
                Node::Text(text) if text.trim().is_empty() => {}
                other => table.extra_children.push(other.clone()),
            }
        }
        Ok(table)
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut root = Element::new("AlignableSequences");
        if let Some(stringency) = &self.trim_stringency {
            root.push_attr("trimStringency", stringency.as_str());
        }
        root.attrs.extend(self.extra_attrs.iter().cloned());
        for desc in &self.sequences {
            root.push_child(desc.to_element());
        }
        root.children.extend(self.extra_children.iter().cloned());

        markup::to_bytes(&MarkupDoc {
            decl: self.decl.clone(),
            root,
        })
    }
}

/// One nested frame of an aligned sequence, normally a ZTR trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceBlob {
    pub type_code: u8,
    pub bytes: Vec<u8>,
}

impl TraceBlob {
    pub fn ztr(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code: codes::TRACE,
            bytes: bytes.into(),
        }
    }
}

/// Trace data for the descriptor with the same id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignedSequence {
    pub id: u32,
    pub traces: Vec<TraceBlob>,
}

impl AlignedSequence {
    pub fn new(id: u32, traces: Vec<TraceBlob>) -> Self {
        Self { id, traces }
    }
}

impl SegmentCodec for AlignedSequence {
    const TYPE_CODE: u8 = codes::ALIGNED_SEQUENCE;
    const NAME: &'static str = "aligned sequence";

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        if bytes.len() < 4 {
            return Err(SnapError::MalformedSegment {
                type_code: Self::TYPE_CODE,
                msg: "missing sequence id",
            });
        }
        let id = BigEndian::read_u32(&bytes[..4]);
        let traces = read_frames(&bytes[4..])?
            .into_iter()
            .map(|frame| TraceBlob {
                type_code: frame.type_code,
                bytes: frame.payload.to_vec(),
            })
            .collect();
        Ok(Self { id, traces })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut out = Vec::new();
        out.write_u32::<BigEndian>(self.id)?;
        for trace in &self.traces {
            write_frame(&mut out, trace.type_code, &trace.bytes)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTORS: &str = concat!(
        r#"<AlignableSequences trimStringency="Medium">"#,
        r#"<Sequence ID="0" name="read_a" use="1" isTrace="1" sortOrder="0" trimmedRange="22..815" manuallyTrimmed="0"/>"#,
        r#"<Sequence ID="1" name="read_b" use="0" isTrace="1" sortOrder="1"/>"#,
        r#"</AlignableSequences>"#,
    );

    #[test]
    fn decodes_descriptors() {
        let table = AlignableSequences::from_bytes(DESCRIPTORS.as_bytes()).unwrap();
        assert_eq!(table.trim_stringency.as_deref(), Some("Medium"));
        assert_eq!(table.sequences.len(), 2);

        let a = &table.sequences[0];
        assert_eq!(a.id, 0);
        assert_eq!(a.name, "read_a");
        assert!(a.is_visible());
        assert_eq!(a.trimmed_range, Some((22, 815)));
        assert_eq!(a.manually_trimmed, Some(false));
        assert!(!table.sequences[1].is_visible());
        assert_eq!(table.next_id(), 2);
    }

    #[test]
    fn descriptors_round_trip() {
        let table = AlignableSequences::from_bytes(DESCRIPTORS.as_bytes()).unwrap();
        assert_eq!(table.to_bytes().unwrap(), DESCRIPTORS.as_bytes());
    }

    #[test]
    fn sort_order_follows_list() {
        let mut table = AlignableSequences::from_bytes(DESCRIPTORS.as_bytes()).unwrap();
        table.sequences.reverse();
        table.sync_sort_order();
        assert_eq!(table.sequences[0].name, "read_b");
        assert_eq!(table.sequences[0].sort_order, Some(0));
        assert_eq!(table.sequences[1].sort_order, Some(1));
    }

    #[test]
    fn empty_list() {
        let table = AlignableSequences::from_bytes(b"<AlignableSequences/>").unwrap();
        assert!(table.sequences.is_empty());
        assert_eq!(table.next_id(), 0);
        assert_eq!(table.to_bytes().unwrap(), b"<AlignableSequences/>".to_vec());
    }

    #[test]
    fn rejects_entry_without_id() {
        let err = AlignableSequences::from_bytes(br#"<AlignableSequences><Sequence name="x"/></AlignableSequences>"#)
            .unwrap_err();
        assert!(matches!(err, SnapError::MalformedMarkup { .. }));
    }

    #[test]
    fn aligned_sequence_nests_frames() {
        let bytes = b"\x00\x00\x00\x03\x12\x00\x00\x00\x04ZTR1";
        let seq = AlignedSequence::from_bytes(bytes).unwrap();
        assert_eq!(seq.id, 3);
        assert_eq!(seq.traces, vec![TraceBlob::ztr(&b"ZTR1"[..])]);
        assert_eq!(seq.to_bytes().unwrap(), bytes.to_vec());
    }

    #[test]
    fn aligned_sequence_needs_id() {
        let err = AlignedSequence::from_bytes(b"\x00\x01").unwrap_err();
        assert!(matches!(err, SnapError::MalformedSegment { type_code: 16, .. }));
    }

    #[test]
    fn aligned_sequence_rejects_truncated_trace() {
        assert!(AlignedSequence::from_bytes(b"\x00\x00\x00\x00\x12\x00\x00\x00\x09ZTR").is_err());
    }
}
