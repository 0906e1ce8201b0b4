//! Small files built in code for tests.

use crate::container::write_frame;

pub(crate) const T7_PROMOTER: &[u8] = b"TAATACGACTCACTATAGG";

pub(crate) const COOKIE: &[u8] = b"SnapGene\x00\x01\x00\x0f\x00\x0e";

pub(crate) const FEATURES: &str = concat!(
    r#"<?xml version="1.0"?>"#,
    r#"<Features nextValidID="1">"#,
    r#"<Feature recentID="0" name="T7 promoter" directionality="1" type="promoter">"#,
    r##"<Segment range="1-19" color="#ffffff" type="standard"/>"##,
    r#"<Q name="note"><V text="&lt;html&gt;&lt;body&gt;promoter for bacteriophage T7 RNA polymerase&lt;/body&gt;&lt;/html&gt;"/></Q>"#,
    r#"</Feature>"#,
    r#"</Features>"#,
);

pub(crate) const NOTES: &str = concat!(
    "<Notes>",
    "<Type>Synthetic</Type>",
    "<CreatedBy>Jane Doe</CreatedBy>",
    "<Created UTC=\"5:0:0\">2012.6.28</Created>",
    "</Notes>",
);

pub(crate) const DESCRIPTORS: &str = concat!(
    r#"<AlignableSequences trimStringency="Medium">"#,
    r#"<Sequence ID="0" name="read_a" use="1" isTrace="1" sortOrder="0"/>"#,
    r#"<Sequence ID="1" name="read_b" use="1" isTrace="1" sortOrder="1"/>"#,
    r#"</AlignableSequences>"#,
);

pub(crate) fn frame(type_code: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_frame(&mut out, type_code, payload).unwrap();
    out
}

fn aligned(id: u32, ztr: &[u8]) -> Vec<u8> {
    let mut payload = id.to_be_bytes().to_vec();
    payload.extend(frame(18, ztr));
    frame(16, &payload)
}

/// Cookie, linear double-stranded T7 promoter, empty restriction digest,
/// opaque primers, notes, one feature, history and an unknown segment.
pub(crate) fn t7_file() -> Vec<u8> {
    let mut dna = vec![0x02];
    dna.extend_from_slice(T7_PROMOTER);

    let mut out = frame(9, COOKIE);
    out.extend(frame(0, &dna));
    out.extend(frame(3, b"\x01\x00\x00\x00\x00"));
    out.extend(frame(5, b"<Primers nextValidID=\"0\"/>"));
    out.extend(frame(6, NOTES.as_bytes()));
    out.extend(frame(10, FEATURES.as_bytes()));
    out.extend(frame(7, b"\x1f\x8b\x08\x00history"));
    out.extend(frame(11, b"node-0"));
    out.extend(frame(200, b"\xde\xad\xbe\xef"));
    out
}

/// The T7 file plus two traces.
pub(crate) fn traces_file() -> Vec<u8> {
    let mut out = t7_file();
    out.extend(frame(17, DESCRIPTORS.as_bytes()));
    out.extend(aligned(0, b"ZTR-a"));
    out.extend(aligned(1, b"ZTR-b"));
    out
}
