use super::*;

#[test]
fn parses_nested_elements_and_attributes() {
    let doc = parse(
        br#"<Features nextValidID="1"><Feature name="T7"><Segment range="1-19"/></Feature></Features>"#,
        "features",
    )
    .unwrap();
    assert_eq!(doc.decl, None);
    assert_eq!(doc.root.name, "Features");
    assert_eq!(doc.root.attr("nextValidID"), Some("1"));

    let feature = doc.root.elements().next().unwrap();
    assert_eq!(feature.attr("name"), Some("T7"));
    let segment = feature.elements().next().unwrap();
    assert_eq!(segment.attr("range"), Some("1-19"));
    assert!(segment.children.is_empty());
}

#[test]
fn unescapes_markup_inside_attributes() {
    let doc = parse(
        br#"<V text="&lt;html&gt;&lt;body&gt;T7 &amp; SP6&lt;/body&gt;&lt;/html&gt;"/>"#,
        "features",
    )
    .unwrap();
    assert_eq!(
        doc.root.attr("text"),
        Some("<html><body>T7 & SP6</body></html>")
    );
}

#[test]
fn character_references_decode_to_unicode() {
    let doc = parse("<Organism>FLAG&#174; tag \u{3b2}</Organism>".as_bytes(), "notes").unwrap();
    assert_eq!(doc.root.text(), "FLAG\u{ae} tag \u{3b2}");
}

#[test]
fn keeps_declaration() {
    let input = br#"<?xml version="1.0"?><Notes><Type>Natural</Type></Notes>"#;
    let doc = parse(input, "notes").unwrap();
    assert_eq!(doc.decl.as_deref(), Some(r#"xml version="1.0""#));
    assert_eq!(to_bytes(&doc).unwrap(), input.to_vec());
}

#[test]
fn writer_reproduces_compact_markup() {
    let input: &[u8] = br##"<Features nextValidID="1"><Feature recentID="0" name="T7 promoter"><Segment range="1-19" color="#ffffff"/><Q name="note"><V text="&lt;b&gt;strong&lt;/b&gt;"/></Q></Feature></Features>"##;
    let doc = parse(input, "features").unwrap();
    assert_eq!(to_bytes(&doc).unwrap(), input.to_vec());
}

#[test]
fn html_subset_in_element_text_round_trips() {
    let input: &[u8] = b"<Description>plain <b>bold</b> and <i>italic</i> &amp; more</Description>";
    let doc = parse(input, "notes").unwrap();
    assert_eq!(doc.root.children.len(), 5);
    assert_eq!(doc.root.children[0], Node::Text("plain ".to_string()));
    assert_eq!(doc.root.text(), "plain  and  & more");
    assert_eq!(to_bytes(&doc).unwrap(), input.to_vec());
}

#[test]
fn rejects_mismatched_tags() {
    let err = parse(b"<Notes><Type>x</Notes>", "notes").unwrap_err();
    assert!(matches!(err, SnapError::MalformedMarkup { .. }));
}

#[test]
fn rejects_unclosed_root() {
    let err = parse(b"<Notes><Type>x</Type>", "notes").unwrap_err();
    assert!(matches!(err, SnapError::MalformedMarkup { .. }));
}

#[test]
fn rejects_empty_payload() {
    let err = parse(b"", "notes").unwrap_err();
    assert!(matches!(err, SnapError::MalformedMarkup { .. }));
}

#[test]
fn rejects_second_root() {
    let err = parse(b"<A/><B/>", "notes").unwrap_err();
    assert!(matches!(err, SnapError::MalformedMarkup { .. }));
}
