//! The notes segment: free-form metadata fields plus the reference list.
//!
//! Notes are kept as their element tree so fields are written back in the
//! order they were read. Setting a field that is not present appends it.

use crate::blocks::references::Reference;
use crate::blocks::{flag_str, parse_attr, parse_flag, SegmentCodec};
use crate::container::codes;
use crate::error::{SnapError, SnapResult};
use crate::markup::{self, Element, MarkupDoc, Node};

const SEGMENT: &str = "notes";

/// A `YYYY.M.D` date stamp with its optional `UTC="h:m:s"` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub utc: Option<String>,
}

impl Stamp {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            utc: None,
        }
    }

    fn from_element(el: &Element) -> SnapResult<Self> {
        let text = el.text();
        let mut parts = text.trim().splitn(3, '.');
        let mut next = |label: &str| {
            parts
                .next()
                .ok_or_else(|| SnapError::markup(SEGMENT, format!("date '{text}' has no {label}")))
        };
        let year = parse_attr(SEGMENT, &el.name, next("year")?)?;
        let month = parse_attr(SEGMENT, &el.name, next("month")?)?;
        let day = parse_attr(SEGMENT, &el.name, next("day")?)?;
        Ok(Self {
            year,
            month,
            day,
            utc: el.attr("UTC").map(str::to_string),
        })
    }

    fn fill(&self, el: &mut Element) {
        el.attrs.retain(|(key, _)| key != "UTC");
        if let Some(utc) = &self.utc {
            el.push_attr("UTC", utc.as_str());
        }
        el.children = vec![Node::Text(format!("{}.{}.{}", self.year, self.month, self.day))];
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notes {
    decl: Option<String>,
    root: Element,
}

impl Default for Notes {
    fn default() -> Self {
        Self {
            decl: None,
            root: Element::new("Notes"),
        }
    }
}

macro_rules! text_fields {
    ($($get:ident, $set:ident => $tag:literal;)*) => {
        $(
            pub fn $get(&self) -> Option<String> {
                self.text_field($tag)
            }

            pub fn $set(&mut self, value: Option<&str>) {
                self.set_text_field($tag, value);
            }
        )*
    };
}

macro_rules! flag_fields {
    ($($get:ident, $set:ident => $tag:literal;)*) => {
        $(
            pub fn $get(&self) -> Option<bool> {
                self.text_field($tag).map(|v| v.trim() == "1")
            }

            pub fn $set(&mut self, value: Option<bool>) {
                self.set_text_field($tag, value.map(flag_str));
            }
        )*
    };
}

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    text_fields! {
        uuid, set_uuid => "UUID";
        plasmid_type, set_plasmid_type => "Type";
        author, set_author => "CreatedBy";
        description, set_description => "Description";
        comments, set_comments => "Comments";
        transformed_into, set_transformed_into => "TransformedInto";
        organism, set_organism => "Organism";
        accession_number, set_accession_number => "AccessionNumber";
        code_number, set_code_number => "CodeNumber";
        sequence_class, set_sequence_class => "SequenceClass";
        custom_map_label, set_custom_map_label => "CustomMapLabel";
    }

    flag_fields! {
        confirmed_experimentally, set_confirmed_experimentally => "ConfirmedExperimentally";
        use_custom_map_label, set_use_custom_map_label => "UseCustomMapLabel";
    }

    pub fn created(&self) -> Option<Stamp> {
        self.stamp("Created")
    }

    pub fn set_created(&mut self, stamp: Option<&Stamp>) {
        self.set_stamp("Created", stamp);
    }

    pub fn last_modified(&self) -> Option<Stamp> {
        self.stamp("LastModified")
    }

    pub fn set_last_modified(&mut self, stamp: Option<&Stamp>) {
        self.set_stamp("LastModified", stamp);
    }

    pub fn references(&self) -> Vec<Reference> {
        self.child("References")
            .map(|refs| refs.elements().map(Reference::from_element).collect())
            .unwrap_or_default()
    }

    /// Replace the reference list. An empty list removes the element.
    pub fn set_references(&mut self, references: &[Reference]) {
        if references.is_empty() {
            self.remove_child("References");
            return;
        }
        self.upsert("References", |el| {
            el.children = references
                .iter()
                .map(|r| Node::Element(r.to_element()))
                .collect();
        });
    }

    /// Text content of any child element, including ones without a
    /// dedicated accessor.
    pub fn text_field(&self, tag: &str) -> Option<String> {
        self.child(tag).map(Element::text)
    }

    /// Set or, with `None`, remove a text child.
    pub fn set_text_field(&mut self, tag: &str, value: Option<&str>) {
        match value {
            Some(value) => self.upsert(tag, |el| {
                el.children = vec![Node::Text(value.to_string())];
            }),
            None => self.remove_child(tag),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.root.elements().map(|el| el.name.as_str())
    }

    fn stamp(&self, tag: &str) -> Option<Stamp> {
        self.child(tag).and_then(|el| Stamp::from_element(el).ok())
    }

    fn set_stamp(&mut self, tag: &str, stamp: Option<&Stamp>) {
        match stamp {
            Some(stamp) => self.upsert(tag, |el| stamp.fill(el)),
            None => self.remove_child(tag),
        }
    }

    fn child(&self, tag: &str) -> Option<&Element> {
        self.root.elements().find(|el| el.name == tag)
    }

    /// Run `fill` on the child `tag`, appending a new one if missing.
    fn upsert(&mut self, tag: &str, fill: impl FnOnce(&mut Element)) {
        let existing = self.root.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.name == tag => Some(el),
            _ => None,
        });
        match existing {
            Some(el) => fill(el),
            None => {
                let mut el = Element::new(tag);
                fill(&mut el);
                self.root.push_child(el);
            }
        }
    }

    fn remove_child(&mut self, tag: &str) {
        self.root.children.retain(|node| !is_tag(node, tag));
    }
}

fn is_tag(node: &Node, tag: &str) -> bool {
    matches!(node, Node::Element(el) if el.name == tag)
}

impl SegmentCodec for Notes {
    const TYPE_CODE: u8 = codes::NOTES;
    const NAME: &'static str = SEGMENT;

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        let doc = markup::parse(bytes, SEGMENT)?;
        if doc.root.name != "Notes" {
            return Err(SnapError::markup(
                SEGMENT,
                format!("expected <Notes>, found <{}>", doc.root.name),
            ));
        }
        for el in doc.root.elements() {
            match el.name.as_str() {
                "Created" | "LastModified" => {
                    Stamp::from_element(el)?;
                }
                "ConfirmedExperimentally" | "UseCustomMapLabel" => {
                    parse_flag(SEGMENT, &el.name, &el.text())?;
                }
                _ => {}
            }
        }
        Ok(Self {
            decl: doc.decl,
            root: doc.root,
        })
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        markup::to_bytes(&MarkupDoc {
            decl: self.decl.clone(),
            root: self.root.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = concat!(
        "<Notes>\n",
        "<UUID>d528ff2f-6579-48ab-9301-ab40df3f2505</UUID>\n",
        "<Type>Natural</Type>\n",
        "<CustomMapLabel>T7 promoter</CustomMapLabel>\n",
        "<UseCustomMapLabel>1</UseCustomMapLabel>\n",
        "<Description>&lt;html&gt;&lt;body&gt;Promoter for bacteriophage T7 RNA polymerase.&lt;/body&gt;&lt;/html&gt;</Description>\n",
        "<Created UTC=\"5:0:0\">2012.6.28</Created>\n",
        "<LastModified UTC=\"5:0:0\">2012.9.6</LastModified>\n",
        "<Organism>bacteriophage T7</Organism>\n",
        "<SequenceClass>PHG</SequenceClass>\n",
        "<TransformedInto>unspecified</TransformedInto>\n",
        "<References><Reference title=\"T7 RNA polymerase\" pubMedID=\"3537961\"/></References>\n",
        "</Notes>",
    );

    #[test]
    fn reads_fields() {
        let notes = Notes::from_bytes(NOTES.as_bytes()).unwrap();
        assert_eq!(
            notes.uuid().as_deref(),
            Some("d528ff2f-6579-48ab-9301-ab40df3f2505")
        );
        assert_eq!(notes.plasmid_type().as_deref(), Some("Natural"));
        assert_eq!(notes.custom_map_label().as_deref(), Some("T7 promoter"));
        assert_eq!(notes.use_custom_map_label(), Some(true));
        assert_eq!(
            notes.description().as_deref(),
            Some("<html><body>Promoter for bacteriophage T7 RNA polymerase.</body></html>")
        );
        assert_eq!(notes.organism().as_deref(), Some("bacteriophage T7"));
        assert_eq!(notes.sequence_class().as_deref(), Some("PHG"));
        assert_eq!(notes.transformed_into().as_deref(), Some("unspecified"));
        assert_eq!(notes.confirmed_experimentally(), None);

        let created = notes.created().unwrap();
        assert_eq!((created.year, created.month, created.day), (2012, 6, 28));
        assert_eq!(created.utc.as_deref(), Some("5:0:0"));
        assert_eq!(notes.last_modified().unwrap().month, 9);

        let refs = notes.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].pubmed_id.as_deref(), Some("3537961"));
    }

    #[test]
    fn round_trips_with_whitespace() {
        let notes = Notes::from_bytes(NOTES.as_bytes()).unwrap();
        assert_eq!(notes.to_bytes().unwrap(), NOTES.as_bytes());
    }

    #[test]
    fn builds_fields_in_insertion_order() {
        let mut notes = Notes::new();
        assert_eq!(notes.to_bytes().unwrap(), b"<Notes/>".to_vec());

        notes.set_plasmid_type(Some("Natural"));
        notes.set_description(Some("<html>"));
        notes.set_created(Some(&Stamp::new(2012, 6, 28)));
        notes.set_confirmed_experimentally(Some(true));
        assert_eq!(
            String::from_utf8(notes.to_bytes().unwrap()).unwrap(),
            concat!(
                "<Notes><Type>Natural</Type>",
                "<Description>&lt;html&gt;</Description>",
                "<Created>2012.6.28</Created>",
                "<ConfirmedExperimentally>1</ConfirmedExperimentally></Notes>",
            )
        );

        notes.set_plasmid_type(None);
        notes.set_description(None);
        notes.set_created(None);
        notes.set_confirmed_experimentally(None);
        assert_eq!(notes.to_bytes().unwrap(), b"<Notes/>".to_vec());
    }

    #[test]
    fn updates_in_place() {
        let mut notes = Notes::from_bytes(b"<Notes><Type>Natural</Type><Organism>E. coli</Organism></Notes>").unwrap();
        notes.set_plasmid_type(Some("Synthetic"));
        assert_eq!(
            notes.to_bytes().unwrap(),
            b"<Notes><Type>Synthetic</Type><Organism>E. coli</Organism></Notes>".to_vec()
        );
        assert_eq!(
            notes.field_names().collect::<Vec<_>>(),
            vec!["Type", "Organism"]
        );
    }

    #[test]
    fn replaces_references() {
        let mut notes = Notes::new();
        notes.set_references(&[Reference::new("pUC19").with_journal("Gene")]);
        assert_eq!(
            notes.to_bytes().unwrap(),
            br#"<Notes><References><Reference title="pUC19" journal="Gene"/></References></Notes>"#.to_vec()
        );
        notes.set_references(&[]);
        assert!(notes.references().is_empty());
    }

    #[test]
    fn rejects_bad_date() {
        let err = Notes::from_bytes(b"<Notes><Created>June 2012</Created></Notes>").unwrap_err();
        assert!(matches!(err, SnapError::MalformedMarkup { .. }));
    }

    #[test]
    fn rejects_bad_flag() {
        assert!(Notes::from_bytes(b"<Notes><UseCustomMapLabel>yes</UseCustomMapLabel></Notes>").is_err());
    }

    #[test]
    fn rejects_unparseable_markup() {
        assert!(Notes::from_bytes(b"<Notes><Type>Natural</Notes>").is_err());
    }
}
