use indexmap::IndexMap;

use crate::blocks::{flag_str, parse_attr, parse_flag, SegmentCodec};
use crate::container::codes;
use crate::error::{SnapError, SnapResult};
use crate::markup::{self, Element, MarkupDoc, Node};

const SEGMENT: &str = "features";

/// Qualifier name to values. Names are unique; insertion order is kept.
pub type Qualifiers = IndexMap<String, Vec<QualifierValue>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Directionality {
    #[default]
    None,
    Forward,
    Backward,
    Bidirectional,
}

impl Directionality {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Directionality::None),
            1 => Some(Directionality::Forward),
            2 => Some(Directionality::Backward),
            3 => Some(Directionality::Bidirectional),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Directionality::None => 0,
            Directionality::Forward => 1,
            Directionality::Backward => 2,
            Directionality::Bidirectional => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Directionality::None => "none",
            Directionality::Forward => "forward",
            Directionality::Backward => "backward",
            Directionality::Bidirectional => "bidirectional",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Directionality::None),
            "forward" => Some(Directionality::Forward),
            "backward" => Some(Directionality::Backward),
            "bidirectional" => Some(Directionality::Bidirectional),
            _ => None,
        }
    }
}

/// One `<V>` entry of a qualifier. Text values are HTML strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QualifierValue {
    Int(i64),
    Text(String),
    /// A `<V>` shape other than a single `text` or `int` attribute.
    Raw(Element),
}

impl QualifierValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QualifierValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn from_element(el: &Element) -> Self {
        if !el.children.is_empty() {
            return QualifierValue::Raw(el.clone());
        }
        match el.attrs.as_slice() {
            [] => QualifierValue::Text(String::new()),
            [(key, value)] if key == "text" => QualifierValue::Text(value.clone()),
            [(key, value)] if key == "int" => match value.parse() {
                Ok(int) => QualifierValue::Int(int),
                Err(_) => QualifierValue::Raw(el.clone()),
            },
            _ => QualifierValue::Raw(el.clone()),
        }
    }

    fn to_element(&self) -> Element {
        match self {
            QualifierValue::Int(int) => {
                let mut el = Element::new("V");
                el.push_attr("int", int.to_string());
                el
            }
            QualifierValue::Text(text) if text.is_empty() => Element::new("V"),
            QualifierValue::Text(text) => {
                let mut el = Element::new("V");
                el.push_attr("text", text.as_str());
                el
            }
            QualifierValue::Raw(el) => el.clone(),
        }
    }
}

impl From<&str> for QualifierValue {
    fn from(text: &str) -> Self {
        QualifierValue::Text(text.to_string())
    }
}

impl From<String> for QualifierValue {
    fn from(text: String) -> Self {
        QualifierValue::Text(text)
    }
}

impl From<i64> for QualifierValue {
    fn from(int: i64) -> Self {
        QualifierValue::Int(int)
    }
}

/// A positioned part of a feature. `start` and `end` are 1-based and
/// inclusive, as stored in the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSegment {
    pub name: Option<String>,
    pub start: usize,
    pub end: usize,
    pub color: Option<String>,
    pub segment_type: Option<String>,
    pub translated: Option<bool>,
    extra_attrs: Vec<(String, String)>,
}

impl FeatureSegment {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// The range as a 0-based half-open interval.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start.saturating_sub(1)..self.end
    }

    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The same segment moved so that position `anchor` lands on `to`.
    /// Positions left of the new origin clamp to 0.
    pub fn rebased(&self, anchor: usize, to: usize) -> Self {
        let mut out = self.clone();
        out.start = (self.start + to).saturating_sub(anchor);
        out.end = (self.end + to).saturating_sub(anchor);
        out
    }

    fn from_element(el: &Element) -> SnapResult<Self> {
        let mut seg = Self::default();
        let mut has_range = false;
        for (key, value) in &el.attrs {
            match key.as_str() {
                "name" => seg.name = Some(value.clone()),
                "range" => {
                    let (start, end) = value.split_once('-').ok_or_else(|| {
                        SnapError::markup(SEGMENT, format!("invalid range '{value}'"))
                    })?;
                    seg.start = parse_attr(SEGMENT, key, start)?;
                    seg.end = parse_attr(SEGMENT, key, end)?;
                    has_range = true;
                }
                "color" => seg.color = Some(value.clone()),
                "type" => seg.segment_type = Some(value.clone()),
                "translated" => seg.translated = Some(parse_flag(SEGMENT, key, value)?),
                _ => seg.extra_attrs.push((key.clone(), value.clone())),
            }
        }
        if !has_range {
            return Err(SnapError::markup(SEGMENT, "segment without a range"));
        }
        Ok(seg)
    }

    fn to_element(&self) -> Element {
        let mut el = Element::new("Segment");
        if let Some(name) = &self.name {
            el.push_attr("name", name.as_str());
        }
        el.push_attr("range", format!("{}-{}", self.start, self.end));
        if let Some(color) = &self.color {
            el.push_attr("color", color.as_str());
        }
        if let Some(segment_type) = &self.segment_type {
            el.push_attr("type", segment_type.as_str());
        }
        if let Some(translated) = self.translated {
            el.push_attr("translated", flag_str(translated));
        }
        el.attrs.extend(self.extra_attrs.iter().cloned());
        el
    }
}

/// A named, typed annotation. Its position lives entirely in `segments`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    pub id: Option<u32>,
    pub name: String,
    pub feature_type: String,
    pub directionality: Directionality,
    pub reading_frame: Option<i8>,
    pub genetic_code: Option<u32>,
    pub translate_first_codon_as_met: Option<bool>,
    pub hits_stop_codon: Option<bool>,
    pub segments: Vec<FeatureSegment>,
    pub qualifiers: Qualifiers,
    extra_attrs: Vec<(String, String)>,
    extra_children: Vec<Node>,
}

impl Feature {
    pub fn new(name: impl Into<String>, feature_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature_type: feature_type.into(),
            ..Self::default()
        }
    }

    pub fn with_directionality(mut self, directionality: Directionality) -> Self {
        self.directionality = directionality;
        self
    }

    pub fn with_segment(mut self, segment: FeatureSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn with_qualifier(mut self, name: impl Into<String>, value: impl Into<QualifierValue>) -> Self {
        self.set_qualifier(name, value);
        self
    }

    /// Replace every value of qualifier `name` with `value`.
    pub fn set_qualifier(&mut self, name: impl Into<String>, value: impl Into<QualifierValue>) {
        self.qualifiers.insert(name.into(), vec![value.into()]);
    }

    /// First text value of qualifier `name`.
    pub fn qualifier_text(&self, name: &str) -> Option<&str> {
        self.qualifiers
            .get(name)?
            .iter()
            .find_map(QualifierValue::as_text)
    }

    /// Overall extent from the lowest start to the highest end.
    pub fn extent(&self) -> Option<(usize, usize)> {
        let start = self.segments.iter().map(|s| s.start).min()?;
        let end = self.segments.iter().map(|s| s.end).max()?;
        Some((start, end))
    }

    fn from_element(el: &Element) -> SnapResult<Self> {
        let mut feature = Self::default();
        for (key, value) in &el.attrs {
            match key.as_str() {
                "recentID" => feature.id = Some(parse_attr(SEGMENT, key, value)?),
                "name" => feature.name = value.clone(),
                "type" => feature.feature_type = value.clone(),
                "directionality" => {
                    let code = parse_attr(SEGMENT, key, value)?;
                    feature.directionality = Directionality::from_code(code).ok_or_else(|| {
                        SnapError::markup(SEGMENT, format!("unknown directionality '{value}'"))
                    })?;
                }
                "readingFrame" => feature.reading_frame = Some(parse_attr(SEGMENT, key, value)?),
                "geneticCode" => feature.genetic_code = Some(parse_attr(SEGMENT, key, value)?),
                "translateFirstCodonAsMet" => {
                    feature.translate_first_codon_as_met = Some(parse_flag(SEGMENT, key, value)?)
                }
                "hitsStopCodon" => feature.hits_stop_codon = Some(parse_flag(SEGMENT, key, value)?),
                _ => feature.extra_attrs.push((key.clone(), value.clone())),
            }
        }

        for node in &el.children {
            match node {
                Node::Element(child) if child.name == "Segment" => {
                    feature.segments.push(FeatureSegment::from_element(child)?);
                }
                Node::Element(child) if is_plain_qualifier(child) => {
                    feature.push_qualifier(child);
                }
                Node::Text(text) if text.trim().is_empty() => {}
                other => feature.extra_children.push(other.clone()),
            }
        }
        Ok(feature)
    }

    fn push_qualifier(&mut self, q: &Element) {
        let name = q.attr("name").unwrap_or_default();
        let values = q.elements().map(QualifierValue::from_element);
        match self.qualifiers.get_mut(name) {
            Some(existing) => {
                tracing::warn!(feature = %self.name, qualifier = name, "merging duplicate qualifier");
                existing.extend(values);
            }
            None => {
                self.qualifiers.insert(name.to_string(), values.collect());
            }
        }
    }

    fn to_element(&self) -> Element {
        let mut el = Element::new("Feature");
        if let Some(id) = self.id {
            el.push_attr("recentID", id.to_string());
        }
        el.push_attr("name", self.name.as_str());
        if self.directionality != Directionality::None {
            el.push_attr("directionality", self.directionality.code().to_string());
        }
        if let Some(frame) = self.reading_frame {
            el.push_attr("readingFrame", frame.to_string());
        }
        el.push_attr("type", self.feature_type.as_str());
        if let Some(code) = self.genetic_code {
            el.push_attr("geneticCode", code.to_string());
        }
        if let Some(met) = self.translate_first_codon_as_met {
            el.push_attr("translateFirstCodonAsMet", flag_str(met));
        }
        if let Some(stop) = self.hits_stop_codon {
            el.push_attr("hitsStopCodon", flag_str(stop));
        }
        el.attrs.extend(self.extra_attrs.iter().cloned());

        for segment in &self.segments {
            el.push_child(segment.to_element());
        }
        for (name, values) in &self.qualifiers {
            let mut q = Element::new("Q");
            q.push_attr("name", name.as_str());
            for value in values {
                q.push_child(value.to_element());
            }
            el.push_child(q);
        }
        el.children.extend(self.extra_children.iter().cloned());
        el
    }
}

/// `<Q name="..">` holding only `<V>` children.
fn is_plain_qualifier(el: &Element) -> bool {
    el.name == "Q"
        && matches!(el.attrs.as_slice(), [(key, _)] if key == "name")
        && el.children.iter().all(|node| match node {
            Node::Element(child) => child.name == "V",
            Node::Text(_) => false,
        })
}

/// The feature table segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureTable {
    pub features: Vec<Feature>,
    pub recycled_ids: Option<String>,
    decl: Option<String>,
    extra_attrs: Vec<(String, String)>,
    extra_children: Vec<Node>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The id the next added feature should get.
    pub fn next_id(&self) -> u32 {
        let past_max = self
            .features
            .iter()
            .filter_map(|f| f.id)
            .max()
            .map_or(0, |id| id + 1);
        past_max.max(self.features.len() as u32)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.name == name)
    }

    /// Append `feature`, giving it the next free id.
    pub fn push(&mut self, mut feature: Feature) -> u32 {
        let id = self.next_id();
        feature.id = Some(id);
        self.features.push(feature);
        id
    }

    /// Drop every feature called `name` and renumber the rest from zero.
    /// Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.features.len();
        self.features.retain(|f| f.name != name);
        let removed = before - self.features.len();
        if removed > 0 {
            self.renumber();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    fn renumber(&mut self) {
        for (id, feature) in self.features.iter_mut().enumerate() {
            feature.id = Some(id as u32);
        }
    }
}

impl SegmentCodec for FeatureTable {
    const TYPE_CODE: u8 = codes::FEATURES;
    const NAME: &'static str = SEGMENT;

    fn from_bytes(bytes: &[u8]) -> SnapResult<Self> {
        let doc = markup::parse(bytes, SEGMENT)?;
        if doc.root.name != "Features" {
            return Err(SnapError::markup(
                SEGMENT,
                format!("expected <Features>, found <{}>", doc.root.name),
            ));
        }

        let mut table = Self {
            decl: doc.decl,
            ..Self::default()
        };
        for (key, value) in &doc.root.attrs {
            match key.as_str() {
                "nextValidID" => {}
                "recycledIDs" => table.recycled_ids = Some(value.clone()),
                _ => table.extra_attrs.push((key.clone(), value.clone())),
            }
        }
        for node in &doc.root.children {
            match node {
                Node::Element(child) if child.name == "Feature" => {
                    table.features.push(Feature::from_element(child)?);
                }
                Node::Text(text) if text.trim().is_empty() => {}
                other => table.extra_children.push(other.clone()),
            }
        }
        Ok(table)
    }

    fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        let mut root = Element::new("Features");
        root.push_attr("nextValidID", self.next_id().to_string());
        if let Some(recycled) = &self.recycled_ids {
            root.push_attr("recycledIDs", recycled.as_str());
        }
        root.attrs.extend(self.extra_attrs.iter().cloned());
        for feature in &self.features {
            root.push_child(feature.to_element());
        }
        root.children.extend(self.extra_children.iter().cloned());

        markup::to_bytes(&MarkupDoc {
            decl: self.decl.clone(),
            root,
        })
    }
}
