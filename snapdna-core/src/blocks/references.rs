use crate::markup::Element;

/// A bibliographic entry from the notes' `<References>` list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reference {
    pub title: Option<String>,
    pub pubmed_id: Option<String>,
    pub journal: Option<String>,
    pub authors: Option<String>,
    extra_attrs: Vec<(String, String)>,
}

impl Reference {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    pub fn with_pubmed_id(mut self, pubmed_id: impl Into<String>) -> Self {
        self.pubmed_id = Some(pubmed_id.into());
        self
    }

    pub(crate) fn from_element(el: &Element) -> Self {
        let mut reference = Self::default();
        for (key, value) in &el.attrs {
            let slot = match key.as_str() {
                "title" => &mut reference.title,
                "pubMedID" => &mut reference.pubmed_id,
                "journal" => &mut reference.journal,
                "authors" => &mut reference.authors,
                _ => {
                    reference.extra_attrs.push((key.clone(), value.clone()));
                    continue;
                }
            };
            *slot = Some(value.clone());
        }
        reference
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut el = Element::new("Reference");
        let known = [
            ("title", &self.title),
            ("pubMedID", &self.pubmed_id),
            ("journal", &self.journal),
            ("authors", &self.authors),
        ];
        for (key, value) in known {
            if let Some(value) = value {
                el.push_attr(key, value.as_str());
            }
        }
        el.attrs.extend(self.extra_attrs.iter().cloned());
        el
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    #[test]
    fn reads_reference_attributes() {
        let doc = markup::parse(
            br#"<Reference title="Cloning vectors" pubMedID="2985470" journal="Gene 33:103" authors="Yanisch-Perron C" volume="33"/>"#,
            "notes",
        )
        .unwrap();
        let reference = Reference::from_element(&doc.root);
        assert_eq!(reference.title.as_deref(), Some("Cloning vectors"));
        assert_eq!(reference.pubmed_id.as_deref(), Some("2985470"));
        assert_eq!(reference.journal.as_deref(), Some("Gene 33:103"));
        assert_eq!(reference.authors.as_deref(), Some("Yanisch-Perron C"));
        assert_eq!(reference.to_element(), doc.root);
    }

    #[test]
    fn builder_skips_missing_fields() {
        let el = Reference::new("A title").with_pubmed_id("42").to_element();
        assert_eq!(
            el.attrs,
            vec![
                ("title".to_string(), "A title".to_string()),
                ("pubMedID".to_string(), "42".to_string()),
            ]
        );
    }
}
