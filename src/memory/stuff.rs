//! Stuff: a named, typed value held in working memory

use serde_json::Value;
use std::sync::Arc;

use crate::concept::Concept;
use crate::content::StuffContent;
use crate::error::ConceptError;

#[derive(Clone, Debug, PartialEq)]
pub struct Stuff {
    pub name: String,
    pub concept: Arc<Concept>,
    pub content: StuffContent,
}

impl Stuff {
    /// Create a stuff, checking the content against the concept's structure.
    /// List content holds several items of the concept.
    pub fn new(
        name: impl Into<String>,
        concept: Arc<Concept>,
        content: StuffContent,
    ) -> Result<Self, ConceptError> {
        check_content(&concept, &content)?;
        Ok(Self {
            name: name.into(),
            concept,
            content,
        })
    }

    pub fn text(
        name: impl Into<String>,
        concept: Arc<Concept>,
        text: impl Into<String>,
    ) -> Result<Self, ConceptError> {
        Self::new(name, concept, StuffContent::text(text))
    }

    pub fn is_list(&self) -> bool {
        self.content.is_list()
    }

    pub fn as_text(&self) -> Option<&str> {
        self.content.as_text()
    }

    pub fn to_json(&self) -> Value {
        self.content.to_json()
    }
}

fn check_content(concept: &Concept, content: &StuffContent) -> Result<(), ConceptError> {
    let mismatch = |found: &StuffContent| ConceptError::ContentMismatch {
        concept: concept.concept_string(),
        expected: concept.structure_class_name.clone(),
        found: found.class_name().to_string(),
    };
    match content {
        StuffContent::List(list) if !concept.accepts_any_content() => {
            for item in &list.items {
                if item.is_list() || !concept.accepts_content(item) {
                    return Err(mismatch(item));
                }
            }
            Ok(())
        }
        single if concept.accepts_content(single) => Ok(()),
        single => Err(mismatch(single)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::NativeConcept;

    #[test]
    fn test_content_must_match_structure() {
        let text = Arc::new(Concept::native(NativeConcept::Text));
        assert!(Stuff::text("a", Arc::clone(&text), "hello").is_ok());
        assert!(matches!(
            Stuff::new("a", Arc::clone(&text), StuffContent::number(1.0)),
            Err(ConceptError::ContentMismatch { .. })
        ));
    }

    #[test]
    fn test_list_items_checked() {
        let text = Arc::new(Concept::native(NativeConcept::Text));
        let ok = StuffContent::list(vec![StuffContent::text("a"), StuffContent::text("b")]);
        assert!(Stuff::new("items", Arc::clone(&text), ok).is_ok());
        let bad = StuffContent::list(vec![StuffContent::text("a"), StuffContent::image("x.png")]);
        assert!(Stuff::new("items", text, bad).is_err());
    }

    #[test]
    fn test_anything_accepts_all() {
        let anything = Arc::new(Concept::native(NativeConcept::Anything));
        assert!(Stuff::new("x", Arc::clone(&anything), StuffContent::number(3.0)).is_ok());
        assert!(Stuff::new("x", anything, StuffContent::list(vec![])).is_ok());
    }
}
