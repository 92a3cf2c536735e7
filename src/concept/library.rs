//! Concept library: registry of concepts and their structure classes

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use super::blueprint::{ConceptBlueprint, StructureBlueprint};
use super::native::NativeConcept;
use super::structure::{StructureClass, StructureRegistry};
use super::{Concept, ConceptRef, is_compatible};
use crate::config::constants::NATIVE_DOMAIN;
use crate::content::TEXT_CLASS;
use crate::error::ConceptError;

#[derive(Clone, Debug)]
pub struct ConceptLibrary {
    concepts: IndexMap<String, Arc<Concept>>,
    structures: StructureRegistry,
}

impl ConceptLibrary {
    /// A library holding only the native concepts
    pub fn new() -> Self {
        let concepts = NativeConcept::ALL
            .into_iter()
            .map(|native| {
                let concept = Concept::native(native);
                (concept.concept_string(), Arc::new(concept))
            })
            .collect();
        Self {
            concepts,
            structures: StructureRegistry::new(),
        }
    }

    pub fn add(&mut self, concept: Concept) -> Result<Arc<Concept>, ConceptError> {
        let key = concept.concept_string();
        if self.concepts.contains_key(&key) {
            return Err(ConceptError::Duplicate {
                domain: concept.domain,
                code: concept.code,
            });
        }
        if !concept.accepts_any_content()
            && !self.structures.contains(&concept.structure_class_name)
        {
            return Err(ConceptError::StructureNotFound {
                class_name: concept.structure_class_name,
            });
        }
        debug!("Registering concept '{}'", key);
        let concept = Arc::new(concept);
        self.concepts.insert(key, Arc::clone(&concept));
        Ok(concept)
    }

    /// Resolve a concept reference. Bare codes resolve to a native concept when
    /// built-in, otherwise to the only concept carrying that code.
    pub fn get_required(&self, concept_ref: &str) -> Result<Arc<Concept>, ConceptError> {
        let parsed = ConceptRef::parse(concept_ref)?;
        match &parsed.domain {
            Some(domain) => self.lookup(domain, &parsed.code),
            None => {
                if let Some(native) = NativeConcept::from_code(&parsed.code) {
                    return self.lookup(NATIVE_DOMAIN, native.code());
                }
                let mut matches = self
                    .concepts
                    .values()
                    .filter(|concept| concept.code == parsed.code);
                match (matches.next(), matches.next()) {
                    (Some(concept), None) => Ok(Arc::clone(concept)),
                    _ => Err(ConceptError::not_found(concept_ref)),
                }
            }
        }
    }

    /// Resolve a reference written inside `domain`: bare non-native codes
    /// refer to that domain's implicit concept.
    pub fn get_required_in_domain(
        &self,
        concept_ref: &str,
        domain: &str,
    ) -> Result<Arc<Concept>, ConceptError> {
        let parsed = ConceptRef::parse(concept_ref)?;
        match parsed.domain {
            Some(_) => self.get_required(concept_ref),
            None => match NativeConcept::from_code(&parsed.code) {
                Some(native) => self.lookup(NATIVE_DOMAIN, native.code()),
                None => self.lookup(domain, &parsed.code),
            },
        }
    }

    pub fn get_native(&self, native: NativeConcept) -> Arc<Concept> {
        self.lookup(NATIVE_DOMAIN, native.code())
            .unwrap_or_else(|_| Arc::new(Concept::native(native)))
    }

    fn lookup(&self, domain: &str, code: &str) -> Result<Arc<Concept>, ConceptError> {
        self.concepts
            .get(&format!("{domain}.{code}"))
            .cloned()
            .ok_or_else(|| ConceptError::not_found(format!("{domain}.{code}")))
    }

    pub fn is_compatible(&self, tested: &Concept, wanted: &Concept, strict: bool) -> bool {
        is_compatible(tested, wanted, strict)
    }

    /// Whether inputs of this concept must be attached as images rather than text
    pub fn is_image_like(&self, concept: &Concept) -> Result<bool, ConceptError> {
        if concept.accepts_any_content() {
            return Ok(false);
        }
        self.structures.is_image_like(&concept.structure_class_name)
    }

    pub fn structures(&self) -> &StructureRegistry {
        &self.structures
    }

    pub fn register_structure(&mut self, class: StructureClass) {
        self.structures.register(class);
    }

    /// Load every concept of one bundle domain. Inline structures are
    /// registered first so concepts may reference each other in any order.
    pub fn load_blueprints(
        &mut self,
        domain: &str,
        blueprints: &IndexMap<String, ConceptBlueprint>,
    ) -> Result<Vec<Arc<Concept>>, ConceptError> {
        for (code, blueprint) in blueprints {
            if let ConceptBlueprint::Full {
                structure: Some(StructureBlueprint::Fields(fields)),
                ..
            } = blueprint
            {
                self.structures
                    .register(StructureClass::new(code.clone(), fields.clone()));
            }
        }
        blueprints
            .iter()
            .map(|(code, blueprint)| {
                let concept = self.concept_from_blueprint(domain, code, blueprint)?;
                self.add(concept)
            })
            .collect()
    }

    fn concept_from_blueprint(
        &self,
        domain: &str,
        code: &str,
        blueprint: &ConceptBlueprint,
    ) -> Result<Concept, ConceptError> {
        let concept_ref = format!("{domain}.{code}");
        let (definition, structure, refines) = match blueprint {
            ConceptBlueprint::Definition(definition) => {
                return Concept::new(
                    domain,
                    code,
                    definition.clone(),
                    TEXT_CLASS,
                    Some(NativeConcept::Text),
                );
            }
            ConceptBlueprint::Full {
                definition,
                structure,
                refines,
            } => (definition, structure, refines),
        };

        let refines = match refines {
            Some(raw) => {
                let parsed = ConceptRef::parse(raw)?;
                let is_native_domain = parsed
                    .domain
                    .as_deref()
                    .is_none_or(|d| d == NATIVE_DOMAIN);
                match NativeConcept::from_code(&parsed.code) {
                    Some(native) if is_native_domain => Some(native),
                    _ => {
                        return Err(ConceptError::definition(
                            concept_ref,
                            format!("can only refine a native concept, not '{raw}'"),
                        ));
                    }
                }
            }
            None => None,
        };

        let structure_class_name = match structure {
            Some(StructureBlueprint::Fields(_)) => code.to_string(),
            Some(StructureBlueprint::ClassName(name)) => name.clone(),
            None => refines
                .map(|native| native.structure_class_name())
                .unwrap_or(TEXT_CLASS)
                .to_string(),
        };

        // a concept with neither structure nor refinement is an implicit text concept
        let refines = match (refines, structure) {
            (None, None) => Some(NativeConcept::Text),
            (refines, _) => refines,
        };

        if let Some(native) = refines {
            if !native.is_open() && native.structure_class_name() != structure_class_name {
                return Err(ConceptError::definition(
                    concept_ref,
                    format!(
                        "refines '{}' but declares structure '{}'",
                        native.code(),
                        structure_class_name
                    ),
                ));
            }
        }

        Concept::new(
            domain,
            code,
            definition.clone(),
            structure_class_name,
            refines,
        )
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Concept>> {
        self.concepts.values()
    }
}

impl Default for ConceptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::FieldType;

    #[test]
    fn test_seeded_with_natives() {
        let library = ConceptLibrary::new();
        assert_eq!(library.len(), NativeConcept::ALL.len());
        let text = library.get_required("Text").unwrap();
        assert_eq!(text.concept_string(), "native.Text");
        assert!(library.get_required("native.Image").is_ok());
    }

    #[test]
    fn test_not_found_and_duplicate() {
        let mut library = ConceptLibrary::new();
        assert!(matches!(
            library.get_required("legal.Contract"),
            Err(ConceptError::NotFound { .. })
        ));

        let contract = Concept::new("legal", "Contract", "", "TextContent", None).unwrap();
        library.add(contract.clone()).unwrap();
        assert!(matches!(
            library.add(contract),
            Err(ConceptError::Duplicate { .. })
        ));
        assert!(library.get_required("Contract").is_ok());
        assert!(library.get_required_in_domain("Contract", "legal").is_ok());
        assert!(library.get_required_in_domain("Contract", "finance").is_err());
    }

    #[test]
    fn test_ambiguous_bare_code_is_not_found() {
        let mut library = ConceptLibrary::new();
        library
            .add(Concept::new("legal", "Summary", "", "TextContent", None).unwrap())
            .unwrap();
        library
            .add(Concept::new("finance", "Summary", "", "TextContent", None).unwrap())
            .unwrap();
        assert!(library.get_required("Summary").is_err());
        assert!(library.get_required("finance.Summary").is_ok());
    }

    #[test]
    fn test_load_blueprints() {
        let mut library = ConceptLibrary::new();
        let blueprints: IndexMap<String, ConceptBlueprint> = serde_json::from_str(
            r#"{
                "Contract": "A legal contract",
                "Scan": {"definition": "A scanned page", "refines": "Image"},
                "Invoice": {
                    "definition": "An invoice",
                    "structure": {"total": "number", "attachment": "Scan2"}
                },
                "Scan2": {"definition": "scan holder", "structure": {"image": "image"}}
            }"#,
        )
        .unwrap();
        let loaded = library.load_blueprints("finance", &blueprints).unwrap();
        assert_eq!(loaded.len(), 4);

        let contract = library.get_required("finance.Contract").unwrap();
        assert_eq!(contract.refines, Some(NativeConcept::Text));
        let scan = library.get_required("finance.Scan").unwrap();
        assert_eq!(scan.structure_class_name, "ImageContent");
        let invoice = library.get_required("finance.Invoice").unwrap();
        assert_eq!(invoice.structure_class_name, "Invoice");
        assert_eq!(invoice.refines, None);
        assert_eq!(library.is_image_like(&invoice), Ok(true));
        assert_eq!(
            library.structures().get("Invoice").unwrap().fields["total"],
            FieldType::Number
        );
    }

    #[test]
    fn test_refining_non_native_is_rejected() {
        let mut library = ConceptLibrary::new();
        let blueprints: IndexMap<String, ConceptBlueprint> = serde_json::from_str(
            r#"{"Clause": {"definition": "x", "refines": "legal.Contract"}}"#,
        )
        .unwrap();
        assert!(matches!(
            library.load_blueprints("legal", &blueprints),
            Err(ConceptError::Definition { .. })
        ));
    }
}
