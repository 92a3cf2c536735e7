//! Concept type system: typed shapes flowing between pipes

pub mod blueprint;
pub mod library;
pub mod native;
pub mod structure;

pub use blueprint::{ConceptBlueprint, StructureBlueprint};
pub use library::ConceptLibrary;
pub use native::NativeConcept;
pub use structure::{FieldType, StructureClass, StructureRegistry};

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::config::constants::NATIVE_DOMAIN;
use crate::content::StuffContent;
use crate::error::ConceptError;

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid domain regex"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid concept code regex"));

pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_RE.is_match(domain)
}

pub fn is_valid_concept_code(code: &str) -> bool {
    CODE_RE.is_match(code)
}

/// A parsed `domain.Code` or bare `Code` reference
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConceptRef {
    pub domain: Option<String>,
    pub code: String,
}

impl ConceptRef {
    pub fn parse(raw: &str) -> Result<Self, ConceptError> {
        let raw = raw.trim();
        let (domain, code) = match raw.rsplit_once('.') {
            Some((domain, code)) => (Some(domain), code),
            None => (None, raw),
        };
        if let Some(domain) = domain {
            if !is_valid_domain(domain) {
                return Err(ConceptError::definition(
                    raw,
                    format!("domain '{domain}' must be snake_case"),
                ));
            }
        }
        if !is_valid_concept_code(code) {
            return Err(ConceptError::definition(
                raw,
                format!("code '{code}' must be PascalCase"),
            ));
        }
        Ok(Self {
            domain: domain.map(str::to_string),
            code: code.to_string(),
        })
    }
}

impl fmt::Display for ConceptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{domain}.{}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// An immutable concept definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Concept {
    pub domain: String,
    pub code: String,
    pub definition: String,
    pub structure_class_name: String,
    pub refines: Option<NativeConcept>,
}

impl Concept {
    pub fn new(
        domain: impl Into<String>,
        code: impl Into<String>,
        definition: impl Into<String>,
        structure_class_name: impl Into<String>,
        refines: Option<NativeConcept>,
    ) -> Result<Self, ConceptError> {
        let domain = domain.into();
        let code = code.into();
        let concept_ref = format!("{domain}.{code}");
        if !is_valid_domain(&domain) {
            return Err(ConceptError::definition(
                concept_ref,
                "domain must be snake_case",
            ));
        }
        if !is_valid_concept_code(&code) {
            return Err(ConceptError::definition(concept_ref, "code must be PascalCase"));
        }
        if domain == NATIVE_DOMAIN {
            return Err(ConceptError::definition(
                concept_ref,
                "the native domain is reserved",
            ));
        }
        Ok(Self {
            domain,
            code,
            definition: definition.into(),
            structure_class_name: structure_class_name.into(),
            refines,
        })
    }

    pub fn native(native: NativeConcept) -> Self {
        Self {
            domain: NATIVE_DOMAIN.to_string(),
            code: native.code().to_string(),
            definition: native.definition().to_string(),
            structure_class_name: native.structure_class_name().to_string(),
            refines: None,
        }
    }

    /// Fully qualified `domain.Code`
    pub fn concept_string(&self) -> String {
        format!("{}.{}", self.domain, self.code)
    }

    pub fn native_kind(&self) -> Option<NativeConcept> {
        if self.domain == NATIVE_DOMAIN {
            NativeConcept::from_code(&self.code)
        } else {
            None
        }
    }

    pub fn is_native(&self) -> bool {
        self.native_kind().is_some()
    }

    pub fn accepts_any_content(&self) -> bool {
        self.native_kind().is_some_and(|native| native.is_open())
    }

    /// Whether a single (non-list) content instantiates this concept's structure
    pub fn accepts_content(&self, content: &StuffContent) -> bool {
        self.accepts_any_content() || content.class_name() == self.structure_class_name
    }

    fn same_identity(&self, other: &Concept) -> bool {
        self.domain == other.domain && self.code == other.code
    }

    fn refines_directly(&self, other: &Concept) -> bool {
        self.refines.is_some() && self.refines == other.native_kind()
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.code)
    }
}

/// Whether data of concept `tested` may flow where `wanted` is expected.
///
/// Strict mode only accepts identity or a direct refinement edge. Non-strict
/// mode also accepts siblings refining the same native concept, and lets
/// `native.Anything` accept everything.
pub fn is_compatible(tested: &Concept, wanted: &Concept, strict: bool) -> bool {
    if tested.same_identity(wanted) {
        return true;
    }
    if tested.refines_directly(wanted) || wanted.refines_directly(tested) {
        return true;
    }
    if strict {
        return false;
    }
    if wanted.native_kind() == Some(NativeConcept::Anything) {
        return true;
    }
    tested.refines.is_some() && tested.refines == wanted.refines
}
