//! Declarative concept definitions as consumed from a bundle

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::structure::FieldType;

/// A concept as written in a bundle: either a bare definition or the full form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConceptBlueprint {
    Definition(String),
    Full {
        definition: String,
        #[serde(default)]
        structure: Option<StructureBlueprint>,
        #[serde(default)]
        refines: Option<String>,
    },
}

impl ConceptBlueprint {
    pub fn definition(&self) -> &str {
        match self {
            Self::Definition(definition) | Self::Full { definition, .. } => definition,
        }
    }
}

/// Either a reference to a registered structure class or inline fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureBlueprint {
    ClassName(String),
    Fields(IndexMap<String, FieldType>),
}
