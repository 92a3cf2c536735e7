//! Declared pipe inputs

use indexmap::IndexMap;
use std::sync::Arc;

use super::multiplicity::Multiplicity;
use crate::concept::Concept;

#[derive(Clone, Debug, PartialEq)]
pub struct InputRequirement {
    pub concept: Arc<Concept>,
    pub multiplicity: Option<Multiplicity>,
}

impl InputRequirement {
    pub fn single(concept: Arc<Concept>) -> Self {
        Self {
            concept,
            multiplicity: None,
        }
    }

    pub fn list(concept: Arc<Concept>) -> Self {
        Self {
            concept,
            multiplicity: Some(Multiplicity::Flag(true)),
        }
    }

    pub fn is_list(&self) -> bool {
        self.multiplicity.is_some_and(|m| m.is_truthy())
    }
}

/// Ordered input name to requirement map
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipeInputs {
    requirements: IndexMap<String, InputRequirement>,
}

impl PipeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, requirement: InputRequirement) -> Self {
        self.insert(name, requirement);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, requirement: InputRequirement) {
        self.requirements.insert(name.into(), requirement);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requirements.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputRequirement)> {
        self.requirements.iter().map(|(name, req)| (name.as_str(), req))
    }

    /// The only declared input, if there is exactly one
    pub fn sole(&self) -> Option<(&str, &InputRequirement)> {
        match self.requirements.len() {
            1 => self.iter().next(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
