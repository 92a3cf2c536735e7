//! Working memory: the run-scoped store of stuff and aliases

pub mod stuff;

pub use stuff::Stuff;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::constants::MAIN_STUFF_NAME;
use crate::content::StuffContent;
use crate::error::WorkingMemoryError;

/// Ordered map of stuff names to stuff, plus non-owning aliases.
///
/// Cloning yields an independent copy: branch memories never share content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkingMemory {
    root: IndexMap<String, Stuff>,
    aliases: IndexMap<String, String>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a memory with stuffs stored under their own names
    pub fn from_stuffs<I>(stuffs: I) -> Self
    where
        I: IntoIterator<Item = Stuff>,
    {
        let mut memory = Self::new();
        for stuff in stuffs {
            let name = stuff.name.clone();
            memory.add_new_stuff(name, stuff);
        }
        memory
    }

    /// Store `stuff` under `name`, replacing any previous entry
    pub fn add_new_stuff(&mut self, name: impl Into<String>, stuff: Stuff) {
        let name = name.into();
        if self.aliases.shift_remove(&name).is_some() {
            debug!("Stuff '{}' replaces an alias of the same name", name);
        }
        let stuff = if stuff.name == name {
            stuff
        } else {
            Stuff { name: name.clone(), ..stuff }
        };
        self.root.insert(name, stuff);
    }

    /// Store `stuff` under `name` and point the main-stuff alias at it
    pub fn set_new_main_stuff(&mut self, name: impl Into<String>, stuff: Stuff) {
        let name = name.into();
        self.add_new_stuff(name.clone(), stuff);
        if name != MAIN_STUFF_NAME {
            self.aliases.insert(MAIN_STUFF_NAME.to_string(), name);
        }
    }

    pub fn add_alias(
        &mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), WorkingMemoryError> {
        let alias = alias.into();
        let target = target.into();
        if !self.root.contains_key(&target) {
            return Err(WorkingMemoryError::AliasTargetMissing { alias, target });
        }
        if alias != target {
            self.aliases.insert(alias, target);
        }
        Ok(())
    }

    pub fn get_optional_stuff(&self, name: &str) -> Option<&Stuff> {
        self.root.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|target| self.root.get(target))
        })
    }

    pub fn get_stuff(&self, name: &str) -> Result<&Stuff, WorkingMemoryError> {
        self.get_optional_stuff(name)
            .ok_or_else(|| WorkingMemoryError::StuffNotFound(name.to_string()))
    }

    pub fn get_main_stuff(&self) -> Result<&Stuff, WorkingMemoryError> {
        self.get_optional_stuff(MAIN_STUFF_NAME)
            .ok_or(WorkingMemoryError::NoMainStuff)
    }

    /// Items of a list stuff
    pub fn get_list_items(
        &self,
        name: &str,
    ) -> Result<(&Stuff, &[StuffContent]), WorkingMemoryError> {
        let stuff = self.get_stuff(name)?;
        match stuff.content.as_list() {
            Some(items) => Ok((stuff, items)),
            None => Err(WorkingMemoryError::NotAList {
                name: name.to_string(),
                class_name: stuff.content.class_name().to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_optional_stuff(name).is_some()
    }

    /// Remove a stuff and every alias pointing at it
    pub fn remove_stuff(&mut self, name: &str) -> Option<Stuff> {
        let removed = self.root.shift_remove(name)?;
        self.aliases.retain(|_, target| target != name);
        Some(removed)
    }

    /// Names from `required` that resolve to nothing in this memory
    pub fn missing_names<'a, I>(&self, required: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        required
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn stuffs(&self) -> impl Iterator<Item = &Stuff> {
        self.root.values()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// JSON object exposing every stuff and alias by name to templates
    pub fn to_template_context(&self) -> Value {
        let mut context = Map::new();
        for (name, stuff) in &self.root {
            context.insert(name.clone(), stuff.to_json());
        }
        for (alias, target) in &self.aliases {
            if let Some(stuff) = self.root.get(target) {
                context.entry(alias.clone()).or_insert_with(|| stuff.to_json());
            }
        }
        Value::Object(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{Concept, NativeConcept};
    use std::sync::Arc;

    fn text_stuff(name: &str, text: &str) -> Stuff {
        Stuff::text(name, Arc::new(Concept::native(NativeConcept::Text)), text).unwrap()
    }

    #[test]
    fn test_later_write_replaces() {
        let mut memory = WorkingMemory::new();
        memory.add_new_stuff("a", text_stuff("a", "one"));
        memory.add_new_stuff("a", text_stuff("a", "two"));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get_stuff("a").unwrap().as_text(), Some("two"));
    }

    #[test]
    fn test_stuff_is_renamed_to_slot() {
        let mut memory = WorkingMemory::new();
        memory.add_new_stuff("slot", text_stuff("other", "x"));
        assert_eq!(memory.get_stuff("slot").unwrap().name, "slot");
    }

    #[test]
    fn test_main_stuff_alias() {
        let mut memory = WorkingMemory::new();
        assert_eq!(memory.get_main_stuff(), Err(WorkingMemoryError::NoMainStuff));
        memory.set_new_main_stuff("result", text_stuff("result", "done"));
        assert_eq!(memory.get_main_stuff().unwrap().name, "result");
        // alias is not an entry of its own
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_alias_requires_target() {
        let mut memory = WorkingMemory::new();
        assert!(matches!(
            memory.add_alias("x", "missing"),
            Err(WorkingMemoryError::AliasTargetMissing { .. })
        ));
        memory.add_new_stuff("a", text_stuff("a", "1"));
        memory.add_alias("x", "a").unwrap();
        assert_eq!(memory.get_stuff("x").unwrap().as_text(), Some("1"));

        memory.remove_stuff("a");
        assert!(memory.get_optional_stuff("x").is_none());
        assert_eq!(memory.aliases().count(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut memory = WorkingMemory::new();
        memory.add_new_stuff("a", text_stuff("a", "1"));
        let mut branch = memory.clone();
        branch.add_new_stuff("a", text_stuff("a", "2"));
        branch.add_new_stuff("b", text_stuff("b", "3"));
        assert_eq!(memory.get_stuff("a").unwrap().as_text(), Some("1"));
        assert!(!memory.contains("b"));
    }

    #[test]
    fn test_missing_names_and_context() {
        let mut memory = WorkingMemory::new();
        memory.set_new_main_stuff("input_text", text_stuff("input_text", "hi"));
        let missing = memory.missing_names(["input_text", "other", "third"]);
        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec!["other".to_string(), "third".to_string()]
        );
        let context = memory.to_template_context();
        assert_eq!(context["input_text"]["text"], "hi");
        assert_eq!(context["main_stuff"]["text"], "hi");
    }

    #[test]
    fn test_get_list_items() {
        let concept = Arc::new(Concept::native(NativeConcept::Text));
        let mut memory = WorkingMemory::new();
        memory.add_new_stuff(
            "items",
            Stuff::new(
                "items",
                Arc::clone(&concept),
                StuffContent::list(vec![StuffContent::text("a")]),
            )
            .unwrap(),
        );
        memory.add_new_stuff("single", text_stuff("single", "x"));
        assert_eq!(memory.get_list_items("items").unwrap().1.len(), 1);
        assert!(matches!(
            memory.get_list_items("single"),
            Err(WorkingMemoryError::NotAList { .. })
        ));
    }
}
