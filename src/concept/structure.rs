//! Structure classes describing the shape of concept content

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::{
    ANYTHING_CLASS, DYNAMIC_CLASS, HTML_CLASS, IMAGE_CLASS, NUMBER_CLASS, PAGE_CLASS, PDF_CLASS,
    TEXT_AND_IMAGES_CLASS, TEXT_CLASS,
};
use crate::error::ConceptError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Image,
    List(Box<FieldType>),
    Optional(Box<FieldType>),
    Record(String),
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let wrapped = |prefix: &str| {
            raw.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(']'))
                .map(str::trim)
        };
        if let Some(inner) = wrapped("list[") {
            return Ok(Self::List(Box::new(inner.parse()?)));
        }
        if let Some(inner) = wrapped("optional[") {
            return Ok(Self::Optional(Box::new(inner.parse()?)));
        }
        match raw {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            "image" => Ok(Self::Image),
            class if class.starts_with(|c: char| c.is_ascii_uppercase())
                && class.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Ok(Self::Record(class.to_string()))
            }
            other => Err(format!("unknown field type '{other}'")),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
            Self::Image => write!(f, "image"),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
            Self::Record(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureClass {
    pub name: String,
    pub fields: IndexMap<String, FieldType>,
}

impl StructureClass {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(field, ty)| (field.into(), ty))
                .collect(),
        }
    }
}

/// Registry of structure classes, seeded with the native content classes
#[derive(Clone, Debug)]
pub struct StructureRegistry {
    classes: IndexMap<String, StructureClass>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            classes: IndexMap::new(),
        };
        let boxed = |ty: FieldType| Box::new(ty);
        registry.register(StructureClass::new(TEXT_CLASS, [("text", FieldType::Text)]));
        registry.register(StructureClass::new(
            NUMBER_CLASS,
            [("number", FieldType::Number)],
        ));
        registry.register(StructureClass::new(
            IMAGE_CLASS,
            [
                ("url", FieldType::Text),
                ("caption", FieldType::Optional(boxed(FieldType::Text))),
            ],
        ));
        registry.register(StructureClass::new(PDF_CLASS, [("url", FieldType::Text)]));
        registry.register(StructureClass::new(
            TEXT_AND_IMAGES_CLASS,
            [
                (
                    "text",
                    FieldType::Optional(boxed(FieldType::Record(TEXT_CLASS.into()))),
                ),
                ("images", FieldType::List(boxed(FieldType::Image))),
            ],
        ));
        registry.register(StructureClass::new(
            PAGE_CLASS,
            [
                (
                    "text_and_images",
                    FieldType::Record(TEXT_AND_IMAGES_CLASS.into()),
                ),
                ("page_view", FieldType::Optional(boxed(FieldType::Image))),
            ],
        ));
        registry.register(StructureClass::new(
            HTML_CLASS,
            [("inner_html", FieldType::Text), ("css_class", FieldType::Text)],
        ));
        registry.register(StructureClass::new(
            ANYTHING_CLASS,
            Vec::<(String, FieldType)>::new(),
        ));
        registry.register(StructureClass::new(
            DYNAMIC_CLASS,
            Vec::<(String, FieldType)>::new(),
        ));
        registry
    }

    /// Register or replace a class
    pub fn register(&mut self, class: StructureClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&StructureClass> {
        self.classes.get(name)
    }

    pub fn get_required(&self, name: &str) -> Result<&StructureClass, ConceptError> {
        self.get(name).ok_or_else(|| ConceptError::StructureNotFound {
            class_name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Whether content of `class_name` carries an image outside any list.
    ///
    /// Each branch stops at its first image. Cycles are collected while the
    /// walk continues and only reported when no image was found.
    pub fn is_image_like(&self, class_name: &str) -> Result<bool, ConceptError> {
        let mut path = Vec::new();
        let mut cycles = Vec::new();
        let found = self.walk_class(class_name, &mut path, &mut cycles)?;
        if found || cycles.is_empty() {
            Ok(found)
        } else {
            Err(ConceptError::StructureCycle { cycles })
        }
    }

    fn walk_class(
        &self,
        class_name: &str,
        path: &mut Vec<String>,
        cycles: &mut Vec<String>,
    ) -> Result<bool, ConceptError> {
        if class_name == IMAGE_CLASS {
            return Ok(true);
        }
        if path.iter().any(|visited| visited == class_name) {
            let mut cycle = path.clone();
            cycle.push(class_name.to_string());
            cycles.push(cycle.join(" -> "));
            return Ok(false);
        }
        let class = self.get_required(class_name)?;
        path.push(class_name.to_string());
        let mut found = false;
        for field_type in class.fields.values() {
            if self.walk_field(field_type, path, cycles)? {
                found = true;
                break;
            }
        }
        path.pop();
        Ok(found)
    }

    fn walk_field(
        &self,
        field_type: &FieldType,
        path: &mut Vec<String>,
        cycles: &mut Vec<String>,
    ) -> Result<bool, ConceptError> {
        match field_type {
            FieldType::Image => Ok(true),
            FieldType::Optional(inner) => self.walk_field(inner, path, cycles),
            FieldType::List(_) => Ok(false),
            FieldType::Record(name) => self.walk_class(name, path, cycles),
            FieldType::Text | FieldType::Number | FieldType::Bool => Ok(false),
        }
    }
}

impl Default for StructureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
