//! Built-in concepts every library is seeded with

use serde::{Deserialize, Serialize};

use crate::content::{
    ANYTHING_CLASS, DYNAMIC_CLASS, HTML_CLASS, IMAGE_CLASS, NUMBER_CLASS, PAGE_CLASS, PDF_CLASS,
    TEXT_AND_IMAGES_CLASS, TEXT_CLASS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeConcept {
    Text,
    Image,
    #[serde(rename = "PDF")]
    Pdf,
    TextAndImages,
    Number,
    ImgGenPrompt,
    Page,
    Html,
    Anything,
    Dynamic,
}

impl NativeConcept {
    pub const ALL: [NativeConcept; 10] = [
        Self::Text,
        Self::Image,
        Self::Pdf,
        Self::TextAndImages,
        Self::Number,
        Self::ImgGenPrompt,
        Self::Page,
        Self::Html,
        Self::Anything,
        Self::Dynamic,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Pdf => "PDF",
            Self::TextAndImages => "TextAndImages",
            Self::Number => "Number",
            Self::ImgGenPrompt => "ImgGenPrompt",
            Self::Page => "Page",
            Self::Html => "Html",
            Self::Anything => "Anything",
            Self::Dynamic => "Dynamic",
        }
    }

    pub fn structure_class_name(&self) -> &'static str {
        match self {
            Self::Text | Self::ImgGenPrompt => TEXT_CLASS,
            Self::Image => IMAGE_CLASS,
            Self::Pdf => PDF_CLASS,
            Self::TextAndImages => TEXT_AND_IMAGES_CLASS,
            Self::Number => NUMBER_CLASS,
            Self::Page => PAGE_CLASS,
            Self::Html => HTML_CLASS,
            Self::Anything => ANYTHING_CLASS,
            Self::Dynamic => DYNAMIC_CLASS,
        }
    }

    pub fn definition(&self) -> &'static str {
        match self {
            Self::Text => "A text",
            Self::Image => "An image",
            Self::Pdf => "A PDF document",
            Self::TextAndImages => "A text with attached images",
            Self::Number => "A number",
            Self::ImgGenPrompt => "A prompt for image generation",
            Self::Page => "A page of a document, with its text, images and page view",
            Self::Html => "An HTML fragment",
            Self::Anything => "Anything",
            Self::Dynamic => "Content whose shape is decided at run time",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|native| native.code() == code)
    }

    /// Accepts content of any structure class
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Anything | Self::Dynamic)
    }
}
