//! Stuff content: the typed payloads living in working memory

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const TEXT_CLASS: &str = "TextContent";
pub const NUMBER_CLASS: &str = "NumberContent";
pub const IMAGE_CLASS: &str = "ImageContent";
pub const PDF_CLASS: &str = "PdfContent";
pub const TEXT_AND_IMAGES_CLASS: &str = "TextAndImagesContent";
pub const PAGE_CLASS: &str = "PageContent";
pub const HTML_CLASS: &str = "HtmlContent";
pub const LIST_CLASS: &str = "ListContent";
pub const ANYTHING_CLASS: &str = "AnythingContent";
pub const DYNAMIC_CLASS: &str = "DynamicContent";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberContent {
    pub number: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PdfContent {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAndImagesContent {
    pub text: Option<TextContent>,
    #[serde(default)]
    pub images: Vec<ImageContent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub text_and_images: TextAndImagesContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_view: Option<ImageContent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HtmlContent {
    pub inner_html: String,
    pub css_class: String,
}

/// Record content whose shape is described by a structure class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub class_name: String,
    pub value: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListContent {
    pub items: Vec<StuffContent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StuffContent {
    Text(TextContent),
    Number(NumberContent),
    Image(ImageContent),
    Pdf(PdfContent),
    TextAndImages(TextAndImagesContent),
    Page(PageContent),
    Html(HtmlContent),
    Structured(StructuredContent),
    List(ListContent),
}

impl StuffContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent { text: text.into() })
    }

    pub fn number(number: f64) -> Self {
        Self::Number(NumberContent { number })
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::Image(ImageContent {
            url: url.into(),
            caption: None,
        })
    }

    pub fn structured(class_name: impl Into<String>, value: Value) -> Self {
        Self::Structured(StructuredContent {
            class_name: class_name.into(),
            value,
        })
    }

    pub fn list(items: Vec<StuffContent>) -> Self {
        Self::List(ListContent { items })
    }

    /// Name of the structure class this content instantiates
    pub fn class_name(&self) -> &str {
        match self {
            Self::Text(_) => TEXT_CLASS,
            Self::Number(_) => NUMBER_CLASS,
            Self::Image(_) => IMAGE_CLASS,
            Self::Pdf(_) => PDF_CLASS,
            Self::TextAndImages(_) => TEXT_AND_IMAGES_CLASS,
            Self::Page(_) => PAGE_CLASS,
            Self::Html(_) => HTML_CLASS,
            Self::Structured(s) => &s.class_name,
            Self::List(_) => LIST_CLASS,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StuffContent]> {
        match self {
            Self::List(list) => Some(&list.items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Images reachable without going through a list
    pub fn images(&self) -> Vec<&ImageContent> {
        match self {
            Self::Image(image) => vec![image],
            Self::TextAndImages(t) => t.images.iter().collect(),
            Self::Page(page) => {
                let mut images: Vec<&ImageContent> = page.text_and_images.images.iter().collect();
                images.extend(page.page_view.iter());
                images
            }
            _ => Vec::new(),
        }
    }

    /// Plain-text view used when content is interpolated into a prompt
    pub fn rendered_text(&self) -> String {
        match self {
            Self::Text(t) => t.text.clone(),
            Self::Number(n) => n.number.to_string(),
            Self::Image(image) => image.url.clone(),
            Self::Pdf(pdf) => pdf.url.clone(),
            Self::TextAndImages(t) => t
                .text
                .as_ref()
                .map(|text| text.text.clone())
                .unwrap_or_default(),
            Self::Page(page) => page
                .text_and_images
                .text
                .as_ref()
                .map(|text| text.text.clone())
                .unwrap_or_default(),
            Self::Html(html) => html.inner_html.clone(),
            Self::Structured(s) => s.value.to_string(),
            Self::List(list) => list
                .items
                .iter()
                .map(StuffContent::rendered_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// JSON view exposed to templates and expressions
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(t) => json!({ "text": t.text }),
            Self::Number(n) => json!({ "number": n.number }),
            Self::Image(image) => serde_json::to_value(image).unwrap_or(Value::Null),
            Self::Pdf(pdf) => json!({ "url": pdf.url }),
            Self::TextAndImages(t) => serde_json::to_value(t).unwrap_or(Value::Null),
            Self::Page(page) => serde_json::to_value(page).unwrap_or(Value::Null),
            Self::Html(html) => serde_json::to_value(html).unwrap_or(Value::Null),
            Self::Structured(s) => s.value.clone(),
            Self::List(list) => {
                json!({ "items": list.items.iter().map(StuffContent::to_json).collect::<Vec<_>>() })
            }
        }
    }
}
