//! Author-supplied content descriptors.
//!
//! Business logic hands one of these to the resolver per turn. Every field is
//! optional; whatever is missing simply does not show up in the response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::variant::Variant;
use crate::kernel::path::Mapping;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub speech: Option<SpeechContent>,
    pub card: Option<CardContent>,
    pub display: Option<DisplayContent>,
    pub repeat_speech: Option<RepeatSpeech>,
    pub token: Option<String>,
    pub document: Option<DocumentContent>,
    pub commands: Option<CommandContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechContent {
    pub output: Option<Variant<String>>,
    pub reprompt: Option<Variant<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardContent {
    pub title: Option<String>,
    pub output: Option<String>,
}

/// Captured replay content, already concrete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatSpeech {
    pub output: Option<String>,
    pub reprompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayContent {
    /// No template kind means no display directive.
    pub template: Option<TemplateKind>,
    pub title: Option<String>,
    pub token: Option<String>,
    pub back_button: Option<Visibility>,
    pub background_image: Option<Variant<Image>>,
    pub text: Option<TextContent>,
    pub image: Option<Image>,
    pub list: Option<Vec<ListItem>>,
}

/// Layout families the display templates fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    TextOnly,
    TextAndImage,
    ImageOnly,
    List,
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateKind {
    BodyTemplate1,
    BodyTemplate2,
    BodyTemplate3,
    BodyTemplate6,
    BodyTemplate7,
    ListTemplate1,
    ListTemplate2,
    Other(String),
}

impl TemplateKind {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateKind::BodyTemplate1 => "BodyTemplate1",
            TemplateKind::BodyTemplate2 => "BodyTemplate2",
            TemplateKind::BodyTemplate3 => "BodyTemplate3",
            TemplateKind::BodyTemplate6 => "BodyTemplate6",
            TemplateKind::BodyTemplate7 => "BodyTemplate7",
            TemplateKind::ListTemplate1 => "ListTemplate1",
            TemplateKind::ListTemplate2 => "ListTemplate2",
            TemplateKind::Other(name) => name,
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            TemplateKind::BodyTemplate1 => Layout::TextOnly,
            TemplateKind::BodyTemplate2 | TemplateKind::BodyTemplate3 | TemplateKind::BodyTemplate6 => {
                Layout::TextAndImage
            }
            TemplateKind::BodyTemplate7 => Layout::ImageOnly,
            TemplateKind::ListTemplate1 | TemplateKind::ListTemplate2 => Layout::List,
            TemplateKind::Other(_) => Layout::Bare,
        }
    }
}

impl From<String> for TemplateKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "BodyTemplate1" => TemplateKind::BodyTemplate1,
            "BodyTemplate2" => TemplateKind::BodyTemplate2,
            "BodyTemplate3" => TemplateKind::BodyTemplate3,
            "BodyTemplate6" => TemplateKind::BodyTemplate6,
            "BodyTemplate7" => TemplateKind::BodyTemplate7,
            "ListTemplate1" => TemplateKind::ListTemplate1,
            "ListTemplate2" => TemplateKind::ListTemplate2,
            _ => TemplateKind::Other(name),
        }
    }
}

impl From<TemplateKind> for String {
    fn from(kind: TemplateKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
}

/// Pixel sizes may be authored as numbers or numeric strings. Anything else is
/// kept but resolves to no size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(u32),
    Fraction(f64),
    Text(String),
    Unparsed(Value),
}

impl Dimension {
    /// Leading integer part, like `parseInt`.
    pub fn pixels(&self) -> Option<u32> {
        match self {
            Dimension::Pixels(px) => Some(*px),
            Dimension::Fraction(px) if px.is_finite() && *px >= 0.0 && *px < u32::MAX as f64 => {
                Some(px.trunc() as u32)
            }
            Dimension::Fraction(_) | Dimension::Unparsed(_) => None,
            Dimension::Text(text) => {
                let digits: String = text.trim().chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub primary: Option<TextField>,
    pub secondary: Option<TextField>,
    pub tertiary: Option<TextField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    #[serde(rename = "type")]
    pub style: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub token: Option<String>,
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// File stem under the configured document directory.
    pub document: String,
    pub token: Option<String>,
    #[serde(default)]
    pub datasources: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandContent {
    pub token: Option<String>,
    pub commands: Option<Vec<Value>>,
}
