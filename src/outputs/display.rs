//! Display template assembly.
//!
//! Every template kind shares the same tail (title, token, background image,
//! back button); the kind only decides which body fields are attached. Unknown
//! kinds get the tail alone.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::assets::AssetPaths;
use super::descriptor::{DisplayContent, Image, Layout, TextContent, TextField, Visibility};
use super::variant::resolve_variant;

pub const PLAIN_TEXT: &str = "PlainText";
pub const RICH_TEXT: &str = "RichText";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    pub sources: Vec<ImageSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_pixels: Option<u32>,
}

/// Rendered text block. Sub-fields that were never authored stay `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(skip)]
    pub plain: bool,
    pub primary_text: Option<TextEntry>,
    pub secondary_text: Option<TextEntry>,
    pub tertiary_text: Option<TextEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    #[serde(rename = "type")]
    pub style: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemObject {
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTemplate {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_button: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<ImageObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<TextBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<ListItemObject>>,
}

/// Builds an image object. Images without a url resolve to nothing.
pub fn build_image(image: &Image, assets: &AssetPaths) -> Option<ImageObject> {
    let url = image.url.as_deref().filter(|u| !u.is_empty())?;

    Some(ImageObject {
        content_description: image.description.clone().filter(|d| !d.is_empty()),
        sources: vec![ImageSource {
            url: assets.image(url),
            size: image.size.clone(),
            width_pixels: image.width.as_ref().and_then(|w| w.pixels()),
            height_pixels: image.height.as_ref().and_then(|h| h.pixels()),
        }],
    })
}

/// Plain when every authored entry is plain, rich otherwise.
pub fn build_text_block(text: &TextContent) -> TextBlock {
    let authored = [&text.primary, &text.secondary, &text.tertiary];
    let plain = authored
        .iter()
        .filter_map(|field| field.as_ref())
        .all(|field| field.style.as_deref() == Some(PLAIN_TEXT));
    let style = if plain { PLAIN_TEXT } else { RICH_TEXT };

    let entry = |field: &Option<TextField>| {
        field.as_ref().and_then(|f| f.text.as_ref()).map(|t| TextEntry {
            style: style.to_string(),
            text: t.clone(),
        })
    };

    TextBlock {
        plain,
        primary_text: entry(&text.primary),
        secondary_text: entry(&text.secondary),
        tertiary_text: entry(&text.tertiary),
    }
}

/// Builds the display template, or nothing when no template kind was authored.
pub fn assemble_display<R: Rng + ?Sized>(
    display: &DisplayContent,
    assets: &AssetPaths,
    rng: &mut R,
) -> Option<DisplayTemplate> {
    let kind = display.template.as_ref()?;
    let mut template = DisplayTemplate {
        kind: kind.as_str().to_string(),
        title: display.title.clone().unwrap_or_default(),
        token: display.token.clone().filter(|t| !t.is_empty()),
        back_button: None,
        background_image: None,
        image: None,
        text_content: None,
        list_items: None,
    };

    let text_block = || display.text.as_ref().map(build_text_block);
    let body_image = || display.image.as_ref().and_then(|img| build_image(img, assets));

    match kind.layout() {
        Layout::TextOnly => {
            template.text_content = text_block();
        }
        Layout::TextAndImage => {
            template.image = body_image();
            template.text_content = text_block();
        }
        Layout::ImageOnly => {
            template.image = body_image();
        }
        Layout::List => {
            if let Some(items) = &display.list {
                let shared = text_block();
                template.list_items = Some(
                    items
                        .iter()
                        .map(|item| ListItemObject {
                            token: item.token.clone(),
                            image: item.image.as_ref().and_then(|img| build_image(img, assets)),
                            text_content: shared.clone(),
                        })
                        .collect(),
                );
            }
        }
        Layout::Bare => {}
    }

    if display.back_button == Some(Visibility::Hidden) {
        template.back_button = Some(Visibility::Hidden);
    }

    template.background_image = resolve_variant(display.background_image.as_ref(), rng)
        .and_then(|img| build_image(img, assets));

    Some(template)
}
