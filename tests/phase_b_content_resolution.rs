use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use turnkit::outputs::assets::AssetPaths;
use turnkit::outputs::descriptor::{ContentDescriptor, DisplayContent, Layout, TemplateKind};
use turnkit::outputs::directive::{self, EXECUTE_COMMANDS_TYPE, RENDER_DOCUMENT_TYPE};
use turnkit::outputs::display::{self, PLAIN_TEXT, RICH_TEXT};
use turnkit::outputs::realizer::{render_envelope, ContentResolver};
use turnkit::outputs::speech;
use turnkit::outputs::{ReplaceTokens, TokenMap, Variant};

fn assets() -> AssetPaths {
    AssetPaths {
        host: "https://cdn.example.com/".into(),
        bucket: "skill/".into(),
        image_path: "images/".into(),
        audio_path: "audio/".into(),
    }
}

fn descriptor(value: Value) -> ContentDescriptor {
    serde_json::from_value(value).expect("descriptor should deserialize")
}

fn display_content(value: Value) -> DisplayContent {
    serde_json::from_value(value).expect("display should deserialize")
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("turnkit-{tag}-{}", uuid::Uuid::new_v4().simple()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_sanitize_handles_escaped_before_raw() {
    assert_eq!(speech::sanitize("A &amp; B & C"), "A and B and C");
    assert_eq!(speech::sanitize("say &quot;hi&quot;"), "say \"hi\"");
    assert_eq!(speech::sanitize("no entities"), "no entities");
}

#[test]
fn test_audio_markers_rewritten_to_asset_urls() {
    let out = speech::finalize("Hi <audio>ding.mp3</audio> & bye", &assets());
    assert_eq!(
        out,
        "Hi <audio src=\"https://cdn.example.com/skill/audio/ding.mp3\" /> and bye"
    );

    // Absolute urls pass through untouched
    let out = speech::rewrite_audio_markers("<audio>https://x.io/a.mp3</audio>", &assets());
    assert_eq!(out, "<audio src=\"https://x.io/a.mp3\" />");

    // Empty markers stay as written
    assert_eq!(speech::rewrite_audio_markers("<audio></audio>", &assets()), "<audio></audio>");
}

#[test]
fn test_variant_pick_is_member_of_pool() {
    let mut rng = StdRng::seed_from_u64(7);
    let pool: Variant<String> = Variant::Pool(vec!["a".into(), "b".into(), "c".into()]);

    for _ in 0..50 {
        let picked = pool.pick(&mut rng).unwrap();
        assert!(["a", "b", "c"].contains(&picked.as_str()));
    }

    let single: Variant<String> = "only".to_string().into();
    assert_eq!(single.pick(&mut rng).map(String::as_str), Some("only"));

    let empty: Variant<String> = Variant::Pool(vec![]);
    assert_eq!(empty.pick(&mut rng), None, "Empty pool resolves to nothing");
}

#[test]
fn test_seeded_resolution_is_deterministic() {
    let resolver = ContentResolver::new(assets(), PathBuf::new());
    let content = descriptor(json!({
        "speech": { "output": ["one", "two", "three", "four"], "reprompt": "again?" }
    }));

    let first = resolver.assemble(&content, &mut StdRng::seed_from_u64(42));
    let second = resolver.assemble(&content, &mut StdRng::seed_from_u64(42));

    assert_eq!(first.speech, second.speech);
    assert_eq!(first.speech.reprompt, "again?");
}

#[test]
fn test_unknown_template_gets_tail_only() {
    let content = display_content(json!({ "template": "MysteryTemplate", "title": "T" }));
    assert_eq!(content.template.as_ref().map(TemplateKind::layout), Some(Layout::Bare));

    let template = display::assemble_display(&content, &assets(), &mut StdRng::seed_from_u64(1)).unwrap();
    let rendered = serde_json::to_value(&template).unwrap();

    assert_eq!(rendered, json!({ "type": "MysteryTemplate", "title": "T" }));
}

#[test]
fn test_template_kinds_map_to_layouts() {
    assert_eq!(TemplateKind::from("BodyTemplate1".to_string()).layout(), Layout::TextOnly);
    assert_eq!(TemplateKind::from("BodyTemplate2".to_string()).layout(), Layout::TextAndImage);
    assert_eq!(TemplateKind::from("BodyTemplate6".to_string()).layout(), Layout::TextAndImage);
    assert_eq!(TemplateKind::from("BodyTemplate7".to_string()).layout(), Layout::ImageOnly);
    assert_eq!(TemplateKind::from("ListTemplate2".to_string()).layout(), Layout::List);
}

#[test]
fn test_text_and_image_template() {
    let content = display_content(json!({
        "template": "BodyTemplate2",
        "title": "Weather",
        "token": "weather-1",
        "backButton": "HIDDEN",
        "image": { "url": "sun.png", "description": "Sun", "width": "340px", "height": 340 },
        "text": {
            "primary": { "type": "PlainText", "text": "Sunny" },
            "secondary": { "type": "RichText", "text": "<b>25</b>" }
        }
    }));

    let template = display::assemble_display(&content, &assets(), &mut StdRng::seed_from_u64(1)).unwrap();
    let rendered = serde_json::to_value(&template).unwrap();

    assert_eq!(rendered["type"], "BodyTemplate2");
    assert_eq!(rendered["token"], "weather-1");
    assert_eq!(rendered["backButton"], "HIDDEN");
    assert_eq!(
        rendered["image"],
        json!({
            "contentDescription": "Sun",
            "sources": [{
                "url": "https://cdn.example.com/skill/images/sun.png",
                "widthPixels": 340,
                "heightPixels": 340
            }]
        })
    );

    // Mixed styles render rich; unauthored entries stay null.
    assert_eq!(rendered["textContent"]["primaryText"], json!({ "type": RICH_TEXT, "text": "Sunny" }));
    assert_eq!(rendered["textContent"]["secondaryText"]["type"], RICH_TEXT);
    assert_eq!(rendered["textContent"]["tertiaryText"], Value::Null);
}

#[test]
fn test_text_only_template_omits_image() {
    let content = display_content(json!({
        "template": "BodyTemplate1",
        "title": "Fact",
        "image": { "url": "ignored.png" },
        "text": { "primary": { "type": "PlainText", "text": "Octopuses have three hearts" } }
    }));

    let template = display::assemble_display(&content, &assets(), &mut StdRng::seed_from_u64(1)).unwrap();

    assert!(template.image.is_none(), "BodyTemplate1 carries no body image");
    let block = template.text_content.unwrap();
    assert!(block.plain);
    assert_eq!(block.primary_text.unwrap().style, PLAIN_TEXT);
}

#[test]
fn test_list_template_and_background_pool() {
    let content = display_content(json!({
        "template": "ListTemplate2",
        "title": "Picks",
        "backgroundImage": [{ "url": "bg.png" }],
        "list": [
            { "token": "first", "image": { "url": "one.png" } },
            { "token": "second" }
        ]
    }));

    let template = display::assemble_display(&content, &assets(), &mut StdRng::seed_from_u64(3)).unwrap();
    let items = template.list_items.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].token.as_deref(), Some("first"));
    assert_eq!(items[0].image.as_ref().unwrap().sources[0].url, "https://cdn.example.com/skill/images/one.png");
    assert!(items[1].image.is_none());
    assert_eq!(
        template.background_image.unwrap().sources[0].url,
        "https://cdn.example.com/skill/images/bg.png"
    );
}

#[test]
fn test_image_without_url_resolves_to_nothing() {
    let content = display_content(json!({
        "template": "BodyTemplate7",
        "title": "Pic",
        "image": { "description": "no url" }
    }));

    let template = display::assemble_display(&content, &assets(), &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(template.image.is_none());
}

#[test]
fn test_replace_tokens_in_descriptor() {
    let mut content = descriptor(json!({
        "speech": { "output": "Hello {name}", "reprompt": ["Still there, {NAME}?"] },
        "card": { "title": "Hi {name}", "output": "Welcome back" },
        "display": {
            "template": "BodyTemplate1",
            "text": { "primary": { "type": "PlainText", "text": "{name}'s day" } }
        }
    }));
    let tokens = TokenMap::new([("{name}", "World")]);

    content.replace_tokens(&tokens);
    let after_first = content.clone();
    content.replace_tokens(&tokens);

    assert_eq!(after_first, content, "Second pass finds nothing to replace");

    let speech = content.speech.as_ref().unwrap();
    assert_eq!(speech.output, Some(Variant::One("Hello World".to_string())));
    assert_eq!(speech.reprompt, Some(Variant::Pool(vec!["Still there, World?".to_string()])));
    assert_eq!(content.card.as_ref().unwrap().title.as_deref(), Some("Hi World"));

    let text = content.display.as_ref().unwrap().text.as_ref().unwrap();
    assert_eq!(text.primary.as_ref().unwrap().text.as_deref(), Some("World's day"));
}

#[test]
fn test_token_keys_match_literally() {
    let tokens = TokenMap::new([("$price", "5"), ("$price.total", "9")]);

    assert_eq!(tokens.apply("Pay $price.total not $price"), "Pay 9 not 5");
    assert_eq!(tokens.apply("no match here"), "no match here");
    assert!(TokenMap::default().is_empty());
}

#[test]
fn test_replace_tokens_in_resolved_response() {
    let resolver = ContentResolver::new(assets(), PathBuf::new());
    let content = descriptor(json!({ "speech": { "output": "Score: {score}" } }));

    let mut resolved = resolver.assemble(&content, &mut StdRng::seed_from_u64(1));
    resolved.replace_tokens(&TokenMap::new([("{score}", "10")]));

    assert_eq!(resolved.speech.output, "Score: 10");

    // List templates carry their text per item.
    let content = descriptor(json!({
        "display": {
            "template": "ListTemplate1",
            "title": "Picks",
            "text": { "primary": { "type": "PlainText", "text": "Hi {name}" } },
            "list": [{ "token": "a" }, { "token": "b" }]
        }
    }));
    let mut resolved = resolver.assemble(&content, &mut StdRng::seed_from_u64(1));
    resolved.replace_tokens(&TokenMap::new([("{name}", "World")]));

    let items = resolved.display.unwrap().list_items.unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        let text = item.text_content.unwrap().primary_text.unwrap().text;
        assert_eq!(text, "Hi World");
    }
}

#[test]
fn test_display_without_template_kind_renders_nothing() {
    let resolver = ContentResolver::new(assets(), PathBuf::new());
    let content = descriptor(json!({
        "speech": { "output": "Hello" },
        "display": { "title": "T" }
    }));

    let resolved = resolver.assemble(&content, &mut StdRng::seed_from_u64(1));
    assert!(resolved.display.is_none());

    let envelope = render_envelope(&resolved, &serde_json::Map::new(), false);
    assert!(envelope["response"].get("directives").is_none());
    assert_eq!(envelope["response"]["outputSpeech"]["ssml"], "<speak>Hello</speak>");
}

#[test]
fn test_odd_pixel_sizes_degrade() {
    let content = descriptor(json!({
        "display": {
            "template": "BodyTemplate7",
            "image": { "url": "wide.png", "width": 1024.5, "height": true }
        }
    }));

    let template = ContentResolver::new(assets(), PathBuf::new())
        .assemble(&content, &mut StdRng::seed_from_u64(1))
        .display
        .unwrap();
    let source = &template.image.unwrap().sources[0];

    assert_eq!(source.width_pixels, Some(1024), "Fractional sizes truncate");
    assert_eq!(source.height_pixels, None, "Unusable sizes are dropped");
}

#[test]
fn test_execute_commands_builds_token() {
    let content = descriptor(json!({
        "commands": { "commands": [{ "type": "SpeakItem", "componentId": "title" }] }
    }));
    let directive = directive::build_execute_commands(content.commands.as_ref().unwrap()).unwrap();

    assert_eq!(directive.kind, EXECUTE_COMMANDS_TYPE);
    assert!(directive.token.starts_with("token"));
    assert_eq!(directive.commands.len(), 1);
}

#[tokio::test]
async fn test_render_document_reads_named_file() {
    let dir = scratch_dir("apl");
    std::fs::write(dir.join("welcome.json"), r#"{ "type": "APL", "mainTemplate": {} }"#).unwrap();

    let resolver = ContentResolver::new(assets(), dir.clone());
    let content = descriptor(json!({
        "document": { "document": "welcome", "token": "home", "datasources": { "greeting": "hi" } }
    }));

    let resolved = resolver.resolve(&content).await;
    let document = resolved.document.expect("document directive");

    assert_eq!(document.kind, RENDER_DOCUMENT_TYPE);
    assert_eq!(document.token, "home");
    assert_eq!(document.document["type"], "APL");
    assert_eq!(document.datasources.get("greeting"), Some(&json!("hi")));

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn test_missing_document_degrades_gracefully() {
    let dir = scratch_dir("apl-missing");
    let resolver = ContentResolver::new(assets(), dir.clone());
    let content = descriptor(json!({
        "speech": { "output": "Still talking" },
        "document": { "document": "absent" }
    }));

    let resolved = resolver.resolve(&content).await;

    assert!(resolved.document.is_none());
    assert_eq!(resolved.speech.output, "Still talking", "Turn still answers without the document");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_render_envelope_shape() {
    let resolver = ContentResolver::new(assets(), PathBuf::new());
    let content = descriptor(json!({
        "speech": { "output": "Hi & welcome", "reprompt": "What next?" },
        "card": { "title": "Welcome", "output": "Glad you're here" },
        "display": { "template": "BodyTemplate1", "title": "Home" }
    }));
    let resolved = resolver.assemble(&content, &mut StdRng::seed_from_u64(1));

    let mut session = serde_json::Map::new();
    session.insert("STATE".into(), json!("_MAIN"));
    let envelope = render_envelope(&resolved, &session, false);

    assert_eq!(envelope["version"], "1.0");
    assert_eq!(envelope["sessionAttributes"]["STATE"], "_MAIN");
    assert_eq!(envelope["response"]["outputSpeech"]["ssml"], "<speak>Hi and welcome</speak>");
    assert_eq!(envelope["response"]["reprompt"]["outputSpeech"]["ssml"], "<speak>What next?</speak>");
    assert_eq!(envelope["response"]["card"]["type"], "Simple");
    assert_eq!(envelope["response"]["directives"][0]["type"], "Display.RenderTemplate");
    assert_eq!(envelope["response"]["directives"][0]["template"]["title"], "Home");
    assert_eq!(envelope["response"]["shouldEndSession"], false);
}
