use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use super::descriptor::{ContentDescriptor, TextContent};
use super::display::TextBlock;
use super::realizer::ResolvedResponse;

/// Placeholder substitutions applied in one case-insensitive pass per field.
///
/// Keys match literally. All keys are folded into one alternation, so a
/// replacement is never scanned again by another key.
#[derive(Debug, Clone, Default)]
pub struct TokenMap {
    pattern: Option<Regex>,
    values: HashMap<String, String>,
}

impl TokenMap {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        let mut keys = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_lowercase(), value.into());
            keys.push(key);
        }

        // Longest first so a key never loses to its own prefix.
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        keys.dedup();

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
            RegexBuilder::new(&alternation).case_insensitive(true).build().ok()
        };

        Self { pattern, values }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let matched = &caps[0];
                self.values
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }

    fn apply_in_place(&self, text: &mut String) {
        if !text.is_empty() {
            *text = self.apply(text);
        }
    }
}

/// Substitutes tokens into every text-bearing field.
pub trait ReplaceTokens {
    fn replace_tokens(&mut self, map: &TokenMap);
}

impl ReplaceTokens for ContentDescriptor {
    fn replace_tokens(&mut self, map: &TokenMap) {
        if map.is_empty() {
            return;
        }

        if let Some(speech) = &mut self.speech {
            for pool in [&mut speech.output, &mut speech.reprompt].into_iter().flatten() {
                pool.iter_mut().for_each(|line| map.apply_in_place(line));
            }
        }

        if let Some(card) = &mut self.card {
            for field in [&mut card.title, &mut card.output].into_iter().flatten() {
                map.apply_in_place(field);
            }
        }

        if let Some(text) = self.display.as_mut().and_then(|d| d.text.as_mut()) {
            replace_in_text(text, map);
        }
    }
}

impl ReplaceTokens for ResolvedResponse {
    fn replace_tokens(&mut self, map: &TokenMap) {
        if map.is_empty() {
            return;
        }

        map.apply_in_place(&mut self.speech.output);
        map.apply_in_place(&mut self.speech.reprompt);

        if let Some(card) = &mut self.card {
            map.apply_in_place(&mut card.title);
            map.apply_in_place(&mut card.content);
        }

        if let Some(display) = &mut self.display {
            if let Some(block) = &mut display.text_content {
                replace_in_block(block, map);
            }
            for item in display.list_items.iter_mut().flatten() {
                if let Some(block) = &mut item.text_content {
                    replace_in_block(block, map);
                }
            }
        }
    }
}

fn replace_in_block(block: &mut TextBlock, map: &TokenMap) {
    for entry in [&mut block.primary_text, &mut block.secondary_text, &mut block.tertiary_text]
        .into_iter()
        .flatten()
    {
        map.apply_in_place(&mut entry.text);
    }
}

fn replace_in_text(text: &mut TextContent, map: &TokenMap) {
    for field in [&mut text.primary, &mut text.secondary, &mut text.tertiary]
        .into_iter()
        .flatten()
    {
        if let Some(line) = &mut field.text {
            map.apply_in_place(line);
        }
    }
}
