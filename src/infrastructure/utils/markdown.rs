use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use slug::slugify;

use crate::constants::WORDS_PER_MINUTE;
use crate::entities::blog_post::TocEntry;

fn parser(markdown: &str) -> Parser<'_> {
    Parser::new_ext(markdown, Options::ENABLE_HEADING_ATTRIBUTES | Options::ENABLE_TABLES)
}

/// Builds a table of contents from the headings of a markdown document.
///
/// Anchors come from `{#id}` attributes when present, otherwise from the
/// slugified heading text; repeated anchors get `-1`, `-2`, ... suffixes.
pub fn table_of_contents(markdown: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in parser(markdown) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level as u8, id.map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((level, explicit_id, text)) = current.take() else {
                    continue;
                };
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }

                let base = explicit_id.unwrap_or_else(|| slugify(&text));
                let count = seen.entry(base.clone()).or_insert(0);
                let id = if *count == 0 { base } else { format!("{base}-{count}") };
                *count += 1;

                entries.push(TocEntry { id, text, level });
            }
            _ => {}
        }
    }

    entries
}

/// Minutes needed to read the rendered text, at least one.
pub fn estimate_read_time(markdown: &str) -> u32 {
    let words: usize = parser(markdown)
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text.split_whitespace().count()),
            _ => None,
        })
        .sum();

    u32::try_from(words.div_ceil(WORDS_PER_MINUTE)).unwrap_or(u32::MAX).max(1)
}
