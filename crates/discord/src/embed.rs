//! Discord's message and embed wire format.
//!
//! Discord rejects an entire message when any embed limit is exceeded, so text
//! is clipped and trailing fields dropped here rather than letting one long
//! commit message lose the whole notification. Empty field text is also
//! rejected and is replaced with a placeholder.

use pipeline::RichMessage;
use serde::Serialize;

#[cfg(test)]
#[path = "embed_tests.rs"]
mod tests;

pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_FIELDS: usize = 25;
pub const MAX_FIELD_NAME_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
pub const MAX_CONTENT_CHARS: usize = 2000;
/// Combined limit over title, description, author name and every field.
pub const MAX_EMBED_CHARS: usize = 6000;

/// Stands in for a blank field name or value.
pub const EMPTY_FIELD_PLACEHOLDER: &str = "(no message)";

const ELLIPSIS: char = '…';
const MIN_CLIPPED_VALUE_CHARS: usize = 16;

/// Body of a create-message request.
#[derive(Debug, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl CreateMessage {
    pub fn text(content: &str) -> Self {
        Self {
            content: Some(clip(content, MAX_CONTENT_CHARS)),
            embeds: Vec::new(),
        }
    }

    pub fn embed(message: &RichMessage) -> Self {
        Self {
            content: None,
            embeds: vec![Embed::from(message)],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    pub author: EmbedAuthor,
    pub thumbnail: EmbedThumbnail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl From<&RichMessage> for Embed {
    fn from(message: &RichMessage) -> Self {
        let title = clip(&message.title, MAX_TITLE_CHARS);
        let author_name = clip(&message.author.name, MAX_FIELD_NAME_CHARS);
        let description = message
            .description
            .as_deref()
            .map(|d| clip(d, MAX_DESCRIPTION_CHARS));

        let mut used = title.chars().count()
            + author_name.chars().count()
            + description.as_deref().map_or(0, |d| d.chars().count());
        let mut fields = Vec::new();
        for field in message.custom_fields.iter().take(MAX_FIELDS) {
            let name = clip(non_blank(&field.name), MAX_FIELD_NAME_CHARS);
            let name_chars = name.chars().count();
            let remaining = MAX_EMBED_CHARS.saturating_sub(used + name_chars);
            let value = clip(non_blank(&field.value), MAX_FIELD_VALUE_CHARS);
            let value = if value.chars().count() <= remaining {
                value
            } else if remaining >= MIN_CLIPPED_VALUE_CHARS {
                clip(&value, remaining)
            } else {
                break;
            };
            used += name_chars + value.chars().count();
            fields.push(EmbedField {
                name,
                value,
                inline: false,
            });
        }

        Embed {
            title,
            url: message.url.clone(),
            color: message.color.as_rgb(),
            author: EmbedAuthor {
                name: author_name,
                url: message.author.url.clone(),
            },
            thumbnail: EmbedThumbnail {
                url: message.thumbnail.clone(),
            },
            description,
            fields,
        }
    }
}

impl Embed {
    /// Characters counted against [`MAX_EMBED_CHARS`].
    pub fn char_count(&self) -> usize {
        self.title.chars().count()
            + self.author.name.chars().count()
            + self.description.as_deref().map_or(0, |d| d.chars().count())
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }
}

fn non_blank(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_FIELD_PLACEHOLDER
    } else {
        text
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with `…`.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push(ELLIPSIS);
    clipped
}
