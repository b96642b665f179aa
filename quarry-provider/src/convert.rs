//! Bidirectional conversion between `layer0` content types and the
//! internal provider types.

use crate::types::{ContentPart, ProviderMessage, Role};
use layer0::{Content, ContentBlock};

/// Convert a layer0 `ContentBlock` to an internal `ContentPart`.
///
/// Citations don't have a provider-native representation, so they are
/// rendered as bracketed inline text — this is how a citation survives
/// a round trip through a provider that only understands plain text.
pub fn content_block_to_part(block: &ContentBlock) -> ContentPart {
    match block {
        ContentBlock::Text { text } => ContentPart::text(text.clone()),
        ContentBlock::Citation {
            document_id,
            snippet,
            ..
        } => ContentPart::text(format!("[{document_id}] {snippet}")),
        ContentBlock::Custom { content_type, data } => ContentPart::text(format!(
            "[custom:{}] {}",
            content_type,
            serde_json::to_string(data).unwrap_or_default()
        )),
        // Handle non_exhaustive future variants.
        _ => ContentPart::text("[unknown content block]"),
    }
}

/// Convert an internal `ContentPart` to a layer0 `ContentBlock`.
pub fn content_part_to_block(part: &ContentPart) -> ContentBlock {
    match part {
        ContentPart::Text { text } => ContentBlock::Text { text: text.clone() },
    }
}

/// Convert layer0 `Content` to a list of internal `ContentPart`s.
pub fn content_to_parts(content: &Content) -> Vec<ContentPart> {
    match content {
        Content::Text(text) => vec![ContentPart::text(text.clone())],
        Content::Blocks(blocks) => blocks.iter().map(content_block_to_part).collect(),
        // Handle non_exhaustive.
        _ => vec![ContentPart::text("[unknown content]")],
    }
}

/// Convert internal `ContentPart`s to a layer0 `Content`.
pub fn parts_to_content(parts: &[ContentPart]) -> Content {
    if let [ContentPart::Text { text }] = parts {
        return Content::Text(text.clone());
    }
    Content::Blocks(parts.iter().map(content_part_to_block).collect())
}

/// Convert layer0 `Content` to an internal `ProviderMessage` with the
/// `User` role — used to hand a rendered prompt template to a provider.
pub fn content_to_user_message(content: &Content) -> ProviderMessage {
    ProviderMessage {
        role: Role::User,
        content: content_to_parts(content),
    }
}
