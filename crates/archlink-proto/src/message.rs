//! Rich-text message fragments carried by `PrintJSON`.
//!
//! A message is an ordered list of parts. Each part has text plus an optional
//! semantic type (player, item, location, ...) and an optional explicit color
//! tag. The server sends ids as decimal strings in `text` for the `*_id` part
//! types; resolving them to names is the presenter's job.
//!
//! Part types and colors are kept as raw strings on the wire and parsed on
//! demand, so a newer server's additions degrade to [`PartKind::Other`] /
//! [`MessageColor::Other`] instead of failing the packet.

use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// One fragment of a rich-text message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMessagePart {
    /// Semantic type, raw.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Fragment text, or a decimal id for the `*_id` types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Explicit color tag, raw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Slot owning the referenced item or location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<SlotId>,
    /// Item flags for item parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl JsonMessagePart {
    /// Plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    /// Part of the given semantic type.
    pub fn typed(kind: &str, text: impl Into<String>) -> Self {
        Self { kind: Some(kind.to_string()), text: Some(text.into()), ..Self::default() }
    }

    /// Parsed semantic type. Missing type means plain text.
    pub fn part_kind(&self) -> PartKind {
        self.kind.as_deref().map_or(PartKind::Text, PartKind::parse)
    }

    /// Parsed color tag, if one was sent.
    pub fn message_color(&self) -> Option<MessageColor> {
        self.color.as_deref().map(MessageColor::parse)
    }

    /// Fragment text, empty if absent.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Semantic type of a message part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// Plain text.
    Text,
    /// Player slot id in `text`.
    PlayerId,
    /// Player name in `text`.
    PlayerName,
    /// Item id in `text`.
    ItemId,
    /// Item name in `text`.
    ItemName,
    /// Location id in `text`.
    LocationId,
    /// Location name in `text`.
    LocationName,
    /// Entrance name in `text`.
    EntranceName,
    /// Text with an explicit color.
    Color,
    /// Type this client does not know.
    Other,
}

impl PartKind {
    /// Parse a wire type name.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "text" => Self::Text,
            "player_id" => Self::PlayerId,
            "player_name" => Self::PlayerName,
            "item_id" => Self::ItemId,
            "item_name" => Self::ItemName,
            "location_id" => Self::LocationId,
            "location_name" => Self::LocationName,
            "entrance_name" => Self::EntranceName,
            "color" => Self::Color,
            _ => Self::Other,
        }
    }
}

/// Explicit color tag of a message part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageColor {
    /// `red`
    Red,
    /// `green`
    Green,
    /// `yellow`
    Yellow,
    /// `blue`
    Blue,
    /// `magenta`
    Magenta,
    /// `cyan`
    Cyan,
    /// `black`
    Black,
    /// `white`
    White,
    /// Styles and backgrounds (`bold`, `red_bg`, ...) and unknown tags.
    Other,
}

impl MessageColor {
    /// Parse a wire color tag.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "black" => Self::Black,
            "white" => Self::White,
            _ => Self::Other,
        }
    }
}
