//! Chat and server message presentation.
//!
//! Turns `Print` and `PrintJSON` packets into log lines for a [`LogSink`].
//! Rich-text parts that carry numeric ids are resolved to names through the
//! metadata cache; parts that fail to parse are shown as sent.

use std::{fmt, sync::Arc};

use archlink_core::DataCache;
use archlink_proto::{ItemId, JsonMessagePart, LocationId, MessageColor, PartKind, SlotId};

/// Display color of a log segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Red
    Red,
    /// Green
    Green,
    /// Yellow; also the current player
    Yellow,
    /// Blue
    Blue,
    /// Magenta
    Magenta,
    /// Cyan
    Cyan,
    /// Dark gray, shown for `black`
    DarkGray,
    /// White; the default
    White,
    /// Other players
    Orange,
    /// Items
    Crimson,
    /// Locations
    Aquamarine,
}

/// A run of text in one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text
    pub text: String,
    /// Color
    pub color: Color,
}

impl Segment {
    /// Create a segment.
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color }
    }
}

/// One line of log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// Uncolored text.
    Plain(String),
    /// Colored segments, in order.
    Segments(Vec<Segment>),
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.write_str(text),
            Self::Segments(segments) => segments.iter().try_for_each(|s| f.write_str(&s.text)),
        }
    }
}

/// Append-only destination for log lines.
///
/// Called during packet dispatch; must not connect or disconnect the session.
pub trait LogSink: Send + Sync {
    /// Append a line.
    fn add(&self, line: LogLine);
}

/// Sink that forwards lines to `tracing` at info level, without color.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn add(&self, line: LogLine) {
        tracing::info!(target: "archlink::log", "{line}");
    }
}

/// Who is listening, for broadcast filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Audience {
    /// Our slot, once connected.
    pub slot: Option<SlotId>,
    /// Players in the room.
    pub player_count: usize,
}

/// Formats server messages into a [`LogSink`].
#[derive(Clone)]
pub struct Presenter {
    sink: Arc<dyn LogSink>,
    large_session_threshold: usize,
}

impl Presenter {
    /// Presenter writing to `sink`.
    pub fn new(sink: Arc<dyn LogSink>, large_session_threshold: usize) -> Self {
        Self { sink, large_session_threshold }
    }

    /// Show a plain `Print` text, one log line per `\n`-separated part.
    pub fn print(&self, text: &str) {
        for line in text.split('\n') {
            self.sink.add(LogLine::Plain(line.to_string()));
        }
    }

    /// Show a `PrintJSON` message.
    ///
    /// In rooms larger than the threshold, messages that do not mention our
    /// slot are dropped.
    pub fn print_json(&self, parts: &[JsonMessagePart], audience: Audience, cache: &DataCache) {
        if audience.player_count > self.large_session_threshold
            && !mentions_slot(parts, audience.slot)
        {
            tracing::trace!(player_count = audience.player_count, "suppressing broadcast");
            return;
        }

        self.sink.add(LogLine::Segments(render_parts(parts, audience.slot, cache)));
    }
}

/// True if any part is a player id part naming `slot`.
pub fn mentions_slot(parts: &[JsonMessagePart], slot: Option<SlotId>) -> bool {
    let Some(slot) = slot else {
        return false;
    };
    parts
        .iter()
        .any(|part| part.part_kind() == PartKind::PlayerId && parse_slot(part) == Some(slot))
}

/// Render message parts as colored segments.
pub fn render_parts(
    parts: &[JsonMessagePart],
    slot: Option<SlotId>,
    cache: &DataCache,
) -> Vec<Segment> {
    parts.iter().map(|part| Segment::new(part_text(part, cache), part_color(part, slot))).collect()
}

fn part_text(part: &JsonMessagePart, cache: &DataCache) -> String {
    let text = part.text_or_empty();
    match part.part_kind() {
        PartKind::PlayerId => {
            parse_slot(part).map_or_else(|| text.to_string(), |s| cache.player_name(s))
        },
        PartKind::ItemId => {
            text.parse().map_or_else(|_| text.to_string(), |id| cache.item_name(ItemId(id)))
        },
        PartKind::LocationId => {
            text.parse().map_or_else(|_| text.to_string(), |id| cache.location_name(LocationId(id)))
        },
        _ => text.to_string(),
    }
}

fn part_color(part: &JsonMessagePart, slot: Option<SlotId>) -> Color {
    let Some(color) = part.message_color() else {
        return kind_color(part, slot);
    };

    match color {
        MessageColor::Red => Color::Red,
        MessageColor::Green => Color::Green,
        MessageColor::Yellow => Color::Yellow,
        MessageColor::Blue => Color::Blue,
        MessageColor::Magenta => Color::Magenta,
        MessageColor::Cyan => Color::Cyan,
        MessageColor::Black => Color::DarkGray,
        MessageColor::White | MessageColor::Other => Color::White,
    }
}

fn kind_color(part: &JsonMessagePart, slot: Option<SlotId>) -> Color {
    match part.part_kind() {
        PartKind::PlayerId if slot.is_some() && parse_slot(part) == slot => Color::Yellow,
        PartKind::PlayerId => Color::Orange,
        PartKind::ItemId => Color::Crimson,
        PartKind::LocationId => Color::Aquamarine,
        _ => Color::White,
    }
}

fn parse_slot(part: &JsonMessagePart) -> Option<SlotId> {
    part.text_or_empty().parse().ok().map(SlotId)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use archlink_proto::{GameData, NetworkPlayer};
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct VecSink(Mutex<Vec<LogLine>>);

    impl LogSink for VecSink {
        fn add(&self, line: LogLine) {
            self.0.lock().push(line);
        }
    }

    fn cache() -> DataCache {
        let mut cache = DataCache::new();
        cache.update_players(&[
            NetworkPlayer { team: 0, slot: SlotId(1), alias: String::new(), name: "alice".into() },
            NetworkPlayer { team: 0, slot: SlotId(2), alias: String::new(), name: "bob".into() },
        ]);
        cache.merge(&HashMap::from([(
            "Seaside".to_string(),
            GameData {
                item_name_to_id: HashMap::from([("Lantern".to_string(), ItemId(77))]),
                location_name_to_id: HashMap::from([("Old Pier".to_string(), LocationId(900))]),
                checksum: "c".into(),
            },
        )]));
        cache
    }

    fn item_found_message() -> Vec<JsonMessagePart> {
        vec![
            JsonMessagePart::typed("player_id", "2"),
            JsonMessagePart::text(" found "),
            JsonMessagePart::typed("item_id", "77"),
            JsonMessagePart::text(" at "),
            JsonMessagePart::typed("location_id", "900"),
        ]
    }

    #[test]
    fn ids_resolve_to_names_and_colors() {
        let segments = render_parts(&item_found_message(), Some(SlotId(1)), &cache());

        assert_eq!(segments, vec![
            Segment::new("bob", Color::Orange),
            Segment::new(" found ", Color::White),
            Segment::new("Lantern", Color::Crimson),
            Segment::new(" at ", Color::White),
            Segment::new("Old Pier", Color::Aquamarine),
        ]);
    }

    #[test]
    fn current_player_is_yellow() {
        let parts = [JsonMessagePart::typed("player_id", "1")];
        let segments = render_parts(&parts, Some(SlotId(1)), &cache());
        assert_eq!(segments, vec![Segment::new("alice", Color::Yellow)]);
    }

    #[test]
    fn unparsable_ids_show_raw_text() {
        let parts = [JsonMessagePart::typed("item_id", "lantern?")];
        let segments = render_parts(&parts, None, &cache());
        assert_eq!(segments[0].text, "lantern?");
    }

    #[test]
    fn unknown_ids_show_number() {
        let parts = [JsonMessagePart::typed("location_id", "31337")];
        assert_eq!(render_parts(&parts, None, &cache())[0].text, "31337");
    }

    #[test]
    fn explicit_color_wins() {
        let mut part = JsonMessagePart::typed("item_id", "77");
        part.color = Some("black".to_string());
        assert_eq!(render_parts(&[part], None, &cache())[0].color, Color::DarkGray);

        let mut part = JsonMessagePart::text("x");
        part.color = Some("underline".to_string());
        assert_eq!(render_parts(&[part], None, &cache())[0].color, Color::White);
    }

    #[test]
    fn print_splits_lines() {
        let sink = Arc::new(VecSink::default());
        let presenter = Presenter::new(sink.clone(), 20);

        presenter.print("one\ntwo");

        assert_eq!(*sink.0.lock(), vec![
            LogLine::Plain("one".to_string()),
            LogLine::Plain("two".to_string()),
        ]);
    }

    #[test]
    fn large_sessions_filter_unrelated_broadcasts() {
        let sink = Arc::new(VecSink::default());
        let presenter = Presenter::new(sink.clone(), 20);
        let crowd = Audience { slot: Some(SlotId(1)), player_count: 21 };

        presenter.print_json(&item_found_message(), crowd, &cache());
        assert!(sink.0.lock().is_empty());

        let about_us = [JsonMessagePart::typed("player_id", "1"), JsonMessagePart::text(" joined")];
        presenter.print_json(&about_us, crowd, &cache());
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[test]
    fn small_sessions_show_everything() {
        let sink = Arc::new(VecSink::default());
        let presenter = Presenter::new(sink.clone(), 20);

        let audience = Audience { slot: Some(SlotId(1)), player_count: 20 };
        presenter.print_json(&item_found_message(), audience, &cache());

        assert_eq!(sink.0.lock()[0].to_string(), "bob found Lantern at Old Pier");
    }
}
