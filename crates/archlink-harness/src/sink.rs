//! Log sink that records lines for assertions.

use std::sync::Arc;

use archlink_client::{LogLine, LogSink};
use parking_lot::Mutex;

/// Records every line added. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().clone()
    }

    /// Lines recorded so far, as plain text.
    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(ToString::to_string).collect()
    }
}

impl LogSink for RecordingSink {
    fn add(&self, line: LogLine) {
        self.lines.lock().push(line);
    }
}
