use super::{MessageSplitter, byte_index_after_n_chars};
use crate::error::SplitError;
use crate::options::MAX_MESSAGE_LENGTH;
use crate::types::ParseMode;

/// Cuts text into consecutive slices of at most `max_message_length` chars, ignoring markup.
///
/// The reported parse mode does not affect splitting; it only tells callers how to send the
/// pieces. Registering a `PlainSplitter` under a markup parse mode is a valid fallback when the
/// text is known not to need scope tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainSplitter {
    max_message_length: usize,
    parse_mode: ParseMode,
}

impl PlainSplitter {
    pub fn new(max_message_length: usize) -> Self {
        Self {
            max_message_length: max_message_length.max(1),
            parse_mode: ParseMode::Plain,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }
}

impl Default for PlainSplitter {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_LENGTH)
    }
}

impl MessageSplitter for PlainSplitter {
    fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    fn split(&self, text: &str) -> Result<Vec<String>, SplitError> {
        let mut messages = Vec::new();
        let mut remaining = text;
        while !remaining.is_empty() {
            let end = byte_index_after_n_chars(remaining, self.max_message_length);
            messages.push(remaining[..end].to_string());
            remaining = &remaining[end..];
        }
        tracing::debug!(
            parse_mode = %self.parse_mode,
            limit = self.max_message_length,
            messages = messages.len(),
            "split plain text"
        );
        Ok(messages)
    }
}
