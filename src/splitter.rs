mod context;
mod html;
mod plain;

pub use html::HtmlSplitter;
pub use plain::PlainSplitter;

use crate::error::SplitError;
use crate::types::ParseMode;

/// Splits one finished, formatted text into messages that fit the length limit.
///
/// Implementations hold only immutable configuration; every call to [`MessageSplitter::split`]
/// starts from scratch, so one instance can be shared between threads.
pub trait MessageSplitter: Send + Sync {
    /// Markup language this splitter understands. Callers send it as the `parse_mode` of every
    /// message produced by [`MessageSplitter::split`].
    fn parse_mode(&self) -> ParseMode;

    /// Maximum number of chars in one produced message.
    fn max_message_length(&self) -> usize;

    /// Split `text` into an ordered list of messages.
    ///
    /// Returns an empty list for empty input. On error no messages are returned.
    fn split(&self, text: &str) -> Result<Vec<String>, SplitError>;
}

/// Byte offset just past the first `n` chars of `text` (or `text.len()`).
pub(crate) fn byte_index_after_n_chars(text: &str, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    text.char_indices()
        .nth(n)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}
