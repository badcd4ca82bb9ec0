use thiserror::Error;

use crate::types::ParseMode;

/// Failure of a splitter or of the splitter factory.
///
/// All variants are permanent: retrying the same input with the same configuration fails the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// The markup needed at some cut point (reopened plus forced closing tags) alone reaches the
    /// message length limit, so no valid split exists.
    #[error("{parse_mode} markup takes up the entire length of the message (limit: {limit})")]
    Unsplittable { parse_mode: ParseMode, limit: usize },

    /// A closing tag has no matching opening tag among the tags currently open.
    #[error("invalid markup: closing tag </{tag}> has no corresponding opening tag")]
    TagMismatch { tag: String },

    /// A tag with an empty name, such as `<>` or `</>`.
    #[error("invalid markup: malformed tag <{body}>")]
    MalformedTag { body: String },

    #[error("no splitter specified for parse mode {0:?}")]
    NotMapped(ParseMode),
}

impl SplitError {
    pub(crate) fn unsplittable(parse_mode: ParseMode, limit: usize) -> Self {
        SplitError::Unsplittable { parse_mode, limit }
    }
}
