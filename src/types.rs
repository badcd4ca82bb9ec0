use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Markup language of a message, as understood by the Bot API `parse_mode` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ParseMode {
    /// No markup. Sent without a `parse_mode` value.
    #[default]
    Plain,
    Html,
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    /// The value sent in the `parse_mode` request field (`""` for plain text).
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Plain => "",
            ParseMode::Html => "HTML",
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Plain => f.write_str("plain"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parse mode: {0:?}")]
pub struct ParseModeError(pub String);

impl FromStr for ParseMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("plain") {
            return Ok(ParseMode::Plain);
        }
        if s.eq_ignore_ascii_case("html") {
            return Ok(ParseMode::Html);
        }
        if s.eq_ignore_ascii_case("markdown") {
            return Ok(ParseMode::Markdown);
        }
        if s.eq_ignore_ascii_case("markdownv2") {
            return Ok(ParseMode::MarkdownV2);
        }
        Err(ParseModeError(s.to_string()))
    }
}

impl TryFrom<String> for ParseMode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParseMode> for &'static str {
    fn from(mode: ParseMode) -> Self {
        mode.as_str()
    }
}
