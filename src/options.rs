use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ParseMode;

/// Maximum number of characters the Bot API accepts in one text message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

fn default_max_message_length() -> usize {
    MAX_MESSAGE_LENGTH
}

/// Declarative description of one splitter, as it appears in a configuration file.
///
/// ```toml
/// [splitters.HTML]
/// kind = "html"
/// max_message_length = 4000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitterSpec {
    /// Fixed-width chunking without markup awareness.
    Plain {
        #[serde(default = "default_max_message_length")]
        max_message_length: usize,
        /// Parse mode reported by the splitter. Defaults to plain text.
        #[serde(default)]
        parse_mode: ParseMode,
    },
    /// Tag-aware splitting for HTML markup.
    Html {
        #[serde(default = "default_max_message_length")]
        max_message_length: usize,
    },
}

impl SplitterSpec {
    pub fn plain() -> Self {
        SplitterSpec::Plain {
            max_message_length: MAX_MESSAGE_LENGTH,
            parse_mode: ParseMode::Plain,
        }
    }

    pub fn html() -> Self {
        SplitterSpec::Html {
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }
}

/// Parse mode to splitter mapping used to build a [`crate::SplitterFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    pub splitters: BTreeMap<ParseMode, SplitterSpec>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        let mut splitters = BTreeMap::new();
        splitters.insert(ParseMode::Plain, SplitterSpec::plain());
        splitters.insert(ParseMode::Html, SplitterSpec::html());
        Self { splitters }
    }
}
