use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SplitError;
use crate::options::{FactoryConfig, SplitterSpec};
use crate::splitter::{HtmlSplitter, MessageSplitter, PlainSplitter};
use crate::types::ParseMode;

/// Registry of splitters keyed by the parse mode of the text they receive.
///
/// The default registry covers plain text and HTML with the Bot API length limit. Other markup
/// languages have no splitter until one is registered.
#[derive(Clone)]
pub struct SplitterFactory {
    splitters: HashMap<ParseMode, Arc<dyn MessageSplitter>>,
}

impl SplitterFactory {
    /// A factory with no splitters registered.
    pub fn empty() -> Self {
        Self {
            splitters: HashMap::new(),
        }
    }

    /// Build every splitter described by `config`.
    pub fn from_config(config: &FactoryConfig) -> Self {
        let mut factory = Self::empty();
        for (&parse_mode, spec) in &config.splitters {
            factory.insert(parse_mode, build_splitter(spec));
        }
        factory
    }

    pub fn with_splitter(
        mut self,
        parse_mode: ParseMode,
        splitter: impl MessageSplitter + 'static,
    ) -> Self {
        self.insert(parse_mode, Arc::new(splitter));
        self
    }

    /// Register `splitter` for `parse_mode`, returning the splitter it replaces.
    pub fn insert(
        &mut self,
        parse_mode: ParseMode,
        splitter: Arc<dyn MessageSplitter>,
    ) -> Option<Arc<dyn MessageSplitter>> {
        self.splitters.insert(parse_mode, splitter)
    }

    /// Splitter registered for `parse_mode`.
    pub fn get(&self, parse_mode: ParseMode) -> Result<&dyn MessageSplitter, SplitError> {
        self.splitters
            .get(&parse_mode)
            .map(|s| s.as_ref())
            .ok_or(SplitError::NotMapped(parse_mode))
    }

    /// Shortcut for `get(parse_mode)?.split(text)`.
    pub fn split(&self, parse_mode: ParseMode, text: &str) -> Result<Vec<String>, SplitError> {
        self.get(parse_mode)?.split(text)
    }

    /// Registered parse modes, in a stable order.
    pub fn parse_modes(&self) -> Vec<ParseMode> {
        let mut modes: Vec<ParseMode> = self.splitters.keys().copied().collect();
        modes.sort();
        modes
    }
}

impl Default for SplitterFactory {
    fn default() -> Self {
        Self::from_config(&FactoryConfig::default())
    }
}

impl fmt::Debug for SplitterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitterFactory")
            .field("parse_modes", &self.parse_modes())
            .finish()
    }
}

fn build_splitter(spec: &SplitterSpec) -> Arc<dyn MessageSplitter> {
    match *spec {
        SplitterSpec::Plain {
            max_message_length,
            parse_mode,
        } => Arc::new(PlainSplitter::new(max_message_length).with_parse_mode(parse_mode)),
        SplitterSpec::Html { max_message_length } => {
            Arc::new(HtmlSplitter::new(max_message_length))
        }
    }
}
