use crate::error::SplitError;
use crate::tag::Tag;
use crate::types::ParseMode;

/// State of a single split call.
///
/// - `messages`: finished messages, each within the limit.
/// - `nodes`: rendered nodes of the message under construction. Closing tags for the tags still
///   open are not part of it; they are derived from `stack` when a message is cut.
/// - `stack`: currently open tags, oldest first. Closing a tag removes the most recently opened
///   tag with that name, wherever it sits, so overlapping elements such as
///   `<b> bold <i> both </b> italic </i>` keep the stack consistent.
///
/// Lengths are tracked incrementally in chars so the closed length of the current message is
/// known without rendering it.
#[derive(Debug)]
pub(super) struct SplitContext {
    parse_mode: ParseMode,
    limit: usize,
    messages: Vec<String>,
    nodes: Vec<String>,
    nodes_len: usize,
    stack: Vec<Tag>,
    closers_len: usize,
}

impl SplitContext {
    pub(super) fn new(parse_mode: ParseMode, limit: usize) -> Self {
        Self {
            parse_mode,
            limit,
            messages: Vec::new(),
            nodes: Vec::new(),
            nodes_len: 0,
            stack: Vec::new(),
            closers_len: 0,
        }
    }

    pub(super) fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the current message if it were cut right now.
    pub(super) fn closed_len(&self) -> usize {
        self.nodes_len + self.closers_len
    }

    pub(super) fn unsplittable(&self) -> SplitError {
        SplitError::unsplittable(self.parse_mode, self.limit)
    }

    pub(super) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push_node(text.to_string(), text.chars().count());
    }

    /// Open `tag`: it joins the stack and its start tag joins the current message.
    pub(super) fn open(&mut self, tag: Tag) {
        self.push_node(tag.start_tag().to_string(), tag.start_tag_len());
        self.closers_len += tag.end_tag_len();
        self.stack.push(tag);
    }

    /// Close the most recently opened tag named `name`.
    pub(super) fn close(&mut self, name: &str) -> Result<(), SplitError> {
        let Some(index) = self.stack.iter().rposition(|tag| tag.name() == name) else {
            return Err(SplitError::TagMismatch {
                tag: name.to_string(),
            });
        };
        let tag = self.stack.remove(index);
        let end_len = tag.end_tag_len();
        self.closers_len -= end_len;
        self.push_node(tag.end_tag(), end_len);
        Ok(())
    }

    /// Finish the current message with closing tags for everything still open, then start the
    /// next one by reopening those tags in their original order.
    pub(super) fn cut(&mut self) -> Result<(), SplitError> {
        let message = self.render();
        if message.is_empty() {
            return Err(self.unsplittable());
        }
        tracing::trace!(
            index = self.messages.len(),
            len = self.closed_len(),
            open_tags = self.stack.len(),
            "cut message"
        );
        self.messages.push(message);

        self.nodes = self.stack.iter().map(|tag| tag.start_tag().to_string()).collect();
        self.nodes_len = self.stack.iter().map(Tag::start_tag_len).sum();
        Ok(())
    }

    pub(super) fn into_messages(self) -> Vec<String> {
        self.messages
    }

    fn push_node(&mut self, node: String, len: usize) {
        self.nodes_len += len;
        self.nodes.push(node);
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.nodes.iter().map(String::len).sum::<usize>());
        for node in &self.nodes {
            out.push_str(node);
        }
        for tag in self.stack.iter().rev() {
            out.push_str(&tag.end_tag());
        }
        out
    }
}
