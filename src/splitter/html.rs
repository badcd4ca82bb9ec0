use super::context::SplitContext;
use super::{MessageSplitter, byte_index_after_n_chars};
use crate::error::SplitError;
use crate::options::MAX_MESSAGE_LENGTH;
use crate::tag::{Attribute, Tag};
use crate::types::ParseMode;

/// Splits HTML-formatted text into messages that each stay within the limit and are valid markup
/// on their own.
///
/// At every cut the tags still open are closed (most recent first) at the end of the message and
/// reopened, in their original order, at the start of the next one. Lengths include all markup,
/// counted in chars before entity parsing.
///
/// ```
/// use tgmarkup::{HtmlSplitter, MessageSplitter};
///
/// let splitter = HtmlSplitter::new(10);
/// let messages = splitter.split("12345<b>12345</b>12345").unwrap();
/// assert_eq!(messages, ["12345", "<b>123</b>", "<b>45</b>1", "2345"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlSplitter {
    max_message_length: usize,
}

impl HtmlSplitter {
    pub fn new(max_message_length: usize) -> Self {
        Self {
            max_message_length: max_message_length.max(1),
        }
    }
}

impl Default for HtmlSplitter {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_LENGTH)
    }
}

impl MessageSplitter for HtmlSplitter {
    fn parse_mode(&self) -> ParseMode {
        ParseMode::Html
    }

    fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    fn split(&self, text: &str) -> Result<Vec<String>, SplitError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut ctx = SplitContext::new(ParseMode::Html, self.max_message_length);
        scan(text, &mut ctx)?;
        let messages = ctx.into_messages();
        tracing::debug!(
            limit = self.max_message_length,
            messages = messages.len(),
            "split HTML text"
        );
        Ok(messages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HtmlTag {
    Opening(Tag),
    Closing { name: String },
}

fn scan(text: &str, ctx: &mut SplitContext) -> Result<(), SplitError> {
    let mut rest = text;
    while let Some(lt) = rest.find('<') {
        // An unterminated '<' is plain text up to the end of input.
        let Some(gt) = rest[lt + 1..].find('>').map(|i| lt + 1 + i) else {
            break;
        };
        handle_text(&rest[..lt], ctx)?;
        match parse_tag_body(&rest[lt + 1..gt])? {
            HtmlTag::Opening(tag) => handle_start_tag(tag, ctx)?,
            HtmlTag::Closing { name } => ctx.close(&name)?,
        }
        rest = &rest[gt + 1..];
    }
    handle_text(rest, ctx)?;

    // Flush whatever is left, including tags that were never closed.
    ctx.cut()
}

fn handle_start_tag(tag: Tag, ctx: &mut SplitContext) -> Result<(), SplitError> {
    // The tag must fit together with its own forced closing tag.
    let scope_len = tag.start_tag_len() + tag.end_tag_len();
    if ctx.closed_len() + scope_len >= ctx.limit() {
        ctx.cut()?;
        if ctx.closed_len() + scope_len >= ctx.limit() {
            return Err(ctx.unsplittable());
        }
    }
    ctx.open(tag);
    Ok(())
}

fn handle_text(text: &str, ctx: &mut SplitContext) -> Result<(), SplitError> {
    let mut remaining = text;
    let mut remaining_len = remaining.chars().count();
    while remaining_len > 0 {
        let room = ctx.limit().saturating_sub(ctx.closed_len());
        if remaining_len <= room {
            ctx.push_text(remaining);
            return Ok(());
        }

        let split_at = byte_index_after_n_chars(remaining, room);
        ctx.push_text(&remaining[..split_at]);
        ctx.cut()?;
        if ctx.closed_len() >= ctx.limit() {
            return Err(ctx.unsplittable());
        }
        remaining = &remaining[split_at..];
        remaining_len -= room;
    }
    Ok(())
}

fn malformed(body: &str) -> SplitError {
    SplitError::MalformedTag {
        body: body.to_string(),
    }
}

/// Parse the text between `<` and `>`.
fn parse_tag_body(body: &str) -> Result<HtmlTag, SplitError> {
    if let Some(rest) = body.strip_prefix('/') {
        let name = rest.trim();
        if name.is_empty() {
            return Err(malformed(body));
        }
        return Ok(HtmlTag::Closing {
            name: name.to_string(),
        });
    }

    let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
        return Err(malformed(body));
    }
    Ok(HtmlTag::Opening(Tag::new(
        name,
        parse_attributes(&body[name_end..]),
    )))
}

fn parse_attributes(s: &str) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = &rest[key_end..];

        let mut value = None;
        if let Some(after_eq) = rest.strip_prefix('=') {
            let (v, after) = split_attribute_value(after_eq);
            value = Some(v.to_string());
            rest = after;
        }
        if !key.is_empty() {
            attrs.push(Attribute::new(key, value));
        }
        rest = rest.trim_start();
    }
    attrs
}

/// Split an attribute value off the front of `s`, returning `(value, rest)`.
fn split_attribute_value(s: &str) -> (&str, &str) {
    match s.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &s[1..];
            match inner.find(quote) {
                Some(end) => (&inner[..end], &inner[end + 1..]),
                None => (inner, ""),
            }
        }
        _ => {
            let end = s.find(char::is_whitespace).unwrap_or(s.len());
            (&s[..end], &s[end..])
        }
    }
}
