//! Markup tags as seen by the HTML splitter.
//!
//! A [`Tag`] holds the name and attributes of one opening tag. It never holds element content;
//! the splitter only needs the start and end renderings to close a scope at a cut point and to
//! reopen it at the start of the next fragment.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Values are double-quoted. A value containing `"` is single-quoted instead, or, if it
    /// contains both quote characters, double-quoted with `"` written as `&quot;`.
    fn render_into(&self, out: &mut String) {
        out.push_str(&self.key);
        let Some(value) = &self.value else {
            return;
        };
        out.push('=');
        if !value.contains('"') {
            out.push('"');
            out.push_str(value);
            out.push('"');
        } else if !value.contains('\'') {
            out.push('\'');
            out.push_str(value);
            out.push('\'');
        } else {
            out.push('"');
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    name: String,
    attrs: Vec<Attribute>,
    start: String,
    start_len: usize,
}

impl Tag {
    /// `name` is the bare tag name, without `<`, `>` or `/`.
    pub fn new(name: impl Into<String>, attrs: Vec<Attribute>) -> Self {
        let name = name.into();
        let start = render_start_tag(&name, &attrs);
        let start_len = start.chars().count();
        Self {
            name,
            attrs,
            start,
            start_len,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Opening tag with attributes, e.g. `<a href="https://example.org">`.
    ///
    /// Attributes without a value are rendered as a bare key (`<option selected>`).
    pub fn start_tag(&self) -> &str {
        &self.start
    }

    pub fn end_tag(&self) -> String {
        format!("</{}>", self.name)
    }

    /// Length of [`Tag::start_tag`] in chars.
    pub fn start_tag_len(&self) -> usize {
        self.start_len
    }

    /// Length of [`Tag::end_tag`] in chars.
    pub fn end_tag_len(&self) -> usize {
        self.name.chars().count() + 3
    }
}

fn render_start_tag(name: &str, attrs: &[Attribute]) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('<');
    out.push_str(name);
    for attr in attrs {
        out.push(' ');
        attr.render_into(&mut out);
    }
    out.push('>');
    out
}
