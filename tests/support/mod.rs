#![allow(dead_code)]

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Text content of `markup` with every `<...>` tag removed.
pub fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(lt) = rest.find('<') {
        let Some(gt) = rest[lt..].find('>').map(|i| lt + i) else {
            break;
        };
        out.push_str(&rest[..lt]);
        rest = &rest[gt + 1..];
    }
    out.push_str(rest);
    out
}

/// Tag names of `markup` in document order, as `(is_closing, name)`.
pub fn tag_events(markup: &str) -> Vec<(bool, String)> {
    let mut events = Vec::new();
    let mut rest = markup;
    while let Some(lt) = rest.find('<') {
        let Some(gt) = rest[lt..].find('>').map(|i| lt + i) else {
            break;
        };
        let body = &rest[lt + 1..gt];
        match body.strip_prefix('/') {
            Some(name) => events.push((true, name.trim().to_string())),
            None => {
                let name = body.split_whitespace().next().unwrap_or("");
                events.push((false, name.to_string()));
            }
        }
        rest = &rest[gt + 1..];
    }
    events
}

/// Every tag opened in `fragment` is closed in it, and every closing tag has an opener.
///
/// Overlapping elements are accepted: a closing tag matches the most recent open tag with the
/// same name.
pub fn assert_self_contained(fragment: &str) {
    let mut open: Vec<String> = Vec::new();
    for (closing, name) in tag_events(fragment) {
        if closing {
            let index = open
                .iter()
                .rposition(|n| *n == name)
                .unwrap_or_else(|| panic!("unmatched </{name}> in {fragment:?}"));
            open.remove(index);
        } else {
            open.push(name);
        }
    }
    assert!(open.is_empty(), "unclosed {open:?} in {fragment:?}");
}
