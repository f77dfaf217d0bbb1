// ==============================================================================
// Documentation Comments
// ==============================================================================
//
// A `/** ... */` comment directly in front of a declaration documents it.
// Comments are extras, so they sit among the declaration's siblings rather
// than inside it; the lookup walks backwards from the declaration over
// whitespace until it meets a comment or anything else.

use crate::grammar::NodeKind;
use crate::tree::TreeCursor;

/// The documentation attached to the node under `cursor`, with its comment
/// delimiters and left margin removed.
///
/// Only whitespace and empty `/**/` comments may separate the comment from
/// the node. Returns `None` when there is no such comment, when the nearest
/// comment is an ordinary `/* */` or `//` comment, or when it is blank.
#[must_use]
pub fn doc_comment(cursor: &TreeCursor<'_>, source: &str) -> Option<String> {
    let (parent, index) = cursor.parent_and_index()?;
    for i in (0..index).rev() {
        let sibling = parent.child(i)?;
        match sibling.kind() {
            NodeKind::Whitespace => {}
            NodeKind::Comment if sibling.utf8_text(source) == "/**/" => {}
            NodeKind::Comment => return comment_body(sibling.utf8_text(source)),
            _ => return None,
        }
    }
    None
}

fn comment_body(comment: &str) -> Option<String> {
    let body = comment.strip_prefix("/**")?.strip_suffix("*/")?.trim();
    if body.is_empty() {
        return None;
    }
    Some(strip_indents(body))
}

/// The left margin shared by the lines of a comment body.
#[derive(Debug, PartialEq, Eq)]
enum Margin<'a> {
    /// Every line starts with this many `*` (one or two) after its
    /// indentation.
    Stars(usize),
    /// Every line after the first starts with this whitespace.
    Indent(&'a str),
    None,
}

fn margin<'a>(lines: &[&'a str]) -> Margin<'a> {
    let Some((first, rest)) = lines.split_first() else {
        return Margin::None;
    };

    let stars = first.chars().take(2).take_while(|&c| c == '*').count();
    if stars > 0 {
        let prefix = &first[..stars];
        let aligned = rest.iter().all(|line| {
            let line = line.trim_start();
            line.is_empty() || line.starts_with(prefix)
        });
        if aligned {
            return Margin::Stars(stars);
        }
    }

    let mut shared: Option<&str> = None;
    for line in rest.iter().filter(|line| !line.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start().len()];
        shared = Some(match shared {
            None => indent,
            Some(current) => shared_prefix(current, indent),
        });
    }
    match shared {
        Some(indent) if !indent.is_empty() => Margin::Indent(indent),
        _ => Margin::None,
    }
}

/// Remove the left margin from a trimmed comment body: a column of one or
/// two stars (with one following space), or else the whitespace indentation
/// the lines after the first have in common.
pub(crate) fn strip_indents(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let stripped: Vec<&str> = match margin(&lines) {
        Margin::Stars(stars) => lines
            .iter()
            .map(|line| {
                let line = line.trim_start();
                let after = line.get(stars..).unwrap_or("");
                after.strip_prefix(' ').unwrap_or(after)
            })
            .collect(),
        Margin::Indent(indent) => lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line
                } else {
                    line.strip_prefix(indent).unwrap_or(line)
                }
            })
            .collect(),
        Margin::None => return body.to_string(),
    };
    stripped.join("\n")
}

fn shared_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i);
    &a[..end]
}
