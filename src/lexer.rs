// ==============================================================================
// Tokenizer
// ==============================================================================
//
// The lexer is context-aware: the parser passes the set of terminals that are
// valid at the current position, and ambiguous spellings resolve against it.
// A word such as `record` is the `record` keyword where the keyword can appear
// and a plain identifier elsewhere; a string such as `"type"` is the
// `"type"` keyword string inside a schema object and an ordinary string inside
// a default value.
//
// Lexing never fails. Input that matches nothing becomes a one-character
// error token, so every call advances.

use std::sync::LazyLock;

use regex::Regex;

use crate::grammar::{Terminal, TerminalSet};
use crate::scanner::{Dialect, ScannerState};

/// Characters no identifier may contain. `.` and `-` are excluded only for
/// plain identifiers; dotted names accept them after the first character.
const EXCLUDED: &str = r#"\x00-\x1F\s\p{Zs}:;"'@#,|^&<=>+*/\\%?!~()\[\]{}\x{FEFF}\x{2060}\x{200B}\x{2028}\x{2029}"#;
const ESCAPE: &str = r"\\u[0-9a-fA-F]{4}|\\u\{[0-9a-fA-F]+\}";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    let start = format!(r"(?:[^0-9.\-{EXCLUDED}]|{ESCAPE})");
    let rest = format!(r"(?:[^.\-{EXCLUDED}]|{ESCAPE})");
    Regex::new(&format!("^{start}{rest}*")).expect("identifier pattern is valid")
});

static NAMESPACE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    let start = format!(r"(?:[^0-9.\-{EXCLUDED}]|{ESCAPE})");
    let rest = format!(r"(?:[^{EXCLUDED}]|{ESCAPE})");
    Regex::new(&format!("^{start}{rest}*")).expect("namespace pattern is valid")
});

/// A lexed token. Positions are byte offsets into the parsed text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) terminal: Terminal,
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// One past the last byte examined to decide where the token ends.
    pub(crate) lookahead_end: usize,
    /// Scanner state after this token.
    pub(crate) scanner_after: ScannerState,
}

impl Token {
    pub(crate) fn is_trivia(&self) -> bool {
        self.terminal.is_trivia()
    }
}

pub(crate) fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{FEFF}' | '\u{2060}' | '\u{200B}')
}

/// How far past a token's end the scanners may look: a number like `1`
/// checks `e+5` before deciding it ends.
const LOOKAHEAD_CHARS: usize = 3;

/// Lex the token at `pos`. `valid` decides between keyword and identifier
/// (or keyword string and string) spellings.
pub(crate) fn lex(text: &str, pos: usize, valid: TerminalSet, scanner: ScannerState) -> Token {
    let mut scanner = scanner;
    let (terminal, end) = next_token(text, pos, valid, &mut scanner);
    if !terminal.is_trivia() {
        scanner.observe(terminal);
    }
    let lookahead_end = text[end..]
        .char_indices()
        .nth(LOOKAHEAD_CHARS - 1)
        .map_or(text.len(), |(i, c)| end + i + c.len_utf8());
    tracing::trace!(
        terminal = terminal.text(),
        start = pos,
        end,
        "lexed token"
    );
    Token {
        terminal,
        start: pos,
        end,
        lookahead_end,
        scanner_after: scanner,
    }
}

fn next_token(
    text: &str,
    pos: usize,
    valid: TerminalSet,
    scanner: &mut ScannerState,
) -> (Terminal, usize) {
    let rest = &text[pos..];
    let Some(first) = rest.chars().next() else {
        return (Terminal::End, pos);
    };

    // Trivia
    if is_whitespace(first) {
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_whitespace(c))
            .map_or(rest.len(), |(i, _)| i);
        return (Terminal::Whitespace, pos + len);
    }
    if let Some(scan) = scanner.scan_comment(text, pos) {
        return (scan.terminal, scan.end);
    }

    // Annotations
    if first == '@' {
        return match NAMESPACE_IDENTIFIER.find(&rest[1..]) {
            Some(m) => (Terminal::AnnotationIdentifier, pos + 1 + m.end()),
            None => (Terminal::Error, pos + 1),
        };
    }

    // Strings, possibly keyword strings
    if let Some(scan) = scanner.scan_string(text, pos) {
        if scan.terminal == Terminal::String
            && let Some(keyword) = Terminal::keyword_string(&text[pos..scan.end])
            && valid.contains(keyword)
        {
            return (keyword, scan.end);
        }
        return (scan.terminal, scan.end);
    }

    if let Some(end) = scanner.scan_number(text, pos) {
        return (Terminal::Number, end);
    }

    if let Some(token) = lex_word(rest, valid, scanner.dialect()) {
        return (token.0, pos + token.1);
    }

    if let Some(t) = punctuation(first) {
        return (t, pos + 1);
    }

    (Terminal::Error, pos + first.len_utf8())
}

/// Resolve a word to a keyword, number, dotted name or identifier. `NaN` and
/// `Infinity` are numbers in IDL only.
fn lex_word(rest: &str, valid: TerminalSet, dialect: Dialect) -> Option<(Terminal, usize)> {
    let identifier = IDENTIFIER.find(rest).map(|m| m.end());
    let namespace = NAMESPACE_IDENTIFIER.find(rest).map(|m| m.end());
    let (ident_len, ns_len) = match (identifier, namespace) {
        (Some(i), Some(n)) => (i, n),
        (None, Some(n)) => (n, n),
        (Some(i), None) => (i, i),
        (None, None) => return None,
    };
    let word = &rest[..ident_len];
    let keyword = Terminal::keyword(word);

    if let Some(kw) = keyword
        && valid.contains(kw)
    {
        return Some((kw, ident_len));
    }
    if matches!(word, "NaN" | "Infinity")
        && dialect == Dialect::Idl
        && valid.contains(Terminal::Number)
    {
        return Some((Terminal::Number, ident_len));
    }
    let identifier_valid = valid.contains(Terminal::Identifier);
    if valid.contains(Terminal::NamespaceIdentifier) && (ns_len > ident_len || !identifier_valid)
    {
        return Some((Terminal::NamespaceIdentifier, ns_len));
    }
    if identifier_valid {
        return Some((Terminal::Identifier, ident_len));
    }
    // Nothing word-like fits here. Prefer the keyword reading so recovery and
    // diagnostics see what the author most likely meant.
    match keyword {
        Some(kw) => Some((kw, ident_len)),
        None if ns_len > ident_len => Some((Terminal::NamespaceIdentifier, ns_len)),
        None => Some((Terminal::Identifier, ident_len)),
    }
}

fn punctuation(c: char) -> Option<Terminal> {
    Some(match c {
        '{' => Terminal::LBrace,
        '}' => Terminal::RBrace,
        '[' => Terminal::LBracket,
        ']' => Terminal::RBracket,
        '(' => Terminal::LParen,
        ')' => Terminal::RParen,
        '<' => Terminal::LAngle,
        '>' => Terminal::RAngle,
        ':' => Terminal::Colon,
        ',' => Terminal::Comma,
        ';' => Terminal::Semicolon,
        '=' => Terminal::Equals,
        '?' => Terminal::Question,
        _ => return None,
    })
}
