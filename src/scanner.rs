// ==============================================================================
// External Scanner
// ==============================================================================
//
// Hand-written scanning for the tokens a regular expression cannot describe
// well: nested block comments, strings whose quoting depends on the dialect,
// and numbers whose syntax does too. The scanner carries a small amount of
// state between tokens (the dialect and the comment nesting depth) and every
// node records a checkpoint of it, so an incremental re-parse can resume
// lexing after a reused subtree exactly where the original parse was.

use crate::grammar::Terminal;

/// Which Avro dialect the document is written in, fixed by its first
/// significant token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    #[default]
    Unknown,
    /// Schema JSON (`.avsc`).
    Json,
    /// Avro IDL (`.avdl`).
    Idl,
}

/// Scanner state carried from one token to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScannerState {
    dialect: Dialect,
    comment_depth: u8,
}

/// The result of a successful external scan: the terminal and its end offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Scan {
    pub(crate) terminal: Terminal,
    pub(crate) end: usize,
}

impl ScannerState {
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[must_use]
    pub fn comment_depth(&self) -> u8 {
        self.comment_depth
    }

    /// Two bytes: the dialect tag and the comment depth.
    #[must_use]
    pub fn serialize(&self) -> [u8; 2] {
        let tag = match self.dialect {
            Dialect::Unknown => 0,
            Dialect::Json => 1,
            Dialect::Idl => 2,
        };
        [tag, self.comment_depth]
    }

    /// Restore a state written by [`serialize`](Self::serialize). Missing or
    /// unknown bytes fall back to the initial state.
    #[must_use]
    pub fn deserialize(bytes: &[u8]) -> ScannerState {
        let dialect = match bytes.first() {
            Some(1) => Dialect::Json,
            Some(2) => Dialect::Idl,
            _ => Dialect::Unknown,
        };
        let comment_depth = bytes.get(1).copied().unwrap_or(0);
        ScannerState {
            dialect,
            comment_depth,
        }
    }

    /// Record a significant token. The first one decides the dialect.
    pub(crate) fn observe(&mut self, terminal: Terminal) {
        if self.dialect != Dialect::Unknown || terminal.is_trivia() || terminal == Terminal::End {
            return;
        }
        let json = matches!(
            terminal,
            Terminal::LBrace | Terminal::LBracket | Terminal::String
        ) || Terminal::keyword_string(terminal.text()) == Some(terminal);
        self.dialect = if json { Dialect::Json } else { Dialect::Idl };
        tracing::trace!(dialect = ?self.dialect, "dialect detected");
    }

    // ==========================================================================
    // Comments
    // ==========================================================================

    /// Scan a `//` line comment or a (nested) `/* */` block comment.
    ///
    /// An unterminated block comment runs to the end of input as an error
    /// token and leaves its open depth in the state.
    pub(crate) fn scan_comment(&mut self, text: &str, pos: usize) -> Option<Scan> {
        let rest = &text[pos..];
        if self.comment_depth == 0 && rest.starts_with("//") {
            let len = rest
                .find(['\r', '\n', '\u{2028}', '\u{2029}'])
                .unwrap_or(rest.len());
            return Some(Scan {
                terminal: Terminal::Comment,
                end: pos + len,
            });
        }

        let bytes = text.as_bytes();
        let mut depth = self.comment_depth;
        let mut i = pos;
        if depth == 0 {
            if !rest.starts_with("/*") {
                return None;
            }
            depth = 1;
            i += 2;
        }
        while i < bytes.len() {
            match (bytes[i], bytes.get(i + 1)) {
                (b'/', Some(b'*')) => {
                    depth = depth.saturating_add(1);
                    i += 2;
                }
                (b'*', Some(b'/')) => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        self.comment_depth = 0;
                        return Some(Scan {
                            terminal: Terminal::Comment,
                            end: i,
                        });
                    }
                }
                _ => i += 1,
            }
        }
        self.comment_depth = depth;
        Some(Scan {
            terminal: Terminal::Error,
            end: text.len(),
        })
    }

    // ==========================================================================
    // Strings
    // ==========================================================================

    /// Scan a quoted string. JSON only knows double quotes; IDL also accepts
    /// single quotes. A backslash escapes any character, newlines included.
    /// A string still open at the end of its line becomes an error token up
    /// to the line break.
    pub(crate) fn scan_string(&self, text: &str, pos: usize) -> Option<Scan> {
        let bytes = text.as_bytes();
        let quote = *bytes.get(pos)?;
        let accepted = match quote {
            b'"' => true,
            b'\'' => self.dialect != Dialect::Json,
            _ => false,
        };
        if !accepted {
            return None;
        }
        let mut i = pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    // Skip the escaped character, which may be multi-byte.
                    i += 1;
                    if let Some(c) = text.get(i..).and_then(|r| r.chars().next()) {
                        i += c.len_utf8();
                    }
                }
                b'\n' => {
                    return Some(Scan {
                        terminal: Terminal::Error,
                        end: i,
                    });
                }
                b if b == quote => {
                    return Some(Scan {
                        terminal: Terminal::String,
                        end: i + 1,
                    });
                }
                _ => i += 1,
            }
        }
        Some(Scan {
            terminal: Terminal::Error,
            end: text.len(),
        })
    }

    // ==========================================================================
    // Numbers
    // ==========================================================================

    /// Scan a number literal, returning its end offset.
    pub(crate) fn scan_number(&self, text: &str, pos: usize) -> Option<usize> {
        match self.dialect {
            Dialect::Json => scan_json_number(text.as_bytes(), pos),
            Dialect::Idl | Dialect::Unknown => scan_idl_number(text, pos),
        }
    }
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`
fn scan_json_number(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut i = pos;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = skip_digits(bytes, i, false),
        _ => return None,
    }
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i = skip_digits(bytes, i + 1, false);
    }
    Some(skip_exponent(bytes, i, false))
}

fn scan_idl_number(text: &str, pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = pos;
    let signed = matches!(bytes.get(i), Some(b'-' | b'+'));
    if signed {
        i += 1;
        // Unsigned `NaN` and `Infinity` are words; the lexer turns them into
        // numbers where one is expected.
        for special in ["NaN", "Infinity"] {
            if text[i..].starts_with(special) && !continues_word(text, i + special.len()) {
                return Some(i + special.len());
            }
        }
    }

    if bytes.get(i) == Some(&b'0')
        && matches!(bytes.get(i + 1), Some(b'x' | b'X'))
        && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
    {
        i += 2;
        while let Some(&b) = bytes.get(i) {
            let separated = b == b'_' && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit);
            if b.is_ascii_hexdigit() || separated {
                i += 1;
            } else {
                break;
            }
        }
        if matches!(bytes.get(i), Some(b'l' | b'L')) {
            i += 1;
        }
        return Some(i);
    }

    let integer_start = i;
    if bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i = skip_digits(bytes, i, true);
    }
    let has_integer = i > integer_start;
    let mut has_fraction = false;
    if bytes.get(i) == Some(&b'.') {
        let after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        if after {
            i = skip_digits(bytes, i + 1, true);
            has_fraction = true;
        } else if has_integer {
            // `1.` is a complete literal.
            i += 1;
        }
    }
    if !has_integer && !has_fraction {
        return None;
    }
    i = skip_exponent(bytes, i, true);
    if matches!(bytes.get(i), Some(b'l' | b'L' | b'f' | b'F' | b'd' | b'D')) {
        i += 1;
    }
    Some(i)
}

/// Skip `[0-9]+`, optionally with single `_` separators between digits.
fn skip_digits(bytes: &[u8], mut i: usize, separators: bool) -> usize {
    while let Some(&b) = bytes.get(i) {
        let separated =
            separators && b == b'_' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        if b.is_ascii_digit() || separated {
            i += 1;
        } else {
            break;
        }
    }
    i
}

fn skip_exponent(bytes: &[u8], i: usize, separators: bool) -> usize {
    if !matches!(bytes.get(i), Some(b'e' | b'E')) {
        return i;
    }
    let mut j = i + 1;
    if matches!(bytes.get(j), Some(b'+' | b'-')) {
        j += 1;
    }
    if bytes.get(j).is_some_and(u8::is_ascii_digit) {
        skip_digits(bytes, j, separators)
    } else {
        i
    }
}

fn continues_word(text: &str, at: usize) -> bool {
    text[at..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dialect: Dialect) -> ScannerState {
        ScannerState {
            dialect,
            comment_depth: 0,
        }
    }

    // ==========================================================================
    // State
    // ==========================================================================

    #[test]
    fn serialize_round_trips() {
        for dialect in [Dialect::Unknown, Dialect::Json, Dialect::Idl] {
            let original = ScannerState {
                dialect,
                comment_depth: 3,
            };
            assert_eq!(ScannerState::deserialize(&original.serialize()), original);
        }
        assert_eq!(ScannerState::deserialize(&[]), ScannerState::default());
    }

    #[test]
    fn first_significant_token_fixes_the_dialect() {
        let mut s = ScannerState::default();
        s.observe(Terminal::Whitespace);
        s.observe(Terminal::Comment);
        assert_eq!(s.dialect(), Dialect::Unknown);
        s.observe(Terminal::LBrace);
        assert_eq!(s.dialect(), Dialect::Json);
        s.observe(Terminal::KwProtocol);
        assert_eq!(s.dialect(), Dialect::Json);

        let mut s = ScannerState::default();
        s.observe(Terminal::AnnotationIdentifier);
        assert_eq!(s.dialect(), Dialect::Idl);

        let mut s = ScannerState::default();
        s.observe(Terminal::JsonString);
        assert_eq!(s.dialect(), Dialect::Json);
    }

    // ==========================================================================
    // Comments
    // ==========================================================================

    #[test]
    fn line_comment_stops_at_newline() {
        let mut s = ScannerState::default();
        let text = "// hi\nrecord";
        let scan = s.scan_comment(text, 0).expect("comment");
        assert_eq!(scan.terminal, Terminal::Comment);
        assert_eq!(&text[..scan.end], "// hi");
    }

    #[test]
    fn block_comments_nest() {
        let mut s = ScannerState::default();
        let text = "/* a /* b */ c */ record";
        let scan = s.scan_comment(text, 0).expect("comment");
        assert_eq!(scan.terminal, Terminal::Comment);
        assert_eq!(&text[..scan.end], "/* a /* b */ c */");
        assert_eq!(s.comment_depth(), 0);
    }

    #[test]
    fn unterminated_block_comment_keeps_its_depth() {
        let mut s = ScannerState::default();
        let text = "/* a /* b */ record";
        let scan = s.scan_comment(text, 0).expect("comment");
        assert_eq!(scan.terminal, Terminal::Error);
        assert_eq!(scan.end, text.len());
        assert_eq!(s.comment_depth(), 1);
    }

    #[test]
    fn slash_alone_is_not_a_comment() {
        let mut s = ScannerState::default();
        assert_eq!(s.scan_comment("/ x", 0), None);
    }

    // ==========================================================================
    // Strings
    // ==========================================================================

    #[test]
    fn strings_honor_escapes() {
        let s = state(Dialect::Json);
        let text = r#""a\"b" rest"#;
        let scan = s.scan_string(text, 0).expect("string");
        assert_eq!(scan.terminal, Terminal::String);
        assert_eq!(&text[..scan.end], r#""a\"b""#);
    }

    #[test]
    fn single_quotes_are_idl_only() {
        assert_eq!(state(Dialect::Json).scan_string("'x'", 0), None);
        let scan = state(Dialect::Idl).scan_string("'x'", 0).expect("string");
        assert_eq!(scan.end, 3);
    }

    #[test]
    fn unterminated_string_stops_at_end_of_line() {
        let s = state(Dialect::Idl);
        let text = "\"abc\nrecord";
        let scan = s.scan_string(text, 0).expect("scan");
        assert_eq!(scan.terminal, Terminal::Error);
        assert_eq!(scan.end, 4);

        let scan = s.scan_string("\"abc", 0).expect("scan");
        assert_eq!(scan.terminal, Terminal::Error);
        assert_eq!(scan.end, 4);
    }

    // ==========================================================================
    // Numbers
    // ==========================================================================

    fn number(dialect: Dialect, text: &str) -> Option<&str> {
        state(dialect).scan_number(text, 0).map(|end| &text[..end])
    }

    #[test]
    fn json_numbers_are_strict() {
        assert_eq!(number(Dialect::Json, "-12.5e3,"), Some("-12.5e3"));
        assert_eq!(number(Dialect::Json, "0123"), Some("0"));
        assert_eq!(number(Dialect::Json, "1_000"), Some("1"));
        assert_eq!(number(Dialect::Json, "10L"), Some("10"));
        assert_eq!(number(Dialect::Json, "+1"), None);
        assert_eq!(number(Dialect::Json, ".5"), None);
        assert_eq!(number(Dialect::Json, "1.x"), Some("1"));
    }

    #[test]
    fn idl_numbers_allow_suffixes_and_separators() {
        assert_eq!(number(Dialect::Idl, "1_000_000;"), Some("1_000_000"));
        assert_eq!(number(Dialect::Idl, "0x1F_FFL)"), Some("0x1F_FFL"));
        assert_eq!(number(Dialect::Idl, "12L;"), Some("12L"));
        assert_eq!(number(Dialect::Idl, "1.5f;"), Some("1.5f"));
        assert_eq!(number(Dialect::Idl, "2.0e-3D;"), Some("2.0e-3D"));
        assert_eq!(number(Dialect::Idl, ".5;"), Some(".5"));
        assert_eq!(number(Dialect::Idl, "1.;"), Some("1."));
        assert_eq!(number(Dialect::Idl, "+7"), Some("+7"));
        assert_eq!(number(Dialect::Idl, "-Infinity;"), Some("-Infinity"));
        assert_eq!(number(Dialect::Idl, "-NaN"), Some("-NaN"));
        assert_eq!(number(Dialect::Idl, "-NaNs"), None);
        assert_eq!(number(Dialect::Idl, "1__0"), Some("1"));
        assert_eq!(number(Dialect::Idl, "-"), None);
        assert_eq!(number(Dialect::Idl, "x"), None);
    }
}
