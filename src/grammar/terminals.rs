// ==============================================================================
// Terminals
// ==============================================================================
//
// Every token the lexer can produce. Both dialects share one vocabulary so a
// single table drives both; which subset is in play at a given offset is
// decided by the parser state, never by the lexer alone.

use super::kinds::NodeKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Terminal {
    End,

    // Punctuation. `{` sorts first so it wins insertion ties.
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LAngle,
    RAngle,
    Colon,
    Comma,
    Semicolon,
    Equals,
    Question,

    Identifier,
    NamespaceIdentifier,
    AnnotationIdentifier,
    String,
    Number,

    // IDL keywords, extracted from identifiers.
    KwProtocol,
    KwNamespace,
    KwSchema,
    KwImport,
    KwRecord,
    KwError,
    KwEnum,
    KwFixed,
    KwThrows,
    KwOneway,
    KwVoid,
    KwArray,
    KwMap,
    KwUnion,
    KwDecimal,
    KwDate,
    KwTimeMs,
    KwTimestampMs,
    KwLocalTimestampMs,
    KwUuid,
    KwInt,
    KwLong,
    KwString,
    KwBoolean,
    KwFloat,
    KwDouble,
    KwBytes,
    KwNull,
    KwTrue,
    KwFalse,

    // JSON keyword strings, extracted from string literals.
    JsonType,
    JsonName,
    JsonNamespace,
    JsonDoc,
    JsonAliases,
    JsonFields,
    JsonSymbols,
    JsonItems,
    JsonValues,
    JsonSize,
    JsonDefault,
    JsonOrder,
    JsonRecord,
    JsonEnum,
    JsonFixed,
    JsonArray,
    JsonMap,
    JsonNull,
    JsonBoolean,
    JsonInt,
    JsonLong,
    JsonFloat,
    JsonDouble,
    JsonBytes,
    JsonString,

    // Trivia and the lexer's catch-all.
    Whitespace,
    Comment,
    Error,
}

pub(crate) const TERMINAL_COUNT: usize = Terminal::Error as usize + 1;

const IDL_KEYWORDS: &[Terminal] = &[
    Terminal::KwProtocol,
    Terminal::KwNamespace,
    Terminal::KwSchema,
    Terminal::KwImport,
    Terminal::KwRecord,
    Terminal::KwError,
    Terminal::KwEnum,
    Terminal::KwFixed,
    Terminal::KwThrows,
    Terminal::KwOneway,
    Terminal::KwVoid,
    Terminal::KwArray,
    Terminal::KwMap,
    Terminal::KwUnion,
    Terminal::KwDecimal,
    Terminal::KwDate,
    Terminal::KwTimeMs,
    Terminal::KwTimestampMs,
    Terminal::KwLocalTimestampMs,
    Terminal::KwUuid,
    Terminal::KwInt,
    Terminal::KwLong,
    Terminal::KwString,
    Terminal::KwBoolean,
    Terminal::KwFloat,
    Terminal::KwDouble,
    Terminal::KwBytes,
    Terminal::KwNull,
    Terminal::KwTrue,
    Terminal::KwFalse,
];

const JSON_KEYWORDS: &[Terminal] = &[
    Terminal::JsonType,
    Terminal::JsonName,
    Terminal::JsonNamespace,
    Terminal::JsonDoc,
    Terminal::JsonAliases,
    Terminal::JsonFields,
    Terminal::JsonSymbols,
    Terminal::JsonItems,
    Terminal::JsonValues,
    Terminal::JsonSize,
    Terminal::JsonDefault,
    Terminal::JsonOrder,
    Terminal::JsonRecord,
    Terminal::JsonEnum,
    Terminal::JsonFixed,
    Terminal::JsonArray,
    Terminal::JsonMap,
    Terminal::JsonNull,
    Terminal::JsonBoolean,
    Terminal::JsonInt,
    Terminal::JsonLong,
    Terminal::JsonFloat,
    Terminal::JsonDouble,
    Terminal::JsonBytes,
    Terminal::JsonString,
];

impl Terminal {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_index(index: usize) -> Option<Terminal> {
        (index < TERMINAL_COUNT).then(|| ALL_TERMINALS[index])
    }

    /// The literal text of punctuation and keywords, or the rule name of
    /// pattern tokens.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Terminal::End => "end",
            Terminal::LBrace => "{",
            Terminal::RBrace => "}",
            Terminal::LBracket => "[",
            Terminal::RBracket => "]",
            Terminal::LParen => "(",
            Terminal::RParen => ")",
            Terminal::LAngle => "<",
            Terminal::RAngle => ">",
            Terminal::Colon => ":",
            Terminal::Comma => ",",
            Terminal::Semicolon => ";",
            Terminal::Equals => "=",
            Terminal::Question => "?",
            Terminal::Identifier => "identifier",
            Terminal::NamespaceIdentifier => "namespace_identifier",
            Terminal::AnnotationIdentifier => "annotation_identifier",
            Terminal::String => "string",
            Terminal::Number => "number",
            Terminal::KwProtocol => "protocol",
            Terminal::KwNamespace => "namespace",
            Terminal::KwSchema => "schema",
            Terminal::KwImport => "import",
            Terminal::KwRecord => "record",
            Terminal::KwError => "error",
            Terminal::KwEnum => "enum",
            Terminal::KwFixed => "fixed",
            Terminal::KwThrows => "throws",
            Terminal::KwOneway => "oneway",
            Terminal::KwVoid => "void",
            Terminal::KwArray => "array",
            Terminal::KwMap => "map",
            Terminal::KwUnion => "union",
            Terminal::KwDecimal => "decimal",
            Terminal::KwDate => "date",
            Terminal::KwTimeMs => "time_ms",
            Terminal::KwTimestampMs => "timestamp_ms",
            Terminal::KwLocalTimestampMs => "local_timestamp_ms",
            Terminal::KwUuid => "uuid",
            Terminal::KwInt => "int",
            Terminal::KwLong => "long",
            Terminal::KwString => "string",
            Terminal::KwBoolean => "boolean",
            Terminal::KwFloat => "float",
            Terminal::KwDouble => "double",
            Terminal::KwBytes => "bytes",
            Terminal::KwNull => "null",
            Terminal::KwTrue => "true",
            Terminal::KwFalse => "false",
            Terminal::JsonType => "\"type\"",
            Terminal::JsonName => "\"name\"",
            Terminal::JsonNamespace => "\"namespace\"",
            Terminal::JsonDoc => "\"doc\"",
            Terminal::JsonAliases => "\"aliases\"",
            Terminal::JsonFields => "\"fields\"",
            Terminal::JsonSymbols => "\"symbols\"",
            Terminal::JsonItems => "\"items\"",
            Terminal::JsonValues => "\"values\"",
            Terminal::JsonSize => "\"size\"",
            Terminal::JsonDefault => "\"default\"",
            Terminal::JsonOrder => "\"order\"",
            Terminal::JsonRecord => "\"record\"",
            Terminal::JsonEnum => "\"enum\"",
            Terminal::JsonFixed => "\"fixed\"",
            Terminal::JsonArray => "\"array\"",
            Terminal::JsonMap => "\"map\"",
            Terminal::JsonNull => "\"null\"",
            Terminal::JsonBoolean => "\"boolean\"",
            Terminal::JsonInt => "\"int\"",
            Terminal::JsonLong => "\"long\"",
            Terminal::JsonFloat => "\"float\"",
            Terminal::JsonDouble => "\"double\"",
            Terminal::JsonBytes => "\"bytes\"",
            Terminal::JsonString => "\"string\"",
            Terminal::Whitespace => "whitespace",
            Terminal::Comment => "comment",
            Terminal::Error => "error",
        }
    }

    /// The node kind of a leaf for this terminal. `null` is anonymous: as a
    /// JSON value it sits under a `null` node, as a type it is a bare
    /// keyword like `int`.
    #[must_use]
    pub fn kind(self) -> NodeKind {
        match self {
            Terminal::Identifier => NodeKind::Identifier,
            Terminal::NamespaceIdentifier => NodeKind::NamespaceIdentifier,
            Terminal::AnnotationIdentifier => NodeKind::AnnotationIdentifier,
            Terminal::String => NodeKind::String,
            Terminal::Number => NodeKind::Number,
            Terminal::KwTrue => NodeKind::True,
            Terminal::KwFalse => NodeKind::False,
            Terminal::Whitespace => NodeKind::Whitespace,
            Terminal::Comment => NodeKind::Comment,
            Terminal::Error => NodeKind::Error,
            _ => NodeKind::Anonymous,
        }
    }

    /// Pattern tokens referenced by name in grammar rules rather than quoted.
    pub(crate) fn named(name: &str) -> Option<Terminal> {
        match name {
            "identifier" => Some(Terminal::Identifier),
            "namespace_identifier" => Some(Terminal::NamespaceIdentifier),
            "annotation_identifier" => Some(Terminal::AnnotationIdentifier),
            "string" => Some(Terminal::String),
            "number" => Some(Terminal::Number),
            _ => None,
        }
    }

    /// Punctuation and keywords referenced by their quoted literal text.
    pub(crate) fn literal(text: &str) -> Option<Terminal> {
        ALL_TERMINALS
            .iter()
            .copied()
            .filter(|t| t.is_literal())
            .find(|t| t.text() == text)
    }

    fn is_literal(self) -> bool {
        !matches!(
            self,
            Terminal::End
                | Terminal::Identifier
                | Terminal::NamespaceIdentifier
                | Terminal::AnnotationIdentifier
                | Terminal::String
                | Terminal::Number
                | Terminal::Whitespace
                | Terminal::Comment
                | Terminal::Error
        )
    }

    /// The IDL keyword spelled `word`, if any.
    pub(crate) fn keyword(word: &str) -> Option<Terminal> {
        IDL_KEYWORDS.iter().copied().find(|t| t.text() == word)
    }

    /// The JSON keyword string spelled exactly `literal`, quotes included.
    pub(crate) fn keyword_string(literal: &str) -> Option<Terminal> {
        JSON_KEYWORDS.iter().copied().find(|t| t.text() == literal)
    }

    pub(crate) fn idl_keywords() -> &'static [Terminal] {
        IDL_KEYWORDS
    }

    #[must_use]
    pub(crate) fn is_trivia(self) -> bool {
        matches!(self, Terminal::Whitespace | Terminal::Comment)
    }
}

const ALL_TERMINALS: [Terminal; TERMINAL_COUNT] = {
    let mut all = [Terminal::End; TERMINAL_COUNT];
    let mut i = 0;
    while i < IDL_KEYWORDS.len() {
        all[IDL_KEYWORDS[i] as usize] = IDL_KEYWORDS[i];
        i += 1;
    }
    let mut j = 0;
    while j < JSON_KEYWORDS.len() {
        all[JSON_KEYWORDS[j] as usize] = JSON_KEYWORDS[j];
        j += 1;
    }
    let rest = [
        Terminal::LBrace,
        Terminal::RBrace,
        Terminal::LBracket,
        Terminal::RBracket,
        Terminal::LParen,
        Terminal::RParen,
        Terminal::LAngle,
        Terminal::RAngle,
        Terminal::Colon,
        Terminal::Comma,
        Terminal::Semicolon,
        Terminal::Equals,
        Terminal::Question,
        Terminal::Identifier,
        Terminal::NamespaceIdentifier,
        Terminal::AnnotationIdentifier,
        Terminal::String,
        Terminal::Number,
        Terminal::Whitespace,
        Terminal::Comment,
        Terminal::Error,
    ];
    let mut k = 0;
    while k < rest.len() {
        all[rest[k] as usize] = rest[k];
        k += 1;
    }
    all
};

// ==============================================================================
// Terminal Sets
// ==============================================================================

/// A set of terminals, used both for LR(1) lookaheads and for the lexer's
/// valid-token context.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct TerminalSet(u128);

impl TerminalSet {
    pub(crate) const EMPTY: TerminalSet = TerminalSet(0);

    /// Every terminal the parser can act on. Used while skipping tokens
    /// during recovery, where no single state decides the context.
    #[must_use]
    pub(crate) fn all() -> TerminalSet {
        let mut set = TerminalSet::EMPTY;
        for t in ALL_TERMINALS {
            if !t.is_trivia() && t != Terminal::Error {
                set.insert(t);
            }
        }
        set
    }

    pub(crate) fn single(t: Terminal) -> TerminalSet {
        let mut set = TerminalSet::EMPTY;
        set.insert(t);
        set
    }

    /// Insert `t`, returning whether it was newly added.
    pub(crate) fn insert(&mut self, t: Terminal) -> bool {
        let bit = 1u128 << t.index();
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    #[must_use]
    pub(crate) fn contains(self, t: Terminal) -> bool {
        self.0 & (1u128 << t.index()) != 0
    }

    /// Add every member of `other`, returning whether anything changed.
    pub(crate) fn union_with(&mut self, other: TerminalSet) -> bool {
        let before = self.0;
        self.0 |= other.0;
        self.0 != before
    }

    pub(crate) fn iter(self) -> impl Iterator<Item = Terminal> {
        ALL_TERMINALS
            .into_iter()
            .filter(move |t| self.contains(*t))
    }
}

impl std::fmt::Debug for TerminalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(Terminal::text)).finish()
    }
}
