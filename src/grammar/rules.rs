// ==============================================================================
// Grammar Rules
// ==============================================================================
//
// The declarative rule set for both Avro dialects, written in a compact
// string notation and expanded into plain productions:
//
//   'record'        a punctuation or keyword terminal, by literal text
//   '"type"'        a JSON keyword string terminal
//   identifier      a pattern terminal (identifier, string, number, ...)
//   record_body     a nonterminal
//   name:identifier a child labeled with a field name
//   _annotations?   an optional element (expanded into two productions)
//
// Nonterminals whose name starts with `_` are hidden: their children are
// spliced into the parent node. Other nonterminals display as the node kind of
// the same name unless an alias says otherwise.

use indexmap::IndexMap;

use super::kinds::NodeKind;
use super::terminals::Terminal;

pub(crate) type NonterminalId = u16;
pub(crate) type ProductionId = u16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Symbol {
    Terminal(Terminal),
    Nonterminal(NonterminalId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Associativity {
    None,
    Left,
    Right,
}

#[derive(Debug)]
pub(crate) struct Production {
    pub(crate) lhs: NonterminalId,
    pub(crate) rhs: Vec<Symbol>,
    /// Field name per right-hand-side position.
    pub(crate) fields: Vec<Option<&'static str>>,
    pub(crate) precedence: i32,
    pub(crate) associativity: Associativity,
    pub(crate) dynamic_precedence: i32,
}

#[derive(Debug)]
pub(crate) struct Nonterminal {
    pub(crate) name: &'static str,
    pub(crate) kind: NodeKind,
    pub(crate) hidden: bool,
}

#[derive(Debug)]
pub(crate) struct Grammar {
    pub(crate) nonterminals: Vec<Nonterminal>,
    pub(crate) productions: Vec<Production>,
    pub(crate) by_lhs: Vec<Vec<ProductionId>>,
    /// Sets of nonterminals whose mutual conflicts are resolved at runtime.
    pub(crate) expected_conflicts: Vec<Vec<NonterminalId>>,
    pub(crate) root: NonterminalId,
    /// The augmented `_accept -> source_file` production.
    pub(crate) accept: ProductionId,
}

impl Grammar {
    pub(crate) fn nonterminal(&self, id: NonterminalId) -> &Nonterminal {
        &self.nonterminals[usize::from(id)]
    }

    pub(crate) fn production(&self, id: ProductionId) -> &Production {
        &self.productions[usize::from(id)]
    }

    #[cfg(test)]
    pub(crate) fn nonterminal_id(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals
            .iter()
            .position(|nt| nt.name == name)
            .and_then(|i| NonterminalId::try_from(i).ok())
    }
}

// ==============================================================================
// Builder
// ==============================================================================

#[derive(Debug)]
pub(crate) enum GrammarError {
    UnknownLiteral(&'static str),
    Undefined(&'static str),
    UnknownKind(&'static str),
    TooLarge,
}

impl std::fmt::Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::UnknownLiteral(text) => write!(f, "unknown terminal literal {text}"),
            GrammarError::Undefined(name) => write!(f, "nonterminal `{name}` has no rules"),
            GrammarError::UnknownKind(name) => write!(f, "no node kind named `{name}`"),
            GrammarError::TooLarge => write!(f, "grammar exceeds 65535 symbols or productions"),
        }
    }
}

impl std::error::Error for GrammarError {}

struct RuleAttrs {
    precedence: i32,
    associativity: Associativity,
    dynamic_precedence: i32,
}

pub(crate) struct GrammarBuilder {
    names: IndexMap<&'static str, NonterminalId>,
    rules: IndexMap<&'static str, Vec<&'static str>>,
    aliases: IndexMap<&'static str, NodeKind>,
    attrs: IndexMap<&'static str, RuleAttrs>,
    conflicts: Vec<Vec<&'static str>>,
}

impl GrammarBuilder {
    pub(crate) fn new() -> Self {
        GrammarBuilder {
            names: IndexMap::new(),
            rules: IndexMap::new(),
            aliases: IndexMap::new(),
            attrs: IndexMap::new(),
            conflicts: Vec::new(),
        }
    }

    /// Add alternatives for `name`. The first rule added is the root.
    pub(crate) fn rule(&mut self, name: &'static str, alternatives: &[&'static str]) -> &mut Self {
        self.rules
            .entry(name)
            .or_default()
            .extend_from_slice(alternatives);
        self
    }

    pub(crate) fn alias(&mut self, name: &'static str, kind: NodeKind) -> &mut Self {
        self.aliases.insert(name, kind);
        self
    }

    pub(crate) fn dynamic_precedence(&mut self, name: &'static str, value: i32) -> &mut Self {
        self.attrs_mut(name).dynamic_precedence = value;
        self
    }

    pub(crate) fn precedence(
        &mut self,
        name: &'static str,
        value: i32,
        associativity: Associativity,
    ) -> &mut Self {
        let attrs = self.attrs_mut(name);
        attrs.precedence = value;
        attrs.associativity = associativity;
        self
    }

    pub(crate) fn expect_conflict(&mut self, names: &[&'static str]) -> &mut Self {
        self.conflicts.push(names.to_vec());
        self
    }

    fn attrs_mut(&mut self, name: &'static str) -> &mut RuleAttrs {
        self.attrs.entry(name).or_insert(RuleAttrs {
            precedence: 0,
            associativity: Associativity::None,
            dynamic_precedence: 0,
        })
    }

    fn intern(&mut self, name: &'static str) -> Result<NonterminalId, GrammarError> {
        if let Some(&id) = self.names.get(name) {
            return Ok(id);
        }
        let id = NonterminalId::try_from(self.names.len()).map_err(|_| GrammarError::TooLarge)?;
        self.names.insert(name, id);
        Ok(id)
    }

    pub(crate) fn build(mut self) -> Result<Grammar, GrammarError> {
        let Some((&root_name, _)) = self.rules.first() else {
            return Err(GrammarError::Undefined("source_file"));
        };
        // Rule order fixes nonterminal ids so that table numbering is stable.
        let rule_names: Vec<&'static str> = self.rules.keys().copied().collect();
        for name in &rule_names {
            self.intern(name)?;
        }
        let accept_lhs = self.intern("_accept")?;
        let root = self.intern(root_name)?;

        let mut productions = Vec::new();
        for name in &rule_names {
            let lhs = self.intern(name)?;
            let alternatives = self.rules[name].clone();
            let (precedence, associativity, dynamic_precedence) = match self.attrs.get(name) {
                Some(a) => (a.precedence, a.associativity, a.dynamic_precedence),
                None => (0, Associativity::None, 0),
            };
            for alternative in alternatives {
                for (rhs, fields) in self.expand(alternative)? {
                    productions.push(Production {
                        lhs,
                        rhs,
                        fields,
                        precedence,
                        associativity,
                        dynamic_precedence,
                    });
                }
            }
        }
        productions.push(Production {
            lhs: accept_lhs,
            rhs: vec![Symbol::Nonterminal(root)],
            fields: vec![None],
            precedence: 0,
            associativity: Associativity::None,
            dynamic_precedence: 0,
        });
        let accept =
            ProductionId::try_from(productions.len() - 1).map_err(|_| GrammarError::TooLarge)?;

        let mut by_lhs = vec![Vec::new(); self.names.len()];
        for (id, production) in productions.iter().enumerate() {
            let id = ProductionId::try_from(id).map_err(|_| GrammarError::TooLarge)?;
            by_lhs[usize::from(production.lhs)].push(id);
        }
        for (&name, alternatives) in self.names.keys().zip(&by_lhs) {
            if alternatives.is_empty() {
                return Err(GrammarError::Undefined(name));
            }
        }

        let mut nonterminals = Vec::with_capacity(self.names.len());
        for &name in self.names.keys() {
            let hidden = name.starts_with('_');
            let kind = if let Some(&kind) = self.aliases.get(name) {
                kind
            } else if hidden {
                NodeKind::Anonymous
            } else {
                NodeKind::from_name(name).ok_or(GrammarError::UnknownKind(name))?
            };
            nonterminals.push(Nonterminal { name, kind, hidden });
        }

        let mut expected_conflicts = Vec::new();
        for set in &self.conflicts {
            let mut ids = Vec::with_capacity(set.len());
            for name in set {
                match self.names.get(name) {
                    Some(&id) => ids.push(id),
                    None => return Err(GrammarError::Undefined(name)),
                }
            }
            expected_conflicts.push(ids);
        }

        Ok(Grammar {
            nonterminals,
            productions,
            by_lhs,
            expected_conflicts,
            root,
            accept,
        })
    }

    /// Expand one alternative into productions, one per combination of its
    /// optional elements.
    #[allow(clippy::type_complexity)]
    fn expand(
        &mut self,
        alternative: &'static str,
    ) -> Result<Vec<(Vec<Symbol>, Vec<Option<&'static str>>)>, GrammarError> {
        let mut elements = Vec::new();
        for word in alternative.split_whitespace() {
            elements.push(self.element(word)?);
        }
        let optional: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.optional)
            .map(|(i, _)| i)
            .collect();

        let mut out = Vec::new();
        for mask in 0..(1u32 << optional.len()) {
            let mut rhs = Vec::new();
            let mut fields = Vec::new();
            for (i, element) in elements.iter().enumerate() {
                if let Some(bit) = optional.iter().position(|&o| o == i)
                    && mask & (1 << bit) == 0
                {
                    continue;
                }
                rhs.push(element.symbol);
                fields.push(element.field);
            }
            out.push((rhs, fields));
        }
        Ok(out)
    }

    fn element(&mut self, word: &'static str) -> Result<Element, GrammarError> {
        if word.len() >= 2 && word.starts_with('\'') && word.ends_with('\'') {
            let text = &word[1..word.len() - 1];
            let terminal = Terminal::literal(text).ok_or(GrammarError::UnknownLiteral(word))?;
            return Ok(Element {
                symbol: Symbol::Terminal(terminal),
                field: None,
                optional: false,
            });
        }
        let (field, rest) = match word.split_once(':') {
            Some((field, rest)) => (Some(field), rest),
            None => (None, word),
        };
        let (rest, optional) = match rest.strip_suffix('?') {
            Some(stripped) if !rest.ends_with('\'') => (stripped, true),
            _ => (rest, false),
        };
        let symbol = if rest.starts_with('\'') {
            let inner = rest.trim_matches('\'');
            Symbol::Terminal(Terminal::literal(inner).ok_or(GrammarError::UnknownLiteral(word))?)
        } else if let Some(t) = Terminal::named(rest) {
            Symbol::Terminal(t)
        } else {
            Symbol::Nonterminal(self.intern(rest)?)
        };
        Ok(Element {
            symbol,
            field,
            optional,
        })
    }
}

struct Element {
    symbol: Symbol,
    field: Option<&'static str>,
    optional: bool,
}

// ==============================================================================
// The Avro Grammar
// ==============================================================================

/// The JSON schema object kinds whose member lists share `_common_member`.
/// Until a `"type"` member or a kind-specific key is seen the object could be
/// any of them, so the parser keeps one stack per candidate.
pub(crate) const SCHEMA_OBJECT_MEMBERS: &[&str] = &[
    "_record_member",
    "_enum_member",
    "_fixed_member",
    "_array_member",
    "_map_member",
    "_object_member",
];

pub(crate) fn avro_grammar() -> Result<Grammar, GrammarError> {
    let mut g = GrammarBuilder::new();

    g.rule("source_file", &["_schema", "_declarations", ""]);

    // ---------------------------------------------------------------------
    // IDL declarations
    // ---------------------------------------------------------------------
    g.rule("_declarations", &["_declaration", "_declarations _declaration"])
        .rule(
            "_declaration",
            &[
                "protocol_declaration",
                "namespace_statement",
                "schema_declaration",
                "import_statement",
                "record_declaration",
                "error_declaration",
                "enum_declaration",
                "fixed_declaration",
            ],
        )
        .rule(
            "protocol_declaration",
            &["_annotations? 'protocol' name:identifier body:protocol_body"],
        )
        .rule("protocol_body", &["'{' _protocol_items? '}'"])
        .rule("_protocol_items", &["_protocol_item", "_protocol_items _protocol_item"])
        .rule(
            "_protocol_item",
            &[
                "import_statement",
                "record_declaration",
                "error_declaration",
                "enum_declaration",
                "fixed_declaration",
                "message_declaration",
            ],
        )
        .rule("namespace_statement", &["'namespace' name:namespace_identifier ';'"])
        .rule("schema_declaration", &["'schema' _annotations? type:_unannotated_type ';'"])
        .rule("import_statement", &["'import' kind:identifier path:string ';'"])
        .rule(
            "record_declaration",
            &["_annotations? 'record' name:identifier body:record_body"],
        )
        .rule(
            "error_declaration",
            &["_annotations? 'error' name:identifier body:record_body"],
        )
        .rule("record_body", &["'{' _fields? '}'"])
        .rule("_fields", &["field", "_fields field"])
        .rule(
            "field",
            &[
                "_annotations? type:_unannotated_type _annotations? name:identifier ';'",
                "_annotations? type:_unannotated_type _annotations? name:identifier '=' default:_json_value ';'",
            ],
        )
        .rule(
            "enum_declaration",
            &["_annotations? 'enum' name:identifier body:enum_body default:enum_default?"],
        )
        .rule(
            "enum_body",
            &["'{' '}'", "'{' _enum_symbols '}'", "'{' _enum_symbols ',' '}'"],
        )
        .rule("_enum_symbols", &["enum_symbol", "_enum_symbols ',' enum_symbol"])
        .rule("enum_symbol", &["identifier"])
        .rule("enum_default", &["'=' identifier ';'"])
        .rule(
            "fixed_declaration",
            &["_annotations? 'fixed' name:identifier '(' size:number ')' ';'"],
        )
        .rule(
            "message_declaration",
            &[
                "_annotations? result:_unannotated_type name:identifier parameters:parameter_list _message_tail? ';'",
                "_annotations? result:void name:identifier parameters:parameter_list _message_tail? ';'",
            ],
        )
        .rule("_message_tail", &["throws_clause", "oneway"])
        .rule("parameter_list", &["'(' ')'", "'(' _parameters ')'"])
        .rule("_parameters", &["parameter", "_parameters ',' parameter"])
        .rule(
            "parameter",
            &[
                "_annotations? type:_unannotated_type name:identifier",
                "_annotations? type:_unannotated_type name:identifier '=' default:_json_value",
            ],
        )
        .rule("throws_clause", &["'throws' _error_names"])
        .rule("_error_names", &["identifier", "_error_names ',' identifier"])
        .rule("oneway", &["'oneway'"])
        .rule("void", &["'void'"])
        .rule("_annotations", &["annotation", "_annotations annotation"])
        .rule(
            "annotation",
            &["name:annotation_identifier '(' value:_json_value ')'"],
        );

    // ---------------------------------------------------------------------
    // IDL types
    // ---------------------------------------------------------------------
    // Annotations sit outside the labeled type so that a `type:` field
    // points at the type itself. Union members have no label and take
    // `_type` whole.
    g.rule("_type", &["_unannotated_type", "_annotated_type"])
        .rule("_annotated_type", &["_annotations _unannotated_type"])
        .rule("_unannotated_type", &["_plain_type", "nullable_type"])
        .rule("nullable_type", &["_plain_type '?'"])
        .rule(
            "_plain_type",
            &[
                "primitive_type",
                "logical_type",
                "array_type",
                "map_type",
                "union_type",
                "type_reference",
            ],
        )
        .rule(
            "primitive_type",
            &[
                "'int'",
                "'long'",
                "'string'",
                "'boolean'",
                "'float'",
                "'double'",
                "'bytes'",
                "'null'",
            ],
        )
        .rule(
            "logical_type",
            &[
                "'date'",
                "'time_ms'",
                "'timestamp_ms'",
                "'local_timestamp_ms'",
                "'uuid'",
                "'decimal' '(' precision:number ',' scale:number ')'",
            ],
        )
        .rule("array_type", &["'array' '<' _annotations? items:_unannotated_type '>'"])
        .rule("map_type", &["'map' '<' _annotations? values:_unannotated_type '>'"])
        .rule("union_type", &["'union' '{' _union_members '}'"])
        .rule("_union_members", &["_type", "_union_members ',' _union_members"])
        .rule("type_reference", &["identifier", "namespace_identifier"]);

    // ---------------------------------------------------------------------
    // Schema JSON
    // ---------------------------------------------------------------------
    g.rule(
        "_schema",
        &[
            "primitive_schema",
            "reference_schema",
            "union_schema",
            "record_schema",
            "enum_schema",
            "fixed_schema",
            "array_schema",
            "map_schema",
            "schema_object",
        ],
    )
    .rule(
        "primitive_schema",
        &[
            "'\"int\"'",
            "'\"long\"'",
            "'\"string\"'",
            "'\"boolean\"'",
            "'\"float\"'",
            "'\"double\"'",
            "'\"bytes\"'",
            "'\"null\"'",
        ],
    )
    .rule("reference_schema", &["string"])
    .rule("union_schema", &["'[' ']'", "'[' _schema_list ']'"])
    .rule("_schema_list", &["_schema", "_schema_list ',' _schema"])
    .rule("record_schema", &["'{' _record_members '}'"])
    .rule("_record_members", &["_record_member", "_record_members ',' _record_member"])
    .rule(
        "_record_member",
        &["record_type_property", "fields_property", "_common_member"],
    )
    .rule("record_type_property", &["'\"type\"' ':' value:'\"record\"'"])
    .rule("enum_schema", &["'{' _enum_members '}'"])
    .rule("_enum_members", &["_enum_member", "_enum_members ',' _enum_member"])
    .rule(
        "_enum_member",
        &[
            "enum_type_property",
            "symbols_property",
            "default_property",
            "_common_member",
        ],
    )
    .rule("enum_type_property", &["'\"type\"' ':' value:'\"enum\"'"])
    .rule("fixed_schema", &["'{' _fixed_members '}'"])
    .rule("_fixed_members", &["_fixed_member", "_fixed_members ',' _fixed_member"])
    .rule(
        "_fixed_member",
        &["fixed_type_property", "size_property", "_common_member"],
    )
    .rule("fixed_type_property", &["'\"type\"' ':' value:'\"fixed\"'"])
    .rule("array_schema", &["'{' _array_members '}'"])
    .rule("_array_members", &["_array_member", "_array_members ',' _array_member"])
    .rule(
        "_array_member",
        &["array_type_property", "items_property", "_common_member"],
    )
    .rule("array_type_property", &["'\"type\"' ':' value:'\"array\"'"])
    .rule("map_schema", &["'{' _map_members '}'"])
    .rule("_map_members", &["_map_member", "_map_members ',' _map_member"])
    .rule(
        "_map_member",
        &["map_type_property", "values_property", "_common_member"],
    )
    .rule("map_type_property", &["'\"type\"' ':' value:'\"map\"'"])
    .rule("schema_object", &["'{' _object_members '}'"])
    .rule("_object_members", &["_object_member", "_object_members ',' _object_member"])
    .rule("_object_member", &["schema_type_property", "_common_member"])
    .rule("schema_type_property", &["'\"type\"' ':' value:_schema"])
    .rule(
        "_common_member",
        &[
            "name_property",
            "namespace_property",
            "doc_property",
            "aliases_property",
            "custom_property",
        ],
    )
    .rule("name_property", &["'\"name\"' ':' value:string"])
    .rule("namespace_property", &["'\"namespace\"' ':' value:string"])
    .rule("doc_property", &["'\"doc\"' ':' value:string"])
    .rule("aliases_property", &["'\"aliases\"' ':' value:json_array"])
    .rule("custom_property", &["key:string ':' value:_json_value"])
    .rule(
        "fields_property",
        &["'\"fields\"' ':' '[' ']'", "'\"fields\"' ':' '[' _field_objects ']'"],
    )
    .rule("_field_objects", &["field_object", "_field_objects ',' field_object"])
    .rule("field_object", &["'{' _field_members '}'"])
    .rule("_field_members", &["_field_member", "_field_members ',' _field_member"])
    .rule(
        "_field_member",
        &[
            "name_property",
            "schema_type_property",
            "doc_property",
            "default_property",
            "order_property",
            "aliases_property",
            "custom_property",
        ],
    )
    .rule(
        "symbols_property",
        &["'\"symbols\"' ':' '[' ']'", "'\"symbols\"' ':' '[' _symbol_strings ']'"],
    )
    .rule("_symbol_strings", &["symbol_string", "_symbol_strings ',' symbol_string"])
    .rule("symbol_string", &["string"])
    .rule("size_property", &["'\"size\"' ':' value:number"])
    .rule("items_property", &["'\"items\"' ':' value:_schema"])
    .rule("values_property", &["'\"values\"' ':' value:_schema"])
    .rule("default_property", &["'\"default\"' ':' value:_json_value"])
    .rule("order_property", &["'\"order\"' ':' value:string"]);

    // ---------------------------------------------------------------------
    // Generic JSON values: defaults, annotation arguments, custom properties
    // ---------------------------------------------------------------------
    g.rule(
        "_json_value",
        &[
            "json_object",
            "json_array",
            "string",
            "number",
            "'true'",
            "'false'",
            "null",
        ],
    )
    .rule("null", &["'null'"])
    .rule("json_object", &["'{' '}'", "'{' _json_pairs '}'"])
    .rule("_json_pairs", &["json_pair", "_json_pairs ',' json_pair"])
    .rule("json_pair", &["key:string ':' value:_json_value"])
    .rule("json_array", &["'[' ']'", "'[' _json_values ']'"])
    .rule("_json_values", &["_json_value", "_json_values ',' _json_values"]);

    g.alias("primitive_schema", NodeKind::PrimitiveType)
        .alias("reference_schema", NodeKind::TypeReference)
        .alias("union_schema", NodeKind::UnionType)
        .alias("symbol_string", NodeKind::EnumSymbol)
        .alias("record_schema", NodeKind::RecordDeclaration)
        .alias("enum_schema", NodeKind::EnumDeclaration)
        .alias("fixed_schema", NodeKind::FixedDeclaration)
        .alias("array_schema", NodeKind::ArrayType)
        .alias("map_schema", NodeKind::MapType)
        .alias("field_object", NodeKind::Field)
        .alias("record_type_property", NodeKind::TypeProperty)
        .alias("enum_type_property", NodeKind::TypeProperty)
        .alias("fixed_type_property", NodeKind::TypeProperty)
        .alias("array_type_property", NodeKind::TypeProperty)
        .alias("map_type_property", NodeKind::TypeProperty)
        .alias("schema_type_property", NodeKind::TypeProperty);

    // Lists written as `list ',' list` nest one way or the other; the spliced
    // children come out the same.
    g.precedence("_json_values", 1, Associativity::Left)
        .precedence("_union_members", 1, Associativity::Right);

    // An object whose members are all shared resolves to a record.
    g.dynamic_precedence("record_schema", 1);
    g.expect_conflict(SCHEMA_OBJECT_MEMBERS);

    g.build()
}
