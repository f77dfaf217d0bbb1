// ==============================================================================
// Node Kinds
// ==============================================================================
//
// The closed set of kinds a syntax node can report. Several grammar symbols can
// display as the same kind: the JSON `{"type": "record", ...}` object and the
// IDL `record R { ... }` declaration are both `record_declaration`, and every
// per-kind `"type"` member is a `type_property`.

/// The kind of a node in the concrete syntax tree.
///
/// Punctuation and keyword leaves are [`NodeKind::Anonymous`]; use
/// [`SyntaxNode::grammar_name`](crate::SyntaxNode::grammar_name) to get their
/// literal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    SourceFile,

    // IDL declarations
    ProtocolDeclaration,
    ProtocolBody,
    NamespaceStatement,
    SchemaDeclaration,
    ImportStatement,
    RecordDeclaration,
    ErrorDeclaration,
    RecordBody,
    Field,
    EnumDeclaration,
    EnumBody,
    EnumSymbol,
    EnumDefault,
    FixedDeclaration,
    MessageDeclaration,
    ParameterList,
    Parameter,
    ThrowsClause,
    Oneway,
    Void,
    Annotation,

    // Types, shared by both dialects
    PrimitiveType,
    LogicalType,
    ArrayType,
    MapType,
    UnionType,
    NullableType,
    TypeReference,

    // Schema JSON objects and their members
    SchemaObject,
    TypeProperty,
    NameProperty,
    NamespaceProperty,
    DocProperty,
    AliasesProperty,
    FieldsProperty,
    SymbolsProperty,
    ItemsProperty,
    ValuesProperty,
    SizeProperty,
    DefaultProperty,
    OrderProperty,
    CustomProperty,

    // Generic JSON values
    JsonObject,
    JsonArray,
    JsonPair,

    // Named leaves
    Identifier,
    NamespaceIdentifier,
    AnnotationIdentifier,
    String,
    Number,
    True,
    False,
    Null,
    Comment,
    Whitespace,

    Error,
    Anonymous,
}

impl NodeKind {
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::SourceFile,
        NodeKind::ProtocolDeclaration,
        NodeKind::ProtocolBody,
        NodeKind::NamespaceStatement,
        NodeKind::SchemaDeclaration,
        NodeKind::ImportStatement,
        NodeKind::RecordDeclaration,
        NodeKind::ErrorDeclaration,
        NodeKind::RecordBody,
        NodeKind::Field,
        NodeKind::EnumDeclaration,
        NodeKind::EnumBody,
        NodeKind::EnumSymbol,
        NodeKind::EnumDefault,
        NodeKind::FixedDeclaration,
        NodeKind::MessageDeclaration,
        NodeKind::ParameterList,
        NodeKind::Parameter,
        NodeKind::ThrowsClause,
        NodeKind::Oneway,
        NodeKind::Void,
        NodeKind::Annotation,
        NodeKind::PrimitiveType,
        NodeKind::LogicalType,
        NodeKind::ArrayType,
        NodeKind::MapType,
        NodeKind::UnionType,
        NodeKind::NullableType,
        NodeKind::TypeReference,
        NodeKind::SchemaObject,
        NodeKind::TypeProperty,
        NodeKind::NameProperty,
        NodeKind::NamespaceProperty,
        NodeKind::DocProperty,
        NodeKind::AliasesProperty,
        NodeKind::FieldsProperty,
        NodeKind::SymbolsProperty,
        NodeKind::ItemsProperty,
        NodeKind::ValuesProperty,
        NodeKind::SizeProperty,
        NodeKind::DefaultProperty,
        NodeKind::OrderProperty,
        NodeKind::CustomProperty,
        NodeKind::JsonObject,
        NodeKind::JsonArray,
        NodeKind::JsonPair,
        NodeKind::Identifier,
        NodeKind::NamespaceIdentifier,
        NodeKind::AnnotationIdentifier,
        NodeKind::String,
        NodeKind::Number,
        NodeKind::True,
        NodeKind::False,
        NodeKind::Null,
        NodeKind::Comment,
        NodeKind::Whitespace,
        NodeKind::Error,
        NodeKind::Anonymous,
    ];

    /// The snake_case name used in s-expressions and the JSON dump.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::SourceFile => "source_file",
            NodeKind::ProtocolDeclaration => "protocol_declaration",
            NodeKind::ProtocolBody => "protocol_body",
            NodeKind::NamespaceStatement => "namespace_statement",
            NodeKind::SchemaDeclaration => "schema_declaration",
            NodeKind::ImportStatement => "import_statement",
            NodeKind::RecordDeclaration => "record_declaration",
            NodeKind::ErrorDeclaration => "error_declaration",
            NodeKind::RecordBody => "record_body",
            NodeKind::Field => "field",
            NodeKind::EnumDeclaration => "enum_declaration",
            NodeKind::EnumBody => "enum_body",
            NodeKind::EnumSymbol => "enum_symbol",
            NodeKind::EnumDefault => "enum_default",
            NodeKind::FixedDeclaration => "fixed_declaration",
            NodeKind::MessageDeclaration => "message_declaration",
            NodeKind::ParameterList => "parameter_list",
            NodeKind::Parameter => "parameter",
            NodeKind::ThrowsClause => "throws_clause",
            NodeKind::Oneway => "oneway",
            NodeKind::Void => "void",
            NodeKind::Annotation => "annotation",
            NodeKind::PrimitiveType => "primitive_type",
            NodeKind::LogicalType => "logical_type",
            NodeKind::ArrayType => "array_type",
            NodeKind::MapType => "map_type",
            NodeKind::UnionType => "union_type",
            NodeKind::NullableType => "nullable_type",
            NodeKind::TypeReference => "type_reference",
            NodeKind::SchemaObject => "schema_object",
            NodeKind::TypeProperty => "type_property",
            NodeKind::NameProperty => "name_property",
            NodeKind::NamespaceProperty => "namespace_property",
            NodeKind::DocProperty => "doc_property",
            NodeKind::AliasesProperty => "aliases_property",
            NodeKind::FieldsProperty => "fields_property",
            NodeKind::SymbolsProperty => "symbols_property",
            NodeKind::ItemsProperty => "items_property",
            NodeKind::ValuesProperty => "values_property",
            NodeKind::SizeProperty => "size_property",
            NodeKind::DefaultProperty => "default_property",
            NodeKind::OrderProperty => "order_property",
            NodeKind::CustomProperty => "custom_property",
            NodeKind::JsonObject => "json_object",
            NodeKind::JsonArray => "json_array",
            NodeKind::JsonPair => "json_pair",
            NodeKind::Identifier => "identifier",
            NodeKind::NamespaceIdentifier => "namespace_identifier",
            NodeKind::AnnotationIdentifier => "annotation_identifier",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::Null => "null",
            NodeKind::Comment => "comment",
            NodeKind::Whitespace => "whitespace",
            NodeKind::Error => "error",
            NodeKind::Anonymous => "anonymous",
        }
    }

    /// Look up a kind by its snake_case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
    }

    /// Named kinds appear in s-expressions; whitespace and anonymous tokens
    /// do not.
    #[must_use]
    pub fn is_named(self) -> bool {
        !matches!(self, NodeKind::Anonymous | NodeKind::Whitespace)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
