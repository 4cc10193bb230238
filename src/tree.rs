use std::collections::BTreeSet;
use std::fmt::Display;

/// A half-open byte range into the source text a tree was lowered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub lo: usize,

    /// Offset one past the last byte.
    pub hi: usize,
}

impl Span {
    /// Creates a new [`Span`].
    pub fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    /// Returns the slice of `text` covered by this span.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.lo..self.hi).unwrap_or("")
    }
}

/// How an import specifier introduces its local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `import { Button } from 'm'` or `import { Button as Btn } from 'm'`.
    Named,

    /// `import Button from 'm'`.
    Default,

    /// `import * as Lab from 'm'`.
    Namespace,
}

impl Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Named => write!(f, "named"),
            BindingKind::Default => write!(f, "default"),
            BindingKind::Namespace => write!(f, "namespace"),
        }
    }
}

/// The structural view of one source file that the rewrite passes operate on.
///
/// Only the constructs the passes can change are kept: top-level import declarations and
/// markup element usages. Every node remembers where it came from in the original text so
/// the printer can splice changes back without reformatting anything else.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    /// Import declarations, in source order.
    pub imports: Vec<ImportDecl>,

    /// Element usages, in the order their opening tags appear.
    pub elements: Vec<Element>,

    /// Names declared at module level by something other than an import.
    pub module_locals: BTreeSet<String>,
}

/// An `import ... from '...'` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Span of the declaration this node was parsed from. Declarations split off by a pass
    /// keep the span of the declaration they were split from.
    pub origin: Span,

    /// The module specifier string.
    pub source: ModuleSource,

    /// The specifiers, in source order.
    pub specifiers: Vec<ImportSpecifier>,

    /// Whether this is an `import type` declaration.
    pub type_only: bool,

    /// Whether the declaration is terminated by a semicolon.
    pub semicolon: bool,
}

/// The quoted module path of an import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSource {
    /// The unquoted module path.
    pub value: String,

    /// The quote character used in the source.
    pub quote: char,

    /// Span of the quoted literal.
    pub span: Span,
}

/// One specifier of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    /// How the specifier binds its local name.
    pub kind: BindingKind,

    /// The exported name; `default` for default imports and `*` for namespace imports.
    pub imported: String,

    /// The local alias.
    pub local: String,

    /// Whether the specifier carries its own `type` modifier.
    pub type_only: bool,
}

/// A markup element usage, ie `<Button size="lg">`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Span of the opening tag.
    pub span: Span,

    /// The tag name.
    pub tag: Tag,

    /// Attributes of the opening tag, in source order.
    pub attrs: Vec<Attribute>,

    /// Index of the nearest enclosing element.
    pub parent: Option<usize>,
}

impl Element {
    /// Returns the properties named `key`.
    pub fn props_named<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Prop> + 'a {
        self.attrs.iter().filter_map(move |attr| match attr {
            Attribute::Prop(prop) if prop.key.name == key => Some(prop),
            _ => None,
        })
    }

    /// Whether a property named `key` is present.
    pub fn has_prop(&self, key: &str) -> bool {
        self.props_named(key).next().is_some()
    }
}

/// The name of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// A host element such as `div` or `svg:path`. These never refer to a binding.
    Intrinsic(String),

    /// An identifier or member expression that refers to a value.
    Reference(Reference),
}

/// A reference to a value used as an element tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The leftmost identifier, ie `Lab` in `Lab.Button`.
    pub root: String,

    /// Member names following the root.
    pub members: Vec<String>,

    /// Whether `root` is bound by a declaration in an enclosing non-module scope.
    pub shadowed: bool,
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)?;
        for member in &self.members {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}

/// An attribute of an opening tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `key` or `key=value`.
    Prop(Prop),

    /// `{...props}`.
    Spread(Span),
}

impl Attribute {
    /// Span of the whole attribute.
    pub fn span(&self) -> Span {
        match self {
            Attribute::Prop(prop) => prop.span,
            Attribute::Spread(span) => *span,
        }
    }
}

/// A keyed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// Span of the whole attribute.
    pub span: Span,

    /// The attribute name.
    pub key: Key,

    /// The attribute value.
    pub value: AttrValue,
}

/// An attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// The name, ie `size` or `xlink:href`.
    pub name: String,

    /// Span of the name.
    pub span: Span,
}

/// The value of an attribute or of an entry in an object value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A valueless attribute such as `disabled`.
    Absent,

    /// A string literal, braced or not.
    Str(StrLit),

    /// Any other literal (numbers, booleans, `null`, ...).
    Literal(Span),

    /// An object literal whose entries all have static keys.
    Object(Vec<Entry>),

    /// A nested element or fragment.
    Element(Span),

    /// An expression whose value can't be known statically.
    Dynamic(Span),
}

/// A `key: value` entry of an object value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The static key.
    pub key: String,

    /// The entry value.
    pub value: AttrValue,
}

/// A string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLit {
    /// The literal value.
    pub value: String,

    /// The quote character, one of `"`, `'` or `` ` ``.
    pub quote: char,

    /// Whether the literal sits inside an expression (so escapes are allowed), as opposed to
    /// a bare markup attribute string.
    pub braced: bool,

    /// Span of the literal including its quotes.
    pub span: Span,
}
