//! Read-only view over a lowered C++ translation unit.
//!
//! [`Cursor`] and [`Type`] are `Copy` handles into an arena owned by
//! [`TranslationUnit`]. They expose only what signature extraction needs:
//! kinds, children, canonical types, pointees and the declaration and
//! definition cross-links. The arena is immutable once built; the only way to
//! populate one is [`TranslationUnitBuilder`].

mod builder;

pub use builder::TranslationUnitBuilder;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

/// Kind of a declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    ClassDecl,
    StructDecl,
    ClassTemplate,
    CxxMethod,
    Constructor,
    Destructor,
    ConversionFunction,
    FunctionDecl,
    FieldDecl,
    ParmDecl,
    TypedefDecl,
    TypeAliasDecl,
}

impl CursorKind {
    /// Member functions of any flavour, including constructors.
    pub fn is_member_function(&self) -> bool {
        matches!(
            self,
            CursorKind::CxxMethod
                | CursorKind::Constructor
                | CursorKind::Destructor
                | CursorKind::ConversionFunction
        )
    }
}

/// Kind of a type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Invalid,
    Unexposed,
    Void,
    Bool,
    CharS,
    SChar,
    CharU,
    UChar,
    WChar,
    Char16,
    Char32,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    Pointer,
    LValueReference,
    RValueReference,
    ConstantArray,
    Record,
    Enum,
    Elaborated,
    Typedef,
}

impl TypeKind {
    /// C++ spelling of a builtin kind.
    pub fn builtin_spelling(&self) -> Option<&'static str> {
        let spelling = match self {
            TypeKind::Void => "void",
            TypeKind::Bool => "bool",
            TypeKind::CharS | TypeKind::CharU => "char",
            TypeKind::SChar => "signed char",
            TypeKind::UChar => "unsigned char",
            TypeKind::WChar => "wchar_t",
            TypeKind::Char16 => "char16_t",
            TypeKind::Char32 => "char32_t",
            TypeKind::Short => "short",
            TypeKind::UShort => "unsigned short",
            TypeKind::Int => "int",
            TypeKind::UInt => "unsigned int",
            TypeKind::Long => "long",
            TypeKind::ULong => "unsigned long",
            TypeKind::LongLong => "long long",
            TypeKind::ULongLong => "unsigned long long",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::LongDouble => "long double",
            _ => return None,
        };
        Some(spelling)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem reported while producing the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    pub fn warning(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", self.location, severity, self.message)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CursorData {
    pub(crate) kind: CursorKind,
    pub(crate) spelling: String,
    pub(crate) display_name: String,
    pub(crate) location: SourceLocation,
    pub(crate) semantic_parent: Option<CursorId>,
    pub(crate) children: Vec<CursorId>,
    pub(crate) ty: Option<TypeId>,
    pub(crate) result_type: Option<TypeId>,
    pub(crate) arguments: Vec<CursorId>,
    pub(crate) definition: Option<CursorId>,
    pub(crate) pure_virtual: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeData {
    pub(crate) kind: TypeKind,
    pub(crate) spelling: String,
    pub(crate) canonical: Option<TypeId>,
    pub(crate) pointee: Option<TypeId>,
    pub(crate) declaration: Option<CursorId>,
}

/// A lowered source file and everything it included.
#[derive(Debug)]
pub struct TranslationUnit {
    pub(crate) path: PathBuf,
    pub(crate) root: CursorId,
    pub(crate) cursors: Vec<CursorData>,
    pub(crate) types: Vec<TypeData>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl TranslationUnit {
    /// The translation unit cursor at the root of the tree.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            tu: self,
            id: self.root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Handle for a cursor id handed out by the builder.
    pub fn cursor_at(&self, id: CursorId) -> Cursor<'_> {
        Cursor { tu: self, id }
    }

    /// Handle for a type id handed out by the builder.
    pub fn type_at(&self, id: TypeId) -> Type<'_> {
        Type { tu: self, id }
    }
}

/// Handle to a declaration node.
#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    tu: &'tu TranslationUnit,
    id: CursorId,
}

impl<'tu> Cursor<'tu> {
    fn data(&self) -> &'tu CursorData {
        &self.tu.cursors[self.id.0 as usize]
    }

    pub fn id(&self) -> CursorId {
        self.id
    }

    pub fn kind(&self) -> CursorKind {
        self.data().kind
    }

    /// Bare name of the entity (`get_value`, `Foo`).
    pub fn spelling(&self) -> &'tu str {
        &self.data().spelling
    }

    /// Display name; for functions this is `name(type, type)`.
    pub fn display_name(&self) -> &'tu str {
        &self.data().display_name
    }

    pub fn location(&self) -> &'tu SourceLocation {
        &self.data().location
    }

    /// Lexical children in source order.
    pub fn children(&self) -> impl Iterator<Item = Cursor<'tu>> + 'tu {
        let tu = self.tu;
        self.data()
            .children
            .iter()
            .map(move |&id| tu.cursor_at(id))
    }

    pub fn semantic_parent(&self) -> Option<Cursor<'tu>> {
        self.data().semantic_parent.map(|id| self.tu.cursor_at(id))
    }

    pub fn cursor_type(&self) -> Option<Type<'tu>> {
        self.data().ty.map(|id| self.tu.type_at(id))
    }

    /// Return type of a function-like cursor.
    pub fn result_type(&self) -> Option<Type<'tu>> {
        self.data().result_type.map(|id| self.tu.type_at(id))
    }

    /// Parameters of a function-like cursor, in declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = Cursor<'tu>> + 'tu {
        let tu = self.tu;
        self.data()
            .arguments
            .iter()
            .map(move |&id| tu.cursor_at(id))
    }

    /// The defining cursor, when the tree contains one.
    pub fn definition(&self) -> Option<Cursor<'tu>> {
        self.data().definition.map(|id| self.tu.cursor_at(id))
    }

    pub fn is_definition(&self) -> bool {
        self.data().definition == Some(self.id)
    }

    pub fn is_pure_virtual(&self) -> bool {
        self.data().pure_virtual
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tu, other.tu) && self.id == other.id
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("kind", &self.kind())
            .field("display_name", &self.display_name())
            .finish()
    }
}

/// Handle to a type node.
#[derive(Clone, Copy)]
pub struct Type<'tu> {
    tu: &'tu TranslationUnit,
    id: TypeId,
}

impl<'tu> Type<'tu> {
    fn data(&self) -> &'tu TypeData {
        &self.tu.types[self.id.0 as usize]
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn kind(&self) -> TypeKind {
        self.data().kind
    }

    pub fn spelling(&self) -> &'tu str {
        &self.data().spelling
    }

    /// The type with every alias and qualifier stripped.
    pub fn canonical(&self) -> Type<'tu> {
        match self.data().canonical {
            Some(id) => self.tu.type_at(id),
            None => *self,
        }
    }

    /// Pointee of a pointer or reference type.
    pub fn pointee(&self) -> Option<Type<'tu>> {
        self.data().pointee.map(|id| self.tu.type_at(id))
    }

    /// Declaring cursor of a record, enum or typedef type.
    pub fn declaration(&self) -> Option<Cursor<'tu>> {
        self.data().declaration.map(|id| self.tu.cursor_at(id))
    }
}

impl PartialEq for Type<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tu, other.tu) && self.id == other.id
    }
}

impl Eq for Type<'_> {}

impl fmt::Debug for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("kind", &self.kind())
            .field("spelling", &self.spelling())
            .finish()
    }
}
