use super::{
    CursorData, CursorId, CursorKind, Diagnostic, SourceLocation, TranslationUnit, TypeData,
    TypeId, TypeKind,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Incrementally assembles a [`TranslationUnit`] arena.
///
/// Types are interned where identity matters: builtins, pointers,
/// references and qualified variants return the same id for the same input,
/// so canonical spellings compare equal across declarations.
#[derive(Debug)]
pub struct TranslationUnitBuilder {
    path: PathBuf,
    root: CursorId,
    cursors: Vec<CursorData>,
    types: Vec<TypeData>,
    diagnostics: Vec<Diagnostic>,
    builtins: HashMap<TypeKind, TypeId>,
    pointers: HashMap<TypeId, TypeId>,
    references: HashMap<(TypeId, bool), TypeId>,
    qualified: HashMap<(TypeId, &'static str), TypeId>,
    records: HashMap<CursorId, TypeId>,
    opaque: HashMap<String, TypeId>,
}

impl TranslationUnitBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root = CursorData {
            kind: CursorKind::TranslationUnit,
            spelling: path.display().to_string(),
            display_name: path.display().to_string(),
            location: SourceLocation {
                path: path.clone(),
                line: 1,
                column: 1,
            },
            semantic_parent: None,
            children: Vec::new(),
            ty: None,
            result_type: None,
            arguments: Vec::new(),
            definition: None,
            pure_virtual: false,
        };
        Self {
            path,
            root: CursorId(0),
            cursors: vec![root],
            types: Vec::new(),
            diagnostics: Vec::new(),
            builtins: HashMap::new(),
            pointers: HashMap::new(),
            references: HashMap::new(),
            qualified: HashMap::new(),
            records: HashMap::new(),
            opaque: HashMap::new(),
        }
    }

    pub fn root(&self) -> CursorId {
        self.root
    }

    // ---- cursors -------------------------------------------------------

    /// Append a cursor as the last lexical child of `parent`.
    pub fn add_cursor(
        &mut self,
        parent: CursorId,
        kind: CursorKind,
        spelling: impl Into<String>,
    ) -> CursorId {
        let spelling = spelling.into();
        let id = CursorId(self.cursors.len() as u32);
        self.cursors.push(CursorData {
            kind,
            display_name: spelling.clone(),
            spelling,
            location: SourceLocation::default(),
            semantic_parent: Some(parent),
            children: Vec::new(),
            ty: None,
            result_type: None,
            arguments: Vec::new(),
            definition: None,
            pure_virtual: false,
        });
        self.cursor_mut(parent).children.push(id);
        id
    }

    /// Append a parameter to a function-like cursor.
    pub fn add_argument(
        &mut self,
        function: CursorId,
        name: impl Into<String>,
        ty: TypeId,
    ) -> CursorId {
        let parameter = self.add_cursor(function, CursorKind::ParmDecl, name);
        self.set_type(parameter, ty);
        self.cursor_mut(function).arguments.push(parameter);
        parameter
    }

    pub fn set_display_name(&mut self, id: CursorId, display_name: impl Into<String>) {
        self.cursor_mut(id).display_name = display_name.into();
    }

    pub fn set_location(&mut self, id: CursorId, location: SourceLocation) {
        self.cursor_mut(id).location = location;
    }

    pub fn set_type(&mut self, id: CursorId, ty: TypeId) {
        self.cursor_mut(id).ty = Some(ty);
    }

    pub fn set_result_type(&mut self, id: CursorId, ty: TypeId) {
        self.cursor_mut(id).result_type = Some(ty);
    }

    pub fn set_definition(&mut self, id: CursorId, definition: CursorId) {
        self.cursor_mut(id).definition = Some(definition);
    }

    pub fn set_semantic_parent(&mut self, id: CursorId, parent: CursorId) {
        self.cursor_mut(id).semantic_parent = Some(parent);
    }

    pub fn mark_pure_virtual(&mut self, id: CursorId) {
        self.cursor_mut(id).pure_virtual = true;
    }

    pub fn cursor_kind(&self, id: CursorId) -> CursorKind {
        self.cursor(id).kind
    }

    pub fn cursor_spelling(&self, id: CursorId) -> &str {
        &self.cursor(id).spelling
    }

    pub fn cursor_children(&self, id: CursorId) -> &[CursorId] {
        &self.cursor(id).children
    }

    pub fn argument_types(&self, id: CursorId) -> Vec<TypeId> {
        self.cursor(id)
            .arguments
            .iter()
            .filter_map(|&arg| self.cursor(arg).ty)
            .collect()
    }

    fn cursor(&self, id: CursorId) -> &CursorData {
        &self.cursors[id.0 as usize]
    }

    fn cursor_mut(&mut self, id: CursorId) -> &mut CursorData {
        &mut self.cursors[id.0 as usize]
    }

    // ---- types ---------------------------------------------------------

    fn push_type(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    pub fn type_spelling(&self, id: TypeId) -> &str {
        &self.type_data(id).spelling
    }

    pub fn type_kind(&self, id: TypeId) -> TypeKind {
        self.type_data(id).kind
    }

    pub fn canonical_of(&self, id: TypeId) -> TypeId {
        self.type_data(id).canonical.unwrap_or(id)
    }

    pub fn builtin(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.builtins.get(&kind) {
            return id;
        }
        let spelling = kind
            .builtin_spelling()
            .map(str::to_string)
            .unwrap_or_else(|| kind.to_string());
        let id = self.push_type(TypeData {
            kind,
            spelling,
            canonical: None,
            pointee: None,
            declaration: None,
        });
        self.builtins.insert(kind, id);
        id
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        if let Some(&id) = self.pointers.get(&pointee) {
            return id;
        }
        let canonical_pointee = self.canonical_of(pointee);
        let canonical = (canonical_pointee != pointee).then(|| self.pointer_to(canonical_pointee));
        let spelling = declarator_spelling(self.type_spelling(pointee), "*");
        let id = self.push_type(TypeData {
            kind: TypeKind::Pointer,
            spelling,
            canonical,
            pointee: Some(pointee),
            declaration: None,
        });
        self.pointers.insert(pointee, id);
        id
    }

    pub fn reference_to(&mut self, pointee: TypeId, rvalue: bool) -> TypeId {
        if let Some(&id) = self.references.get(&(pointee, rvalue)) {
            return id;
        }
        let canonical_pointee = self.canonical_of(pointee);
        let canonical =
            (canonical_pointee != pointee).then(|| self.reference_to(canonical_pointee, rvalue));
        let (kind, sigil) = if rvalue {
            (TypeKind::RValueReference, "&&")
        } else {
            (TypeKind::LValueReference, "&")
        };
        let spelling = declarator_spelling(self.type_spelling(pointee), sigil);
        let id = self.push_type(TypeData {
            kind,
            spelling,
            canonical,
            pointee: Some(pointee),
            declaration: None,
        });
        self.references.insert((pointee, rvalue), id);
        id
    }

    /// `const T` / `volatile T`. Keeps the kind; the canonical type drops
    /// the qualifier.
    pub fn qualified(&mut self, ty: TypeId, qualifier: &'static str) -> TypeId {
        if let Some(&id) = self.qualified.get(&(ty, qualifier)) {
            return id;
        }
        let base = self.type_data(ty).clone();
        let canonical = self.canonical_of(ty);
        let id = self.push_type(TypeData {
            spelling: format!("{qualifier} {}", base.spelling),
            canonical: Some(canonical),
            ..base
        });
        self.qualified.insert((ty, qualifier), id);
        id
    }

    pub fn constant_array(&mut self, element: TypeId, size: &str) -> TypeId {
        let spelling = format!("{} [{size}]", self.type_spelling(element));
        self.push_type(TypeData {
            kind: TypeKind::ConstantArray,
            spelling,
            canonical: None,
            pointee: None,
            declaration: None,
        })
    }

    /// Record type declared by `decl`; one type per declaration.
    pub fn record_type(&mut self, decl: CursorId) -> TypeId {
        if let Some(&id) = self.records.get(&decl) {
            return id;
        }
        let spelling = self.cursor(decl).display_name.clone();
        let id = self.push_type(TypeData {
            kind: TypeKind::Record,
            spelling,
            canonical: None,
            pointee: None,
            declaration: Some(decl),
        });
        self.records.insert(decl, id);
        id
    }

    /// Re-point a record type at a later (defining) declaration.
    pub fn set_type_declaration(&mut self, ty: TypeId, decl: CursorId) {
        self.types[ty.0 as usize].declaration = Some(decl);
        self.records.insert(decl, ty);
    }

    /// Record type whose declaration is not part of the tree.
    pub fn opaque_record(&mut self, spelling: &str) -> TypeId {
        if let Some(&id) = self.opaque.get(spelling) {
            return id;
        }
        let id = self.push_type(TypeData {
            kind: TypeKind::Record,
            spelling: spelling.to_string(),
            canonical: None,
            pointee: None,
            declaration: None,
        });
        self.opaque.insert(spelling.to_string(), id);
        id
    }

    pub fn enum_type(&mut self, spelling: &str) -> TypeId {
        self.push_type(TypeData {
            kind: TypeKind::Enum,
            spelling: spelling.to_string(),
            canonical: None,
            pointee: None,
            declaration: None,
        })
    }

    pub fn typedef_type(
        &mut self,
        decl: Option<CursorId>,
        spelling: &str,
        underlying: TypeId,
    ) -> TypeId {
        let canonical = self.canonical_of(underlying);
        self.push_type(TypeData {
            kind: TypeKind::Typedef,
            spelling: spelling.to_string(),
            canonical: Some(canonical),
            pointee: None,
            declaration: decl,
        })
    }

    /// A named use of `named` as written in source (`Foo`, `ns::Bar`).
    pub fn elaborated(&mut self, spelling: &str, named: TypeId) -> TypeId {
        let canonical = self.canonical_of(named);
        let declaration = self.type_data(named).declaration;
        self.push_type(TypeData {
            kind: TypeKind::Elaborated,
            spelling: spelling.to_string(),
            canonical: Some(canonical),
            pointee: None,
            declaration,
        })
    }

    pub fn unexposed(&mut self, spelling: &str) -> TypeId {
        self.push_type(TypeData {
            kind: TypeKind::Unexposed,
            spelling: spelling.to_string(),
            canonical: None,
            pointee: None,
            declaration: None,
        })
    }

    pub fn invalid(&mut self, spelling: &str) -> TypeId {
        self.push_type(TypeData {
            kind: TypeKind::Invalid,
            spelling: spelling.to_string(),
            canonical: None,
            pointee: None,
            declaration: None,
        })
    }

    // ---- diagnostics ---------------------------------------------------

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn finish(self) -> TranslationUnit {
        TranslationUnit {
            path: self.path,
            root: self.root,
            cursors: self.cursors,
            types: self.types,
            diagnostics: self.diagnostics,
        }
    }
}

fn declarator_spelling(inner: &str, sigil: &str) -> String {
    if inner.ends_with('*') || inner.ends_with('&') {
        format!("{inner}{sigil}")
    } else {
        format!("{inner} {sigil}")
    }
}
