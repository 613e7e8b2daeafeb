//! Lowering of tree-sitter C++ syntax trees into the [`crate::ast`] arena.
//!
//! The lowered tree follows clang's model closely enough for signature
//! extraction: named type uses become `Elaborated` types whose canonical
//! type is the declaration they name, typedefs chain down to builtins, and
//! out-of-line member definitions are linked to their in-class declarations.

use super::args::{CompilerArgs, SourceLanguage};
use super::builtins;
use super::parser::{self, SourceFile};
use crate::ast::{
    CursorId, CursorKind, Diagnostic, TranslationUnit, TranslationUnitBuilder, TypeId, TypeKind,
};
use crate::errors::Result;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use tree_sitter::Node;

/// Lower `source` (the contents of `path`) and every header it includes.
pub(crate) fn lower(
    path: &Path,
    source: &str,
    args: &CompilerArgs,
    typedefs: &IndexMap<String, TypeKind>,
) -> Result<TranslationUnit> {
    let mut lowerer = Lowerer::new(path, args, typedefs);
    lowerer
        .visited
        .insert(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
    let root = Scope {
        cursor: lowerer.builder.root(),
        name: String::new(),
        class: None,
    };
    lowerer.lower_file(path, source, &root)?;
    Ok(lowerer.builder.finish())
}

#[derive(Debug, Clone)]
struct Scope {
    /// Lexical parent for new cursors.
    cursor: CursorId,
    /// Qualified name used for lookups (`ns::Widget`).
    name: String,
    /// Bare class name inside a class body.
    class: Option<String>,
}

impl Scope {
    fn qualify(&self, name: &str) -> String {
        qualify(&self.name, name)
    }
}

struct Lowerer<'a> {
    args: &'a CompilerArgs,
    typedefs: &'a IndexMap<String, TypeKind>,
    builder: TranslationUnitBuilder,
    defines: HashMap<String, String>,
    /// Named types by qualified name: records, enums, typedefs and aliases.
    symbols: HashMap<String, TypeId>,
    records: HashMap<String, TypeId>,
    /// Forward declarations still waiting for their definition.
    record_decls: HashMap<String, Vec<CursorId>>,
    definitions: HashMap<String, CursorId>,
    namespaces: HashSet<String>,
    builtin_typedefs: HashMap<String, TypeId>,
    template_params: Vec<Vec<String>>,
    visited: HashSet<PathBuf>,
}

impl<'a> Lowerer<'a> {
    fn new(path: &Path, args: &'a CompilerArgs, typedefs: &'a IndexMap<String, TypeKind>) -> Self {
        let mut defines = args.defines.clone();
        if args.language == SourceLanguage::Cxx {
            defines
                .entry("__cplusplus".to_string())
                .or_insert_with(|| "201703L".to_string());
        }
        Self {
            args,
            typedefs,
            builder: TranslationUnitBuilder::new(path),
            defines,
            symbols: HashMap::new(),
            records: HashMap::new(),
            record_decls: HashMap::new(),
            definitions: HashMap::new(),
            namespaces: HashSet::new(),
            builtin_typedefs: HashMap::new(),
            template_params: Vec::new(),
            visited: HashSet::new(),
        }
    }

    fn lower_file(&mut self, path: &Path, source: &str, scope: &Scope) -> Result<()> {
        let file = parser::parse_source(source, path)?;
        for diagnostic in parser::syntax_diagnostics(&file) {
            self.builder.push_diagnostic(diagnostic);
        }
        debug!(path = %path.display(), "lowering file");
        self.lower_items(file.tree.root_node(), &file, scope)
    }

    fn lower_items(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        for child in named_children(node) {
            self.lower_item(child, file, scope)?;
        }
        Ok(())
    }

    fn lower_item(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        match node.kind() {
            "namespace_definition" => self.lower_namespace(node, file, scope),
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.lower_record(node, file, scope, None, None).map(|_| ())
            }
            "enum_specifier" => {
                self.enum_specifier(node, file, scope, None);
                Ok(())
            }
            "template_declaration" => self.lower_template(node, file, scope),
            "type_definition" => self.lower_typedef(node, file, scope),
            "alias_declaration" => self.lower_alias(node, file, scope),
            "linkage_specification" => match node.child_by_field_name("body") {
                Some(body) if body.kind() == "declaration_list" => self.lower_items(body, file, scope),
                Some(body) => self.lower_item(body, file, scope),
                None => Ok(()),
            },
            "declaration_list" => self.lower_items(node, file, scope),
            "preproc_ifdef" | "preproc_if" => self.lower_conditional(node, file, scope),
            "preproc_def" | "preproc_function_def" => {
                self.define(node, file);
                Ok(())
            }
            "preproc_call" => {
                self.undefine(node, file);
                Ok(())
            }
            "preproc_include" => self.lower_include(node, file, scope),
            "field_declaration" | "declaration" | "function_definition" => {
                self.lower_declaration(node, file, scope)
            }
            _ => Ok(()),
        }
    }

    // ---- scopes ----------------------------------------------------------

    fn lower_namespace(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let Some(body) = node.child_by_field_name("body") else {
            return Ok(());
        };
        // Anonymous namespaces are transparent.
        let Some(name) = node.child_by_field_name("name") else {
            return self.lower_items(body, file, scope);
        };

        let mut current = scope.clone();
        let name = normalize(file.text(name));
        for segment in name.split("::") {
            let segment = segment.trim().trim_start_matches("inline ").trim();
            if segment.is_empty() {
                continue;
            }
            let cursor = self
                .builder
                .add_cursor(current.cursor, CursorKind::Namespace, segment);
            self.builder.set_location(cursor, file.location(node));
            let qualified = current.qualify(segment);
            self.namespaces.insert(qualified.clone());
            current = Scope {
                cursor,
                name: qualified,
                class: None,
            };
        }
        self.lower_items(body, file, &current)
    }

    /// Lower a class, struct or union specifier and return its record type.
    fn lower_record(
        &mut self,
        node: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        template: Option<&[String]>,
        anonymous_name: Option<&str>,
    ) -> Result<TypeId> {
        let spelling = match node.child_by_field_name("name") {
            Some(name) => last_segment(&normalize(file.text(name))).to_string(),
            None => anonymous_name.unwrap_or_default().to_string(),
        };
        let body = node.child_by_field_name("body");
        let kind = match (template, node.kind()) {
            (Some(_), _) => CursorKind::ClassTemplate,
            (None, "class_specifier") => CursorKind::ClassDecl,
            _ => CursorKind::StructDecl,
        };
        let display_name = match template {
            Some(params) => format!("{spelling}<{}>", params.join(", ")),
            None if spelling.is_empty() => "(anonymous)".to_string(),
            None => spelling.clone(),
        };

        let cursor = self.builder.add_cursor(scope.cursor, kind, spelling.as_str());
        self.builder.set_display_name(cursor, display_name);
        self.builder.set_location(cursor, file.location(node));

        let qualified = scope.qualify(&spelling);
        let ty = if spelling.is_empty() {
            if body.is_some() {
                self.builder.set_definition(cursor, cursor);
            }
            self.builder.record_type(cursor)
        } else {
            let ty = match self.records.get(&qualified) {
                Some(&ty) => {
                    if body.is_some() {
                        self.builder.set_type_declaration(ty, cursor);
                    }
                    ty
                }
                None => self.builder.record_type(cursor),
            };
            self.records.insert(qualified.clone(), ty);
            self.symbols.insert(qualified.clone(), ty);
            self.link_definition(&qualified, cursor, body.is_some());
            ty
        };

        if let Some(body) = body {
            trace!(class = %qualified, "lowering class body");
            let class_scope = Scope {
                cursor,
                name: qualified,
                class: Some(spelling),
            };
            self.lower_items(body, file, &class_scope)?;
        }
        Ok(ty)
    }

    fn link_definition(&mut self, qualified: &str, cursor: CursorId, is_definition: bool) {
        if is_definition {
            self.builder.set_definition(cursor, cursor);
            for decl in self.record_decls.remove(qualified).unwrap_or_default() {
                self.builder.set_definition(decl, cursor);
            }
            self.definitions.insert(qualified.to_string(), cursor);
        } else if let Some(&definition) = self.definitions.get(qualified) {
            self.builder.set_definition(cursor, definition);
        } else {
            self.record_decls
                .entry(qualified.to_string())
                .or_default()
                .push(cursor);
        }
    }

    fn lower_template(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let parameters = node.child_by_field_name("parameters");
        let names = parameters
            .map(|list| template_parameter_names(list, file))
            .unwrap_or_default();
        let inner = named_children(node).into_iter().find(|child| {
            Some(child.id()) != parameters.map(|list| list.id()) && child.kind() != "requires_clause"
        });

        self.template_params.push(names.clone());
        let result = match inner {
            Some(inner) if matches!(inner.kind(), "class_specifier" | "struct_specifier") => {
                // `template <>` introduces an explicit specialization, which is
                // an ordinary class.
                let template = (!names.is_empty()).then_some(names.as_slice());
                self.lower_record(inner, file, scope, template, None).map(|_| ())
            }
            Some(inner) => {
                trace!(kind = inner.kind(), "skipping templated declaration");
                Ok(())
            }
            None => Ok(()),
        };
        self.template_params.pop();
        result
    }

    // ---- aliases ---------------------------------------------------------

    fn lower_typedef(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let declarators = children_by_field(node, "declarator");
        let first_name = declarators.first().and_then(|&declarator| {
            let (_, inner) = peel_to_name(declarator);
            inner.map(|name| normalize(file.text(name)))
        });
        let base = self.declared_type(node, file, scope, first_name.as_deref())?;

        for declarator in declarators {
            let (ty, inner) = self.apply_declarator(base, Some(declarator), file, false);
            let Some(name) = inner else { continue };
            let name = normalize(file.text(name));
            let cursor = self
                .builder
                .add_cursor(scope.cursor, CursorKind::TypedefDecl, name.as_str());
            self.builder.set_location(cursor, file.location(node));
            let typedef = self.builder.typedef_type(Some(cursor), &name, ty);
            self.builder.set_type(cursor, typedef);
            self.symbols.insert(scope.qualify(&name), typedef);
        }
        Ok(())
    }

    fn lower_alias(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let (Some(name), Some(descriptor)) =
            (node.child_by_field_name("name"), node.child_by_field_name("type"))
        else {
            return Ok(());
        };
        let name = normalize(file.text(name));
        let base = self.declared_type(descriptor, file, scope, Some(&name))?;
        let (ty, _) = self.apply_declarator(
            base,
            descriptor.child_by_field_name("declarator"),
            file,
            false,
        );

        let cursor = self
            .builder
            .add_cursor(scope.cursor, CursorKind::TypeAliasDecl, name.as_str());
        self.builder.set_location(cursor, file.location(node));
        let alias = self.builder.typedef_type(Some(cursor), &name, ty);
        self.builder.set_type(cursor, alias);
        self.symbols.insert(scope.qualify(&name), alias);
        Ok(())
    }

    // ---- declarations ----------------------------------------------------

    fn lower_declaration(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let is_definition = node.kind() == "function_definition";
        let has_type = node.child_by_field_name("type").is_some();
        let base = self.declared_type(node, file, scope, None)?;

        for declarator in children_by_field(node, "declarator") {
            let (ty, inner) = self.apply_declarator(base, Some(declarator), file, false);
            let Some(inner) = inner else { continue };
            match inner.kind() {
                "function_declarator" => {
                    self.lower_function(node, inner, ty, has_type, file, scope, is_definition)?
                }
                "operator_cast" => self.lower_conversion(node, inner, file, scope, is_definition)?,
                "field_identifier" | "identifier" if scope.class.is_some() => {
                    let name = file.text(inner);
                    let field = self.builder.add_cursor(scope.cursor, CursorKind::FieldDecl, name);
                    self.builder.set_location(field, file.location(node));
                    self.builder.set_type(field, ty);
                }
                _ => {}
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_function(
        &mut self,
        node: Node<'_>,
        declarator: Node<'_>,
        result: TypeId,
        has_type: bool,
        file: &SourceFile,
        scope: &Scope,
        is_definition: bool,
    ) -> Result<()> {
        let Some(name) = declarator.child_by_field_name("declarator").map(peel_parens) else {
            return Ok(());
        };
        let parameters = declarator.child_by_field_name("parameters");

        if let Some(class) = scope.class.as_deref() {
            let spelling = function_spelling(file.text(name));
            let kind = match name.kind() {
                "destructor_name" => CursorKind::Destructor,
                _ if !has_type && spelling == class => CursorKind::Constructor,
                _ => CursorKind::CxxMethod,
            };
            let parameters = self.parameters(parameters, file, scope)?;
            let method = self.add_function(scope.cursor, kind, &spelling, result, &parameters, file, node);
            if is_definition {
                self.builder.set_definition(method, method);
            }
            if is_pure_virtual(file.text(node)) {
                self.builder.mark_pure_virtual(method);
            }
            return Ok(());
        }

        if name.kind() == "qualified_identifier" {
            return self.lower_out_of_line(node, name, parameters, result, file, scope, is_definition);
        }

        let spelling = function_spelling(file.text(name));
        let parameters = self.parameters(parameters, file, scope)?;
        let function = self.add_function(
            scope.cursor,
            CursorKind::FunctionDecl,
            &spelling,
            result,
            &parameters,
            file,
            node,
        );
        if is_definition {
            self.builder.set_definition(function, function);
        }
        Ok(())
    }

    /// `R Class::name(args) { ... }` at namespace scope.
    #[allow(clippy::too_many_arguments)]
    fn lower_out_of_line(
        &mut self,
        node: Node<'_>,
        name: Node<'_>,
        parameters: Option<Node<'_>>,
        result: TypeId,
        file: &SourceFile,
        scope: &Scope,
        is_definition: bool,
    ) -> Result<()> {
        let full = normalize(file.text(name));
        let full = full.trim_start_matches("::");
        let Some((owner, member)) = full.rsplit_once("::") else {
            return Ok(());
        };

        let class = candidates(&scope.name, owner)
            .into_iter()
            .find_map(|candidate| self.definitions.get(&candidate).map(|&id| (candidate, id)));
        let Some((class_name, class_cursor)) = class else {
            let is_namespace = candidates(&scope.name, owner)
                .iter()
                .any(|candidate| self.namespaces.contains(candidate));
            if !is_namespace {
                self.error(format!("use of undeclared identifier '{owner}'"), file, name);
            } else if is_definition {
                let parameters = self.parameters(parameters, file, scope)?;
                let function = self.add_function(
                    scope.cursor,
                    CursorKind::FunctionDecl,
                    &function_spelling(member),
                    result,
                    &parameters,
                    file,
                    node,
                );
                self.builder.set_definition(function, function);
            }
            return Ok(());
        };
        if !is_definition {
            return Ok(());
        }

        let class_scope = Scope {
            cursor: scope.cursor,
            name: class_name.clone(),
            class: Some(last_segment(&class_name).to_string()),
        };
        let parameters = self.parameters(parameters, file, &class_scope)?;
        let spelling = function_spelling(member);
        let wanted: Vec<String> = parameters
            .iter()
            .map(|(_, ty)| self.canonical_spelling(*ty))
            .collect();

        let declaration = self
            .builder
            .cursor_children(class_cursor)
            .iter()
            .copied()
            .find(|&child| {
                self.builder.cursor_kind(child).is_member_function()
                    && self.builder.cursor_spelling(child) == spelling
                    && self
                        .builder
                        .argument_types(child)
                        .into_iter()
                        .map(|ty| self.canonical_spelling(ty))
                        .eq(wanted.iter().cloned())
            });
        let Some(declaration) = declaration else {
            self.error(
                format!("out-of-line definition of '{spelling}' does not match any declaration in '{class_name}'"),
                file,
                name,
            );
            return Ok(());
        };

        let kind = self.builder.cursor_kind(declaration);
        let definition = self.add_function(scope.cursor, kind, &spelling, result, &parameters, file, node);
        self.builder.set_semantic_parent(definition, class_cursor);
        self.builder.set_definition(definition, definition);
        self.builder.set_definition(declaration, definition);
        trace!(class = %class_name, method = %spelling, "linked out-of-line definition");
        Ok(())
    }

    /// `operator T()` inside a class body.
    fn lower_conversion(
        &mut self,
        node: Node<'_>,
        cast: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        is_definition: bool,
    ) -> Result<()> {
        if scope.class.is_none() {
            return Ok(());
        }
        let target = self.declared_type(cast, file, scope, None)?;
        let (target, function) =
            self.apply_declarator(target, cast.child_by_field_name("declarator"), file, false);
        let parameters = function.and_then(|function| function.child_by_field_name("parameters"));
        let parameters = self.parameters(parameters, file, scope)?;
        let spelling = format!("operator {}", self.builder.type_spelling(target));
        let conversion = self.add_function(
            scope.cursor,
            CursorKind::ConversionFunction,
            &spelling,
            target,
            &parameters,
            file,
            node,
        );
        if is_definition {
            self.builder.set_definition(conversion, conversion);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn add_function(
        &mut self,
        parent: CursorId,
        kind: CursorKind,
        spelling: &str,
        result: TypeId,
        parameters: &[(String, TypeId)],
        file: &SourceFile,
        node: Node<'_>,
    ) -> CursorId {
        let function = self.builder.add_cursor(parent, kind, spelling);
        self.builder.set_location(function, file.location(node));
        self.builder.set_result_type(function, result);
        let mut spellings = Vec::with_capacity(parameters.len());
        for (name, ty) in parameters {
            self.builder.add_argument(function, name.as_str(), *ty);
            spellings.push(self.builder.type_spelling(*ty).to_string());
        }
        self.builder
            .set_display_name(function, format!("{spelling}({})", spellings.join(", ")));
        function
    }

    fn parameters(
        &mut self,
        list: Option<Node<'_>>,
        file: &SourceFile,
        scope: &Scope,
    ) -> Result<Vec<(String, TypeId)>> {
        let Some(list) = list else {
            return Ok(Vec::new());
        };
        let mut parameters = Vec::new();
        for child in named_children(list) {
            if !matches!(child.kind(), "parameter_declaration" | "optional_parameter_declaration") {
                continue;
            }
            let base = self.declared_type(child, file, scope, None)?;
            let (ty, inner) =
                self.apply_declarator(base, child.child_by_field_name("declarator"), file, true);
            let name = inner
                .filter(|name| name.kind() == "identifier")
                .map(|name| file.text(name).to_string())
                .unwrap_or_default();
            parameters.push((name, ty));
        }

        // `(void)` declares no parameters.
        if let [(name, ty)] = parameters.as_slice() {
            if name.is_empty() && self.builder.type_kind(*ty) == TypeKind::Void {
                parameters.clear();
            }
        }
        Ok(parameters)
    }

    // ---- types -----------------------------------------------------------

    /// Type named by the `type` field of a declaration, with its cv-qualifiers.
    fn declared_type(
        &mut self,
        node: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        anonymous_name: Option<&str>,
    ) -> Result<TypeId> {
        let Some(specifier) = node.child_by_field_name("type") else {
            return Ok(self.builder.builtin(TypeKind::Void));
        };
        let ty = self.specifier_type(specifier, file, scope, anonymous_name)?;
        Ok(self.apply_qualifiers(node, ty, file))
    }

    fn specifier_type(
        &mut self,
        node: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        anonymous_name: Option<&str>,
    ) -> Result<TypeId> {
        let ty = match node.kind() {
            "primitive_type" => self.primitive_type(file.text(node)),
            "sized_type_specifier" => {
                let words: Vec<&str> = file.text(node).split_whitespace().collect();
                match builtins::sized_kind(&words) {
                    Some(kind) => self.builder.builtin(kind),
                    None => {
                        let spelling = words.join(" ");
                        self.error(format!("invalid type specifier '{spelling}'"), file, node);
                        self.builder.invalid(&spelling)
                    }
                }
            }
            "type_identifier" | "qualified_identifier" | "qualified_type_identifier"
            | "namespace_identifier" | "template_type" => self.named_type(node, file, scope),
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.record_specifier(node, file, scope, anonymous_name)?
            }
            "enum_specifier" => self.enum_specifier(node, file, scope, anonymous_name),
            _ => self.builder.unexposed(&normalize(file.text(node))),
        };
        Ok(ty)
    }

    fn primitive_type(&mut self, name: &str) -> TypeId {
        if let Some(kind) = builtins::primitive_kind(name) {
            return self.builder.builtin(kind);
        }
        match self.builtin_typedef(name) {
            Some(typedef) => self.builder.elaborated(name, typedef),
            None => self.builder.unexposed(name),
        }
    }

    fn named_type(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> TypeId {
        let name = normalize(file.text(node));
        let name = name.trim_start_matches("::");

        if name.contains('<') {
            let record = self.builder.opaque_record(name);
            return self.builder.elaborated(name, record);
        }
        if self.is_template_param(name) {
            return self.builder.unexposed(name);
        }
        if let Some(kind) = builtins::primitive_kind(name) {
            return self.builder.builtin(kind);
        }
        if let Some(ty) = self.lookup(name, scope) {
            return self.builder.elaborated(name, ty);
        }
        if let Some(typedef) = self.builtin_typedef(name) {
            return self.builder.elaborated(name, typedef);
        }
        if name.starts_with("std::") {
            let record = self.builder.opaque_record(name);
            return self.builder.elaborated(name, record);
        }
        if let Some((head, _)) = name.split_once("::") {
            if self.is_template_param(head) {
                return self.builder.unexposed(name);
            }
        }
        self.unknown_type(name, file, node)
    }

    fn record_specifier(
        &mut self,
        node: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        anonymous_name: Option<&str>,
    ) -> Result<TypeId> {
        if node.child_by_field_name("body").is_none() {
            if let Some(name) = node.child_by_field_name("name") {
                let name = normalize(file.text(name));
                if let Some(ty) = self.lookup(&name, scope) {
                    return Ok(self.builder.elaborated(&normalize(file.text(node)), ty));
                }
            }
        }
        let record = self.lower_record(node, file, scope, None, anonymous_name)?;
        let spelling = self.builder.type_spelling(record).to_string();
        Ok(self.builder.elaborated(&spelling, record))
    }

    fn enum_specifier(
        &mut self,
        node: Node<'_>,
        file: &SourceFile,
        scope: &Scope,
        anonymous_name: Option<&str>,
    ) -> TypeId {
        let name = node
            .child_by_field_name("name")
            .map(|name| normalize(file.text(name)))
            .or_else(|| anonymous_name.map(str::to_string));
        let Some(name) = name else {
            return self.builder.enum_type("(anonymous enum)");
        };
        if node.child_by_field_name("body").is_none() {
            if let Some(ty) = self.lookup(&name, scope) {
                return self.builder.elaborated(&name, ty);
            }
        }
        let qualified = scope.qualify(&name);
        let ty = self.builder.enum_type(&qualified);
        self.symbols.insert(qualified, ty);
        self.builder.elaborated(&name, ty)
    }

    /// Wrap `base` in the pointer, reference and array layers of a
    /// declarator. Returns the innermost node that is not such a layer: the
    /// declared name, or the function declarator of a function declaration.
    fn apply_declarator<'t>(
        &mut self,
        base: TypeId,
        declarator: Option<Node<'t>>,
        file: &SourceFile,
        in_parameters: bool,
    ) -> (TypeId, Option<Node<'t>>) {
        let mut ty = base;
        let mut current = declarator;
        while let Some(node) = current {
            match node.kind() {
                "pointer_declarator" | "abstract_pointer_declarator" => {
                    ty = self.builder.pointer_to(ty);
                    ty = self.apply_qualifiers(node, ty, file);
                    current = node.child_by_field_name("declarator");
                }
                "reference_declarator" | "abstract_reference_declarator" => {
                    let rvalue = file.text(node).trim_start().starts_with("&&");
                    ty = self.builder.reference_to(ty, rvalue);
                    current = node.named_child(0);
                }
                "array_declarator" | "abstract_array_declarator" => {
                    ty = if in_parameters {
                        self.builder.pointer_to(ty)
                    } else {
                        let size = node
                            .child_by_field_name("size")
                            .map(|size| normalize(file.text(size)))
                            .unwrap_or_default();
                        self.builder.constant_array(ty, &size)
                    };
                    current = node.child_by_field_name("declarator");
                }
                "parenthesized_declarator" | "abstract_parenthesized_declarator" => {
                    current = node.named_child(0);
                }
                "init_declarator" => current = node.child_by_field_name("declarator"),
                "function_declarator" | "abstract_function_declarator" => {
                    let inner = node.child_by_field_name("declarator");
                    let through_pointer =
                        inner.is_some_and(|inner| inner.kind().ends_with("parenthesized_declarator"));
                    if !(in_parameters || through_pointer) {
                        return (ty, Some(node));
                    }
                    let signature = node
                        .child_by_field_name("parameters")
                        .map(|list| normalize(file.text(list)))
                        .unwrap_or_else(|| "()".to_string());
                    let spelling = format!("{} {signature}", self.builder.type_spelling(ty));
                    ty = self.builder.unexposed(&spelling);
                    if !through_pointer {
                        ty = self.builder.pointer_to(ty);
                    }
                    current = inner;
                }
                _ => return (ty, Some(node)),
            }
        }
        (ty, None)
    }

    fn apply_qualifiers(&mut self, node: Node<'_>, ty: TypeId, file: &SourceFile) -> TypeId {
        named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "type_qualifier")
            .filter_map(|qualifier| match file.text(qualifier) {
                "const" => Some("const"),
                "volatile" => Some("volatile"),
                _ => None,
            })
            .fold(ty, |ty, qualifier| self.builder.qualified(ty, qualifier))
    }

    fn builtin_typedef(&mut self, name: &str) -> Option<TypeId> {
        if let Some(&typedef) = self.builtin_typedefs.get(name) {
            return Some(typedef);
        }
        let kind = self
            .typedefs
            .get(name)
            .copied()
            .or_else(|| builtins::typedef_kind(name))?;
        let underlying = self.builder.builtin(kind);
        let typedef = self.builder.typedef_type(None, name, underlying);
        self.builtin_typedefs.insert(name.to_string(), typedef);
        Some(typedef)
    }

    fn lookup(&self, name: &str, scope: &Scope) -> Option<TypeId> {
        candidates(&scope.name, name)
            .into_iter()
            .find_map(|candidate| self.symbols.get(&candidate).copied())
    }

    fn is_template_param(&self, name: &str) -> bool {
        self.template_params
            .iter()
            .any(|params| params.iter().any(|param| param == name))
    }

    fn canonical_spelling(&self, ty: TypeId) -> String {
        self.builder
            .type_spelling(self.builder.canonical_of(ty))
            .to_string()
    }

    /// An undeclared name is usually a type from a header that was not
    /// found. The method using it fails to resolve; the file still parses.
    fn unknown_type(&mut self, name: &str, file: &SourceFile, node: Node<'_>) -> TypeId {
        self.builder.push_diagnostic(Diagnostic::warning(
            format!("unknown type name '{name}'"),
            file.location(node),
        ));
        self.builder.invalid(name)
    }

    fn error(&mut self, message: String, file: &SourceFile, node: Node<'_>) {
        self.builder
            .push_diagnostic(Diagnostic::error(message, file.location(node)));
    }

    // ---- preprocessor ----------------------------------------------------

    fn lower_conditional(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let taken = match node.kind() {
            "preproc_ifdef" | "preproc_elifdef" => {
                let defined = node
                    .child_by_field_name("name")
                    .is_some_and(|name| self.defines.contains_key(file.text(name)));
                let negated = node
                    .child(0)
                    .is_some_and(|token| matches!(token.kind(), "#ifndef" | "#elifndef"));
                defined != negated
            }
            "preproc_if" | "preproc_elif" => node
                .child_by_field_name("condition")
                .map_or(true, |condition| self.evaluate(condition, file)),
            _ => true,
        };

        if taken {
            let skipped: Vec<usize> = ["name", "condition", "alternative"]
                .iter()
                .filter_map(|field| node.child_by_field_name(field))
                .map(|child| child.id())
                .collect();
            for child in named_children(node) {
                if !skipped.contains(&child.id()) {
                    self.lower_item(child, file, scope)?;
                }
            }
            Ok(())
        } else if let Some(alternative) = node.child_by_field_name("alternative") {
            self.lower_conditional(alternative, file, scope)
        } else {
            Ok(())
        }
    }

    /// Evaluate an `#if` condition. Anything beyond literals, `defined`,
    /// `!`, `&&` and `||` counts as true.
    fn evaluate(&self, node: Node<'_>, file: &SourceFile) -> bool {
        match node.kind() {
            "number_literal" => parse_number(file.text(node)).map_or(true, |value| value != 0),
            "preproc_defined" => node
                .named_child(0)
                .is_some_and(|name| self.defines.contains_key(file.text(name))),
            "identifier" => self
                .defines
                .get(file.text(node))
                .is_some_and(|value| parse_number(value).map_or(true, |value| value != 0)),
            "parenthesized_expression" => node
                .named_child(0)
                .map_or(true, |inner| self.evaluate(inner, file)),
            "unary_expression" => {
                let operator = node.child_by_field_name("operator").map(|op| file.text(op));
                match (operator, node.child_by_field_name("argument")) {
                    (Some("!"), Some(argument)) => !self.evaluate(argument, file),
                    _ => true,
                }
            }
            "binary_expression" => {
                let operator = node.child_by_field_name("operator").map(|op| file.text(op));
                let left = node.child_by_field_name("left");
                let right = node.child_by_field_name("right");
                match (operator, left, right) {
                    (Some("&&"), Some(left), Some(right)) => {
                        self.evaluate(left, file) && self.evaluate(right, file)
                    }
                    (Some("||"), Some(left), Some(right)) => {
                        self.evaluate(left, file) || self.evaluate(right, file)
                    }
                    _ => true,
                }
            }
            _ => true,
        }
    }

    fn define(&mut self, node: Node<'_>, file: &SourceFile) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let value = node
            .child_by_field_name("value")
            .map(|value| file.text(value).trim().to_string())
            .unwrap_or_default();
        self.defines.insert(file.text(name).to_string(), value);
    }

    fn undefine(&mut self, node: Node<'_>, file: &SourceFile) {
        let directive = node.child_by_field_name("directive").map(|d| file.text(d));
        if directive != Some("#undef") {
            return;
        }
        if let Some(argument) = node.child_by_field_name("argument") {
            self.defines.remove(file.text(argument).trim());
        }
    }

    fn lower_include(&mut self, node: Node<'_>, file: &SourceFile, scope: &Scope) -> Result<()> {
        let Some(path) = node.child_by_field_name("path") else {
            return Ok(());
        };
        let raw = file.text(path).trim();
        let (target, quoted) = match path.kind() {
            "string_literal" => (raw.trim_matches('"'), true),
            "system_lib_string" => (raw.trim_start_matches('<').trim_end_matches('>'), false),
            _ => return Ok(()),
        };

        let Some(found) = self.find_include(target, quoted, file.directory()) else {
            if quoted {
                self.error(format!("'{target}' file not found"), file, path);
            } else {
                debug!(header = target, "system header not found, skipping");
            }
            return Ok(());
        };

        let key = fs::canonicalize(&found).unwrap_or_else(|_| found.clone());
        if !self.visited.insert(key) {
            trace!(header = %found.display(), "already included");
            return Ok(());
        }
        match fs::read_to_string(&found) {
            Ok(source) => self.lower_file(&found, &source, scope),
            Err(err) => {
                self.error(format!("cannot read '{}': {err}", found.display()), file, path);
                Ok(())
            }
        }
    }

    fn find_include(&self, target: &str, quoted: bool, directory: &Path) -> Option<PathBuf> {
        let local = quoted.then(|| directory.join(target));
        local
            .into_iter()
            .chain(self.args.search_dirs().map(|dir| dir.join(target)))
            .find(|candidate| candidate.is_file())
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn children_by_field<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn peel_parens(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while current.kind() == "parenthesized_declarator" {
        match current.named_child(0) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Walk a declarator down to the declared name without building types.
fn peel_to_name(declarator: Node<'_>) -> (usize, Option<Node<'_>>) {
    let mut depth = 0;
    let mut current = Some(declarator);
    while let Some(node) = current {
        current = match node.kind() {
            "pointer_declarator" | "array_declarator" | "function_declarator" | "init_declarator" => {
                node.child_by_field_name("declarator")
            }
            "reference_declarator" | "parenthesized_declarator" => node.named_child(0),
            _ => return (depth, Some(node)),
        };
        depth += 1;
    }
    (depth, None)
}

fn template_parameter_names(list: Node<'_>, file: &SourceFile) -> Vec<String> {
    named_children(list)
        .into_iter()
        .filter_map(|parameter| {
            let name = match parameter.kind() {
                "type_parameter_declaration"
                | "variadic_type_parameter_declaration"
                | "template_template_parameter_declaration" => named_children(parameter)
                    .into_iter()
                    .rev()
                    .find(|child| child.kind() == "type_identifier"),
                "optional_type_parameter_declaration" => parameter.child_by_field_name("name"),
                "parameter_declaration" | "optional_parameter_declaration" => parameter
                    .child_by_field_name("declarator")
                    .and_then(|declarator| peel_to_name(declarator).1),
                _ => None,
            }?;
            Some(file.text(name).to_string())
        })
        .collect()
}

fn is_pure_virtual(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.ends_with("=0;")
}

/// Collapse whitespace; drop it around `::`.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ::", "::")
        .replace(":: ", "::")
}

/// `operator ()` -> `operator()`, `operator  new` -> `operator new`.
fn function_spelling(text: &str) -> String {
    let text = normalize(text);
    if let Some(rest) = text.strip_prefix("operator") {
        let trimmed = rest.trim_start();
        let word_follows = trimmed.starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if word_follows && trimmed.len() < rest.len() {
            return format!("operator {trimmed}");
        }
        if !word_follows && !trimmed.is_empty() {
            return format!("operator{}", trimmed.replace(' ', ""));
        }
    }
    text
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}::{name}")
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Qualified names `name` may refer to from `scope`, innermost first.
fn candidates(scope: &str, name: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut prefix = scope;
    loop {
        found.push(qualify(prefix, name));
        if prefix.is_empty() {
            return found;
        }
        prefix = prefix.rsplit_once("::").map_or("", |(parent, _)| parent);
    }
}

fn parse_number(text: &str) -> Option<i64> {
    let digits = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_innermost_first() {
        assert_eq!(
            candidates("a::b", "Foo"),
            vec!["a::b::Foo", "a::Foo", "Foo"]
        );
        assert_eq!(candidates("", "Foo"), vec!["Foo"]);
    }

    #[test]
    fn test_function_spelling() {
        assert_eq!(function_spelling("operator ()"), "operator()");
        assert_eq!(function_spelling("operator =="), "operator==");
        assert_eq!(function_spelling("operator  new"), "operator new");
        assert_eq!(function_spelling("operator_count"), "operator_count");
        assert_eq!(function_spelling("set_gain"), "set_gain");
    }

    #[test]
    fn test_pure_virtual_detection() {
        assert!(is_pure_virtual("virtual double read(int channel) = 0;"));
        assert!(is_pure_virtual("virtual void f() const=0 ;"));
        assert!(!is_pure_virtual("virtual void f();"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0"), Some(0));
        assert_eq!(parse_number("201703L"), Some(201703));
        assert_eq!(parse_number("0x10"), Some(16));
        assert_eq!(parse_number("FOO"), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("ns :: Foo"), "ns::Foo");
        assert_eq!(normalize("unsigned   int"), "unsigned int");
    }
}
