//! Helpers for building synthetic trees in tests.
//!
//! Unit tests exercise the signature extractor against hand-built trees so
//! they do not depend on the tree-sitter frontend. These helpers wrap the
//! [`TranslationUnitBuilder`] calls that every such test repeats.
//!
//! ```rust
//! use cppsig::ast::{TranslationUnitBuilder, TypeKind};
//! use cppsig::testkit;
//!
//! let mut builder = TranslationUnitBuilder::new("fixture.hpp");
//! let root = builder.root();
//! let class = testkit::add_class(&mut builder, root, "Device");
//! let double = builder.builtin(TypeKind::Double);
//! testkit::add_method(&mut builder, class, "set_gain", TypeKind::Void, &[("gain", double)]);
//! let tu = builder.finish();
//! assert_eq!(tu.cursor().children().count(), 1);
//! ```

use crate::ast::{CursorId, CursorKind, TranslationUnitBuilder, TypeId, TypeKind};

pub fn add_namespace(builder: &mut TranslationUnitBuilder, parent: CursorId, name: &str) -> CursorId {
    builder.add_cursor(parent, CursorKind::Namespace, name)
}

/// A defined class (`class Name { ... };`).
pub fn add_class(builder: &mut TranslationUnitBuilder, parent: CursorId, name: &str) -> CursorId {
    let class = builder.add_cursor(parent, CursorKind::ClassDecl, name);
    builder.set_definition(class, class);
    class
}

/// An inline-defined method returning a builtin kind.
pub fn add_method(
    builder: &mut TranslationUnitBuilder,
    class: CursorId,
    name: &str,
    result: TypeKind,
    arguments: &[(&str, TypeId)],
) -> CursorId {
    let result = builder.builtin(result);
    add_method_returning(builder, class, name, result, arguments)
}

pub fn add_method_returning(
    builder: &mut TranslationUnitBuilder,
    class: CursorId,
    name: &str,
    result: TypeId,
    arguments: &[(&str, TypeId)],
) -> CursorId {
    let method = declare_method(builder, class, name, result, arguments);
    builder.set_definition(method, method);
    method
}

/// A method declaration with no definition anywhere in the tree.
pub fn declare_method(
    builder: &mut TranslationUnitBuilder,
    class: CursorId,
    name: &str,
    result: TypeId,
    arguments: &[(&str, TypeId)],
) -> CursorId {
    let method = builder.add_cursor(class, CursorKind::CxxMethod, name);
    builder.set_result_type(method, result);
    for (argument, ty) in arguments {
        builder.add_argument(method, *argument, *ty);
    }
    let spellings: Vec<String> = arguments
        .iter()
        .map(|(_, ty)| builder.type_spelling(*ty).to_string())
        .collect();
    builder.set_display_name(method, format!("{name}({})", spellings.join(", ")));
    method
}

/// `struct name { <length> length; <element>* data; };`, returning the
/// struct declaration and a named use of its type.
pub fn add_array_struct(
    builder: &mut TranslationUnitBuilder,
    parent: CursorId,
    name: &str,
    length: TypeKind,
    element: TypeKind,
) -> (CursorId, TypeId) {
    let decl = builder.add_cursor(parent, CursorKind::StructDecl, name);
    builder.set_definition(decl, decl);

    let length_ty = builder.builtin(length);
    let length_field = builder.add_cursor(decl, CursorKind::FieldDecl, "length");
    builder.set_type(length_field, length_ty);

    let element_ty = builder.builtin(element);
    let data_ty = builder.pointer_to(element_ty);
    let data_field = builder.add_cursor(decl, CursorKind::FieldDecl, "data");
    builder.set_type(data_field, data_ty);

    let record = builder.record_type(decl);
    let named = builder.elaborated(name, record);
    (decl, named)
}
