//! Detection of the `{ length; data* }` struct layout used to pass
//! fixed-layout arrays across the binding boundary.

use super::type_tag::{atom_tag, TypeTag};
use crate::ast::{Cursor, CursorKind, Type, TypeKind};
use crate::errors::{Error, Result};
use serde::Serialize;

pub const LENGTH_MEMBER: &str = "length";
pub const DATA_MEMBER: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayShape {
    /// Atom pointed to by `data`.
    pub element: TypeTag,
    /// Atom of the `length` member.
    pub length: TypeTag,
}

/// Read the element and length atoms of an array-shaped record type.
///
/// Fails with `ArrayShapeMismatch` when the record has no visible
/// declaration, lacks either member, or `data` is not a pointer.
pub fn detect(record: Type<'_>) -> Result<ArrayShape> {
    let name = record.spelling();
    let declaration = record
        .declaration()
        .ok_or_else(|| Error::array_shape_mismatch(name, "declaration is not visible"))?;
    let declaration = declaration.definition().unwrap_or(declaration);

    let length = member_type(declaration, LENGTH_MEMBER)
        .ok_or_else(|| Error::array_shape_mismatch(name, "missing member `length`"))?;
    let data = member_type(declaration, DATA_MEMBER)
        .ok_or_else(|| Error::array_shape_mismatch(name, "missing member `data`"))?
        .canonical();

    let pointee = match (data.kind(), data.pointee()) {
        (TypeKind::Pointer, Some(pointee)) => pointee,
        _ => {
            return Err(Error::array_shape_mismatch(
                name,
                format!("member `data` has non-pointer type `{}`", data.spelling()),
            ))
        }
    };

    Ok(ArrayShape {
        element: atom_tag(pointee.canonical())?,
        length: atom_tag(length.canonical())?,
    })
}

fn member_type<'tu>(declaration: Cursor<'tu>, name: &str) -> Option<Type<'tu>> {
    declaration
        .children()
        .filter(|child| child.kind() == CursorKind::FieldDecl && !child.spelling().is_empty())
        .filter(|child| child.spelling() == name)
        .last()
        .and_then(|field| field.cursor_type())
}
