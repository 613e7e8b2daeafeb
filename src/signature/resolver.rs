//! Resolution of AST type nodes into [`ResolvedType`] values.

use super::array_shape;
use super::type_tag::{atom_tag, TypeTag};
use crate::ast::{Type, TypeKind};
use crate::errors::{Error, Result};
use serde::{Serialize, Serializer};

/// Scalar, or one level of pointer/array indirection.
///
/// Pointers and array-shaped records both resolve to `Array`; which of the
/// two applied is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    Scalar,
    Array,
}

impl Dimensionality {
    pub fn ndims(self) -> u8 {
        match self {
            Dimensionality::Scalar => 0,
            Dimensionality::Array => 1,
        }
    }
}

impl Serialize for Dimensionality {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ndims())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedType {
    pub atom: TypeTag,
    pub dimensionality: Dimensionality,
}

impl ResolvedType {
    pub fn scalar(atom: TypeTag) -> Self {
        Self {
            atom,
            dimensionality: Dimensionality::Scalar,
        }
    }

    pub fn array(atom: TypeTag) -> Self {
        Self {
            atom,
            dimensionality: Dimensionality::Array,
        }
    }

    /// Stand-in for a non-primitive record that is not array shaped.
    pub fn opaque() -> Self {
        Self::scalar(TypeTag::Unresolved)
    }

    pub fn ndims(&self) -> u8 {
        self.dimensionality.ndims()
    }

    pub fn is_void(&self) -> bool {
        self.atom == TypeTag::Void && self.dimensionality == Dimensionality::Scalar
    }
}

/// Map a type node onto the canonical vocabulary.
///
/// Pointers resolve to their pointee's atom, records are read as array
/// shapes, elaborated and typedef wrappers are peeled through their canonical
/// type, everything else must be a scalar kind in the table.
pub fn resolve(ty: Type<'_>) -> Result<ResolvedType> {
    let mut current = ty;
    loop {
        match current.kind() {
            TypeKind::Pointer => {
                let pointee = current.pointee().ok_or_else(|| unresolved(current))?;
                return Ok(ResolvedType::array(atom_tag(pointee.canonical())?));
            }
            TypeKind::Record => {
                let shape = array_shape::detect(current)?;
                return Ok(ResolvedType::array(shape.element));
            }
            TypeKind::Elaborated | TypeKind::Typedef => {
                let canonical = current.canonical();
                if canonical == current {
                    return Err(unresolved(current));
                }
                current = canonical;
            }
            _ => return Ok(ResolvedType::scalar(atom_tag(current.canonical())?)),
        }
    }
}

fn unresolved(ty: Type<'_>) -> Error {
    Error::UnresolvedType {
        kind: ty.kind(),
        spelling: ty.spelling().to_string(),
    }
}
