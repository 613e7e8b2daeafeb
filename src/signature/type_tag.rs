//! Canonical atom vocabulary and the table mapping AST scalar kinds onto it.

use crate::ast::{Type, TypeKind};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Atomic type identity shared by scalars, pointees and array elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    /// No value; only meaningful as a return type.
    Void,
    /// Placeholder for an opaque, non-primitive type.
    Unresolved,
}

impl TypeTag {
    /// The canonical table. Kinds outside it have no atom.
    ///
    /// `long` maps to a 32-bit integer while `unsigned long` maps to a
    /// 64-bit one; both follow the historical table consumers were built
    /// against.
    pub fn from_kind(kind: TypeKind) -> Option<TypeTag> {
        let tag = match kind {
            TypeKind::Bool => TypeTag::Bool,
            TypeKind::CharS | TypeKind::SChar => TypeTag::Int8,
            TypeKind::CharU | TypeKind::UChar => TypeTag::Uint8,
            TypeKind::Short => TypeTag::Int16,
            TypeKind::UShort => TypeTag::Uint16,
            TypeKind::Int | TypeKind::Long => TypeTag::Int32,
            TypeKind::UInt => TypeTag::Uint32,
            TypeKind::LongLong => TypeTag::Int64,
            TypeKind::ULong | TypeKind::ULongLong => TypeTag::Uint64,
            TypeKind::Float => TypeTag::Float32,
            TypeKind::Double => TypeTag::Float64,
            TypeKind::Void => TypeTag::Void,
            _ => return None,
        };
        Some(tag)
    }

    /// Name in the external sized-type vocabulary. `void` and opaque
    /// types have none.
    pub fn std_name(self) -> Option<&'static str> {
        let name = match self {
            TypeTag::Bool => "bool",
            TypeTag::Int8 => "int8_t",
            TypeTag::Uint8 => "uint8_t",
            TypeTag::Int16 => "int16_t",
            TypeTag::Uint16 => "uint16_t",
            TypeTag::Int32 => "int32_t",
            TypeTag::Uint32 => "uint32_t",
            TypeTag::Int64 => "int64_t",
            TypeTag::Uint64 => "uint64_t",
            TypeTag::Float32 => "float",
            TypeTag::Float64 => "double",
            TypeTag::Void | TypeTag::Unresolved => return None,
        };
        Some(name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Int8 => "int8",
            TypeTag::Uint8 => "uint8",
            TypeTag::Int16 => "int16",
            TypeTag::Uint16 => "uint16",
            TypeTag::Int32 => "int32",
            TypeTag::Uint32 => "uint32",
            TypeTag::Int64 => "int64",
            TypeTag::Uint64 => "uint64",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::Void => "void",
            TypeTag::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atom of an already-canonicalized type, or `UnresolvedType`.
pub fn atom_tag(ty: Type<'_>) -> Result<TypeTag> {
    TypeTag::from_kind(ty.kind()).ok_or_else(|| Error::UnresolvedType {
        kind: ty.kind(),
        spelling: ty.spelling().to_string(),
    })
}
