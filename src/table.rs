//! Flattening of a [`ClassRecord`] into one row per (method, argument) pair.

use crate::naming::underscore_to_camelcase;
use crate::signature::{ClassRecord, MethodSignature, ResolvedType, TypeTag};
use serde::Serialize;

/// Column order of the method table.
pub const COLUMNS: [&str; 10] = [
    "method_i",
    "method_name",
    "camel_name",
    "return_atom_type",
    "return_ndims",
    "arg_count",
    "arg_i",
    "arg_name",
    "atom_type",
    "ndims",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRow {
    /// Index of the overload group, by first appearance.
    pub method_i: usize,
    pub method_name: String,
    pub camel_name: String,
    pub return_atom_type: Option<String>,
    pub return_ndims: u8,
    pub arg_count: usize,
    pub arg_i: Option<usize>,
    pub arg_name: Option<String>,
    pub atom_type: Option<String>,
    pub ndims: Option<u8>,
}

impl MethodRow {
    /// Cell values in [`COLUMNS`] order; nulls render as empty strings.
    pub fn cells(&self) -> [String; 10] {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        [
            self.method_i.to_string(),
            self.method_name.clone(),
            self.camel_name.clone(),
            opt(&self.return_atom_type),
            self.return_ndims.to_string(),
            self.arg_count.to_string(),
            opt(&self.arg_i),
            opt(&self.arg_name),
            opt(&self.atom_type),
            opt(&self.ndims),
        ]
    }
}

/// Build the method table of one class.
///
/// Rows follow declaration order. `method_i` is the overload group's index,
/// so interleaved overloads of one name share it.
///
/// With `std_types` the atoms are written in the sized-type vocabulary
/// (`int32_t`, `double`) and `void`/opaque atoms become null; otherwise the
/// internal tag names are kept.
pub fn methods_frame(record: &ClassRecord, std_types: bool) -> Vec<MethodRow> {
    let mut rows = Vec::new();
    for (method_i, signature) in record.signatures() {
        let camel_name = underscore_to_camelcase(&signature.base_name);
        push_signature_rows(&mut rows, method_i, &camel_name, signature, std_types);
    }
    rows
}

fn push_signature_rows(
    rows: &mut Vec<MethodRow>,
    method_i: usize,
    camel_name: &str,
    signature: &MethodSignature,
    std_types: bool,
) {
    let row = |arg_i, arg_name, ty: Option<&ResolvedType>| MethodRow {
        method_i,
        method_name: signature.base_name.clone(),
        camel_name: camel_name.to_string(),
        return_atom_type: atom_name(signature.return_type.atom, std_types),
        return_ndims: signature.return_type.ndims(),
        arg_count: signature.arity(),
        arg_i,
        arg_name,
        atom_type: ty.and_then(|ty| atom_name(ty.atom, std_types)),
        ndims: ty.map(ResolvedType::ndims),
    };

    if signature.arguments.is_empty() {
        rows.push(row(None, None, None));
        return;
    }
    for argument in &signature.arguments {
        rows.push(row(
            Some(argument.position),
            Some(argument.name.clone()),
            Some(&argument.ty),
        ));
    }
}

fn atom_name(tag: TypeTag, std_types: bool) -> Option<String> {
    if std_types {
        tag.std_name().map(str::to_string)
    } else {
        Some(tag.as_str().to_string())
    }
}
