//! Spellings of the builtin scalar types and the typedef names treated as
//! builtins.

use crate::ast::TypeKind;

/// Single-keyword builtin types.
pub fn primitive_kind(name: &str) -> Option<TypeKind> {
    let kind = match name {
        "void" => TypeKind::Void,
        "bool" | "_Bool" => TypeKind::Bool,
        "char" => TypeKind::CharS,
        "short" => TypeKind::Short,
        "int" | "signed" => TypeKind::Int,
        "unsigned" => TypeKind::UInt,
        "long" => TypeKind::Long,
        "float" => TypeKind::Float,
        "double" => TypeKind::Double,
        "wchar_t" => TypeKind::WChar,
        "char16_t" => TypeKind::Char16,
        "char32_t" => TypeKind::Char32,
        _ => return None,
    };
    Some(kind)
}

/// Typedef names from `<cstdint>`/`<cstddef>` that resolve without an
/// include, for an LP64 target.
pub fn typedef_kind(name: &str) -> Option<TypeKind> {
    let name = name.strip_prefix("std::").unwrap_or(name);
    let kind = match name {
        "int8_t" => TypeKind::SChar,
        "uint8_t" => TypeKind::UChar,
        "int16_t" => TypeKind::Short,
        "uint16_t" => TypeKind::UShort,
        "int32_t" => TypeKind::Int,
        "uint32_t" => TypeKind::UInt,
        "int64_t" => TypeKind::LongLong,
        "uint64_t" => TypeKind::ULongLong,
        "size_t" | "uintptr_t" => TypeKind::ULong,
        "ssize_t" | "ptrdiff_t" | "intptr_t" => TypeKind::Long,
        _ => return None,
    };
    Some(kind)
}

/// Multi-keyword specifiers such as `unsigned long long` or `signed char`.
pub fn sized_kind(words: &[&str]) -> Option<TypeKind> {
    let mut unsigned = false;
    let mut signed = false;
    let mut longs = 0;
    let mut short = false;
    let mut base = None;

    for word in words {
        match *word {
            "unsigned" => unsigned = true,
            "signed" => signed = true,
            "long" => longs += 1,
            "short" => short = true,
            "int" | "char" | "double" => base = Some(*word),
            _ => return None,
        }
    }

    let kind = match (base, unsigned, short, longs) {
        (Some("char"), true, false, 0) => TypeKind::UChar,
        (Some("char"), false, false, 0) if signed => TypeKind::SChar,
        (Some("char"), false, false, 0) => TypeKind::CharS,
        (Some("double"), false, false, 0) if !signed => TypeKind::Double,
        (Some("double"), false, false, 1) if !signed => TypeKind::LongDouble,
        (Some("char" | "double"), ..) => return None,
        (_, _, true, 0) if unsigned => TypeKind::UShort,
        (_, _, true, 0) => TypeKind::Short,
        (_, _, true, _) => return None,
        (_, true, false, 0) => TypeKind::UInt,
        (_, false, false, 0) => TypeKind::Int,
        (_, true, false, 1) => TypeKind::ULong,
        (_, false, false, 1) => TypeKind::Long,
        (_, true, false, 2) => TypeKind::ULongLong,
        (_, false, false, 2) => TypeKind::LongLong,
        _ => return None,
    };
    Some(kind)
}

/// Builtin kind named by a spelling such as `double` or `unsigned int`.
pub fn kind_from_spelling(spelling: &str) -> Option<TypeKind> {
    let words: Vec<&str> = spelling.split_whitespace().collect();
    match words.as_slice() {
        [] => None,
        [word] => primitive_kind(word).or_else(|| typedef_kind(word)),
        _ => sized_kind(&words),
    }
}
