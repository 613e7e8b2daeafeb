//! Identifier case conversion for generated binding names.

/// `get_value` -> `GetValue`.
///
/// Each underscore-delimited segment is capitalized (first character upper,
/// the rest lower) and the segments are joined without separators. Empty
/// segments come from leading, trailing or doubled underscores and are kept
/// as a literal `_`.
pub fn underscore_to_camelcase(value: &str) -> String {
    value
        .split('_')
        .map(|segment| {
            if segment.is_empty() {
                "_".to_string()
            } else {
                capitalize(segment)
            }
        })
        .collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
