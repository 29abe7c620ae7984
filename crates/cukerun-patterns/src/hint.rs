//! Type hints narrowing placeholder captures.

const UNSIGNED: &str = r"\d+";
const SIGNED: &str = r"[+-]?\d+";
const FLOAT: &str = r"[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?";
const WORD: &str = r"\S+";
const QUOTED: &str = r#""[^"]*""#;
const ANY: &str = r".+?";

/// Regex fragment captured for a placeholder carrying `hint`.
///
/// Unknown hints and untyped placeholders match lazily so that surrounding
/// literal text decides where the capture ends.
///
/// # Examples
/// ```
/// use cukerun_patterns::type_hint_fragment;
/// assert_eq!(type_hint_fragment(Some("u32")), r"\d+");
/// assert_eq!(type_hint_fragment(None), r".+?");
/// ```
#[must_use]
pub fn type_hint_fragment(hint: Option<&str>) -> &'static str {
    match hint {
        Some("u8" | "u16" | "u32" | "u64" | "u128" | "usize") => UNSIGNED,
        Some("i8" | "i16" | "i32" | "i64" | "i128" | "isize") => SIGNED,
        Some("f32" | "f64") => FLOAT,
        Some("word") => WORD,
        Some("string") => QUOTED,
        _ => ANY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("usize"), UNSIGNED)]
    #[case(Some("i64"), SIGNED)]
    #[case(Some("f32"), FLOAT)]
    #[case(Some("word"), WORD)]
    #[case(Some("string"), QUOTED)]
    #[case(Some("Celsius"), ANY)]
    #[case(None, ANY)]
    fn maps_hints_to_fragments(#[case] hint: Option<&str>, #[case] expected: &str) {
        assert_eq!(type_hint_fragment(hint), expected);
    }
}
