//! Small string utilities backing the FEN parser.

/// Split `src` at any character in `delimiters`. With `omit_empty`, empty
/// segments are dropped, which collapses runs of adjacent delimiters.
pub fn split<'a>(src: &'a str, delimiters: &str, omit_empty: bool) -> Vec<&'a str> {
    src.split(|c: char| delimiters.contains(c))
        .filter(|segment| !omit_empty || !segment.is_empty())
        .collect()
}

/// Split at a single delimiter character.
pub fn split_char(src: &str, delimiter: char, omit_empty: bool) -> Vec<&str> {
    src.split(delimiter)
        .filter(|segment| !omit_empty || !segment.is_empty())
        .collect()
}

/// Parse a plain unsigned decimal: one or more ASCII digits, nothing else.
///
/// Stricter than `str::parse::<u64>`, which tolerates a leading `+`.
pub fn parse_unsigned(src: &str) -> Option<u64> {
    if src.is_empty() || !src.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    src.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_single_delimiter() {
        assert_eq!(split_char("a/b/c", '/', false), vec!["a", "b", "c"]);
        assert_eq!(split_char("a//c", '/', false), vec!["a", "", "c"]);
        assert_eq!(split_char("a//c", '/', true), vec!["a", "c"]);
    }

    #[test]
    fn split_delimiter_set() {
        assert_eq!(split("a b\tc", " \t", false), vec!["a", "b", "c"]);
        assert_eq!(split("  a  b ", " ", true), vec!["a", "b"]);
    }

    #[test]
    fn split_empty_input() {
        assert_eq!(split_char("", '/', false), vec![""]);
        assert!(split_char("", '/', true).is_empty());
    }

    #[test]
    fn split_trailing_delimiter() {
        assert_eq!(split_char("a/", '/', false), vec!["a", ""]);
        assert_eq!(split_char("a/", '/', true), vec!["a"]);
    }

    #[test]
    fn parse_unsigned_accepts_digits_only() {
        assert_eq!(parse_unsigned("0"), Some(0));
        assert_eq!(parse_unsigned("42"), Some(42));
        assert_eq!(parse_unsigned("007"), Some(7));
    }

    #[test]
    fn parse_unsigned_rejects_everything_else() {
        assert_eq!(parse_unsigned(""), None);
        assert_eq!(parse_unsigned("+1"), None);
        assert_eq!(parse_unsigned("-1"), None);
        assert_eq!(parse_unsigned("1 "), None);
        assert_eq!(parse_unsigned("abc"), None);
        assert_eq!(parse_unsigned("1e3"), None);
    }
}
