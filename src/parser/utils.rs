//! Small text helpers shared by the section grammars and the Newick writer.

/// Parses a single numeric token, accepting the `nan`/`-nan` PAML prints for undefined values.
///
/// # Examples
/// ```
/// # use pamlwick::parser::utils::parse_number;
/// assert_eq!(parse_number("0.25"), Some(0.25));
/// assert_eq!(parse_number("-1.0e-3"), Some(-0.001));
/// assert!(parse_number("-nan").unwrap().is_nan());
/// assert_eq!(parse_number("T:0.2"), None);
/// ```
pub fn parse_number(token: &str) -> Option<f64> {
    match token {
        "nan" | "-nan" | "NaN" => Some(f64::NAN),
        _ => token.parse::<f64>().ok(),
    }
}

/// Returns all whitespace-separated tokens of `text` that parse as numbers, in order.
///
/// # Examples
/// ```
/// # use pamlwick::parser::utils::parse_numbers;
/// assert_eq!(parse_numbers("p:   0.80  0.20"), vec![0.80, 0.20]);
/// ```
pub fn parse_numbers(text: &str) -> Vec<f64> {
    text.split_whitespace().filter_map(parse_number).collect()
}

/// Parses `text` as a whitespace-separated list of numbers, failing if any token is not one.
pub fn parse_all_numbers(text: &str) -> Option<Vec<f64>> {
    text.split_whitespace().map(parse_number).collect()
}

/// Removes every whitespace character, as done for tree lines before parsing.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Returns whether the line is empty or whitespace only.
#[inline]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Escapes a label for bracket notation: labels with delimiters are
/// wrapped in single quotes with internal quotes doubled.
///
/// # Examples
/// ```
/// # use pamlwick::parser::utils::escape_label;
/// assert_eq!(escape_label("Hylobates"), "Hylobates");
/// assert_eq!(escape_label("node#8"), "node#8");
/// assert_eq!(escape_label("a,b"), "'a,b'");
/// assert_eq!(escape_label("Baillon's crake"), "'Baillon''s crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if label.chars().any(|c| {
        matches!(
            c,
            ' ' | ',' | ';' | '\t' | '\n' | '\r' | '(' | ')' | ':' | '[' | ']' | '\''
        )
    }) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_numbers_rejects_words() {
        assert_eq!(parse_all_numbers("1 2.5 -3"), Some(vec![1.0, 2.5, -3.0]));
        assert_eq!(parse_all_numbers("1 two 3"), None);
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("((1: 0.1, 2: 0.2): 0.3, 3: 0.4);"), "((1:0.1,2:0.2):0.3,3:0.4);");
    }
}
