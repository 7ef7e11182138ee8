use itertools::Itertools;

use crate::lexicon::Lexicon;

/// Canonical form of a column name using the built-in lexicon.
pub fn normalize_header(header: &str) -> String {
    normalize_header_with(header, Lexicon::builtin())
}

/// Lowercases, keeps ASCII letters, digits and whitespace, collapses runs of
/// whitespace and expands abbreviations word by word.
pub fn normalize_header_with(header: &str, lexicon: &Lexicon) -> String {
    let stripped = header
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    stripped
        .split_whitespace()
        .map(|word| lexicon.expand(word).unwrap_or(word))
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize_header("  Email   Address! "), "email address");
        assert_eq!(normalize_header("postal_code"), "postalcode");
        assert_eq!(normalize_header("E-Mail"), "email");
    }

    #[test]
    fn expands_abbreviations_per_word() {
        assert_eq!(normalize_header("Cust Addr"), "customer address");
        assert_eq!(normalize_header("Order Qty"), "order quantity");
        assert_eq!(normalize_header("DOB"), "date of birth");
    }

    #[test]
    fn empty_and_symbol_only_inputs_normalize_to_empty() {
        assert_eq!(normalize_header(""), "");
        assert_eq!(normalize_header("#$%"), "");
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        assert_eq!(normalize_header("Straße"), "strae");
    }
}
