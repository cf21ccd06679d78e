use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_MERCHANT_LEN: usize = 50;

/// Only the receipt header is searched for a store name.
const HEADER_LINES: usize = 6;

/// Store-name patterns, most specific first.
static STORE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)INDOMARET|ALFAMART|ALFAMIDI",
        r"(?i)HYPERMART|SUPERINDO|GIANT|LOTTE|CARREFOUR",
        r"(?i)WARUNG|TOKO|KIOS|MINIMARKET",
        r"(?i)CAFE|COFFEE|RESTO|RESTAURANT|KEDAI",
        r"(?i)BAKERY|LAUNDRY|APOTEK|PHARMACY",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("store pattern is valid"))
    .collect()
});

/// Best guess at the merchant name: the first header line that looks like a
/// store, otherwise the first non-empty line. Empty input gives `""`.
pub fn extract_merchant(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let matched = lines
        .iter()
        .take(HEADER_LINES)
        .find(|line| STORE_PATTERNS.iter().any(|re| re.is_match(line)));

    matched
        .or_else(|| lines.first())
        .map(|line| truncate_merchant(line))
        .unwrap_or_default()
}

/// Cuts a merchant name to `MAX_MERCHANT_LEN` characters.
pub fn truncate_merchant(name: &str) -> String {
    name.trim().chars().take(MAX_MERCHANT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_known_chain_over_earlier_lines() {
        let text = "Selamat Datang\nALFAMART CIPUTAT\nJl. Raya 12";
        assert_eq!(extract_merchant(text), "ALFAMART CIPUTAT");
    }

    #[test]
    fn generic_store_words_match_case_insensitively() {
        let text = "\n  Kedai Kopi Senja  \n2x Es Kopi";
        assert_eq!(extract_merchant(text), "Kedai Kopi Senja");
    }

    #[test]
    fn falls_back_to_first_non_empty_line() {
        let text = "\n\nPT SUMBER REJEKI\nNPWP 01.234.567\n";
        assert_eq!(extract_merchant(text), "PT SUMBER REJEKI");
    }

    #[test]
    fn only_header_lines_are_searched() {
        let text = "A\nB\nC\nD\nE\nF\nINDOMARET";
        assert_eq!(extract_merchant(text), "A");
    }

    #[test]
    fn empty_text_gives_empty_merchant() {
        assert_eq!(extract_merchant(""), "");
        assert_eq!(extract_merchant("  \n \t\n"), "");
    }

    #[test]
    fn long_names_are_truncated_to_fifty_chars() {
        let long = format!("TOKO {}", "X".repeat(80));
        let merchant = extract_merchant(&long);
        assert_eq!(merchant.chars().count(), MAX_MERCHANT_LEN);
        assert!(merchant.starts_with("TOKO XXX"));

        let fallback = "Z".repeat(60);
        assert_eq!(extract_merchant(&fallback).chars().count(), MAX_MERCHANT_LEN);
    }
}
