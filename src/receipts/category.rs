use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spending categories shared with the frontend. The spellings are part of the
/// stored data and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Academic,
    Lifestyle,
    Transport,
    Health,
    Entertainment,
    Others,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Academic,
        Category::Lifestyle,
        Category::Transport,
        Category::Health,
        Category::Entertainment,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Academic => "Academic",
            Category::Lifestyle => "Lifestyle",
            Category::Transport => "Transport",
            Category::Health => "Health",
            Category::Entertainment => "Entertainment",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive on input; output is always the canonical spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

/// Keyword rules evaluated top to bottom; the first match decides.
///
/// Order is part of the contract. Categories share vocabulary (a minimarket
/// sells food, a campus has a canteen), so reordering changes results.
static CATEGORY_RULES: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    [
        (
            r"cafe|coffee|kopi|resto|bakery|makan|minum|food|warung|kedai",
            Category::Food,
        ),
        (
            r"toko\s*buku|gramedia|gunung\s*agung|fotocopy|fotokopi|print|kampus",
            Category::Academic,
        ),
        (
            r"gojek|grab|ojol|taxi|taksi|bensin|pertamina|spbu|parkir",
            Category::Transport,
        ),
        (
            r"indomaret|alfamart|alfamidi|minimarket|supermarket|laundry|salon|barbershop|gym|fitness",
            Category::Lifestyle,
        ),
        (
            r"apotek|apotik|pharmacy|farmasi|klinik|clinic|rumah\s*sakit|hospital",
            Category::Health,
        ),
        (
            r"bioskop|cinema|xxi|cgv|game|karaoke|netflix|spotify",
            Category::Entertainment,
        ),
    ]
    .into_iter()
    .map(|(pattern, category)| {
        (
            Regex::new(pattern).expect("category pattern is valid"),
            category,
        )
    })
    .collect()
});

/// Guesses a spending category from the merchant name.
pub fn classify(merchant: &str) -> Category {
    let merchant = merchant.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(re, _)| re.is_match(&merchant))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Others)
}
