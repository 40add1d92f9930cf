use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

//
// Macros
//

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: ::once_cell::sync::OnceCell<::regex::Regex> = ::once_cell::sync::OnceCell::new();
        RE.get_or_init(|| ::regex::Regex::new($re).unwrap())
    }};
}

//
// Modules
//

mod builder;
pub mod ce;
mod collator;
mod data;
mod error;
pub mod index;
mod iter;
mod keys;
pub mod locale;
pub mod locale_data;
pub mod normalize;
pub mod props;
pub mod registry;
pub mod reorder;
mod root;
pub mod rules;
pub mod weights;

pub use collator::{Collator, Freezable, Reorderable, RuleBasedCollator};
pub use error::{CollationError, Result};
pub use index::{AlphabeticIndex, Bucket, ImmutableIndex, LabelType};
pub use iter::CollationElementIterator;
pub use keys::{BoundMode, SortKey};
pub use locale::LocaleId;
pub use locale_data::{BuiltinLocaleData, LocaleData};
pub use registry::{CollatorRegistry, RegistrationKey};
pub use reorder::{equivalent_reorder_codes, ReorderCode};

//
// Structs etc.
//

/// How many levels take part in a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Strength {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Identical,
}

/// Treatment of variable collation elements (spaces, punctuation, and so on).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AlternateHandling {
    NonIgnorable,
    Shifted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CaseFirst {
    Off,
    LowerFirst,
    UpperFirst,
}

/// The last reordering group that is variable when shifting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum MaxVariable {
    Space,
    Punctuation,
    Symbol,
    Currency,
}

impl MaxVariable {
    pub fn from_name(name: &str) -> Option<MaxVariable> {
        match name {
            "space" => Some(MaxVariable::Space),
            "punct" => Some(MaxVariable::Punctuation),
            "symbol" => Some(MaxVariable::Symbol),
            "currency" => Some(MaxVariable::Currency),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MaxVariable::Space => "space",
            MaxVariable::Punctuation => "punct",
            MaxVariable::Symbol => "symbol",
            MaxVariable::Currency => "currency",
        }
    }

    pub fn reorder_code(self) -> ReorderCode {
        match self {
            MaxVariable::Space => ReorderCode::Space,
            MaxVariable::Punctuation => ReorderCode::Punctuation,
            MaxVariable::Symbol => ReorderCode::Symbol,
            MaxVariable::Currency => ReorderCode::Currency,
        }
    }
}

/// Collator settings. Applications may keep these in their own config files.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CollationOptions {
    pub strength: Strength,
    pub alternate: AlternateHandling,
    pub max_variable: MaxVariable,
    pub case_first: CaseFirst,
    pub case_level: bool,
    pub numeric: bool,
    pub normalization: bool,
    /// French secondary ordering.
    pub backwards_secondary: bool,
    pub reorder_codes: Vec<ReorderCode>,
}

impl Default for CollationOptions {
    fn default() -> Self {
        Self {
            strength: Strength::Tertiary,
            alternate: AlternateHandling::NonIgnorable,
            max_variable: MaxVariable::Punctuation,
            case_first: CaseFirst::Off,
            case_level: false,
            numeric: false,
            normalization: false,
            backwards_secondary: false,
            reorder_codes: Vec::new(),
        }
    }
}

//
// Functions, public
//

/// Compares two strings with the root collator, breaking ties by code point.
pub fn collate(str_a: &str, str_b: &str, options: &CollationOptions) -> Ordering {
    if normalize::nfd(str_a) == normalize::nfd(str_b) {
        return Ordering::Equal;
    }

    let comparison = collator::compare_root(str_a, str_b, options);

    if comparison == Ordering::Equal {
        // Tiebreaker
        return str_a.cmp(str_b);
    }

    comparison
}

/// Compares two strings with the root collator.
pub fn collate_no_tiebreak(str_a: &str, str_b: &str, options: &CollationOptions) -> Ordering {
    if normalize::nfd(str_a) == normalize::nfd(str_b) {
        return Ordering::Equal;
    }

    collator::compare_root(str_a, str_b, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted() -> CollationOptions {
        CollationOptions {
            alternate: AlternateHandling::Shifted,
            strength: Strength::Quaternary,
            ..Default::default()
        }
    }

    #[test]
    fn deluge_shifted() {
        let mut scrambled = [
            "demark", "de-luge", "deluge", "de-Luge", "de luge", "de-luge", "deLuge", "de Luge",
            "de-Luge", "death",
        ];

        scrambled.sort_by(|a, b| collate(a, b, &shifted()));

        let sorted = [
            "death", "de luge", "de-luge", "de-luge", "deluge", "de Luge", "de-Luge", "de-Luge",
            "deLuge", "demark",
        ];

        assert_eq!(scrambled, sorted);
    }

    #[test]
    fn multi_script() {
        let mut scrambled = [
            "ｶ",
            "ヵ",
            "abc",
            "abç",
            "ab©",
            "𝒶bc",
            "abC",
            "𝕒bc",
            "File-3",
            "ガ",
            "が",
            "äbc",
            "カ",
            "か",
            "Abc",
            "file-12",
            "filé-110",
        ];

        scrambled.sort_by(|a, b| collate(a, b, &shifted()));

        let sorted = [
            "ab©",
            "abc",
            "abC",
            "𝒶bc",
            "𝕒bc",
            "Abc",
            "abç",
            "äbc",
            "filé-110",
            "file-12",
            "File-3",
            "か",
            "ヵ",
            "カ",
            "ｶ",
            "が",
            "ガ",
        ];

        assert_eq!(scrambled, sorted);
    }

    #[test]
    fn numeric_option() {
        let options = CollationOptions {
            numeric: true,
            ..Default::default()
        };
        let mut files = ["file-110", "file-12", "file-3"];
        files.sort_by(|a, b| collate(a, b, &options));
        assert_eq!(files, ["file-3", "file-12", "file-110"]);
    }

    #[test]
    fn canonical_equivalents_are_equal() {
        let options = CollationOptions::default();
        assert_eq!(
            collate_no_tiebreak("a\u{0323}\u{0308}", "a\u{0308}\u{0323}", &options),
            Ordering::Equal
        );
        assert_eq!(collate("\u{00E4}", "a\u{0308}", &options), Ordering::Equal);
    }

    #[test]
    fn options_survive_bincode() {
        let options = CollationOptions {
            strength: Strength::Secondary,
            ..Default::default()
        };
        let bytes = bincode::serialize(&options).unwrap();
        let back: CollationOptions = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, options);
        assert_eq!(MaxVariable::from_name("punct"), Some(MaxVariable::Punctuation));
        assert_eq!(MaxVariable::Symbol.name(), "symbol");
    }
}
