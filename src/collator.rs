//! The rule-based collator and the traits it exposes.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::build_tailoring;
use crate::ce::{primary, Ce};
use crate::data::CollationData;
use crate::error::{CollationError, Result};
use crate::iter::{ces_for_chars, CeBuffer, ChunkReader, CollationElementIterator};
use crate::keys::{KeySettings, SortKey};
use crate::locale_data::{BuiltinLocaleData, LocaleImporter};
use crate::reorder::{equivalent_reorder_codes, ReorderCode, ReorderTable};
use crate::root::{ReorderGroup, ROOT};
use crate::rules::Importer;
use crate::{AlternateHandling, CaseFirst, CollationOptions, MaxVariable, Strength};

static ROOT_DATA: Lazy<Arc<CollationData>> = Lazy::new(|| Arc::new(CollationData::default()));

const VARIABLE_GROUPS: [MaxVariable; 4] = [
    MaxVariable::Space,
    MaxVariable::Punctuation,
    MaxVariable::Symbol,
    MaxVariable::Currency,
];

//
// Traits
//

/// String comparison and sort keys.
pub trait Collator {
    fn compare(&self, a: &str, b: &str) -> Ordering;

    fn sort_key(&self, s: &str) -> SortKey;

    /// The sort key bytes, including the terminating zero.
    fn raw_key(&self, s: &str) -> Vec<u8> {
        self.sort_key(s).into_bytes()
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Collators whose script order can be changed.
pub trait Reorderable {
    fn reorder_codes(&self) -> &[ReorderCode];

    fn set_reorder_codes(&mut self, codes: &[ReorderCode]) -> Result<()>;

    fn equivalent_reorder_codes(&self, code: ReorderCode) -> Vec<ReorderCode> {
        equivalent_reorder_codes(code)
    }
}

/// A frozen object rejects mutation and may be shared between threads.
pub trait Freezable: Sized {
    fn freeze(&mut self);

    fn is_frozen(&self) -> bool;

    fn clone_as_thawed(&self) -> Self;

    fn frozen(mut self) -> Self {
        self.freeze();
        self
    }
}

//
// Shared helpers
//

fn variable_top_for(max_variable: MaxVariable) -> u32 {
    ROOT.group_for_code(max_variable.reorder_code())
        .map_or(0, ReorderGroup::last_primary)
}

fn reorder_table(codes: &[ReorderCode]) -> Result<Option<ReorderTable>> {
    if codes.is_empty() {
        return Ok(None);
    }
    let table = ReorderTable::new(codes)?;
    Ok(if table.is_identity() { None } else { Some(table) })
}

fn compare_with(
    data: &CollationData,
    settings: &KeySettings<'_>,
    a: &str,
    b: &str,
) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let numeric = settings.options.numeric;
    let normalize = settings.options.normalization;
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let mut a_ces = CeBuffer::new(ChunkReader::new(data, &a_chars, numeric, normalize));
    let mut b_ces = CeBuffer::new(ChunkReader::new(data, &b_chars, numeric, normalize));
    settings.compare((&mut a_ces, a), (&mut b_ces, b))
}

/// Root comparison for the free `collate` functions. Invalid reorder
/// codes are ignored there.
pub(crate) fn compare_root(a: &str, b: &str, options: &CollationOptions) -> Ordering {
    let reorder = reorder_table(&options.reorder_codes).ok().flatten();
    let settings = KeySettings {
        options,
        reorder: reorder.as_ref(),
        variable_top: variable_top_for(options.max_variable),
    };
    compare_with(&ROOT_DATA, &settings, a, b)
}

//
// Collator
//

#[derive(Deserialize, Serialize)]
struct Snapshot {
    data: CollationData,
    rules: String,
    defaults: CollationOptions,
    options: CollationOptions,
}

/// A collator built from root data plus a tailoring rule string.
///
/// Settings start at the values the rules chose and can be changed until the
/// collator is frozen. Clones share the compiled tables.
#[derive(Clone, Debug)]
pub struct RuleBasedCollator {
    data: Arc<CollationData>,
    rules: Arc<str>,
    defaults: CollationOptions,
    options: CollationOptions,
    reorder: Option<ReorderTable>,
    frozen: bool,
}

impl RuleBasedCollator {
    /// Compiles `rules`, resolving `[import]` against the built-in locale data.
    pub fn new(rules: &str) -> Result<Self> {
        Self::with_importer(rules, &LocaleImporter(&BuiltinLocaleData))
    }

    pub fn with_importer(rules: &str, importer: &dyn Importer) -> Result<Self> {
        let tailoring = build_tailoring(rules, importer)?;
        let reorder = reorder_table(&tailoring.options.reorder_codes)?;
        debug!(
            rules = rules.chars().count(),
            mappings = tailoring.data.mapping_count(),
            "collator built"
        );
        Ok(Self {
            data: Arc::new(tailoring.data),
            rules: Arc::from(rules),
            defaults: tailoring.options.clone(),
            options: tailoring.options,
            reorder,
            frozen: false,
        })
    }

    /// The untailored collator.
    pub fn root() -> Self {
        Self {
            data: Arc::clone(&ROOT_DATA),
            rules: Arc::from(""),
            defaults: CollationOptions::default(),
            options: CollationOptions::default(),
            reorder: None,
            frozen: false,
        }
    }

    fn check_thawed(&self) -> Result<()> {
        if self.frozen {
            Err(CollationError::FrozenMutation)
        } else {
            Ok(())
        }
    }

    fn key_settings(&self) -> KeySettings<'_> {
        KeySettings {
            options: &self.options,
            reorder: self.reorder.as_ref(),
            variable_top: self.variable_top(),
        }
    }

    fn ces(&self, chars: &[char]) -> Vec<Ce> {
        let mut ces = Vec::new();
        ChunkReader::new(
            &self.data,
            chars,
            self.options.numeric,
            self.options.normalization,
        )
        .read_all(&mut ces);
        ces
    }

    //
    // Settings
    //

    pub fn options(&self) -> &CollationOptions {
        &self.options
    }

    /// Replaces every setting at once.
    pub fn set_options(&mut self, options: CollationOptions) -> Result<()> {
        self.check_thawed()?;
        self.reorder = reorder_table(&options.reorder_codes)?;
        self.options = options;
        Ok(())
    }

    pub fn strength(&self) -> Strength {
        self.options.strength
    }

    pub fn set_strength(&mut self, strength: Strength) -> Result<()> {
        self.check_thawed()?;
        self.options.strength = strength;
        Ok(())
    }

    pub fn set_strength_default(&mut self) -> Result<()> {
        self.set_strength(self.defaults.strength)
    }

    pub fn is_case_level(&self) -> bool {
        self.options.case_level
    }

    pub fn set_case_level(&mut self, on: bool) -> Result<()> {
        self.check_thawed()?;
        self.options.case_level = on;
        Ok(())
    }

    pub fn set_case_level_default(&mut self) -> Result<()> {
        self.set_case_level(self.defaults.case_level)
    }

    pub fn case_first(&self) -> CaseFirst {
        self.options.case_first
    }

    pub fn set_case_first(&mut self, case_first: CaseFirst) -> Result<()> {
        self.check_thawed()?;
        self.options.case_first = case_first;
        Ok(())
    }

    pub fn set_case_first_default(&mut self) -> Result<()> {
        self.set_case_first(self.defaults.case_first)
    }

    pub fn is_alternate_handling_shifted(&self) -> bool {
        self.options.alternate == AlternateHandling::Shifted
    }

    pub fn set_alternate_handling_shifted(&mut self, shifted: bool) -> Result<()> {
        self.check_thawed()?;
        self.options.alternate = if shifted {
            AlternateHandling::Shifted
        } else {
            AlternateHandling::NonIgnorable
        };
        Ok(())
    }

    pub fn set_alternate_handling_default(&mut self) -> Result<()> {
        self.check_thawed()?;
        self.options.alternate = self.defaults.alternate;
        Ok(())
    }

    pub fn is_numeric_collation(&self) -> bool {
        self.options.numeric
    }

    pub fn set_numeric_collation(&mut self, on: bool) -> Result<()> {
        self.check_thawed()?;
        self.options.numeric = on;
        Ok(())
    }

    pub fn set_numeric_collation_default(&mut self) -> Result<()> {
        self.set_numeric_collation(self.defaults.numeric)
    }

    pub fn is_french_collation(&self) -> bool {
        self.options.backwards_secondary
    }

    pub fn set_french_collation(&mut self, on: bool) -> Result<()> {
        self.check_thawed()?;
        self.options.backwards_secondary = on;
        Ok(())
    }

    pub fn set_french_collation_default(&mut self) -> Result<()> {
        self.set_french_collation(self.defaults.backwards_secondary)
    }

    /// Whether text that is not in FCD form gets normalized.
    pub fn decomposition(&self) -> bool {
        self.options.normalization
    }

    pub fn set_decomposition(&mut self, on: bool) -> Result<()> {
        self.check_thawed()?;
        self.options.normalization = on;
        Ok(())
    }

    pub fn set_decomposition_default(&mut self) -> Result<()> {
        self.set_decomposition(self.defaults.normalization)
    }

    pub fn max_variable(&self) -> MaxVariable {
        self.options.max_variable
    }

    pub fn set_max_variable(&mut self, max_variable: MaxVariable) -> Result<()> {
        self.check_thawed()?;
        self.options.max_variable = max_variable;
        Ok(())
    }

    pub fn set_max_variable_default(&mut self) -> Result<()> {
        self.set_max_variable(self.defaults.max_variable)
    }

    /// The highest primary treated as variable when shifting.
    pub fn variable_top(&self) -> u32 {
        variable_top_for(self.options.max_variable)
    }

    /// Makes everything up to the end of the group containing `s` variable.
    ///
    /// `s` must map to a single collation element with a primary in the
    /// space, punctuation, symbol or currency group.
    pub fn set_variable_top(&mut self, s: &str) -> Result<u32> {
        self.check_thawed()?;
        let chars: Vec<char> = s.chars().collect();
        let ces = ces_for_chars(&self.data, &chars);
        let &[ce] = ces.as_slice() else {
            return Err(CollationError::invalid(format!(
                "variable top {:?} maps to {} collation elements",
                s,
                ces.len()
            )));
        };
        let p = primary(ce);
        let group = ROOT.group_for_primary(p).filter(|_| p != 0);
        let Some(max_variable) = VARIABLE_GROUPS
            .into_iter()
            .find(|mv| group.map_or(false, |g| g.codes.contains(&mv.reorder_code())))
        else {
            return Err(CollationError::invalid(format!(
                "variable top {:?} is not in a variable group",
                s
            )));
        };
        self.options.max_variable = max_variable;
        Ok(self.variable_top())
    }

    //
    // Data
    //

    /// The tailoring rules this collator was built from.
    pub fn rules(&self) -> &str {
        &self.rules
    }

    /// Strings whose mappings differ from the root. Prefix mappings appear
    /// as `prefix|string`.
    pub fn tailored_set(&self) -> BTreeSet<String> {
        self.data.tailored_set().clone()
    }

    pub fn contractions_starting_with(&self, c: char) -> Vec<String> {
        self.data
            .contractions_starting_with(c)
            .into_iter()
            .map(|key| key.into_iter().collect())
            .collect()
    }

    pub fn collation_element_iterator(&self, text: &str) -> CollationElementIterator {
        CollationElementIterator::new(
            Arc::clone(&self.data),
            self.options.numeric,
            self.options.normalization,
            text,
        )
    }

    /// Raw collation elements of `text`, before reordering.
    pub fn collation_elements(&self, text: &str) -> Vec<Ce> {
        let chars: Vec<char> = text.chars().collect();
        self.ces(&chars)
    }

    //
    // Binary form
    //

    /// Serializes the compiled tables and settings.
    pub fn clone_binary(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            data: (*self.data).clone(),
            rules: self.rules.to_string(),
            defaults: self.defaults.clone(),
            options: self.options.clone(),
        };
        bincode::serialize(&snapshot)
            .map_err(|error| CollationError::invalid(format!("cannot serialize collator: {}", error)))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)
            .map_err(|error| CollationError::invalid(format!("corrupt collator binary: {}", error)))?;
        let reorder = reorder_table(&snapshot.options.reorder_codes)?;
        Ok(Self {
            data: Arc::new(snapshot.data),
            rules: Arc::from(snapshot.rules),
            defaults: snapshot.defaults,
            options: snapshot.options,
            reorder,
            frozen: false,
        })
    }
}

impl Default for RuleBasedCollator {
    fn default() -> Self {
        Self::root()
    }
}

impl Collator for RuleBasedCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_with(&self.data, &self.key_settings(), a, b)
    }

    fn sort_key(&self, s: &str) -> SortKey {
        let chars: Vec<char> = s.chars().collect();
        self.key_settings().sort_key(&self.ces(&chars), s)
    }
}

impl Reorderable for RuleBasedCollator {
    fn reorder_codes(&self) -> &[ReorderCode] {
        &self.options.reorder_codes
    }

    /// `[]` or `[None]` clears reordering; `[Default]` restores the rules' order.
    fn set_reorder_codes(&mut self, codes: &[ReorderCode]) -> Result<()> {
        self.check_thawed()?;
        let codes = match codes {
            [] | [ReorderCode::None] => Vec::new(),
            [ReorderCode::Default] => self.defaults.reorder_codes.clone(),
            _ => codes.to_vec(),
        };
        self.reorder = reorder_table(&codes)?;
        self.options.reorder_codes = codes;
        Ok(())
    }
}

impl Freezable for RuleBasedCollator {
    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn clone_as_thawed(&self) -> Self {
        Self {
            frozen: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::Script;

    fn sorted(collator: &RuleBasedCollator, words: &[&str]) -> Vec<String> {
        let mut words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        words.sort_by(|a, b| collator.compare(a, b));
        words
    }

    fn assert_consistent(collator: &RuleBasedCollator, a: &str, b: &str) {
        let by_compare = collator.compare(a, b);
        let by_key = collator.sort_key(a).cmp(&collator.sort_key(b));
        assert_eq!(by_compare, by_key, "{a:?} vs {b:?}");
    }

    #[test]
    fn tailored_order() {
        let collator = RuleBasedCollator::new("&c < ch <<< cH <<< Ch <<< CH").unwrap();
        assert_eq!(
            sorted(&collator, &["d", "ch", "c", "CH", "cz"]),
            ["c", "cz", "ch", "CH", "d"]
        );
        assert!(collator.tailored_set().contains("ch"));
        assert_eq!(collator.rules(), "&c < ch <<< cH <<< Ch <<< CH");
    }

    #[test]
    fn strength_and_defaults() {
        let mut collator = RuleBasedCollator::new("[strength 1]&a < b").unwrap();
        assert_eq!(collator.strength(), Strength::Primary);
        assert!(collator.equals("a", "A"));
        collator.set_strength(Strength::Tertiary).unwrap();
        assert_eq!(collator.compare("a", "A"), Ordering::Less);
        collator.set_strength_default().unwrap();
        assert!(collator.equals("a", "\u{00E1}"));
    }

    #[test]
    fn case_first_and_case_level() {
        let mut collator = RuleBasedCollator::root();
        assert_eq!(collator.compare("a", "A"), Ordering::Less);
        collator.set_case_first(CaseFirst::UpperFirst).unwrap();
        assert_eq!(collator.compare("a", "A"), Ordering::Greater);
        assert_consistent(&collator, "a", "A");

        let mut collator = RuleBasedCollator::root();
        collator.set_strength(Strength::Primary).unwrap();
        collator.set_case_level(true).unwrap();
        assert_eq!(collator.compare("a", "A"), Ordering::Less);
        assert!(collator.equals("a", "\u{00E1}"));
    }

    #[test]
    fn case_first_long_strings() {
        for case_first in [CaseFirst::Off, CaseFirst::LowerFirst, CaseFirst::UpperFirst] {
            let mut collator = RuleBasedCollator::root();
            collator.set_case_first(case_first).unwrap();
            for len in 1..50 {
                let lower = "a".repeat(len);
                let upper = format!("{}A", "a".repeat(len - 1));
                assert_consistent(&collator, &lower, &upper);
                assert_consistent(&collator, &upper, &lower);
            }
        }
    }

    #[test]
    fn shifted_and_variable_top() {
        let mut collator = RuleBasedCollator::root();
        assert_eq!(collator.compare("a-b", "ab"), Ordering::Less);
        collator.set_alternate_handling_shifted(true).unwrap();
        assert!(collator.equals("a-b", "ab"));
        assert!(!collator.equals("a$b", "ab"));

        assert_eq!(collator.set_variable_top("$").unwrap(), collator.variable_top());
        assert_eq!(collator.max_variable(), MaxVariable::Currency);
        assert!(collator.equals("a$b", "ab"));

        assert!(matches!(
            collator.set_variable_top("ab"),
            Err(CollationError::InvalidArgument(_))
        ));
        assert!(matches!(
            collator.set_variable_top("a"),
            Err(CollationError::InvalidArgument(_))
        ));
        assert!(matches!(
            collator.set_variable_top(""),
            Err(CollationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn french_secondary() {
        let mut collator = RuleBasedCollator::root();
        let words = ["cote", "cot\u{00E9}", "c\u{00F4}te", "c\u{00F4}t\u{00E9}"];
        assert_eq!(
            sorted(&collator, &words),
            ["cote", "cot\u{00E9}", "c\u{00F4}te", "c\u{00F4}t\u{00E9}"]
        );
        collator.set_french_collation(true).unwrap();
        assert_eq!(
            sorted(&collator, &words),
            ["cote", "c\u{00F4}te", "cot\u{00E9}", "c\u{00F4}t\u{00E9}"]
        );
        assert_consistent(&collator, "cot\u{00E9}", "c\u{00F4}te");
    }

    #[test]
    fn reordering() {
        let mut collator = RuleBasedCollator::root();
        assert_eq!(collator.compare("\u{03B1}", "a"), Ordering::Greater);
        collator
            .set_reorder_codes(&[ReorderCode::Script(Script::Greek)])
            .unwrap();
        assert_eq!(collator.compare("\u{03B1}", "a"), Ordering::Less);
        assert_consistent(&collator, "\u{03B1}", "a");

        collator.set_reorder_codes(&[ReorderCode::None]).unwrap();
        assert!(collator.reorder_codes().is_empty());
        assert_eq!(collator.compare("\u{03B1}", "a"), Ordering::Greater);

        assert!(collator
            .set_reorder_codes(&[ReorderCode::Default, ReorderCode::Script(Script::Greek)])
            .is_err());
    }

    #[test]
    fn reorder_default_restores_rules() {
        let mut collator = RuleBasedCollator::new("[reorder Grek]").unwrap();
        assert_eq!(collator.compare("\u{03B1}", "a"), Ordering::Less);
        collator.set_reorder_codes(&[]).unwrap();
        assert_eq!(collator.compare("\u{03B1}", "a"), Ordering::Greater);
        collator.set_reorder_codes(&[ReorderCode::Default]).unwrap();
        assert_eq!(
            collator.reorder_codes(),
            [ReorderCode::Script(Script::Greek)]
        );
    }

    #[test]
    fn frozen_rejects_mutation() {
        let mut collator = RuleBasedCollator::root().frozen();
        assert!(collator.is_frozen());
        assert_eq!(
            collator.set_strength(Strength::Primary),
            Err(CollationError::FrozenMutation)
        );
        assert_eq!(
            collator.set_reorder_codes(&[ReorderCode::None]),
            Err(CollationError::FrozenMutation)
        );
        let mut thawed = collator.clone_as_thawed();
        assert!(thawed.set_strength(Strength::Primary).is_ok());
    }

    #[test]
    fn frozen_collators_are_shared() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let collator = Arc::new(RuleBasedCollator::new("&a < b").unwrap().frozen());
        assert_send_sync(&collator);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let collator = Arc::clone(&collator);
                std::thread::spawn(move || collator.compare("b", "c"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ordering::Less);
        }
    }

    #[test]
    fn binary_round_trip() {
        let mut collator = RuleBasedCollator::new("&a < ch").unwrap();
        collator.set_numeric_collation(true).unwrap();
        let bytes = collator.clone_binary().unwrap();
        let restored = RuleBasedCollator::from_binary(&bytes).unwrap();
        assert!(restored.is_numeric_collation());
        assert_eq!(restored.sort_key("ch2"), collator.sort_key("ch2"));
        assert!(RuleBasedCollator::from_binary(&bytes[..3]).is_err());
    }

    #[test]
    fn contractions() {
        let collator = RuleBasedCollator::new("&c < ch & l < ll").unwrap();
        assert_eq!(collator.contractions_starting_with('c'), ["ch"]);
        assert!(collator.contractions_starting_with('x').is_empty());
    }

    #[test]
    fn numeric_collation() {
        let mut collator = RuleBasedCollator::root();
        collator.set_numeric_collation(true).unwrap();
        assert_eq!(
            sorted(&collator, &["a10", "a9", "a100", "a2"]),
            ["a2", "a9", "a10", "a100"]
        );
        assert_consistent(&collator, "a9", "a10");
        assert!(collator.equals("a010", "a10"));
    }

    #[test]
    fn numeric_values_ignore_leading_zeros() {
        let mut collator = RuleBasedCollator::root();
        collator.set_numeric_collation(true).unwrap();
        collator.set_strength(Strength::Primary).unwrap();
        assert!(collator.equals("avery1", "avery01"));
        assert!(collator.equals("avery01", "avery001"));

        collator.set_strength(Strength::Tertiary).unwrap();
        assert_eq!(collator.compare("2004", "2005"), Ordering::Less);
        assert_eq!(collator.compare("110005", "110006"), Ordering::Less);
        assert_consistent(&collator, "110005", "110006");
    }

    #[test]
    fn variable_top_makes_currency_ignorable() {
        let mut collator = RuleBasedCollator::root();
        collator.set_alternate_handling_shifted(true).unwrap();
        collator.set_variable_top("$").unwrap();
        assert_eq!(collator.compare("", "$"), Ordering::Equal);
        assert_eq!(collator.compare("$", "0"), Ordering::Less);
        assert_consistent(&collator, "$", "0");
    }

    #[test]
    fn reordering_keeps_compressed_primaries() {
        let greek = "\u{03B1}\u{03B2}\u{03B3}";
        for strength in [Strength::Tertiary, Strength::Quaternary] {
            let mut root = RuleBasedCollator::root();
            root.set_strength(strength).unwrap();
            let mut greek_first = RuleBasedCollator::new("[reorder Grek]").unwrap();
            greek_first.set_strength(strength).unwrap();

            let before = root.sort_key(greek);
            let after = greek_first.sort_key(greek);
            assert_ne!(before.as_bytes()[0], after.as_bytes()[0]);
            assert_eq!(before.as_bytes()[1..], after.as_bytes()[1..]);
        }
    }

    #[test]
    fn rules_rebuild_the_same_tailoring() {
        let collator = RuleBasedCollator::new("&n < o & oe ,o\u{3080}").unwrap();
        let rebuilt = RuleBasedCollator::new(collator.rules()).unwrap();
        for s in ["n", "o", "oe", "o\u{3080}", "noe", "p"] {
            assert_eq!(rebuilt.collation_elements(s), collator.collation_elements(s), "{s:?}");
        }
    }

    #[test]
    fn identical_strength() {
        let mut collator = RuleBasedCollator::root();
        collator.set_strength(Strength::Identical).unwrap();
        assert_eq!(collator.compare("\u{1D4B6}", "\u{1D552}"), Ordering::Less);
        assert!(collator.equals("\u{00E4}", "a\u{0308}"));
        assert_consistent(&collator, "\u{00E4}", "a\u{0308}");
    }
}
