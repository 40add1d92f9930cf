use std::cmp::Ordering;

use proptest::prelude::*;
use unicol::ce::Ce;
use unicol::{collate, CollationOptions, Collator, CollatorRegistry, RuleBasedCollator};

const ALPHABET: [char; 24] = [
    'a', 'A', 'b', 'c', 'h', 'C', 'H', 'z', '\u{E4}', '\u{C5}', '\u{308}', '\u{301}', '\u{323}',
    '-', ' ', '0', '7', '\u{3B1}', '\u{430}', '\u{304B}', '\u{30AB}', '\u{AC00}', '\u{4E00}',
    '\u{FFFD}',
];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 0..8)
        .prop_map(|chars| chars.into_iter().collect())
}

fn collators() -> Vec<RuleBasedCollator> {
    let registry = CollatorRegistry::default();
    ["root", "cs", "sv-u-ka-shifted-ks-level4", "fr_CA", "ja", "de-u-kn-kf-upper"]
        .iter()
        .map(|locale| registry.collator_for(locale).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn prop_compare_is_antisymmetric(a in text(), b in text()) {
        for collator in collators() {
            prop_assert_eq!(collator.compare(&a, &b), collator.compare(&b, &a).reverse());
        }
    }

    #[test]
    fn prop_sort_keys_agree_with_compare(a in text(), b in text()) {
        for collator in collators() {
            let by_key = collator.sort_key(&a).as_bytes().cmp(collator.sort_key(&b).as_bytes());
            prop_assert_eq!(by_key, collator.compare(&a, &b), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn prop_compare_is_transitive(a in text(), b in text(), c in text()) {
        let collator = RuleBasedCollator::root();
        let mut words = [a, b, c];
        words.sort_by(|x, y| collator.compare(x, y));
        prop_assert_ne!(collator.compare(&words[0], &words[2]), Ordering::Greater);
    }

    #[test]
    fn prop_iterator_runs_backwards(s in text()) {
        let collator = RuleBasedCollator::root();
        let mut it = collator.collation_element_iterator(&s);
        let forward: Vec<Ce> = it.by_ref().collect();
        let mut backward = Vec::new();
        while let Some(ce) = it.previous() {
            backward.push(ce);
        }
        backward.reverse();
        prop_assert_eq!(backward, forward);
    }

    #[test]
    fn prop_offsets_snap_to_boundaries(s in text(), offset in 0usize..10) {
        // Czech "ch" is a contraction, so offsets can fall inside one
        let czech = CollatorRegistry::default().collator_for("cs").unwrap();
        for collator in [RuleBasedCollator::root(), czech] {
            let forward: Vec<Ce> = collator.collation_element_iterator(&s).collect();
            let mut it = collator.collation_element_iterator(&s);
            it.set_offset(offset);
            prop_assert!(it.offset() <= offset);
            let rest: Vec<Ce> = it.collect();
            prop_assert!(forward.ends_with(&rest), "{:?} at {}", s, offset);
        }
    }

    #[test]
    fn prop_collate_ties_only_on_canonical_equivalence(a in text(), b in text()) {
        let options = CollationOptions::default();
        if collate(&a, &b, &options) == Ordering::Equal {
            prop_assert_eq!(
                unicol::normalize::nfd(&a),
                unicol::normalize::nfd(&b)
            );
        }
    }
}
