//! Sort keys and level-by-level comparison.
//!
//! A key is the concatenation of the active levels, separated by 01 and
//! terminated by 00. Level bytes never use 00 or 01, so comparing keys
//! bytewise is the same as comparing level by level.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ce::*;
use crate::error::{CollationError, Result};
use crate::iter::CeBuffer;
use crate::normalize;
use crate::reorder::ReorderTable;
use crate::root::ROOT;
use crate::{AlternateHandling, CaseFirst, CollationOptions, Strength};

const COMPRESSION_LOW: u8 = 0x03;
const COMPRESSION_HIGH: u8 = 0xFF;
const QUATERNARY_REGULAR: u8 = 0xFF;
const MERGE_SEPARATOR_PRIMARY: u32 = 0x0200_0000;
const TERMINATOR: u8 = 0;

/// Byte form of a string's collation order.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct SortKey(Vec<u8>);

impl SortKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Unsigned bytewise comparison, the same as `Ord`.
    pub fn compare_to(&self, other: &SortKey) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Level byte slices, without separators or terminator.
    fn levels(&self) -> Vec<&[u8]> {
        let body = self.0.strip_suffix(&[TERMINATOR]).unwrap_or(&self.0);
        if body.is_empty() {
            return Vec::new();
        }
        body.split(|&b| b == LEVEL_SEPARATOR).collect()
    }

    /// A key that sorts below (`Lower`) or above (`Upper`, `UpperLong`) every
    /// key sharing this key's first `levels` levels.
    pub fn bound(&self, mode: BoundMode, levels: usize) -> Result<SortKey> {
        let all = self.levels();
        if levels == 0 || levels > all.len() {
            return Err(CollationError::invalid(format!(
                "sort key has {} levels, {} requested",
                all.len(),
                levels
            )));
        }
        let mut out = Vec::new();
        for (i, level) in all[..levels].iter().enumerate() {
            if i > 0 {
                out.push(LEVEL_SEPARATOR);
            }
            out.extend_from_slice(level);
        }
        match mode {
            BoundMode::Lower => {}
            BoundMode::Upper => out.push(MERGE_SEPARATOR),
            BoundMode::UpperLong => out.extend_from_slice(&[0xFF, 0xFF]),
        }
        out.push(TERMINATOR);
        Ok(SortKey(out))
    }

    /// Joins keys level by level with the merge separator, so the result
    /// orders like the keys of the concatenated strings joined by U+FFFE.
    pub fn merge(keys: &[&SortKey]) -> SortKey {
        let split: Vec<Vec<&[u8]>> = keys.iter().map(|k| k.levels()).collect();
        let depth = split.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = Vec::new();
        for level in 0..depth {
            if level > 0 {
                out.push(LEVEL_SEPARATOR);
            }
            for (i, levels) in split.iter().enumerate() {
                if i > 0 {
                    out.push(MERGE_SEPARATOR);
                }
                if let Some(bytes) = levels.get(level) {
                    out.extend_from_slice(bytes);
                }
            }
        }
        out.push(TERMINATOR);
        SortKey(out)
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortKey[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, "]")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundMode {
    Lower,
    Upper,
    UpperLong,
}

//
// Levels
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyLevel {
    Primary,
    Secondary,
    Case,
    Tertiary,
    Quaternary,
    Identical,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Regular,
    Variable,
    /// A primary ignorable right after a shifted variable.
    Hidden,
}

/// Everything the key writer needs from a collator.
pub(crate) struct KeySettings<'a> {
    pub options: &'a CollationOptions,
    pub reorder: Option<&'a ReorderTable>,
    pub variable_top: u32,
}

impl KeySettings<'_> {
    fn shifted(&self) -> bool {
        self.options.alternate == AlternateHandling::Shifted
    }

    fn active_levels(&self) -> Vec<KeyLevel> {
        let strength = self.options.strength;
        let mut levels = vec![KeyLevel::Primary];
        if strength >= Strength::Secondary {
            levels.push(KeyLevel::Secondary);
        }
        if self.options.case_level {
            levels.push(KeyLevel::Case);
        }
        if strength >= Strength::Tertiary {
            levels.push(KeyLevel::Tertiary);
        }
        if strength >= Strength::Quaternary && self.shifted() {
            levels.push(KeyLevel::Quaternary);
        }
        if strength == Strength::Identical {
            levels.push(KeyLevel::Identical);
        }
        levels
    }

    fn reordered(&self, p: u32) -> u32 {
        match self.reorder {
            Some(table) => table.map_primary(p),
            None => p,
        }
    }

    fn kind_of(&self, p: u32, after_variable: &mut bool) -> Kind {
        if self.shifted() && p > MERGE_SEPARATOR_PRIMARY && p <= self.variable_top {
            *after_variable = true;
            Kind::Variable
        } else if *after_variable && p == 0 {
            Kind::Hidden
        } else {
            if p != 0 {
                *after_variable = false;
            }
            Kind::Regular
        }
    }

    fn classify(&self, ces: &[Ce]) -> Vec<Kind> {
        let mut after_variable = false;
        ces.iter()
            .map(|&ce| self.kind_of(primary(ce), &mut after_variable))
            .collect()
    }

    fn write_level(&self, level: KeyLevel, ces: &[Ce], kinds: &[Kind], nfd: &[char], out: &mut Vec<u8>) {
        let regular = || {
            ces.iter()
                .zip(kinds)
                .filter(|(_, k)| **k == Kind::Regular)
                .map(|(ce, _)| *ce)
        };
        match level {
            KeyLevel::Primary => {
                let mut compressing: Option<u32> = None;
                for ce in regular() {
                    let p = primary(ce);
                    if p == 0 {
                        continue;
                    }
                    let compressible = ROOT.is_compressible(lead_byte(p));
                    let p = self.reordered(p);
                    let lead = lead_byte(p);
                    let same_run = compressing.map_or(false, |prev| lead_byte(prev) == lead);
                    if !compressible || !same_run {
                        if let Some(prev) = compressing {
                            if p < prev {
                                if lead > MERGE_SEPARATOR {
                                    out.push(COMPRESSION_LOW);
                                }
                            } else {
                                out.push(COMPRESSION_HIGH);
                            }
                        }
                        out.push(lead);
                        compressing = compressible.then_some(p);
                    }
                    let bytes = p.to_be_bytes();
                    out.extend_from_slice(&bytes[1..weight_length(p)]);
                }
            }
            KeyLevel::Secondary => {
                let mut weights: Vec<u16> = regular().map(secondary).filter(|&s| s != 0).collect();
                if self.options.backwards_secondary {
                    weights.reverse();
                }
                for s in weights {
                    push_weight16(s, out);
                }
            }
            KeyLevel::Case => {
                let primary_only = self.options.strength == Strength::Primary;
                for ce in regular() {
                    let counted = if primary_only { primary(ce) != 0 } else { secondary(ce) != 0 };
                    if counted {
                        let case = case_value(ce);
                        let case = match self.options.case_first {
                            CaseFirst::UpperFirst => 2 - case,
                            _ => case,
                        };
                        out.push(2 + case);
                    }
                }
            }
            KeyLevel::Tertiary => {
                for ce in regular() {
                    let t = tertiary_weight(ce);
                    if t == 0 {
                        continue;
                    }
                    let mut high = (t >> 8) as u8;
                    if !self.options.case_level {
                        match self.options.case_first {
                            CaseFirst::Off => {}
                            CaseFirst::LowerFirst => high |= case_value(ce) << 6,
                            CaseFirst::UpperFirst => high |= (2 - case_value(ce)) << 6,
                        }
                    }
                    out.push(high);
                    if t & 0xFF != 0 {
                        out.push(t as u8);
                    }
                }
            }
            KeyLevel::Quaternary => {
                for (&ce, kind) in ces.iter().zip(kinds) {
                    match kind {
                        Kind::Variable => push_primary_bytes(primary(ce), out),
                        Kind::Regular if ce != 0 => out.push(QUATERNARY_REGULAR),
                        _ => {}
                    }
                }
            }
            KeyLevel::Identical => {
                for &c in nfd {
                    let cp = c as u32;
                    out.push((2 + cp / (254 * 254)) as u8);
                    out.push((2 + (cp / 254) % 254) as u8);
                    out.push((2 + cp % 254) as u8);
                }
            }
        }
    }

    pub fn sort_key(&self, ces: &[Ce], text: &str) -> SortKey {
        let kinds = self.classify(ces);
        let nfd = self.identical_text(text);
        let mut levels = Vec::new();
        for level in self.active_levels() {
            let mut bytes = Vec::new();
            self.write_level(level, ces, &kinds, &nfd, &mut bytes);
            levels.push(bytes);
        }
        while levels.last().map_or(false, Vec::is_empty) {
            levels.pop();
        }

        let mut key = Vec::new();
        for (i, level) in levels.iter().enumerate() {
            if i > 0 {
                key.push(LEVEL_SEPARATOR);
            }
            key.extend_from_slice(level);
        }
        key.push(TERMINATOR);
        SortKey(key)
    }

    /// Compares two strings' CE streams. Primaries are read lazily and the
    /// first difference returns; later levels use the buffered CEs.
    pub fn compare(&self, a: (&mut CeBuffer<'_>, &str), b: (&mut CeBuffer<'_>, &str)) -> Ordering {
        let (a_ces, a_text) = a;
        let (b_ces, b_text) = b;
        let mut a_cursor = PrimaryCursor::default();
        let mut b_cursor = PrimaryCursor::default();
        loop {
            match (a_cursor.next(self, a_ces), b_cursor.next(self, b_ces)) {
                (None, None) => break,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) if x != y => return x.cmp(&y),
                _ => {}
            }
        }

        a_ces.finish();
        b_ces.finish();
        let (a_ces, b_ces) = (a_ces.ces(), b_ces.ces());
        let a_kinds = self.classify(a_ces);
        let b_kinds = self.classify(b_ces);
        let a_nfd = self.identical_text(a_text);
        let b_nfd = self.identical_text(b_text);

        let mut a_bytes = Vec::new();
        let mut b_bytes = Vec::new();
        for level in self.active_levels().into_iter().skip(1) {
            a_bytes.clear();
            b_bytes.clear();
            self.write_level(level, a_ces, &a_kinds, &a_nfd, &mut a_bytes);
            self.write_level(level, b_ces, &b_kinds, &b_nfd, &mut b_bytes);
            match a_bytes.cmp(&b_bytes) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    fn identical_text(&self, text: &str) -> Vec<char> {
        if self.options.strength == Strength::Identical {
            normalize::nfd(text)
        } else {
            Vec::new()
        }
    }
}

/// Walks the primaries that reach the primary level.
#[derive(Default)]
struct PrimaryCursor {
    index: usize,
    after_variable: bool,
}

impl PrimaryCursor {
    fn next(&mut self, settings: &KeySettings<'_>, ces: &mut CeBuffer<'_>) -> Option<u32> {
        while let Some(ce) = ces.get(self.index) {
            self.index += 1;
            let p = primary(ce);
            let kind = settings.kind_of(p, &mut self.after_variable);
            if p != 0 && kind == Kind::Regular {
                return Some(settings.reordered(p));
            }
        }
        None
    }
}

fn push_weight16(w: u16, out: &mut Vec<u8>) {
    out.push((w >> 8) as u8);
    if w & 0xFF != 0 {
        out.push(w as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CollationData;
    use crate::iter::ChunkReader;

    fn settings(options: &CollationOptions) -> KeySettings<'_> {
        KeySettings {
            options,
            reorder: None,
            variable_top: ROOT
                .group_for_code(crate::reorder::ReorderCode::Punctuation)
                .map_or(0, |g| g.last_primary()),
        }
    }

    fn key(options: &CollationOptions, s: &str) -> SortKey {
        settings(options).sort_key(&ROOT.ces_for_str(s), s)
    }

    #[test]
    fn level_layout() {
        let options = CollationOptions::default();
        let k = key(&options, "a");
        let bytes = k.as_bytes();
        assert_eq!(bytes.iter().filter(|&&b| b == LEVEL_SEPARATOR).count(), 2);
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(key(&options, "").as_bytes(), [0]);
    }

    #[test]
    fn primary_compression_keeps_order() {
        let options = CollationOptions::default();
        let words = ["a", "ab", "abc", "b", "ba", "z", "zz", "α", "αa"];
        for pair in words.windows(2) {
            assert!(key(&options, pair[0]) < key(&options, pair[1]), "{:?}", pair);
        }
        // One lead byte per run of same-script letters
        let abc = key(&options, "abc");
        let a = key(&options, "a");
        assert_eq!(abc.as_bytes()[0], a.as_bytes()[0]);
        assert_ne!(abc.as_bytes()[2], a.as_bytes()[0]);
    }

    #[test]
    fn keys_agree_with_compare() {
        let options = CollationOptions {
            alternate: AlternateHandling::Shifted,
            strength: Strength::Quaternary,
            ..Default::default()
        };
        let s = settings(&options);
        let data = CollationData::default();
        let words = ["", "-", "a", "A", "a-b", "ab", "á", "Ab", "a b"];
        for x in words {
            for y in words {
                let (tx, ty): (Vec<char>, Vec<char>) = (x.chars().collect(), y.chars().collect());
                let mut bx = CeBuffer::new(ChunkReader::new(&data, &tx, false, true));
                let mut by = CeBuffer::new(ChunkReader::new(&data, &ty, false, true));
                let (cx, cy) = (ROOT.ces_for_str(x), ROOT.ces_for_str(y));
                assert_eq!(
                    s.compare((&mut bx, x), (&mut by, y)),
                    s.sort_key(&cx, x).cmp(&s.sort_key(&cy, y)),
                    "{:?} vs {:?}",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn bounds_bracket_longer_keys() {
        let options = CollationOptions::default();
        let smith = key(&options, "Smith");
        let smithy = key(&options, "Smithy");
        let lower = smith.bound(BoundMode::Lower, 1).unwrap();
        let upper = smith.bound(BoundMode::UpperLong, 1).unwrap();
        assert!(lower <= smith);
        assert!(smithy < upper);
        assert!(key(&options, "Smiti") > upper);
        assert!(smith.bound(BoundMode::Upper, 9).is_err());
    }

    #[test]
    fn merged_keys_order_like_joined_strings() {
        let options = CollationOptions::default();
        let ab = SortKey::merge(&[&key(&options, "a"), &key(&options, "b")]);
        let b = SortKey::merge(&[&key(&options, "b"), &key(&options, "a")]);
        assert!(ab < b);
        assert_eq!(ab.levels().len(), 3);
    }
}
