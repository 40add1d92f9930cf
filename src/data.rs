//! Tailored mappings layered over the root table.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ce::Ce;
use crate::normalize;
use crate::root::ROOT;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct Mapping {
    /// CEs without a prefix condition. `None` falls through to the root.
    pub ces: Option<Vec<Ce>>,
    /// Prefix-conditioned CEs, longest prefix first.
    pub prefixed: Vec<(Vec<char>, Vec<Ce>)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct CollationData {
    mappings: HashMap<Vec<char>, Mapping>,
    prefixes: HashSet<Vec<char>>,
    continuations: HashSet<char>,
    suppressed: HashSet<char>,
    max_prefix_len: usize,
    tailored: BTreeSet<String>,
}

impl CollationData {
    //
    // Building
    //

    pub fn set_mapping(&mut self, prefix: &[char], key: &[char], ces: Vec<Ce>) {
        for len in 1..key.len() {
            self.prefixes.insert(key[..len].to_vec());
        }
        self.continuations.extend(key.iter().skip(1).copied());

        let mut tailored: String = prefix.iter().collect();
        if !prefix.is_empty() {
            tailored.push('|');
        }
        tailored.extend(key.iter());
        self.tailored.insert(tailored);

        let mapping = self.mappings.entry(key.to_vec()).or_default();
        if prefix.is_empty() {
            mapping.ces = Some(ces);
        } else {
            self.max_prefix_len = self.max_prefix_len.max(prefix.len());
            match mapping.prefixed.iter_mut().find(|(p, _)| p == prefix) {
                Some(entry) => entry.1 = ces,
                None => {
                    mapping.prefixed.push((prefix.to_vec(), ces));
                    mapping.prefixed.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
                }
            }
        }
    }

    pub fn suppress_contractions(&mut self, chars: &[char]) {
        self.suppressed.extend(chars.iter().copied());
    }

    /// Rewrites every CE in place.
    pub fn map_ces(&mut self, mut f: impl FnMut(Ce) -> Ce) {
        for mapping in self.mappings.values_mut() {
            if let Some(ces) = &mut mapping.ces {
                ces.iter_mut().for_each(|ce| *ce = f(*ce));
            }
            for (_, ces) in &mut mapping.prefixed {
                ces.iter_mut().for_each(|ce| *ce = f(*ce));
            }
        }
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    //
    // Lookup
    //

    /// CEs for `key`, honouring prefix conditions against `before`.
    pub fn lookup(&self, key: &[char], before: &[char]) -> Option<&[Ce]> {
        if let Some(mapping) = self.mappings.get(key) {
            for (prefix, ces) in &mapping.prefixed {
                if before.ends_with(prefix) {
                    return Some(ces);
                }
            }
            if let Some(ces) = &mapping.ces {
                return Some(ces);
            }
        }
        if key.len() > 1 && self.suppressed.contains(&key[0]) {
            return None;
        }
        ROOT.lookup(key)
    }

    pub fn is_contraction_prefix(&self, key: &[char]) -> bool {
        self.prefixes.contains(key)
            || (!self.suppressed.contains(&key[0]) && ROOT.is_contraction_prefix(key))
    }

    pub fn has_direct_mapping(&self, c: char) -> bool {
        self.mappings.contains_key(&[c][..]) || ROOT.lookup(&[c]).is_some()
    }

    pub fn has_prefix_mappings(&self) -> bool {
        self.max_prefix_len > 0
    }

    pub fn max_prefix_len(&self) -> usize {
        self.max_prefix_len
    }

    /// Digit value for numeric collation, unless the tailoring remaps the digit.
    pub fn numeric_digit(&self, c: char) -> Option<u8> {
        if self.mappings.contains_key(&[c][..]) {
            return None;
        }
        ROOT.digit_value(c)
    }

    /// True if text can never start a chunk at `c` that an earlier chunk
    /// might have consumed.
    pub fn is_unsafe_backward(&self, c: char, numeric: bool) -> bool {
        if normalize::lead_ccc(c) != 0 {
            return true;
        }
        if numeric && self.numeric_digit(c).is_some() {
            return true;
        }
        normalize::decompose_canonical(c)
            .iter()
            .any(|&u| self.continuations.contains(&u) || ROOT.is_continuation(u))
    }

    pub fn tailored_set(&self) -> &BTreeSet<String> {
        &self.tailored
    }

    pub fn contractions_starting_with(&self, c: char) -> Vec<Vec<char>> {
        let mut out: Vec<Vec<char>> = self
            .mappings
            .keys()
            .filter(|key| key.len() > 1 && key[0] == c)
            .cloned()
            .collect();
        if !self.suppressed.contains(&c) {
            for key in ROOT.contractions_starting_with(c) {
                if !out.contains(&key) {
                    out.push(key);
                }
            }
        }
        out.sort();
        out
    }

    /// Length of the longest expansion that ends with `ce`, at least 1.
    pub fn max_expansion(&self, ce: Ce) -> usize {
        let tailored = self.mappings.values().flat_map(|m| {
            m.ces
                .iter()
                .map(Vec::as_slice)
                .chain(m.prefixed.iter().map(|(_, ces)| ces.as_slice()))
        });
        tailored
            .chain(ROOT.expansions())
            .filter(|ces| ces.last() == Some(&ce))
            .map(<[Ce]>::len)
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ce::make_ce;

    #[test]
    fn tailoring_overrides_root() {
        let mut data = CollationData::default();
        let ce = make_ce(0x1011_0000, 0x0500, 0x0500);
        data.set_mapping(&[], &['c', 'h'], vec![ce]);
        assert_eq!(data.lookup(&['c', 'h'], &[]), Some(&[ce][..]));
        assert!(data.is_contraction_prefix(&['c']));
        assert!(data.lookup(&['c'], &[]).is_some());
        assert!(data.is_unsafe_backward('h', false));
        assert!(!data.is_unsafe_backward('b', false));
        assert!(data.tailored_set().contains("ch"));
    }

    #[test]
    fn prefix_conditions() {
        let mut data = CollationData::default();
        let ce = make_ce(0x1011_0000, 0x0500, 0x0500);
        data.set_mapping(&['x'], &['y'], vec![ce]);
        assert_eq!(data.lookup(&['y'], &['a', 'x']), Some(&[ce][..]));
        assert_ne!(data.lookup(&['y'], &['a']), Some(&[ce][..]));
        assert!(data.tailored_set().contains("x|y"));
    }

    #[test]
    fn suppressed_root_contractions() {
        let mut data = CollationData::default();
        let key = [crate::root::SCRIPT_BOUNDARY_CHAR, 'a'];
        assert!(data.lookup(&key, &[]).is_some());
        data.suppress_contractions(&[crate::root::SCRIPT_BOUNDARY_CHAR]);
        assert!(data.lookup(&key, &[]).is_none());
        assert!(!data.is_contraction_prefix(&key[..1]));
    }
}
