//! Script reordering: a permutation of primary lead bytes.

use serde::{Deserialize, Serialize};

use crate::error::{CollationError, Result};
use crate::props::Script;
use crate::root::{ReorderGroup, ROOT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ReorderCode {
    /// The tailoring's own reordering.
    Default,
    /// No reordering at all.
    None,
    /// Every script not named elsewhere in the list.
    Others,
    Space,
    Punctuation,
    Symbol,
    Currency,
    Digit,
    Script(Script),
}

impl ReorderCode {
    pub const SPECIAL_GROUPS: [ReorderCode; 5] = [
        ReorderCode::Space,
        ReorderCode::Punctuation,
        ReorderCode::Symbol,
        ReorderCode::Currency,
        ReorderCode::Digit,
    ];

    /// Parses a reorder code as written in rules and locale keywords.
    pub fn parse(name: &str) -> Option<ReorderCode> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(ReorderCode::Default),
            "none" => Some(ReorderCode::None),
            "others" | "zzzz" => Some(ReorderCode::Others),
            "space" => Some(ReorderCode::Space),
            "punct" => Some(ReorderCode::Punctuation),
            "symbol" => Some(ReorderCode::Symbol),
            "currency" => Some(ReorderCode::Currency),
            "digit" => Some(ReorderCode::Digit),
            _ => Script::from_code(name).map(ReorderCode::Script),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReorderCode::Default => "default",
            ReorderCode::None => "none",
            ReorderCode::Others => "Zzzz",
            ReorderCode::Space => "space",
            ReorderCode::Punctuation => "punct",
            ReorderCode::Symbol => "symbol",
            ReorderCode::Currency => "currency",
            ReorderCode::Digit => "digit",
            ReorderCode::Script(script) => script.code(),
        }
    }

    pub fn is_special_group(self) -> bool {
        Self::SPECIAL_GROUPS.contains(&self)
    }

    fn normalized(self) -> ReorderCode {
        match self {
            ReorderCode::Script(Script::Unknown) => ReorderCode::Others,
            other => other,
        }
    }
}

/// All codes that share a reordering group with `code`, including `code`.
pub fn equivalent_reorder_codes(code: ReorderCode) -> Vec<ReorderCode> {
    match ROOT.group_for_code(code.normalized()) {
        Some(group) => group.codes.clone(),
        None => vec![code],
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReorderTable {
    codes: Vec<ReorderCode>,
    leads: Vec<u8>,
}

impl ReorderTable {
    /// Builds the lead-byte permutation for an explicit list of codes.
    /// `Default` and `None` must have been resolved by the caller.
    pub fn new(codes: &[ReorderCode]) -> Result<ReorderTable> {
        let groups = ROOT.groups();
        let mut seen: Vec<usize> = Vec::new();
        let mut listed_specials: Vec<usize> = Vec::new();
        let mut listed_scripts: Vec<Option<usize>> = Vec::new();

        for &code in codes {
            let code = code.normalized();
            match code {
                ReorderCode::Default | ReorderCode::None => {
                    return Err(CollationError::invalid(format!(
                        "reorder code {} must be used alone",
                        code.name()
                    )));
                }
                ReorderCode::Script(Script::Common | Script::Inherited) => {
                    return Err(CollationError::invalid(format!(
                        "{} cannot be reordered",
                        code.name()
                    )));
                }
                _ => {}
            }
            let Some(index) = groups.iter().position(|g| g.codes.contains(&code)) else {
                // A script with no root characters has nothing to move
                continue;
            };
            if seen.contains(&index) {
                return Err(CollationError::invalid(format!(
                    "duplicate reorder group for {}",
                    code.name()
                )));
            }
            seen.push(index);
            if code.is_special_group() {
                listed_specials.push(index);
            } else if code == ReorderCode::Others {
                // Unlisted scripts go where Others is
                listed_scripts.push(None);
            } else {
                listed_scripts.push(Some(index));
            }
        }

        let is_special = |g: &ReorderGroup| g.codes.iter().any(|c| c.is_special_group());
        let mut order: Vec<usize> = listed_specials.clone();
        order.extend(
            (0..groups.len()).filter(|i| is_special(&groups[*i]) && !listed_specials.contains(i)),
        );

        let listed: Vec<usize> = listed_scripts.iter().flatten().copied().collect();
        let rest: Vec<usize> = (0..groups.len())
            .filter(|i| !is_special(&groups[*i]) && !listed.contains(i))
            .collect();
        let mut rest_placed = false;
        for slot in &listed_scripts {
            match slot {
                Some(index) => order.push(*index),
                None => {
                    order.extend(&rest);
                    rest_placed = true;
                }
            }
        }
        if !rest_placed {
            order.extend(&rest);
        }

        let mut leads: Vec<u8> = (0..=255).collect();
        let mut next = groups.first().map_or(0, |g| g.first_lead);
        for index in order {
            let g = &groups[index];
            for lead in g.first_lead..=g.last_lead {
                leads[usize::from(lead)] = next;
                next = next.wrapping_add(1);
            }
        }

        Ok(ReorderTable {
            codes: codes.to_vec(),
            leads,
        })
    }

    pub fn codes(&self) -> &[ReorderCode] {
        &self.codes
    }

    pub fn is_identity(&self) -> bool {
        self.leads.iter().enumerate().all(|(i, &lead)| usize::from(lead) == i)
    }

    #[inline]
    pub fn map_primary(&self, p: u32) -> u32 {
        if p == 0 {
            return 0;
        }
        let lead = self.leads[(p >> 24) as usize];
        (u32::from(lead) << 24) | (p & 0x00FF_FFFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ce::{lead_byte, primary};

    fn lead_of(c: char) -> u8 {
        lead_byte(primary(ROOT.ces_for_str(&c.to_string())[0]))
    }

    #[test]
    fn greek_moves_before_latin() {
        let table = ReorderTable::new(&[ReorderCode::Script(Script::Greek)]).unwrap();
        let alpha = primary(ROOT.lookup(&['α']).unwrap()[0]);
        let a = primary(ROOT.lookup(&['a']).unwrap()[0]);
        assert!(table.map_primary(alpha) < table.map_primary(a));
        // Trailing bytes never change
        assert_eq!(table.map_primary(alpha) & 0xFF_FFFF, alpha & 0xFF_FFFF);
        // Special groups stay in front
        assert_eq!(table.map_primary(0x0410_0000), 0x0410_0000);
    }

    #[test]
    fn listed_special_groups_come_first() {
        let table = ReorderTable::new(&[ReorderCode::Digit, ReorderCode::Space]).unwrap();
        let digit = table.map_primary(u32::from(lead_of('1')) << 24);
        let space = table.map_primary(u32::from(lead_of(' ')) << 24);
        let punct = table.map_primary(u32::from(lead_of('-')) << 24);
        assert!(digit < space && space < punct);
        assert!(punct < table.map_primary(u32::from(lead_of('a')) << 24));
    }

    #[test]
    fn others_marks_the_position_of_unlisted_scripts() {
        let table = ReorderTable::new(&[
            ReorderCode::Script(Script::Cyrillic),
            ReorderCode::Others,
            ReorderCode::Script(Script::Latin),
        ])
        .unwrap();
        let lead = |c: char| table.map_primary(u32::from(lead_of(c)) << 24);
        assert!(lead('а') < lead('α'));
        assert!(lead('α') < lead('a'));
        assert!(lead('一') < lead('a'));
    }

    #[test]
    fn invalid_lists() {
        assert!(ReorderTable::new(&[ReorderCode::Default, ReorderCode::Script(Script::Latin)]).is_err());
        assert!(ReorderTable::new(&[
            ReorderCode::Script(Script::Hiragana),
            ReorderCode::Script(Script::Katakana)
        ])
        .is_err());
        assert!(ReorderTable::new(&[ReorderCode::Script(Script::Common)]).is_err());
        assert!(ReorderTable::new(&[ReorderCode::Script(Script::Bopomofo)])
            .unwrap()
            .is_identity());
    }

    #[test]
    fn equivalent_codes() {
        assert_eq!(
            equivalent_reorder_codes(ReorderCode::Script(Script::Katakana)),
            [
                ReorderCode::Script(Script::Hiragana),
                ReorderCode::Script(Script::Katakana),
                ReorderCode::Script(Script::KatakanaOrHiragana),
            ]
        );
        assert_eq!(
            equivalent_reorder_codes(ReorderCode::Script(Script::MeroiticCursive)).len(),
            2
        );
        assert_eq!(
            equivalent_reorder_codes(ReorderCode::Punctuation),
            [ReorderCode::Punctuation]
        );
    }

    #[test]
    fn parses_rule_names() {
        assert_eq!(ReorderCode::parse("punct"), Some(ReorderCode::Punctuation));
        assert_eq!(ReorderCode::parse("Zzzz"), Some(ReorderCode::Others));
        assert_eq!(ReorderCode::parse("grek"), Some(ReorderCode::Script(Script::Greek)));
        assert_eq!(ReorderCode::parse("Klingon"), None);
    }
}
