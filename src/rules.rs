//! Tailoring rule syntax.
//!
//! `parse_rules` turns rule text into a flat list of [`RuleItem`]s. Settings
//! are kept in order alongside resets and relations, and `[import]` splices
//! the imported rules in place.

use crate::error::{CollationError, Result};
use crate::normalize;
use crate::reorder::ReorderCode;
use crate::root::SpecialPosition;
use crate::{CaseFirst, MaxVariable, Strength};

const MAX_IMPORT_DEPTH: usize = 8;

/// Relation strength. Ordered from strongest to weakest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Primary,
    Secondary,
    Tertiary,
    Identical,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    Text(Vec<char>),
    Special(SpecialPosition),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSetting {
    Strength(Strength),
    Shifted(bool),
    BackwardsSecondary,
    CaseLevel(bool),
    CaseFirst(CaseFirst),
    Normalization(bool),
    Numeric(bool),
    MaxVariable(MaxVariable),
    Reorder(Vec<ReorderCode>),
    SuppressContractions(Vec<char>),
    Optimize(Vec<char>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleItem {
    Reset {
        anchor: Anchor,
        before: Option<Level>,
        offset: usize,
    },
    Relation {
        level: Level,
        prefix: Vec<char>,
        string: Vec<char>,
        extension: Vec<char>,
        offset: usize,
    },
    Setting {
        setting: RuleSetting,
        offset: usize,
    },
}

/// Supplies the rule text for `[import ...]`.
pub trait Importer {
    fn import_rules(&self, locale: &str, collation_type: &str) -> Option<String>;
}

/// An importer that knows no locales.
pub struct NoImports;

impl Importer for NoImports {
    fn import_rules(&self, _locale: &str, _collation_type: &str) -> Option<String> {
        None
    }
}

pub fn parse_rules(text: &str, importer: &dyn Importer) -> Result<Vec<RuleItem>> {
    let rules: Vec<char> = text.chars().collect();
    let mut parser = RuleParser {
        rules: &rules,
        index: 0,
        importer,
        depth: 0,
        items: Vec::new(),
    };
    parser
        .parse()
        .map_err(|error| error.with_context(&rules))?;
    Ok(parser.items)
}

//
// Character classes
//

pub(crate) fn is_syntax_char(c: char) -> bool {
    matches!(c, '!'..='/' | ':'..='@' | '['..='`' | '{'..='~')
}

pub(crate) fn is_white_space(c: char) -> bool {
    matches!(
        c,
        '\t'..='\r' | ' ' | '\u{85}' | '\u{200E}' | '\u{200F}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_nfd_inert(c: char) -> bool {
    !normalize::has_canonical_decomposition(c) && normalize::combining_class(c) == 0
}

struct RuleParser<'a> {
    rules: &'a [char],
    index: usize,
    importer: &'a dyn Importer,
    depth: usize,
    items: Vec<RuleItem>,
}

impl RuleParser<'_> {
    fn error<T>(&self, offset: usize, reason: &str) -> Result<T> {
        Err(CollationError::syntax(offset, reason))
    }

    fn at(&self, i: usize) -> Option<char> {
        self.rules.get(i).copied()
    }

    fn skip_white_space(&self, mut i: usize) -> usize {
        while self.at(i).map_or(false, is_white_space) {
            i += 1;
        }
        i
    }

    fn skip_comment(&self, mut i: usize) -> usize {
        while let Some(c) = self.at(i) {
            i += 1;
            if matches!(c, '\n' | '\u{C}' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}') {
                break;
            }
        }
        i
    }

    fn parse(&mut self) -> Result<()> {
        while self.index < self.rules.len() {
            let c = self.rules[self.index];
            if is_white_space(c) {
                self.index += 1;
                continue;
            }
            match c {
                '&' => self.parse_rule_chain()?,
                '[' => self.parse_setting()?,
                '#' => self.index = self.skip_comment(self.index),
                '@' => {
                    self.push_setting(RuleSetting::BackwardsSecondary, self.index);
                    self.index += 1;
                }
                // Thai/Lao reordering: a no-op with modern data
                '!' => self.index += 1,
                _ => return self.error(self.index, "expected a reset or setting or comment"),
            }
        }
        Ok(())
    }

    fn push_setting(&mut self, setting: RuleSetting, offset: usize) {
        self.items.push(RuleItem::Setting { setting, offset });
    }

    //
    // Resets and relations
    //

    fn parse_rule_chain(&mut self) -> Result<()> {
        let reset_level = self.parse_reset_and_position()?;
        let mut first_relation = true;
        loop {
            let Some((level, starred, offset)) = self.parse_relation_operator()? else {
                if self.at(self.index) == Some('#') {
                    self.index = self.skip_comment(self.index);
                    continue;
                }
                if first_relation {
                    return self.error(self.index, "reset not followed by a relation");
                }
                return Ok(());
            };
            if let Some(before) = reset_level {
                if first_relation && level != before {
                    return self.error(
                        offset,
                        "reset-before strength differs from its first relation",
                    );
                }
                if !first_relation && level < before {
                    return self.error(
                        offset,
                        "reset-before strength followed by a stronger relation",
                    );
                }
            }
            if starred {
                self.parse_starred_characters(level, offset)?;
            } else {
                self.parse_relation_strings(level, offset)?;
            }
            first_relation = false;
        }
    }

    fn parse_reset_and_position(&mut self) -> Result<Option<Level>> {
        let offset = self.index;
        let mut i = self.skip_white_space(self.index + 1);
        let mut before = None;
        if self.starts_with(i, "[before") {
            let j = self.skip_white_space(i + 7);
            if let (Some(digit), Some(']')) = (self.at(j), self.at(j + 1)) {
                before = match digit {
                    '1' => Some(Level::Primary),
                    '2' => Some(Level::Secondary),
                    '3' => Some(Level::Tertiary),
                    _ => None,
                };
                if before.is_some() {
                    i = self.skip_white_space(j + 2);
                }
            }
            if before.is_none() {
                return self.error(j, "expected [before 1], [before 2] or [before 3]");
            }
        }
        if i >= self.rules.len() {
            return self.error(i, "reset without position");
        }
        let anchor = if self.rules[i] == '[' {
            let (position, end) = self.parse_special_position(i)?;
            i = self.skip_white_space(end);
            Anchor::Special(position)
        } else {
            let (text, end) = self.parse_tailoring_string(i)?;
            i = end;
            Anchor::Text(text)
        };
        self.items.push(RuleItem::Reset {
            anchor,
            before,
            offset,
        });
        self.index = i;
        Ok(before)
    }

    fn starts_with(&self, i: usize, s: &str) -> bool {
        let mut j = i;
        for c in s.chars() {
            if self.at(j) != Some(c) {
                return false;
            }
            j += 1;
        }
        true
    }

    /// Returns the level, whether the operator is starred, and its offset.
    fn parse_relation_operator(&mut self) -> Result<Option<(Level, bool, usize)>> {
        let start = self.skip_white_space(self.index);
        let Some(c) = self.at(start) else {
            return Ok(None);
        };
        let mut i = start + 1;
        let level = match c {
            '<' => {
                let mut count = 1;
                while count < 4 && self.at(i) == Some('<') {
                    count += 1;
                    i += 1;
                }
                match count {
                    1 => Level::Primary,
                    2 => Level::Secondary,
                    3 => Level::Tertiary,
                    _ => return self.error(start, "quaternary relations are not supported"),
                }
            }
            ';' => Level::Secondary,
            ',' => Level::Tertiary,
            '=' => Level::Identical,
            _ => return Ok(None),
        };
        let mut starred = false;
        if matches!(c, '<' | '=') && self.at(i) == Some('*') {
            starred = true;
            i += 1;
        }
        self.index = i;
        Ok(Some((level, starred, start)))
    }

    fn parse_relation_strings(&mut self, level: Level, offset: usize) -> Result<()> {
        let (mut string, mut i) = self.parse_tailoring_string(self.index)?;
        let mut prefix = Vec::new();
        let mut extension = Vec::new();
        if self.at(i) == Some('|') {
            prefix = string;
            let (s, end) = self.parse_tailoring_string(i + 1)?;
            string = s;
            i = end;
        }
        if self.at(i) == Some('/') {
            let (s, end) = self.parse_tailoring_string(i + 1)?;
            extension = s;
            i = end;
        }
        if !prefix.is_empty() {
            let starts_segment = |s: &[char]| s.first().map_or(true, |&c| normalize::lead_ccc(c) == 0);
            if !starts_segment(&prefix) || !starts_segment(&string) {
                return self.error(
                    offset,
                    "in 'prefix|str', prefix and str must each start with a starter",
                );
            }
        }
        self.items.push(RuleItem::Relation {
            level,
            prefix,
            string,
            extension,
            offset,
        });
        self.index = i;
        Ok(())
    }

    fn parse_starred_characters(&mut self, level: Level, offset: usize) -> Result<()> {
        let (mut raw, mut i) = self.parse_string(self.skip_white_space(self.index))?;
        if raw.is_empty() {
            return self.error(i, "missing starred-relation string");
        }
        let mut prev: Option<char> = None;
        let mut j = 0;
        loop {
            while j < raw.len() {
                let c = raw[j];
                if !is_nfd_inert(c) {
                    return self.error(i, "starred-relation string is not all NFD-inert");
                }
                self.push_single(level, c, offset);
                prev = Some(c);
                j += 1;
            }
            if self.at(i) != Some('-') {
                break;
            }
            let Some(start) = prev else {
                return self.error(i, "range without start in starred-relation string");
            };
            let (next, end) = self.parse_string(i + 1)?;
            i = end;
            let Some(&last) = next.first() else {
                return self.error(i, "range without end in starred-relation string");
            };
            if last < start {
                return self.error(i, "range start greater than end in starred-relation string");
            }
            for cp in start as u32 + 1..=last as u32 {
                let Some(c) = char::from_u32(cp) else {
                    return self.error(i, "starred-relation string contains a surrogate");
                };
                if !is_nfd_inert(c) {
                    return self.error(i, "starred-relation string range is not all NFD-inert");
                }
                if ('\u{FFFD}'..='\u{FFFF}').contains(&c) {
                    return self.error(i, "starred-relation string contains U+FFFD, U+FFFE or U+FFFF");
                }
                self.push_single(level, c, offset);
            }
            prev = None;
            raw = next;
            j = 1;
        }
        self.index = self.skip_white_space(i);
        Ok(())
    }

    fn push_single(&mut self, level: Level, c: char, offset: usize) {
        self.items.push(RuleItem::Relation {
            level,
            prefix: Vec::new(),
            string: vec![c],
            extension: Vec::new(),
            offset,
        });
    }

    //
    // Strings
    //

    fn parse_tailoring_string(&self, i: usize) -> Result<(Vec<char>, usize)> {
        let (raw, end) = self.parse_string(self.skip_white_space(i))?;
        if raw.is_empty() {
            return self.error(end, "missing relation string");
        }
        Ok((raw, self.skip_white_space(end)))
    }

    fn parse_string(&self, mut i: usize) -> Result<(Vec<char>, usize)> {
        let mut raw = Vec::new();
        while let Some(c) = self.at(i) {
            i += 1;
            if is_syntax_char(c) {
                if c == '\'' {
                    if self.at(i) == Some('\'') {
                        raw.push('\'');
                        i += 1;
                        continue;
                    }
                    // Quoted literal text up to the next lone apostrophe
                    loop {
                        let Some(q) = self.at(i) else {
                            return self.error(
                                i,
                                "quoted literal text missing terminating apostrophe",
                            );
                        };
                        i += 1;
                        if q == '\'' {
                            if self.at(i) == Some('\'') {
                                i += 1;
                            } else {
                                break;
                            }
                        }
                        raw.push(q);
                    }
                } else if c == '\\' {
                    if i >= self.rules.len() {
                        return self.error(i, "backslash escape at the end of the rule string");
                    }
                    let (escaped, end) = self.unescape(i)?;
                    raw.push(escaped);
                    i = end;
                } else {
                    i -= 1;
                    break;
                }
            } else if is_white_space(c) {
                i -= 1;
                break;
            } else {
                raw.push(c);
            }
        }
        if raw.iter().any(|c| ('\u{FFFD}'..='\u{FFFF}').contains(c)) {
            return self.error(i, "string contains U+FFFD, U+FFFE or U+FFFF");
        }
        Ok((raw, i))
    }

    fn hex_digits(&self, start: usize, min: usize, max: usize) -> Option<(u32, usize)> {
        let mut value = 0_u32;
        let mut i = start;
        while i - start < max {
            let Some(d) = self.at(i).and_then(|c| c.to_digit(16)) else {
                break;
            };
            value = value.checked_mul(16)?.checked_add(d)?;
            i += 1;
        }
        (i - start >= min).then_some((value, i))
    }

    /// Decodes the escape whose letter is at `i` (just after the backslash).
    fn unescape(&self, i: usize) -> Result<(char, usize)> {
        let c = self.rules[i];
        let decoded = match c {
            'u' => self.hex_digits(i + 1, 4, 4),
            'U' => self.hex_digits(i + 1, 8, 8),
            'x' if self.at(i + 1) == Some('{') => self
                .hex_digits(i + 2, 1, 8)
                .filter(|&(_, end)| self.at(end) == Some('}'))
                .map(|(v, end)| (v, end + 1)),
            'x' => self.hex_digits(i + 1, 1, 2),
            'c' => self.at(i + 1).map(|ctl| (ctl as u32 & 0x1F, i + 2)),
            'a' => Some((0x07, i + 1)),
            'b' => Some((0x08, i + 1)),
            'e' => Some((0x1B, i + 1)),
            'f' => Some((0x0C, i + 1)),
            'n' => Some((0x0A, i + 1)),
            'r' => Some((0x0D, i + 1)),
            't' => Some((0x09, i + 1)),
            'v' => Some((0x0B, i + 1)),
            other => return Ok((other, i + 1)),
        };
        match decoded.and_then(|(v, end)| char::from_u32(v).map(|ch| (ch, end))) {
            Some(result) => Ok(result),
            None => self.error(i, "illegal escape sequence or unpaired surrogate"),
        }
    }

    //
    // Settings
    //

    /// Reads space-separated words up to the next syntax character other
    /// than `-` and `_`. Returns `None` at the end of the rules.
    fn read_words(&self, mut i: usize) -> Option<(String, usize)> {
        let mut raw = String::new();
        i = self.skip_white_space(i);
        loop {
            let c = self.at(i)?;
            if is_syntax_char(c) && c != '-' && c != '_' {
                if raw.ends_with(' ') {
                    raw.pop();
                }
                return Some((raw, i));
            }
            if is_white_space(c) {
                raw.push(' ');
                i = self.skip_white_space(i + 1);
            } else {
                raw.push(c);
                i += 1;
            }
        }
    }

    fn parse_special_position(&self, i: usize) -> Result<(SpecialPosition, usize)> {
        if let Some((raw, j)) = self.read_words(i + 1) {
            if j > i && self.at(j) == Some(']') && !raw.is_empty() {
                if let Some(position) = SpecialPosition::from_name(&raw) {
                    return Ok((position, j + 1));
                }
            }
        }
        self.error(i, "not a valid special reset position")
    }

    fn parse_setting(&mut self) -> Result<()> {
        let offset = self.index;
        let i = self.index + 1;
        let Some((raw, mut j)) = self.read_words(i) else {
            return self.error(i, "expected a setting/option at '['");
        };
        if raw.is_empty() {
            return self.error(i, "expected a setting/option at '['");
        }

        if self.at(j) == Some(']') {
            j += 1;
            if raw == "reorder" || raw.starts_with("reorder ") {
                let mut codes = Vec::new();
                for name in raw.split(' ').skip(1) {
                    match ReorderCode::parse(name) {
                        Some(code) => codes.push(code),
                        None => return self.error(i, "unknown script or reorder code"),
                    }
                }
                self.push_setting(RuleSetting::Reorder(codes), offset);
                self.index = j;
                return Ok(());
            }
            if raw == "backwards 2" {
                self.push_setting(RuleSetting::BackwardsSecondary, offset);
                self.index = j;
                return Ok(());
            }
            let (name, value) = match raw.rfind(' ') {
                Some(split) => (&raw[..split], &raw[split + 1..]),
                None => (raw.as_str(), ""),
            };
            let on_off = |v: &str| match v {
                "on" => Some(true),
                "off" => Some(false),
                _ => None,
            };
            let setting = match name {
                "strength" => match value {
                    "1" => Some(RuleSetting::Strength(Strength::Primary)),
                    "2" => Some(RuleSetting::Strength(Strength::Secondary)),
                    "3" => Some(RuleSetting::Strength(Strength::Tertiary)),
                    "4" => Some(RuleSetting::Strength(Strength::Quaternary)),
                    "I" => Some(RuleSetting::Strength(Strength::Identical)),
                    _ => None,
                },
                "alternate" => match value {
                    "non-ignorable" => Some(RuleSetting::Shifted(false)),
                    "shifted" => Some(RuleSetting::Shifted(true)),
                    _ => None,
                },
                "maxVariable" => MaxVariable::from_name(value).map(RuleSetting::MaxVariable),
                "caseFirst" => match value {
                    "off" => Some(RuleSetting::CaseFirst(CaseFirst::Off)),
                    "lower" => Some(RuleSetting::CaseFirst(CaseFirst::LowerFirst)),
                    "upper" => Some(RuleSetting::CaseFirst(CaseFirst::UpperFirst)),
                    _ => None,
                },
                "caseLevel" => on_off(value).map(RuleSetting::CaseLevel),
                "normalization" => on_off(value).map(RuleSetting::Normalization),
                "numericOrdering" => on_off(value).map(RuleSetting::Numeric),
                "hiraganaQ" => match on_off(value) {
                    Some(false) => {
                        self.index = j;
                        return Ok(());
                    }
                    Some(true) => return self.error(offset, "[hiraganaQ on] is not supported"),
                    None => None,
                },
                "import" => {
                    self.import(value, offset)?;
                    self.index = j;
                    return Ok(());
                }
                _ => None,
            };
            return match setting {
                Some(setting) => {
                    self.push_setting(setting, offset);
                    self.index = j;
                    Ok(())
                }
                None => self.error(offset, "not a valid setting/option"),
            };
        }

        if self.at(j) == Some('[') {
            let (set, end) = self.parse_unicode_set(j)?;
            let setting = match raw.as_str() {
                "optimize" => RuleSetting::Optimize(set),
                "suppressContractions" => RuleSetting::SuppressContractions(set),
                _ => return self.error(offset, "not a valid setting/option"),
            };
            let end = self.skip_white_space(end);
            if self.at(end) != Some(']') {
                return self.error(end, "missing option-terminating ']' after UnicodeSet pattern");
            }
            self.push_setting(setting, offset);
            self.index = end + 1;
            return Ok(());
        }

        self.error(offset, "not a valid setting/option")
    }

    /// Parses a bracketed set of characters and ranges, e.g. `[a-ź]`.
    fn parse_unicode_set(&self, start: usize) -> Result<(Vec<char>, usize)> {
        let mut i = start + 1;
        let mut chars: Vec<char> = Vec::new();
        let mut pending_range = false;
        loop {
            let Some(c) = self.at(i) else {
                return self.error(start, "unterminated UnicodeSet pattern");
            };
            let (ch, next) = match c {
                ']' => {
                    if pending_range {
                        chars.push('-');
                    }
                    chars.sort_unstable();
                    chars.dedup();
                    return Ok((chars, i + 1));
                }
                '[' | '{' | '}' | '$' | '^' | '&' => {
                    return self.error(i, "unsupported UnicodeSet syntax");
                }
                '-' if !chars.is_empty() && !pending_range => {
                    pending_range = true;
                    i += 1;
                    continue;
                }
                '\\' if i + 1 < self.rules.len() => self.unescape(i + 1)?,
                c if is_white_space(c) => {
                    i += 1;
                    continue;
                }
                c => (c, i + 1),
            };
            if pending_range {
                pending_range = false;
                let Some(&low) = chars.last() else {
                    return self.error(i, "unsupported UnicodeSet syntax");
                };
                if ch < low {
                    return self.error(i, "UnicodeSet range start greater than end");
                }
                chars.extend((low as u32 + 1..=ch as u32).filter_map(char::from_u32));
            } else {
                chars.push(ch);
            }
            i = next;
        }
    }

    fn import(&mut self, tag: &str, offset: usize) -> Result<()> {
        if self.depth >= MAX_IMPORT_DEPTH {
            return self.error(offset, "[import] nested too deeply");
        }
        let (locale, collation_type) = match tag.find("-u-co-") {
            Some(split) => (&tag[..split], &tag[split + 6..]),
            None => (tag, "standard"),
        };
        let Some(text) = self.importer.import_rules(locale, collation_type) else {
            return self.error(offset, "[import langTag] failed");
        };
        let rules: Vec<char> = text.chars().collect();
        let mut nested = RuleParser {
            rules: &rules,
            index: 0,
            importer: self.importer,
            depth: self.depth + 1,
            items: Vec::new(),
        };
        nested.parse().map_err(|error| match error {
            CollationError::RuleSyntax { reason, .. } => CollationError::syntax(
                offset,
                format!("in [import {}]: {}", tag, reason),
            ),
            other => other,
        })?;
        // Imported items report the offset of the import directive
        for mut item in nested.items {
            match &mut item {
                RuleItem::Reset { offset: o, .. }
                | RuleItem::Relation { offset: o, .. }
                | RuleItem::Setting { offset: o, .. } => *o = offset,
            }
            self.items.push(item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<RuleItem> {
        parse_rules(text, &NoImports).unwrap_or_else(|error| panic!("{text}: {error}"))
    }

    fn relation_strings(items: &[RuleItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                RuleItem::Relation { string, .. } => Some(string.iter().collect()),
                _ => None,
            })
            .collect()
    }

    fn syntax_offset(text: &str) -> usize {
        match parse_rules(text, &NoImports) {
            Err(CollationError::RuleSyntax { offset, .. }) => offset,
            other => panic!("expected a syntax error for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn resets_and_relations() {
        let items = parse("&a < b <<c<<<d = e ; f , g");
        assert_eq!(
            items[0],
            RuleItem::Reset {
                anchor: Anchor::Text(vec!['a']),
                before: None,
                offset: 0
            }
        );
        let levels: Vec<Level> = items
            .iter()
            .filter_map(|item| match item {
                RuleItem::Relation { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(
            levels,
            [
                Level::Primary,
                Level::Secondary,
                Level::Tertiary,
                Level::Identical,
                Level::Secondary,
                Level::Tertiary
            ]
        );
    }

    #[test]
    fn quoting_and_escapes() {
        let items = parse("&'#'<'' <\\u00E4 <\\x{1F600} <'a b'");
        assert_eq!(
            items[0],
            RuleItem::Reset {
                anchor: Anchor::Text(vec!['#']),
                before: None,
                offset: 0
            }
        );
        assert_eq!(relation_strings(&items), ["'", "ä", "😀", "a b"]);
    }

    #[test]
    fn prefix_and_extension() {
        let items = parse("&a < x|y/z");
        assert_eq!(
            items[1],
            RuleItem::Relation {
                level: Level::Primary,
                prefix: vec!['x'],
                string: vec!['y'],
                extension: vec!['z'],
                offset: 3
            }
        );
    }

    #[test]
    fn starred_lists_and_ranges() {
        let items = parse("&a <* bcd-fx");
        assert_eq!(relation_strings(&items), ["b", "c", "d", "e", "f", "x"]);
        assert!(parse_rules("&a <* -c", &NoImports).is_err());
        assert!(parse_rules("&a <* c-", &NoImports).is_err());
        assert!(parse_rules("&a <* d-b", &NoImports).is_err());
        assert!(parse_rules("&a <* \u{00E4}", &NoImports).is_err());
    }

    #[test]
    fn settings() {
        let items = parse("[strength 2][caseFirst upper][reorder Grek Latn digit][backwards 2]@");
        let settings: Vec<RuleSetting> = items
            .into_iter()
            .filter_map(|item| match item {
                RuleItem::Setting { setting, .. } => Some(setting),
                _ => None,
            })
            .collect();
        assert_eq!(
            settings,
            [
                RuleSetting::Strength(Strength::Secondary),
                RuleSetting::CaseFirst(CaseFirst::UpperFirst),
                RuleSetting::Reorder(vec![
                    ReorderCode::Script(crate::props::Script::Greek),
                    ReorderCode::Script(crate::props::Script::Latin),
                    ReorderCode::Digit
                ]),
                RuleSetting::BackwardsSecondary,
                RuleSetting::BackwardsSecondary,
            ]
        );
        let items = parse("[suppressContractions [a-c\\u0301]]");
        assert_eq!(
            items[0],
            RuleItem::Setting {
                setting: RuleSetting::SuppressContractions(vec!['a', 'b', 'c', '\u{0301}']),
                offset: 0
            }
        );
    }

    #[test]
    fn special_positions_and_before() {
        let items = parse("&[before 2][first primary ignorable] << x # comment\n&[top]<y");
        assert_eq!(
            items[0],
            RuleItem::Reset {
                anchor: Anchor::Special(SpecialPosition::FirstPrimaryIgnorable),
                before: Some(Level::Secondary),
                offset: 0
            }
        );
        assert!(matches!(
            items[2],
            RuleItem::Reset {
                anchor: Anchor::Special(SpecialPosition::LastRegular),
                ..
            }
        ));
    }

    #[test]
    fn errors_carry_offsets() {
        assert_eq!(syntax_offset("&a < b c"), 7);
        assert_eq!(syntax_offset("&[before 2]a < b"), 13);
        assert_eq!(syntax_offset("&[before 2]a << b < c"), 18);
        assert_eq!(syntax_offset("&a <<<< b"), 3);
        assert!(syntax_offset("&a < 'b") >= 5);
        assert_eq!(syntax_offset("&a"), 2);
        assert_eq!(syntax_offset("&[bogus]<a"), 1);
        assert_eq!(syntax_offset("[strength 7]"), 0);
        assert_eq!(syntax_offset("[hiraganaQ on]"), 0);
        assert!(matches!(
            parse_rules("&a<b\\", &NoImports),
            Err(CollationError::RuleSyntax { .. })
        ));
    }

    #[test]
    fn imports_splice_rules() {
        struct German;
        impl Importer for German {
            fn import_rules(&self, locale: &str, collation_type: &str) -> Option<String> {
                (locale == "de" && collation_type == "phonebk").then(|| "&ae<<ä".to_string())
            }
        }
        let items = parse_rules("[import de-u-co-phonebk]&z<x", &German).unwrap();
        assert_eq!(relation_strings(&items), ["ä", "x"]);
        assert!(parse_rules("[import fr]", &German).is_err());
    }
}
