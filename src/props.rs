use serde::{Deserialize, Serialize};

use crate::normalize;

/// The scripts the engine distinguishes, with their ISO 15924 codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Script {
    Common,
    Inherited,
    Latin,
    Greek,
    Cyrillic,
    Hebrew,
    Arabic,
    Hangul,
    Hiragana,
    Katakana,
    KatakanaOrHiragana,
    Han,
    SimplifiedHan,
    TraditionalHan,
    Bopomofo,
    MeroiticHieroglyphs,
    MeroiticCursive,
    Unknown,
}

impl Script {
    pub const ALL: [Script; 18] = [
        Script::Common,
        Script::Inherited,
        Script::Latin,
        Script::Greek,
        Script::Cyrillic,
        Script::Hebrew,
        Script::Arabic,
        Script::Hangul,
        Script::Hiragana,
        Script::Katakana,
        Script::KatakanaOrHiragana,
        Script::Han,
        Script::SimplifiedHan,
        Script::TraditionalHan,
        Script::Bopomofo,
        Script::MeroiticHieroglyphs,
        Script::MeroiticCursive,
        Script::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Script::Common => "Zyyy",
            Script::Inherited => "Zinh",
            Script::Latin => "Latn",
            Script::Greek => "Grek",
            Script::Cyrillic => "Cyrl",
            Script::Hebrew => "Hebr",
            Script::Arabic => "Arab",
            Script::Hangul => "Hang",
            Script::Hiragana => "Hira",
            Script::Katakana => "Kana",
            Script::KatakanaOrHiragana => "Hrkt",
            Script::Han => "Hani",
            Script::SimplifiedHan => "Hans",
            Script::TraditionalHan => "Hant",
            Script::Bopomofo => "Bopo",
            Script::MeroiticHieroglyphs => "Mero",
            Script::MeroiticCursive => "Merc",
            Script::Unknown => "Zzzz",
        }
    }

    /// Case-insensitive lookup by ISO 15924 code.
    pub fn from_code(code: &str) -> Option<Script> {
        Script::ALL
            .iter()
            .copied()
            .find(|s| s.code().eq_ignore_ascii_case(code))
    }
}

/// A coarse general category, enough to tell letters from unassigned code points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneralCategory {
    UppercaseLetter,
    LowercaseLetter,
    OtherLetter,
    Mark,
    DecimalNumber,
    OtherNumber,
    Punctuation,
    Symbol,
    Separator,
    Control,
    Format,
    Unassigned,
}

impl GeneralCategory {
    pub fn is_letter(self) -> bool {
        matches!(
            self,
            GeneralCategory::UppercaseLetter
                | GeneralCategory::LowercaseLetter
                | GeneralCategory::OtherLetter
        )
    }
}

/// Character property lookups the collation engine depends on.
pub trait CharProperties {
    fn script(&self, c: char) -> Script;
    fn general_category(&self, c: char) -> GeneralCategory;
}

/// Table-driven properties for the scripts covered by the root collation data.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeProperties;

impl CharProperties for UnicodeProperties {
    fn script(&self, c: char) -> Script {
        script_of(c)
    }

    fn general_category(&self, c: char) -> GeneralCategory {
        general_category_of(c)
    }
}

//
// Tables
//

type Ranges = &'static [(u32, u32)];

const SCRIPT_RANGES: &[(Script, Ranges)] = &[
    (
        Script::Inherited,
        &[
            (0x0300, 0x036F),
            (0x1AB0, 0x1AFF),
            (0x1DC0, 0x1DFF),
            (0x20D0, 0x20FF),
            (0x3099, 0x309A),
            (0xFE00, 0xFE0F),
            (0xFE20, 0xFE2F),
        ],
    ),
    (
        Script::Latin,
        &[
            (0x0041, 0x005A),
            (0x0061, 0x007A),
            (0x00AA, 0x00AA),
            (0x00BA, 0x00BA),
            (0x00C0, 0x00D6),
            (0x00D8, 0x00F6),
            (0x00F8, 0x024F),
            (0x1E00, 0x1EFF),
            (0x2C60, 0x2C7F),
            (0xA720, 0xA7FF),
            (0xFF21, 0xFF3A),
            (0xFF41, 0xFF5A),
        ],
    ),
    (Script::Greek, &[(0x0370, 0x03FF), (0x1F00, 0x1FFF)]),
    (Script::Cyrillic, &[(0x0400, 0x052F), (0x2DE0, 0x2DFF)]),
    (Script::Hebrew, &[(0x0591, 0x05F4), (0xFB1D, 0xFB4F)]),
    (
        Script::Arabic,
        &[
            (0x0600, 0x06FF),
            (0x0750, 0x077F),
            (0xFB50, 0xFDCF),
            (0xFDF0, 0xFDFF),
            (0xFE70, 0xFEFE),
        ],
    ),
    (
        Script::Hangul,
        &[
            (0x1100, 0x11FF),
            (0x3131, 0x318E),
            (0xAC00, 0xD7A3),
            (0xFFA0, 0xFFDC),
        ],
    ),
    (Script::Hiragana, &[(0x3041, 0x3096), (0x309D, 0x309F)]),
    (
        Script::Katakana,
        &[
            (0x30A1, 0x30FA),
            (0x30FD, 0x30FF),
            (0x31F0, 0x31FF),
            (0xFF66, 0xFF6F),
            (0xFF71, 0xFF9D),
        ],
    ),
    (Script::Bopomofo, &[(0x3105, 0x312F), (0x31A0, 0x31BF)]),
    (
        Script::Han,
        &[
            (0x2E80, 0x2FDF),
            (0x3005, 0x3005),
            (0x3007, 0x3007),
            (0x3021, 0x3029),
            (0x3400, 0x4DBF),
            (0x4E00, 0x9FFF),
            (0xF900, 0xFAFF),
            (0x20000, 0x2FA1F),
            (0x30000, 0x3134F),
        ],
    ),
    (Script::MeroiticHieroglyphs, &[(0x10980, 0x1099F)]),
    (Script::MeroiticCursive, &[(0x109A0, 0x109FF)]),
];

fn in_ranges(cp: u32, ranges: Ranges) -> bool {
    ranges.iter().any(|&(lo, hi)| lo <= cp && cp <= hi)
}

pub fn script_of(c: char) -> Script {
    let cp = c as u32;
    for (script, ranges) in SCRIPT_RANGES {
        if in_ranges(cp, ranges) {
            return *script;
        }
    }

    if general_category_of(c) == GeneralCategory::Unassigned {
        Script::Unknown
    } else {
        Script::Common
    }
}

pub fn is_noncharacter(c: char) -> bool {
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || cp & 0xFFFE == 0xFFFE
}

// Code points below U+0400 that are not assigned.
const UNASSIGNED_LOW: Ranges = &[
    (0x0378, 0x0379),
    (0x0380, 0x0383),
    (0x038B, 0x038B),
    (0x038D, 0x038D),
    (0x03A2, 0x03A2),
];

const FORMAT: Ranges = &[
    (0x00AD, 0x00AD),
    (0x0600, 0x0605),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x2064),
    (0xFEFF, 0xFEFF),
];

const PUNCTUATION: Ranges = &[
    (0x00A1, 0x00A1),
    (0x00A7, 0x00A7),
    (0x00AB, 0x00AB),
    (0x00B6, 0x00B7),
    (0x00BB, 0x00BB),
    (0x00BF, 0x00BF),
    (0x2010, 0x2027),
    (0x2030, 0x205E),
    (0x3001, 0x3003),
    (0x3008, 0x3011),
    (0x3014, 0x301F),
    (0xFF01, 0xFF0F),
];

const SYMBOL: Ranges = &[
    (0x00A2, 0x00A6),
    (0x00A8, 0x00A9),
    (0x00AC, 0x00AC),
    (0x00AE, 0x00B1),
    (0x00B4, 0x00B4),
    (0x00B8, 0x00B8),
    (0x00D7, 0x00D7),
    (0x00F7, 0x00F7),
    (0x20A0, 0x20C0),
    (0x2100, 0x214F),
    (0x2190, 0x2BFF),
    (0x1F300, 0x1FAFF),
];

pub fn general_category_of(c: char) -> GeneralCategory {
    let cp = c as u32;

    if is_noncharacter(c) || in_ranges(cp, UNASSIGNED_LOW) {
        return GeneralCategory::Unassigned;
    }
    if c.is_control() {
        return GeneralCategory::Control;
    }
    if in_ranges(cp, FORMAT) {
        return GeneralCategory::Format;
    }
    if normalize::combining_class(c) != 0 || unicode_normalization::char::is_combining_mark(c) {
        return GeneralCategory::Mark;
    }
    if c.is_alphabetic() {
        return if c.is_uppercase() {
            GeneralCategory::UppercaseLetter
        } else if c.is_lowercase() {
            GeneralCategory::LowercaseLetter
        } else {
            GeneralCategory::OtherLetter
        };
    }
    if c.is_numeric() {
        return if decimal_digit_value(c).is_some() {
            GeneralCategory::DecimalNumber
        } else {
            GeneralCategory::OtherNumber
        };
    }
    if c.is_whitespace() {
        return GeneralCategory::Separator;
    }
    if c.is_ascii_punctuation() {
        return if "$+<=>^`|~".contains(c) {
            GeneralCategory::Symbol
        } else {
            GeneralCategory::Punctuation
        };
    }
    if in_ranges(cp, PUNCTUATION) {
        return GeneralCategory::Punctuation;
    }
    if in_ranges(cp, SYMBOL) {
        return GeneralCategory::Symbol;
    }

    GeneralCategory::Unassigned
}

// Zero digits of the decimal digit blocks the root table knows.
const DIGIT_ZEROS: [u32; 8] = [
    0x0030, 0x0660, 0x06F0, 0x0966, 0x09E6, 0x0E50, 0xFF10, 0x1D7CE,
];

pub fn decimal_digit_value(c: char) -> Option<u8> {
    let cp = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| zero <= cp && cp < zero + 10)
        .map(|&zero| (cp - zero) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_of_sample_letters() {
        assert_eq!(script_of('a'), Script::Latin);
        assert_eq!(script_of('Ω'), Script::Greek);
        assert_eq!(script_of('ж'), Script::Cyrillic);
        assert_eq!(script_of('あ'), Script::Hiragana);
        assert_eq!(script_of('渡'), Script::Han);
        assert_eq!(script_of('\u{0301}'), Script::Inherited);
        assert_eq!(script_of('1'), Script::Common);
        assert_eq!(script_of('\u{FDD1}'), Script::Unknown);
    }

    #[test]
    fn categories() {
        assert_eq!(general_category_of('A'), GeneralCategory::UppercaseLetter);
        assert_eq!(general_category_of('q'), GeneralCategory::LowercaseLetter);
        assert_eq!(general_category_of('字'), GeneralCategory::OtherLetter);
        assert_eq!(general_category_of('\u{0308}'), GeneralCategory::Mark);
        assert_eq!(general_category_of('7'), GeneralCategory::DecimalNumber);
        assert_eq!(general_category_of('$'), GeneralCategory::Symbol);
        assert_eq!(general_category_of('-'), GeneralCategory::Punctuation);
        assert_eq!(general_category_of('\u{0378}'), GeneralCategory::Unassigned);
        assert_eq!(general_category_of('\u{2FFFE}'), GeneralCategory::Unassigned);
    }

    #[test]
    fn script_codes_resolve() {
        assert_eq!(Script::from_code("hani"), Some(Script::Han));
        assert_eq!(Script::from_code("Merc"), Some(Script::MeroiticCursive));
        assert_eq!(Script::from_code("Xxxx"), None);
    }
}
