//! The root collation table.
//!
//! The table is synthesized on first use. Every reorder group starts on its own
//! primary lead byte, and every lead byte carries root weights of a single
//! length, so weights never prefix one another. Gaps of at least two steps
//! are left between neighbouring root weights for tailoring.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound::{Excluded, Unbounded};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::ce::*;
use crate::error::{CollationError, Result};
use crate::normalize;
use crate::props::{self, Script};
use crate::reorder::ReorderCode;

pub(crate) static ROOT: Lazy<RootData> = Lazy::new(RootData::build);

pub(crate) const SPACE_LEAD: u8 = 0x03;
pub(crate) const PUNCT_LEAD: u8 = 0x04;
pub(crate) const SYMBOL_LEAD: u8 = 0x05;
pub(crate) const CURRENCY_LEAD: u8 = 0x06;
pub(crate) const DIGIT_LEAD: u8 = 0x07;
pub(crate) const NUMERIC_LEAD: u8 = 0x0F;
const LATIN_LEAD: u8 = 0x10;
const GREEK_LEAD: u8 = 0x12;
const CYRILLIC_LEAD: u8 = 0x14;
const HEBREW_LEAD: u8 = 0x16;
const ARABIC_LEAD: u8 = 0x18;
const HANGUL_LEAD: u8 = 0x1A;
const KANA_LEAD: u8 = 0x1C;
const MEROITIC_LEAD: u8 = 0x1E;
const HAN_LEAD: u8 = 0xE0;
const OTHERS_LEAD: u8 = 0xE4;
const LAST_REORDERABLE_LEAD: u8 = 0xFD;
const TRAILING_LEAD: u8 = 0xFE;

const FIRST_COMPRESSIBLE_LEAD: u8 = LATIN_LEAD;
const LAST_COMPRESSIBLE_LEAD: u8 = 0xDF;

const BOUNDARY_SECOND: u32 = 0x04;
const FIRST_SECOND: u32 = 0x10;
const STEP: u32 = 4;

const MERGE_SEPARATOR_PRIMARY: u32 = 0x0200_0000;
const GENERIC_MARK_SECONDARY: u16 = 0xF800;

pub(crate) const SCRIPT_BOUNDARY_CHAR: char = '\u{FDD1}';

/// Implicit primaries are three bytes. Han leaves a gap after every
/// ideograph so that tailorings can insert after one.
#[derive(Clone, Copy)]
struct ImplicitScheme {
    base: u8,
    per_second: u32,
    step: u32,
    first_trail: u32,
}

const HAN_IMPLICIT: ImplicitScheme = ImplicitScheme {
    base: HAN_LEAD,
    per_second: 126,
    step: 2,
    first_trail: 3,
};

const OTHERS_IMPLICIT: ImplicitScheme = ImplicitScheme {
    base: OTHERS_LEAD,
    per_second: 254,
    step: 1,
    first_trail: 2,
};

impl ImplicitScheme {
    fn for_lead(lead: u8) -> ImplicitScheme {
        if lead >= OTHERS_LEAD {
            OTHERS_IMPLICIT
        } else {
            HAN_IMPLICIT
        }
    }

    fn encode(self, n: u32) -> u32 {
        let per_lead = self.per_second * 254;
        let lead = u32::from(self.base) + n / per_lead;
        let second = 2 + (n / self.per_second) % 254;
        let third = self.first_trail + self.step * (n % self.per_second);
        (lead << 24) | (second << 16) | (third << 8)
    }

    fn decode(self, p: u32) -> u32 {
        let lead = (p >> 24) - u32::from(self.base);
        let second = ((p >> 16) & 0xFF).saturating_sub(2);
        let third = ((p >> 8) & 0xFF).saturating_sub(self.first_trail) / self.step;
        lead * self.per_second * 254 + second * self.per_second + third
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialPosition {
    FirstTertiaryIgnorable,
    LastTertiaryIgnorable,
    FirstSecondaryIgnorable,
    LastSecondaryIgnorable,
    FirstPrimaryIgnorable,
    LastPrimaryIgnorable,
    FirstVariable,
    LastVariable,
    FirstRegular,
    LastRegular,
    FirstImplicit,
    LastImplicit,
    FirstTrailing,
    LastTrailing,
}

impl SpecialPosition {
    pub fn name(self) -> &'static str {
        match self {
            SpecialPosition::FirstTertiaryIgnorable => "first tertiary ignorable",
            SpecialPosition::LastTertiaryIgnorable => "last tertiary ignorable",
            SpecialPosition::FirstSecondaryIgnorable => "first secondary ignorable",
            SpecialPosition::LastSecondaryIgnorable => "last secondary ignorable",
            SpecialPosition::FirstPrimaryIgnorable => "first primary ignorable",
            SpecialPosition::LastPrimaryIgnorable => "last primary ignorable",
            SpecialPosition::FirstVariable => "first variable",
            SpecialPosition::LastVariable => "last variable",
            SpecialPosition::FirstRegular => "first regular",
            SpecialPosition::LastRegular => "last regular",
            SpecialPosition::FirstImplicit => "first implicit",
            SpecialPosition::LastImplicit => "last implicit",
            SpecialPosition::FirstTrailing => "first trailing",
            SpecialPosition::LastTrailing => "last trailing",
        }
    }

    pub fn from_name(name: &str) -> Option<SpecialPosition> {
        const ALL: [SpecialPosition; 14] = [
            SpecialPosition::FirstTertiaryIgnorable,
            SpecialPosition::LastTertiaryIgnorable,
            SpecialPosition::FirstSecondaryIgnorable,
            SpecialPosition::LastSecondaryIgnorable,
            SpecialPosition::FirstPrimaryIgnorable,
            SpecialPosition::LastPrimaryIgnorable,
            SpecialPosition::FirstVariable,
            SpecialPosition::LastVariable,
            SpecialPosition::FirstRegular,
            SpecialPosition::LastRegular,
            SpecialPosition::FirstImplicit,
            SpecialPosition::LastImplicit,
            SpecialPosition::FirstTrailing,
            SpecialPosition::LastTrailing,
        ];
        if name == "top" {
            return Some(SpecialPosition::LastRegular);
        }
        ALL.iter().copied().find(|pos| pos.name() == name)
    }
}

/// A reordering group: one or more equivalent codes sharing a lead-byte range.
#[derive(Clone, Debug)]
pub(crate) struct ReorderGroup {
    pub codes: Vec<ReorderCode>,
    pub first_lead: u8,
    pub last_lead: u8,
    pub first_primary: u32,
    pub sample: char,
}

impl ReorderGroup {
    /// The highest primary that belongs to this group.
    pub fn last_primary(&self) -> u32 {
        ((u32::from(self.last_lead) + 1) << 24) - 1
    }

    pub fn contains_primary(&self, p: u32) -> bool {
        (self.first_lead..=self.last_lead).contains(&lead_byte(p))
    }
}

pub(crate) struct RootData {
    mappings: HashMap<Vec<char>, Vec<Ce>>,
    prefixes: HashSet<Vec<char>>,
    continuations: HashSet<char>,
    primaries: BTreeSet<u32>,
    secondaries: BTreeMap<u32, BTreeSet<u16>>,
    tertiaries: BTreeMap<(u32, u16), BTreeSet<u16>>,
    groups: Vec<ReorderGroup>,
    last_regular: Ce,
}

//
// Tables
//

const IGNORABLE: &[(u32, u32)] = &[
    (0x0000, 0x0008),
    (0x000E, 0x001F),
    (0x007F, 0x009F),
    (0x00AD, 0x00AD),
    (0x034F, 0x034F),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x206F),
    (0xFEFF, 0xFEFF),
];

const SPACES: &str = "\t\n\u{B}\u{C}\r \u{1680}\u{2028}\u{2029}";

const PUNCTUATION: &str = "_-\u{2010}\u{2012}\u{2013}\u{2014}\u{2015},;:!¡?¿.·'‘’‚\"“”„«»()[]{}§¶@*/\\&#%‰†‡•′″、。「」『』【】";

const SYMBOLS: &str = "`^°©®+±÷×<=>¬|¦~←↑→↓■□●○★☆♪";

const CURRENCIES: &str = "¤¢$£¥₩₪€₹₽₿";

const LATIN: &str = "aæbcdðefghiıjklłmnŋoœøpqrstuvwxyzþ";
const GREEK: &str = "αβγδεζηθικλμνξοπρστυφχψω";
const CYRILLIC: &str = "абвгґдђеєжзѕиіјклљмнњопрстћуфхцчџшщъыьэюя";
const HEBREW: &str = "אבגדהוזחטיכלמנסעפצקרשת";
const HEBREW_FINALS: [(char, char); 5] = [('ך', 'כ'), ('ם', 'מ'), ('ן', 'נ'), ('ף', 'פ'), ('ץ', 'צ')];
const ARABIC: &str = "ءابةتثجحخدذرزسشصضطظعغفقكلمنهوىي";

// Small kana share the primary of their large form
const SMALL_HIRAGANA: [(u32, u32); 12] = [
    (0x3041, 0x3042),
    (0x3043, 0x3044),
    (0x3045, 0x3046),
    (0x3047, 0x3048),
    (0x3049, 0x304A),
    (0x3063, 0x3064),
    (0x3083, 0x3084),
    (0x3085, 0x3086),
    (0x3087, 0x3088),
    (0x308E, 0x308F),
    (0x3095, 0x304B),
    (0x3096, 0x3051),
];
const KATAKANA_OFFSET: u32 = 0x60;

fn in_ranges(cp: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(lo, hi)| lo <= cp && cp <= hi)
}

/// Tertiary weight of a compatibility variant of a character with tertiary `t`.
pub(crate) fn variant_tertiary(t: u16) -> u16 {
    match t & ONLY_TERTIARY_MASK {
        T_COMMON => T_VARIANT,
        T_KATA => T_KATA_VARIANT,
        T_UPPER => T_UPPER_VARIANT,
        w if w < 0x3E00 => w + 0x0100,
        w => w,
    }
}

fn make_primary(lead: u8, second: u32) -> u32 {
    (u32::from(lead) << 24) | (second << 16)
}

/// Han ideographs get implicit primaries in block order; everything else by code point.
pub(crate) fn implicit_primary(c: char) -> u32 {
    let cp = c as u32;
    match han_index(cp) {
        Some(index) => HAN_IMPLICIT.encode(index + 1),
        None => OTHERS_IMPLICIT.encode(cp + 1),
    }
}

fn han_index(cp: u32) -> Option<u32> {
    match cp {
        0x4E00..=0x9FFF => Some(cp - 0x4E00),
        0xFA0E..=0xFA29 => Some(0x5200 + cp - 0xFA0E),
        0x3400..=0x4DBF => Some(0x5300 + cp - 0x3400),
        0x20000..=0x2FFFF => Some(0x7000 + cp - 0x20000),
        0x30000..=0x3134F => Some(0x17000 + cp - 0x30000),
        _ => None,
    }
}

fn is_implicit_lead(lead: u8) -> bool {
    (HAN_LEAD..=LAST_REORDERABLE_LEAD).contains(&lead)
}

//
// Construction
//

struct RootBuilder {
    data: RootData,
    lead: u8,
    second: u32,
}

impl RootBuilder {
    fn new() -> Self {
        Self {
            data: RootData {
                mappings: HashMap::new(),
                prefixes: HashSet::new(),
                continuations: HashSet::new(),
                primaries: BTreeSet::new(),
                secondaries: BTreeMap::new(),
                tertiaries: BTreeMap::new(),
                groups: Vec::new(),
                last_regular: 0,
            },
            lead: 0,
            second: 0,
        }
    }

    fn begin_group(&mut self, codes: &[ReorderCode], lead: u8, sample: char) {
        let boundary = if is_implicit_lead(lead) {
            ImplicitScheme::for_lead(lead).encode(0)
        } else {
            make_primary(lead, BOUNDARY_SECOND)
        };
        self.lead = lead;
        self.second = FIRST_SECOND;
        self.data.groups.push(ReorderGroup {
            codes: codes.to_vec(),
            first_lead: lead,
            last_lead: lead,
            first_primary: boundary,
            sample,
        });
        self.data.primaries.insert(boundary);
        self.contraction(
            &[SCRIPT_BOUNDARY_CHAR, sample],
            vec![make_ce(boundary, COMMON_WEIGHT16, T_COMMON)],
        );
    }

    fn next_primary(&mut self) -> u32 {
        if self.second > 0xFE {
            self.lead += 1;
            self.second = FIRST_SECOND;
        }
        let p = make_primary(self.lead, self.second);
        self.second += STEP;
        self.data.primaries.insert(p);
        p
    }

    fn register(&mut self, ce: Ce) {
        let (p, s, t) = (primary(ce), secondary(ce), tertiary_weight(ce));
        if s == 0 {
            return;
        }
        self.data.secondaries.entry(p).or_default().insert(s);
        let ters = self.data.tertiaries.entry((p, s)).or_default();
        ters.insert(t);
        ters.insert(variant_tertiary(t));
    }

    fn single(&mut self, c: char, ces: Vec<Ce>) {
        for &ce in &ces {
            self.register(ce);
        }
        self.data.mappings.insert(vec![c], ces);
    }

    fn contraction(&mut self, key: &[char], ces: Vec<Ce>) {
        for &ce in &ces {
            self.register(ce);
        }
        for len in 1..key.len() {
            self.data.prefixes.insert(key[..len].to_vec());
        }
        self.data.continuations.extend(key[1..].iter().copied());
        self.data.mappings.insert(key.to_vec(), ces);
    }

    fn symbols(&mut self, chars: &str) {
        for c in chars.chars() {
            let p = self.next_primary();
            self.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_COMMON)]);
        }
    }

    /// Adds each letter with its uppercase form as a tertiary variant.
    fn letters(&mut self, chars: &str) {
        for c in chars.chars() {
            let p = self.next_primary();
            self.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_COMMON | LOWER_CASE)]);

            let mut upper = c.to_uppercase();
            if let (Some(u), None) = (upper.next(), upper.next()) {
                if u != c && !self.data.mappings.contains_key(&vec![u]) {
                    self.single(u, vec![make_ce(p, COMMON_WEIGHT16, T_UPPER | UPPER_CASE)]);
                }
            }
        }
    }

    fn variant_of(&mut self, c: char, base: char, tertiary: u16) {
        if let Some(ces) = self.data.mappings.get(&vec![base]) {
            let p = primary(ces[0]);
            self.single(c, vec![make_ce(p, COMMON_WEIGHT16, tertiary)]);
        }
    }

    fn finish(mut self) -> RootData {
        let count = self.data.groups.len();
        for i in 0..count {
            self.data.groups[i].last_lead = if i + 1 < count {
                self.data.groups[i + 1].first_lead - 1
            } else {
                LAST_REORDERABLE_LEAD
            };
        }
        self.data
    }
}

impl RootData {
    fn build() -> RootData {
        let mut b = RootBuilder::new();

        for &(lo, hi) in IGNORABLE {
            for cp in lo..=hi {
                if let Some(c) = char::from_u32(cp) {
                    b.data.mappings.insert(vec![c], Vec::new());
                }
            }
        }

        // Combining diacritics are primary ignorable, one secondary each
        for cp in 0x0300..=0x036F_u32 {
            let Some(c) = char::from_u32(cp) else { continue };
            if c == '\u{034F}' || normalize::has_canonical_decomposition(c) {
                continue;
            }
            let s = ((0x10 + 2 * (cp - 0x0300)) << 8) as u16;
            b.single(c, vec![make_ce(0, s, T_COMMON)]);
        }
        b.single('\u{3099}', vec![make_ce(0, 0xF200, T_COMMON)]);
        b.single('\u{309A}', vec![make_ce(0, 0xF400, T_COMMON)]);
        b.register(make_ce(0, GENERIC_MARK_SECONDARY, T_COMMON));

        b.single(
            '\u{FFFE}',
            vec![make_ce(MERGE_SEPARATOR_PRIMARY, COMMON_WEIGHT16, T_COMMON)],
        );

        b.begin_group(&[ReorderCode::Space], SPACE_LEAD, ' ');
        b.symbols(SPACES);
        b.begin_group(&[ReorderCode::Punctuation], PUNCT_LEAD, '_');
        b.symbols(PUNCTUATION);
        b.begin_group(&[ReorderCode::Symbol], SYMBOL_LEAD, '`');
        b.symbols(SYMBOLS);
        b.begin_group(&[ReorderCode::Currency], CURRENCY_LEAD, '¤');
        b.symbols(CURRENCIES);

        b.begin_group(&[ReorderCode::Digit], DIGIT_LEAD, '0');
        let mut digit_primaries = [0_u32; 10];
        for slot in &mut digit_primaries {
            *slot = b.next_primary();
        }
        for cp in (0x0030..0x0E5A).chain(0x1D7CE..0x1D800) {
            let Some(c) = char::from_u32(cp) else { continue };
            if let Some(value) = props::decimal_digit_value(c) {
                if normalize::decompose_compatible(c).is_none() {
                    let p = digit_primaries[usize::from(value)];
                    b.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_COMMON)]);
                }
            }
        }
        b.data.primaries.insert(make_primary(NUMERIC_LEAD, 0x02));

        b.begin_group(&[ReorderCode::Script(Script::Latin)], LATIN_LEAD, 'a');
        b.letters(LATIN);
        let s_ce = make_ce(
            primary(b.data.mappings[&vec!['s']][0]),
            COMMON_WEIGHT16,
            T_VARIANT,
        );
        b.single('ß', vec![s_ce, s_ce]);

        b.begin_group(&[ReorderCode::Script(Script::Greek)], GREEK_LEAD, 'α');
        b.letters(GREEK);
        b.variant_of('ς', 'σ', T_FINAL);

        b.begin_group(&[ReorderCode::Script(Script::Cyrillic)], CYRILLIC_LEAD, 'а');
        b.letters(CYRILLIC);

        b.begin_group(&[ReorderCode::Script(Script::Hebrew)], HEBREW_LEAD, 'א');
        b.letters(HEBREW);
        for (fin, base) in HEBREW_FINALS {
            b.variant_of(fin, base, T_FINAL);
        }

        b.begin_group(&[ReorderCode::Script(Script::Arabic)], ARABIC_LEAD, 'ا');
        b.letters(ARABIC);

        b.begin_group(&[ReorderCode::Script(Script::Hangul)], HANGUL_LEAD, '\u{1100}');
        for cp in (0x1100..=0x1112).chain(0x1161..=0x1175).chain(0x11A8..=0x11C2) {
            if let Some(c) = char::from_u32(cp) {
                let p = b.next_primary();
                b.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_COMMON)]);
            }
        }

        b.begin_group(
            &[
                ReorderCode::Script(Script::Hiragana),
                ReorderCode::Script(Script::Katakana),
                ReorderCode::Script(Script::KatakanaOrHiragana),
            ],
            KANA_LEAD,
            'あ',
        );
        for cp in 0x3041..=0x3096_u32 {
            let Some(c) = char::from_u32(cp) else { continue };
            if normalize::has_canonical_decomposition(c)
                || SMALL_HIRAGANA.iter().any(|&(small, _)| small == cp)
            {
                continue;
            }
            let p = b.next_primary();
            b.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_HIRA)]);
            if let Some(kata) = char::from_u32(cp + KATAKANA_OFFSET) {
                b.single(kata, vec![make_ce(p, COMMON_WEIGHT16, T_KATA)]);
            }
        }
        for (small, large) in SMALL_HIRAGANA {
            let (Some(small), Some(large)) = (char::from_u32(small), char::from_u32(large)) else {
                continue;
            };
            b.variant_of(small, large, T_COMMON);
            if let (Some(small_kata), Some(large_kata)) = (
                char::from_u32(small as u32 + KATAKANA_OFFSET),
                char::from_u32(large as u32 + KATAKANA_OFFSET),
            ) {
                b.variant_of(small_kata, large_kata, T_KATA_SMALL);
            }
        }

        b.begin_group(
            &[
                ReorderCode::Script(Script::MeroiticHieroglyphs),
                ReorderCode::Script(Script::MeroiticCursive),
            ],
            MEROITIC_LEAD,
            '\u{10980}',
        );
        let mut last_regular = 0;
        for cp in (0x10980..=0x1099F).chain(0x109A0..=0x109B7) {
            if let Some(c) = char::from_u32(cp) {
                let p = b.next_primary();
                last_regular = make_ce(p, COMMON_WEIGHT16, T_COMMON);
                b.single(c, vec![last_regular]);
            }
        }
        b.data.last_regular = last_regular;

        b.begin_group(
            &[
                ReorderCode::Script(Script::Han),
                ReorderCode::Script(Script::SimplifiedHan),
                ReorderCode::Script(Script::TraditionalHan),
            ],
            HAN_LEAD,
            '\u{4E00}',
        );
        b.begin_group(&[ReorderCode::Others], OTHERS_LEAD, SCRIPT_BOUNDARY_CHAR);

        for (c, p) in [('\u{FFFD}', 0x04), ('\u{FFFF}', 0xFF)] {
            let p = make_primary(TRAILING_LEAD, p);
            b.data.primaries.insert(p);
            b.single(c, vec![make_ce(p, COMMON_WEIGHT16, T_COMMON)]);
        }

        let root = b.finish();
        debug!(
            mappings = root.mappings.len(),
            groups = root.groups.len(),
            "root collation table built"
        );
        root
    }

    //
    // Lookup
    //

    pub fn lookup(&self, key: &[char]) -> Option<&[Ce]> {
        self.mappings.get(key).map(Vec::as_slice)
    }

    pub fn is_contraction_prefix(&self, key: &[char]) -> bool {
        self.prefixes.contains(key)
    }

    pub fn expansions(&self) -> impl Iterator<Item = &[Ce]> {
        self.mappings.values().map(Vec::as_slice).filter(|ces| ces.len() > 1)
    }

    /// True if `c` occurs after the first position of some root contraction.
    pub fn is_continuation(&self, c: char) -> bool {
        self.continuations.contains(&c)
    }

    pub fn contractions_starting_with(&self, c: char) -> Vec<Vec<char>> {
        let mut out: Vec<Vec<char>> = self
            .mappings
            .keys()
            .filter(|key| key.len() > 1 && key[0] == c)
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// CEs for a code point without an explicit mapping or canonical decomposition.
    pub fn fallback_ces(&self, c: char) -> Vec<Ce> {
        if let Some(decomposed) = normalize::decompose_compatible(c) {
            let mut out = Vec::new();
            for d in decomposed {
                let ces = match self.lookup(&[d]) {
                    Some(ces) => ces.to_vec(),
                    None => self.fallback_ces(d),
                };
                for ce in ces {
                    let t = tertiary(ce);
                    let raised = (t & CASE_MASK) | variant_tertiary(t);
                    out.push(make_ce(primary(ce), secondary(ce), raised));
                }
            }
            return out;
        }

        if normalize::combining_class(c) != 0 {
            return vec![make_ce(0, GENERIC_MARK_SECONDARY, T_COMMON)];
        }

        vec![make_ce(implicit_primary(c), COMMON_WEIGHT16, T_COMMON)]
    }

    /// Root CEs of a string, decomposed, without contraction matching.
    pub fn ces_for_str(&self, s: &str) -> Vec<Ce> {
        let mut out = Vec::new();
        for c in normalize::nfd(s) {
            match self.lookup(&[c]) {
                Some(ces) => out.extend_from_slice(ces),
                None => out.extend(self.fallback_ces(c)),
            }
        }
        out
    }

    pub fn digit_value(&self, c: char) -> Option<u8> {
        props::decimal_digit_value(c)
    }

    //
    // Groups
    //

    pub fn groups(&self) -> &[ReorderGroup] {
        &self.groups
    }

    pub fn group_for_primary(&self, p: u32) -> Option<&ReorderGroup> {
        self.groups.iter().find(|g| g.contains_primary(p))
    }

    pub fn group_for_code(&self, code: ReorderCode) -> Option<&ReorderGroup> {
        self.groups.iter().find(|g| g.codes.contains(&code))
    }

    pub fn is_compressible(&self, lead: u8) -> bool {
        (FIRST_COMPRESSIBLE_LEAD..=LAST_COMPRESSIBLE_LEAD).contains(&lead)
    }

    //
    // Neighbouring weights
    //

    pub fn primary_after(&self, p: u32) -> u32 {
        let lead = lead_byte(p);
        if is_implicit_lead(lead) {
            let scheme = ImplicitScheme::for_lead(lead);
            return scheme.encode(scheme.decode(p) + 1);
        }
        self.primaries
            .range((Excluded(p), Unbounded))
            .next()
            .copied()
            .unwrap_or(0xFFFF_FFFF)
    }

    pub fn primary_before(&self, p: u32) -> Option<u32> {
        let lead = lead_byte(p);
        if is_implicit_lead(lead) {
            let scheme = ImplicitScheme::for_lead(lead);
            let n = scheme.decode(p);
            if n > 0 {
                return Some(scheme.encode(n - 1));
            }
        }
        self.primaries.range(..p).next_back().copied()
    }

    fn secondary_set(&self, p: u32) -> Option<&BTreeSet<u16>> {
        self.secondaries.get(&p)
    }

    pub fn secondary_after(&self, p: u32, s: u16) -> u32 {
        match self.secondary_set(p) {
            Some(set) => set
                .range((Excluded(s), Unbounded))
                .next()
                .map_or(SECONDARY_LIMIT, |&w| u32::from(w)),
            None if s < COMMON_WEIGHT16 && p != 0 => u32::from(COMMON_WEIGHT16),
            None => SECONDARY_LIMIT,
        }
    }

    pub fn secondary_before(&self, p: u32, s: u16) -> u16 {
        match self.secondary_set(p) {
            Some(set) => set.range(..s).next_back().copied().unwrap_or(BEFORE_WEIGHT16),
            None => BEFORE_WEIGHT16,
        }
    }

    pub fn tertiary_after(&self, p: u32, s: u16, t: u16) -> u32 {
        let t = t & ONLY_TERTIARY_MASK;
        match self.tertiaries.get(&(p, s)) {
            Some(set) => set
                .range((Excluded(t), Unbounded))
                .next()
                .map_or(TERTIARY_LIMIT, |&w| u32::from(w)),
            None if t < T_COMMON => u32::from(T_COMMON),
            None => TERTIARY_LIMIT,
        }
    }

    pub fn tertiary_before(&self, p: u32, s: u16, t: u16) -> u16 {
        let t = t & ONLY_TERTIARY_MASK;
        match self.tertiaries.get(&(p, s)) {
            Some(set) => set.range(..t).next_back().copied().unwrap_or(BEFORE_WEIGHT16),
            None => BEFORE_WEIGHT16,
        }
    }

    pub fn is_root_secondary(&self, p: u32, s: u16) -> bool {
        match self.secondary_set(p) {
            Some(set) => set.contains(&s),
            None => p != 0 && s == COMMON_WEIGHT16,
        }
    }

    /// The root CE at a special reset position.
    pub fn special_ce(&self, pos: SpecialPosition) -> Result<Ce> {
        let group_ce = |code: ReorderCode, first: bool| -> Option<Ce> {
            let g = self.group_for_code(code)?;
            let p = if first {
                self.primary_after(g.first_primary)
            } else {
                let limit = make_primary(g.last_lead + 1, 0);
                self.primaries.range(..limit).next_back().copied()?
            };
            Some(make_ce(p, COMMON_WEIGHT16, T_COMMON))
        };
        let ce = match pos {
            SpecialPosition::FirstTertiaryIgnorable
            | SpecialPosition::LastTertiaryIgnorable
            | SpecialPosition::FirstSecondaryIgnorable
            | SpecialPosition::LastSecondaryIgnorable => Some(0),
            SpecialPosition::FirstPrimaryIgnorable => self
                .secondary_set(0)
                .and_then(|set| set.iter().next())
                .map(|&s| make_ce(0, s, T_COMMON)),
            SpecialPosition::LastPrimaryIgnorable => self
                .secondary_set(0)
                .and_then(|set| set.iter().next_back())
                .map(|&s| make_ce(0, s, T_COMMON)),
            SpecialPosition::FirstVariable => group_ce(ReorderCode::Space, true),
            SpecialPosition::LastVariable => group_ce(ReorderCode::Punctuation, false),
            SpecialPosition::FirstRegular => group_ce(ReorderCode::Symbol, true),
            SpecialPosition::LastRegular => Some(self.last_regular),
            SpecialPosition::FirstImplicit => Some(make_ce(
                implicit_primary('\u{4E00}'),
                COMMON_WEIGHT16,
                T_COMMON,
            )),
            SpecialPosition::FirstTrailing => self.lookup(&['\u{FFFD}']).map(|ces| ces[0]),
            SpecialPosition::LastImplicit | SpecialPosition::LastTrailing => None,
        };
        ce.ok_or_else(|| {
            CollationError::syntax(0, format!("reset to [{}] is not supported", pos.name()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(c: char) -> u32 {
        primary(ROOT.lookup(&[c]).unwrap()[0])
    }

    #[test]
    fn letters_follow_script_order() {
        assert!(p('a') < p('b'));
        assert!(p('z') < p('α'));
        assert!(p('ω') < p('а'));
        assert!(p('я') < p('א'));
        assert!(p('あ') < p('\u{10980}'));
        assert_eq!(p('a'), p('A'));
        assert_eq!(p('σ'), p('ς'));
        assert_eq!(p('か'), p('カ'));
        assert_eq!(p('ぁ'), p('あ'));
    }

    #[test]
    fn variable_groups_precede_digits_and_letters() {
        assert!(p(' ') < p('-'));
        assert!(p('-') < p('©'));
        assert!(p('©') < p('$'));
        assert!(p('$') < p('0'));
        assert!(p('9') < p('a'));
        assert_eq!(p('0'), p('\u{0660}'));
    }

    #[test]
    fn every_lead_has_fixed_length_weights() {
        let mut lengths: HashMap<u8, usize> = HashMap::new();
        for ces in ROOT.mappings.values() {
            for &ce in ces {
                let pr = primary(ce);
                if pr == 0 {
                    continue;
                }
                let len = weight_length(pr);
                let prev = *lengths.entry(lead_byte(pr)).or_insert(len);
                assert_eq!(prev, len, "mixed lengths on lead {:#x}", lead_byte(pr));
            }
        }
    }

    #[test]
    fn compatibility_characters_take_variant_tertiaries() {
        let ces = ROOT.fallback_ces('\u{FF41}');
        assert_eq!(primary(ces[0]), p('a'));
        assert_eq!(tertiary_weight(ces[0]), T_VARIANT);
        let upper = ROOT.fallback_ces('\u{FF21}');
        assert_eq!(tertiary_weight(upper[0]), T_UPPER_VARIANT);
        assert_eq!(case_value(upper[0]), 2);
    }

    #[test]
    fn implicit_primaries_order_han_before_unassigned() {
        let han = implicit_primary('\u{4E00}');
        let ext_a = implicit_primary('\u{3400}');
        let ext_b = implicit_primary('\u{20000}');
        let other = implicit_primary('\u{0E01}');
        assert!(han < ext_a && ext_a < ext_b && ext_b < other);
        assert_eq!(lead_byte(han), HAN_LEAD);
        let before = ROOT.primary_before(ext_b).unwrap();
        assert_eq!(ROOT.primary_after(before), ext_b);
        assert_eq!(ROOT.primary_after(han), implicit_primary('\u{4E01}'));
        // Neighbouring ideographs leave room for a tailored weight
        assert_eq!(implicit_primary('\u{4E01}') - han, 0x200);
    }

    #[test]
    fn neighbour_queries() {
        assert_eq!(ROOT.primary_after(p('a')), p('æ'));
        assert_eq!(ROOT.primary_before(p('b')), Some(p('æ')));
        let pa = p('a');
        assert_eq!(ROOT.tertiary_after(pa, COMMON_WEIGHT16, T_COMMON), u32::from(T_VARIANT));
        assert_eq!(ROOT.secondary_after(pa, COMMON_WEIGHT16), SECONDARY_LIMIT);
        assert!(ROOT.special_ce(SpecialPosition::LastImplicit).is_err());
        assert_eq!(
            primary(ROOT.special_ce(SpecialPosition::LastRegular).unwrap()),
            p('\u{109B7}')
        );
    }

    #[test]
    fn script_boundaries_are_contractions() {
        let key = [SCRIPT_BOUNDARY_CHAR, 'a'];
        let boundary = primary(ROOT.lookup(&key).unwrap()[0]);
        assert!(boundary < p('a'));
        assert!(boundary > p('9'));
        assert!(ROOT.is_contraction_prefix(&[SCRIPT_BOUNDARY_CHAR]));
        assert_eq!(ROOT.contractions_starting_with(SCRIPT_BOUNDARY_CHAR).len(), ROOT.groups().len());
    }
}
