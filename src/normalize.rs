use unicode_normalization::char as uchar;
use unicode_normalization::UnicodeNormalization;

/// Normalization queries the collation engine depends on.
pub trait Normalizer {
    fn decompose(&self, c: char) -> Vec<char>;

    fn combining_class(&self, c: char) -> u8;

    fn compose(&self, s: &str) -> String;

    /// Combining class of the first code point of the NFD form.
    fn lead_ccc(&self, c: char) -> u8 {
        self.decompose(c)
            .first()
            .map_or(0, |&d| self.combining_class(d))
    }

    /// Combining class of the last code point of the NFD form.
    fn trail_ccc(&self, c: char) -> u8 {
        self.decompose(c)
            .last()
            .map_or(0, |&d| self.combining_class(d))
    }

    /// True if the text passes the FCD test: no canonical reordering is
    /// needed between adjacent decompositions.
    fn is_fcd(&self, s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        fcd_chars(self, &chars)
    }
}

fn fcd_chars<N: Normalizer + ?Sized>(normalizer: &N, chars: &[char]) -> bool {
    let mut prev_trail = 0;
    for &c in chars {
        let lead = normalizer.lead_ccc(c);
        if lead != 0 && prev_trail > lead {
            return false;
        }
        prev_trail = normalizer.trail_ccc(c);
    }
    true
}

/// Normalization backed by the `unicode-normalization` tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeNormalizer;

impl Normalizer for UnicodeNormalizer {
    fn decompose(&self, c: char) -> Vec<char> {
        let mut out = Vec::with_capacity(3);
        uchar::decompose_canonical(c, |d| out.push(d));
        out
    }

    #[inline]
    fn combining_class(&self, c: char) -> u8 {
        uchar::canonical_combining_class(c)
    }

    fn compose(&self, s: &str) -> String {
        s.nfc().collect()
    }
}

#[inline]
pub fn combining_class(c: char) -> u8 {
    UnicodeNormalizer.combining_class(c)
}

pub fn decompose_canonical(c: char) -> Vec<char> {
    UnicodeNormalizer.decompose(c)
}

/// The NFKD form of one code point, or `None` if it has no compatibility mapping.
pub fn decompose_compatible(c: char) -> Option<Vec<char>> {
    let mut out = Vec::with_capacity(3);
    uchar::decompose_compatible(c, |d| out.push(d));
    if out.len() == 1 && out[0] == c {
        None
    } else {
        Some(out)
    }
}

pub fn has_canonical_decomposition(c: char) -> bool {
    let mut changed = false;
    uchar::decompose_canonical(c, |d| changed |= d != c);
    changed
}

pub fn lead_ccc(c: char) -> u8 {
    UnicodeNormalizer.lead_ccc(c)
}

pub fn trail_ccc(c: char) -> u8 {
    UnicodeNormalizer.trail_ccc(c)
}

pub fn is_fcd(chars: &[char]) -> bool {
    fcd_chars(&UnicodeNormalizer, chars)
}

pub fn nfd(s: &str) -> Vec<char> {
    s.nfd().collect()
}

pub fn nfd_chars(chars: &[char]) -> Vec<char> {
    chars.iter().copied().nfd().collect()
}

pub fn nfkd(s: &str) -> String {
    s.nfkd().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fcd_detection() {
        // a + dot below + ring: canonical order
        assert!(is_fcd(&['a', '\u{0323}', '\u{030A}']));
        // å precomposed followed by dot below is out of order
        assert!(!is_fcd(&['\u{00E5}', '\u{0323}']));
        assert!(is_fcd(&['\u{00E5}', 'b']));
    }

    #[test]
    fn lead_and_trail_classes() {
        assert_eq!(lead_ccc('\u{00E5}'), 0);
        assert_eq!(trail_ccc('\u{00E5}'), 230);
        assert_eq!(lead_ccc('\u{0344}'), 230);
    }

    #[test]
    fn decompositions() {
        assert_eq!(decompose_canonical('\u{00E9}'), ['e', '\u{0301}']);
        assert_eq!(decompose_canonical('가'), ['\u{1100}', '\u{1161}']);
        assert_eq!(decompose_compatible('\u{FF21}'), Some(vec!['A']));
        assert_eq!(decompose_compatible('a'), None);
        assert!(has_canonical_decomposition('\u{00C5}'));
        assert!(!has_canonical_decomposition('a'));
        assert_eq!(UnicodeNormalizer.compose("e\u{0301}"), "\u{00E9}");
        assert!(!UnicodeNormalizer.is_fcd("\u{00E5}\u{0323}"));
    }
}
