//! Packed collation elements.
//!
//! A CE is a `u64`: primary in the top 32 bits, then a 16-bit secondary and a
//! 16-bit tertiary. The tertiary's top two bits carry the case, the next six
//! bits the tertiary weight proper, and the low byte is only non-zero for
//! lengthened tailored weights.

pub type Ce = u64;

pub const LEVEL_SEPARATOR: u8 = 1;
pub const MERGE_SEPARATOR: u8 = 2;

pub const COMMON_WEIGHT16: u16 = 0x0500;
pub const COMMON_BYTE: u8 = 0x05;

/// Lower exclusive bound used when inserting before the first root weight.
pub const BEFORE_WEIGHT16: u16 = 0x0100;

/// Exclusive upper bounds for tailored weights with no root weight above them.
pub const SECONDARY_LIMIT: u32 = 0x10000;
pub const TERTIARY_LIMIT: u32 = 0x4000;

pub const CASE_MASK: u16 = 0xC000;
pub const ONLY_TERTIARY_MASK: u16 = 0x3FFF;

pub const LOWER_CASE: u16 = 0;
pub const MIXED_CASE: u16 = 0x4000;
pub const UPPER_CASE: u16 = 0x8000;

// Root tertiary weights, high byte only
pub const T_COMMON: u16 = 0x0500;
pub const T_VARIANT: u16 = 0x0A00;
pub const T_FINAL: u16 = 0x0C00;
pub const T_HIRA: u16 = 0x0800;
pub const T_KATA_SMALL: u16 = 0x0C00;
pub const T_KATA: u16 = 0x0E00;
pub const T_KATA_VARIANT: u16 = 0x1000;
pub const T_UPPER: u16 = 0x1800;
pub const T_UPPER_VARIANT: u16 = 0x1C00;

// Temp CEs only exist while a tailoring is being built. Their primary lead is
// the level separator, which no real weight uses.
const TEMP_LEAD: u32 = 0x0100_0000;

#[inline]
pub fn make_ce(primary: u32, secondary: u16, tertiary: u16) -> Ce {
    (u64::from(primary) << 32) | (u64::from(secondary) << 16) | u64::from(tertiary)
}

#[inline]
pub fn primary(ce: Ce) -> u32 {
    (ce >> 32) as u32
}

#[inline]
pub fn secondary(ce: Ce) -> u16 {
    (ce >> 16) as u16
}

/// Tertiary including the case bits.
#[inline]
pub fn tertiary(ce: Ce) -> u16 {
    ce as u16
}

#[inline]
pub fn tertiary_weight(ce: Ce) -> u16 {
    tertiary(ce) & ONLY_TERTIARY_MASK
}

/// 0 for lowercase or uncased, 1 for mixed, 2 for uppercase.
#[inline]
pub fn case_value(ce: Ce) -> u8 {
    (tertiary(ce) >> 14) as u8
}

#[inline]
pub fn with_case(ce: Ce, case: u16) -> Ce {
    (ce & !u64::from(CASE_MASK)) | u64::from(case & CASE_MASK)
}

#[inline]
pub fn lead_byte(p: u32) -> u8 {
    (p >> 24) as u8
}

pub fn temp_ce(node: usize) -> Ce {
    debug_assert!(node < 0x0100_0000);
    make_ce(TEMP_LEAD | node as u32, COMMON_WEIGHT16, T_COMMON)
}

#[inline]
pub fn is_temp_ce(ce: Ce) -> bool {
    primary(ce) & 0xFF00_0000 == TEMP_LEAD
}

#[inline]
pub fn temp_ce_index(ce: Ce) -> usize {
    (primary(ce) & 0x00FF_FFFF) as usize
}

/// Number of significant bytes in a 32-bit weight.
pub fn weight_length(weight: u32) -> usize {
    if weight & 0x00FF_FFFF == 0 {
        1
    } else if weight & 0xFFFF == 0 {
        2
    } else if weight & 0xFF == 0 {
        3
    } else {
        4
    }
}

/// Appends the significant bytes of a primary.
pub fn push_primary_bytes(p: u32, out: &mut Vec<u8>) {
    let bytes = p.to_be_bytes();
    out.extend_from_slice(&bytes[..weight_length(p)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ce_fields_round_trip() {
        let ce = make_ce(0x2010_0000, 0x4600, T_UPPER | UPPER_CASE);
        assert_eq!(primary(ce), 0x2010_0000);
        assert_eq!(secondary(ce), 0x4600);
        assert_eq!(tertiary_weight(ce), T_UPPER);
        assert_eq!(case_value(ce), 2);
        assert_eq!(case_value(with_case(ce, LOWER_CASE)), 0);
    }

    #[test]
    fn temp_ces_are_recognized() {
        let ce = temp_ce(1234);
        assert!(is_temp_ce(ce));
        assert_eq!(temp_ce_index(ce), 1234);
        assert!(!is_temp_ce(make_ce(0x2010_0000, COMMON_WEIGHT16, T_COMMON)));
    }

    #[test]
    fn weight_lengths() {
        assert_eq!(weight_length(0x2000_0000), 1);
        assert_eq!(weight_length(0x2010_0000), 2);
        assert_eq!(weight_length(0xE002_0300), 3);
        assert_eq!(weight_length(0x0F84_0B0D), 4);
        let mut out = Vec::new();
        push_primary_bytes(0xE002_0300, &mut out);
        assert_eq!(out, [0xE0, 0x02, 0x03]);
    }
}
