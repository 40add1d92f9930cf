//! Allocation of tailored weights inside a gap between two existing weights.
//!
//! Weights are handled as left-aligned `u32` values. Primaries use all four
//! bytes; 16-bit secondaries and tertiaries occupy bytes 3 and 4 only.

use std::cmp::Ordering;

use crate::error::{CollationError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct WeightRange {
    start: u32,
    end: u32,
    length: usize,
    count: u32,
}

impl WeightRange {
    const EMPTY: WeightRange = WeightRange {
        start: 0,
        end: 0,
        length: 0,
        count: 0,
    };
}

#[derive(Clone, Debug)]
pub struct WeightAllocator {
    middle_length: usize,
    min_length: usize,
    min_bytes: [u32; 5],
    max_bytes: [u32; 5],
    ranges: Vec<WeightRange>,
    range_index: usize,
}

//
// Byte helpers
//

fn shift_for(idx: usize) -> u32 {
    8 * (4 - idx as u32)
}

fn weight_byte(weight: u32, idx: usize) -> u32 {
    if idx == 0 {
        return 0;
    }
    (weight >> shift_for(idx)) & 0xFF
}

fn set_weight_byte(weight: u32, idx: usize, byte: u32) -> u32 {
    let shift = shift_for(idx);
    (weight & !(0xFF << shift)) | (byte << shift)
}

fn truncate_weight(weight: u32, length: usize) -> u32 {
    if length == 0 {
        0
    } else {
        weight & (u32::MAX << shift_for(length))
    }
}

fn inc_weight_trail(weight: u32, length: usize) -> u32 {
    weight.wrapping_add(1 << shift_for(length))
}

fn dec_weight_trail(weight: u32, length: usize) -> u32 {
    weight.wrapping_sub(1 << shift_for(length))
}

fn set_weight_trail(weight: u32, length: usize, trail: u32) -> u32 {
    let shift = shift_for(length);
    let keep = if length == 1 { 0 } else { 0xFFFF_FF00_u32 << shift };
    (weight & keep) | (trail << shift)
}

pub(crate) fn length_of_weight(weight: u32) -> usize {
    crate::ce::weight_length(weight)
}

impl WeightAllocator {
    /// Primary weights. Compressible lead bytes restrict the second byte so
    /// that the key writer's compression sentinels never occur.
    pub fn for_primary(compressible: bool) -> Self {
        let (min2, max2) = if compressible { (4, 0xFE) } else { (2, 0xFF) };
        Self {
            middle_length: 1,
            min_length: 2,
            min_bytes: [0, 3, min2, 2, 2],
            max_bytes: [0, 0xFF, max2, 0xFF, 0xFF],
            ranges: Vec::new(),
            range_index: 0,
        }
    }

    pub fn for_secondary() -> Self {
        Self {
            middle_length: 3,
            min_length: 3,
            min_bytes: [0, 0, 0, 2, 2],
            max_bytes: [0, 0, 0, 0xFF, 0xFF],
            ranges: Vec::new(),
            range_index: 0,
        }
    }

    pub fn for_tertiary() -> Self {
        Self {
            middle_length: 3,
            min_length: 3,
            min_bytes: [0, 0, 0, 2, 2],
            max_bytes: [0, 0, 0, 0x3F, 0x3F],
            ranges: Vec::new(),
            range_index: 0,
        }
    }

    fn count_bytes(&self, idx: usize) -> u32 {
        self.max_bytes[idx] - self.min_bytes[idx] + 1
    }

    fn inc_weight(&self, mut weight: u32, mut length: usize) -> u32 {
        loop {
            let byte = weight_byte(weight, length);
            if byte < self.max_bytes[length] {
                return set_weight_byte(weight, length, byte + 1);
            }
            // Roll over and carry into the previous byte
            weight = set_weight_byte(weight, length, self.min_bytes[length]);
            length -= 1;
        }
    }

    fn inc_weight_by_offset(&self, mut weight: u32, mut length: usize, mut offset: u32) -> u32 {
        loop {
            offset += weight_byte(weight, length);
            if offset <= self.max_bytes[length] {
                return set_weight_byte(weight, length, offset);
            }
            offset -= self.min_bytes[length];
            weight = set_weight_byte(
                weight,
                length,
                self.min_bytes[length] + offset % self.count_bytes(length),
            );
            offset /= self.count_bytes(length);
            length -= 1;
        }
    }

    fn lengthen_range(&self, range: &mut WeightRange) {
        let length = range.length + 1;
        range.start = set_weight_trail(range.start, length, self.min_bytes[length]);
        range.end = set_weight_trail(range.end, length, self.max_bytes[length]);
        range.count *= self.count_bytes(length);
        range.length = length;
    }

    /// Splits the open interval (lower, upper) into ranges of equal-length weights.
    fn weight_ranges(&mut self, lower_limit: u32, upper_limit: u32) -> bool {
        let lower_length = length_of_weight(lower_limit);
        let upper_length = length_of_weight(upper_limit);
        if lower_limit >= upper_limit {
            return false;
        }
        if lower_length < upper_length && lower_limit == truncate_weight(upper_limit, lower_length)
        {
            return false;
        }

        let middle_length = self.middle_length;
        let mut lower = [WeightRange::EMPTY; 5];
        let mut upper = [WeightRange::EMPTY; 5];
        let mut middle = WeightRange::EMPTY;

        let mut weight = lower_limit;
        let mut length = lower_length;
        while length > middle_length {
            let trail = weight_byte(weight, length);
            if trail < self.max_bytes[length] {
                lower[length] = WeightRange {
                    start: inc_weight_trail(weight, length),
                    end: set_weight_trail(weight, length, self.max_bytes[length]),
                    length,
                    count: self.max_bytes[length] - trail,
                };
            }
            weight = truncate_weight(weight, length - 1);
            length -= 1;
        }
        middle.start = if weight < 0xFF00_0000 {
            inc_weight_trail(weight, middle_length)
        } else {
            u32::MAX
        };

        weight = upper_limit;
        length = upper_length;
        while length > middle_length {
            let trail = weight_byte(weight, length);
            if trail > self.min_bytes[length] {
                upper[length] = WeightRange {
                    start: set_weight_trail(weight, length, self.min_bytes[length]),
                    end: dec_weight_trail(weight, length),
                    length,
                    count: trail - self.min_bytes[length],
                };
            }
            weight = truncate_weight(weight, length - 1);
            length -= 1;
        }
        middle.end = dec_weight_trail(weight, middle_length);
        middle.length = middle_length;

        if middle.start != u32::MAX && middle.end >= middle.start {
            middle.count = ((middle.end - middle.start) >> shift_for(middle_length)) + 1;
        } else {
            // No middle range: merge colliding or adjacent lower and upper ranges
            let mut length = 4;
            while length > middle_length {
                if lower[length].count > 0 && upper[length].count > 0 {
                    let start = upper[length].start;
                    let end = lower[length].end;
                    if end >= start || self.inc_weight(end, length) == start {
                        let start = lower[length].start;
                        let end = upper[length].end;
                        lower[length].end = end;
                        let trails = weight_byte(end, length) as i64
                            - weight_byte(start, length) as i64
                            + 1
                            + i64::from(self.count_bytes(length))
                                * (weight_byte(end, length - 1) as i64
                                    - weight_byte(start, length - 1) as i64);
                        lower[length].count = trails.max(0) as u32;
                        upper[length].count = 0;
                        length -= 1;
                        while length > middle_length {
                            lower[length].count = 0;
                            upper[length].count = 0;
                            length -= 1;
                        }
                        break;
                    }
                }
                length -= 1;
            }
        }

        self.ranges.clear();
        if middle.count > 0 {
            self.ranges.push(middle);
        }
        for length in middle_length + 1..=4 {
            // Upper first, so that the middle range tends to be used first
            if upper[length].count > 0 {
                self.ranges.push(upper[length]);
            }
            if lower[length].count > 0 {
                self.ranges.push(lower[length]);
            }
        }
        !self.ranges.is_empty()
    }

    fn alloc_in_short_ranges(&mut self, mut n: u32, min_length: usize) -> bool {
        let mut i = 0;
        while i < self.ranges.len() && self.ranges[i].length <= min_length + 1 {
            if n <= self.ranges[i].count {
                if self.ranges[i].length > min_length {
                    self.ranges[i].count = n;
                }
                self.ranges.truncate(i + 1);
                self.ranges.sort_by(|a, b| a.start.cmp(&b.start));
                return true;
            }
            n -= self.ranges[i].count;
            i += 1;
        }
        false
    }

    fn alloc_in_min_length_ranges(&mut self, n: u32, min_length: usize) -> bool {
        let min_length_count = self
            .ranges
            .iter()
            .take_while(|r| r.length == min_length)
            .count();
        let count: u32 = self.ranges[..min_length_count].iter().map(|r| r.count).sum();
        let next_count_bytes = self.count_bytes(min_length + 1);
        if u64::from(n) > u64::from(count) * u64::from(next_count_bytes) {
            return false;
        }

        let start = self.ranges[..min_length_count]
            .iter()
            .map(|r| r.start)
            .min()
            .unwrap_or(0);
        let end = self.ranges[..min_length_count]
            .iter()
            .map(|r| r.end)
            .max()
            .unwrap_or(0);

        // count1 weights at min_length, count2 lengthened ones
        let mut count2 = n.saturating_sub(count) / (next_count_bytes - 1);
        let mut count1 = count - count2;
        if count2 == 0 || count1 + count2 * next_count_bytes < n {
            count2 += 1;
            count1 -= 1;
        }

        let mut first = WeightRange {
            start,
            end,
            length: min_length,
            count,
        };
        if count1 == 0 {
            self.lengthen_range(&mut first);
            self.ranges = vec![first];
        } else {
            first.end = self.inc_weight_by_offset(start, min_length, count1 - 1);
            first.count = count1;
            let mut second = WeightRange {
                start: self.inc_weight(first.end, min_length),
                end,
                length: min_length,
                count: count2,
            };
            self.lengthen_range(&mut second);
            self.ranges = vec![first, second];
        }
        true
    }

    /// Prepares `n` weights strictly between `lower` and `upper`.
    pub fn allocate(&mut self, lower: u32, upper: u32, n: usize) -> Result<()> {
        let exhausted = || CollationError::AllocationExhausted {
            count: n,
            lower,
            upper,
        };
        self.range_index = 0;
        let Ok(n32) = u32::try_from(n) else {
            return Err(exhausted());
        };
        if n == 0 {
            self.ranges.clear();
            return Ok(());
        }
        if !self.weight_ranges(lower, upper) {
            return Err(exhausted());
        }

        loop {
            let min_length = self.ranges.iter().map(|r| r.length).min().unwrap_or(4);
            if min_length < self.min_length {
                self.lengthen_shortest(min_length);
                continue;
            }
            if self.alloc_in_short_ranges(n32, min_length) {
                break;
            }
            if min_length == 4 {
                return Err(exhausted());
            }
            if self.alloc_in_min_length_ranges(n32, min_length) {
                break;
            }
            self.lengthen_shortest(min_length);
        }
        Ok(())
    }

    fn lengthen_shortest(&mut self, min_length: usize) {
        let mut ranges = std::mem::take(&mut self.ranges);
        for range in ranges.iter_mut().filter(|r| r.length == min_length) {
            self.lengthen_range(range);
        }
        ranges.sort_by(|a, b| match a.length.cmp(&b.length) {
            Ordering::Equal => a.start.cmp(&b.start),
            other => other,
        });
        self.ranges = ranges;
    }

    /// The next allocated weight in ascending order, or `None` when used up.
    pub fn next_weight(&mut self) -> Option<u32> {
        let range = self.ranges.get_mut(self.range_index)?;
        let weight = range.start;
        range.count -= 1;
        if range.count == 0 {
            self.range_index += 1;
        } else {
            let length = range.length;
            let next = self.inc_weight(weight, length);
            self.ranges[self.range_index].start = next;
        }
        Some(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take_all(alloc: &mut WeightAllocator, n: usize) -> Vec<u32> {
        (0..n).map(|_| alloc.next_weight().unwrap()).collect()
    }

    #[test]
    fn primaries_fill_a_two_byte_gap() {
        let mut alloc = WeightAllocator::for_primary(true);
        alloc.allocate(0x1010_0000, 0x1014_0000, 3).unwrap();
        assert_eq!(
            take_all(&mut alloc, 3),
            [0x1011_0000, 0x1012_0000, 0x1013_0000]
        );
        assert_eq!(alloc.next_weight(), None);
    }

    #[test]
    fn primaries_lengthen_when_the_gap_is_small() {
        let mut alloc = WeightAllocator::for_primary(true);
        alloc.allocate(0x1010_0000, 0x1014_0000, 10).unwrap();
        let weights = take_all(&mut alloc, 10);
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
        assert!(weights.iter().all(|&w| w > 0x1010_0000 && w < 0x1014_0000));
        // Nothing may extend the lower bound
        assert!(weights.iter().all(|&w| w & 0xFFFF_0000 != 0x1010_0000));
    }

    #[test]
    fn primaries_are_at_least_two_bytes() {
        let mut alloc = WeightAllocator::for_primary(true);
        alloc.allocate(0x1EF0_0000, 0xE002_0300, 5).unwrap();
        for w in take_all(&mut alloc, 5) {
            assert!(length_of_weight(w) >= 2, "{:#x}", w);
            let second = (w >> 16) & 0xFF;
            assert!((4..=0xFE).contains(&second));
        }
    }

    #[test]
    fn secondaries_and_tertiaries() {
        let mut alloc = WeightAllocator::for_secondary();
        alloc.allocate(0x0500, 0x1000, 2).unwrap();
        assert_eq!(take_all(&mut alloc, 2), [0x0600, 0x0700]);

        let mut alloc = WeightAllocator::for_tertiary();
        alloc.allocate(0x0500, 0x0A00, 40).unwrap();
        let weights = take_all(&mut alloc, 40);
        assert!(weights.iter().all(|&w| w > 0x0500 && w < 0x0A00));
        assert!(weights.iter().all(|&w| w & 0xFF <= 0x3F));
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn allocation_fails_without_room() {
        let mut alloc = WeightAllocator::for_tertiary();
        assert!(matches!(
            alloc.allocate(0x0A00, 0x0500, 1),
            Err(CollationError::AllocationExhausted { .. })
        ));
        // A bound that prefixes the other leaves nothing in between
        let mut alloc = WeightAllocator::for_primary(false);
        assert!(alloc.allocate(0x0710_0000, 0x0710_0200, 1).is_err());
    }
}
