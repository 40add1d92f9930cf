//! Text to collation elements.
//!
//! Text is consumed in chunks. A chunk is one or more whole segments (a
//! starter plus the combining marks after it) that map to CEs together, so
//! chunk boundaries are stable no matter where reading started. Walking
//! backwards re-reads forward from a preceding safe boundary.

use std::sync::Arc;

use crate::ce::{self, Ce};
use crate::data::CollationData;
use crate::normalize;
use crate::root::{NUMERIC_LEAD, ROOT};

/// Longest run of digits encoded as one number.
const MAX_NUMERIC_DIGITS: usize = 254;

/// CEs of already-normalized text with default iteration settings.
pub(crate) fn ces_for_chars(data: &CollationData, chars: &[char]) -> Vec<Ce> {
    let mut out = Vec::new();
    ChunkReader::new(data, chars, false, true).read_all(&mut out);
    out
}

struct Units {
    chars: Vec<char>,
    /// Unit end and text end of every loaded segment.
    segments: Vec<(usize, usize)>,
    next: usize,
}

pub(crate) struct ChunkReader<'a> {
    data: &'a CollationData,
    text: &'a [char],
    numeric: bool,
    normalize: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a CollationData, text: &'a [char], numeric: bool, normalize: bool) -> Self {
        Self {
            data,
            text,
            numeric,
            normalize,
        }
    }

    pub fn read_all(&self, out: &mut Vec<Ce>) {
        let mut pos = 0;
        while pos < self.text.len() {
            pos = self.read_chunk(pos, out);
        }
    }

    /// Appends the CEs of the chunk starting at `start`; returns its end.
    pub fn read_chunk(&self, start: usize, out: &mut Vec<Ce>) -> usize {
        let mut units = Units {
            chars: Vec::new(),
            segments: Vec::new(),
            next: start,
        };
        if !self.ensure(&mut units, 0) {
            return start;
        }
        let before = self.context_before(start);
        let mut consumed = Vec::new();

        let last = self.match_at(&mut units, 0, usize::MAX, &mut consumed, &before, out);
        let (unit_end, text_end) = units
            .segments
            .iter()
            .copied()
            .find(|&(end, _)| end > last)
            .unwrap_or((units.chars.len(), units.next));

        // Whatever the first match skipped inside the chunk
        for i in 1..unit_end {
            if !is_consumed(&consumed, i) {
                self.match_at(&mut units, i, unit_end, &mut consumed, &before, out);
            }
        }
        text_end
    }

    //
    // Segments
    //

    fn segment_end(&self, start: usize) -> usize {
        let mut end = start + 1;
        while end < self.text.len() && normalize::lead_ccc(self.text[end]) != 0 {
            end += 1;
        }
        end
    }

    fn load_segment(&self, units: &mut Units) -> bool {
        if units.next >= self.text.len() {
            return false;
        }
        let start = units.next;
        let end = self.segment_end(start);
        let segment = &self.text[start..end];
        if self.normalize && !normalize::is_fcd(segment) {
            units.chars.extend(normalize::nfd_chars(segment));
        } else {
            for &c in segment {
                if self.data.has_direct_mapping(c) || !normalize::has_canonical_decomposition(c) {
                    units.chars.push(c);
                } else {
                    units.chars.extend(normalize::decompose_canonical(c));
                }
            }
        }
        units.segments.push((units.chars.len(), end));
        units.next = end;
        true
    }

    fn ensure(&self, units: &mut Units, idx: usize) -> bool {
        while units.chars.len() <= idx {
            if !self.load_segment(units) {
                return false;
            }
        }
        true
    }

    /// Decomposed text before `start`, long enough for any prefix condition.
    fn context_before(&self, start: usize) -> Vec<char> {
        if !self.data.has_prefix_mappings() {
            return Vec::new();
        }
        let from = start.saturating_sub(self.data.max_prefix_len());
        normalize::nfd_chars(&self.text[from..start])
    }

    //
    // Matching
    //

    fn lookup(&self, key: &[char], before: &[char], units: &Units, pos: usize) -> Option<&'a [Ce]> {
        if self.data.has_prefix_mappings() {
            let mut context = before.to_vec();
            context.extend_from_slice(&units.chars[..pos]);
            self.data.lookup(key, &context)
        } else {
            self.data.lookup(key, &[])
        }
    }

    /// Maps the longest match starting at unit `i`. Returns the index of the
    /// last unit it consumed.
    fn match_at(
        &self,
        units: &mut Units,
        i: usize,
        limit: usize,
        consumed: &mut Vec<bool>,
        before: &[char],
        out: &mut Vec<Ce>,
    ) -> usize {
        let c = units.chars[i];

        if self.numeric && self.data.numeric_digit(c).is_some() {
            let mut digits = Vec::new();
            let mut j = i;
            while j < limit && self.ensure(units, j) && !is_consumed(consumed, j) {
                match self.data.numeric_digit(units.chars[j]) {
                    Some(d) => digits.push(d),
                    None => break,
                }
                mark_consumed(consumed, j);
                j += 1;
            }
            append_numeric_ces(&digits, out);
            return j - 1;
        }

        // Contiguous match
        let mut key = vec![c];
        let mut positions = vec![i];
        let mut best = self.lookup(&key, before, units, i).map(|ces| (1, ces));
        let mut j = i + 1;
        while self.data.is_contraction_prefix(&key) {
            while j < limit && self.ensure(units, j) && is_consumed(consumed, j) {
                j += 1;
            }
            if j >= limit || !self.ensure(units, j) {
                break;
            }
            key.push(units.chars[j]);
            positions.push(j);
            j += 1;
            if let Some(ces) = self.lookup(&key, before, units, i) {
                best = Some((key.len(), ces));
            }
        }
        let matched = best.map_or(1, |(len, _)| len);
        key.truncate(matched);
        positions.truncate(matched);
        let mut found = best.map(|(_, ces)| ces);

        // Discontiguous match over unblocked combining marks
        if found.is_some() && self.data.is_contraction_prefix(&key) {
            let mut k = positions[matched - 1] + 1;
            let mut max_skipped = 0;
            while k < limit && self.ensure(units, k) {
                if is_consumed(consumed, k) {
                    k += 1;
                    continue;
                }
                let ccc = normalize::combining_class(units.chars[k]);
                if ccc == 0 {
                    break;
                }
                if max_skipped < ccc {
                    key.push(units.chars[k]);
                    if let Some(ces) = self.lookup(&key, before, units, i) {
                        found = Some(ces);
                        positions.push(k);
                        k += 1;
                        continue;
                    }
                    key.pop();
                }
                max_skipped = max_skipped.max(ccc);
                k += 1;
            }
        }

        for &p in &positions {
            mark_consumed(consumed, p);
        }
        match found {
            Some(ces) => out.extend_from_slice(ces),
            None => out.extend(ROOT.fallback_ces(c)),
        }
        positions[positions.len() - 1]
    }

    //
    // Boundaries
    //

    /// The last position at or before `pos` where a chunk must start.
    pub fn safe_start(&self, pos: usize) -> usize {
        let mut k = pos.min(self.text.len().saturating_sub(1));
        while k > 0 && self.data.is_unsafe_backward(self.text[k], self.numeric) {
            k -= 1;
        }
        k
    }

    /// The start of the chunk containing `pos`.
    pub fn chunk_start_containing(&self, pos: usize) -> usize {
        let mut start = self.safe_start(pos);
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            let end = self.read_chunk(start, &mut scratch);
            if end > pos || end == start {
                return start;
            }
            start = end;
        }
    }
}

/// Forward CEs read on demand and kept for later levels.
pub(crate) struct CeBuffer<'a> {
    reader: ChunkReader<'a>,
    pos: usize,
    ces: Vec<Ce>,
}

impl<'a> CeBuffer<'a> {
    pub fn new(reader: ChunkReader<'a>) -> Self {
        Self {
            reader,
            pos: 0,
            ces: Vec::new(),
        }
    }

    pub fn get(&mut self, i: usize) -> Option<Ce> {
        while self.ces.len() <= i {
            if self.pos >= self.reader.text.len() {
                return None;
            }
            self.pos = self.reader.read_chunk(self.pos, &mut self.ces);
        }
        Some(self.ces[i])
    }

    pub fn finish(&mut self) {
        let rest = self.reader.text.len();
        while self.pos < rest {
            self.pos = self.reader.read_chunk(self.pos, &mut self.ces);
        }
    }

    pub fn ces(&self) -> &[Ce] {
        &self.ces
    }
}

fn is_consumed(consumed: &[bool], i: usize) -> bool {
    consumed.get(i).copied().unwrap_or(false)
}

fn mark_consumed(consumed: &mut Vec<bool>, i: usize) {
    if consumed.len() <= i {
        consumed.resize(i + 1, false);
    }
    consumed[i] = true;
}

//
// Numeric collation
//

fn append_numeric_ces(digits: &[u8], out: &mut Vec<Ce>) {
    let mut pos = 0;
    loop {
        while pos + 1 < digits.len() && digits[pos] == 0 {
            pos += 1;
        }
        let len = (digits.len() - pos).min(MAX_NUMERIC_DIGITS);
        append_numeric_segment(&digits[pos..pos + len], out);
        pos += len;
        if pos >= digits.len() {
            break;
        }
    }
}

fn numeric_ce(p: u32) -> Ce {
    ce::make_ce(p, ce::COMMON_WEIGHT16, ce::T_COMMON)
}

/// Encodes one run of at most 254 digits without leading zeros.
///
/// Second primary bytes 2..75 hold 0..73 in two bytes, 76..115 hold numbers
/// up to 10233 in three bytes, 116..131 numbers up to 1042489 in four bytes.
/// Larger numbers use 132 plus the digit-pair count, then one byte per pair.
fn append_numeric_segment(digits: &[u8], out: &mut Vec<Ce>) {
    let base = u32::from(NUMERIC_LEAD) << 24;
    let mut length = digits.len();

    if length <= 7 {
        let mut value = digits.iter().fold(0u32, |v, &d| v * 10 + u32::from(d));
        let mut first = 2;
        let mut count = 74;
        if value < count {
            out.push(numeric_ce(base | ((first + value) << 16)));
            return;
        }
        value -= count;
        first += count;
        count = 40;
        if value < count * 254 {
            out.push(numeric_ce(base | ((first + value / 254) << 16) | ((2 + value % 254) << 8)));
            return;
        }
        value -= count * 254;
        first += count;
        count = 16;
        if value < count * 254 * 254 {
            let mut p = base | (2 + value % 254);
            value /= 254;
            p |= (2 + value % 254) << 8;
            value /= 254;
            p |= (first + value % 254) << 16;
            out.push(numeric_ce(p));
            return;
        }
    }

    let pairs = (length as u32 + 1) / 2;
    let mut p = base | ((132 - 4 + pairs) << 16);
    while digits[length - 1] == 0 && digits[length - 2] == 0 {
        length -= 2;
    }
    let (mut pair, mut pos) = if length & 1 == 1 {
        (u32::from(digits[0]), 1)
    } else {
        (u32::from(digits[0]) * 10 + u32::from(digits[1]), 2)
    };
    pair = 11 + 2 * pair;
    let mut shift = 8;
    while pos < length {
        if shift == 0 {
            p |= pair;
            out.push(numeric_ce(p));
            p = base;
            shift = 16;
        } else {
            p |= pair << shift;
            shift -= 8;
        }
        pair = 11 + 2 * (u32::from(digits[pos]) * 10 + u32::from(digits[pos + 1]));
        pos += 2;
    }
    p |= (pair - 1) << shift;
    out.push(numeric_ce(p));
}

//
// Public iterator
//

/// Steps through the collation elements of a string in either direction.
///
/// Offsets are code point indices into the text. They only ever land on
/// chunk boundaries: a contraction, a digit run in numeric mode, or a
/// character with its combining marks is never split.
#[derive(Clone, Debug)]
pub struct CollationElementIterator {
    data: Arc<CollationData>,
    numeric: bool,
    normalize: bool,
    text: Vec<char>,
    ces: Vec<Ce>,
    index: usize,
    start: usize,
    end: usize,
    /// Chunks found while walking backwards, nearest last.
    back: Vec<(usize, usize, Vec<Ce>)>,
}

impl CollationElementIterator {
    pub(crate) fn new(data: Arc<CollationData>, numeric: bool, normalize: bool, text: &str) -> Self {
        Self {
            data,
            numeric,
            normalize,
            text: text.chars().collect(),
            ces: Vec::new(),
            index: 0,
            start: 0,
            end: 0,
            back: Vec::new(),
        }
    }

    fn reader(&self) -> ChunkReader<'_> {
        ChunkReader::new(&self.data, &self.text, self.numeric, self.normalize)
    }

    /// The previous CE, or `None` at the start of the text.
    pub fn previous(&mut self) -> Option<Ce> {
        loop {
            if self.index > 0 {
                self.index -= 1;
                return Some(self.ces[self.index]);
            }
            if self.start == 0 {
                return None;
            }
            let (start, ces) = self.chunk_before(self.start);
            self.end = self.start;
            self.start = start;
            self.ces = ces;
            self.index = self.ces.len();
        }
    }

    fn chunk_before(&mut self, end: usize) -> (usize, Vec<Ce>) {
        if let Some((start, chunk_end, _)) = self.back.last() {
            if *chunk_end == end {
                let start = *start;
                let ces = self.back.pop().map(|(_, _, ces)| ces).unwrap_or_default();
                return (start, ces);
            }
        }
        self.back.clear();

        let reader = self.reader();
        let mut pos = reader.safe_start(end - 1);
        let mut chunks = Vec::new();
        while pos < end {
            let mut ces = Vec::new();
            let next = reader.read_chunk(pos, &mut ces);
            chunks.push((pos, next, ces));
            pos = next;
        }
        let (start, _, ces) = chunks.pop().unwrap_or((0, end, Vec::new()));
        self.back = chunks;
        (start, ces)
    }

    /// Moves back to the start of the text.
    pub fn reset(&mut self) {
        self.ces.clear();
        self.index = 0;
        self.start = 0;
        self.end = 0;
        self.back.clear();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.reset();
    }

    /// Current position in code points.
    pub fn offset(&self) -> usize {
        if self.index == 0 {
            self.start
        } else {
            self.end
        }
    }

    /// Positions the iterator at the chunk boundary at or before `offset`.
    pub fn set_offset(&mut self, offset: usize) {
        let pos = if offset >= self.text.len() {
            self.text.len()
        } else {
            self.reader().chunk_start_containing(offset)
        };
        self.reset();
        self.start = pos;
        self.end = pos;
    }

    /// Length of the longest expansion that ends with `ce`.
    pub fn max_expansion(&self, ce: Ce) -> usize {
        self.data.max_expansion(ce)
    }

    pub fn primary_order(ce: Ce) -> u32 {
        ce::primary(ce)
    }

    pub fn secondary_order(ce: Ce) -> u16 {
        ce::secondary(ce)
    }

    pub fn tertiary_order(ce: Ce) -> u16 {
        ce::tertiary(ce)
    }
}

impl Iterator for CollationElementIterator {
    type Item = Ce;

    fn next(&mut self) -> Option<Ce> {
        loop {
            if self.index < self.ces.len() {
                self.index += 1;
                return Some(self.ces[self.index - 1]);
            }
            if self.end >= self.text.len() {
                return None;
            }
            let mut ces = Vec::new();
            let end = self.reader().read_chunk(self.end, &mut ces);
            self.start = self.end;
            self.end = end;
            self.ces = ces;
            self.index = 0;
        }
    }
}
