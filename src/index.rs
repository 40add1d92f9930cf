//! Alphabetic index: labelled buckets for a sorted list of names, as used
//! for the side index of a contact list.
//!
//! Labels come from the locale (or from a Chinese tailoring's index
//! contractions), are ordered and deduplicated by primary weight, and are
//! grouped by script. Between labels of non-adjacent scripts an inflow
//! bucket catches everything from the scripts in between; names before the
//! first label go to underflow, names after the last label's script go to
//! overflow.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use crate::collator::{Collator, Freezable, RuleBasedCollator};
use crate::error::{CollationError, Result};
use crate::locale::LocaleId;
use crate::locale_data::LocaleData;
use crate::normalize;
use crate::props::{CharProperties, GeneralCategory, UnicodeProperties};
use crate::registry::CollatorRegistry;
use crate::root::SCRIPT_BOUNDARY_CHAR;
use crate::ce::primary;
use crate::Strength;

const DEFAULT_LABEL: &str = "\u{2026}";
const DEFAULT_INFLOW_LABEL: &str = "\u{22EF}";
const DEFAULT_MAX_LABEL_COUNT: usize = 99;

/// Prefix of the index contractions in Chinese tailorings.
const INDEX_BASE: char = '\u{FDD0}';
const CGJ: char = '\u{034F}';
const STROKE_SUFFIX: char = '\u{5283}';

const HANGUL_LABELS: [char; 14] = [
    '\u{AC00}', '\u{B098}', '\u{B2E4}', '\u{B77C}', '\u{B9C8}', '\u{BC14}', '\u{C0AC}', '\u{C544}',
    '\u{C790}', '\u{CC28}', '\u{CE74}', '\u{D0C0}', '\u{D30C}', '\u{D558}',
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelType {
    Normal,
    Underflow,
    Inflow,
    Overflow,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<V> {
    name: String,
    data: V,
}

impl<V> Record<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &V {
        &self.data
    }
}

#[derive(Clone, Debug)]
pub struct Bucket<V> {
    label: String,
    lower_boundary: String,
    label_type: LabelType,
    /// The visible bucket that shows this bucket's records.
    display: Option<usize>,
    display_index: usize,
    records: Vec<Record<V>>,
}

impl<V> Bucket<V> {
    fn new(label: String, lower_boundary: String, label_type: LabelType) -> Self {
        Self {
            label,
            lower_boundary,
            label_type,
            display: None,
            display_index: 0,
            records: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn label_type(&self) -> LabelType {
        self.label_type
    }

    /// Position among the visible buckets.
    pub fn index(&self) -> usize {
        self.display_index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record<V>] {
        &self.records
    }
}

#[derive(Clone, Debug)]
struct BucketList<V> {
    /// Every bucket in boundary order, invisible ones included.
    all: Vec<Bucket<V>>,
    visible: Vec<usize>,
}

impl<V> BucketList<V> {
    fn new(mut all: Vec<Bucket<V>>) -> Self {
        let visible: Vec<usize> = (0..all.len()).filter(|&i| all[i].display.is_none()).collect();
        for (display_index, &i) in visible.iter().enumerate() {
            all[i].display_index = display_index;
        }
        Self { all, visible }
    }

    fn bucket_index(&self, name: &str, primary_only: &RuleBasedCollator) -> usize {
        let mut start = 0;
        let mut limit = self.all.len();
        while start + 1 < limit {
            let i = (start + limit) / 2;
            if primary_only.compare(name, &self.all[i].lower_boundary) == Ordering::Less {
                limit = i;
            } else {
                start = i;
            }
        }
        let bucket = &self.all[start];
        match bucket.display {
            Some(display) => self.all[display].display_index,
            None => bucket.display_index,
        }
    }

    fn visible(&self) -> impl Iterator<Item = &Bucket<V>> + '_ {
        self.visible.iter().map(move |&i| &self.all[i])
    }
}

/// An index with records, rebuilt lazily whenever labels or records change.
pub struct AlphabeticIndex<V> {
    collator: RuleBasedCollator,
    primary_only: RuleBasedCollator,
    first_chars_in_scripts: Vec<String>,
    initial_labels: BTreeSet<String>,
    records: Vec<Record<V>>,
    buckets: Option<BucketList<V>>,
    underflow_label: String,
    overflow_label: String,
    inflow_label: String,
    max_label_count: usize,
}

impl<V: Clone> AlphabeticIndex<V> {
    /// An index with the locale's collator and labels.
    pub fn new(locale: &str, registry: &CollatorRegistry) -> Result<Self> {
        let collator = registry.collator_for(locale)?;
        let mut index = Self::build(collator)?;
        if !index.add_chinese_index_characters() {
            index.add_index_exemplars(&LocaleId::parse(locale)?, registry.locale_data());
        }
        Ok(index)
    }

    /// An index over `collator` with no labels beyond Chinese index
    /// characters the tailoring defines.
    pub fn with_collator(collator: RuleBasedCollator) -> Result<Self> {
        let mut index = Self::build(collator)?;
        index.add_chinese_index_characters();
        Ok(index)
    }

    fn build(collator: RuleBasedCollator) -> Result<Self> {
        let mut primary_only = collator.clone_as_thawed();
        primary_only.set_strength(Strength::Primary)?;
        primary_only.freeze();

        let mut first_chars_in_scripts = first_characters_in_scripts(&primary_only);
        first_chars_in_scripts.sort_by(|a, b| primary_only.compare(a, b));
        // Boundaries that are primary ignorable under this tailoring are useless
        while first_chars_in_scripts
            .first()
            .map_or(false, |first| primary_only.compare(first, "") == Ordering::Equal)
        {
            first_chars_in_scripts.remove(0);
        }
        if first_chars_in_scripts.is_empty() {
            return Err(CollationError::invalid(
                "alphabetic index requires non-ignorable script boundaries",
            ));
        }

        Ok(Self {
            collator,
            primary_only,
            first_chars_in_scripts,
            initial_labels: BTreeSet::new(),
            records: Vec::new(),
            buckets: None,
            underflow_label: DEFAULT_LABEL.to_string(),
            overflow_label: DEFAULT_LABEL.to_string(),
            inflow_label: DEFAULT_INFLOW_LABEL.to_string(),
            max_label_count: DEFAULT_MAX_LABEL_COUNT,
        })
    }

    //
    // Labels
    //

    pub fn add_labels<I, S>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_labels.extend(labels.into_iter().map(Into::into));
        self.buckets = None;
        self
    }

    /// Adds the index labels `locale` would use.
    pub fn add_labels_for_locale(&mut self, locale: &str, data: &dyn LocaleData) -> Result<&mut Self> {
        let locale = LocaleId::parse(locale)?;
        self.add_index_exemplars(&locale, data);
        self.buckets = None;
        Ok(self)
    }

    fn add_index_exemplars(&mut self, locale: &LocaleId, data: &dyn LocaleData) {
        let chain = locale.fallback_chain();
        if let Some(exemplars) = chain.iter().find_map(|name| data.index_exemplars(name)) {
            self.initial_labels.extend(exemplars);
            return;
        }

        // Synthesize labels from the main alphabet
        let mut exemplars: BTreeSet<String> = chain
            .iter()
            .find_map(|name| data.standard_exemplars(name))
            .unwrap_or_default()
            .into_iter()
            .collect();
        let has_ascii_letter = exemplars
            .iter()
            .any(|s| s.chars().any(|c| c.is_ascii_lowercase()));
        if has_ascii_letter || exemplars.is_empty() {
            exemplars.extend(('a'..='z').map(String::from));
        }
        let is_syllable = |s: &String| s.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c));
        if exemplars.iter().any(is_syllable) {
            exemplars.retain(|s| !is_syllable(s));
            exemplars.extend(HANGUL_LABELS.iter().map(|c| c.to_string()));
        }
        self.initial_labels
            .extend(exemplars.iter().map(|s| s.to_uppercase()));
    }

    fn add_chinese_index_characters(&mut self) -> bool {
        let contractions = self.primary_only.contractions_starting_with(INDEX_BASE);
        if contractions.is_empty() {
            return false;
        }
        let has_pinyin = contractions
            .iter()
            .any(|s| s.chars().last().map_or(false, |c| c.is_ascii_uppercase()));
        self.initial_labels.extend(contractions);
        if has_pinyin {
            self.initial_labels
                .extend(('A'..='Z').map(String::from));
        }
        true
    }

    pub fn underflow_label(&self) -> &str {
        &self.underflow_label
    }

    pub fn set_underflow_label(&mut self, label: &str) -> &mut Self {
        self.underflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn overflow_label(&self) -> &str {
        &self.overflow_label
    }

    pub fn set_overflow_label(&mut self, label: &str) -> &mut Self {
        self.overflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn inflow_label(&self) -> &str {
        &self.inflow_label
    }

    pub fn set_inflow_label(&mut self, label: &str) -> &mut Self {
        self.inflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn max_label_count(&self) -> usize {
        self.max_label_count
    }

    pub fn set_max_label_count(&mut self, count: usize) -> Result<&mut Self> {
        if count == 0 {
            return Err(CollationError::invalid("max label count must be positive"));
        }
        self.max_label_count = count;
        self.buckets = None;
        Ok(self)
    }

    /// The collator records are sorted with.
    pub fn collator(&self) -> &RuleBasedCollator {
        &self.collator
    }

    /// First strings of each real script, in primary order.
    pub fn first_characters_in_scripts(&self) -> &[String] {
        &self.first_chars_in_scripts
    }

    fn init_labels(&self) -> Result<Vec<String>> {
        let cmp = &self.primary_only;
        let first_script_boundary = &self.first_chars_in_scripts[0];
        let overflow_boundary = &self.first_chars_in_scripts[self.first_chars_in_scripts.len() - 1];

        let mut labels: Vec<String> = Vec::new();
        for item in &self.initial_labels {
            let mut chars: Vec<char> = item.chars().collect();
            let check_distinct = if chars.len() <= 1 {
                false
            } else if chars.len() >= 2
                && chars[chars.len() - 1] == '*'
                && chars[chars.len() - 2] != '*'
            {
                // A single trailing star keeps the label even if it sorts
                // like its separate characters
                chars.pop();
                false
            } else {
                true
            };
            let item: String = chars.iter().collect();

            if cmp.compare(&item, first_script_boundary) == Ordering::Less {
                continue;
            }
            if cmp.compare(&item, overflow_boundary) != Ordering::Less {
                continue;
            }
            if check_distinct && cmp.compare(&item, &separated(&chars)) == Ordering::Equal {
                continue;
            }
            match labels.binary_search_by(|probe| cmp.compare(probe, &item)) {
                Ok(pos) => {
                    if is_better_label(&item, &labels[pos]) {
                        labels[pos] = item;
                    }
                }
                Err(pos) => labels.insert(pos, item),
            }
        }

        if labels.len() > self.max_label_count {
            return Err(CollationError::invalid(format!(
                "{} index labels exceed the maximum of {}",
                labels.len(),
                self.max_label_count
            )));
        }
        Ok(labels)
    }

    fn has_multiple_primary_weights(&self, variable_top: u32, s: &str) -> bool {
        self.primary_only
            .collation_elements(s)
            .into_iter()
            .filter(|&ce| primary(ce) > variable_top)
            .nth(1)
            .is_some()
    }

    fn create_bucket_list(&self) -> Result<BucketList<V>> {
        let cmp = &self.primary_only;
        let labels = self.init_labels()?;
        let variable_top = if cmp.is_alternate_handling_shifted() {
            cmp.variable_top()
        } else {
            0
        };
        let mut has_invisible_buckets = false;
        let mut ascii_buckets: [Option<usize>; 26] = [None; 26];
        let mut pinyin_buckets: [Option<usize>; 26] = [None; 26];
        let mut has_pinyin = false;

        let mut buckets: Vec<Bucket<V>> = vec![Bucket::new(
            self.underflow_label.clone(),
            String::new(),
            LabelType::Underflow,
        )];

        let mut script_index = 0;
        let mut script_upper_boundary = String::new();
        for current in &labels {
            if cmp.compare(current, &script_upper_boundary) != Ordering::Less {
                // Crossed into a new script
                let inflow_boundary = script_upper_boundary.clone();
                let mut skipped_script = false;
                while let Some(boundary) = self.first_chars_in_scripts.get(script_index) {
                    script_index += 1;
                    script_upper_boundary = boundary.clone();
                    if cmp.compare(current, &script_upper_boundary) == Ordering::Less {
                        break;
                    }
                    skipped_script = true;
                }
                if skipped_script && buckets.len() > 1 {
                    buckets.push(Bucket::new(
                        self.inflow_label.clone(),
                        inflow_boundary,
                        LabelType::Inflow,
                    ));
                }
            }

            buckets.push(Bucket::new(fix_label(current), current.clone(), LabelType::Normal));
            let position = buckets.len() - 1;
            let chars: Vec<char> = current.chars().collect();
            match chars[..] {
                [c] if c.is_ascii_uppercase() => {
                    ascii_buckets[usize::from(c as u8 - b'A')] = Some(position);
                }
                [INDEX_BASE, c] if c.is_ascii_uppercase() => {
                    pinyin_buckets[usize::from(c as u8 - b'A')] = Some(position);
                    has_pinyin = true;
                }
                _ => {}
            }

            // "Æ" or "Sch": later strings that start the same way belong to
            // the previous single-primary bucket
            if chars.first() != Some(&INDEX_BASE)
                && chars.last() != Some(&'\u{FFFF}')
                && self.has_multiple_primary_weights(variable_top, current)
            {
                for i in (0..buckets.len() - 1).rev() {
                    let single = &buckets[i];
                    if single.label_type != LabelType::Normal {
                        break;
                    }
                    if single.display.is_none()
                        && !self.has_multiple_primary_weights(variable_top, &single.lower_boundary)
                    {
                        let mut invisible =
                            Bucket::new(String::new(), format!("{}\u{FFFF}", current), LabelType::Normal);
                        invisible.display = Some(i);
                        buckets.push(invisible);
                        has_invisible_buckets = true;
                        break;
                    }
                }
            }
        }

        if buckets.len() == 1 {
            // Nothing but underflow
            return Ok(BucketList::new(buckets));
        }
        buckets.push(Bucket::new(
            self.overflow_label.clone(),
            script_upper_boundary,
            LabelType::Overflow,
        ));

        if has_pinyin {
            let mut ascii: Option<usize> = None;
            for (ascii_bucket, pinyin_bucket) in ascii_buckets.iter().zip(&pinyin_buckets) {
                if ascii_bucket.is_some() {
                    ascii = *ascii_bucket;
                }
                if let (Some(pinyin), Some(ascii)) = (pinyin_bucket, ascii) {
                    buckets[*pinyin].display = Some(ascii);
                    has_invisible_buckets = true;
                }
            }
        }

        if has_invisible_buckets {
            // Merge an inflow bucket into a following overflow or inflow,
            // walking backwards so overflow wins
            let mut next = buckets.len() - 1;
            for i in (1..buckets.len() - 1).rev() {
                if buckets[i].display.is_some() {
                    continue;
                }
                if buckets[i].label_type == LabelType::Inflow
                    && buckets[next].label_type != LabelType::Normal
                {
                    buckets[i].display = Some(next);
                    continue;
                }
                next = i;
            }
        }

        Ok(BucketList::new(buckets))
    }

    fn init_buckets(&mut self) -> Result<&BucketList<V>> {
        let list = match self.buckets.take() {
            Some(list) => list,
            None => self.fill_buckets()?,
        };
        Ok(self.buckets.insert(list))
    }

    /// Builds the bucket list and distributes the sorted records over it.
    fn fill_buckets(&mut self) -> Result<BucketList<V>> {
        let mut list = self.create_bucket_list()?;
        self.records
            .sort_by(|a, b| self.collator.compare(&a.name, &b.name));
        let cmp = &self.primary_only;
        let mut current = 0;
        for record in &self.records {
            while current + 1 < list.all.len()
                && cmp.compare(&record.name, &list.all[current + 1].lower_boundary)
                    != Ordering::Less
            {
                current += 1;
            }
            let target = list.all[current].display.unwrap_or(current);
            list.all[target].records.push(record.clone());
        }
        debug!(
            labels = self.initial_labels.len(),
            buckets = list.visible.len(),
            records = self.records.len(),
            "alphabetic index buckets built"
        );
        Ok(list)
    }

    //
    // Records and queries
    //

    pub fn add_record(&mut self, name: &str, data: V) -> &mut Self {
        self.records.push(Record {
            name: name.to_string(),
            data,
        });
        self.buckets = None;
        self
    }

    pub fn clear_records(&mut self) -> &mut Self {
        if !self.records.is_empty() {
            self.records.clear();
            self.buckets = None;
        }
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Fails if the labels exceed `max_label_count`.
    pub fn bucket_labels(&mut self) -> Result<Vec<String>> {
        Ok(self
            .init_buckets()?
            .visible()
            .map(|bucket| bucket.label.clone())
            .collect())
    }

    pub fn bucket_count(&mut self) -> Result<usize> {
        Ok(self.init_buckets()?.visible.len())
    }

    /// Index of the visible bucket `name` belongs in.
    pub fn bucket_index(&mut self, name: &str) -> Result<usize> {
        self.init_buckets()?;
        Ok(match &self.buckets {
            Some(list) => list.bucket_index(name, &self.primary_only),
            None => 0,
        })
    }

    /// The visible buckets, with their records.
    pub fn buckets(&mut self) -> Result<impl Iterator<Item = &Bucket<V>> + '_> {
        Ok(self.init_buckets()?.visible())
    }

    /// A record-free snapshot of the bucket list for concurrent lookups.
    pub fn build_immutable_index(&mut self) -> Result<ImmutableIndex<V>> {
        let buckets = if self.records.is_empty() {
            self.init_buckets()?.clone()
        } else {
            self.create_bucket_list()?
        };
        Ok(ImmutableIndex {
            buckets,
            primary_only: self.primary_only.clone(),
        })
    }
}

/// Bucket lookups without records. Safe to share between threads.
#[derive(Clone, Debug)]
pub struct ImmutableIndex<V> {
    buckets: BucketList<V>,
    primary_only: RuleBasedCollator,
}

impl<V> ImmutableIndex<V> {
    pub fn bucket_count(&self) -> usize {
        self.buckets.visible.len()
    }

    pub fn bucket_index(&self, name: &str) -> usize {
        self.buckets.bucket_index(name, &self.primary_only)
    }

    pub fn bucket(&self, index: usize) -> Option<&Bucket<V>> {
        self.buckets
            .visible
            .get(index)
            .map(|&i| &self.buckets.all[i])
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket<V>> + '_ {
        self.buckets.visible()
    }
}

//
// Helpers
//

/// Script boundary strings for real scripts: letters and unassigned.
fn first_characters_in_scripts(collator: &RuleBasedCollator) -> Vec<String> {
    let props = UnicodeProperties;
    collator
        .contractions_starting_with(SCRIPT_BOUNDARY_CHAR)
        .into_iter()
        .filter(|boundary| {
            boundary.chars().nth(1).map_or(false, |c| {
                let category = props.general_category(c);
                category.is_letter() || category == GeneralCategory::Unassigned
            })
        })
        .collect()
}

/// `item` with a CGJ between its characters, so no contraction matches.
fn separated(chars: &[char]) -> String {
    let mut out = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            out.push(CGJ);
        }
        out.push(c);
    }
    out
}

/// Shorter NFKD wins, then the lower NFKD, then the lower original.
fn is_better_label(one: &str, other: &str) -> bool {
    let n1 = normalize::nfkd(one);
    let n2 = normalize::nfkd(other);
    match n1.chars().count().cmp(&n2.chars().count()) {
        Ordering::Equal => match n1.cmp(&n2) {
            Ordering::Equal => one < other,
            by_nfkd => by_nfkd == Ordering::Less,
        },
        by_length => by_length == Ordering::Less,
    }
}

fn fix_label(label: &str) -> String {
    let mut chars = label.chars();
    if chars.next() != Some(INDEX_BASE) {
        return label.to_string();
    }
    match chars.next() {
        Some(c) if ('\u{2801}'..='\u{28FF}').contains(&c) => {
            format!("{}{}", c as u32 - 0x2800, STROKE_SUFFIX)
        }
        _ => label.chars().skip(1).collect(),
    }
}
