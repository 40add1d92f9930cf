//! Turns parsed rules into tailored mappings.
//!
//! Every relation creates a node in a primary/secondary/tertiary tree whose
//! untailored nodes stand for root weights. Mappings refer to nodes through
//! temporary CEs until all nodes are placed; then each run of tailored
//! siblings gets weights from the gap between its untailored neighbours and
//! the temporary CEs are replaced.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::ce::*;
use crate::data::CollationData;
use crate::error::{CollationError, Result};
use crate::iter;
use crate::normalize;
use crate::reorder::{ReorderCode, ReorderTable};
use crate::root::ROOT;
use crate::rules::{parse_rules, Anchor, Importer, Level, RuleItem, RuleSetting};
use crate::weights::WeightAllocator;
use crate::{AlternateHandling, CollationOptions};

/// Longest expansion a relation may produce.
const MAX_CES: usize = 31;

/// The product of building a rule string.
#[derive(Clone, Debug)]
pub(crate) struct Tailoring {
    pub data: CollationData,
    pub options: CollationOptions,
}

pub(crate) fn build_tailoring(rules: &str, importer: &dyn Importer) -> Result<Tailoring> {
    let items = parse_rules(rules, importer)?;
    let chars: Vec<char> = rules.chars().collect();
    let mut builder = TailoringBuilder::default();
    builder
        .add_items(&items)
        .and_then(|_| builder.assign_weights())
        .map_err(|error| error.with_context(&chars))?;
    debug!(
        items = items.len(),
        nodes = builder.nodes.len(),
        mappings = builder.data.mapping_count(),
        "tailoring built"
    );
    Ok(Tailoring {
        data: builder.data,
        options: builder.options,
    })
}

#[derive(Debug)]
struct Node {
    level: Level,
    weight: u32,
    tailored: bool,
    parent: Option<usize>,
    /// Root primary whose gap holds this node. Primary nodes only.
    gap: u32,
    children: Vec<usize>,
    offset: usize,
}

struct ResetState {
    ces: Vec<Ce>,
    node: usize,
}

#[derive(Default)]
struct TailoringBuilder {
    nodes: Vec<Node>,
    gaps: BTreeMap<u32, Vec<usize>>,
    data: CollationData,
    options: CollationOptions,
}

impl TailoringBuilder {
    fn add_items(&mut self, items: &[RuleItem]) -> Result<()> {
        let mut reset: Option<ResetState> = None;
        for item in items {
            match item {
                RuleItem::Setting { setting, offset } => self.apply_setting(setting, *offset)?,
                RuleItem::Reset {
                    anchor,
                    before,
                    offset,
                } => reset = Some(self.add_reset(anchor, *before, *offset)?),
                RuleItem::Relation {
                    level,
                    prefix,
                    string,
                    extension,
                    offset,
                } => {
                    let state = reset
                        .as_mut()
                        .ok_or_else(|| CollationError::syntax(*offset, "relation without a reset"))?;
                    self.add_relation(state, *level, prefix, string, extension, *offset)?;
                }
            }
        }
        Ok(())
    }

    fn apply_setting(&mut self, setting: &RuleSetting, offset: usize) -> Result<()> {
        let options = &mut self.options;
        match setting {
            RuleSetting::Strength(strength) => options.strength = *strength,
            RuleSetting::Shifted(shifted) => {
                options.alternate = if *shifted {
                    AlternateHandling::Shifted
                } else {
                    AlternateHandling::NonIgnorable
                };
            }
            RuleSetting::BackwardsSecondary => options.backwards_secondary = true,
            RuleSetting::CaseLevel(on) => options.case_level = *on,
            RuleSetting::CaseFirst(case_first) => options.case_first = *case_first,
            RuleSetting::Normalization(on) => options.normalization = *on,
            RuleSetting::Numeric(on) => options.numeric = *on,
            RuleSetting::MaxVariable(max) => options.max_variable = *max,
            RuleSetting::Reorder(codes) => {
                if let [ReorderCode::Default | ReorderCode::None] = codes.as_slice() {
                    options.reorder_codes.clear();
                    return Ok(());
                }
                ReorderTable::new(codes)
                    .map_err(|error| CollationError::syntax(offset, error.to_string()))?;
                options.reorder_codes = codes.clone();
            }
            RuleSetting::SuppressContractions(chars) => self.data.suppress_contractions(chars),
            RuleSetting::Optimize(chars) => {
                trace!(count = chars.len(), "optimize setting has no effect");
            }
        }
        Ok(())
    }

    //
    // Resets
    //

    fn add_reset(&mut self, anchor: &Anchor, before: Option<Level>, offset: usize) -> Result<ResetState> {
        let mut ces = match anchor {
            Anchor::Text(chars) => iter::ces_for_chars(&self.data, &normalize::nfd_chars(chars)),
            Anchor::Special(pos) => vec![ROOT
                .special_ce(*pos)
                .map_err(|_| CollationError::syntax(offset, format!("reset to [{}] is not supported", pos.name())))?],
        };
        if ces.is_empty() {
            ces.push(0);
        }
        if ces.len() > MAX_CES {
            return Err(CollationError::syntax(offset, "reset position maps to too many collation elements"));
        }

        let ce = ces[ces.len() - 1];
        let node = match before {
            None | Some(Level::Identical) => self.node_for_ce(ce),
            Some(level) => self.node_before(ce, level, offset)?,
        };
        Ok(ResetState { ces, node })
    }

    /// The tertiary node for a CE, creating root nodes on demand.
    fn node_for_ce(&mut self, ce: Ce) -> usize {
        if is_temp_ce(ce) {
            return temp_ce_index(ce);
        }
        let p = self.root_primary_node(primary(ce));
        let s = self.find_or_insert_child(p, Level::Secondary, u32::from(secondary(ce)));
        self.find_or_insert_child(s, Level::Tertiary, u32::from(tertiary_weight(ce)))
    }

    fn node_before(&mut self, ce: Ce, level: Level, offset: usize) -> Result<usize> {
        let t = self.node_for_ce(ce);
        let s = self.parent(t);
        let p = self.parent(s);
        match level {
            Level::Primary => {
                if self.nodes[p].gap == 0 {
                    return Err(CollationError::syntax(offset, "[before 1] on an ignorable"));
                }
                let prev = if self.nodes[p].tailored {
                    let list = &self.gaps[&self.nodes[p].gap];
                    let idx = list.iter().position(|&n| n == p).unwrap_or(1);
                    list[idx - 1]
                } else {
                    let before = ROOT.primary_before(self.nodes[p].weight).ok_or_else(|| {
                        CollationError::syntax(offset, "no primary weight before the reset position")
                    })?;
                    self.root_primary_node(before);
                    let list = &self.gaps[&before];
                    list[list.len() - 1]
                };
                Ok(self.common_tertiary(prev))
            }
            Level::Secondary => {
                let weight = self.nodes[s].weight;
                if !self.nodes[s].tailored {
                    if weight <= u32::from(BEFORE_WEIGHT16) {
                        return Err(CollationError::syntax(offset, "[before 2] on a secondary ignorable"));
                    }
                    let bound = if self.nodes[p].tailored {
                        self.untailored_below(p, weight)
                    } else {
                        u32::from(ROOT.secondary_before(self.nodes[p].weight, weight as u16))
                    };
                    self.find_or_insert_child(p, Level::Secondary, bound);
                }
                let prev = self.previous_sibling(s);
                Ok(self.find_or_insert_child(prev, Level::Tertiary, u32::from(T_COMMON)))
            }
            Level::Tertiary => {
                let weight = self.nodes[t].weight;
                if !self.nodes[t].tailored {
                    if weight <= u32::from(BEFORE_WEIGHT16) {
                        return Err(CollationError::syntax(offset, "[before 3] on a tertiary ignorable"));
                    }
                    let bound = if self.nodes[p].tailored || self.nodes[s].tailored {
                        self.untailored_below(s, weight)
                    } else {
                        u32::from(ROOT.tertiary_before(
                            self.nodes[p].weight,
                            self.nodes[s].weight as u16,
                            weight as u16,
                        ))
                    };
                    self.find_or_insert_child(s, Level::Tertiary, bound);
                }
                Ok(self.previous_sibling(t))
            }
            Level::Identical => Ok(t),
        }
    }

    //
    // Relations
    //

    fn add_relation(
        &mut self,
        reset: &mut ResetState,
        level: Level,
        prefix: &[char],
        string: &[char],
        extension: &[char],
        offset: usize,
    ) -> Result<()> {
        let prefix = normalize::nfd_chars(prefix);
        let string = normalize::nfd_chars(string);
        if string.is_empty() {
            return Err(CollationError::syntax(offset, "empty relation string"));
        }

        let mut ces = if level == Level::Identical {
            reset.ces.clone()
        } else {
            let node = self.insert_after(reset.node, level, offset)?;
            reset.node = node;
            let last = reset.ces.len() - 1;
            reset.ces[last] = temp_ce(node);
            let mut ces = reset.ces.clone();
            set_case_bits(&mut ces, &string);
            ces
        };
        if !extension.is_empty() {
            ces.extend(iter::ces_for_chars(&self.data, &normalize::nfd_chars(extension)));
        }
        if ces.len() > MAX_CES {
            return Err(CollationError::syntax(offset, "relation maps to too many collation elements"));
        }
        trace!(?string, ?prefix, ?level, ces = ces.len(), "relation");
        self.data.set_mapping(&prefix, &string, ces);
        Ok(())
    }

    /// Inserts a tailored node right after `pos` at `level`. Returns the
    /// tertiary node that represents it.
    fn insert_after(&mut self, pos: usize, level: Level, offset: usize) -> Result<usize> {
        let s = self.parent(pos);
        let p = self.parent(s);
        match level {
            Level::Primary => {
                let gap = self.nodes[p].gap;
                if gap == 0 {
                    return Err(CollationError::syntax(
                        offset,
                        "primary relation after an ignorable is not supported",
                    ));
                }
                let node = self.new_node(Level::Primary, 0, true, None, offset);
                self.nodes[node].gap = gap;
                let list = self.gaps.entry(gap).or_default();
                let idx = list.iter().position(|&n| n == p).map_or(list.len(), |i| i + 1);
                list.insert(idx, node);
                Ok(self.common_tertiary(node))
            }
            Level::Secondary => {
                let node = self.new_node(Level::Secondary, 0, true, Some(p), offset);
                let siblings = &mut self.nodes[p].children;
                let idx = siblings.iter().position(|&n| n == s).map_or(siblings.len(), |i| i + 1);
                siblings.insert(idx, node);
                Ok(self.find_or_insert_child(node, Level::Tertiary, u32::from(T_COMMON)))
            }
            Level::Tertiary => {
                let node = self.new_node(Level::Tertiary, 0, true, Some(s), offset);
                let siblings = &mut self.nodes[s].children;
                let idx = siblings.iter().position(|&n| n == pos).map_or(siblings.len(), |i| i + 1);
                siblings.insert(idx, node);
                Ok(node)
            }
            Level::Identical => Ok(pos),
        }
    }

    //
    // Node arena
    //

    fn new_node(&mut self, level: Level, weight: u32, tailored: bool, parent: Option<usize>, offset: usize) -> usize {
        self.nodes.push(Node {
            level,
            weight,
            tailored,
            parent,
            gap: 0,
            children: Vec::new(),
            offset,
        });
        self.nodes.len() - 1
    }

    fn parent(&self, node: usize) -> usize {
        self.nodes[node].parent.unwrap_or(node)
    }

    fn root_primary_node(&mut self, p: u32) -> usize {
        if let Some(list) = self.gaps.get(&p) {
            return list[0];
        }
        let node = self.new_node(Level::Primary, p, false, None, 0);
        self.nodes[node].gap = p;
        self.gaps.insert(p, vec![node]);
        node
    }

    /// The untailored child of `parent` with `weight`, inserted in weight
    /// order among the other untailored children if missing.
    fn find_or_insert_child(&mut self, parent: usize, level: Level, weight: u32) -> usize {
        let children = &self.nodes[parent].children;
        let mut idx = children.len();
        for (i, &child) in children.iter().enumerate() {
            let node = &self.nodes[child];
            if node.tailored {
                continue;
            }
            if node.weight == weight {
                return child;
            }
            if node.weight > weight {
                idx = i;
                break;
            }
        }
        let node = self.new_node(level, weight, false, Some(parent), 0);
        self.nodes[parent].children.insert(idx, node);
        node
    }

    fn common_tertiary(&mut self, primary_node: usize) -> usize {
        let s = self.find_or_insert_child(primary_node, Level::Secondary, u32::from(COMMON_WEIGHT16));
        self.find_or_insert_child(s, Level::Tertiary, u32::from(T_COMMON))
    }

    fn previous_sibling(&self, node: usize) -> usize {
        let parent = self.parent(node);
        let siblings = &self.nodes[parent].children;
        match siblings.iter().position(|&n| n == node) {
            Some(i) if i > 0 => siblings[i - 1],
            _ => node,
        }
    }

    /// Largest untailored child weight of `parent` below `weight`.
    fn untailored_below(&self, parent: usize, weight: u32) -> u32 {
        self.nodes[parent]
            .children
            .iter()
            .map(|&n| &self.nodes[n])
            .filter(|n| !n.tailored && n.weight < weight)
            .map(|n| n.weight)
            .max()
            .unwrap_or(u32::from(BEFORE_WEIGHT16))
    }

    //
    // Weights
    //

    fn assign_weights(&mut self) -> Result<()> {
        let gaps: Vec<(u32, Vec<usize>)> = self.gaps.iter().map(|(k, v)| (*k, v.clone())).collect();
        for (gap, list) in gaps {
            if list.len() > 1 {
                let upper = ROOT.primary_after(gap);
                let mut alloc = WeightAllocator::for_primary(ROOT.is_compressible(lead_byte(gap)));
                alloc
                    .allocate(gap, upper, list.len() - 1)
                    .map_err(|error| CollationError::syntax(self.nodes[list[1]].offset, error.to_string()))?;
                for &node in &list[1..] {
                    self.nodes[node].weight = alloc.next_weight().unwrap_or(upper);
                }
            }
            for &p in &list {
                self.assign_children(p)?;
                for s in self.nodes[p].children.clone() {
                    self.assign_children(s)?;
                }
            }
        }

        let nodes = &self.nodes;
        self.data.map_ces(|ce| {
            if !is_temp_ce(ce) {
                return ce;
            }
            let t = temp_ce_index(ce);
            let s = nodes[t].parent.unwrap_or(t);
            let p = nodes[s].parent.unwrap_or(s);
            make_ce(
                nodes[p].weight,
                nodes[s].weight as u16,
                nodes[t].weight as u16 | (tertiary(ce) & CASE_MASK),
            )
        });
        Ok(())
    }

    /// Allocates weights for each run of tailored children of `parent`.
    fn assign_children(&mut self, parent: usize) -> Result<()> {
        let children = self.nodes[parent].children.clone();
        let Some(&first) = children.first() else {
            return Ok(());
        };
        let level = self.nodes[first].level;
        let limit = if level == Level::Secondary {
            SECONDARY_LIMIT
        } else {
            TERTIARY_LIMIT
        };

        let mut i = 0;
        while i < children.len() {
            if !self.nodes[children[i]].tailored {
                i += 1;
                continue;
            }
            let mut j = i;
            while j < children.len() && self.nodes[children[j]].tailored {
                j += 1;
            }
            let lower = if i > 0 { self.nodes[children[i - 1]].weight } else { 0 };
            let mut upper = children.get(j).map_or(limit, |&n| self.nodes[n].weight);
            if let Some(root_upper) = self.root_weight_after(parent, lower) {
                upper = upper.min(root_upper);
            }

            let mut alloc = if level == Level::Secondary {
                WeightAllocator::for_secondary()
            } else {
                WeightAllocator::for_tertiary()
            };
            alloc
                .allocate(lower, upper, j - i)
                .map_err(|error| CollationError::syntax(self.nodes[children[i]].offset, error.to_string()))?;
            for &node in &children[i..j] {
                self.nodes[node].weight = alloc.next_weight().unwrap_or(upper);
            }
            i = j;
        }
        Ok(())
    }

    /// The next root weight above `lower` among the children of an
    /// untailored parent chain, if the chain is untailored.
    fn root_weight_after(&self, parent: usize, lower: u32) -> Option<u32> {
        let node = &self.nodes[parent];
        if node.tailored {
            return None;
        }
        match node.level {
            Level::Primary => Some(ROOT.secondary_after(node.weight, lower as u16)),
            Level::Secondary => {
                let p = &self.nodes[self.parent(parent)];
                if p.tailored {
                    return None;
                }
                Some(ROOT.tertiary_after(p.weight, node.weight as u16, lower as u16))
            }
            _ => None,
        }
    }
}

/// Copies the case of the string's root primaries onto the tailored CEs.
fn set_case_bits(ces: &mut [Ce], string: &[char]) {
    let text: String = string.iter().collect();
    let cases: Vec<u16> = ROOT
        .ces_for_str(&text)
        .into_iter()
        .filter(|&ce| primary(ce) != 0)
        .map(|ce| tertiary(ce) & CASE_MASK)
        .collect();
    let tailored = ces.iter().filter(|&&ce| primary(ce) != 0).count();

    for (i, ce) in ces.iter_mut().filter(|ce| primary(**ce) != 0).enumerate() {
        let case = if i + 1 < tailored {
            cases.get(i).copied().unwrap_or(LOWER_CASE)
        } else {
            // The last tailored primary stands for all remaining base primaries
            let rest = cases.get(i..).unwrap_or(&[]);
            match rest.first() {
                Some(&first) if rest.iter().all(|&c| c == first) => first,
                Some(_) => MIXED_CASE,
                None => LOWER_CASE,
            }
        };
        *ce = with_case(*ce, case);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::NoImports;

    fn build(rules: &str) -> Tailoring {
        build_tailoring(rules, &NoImports).unwrap()
    }

    fn ces(t: &Tailoring, s: &str) -> Vec<Ce> {
        iter::ces_for_chars(&t.data, &normalize::nfd(s))
    }

    fn p(t: &Tailoring, s: &str) -> u32 {
        primary(ces(t, s)[0])
    }

    #[test]
    fn primary_relations_go_right_after_the_reset() {
        let t = build("&a < b &a < c");
        assert!(p(&t, "a") < p(&t, "c"));
        assert!(p(&t, "c") < p(&t, "b"));
        assert!(p(&t, "b") < primary(ROOT.ces_for_str("b")[0]));
        assert!(!ces(&t, "c").iter().any(|&ce| is_temp_ce(ce)));
    }

    #[test]
    fn chained_relations_keep_order_and_strength() {
        let t = build("&z < æ << ä <<< Ä");
        let z = ces(&t, "z")[0];
        let ae = ces(&t, "æ")[0];
        let a = ces(&t, "ä")[0];
        let upper = ces(&t, "Ä")[0];
        assert!(primary(z) < primary(ae));
        assert_eq!(primary(ae), primary(a));
        assert!(secondary(ae) < secondary(a));
        assert_eq!(secondary(a), secondary(upper));
        assert!(tertiary_weight(a) < tertiary_weight(upper));
        assert_eq!(case_value(upper), 2);
        assert_eq!(case_value(a), 0);
    }

    #[test]
    fn before_resets() {
        let t = build("&[before 1]b < x");
        assert!(p(&t, "a") < p(&t, "x"));
        assert!(p(&t, "x") < p(&t, "b"));

        let t = build("&[before 3]A <<< x");
        let a = ces(&t, "a")[0];
        let x = ces(&t, "x")[0];
        let upper = ces(&t, "A")[0];
        assert_eq!(primary(x), primary(a));
        assert!(tertiary_weight(a) < tertiary_weight(x));
        assert!(tertiary_weight(x) < tertiary_weight(upper));
    }

    #[test]
    fn identical_relation_with_extension() {
        let t = build("&a = AB / B");
        let mut expected = ces(&t, "a");
        expected.extend(ces(&t, "B"));
        assert_eq!(ces(&t, "AB"), expected);
    }

    #[test]
    fn contractions_and_expansions() {
        let t = build("&c < ch &ae << æ");
        let ch = ces(&t, "ch");
        assert_eq!(ch.len(), 1);
        assert!(primary(ch[0]) > p(&t, "c"));
        assert!(primary(ch[0]) < p(&t, "d"));
        assert_eq!(ces(&t, "æ").len(), 2);
    }

    #[test]
    fn settings_are_collected() {
        let t = build("[strength 1][alternate shifted][numericOrdering on][reorder Grek]");
        assert_eq!(t.options.strength, crate::Strength::Primary);
        assert_eq!(t.options.alternate, AlternateHandling::Shifted);
        assert!(t.options.numeric);
        assert_eq!(t.options.reorder_codes.len(), 1);
    }

    #[test]
    fn errors_carry_offsets() {
        match build_tailoring("&a < b &[before 1][first tertiary ignorable] < x", &NoImports) {
            Err(CollationError::RuleSyntax { offset, .. }) => assert_eq!(offset, 7),
            other => panic!("unexpected {:?}", other),
        }
        assert!(build_tailoring("&[last implicit] < x", &NoImports).is_err());
    }

    #[test]
    fn many_relations_fit_in_one_gap() {
        let rules: String = (0..300)
            .map(|i| format!("<\\u{:04X}", 0xE000 + i))
            .fold(String::from("&a"), |acc, r| acc + &r);
        let t = build(&rules);
        let weights: Vec<u32> = (0..300)
            .map(|i| p(&t, &char::from_u32(0xE000 + i).unwrap().to_string()))
            .collect();
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
        assert!(weights[299] < p(&t, "b"));
    }
}
