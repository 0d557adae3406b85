use std::{collections::BTreeSet, collections::HashMap, sync::Arc};

use atn_runtime::{Atn, INVALID_ALT_NUMBER};

use crate::{
  config::ConfigSet,
  prediction_context::PredictionContext,
  semantic_context::SemanticContext,
};

/// A set of alternative numbers, grouped during conflict classification.
pub type AltSet = BTreeSet<usize>;

/// SLL stops at the first DFA state with a genuine conflict; LL keeps going
/// until either a unique alt survives or every surviving subset agrees
/// (`EXACT_AMBIG_DETECTION`), even past the point a plain conflict check
/// would already have reported ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
  Sll,
  Ll,
  LlExactAmbigDetection,
}

/// Partitions `configs` by `(state, context)` and returns the set of alts
/// each group contains — grounded on `PredictionMode.getConflictingAltSubsets`.
/// Two configs in the same group are indistinguishable from here on: same
/// state, same call stack, so whichever of their alts ultimately wins is a
/// real ambiguity between those alts, not an artifact of unrelated paths.
pub fn conflicting_alt_subsets(configs: &ConfigSet) -> Vec<AltSet> {
  let mut grouped: HashMap<(usize, Arc<PredictionContext>), AltSet> = HashMap::new();
  for c in configs.iter() {
    grouped.entry((c.state, c.context.clone())).or_default().insert(c.alt);
  }
  grouped.into_values().collect()
}

pub fn has_conflicting_alt_set(altsets: &[AltSet]) -> bool {
  altsets.iter().any(|s| s.len() > 1)
}

pub fn has_non_conflicting_alt_set(altsets: &[AltSet]) -> bool {
  altsets.iter().any(|s| s.len() == 1)
}

pub fn all_subsets_conflict(altsets: &[AltSet]) -> bool {
  !has_non_conflicting_alt_set(altsets)
}

pub fn all_subsets_equal(altsets: &[AltSet]) -> bool {
  match altsets.split_first() {
    None => true,
    Some((first, rest)) => rest.iter().all(|s| s == first),
  }
}

pub fn union_alts(altsets: &[AltSet]) -> AltSet {
  let mut out = AltSet::new();
  for s in altsets {
    out.extend(s.iter().copied());
  }
  out
}

/// If every alt subset agrees on a single minimal viable alt, returns it —
/// the LL escape hatch that lets `exec_atn_with_full_context` stop chasing
/// lookahead once the ambiguity can't change the outcome (spec's
/// `getSingleViableAlt`).
pub fn single_viable_alt(altsets: &[AltSet]) -> Option<usize> {
  let mut viable = AltSet::new();
  for s in altsets {
    let min_alt = *s.iter().next()?;
    viable.insert(min_alt);
    if viable.len() > 1 {
      return None;
    }
  }
  viable.into_iter().next()
}

pub fn all_configs_in_rule_stop_states(configs: &ConfigSet, atn: &Atn) -> bool {
  configs.iter().all(|c| atn.state(c.state).is_rule_stop())
}

/// Whether some ATN state has every config reaching it agreeing on one alt —
/// grouped by `state` alone, not `(state, context)`. A state two configs
/// reach through different call stacks but with distinct single alts each
/// still counts here as *not* associated with one alt, since the two
/// contexts genuinely disagree on what happens next. Grounded on
/// `PredictionMode.hasStateAssociatedWithOneAlt`.
pub fn has_state_associated_with_one_alt(configs: &ConfigSet) -> bool {
  let mut grouped: HashMap<usize, AltSet> = HashMap::new();
  for c in configs.iter() {
    grouped.entry(c.state).or_default().insert(c.alt);
  }
  grouped.values().any(|alts| alts.len() == 1)
}

/// Whether an SLL decision has reached a state it cannot resolve further
/// without full context: either everything that's left is sitting on a rule
/// stop state, or there's a real conflict (a `(state, context)` group
/// spanning >1 alt) that no ATN state's single-alt agreement disambiguates.
pub fn has_sll_conflict_terminating_prediction(configs: &ConfigSet, atn: &Atn) -> bool {
  if all_configs_in_rule_stop_states(configs, atn) {
    return true;
  }
  let configs_for_check;
  let configs = if configs.has_semantic_context {
    let mut stripped = ConfigSet::new(configs.full_ctx);
    let mut cache = crate::prediction_context::MergeCache::new();
    for c in configs.iter() {
      stripped.add(c.with_semantic_context(SemanticContext::none()), &mut cache);
    }
    configs_for_check = stripped;
    &configs_for_check
  } else {
    configs
  };
  let altsets = conflicting_alt_subsets(configs);
  has_conflicting_alt_set(&altsets) && !has_state_associated_with_one_alt(configs)
}

/// The alt set a DFA state's predicates should be collected for: the
/// singleton `{unique_alt}` when the configs already agree, otherwise the
/// union of every genuinely conflicting `(state, context)` group.
pub fn conflicting_alts_or_unique_alt(configs: &ConfigSet) -> AltSet {
  if let Some(alt) = configs.unique_alt() {
    let mut set = AltSet::new();
    set.insert(alt);
    return set;
  }
  let altsets = conflicting_alt_subsets(configs);
  let conflicting: Vec<AltSet> = altsets.into_iter().filter(|s| s.len() > 1).collect();
  union_alts(&conflicting)
}

/// The rescue path when SLL lands on `ERROR`: if the decision-entry rule's
/// alt already finished (some config sits on its rule's stop state, or has
/// dipped into outer context) pick the lowest such alt rather than
/// reporting `NoViableAlternative` outright.
pub fn alt_that_finished_decision_entry_rule(configs: &ConfigSet, atn: &Atn) -> Option<usize> {
  let mut alts = AltSet::new();
  for c in configs.iter() {
    if c.reaches_into_outer_context > 0 {
      alts.insert(c.alt);
      continue;
    }
    let state = atn.state(c.state);
    if state.is_rule_stop() && c.context.has_empty_path() {
      alts.insert(c.alt);
    }
  }
  alts.into_iter().next().filter(|a| *a != INVALID_ALT_NUMBER)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::config::AtnConfig;
  use crate::prediction_context::MergeCache;

  fn cfg(state: usize, alt: usize) -> AtnConfig {
    AtnConfig::new(state, alt, PredictionContext::empty(), SemanticContext::none())
  }

  #[test]
  fn single_viable_alt_resolves_when_every_group_agrees() {
    let mut a = AltSet::new();
    a.insert(1);
    a.insert(2);
    let mut b = AltSet::new();
    b.insert(1);
    assert_eq!(single_viable_alt(&[a, b]), Some(1));
  }

  #[test]
  fn single_viable_alt_none_when_groups_disagree() {
    let mut a = AltSet::new();
    a.insert(1);
    let mut b = AltSet::new();
    b.insert(2);
    assert_eq!(single_viable_alt(&[a, b]), None);
  }

  #[test]
  fn conflicting_alts_or_unique_alt_prefers_unique_alt() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 5), &mut cache);
    set.add(cfg(2, 5), &mut cache);
    let alts = conflicting_alts_or_unique_alt(&set);
    assert_eq!(alts.into_iter().collect::<Vec<_>>(), vec![5]);
  }

  #[test]
  fn has_state_associated_with_one_alt_groups_by_state_not_context() {
    // Same state, two distinct contexts, each a singleton alt: grouping by
    // (state, context) would see two non-conflicting singleton subsets, but
    // grouping by state alone sees one state with two alts associated.
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    let ctx_a = PredictionContext::singleton(PredictionContext::empty(), 10);
    let ctx_b = PredictionContext::singleton(PredictionContext::empty(), 20);
    set.add(AtnConfig::new(1, 1, ctx_a, SemanticContext::none()), &mut cache);
    set.add(AtnConfig::new(1, 2, ctx_b, SemanticContext::none()), &mut cache);
    assert!(!has_state_associated_with_one_alt(&set));
  }

  #[test]
  fn has_state_associated_with_one_alt_true_when_a_state_agrees() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 5), &mut cache);
    set.add(cfg(2, 5), &mut cache);
    set.add(cfg(2, 6), &mut cache);
    assert!(has_state_associated_with_one_alt(&set));
  }

  #[test]
  fn conflicting_alts_or_unique_alt_falls_back_to_conflicting_group() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 1), &mut cache);
    set.add(cfg(1, 2), &mut cache);
    let alts = conflicting_alts_or_unique_alt(&set);
    assert_eq!(alts.into_iter().collect::<Vec<_>>(), vec![1, 2]);
  }
}
