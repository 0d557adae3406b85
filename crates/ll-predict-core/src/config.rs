use std::{
  collections::HashMap,
  hash::{Hash, Hasher},
  sync::Arc,
};

use atn_runtime::Atn;

use crate::{
  prediction_context::{merge, MergeCache, PredictionContext, PredictionContextCache},
  semantic_context::SemanticContext,
};

/// One "thread" of the simulation: a state to resume at, the alternative it
/// is pursuing, the call stack it would return through, and any predicate
/// still gating it. Equality and hashing deliberately ignore `context` —
/// spec §9: two configs that agree on `(state, alt, semantic_context)` are
/// the same thread for merge/dedup purposes, with their call-stacks
/// combined via `PredictionContext::merge` rather than kept as duplicates.
#[derive(Debug, Clone)]
pub struct AtnConfig {
  pub state: usize,
  pub alt: usize,
  pub context: Arc<PredictionContext>,
  pub semantic_context: Arc<SemanticContext>,
  /// >0 once closure has "fallen off" the end of the outermost rule in SLL
  /// mode — tracks how many rule-stop pops happened past the start context.
  pub reaches_into_outer_context: usize,
}

impl AtnConfig {
  pub fn new(state: usize, alt: usize, context: Arc<PredictionContext>, semantic_context: Arc<SemanticContext>) -> Self {
    Self { state, alt, context, semantic_context, reaches_into_outer_context: 0 }
  }

  pub fn with_state(&self, state: usize) -> Self {
    Self { state, ..self.clone() }
  }

  pub fn with_context(&self, context: Arc<PredictionContext>) -> Self {
    Self { context, ..self.clone() }
  }

  pub fn with_semantic_context(&self, semantic_context: Arc<SemanticContext>) -> Self {
    Self { semantic_context, ..self.clone() }
  }
}

impl PartialEq for AtnConfig {
  fn eq(&self, other: &Self) -> bool {
    self.state == other.state && self.alt == other.alt && self.semantic_context == other.semantic_context
  }
}
impl Eq for AtnConfig {}

impl Hash for AtnConfig {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.state.hash(state);
    self.alt.hash(state);
    self.semantic_context.hash(state);
  }
}

/// The merging container closure/reach accumulate configs into. Grounded on
/// `ATNConfigSet` in the reference runtime: a vector preserving insertion
/// order (so the lowest-numbered alt wins ties) plus a hash index keyed by
/// `(state, alt, semantic_context)` that merges contexts for configs already
/// present instead of duplicating them.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
  configs: Vec<AtnConfig>,
  lookup: HashMap<AtnConfig, usize>,
  pub has_semantic_context: bool,
  pub dips_into_outer_context: bool,
  /// Full-context (LL) sets use `root_is_wildcard = false` when merging
  /// contexts on insert; SLL sets use `true`.
  pub full_ctx: bool,
  read_only: bool,
}

impl ConfigSet {
  pub fn new(full_ctx: bool) -> Self {
    Self { full_ctx, ..Self::default() }
  }

  pub fn len(&self) -> usize {
    self.configs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configs.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &AtnConfig> {
    self.configs.iter()
  }

  pub fn is_readonly(&self) -> bool {
    self.read_only
  }

  pub fn set_readonly(&mut self, value: bool) {
    self.read_only = value;
  }

  /// Inserts `config`, merging its call-stack context into an existing
  /// config's if one with the same `(state, alt, semantic_context)` is
  /// already present.
  pub fn add(&mut self, config: AtnConfig, merge_cache: &mut MergeCache) {
    debug_assert!(!self.read_only, "cannot add to a frozen ConfigSet");
    if !config.semantic_context.is_none() {
      self.has_semantic_context = true;
    }
    if config.reaches_into_outer_context > 0 {
      self.dips_into_outer_context = true;
    }
    if let Some(&idx) = self.lookup.get(&config) {
      let root_is_wildcard = !self.full_ctx;
      let merged_context = merge(&self.configs[idx].context, &config.context, root_is_wildcard, merge_cache);
      let existing = &mut self.configs[idx];
      existing.reaches_into_outer_context = existing.reaches_into_outer_context.max(config.reaches_into_outer_context);
      existing.context = merged_context;
    } else {
      let idx = self.configs.len();
      self.lookup.insert(config.clone(), idx);
      self.configs.push(config);
    }
  }

  pub fn extend(&mut self, other: &ConfigSet, merge_cache: &mut MergeCache) {
    for config in other.iter() {
      self.add(config.clone(), merge_cache);
    }
  }

  /// True if any member config sits on a rule's stop state — used by
  /// `computeReachSet`'s decision to re-add skipped stop-state configs only
  /// when the fresh reach set doesn't already have one of its own.
  pub fn has_config_in_rule_stop_state(&self, atn: &Atn) -> bool {
    self.configs.iter().any(|c| atn.state(c.state).is_rule_stop())
  }

  /// The single alt shared by every config, or `None` if the set is empty
  /// or spans more than one alt (spec §4.2's `getUniqueAlt`).
  pub fn unique_alt(&self) -> Option<usize> {
    let mut alts = self.configs.iter().map(|c| c.alt);
    let first = alts.next()?;
    if alts.all(|a| a == first) {
      Some(first)
    } else {
      None
    }
  }

  /// Distinct alt numbers present, ascending.
  pub fn alts(&self) -> Vec<usize> {
    let mut out: Vec<usize> = self.configs.iter().map(|c| c.alt).collect();
    out.sort_unstable();
    out.dedup();
    out
  }

  /// Collapses every member's context through the shared interning cache,
  /// so contexts built independently by separate closure steps end up
  /// sharing one `Arc` when they're structurally equal. Grounded on
  /// `ATNSimulator::optimizeConfigs`; run once, right before a config set is
  /// frozen into a `DFAState`.
  pub fn optimize_contexts(&mut self, cache: &PredictionContextCache) {
    debug_assert!(!self.read_only, "cannot optimize a frozen ConfigSet");
    for c in self.configs.iter_mut() {
      c.context = cache.intern(c.context.clone());
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn cfg(state: usize, alt: usize, return_state: usize) -> AtnConfig {
    let ctx = PredictionContext::singleton(PredictionContext::empty(), return_state);
    AtnConfig::new(state, alt, ctx, SemanticContext::none())
  }

  #[test]
  fn add_merges_contexts_for_duplicate_state_alt_pairs() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 1, 10), &mut cache);
    set.add(cfg(1, 1, 20), &mut cache);
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn distinct_alts_are_kept_separate() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 1, 10), &mut cache);
    set.add(cfg(1, 2, 10), &mut cache);
    assert_eq!(set.len(), 2);
    assert_eq!(set.unique_alt(), None);
  }

  #[test]
  fn unique_alt_reports_shared_alt() {
    let mut set = ConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(cfg(1, 3, 10), &mut cache);
    set.add(cfg(2, 3, 10), &mut cache);
    assert_eq!(set.unique_alt(), Some(3));
  }
}
