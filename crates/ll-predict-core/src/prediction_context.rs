use std::{
  collections::HashMap,
  rc::Rc,
  sync::{Arc, Mutex},
};

use atn_runtime::{Atn, RuleContext, Transition};

/// Return-state payload used where an array context entry has no further
/// parent frame (spec §9 "a dedicated sentinel for such a pairing"). Not a
/// valid state index.
pub const EMPTY_RETURN_STATE: usize = usize::MAX;

/// A node of the graph-structured call stack (GSS) threaded through ATN
/// configs. `Empty` is the bottom of every stack: the context of a rule
/// invoked with no caller. `Singleton` and `Array` are "cons cells" onto it —
/// one return address, or several when full-context merging has combined
/// divergent callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PredictionContext {
  Empty,
  Singleton { parent: Arc<PredictionContext>, return_state: usize },
  /// Sorted by `return_states[i]`. A `None` parent entry marks a pairing
  /// with no further frame (only produced by `merge_root`'s asymmetric
  /// empty-vs-nonempty case), distinct from a shared `Empty` parent.
  Array { parents: Vec<Option<Arc<PredictionContext>>>, return_states: Vec<usize> },
}

impl PredictionContext {
  pub fn empty() -> Arc<PredictionContext> {
    Arc::new(PredictionContext::Empty)
  }

  pub fn singleton(parent: Arc<PredictionContext>, return_state: usize) -> Arc<PredictionContext> {
    Arc::new(PredictionContext::Singleton { parent, return_state })
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, PredictionContext::Empty)
  }

  pub fn parent_at(&self, i: usize) -> Option<Arc<PredictionContext>> {
    match self {
      PredictionContext::Singleton { parent, .. } => Some(parent.clone()),
      PredictionContext::Array { parents, .. } => parents[i].clone(),
      PredictionContext::Empty => None,
    }
  }

  pub fn return_state_at(&self, i: usize) -> usize {
    match self {
      PredictionContext::Singleton { return_state, .. } => *return_state,
      PredictionContext::Array { return_states, .. } => return_states[i],
      PredictionContext::Empty => EMPTY_RETURN_STATE,
    }
  }

  /// Number of `(return_state, parent)` pairs this context represents: 1 for
  /// `Singleton`/`Empty`, one per entry for `Array`.
  pub fn len(&self) -> usize {
    match self {
      PredictionContext::Array { return_states, .. } => return_states.len(),
      _ => 1,
    }
  }

  /// Whether this context's call stack may terminate here — `Empty` trivially
  /// does; a `Singleton`/`Array` does iff one of its entries is the
  /// `EMPTY_RETURN_STATE` sentinel, which (array form being sorted) is always
  /// the last entry. Grounded on `PredictionContext::hasEmptyPath` in the
  /// reference runtime; used by `getAltThatFinishedDecisionEntryRule`'s
  /// "rule-stop state with an empty-path context" rescue condition.
  pub fn has_empty_path(&self) -> bool {
    match self {
      PredictionContext::Empty => true,
      _ => self.return_state_at(self.len() - 1) == EMPTY_RETURN_STATE,
    }
  }

  /// Builds the prediction context for a full-context (LL) start state by
  /// walking the caller's invocation chain, grounded directly on
  /// `PredictionContext::fromRuleContext` in the reference runtime: each
  /// frame contributes the follow state of the `Rule` transition the caller
  /// invoked through.
  pub fn from_rule_context(atn: &Atn, outer_context: Option<&Rc<RuleContext>>) -> Arc<PredictionContext> {
    let ctx = match outer_context {
      None => return PredictionContext::empty(),
      Some(ctx) if ctx.is_empty() => return PredictionContext::empty(),
      Some(ctx) => ctx,
    };
    let parent = PredictionContext::from_rule_context(atn, ctx.parent.as_ref());
    let state = atn.state(ctx.invoking_state as usize);
    let follow_state = state
      .transitions()
      .iter()
      .find_map(|t| match t {
        Transition::Rule { follow_state, .. } => Some(*follow_state),
        _ => None,
      })
      .expect("invoking state must carry a rule transition");
    PredictionContext::singleton(parent, follow_state)
  }
}

/// Per-prediction scratch: memoizes `merge` results for the lifetime of one
/// `adaptive_predict` call. Not shared across threads or predictions (spec
/// §9's thread-local scratch set).
pub type MergeCache = HashMap<(Arc<PredictionContext>, Arc<PredictionContext>), Arc<PredictionContext>>;

/// `a ⊕ b`: combines two call-stack contexts into the single context
/// representing "either caller". `root_is_wildcard` is `true` in SLL mode
/// (where a bare `Empty` context on either side absorbs the merge, since SLL
/// ignores what lies beyond the outermost rule) and `false` in full-context
/// (LL) mode, where an asymmetric empty/non-empty pairing must itself be
/// represented rather than discarded.
pub fn merge(a: &Arc<PredictionContext>, b: &Arc<PredictionContext>, root_is_wildcard: bool, cache: &mut MergeCache) -> Arc<PredictionContext> {
  if Arc::ptr_eq(a, b) {
    return a.clone();
  }
  match (a.as_ref(), b.as_ref()) {
    (PredictionContext::Array { .. }, _) | (_, PredictionContext::Array { .. }) => merge_arrays(a, b, root_is_wildcard, cache),
    _ => merge_singletons(a, b, root_is_wildcard, cache),
  }
}

fn cache_get(cache: &MergeCache, a: &Arc<PredictionContext>, b: &Arc<PredictionContext>) -> Option<Arc<PredictionContext>> {
  cache.get(&(a.clone(), b.clone())).or_else(|| cache.get(&(b.clone(), a.clone()))).cloned()
}

fn merge_root(a: &Arc<PredictionContext>, b: &Arc<PredictionContext>, root_is_wildcard: bool) -> Option<Arc<PredictionContext>> {
  if root_is_wildcard {
    if a.is_empty() || b.is_empty() {
      return Some(PredictionContext::empty());
    }
    return None;
  }
  if a.is_empty() && b.is_empty() {
    return Some(PredictionContext::empty());
  }
  if a.is_empty() {
    return Some(Arc::new(PredictionContext::Array {
      parents: vec![b.parent_at(0), None],
      return_states: sorted_pair(b.return_state_at(0), EMPTY_RETURN_STATE),
    }));
  }
  if b.is_empty() {
    return Some(Arc::new(PredictionContext::Array {
      parents: vec![a.parent_at(0), None],
      return_states: sorted_pair(a.return_state_at(0), EMPTY_RETURN_STATE),
    }));
  }
  None
}

fn sorted_pair(x: usize, y: usize) -> Vec<usize> {
  if x <= y {
    vec![x, y]
  } else {
    vec![y, x]
  }
}

fn merge_singletons(a: &Arc<PredictionContext>, b: &Arc<PredictionContext>, root_is_wildcard: bool, cache: &mut MergeCache) -> Arc<PredictionContext> {
  if let Some(hit) = cache_get(cache, a, b) {
    return hit;
  }
  if let Some(root) = merge_root(a, b, root_is_wildcard) {
    cache.insert((a.clone(), b.clone()), root.clone());
    return root;
  }

  let a_return = a.return_state_at(0);
  let b_return = b.return_state_at(0);
  let a_parent = a.parent_at(0).unwrap_or_else(PredictionContext::empty);
  let b_parent = b.parent_at(0).unwrap_or_else(PredictionContext::empty);

  if a_return == b_return {
    let merged_parent = merge(&a_parent, &b_parent, root_is_wildcard, cache);
    if Arc::ptr_eq(&merged_parent, &a_parent) {
      cache.insert((a.clone(), b.clone()), a.clone());
      return a.clone();
    }
    if Arc::ptr_eq(&merged_parent, &b_parent) {
      cache.insert((a.clone(), b.clone()), b.clone());
      return b.clone();
    }
    let merged = PredictionContext::singleton(merged_parent, a_return);
    cache.insert((a.clone(), b.clone()), merged.clone());
    return merged;
  }

  let single_parent = if a_parent == b_parent { Some(a_parent.clone()) } else { None };
  let merged = if let Some(parent) = single_parent {
    Arc::new(PredictionContext::Array { parents: vec![Some(parent.clone()), Some(parent)], return_states: sorted_pair(a_return, b_return) })
  } else if a_return < b_return {
    Arc::new(PredictionContext::Array { parents: vec![Some(a_parent), Some(b_parent)], return_states: vec![a_return, b_return] })
  } else {
    Arc::new(PredictionContext::Array { parents: vec![Some(b_parent), Some(a_parent)], return_states: vec![b_return, a_return] })
  };
  cache.insert((a.clone(), b.clone()), merged.clone());
  merged
}

fn merge_arrays(a: &Arc<PredictionContext>, b: &Arc<PredictionContext>, root_is_wildcard: bool, cache: &mut MergeCache) -> Arc<PredictionContext> {
  if let Some(hit) = cache_get(cache, a, b) {
    return hit;
  }
  if let Some(root) = merge_root(a, b, root_is_wildcard) {
    cache.insert((a.clone(), b.clone()), root.clone());
    return root;
  }

  let (a_len, b_len) = (a.len(), b.len());
  let mut parents = Vec::with_capacity(a_len + b_len);
  let mut return_states = Vec::with_capacity(a_len + b_len);
  let (mut i, mut j) = (0, 0);
  while i < a_len && j < b_len {
    let a_parent = a.parent_at(i);
    let b_parent = b.parent_at(j);
    let a_state = a.return_state_at(i);
    let b_state = b.return_state_at(j);
    if a_state == b_state {
      let both_absent = a_state == EMPTY_RETURN_STATE && a_parent.is_none() && b_parent.is_none();
      let equal_parents = matches!((&a_parent, &b_parent), (Some(ap), Some(bp)) if ap == bp);
      let merged_parent = if both_absent || equal_parents {
        a_parent
      } else {
        match (a_parent, b_parent) {
          (Some(ap), Some(bp)) => Some(merge(&ap, &bp, root_is_wildcard, cache)),
          (Some(ap), None) => Some(ap),
          (None, Some(bp)) => Some(bp),
          (None, None) => None,
        }
      };
      parents.push(merged_parent);
      return_states.push(a_state);
      i += 1;
      j += 1;
    } else if a_state < b_state {
      parents.push(a_parent);
      return_states.push(a_state);
      i += 1;
    } else {
      parents.push(b_parent);
      return_states.push(b_state);
      j += 1;
    }
  }
  while i < a_len {
    parents.push(a.parent_at(i));
    return_states.push(a.return_state_at(i));
    i += 1;
  }
  while j < b_len {
    parents.push(b.parent_at(j));
    return_states.push(b.return_state_at(j));
    j += 1;
  }

  let merged = if return_states.len() == 1 {
    match parents.into_iter().next().unwrap() {
      Some(parent) => PredictionContext::singleton(parent, return_states[0]),
      None => Arc::new(PredictionContext::Array { parents: vec![None], return_states }),
    }
  } else {
    Arc::new(PredictionContext::Array { parents, return_states })
  };

  let merged = if merged.as_ref() == a.as_ref() {
    a.clone()
  } else if merged.as_ref() == b.as_ref() {
    b.clone()
  } else {
    merged
  };
  cache.insert((a.clone(), b.clone()), merged.clone());
  merged
}

/// Structural interning (hash-consing) for `PredictionContext` values,
/// shared across an `Atn`'s lifetime — grounded on `ATNSimulator`'s
/// mutex-guarded `sharedContextCache` in the reference runtime. Collapses
/// structurally-equal contexts built by independent closure steps onto one
/// `Arc`, which also makes `Arc::ptr_eq` a valid fast path for equality.
#[derive(Default)]
pub struct PredictionContextCache {
  interned: Mutex<HashMap<PredictionContext, Arc<PredictionContext>>>,
}

impl PredictionContextCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn intern(&self, ctx: Arc<PredictionContext>) -> Arc<PredictionContext> {
    let mut table = match self.interned.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(existing) = table.get(ctx.as_ref()) {
      return existing.clone();
    }
    table.insert(ctx.as_ref().clone(), ctx.clone());
    ctx
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn merging_identical_singletons_is_a_noop() {
    let parent = PredictionContext::empty();
    let a = PredictionContext::singleton(parent.clone(), 3);
    let b = PredictionContext::singleton(parent, 3);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &b, true, &mut cache);
    assert_eq!(merged.as_ref(), a.as_ref());
  }

  #[test]
  fn merging_singletons_with_same_parent_different_return_states_makes_array() {
    let parent = PredictionContext::empty();
    let a = PredictionContext::singleton(parent.clone(), 5);
    let b = PredictionContext::singleton(parent, 2);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &b, true, &mut cache);
    match merged.as_ref() {
      PredictionContext::Array { return_states, .. } => assert_eq!(return_states, &vec![2, 5]),
      other => panic!("expected array context, got {other:?}"),
    }
  }

  #[test]
  fn sll_merge_of_empty_and_nonempty_collapses_to_empty() {
    let nonempty = PredictionContext::singleton(PredictionContext::empty(), 7);
    let mut cache = MergeCache::new();
    let merged = merge(&PredictionContext::empty(), &nonempty, true, &mut cache);
    assert!(merged.is_empty());
  }

  #[test]
  fn ll_merge_of_empty_and_nonempty_preserves_both_paths() {
    let nonempty = PredictionContext::singleton(PredictionContext::empty(), 7);
    let mut cache = MergeCache::new();
    let merged = merge(&PredictionContext::empty(), &nonempty, false, &mut cache);
    match merged.as_ref() {
      PredictionContext::Array { return_states, .. } => assert_eq!(return_states, &vec![7, EMPTY_RETURN_STATE]),
      other => panic!("expected array context, got {other:?}"),
    }
  }

  #[test]
  fn merge_cache_returns_memoized_result_for_swapped_operands() {
    let parent = PredictionContext::empty();
    let a = PredictionContext::singleton(parent.clone(), 5);
    let b = PredictionContext::singleton(parent, 2);
    let mut cache = MergeCache::new();
    let first = merge(&a, &b, true, &mut cache);
    let second = merge(&b, &a, true, &mut cache);
    assert_eq!(first.as_ref(), second.as_ref());
  }

  #[test]
  fn empty_context_has_empty_path() {
    assert!(PredictionContext::empty().has_empty_path());
  }

  #[test]
  fn singleton_with_real_parent_has_no_empty_path() {
    let ctx = PredictionContext::singleton(PredictionContext::empty(), 7);
    assert!(!ctx.has_empty_path());
  }

  #[test]
  fn array_with_empty_return_state_entry_has_empty_path() {
    let nonempty = PredictionContext::singleton(PredictionContext::empty(), 7);
    let mut cache = MergeCache::new();
    let merged = merge(&PredictionContext::empty(), &nonempty, false, &mut cache);
    assert!(merged.has_empty_path());
  }
}
