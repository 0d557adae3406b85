use crate::{interval_set::IntervalSet, token::TOKEN_EPSILON};

/// A single outgoing edge of an `ATNState`. Tagged sum over transition kinds
/// per spec §3/§9 — no virtual dispatch, pattern-match on the tag.
#[derive(Debug, Clone)]
pub enum Transition {
  /// Consumes no input.
  Epsilon { target: usize },

  /// Invokes another rule, returning to `follow_state` on completion.
  Rule { target: usize, follow_state: usize },

  /// Matches a single token type.
  Atom { target: usize, label: isize },

  /// Matches any token type present in `set`.
  Set { target: usize, set: IntervalSet },

  /// Matches any token type *not* present in `set`.
  NotSet { target: usize, set: IntervalSet },

  /// Matches any token type within `[start, stop]`.
  Range { target: usize, start: isize, stop: isize },

  /// Matches any token type.
  Wildcard { target: usize },

  /// Consumes no input; gates traversal on a semantic predicate.
  Predicate { target: usize, rule_index: usize, pred_index: usize, ctx_dependent: bool },

  /// Consumes no input; gates traversal on `precedence >= current precedence`.
  Precedence { target: usize, precedence: i32 },

  /// Consumes no input; runs a grammar action (never contributes to
  /// semantic context — predicate collection is suppressed across it).
  Action { target: usize, rule_index: usize, action_index: usize },
}

impl Transition {
  pub fn target(&self) -> usize {
    match self {
      Transition::Epsilon { target }
      | Transition::Rule { target, .. }
      | Transition::Atom { target, .. }
      | Transition::Set { target, .. }
      | Transition::NotSet { target, .. }
      | Transition::Range { target, .. }
      | Transition::Wildcard { target }
      | Transition::Predicate { target, .. }
      | Transition::Precedence { target, .. }
      | Transition::Action { target, .. } => *target,
    }
  }

  /// True for transitions that consume no input token (epsilon-closure
  /// traversable).
  pub fn is_epsilon(&self) -> bool {
    matches!(
      self,
      Transition::Epsilon { .. }
        | Transition::Rule { .. }
        | Transition::Predicate { .. }
        | Transition::Precedence { .. }
        | Transition::Action { .. }
    )
  }

  /// Whether this transition matches a concrete token type (used by
  /// `getReachableTarget`, spec §4.2). `min`/`max` bound the valid token
  /// range, mirroring ANTLR's `Transition::matches`.
  pub fn matches(&self, token_type: isize, min: isize, max: isize) -> bool {
    match self {
      Transition::Atom { label, .. } => *label == token_type,
      Transition::Set { set, .. } => set.contains(token_type),
      Transition::NotSet { set, .. } => token_type >= min && token_type <= max && !set.contains(token_type),
      Transition::Range { start, stop, .. } => token_type >= *start && token_type <= *stop,
      Transition::Wildcard { .. } => token_type >= min && token_type <= max,
      _ => false,
    }
  }

  /// Token types this transition can match directly, for local `next_tokens`
  /// computation. Epsilon-like transitions contribute nothing here; callers
  /// instead continue the closure through them.
  pub fn label_set(&self, min: isize, max: isize) -> IntervalSet {
    match self {
      Transition::Atom { label, .. } => IntervalSet::single(*label),
      Transition::Set { set, .. } => set.clone(),
      Transition::Range { start, stop, .. } => IntervalSet::range(*start, *stop),
      Transition::Wildcard { .. } => IntervalSet::range(min, max),
      Transition::NotSet { set, .. } => {
        let mut out = IntervalSet::new();
        for t in min..=max {
          if !set.contains(t) {
            out.add_single(t);
          }
        }
        out
      }
      _ => IntervalSet::new(),
    }
  }
}

/// The sentinel label carried by an epsilon edge, exposed for callers that
/// want to test `IntervalSet::contains(TOKEN_EPSILON)` against a
/// `next_tokens` result (spec §4.2 step 4).
pub const EPSILON_LABEL: isize = TOKEN_EPSILON;
