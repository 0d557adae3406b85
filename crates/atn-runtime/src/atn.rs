use std::collections::VecDeque;

use crate::{
  errors::{AtnError, AtnResult},
  interval_set::IntervalSet,
  state::ATNState,
  token::TOKEN_EPSILON,
  transition::Transition,
  vocabulary::Vocabulary,
};

/// Sentinel meaning "no alternative predicted" — spec's `ATN::INVALID_ALT_NUMBER`.
/// Alt indices are 1-based; 0 is never a valid alt.
pub const INVALID_ALT_NUMBER: usize = 0;

/// The immutable, process-lifetime state+transition graph a grammar compiles
/// to. Read-only after construction (spec §3 "the ATN is read-only after
/// construction").
#[derive(Debug, Clone)]
pub struct Atn {
  states: Vec<ATNState>,
  /// Per-decision entry state index, indexed by decision number.
  decision_to_state: Vec<usize>,
  rule_to_stop_state: Vec<usize>,
  pub max_token_type: isize,
  pub vocabulary: Vocabulary,
}

impl Atn {
  pub fn state(&self, index: usize) -> &ATNState {
    &self.states[index]
  }

  pub fn states_len(&self) -> usize {
    self.states.len()
  }

  pub fn decision_state(&self, decision: usize) -> &ATNState {
    &self.states[self.decision_to_state[decision]]
  }

  pub fn decision_state_index(&self, decision: usize) -> usize {
    self.decision_to_state[decision]
  }

  pub fn num_decisions(&self) -> usize {
    self.decision_to_state.len()
  }

  pub fn rule_stop_state(&self, rule_index: usize) -> usize {
    self.rule_to_stop_state[rule_index]
  }

  /// Locally computed FOLLOW-ish set: the token types directly matchable by
  /// continuing an epsilon closure from `state_index`, without any call
  /// context. If the closure can reach a rule-stop state without consuming
  /// anything, the set also contains `TOKEN_EPSILON` — spec §4.2 step 4 uses
  /// exactly this to decide whether an epsilon-only state may be promoted to
  /// rule-stop on EOF.
  pub fn next_tokens(&self, state_index: usize) -> IntervalSet {
    let mut out = IntervalSet::new();
    let mut seen = vec![false; self.states.len()];
    let mut queue = VecDeque::from([state_index]);
    while let Some(s) = queue.pop_front() {
      if seen[s] {
        continue;
      }
      seen[s] = true;
      let state = &self.states[s];
      if state.is_rule_stop() {
        out.add_single(TOKEN_EPSILON);
        continue;
      }
      for t in state.transitions() {
        if t.is_epsilon() {
          queue.push_back(t.target());
        } else {
          out = out.union(&t.label_set(0, self.max_token_type));
        }
      }
    }
    out
  }

  /// Validates that every transition targets an in-bounds state and that
  /// decision numbers are unique — the construction-time checks spec §7
  /// assigns to `InvalidATN`.
  pub fn validate(&self) -> AtnResult<()> {
    for (from, state) in self.states.iter().enumerate() {
      for t in state.transitions() {
        if t.target() >= self.states.len() {
          return Err(AtnError::DanglingStateRef { from, to: t.target() });
        }
      }
    }
    let mut seen = vec![false; self.decision_to_state.len()];
    for state in &self.states {
      if let Some(d) = state.decision() {
        if d >= seen.len() {
          return Err(AtnError::DuplicateDecision { decision: d });
        }
        if seen[d] {
          return Err(AtnError::DuplicateDecision { decision: d });
        }
        seen[d] = true;
      }
    }
    Ok(())
  }
}

/// Incrementally assembles an `Atn`. The generated parser (or, in tests, a
/// hand-built grammar fixture) is the only expected caller — this crate
/// never deserializes a binary ATN blob itself (out of scope per spec §1).
#[derive(Debug, Default)]
pub struct AtnBuilder {
  states: Vec<ATNState>,
  decision_to_state: Vec<usize>,
  rule_to_stop_state: Vec<usize>,
  max_token_type: isize,
  vocabulary: Vocabulary,
}

impl AtnBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_max_token_type(mut self, max_token_type: isize) -> Self {
    self.max_token_type = max_token_type;
    self
  }

  pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
    self.vocabulary = vocabulary;
    self
  }

  /// Adds a state, returning its index.
  pub fn add_state(&mut self, state: ATNState) -> usize {
    if let ATNState::Decision { decision, .. } = &state {
      let decision = *decision;
      if self.decision_to_state.len() <= decision {
        self.decision_to_state.resize(decision + 1, usize::MAX);
      }
      self.decision_to_state[decision] = self.states.len();
    }
    self.states.push(state);
    self.states.len() - 1
  }

  pub fn register_rule_stop(&mut self, rule_index: usize, state_index: usize) {
    if self.rule_to_stop_state.len() <= rule_index {
      self.rule_to_stop_state.resize(rule_index + 1, usize::MAX);
    }
    self.rule_to_stop_state[rule_index] = state_index;
  }

  pub fn build(self) -> AtnResult<Atn> {
    let atn = Atn {
      states: self.states,
      decision_to_state: self.decision_to_state,
      rule_to_stop_state: self.rule_to_stop_state,
      max_token_type: self.max_token_type,
      vocabulary: self.vocabulary,
    };
    atn.validate()?;
    Ok(atn)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn next_tokens_reports_epsilon_when_rule_can_derive_empty() {
    let mut b = AtnBuilder::new().with_max_token_type(5);
    let stop = b.add_state(ATNState::RuleStop { rule_index: 0 });
    let entry = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Epsilon { target: stop }] });
    b.register_rule_stop(0, stop);
    let atn = b.build().unwrap();
    assert!(atn.next_tokens(entry).contains(TOKEN_EPSILON));
  }

  #[test]
  fn validate_rejects_dangling_transition() {
    let mut b = AtnBuilder::new();
    b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Epsilon { target: 99 }] });
    assert!(matches!(b.build(), Err(AtnError::DanglingStateRef { .. })));
  }
}
