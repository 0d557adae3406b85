//! Hand-built ATN fixtures and a minimal `TokenStream` to drive
//! `adaptive_predict` end-to-end, without a real grammar front end (out of
//! scope per spec.md §1 — this crate never compiles grammars itself).

use std::cell::RefCell;

use atn_runtime::{ATNState, Atn, AtnBuilder, TokenInfo, Transition};
use ll_predict_core::{AltSet, ConfigSet, Recognizer};

pub const TOK_A: isize = 1;
pub const TOK_B: isize = 2;
pub const TOK_C: isize = 3;
pub const TOK_ID: isize = 1;

/// `S: A B | A C;` — a single decision (alt 1 matches `A B`, alt 2 matches
/// `A C`) sharing the common `A` prefix, all within rule 0.
pub fn build_ab_ac_atn() -> Atn {
  let mut b = AtnBuilder::new().with_max_token_type(3);
  let s_stop = b.add_state(ATNState::RuleStop { rule_index: 0 });
  let after_b = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: s_stop, label: TOK_B }] });
  let alt1 = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: after_b, label: TOK_A }] });
  let after_c = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: s_stop, label: TOK_C }] });
  let alt2 = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: after_c, label: TOK_A }] });
  b.add_state(ATNState::Decision {
    rule_index: 0,
    transitions: vec![Transition::Epsilon { target: alt1 }, Transition::Epsilon { target: alt2 }],
    decision: 0,
  });
  b.register_rule_stop(0, s_stop);
  b.build().unwrap()
}

/// `S: {p1}? A | {p2}? A;` — both alts match the same token, distinguished
/// only by a predicate gating the entry to each.
pub fn build_predicate_atn() -> Atn {
  let mut b = AtnBuilder::new().with_max_token_type(1);
  let s_stop = b.add_state(ATNState::RuleStop { rule_index: 0 });
  let alt1_match = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: s_stop, label: TOK_A }] });
  let alt1_pred = b.add_state(ATNState::Basic {
    rule_index: 0,
    transitions: vec![Transition::Predicate { target: alt1_match, rule_index: 0, pred_index: 0, ctx_dependent: false }],
  });
  let alt2_match = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Atom { target: s_stop, label: TOK_A }] });
  let alt2_pred = b.add_state(ATNState::Basic {
    rule_index: 0,
    transitions: vec![Transition::Predicate { target: alt2_match, rule_index: 0, pred_index: 1, ctx_dependent: false }],
  });
  b.add_state(ATNState::Decision {
    rule_index: 0,
    transitions: vec![Transition::Epsilon { target: alt1_pred }, Transition::Epsilon { target: alt2_pred }],
    decision: 0,
  });
  b.register_rule_stop(0, s_stop);
  b.build().unwrap()
}

/// `S: a | b; a: ID; b: ID;` — two rules with identical bodies called from
/// the decision under test. SLL always reports `{1,2}` conflicting (both
/// threads dip into outer context at the same rule-stop state); since `a`
/// and `b` are indistinguishable, full context can't break the tie either —
/// it's genuine ambiguity, not a missing-context artifact, and is reported
/// as such once input runs out.
pub fn build_identical_calls_atn() -> Atn {
  let mut b = AtnBuilder::new().with_max_token_type(1);
  let s_stop = b.add_state(ATNState::RuleStop { rule_index: 0 });
  let after1 = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Epsilon { target: s_stop }] });
  let a_stop = b.add_state(ATNState::RuleStop { rule_index: 1 });
  let a_entry = b.add_state(ATNState::Basic { rule_index: 1, transitions: vec![Transition::Atom { target: a_stop, label: TOK_ID }] });
  let after2 = b.add_state(ATNState::Basic { rule_index: 0, transitions: vec![Transition::Epsilon { target: s_stop }] });
  let b_stop = b.add_state(ATNState::RuleStop { rule_index: 2 });
  let b_entry = b.add_state(ATNState::Basic { rule_index: 2, transitions: vec![Transition::Atom { target: b_stop, label: TOK_ID }] });
  b.add_state(ATNState::Decision {
    rule_index: 0,
    transitions: vec![
      Transition::Rule { target: a_entry, follow_state: after1 },
      Transition::Rule { target: b_entry, follow_state: after2 },
    ],
    decision: 0,
  });
  b.register_rule_stop(0, s_stop);
  b.register_rule_stop(1, a_stop);
  b.register_rule_stop(2, b_stop);
  b.build().unwrap()
}

/// A token stream over a fixed vector of token types, `EOF` beyond the end.
pub struct VecTokenStream {
  tokens: Vec<TokenInfo>,
  pos: usize,
}

impl VecTokenStream {
  pub fn new(token_types: &[isize]) -> Self {
    let tokens = token_types.iter().map(|&token_type| TokenInfo { token_type, line: 1, char_position_in_line: 0, channel: 0 }).collect();
    Self { tokens, pos: 0 }
  }
}

impl atn_runtime::IntStream for VecTokenStream {
  fn index(&self) -> usize {
    self.pos
  }

  fn mark(&mut self) -> atn_runtime::MarkHandle {
    atn_runtime::MarkHandle(self.pos as isize)
  }

  fn release(&mut self, _mark: atn_runtime::MarkHandle) {}

  fn seek(&mut self, index: usize) {
    self.pos = index;
  }

  fn size(&self) -> Option<usize> {
    Some(self.tokens.len())
  }
}

impl atn_runtime::TokenStream for VecTokenStream {
  fn la(&mut self, k: isize) -> isize {
    self.lt(k).token_type
  }

  fn lt(&mut self, k: isize) -> TokenInfo {
    let idx = self.pos + (k - 1) as usize;
    self.tokens.get(idx).copied().unwrap_or(TokenInfo::eof(1, 0))
  }

  fn consume(&mut self) {
    self.pos += 1;
  }

  fn get(&mut self, index: usize) -> TokenInfo {
    self.tokens.get(index).copied().unwrap_or(TokenInfo::eof(1, 0))
  }
}

/// A `Recognizer` whose `sempred` answers come from a fixed table, indexed
/// by `pred_index` — enough to drive the predicate-hoisting scenarios
/// without a real parser behind it.
pub struct FixedPredicates(pub Vec<bool>);

impl Recognizer for FixedPredicates {
  fn sempred(&self, _rule_index: usize, pred_index: usize) -> bool {
    self.0.get(pred_index).copied().unwrap_or(false)
  }

  fn precpred(&self, _precedence: i32) -> bool {
    true
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
  Ambiguity { exact: bool, alts: AltSet },
  AttemptingFullContext,
  ContextSensitivity { prediction: usize },
}

/// Records every listener callback instead of acting on it, so tests can
/// assert on exactly which diagnostics fired.
#[derive(Default)]
pub struct RecordingListener {
  events: RefCell<Vec<ListenerEvent>>,
}

impl RecordingListener {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<ListenerEvent> {
    self.events.borrow().clone()
  }
}

impl ll_predict_core::ErrorListener for RecordingListener {
  fn report_ambiguity(&self, _decision: usize, _start_index: isize, _stop_index: isize, exact: bool, ambig_alts: &AltSet, _configs: &ConfigSet) {
    self.events.borrow_mut().push(ListenerEvent::Ambiguity { exact, alts: ambig_alts.clone() });
  }

  fn report_attempting_full_context(
    &self,
    _decision: usize,
    _start_index: isize,
    _stop_index: isize,
    _conflicting_alts: Option<&AltSet>,
    _configs: &ConfigSet,
  ) {
    self.events.borrow_mut().push(ListenerEvent::AttemptingFullContext);
  }

  fn report_context_sensitivity(&self, _decision: usize, _start_index: isize, _stop_index: isize, prediction: usize, _configs: &ConfigSet) {
    self.events.borrow_mut().push(ListenerEvent::ContextSensitivity { prediction });
  }
}
