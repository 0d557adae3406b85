use crate::transition::Transition;

/// A node of the ATN graph. Tagged sum over state kinds per spec §9 — no
/// virtual dispatch.
#[derive(Debug, Clone)]
pub enum ATNState {
  /// An ordinary state: zero or more outgoing transitions, no special
  /// prediction role.
  Basic { rule_index: usize, transitions: Vec<Transition> },

  /// A branch point: the state a decision's alternatives fan out from.
  /// `decision` is the index into `Atn::decision_to_state`.
  Decision { rule_index: usize, transitions: Vec<Transition>, decision: usize },

  /// The terminal state of a rule. Carries no outgoing transitions — on
  /// reaching it, the call-stack recorded in the config's
  /// `PredictionContext` determines where control returns.
  RuleStop { rule_index: usize },
}

impl ATNState {
  pub fn rule_index(&self) -> usize {
    match self {
      ATNState::Basic { rule_index, .. } => *rule_index,
      ATNState::Decision { rule_index, .. } => *rule_index,
      ATNState::RuleStop { rule_index } => *rule_index,
    }
  }

  pub fn transitions(&self) -> &[Transition] {
    match self {
      ATNState::Basic { transitions, .. } => transitions,
      ATNState::Decision { transitions, .. } => transitions,
      ATNState::RuleStop { .. } => &[],
    }
  }

  pub fn is_rule_stop(&self) -> bool {
    matches!(self, ATNState::RuleStop { .. })
  }

  pub fn is_decision(&self) -> bool {
    matches!(self, ATNState::Decision { .. })
  }

  pub fn decision(&self) -> Option<usize> {
    match self {
      ATNState::Decision { decision, .. } => Some(*decision),
      _ => None,
    }
  }

  /// True when every outgoing transition is epsilon-like. Used both by the
  /// closure optimization (don't add configs whose state can't match input
  /// on its own) and by EOF-reach promotion (spec §4.2 step 4).
  pub fn only_has_epsilon_transitions(&self) -> bool {
    self.transitions().iter().all(Transition::is_epsilon)
  }
}
