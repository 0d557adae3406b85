use std::rc::Rc;

/// Sentinel invoking-state value used by the root `RuleContext`.
pub const NO_INVOKING_STATE: isize = -1;

/// A node in the parser's call-stack, out of scope for this crate to build
/// (the generated parser owns the tree); `ll-predict-core` only ever reads
/// `parent`/`invoking_state` while lifting a caller's stack into a
/// `PredictionContext` (`PredictionContext::from_rule_context`).
#[derive(Debug, Clone)]
pub struct RuleContext {
  pub parent: Option<Rc<RuleContext>>,
  /// ATN state the enclosing rule invocation returns to, or
  /// `NO_INVOKING_STATE` for the sentinel root.
  pub invoking_state: isize,
}

impl RuleContext {
  /// The sentinel empty call context: no parent, no invoking state.
  pub fn empty() -> Rc<RuleContext> {
    Rc::new(RuleContext { parent: None, invoking_state: NO_INVOKING_STATE })
  }

  pub fn is_empty(&self) -> bool {
    self.invoking_state == NO_INVOKING_STATE
  }
}
