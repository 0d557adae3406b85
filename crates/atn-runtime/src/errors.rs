use std::fmt::{self, Display};

/// Every error this crate can produce. Construction-time only: once an `ATN`
/// is built, it is read-only and infallible to query (spec §7 `InvalidATN`
/// is "fatal to construction, not to prediction").
#[derive(Clone, Debug)]
pub enum AtnError {
  /// A transition, state, or decision referenced a state index that does not
  /// exist in the graph being assembled.
  DanglingStateRef { from: usize, to: usize },

  /// A `DecisionState` was registered whose `decision` number collides with
  /// one already present.
  DuplicateDecision { decision: usize },

  /// Catch-all for messages produced by validation helpers.
  Text(String),
}

use AtnError::*;

impl Display for AtnError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DanglingStateRef { from, to } => write!(f, "state {from} transitions to non-existent state {to}"),
      DuplicateDecision { decision } => write!(f, "duplicate decision number {decision}"),
      Text(msg) => f.write_str(msg),
    }
  }
}

impl std::error::Error for AtnError {}

impl From<&str> for AtnError {
  fn from(msg: &str) -> Self {
    Text(msg.to_string())
  }
}

impl From<String> for AtnError {
  fn from(msg: String) -> Self {
    Text(msg)
  }
}

pub type AtnResult<T> = Result<T, AtnError>;
