use std::fmt;

use atn_runtime::TokenInfo;

/// Failure modes of `adaptive_predict`. Grounded on the exceptions the
/// reference runtime throws out of `execATN`/`execATNWithFullContext`.
#[derive(Debug, Clone)]
pub enum PredictError {
  /// No alternative could be predicted: every config died before a token
  /// matched, or full-context re-examination still found nothing viable.
  /// `deadend_configs` is a `(state, alt)` snapshot of the last non-empty
  /// config set for diagnostics, not for recovery.
  NoViableAlternative { decision: usize, start_index: isize, offending_token: TokenInfo, deadend_configs: Vec<(usize, usize)> },
}

pub type PredictResult<T> = Result<T, PredictError>;

impl fmt::Display for PredictError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PredictError::NoViableAlternative { decision, start_index, offending_token, .. } => {
        write!(f, "no viable alternative at decision {decision}, input index {start_index}, token type {}", offending_token.token_type)
      }
    }
  }
}

impl std::error::Error for PredictError {}
