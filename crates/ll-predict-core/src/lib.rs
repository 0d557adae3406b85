//! Adaptive LL(*) prediction over an `atn_runtime::Atn`: SLL-first,
//! full-context-on-conflict, with a persistent per-decision DFA cache.
//!
//! This crate is the C2-C8 "prediction core" sitting on top of the C1 ATN
//! graph: prediction contexts (GSS), ATN configs and config sets, semantic
//! contexts, the DFA cache, reach/closure, prediction-mode conflict
//! classification, and the adaptive predictor that ties them together.

pub mod closure;
pub mod config;
pub mod dfa;
pub mod errors;
pub mod listener;
pub mod prediction_context;
pub mod prediction_mode;
pub mod predictor;
pub mod reach;
pub mod semantic_context;

pub use closure::{closure, ClosureBusy, ClosureParams};
pub use config::{AtnConfig, ConfigSet};
pub use dfa::{error_state, Dfa, DfaState};
pub use errors::{PredictError, PredictResult};
pub use listener::{ErrorListener, NoopErrorListener};
pub use prediction_context::{merge, MergeCache, PredictionContext, PredictionContextCache, EMPTY_RETURN_STATE};
pub use prediction_mode::{AltSet, PredictionMode};
pub use predictor::{AdaptivePredictor, PredictorOptions};
pub use reach::compute_reach_set;
pub use semantic_context::{Recognizer, SemanticContext};

/// Mirrors the reference simulator's `debug`/`dfa_debug` globals: a no-cost
/// no-op unless the `debug_atn` feature is on, in which case it's an
/// `eprintln!` to stderr. Never on the hot path when the feature is off.
#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => {
    #[cfg(feature = "debug_atn")]
    eprintln!($($arg)*);
  };
}
