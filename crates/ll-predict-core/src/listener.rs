use crate::{config::ConfigSet, prediction_mode::AltSet};

/// Diagnostic hooks the predictor calls out to on ambiguity, an SLL-to-LL
/// escalation, or a context-sensitivity resolution. Every method is a
/// no-op by default — grounded on the reference runtime's behavior when no
/// parser/listener is attached (`getErrorListenerDispatch()` returning a
/// listener whose methods do nothing).
pub trait ErrorListener {
  /// More than one alt is viable for the same input, even with full
  /// context. `exact` is true only under `LlExactAmbigDetection` once every
  /// conflicting subset was confirmed equal.
  fn report_ambiguity(&self, _decision: usize, _start_index: isize, _stop_index: isize, _exact: bool, _ambig_alts: &AltSet, _configs: &ConfigSet) {}

  /// SLL hit a real conflict and is retrying the same input span with full
  /// context.
  fn report_attempting_full_context(&self, _decision: usize, _start_index: isize, _stop_index: isize, _conflicting_alts: Option<&AltSet>, _configs: &ConfigSet) {}

  /// Full context was required to resolve a decision SLL alone couldn't —
  /// informational, not an error.
  fn report_context_sensitivity(&self, _decision: usize, _start_index: isize, _stop_index: isize, _prediction: usize, _configs: &ConfigSet) {}
}

/// The listener used when a caller doesn't want diagnostics.
pub struct NoopErrorListener;
impl ErrorListener for NoopErrorListener {}
