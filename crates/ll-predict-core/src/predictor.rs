use std::{
  rc::Rc,
  sync::{Arc, Mutex},
};

use atn_runtime::{Atn, RuleContext, TokenStream, TOKEN_EOF};

use crate::trace;

use crate::{
  closure::{closure, ClosureBusy, ClosureParams},
  config::{AtnConfig, ConfigSet},
  dfa::{error_state, Dfa, DfaState},
  errors::{PredictError, PredictResult},
  listener::ErrorListener,
  prediction_context::{MergeCache, PredictionContext, PredictionContextCache},
  prediction_mode::{self, AltSet, PredictionMode},
  reach::compute_reach_set,
  semantic_context::{Recognizer, SemanticContext},
};

/// Builder-style configuration for an `AdaptivePredictor`, in the spirit of
/// the generated parser's own `ParserConfig`: construct with defaults, chain
/// setters, hand the result to `AdaptivePredictor::new`.
#[derive(Debug, Clone, Copy)]
pub struct PredictorOptions {
  pub mode: PredictionMode,
}

impl Default for PredictorOptions {
  fn default() -> Self {
    Self { mode: PredictionMode::Ll }
  }
}

impl PredictorOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_mode(mut self, mode: PredictionMode) -> Self {
    self.mode = mode;
    self
  }
}

/// Owns one per-decision DFA cache and the shared prediction-context
/// interning table for a single `Atn`. Grounded on `ParserATNSimulator`:
/// `adaptive_predict` is the only entry point a generated parser calls, one
/// `Dfa` persists per decision across every call for the `Atn`'s lifetime.
pub struct AdaptivePredictor<'a> {
  atn: &'a Atn,
  /// Runtime-mutable, behind a mutex rather than `options`'s plain field —
  /// spec §6's `setPredictionMode` lets a parser flip modes between calls on
  /// a shared predictor, unlike the rest of `PredictorOptions`, which is
  /// fixed at construction.
  mode: Mutex<PredictionMode>,
  dfas: Vec<Dfa>,
  context_cache: PredictionContextCache,
}

impl<'a> AdaptivePredictor<'a> {
  pub fn new(atn: &'a Atn, options: PredictorOptions) -> Self {
    let dfas = (0..atn.num_decisions()).map(Dfa::new).collect();
    Self { atn, mode: Mutex::new(options.mode), dfas, context_cache: PredictionContextCache::new() }
  }

  pub fn atn(&self) -> &Atn {
    self.atn
  }

  /// Spec §6's `getPredictionMode`.
  pub fn prediction_mode(&self) -> PredictionMode {
    *self.mode.lock().unwrap_or_else(|p| p.into_inner())
  }

  /// Spec §6's `setPredictionMode`: takes effect on the next `adaptive_predict`
  /// call, not the one in progress.
  pub fn set_prediction_mode(&self, mode: PredictionMode) {
    *self.mode.lock().unwrap_or_else(|p| p.into_inner()) = mode;
  }

  /// Spec §6's `clearDFA`: drops every interned DFA state for every
  /// decision, so the next `adaptive_predict` call rebuilds each decision's
  /// cache from scratch.
  pub fn clear_dfa(&self) {
    for dfa in &self.dfas {
      dfa.clear();
    }
  }

  /// Predicts which alternative of `decision` the parser should take,
  /// starting SLL and escalating to full context only on a genuine
  /// conflict. Grounded on `ParserATNSimulator::adaptivePredict`: marks the
  /// input so every intermediate lookahead is undone before returning,
  /// success or failure alike.
  pub fn adaptive_predict(
    &self,
    input: &mut dyn TokenStream,
    decision: usize,
    outer_context: Option<&Rc<RuleContext>>,
    recognizer: Option<&dyn Recognizer>,
    listener: &dyn ErrorListener,
  ) -> PredictResult<usize> {
    let dfa = &self.dfas[decision];
    let mark = input.mark();
    let start_index = input.index();
    let outcome = (|| {
      let s0 = match dfa.s0() {
        Some(s) => s,
        None => {
          let mut merge_cache = MergeCache::new();
          let configs = self.compute_start_state(dfa.decision, outer_context, false, recognizer, &mut merge_cache);
          let s0 = dfa.intern(self.build_dfa_state(configs), &self.context_cache);
          dfa.set_s0(s0.clone());
          s0
        }
      };
      self.exec_atn(dfa, s0, input, start_index, outer_context, recognizer, listener)
    })();
    input.seek(start_index);
    input.release(mark);
    outcome
  }

  /// Builds the initial config set for a decision: one config per
  /// outgoing alternative, epsilon-closed. `full_ctx` selects whether the
  /// call stack starts as `Empty` (SLL) or as the caller's real invocation
  /// chain (LL), per `ParserATNSimulator::computeStartState`.
  fn compute_start_state(
    &self,
    decision: usize,
    outer_context: Option<&Rc<RuleContext>>,
    full_ctx: bool,
    recognizer: Option<&dyn Recognizer>,
    merge_cache: &mut MergeCache,
  ) -> ConfigSet {
    let p = self.atn.decision_state(decision);
    let mut configs = ConfigSet::new(full_ctx);
    let params = ClosureParams { atn: self.atn, full_ctx, collect_predicates: true, recognizer, context_cache: Some(&self.context_cache) };
    for (i, t) in p.transitions().iter().enumerate() {
      let initial_context =
        if full_ctx { PredictionContext::from_rule_context(self.atn, outer_context) } else { PredictionContext::empty() };
      let config = AtnConfig::new(t.target(), i + 1, initial_context, SemanticContext::none());
      let mut busy = ClosureBusy::new();
      closure(config, &mut configs, &mut busy, 0, &params, merge_cache);
    }
    configs
  }

  fn classify_configs(&self, configs: &ConfigSet) -> (bool, Option<usize>, bool, AltSet) {
    if let Some(alt) = configs.unique_alt() {
      return (true, Some(alt), false, AltSet::new());
    }
    if prediction_mode::has_sll_conflict_terminating_prediction(configs, self.atn) {
      let conflicting_alts = prediction_mode::conflicting_alts_or_unique_alt(configs);
      return (false, None, true, conflicting_alts);
    }
    (false, None, false, AltSet::new())
  }

  /// Classifies `configs` (unique alt / conflict / neither) and, if any
  /// config carries a predicate, collects the `(predicate, alt)` pairs a
  /// future visit to this state will need to evaluate.
  fn build_dfa_state(&self, configs: ConfigSet) -> DfaState {
    let (is_accept_state, prediction, requires_full_context, conflicting_alts) = self.classify_configs(&configs);
    let has_semantic_context = configs.has_semantic_context;
    let mut state = DfaState::new(configs);
    state.is_accept_state = is_accept_state;
    state.prediction = prediction;
    state.requires_full_context = requires_full_context;
    state.conflicting_alts = conflicting_alts;
    if has_semantic_context {
      self.predicate_dfa_state(&mut state);
    }
    state
  }

  /// Grounded on `ParserATNSimulator::predicateDFAState`: collects the alts
  /// to gate on predicates for, builds an OR'd predicate per alt, and
  /// either installs the `(predicate, alt)` list or, if no alt actually
  /// carries a real predicate, falls back to the lowest alt.
  fn predicate_dfa_state(&self, state: &mut DfaState) {
    let ambig_alts = prediction_mode::conflicting_alts_or_unique_alt(&state.configs);
    let per_alt = self.preds_for_ambig_alts(&ambig_alts, &state.configs);
    match per_alt {
      Some(per_alt) => {
        let pairs: Vec<(Arc<SemanticContext>, usize)> =
          per_alt.into_iter().filter(|(alt, _)| ambig_alts.contains(alt)).map(|(alt, pred)| (pred, alt)).collect();
        if !pairs.is_empty() {
          state.predicates = Some(pairs);
        } else {
          state.prediction = ambig_alts.iter().next().copied();
        }
      }
      None => state.prediction = ambig_alts.iter().next().copied(),
    }
  }

  fn preds_for_ambig_alts(&self, ambig_alts: &AltSet, configs: &ConfigSet) -> Option<Vec<(usize, Arc<SemanticContext>)>> {
    let mut per_alt = Vec::new();
    for alt in ambig_alts {
      let mut combined: Option<Arc<SemanticContext>> = None;
      for c in configs.iter().filter(|c| c.alt == *alt) {
        combined = Some(match combined {
          None => c.semantic_context.clone(),
          Some(acc) => SemanticContext::or(acc, c.semantic_context.clone()),
        });
      }
      per_alt.push((*alt, combined.unwrap_or_else(SemanticContext::none)));
    }
    let has_real_predicate = per_alt.iter().any(|(_, p)| !p.is_none());
    has_real_predicate.then_some(per_alt)
  }

  fn eval_semantic_context(&self, predicates: &[(Arc<SemanticContext>, usize)], recognizer: Option<&dyn Recognizer>, complete: bool) -> AltSet {
    let mut predictions = AltSet::new();
    for (pred, alt) in predicates {
      let satisfied = pred.is_none() || recognizer.map_or(false, |r| pred.eval(r));
      if satisfied {
        predictions.insert(*alt);
        if !complete {
          break;
        }
      }
    }
    predictions
  }

  fn get_existing_or_compute_target_state(
    &self,
    dfa: &Dfa,
    previous_d: &Arc<DfaState>,
    t: isize,
    recognizer: Option<&dyn Recognizer>,
  ) -> Option<Arc<DfaState>> {
    if let Some(existing) = previous_d.get_edge(t) {
      return if existing.is_error() { None } else { Some(existing) };
    }
    match self.compute_target_state(dfa, previous_d, t, recognizer) {
      Some(target) => {
        dfa.add_edge(previous_d, t, target.clone());
        Some(target)
      }
      None => {
        dfa.add_edge(previous_d, t, error_state());
        None
      }
    }
  }

  /// Grounded on `ParserATNSimulator::computeTargetState`: advances
  /// `previous_d`'s configs by one token and classifies the result, or
  /// returns `None` if nothing survives the advance.
  fn compute_target_state(&self, dfa: &Dfa, previous_d: &Arc<DfaState>, t: isize, recognizer: Option<&dyn Recognizer>) -> Option<Arc<DfaState>> {
    let mut merge_cache = MergeCache::new();
    let full_ctx = previous_d.configs.full_ctx;
    let params = ClosureParams { atn: self.atn, full_ctx, collect_predicates: true, recognizer, context_cache: Some(&self.context_cache) };
    let reach = compute_reach_set(&previous_d.configs, t, &params, &mut merge_cache)?;
    Some(dfa.intern(self.build_dfa_state(reach), &self.context_cache))
  }

  /// Grounded on `ParserATNSimulator::execATN`: the SLL-first token-by-token
  /// walk, escalating to full context on a conflict and resolving directly
  /// at any accept state reached along the way.
  #[allow(clippy::too_many_arguments)]
  fn exec_atn(
    &self,
    dfa: &Dfa,
    s0: Arc<DfaState>,
    input: &mut dyn TokenStream,
    start_index: usize,
    outer_context: Option<&Rc<RuleContext>>,
    recognizer: Option<&dyn Recognizer>,
    listener: &dyn ErrorListener,
  ) -> PredictResult<usize> {
    let mut previous_d = s0;
    let mut t = input.la(1);

    loop {
      let target = match self.get_existing_or_compute_target_state(dfa, &previous_d, t, recognizer) {
        Some(target) => target,
        None => {
          if let Some(alt) = prediction_mode::alt_that_finished_decision_entry_rule(&previous_d.configs, self.atn) {
            return Ok(alt);
          }
          return Err(self.no_viable_alternative(dfa.decision, start_index, input, &previous_d.configs));
        }
      };

      if target.requires_full_context && self.prediction_mode() != PredictionMode::Sll {
        let mut conflicting_alts = target.conflicting_alts.clone();
        if let Some(predicates) = &target.predicates {
          let stop_index = input.index();
          input.seek(start_index);
          let alts = self.eval_semantic_context(predicates, recognizer, true);
          if alts.len() == 1 {
            return Ok(*alts.iter().next().unwrap());
          }
          input.seek(stop_index);
          conflicting_alts = alts;
        }
        trace!("decision {}: SLL conflict on alts {:?}, retrying with full context", dfa.decision, conflicting_alts);
        listener.report_attempting_full_context(dfa.decision, start_index as isize, input.index() as isize, Some(&conflicting_alts), &target.configs);
        input.seek(start_index);
        return self.exec_atn_with_full_context(dfa, input, start_index, outer_context, recognizer, listener);
      }

      if target.is_accept_state {
        if target.predicates.is_none() {
          return Ok(target.prediction.expect("accept state must carry a prediction"));
        }
        let stop_index = input.index();
        let predicates = target.predicates.as_ref().unwrap();
        let alts = self.eval_semantic_context(predicates, recognizer, true);
        return match alts.len() {
          0 => Err(self.no_viable_alternative(dfa.decision, start_index, input, &target.configs)),
          1 => Ok(*alts.iter().next().unwrap()),
          _ => {
            listener.report_ambiguity(dfa.decision, start_index as isize, stop_index as isize, false, &alts, &target.configs);
            Ok(*alts.iter().next().unwrap())
          }
        };
      }

      previous_d = target;
      if t != TOKEN_EOF {
        input.consume();
        t = input.la(1);
      }
    }
  }

  /// Grounded on `ParserATNSimulator::execATNWithFullContext`: re-seeks to
  /// `start_index` and replays the decision with the real call stack,
  /// stopping as soon as a unique alt or (outside exact-ambiguity mode) a
  /// single viable alt emerges.
  fn exec_atn_with_full_context(
    &self,
    dfa: &Dfa,
    input: &mut dyn TokenStream,
    start_index: usize,
    outer_context: Option<&Rc<RuleContext>>,
    recognizer: Option<&dyn Recognizer>,
    listener: &dyn ErrorListener,
  ) -> PredictResult<usize> {
    let mut merge_cache = MergeCache::new();
    let mut configs = self.compute_start_state(dfa.decision, outer_context, true, recognizer, &mut merge_cache);
    let mut t = input.la(1);

    loop {
      let params = ClosureParams { atn: self.atn, full_ctx: true, collect_predicates: true, recognizer, context_cache: Some(&self.context_cache) };
      let reach = match compute_reach_set(&configs, t, &params, &mut merge_cache) {
        Some(reach) => reach,
        None => {
          if let Some(alt) = prediction_mode::alt_that_finished_decision_entry_rule(&configs, self.atn) {
            return Ok(alt);
          }
          return Err(self.no_viable_alternative(dfa.decision, start_index, input, &configs));
        }
      };

      if let Some(alt) = reach.unique_alt() {
        listener.report_context_sensitivity(dfa.decision, start_index as isize, input.index() as isize, alt, &reach);
        return Ok(alt);
      }

      let altsets = prediction_mode::conflicting_alt_subsets(&reach);
      if self.prediction_mode() != PredictionMode::LlExactAmbigDetection {
        if let Some(alt) = prediction_mode::single_viable_alt(&altsets) {
          return Ok(alt);
        }
      } else if prediction_mode::all_subsets_conflict(&altsets) && prediction_mode::all_subsets_equal(&altsets) {
        let alts = prediction_mode::union_alts(&altsets);
        listener.report_ambiguity(dfa.decision, start_index as isize, input.index() as isize, true, &alts, &reach);
        return Ok(*alts.iter().next().unwrap());
      }

      if t == TOKEN_EOF {
        let alts = prediction_mode::union_alts(&altsets);
        listener.report_ambiguity(dfa.decision, start_index as isize, input.index() as isize, false, &alts, &reach);
        return Ok(*alts.iter().next().unwrap());
      }

      configs = reach;
      input.consume();
      t = input.la(1);
    }
  }

  fn no_viable_alternative(&self, decision: usize, start_index: usize, input: &mut dyn TokenStream, deadend: &ConfigSet) -> PredictError {
    let offending_token = input.lt(1);
    let deadend_configs = deadend.iter().map(|c| (c.state, c.alt)).collect();
    PredictError::NoViableAlternative { decision, start_index: start_index as isize, offending_token, deadend_configs }
  }
}
