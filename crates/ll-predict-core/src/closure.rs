use std::{collections::HashSet, sync::Arc};

use atn_runtime::{Atn, Transition};

use crate::{
  config::{AtnConfig, ConfigSet},
  prediction_context::{MergeCache, PredictionContext, PredictionContextCache},
  semantic_context::{Recognizer, SemanticContext},
};

/// Parameters held constant across one closure call tree. Grounded on the
/// fields `ParserATNSimulator::closure` closes over: whether this is a
/// full-context (LL) pass, whether predicates should be collected into
/// `semantic_context` (SLL) or evaluated immediately (LL), and the
/// recognizer predicates are evaluated against.
pub struct ClosureParams<'a> {
  pub atn: &'a Atn,
  pub full_ctx: bool,
  pub collect_predicates: bool,
  pub recognizer: Option<&'a dyn Recognizer>,
  /// Shared hash-consing table for freshly built `Singleton` contexts
  /// (`Rule` transitions). `None` in tests that don't care about sharing.
  pub context_cache: Option<&'a PredictionContextCache>,
}

/// Cycle guard for epsilon loops (direct or indirect left recursion):
/// `(state, alt, context pointer)` triples already on the current closure
/// path. Thread-local scratch, rebuilt fresh per top-level closure call.
pub type ClosureBusy = HashSet<(usize, usize, usize)>;

fn busy_key(config: &AtnConfig) -> (usize, usize, usize) {
  (config.state, config.alt, Arc::as_ptr(&config.context) as usize)
}

/// Epsilon-closure of `config`: follows every epsilon-like transition
/// reachable without consuming a token, adding each non-epsilon-only state
/// reached to `configs`. Grounded on `ParserATNSimulator::closure` /
/// `closureCheckingStopState` / `closure_`.
pub fn closure(config: AtnConfig, configs: &mut ConfigSet, busy: &mut ClosureBusy, depth: i32, params: &ClosureParams, merge_cache: &mut MergeCache) {
  closure_checking_stop_state(config, configs, busy, depth, params, merge_cache);
}

fn closure_checking_stop_state(config: AtnConfig, configs: &mut ConfigSet, busy: &mut ClosureBusy, depth: i32, params: &ClosureParams, merge_cache: &mut MergeCache) {
  let state = params.atn.state(config.state);
  if !state.is_rule_stop() {
    closure_impl(config, configs, busy, depth, params, merge_cache);
    return;
  }

  if !config.context.is_empty() {
    for i in 0..config.context.len() {
      let return_state = config.context.return_state_at(i);
      if return_state == crate::prediction_context::EMPTY_RETURN_STATE {
        if params.full_ctx {
          configs.add(config.with_context(PredictionContext::empty()), merge_cache);
        }
        continue;
      }
      let new_context = config.context.parent_at(i).unwrap_or_else(PredictionContext::empty);
      let new_depth = if depth > 0 { depth - 1 } else { depth };
      let returned = AtnConfig { state: return_state, context: new_context, ..config.clone() };
      if !busy.insert(busy_key(&returned)) {
        continue;
      }
      closure_checking_stop_state(returned, configs, busy, new_depth, params, merge_cache);
    }
    return;
  }

  if params.full_ctx {
    configs.add(config, merge_cache);
    return;
  }

  // Fell off the end of the rule we started in, with no caller recorded —
  // SLL can't know what follows, so flag the dip and keep the config at the
  // rule-stop state itself (prediction_mode's rescue path looks for this).
  let mut dipped = config;
  dipped.reaches_into_outer_context += 1;
  configs.add(dipped, merge_cache);
}

fn closure_impl(config: AtnConfig, configs: &mut ConfigSet, busy: &mut ClosureBusy, depth: i32, params: &ClosureParams, merge_cache: &mut MergeCache) {
  let state = params.atn.state(config.state);
  if !state.only_has_epsilon_transitions() {
    configs.add(config.clone(), merge_cache);
  }

  for t in state.transitions() {
    if !t.is_epsilon() {
      continue;
    }
    let next_depth = match t {
      Transition::Rule { .. } if depth >= 0 => depth + 1,
      _ => depth,
    };
    if let Some(next) = epsilon_target(&config, t, params) {
      if busy.insert(busy_key(&next)) {
        closure_checking_stop_state(next, configs, busy, next_depth, params, merge_cache);
      }
    }
  }
}

/// Resolves what `config` turns into after following one epsilon transition,
/// or `None` if the edge is gated by a predicate that failed under full
/// context (spec: "predicate transitions are pruned, not merely flagged,
/// once evaluated in LL mode").
fn epsilon_target(config: &AtnConfig, t: &Transition, params: &ClosureParams) -> Option<AtnConfig> {
  match t {
    Transition::Epsilon { target } | Transition::Action { target, .. } => Some(config.with_state(*target)),
    Transition::Rule { target, follow_state } => {
      let new_context = crate::prediction_context::PredictionContext::singleton(config.context.clone(), *follow_state);
      let new_context = match params.context_cache {
        Some(cache) => cache.intern(new_context),
        None => new_context,
      };
      Some(AtnConfig { state: *target, context: new_context, ..config.clone() })
    }
    Transition::Predicate { target, rule_index, pred_index, ctx_dependent } => {
      if params.full_ctx {
        let satisfied = params.recognizer.map_or(true, |r| r.sempred(*rule_index, *pred_index));
        return satisfied.then(|| config.with_state(*target));
      }
      if !params.collect_predicates {
        return Some(config.with_state(*target));
      }
      let pred = SemanticContext::predicate(*rule_index, *pred_index, *ctx_dependent);
      let merged = SemanticContext::and(config.semantic_context.clone(), pred);
      Some(AtnConfig { state: *target, semantic_context: merged, ..config.clone() })
    }
    Transition::Precedence { target, precedence } => {
      if params.full_ctx {
        let satisfied = params.recognizer.map_or(true, |r| r.precpred(*precedence));
        return satisfied.then(|| config.with_state(*target));
      }
      if !params.collect_predicates {
        return Some(config.with_state(*target));
      }
      let pred = SemanticContext::precedence_predicate(*precedence);
      let merged = SemanticContext::and(config.semantic_context.clone(), pred);
      Some(AtnConfig { state: *target, semantic_context: merged, ..config.clone() })
    }
    _ => None,
  }
}
