use atn_runtime::TOKEN_EOF;

use crate::{
  closure::{closure, ClosureBusy, ClosureParams},
  config::{AtnConfig, ConfigSet},
  prediction_context::MergeCache,
  prediction_mode,
};

/// Advances `configs` by one token: matches each member's non-epsilon
/// transitions against `token_type`, then closes the result back out to
/// non-epsilon states. Grounded on `ParserATNSimulator::computeReachSet`.
/// Returns `None` when nothing in `configs` can consume `token_type` — the
/// caller routes that to the `ERROR` DFA state.
pub fn compute_reach_set(configs: &ConfigSet, token_type: isize, params: &ClosureParams, merge_cache: &mut MergeCache) -> Option<ConfigSet> {
  let mut intermediate = ConfigSet::new(params.full_ctx);
  let mut skipped_stop_states: Vec<AtnConfig> = Vec::new();

  for c in configs.iter() {
    let state = params.atn.state(c.state);
    if state.is_rule_stop() {
      if params.full_ctx || token_type == TOKEN_EOF {
        skipped_stop_states.push(c.clone());
      }
      continue;
    }
    for t in state.transitions() {
      if t.is_epsilon() {
        continue;
      }
      if t.matches(token_type, 0, params.atn.max_token_type) {
        intermediate.add(c.with_state(t.target()), merge_cache);
      }
    }
  }

  let mut reach = if skipped_stop_states.is_empty() && (intermediate.len() == 1 || intermediate.unique_alt().is_some()) {
    intermediate
  } else {
    let mut reach = ConfigSet::new(params.full_ctx);
    let mut busy = ClosureBusy::new();
    for c in intermediate.iter() {
      closure(c.clone(), &mut reach, &mut busy, 0, params, merge_cache);
    }
    reach
  };

  if token_type == TOKEN_EOF {
    reach = remove_all_configs_not_in_rule_stop_state(&reach, params, merge_cache);
  }

  if !skipped_stop_states.is_empty() && (!params.full_ctx || !reach.has_config_in_rule_stop_state(params.atn)) {
    for c in skipped_stop_states {
      reach.add(c, merge_cache);
    }
  }

  if reach.is_empty() {
    None
  } else {
    Some(reach)
  }
}

/// Promotes configs sitting on an epsilon-only state whose rule can derive
/// empty (its `next_tokens` contains `TOKEN_EPSILON`) to that rule's stop
/// state, and drops everything else — the EOF-reach normalization
/// `ParserATNSimulator::removeAllConfigsNotInRuleStopState` performs so an
/// EOF match only ever lands on rule-stop configs.
fn remove_all_configs_not_in_rule_stop_state(configs: &ConfigSet, params: &ClosureParams, merge_cache: &mut MergeCache) -> ConfigSet {
  if prediction_mode::all_configs_in_rule_stop_states(configs, params.atn) {
    return configs.clone();
  }
  let mut result = ConfigSet::new(params.full_ctx);
  for c in configs.iter() {
    let state = params.atn.state(c.state);
    if state.is_rule_stop() {
      result.add(c.clone(), merge_cache);
      continue;
    }
    if state.only_has_epsilon_transitions() && params.atn.next_tokens(c.state).contains(atn_runtime::TOKEN_EPSILON) {
      let stop_state = params.atn.rule_stop_state(state.rule_index());
      result.add(c.with_state(stop_state), merge_cache);
    }
  }
  result
}
