use std::sync::{Arc, Mutex, OnceLock, RwLock};

use atn_runtime::TOKEN_EOF;

use crate::{config::ConfigSet, prediction_context::PredictionContextCache, prediction_mode::AltSet, semantic_context::SemanticContext};

/// A cached decision state: which alt to predict once this state is
/// reached, or the edge table to keep walking on the next token.
///
/// Published states are read through `Arc` without locking — the `edges`
/// table is behind its own `RwLock` so a reader never blocks on writers
/// elsewhere in the same DFA, and once a `DFAState` is frozen (`configs`
/// read-only) nothing but `edges` ever changes again.
#[derive(Debug)]
pub struct DfaState {
  /// Frozen (`ConfigSet::set_readonly`) before first publish. Kept in full
  /// (not reduced to a signature) because the predicate/rescue paths need
  /// each config's context and `reaches_into_outer_context`.
  pub configs: ConfigSet,
  pub is_accept_state: bool,
  /// Set once `configs` agree on a single alt.
  pub prediction: Option<usize>,
  /// Set once the state's configs showed a genuine SLL conflict and must be
  /// re-resolved with full context.
  pub requires_full_context: bool,
  pub conflicting_alts: AltSet,
  /// `(predicate, alt)` pairs to evaluate in alt order when more than one
  /// alt survived with distinct predicates — `None` when no predicate is
  /// involved.
  pub predicates: Option<Vec<(Arc<SemanticContext>, usize)>>,
  /// Sparse outgoing edges, indexed by `token_type + 1` (`TOKEN_EOF` maps to
  /// slot 0). `None` means "not yet computed"; a future `compute_target_state`
  /// call fills it in, possibly with the shared `ERROR` state.
  edges: RwLock<Vec<Option<Arc<DfaState>>>>,
}

/// `(state, alt, semantic_context)` triples a config set reduces to for
/// interning/equality purposes — deliberately excludes `context`, matching
/// `ATNConfig` equality (spec §9: two states are "the same" if they'd
/// behave identically regardless of which call stack got them there).
type ConfigSignature = Vec<(usize, usize, Arc<SemanticContext>)>;

fn signature_of(configs: &ConfigSet) -> ConfigSignature {
  let mut sig: ConfigSignature = configs.iter().map(|c| (c.state, c.alt, c.semantic_context.clone())).collect();
  sig.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
  sig
}

impl DfaState {
  /// Built un-frozen: `configs` gets its contexts collapsed through the
  /// shared cache and is marked read-only inside `Dfa::intern`, right before
  /// (and only if) this candidate is actually published.
  pub fn new(configs: ConfigSet) -> Self {
    Self {
      configs,
      is_accept_state: false,
      prediction: None,
      requires_full_context: false,
      conflicting_alts: AltSet::new(),
      predicates: None,
      edges: RwLock::new(Vec::new()),
    }
  }

  fn edge_slot(token_type: isize) -> usize {
    (token_type + 1) as usize
  }

  pub fn get_edge(&self, token_type: isize) -> Option<Arc<DfaState>> {
    let slot = Self::edge_slot(token_type);
    let edges = self.edges.read().unwrap_or_else(|p| p.into_inner());
    edges.get(slot).cloned().flatten()
  }

  fn set_edge(&self, token_type: isize, to: Arc<DfaState>) {
    let slot = Self::edge_slot(token_type);
    let mut edges = self.edges.write().unwrap_or_else(|p| p.into_inner());
    if edges.len() <= slot {
      edges.resize(slot + 1, None);
    }
    edges[slot] = Some(to);
  }

  pub fn is_error(&self) -> bool {
    self.configs.is_empty() && !self.is_accept_state && self.prediction.is_none()
  }
}

/// The per-decision DFA cache. Interning (`s0` lookup, state creation) and
/// edge publication are both guarded by one coarse mutex — spec §9's
/// "single coarse mutex per-DFA simulator"; once a state is returned from
/// `intern`, its `edges` are readable lock-free through `get_edge`.
pub struct Dfa {
  pub decision: usize,
  inner: Mutex<DfaInner>,
}

#[derive(Default)]
struct DfaInner {
  s0: Option<Arc<DfaState>>,
  states: Vec<(ConfigSignature, Arc<DfaState>)>,
}

impl Dfa {
  pub fn new(decision: usize) -> Self {
    Self { decision, inner: Mutex::new(DfaInner::default()) }
  }

  pub fn s0(&self) -> Option<Arc<DfaState>> {
    self.inner.lock().unwrap_or_else(|p| p.into_inner()).s0.clone()
  }

  pub fn set_s0(&self, state: Arc<DfaState>) {
    self.inner.lock().unwrap_or_else(|p| p.into_inner()).s0 = Some(state);
  }

  /// Interns `candidate`, returning the canonical `Arc` for its signature —
  /// an existing state if one with the same config signature is already
  /// cached, else `candidate` itself, newly published. Grounded on
  /// `DFA::addState`: before a genuinely new state is published, its
  /// configs run through `optimizeConfigs` (collapsing equivalent contexts
  /// through the shared `context_cache`) and are then frozen.
  pub fn intern(&self, mut candidate: DfaState, context_cache: &PredictionContextCache) -> Arc<DfaState> {
    let sig = signature_of(&candidate.configs);
    let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
    if let Some((_, existing)) = inner.states.iter().find(|(s, _)| *s == sig) {
      return existing.clone();
    }
    candidate.configs.optimize_contexts(context_cache);
    candidate.configs.set_readonly(true);
    let arc = Arc::new(candidate);
    inner.states.push((sig, arc.clone()));
    arc
  }

  /// Writes `from --token_type--> to`, taking the DFA's lock only for the
  /// duration of the write (spec §9: readers of already-published edges
  /// never take this lock).
  pub fn add_edge(&self, from: &Arc<DfaState>, token_type: isize, to: Arc<DfaState>) {
    let _guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
    from.set_edge(token_type, to);
  }

  /// Spec §6's `clearDFA`: drops `s0` and every interned state, so the next
  /// lookup rebuilds this decision's cache from scratch.
  pub fn clear(&self) {
    let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
    inner.s0 = None;
    inner.states.clear();
  }
}

/// Shared, interned sentinel meaning "no target state reachable" — every
/// `Dfa`, on every thread, points failed lookups at this one instance rather
/// than allocating a fresh empty state per decision.
pub fn error_state() -> Arc<DfaState> {
  static ERROR: OnceLock<Arc<DfaState>> = OnceLock::new();
  ERROR
    .get_or_init(|| {
      let mut configs = ConfigSet::new(false);
      configs.set_readonly(true);
      Arc::new(DfaState::new(configs))
    })
    .clone()
}

pub const EOF_EDGE_SLOT_TOKEN: isize = TOKEN_EOF;

#[cfg(test)]
mod test {
  use super::*;
  use crate::{config::AtnConfig, prediction_context::PredictionContext};

  fn one_config_set(state: usize, alt: usize) -> ConfigSet {
    let mut set = ConfigSet::new(false);
    let mut cache = crate::prediction_context::MergeCache::new();
    set.add(AtnConfig::new(state, alt, PredictionContext::empty(), SemanticContext::none()), &mut cache);
    set
  }

  #[test]
  fn intern_returns_existing_state_for_same_signature() {
    let dfa = Dfa::new(0);
    let cache = PredictionContextCache::new();
    let a = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    let b = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    assert!(Arc::ptr_eq(&a, &b));
  }

  #[test]
  fn intern_collapses_contexts_through_the_shared_cache() {
    let dfa = Dfa::new(0);
    let cache = PredictionContextCache::new();
    let a = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    let b = dfa.intern(DfaState::new(one_config_set(2, 1)), &cache);
    assert!(Arc::ptr_eq(&a.configs.iter().next().unwrap().context, &b.configs.iter().next().unwrap().context));
  }

  #[test]
  fn edges_are_readable_after_publish() {
    let dfa = Dfa::new(0);
    let cache = PredictionContextCache::new();
    let from = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    let to = dfa.intern(DfaState::new(one_config_set(2, 1)), &cache);
    dfa.add_edge(&from, 5, to.clone());
    let reached = from.get_edge(5).unwrap();
    assert!(Arc::ptr_eq(&reached, &to));
  }

  #[test]
  fn unknown_edge_is_none() {
    let dfa = Dfa::new(0);
    let cache = PredictionContextCache::new();
    let from = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    assert!(from.get_edge(3).is_none());
  }

  #[test]
  fn clear_drops_s0_and_interned_states() {
    let dfa = Dfa::new(0);
    let cache = PredictionContextCache::new();
    let s0 = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    dfa.set_s0(s0);
    assert!(dfa.s0().is_some());
    dfa.clear();
    assert!(dfa.s0().is_none());
    let rebuilt = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
    assert_eq!(rebuilt.configs.len(), 1);
  }

  /// Spec §5: "Multiple parser instances may ... share one ... DFA set
  /// concurrently" under a single coarse mutex per simulator. Hammers one
  /// `Dfa` from several real OS threads, each interning the same small set
  /// of signatures and wiring edges between them, and checks the shared
  /// state converges to exactly one state per signature with no lost edges.
  #[cfg(feature = "multithread_tests")]
  #[test]
  fn concurrent_intern_and_edge_writes_converge_on_shared_state() {
    use std::thread;

    let dfa = Arc::new(Dfa::new(0));
    let cache = Arc::new(PredictionContextCache::new());
    let threads: Vec<_> = (0..8)
      .map(|i| {
        let dfa = dfa.clone();
        let cache = cache.clone();
        thread::spawn(move || {
          let from = dfa.intern(DfaState::new(one_config_set(1, 1)), &cache);
          let to = dfa.intern(DfaState::new(one_config_set(2, 1)), &cache);
          dfa.add_edge(&from, i, to.clone());
          (from, to)
        })
      })
      .collect();

    let results: Vec<_> = threads.into_iter().map(|h| h.join().unwrap()).collect();
    let (first_from, first_to) = &results[0];
    for (from, to) in &results {
      assert!(Arc::ptr_eq(from, first_from), "all threads must intern the same `from` state");
      assert!(Arc::ptr_eq(to, first_to), "all threads must intern the same `to` state");
    }
    for i in 0..8isize {
      let edge = first_from.get_edge(i).expect("every thread's edge write must be visible");
      assert!(Arc::ptr_eq(&edge, first_to));
    }
  }
}
