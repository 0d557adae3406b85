use std::sync::Arc;

/// The subset of the generated parser's surface predicate evaluation needs:
/// `sempred`/`precpred` as spec §6 describes them, evaluated with the input
/// stream already seeked to the captured start index by the caller
/// (`SemanticContext::eval` never touches the stream itself).
pub trait Recognizer {
  fn sempred(&self, rule_index: usize, pred_index: usize) -> bool;
  fn precpred(&self, precedence: i32) -> bool;
}

/// Gate on an ATN transition: a predicate, an AND/OR tree of predicates, or
/// `None` (always true — spec's `SemanticContext.NONE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticContext {
  /// Always evaluates to `true`. The identity element for `and`, the
  /// absorbing element for `or`.
  None,
  Predicate { rule_index: usize, pred_index: usize, ctx_dependent: bool },
  PrecedencePredicate { precedence: i32 },
  And(Vec<Arc<SemanticContext>>),
  Or(Vec<Arc<SemanticContext>>),
}

impl SemanticContext {
  pub fn none() -> Arc<SemanticContext> {
    Arc::new(SemanticContext::None)
  }

  pub fn predicate(rule_index: usize, pred_index: usize, ctx_dependent: bool) -> Arc<SemanticContext> {
    Arc::new(SemanticContext::Predicate { rule_index, pred_index, ctx_dependent })
  }

  pub fn precedence_predicate(precedence: i32) -> Arc<SemanticContext> {
    Arc::new(SemanticContext::PrecedencePredicate { precedence })
  }

  pub fn is_none(&self) -> bool {
    matches!(self, SemanticContext::None)
  }

  /// `a AND b`, self-simplified: flattens nested `And`s, drops `None`
  /// operands (`NONE` is the AND identity), dedupes, and collapses a
  /// singleton back to its lone operand.
  pub fn and(a: Arc<SemanticContext>, b: Arc<SemanticContext>) -> Arc<SemanticContext> {
    if a.is_none() {
      return b;
    }
    if b.is_none() {
      return a;
    }
    let mut operands = Vec::new();
    flatten_and(&a, &mut operands);
    flatten_and(&b, &mut operands);
    operands.sort();
    operands.dedup();
    match operands.len() {
      1 => operands.into_iter().next().unwrap(),
      _ => Arc::new(SemanticContext::And(operands)),
    }
  }

  /// `a OR b`, self-simplified: `NONE OR x == NONE` (an always-true operand
  /// makes the whole disjunction always-true), otherwise flattens, dedupes,
  /// and collapses singletons.
  pub fn or(a: Arc<SemanticContext>, b: Arc<SemanticContext>) -> Arc<SemanticContext> {
    if a.is_none() || b.is_none() {
      return SemanticContext::none();
    }
    let mut operands = Vec::new();
    flatten_or(&a, &mut operands);
    flatten_or(&b, &mut operands);
    operands.sort();
    operands.dedup();
    match operands.len() {
      1 => operands.into_iter().next().unwrap(),
      _ => Arc::new(SemanticContext::Or(operands)),
    }
  }

  /// Pure evaluation against the current recognizer state. Callers must
  /// have already seeked the input stream to the captured `start_index`
  /// (spec §9 Design Notes: "all predicate evaluations occur with the
  /// input stream seeked to `_startIndex`").
  pub fn eval(&self, recognizer: &dyn Recognizer) -> bool {
    match self {
      SemanticContext::None => true,
      SemanticContext::Predicate { rule_index, pred_index, .. } => recognizer.sempred(*rule_index, *pred_index),
      SemanticContext::PrecedencePredicate { precedence } => recognizer.precpred(*precedence),
      SemanticContext::And(children) => children.iter().all(|c| c.eval(recognizer)),
      SemanticContext::Or(children) => children.iter().any(|c| c.eval(recognizer)),
    }
  }
}

fn flatten_and(ctx: &Arc<SemanticContext>, out: &mut Vec<Arc<SemanticContext>>) {
  match ctx.as_ref() {
    SemanticContext::And(children) => out.extend(children.iter().cloned()),
    _ => out.push(ctx.clone()),
  }
}

fn flatten_or(ctx: &Arc<SemanticContext>, out: &mut Vec<Arc<SemanticContext>>) {
  match ctx.as_ref() {
    SemanticContext::Or(children) => out.extend(children.iter().cloned()),
    _ => out.push(ctx.clone()),
  }
}

#[cfg(test)]
mod test {
  use super::*;

  struct Always(bool);
  impl Recognizer for Always {
    fn sempred(&self, _: usize, _: usize) -> bool {
      self.0
    }
    fn precpred(&self, _: i32) -> bool {
      self.0
    }
  }

  #[test]
  fn and_drops_none_operands() {
    let p = SemanticContext::predicate(0, 0, false);
    assert_eq!(SemanticContext::and(SemanticContext::none(), p.clone()), p);
  }

  #[test]
  fn or_with_none_collapses_to_none() {
    let p = SemanticContext::predicate(0, 0, false);
    assert!(SemanticContext::or(SemanticContext::none(), p).is_none());
  }

  #[test]
  fn and_of_two_distinct_predicates_requires_both() {
    let p1 = SemanticContext::predicate(0, 0, false);
    let p2 = SemanticContext::predicate(0, 1, false);
    let both = SemanticContext::and(p1, p2);
    assert!(both.eval(&Always(true)));
    assert!(!both.eval(&Always(false)));
  }

  #[test]
  fn and_dedupes_identical_predicates_to_singleton() {
    let p1 = SemanticContext::predicate(0, 0, false);
    let p2 = SemanticContext::predicate(0, 0, false);
    assert_eq!(SemanticContext::and(p1.clone(), p2), p1);
  }
}
