use crate::token::TokenInfo;

/// A mark taken from `IntStream::mark`, paired with a later `release`.
///
/// Marks nest: a stream may be marked more than once before any release, and
/// releases must occur in reverse order of the corresponding marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkHandle(pub isize);

/// The minimal stream contract the predictor drives input through.
///
/// Out of scope: the concrete implementation (buffering, channel filtering,
/// re-lexing) belongs to the token stream collaborator supplied by the
/// generated parser.
pub trait IntStream {
  /// Current absolute index into the stream.
  fn index(&self) -> usize;

  /// Takes a mark at the current position. Every mark must be paired with
  /// exactly one `release`.
  fn mark(&mut self) -> MarkHandle;

  /// Releases a previously taken mark.
  fn release(&mut self, mark: MarkHandle);

  /// Repositions the stream to an absolute index.
  fn seek(&mut self, index: usize);

  /// Total number of elements, if known.
  fn size(&self) -> Option<usize>;
}

/// Lookahead/consume contract for token streams, as used by `adaptive_predict`.
pub trait TokenStream: IntStream {
  /// Returns the type of the token `k` positions ahead (1-based). `LA(1)` is
  /// the token about to be consumed.
  fn la(&mut self, k: isize) -> isize;

  /// Returns full token info `k` positions ahead (1-based).
  fn lt(&mut self, k: isize) -> TokenInfo;

  /// Consumes the current token, advancing the stream by one.
  fn consume(&mut self);

  /// Returns the token at an absolute index, for error reporting.
  fn get(&mut self, index: usize) -> TokenInfo;
}
