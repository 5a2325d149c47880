//! Per-sentence error kinds (spec.md §7). Grounded on the `thiserror`
//! enum style used throughout `robotoss-mr-ai` (e.g.
//! `code-indexer/src/errors.rs`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
  #[error("shape mismatch: {what} expected {expected} entries, got {actual}")]
  ShapeMismatch {
    what: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("grammar inconsistency: {0}")]
  GrammarInconsistency(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Non-fatal outcomes that still produce a (possibly empty) parse list
/// rather than an error (spec.md §7: "Sentence yields empty list, not an
/// error"). Carried alongside a sentence's results so callers can tell a
/// provably-complete empty result from one cut short.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Diagnostic {
  /// Every complete parse requested was found before the agenda emptied
  /// or `max_steps` was hit.
  Complete,
  /// The agenda emptied before `nbest` complete parses were found.
  SearchExhausted,
  /// `max_steps` was reached; the parses accumulated so far are returned.
  StepLimitExceeded,
  /// The sentence was longer than `max_length` and was skipped entirely.
  LengthExceeded,
}
