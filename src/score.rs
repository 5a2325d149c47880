//! `ScoreView`: a read-only facade over the two per-sentence score
//! matrices (spec.md §4.1). Matrices arrive as flat, row-major `Vec<f64>`
//! plus an explicit shape, the usual representation for dense arrays
//! handed across a process boundary from an external scorer.

use crate::error::ParseError;

/// `P_tag`: `sent_len x tag_count` log-probabilities.
/// `P_dep`: `sent_len x (sent_len + 1)` log-probabilities, column 0 is ROOT.
pub struct ScoreView<'a> {
  sent_len: usize,
  tag_count: usize,
  tag_scores: &'a [f64],
  dep_scores: &'a [f64],
}

impl<'a> ScoreView<'a> {
  /// Validates shapes against `sent_len` up front so every later access
  /// is a bounds-checked slice index rather than a silent
  /// out-of-bounds-turned-wraparound (spec.md §4.1: "Fails with
  /// `ShapeMismatch`").
  pub fn new(sent_len: usize, tag_count: usize, tag_scores: &'a [f64], dep_scores: &'a [f64]) -> Result<Self, ParseError> {
    if tag_scores.len() != sent_len * tag_count {
      return Err(ParseError::ShapeMismatch {
        what: "P_tag",
        expected: sent_len * tag_count,
        actual: tag_scores.len(),
      });
    }
    let dep_cols = sent_len + 1;
    if dep_scores.len() != sent_len * dep_cols {
      return Err(ParseError::ShapeMismatch {
        what: "P_dep",
        expected: sent_len * dep_cols,
        actual: dep_scores.len(),
      });
    }
    Ok(Self {
      sent_len,
      tag_count,
      tag_scores,
      dep_scores,
    })
  }

  pub fn sent_len(&self) -> usize {
    self.sent_len
  }

  pub fn tag_count(&self) -> usize {
    self.tag_count
  }

  /// `tag_lp(i, c)`: log-probability of tag `c` (an index into the fixed
  /// tag inventory, not a `CategoryId`) at token `i`.
  pub fn tag_lp(&self, token: usize, tag_idx: usize) -> f64 {
    self.tag_scores[token * self.tag_count + tag_idx]
  }

  /// `dep_lp(dependent, head)`: log-probability that `dependent`'s head
  /// is `head`, where `head == 0` denotes ROOT and `head == h` (h >= 1)
  /// denotes token `h - 1`.
  pub fn dep_lp(&self, dependent: usize, head: usize) -> f64 {
    self.dep_scores[dependent * (self.sent_len + 1) + head]
  }

  /// Dependency log-probability using 0-based token indices directly,
  /// with `ROOT` represented out-of-band by `dep_lp_root`.
  pub fn dep_lp_to_token(&self, dependent: usize, head_token: usize) -> f64 {
    self.dep_lp(dependent, head_token + 1)
  }

  pub fn dep_lp_root(&self, dependent: usize) -> f64 {
    self.dep_lp(dependent, 0)
  }

  pub fn tags_of(&self, token: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
    (0..self.tag_count).map(move |c| (c, self.tag_lp(token, c)))
  }
}
