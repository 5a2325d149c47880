//! The A* outside-cost heuristic (spec.md §4.8).
//!
//! For each token, the best achievable score it could ever contribute --
//! its best tag log-probability plus its best dependency log-probability
//! to any head -- is fixed before search starts. `HeuristicTable::outside`
//! then answers, in O(1), "how much is the *rest* of the sentence worth at
//! best", which is what makes the priority queue's ordering admissible: no
//! partial parse can ever be underestimated.

use crate::score::ScoreView;

/// Prefix sums over each token's best-case contribution, so that the
/// outside cost of any span is a single subtraction.
#[derive(Debug, Clone)]
pub struct HeuristicTable {
  /// `prefix[i]` = sum of `best[0..i]`; `prefix.len() == sent_len + 1`.
  prefix: Vec<f64>,
}

impl HeuristicTable {
  /// Computes `best[i] = max_tag tag_lp(i, tag) + max_head dep_lp(i, head)`
  /// for every token, then the running prefix sum (spec.md §4.8).
  pub fn new(scores: &ScoreView) -> Self {
    let sent_len = scores.sent_len();
    let mut prefix = Vec::with_capacity(sent_len + 1);
    prefix.push(0.0);
    let mut running = 0.0;
    for token in 0..sent_len {
      let best_tag = scores.tags_of(token).map(|(_, lp)| lp).fold(f64::NEG_INFINITY, f64::max);
      let best_dep = (0..=sent_len).map(|head| scores.dep_lp(token, head)).fold(f64::NEG_INFINITY, f64::max);
      running += best_tag + best_dep;
      prefix.push(running);
    }
    Self { prefix }
  }

  /// Total best-case score across the whole sentence -- the outside cost
  /// of the empty span `[0, 0)`.
  pub fn total(&self) -> f64 {
    *self.prefix.last().unwrap_or(&0.0)
  }

  /// Admissible outside-cost estimate for everything *not* covered by
  /// `[start, start + length)`: the best-case total minus the best-case
  /// contribution of the tokens already inside the span.
  pub fn outside(&self, start: usize, length: usize) -> f64 {
    let end = start + length;
    self.total() - (self.prefix[end] - self.prefix[start])
  }
}
