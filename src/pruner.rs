//! Per-token candidate pruning (spec.md §4.2).
//!
//! `Pruner::candidates` runs the four-stage cascade in order: category
//! dictionary override, terminal constraint, beta threshold, top-K
//! truncation -- falling back to the single best category if every filter
//! together would leave nothing (the "failsafe").

use std::collections::HashMap;

use crate::category::CategoryId;
use crate::rules::CategoryDictionary;
use crate::score::ScoreView;

/// The fixed supertag inventory: column `idx` of `P_tag` corresponds to
/// `TagInventory::category_at(idx)`.
#[derive(Debug)]
pub struct TagInventory {
  categories: Vec<CategoryId>,
  index: HashMap<CategoryId, usize>,
}

impl TagInventory {
  pub fn new(categories: Vec<CategoryId>) -> Self {
    let index = categories.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    Self { categories, index }
  }

  pub fn len(&self) -> usize {
    self.categories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }

  pub fn category_at(&self, idx: usize) -> CategoryId {
    self.categories[idx]
  }

  pub fn index_of(&self, category: CategoryId) -> Option<usize> {
    self.index.get(&category).copied()
  }
}

pub struct Pruner<'g> {
  tags: &'g TagInventory,
  dictionary: &'g CategoryDictionary,
  beta: f64,
  use_beta: bool,
  pruning_size: usize,
  use_category_dict: bool,
}

impl<'g> Pruner<'g> {
  pub fn new(
    tags: &'g TagInventory,
    dictionary: &'g CategoryDictionary,
    beta: f64,
    use_beta: bool,
    pruning_size: usize,
    use_category_dict: bool,
  ) -> Self {
    Self {
      tags,
      dictionary,
      beta,
      use_beta,
      pruning_size,
      use_category_dict,
    }
  }

  fn all_candidates(&self, token: usize, scores: &ScoreView) -> Vec<(CategoryId, f64)> {
    (0..self.tags.len())
      .map(|idx| (self.tags.category_at(idx), scores.tag_lp(token, idx)))
      .collect()
  }

  fn best_candidate(&self, token: usize, scores: &ScoreView) -> (CategoryId, f64) {
    (0..self.tags.len())
      .map(|idx| (self.tags.category_at(idx), scores.tag_lp(token, idx)))
      .fold((self.tags.category_at(0), f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
  }

  /// `terminal` is `Some(c)` when a terminal constraint (spec.md §4.6)
  /// forces this token's category to `c`; in that case every other stage
  /// is bypassed and the category is assigned lexical score 0.
  pub fn candidates(&self, token: usize, surface: &str, scores: &ScoreView, terminal: Option<CategoryId>) -> Vec<(CategoryId, f64)> {
    if let Some(forced) = terminal {
      return vec![(forced, 0.0)];
    }

    let mut working = if self.use_category_dict {
      match self.dictionary.lookup(surface) {
        Some(entry) if !entry.is_empty() => entry
          .iter()
          .filter_map(|&c| self.tags.index_of(c).map(|idx| (c, scores.tag_lp(token, idx))))
          .collect(),
        _ => self.all_candidates(token, scores),
      }
    } else {
      self.all_candidates(token, scores)
    };

    if self.use_beta && !working.is_empty() {
      let max = working.iter().map(|&(_, s)| s).fold(f64::NEG_INFINITY, f64::max);
      let threshold = self.beta.ln() + max;
      working.retain(|&(_, s)| s >= threshold);
    }

    working.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    working.truncate(self.pruning_size);

    if working.is_empty() {
      // Failsafe (spec.md §4.2): never return nothing, regardless of how
      // the cascade above filtered this token.
      vec![self.best_candidate(token, scores)]
    } else {
      working
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::category::CategoryInterner;

  fn setup() -> (CategoryInterner, TagInventory) {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    let n = i.parse_and_intern("N").unwrap();
    let s = i.parse_and_intern("S").unwrap();
    i.seal_normalization();
    (i, TagInventory::new(vec![np, n, s]))
  }

  #[test]
  fn top_k_truncates_by_score_then_id() {
    let (_i, tags) = setup();
    let dict = CategoryDictionary::new();
    let pruner = Pruner::new(&tags, &dict, 1e-5, false, 2, false);
    let tag_scores = vec![-0.1, -0.2, -0.05]; // NP, N, S for one token
    let dep_scores = vec![0.0; 1 * 2];
    let scores = ScoreView::new(1, 3, &tag_scores, &dep_scores).unwrap();
    let cands = pruner.candidates(0, "foo", &scores, None);
    assert_eq!(cands.len(), 2);
    assert_eq!(cands[0].0, tags.category_at(2)); // S has the best score
  }

  #[test]
  fn beta_threshold_prunes_low_scores() {
    let (_i, tags) = setup();
    let dict = CategoryDictionary::new();
    let pruner = Pruner::new(&tags, &dict, 1e-5, true, 50, false);
    let tag_scores = vec![0.0, -50.0, -0.01];
    let dep_scores = vec![0.0; 2];
    let scores = ScoreView::new(1, 3, &tag_scores, &dep_scores).unwrap();
    let cands = pruner.candidates(0, "foo", &scores, None);
    assert!(cands.iter().all(|&(c, _)| c != tags.category_at(1)));
  }

  #[test]
  fn terminal_constraint_forces_single_category() {
    let (_i, tags) = setup();
    let dict = CategoryDictionary::new();
    let pruner = Pruner::new(&tags, &dict, 1e-5, true, 1, false);
    let tag_scores = vec![0.0, -1.0, -2.0];
    let dep_scores = vec![0.0; 2];
    let scores = ScoreView::new(1, 3, &tag_scores, &dep_scores).unwrap();
    let n = tags.category_at(1);
    let cands = pruner.candidates(0, "foo", &scores, Some(n));
    assert_eq!(cands, vec![(n, 0.0)]);
  }

  #[test]
  fn never_returns_empty() {
    let (_i, tags) = setup();
    let dict = CategoryDictionary::new();
    // beta so strict that, naively, everything would be pruned.
    let pruner = Pruner::new(&tags, &dict, 1e-300, true, 50, false);
    let tag_scores = vec![-1.0, -1.0, -1.0];
    let dep_scores = vec![0.0; 2];
    let scores = ScoreView::new(1, 3, &tag_scores, &dep_scores).unwrap();
    let cands = pruner.candidates(0, "foo", &scores, None);
    assert!(!cands.is_empty());
  }
}
