//! Head-dependency scoring (spec.md §4.9): when two subtrees combine, the
//! dependent child's head attaches to the head child's head; at the root
//! the root's head attaches to ROOT.

use crate::rules::HeadSide;
use crate::score::ScoreView;
use crate::tree::Tree;

/// Log-probability contribution of combining `left` and `right` under
/// `head`, beyond the two children's own inside scores. The dependent is
/// whichever child isn't the head; its head token attaches to the head
/// child's head token.
pub fn binary_dependency_lp(scores: &ScoreView, left: &Tree, right: &Tree, head: HeadSide) -> f64 {
  let (dependent, head_child) = if head.is_left() { (right, left) } else { (left, right) };
  scores.dep_lp_to_token(dependent.head_token(), head_child.head_token())
}

/// Log-probability contribution of attaching a complete parse's head to
/// ROOT (spec.md §4.9: "For the final root node, add `dep_lp(root_head_token, 0)`").
pub fn root_dependency_lp(scores: &ScoreView, root: &Tree) -> f64 {
  scores.dep_lp_root(root.head_token())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::category::CategoryInterner;
  use crate::rules::Combinator;
  use crate::tree::Span;

  #[test]
  fn dependent_attaches_to_head_childs_head_token() {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    i.seal_normalization();

    let tags = vec![0.0; 2 * 1];
    let deps = vec![0.0, -0.5, -0.1, 0.0, -0.3, -0.2]; // 2 tokens x 3 (root, tok0, tok1)
    let scores = ScoreView::new(2, 1, &tags, &deps).unwrap();

    let left = Tree::leaf(Span::new(0, 1), "John".into(), np, 0.0);
    let right = Tree::leaf(Span::new(1, 1), "runs".into(), np, 0.0);

    // right is head (backward application): dependent is left (token 0),
    // head is right (token 1) -> dep_lp_to_token(0, 1) == deps row 0, col 2.
    let lp = binary_dependency_lp(&scores, &left, &right, crate::rules::HeadSide::right());
    assert_eq!(lp, scores.dep_lp_to_token(0, 1));
    let _ = Combinator::BackwardApplication;
  }

  #[test]
  fn root_attaches_to_root_column() {
    let tags = vec![0.0];
    let deps = vec![-0.2, -0.4];
    let scores = ScoreView::new(1, 1, &tags, &deps).unwrap();
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    i.seal_normalization();
    let leaf = Tree::leaf(Span::new(0, 1), "it".into(), np, 0.0);
    assert_eq!(root_dependency_lp(&scores, &leaf), scores.dep_lp_root(0));
  }
}
