//! Derivation trees (spec.md §3 "Derivation node (Tree)").
//!
//! A leaf carries the token position and surface form; a branch carries a
//! parent category and its children. A CCG derivation distinguishes binary
//! combination from unary rewriting, and every node caches its span and
//! inside score so the search loop never recomputes them.

use std::fmt;
use std::sync::Arc;

use crate::category::{CategoryId, CategoryInterner};
use crate::rules::{Combinator, HeadSide};

/// Half-open token span `[start, start + length)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span {
  pub start: usize,
  pub length: usize,
}

impl Span {
  pub fn new(start: usize, length: usize) -> Self {
    Self { start, length }
  }

  pub fn end(self) -> usize {
    self.start + self.length
  }

  /// Spans are adjacent iff one ends exactly where the other starts.
  pub fn is_adjacent_to(self, other: Span) -> bool {
    self.end() == other.start || other.end() == self.start
  }

  pub fn concat(self, other: Span) -> Span {
    debug_assert!(self.end() == other.start, "concatenated spans must be left-to-right adjacent");
    Span::new(self.start, self.length + other.length)
  }

  /// `true` if the two spans overlap without either containing the
  /// other -- a bracketing violation against a non-terminal constraint
  /// (spec.md §4.6).
  pub fn crosses(self, other: Span) -> bool {
    let (s1, e1) = (self.start, self.end());
    let (s2, e2) = (other.start, other.end());
    let overlaps = s1 < e2 && s2 < e1;
    let nested = (s1 <= s2 && e2 <= e1) || (s2 <= s1 && e1 <= e2);
    overlaps && !nested
  }
}

/// A derivation node. Leaves carry the lexical assignment; `Binary` and
/// `Unary` nodes carry the combinator/rule that produced them. `Arc`-shared
/// so the same subtree can participate in multiple parents, forming a DAG
/// released in bulk at the end of a sentence's parse (spec.md §3, §9).
/// `Arc` rather than `Rc` because a finished tree crosses the thread
/// boundary back from the worker that parsed its sentence (spec.md §5);
/// nothing mutates a node after construction, so the atomic refcount is
/// the only cost over `Rc`.
#[derive(Debug, Clone)]
pub enum Tree {
  Leaf {
    span: Span,
    surface: Arc<str>,
    category: CategoryId,
    lexical_lp: f64,
  },
  Binary {
    span: Span,
    category: CategoryId,
    combinator: Combinator,
    head: HeadSide,
    left: Arc<Tree>,
    right: Arc<Tree>,
    inside: f64,
  },
  Unary {
    span: Span,
    category: CategoryId,
    child: Arc<Tree>,
    inside: f64,
  },
}

impl Tree {
  pub fn span(&self) -> Span {
    match self {
      Tree::Leaf { span, .. } => *span,
      Tree::Binary { span, .. } => *span,
      Tree::Unary { span, .. } => *span,
    }
  }

  pub fn category(&self) -> CategoryId {
    match self {
      Tree::Leaf { category, .. } => *category,
      Tree::Binary { category, .. } => *category,
      Tree::Unary { category, .. } => *category,
    }
  }

  /// Inside score: spec.md §3 "sum of lexical log-probabilities of all
  /// leaves plus head-dependency log-probabilities of all internal
  /// nodes".
  pub fn inside(&self) -> f64 {
    match self {
      Tree::Leaf { lexical_lp, .. } => *lexical_lp,
      Tree::Binary { inside, .. } => *inside,
      Tree::Unary { inside, .. } => *inside,
    }
  }

  /// The token position this node's head passes up to any parent
  /// (spec.md §4.9): a leaf's head is itself; an internal node's head is
  /// whichever child the combinator designated as the head.
  pub fn head_token(&self) -> usize {
    match self {
      Tree::Leaf { span, .. } => span.start,
      Tree::Unary { child, .. } => child.head_token(),
      Tree::Binary { left, right, head, .. } => {
        if head.is_left() {
          left.head_token()
        } else {
          right.head_token()
        }
      }
    }
  }

  /// `true` if this node's top-level rule is a unary rewrite -- used by
  /// the search loop to forbid unary chains of length >= 2 on the same
  /// span (spec.md §3 invariants).
  pub fn is_unary(&self) -> bool {
    matches!(self, Tree::Unary { .. })
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Tree::Leaf { .. })
  }

  pub fn leaf(span: Span, surface: Arc<str>, category: CategoryId, lexical_lp: f64) -> Arc<Tree> {
    Arc::new(Tree::Leaf {
      span,
      surface,
      category,
      lexical_lp,
    })
  }

  pub fn binary(
    category: CategoryId,
    combinator: Combinator,
    head: HeadSide,
    left: Arc<Tree>,
    right: Arc<Tree>,
    inside: f64,
  ) -> Arc<Tree> {
    let span = left.span().concat(right.span());
    Arc::new(Tree::Binary {
      span,
      category,
      combinator,
      head,
      left,
      right,
      inside,
    })
  }

  pub fn unary(category: CategoryId, child: Arc<Tree>, inside: f64) -> Arc<Tree> {
    let span = child.span();
    Arc::new(Tree::Unary {
      span,
      category,
      child,
      inside,
    })
  }

  /// Recomputes the inside score from scratch by walking the tree; used
  /// by tests to check the cached score against spec.md §8's invariant
  /// ("the reported score equals the sum of ... recomputation matches").
  pub fn recompute_inside<F>(&self, dep_lp: &F) -> f64
  where
    F: Fn(usize, usize) -> f64,
  {
    match self {
      Tree::Leaf { lexical_lp, .. } => *lexical_lp,
      Tree::Unary { child, .. } => child.recompute_inside(dep_lp),
      Tree::Binary { left, right, head, .. } => {
        let dependent = if head.is_left() { right } else { left };
        let head_child = if head.is_left() { left } else { right };
        left.recompute_inside(dep_lp) + right.recompute_inside(dep_lp) + dep_lp(dependent.head_token(), head_child.head_token())
      }
    }
  }

  /// Renders this node for display, resolving category ids through the
  /// interner.
  pub fn display<'a>(&'a self, interner: &'a CategoryInterner) -> TreeDisplay<'a> {
    TreeDisplay { tree: self, interner }
  }
}

pub struct TreeDisplay<'a> {
  tree: &'a Tree,
  interner: &'a CategoryInterner,
}

impl<'a> fmt::Display for TreeDisplay<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt_tree(self.tree, self.interner, f)
  }
}

fn fmt_tree(tree: &Tree, interner: &CategoryInterner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
  match tree {
    Tree::Leaf { span, surface, category, .. } => {
      write!(f, "({}..{} {} {})", span.start, span.end(), interner.get(*category), surface)
    }
    Tree::Unary { span, category, child, .. } => {
      write!(f, "({}..{} {} ", span.start, span.end(), interner.get(*category))?;
      fmt_tree(child, interner, f)?;
      write!(f, ")")
    }
    Tree::Binary { span, category, left, right, .. } => {
      write!(f, "({}..{} {} ", span.start, span.end(), interner.get(*category))?;
      fmt_tree(left, interner, f)?;
      write!(f, " ")?;
      fmt_tree(right, interner, f)?;
      write!(f, ")")
    }
  }
}
