//! Per-sentence structural constraints (spec.md §4.6): forcing a token's
//! lexical category (`Terminal`) or forbidding bracketing violations
//! against a required span/category (`NonTerminal`).

use std::collections::{HashMap, HashSet};

use crate::category::CategoryId;
use crate::rules::UnaryRuleTable;
use crate::tree::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
  /// Forces token `start`'s lexical category to exactly `category`.
  Terminal { category: CategoryId, start: usize },
  /// Requires the span `[start, start+length)` to bear `category` (or, if
  /// `None`, merely to exist as a constituent regardless of category).
  NonTerminal {
    category: Option<CategoryId>,
    start: usize,
    length: usize,
  },
}

/// Precomputed, query-ready form of a sentence's constraints: terminal
/// categories by token, and non-terminal spans together with the
/// one-step-unary-closed set of categories that satisfy each, so a
/// constituent one unary rewrite away from the required category isn't
/// pruned before that rewrite has a chance to apply (spec.md §4.6).
#[derive(Debug, Default)]
pub struct ConstraintSet {
  terminals: HashMap<usize, CategoryId>,
  non_terminals: Vec<(Span, Option<HashSet<CategoryId>>)>,
}

impl ConstraintSet {
  pub fn new(constraints: &[Constraint], unary: &UnaryRuleTable) -> Self {
    let mut terminals = HashMap::new();
    let mut non_terminals = Vec::new();

    for constraint in constraints {
      match *constraint {
        Constraint::Terminal { category, start } => {
          terminals.insert(start, category);
        }
        Constraint::NonTerminal { category, start, length } => {
          let admissible = category.map(|cat| Self::one_step_closure(cat, unary));
          non_terminals.push((Span::new(start, length), admissible));
        }
      }
    }

    Self { terminals, non_terminals }
  }

  /// `{category}` plus every category a unary rule rewrites *to*
  /// `category`, i.e. the preimage of `category` under one unary step.
  fn one_step_closure(category: CategoryId, unary: &UnaryRuleTable) -> HashSet<CategoryId> {
    let mut set = HashSet::new();
    set.insert(category);
    for (child, parents) in unary.entries() {
      if parents.contains(&category) {
        set.insert(child);
      }
    }
    set
  }

  pub fn terminal_for(&self, token: usize) -> Option<CategoryId> {
    self.terminals.get(&token).copied()
  }

  /// `true` if building a constituent with `category` over `span` would
  /// violate a constraint: either it crosses a required span without
  /// nesting inside or around it, or it exactly covers a constrained span
  /// with a category outside that span's admissible set.
  pub fn rejects(&self, span: Span, category: CategoryId) -> bool {
    for (required_span, admissible) in &self.non_terminals {
      if span.crosses(*required_span) {
        return true;
      }
      if span == *required_span {
        if let Some(admissible) = admissible {
          if !admissible.contains(&category) {
            return true;
          }
        }
      }
    }
    false
  }

  pub fn is_empty(&self) -> bool {
    self.terminals.is_empty() && self.non_terminals.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::category::CategoryInterner;

  #[test]
  fn terminal_constraint_is_queryable_by_token() {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    i.seal_normalization();
    let unary = UnaryRuleTable::new();
    let constraints = [Constraint::Terminal { category: np, start: 2 }];
    let set = ConstraintSet::new(&constraints, &unary);
    assert_eq!(set.terminal_for(2), Some(np));
    assert_eq!(set.terminal_for(0), None);
  }

  #[test]
  fn crossing_span_is_rejected() {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    i.seal_normalization();
    let unary = UnaryRuleTable::new();
    let constraints = [Constraint::NonTerminal {
      category: Some(np),
      start: 1,
      length: 3,
    }];
    let set = ConstraintSet::new(&constraints, &unary);
    // [0, 2) crosses [1, 4) without nesting.
    assert!(set.rejects(Span::new(0, 2), np));
    // [1, 3) nests inside [1, 4), no crossing.
    assert!(!set.rejects(Span::new(1, 2), np));
  }

  #[test]
  fn exact_span_category_mismatch_is_rejected() {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    let s = i.parse_and_intern("S").unwrap();
    i.seal_normalization();
    let unary = UnaryRuleTable::new();
    let constraints = [Constraint::NonTerminal {
      category: Some(np),
      start: 0,
      length: 2,
    }];
    let set = ConstraintSet::new(&constraints, &unary);
    assert!(set.rejects(Span::new(0, 2), s));
    assert!(!set.rejects(Span::new(0, 2), np));
  }

  #[test]
  fn one_step_unary_closure_admits_the_pre_image() {
    let mut i = CategoryInterner::new();
    let np = i.parse_and_intern("NP").unwrap();
    let s = i.parse_and_intern("S").unwrap();
    i.seal_normalization();
    let mut unary = UnaryRuleTable::new();
    unary.insert(np, s); // NP can unary-rewrite to S
    let constraints = [Constraint::NonTerminal {
      category: Some(s),
      start: 0,
      length: 2,
    }];
    let set = ConstraintSet::new(&constraints, &unary);
    // NP hasn't been rewritten yet but is one unary step from S, so it's
    // not rejected outright.
    assert!(!set.rejects(Span::new(0, 2), np));
  }
}
