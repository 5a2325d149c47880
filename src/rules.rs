//! The rule applicator: binary combinators, unary rules, the seen-rules
//! filter and the category dictionary (spec.md §4.3).

use std::collections::{HashMap, HashSet};

use crate::category::{CategoryId, CategoryInterner, FeatureSet, Slash};

/// The closed set of binary combinators a wide-coverage CCG parser needs.
/// Grounded on the standard depccg/C&C inventory and on
/// `other_examples/.../ccg-parser.rs`'s `ForwardApplication`/`>B`-style
/// variant set. One dispatch arm per variant (spec.md §9: "model it as a
/// tagged sum").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Combinator {
  ForwardApplication,
  BackwardApplication,
  ForwardComposition,
  BackwardComposition,
  ForwardCrossedComposition,
  BackwardCrossedComposition,
  /// `X conj X -> X`-style coordinate-and-keep-the-category rule.
  Conjunction,
}

impl Combinator {
  pub fn is_head_left(self) -> bool {
    matches!(
      self,
      Combinator::ForwardApplication | Combinator::ForwardComposition | Combinator::ForwardCrossedComposition
    )
  }
}

/// Which child a combinator takes its head from; `true` means left.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeadSide(pub bool);

impl HeadSide {
  pub fn left() -> Self {
    HeadSide(true)
  }
  pub fn right() -> Self {
    HeadSide(false)
  }
  pub fn is_left(self) -> bool {
    self.0
  }
}

/// Category pairs the grammar has empirically attested. Built once during
/// grammar setup; consulted read-only in search (spec.md §4.3, §9).
#[derive(Debug, Default)]
pub struct SeenRules {
  pairs: HashSet<(CategoryId, CategoryId)>,
}

impl SeenRules {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, left: CategoryId, right: CategoryId) {
    self.pairs.insert((left, right));
  }

  pub fn contains(&self, left: CategoryId, right: CategoryId) -> bool {
    self.pairs.contains(&(left, right))
  }

  pub fn len(&self) -> usize {
    self.pairs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (CategoryId, CategoryId)> + '_ {
    self.pairs.iter().copied()
  }
}

/// Maps a child category to the set of parent categories a unary rule can
/// rewrite it to over the same span (spec.md §3, §4.3).
#[derive(Debug, Default)]
pub struct UnaryRuleTable {
  parents: HashMap<CategoryId, Vec<CategoryId>>,
}

impl UnaryRuleTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, child: CategoryId, parent: CategoryId) {
    let entry = self.parents.entry(child).or_default();
    if !entry.contains(&parent) {
      entry.push(parent);
    }
  }

  pub fn parents_of(&self, child: CategoryId) -> &[CategoryId] {
    self.parents.get(&child).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Iterates every `(child, parents)` entry; used to build the preimage
  /// of a category under one unary step (spec.md §4.6).
  pub fn entries(&self) -> impl Iterator<Item = (CategoryId, &[CategoryId])> {
    self.parents.iter().map(|(&c, ps)| (c, ps.as_slice()))
  }
}

/// Overrides the lexical-category candidate set for known surface forms
/// (spec.md §4.2 step 1).
#[derive(Debug, Default)]
pub struct CategoryDictionary {
  entries: HashMap<String, Vec<CategoryId>>,
}

impl CategoryDictionary {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, word: &str, categories: Vec<CategoryId>) {
    self.entries.insert(word.to_string(), categories);
  }

  pub fn lookup(&self, word: &str) -> Option<&[CategoryId]> {
    self.entries.get(word).map(Vec::as_slice)
  }
}

/// A legal binary combination: the resulting parent category, which
/// combinator produced it, and which child is the head.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BinaryResult {
  pub parent: CategoryId,
  pub combinator: Combinator,
  pub head: HeadSide,
}

/// Grammar-agnostic rule application (spec.md §4.3): given two adjacent
/// categories, enumerates the legal parents under whichever combinators
/// the active `Language` enables, filtered by the seen-rules table when
/// enabled. The applicator itself carries no language-specific knowledge;
/// `enabled_combinators` is injected by `Grammar`.
pub struct RuleApplicator<'g> {
  interner: &'g CategoryInterner,
  enabled: &'g [Combinator],
  unary: &'g UnaryRuleTable,
  seen_rules: Option<&'g SeenRules>,
}

impl<'g> RuleApplicator<'g> {
  pub fn new(
    interner: &'g CategoryInterner,
    enabled: &'g [Combinator],
    unary: &'g UnaryRuleTable,
    seen_rules: Option<&'g SeenRules>,
  ) -> Self {
    Self {
      interner,
      enabled,
      unary,
      seen_rules,
    }
  }

  /// spec.md §4.3 `apply_binary`: fixed combinator order, dedup by parent
  /// category, seen-rules gate applied on the *normalized* pair.
  pub fn apply_binary(&self, left: CategoryId, right: CategoryId) -> Vec<BinaryResult> {
    if let Some(seen) = self.seen_rules {
      let nl = self.interner.normalized(left);
      let nr = self.interner.normalized(right);
      if !seen.contains(nl, nr) {
        return Vec::new();
      }
    }

    let mut out: Vec<BinaryResult> = Vec::new();
    let mut seen_parents: HashSet<CategoryId> = HashSet::new();
    for &combinator in self.enabled {
      if let Some(parent) = self.try_combinator(combinator, left, right) {
        if seen_parents.insert(parent) {
          out.push(BinaryResult {
            parent,
            combinator,
            head: if combinator.is_head_left() { HeadSide::left() } else { HeadSide::right() },
          });
        }
      }
    }
    out
  }

  fn try_combinator(&self, combinator: Combinator, left: CategoryId, right: CategoryId) -> Option<CategoryId> {
    match combinator {
      Combinator::ForwardApplication => {
        // X/Y  Y  ->  X
        let (slash, x, y) = self.interner.get(left).functional()?;
        if slash == Slash::Fwd && y == right {
          Some(x)
        } else {
          None
        }
      }
      Combinator::BackwardApplication => {
        // Y  X\Y  ->  X
        let (slash, x, y) = self.interner.get(right).functional()?;
        if slash == Slash::Bwd && y == left {
          Some(x)
        } else {
          None
        }
      }
      Combinator::ForwardComposition => {
        // X/Y  Y/Z  ->  X/Z
        let (ls, x, y) = self.interner.get(left).functional()?;
        let (rs, y2, z) = self.interner.get(right).functional()?;
        if ls == Slash::Fwd && rs == Slash::Fwd && y == y2 {
          self.interner.lookup_functional(Slash::Fwd, x, z)
        } else {
          None
        }
      }
      Combinator::BackwardComposition => {
        // Y\Z  X\Y  ->  X\Z
        let (ls, y, z) = self.interner.get(left).functional()?;
        let (rs, x, y2) = self.interner.get(right).functional()?;
        if ls == Slash::Bwd && rs == Slash::Bwd && y == y2 {
          self.interner.lookup_functional(Slash::Bwd, x, z)
        } else {
          None
        }
      }
      Combinator::ForwardCrossedComposition => {
        // X/Y  Y\Z  ->  X\Z
        let (ls, x, y) = self.interner.get(left).functional()?;
        let (rs, y2, z) = self.interner.get(right).functional()?;
        if ls == Slash::Fwd && rs == Slash::Bwd && y == y2 {
          self.interner.lookup_functional(Slash::Bwd, x, z)
        } else {
          None
        }
      }
      Combinator::BackwardCrossedComposition => {
        // Y/Z  X\Y  ->  X/Z
        let (ls, y, z) = self.interner.get(left).functional()?;
        let (rs, x, y2) = self.interner.get(right).functional()?;
        if ls == Slash::Fwd && rs == Slash::Bwd && y == y2 {
          self.interner.lookup_functional(Slash::Fwd, x, z)
        } else {
          None
        }
      }
      Combinator::Conjunction => {
        // conj X -> X (left child is a coordinator conjoining X)
        if left == right {
          Some(right)
        } else {
          None
        }
      }
    }
  }

  /// spec.md §4.3 `apply_unary`: returns the mapped parents; the
  /// no-unary-chain and top-level-root constraints are enforced by the
  /// search loop, which knows whether the child was itself produced by a
  /// unary rule and whether this span is the whole sentence.
  pub fn apply_unary(&self, child: CategoryId) -> &[CategoryId] {
    self.unary.parents_of(child)
  }
}

/// Setup-time-only composition closure: like `RuleApplicator`'s combinator
/// dispatch, but interns any newly produced functional category instead
/// of merely looking one up. Used once, while `GrammarBuilder::build` is
/// computing the binary-combinator closure, before the interner is sealed
/// behind `Arc` -- after that point only `lookup_functional` is reachable
/// (spec.md §5, §9 "no interning occurs during search").
pub fn close_binary(interner: &mut CategoryInterner, enabled: &[Combinator], left: CategoryId, right: CategoryId) -> Vec<CategoryId> {
  let mut out = Vec::new();
  for &combinator in enabled {
    let parent = match combinator {
      Combinator::ForwardApplication => interner.get(left).functional().and_then(|(slash, x, y)| if slash == Slash::Fwd && y == right { Some(x) } else { None }),
      Combinator::BackwardApplication => interner.get(right).functional().and_then(|(slash, x, y)| if slash == Slash::Bwd && y == left { Some(x) } else { None }),
      Combinator::ForwardComposition => {
        let lf = interner.get(left).functional();
        let rf = interner.get(right).functional();
        match (lf, rf) {
          (Some((Slash::Fwd, x, y)), Some((Slash::Fwd, y2, z))) if y == y2 => Some(interner.intern_functional(Slash::Fwd, x, z, FeatureSet::empty())),
          _ => None,
        }
      }
      Combinator::BackwardComposition => {
        let lf = interner.get(left).functional();
        let rf = interner.get(right).functional();
        match (lf, rf) {
          (Some((Slash::Bwd, y, z)), Some((Slash::Bwd, x, y2))) if y == y2 => Some(interner.intern_functional(Slash::Bwd, x, z, FeatureSet::empty())),
          _ => None,
        }
      }
      Combinator::ForwardCrossedComposition => {
        let lf = interner.get(left).functional();
        let rf = interner.get(right).functional();
        match (lf, rf) {
          (Some((Slash::Fwd, x, y)), Some((Slash::Bwd, y2, z))) if y == y2 => Some(interner.intern_functional(Slash::Bwd, x, z, FeatureSet::empty())),
          _ => None,
        }
      }
      Combinator::BackwardCrossedComposition => {
        let lf = interner.get(left).functional();
        let rf = interner.get(right).functional();
        match (lf, rf) {
          (Some((Slash::Fwd, y, z)), Some((Slash::Bwd, x, y2))) if y == y2 => Some(interner.intern_functional(Slash::Fwd, x, z, FeatureSet::empty())),
          _ => None,
        }
      }
      Combinator::Conjunction => {
        if left == right {
          Some(right)
        } else {
          None
        }
      }
    };
    if let Some(parent) = parent {
      out.push(parent);
    }
  }
  out
}
