//! Interned CCG categories.
//!
//! A [`Category`] is either atomic (`NP`, `S[dcl]`) or functional
//! (`X/Y`, `X\Y`). Categories are interned into a [`CategoryInterner`]
//! arena so that equality on the hot path is identity comparison on a
//! [`CategoryId`], not structural comparison (spec.md §3, §9).
//!
//! Interning only happens while a [`CategoryInterner`] is owned
//! (`&mut self` methods); once a grammar is built the interner is wrapped
//! in `Arc` and shared read-only, so the type system -- not a runtime
//! flag -- keeps search from mutating the table (spec.md §5).

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Index into a [`CategoryInterner`]'s arena. Copy, so it moves through
/// the hot path (chart keys, agenda items) for free.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slash {
  Fwd,
  Bwd,
}

impl fmt::Display for Slash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Fwd => write!(f, "/"),
      Self::Bwd => write!(f, "\\"),
    }
  }
}

/// A sorted, deduplicated set of bracket tags, e.g. the `dcl` in `S[dcl]`.
/// Sorted so two structurally identical feature sets hash and compare equal
/// regardless of the order they were written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet(Vec<String>);

impl FeatureSet {
  pub fn empty() -> Self {
    Self(Vec::new())
  }

  pub fn from_tags<I: IntoIterator<Item = String>>(tags: I) -> Self {
    let mut v: Vec<String> = tags.into_iter().collect();
    v.sort();
    v.dedup();
    Self(v)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn tags(&self) -> &[String] {
    &self.0
  }

  /// Strips the features the seen-rules filter ignores (spec.md §3:
  /// "features `[X]` and `[nb]` are stripped when comparing for the
  /// seen-rules filter only").
  fn normalized(&self) -> Self {
    Self(
      self
        .0
        .iter()
        .filter(|t| t.as_str() != "X" && t.as_str() != "nb")
        .cloned()
        .collect(),
    )
  }
}

impl fmt::Display for FeatureSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      Ok(())
    } else {
      write!(f, "[{}]", self.0.join(","))
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CategoryNode {
  Atomic {
    name: String,
    features: FeatureSet,
  },
  Functional {
    slash: Slash,
    left: CategoryId,
    right: CategoryId,
    features: FeatureSet,
  },
}

#[derive(Debug, Error)]
pub enum CategorySyntaxError {
  #[error("unexpected end of category string")]
  UnexpectedEof,
  #[error("expected {expected} at `{remainder}`")]
  Expected { expected: &'static str, remainder: String },
  #[error("trailing input after category: `{0}`")]
  TrailingInput(String),
}

type CatResult<'a, T> = Result<(T, &'a str), CategorySyntaxError>;

macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static::lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

fn skip_ws(s: &str) -> &str {
  s.trim_start()
}

fn take_re<'a>(re: &Regex, s: &'a str, expected: &'static str) -> CatResult<'a, &'a str> {
  match re.find(s) {
    Some(m) if m.start() == 0 => Ok((m.as_str(), &s[m.end()..])),
    _ => Err(CategorySyntaxError::Expected {
      expected,
      remainder: s.to_string(),
    }),
  }
}

fn parse_name(s: &str) -> CatResult<&str> {
  regex_static!(NAME, r"^[A-Za-z][A-Za-z0-9_]*");
  take_re(&NAME, s, "category name")
}

fn parse_features(s: &str) -> CatResult<FeatureSet> {
  regex_static!(TAG, r"^[A-Za-z][A-Za-z0-9_]*");
  if !s.starts_with('[') {
    return Ok((FeatureSet::empty(), s));
  }
  let mut rest = &s[1..];
  let mut tags = Vec::new();
  loop {
    rest = skip_ws(rest);
    let (tag, r) = take_re(&TAG, rest, "feature tag")?;
    tags.push(tag.to_string());
    rest = skip_ws(r);
    if let Some(r) = rest.strip_prefix(',') {
      rest = r;
      continue;
    }
    break;
  }
  let rest = rest
    .strip_prefix(']')
    .ok_or_else(|| CategorySyntaxError::Expected {
      expected: "]",
      remainder: rest.to_string(),
    })?;
  Ok((FeatureSet::from_tags(tags), rest))
}

/// Arena of interned categories plus the dedup index used while building
/// the grammar. All structural parsing/allocation happens through
/// `&mut self` methods here; after the grammar seals the interner behind
/// `Arc`, only `&self` lookup methods remain reachable.
#[derive(Debug, Default)]
pub struct CategoryInterner {
  arena: Vec<CategoryNode>,
  index: HashMap<CategoryNode, CategoryId>,
  normalized: Vec<CategoryId>,
}

impl CategoryInterner {
  pub fn new() -> Self {
    Self::default()
  }

  fn intern(&mut self, node: CategoryNode) -> CategoryId {
    if let Some(&id) = self.index.get(&node) {
      return id;
    }
    let id = CategoryId(self.arena.len() as u32);
    self.arena.push(node.clone());
    self.index.insert(node, id);
    id
  }

  pub fn intern_atomic(&mut self, name: &str, features: FeatureSet) -> CategoryId {
    self.intern(CategoryNode::Atomic {
      name: name.to_string(),
      features,
    })
  }

  pub fn intern_functional(
    &mut self,
    slash: Slash,
    left: CategoryId,
    right: CategoryId,
    features: FeatureSet,
  ) -> CategoryId {
    self.intern(CategoryNode::Functional {
      slash,
      left,
      right,
      features,
    })
  }

  /// Parses a CCGbank-style category string (`S[dcl]\NP/NP`) and interns
  /// every subterm. Slash application is left-associative; parentheses
  /// group explicitly.
  pub fn parse_and_intern(&mut self, s: &str) -> Result<CategoryId, CategorySyntaxError> {
    let (id, rest) = self.parse_category(s.trim())?;
    let rest = rest.trim();
    if !rest.is_empty() {
      return Err(CategorySyntaxError::TrailingInput(rest.to_string()));
    }
    Ok(id)
  }

  fn parse_category<'a>(&mut self, s: &'a str) -> CatResult<'a, CategoryId> {
    let (mut left, mut rest) = self.parse_primary(s)?;
    loop {
      let trimmed = skip_ws(rest);
      let slash = if let Some(r) = trimmed.strip_prefix('/') {
        rest = r;
        Slash::Fwd
      } else if let Some(r) = trimmed.strip_prefix('\\') {
        rest = r;
        Slash::Bwd
      } else {
        break;
      };
      let (right, r) = self.parse_primary(rest)?;
      rest = r;
      left = self.intern_functional(slash, left, right, FeatureSet::empty());
    }
    Ok((left, rest))
  }

  fn parse_primary<'a>(&mut self, s: &'a str) -> CatResult<'a, CategoryId> {
    let s = skip_ws(s);
    if let Some(rest) = s.strip_prefix('(') {
      let (id, rest) = self.parse_category(rest)?;
      let rest = skip_ws(rest)
        .strip_prefix(')')
        .ok_or(CategorySyntaxError::Expected {
          expected: ")",
          remainder: rest.to_string(),
        })?;
      return Ok((id, rest));
    }
    let (name, rest) = parse_name(s)?;
    let (features, rest) = parse_features(rest)?;
    Ok((self.intern_atomic(name, features), rest))
  }

  pub fn get(&self, id: CategoryId) -> CategoryRef<'_> {
    CategoryRef { interner: self, id }
  }

  pub fn len(&self) -> usize {
    self.arena.len()
  }

  pub fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  /// Looks up the interned id of an already-built functional category,
  /// without creating one. Used by `RuleApplicator::apply_binary` at
  /// search time, after the interner has been sealed: a combinator whose
  /// result wasn't part of the setup-time closure simply doesn't fire.
  pub fn lookup_functional(&self, slash: Slash, left: CategoryId, right: CategoryId) -> Option<CategoryId> {
    self
      .index
      .get(&CategoryNode::Functional {
        slash,
        left,
        right,
        features: FeatureSet::empty(),
      })
      .copied()
  }

  pub fn lookup_atomic(&self, name: &str, features: &FeatureSet) -> Option<CategoryId> {
    self
      .index
      .get(&CategoryNode::Atomic {
        name: name.to_string(),
        features: features.clone(),
      })
      .copied()
  }

  /// Computes, for every interned category, the id of its seen-rules
  /// normalized form (features `X`/`nb` stripped), interning any new
  /// normalized term that doesn't already exist. Must run before the
  /// grammar seals the interner behind `Arc` (spec.md §3, §9).
  pub(crate) fn seal_normalization(&mut self) {
    self.normalized = Vec::with_capacity(self.arena.len());
    let mut idx = 0;
    // new entries can be appended by normalization itself; walk by index
    // until we've covered everything, including newly-added normal forms.
    while idx < self.arena.len() {
      let node = self.arena[idx].clone();
      let norm = self.normalize_node(&node);
      self.normalized.push(norm);
      idx += 1;
    }
  }

  fn normalize_node(&mut self, node: &CategoryNode) -> CategoryId {
    match node {
      CategoryNode::Atomic { name, features } => {
        let stripped = features.normalized();
        self.intern_atomic(name, stripped)
      }
      CategoryNode::Functional {
        slash,
        left,
        right,
        features,
      } => {
        let stripped = features.normalized();
        // Children are always interned before this functional category, so
        // by the time `seal_normalization`'s index walk reaches this node
        // their own normalized forms are already populated. Recursing
        // through them (rather than reusing the raw child ids) is what
        // makes e.g. `S\NP[nb]` normalize the same as `S\NP`.
        let norm_left = self.normalized[left.0 as usize];
        let norm_right = self.normalized[right.0 as usize];
        self.intern_functional(*slash, norm_left, norm_right, stripped)
      }
    }
  }

  pub fn normalized(&self, id: CategoryId) -> CategoryId {
    self.normalized[id.0 as usize]
  }

  /// `true` if `id` was actually interned by (this or an ancestor build
  /// step of) this table. Used to validate externally-supplied
  /// constraint categories before search starts (spec.md §7
  /// `GrammarInconsistency`).
  pub fn contains(&self, id: CategoryId) -> bool {
    (id.0 as usize) < self.arena.len()
  }
}

pub struct CategoryRef<'a> {
  interner: &'a CategoryInterner,
  id: CategoryId,
}

impl<'a> CategoryRef<'a> {
  pub fn id(&self) -> CategoryId {
    self.id
  }

  pub fn is_atomic(&self) -> bool {
    matches!(&self.interner.arena[self.id.0 as usize], CategoryNode::Atomic { .. })
  }

  /// Returns `(slash, left, right)` if this category is functional.
  pub fn functional(&self) -> Option<(Slash, CategoryId, CategoryId)> {
    match &self.interner.arena[self.id.0 as usize] {
      CategoryNode::Functional { slash, left, right, .. } => Some((*slash, *left, *right)),
      CategoryNode::Atomic { .. } => None,
    }
  }

  pub fn atomic_name(&self) -> Option<&'a str> {
    match &self.interner.arena[self.id.0 as usize] {
      CategoryNode::Atomic { name, .. } => Some(name.as_str()),
      CategoryNode::Functional { .. } => None,
    }
  }
}

impl<'a> fmt::Display for CategoryRef<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt_node(self.interner, self.id, f)
  }
}

fn fmt_node(interner: &CategoryInterner, id: CategoryId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
  match &interner.arena[id.0 as usize] {
    CategoryNode::Atomic { name, features } => write!(f, "{}{}", name, features),
    CategoryNode::Functional { slash, left, right, features } => {
      fmt_operand(interner, *left, f, true)?;
      write!(f, "{}", slash)?;
      fmt_operand(interner, *right, f, false)?;
      write!(f, "{}", features)
    }
  }
}

fn fmt_operand(interner: &CategoryInterner, id: CategoryId, f: &mut fmt::Formatter<'_>, _is_left: bool) -> fmt::Result {
  let needs_parens = matches!(&interner.arena[id.0 as usize], CategoryNode::Functional { .. });
  if needs_parens {
    write!(f, "(")?;
    fmt_node(interner, id, f)?;
    write!(f, ")")
  } else {
    fmt_node(interner, id, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interns_identical_atoms_once() {
    let mut i = CategoryInterner::new();
    let a = i.intern_atomic("NP", FeatureSet::empty());
    let b = i.intern_atomic("NP", FeatureSet::empty());
    assert_eq!(a, b);
    assert_eq!(i.len(), 1);
  }

  #[test]
  fn parses_simple_atom() {
    let mut i = CategoryInterner::new();
    let id = i.parse_and_intern("NP").unwrap();
    assert_eq!(format!("{}", i.get(id)), "NP");
  }

  #[test]
  fn parses_feature_tag() {
    let mut i = CategoryInterner::new();
    let id = i.parse_and_intern("S[dcl]").unwrap();
    assert_eq!(format!("{}", i.get(id)), "S[dcl]");
  }

  #[test]
  fn parses_left_associative_slashes() {
    let mut i = CategoryInterner::new();
    let id = i.parse_and_intern(r"S[dcl]\NP/NP").unwrap();
    assert_eq!(format!("{}", i.get(id)), r"S[dcl]\NP/NP");
    let (slash, left, right) = i.get(id).functional().unwrap();
    assert_eq!(slash, Slash::Fwd);
    assert_eq!(format!("{}", i.get(right)), "NP");
    let (inner_slash, _, _) = i.get(left).functional().unwrap();
    assert_eq!(inner_slash, Slash::Bwd);
  }

  #[test]
  fn parses_parenthesized_categories() {
    let mut i = CategoryInterner::new();
    let id = i.parse_and_intern(r"(S\NP)/NP").unwrap();
    assert_eq!(format!("{}", i.get(id)), r"S\NP/NP");
  }

  #[test]
  fn normalization_strips_x_and_nb() {
    let mut i = CategoryInterner::new();
    let nb = i.intern_atomic("NP", FeatureSet::from_tags(["nb".to_string()]));
    let bare = i.intern_atomic("NP", FeatureSet::empty());
    i.seal_normalization();
    assert_eq!(i.normalized(nb), i.normalized(bare));
  }

  /// `[nb]` is pervasive on the `NP` operand of CCGbank-style functional
  /// categories (`S\NP[nb]`); the seen-rules filter compares normalized
  /// forms, so the tag must be stripped from nested children too, not just
  /// the functional category's own (always-empty) feature set.
  #[test]
  fn normalization_recurses_into_functional_children() {
    let mut i = CategoryInterner::new();
    let nb = i.parse_and_intern(r"S\NP[nb]").unwrap();
    let bare = i.parse_and_intern(r"S\NP").unwrap();
    i.seal_normalization();
    assert_eq!(i.normalized(nb), i.normalized(bare));
  }

  #[test]
  fn rejects_trailing_garbage() {
    let mut i = CategoryInterner::new();
    assert!(i.parse_and_intern("NP)").is_err());
  }
}
