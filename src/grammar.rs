//! The grammar: interned category inventory, rule tables, admissible
//! roots and the configuration knobs a parse run honors (spec.md §4.3,
//! §6). Built once per process by [`GrammarBuilder`] and shared read-only
//! across the worker pool thereafter (spec.md §5).

use crate::category::{CategoryId, CategoryInterner};
use crate::error::{ParseError, Result};
use crate::pruner::TagInventory;
use crate::rules::{close_binary, CategoryDictionary, Combinator, SeenRules, UnaryRuleTable};

/// The two supported grammar variants; they differ only in rule tables
/// and admissible root categories (spec.md §1).
///
/// These are kept as distinct tags. The source this was distilled from
/// set Japanese's language tag to the same value as English's; spec.md
/// §9 flags that as a latent bug not to replicate without verification,
/// so `Language` here is a real two-variant enum.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Language {
  English,
  Japanese,
}

/// Parse-time knobs (spec.md §6). `Default` matches the documented
/// defaults.
#[derive(Debug, Clone)]
pub struct ParserConfig {
  pub beta: f64,
  pub use_beta: bool,
  pub pruning_size: usize,
  pub nbest: usize,
  pub use_category_dict: bool,
  pub use_seen_rules: bool,
  pub max_length: usize,
  pub max_steps: usize,
}

impl Default for ParserConfig {
  fn default() -> Self {
    Self {
      beta: 1e-5,
      use_beta: true,
      pruning_size: 50,
      nbest: 1,
      use_category_dict: true,
      use_seen_rules: true,
      max_length: 250,
      max_steps: 100_000,
    }
  }
}

/// Immutable, shared grammar: every field here is finished during
/// [`GrammarBuilder::build`] and never mutated again. Share it behind an
/// `Arc` across the worker pool (spec.md §5).
pub struct Grammar {
  language: Language,
  interner: CategoryInterner,
  tags: TagInventory,
  dictionary: CategoryDictionary,
  unary: UnaryRuleTable,
  seen_rules: SeenRules,
  combinators: Vec<Combinator>,
  roots: Vec<CategoryId>,
}

impl Grammar {
  pub fn language(&self) -> Language {
    self.language
  }

  pub fn interner(&self) -> &CategoryInterner {
    &self.interner
  }

  pub fn tags(&self) -> &TagInventory {
    &self.tags
  }

  pub fn dictionary(&self) -> &CategoryDictionary {
    &self.dictionary
  }

  pub fn unary(&self) -> &UnaryRuleTable {
    &self.unary
  }

  pub fn seen_rules(&self) -> &SeenRules {
    &self.seen_rules
  }

  pub fn combinators(&self) -> &[Combinator] {
    &self.combinators
  }

  pub fn roots(&self) -> &[CategoryId] {
    &self.roots
  }
}

/// Builds a [`Grammar`] from parsed, in-memory resource tables (spec.md
/// §6: loading the concrete on-disk formats is an external concern; the
/// core only ever consumes already-parsed tables). Call sites register
/// tag categories, dictionary entries, unary rules, seen-rule pairs and
/// admissible roots, then [`build`](GrammarBuilder::build) computes the
/// binary-combinator closure and seals the category interner.
pub struct GrammarBuilder {
  language: Language,
  interner: CategoryInterner,
  tag_categories: Vec<CategoryId>,
  dictionary: CategoryDictionary,
  unary: UnaryRuleTable,
  seen_rule_pairs: Vec<(CategoryId, CategoryId)>,
  combinators: Vec<Combinator>,
  roots: Vec<CategoryId>,
}

impl GrammarBuilder {
  pub fn new(language: Language, combinators: Vec<Combinator>) -> Self {
    Self {
      language,
      interner: CategoryInterner::new(),
      tag_categories: Vec::new(),
      dictionary: CategoryDictionary::new(),
      unary: UnaryRuleTable::new(),
      seen_rule_pairs: Vec::new(),
      combinators,
      roots: Vec::new(),
    }
  }

  /// Parses and interns a category string. Category strings recur across
  /// the tag inventory, dictionary, unary rules, seen rules and roots, so
  /// every caller should route through this method to keep them all
  /// resolving against the same interner.
  pub fn intern(&mut self, category: &str) -> Result<CategoryId> {
    self.interner.parse_and_intern(category).map_err(|e| ParseError::GrammarInconsistency(e.to_string()))
  }

  /// Registers `category` as a column of the fixed supertag inventory.
  /// Order is significant: it must match the external scorer's `P_tag`
  /// column order.
  pub fn add_tag(&mut self, category: CategoryId) {
    self.tag_categories.push(category);
  }

  pub fn add_dictionary_entry(&mut self, word: &str, categories: Vec<CategoryId>) {
    self.dictionary.insert(word, categories);
  }

  pub fn add_unary_rule(&mut self, child: CategoryId, parent: CategoryId) {
    self.unary.insert(child, parent);
  }

  /// Records a seen-rules pair. Stored as given; re-keyed to normalized
  /// form once the interner is sealed in `build`, since normalization
  /// isn't computable until then.
  pub fn add_seen_rule(&mut self, left: CategoryId, right: CategoryId) {
    self.seen_rule_pairs.push((left, right));
  }

  pub fn add_root(&mut self, category: CategoryId) {
    self.roots.push(category);
  }

  /// Computes the reflexive-transitive closure of the binary combinators
  /// over the tag inventory, interning every composed category so that
  /// `RuleApplicator::apply_binary`'s `lookup_functional` calls at search
  /// time never miss (spec.md §5, §9 "Global interner"). Composition can
  /// itself produce new functional categories whose further compositions
  /// must also be precomputed, so this runs to a fixed point.
  ///
  /// Grammars seen in practice have small tag inventories (tens to a few
  /// hundred categories), so the naive quadratic sweep per round is not a
  /// bottleneck; this only ever runs once, at setup.
  fn close_combinators(&mut self) {
    let mut known: Vec<CategoryId> = self.tag_categories.clone();
    loop {
      let snapshot = known.clone();
      let mut grew = false;
      for &left in &snapshot {
        for &right in &snapshot {
          for parent in close_binary(&mut self.interner, &self.combinators, left, right) {
            if !known.contains(&parent) {
              known.push(parent);
              grew = true;
            }
          }
        }
      }
      if !grew {
        break;
      }
    }
  }

  pub fn build(mut self) -> Grammar {
    let tags_before_closure = self.tag_categories.len();
    self.close_combinators();
    self.interner.seal_normalization();

    let mut seen_rules = SeenRules::new();
    for (left, right) in self.seen_rule_pairs {
      seen_rules.insert(self.interner.normalized(left), self.interner.normalized(right));
    }

    tracing::info!(
      language = ?self.language,
      tag_inventory = tags_before_closure,
      categories_interned = self.interner.len(),
      seen_rules = seen_rules.len(),
      roots = self.roots.len(),
      "built grammar",
    );

    Grammar {
      language: self.language,
      interner: self.interner,
      tags: TagInventory::new(self.tag_categories),
      dictionary: self.dictionary,
      unary: self.unary,
      seen_rules,
      combinators: self.combinators,
      roots: self.roots,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn default_combinators() -> Vec<Combinator> {
    vec![
      Combinator::ForwardApplication,
      Combinator::BackwardApplication,
      Combinator::ForwardComposition,
      Combinator::BackwardComposition,
    ]
  }

  #[test]
  fn closure_interns_composed_categories_before_sealing() {
    let mut builder = GrammarBuilder::new(Language::English, default_combinators());
    let s = builder.intern("S").unwrap();
    let np = builder.intern("NP").unwrap();
    let pp = builder.intern("PP").unwrap();
    let svnp = builder.interner.intern_functional(crate::category::Slash::Bwd, s, np, Default::default());
    let svnp_pp = builder.interner.intern_functional(crate::category::Slash::Fwd, svnp, pp, Default::default());
    let pp_pp = builder.interner.intern_functional(crate::category::Slash::Fwd, pp, pp, Default::default());
    builder.add_tag(svnp_pp);
    builder.add_tag(pp_pp);
    builder.add_root(s);

    let grammar = builder.build();
    // The composed (S\NP)/PP must already be interned: lookup_functional
    // must find it without any further mutation.
    let found = grammar.interner().lookup_functional(crate::category::Slash::Fwd, svnp, pp);
    assert!(found.is_some());
  }

  #[test]
  fn seen_rules_are_rekeyed_to_normalized_form() {
    let mut builder = GrammarBuilder::new(Language::English, default_combinators());
    let bare = builder.intern("NP").unwrap();
    let nb = builder.intern("NP[nb]").unwrap();
    let s = builder.intern("S").unwrap();
    builder.add_tag(bare);
    builder.add_tag(s);
    builder.add_seen_rule(nb, s);

    let grammar = builder.build();
    let norm_bare = grammar.interner().normalized(bare);
    let norm_s = grammar.interner().normalized(s);
    assert!(grammar.seen_rules().contains(norm_bare, norm_s));
  }

  #[test]
  fn default_parser_config_matches_documented_defaults() {
    let config = ParserConfig::default();
    assert_eq!(config.pruning_size, 50);
    assert_eq!(config.nbest, 1);
    assert_eq!(config.max_length, 250);
    assert_eq!(config.max_steps, 100_000);
    assert!((config.beta - 1e-5).abs() < f64::EPSILON);
  }
}
