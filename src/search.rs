//! The A* search loop (spec.md §4.7): seeds the agenda with lexical items,
//! repeatedly pops the best partial derivation, combines it with chart
//! neighbours, applies unary rules, checks root admissibility, and emits
//! up to `nbest` complete parses.

use std::sync::Arc;

use thiserror::Error;

use crate::agenda::Agenda;
use crate::chart::Chart;
use crate::constraint::{Constraint, ConstraintSet};
use crate::dependency::{binary_dependency_lp, root_dependency_lp};
use crate::error::{Diagnostic, ParseError};
use crate::grammar::{Grammar, ParserConfig};
use crate::heuristic::HeuristicTable;
use crate::pruner::Pruner;
use crate::rules::RuleApplicator;
use crate::score::ScoreView;
use crate::tree::Tree;

/// Errors that abort a sentence's parse outright rather than degrading to
/// an empty result (spec.md §7).
#[derive(Debug, Error)]
pub enum SentenceError {
  #[error(transparent)]
  Shape(#[from] ParseError),
}

/// One sentence's input: tokenized surface forms plus the two flattened,
/// row-major score matrices described in spec.md §4.1 and §6.
pub struct Sentence<'a> {
  pub words: &'a [Arc<str>],
  pub tag_scores: &'a [f64],
  pub dep_scores: &'a [f64],
  pub constraints: &'a [Constraint],
}

/// `nbest` complete parses, highest score first, plus the diagnostic code
/// explaining why the search stopped (spec.md §7, §8).
pub struct ParseResult {
  pub parses: Vec<(Arc<Tree>, f64)>,
  pub diagnostic: Diagnostic,
}

impl ParseResult {
  fn empty(diagnostic: Diagnostic) -> Self {
    Self { parses: Vec::new(), diagnostic }
  }
}

/// Runs the A* search for one sentence against `grammar` under `config`
/// (spec.md §4.7). Returns `Err` only for the fatal shape mismatch; every
/// other degraded outcome (length/step limits, exhaustion) comes back as a
/// `ParseResult` with an explanatory `Diagnostic`, per spec.md §7.
#[tracing::instrument(level = "debug", skip_all, fields(sent_len = sentence.words.len()))]
pub fn parse_sentence(grammar: &Grammar, config: &ParserConfig, sentence: &Sentence) -> Result<ParseResult, SentenceError> {
  let sent_len = sentence.words.len();
  if sent_len == 0 {
    return Ok(ParseResult::empty(Diagnostic::Complete));
  }
  if sent_len > config.max_length {
    tracing::debug!(max_length = config.max_length, "sentence skipped: exceeds max_length");
    return Ok(ParseResult::empty(Diagnostic::LengthExceeded));
  }

  let scores = ScoreView::new(sent_len, grammar.tags().len(), sentence.tag_scores, sentence.dep_scores)?;

  for constraint in sentence.constraints {
    let referenced = match *constraint {
      Constraint::Terminal { category, .. } => Some(category),
      Constraint::NonTerminal { category, .. } => category,
    };
    if let Some(category) = referenced {
      if !grammar.interner().contains(category) {
        return Err(SentenceError::Shape(ParseError::GrammarInconsistency(format!(
          "constraint references category id not in the grammar's inventory: {:?}",
          category
        ))));
      }
    }
  }

  let heuristic = HeuristicTable::new(&scores);
  let constraints = ConstraintSet::new(sentence.constraints, grammar.unary());
  let seen_rules = if config.use_seen_rules { Some(grammar.seen_rules()) } else { None };
  let applicator = RuleApplicator::new(grammar.interner(), grammar.combinators(), grammar.unary(), seen_rules);
  let pruner = Pruner::new(grammar.tags(), grammar.dictionary(), config.beta, config.use_beta, config.pruning_size, config.use_category_dict);

  let mut agenda = Agenda::new();
  let mut chart = Chart::new(config.pruning_size);

  for (token, word) in sentence.words.iter().enumerate() {
    let terminal = constraints.terminal_for(token);
    for (category, lexical_lp) in pruner.candidates(token, word, &scores, terminal) {
      if constraints.rejects(crate::tree::Span::new(token, 1), category) {
        continue;
      }
      let leaf = Tree::leaf(crate::tree::Span::new(token, 1), word.clone(), category, lexical_lp);
      let priority = priority_of(&heuristic, &scores, sent_len, &leaf);
      agenda.push(leaf, priority);
    }
  }

  let mut parses: Vec<(Arc<Tree>, f64)> = Vec::new();
  let mut steps: usize = 0;

  let diagnostic = loop {
    if parses.len() >= config.nbest {
      tracing::debug!(steps, found = parses.len(), "search complete: nbest reached");
      break Diagnostic::Complete;
    }
    if steps >= config.max_steps {
      tracing::warn!(steps, found = parses.len(), "step limit exceeded");
      break Diagnostic::StepLimitExceeded;
    }
    let Some(item) = agenda.pop() else {
      let diagnostic = if parses.is_empty() { Diagnostic::SearchExhausted } else { Diagnostic::Complete };
      tracing::debug!(steps, found = parses.len(), ?diagnostic, "agenda exhausted");
      break diagnostic;
    };
    steps += 1;

    if chart.is_locked(&item) {
      continue;
    }
    chart.finalize(item.clone());

    let span = item.span();
    if span.start == 0 && span.length == sent_len && grammar.roots().contains(&item.category()) {
      let total = priority_of(&heuristic, &scores, sent_len, &item);
      parses.push((item.clone(), total));
    }

    if !item.is_unary() {
      let is_top = span.start == 0 && span.length == sent_len;
      for &parent in applicator.apply_unary(item.category()) {
        if is_top && !grammar.roots().contains(&parent) {
          continue;
        }
        if constraints.rejects(span, parent) {
          continue;
        }
        let unary = Tree::unary(parent, item.clone(), item.inside());
        let priority = priority_of(&heuristic, &scores, sent_len, &unary);
        if chart.insert(unary.clone()) {
          agenda.push(unary, priority);
        }
      }
    }

    for neighbor in chart.neighbors(&item) {
      let (left, right) = if neighbor.span().end() == span.start {
        (neighbor, item.clone())
      } else if span.end() == neighbor.span().start {
        (item.clone(), neighbor)
      } else {
        continue;
      };

      for result in applicator.apply_binary(left.category(), right.category()) {
        let new_span = left.span().concat(right.span());
        if constraints.rejects(new_span, result.parent) {
          continue;
        }
        let dep_lp = binary_dependency_lp(&scores, &left, &right, result.head);
        let inside = left.inside() + right.inside() + dep_lp;
        let combined = Tree::binary(result.parent, result.combinator, result.head, left.clone(), right.clone(), inside);
        let priority = priority_of(&heuristic, &scores, sent_len, &combined);
        if chart.insert(combined.clone()) {
          agenda.push(combined, priority);
        }
      }
    }
  };

  // spec.md §8: "sorted by non-increasing score". The priority above now
  // folds the root-attachment term into full-span items, so pop order
  // already matches final score; sort defensively so the invariant holds
  // even across a float tie.
  parses.sort_by(|a, b| b.1.total_cmp(&a.1));
  Ok(ParseResult { parses, diagnostic })
}

/// Agenda priority for `derivation`: inside score plus the outside estimate
/// for whatever isn't yet covered (spec.md §4.7, §4.8). The outside estimate
/// is exactly zero once a derivation spans the whole sentence, but reaching
/// a complete *parse* still requires attaching the root's head token to
/// ROOT (spec.md §4.9) -- a term the outside table never accounts for.
/// Folding it in here keeps a full-span item's priority exactly equal to
/// its eventual reported score, which A* needs to guarantee the first
/// complete parse popped is optimal (spec.md §9 "Heuristic admissibility").
fn priority_of(heuristic: &HeuristicTable, scores: &ScoreView, sent_len: usize, derivation: &Tree) -> f64 {
  let span = derivation.span();
  let mut priority = derivation.inside() + heuristic.outside(span.start, span.length);
  if span.start == 0 && span.length == sent_len {
    priority += root_dependency_lp(scores, derivation);
  }
  priority
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::{GrammarBuilder, Language};
  use crate::rules::Combinator;

  fn simple_grammar() -> Grammar {
    let mut builder = GrammarBuilder::new(
      Language::English,
      vec![Combinator::ForwardApplication, Combinator::BackwardApplication],
    );
    let np = builder.intern("NP").unwrap();
    let s = builder.intern("S").unwrap();
    let iv = builder.intern(r"S\NP").unwrap();
    let _ = s; // S is only reachable here via the S\NP functional category
    builder.add_tag(np);
    builder.add_tag(iv);
    builder.add_root(s);
    builder.build()
  }

  #[test]
  fn single_token_one_hot_yields_trivial_leaf_parse() {
    let grammar = {
      let mut builder = GrammarBuilder::new(Language::English, vec![]);
      let np = builder.intern("NP").unwrap();
      builder.add_tag(np);
      builder.add_root(np);
      builder.build()
    };
    let config = ParserConfig::default();

    let tag_scores = vec![0.0]; // single tag, one-hot at NP
    let dep_scores = vec![0.0, -100.0]; // 1 token x 2 (root, ->self)
    let words = vec![Arc::<str>::from("Hello")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert_eq!(result.parses.len(), 1);
    let (tree, score) = &result.parses[0];
    assert!(tree.is_leaf());
    assert!((score - 0.0).abs() < 1e-9);
  }

  #[test]
  fn two_token_backward_application_combines_to_root() {
    let grammar = simple_grammar();
    let mut config = ParserConfig::default();
    config.use_seen_rules = false;
    config.use_category_dict = false;

    let np = grammar.tags().category_at(0);
    let iv = grammar.tags().category_at(1);
    let _ = (np, iv);

    // NP strongly preferred for "John", IV ("S\NP") strongly preferred for "runs".
    let tag_scores = vec![0.0, -100.0, -100.0, 0.0];
    // dep_scores: 2 tokens x 3 columns (root, tok0, tok1).
    // John's head is runs (tok1): dep_lp(0, 2) = 0.0
    // runs' head is ROOT: dep_lp(1, 0) = 0.0
    let dep_scores = vec![
      -100.0, -100.0, 0.0, // token 0 (John): root, ->tok0, ->tok1
      0.0, -100.0, -100.0, // token 1 (runs): root, ->tok0, ->tok1
    ];
    let words = vec![Arc::<str>::from("John"), Arc::<str>::from("runs")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert_eq!(result.parses.len(), 1);
    let (tree, score) = &result.parses[0];
    assert!(!tree.is_leaf());
    assert!(score.abs() < 1e-6);
  }

  #[test]
  fn seen_rules_can_only_remove_admissible_parses() {
    let grammar = simple_grammar();
    let mut config = ParserConfig::default();
    config.use_category_dict = false;
    config.use_seen_rules = true; // seen rules table is empty -> nothing is attested

    let tag_scores = vec![0.0, -100.0, -100.0, 0.0];
    let dep_scores = vec![-100.0, -100.0, 0.0, 0.0, -100.0, -100.0];
    let words = vec![Arc::<str>::from("John"), Arc::<str>::from("runs")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert!(result.parses.is_empty());
  }

  #[test]
  fn sentence_longer_than_max_length_is_skipped() {
    let grammar = simple_grammar();
    let mut config = ParserConfig::default();
    config.max_length = 1;

    let tag_scores = vec![0.0, -100.0, -100.0, 0.0];
    let dep_scores = vec![-100.0, -100.0, 0.0, 0.0, -100.0, -100.0];
    let words = vec![Arc::<str>::from("John"), Arc::<str>::from("runs")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert!(result.parses.is_empty());
    assert_eq!(result.diagnostic, Diagnostic::LengthExceeded);
  }

  #[test]
  fn terminal_constraint_forces_leaf_category() {
    let grammar = simple_grammar();
    let mut config = ParserConfig::default();
    config.use_category_dict = false;

    let s_iv = grammar.tags().category_at(1); // S\NP, used as a stand-in "N"-like forced tag
    let tag_scores = vec![0.0, -100.0]; // NP strongly preferred by the raw scorer
    let dep_scores = vec![0.0, -100.0];
    let words = vec![Arc::<str>::from("it")];
    let constraints = [Constraint::Terminal { category: s_iv, start: 0 }];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &constraints,
    };

    // s_iv ("S\NP") is not a root category in this toy grammar, so no
    // complete parse results, but the forced category must still be the
    // only leaf candidate considered (checked indirectly: no panics, and
    // an eventual empty/exhausted result rather than one rooted at NP).
    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert!(result.parses.is_empty());
  }

  #[test]
  fn shape_mismatch_is_surfaced_as_an_error() {
    let grammar = simple_grammar();
    let config = ParserConfig::default();
    let tag_scores = vec![0.0]; // wrong: 2 tags expected per token
    let dep_scores = vec![0.0, -100.0];
    let words = vec![Arc::<str>::from("John")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let err = parse_sentence(&grammar, &config, &sentence).unwrap_err();
    assert!(matches!(err, SentenceError::Shape(ParseError::ShapeMismatch { .. })));
  }

  /// Two derivations reach the root category `S` with different head
  /// tokens, hence different root-attachment scores: a backward-application
  /// reading with the better inside score but a heavily penalized root
  /// attachment, and a forward-application reading with a worse inside
  /// score but a near-zero root attachment. The true best parse is the
  /// forward-application one once root attachment is counted. Before
  /// root-attachment was folded into agenda priority, the backward reading
  /// was popped first (and reported as "optimal" at `nbest=1`) because its
  /// larger inside score outweighed a priority that ignored the ROOT edge
  /// entirely. The two readings resolve to distinct root categories (`S`
  /// and `T`) so each occupies its own chart cell -- same-category,
  /// same-span derivations would collapse into one signature under the
  /// popped-once discipline (spec.md §4.5) and only one could ever surface.
  #[test]
  fn nbest_ordering_accounts_for_root_attachment_score() {
    let mut builder = GrammarBuilder::new(
      Language::English,
      vec![Combinator::ForwardApplication, Combinator::BackwardApplication],
    );
    let np = builder.intern("NP").unwrap();
    let s = builder.intern("S").unwrap();
    let t = builder.intern("T").unwrap();
    let iv = builder.intern(r"S\NP").unwrap(); // S\NP
    let fwd = builder.intern("T/NP").unwrap(); // T/NP
    builder.add_tag(np);
    builder.add_tag(iv);
    builder.add_tag(fwd);
    builder.add_root(s);
    builder.add_root(t);
    let grammar = builder.build();

    let mut config = ParserConfig::default();
    config.use_category_dict = false;
    config.use_seen_rules = false;
    config.use_beta = false;
    config.nbest = 2;

    // Tag columns in registration order: NP, S\NP, T/NP.
    // token0 ("a"): NP strongly preferred, T/NP plausible, S\NP impossible.
    // token1 ("b"): S\NP strongly preferred, NP plausible, T/NP impossible.
    let tag_scores = vec![
      -0.2, -100.0, -0.3, // token0: NP, S\NP, T/NP
      -0.25, -0.1, -100.0, // token1: NP, S\NP, T/NP
    ];
    // dep_scores: 2 tokens x 3 columns (ROOT, tok0, tok1).
    // Backward-application reading (NP, S\NP) -> S: head is token1 (right);
    // dependent token0 attaches to token1, and the root (token1) attaches
    // to ROOT very poorly.
    // Forward-application reading (T/NP, NP) -> T: head is token0 (left);
    // dependent token1 attaches to token0, and the root (token0) attaches
    // to ROOT almost perfectly.
    let dep_scores = vec![
      -0.05, -100.0, -0.05, // token0: ->ROOT, ->tok0, ->tok1
      -0.9, -0.05, -100.0, // token1: ->ROOT, ->tok0, ->tok1
    ];
    let words = vec![Arc::<str>::from("a"), Arc::<str>::from("b")];
    let sentence = Sentence {
      words: &words,
      tag_scores: &tag_scores,
      dep_scores: &dep_scores,
      constraints: &[],
    };

    let result = parse_sentence(&grammar, &config, &sentence).unwrap();
    assert_eq!(result.parses.len(), 2);

    // Sorted by non-increasing score (spec.md §8).
    assert!(result.parses[0].1 > result.parses[1].1);

    // The forward-application reading (root T, head = token0, near-perfect
    // ROOT attachment) must be the one reported best, even though the
    // backward-application reading (root S) has the better raw inside
    // score.
    let (best_tree, best_score) = &result.parses[0];
    assert_eq!(best_tree.category(), t);
    assert_eq!(best_tree.head_token(), 0);
    assert!((best_score - (-0.3 - 0.25 - 0.05 - 0.05)).abs() < 1e-6);

    let (worst_tree, worst_score) = &result.parses[1];
    assert_eq!(worst_tree.category(), s);
    assert_eq!(worst_tree.head_token(), 1);
    assert!((worst_score - (-0.2 - 0.1 - 0.05 - 0.9)).abs() < 1e-6);
  }
}
