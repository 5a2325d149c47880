//! Per-sentence parallel dispatch (spec.md §5): sentences are embarrassingly
//! parallel, so a worker pool parses each one independently while the
//! output stays aligned to input order regardless of completion order.
//! Grounded on `ner-core`'s `par_iter`/`collect` batch-scoring shape.

use rayon::prelude::*;

use crate::grammar::{Grammar, ParserConfig};
use crate::search::{parse_sentence, ParseResult, Sentence, SentenceError};

/// Parses every sentence in `sentences` against the shared, read-only
/// `grammar` and `config`. `rayon`'s `collect` over an indexed parallel
/// iterator preserves the input order in the output `Vec` regardless of
/// which worker finished first (spec.md §5 "Ordering guarantees").
pub fn parse_batch<'a>(grammar: &Grammar, config: &ParserConfig, sentences: &[Sentence<'a>]) -> Vec<Result<ParseResult, SentenceError>> {
  sentences.par_iter().map(|sentence| parse_sentence(grammar, config, sentence)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::{GrammarBuilder, Language};
  use crate::rules::Combinator;
  use std::sync::Arc;

  fn one_tag_grammar() -> Grammar {
    let mut builder = GrammarBuilder::new(Language::English, vec![Combinator::ForwardApplication, Combinator::BackwardApplication]);
    let np = builder.intern("NP").unwrap();
    builder.add_tag(np);
    builder.add_root(np);
    builder.build()
  }

  #[test]
  fn batch_output_is_aligned_to_input_order() {
    let grammar = one_tag_grammar();
    let config = ParserConfig::default();

    let words_a = vec![Arc::<str>::from("a")];
    let words_b = vec![Arc::<str>::from("b")];
    let words_c = vec![Arc::<str>::from("c")];
    let tag_scores = vec![0.0];
    let dep_scores = vec![0.0, -100.0];

    let sentences = vec![
      Sentence { words: &words_a, tag_scores: &tag_scores, dep_scores: &dep_scores, constraints: &[] },
      Sentence { words: &words_b, tag_scores: &tag_scores, dep_scores: &dep_scores, constraints: &[] },
      Sentence { words: &words_c, tag_scores: &tag_scores, dep_scores: &dep_scores, constraints: &[] },
    ];

    let results = parse_batch(&grammar, &config, &sentences);
    assert_eq!(results.len(), 3);
    for (idx, result) in results.iter().enumerate() {
      let parse_result = result.as_ref().unwrap();
      assert_eq!(parse_result.parses.len(), 1, "sentence {idx} should parse to exactly one leaf");
    }
  }
}
