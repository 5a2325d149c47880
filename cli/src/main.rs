//! Thin demonstration binary: builds a small toy English grammar and a
//! synthetic pair of score matrices for "John runs", then prints the
//! N-best derivations. Model loading, tokenization and real supertagger/
//! dependency-scorer output are out of scope for the core crate
//! (spec.md §1) and are not implemented here either -- this binary exists
//! to exercise the library end to end, not to be a production CLI.

use std::env;
use std::process;
use std::sync::Arc;

use ccg_astar::grammar::{GrammarBuilder, Language};
use ccg_astar::rules::Combinator;
use ccg_astar::search::{parse_sentence, Sentence};
use ccg_astar::ParserConfig;

fn usage(prog_name: &str) -> String {
  format!(
    r"
Usage: {} [options]

Parses the fixed demo sentence \"John runs\" against a toy grammar and
prints the N-best derivations.

Options:
  -h, --help       Print this message
  -n, --nbest N    Number of derivations to print (default 1)",
    prog_name
  )
}

fn build_demo_grammar() -> ccg_astar::Grammar {
  let mut builder = GrammarBuilder::new(
    Language::English,
    vec![
      Combinator::ForwardApplication,
      Combinator::BackwardApplication,
      Combinator::ForwardComposition,
      Combinator::BackwardComposition,
    ],
  );

  let np = builder.intern("NP").unwrap();
  let s_dcl = builder.intern("S[dcl]").unwrap();
  let iv = builder.intern(r"S[dcl]\NP").unwrap();

  builder.add_tag(np);
  builder.add_tag(iv);
  builder.add_root(s_dcl);
  builder.add_seen_rule(np, iv);

  builder.build()
}

fn main() {
  tracing_subscriber::fmt::init();

  let opts: Vec<String> = env::args().collect();
  let prog_name = opts[0].clone();

  let mut nbest = 1usize;
  let mut iter = opts.into_iter().skip(1);
  while let Some(opt) = iter.next() {
    match opt.as_str() {
      "-h" | "--help" => {
        println!("{}", usage(&prog_name));
        process::exit(0);
      }
      "-n" | "--nbest" => {
        nbest = iter.next().and_then(|v| v.parse().ok()).unwrap_or(1);
      }
      other => {
        eprintln!("unrecognized option: {other}");
        println!("{}", usage(&prog_name));
        process::exit(1);
      }
    }
  }

  let grammar = build_demo_grammar();
  let mut config = ParserConfig::default();
  config.nbest = nbest;
  config.use_category_dict = false;

  let words: Vec<Arc<str>> = vec![Arc::from("John"), Arc::from("runs")];
  // NP strongly preferred for "John", S[dcl]\NP strongly preferred for "runs".
  let tag_scores = vec![0.0, -100.0, -100.0, 0.0];
  // 2 tokens x 3 columns (ROOT, tok0, tok1): John's head is "runs", runs' head is ROOT.
  let dep_scores = vec![-100.0, -100.0, 0.0, 0.0, -100.0, -100.0];

  let sentence = Sentence {
    words: &words,
    tag_scores: &tag_scores,
    dep_scores: &dep_scores,
    constraints: &[],
  };

  match parse_sentence(&grammar, &config, &sentence) {
    Ok(result) => {
      println!("found {} parse(s) ({:?})", result.parses.len(), result.diagnostic);
      for (rank, (tree, score)) in result.parses.iter().enumerate() {
        println!("#{}: score={:.4}  {}", rank + 1, score, tree.display(grammar.interner()));
      }
    }
    Err(err) => {
      eprintln!("parse error: {err}");
      process::exit(1);
    }
  }
}
