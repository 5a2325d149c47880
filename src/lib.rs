//! A* chart parser for Combinatory Categorial Grammar (spec.md §1).
//!
//! Given a tokenized sentence and, for each token, a supertag score
//! matrix and a head-dependency score matrix, [`search::parse_sentence`]
//! returns up to `nbest` highest-scoring CCG derivation trees. The
//! grammar (rule tables, category dictionary, admissible roots) is built
//! once by [`grammar::GrammarBuilder`] and shared read-only across a
//! `rayon` worker pool via [`batch::parse_batch`] (spec.md §5).
//!
//! The trained supertagger and dependency scorer that produce the two
//! score matrices, tokenization, model-file loading and tree
//! pretty-printing beyond [`tree::Tree`]'s `Display` impl are external to
//! this crate (spec.md §1).

#[macro_use]
extern crate lazy_static;

pub mod agenda;
pub mod batch;
pub mod category;
pub mod chart;
pub mod constraint;
pub mod dependency;
pub mod error;
pub mod grammar;
pub mod heuristic;
pub mod pruner;
pub mod rules;
pub mod score;
pub mod search;
pub mod tree;

pub use batch::parse_batch;
pub use category::{CategoryId, CategoryInterner};
pub use error::{Diagnostic, ParseError};
pub use grammar::{Grammar, GrammarBuilder, Language, ParserConfig};
pub use search::{parse_sentence, ParseResult, Sentence, SentenceError};
pub use tree::Tree;
