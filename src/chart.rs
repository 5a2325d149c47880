//! The chart: an indexed store of derivations keyed by `(start, length,
//! category)` implementing A*'s popped-once, reuse-always discipline
//! (spec.md §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use crate::category::CategoryId;
use crate::tree::Tree;

type CellKey = (usize, usize, CategoryId);

struct Cell {
  /// Kept sorted by inside score, descending, so capacity trimming and the
  /// "strictly better" rejection test are both a prefix check.
  derivations: Vec<Arc<Tree>>,
  locked: bool,
}

impl Cell {
  fn new() -> Self {
    Self {
      derivations: Vec::new(),
      locked: false,
    }
  }
}

/// Per-sentence chart. Not shared across sentences, not thread-safe --
/// each worker owns one (spec.md §5).
pub struct Chart {
  cells: HashMap<CellKey, Cell>,
  finalized_by_start: HashMap<usize, Vec<Arc<Tree>>>,
  finalized_by_end: HashMap<usize, Vec<Arc<Tree>>>,
  pruning_size: usize,
}

impl Chart {
  pub fn new(pruning_size: usize) -> Self {
    Self {
      cells: HashMap::new(),
      finalized_by_start: HashMap::new(),
      finalized_by_end: HashMap::new(),
      pruning_size,
    }
  }

  fn key(derivation: &Tree) -> CellKey {
    let span = derivation.span();
    (span.start, span.length, derivation.category())
  }

  /// `true` if this `(start, length, category)` signature has already been
  /// popped and locked -- the item should be discarded, not re-explored.
  pub fn is_locked(&self, derivation: &Tree) -> bool {
    self.cells.get(&Self::key(derivation)).is_some_and(|c| c.locked)
  }

  /// Records a candidate derivation in its cell. Rejects it outright if
  /// the cell already holds `pruning_size` entries that all strictly
  /// outscore it (spec.md §4.5 `insert`).
  pub fn insert(&mut self, derivation: Arc<Tree>) -> bool {
    let key = Self::key(&derivation);
    let cell = self.cells.entry(key).or_insert_with(Cell::new);
    let inside = derivation.inside();

    if cell.derivations.len() >= self.pruning_size {
      let worst_kept = cell.derivations[self.pruning_size - 1].inside();
      if inside < worst_kept {
        return false;
      }
    }

    let pos = cell.derivations.partition_point(|d| d.inside() >= inside);
    cell.derivations.insert(pos, derivation);
    cell.derivations.truncate(self.pruning_size.max(1));
    true
  }

  /// Marks this derivation's signature as locked (first pop wins) and
  /// registers it for adjacency lookups (spec.md §4.5 `finalize`).
  pub fn finalize(&mut self, derivation: Arc<Tree>) {
    let key = Self::key(&derivation);
    self.cells.entry(key).or_insert_with(Cell::new).locked = true;
    let span = derivation.span();
    self.finalized_by_start.entry(span.start).or_default().push(derivation.clone());
    self.finalized_by_end.entry(span.end()).or_default().push(derivation);
  }

  /// All finalized derivations whose span is immediately adjacent to
  /// `derivation`'s span, on either side (spec.md §4.5 `neighbors`).
  pub fn neighbors(&self, derivation: &Tree) -> Vec<Arc<Tree>> {
    let span = derivation.span();
    let mut out = Vec::new();
    if let Some(left) = self.finalized_by_end.get(&span.start) {
      out.extend(left.iter().cloned());
    }
    if let Some(right) = self.finalized_by_start.get(&span.end()) {
      out.extend(right.iter().cloned());
    }
    out
  }

  /// Finalized derivations spanning the whole sentence whose category is
  /// an admissible root (spec.md §4.5 `complete_parses`).
  pub fn complete_parses(&self, sent_len: usize, roots: &[CategoryId]) -> Vec<Arc<Tree>> {
    roots
      .iter()
      .filter_map(|&root| self.cells.get(&(0, sent_len, root)))
      .filter(|cell| cell.locked)
      .flat_map(|cell| cell.derivations.iter().cloned())
      .collect()
  }
}
