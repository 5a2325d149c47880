//! The A* agenda: a max-priority queue of partial derivations ordered by
//! `inside + outside` (spec.md §4.4). `f64` has no total order, so
//! priorities compare with `total_cmp`; ties break on a monotonically
//! increasing insertion counter so popping is deterministic (spec.md §9
//! "Priority queue under ties").

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::tree::Tree;

struct AgendaItem {
  priority: f64,
  counter: u64,
  derivation: Arc<Tree>,
}

impl PartialEq for AgendaItem {
  fn eq(&self, other: &Self) -> bool {
    self.counter == other.counter
  }
}

impl Eq for AgendaItem {}

impl PartialOrd for AgendaItem {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for AgendaItem {
  fn cmp(&self, other: &Self) -> Ordering {
    // Higher priority pops first; for equal priority, the item pushed
    // first (lower counter) pops first, so a smaller counter must compare
    // as "greater" in this max-heap.
    self.priority.total_cmp(&other.priority).then_with(|| other.counter.cmp(&self.counter))
  }
}

/// No decrease-key: a superseded item is simply left in the heap and
/// discarded at pop time once the chart shows its signature already
/// locked (spec.md §4.4, §4.7 step 1).
#[derive(Default)]
pub struct Agenda {
  heap: BinaryHeap<AgendaItem>,
  next_counter: u64,
}

impl Agenda {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, derivation: Arc<Tree>, priority: f64) {
    let counter = self.next_counter;
    self.next_counter += 1;
    self.heap.push(AgendaItem { priority, counter, derivation });
  }

  pub fn pop(&mut self) -> Option<Arc<Tree>> {
    self.heap.pop().map(|item| item.derivation)
  }

  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }

  pub fn len(&self) -> usize {
    self.heap.len()
  }
}
