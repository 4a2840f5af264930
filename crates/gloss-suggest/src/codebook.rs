//! The positionally indexed codebook offered to the provider.
//!
//! The provider only ever sees 1-based positions, never code ids, so a
//! hallucinated id can never be accepted: a position either resolves to a code
//! of this codebook or the suggestion is dropped.

use gloss_core::document::Code;

#[derive(Debug, Clone, Default)]
pub struct IndexedCodebook {
  codes: Vec<Code>,
}

impl IndexedCodebook {
  /// Index `codes` in iteration order, starting at 1.
  pub fn new(codes: impl IntoIterator<Item = Code>) -> Self {
    Self { codes: codes.into_iter().collect() }
  }

  /// The code at 1-based `index`. Index 0 and indices past the end resolve to
  /// nothing.
  pub fn resolve(&self, index: usize) -> Option<&Code> {
    index.checked_sub(1).and_then(|i| self.codes.get(i))
  }

  /// `(index, code)` pairs, indices starting at 1.
  pub fn iter(&self) -> impl Iterator<Item = (usize, &Code)> + '_ {
    self.codes.iter().enumerate().map(|(i, c)| (i + 1, c))
  }

  pub fn len(&self) -> usize { self.codes.len() }

  pub fn is_empty(&self) -> bool { self.codes.is_empty() }
}
