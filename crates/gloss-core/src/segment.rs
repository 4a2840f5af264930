//! Segments: coded, non-overlapping spans of a document.
//!
//! A segment exists only while it carries at least one code. Removing the last
//! code deletes the segment, and the span reverts to plain text.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A half-open span `[start_offset, end_offset)` of a document's text together
/// with the codes applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
  pub segment_id:   Uuid,
  pub document_id:  Uuid,
  pub start_offset: usize,
  pub end_offset:   usize,
  /// Cached copy of `document.text[start_offset..end_offset]`.
  pub text:         String,
  /// Applied code ids: de-duplicated, in first-applied order.
  pub codes:        Vec<Uuid>,
  pub created_at:   DateTime<Utc>,
}

impl Segment {
  /// Whether this segment's span intersects `[start, end)`. Spans that only
  /// touch at an endpoint do not intersect.
  pub fn overlaps(&self, start: usize, end: usize) -> bool {
    !(self.end_offset <= start || self.start_offset >= end)
  }
}

/// De-duplicate `codes`, keeping the first occurrence of each id.
pub fn dedupe_codes(codes: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
  let mut seen = HashSet::new();
  codes.into_iter().filter(|id| seen.insert(*id)).collect()
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// A set of segment mutations the store must apply atomically.
///
/// Deletions are applied before saves. Saving a segment whose id already
/// exists replaces it, including its whole code set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentBatch {
  pub delete: Vec<Uuid>,
  pub save:   Vec<Segment>,
}

impl SegmentBatch {
  pub fn is_empty(&self) -> bool { self.delete.is_empty() && self.save.is_empty() }
}
