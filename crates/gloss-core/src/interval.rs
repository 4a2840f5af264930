//! Interval planning: the rules that keep a document's segments disjoint.
//!
//! Every function here is pure: it takes a snapshot of records and returns the
//! [`SegmentBatch`] that carries the store from the old state to the new one.
//! Validation happens before any batch is built, so a rejected call never
//! yields a partial mutation.
//!
//! Overlap policy is replace-wins-by-newest: assigning codes to a range deletes
//! every existing segment that intersects it, whatever codes those segments
//! carried. Nothing is merged or split.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  document::{Code, Document},
  segment::{Segment, SegmentBatch, dedupe_codes},
};

/// De-duplicate `codes` and check that each names a code of `project_id`.
///
/// `known` is the set of codes the caller could resolve; an id missing from it
/// is treated the same as an id from another project.
pub fn validate_codes(
  project_id: Uuid,
  codes: &[Uuid],
  known: &[Code],
) -> Result<Vec<Uuid>> {
  let codes = dedupe_codes(codes.iter().copied());
  for id in &codes {
    let valid = known
      .iter()
      .any(|c| c.code_id == *id && c.project_id == project_id);
    if !valid {
      return Err(Error::InvalidReference(*id));
    }
  }
  Ok(codes)
}

// ─── Assign ──────────────────────────────────────────────────────────────────

/// The outcome of [`plan_assign`].
#[derive(Debug, Clone)]
pub struct AssignPlan {
  /// The segment that will exist after the batch is applied.
  pub segment: Segment,
  /// Deletes every overlapping segment, then saves `segment`.
  pub batch:   SegmentBatch,
}

impl AssignPlan {
  /// Ids of the existing segments this assignment replaces.
  pub fn replaced(&self) -> &[Uuid] { &self.batch.delete }
}

/// Plan coding `[start, end)` of `document` with `codes`.
///
/// `existing` must be the document's current segments; `known` the codes of
/// its project.
pub fn plan_assign(
  document: &Document,
  existing: &[Segment],
  start: usize,
  end: usize,
  codes: &[Uuid],
  known: &[Code],
) -> Result<AssignPlan> {
  let text = document.slice(start, end)?;
  let codes = validate_codes(document.project_id, codes, known)?;
  if codes.is_empty() {
    return Err(Error::EmptyCodes);
  }

  let overlapping: Vec<Uuid> = existing
    .iter()
    .filter(|s| s.document_id == document.document_id && s.overlaps(start, end))
    .map(|s| s.segment_id)
    .collect();

  let segment = Segment {
    segment_id: Uuid::new_v4(),
    document_id: document.document_id,
    start_offset: start,
    end_offset: end,
    text: text.to_owned(),
    codes,
    created_at: Utc::now(),
  };

  Ok(AssignPlan {
    batch: SegmentBatch {
      delete: overlapping,
      save:   vec![segment.clone()],
    },
    segment,
  })
}

// ─── Set codes ───────────────────────────────────────────────────────────────

/// What happened to a segment whose code set was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentUpdate {
  /// The segment keeps its span with a new code set.
  Updated { segment: Segment },
  /// The code set was emptied, so the segment no longer exists.
  Removed { segment_id: Uuid },
}

/// Plan replacing the whole code set of `segment`.
///
/// An empty `codes` removes the segment. Otherwise every id is validated
/// against `known` before anything is planned, and a set equal to the current
/// one, in any order, plans nothing.
pub fn plan_set_codes(
  segment: &Segment,
  project_id: Uuid,
  codes: &[Uuid],
  known: &[Code],
) -> Result<(SegmentUpdate, SegmentBatch)> {
  if codes.is_empty() {
    let batch = SegmentBatch { delete: vec![segment.segment_id], save: vec![] };
    return Ok((SegmentUpdate::Removed { segment_id: segment.segment_id }, batch));
  }

  let codes = validate_codes(project_id, codes, known)?;
  if same_code_set(&segment.codes, &codes) {
    let unchanged = SegmentUpdate::Updated { segment: segment.clone() };
    return Ok((unchanged, SegmentBatch::default()));
  }
  let updated = Segment { codes, ..segment.clone() };
  let batch = SegmentBatch { delete: vec![], save: vec![updated.clone()] };
  Ok((SegmentUpdate::Updated { segment: updated }, batch))
}

/// Code sets compare without regard to order. Both sides are de-duplicated.
fn same_code_set(a: &[Uuid], b: &[Uuid]) -> bool {
  a.len() == b.len() && a.iter().all(|id| b.contains(id))
}

// ─── Clear ───────────────────────────────────────────────────────────────────

/// Plan deleting every segment in `existing`. Empty input yields an empty
/// batch.
pub fn plan_clear(existing: &[Segment]) -> SegmentBatch {
  SegmentBatch {
    delete: existing.iter().map(|s| s.segment_id).collect(),
    save:   vec![],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Fixture {
    document: Document,
    codes:    Vec<Code>,
  }

  fn fixture() -> Fixture {
    let project_id = Uuid::new_v4();
    let document = Document {
      document_id: Uuid::new_v4(),
      project_id,
      name: "interview".into(),
      text: "The quick brown fox jumps over the lazy dog".into(),
      created_at: Utc::now(),
    };
    let codes = ["animal", "speed", "colour"]
      .into_iter()
      .map(|name| Code {
        code_id: Uuid::new_v4(),
        project_id,
        name: name.into(),
        description: None,
        color: None,
        flags: vec![],
      })
      .collect();
    Fixture { document, codes }
  }

  fn is_disjoint(segments: &[Segment]) -> bool {
    let mut sorted: Vec<&Segment> = segments.iter().collect();
    sorted.sort_by_key(|s| s.start_offset);
    sorted
      .windows(2)
      .all(|pair| pair[0].end_offset <= pair[1].start_offset)
  }

  /// Apply a batch to an in-memory segment list the way a store would.
  fn apply(segments: &mut Vec<Segment>, batch: SegmentBatch) {
    segments.retain(|s| !batch.delete.contains(&s.segment_id));
    for saved in batch.save {
      segments.retain(|s| s.segment_id != saved.segment_id);
      segments.push(saved);
    }
  }

  #[test]
  fn assign_slices_text_and_dedupes_codes() {
    let f = fixture();
    let a = f.codes[0].code_id;
    let plan = plan_assign(&f.document, &[], 16, 19, &[a, a], &f.codes).unwrap();

    assert_eq!(plan.segment.text, "fox");
    assert_eq!(plan.segment.codes, [a]);
    assert!(plan.segment.end_offset > plan.segment.start_offset);
    assert!(plan.replaced().is_empty());
    assert_eq!(plan.batch.save.len(), 1);
  }

  #[test]
  fn disjoint_assignments_coexist() {
    let f = fixture();
    let a = f.codes[0].code_id;
    let mut segments = vec![];

    let first = plan_assign(&f.document, &segments, 0, 3, &[a], &f.codes).unwrap();
    apply(&mut segments, first.batch);
    let second = plan_assign(&f.document, &segments, 3, 9, &[a], &f.codes).unwrap();
    assert!(second.replaced().is_empty(), "touching spans must not be replaced");
    apply(&mut segments, second.batch);

    assert_eq!(segments.len(), 2);
    assert!(is_disjoint(&segments));
  }

  #[test]
  fn overlapping_assignment_replaces_all_intersecting_segments() {
    let f = fixture();
    let (a, b) = (f.codes[0].code_id, f.codes[1].code_id);
    let mut segments = vec![];

    for (start, end) in [(0, 3), (4, 9), (10, 15), (35, 39)] {
      let plan = plan_assign(&f.document, &segments, start, end, &[a], &f.codes).unwrap();
      apply(&mut segments, plan.batch);
    }

    let plan = plan_assign(&f.document, &segments, 2, 12, &[b], &f.codes).unwrap();
    assert_eq!(plan.replaced().len(), 3);
    apply(&mut segments, plan.batch);

    assert_eq!(segments.len(), 2);
    assert!(is_disjoint(&segments));
    let new = segments.iter().find(|s| s.start_offset == 2).unwrap();
    assert_eq!((new.end_offset, new.codes.as_slice()), (12, [b].as_slice()));
  }

  #[test]
  fn assign_rejects_bad_range_without_planning() {
    let f = fixture();
    let a = f.codes[0].code_id;
    let len = f.document.len();
    for (start, end) in [(5, 5), (6, 5), (0, len + 1)] {
      let r = plan_assign(&f.document, &[], start, end, &[a], &f.codes);
      assert!(matches!(r, Err(Error::InvalidRange { .. })), "{start}..{end}");
    }
  }

  #[test]
  fn assign_rejects_foreign_and_unknown_codes() {
    let f = fixture();
    let mut foreign = f.codes[0].clone();
    foreign.code_id = Uuid::new_v4();
    foreign.project_id = Uuid::new_v4();
    let mut known = f.codes.clone();
    known.push(foreign.clone());

    let r = plan_assign(&f.document, &[], 0, 3, &[foreign.code_id], &known);
    assert!(matches!(r, Err(Error::InvalidReference(id)) if id == foreign.code_id));

    let missing = Uuid::new_v4();
    let r = plan_assign(&f.document, &[], 0, 3, &[missing], &f.codes);
    assert!(matches!(r, Err(Error::InvalidReference(id)) if id == missing));
  }

  #[test]
  fn assign_requires_a_code() {
    let f = fixture();
    let r = plan_assign(&f.document, &[], 0, 3, &[], &f.codes);
    assert!(matches!(r, Err(Error::EmptyCodes)));
  }

  #[test]
  fn set_codes_empty_removes_segment() {
    let f = fixture();
    let plan = plan_assign(&f.document, &[], 0, 3, &[f.codes[0].code_id], &f.codes).unwrap();

    let (update, batch) =
      plan_set_codes(&plan.segment, f.document.project_id, &[], &f.codes).unwrap();
    assert_eq!(update, SegmentUpdate::Removed { segment_id: plan.segment.segment_id });
    assert_eq!(batch.delete, [plan.segment.segment_id]);
    assert!(batch.save.is_empty());
  }

  #[test]
  fn set_codes_replaces_set_and_keeps_span() {
    let f = fixture();
    let (a, b, c) = (f.codes[0].code_id, f.codes[1].code_id, f.codes[2].code_id);
    let plan = plan_assign(&f.document, &[], 4, 9, &[a], &f.codes).unwrap();

    let (update, batch) =
      plan_set_codes(&plan.segment, f.document.project_id, &[c, b, c], &f.codes).unwrap();
    let SegmentUpdate::Updated { segment } = update else {
      panic!("expected Updated")
    };
    assert_eq!(segment.codes, [c, b]);
    assert_eq!((segment.start_offset, segment.end_offset), (4, 9));
    assert_eq!(segment.segment_id, plan.segment.segment_id);
    assert!(batch.delete.is_empty());
  }

  #[test]
  fn set_codes_to_the_same_list_plans_nothing() {
    let f = fixture();
    let (a, b) = (f.codes[0].code_id, f.codes[1].code_id);
    let plan = plan_assign(&f.document, &[], 4, 9, &[a, b], &f.codes).unwrap();

    let (update, batch) =
      plan_set_codes(&plan.segment, f.document.project_id, &[a, b, a], &f.codes).unwrap();
    assert!(batch.is_empty());
    assert_eq!(update, SegmentUpdate::Updated { segment: plan.segment });
  }

  #[test]
  fn set_codes_compares_sets_not_order() {
    let f = fixture();
    let (a, b) = (f.codes[0].code_id, f.codes[1].code_id);
    let plan = plan_assign(&f.document, &[], 4, 9, &[a, b], &f.codes).unwrap();

    let (update, batch) =
      plan_set_codes(&plan.segment, f.document.project_id, &[b, a], &f.codes).unwrap();
    assert!(batch.is_empty());
    let SegmentUpdate::Updated { segment } = update else {
      panic!("segment should survive");
    };
    assert_eq!(segment.codes, [a, b]);

    let (_, batch) =
      plan_set_codes(&plan.segment, f.document.project_id, &[b], &f.codes).unwrap();
    assert_eq!(batch.save.len(), 1);
    assert_eq!(batch.save[0].codes, [b]);
  }

  #[test]
  fn set_codes_validates_before_planning() {
    let f = fixture();
    let plan = plan_assign(&f.document, &[], 4, 9, &[f.codes[0].code_id], &f.codes).unwrap();
    let bogus = Uuid::new_v4();
    let r = plan_set_codes(
      &plan.segment,
      f.document.project_id,
      &[f.codes[1].code_id, bogus],
      &f.codes,
    );
    assert!(matches!(r, Err(Error::InvalidReference(id)) if id == bogus));
  }

  #[test]
  fn clear_of_nothing_is_empty() {
    assert!(plan_clear(&[]).is_empty());
  }
}
