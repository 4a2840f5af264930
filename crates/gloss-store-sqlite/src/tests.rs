//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use gloss_core::{
  document::{Code, CodeUpdate, Document, NewCode, NewDocument},
  project::{NewProject, Project},
  segment::{Segment, SegmentBatch},
  settings::{Settings, SuggestionLimit},
  store::{CodeRemoval, RecordStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn project(s: &SqliteStore) -> Project {
  s.add_project(NewProject {
    name:        "Interviews".into(),
    description: Some("Wave 1".into()),
  })
  .await
  .unwrap()
}

async fn document(s: &SqliteStore, project_id: Uuid, text: &str) -> Document {
  s.add_document(NewDocument {
    project_id,
    name: "transcript".into(),
    text: text.into(),
  })
  .await
  .unwrap()
}

async fn code(s: &SqliteStore, project_id: Uuid, name: &str) -> Code {
  s.add_code(NewCode::new(project_id, name)).await.unwrap()
}

fn segment(document: &Document, start: usize, end: usize, codes: Vec<Uuid>) -> Segment {
  Segment {
    segment_id: Uuid::new_v4(),
    document_id: document.document_id,
    start_offset: start,
    end_offset: end,
    text: document.slice(start, end).unwrap().to_owned(),
    codes,
    created_at: Utc::now(),
  }
}

// ─── Projects & documents ────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_project() {
  let s = store().await;
  let p = project(&s).await;

  let fetched = s.get_project(p.project_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Interviews");
  assert_eq!(fetched.description.as_deref(), Some("Wave 1"));
}

#[tokio::test]
async fn projects_list_in_creation_order() {
  let s = store().await;
  assert!(s.list_projects().await.unwrap().is_empty());

  let a = project(&s).await;
  let b = s
    .add_project(NewProject {
      name:        "  Focus groups ".into(),
      description: Some("  ".into()),
    })
    .await
    .unwrap();

  let projects = s.list_projects().await.unwrap();
  let ids: Vec<_> = projects.iter().map(|p| p.project_id).collect();
  assert_eq!(ids, [a.project_id, b.project_id]);
  assert_eq!(projects[1].name, "Focus groups");
  assert_eq!(projects[1].description, None);
}

#[tokio::test]
async fn blank_project_name_is_rejected() {
  let s = store().await;
  let r = s
    .add_project(NewProject { name: "   ".into(), description: None })
    .await;
  assert!(matches!(r, Err(crate::Error::Core(gloss_core::Error::EmptyName))));
  assert!(s.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_document_missing_returns_none() {
  let s = store().await;
  assert!(s.get_document(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn documents_list_in_creation_order() {
  let s = store().await;
  let p = project(&s).await;
  let a = document(&s, p.project_id, "first").await;
  let b = document(&s, p.project_id, "second").await;

  let docs = s.list_documents(p.project_id).await.unwrap();
  let ids: Vec<_> = docs.iter().map(|d| d.document_id).collect();
  assert_eq!(ids, [a.document_id, b.document_id]);
  assert_eq!(docs[1].text, "second");
}

#[tokio::test]
async fn blank_document_name_is_rejected() {
  let s = store().await;
  let p = project(&s).await;
  let r = s
    .add_document(NewDocument {
      project_id: p.project_id,
      name:       "  ".into(),
      text:       "x".into(),
    })
    .await;
  assert!(matches!(r, Err(crate::Error::Core(gloss_core::Error::EmptyName))));
}

// ─── Codes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn code_flags_roundtrip_and_order_is_stable() {
  let s = store().await;
  let p = project(&s).await;

  let mut input = NewCode::new(p.project_id, "Trust");
  input.flags = vec!["affect".into(), " ".into(), "relational".into()];
  input.description = Some("Expressions of trust".into());
  let trust = s.add_code(input).await.unwrap();
  let doubt = code(&s, p.project_id, "Doubt").await;

  let codes = s.list_codes(p.project_id).await.unwrap();
  assert_eq!(codes.len(), 2);
  assert_eq!(codes[0].code_id, trust.code_id);
  assert_eq!(codes[0].flags, ["affect", "relational"]);
  assert_eq!(codes[1].code_id, doubt.code_id);

  let fetched = s.get_code(trust.code_id).await.unwrap().unwrap();
  assert_eq!(fetched, trust);
}

#[tokio::test]
async fn update_code_renormalizes_and_keeps_position() {
  let s = store().await;
  let p = project(&s).await;
  let mut input = NewCode::new(p.project_id, "Trust");
  input.description = Some("Expressions of trust".into());
  input.flags = vec!["affect".into()];
  let trust = s.add_code(input).await.unwrap();
  let doubt = code(&s, p.project_id, "Doubt").await;

  let updated = s
    .update_code(p.project_id, trust.code_id, CodeUpdate {
      name:        Some(" Reliance ".into()),
      description: Some("".into()),
      color:       Some(" #22c55e ".into()),
      flags:       Some(vec![" relational ".into(), " ".into()]),
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Reliance");
  assert_eq!(updated.description, None);
  assert_eq!(updated.color.as_deref(), Some("#22c55e"));
  assert_eq!(updated.flags, ["relational"]);

  let codes = s.list_codes(p.project_id).await.unwrap();
  assert_eq!(codes, [updated, doubt]);
}

#[tokio::test]
async fn update_code_is_scoped_to_its_project() {
  let s = store().await;
  let p = project(&s).await;
  let other = project(&s).await;
  let trust = code(&s, p.project_id, "Trust").await;
  let rename = || CodeUpdate { name: Some("Hijacked".into()), ..CodeUpdate::default() };

  assert!(s.update_code(other.project_id, trust.code_id, rename()).await.unwrap().is_none());
  assert!(s.update_code(p.project_id, Uuid::new_v4(), rename()).await.unwrap().is_none());
  assert_eq!(s.get_code(trust.code_id).await.unwrap().unwrap().name, "Trust");
}

// ─── Segments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_saves_segments_with_ordered_codes() {
  let s = store().await;
  let p = project(&s).await;
  let d = document(&s, p.project_id, "It was the best of times").await;
  let a = code(&s, p.project_id, "a").await.code_id;
  let b = code(&s, p.project_id, "b").await.code_id;

  let seg = segment(&d, 11, 15, vec![b, a]);
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![seg.clone()] })
    .await
    .unwrap();

  let fetched = s.get_segment(seg.segment_id).await.unwrap().unwrap();
  assert_eq!(fetched.text, "best");
  assert_eq!(fetched.codes, [b, a]);
  assert_eq!((fetched.start_offset, fetched.end_offset), (11, 15));
}

#[tokio::test]
async fn apply_replaces_code_set_of_existing_segment() {
  let s = store().await;
  let p = project(&s).await;
  let d = document(&s, p.project_id, "abcdef").await;
  let a = code(&s, p.project_id, "a").await.code_id;
  let b = code(&s, p.project_id, "b").await.code_id;

  let mut seg = segment(&d, 0, 3, vec![a]);
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![seg.clone()] })
    .await
    .unwrap();
  seg.codes = vec![b];
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![seg.clone()] })
    .await
    .unwrap();

  let segments = s.list_segments(d.document_id).await.unwrap();
  assert_eq!(segments.len(), 1);
  assert_eq!(segments[0].codes, [b]);
}

#[tokio::test]
async fn apply_deletes_before_saving() {
  let s = store().await;
  let p = project(&s).await;
  let d = document(&s, p.project_id, "abcdefghij").await;
  let a = code(&s, p.project_id, "a").await.code_id;

  let old = segment(&d, 0, 4, vec![a]);
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![old.clone()] })
    .await
    .unwrap();

  let new = segment(&d, 2, 8, vec![a]);
  s.apply_segments(SegmentBatch {
    delete: vec![old.segment_id],
    save:   vec![new.clone()],
  })
  .await
  .unwrap();

  let segments = s.list_segments(d.document_id).await.unwrap();
  assert_eq!(segments.len(), 1);
  assert_eq!(segments[0].segment_id, new.segment_id);
  assert!(s.get_segment(old.segment_id).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_batch_leaves_store_unchanged() {
  let s = store().await;
  let p = project(&s).await;
  let d = document(&s, p.project_id, "abcdefghij").await;
  let a = code(&s, p.project_id, "a").await.code_id;

  let kept = segment(&d, 0, 4, vec![a]);
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![kept.clone()] })
    .await
    .unwrap();

  // The unknown code id violates the coded_segments foreign key, so the
  // deletion in the same batch must roll back too.
  let broken = segment(&d, 5, 8, vec![Uuid::new_v4()]);
  let r = s
    .apply_segments(SegmentBatch {
      delete: vec![kept.segment_id],
      save:   vec![broken],
    })
    .await;
  assert!(r.is_err());

  let segments = s.list_segments(d.document_id).await.unwrap();
  assert_eq!(segments.len(), 1);
  assert_eq!(segments[0].segment_id, kept.segment_id);
}

#[tokio::test]
async fn segments_with_code_span_documents() {
  let s = store().await;
  let p = project(&s).await;
  let d1 = document(&s, p.project_id, "first document").await;
  let d2 = document(&s, p.project_id, "second document").await;
  let a = code(&s, p.project_id, "a").await.code_id;
  let b = code(&s, p.project_id, "b").await.code_id;

  s.apply_segments(SegmentBatch {
    delete: vec![],
    save:   vec![
      segment(&d1, 0, 5, vec![a]),
      segment(&d1, 6, 14, vec![b]),
      segment(&d2, 0, 6, vec![b, a]),
    ],
  })
  .await
  .unwrap();

  let with_a = s.list_segments_with_code(a).await.unwrap();
  assert_eq!(with_a.len(), 2);
  assert!(with_a.iter().all(|seg| seg.codes.contains(&a)));
}

#[tokio::test]
async fn delete_document_cascades_to_segments() {
  let s = store().await;
  let p = project(&s).await;
  let d = document(&s, p.project_id, "some text").await;
  let a = code(&s, p.project_id, "a").await.code_id;
  let seg = segment(&d, 0, 4, vec![a]);
  s.apply_segments(SegmentBatch { delete: vec![], save: vec![seg.clone()] })
    .await
    .unwrap();

  assert!(s.delete_document(d.document_id).await.unwrap());
  assert!(s.get_document(d.document_id).await.unwrap().is_none());
  assert!(s.get_segment(seg.segment_id).await.unwrap().is_none());
  assert!(s.list_segments_with_code(a).await.unwrap().is_empty());

  assert!(!s.delete_document(d.document_id).await.unwrap());
}

#[tokio::test]
async fn delete_code_strips_segments_in_one_step() {
  let s = store().await;
  let p = project(&s).await;
  let d1 = document(&s, p.project_id, "first document").await;
  let d2 = document(&s, p.project_id, "second document").await;
  let a = code(&s, p.project_id, "a").await.code_id;
  let b = code(&s, p.project_id, "b").await.code_id;

  let only_a = segment(&d1, 0, 5, vec![a]);
  let shared = segment(&d2, 0, 6, vec![b, a]);
  let only_b = segment(&d2, 7, 15, vec![b]);
  s.apply_segments(SegmentBatch {
    delete: vec![],
    save:   vec![only_a.clone(), shared.clone(), only_b.clone()],
  })
  .await
  .unwrap();

  let removal = s.delete_code(a).await.unwrap();
  assert_eq!(removal, Some(CodeRemoval { updated: 1, removed: 1 }));

  assert!(s.get_code(a).await.unwrap().is_none());
  assert!(s.get_segment(only_a.segment_id).await.unwrap().is_none());
  assert_eq!(s.get_segment(shared.segment_id).await.unwrap().unwrap().codes, [b]);
  assert_eq!(s.get_segment(only_b.segment_id).await.unwrap().unwrap().codes, [b]);
  assert!(s.list_segments_with_code(a).await.unwrap().is_empty());

  assert_eq!(s.delete_code(a).await.unwrap(), None);
}

#[tokio::test]
async fn delete_unused_code_removes_only_the_record() {
  let s = store().await;
  let p = project(&s).await;
  let a = code(&s, p.project_id, "a").await.code_id;

  assert_eq!(s.delete_code(a).await.unwrap(), Some(CodeRemoval::default()));
  assert!(s.list_codes(p.project_id).await.unwrap().is_empty());
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_default_then_roundtrip() {
  let s = store().await;
  assert_eq!(s.get_settings().await.unwrap(), Settings::default());

  let settings = Settings {
    ai_enabled:       true,
    suggestion_limit: SuggestionLimit::new(4).unwrap(),
  };
  s.put_settings(settings).await.unwrap();
  assert_eq!(s.get_settings().await.unwrap(), settings);
}
