//! The `RecordStore` trait: the record storage the annotation engine runs
//! against.
//!
//! The trait is implemented by storage backends (e.g. `gloss-store-sqlite`).
//! Higher layers (`gloss-annotate`, `gloss-cli`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  document::{Code, CodeUpdate, Document, NewCode, NewDocument},
  project::{NewProject, Project},
  segment::{Segment, SegmentBatch},
  settings::Settings,
};

/// Counts reported by [`RecordStore::delete_code`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeRemoval {
  /// Segments that kept at least one other code.
  pub updated: usize,
  /// Segments deleted because the code was their last one.
  pub removed: usize,
}

/// Abstraction over a Gloss record store backend.
///
/// The store does no engine-level validation: offsets, overlap and code
/// membership are checked by the caller before a [`SegmentBatch`] reaches
/// [`RecordStore::apply_segments`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Projects ──────────────────────────────────────────────────────────

  fn add_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Retrieve a project by UUID. Returns `None` if not found.
  fn get_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// All projects in creation order.
  fn list_projects(
    &self,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn add_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve a document by UUID. Returns `None` if not found.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// List a project's documents in creation order.
  fn list_documents(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Delete a document together with all of its segments. Returns `false` if
  /// the document did not exist.
  fn delete_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Codes ─────────────────────────────────────────────────────────────

  fn add_code(
    &self,
    input: NewCode,
  ) -> impl Future<Output = Result<Code, Self::Error>> + Send + '_;

  /// Retrieve a code by UUID. Returns `None` if not found.
  fn get_code(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Code>, Self::Error>> + Send + '_;

  /// List a project's codes in creation order. The order is stable: it
  /// defines codebook positions offered to the suggestion provider.
  fn list_codes(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Code>, Self::Error>> + Send + '_;

  /// Update a code of `project_id`. Returns `None` if no such code exists in
  /// that project.
  fn update_code(
    &self,
    project_id: Uuid,
    code_id: Uuid,
    update: CodeUpdate,
  ) -> impl Future<Output = Result<Option<Code>, Self::Error>> + Send + '_;

  /// Delete a code in one atomic step: strip it from every segment, delete
  /// the segments left without codes, then delete the code record. Returns
  /// `None` if the code did not exist.
  fn delete_code(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CodeRemoval>, Self::Error>> + Send + '_;

  // ── Segments ──────────────────────────────────────────────────────────

  /// Retrieve a segment, with its codes, by UUID.
  fn get_segment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Segment>, Self::Error>> + Send + '_;

  /// All segments of a document, with their codes.
  fn list_segments(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Segment>, Self::Error>> + Send + '_;

  /// All segments, across documents, that carry `code_id`.
  fn list_segments_with_code(
    &self,
    code_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Segment>, Self::Error>> + Send + '_;

  /// Apply `batch` atomically: either every deletion and save lands, or none
  /// does.
  fn apply_segments(
    &self,
    batch: SegmentBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  /// The settings record, or [`Settings::default`] if none was saved.
  fn get_settings(
    &self,
  ) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  fn put_settings(
    &self,
    settings: Settings,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
