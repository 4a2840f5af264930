//! [`AnnotationService`]: the operations callers run against a document.
//!
//! Each operation fetches the records it needs from the injected
//! [`RecordStore`], plans the change with the pure functions in
//! [`gloss_core::interval`], and applies the resulting batch while holding the
//! document's write lock and its project's read lock.

use std::{sync::Arc, time::Duration};

use gloss_core::{
  document::{Code, Document},
  interval::{self, SegmentUpdate},
  runs::{Runs, decompose},
  segment::Segment,
  settings::{Settings, SuggestionLimit},
  store::{CodeRemoval, RecordStore},
  suggestion::Suggestion,
};
use gloss_suggest::{IndexedCodebook, SuggestionProvider};
use serde::Serialize;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard};
use uuid::Uuid;

use crate::{Error, Result, locks::LockTable};

/// The result of [`AnnotationService::assign_codes`].
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
  pub segment:  Segment,
  /// The segment's codes, resolved, in the segment's order.
  pub codes:    Vec<Code>,
  /// Ids of the segments this assignment deleted because they overlapped.
  pub replaced: Vec<Uuid>,
}

/// A consistent snapshot of one document and its segments.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentCoding {
  pub document: Document,
  /// Sorted by start offset.
  pub segments: Vec<Segment>,
}

impl DocumentCoding {
  /// The document text partitioned into plain and coded runs.
  pub fn runs(&self) -> Runs<'_> { decompose(&self.document.text, &self.segments) }
}

/// Held by every segment writer, released together.
struct WriterGuards {
  _project:  OwnedRwLockReadGuard<()>,
  _document: OwnedRwLockWriteGuard<()>,
}

pub struct AnnotationService<S, P> {
  store:     Arc<S>,
  provider:  P,
  projects:  LockTable,
  documents: LockTable,
  timeout:   Duration,
}

impl<S, P> AnnotationService<S, P>
where
  S: RecordStore,
  P: SuggestionProvider,
{
  pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

  pub fn new(store: Arc<S>, provider: P) -> Self {
    Self {
      store,
      provider,
      projects: LockTable::default(),
      documents: LockTable::default(),
      timeout: Self::DEFAULT_TIMEOUT,
    }
  }

  /// Bound every provider call by `timeout`.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// The underlying store, for record creation and listing.
  pub fn store(&self) -> &S { &self.store }

  pub fn provider(&self) -> &P { &self.provider }

  // ─── Lookups ───────────────────────────────────────────────────────────────

  async fn document(&self, id: Uuid) -> Result<Document> {
    self
      .store
      .get_document(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DocumentNotFound(id))
  }

  async fn segment(&self, id: Uuid) -> Result<Segment> {
    self
      .store
      .get_segment(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SegmentNotFound(id))
  }

  async fn codes(&self, project_id: Uuid) -> Result<Vec<Code>> {
    self.store.list_codes(project_id).await.map_err(Error::store)
  }

  async fn segments(&self, document_id: Uuid) -> Result<Vec<Segment>> {
    self.store.list_segments(document_id).await.map_err(Error::store)
  }

  /// Take the locks a segment writer needs, project first, and return the
  /// document as read under them.
  async fn lock_for_write(&self, document_id: Uuid) -> Result<(Document, WriterGuards)> {
    let project_id = self.document(document_id).await?.project_id;
    let guards = WriterGuards {
      _project:  self.projects.read(project_id).await,
      _document: self.documents.write(document_id).await,
    };
    // Re-read under the locks; the document may have been deleted meanwhile.
    let document = self.document(document_id).await?;
    Ok((document, guards))
  }

  // ─── Interval operations ───────────────────────────────────────────────────

  /// Code `[start, end)` of a document with `codes`.
  ///
  /// Every existing segment that overlaps the range is deleted, whatever it
  /// carried; the returned [`Assignment::replaced`] lists them.
  pub async fn assign_codes(
    &self,
    document_id: Uuid,
    start: usize,
    end: usize,
    codes: &[Uuid],
  ) -> Result<Assignment> {
    let (document, _guards) = self.lock_for_write(document_id).await?;
    let known = self.codes(document.project_id).await?;
    let existing = self.segments(document_id).await?;

    let plan = interval::plan_assign(&document, &existing, start, end, codes, &known)?;
    let replaced = plan.replaced().to_vec();
    let codes = plan
      .segment
      .codes
      .iter()
      .filter_map(|id| known.iter().find(|c| c.code_id == *id).cloned())
      .collect();

    self.store.apply_segments(plan.batch).await.map_err(Error::store)?;

    if replaced.is_empty() {
      tracing::debug!(%document_id, start, end, "segment created");
    } else {
      tracing::info!(
        %document_id, start, end, replaced = replaced.len(),
        "segment created, overlapping segments replaced"
      );
    }

    Ok(Assignment { segment: plan.segment, codes, replaced })
  }

  /// Replace the whole code set of a segment. An empty `codes` removes it.
  pub async fn set_segment_codes(
    &self,
    segment_id: Uuid,
    codes: &[Uuid],
  ) -> Result<SegmentUpdate> {
    let document_id = self.segment(segment_id).await?.document_id;
    let (document, _guards) = self.lock_for_write(document_id).await?;

    // The segment may have been replaced while we waited.
    let segment = self.segment(segment_id).await?;
    let known = self.codes(document.project_id).await?;

    let (update, batch) =
      interval::plan_set_codes(&segment, document.project_id, codes, &known)?;
    self.store.apply_segments(batch).await.map_err(Error::store)?;

    tracing::debug!(%segment_id, ?update, "segment codes replaced");
    Ok(update)
  }

  /// Delete every segment of a document. Returns how many were removed.
  pub async fn clear_document(&self, document_id: Uuid) -> Result<usize> {
    let (_, _guards) = self.lock_for_write(document_id).await?;
    let existing = self.segments(document_id).await?;
    let batch = interval::plan_clear(&existing);
    let removed = batch.delete.len();
    self.store.apply_segments(batch).await.map_err(Error::store)?;

    tracing::info!(%document_id, removed, "document cleared");
    Ok(removed)
  }

  /// Remove a code from every segment in its project, deleting segments left
  /// without codes, then delete the code itself.
  ///
  /// Holds the project's write lock, so no assignment in the project runs
  /// until the code is gone; later ones fail with
  /// [`Error::InvalidReference`].
  pub async fn delete_code(&self, code_id: Uuid) -> Result<CodeRemoval> {
    let project_id = self
      .store
      .get_code(code_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CodeNotFound(code_id))?
      .project_id;

    let _guard = self.projects.write(project_id).await;
    let removal = self
      .store
      .delete_code(code_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CodeNotFound(code_id))?;

    tracing::info!(
      %code_id, updated = removal.updated, removed = removal.removed,
      "code deleted"
    );
    Ok(removal)
  }

  /// Delete a document and all of its segments.
  pub async fn delete_document(&self, document_id: Uuid) -> Result<()> {
    {
      let (_, _guards) = self.lock_for_write(document_id).await?;
      let deleted = self
        .store
        .delete_document(document_id)
        .await
        .map_err(Error::store)?;
      if !deleted {
        return Err(Error::DocumentNotFound(document_id));
      }
    }
    self.documents.forget(document_id);

    tracing::info!(%document_id, "document deleted");
    Ok(())
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  /// A document and its segments, read under the document's shared lock.
  pub async fn coding(&self, document_id: Uuid) -> Result<DocumentCoding> {
    let _guard = self.documents.read(document_id).await;

    let document = self.document(document_id).await?;
    let mut segments = self.segments(document_id).await?;
    segments.sort_by_key(|s| s.start_offset);
    Ok(DocumentCoding { document, segments })
  }

  // ─── Suggestions ───────────────────────────────────────────────────────────

  /// Ask the provider for codes that fit `[start, end)` of a document.
  ///
  /// `limit` defaults to the configured suggestion limit. A reply whose lines
  /// all fail to decode is a success with no suggestions.
  pub async fn request_suggestions(
    &self,
    document_id: Uuid,
    start: usize,
    end: usize,
    limit: Option<SuggestionLimit>,
  ) -> Result<Vec<Suggestion>> {
    let settings = self.settings().await?;
    if !settings.ai_enabled {
      return Err(Error::SuggestionsDisabled);
    }
    let limit = limit.unwrap_or(settings.suggestion_limit);

    let (prompt, codebook) = {
      let _guard = self.documents.read(document_id).await;
      let document = self.document(document_id).await?;
      let span = document.slice(start, end)?.to_owned();
      let project = self
        .store
        .get_project(document.project_id)
        .await
        .map_err(Error::store)?;
      let codebook = IndexedCodebook::new(self.codes(document.project_id).await?);
      let prompt = gloss_suggest::render(project.as_ref(), &codebook, &span, limit);
      (prompt, codebook)
    };

    tracing::debug!(%document_id, start, end, codes = codebook.len(), "requesting suggestions");
    let reply = tokio::time::timeout(self.timeout, self.provider.complete(&prompt))
      .await
      .map_err(|_| {
        Error::UpstreamUnavailable(format!("no reply within {:?}", self.timeout))
      })??;

    if reply.trim().is_empty() {
      return Err(Error::UpstreamMalformed("empty reply".into()));
    }

    let suggestions = gloss_suggest::decode(&reply, &codebook, limit);
    tracing::info!(%document_id, count = suggestions.len(), "suggestions decoded");
    Ok(suggestions)
  }

  // ─── Settings ──────────────────────────────────────────────────────────────

  pub async fn settings(&self) -> Result<Settings> {
    self.store.get_settings().await.map_err(Error::store)
  }

  pub async fn update_settings(&self, settings: Settings) -> Result<Settings> {
    self.store.put_settings(settings).await.map_err(Error::store)?;
    tracing::info!(?settings, "settings updated");
    Ok(settings)
  }
}
