//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use gloss_core::{
  document::{Code, CodeUpdate, Document, NewCode, NewDocument},
  project::{NewProject, Project},
  segment::{Segment, SegmentBatch},
  settings::Settings,
  store::{CodeRemoval, RecordStore},
};

use crate::{
  Result,
  encode::{
    RawCode, RawDocument, RawProject, RawSegment, SegmentRow, decode_settings,
    encode_dt, encode_flags, encode_uuid,
  },
  schema::SCHEMA,
};

const SEGMENT_COLUMNS: &str =
  "segment_id, document_id, start_offset, end_offset, text, created_at";

const CODE_COLUMNS: &str = "code_id, project_id, name, description, color, flags";

const DOCUMENT_COLUMNS: &str = "document_id, project_id, name, text, created_at";

const PROJECT_COLUMNS: &str = "project_id, name, description, created_at";

// ─── Row readers ─────────────────────────────────────────────────────────────

/// Run a `SELECT {SEGMENT_COLUMNS} ...` query and attach each segment's codes.
fn query_segments(
  conn: &rusqlite::Connection,
  sql: &str,
  param: &str,
) -> rusqlite::Result<Vec<RawSegment>> {
  let mut stmt = conn.prepare(sql)?;
  let mut segments = stmt
    .query_map(rusqlite::params![param], |row| {
      Ok(RawSegment {
        segment_id:   row.get(0)?,
        document_id:  row.get(1)?,
        start_offset: row.get(2)?,
        end_offset:   row.get(3)?,
        text:         row.get(4)?,
        created_at:   row.get(5)?,
        codes:        vec![],
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut codes_stmt = conn.prepare(
    "SELECT code_id FROM coded_segments WHERE segment_id = ?1 ORDER BY position",
  )?;
  for segment in &mut segments {
    segment.codes = codes_stmt
      .query_map(rusqlite::params![segment.segment_id], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
  }

  Ok(segments)
}

fn project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProject> {
  Ok(RawProject {
    project_id:  row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
    created_at:  row.get(3)?,
  })
}

fn code_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCode> {
  Ok(RawCode {
    code_id:     row.get(0)?,
    project_id:  row.get(1)?,
    name:        row.get(2)?,
    description: row.get(3)?,
    color:       row.get(4)?,
    flags:       row.get(5)?,
  })
}

fn document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
  Ok(RawDocument {
    document_id: row.get(0)?,
    project_id:  row.get(1)?,
    name:        row.get(2)?,
    text:        row.get(3)?,
    created_at:  row.get(4)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gloss record store backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    tracing::debug!(?path, "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn add_project(&self, input: NewProject) -> Result<Project> {
    let input = input.normalized()?;
    let project = Project {
      project_id:  Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(project.project_id);
    let name        = project.name.clone();
    let description = project.description.clone();
    let at_str      = encode_dt(project.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
            rusqlite::params![id_str],
            project_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects(&self) -> Result<Vec<Project>> {
    let raws: Vec<RawProject> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], project_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, input: NewDocument) -> Result<Document> {
    let input = input.normalized()?;
    let document = Document {
      document_id: Uuid::new_v4(),
      project_id:  input.project_id,
      name:        input.name,
      text:        input.text,
      created_at:  Utc::now(),
    };

    let id_str         = encode_uuid(document.document_id);
    let project_id_str = encode_uuid(document.project_id);
    let name           = document.name.clone();
    let text           = document.text.clone();
    let at_str         = encode_dt(document.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (document_id, project_id, name, text, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, project_id_str, name, text, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
            rusqlite::params![id_str],
            document_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self, project_id: Uuid) -> Result<Vec<Document>> {
    let id_str = encode_uuid(project_id);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], document_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn delete_document(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM coded_segments WHERE segment_id IN
             (SELECT segment_id FROM segments WHERE document_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM segments WHERE document_id = ?1",
          rusqlite::params![id_str],
        )?;
        let n = tx.execute(
          "DELETE FROM documents WHERE document_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  // ── Codes ─────────────────────────────────────────────────────────────────

  async fn add_code(&self, input: NewCode) -> Result<Code> {
    let input = input.normalized()?;
    let code = Code {
      code_id:     Uuid::new_v4(),
      project_id:  input.project_id,
      name:        input.name,
      description: input.description,
      color:       input.color,
      flags:       input.flags,
    };

    let id_str         = encode_uuid(code.code_id);
    let project_id_str = encode_uuid(code.project_id);
    let name           = code.name.clone();
    let description    = code.description.clone();
    let color          = code.color.clone();
    let flags_str      = encode_flags(&code.flags)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO codes (code_id, project_id, name, description, color, flags)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, project_id_str, name, description, color, flags_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(code)
  }

  async fn get_code(&self, id: Uuid) -> Result<Option<Code>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCode> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CODE_COLUMNS} FROM codes WHERE code_id = ?1"),
            rusqlite::params![id_str],
            code_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCode::into_code).transpose()
  }

  async fn list_codes(&self, project_id: Uuid) -> Result<Vec<Code>> {
    let id_str = encode_uuid(project_id);

    let raws: Vec<RawCode> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CODE_COLUMNS} FROM codes WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], code_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCode::into_code).collect()
  }

  async fn update_code(
    &self,
    project_id: Uuid,
    code_id: Uuid,
    update: CodeUpdate,
  ) -> Result<Option<Code>> {
    let Some(code) = self
      .get_code(code_id)
      .await?
      .filter(|c| c.project_id == project_id)
    else {
      return Ok(None);
    };
    if update.is_empty() {
      return Ok(Some(code));
    }
    let code = update.apply(code);

    let id_str         = encode_uuid(code.code_id);
    let project_id_str = encode_uuid(project_id);
    let name           = code.name.clone();
    let description    = code.description.clone();
    let color          = code.color.clone();
    let flags_str      = encode_flags(&code.flags)?;

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE codes SET name = ?3, description = ?4, color = ?5, flags = ?6
           WHERE code_id = ?1 AND project_id = ?2",
          rusqlite::params![id_str, project_id_str, name, description, color, flags_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(updated.then_some(code))
  }

  async fn delete_code(&self, id: Uuid) -> Result<Option<CodeRemoval>> {
    let id_str = encode_uuid(id);

    let removal = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM codes WHERE code_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let holders = {
          let mut stmt =
            tx.prepare("SELECT segment_id FROM coded_segments WHERE code_id = ?1")?;
          stmt
            .query_map(rusqlite::params![id_str], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.execute(
          "DELETE FROM coded_segments WHERE code_id = ?1",
          rusqlite::params![id_str],
        )?;

        let mut counts = CodeRemoval::default();
        for segment_id in &holders {
          let removed = tx.execute(
            "DELETE FROM segments WHERE segment_id = ?1 AND NOT EXISTS
               (SELECT 1 FROM coded_segments WHERE segment_id = ?1)",
            rusqlite::params![segment_id],
          )?;
          if removed > 0 {
            counts.removed += 1;
          } else {
            counts.updated += 1;
          }
        }

        tx.execute("DELETE FROM codes WHERE code_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(Some(counts))
      })
      .await?;

    if let Some(counts) = removal {
      tracing::debug!(
        code_id = %id, updated = counts.updated, removed = counts.removed,
        "code deleted"
      );
    }
    Ok(removal)
  }

  // ── Segments ──────────────────────────────────────────────────────────────

  async fn get_segment(&self, id: Uuid) -> Result<Option<Segment>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawSegment> = self
      .conn
      .call(move |conn| {
        Ok(query_segments(
          conn,
          &format!("SELECT {SEGMENT_COLUMNS} FROM segments WHERE segment_id = ?1"),
          &id_str,
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawSegment::into_segment).transpose()
  }

  async fn list_segments(&self, document_id: Uuid) -> Result<Vec<Segment>> {
    let id_str = encode_uuid(document_id);

    let raws: Vec<RawSegment> = self
      .conn
      .call(move |conn| {
        Ok(query_segments(
          conn,
          &format!(
            "SELECT {SEGMENT_COLUMNS} FROM segments
             WHERE document_id = ?1 ORDER BY start_offset"
          ),
          &id_str,
        )?)
      })
      .await?;

    raws.into_iter().map(RawSegment::into_segment).collect()
  }

  async fn list_segments_with_code(&self, code_id: Uuid) -> Result<Vec<Segment>> {
    let id_str = encode_uuid(code_id);

    let raws: Vec<RawSegment> = self
      .conn
      .call(move |conn| {
        Ok(query_segments(
          conn,
          &format!(
            "SELECT {SEGMENT_COLUMNS} FROM segments
             WHERE segment_id IN
               (SELECT segment_id FROM coded_segments WHERE code_id = ?1)
             ORDER BY document_id, start_offset"
          ),
          &id_str,
        )?)
      })
      .await?;

    raws.into_iter().map(RawSegment::into_segment).collect()
  }

  async fn apply_segments(&self, batch: SegmentBatch) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    tracing::debug!(
      delete = batch.delete.len(),
      save = batch.save.len(),
      "applying segment batch"
    );

    let delete: Vec<String> = batch.delete.into_iter().map(encode_uuid).collect();
    let save: Vec<SegmentRow> = batch.save.iter().map(SegmentRow::from).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        for id in &delete {
          tx.execute(
            "DELETE FROM coded_segments WHERE segment_id = ?1",
            rusqlite::params![id],
          )?;
          tx.execute("DELETE FROM segments WHERE segment_id = ?1", rusqlite::params![id])?;
        }

        for row in &save {
          tx.execute(
            "INSERT INTO segments (segment_id, document_id, start_offset, end_offset, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (segment_id) DO UPDATE SET
               start_offset = excluded.start_offset,
               end_offset   = excluded.end_offset,
               text         = excluded.text",
            rusqlite::params![
              row.segment_id,
              row.document_id,
              row.start_offset,
              row.end_offset,
              row.text,
              row.created_at,
            ],
          )?;
          tx.execute(
            "DELETE FROM coded_segments WHERE segment_id = ?1",
            rusqlite::params![row.segment_id],
          )?;
          for (position, code_id) in row.codes.iter().enumerate() {
            tx.execute(
              "INSERT INTO coded_segments (segment_id, code_id, position) VALUES (?1, ?2, ?3)",
              rusqlite::params![row.segment_id, code_id, position as i64],
            )?;
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_settings(&self) -> Result<Settings> {
    let raw: Option<(bool, i64)> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT ai_enabled, suggestion_limit FROM settings WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    match raw {
      Some((ai_enabled, limit)) => decode_settings(ai_enabled, limit),
      None => Ok(Settings::default()),
    }
  }

  async fn put_settings(&self, settings: Settings) -> Result<()> {
    let ai_enabled = settings.ai_enabled;
    let limit = settings.suggestion_limit.get() as i64;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (id, ai_enabled, suggestion_limit) VALUES (1, ?1, ?2)
           ON CONFLICT (id) DO UPDATE SET
             ai_enabled       = excluded.ai_enabled,
             suggestion_limit = excluded.suggestion_limit",
          rusqlite::params![ai_enabled, limit],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
